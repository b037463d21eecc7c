// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! The path summary writer contract. The path summary
//! itself — a secondary tree keyed by distinct root-to-node name paths — is
//! out of scope for this crate; consumed here only through this trait.

use crate::error::WtxResult;
use crate::node::{Node, NodeKind};
use crate::qname::QName;

/// The kind of change being reported to the path summary for an existing
/// path node, distinct from the index controller's INSERT/DELETE
/// `IndexChangeType` — the two notification paths use separate
/// vocabularies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathChangeType {
    /// `set_name`: the node's interned name changed.
    SetName,
    /// A move relocated the node to a different parent path.
    Moved,
    /// A move relocated the node within the same parent (a no-op for the
    /// path summary).
    MovedOnSameLevel,
}

/// Opaque handle into the path summary's own node storage, returned
/// alongside a path node key so `remove` can address the right entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NamePage(pub u64);

/// Placeholder for the query-facing side of the path summary (axes,
/// filters) — out of scope here; the writer only needs to hand one back
/// from `get_path_summary()` for callers that want it.
pub struct PathSummaryReader;

pub trait PathSummaryWriter: Send {
    /// Acquires a `path_node_key` for `name` of the given kind, creating a
    /// path summary entry if this root-to-node path has not been seen
    /// before. Called before the corresponding node is created.
    fn get_path_node_key(&mut self, name: &QName, kind: NodeKind) -> WtxResult<u64>;

    /// Adapts the path summary after a name node's name, URI or
    /// containing path changed.
    fn adapt_path_for_changed_node(
        &mut self,
        node: &Node,
        new_name: &QName,
        uri_key: Option<u32>,
        prefix_key: Option<u32>,
        local_name_key: u32,
        op_type: PathChangeType,
    ) -> WtxResult<()>;

    /// Removes the path summary entry associated with a removed name node.
    fn remove(&mut self, node: &Node, kind: NodeKind, name_page: NamePage) -> WtxResult<()>;

    fn get_path_summary(&self) -> PathSummaryReader;
}

/// An in-memory `PathSummaryWriter` used by this crate's own test suite.
/// Interns `(kind, prefix, local_name, uri)` tuples to sequential keys;
/// `adapt_path_for_changed_node`/`remove` only bookkeep call counts since
/// the path summary tree itself is out of scope here.
#[derive(Debug, Default)]
pub struct MockPathSummaryWriter {
    next_key: u64,
    interned: std::collections::HashMap<(NodeKind, Option<String>, String, Option<String>), u64>,
    pub adapt_calls: Vec<PathChangeType>,
    pub remove_calls: Vec<u64>,
}

impl MockPathSummaryWriter {
    pub fn new() -> Self {
        MockPathSummaryWriter::default()
    }
}

impl PathSummaryWriter for MockPathSummaryWriter {
    fn get_path_node_key(&mut self, name: &QName, kind: NodeKind) -> WtxResult<u64> {
        let composite = (kind, name.prefix.clone(), name.local_name.clone(), name.uri.clone());
        if let Some(existing) = self.interned.get(&composite) {
            return Ok(*existing);
        }
        let key = self.next_key;
        self.next_key += 1;
        self.interned.insert(composite, key);
        Ok(key)
    }

    fn adapt_path_for_changed_node(
        &mut self,
        _node: &Node,
        _new_name: &QName,
        _uri_key: Option<u32>,
        _prefix_key: Option<u32>,
        _local_name_key: u32,
        op_type: PathChangeType,
    ) -> WtxResult<()> {
        self.adapt_calls.push(op_type);
        Ok(())
    }

    fn remove(&mut self, _node: &Node, _kind: NodeKind, name_page: NamePage) -> WtxResult<()> {
        self.remove_calls.push(name_page.0);
        Ok(())
    }

    fn get_path_summary(&self) -> PathSummaryReader {
        PathSummaryReader
    }
}
