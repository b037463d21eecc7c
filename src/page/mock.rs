// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! An in-memory `PageTx` implementation used by this crate's own test
//! suite. Not a production page store — no serialization, no real
//! copy-on-write page sharing, no persistence across process restarts.
//! Revisions are modelled by snapshotting the whole record map, which is
//! fine for the tree sizes exercised in tests but would be unacceptable in
//! a real page store.

use std::collections::HashMap;

use crate::error::{node_not_found, WtxResult};
use crate::node::{Node, NodeKey, NodeKind};
use crate::page::{PageTx, RecordKind, UberPage};
use crate::qname::QName;

#[derive(Debug, Clone, Default)]
struct Revision {
    records: HashMap<u64, Node>,
}

/// In-memory page transaction for tests.
pub struct MockPageTx {
    current: Revision,
    /// Snapshots of every durably committed revision, indexed by revision
    /// number; `history[0]` is the bootstrap (empty) revision.
    history: Vec<Revision>,
    next_node_key: u64,
    names: HashMap<(Option<String>, String, Option<String>), u32>,
    next_name_key: u32,
    revision: u32,
    bootstrap: bool,
}

impl MockPageTx {
    pub fn new() -> Self {
        MockPageTx {
            current: Revision::default(),
            history: vec![Revision::default()],
            next_node_key: 0,
            names: HashMap::new(),
            next_name_key: 0,
            revision: 0,
            bootstrap: true,
        }
    }

    /// Allocates the next node key (`NodeFactory`'s allocator counter
    /// comes from the page layer).
    fn next_key(&mut self) -> NodeKey {
        let key = NodeKey(self.next_node_key);
        self.next_node_key += 1;
        self.bootstrap = false;
        key
    }

    /// Reopens against an older committed revision as a fresh head,
    /// targeting `next_revision` as the revision the next commit will
    /// produce. Used by `revert_to`.
    pub fn reopen_at(&mut self, base_revision: u32, next_revision: u32) {
        let snapshot = self
            .history
            .get(base_revision as usize)
            .cloned()
            .unwrap_or_default();
        self.current = snapshot;
        self.revision = next_revision.saturating_sub(1);
    }
}

impl Default for MockPageTx {
    fn default() -> Self {
        Self::new()
    }
}

fn record_key(node: &Node) -> u64 {
    node.key().get()
}

impl PageTx for MockPageTx {
    fn allocate_key(&mut self) -> NodeKey {
        self.next_key()
    }

    fn get_record(&self, key: NodeKey, _kind: RecordKind, _idx: usize) -> WtxResult<Option<Node>> {
        Ok(self.current.records.get(&key.get()).cloned())
    }

    fn prepare_entry_for_modification(
        &mut self,
        key: NodeKey,
        _kind: RecordKind,
        _idx: usize,
    ) -> WtxResult<&mut Node> {
        self.current
            .records
            .get_mut(&key.get())
            .ok_or_else(|| node_not_found(key.get()))
    }

    fn remove_entry(&mut self, key: NodeKey, _kind: RecordKind, _idx: usize) -> WtxResult<()> {
        self.current.records.remove(&key.get());
        Ok(())
    }

    fn insert_record(&mut self, node: Node, _kind: RecordKind, _idx: usize) -> WtxResult<()> {
        self.current.records.insert(record_key(&node), node);
        Ok(())
    }

    fn create_name_key(&mut self, name: &QName, _kind: NodeKind) -> u32 {
        let composite = (name.prefix.clone(), name.local_name.clone(), name.uri.clone());
        if let Some(existing) = self.names.get(&composite) {
            return *existing;
        }
        let key = self.next_name_key;
        self.next_name_key += 1;
        self.names.insert(composite, key);
        key
    }

    fn get_actual_revision_root_page(&self) -> UberPage {
        UberPage {
            revision: self.revision,
        }
    }

    fn commit(&mut self, _message: Option<String>) -> WtxResult<UberPage> {
        self.revision += 1;
        let snapshot = self.current.clone();
        if (self.revision as usize) < self.history.len() {
            self.history.truncate(self.revision as usize);
        }
        self.history.push(snapshot);
        Ok(UberPage {
            revision: self.revision,
        })
    }

    fn rollback(&mut self) -> WtxResult<UberPage> {
        let last_durable = self.history.last().cloned().unwrap_or_default();
        self.current = last_durable;
        Ok(UberPage {
            revision: self.revision,
        })
    }

    fn revert_to(&mut self, base_revision: u32, next_revision: u32) -> WtxResult<UberPage> {
        self.reopen_at(base_revision, next_revision);
        Ok(UberPage {
            revision: self.revision,
        })
    }

    fn clear_caches(&mut self) {}

    fn close_caches(&mut self) {}

    fn get_uber_page(&self) -> UberPage {
        UberPage {
            revision: self.revision,
        }
    }

    fn get_revision_number(&self) -> u32 {
        self.revision
    }

    fn is_bootstrap(&self) -> bool {
        self.bootstrap
    }
}
