// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! The page transaction contract — the only way the write transaction
//! core touches stored nodes. Implementations of `PageTx` live outside
//! this crate's scope (the persistent page store, its caching and
//! serialization are external collaborators); this module only defines
//! the interface and the small value types it exchanges.
//!
//! `mock` provides an in-memory implementation used by this crate's own
//! tests — explicitly not a production page store.

pub mod mock;

use crate::error::WtxResult;
use crate::node::{Node, NodeKey, NodeKind};
use crate::qname::QName;

/// Which side-list an attribute/namespace record lives in, for addressing
/// entries that hang off an element rather than sitting in the main node
/// table. `idx` is ignored (pass `0`) for `RecordKind::Node`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Node,
    Attribute,
    Namespace,
}

/// The root page of one committed revision. Opaque to this crate beyond
/// its revision number — rollback and revert swap these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UberPage {
    pub revision: u32,
}

/// Credentials identifying the transaction's current position, returned by
/// `get_commit_credentials()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitCredentials {
    pub revision: u32,
    pub timestamp: i64,
}

/// The contract the write transaction uses to fetch, modify and remove
/// node records, and to drive commit/rollback of the underlying page
/// store. One `PageTx` is exclusively owned by one write transaction
/// everything it mutates is copy-on-write underneath.
pub trait PageTx: Send {
    /// Fetches a record by key. `kind`/`idx` address attribute/namespace
    /// side-list entries; pass `RecordKind::Node` and `0` for ordinary
    /// node lookups.
    fn get_record(&self, key: NodeKey, kind: RecordKind, idx: usize) -> WtxResult<Option<Node>>;

    /// Copy-on-write at page granularity: returns an exclusive editable
    /// view of the record for `key`, installed into the current
    /// revision's page. The returned reference must be dropped (or its
    /// changes otherwise committed to the transaction) before another
    /// `prepare_entry_for_modification` call on a different key is made —
    /// the write transaction never holds two such views at once.
    fn prepare_entry_for_modification(
        &mut self,
        key: NodeKey,
        kind: RecordKind,
        idx: usize,
    ) -> WtxResult<&mut Node>;

    /// Removes the entry for `key` from the page transaction.
    fn remove_entry(&mut self, key: NodeKey, kind: RecordKind, idx: usize) -> WtxResult<()>;

    /// Installs a brand-new record (as produced by a `NodeFactory` method)
    /// into the current revision's page. Spec.md §6 names
    /// `get_record`/`prepare_entry_for_modification`/`remove_entry` as the
    /// record-level contract but does not separately name how freshly
    /// factoried nodes first enter the page store; this is that entry
    /// point, kept symmetric with `remove_entry`.
    fn insert_record(&mut self, node: Node, kind: RecordKind, idx: usize) -> WtxResult<()>;

    /// Interns `name` for a node of the given kind, returning its name key.
    fn create_name_key(&mut self, name: &QName, kind: NodeKind) -> u32;

    /// Allocates the next node key. Node keys are monotonically increasing
    /// and never reused; the `NodeFactory` stamps whatever key it is
    /// given here onto the record it constructs, per the design note
    /// that the factory "owns only an allocator counter from the page
    /// layer" rather than minting keys itself.
    fn allocate_key(&mut self) -> NodeKey;

    fn get_actual_revision_root_page(&self) -> UberPage;

    fn commit(&mut self, message: Option<String>) -> WtxResult<UberPage>;
    fn rollback(&mut self) -> WtxResult<UberPage>;

    /// Reopens the page transaction against `base_revision` as a fresh
    /// head, targeting `next_revision` as the revision the next commit
    /// will produce. A narrow addition to this trait, since `revert_to`
    /// needs its own page-layer primitive distinct from `rollback` (which
    /// always targets the *previous* durable revision, never an arbitrary
    /// one).
    fn revert_to(&mut self, base_revision: u32, next_revision: u32) -> WtxResult<UberPage>;

    fn clear_caches(&mut self);
    fn close_caches(&mut self);

    fn get_uber_page(&self) -> UberPage;
    fn get_revision_number(&self) -> u32;
    fn is_bootstrap(&self) -> bool;
}
