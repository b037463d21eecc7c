// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! The node write transaction: the single-writer mutator at the center of
//! this crate (spec budget's largest component).
//!
//! Construction, locking and the shared `run()` dispatch live here;
//! individual operation families are split into sibling modules the way
//! the page/node modules split kind-specific code:
//! - [`insert`] — `insert_element_as_*`, `insert_text_as_*`,
//!   `insert_comment_as_*`, `insert_pi_as_*`, `insert_attribute`,
//!   `insert_namespace`, `insert_subtree_as_*`
//! - [`remove`] — `remove()`
//! - [`replace`] — `replace_node()`
//! - [`mov`] — `move_subtree_to_*`
//! - [`copy`] — `copy_subtree_as_*`
//! - [`rename`] — `set_name`, `set_value`
//! - [`commit`] — `commit`, `rollback`, `revert_to`, `close`, hooks
//! - [`scheduler`] — the periodic auto-commit background task
//! - [`topology`] — shared sibling-chain pointer surgery
//! - [`hashchain`] — shared rolling/postorder hash-chain walking
//!
//! ## Concurrency
//!
//! Every public method takes `&self`, not `&mut self`: the transaction's
//! mutable state lives behind `Arc<ReentrantMutex<RefCell<Inner>>>` so the
//! same handle can be held by the caller and by the auto-commit scheduler
//! (a background thread) at once. The re-entrant mutex is only installed
//! as a *conceptual* requirement when `max_time > 0`; in this
//! implementation the lock always exists (it is cheap and uncontended when
//! no scheduler runs) but only the scheduler thread and, recursively, the
//! inline size-triggered auto-commit actually contend on it. Reentrancy
//! matters because an operation that trips the size-based threshold calls
//! `commit()`, which re-acquires the same lock on the same thread.

pub mod commit;
pub mod copy;
pub mod hashchain;
pub mod insert;
pub mod mov;
pub mod remove;
pub mod rename;
pub mod replace;
pub mod scheduler;
pub mod topology;

use std::cell::RefCell;
use std::sync::Arc;

use parking_lot::ReentrantMutex;

use crate::config::TransactionConfig;
use crate::diagnostics::{Level, Logger, NullLogger};
use crate::error::{invalid_cursor, node_not_found, wrong_kind, WtxResult};
use crate::factory::NodeFactory;
use crate::index::{IndexController, NullIndexController};
use crate::node::{Node, NodeKey, NodeKind};
use crate::page::{CommitCredentials, PageTx, RecordKind, UberPage};
use crate::path_summary::{PathSummaryReader, PathSummaryWriter};

/// Position of a new or relocated node relative to an anchor node,
/// mirroring the `*_as_{first_child,left_sibling,right_sibling}` operation
/// families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertPos {
    FirstChild,
    LeftSibling,
    RightSibling,
}

/// Cursor behavior for `insert_attribute`/`insert_namespace`: attributes
/// and namespaces sit outside the sibling chain, so "moving" here means
/// where the cursor ends up relative to the owning element, not a
/// structural relocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Movement {
    /// Leave the cursor on the owning element (default).
    #[default]
    ToParent,
    /// Move the cursor onto the attribute/namespace node just created or
    /// updated.
    ToNode,
}

/// A pre- or post-commit hook: observes the credentials of the commit that
/// just happened (or is about to happen) and may veto it by returning an
/// error.
pub type CommitHook = Box<dyn FnMut(&CommitCredentials) -> WtxResult<()> + Send>;

/// The transaction's mutable state, behind the handle's lock. Operation
/// families implement their methods directly on `Inner`; `NodeWriteTrx`'s
/// public methods are thin `run()`-wrapped dispatchers.
pub(crate) struct Inner {
    pub(crate) page_tx: Box<dyn PageTx>,
    pub(crate) factory: Box<dyn NodeFactory>,
    pub(crate) path_summary: Box<dyn PathSummaryWriter>,
    pub(crate) index: Box<dyn IndexController>,
    pub(crate) logger: Box<dyn Logger>,
    pub(crate) config: TransactionConfig,
    pub(crate) cursor: NodeKey,
    pub(crate) document_root: NodeKey,
    pub(crate) modification_count: u64,
    /// Set for the duration of `insert_subtree_as_*`: suppresses per-edit
    /// rolling hash maintenance in favor of one postorder pass at the end.
    pub(crate) bulk_insert: bool,
    pre_commit_hooks: Vec<CommitHook>,
    post_commit_hooks: Vec<CommitHook>,
}

impl Inner {
    pub(crate) fn fetch(&self, key: NodeKey) -> WtxResult<Node> {
        self.page_tx
            .get_record(key, RecordKind::Node, 0)?
            .ok_or_else(|| node_not_found(key.get()))
    }

    pub(crate) fn current(&self) -> WtxResult<Node> {
        self.fetch(self.cursor)
    }

    pub(crate) fn require_kind(
        &self,
        node: &Node,
        allowed: &[NodeKind],
        operation: &'static str,
    ) -> WtxResult<()> {
        if allowed.contains(&node.kind()) {
            Ok(())
        } else {
            Err(wrong_kind(node.key().get(), node.kind().as_str(), operation))
        }
    }

    pub(crate) fn require_structural_cursor(&self, operation: &'static str) -> WtxResult<Node> {
        let node = self.current()?;
        if node.kind().is_structural() {
            Ok(node)
        } else {
            Err(wrong_kind(node.key().get(), node.kind().as_str(), operation))
        }
    }

    pub(crate) fn needs_intermediate_commit(&self) -> bool {
        self.config.max_node_count > 0 && self.modification_count > self.config.max_node_count
    }

    pub(crate) fn move_cursor(&mut self, key: NodeKey) {
        self.cursor = key;
    }
}

/// Construction parameters accepted by [`NodeWriteTrxBuilder`], minus the
/// resource-manager handle and read-only transaction delegate: this crate
/// has no resource manager or read-only-transaction type of its own (both
/// are external collaborators), so callers hand in the page transaction
/// pinned to the revision they want directly.
pub struct NodeWriteTrxBuilder {
    page_tx: Box<dyn PageTx>,
    factory: Box<dyn NodeFactory>,
    path_summary: Box<dyn PathSummaryWriter>,
    index: Box<dyn IndexController>,
    logger: Box<dyn Logger>,
    config: TransactionConfig,
    document_root: NodeKey,
}

impl NodeWriteTrxBuilder {
    pub fn new(
        page_tx: Box<dyn PageTx>,
        factory: Box<dyn NodeFactory>,
        path_summary: Box<dyn PathSummaryWriter>,
        document_root: NodeKey,
    ) -> Self {
        NodeWriteTrxBuilder {
            page_tx,
            factory,
            path_summary,
            index: Box::new(NullIndexController),
            logger: Box::new(NullLogger),
            config: TransactionConfig::default(),
            document_root,
        }
    }

    pub fn with_index(mut self, index: Box<dyn IndexController>) -> Self {
        self.index = index;
        self
    }

    pub fn with_logger(mut self, logger: Box<dyn Logger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn with_config(mut self, config: TransactionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn build(self) -> NodeWriteTrx {
        let inner = Inner {
            page_tx: self.page_tx,
            factory: self.factory,
            path_summary: self.path_summary,
            index: self.index,
            logger: self.logger,
            config: self.config,
            cursor: self.document_root,
            document_root: self.document_root,
            modification_count: 0,
            bulk_insert: false,
            pre_commit_hooks: Vec::new(),
            post_commit_hooks: Vec::new(),
        };
        let needs_lock = inner.config.needs_lock();
        let max_time = inner.config.max_time;
        let time_unit = inner.config.time_unit;
        let handle = NodeWriteTrx {
            inner: Arc::new(ReentrantMutex::new(RefCell::new(inner))),
            scheduler: parking_lot::Mutex::new(None),
        };
        if needs_lock {
            handle.start_scheduler(time_unit.to_duration(max_time))
        } else {
            handle
        }
    }
}

/// The write transaction handle. Cloning it (via
/// [`NodeWriteTrx::clone_handle`]) yields another reference to the same
/// underlying transaction — the scheduler uses exactly this to reach into
/// the transaction from its background thread.
pub struct NodeWriteTrx {
    pub(crate) inner: Arc<ReentrantMutex<RefCell<Inner>>>,
    /// Guarded separately from `inner` (not every method that touches the
    /// transaction state needs to touch the scheduler, and vice versa);
    /// `parking_lot::Mutex` rather than `RefCell` because `close()` takes
    /// `&self` like every other public method here, so shutting the
    /// scheduler down needs its own interior mutability.
    scheduler: parking_lot::Mutex<Option<scheduler::SchedulerHandle>>,
}

impl NodeWriteTrx {
    /// Runs `op` against the locked inner state, then performs the
    /// size-triggered intermediate commit if `op` succeeded and the
    /// modification-count threshold was crossed.
    pub(crate) fn run<T>(&self, op: impl FnOnce(&mut Inner) -> WtxResult<T>) -> WtxResult<T> {
        let (result, needs_commit) = {
            let guard = self.inner.lock();
            let mut state = guard.borrow_mut();
            let result = op(&mut state);
            let needs_commit = result.is_ok() && state.needs_intermediate_commit();
            (result, needs_commit)
        };
        if needs_commit {
            self.commit(None)?;
        }
        result
    }

    /// Like [`run`](Self::run) but without the size-triggered
    /// intermediate-commit check afterwards. Used by `commit`/`rollback`/
    /// `revert_to`/`close` themselves, which must not re-trigger
    /// `commit()` recursively while already inside one of these lifecycle
    /// operations.
    pub(crate) fn run_raw<T>(&self, op: impl FnOnce(&mut Inner) -> WtxResult<T>) -> WtxResult<T> {
        let guard = self.inner.lock();
        let mut state = guard.borrow_mut();
        op(&mut state)
    }

    /// Another handle onto the same transaction, sharing its lock and
    /// state. Used internally to hand the scheduler a handle it can call
    /// `commit()` through.
    pub(crate) fn clone_handle(&self) -> NodeWriteTrx {
        NodeWriteTrx {
            inner: Arc::clone(&self.inner),
            scheduler: parking_lot::Mutex::new(None),
        }
    }

    fn start_scheduler(self, period: std::time::Duration) -> Self {
        let handle = self.clone_handle();
        *self.scheduler.lock() = Some(scheduler::SchedulerHandle::spawn(handle, period));
        self
    }

    /// The current cursor position.
    pub fn cursor(&self) -> NodeKey {
        let guard = self.inner.lock();
        let state = guard.borrow();
        state.cursor
    }

    /// Repositions the cursor to `key`, failing if no such node exists in
    /// the currently visible revision.
    pub fn move_to(&self, key: NodeKey) -> WtxResult<()> {
        self.run(|state| {
            state.fetch(key)?;
            state.move_cursor(key);
            Ok(())
        })
    }

    pub fn document_root(&self) -> NodeKey {
        let guard = self.inner.lock();
        let state = guard.borrow();
        state.document_root
    }

    /// The node the cursor currently points to.
    pub fn current_node(&self) -> WtxResult<Node> {
        let guard = self.inner.lock();
        let state = guard.borrow();
        state.current()
    }

    pub fn modification_count(&self) -> u64 {
        let guard = self.inner.lock();
        let state = guard.borrow();
        state.modification_count
    }

    /// Registers a hook run, in registration order, before each commit.
    /// A hook returning `Err` aborts the commit.
    pub fn append_pre_commit_hook(&self, hook: CommitHook) {
        let guard = self.inner.lock();
        let mut state = guard.borrow_mut();
        state.pre_commit_hooks.push(hook);
    }

    /// Registers a hook run, in registration order, after each successful
    /// commit.
    pub fn append_post_commit_hook(&self, hook: CommitHook) {
        let guard = self.inner.lock();
        let mut state = guard.borrow_mut();
        state.post_commit_hooks.push(hook);
    }

    pub fn get_path_summary(&self) -> PathSummaryReader {
        let guard = self.inner.lock();
        let state = guard.borrow();
        state.path_summary.get_path_summary()
    }

    pub fn get_commit_credentials(&self) -> CommitCredentials {
        let guard = self.inner.lock();
        let state = guard.borrow();
        let page = state.page_tx.get_uber_page();
        CommitCredentials {
            revision: page.revision,
            timestamp: current_unix_time(),
        }
    }

    /// The current revision's root page. The page transaction itself stays
    /// privately owned by the write transaction — it is exclusively owned
    /// by the writer; this is the one
    /// read-only fact about it the public contract exposes.
    pub fn get_page_wtx(&self) -> UberPage {
        let guard = self.inner.lock();
        let state = guard.borrow();
        state.page_tx.get_uber_page()
    }

    pub(crate) fn log(&self, level: Level, message: &str) {
        let guard = self.inner.lock();
        let state = guard.borrow();
        state.logger.record(level, message);
    }
}

/// Seconds since the Unix epoch, used only to stamp `CommitCredentials`.
/// `chrono::Utc::now()` rather than `std::time::SystemTime` to match this
/// crate's one external time dependency.
pub(crate) fn current_unix_time() -> i64 {
    chrono::Utc::now().timestamp()
}

/// Error used when a cursor operation is attempted with no valid current
/// node (e.g. after a move whose source no longer exists). Kept here
/// rather than duplicated at each call site.
pub(crate) fn cursor_error(reason: impl Into<String>) -> crate::error::WtxError {
    invalid_cursor(reason)
}
