// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! Error taxonomy for the node write transaction engine.
//!
//! Every failure the write transaction can produce is represented as a
//! struct-style `WtxError` variant carrying the context needed to render a
//! precise message, rather than a bare string. Preconditions are checked and
//! surfaced before any mutation begins; once a mutation starts, inner page
//! transaction failures propagate unchanged.

use thiserror::Error;

/// Standard result type for all write transaction operations.
pub type WtxResult<T> = Result<T, WtxError>;

/// Error taxonomy for the write transaction core.
///
/// Variants are grouped (informally, by doc comment) into the five kinds
/// named by the specification: usage errors, argument errors, state errors,
/// I/O errors and threading errors.
#[derive(Debug, Clone, Error)]
pub enum WtxError {
    // -- UsageError: precondition violation --
    /// The current node's kind does not support the requested operation.
    #[error("current node {node:?} has kind {actual}, which does not support '{operation}'")]
    WrongCurrentKind {
        node: u64,
        actual: &'static str,
        operation: &'static str,
    },

    /// A name, value or content argument failed a structural constraint.
    #[error("invalid {what} for '{operation}': {reason}")]
    InvalidContent {
        what: &'static str,
        operation: &'static str,
        reason: String,
    },

    /// `insert_namespace` supplied a prefix already present on the element.
    #[error("element {element:?} already has a namespace with prefix '{prefix}'")]
    DuplicateNamespace { element: u64, prefix: String },

    /// Attempted to move a subtree into its own descendant (or itself).
    #[error("cannot move subtree rooted at {source:?} into its own subtree (anchor {anchor:?})")]
    MoveIntoOwnSubtree { source: u64, anchor: u64 },

    /// `close()` called while modifications are still uncommitted.
    #[error("close() called with {pending} uncommitted modification(s)")]
    UncommittedOnClose { pending: u64 },

    /// A precondition violation not covered by a more specific variant
    /// (e.g. `remove()` on the document root).
    #[error("usage error in '{operation}': {reason}")]
    Usage { operation: &'static str, reason: String },

    /// `truncate_to` is an intentional stub; its semantics were never
    /// pinned down in the source material.
    #[error("truncate_to is not implemented")]
    NotImplemented,

    // -- ArgumentError: out-of-range / self-reference --
    /// The supplied node key does not exist in the currently visible revision.
    #[error("node key {key:?} is out of range for the current revision")]
    NodeKeyOutOfRange { key: u64 },

    /// `move_subtree_to_*` was asked to move a node relative to itself.
    #[error("cannot move node {node:?} relative to itself")]
    SelfMove { node: u64 },

    // -- StateError: missing node / invalid cursor --
    /// No record exists for the given key in the page transaction.
    #[error("no node found for key {key:?}")]
    NodeNotFound { key: u64 },

    /// The cursor is not positioned on a valid node (e.g. after a failed move).
    #[error("invalid cursor state: {reason}")]
    InvalidCursorState { reason: String },

    // -- IOError: page layer failures --
    /// The page transaction failed to read or write a record.
    #[error("page I/O error during '{operation}': {reason}")]
    PageIo { operation: String, reason: String },

    // -- ThreadingError: scheduler shutdown --
    /// The auto-commit scheduler could not be joined during shutdown.
    #[error("auto-commit scheduler did not shut down within the 2s deadline: {reason}")]
    SchedulerShutdown { reason: String },

    /// A pre-commit or post-commit hook returned an error, aborting the commit.
    #[error("{phase} hook failed: {reason}")]
    HookFailed {
        phase: &'static str,
        reason: String,
    },
}

// -- convenience constructors, one free function per common construction --

pub fn wrong_kind(node: u64, actual: &'static str, operation: &'static str) -> WtxError {
    WtxError::WrongCurrentKind {
        node,
        actual,
        operation,
    }
}

pub fn invalid_content(what: &'static str, operation: &'static str, reason: impl Into<String>) -> WtxError {
    WtxError::InvalidContent {
        what,
        operation,
        reason: reason.into(),
    }
}

pub fn node_not_found(key: u64) -> WtxError {
    WtxError::NodeNotFound { key }
}

pub fn invalid_cursor(reason: impl Into<String>) -> WtxError {
    WtxError::InvalidCursorState {
        reason: reason.into(),
    }
}

pub fn self_move(node: u64) -> WtxError {
    WtxError::SelfMove { node }
}

pub fn usage(operation: &'static str, reason: impl Into<String>) -> WtxError {
    WtxError::Usage {
        operation,
        reason: reason.into(),
    }
}
