// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! Index notification shim — forwards every insert/remove
//! of an attribute, namespace, text, comment, PI or element to a pluggable
//! index controller. Secondary indexes themselves are out of scope; this
//! module only defines the notification contract.

use crate::node::Node;

/// Whether a notified change is an insertion or a removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexChangeType {
    Insert,
    Delete,
}

/// Placeholder for whatever index definitions a caller registers; opaque
/// to this crate.
pub struct IndexDefinitions;

pub trait IndexController: Send {
    /// Notifies the controller of one node-level change. Called once per
    /// attribute/namespace/text/comment/PI/element insert or remove,
    /// including those inside a moved subtree (traversed in document order
    /// before and after the move).
    fn notify_change(&mut self, change: IndexChangeType, node_image: &Node, path_node_key: u64);

    /// Creates index listeners for `defs`, to be driven by subsequent
    /// `notify_change` calls. A no-op default for controllers with no
    /// registered index definitions.
    fn create_index_listeners(&mut self, defs: &IndexDefinitions) {
        let _ = defs;
    }
}

/// A controller that discards every notification. Useful as the default
/// when a resource has no secondary indexes.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullIndexController;

impl IndexController for NullIndexController {
    fn notify_change(&mut self, _change: IndexChangeType, _node_image: &Node, _path_node_key: u64) {}
}

/// A controller that records every notification it receives, for test
/// assertions. Not a real secondary index — just a call log.
#[derive(Debug, Default)]
pub struct RecordingIndexController {
    pub changes: Vec<(IndexChangeType, u64, u64)>,
}

impl RecordingIndexController {
    pub fn new() -> Self {
        RecordingIndexController::default()
    }
}

impl IndexController for RecordingIndexController {
    fn notify_change(&mut self, change: IndexChangeType, node_image: &Node, path_node_key: u64) {
        self.changes.push((change, node_image.key().get(), path_node_key));
    }
}
