// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! `replace_node()`: insert-then-remove or remove-then-insert, chosen to
//! preserve sibling text merges.
//!
//! Two overload families share this name, distinguished by the cursor's kind:
//! - a structural cursor (element/text/comment/PI) with an event stream
//!   replaces the whole subtree: the replacement is inserted as a right
//!   sibling of the old node *before* the old node is removed, so that if
//!   the replacement's own edges are text and the old node's former
//!   neighbours are also text, I4's merge-on-insert rule already folds them
//!   in; only then is the original unlinked.
//! - an attribute or namespace cursor paired with another transaction's
//!   corresponding node replaces just that side entry: removed first (there
//!   is no sibling-text-merge concern for side entries), then a fresh entry
//!   is installed under the same owner, cloned directly from the
//!   replacement's record the same way `copy_subtree` clones nodes — by
//!   reusing its interned name keys and `path_node_key` verbatim rather than
//!   re-deriving them through a `QName`, since this crate has no capability
//!   to un-intern a name key back into one (see `copy.rs`'s module doc and
//!   DESIGN.md).

use crate::error::{usage, WtxResult};
use crate::events::EventStreamReader;
use crate::hash::HashKind;
use crate::node::record::{AttributeNode, NamespaceNode};
use crate::node::{Node, NodeKey, NodeKind};
use crate::page::RecordKind;
use crate::wtx::{hashchain, Inner, InsertPos, NodeWriteTrx};

impl Inner {
    /// Structural replace: the node under the cursor is swapped out for the
    /// subtree described by `events`. The cursor ends up on the new
    /// subtree's root, matching `insert_subtree`'s own convention.
    pub(crate) fn replace_node_with_events(&mut self, events: &mut dyn EventStreamReader) -> WtxResult<NodeKey> {
        let old = self.require_structural_cursor("replace_node")?;
        if old.kind() == NodeKind::DocumentRoot {
            return Err(usage("replace_node", "cannot replace the document root"));
        }
        let old_key = old.key();

        self.cursor = old_key;
        let new_root = self.insert_subtree(InsertPos::RightSibling, events)?;

        self.cursor = old_key;
        self.remove_current()?;

        self.cursor = new_root;
        Ok(new_root)
    }

    /// Attribute/namespace replace: removes the side entry under the
    /// cursor and installs a direct clone of `replacement` under the same
    /// owner, with a freshly allocated key and hash. The owner becomes the
    /// cursor afterwards, matching `insert_attribute`/`insert_namespace`'s
    /// convention of leaving the cursor on the owning element.
    pub(crate) fn replace_side_entry(&mut self, replacement: &Node) -> WtxResult<NodeKey> {
        let old = self.current()?;
        self.require_kind(&old, &[NodeKind::Attribute, NodeKind::Namespace], "replace_node")?;
        self.require_kind(replacement, &[old.kind()], "replace_node")?;

        let owner = old
            .logical_parent()
            .ok_or_else(|| usage("replace_node", "side entry has no owning element"))?;

        self.remove_attribute_or_namespace(old.key())?;

        let new_key = self.page_tx.allocate_key();
        let idx = match old.kind() {
            NodeKind::Attribute => self.fetch(owner)?.as_element().expect("checked Element above").attributes.len(),
            NodeKind::Namespace => self.fetch(owner)?.as_element().expect("checked Element above").namespaces.len(),
            _ => unreachable!("checked above"),
        };

        let new_node = match replacement {
            Node::Attribute(a) => {
                let node = Node::Attribute(AttributeNode {
                    key: new_key,
                    owner,
                    prefix_key: a.prefix_key,
                    local_name_key: a.local_name_key,
                    uri_key: a.uri_key,
                    path_node_key: a.path_node_key,
                    value: a.value.clone(),
                    hash: 0,
                    dewey_id: None,
                });
                self.page_tx.insert_record(node.clone(), RecordKind::Attribute, idx)?;
                let owner_mut = self.page_tx.prepare_entry_for_modification(owner, RecordKind::Node, 0)?;
                owner_mut.as_element_mut().expect("checked Element above").attributes.push(new_key);
                node
            }
            Node::Namespace(n) => {
                let node = Node::Namespace(NamespaceNode {
                    key: new_key,
                    owner,
                    prefix_key: n.prefix_key,
                    local_name_key: n.local_name_key,
                    uri_key: n.uri_key,
                    path_node_key: n.path_node_key,
                    hash: 0,
                    dewey_id: None,
                });
                self.page_tx.insert_record(node.clone(), RecordKind::Namespace, idx)?;
                let owner_mut = self.page_tx.prepare_entry_for_modification(owner, RecordKind::Node, 0)?;
                owner_mut.as_element_mut().expect("checked Element above").namespaces.push(new_key);
                node
            }
            _ => unreachable!("checked above"),
        };

        let record_kind = match old.kind() {
            NodeKind::Attribute => RecordKind::Attribute,
            NodeKind::Namespace => RecordKind::Namespace,
            _ => unreachable!("checked above"),
        };
        if self.config.hash_kind != HashKind::None {
            let own_hash = crate::node::image::hash_of(&new_node);
            self.page_tx
                .prepare_entry_for_modification(new_key, record_kind, idx)?
                .set_hash(own_hash);
            hashchain::rolling_insert_chain(self, owner, own_hash, None, true)?;
        }

        let path_node_key = new_node.as_named().map(|n| n.path_node_key()).unwrap_or(0);
        self.index.notify_change(crate::index::IndexChangeType::Insert, &new_node, path_node_key);

        self.modification_count += 1;
        self.cursor = owner;
        Ok(new_key)
    }
}

impl NodeWriteTrx {
    /// Replaces the structural node under the cursor with the subtree
    /// described by `events`. Fails if the cursor is not on
    /// a structural node, or is on the document root.
    pub fn replace_node_with_events(&self, mut events: impl EventStreamReader + 'static) -> WtxResult<NodeKey> {
        self.run(|state| state.replace_node_with_events(&mut events))
    }

    /// Replaces the attribute or namespace under the cursor with a clone
    /// of `replacement_key` as it currently exists in `source` (possibly
    /// `self`, for a same-document replace). Fails if the cursor is not on
    /// an attribute/namespace, or if `replacement_key` is a different kind.
    pub fn replace_node_with(&self, source: &NodeWriteTrx, replacement_key: NodeKey) -> WtxResult<NodeKey> {
        let replacement = if std::sync::Arc::ptr_eq(&self.inner, &source.inner) {
            self.run(|state| state.fetch(replacement_key))?
        } else {
            let guard = source.inner.lock();
            let src_state = guard.borrow();
            src_state.fetch(replacement_key)?
        };
        self.run(|state| state.replace_side_entry(&replacement))
    }
}
