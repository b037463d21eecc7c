// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! `remove()`: topology surgery for removing a node and its subtree.
//!
//! Removal is post-order: a structural node's subtree (its attributes,
//! namespaces and descendants) is notified and unlinked from the leaves
//! up, then the node itself is unlinked from its sibling chain. Text
//! adjacency merging (I4) happens once, at the top-level removed node's
//! own siblings — descendants were never adjacent to anything outside
//! their own subtree, so no merge check applies below the root.

use crate::error::{usage, WtxResult};
use crate::hash::HashKind;
use crate::index::IndexChangeType;
use crate::node::{Node, NodeKey, NodeKind};
use crate::page::RecordKind;
use crate::path_summary::NamePage;
use crate::wtx::{hashchain, topology, Inner, NodeWriteTrx};

impl Inner {
    /// Notifies and removes one attribute or namespace entry, folding its
    /// hash contribution out of the owning element.
    fn remove_side_entry(&mut self, key: NodeKey, kind: RecordKind) -> WtxResult<()> {
        let node = self.fetch(key)?;
        let owner = node
            .logical_parent()
            .expect("attribute/namespace always has an owner");
        let path_node_key = node.as_named().map(|n| n.path_node_key()).unwrap_or(0);
        self.index.notify_change(IndexChangeType::Delete, &node, path_node_key);
        if let Some(named) = node.as_named() {
            self.path_summary
                .remove(&node, node.kind(), NamePage(named.path_node_key()))?;
        }
        let removed_hash = node.hash();
        self.page_tx.remove_entry(key, kind, 0)?;
        match kind {
            RecordKind::Attribute => {
                let owner_mut = self.page_tx.prepare_entry_for_modification(owner, RecordKind::Node, 0)?;
                owner_mut
                    .as_element_mut()
                    .expect("attribute owner is an element")
                    .attributes
                    .retain(|&k| k != key);
            }
            RecordKind::Namespace => {
                let owner_mut = self.page_tx.prepare_entry_for_modification(owner, RecordKind::Node, 0)?;
                owner_mut
                    .as_element_mut()
                    .expect("namespace owner is an element")
                    .namespaces
                    .retain(|&k| k != key);
            }
            RecordKind::Node => unreachable!("remove_side_entry only handles attribute/namespace kinds"),
        }
        if !self.bulk_insert {
            let update_hash = self.config.hash_kind != HashKind::None;
            hashchain::rolling_remove_chain(self, owner, removed_hash, None, update_hash)?;
        }
        Ok(())
    }

    /// Recursively notifies DELETE for every attribute, namespace and
    /// structural descendant of `key`, post-order (deepest first), without
    /// touching topology — topology surgery happens once, at the root,
    /// after this walk.
    fn notify_subtree_delete(&mut self, key: NodeKey) -> WtxResult<()> {
        let node = self.fetch(key)?;
        if let Node::Element(element) = &node {
            for ns_key in element.namespaces.clone() {
                let ns = self.fetch(ns_key)?;
                let path_node_key = ns.as_named().map(|n| n.path_node_key()).unwrap_or(0);
                self.index.notify_change(IndexChangeType::Delete, &ns, path_node_key);
            }
            for attr_key in element.attributes.clone() {
                let attr = self.fetch(attr_key)?;
                let path_node_key = attr.as_named().map(|n| n.path_node_key()).unwrap_or(0);
                self.index.notify_change(IndexChangeType::Delete, &attr, path_node_key);
            }
        }
        if let Some(structural) = node.as_structural() {
            let mut child = structural.first_child();
            while let Some(child_key) = child {
                self.notify_subtree_delete(child_key)?;
                let child_node = self.fetch(child_key)?;
                child = child_node.as_structural().and_then(|s| s.right_sibling());
            }
        }
        let path_node_key = node.as_named().map(|n| n.path_node_key()).unwrap_or(0);
        self.index.notify_change(IndexChangeType::Delete, &node, path_node_key);
        Ok(())
    }

    /// Removes the side-list entries and structural descendants of `key`
    /// from the page transaction (already notified by
    /// `notify_subtree_delete`), bottom-up, without any sibling-chain
    /// surgery — that is the caller's job for the subtree root only.
    fn purge_subtree_records(&mut self, key: NodeKey) -> WtxResult<()> {
        let node = self.fetch(key)?;
        if let Node::Element(element) = &node {
            for ns_key in element.namespaces.clone() {
                self.page_tx.remove_entry(ns_key, RecordKind::Namespace, 0)?;
            }
            for attr_key in element.attributes.clone() {
                self.page_tx.remove_entry(attr_key, RecordKind::Attribute, 0)?;
            }
        }
        if let Some(structural) = node.as_structural() {
            let mut child = structural.first_child();
            while let Some(child_key) = child {
                let child_node = self.fetch(child_key)?;
                let next = child_node.as_structural().and_then(|s| s.right_sibling());
                self.purge_subtree_records(child_key)?;
                child = next;
            }
        }
        self.page_tx.remove_entry(key, RecordKind::Node, 0)
    }

    pub(crate) fn remove_current(&mut self) -> WtxResult<()> {
        let node = self.require_structural_cursor("remove")?;
        if node.kind() == NodeKind::DocumentRoot {
            return Err(usage("remove", "cannot remove the document root"));
        }
        let key = node.key();

        self.notify_subtree_delete(key)?;
        if let Some(named) = node.as_named() {
            self.path_summary
                .remove(&node, node.kind(), NamePage(named.path_node_key()))?;
        }
        let descendant_count = node.descendant_count();
        let removed_hash = node.hash();

        let outcome = topology::unlink_structural(self, &node)?;
        self.purge_subtree_records(key)?;

        if !self.bulk_insert {
            let update_hash = self.config.hash_kind != HashKind::None;
            hashchain::rolling_remove_chain(self, outcome.parent, removed_hash, Some(descendant_count), update_hash)?;
            if outcome.concatenated {
                topology::decrement_ancestors_above(self, outcome.parent)?;
                if update_hash {
                    let survivor = outcome.merge_survivor.expect("concatenated implies a survivor");
                    let old_content_hash = outcome
                        .merge_survivor_old_content_hash
                        .expect("concatenated implies a captured pre-merge hash");
                    let new_content_hash = crate::node::image::hash_of(&self.fetch(survivor)?);
                    hashchain::rolling_update_chain(self, survivor, old_content_hash, new_content_hash)?;
                }
            }
        }

        self.modification_count += 1;
        self.cursor = outcome.parent;
        Ok(())
    }

    /// Removes one attribute or namespace by key, used by `remove()` when
    /// the cursor happens to be positioned (via the implementation detail
    /// that some callers move the cursor onto an attribute/namespace
    /// before calling `remove`) — kept for `replace_node`/`copy_subtree`
    /// internals that need to drop a single side entry without a full
    /// subtree walk.
    pub(crate) fn remove_attribute_or_namespace(&mut self, key: NodeKey) -> WtxResult<()> {
        let node = self.fetch(key)?;
        let kind = match node.kind() {
            NodeKind::Attribute => RecordKind::Attribute,
            NodeKind::Namespace => RecordKind::Namespace,
            other => return Err(usage("remove", format!("{:?} is not an attribute or namespace", other))),
        };
        self.remove_side_entry(key, kind)?;
        self.modification_count += 1;
        Ok(())
    }
}

impl NodeWriteTrx {
    /// Removes the current node and its entire subtree. Fails with a
    /// usage error if the cursor is on the
    /// document root. On success the cursor moves to the removed node's
    /// former parent.
    pub fn remove(&self) -> WtxResult<()> {
        self.run(|state| state.remove_current())
    }
}
