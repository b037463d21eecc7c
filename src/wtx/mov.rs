// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! `move_subtree_to_{first_child,left_sibling,right_sibling}`: move rules,
//! DeweyID recomputation, path summary MOVED/MOVED_ON_SAME_LEVEL, and
//! index notification.
//!
//! A move is: validate (ancestor-check), unlink the source from its old
//! sibling chain (merging text neighbours left behind, same as `remove`),
//! splice it into the new site (same as `insert`), then recompute DeweyIDs
//! and re-notify the index for every node in the moved subtree.

use crate::dewey::DeweyId;
use crate::error::{self_move, WtxResult};
use crate::index::IndexChangeType;
use crate::node::{Node, NodeKey, NodeKind};
use crate::page::RecordKind;
use crate::path_summary::PathChangeType;
use crate::qname::QName;
use crate::wtx::{hashchain, topology, Inner, InsertPos, NodeWriteTrx};

impl Inner {
    /// Walks from `start` up through `parent`/`owner` links, failing with
    /// `MoveIntoOwnSubtree` if `forbidden` appears anywhere on the path —
    /// the "no ancestor of the target anchor may be the source itself or
    /// any node in its subtree" rule.
    fn check_not_moving_into_own_subtree(&self, start: NodeKey, forbidden: NodeKey) -> WtxResult<()> {
        let mut cursor = Some(start);
        while let Some(key) = cursor {
            if key == forbidden {
                return Err(crate::error::WtxError::MoveIntoOwnSubtree {
                    source: forbidden.get(),
                    anchor: start.get(),
                });
            }
            cursor = self.fetch(key).ok().and_then(|n| n.logical_parent());
        }
        Ok(())
    }

    /// A best-effort reconstruction of a name-bearing node's `QName` for
    /// the `PathSummaryWriter::adapt_path_for_changed_node` call on move.
    /// The write transaction never un-interns name keys back to strings
    /// (that lookup belongs to the page layer); since the node's name
    /// does not actually change on a
    /// move, only its containing path does, this placeholder carries the
    /// authoritative interned ids through `uri_key`/`prefix_key`/
    /// `local_name_key` (the call's other arguments) while the `QName`
    /// itself is only a display stand-in.
    fn placeholder_qname(local_name_key: u32) -> QName {
        QName::new(format!("#{}", local_name_key))
    }

    /// Notifies the index controller of every attribute, namespace, text,
    /// comment, PI and element in the subtree rooted at `root`, in
    /// document order (root, its namespaces, its attributes, then its
    /// structural children recursively) — shared by `move_subtree`
    /// (notified once as DELETE before the move and once as INSERT after)
    /// and `copy_subtree`/`insert_subtree`'s callers (INSERT only, for
    /// brand-new content).
    pub(crate) fn notify_subtree(&mut self, root: NodeKey, change: IndexChangeType) -> WtxResult<()> {
        let node = self.fetch(root)?;
        let path_node_key = node.as_named().map(|n| n.path_node_key()).unwrap_or(0);
        self.index.notify_change(change, &node, path_node_key);
        if let Node::Element(element) = &node {
            for ns_key in element.namespaces.clone() {
                let ns = self.fetch(ns_key)?;
                let ns_path = ns.as_named().map(|n| n.path_node_key()).unwrap_or(0);
                self.index.notify_change(change, &ns, ns_path);
            }
            for attr_key in element.attributes.clone() {
                let attr = self.fetch(attr_key)?;
                let attr_path = attr.as_named().map(|n| n.path_node_key()).unwrap_or(0);
                self.index.notify_change(change, &attr, attr_path);
            }
        }
        if let Some(structural) = node.as_structural() {
            let mut child = structural.first_child();
            while let Some(child_key) = child {
                self.notify_subtree(child_key, change)?;
                let child_node = self.fetch(child_key)?;
                child = child_node.as_structural().and_then(|s| s.right_sibling());
            }
        }
        Ok(())
    }

    /// Recomputes DeweyIDs for the whole moved subtree after its root has
    /// already been assigned its new id: attributes and namespaces get
    /// fresh ids under the (possibly new) parent id, and structural
    /// children are walked and reassigned the same way, recursively.
    fn reassign_dewey_ids(&mut self, key: NodeKey) -> WtxResult<()> {
        if !self.config.dewey_ids_enabled {
            return Ok(());
        }
        let node = self.fetch(key)?;
        let own_id = node.dewey_id().cloned();
        let Some(own_id) = own_id else { return Ok(()) };

        if let Node::Element(element) = &node {
            let mut prev: Option<DeweyId> = None;
            for (idx, ns_key) in element.namespaces.clone().into_iter().enumerate() {
                let new_id = if idx == 0 {
                    own_id.new_namespace()
                } else {
                    DeweyId::new_between(prev.as_ref(), None)
                };
                self.page_tx
                    .prepare_entry_for_modification(ns_key, RecordKind::Namespace, idx)?
                    .set_dewey_id(Some(new_id.clone()));
                prev = Some(new_id);
            }
            let mut prev: Option<DeweyId> = None;
            for (idx, attr_key) in element.attributes.clone().into_iter().enumerate() {
                let new_id = if idx == 0 {
                    own_id.new_attribute()
                } else {
                    DeweyId::new_between(prev.as_ref(), None)
                };
                self.page_tx
                    .prepare_entry_for_modification(attr_key, RecordKind::Attribute, idx)?
                    .set_dewey_id(Some(new_id.clone()));
                prev = Some(new_id);
            }
        }

        if let Some(structural) = node.as_structural() {
            let mut child = structural.first_child();
            let mut prev_child_id: Option<DeweyId> = None;
            while let Some(child_key) = child {
                let new_id = match &prev_child_id {
                    None => own_id.new_child(),
                    Some(p) => DeweyId::new_between(Some(p), None),
                };
                self.page_tx
                    .prepare_entry_for_modification(child_key, RecordKind::Node, 0)?
                    .set_dewey_id(Some(new_id.clone()));
                self.reassign_dewey_ids(child_key)?;
                let child_node = self.fetch(child_key)?;
                child = child_node.as_structural().and_then(|s| s.right_sibling());
                prev_child_id = Some(new_id);
            }
        }
        Ok(())
    }

    pub(crate) fn move_subtree(&mut self, from_key: NodeKey, pos: InsertPos) -> WtxResult<NodeKey> {
        let anchor = self.require_structural_cursor("move_subtree")?;
        if from_key == anchor.key() {
            return Err(self_move(from_key.get()));
        }
        let source = self
            .fetch(from_key)
            .map_err(|_| crate::error::WtxError::NodeKeyOutOfRange { key: from_key.get() })?;
        self.require_kind(&source, &source_kinds(), "move_subtree")?;

        self.check_not_moving_into_own_subtree(anchor.key(), from_key)?;

        let old_parent = source
            .as_structural()
            .and_then(|s| s.parent())
            .ok_or_else(|| crate::error::invalid_cursor("source has no parent to move away from"))?;
        let descendant_count = source.descendant_count();
        let source_hash = source.hash();

        self.notify_subtree(from_key, IndexChangeType::Delete)?;

        let update_hash = self.config.hash_kind != crate::hash::HashKind::None;
        let remove_outcome = topology::unlink_structural(self, &source)?;
        if !self.bulk_insert {
            hashchain::rolling_remove_chain(self, remove_outcome.parent, source_hash, Some(descendant_count), update_hash)?;
            if remove_outcome.concatenated {
                topology::decrement_ancestors_above(self, remove_outcome.parent)?;
                if update_hash {
                    let survivor = remove_outcome.merge_survivor.expect("concatenated implies a survivor");
                    let old_content_hash = remove_outcome
                        .merge_survivor_old_content_hash
                        .expect("concatenated implies a captured pre-merge hash");
                    let new_content_hash = crate::node::image::hash_of(&self.fetch(survivor)?);
                    hashchain::rolling_update_chain(self, survivor, old_content_hash, new_content_hash)?;
                }
            }
        }

        let anchor_after_unlink = self.fetch(anchor.key())?;
        let site = topology::resolve_insert_site(&anchor_after_unlink, pos)?;
        topology::splice_in(self, &site, from_key)?;
        {
            let moved = self
                .page_tx
                .prepare_entry_for_modification(from_key, RecordKind::Node, 0)?;
            if let Some(s) = moved.as_structural_mut() {
                s.set_parent(Some(site.parent));
            }
        }
        if !self.bulk_insert {
            hashchain::rolling_insert_chain(self, site.parent, source_hash, Some(descendant_count), update_hash)?;
        }

        if self.config.dewey_ids_enabled {
            let left_id = match site.left {
                Some(l) => self.fetch(l)?.dewey_id().cloned(),
                None => None,
            };
            let right_id = match site.right {
                Some(r) => self.fetch(r)?.dewey_id().cloned(),
                None => None,
            };
            let new_root_id = match (left_id.as_ref(), right_id.as_ref()) {
                (None, None) => {
                    let parent = self.fetch(site.parent)?;
                    parent
                        .dewey_id()
                        .map(|p| p.new_child())
                        .unwrap_or_else(DeweyId::document_root)
                }
                (l, r) => DeweyId::new_between(l, r),
            };
            self.page_tx
                .prepare_entry_for_modification(from_key, RecordKind::Node, 0)?
                .set_dewey_id(Some(new_root_id));
            self.reassign_dewey_ids(from_key)?;
        }

        if let Some(named) = source.as_named() {
            let op_type = if old_parent == site.parent {
                PathChangeType::MovedOnSameLevel
            } else {
                PathChangeType::Moved
            };
            let placeholder = Self::placeholder_qname(named.local_name_key());
            self.path_summary.adapt_path_for_changed_node(
                &source,
                &placeholder,
                named.uri_key(),
                named.prefix_key(),
                named.local_name_key(),
                op_type,
            )?;
        }

        self.notify_subtree(from_key, IndexChangeType::Insert)?;

        self.modification_count += 1;
        self.cursor = from_key;
        Ok(from_key)
    }
}

fn source_kinds() -> Vec<NodeKind> {
    vec![
        NodeKind::Element,
        NodeKind::Text,
        NodeKind::Comment,
        NodeKind::ProcessingInstruction,
    ]
}

impl NodeWriteTrx {
    pub fn move_subtree_to_first_child(&self, from_key: NodeKey) -> WtxResult<NodeKey> {
        self.run(|state| state.move_subtree(from_key, InsertPos::FirstChild))
    }

    pub fn move_subtree_to_left_sibling(&self, from_key: NodeKey) -> WtxResult<NodeKey> {
        self.run(|state| state.move_subtree(from_key, InsertPos::LeftSibling))
    }

    pub fn move_subtree_to_right_sibling(&self, from_key: NodeKey) -> WtxResult<NodeKey> {
        self.run(|state| state.move_subtree(from_key, InsertPos::RightSibling))
    }
}
