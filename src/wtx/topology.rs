// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! Sibling-chain pointer surgery shared by insert, remove and move.
//! Kept free of hashing and index
//! concerns so each can be reasoned about and tested independently.

use crate::error::{wrong_kind, WtxResult};
use crate::node::{Node, NodeKey};
use crate::page::RecordKind;
use crate::wtx::{Inner, InsertPos};

/// Where a new or relocated node's pointers land, resolved from an anchor
/// and a position.
#[derive(Debug, Clone, Copy)]
pub(crate) struct InsertSite {
    pub parent: NodeKey,
    pub left: Option<NodeKey>,
    pub right: Option<NodeKey>,
}

/// Resolves `pos` relative to `anchor` into the concrete parent/left/right
/// pointers a freshly inserted (or relocated) node will have.
pub(crate) fn resolve_insert_site(anchor: &Node, pos: InsertPos) -> WtxResult<InsertSite> {
    let structural = anchor
        .as_structural()
        .ok_or_else(|| wrong_kind(anchor.key().get(), anchor.kind().as_str(), "insert"))?;
    match pos {
        InsertPos::FirstChild => Ok(InsertSite {
            parent: anchor.key(),
            left: None,
            right: structural.first_child(),
        }),
        InsertPos::LeftSibling => {
            let parent = structural.parent().ok_or_else(|| {
                crate::error::invalid_cursor("anchor has no parent to insert a left sibling under")
            })?;
            Ok(InsertSite {
                parent,
                left: structural.left_sibling(),
                right: Some(anchor.key()),
            })
        }
        InsertPos::RightSibling => {
            let parent = structural.parent().ok_or_else(|| {
                crate::error::invalid_cursor("anchor has no parent to insert a right sibling under")
            })?;
            Ok(InsertSite {
                parent,
                left: Some(anchor.key()),
                right: structural.right_sibling(),
            })
        }
    }
}

/// Splices `new_key` into `site`: bumps the parent's `child_count`, sets
/// `first_child` when the new node has no left sibling, and repoints
/// whichever neighbours exist. One mutable view at a time.
pub(crate) fn splice_in(inner: &mut Inner, site: &InsertSite, new_key: NodeKey) -> WtxResult<()> {
    {
        let parent = inner
            .page_tx
            .prepare_entry_for_modification(site.parent, RecordKind::Node, 0)?;
        let parent = parent
            .as_structural_mut()
            .ok_or_else(|| wrong_kind(site.parent.get(), "?", "insert"))?;
        parent.set_child_count(parent.child_count() + 1);
        if site.left.is_none() {
            parent.set_first_child(Some(new_key));
        }
    }
    if let Some(right) = site.right {
        let right = inner
            .page_tx
            .prepare_entry_for_modification(right, RecordKind::Node, 0)?;
        right
            .as_structural_mut()
            .ok_or_else(|| wrong_kind(right.key().get(), "?", "insert"))?
            .set_left_sibling(Some(new_key));
    }
    if let Some(left) = site.left {
        let left = inner
            .page_tx
            .prepare_entry_for_modification(left, RecordKind::Node, 0)?;
        left.as_structural_mut()
            .ok_or_else(|| wrong_kind(left.key().get(), "?", "insert"))?
            .set_right_sibling(Some(new_key));
    }
    Ok(())
}

/// Outcome of unlinking a structural node from its sibling chain,
/// returned so the caller can drive
/// hash-chain and index-notification bookkeeping against it.
pub(crate) struct RemoveOutcome {
    pub parent: NodeKey,
    pub was_first_child: bool,
    /// `true` when removing the node brought two text neighbours into
    /// adjacency and they were merged (I4).
    pub concatenated: bool,
    /// The node that absorbed the merge, if `concatenated`.
    pub merge_survivor: Option<NodeKey>,
    /// `merge_survivor`'s content hash before the merge mutated its value,
    /// if `concatenated`. The merge happens in place, so this is the only
    /// place the pre-merge hash is still observable — callers need it
    /// (alongside the post-merge hash) to drive `rolling_update_chain`
    /// with a genuine old/new pair instead of two copies of the same
    /// value.
    pub merge_survivor_old_content_hash: Option<i64>,
}

/// Unlinks `removed` (a structural node already known to exist) from its
/// sibling chain, merging adjacent text neighbours first if removing it
/// would otherwise violate I4.
pub(crate) fn unlink_structural(inner: &mut Inner, removed: &Node) -> WtxResult<RemoveOutcome> {
    let structural = removed
        .as_structural()
        .ok_or_else(|| wrong_kind(removed.key().get(), removed.kind().as_str(), "remove"))?;
    let parent = structural
        .parent()
        .ok_or_else(|| crate::error::invalid_cursor("node has no parent"))?;
    let left = structural.left_sibling();
    let right = structural.right_sibling();
    let was_first_child = left.is_none();

    let mut concatenated = false;
    let mut new_right = right;
    let mut merge_survivor_old_content_hash = None;

    if let (Some(l), Some(r)) = (left, right) {
        let l_node = inner.fetch(l)?;
        let r_node = inner.fetch(r)?;
        if l_node.kind() == crate::node::NodeKind::Text && r_node.kind() == crate::node::NodeKind::Text {
            merge_survivor_old_content_hash = Some(crate::node::image::hash_of(&l_node));
            let r_value = r_node.as_valued().expect("text node is valued").value().to_vec();
            let r_right_sibling = r_node.as_structural().expect("text node is structural").right_sibling();
            {
                let l_mut = inner.page_tx.prepare_entry_for_modification(l, RecordKind::Node, 0)?;
                let mut merged = l_mut.as_valued().expect("text node is valued").value().to_vec();
                merged.extend_from_slice(&r_value);
                l_mut.as_valued_mut().expect("text node is valued").set_value(merged);
                l_mut
                    .as_structural_mut()
                    .expect("text node is structural")
                    .set_right_sibling(r_right_sibling);
            }
            if let Some(rr) = r_right_sibling {
                let rr_mut = inner.page_tx.prepare_entry_for_modification(rr, RecordKind::Node, 0)?;
                rr_mut
                    .as_structural_mut()
                    .expect("structural neighbour")
                    .set_left_sibling(Some(l));
            }
            inner.page_tx.remove_entry(r, RecordKind::Node, 0)?;
            concatenated = true;
            new_right = r_right_sibling;
        }
    }

    if let Some(l) = left {
        inner
            .page_tx
            .prepare_entry_for_modification(l, RecordKind::Node, 0)?
            .as_structural_mut()
            .expect("left neighbour is structural")
            .set_right_sibling(new_right);
    }
    if let Some(r) = new_right {
        inner
            .page_tx
            .prepare_entry_for_modification(r, RecordKind::Node, 0)?
            .as_structural_mut()
            .expect("right neighbour is structural")
            .set_left_sibling(left);
    }

    {
        let parent_mut = inner
            .page_tx
            .prepare_entry_for_modification(parent, RecordKind::Node, 0)?;
        let parent_mut = parent_mut
            .as_structural_mut()
            .ok_or_else(|| wrong_kind(parent.get(), "?", "remove"))?;
        parent_mut.set_child_count(parent_mut.child_count().saturating_sub(1));
        if was_first_child {
            parent_mut.set_first_child(new_right);
        }
        if concatenated {
            parent_mut.set_child_count(parent_mut.child_count().saturating_sub(1));
            parent_mut.set_descendant_count(parent_mut.descendant_count().saturating_sub(1));
        }
    }

    Ok(RemoveOutcome {
        parent,
        was_first_child,
        concatenated,
        merge_survivor: left,
        merge_survivor_old_content_hash,
    })
}

/// The second half of I3's merge-on-remove adjustment: `unlink_structural`
/// already decremented `parent`'s own `child_count`/`descendant_count` by
/// the extra one the text merge accounts for; this walks every ancestor
/// *above* `parent` and decrements `descendant_count` by one each, per
/// spec.md's "walk ancestors decrementing descendant_count". Called
/// whenever `RemoveOutcome::concatenated` is `true`, independent of hash
/// mode — a text merge changes topology depth regardless of whether
/// hashing is enabled.
pub(crate) fn decrement_ancestors_above(inner: &mut Inner, parent: NodeKey) -> WtxResult<()> {
    let mut key = inner.fetch(parent)?.logical_parent();
    while let Some(current_key) = key {
        let next_key;
        {
            let node = inner
                .page_tx
                .prepare_entry_for_modification(current_key, RecordKind::Node, 0)?;
            if let Some(structural) = node.as_structural_mut() {
                structural.set_descendant_count(structural.descendant_count().saturating_sub(1));
            }
            next_key = node.logical_parent();
        }
        key = next_key;
    }
    Ok(())
}
