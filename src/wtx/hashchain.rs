// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! Walks the ancestor chain (structural parent, or owning element for an
//! attribute/namespace) applying the ROLLING hash formulas, and the
//! POSTORDER bulk recompute used by subtree insert.
//!
//! Each walk reduces to the same shape: touch one node at a time via
//! `prepare_entry_for_modification`, derive its new hash from its old hash
//! and the child contribution that changed, then rise to its logical
//! parent carrying the old/new hash pair forward as the next level's
//! child contribution — never two mutable views held at once.
//!
//! Hash computation itself is skipped when hashing is disabled
//! (`HashKind::None`) — callers pass `update_hash`/`write_hash` to each
//! function here rather than gating the call entirely, because
//! `descendant_count` maintenance (I3) rides along the same ancestor
//! walk and must happen unconditionally, independent of hash mode.

use crate::hash::{postorder, rolling};
use crate::node::{Node, NodeKey};
use crate::page::RecordKind;
use crate::wtx::Inner;
use crate::error::WtxResult;

/// Rolling hash maintenance after inserting a fresh node (possibly a whole
/// subtree, in which case `subtree_descendant_count` is that subtree's
/// `descendant_count` rather than `0`) whose own hash is `new_node_hash`
/// under `parent_key`.
/// `count_delta`: the `descendant_count` each ancestor gains, or `None` to
/// leave `descendant_count` untouched entirely — attributes and
/// namespaces fold into their owner's hash (I9) but are not structural
/// descendants (I3), so an attribute/namespace insert passes `None` while
/// an element/text/comment/PI insert passes `Some(subtree_descendant_count)`.
/// `update_hash`: whether the ancestor chain's rolling hash should be
/// touched at all. `descendant_count` maintenance (I3) is required after
/// every structural insert regardless of hash mode, so `count_delta` is
/// always honored even when `update_hash` is `false` (`HashKind::None`);
/// only the hash computation and the resulting `set_hash` calls are
/// skipped in that case.
pub(crate) fn rolling_insert_chain(
    inner: &mut Inner,
    parent_key: NodeKey,
    new_node_hash: i64,
    count_delta: Option<u64>,
    update_hash: bool,
) -> WtxResult<()> {
    if !update_hash && count_delta.is_none() {
        return Ok(());
    }
    let mut key = Some(parent_key);
    let mut level = 0u32;
    let mut prev_old = 0i64;
    let mut prev_new = new_node_hash;
    while let Some(current_key) = key {
        let old_hash;
        let new_hash;
        let next_key;
        {
            let node = inner.page_tx.prepare_entry_for_modification(current_key, RecordKind::Node, 0)?;
            old_hash = node.hash();
            new_hash = if update_hash {
                if level == 0 {
                    rolling::parent_hash_after_insert(old_hash, new_node_hash)
                } else {
                    rolling::ancestor_hash_after_refold(old_hash, prev_old, prev_new)
                }
            } else {
                old_hash
            };
            if update_hash {
                node.set_hash(new_hash);
            }
            if let Some(d) = count_delta {
                if let Some(structural) = node.as_structural_mut() {
                    structural.set_descendant_count(structural.descendant_count() + d + 1);
                }
            }
            next_key = node.logical_parent();
        }
        prev_old = old_hash;
        prev_new = new_hash;
        level += 1;
        key = next_key;
    }
    Ok(())
}

/// Rolling hash maintenance after removing a node whose hash was
/// `removed_hash` and whose own `descendant_count` was
/// `removed_descendant_count`, starting from its (former) parent.
/// `update_hash`: see `rolling_insert_chain`. `count_delta` (I3's
/// descendant-count upkeep) is honored unconditionally; only hash
/// computation is gated.
pub(crate) fn rolling_remove_chain(
    inner: &mut Inner,
    parent_key: NodeKey,
    removed_hash: i64,
    count_delta: Option<u64>,
    update_hash: bool,
) -> WtxResult<()> {
    if !update_hash && count_delta.is_none() {
        return Ok(());
    }
    let drop_count = count_delta.map(|d| d + 1);
    let mut key = Some(parent_key);
    let mut level = 0u32;
    let mut prev_old = removed_hash;
    let mut prev_new = 0i64;
    while let Some(current_key) = key {
        let old_hash;
        let new_hash;
        let next_key;
        {
            let node = inner.page_tx.prepare_entry_for_modification(current_key, RecordKind::Node, 0)?;
            old_hash = node.hash();
            new_hash = if update_hash {
                if level == 0 {
                    rolling::parent_hash_after_remove(old_hash, removed_hash)
                } else {
                    rolling::ancestor_hash_after_refold(old_hash, prev_old, prev_new)
                }
            } else {
                old_hash
            };
            if update_hash {
                node.set_hash(new_hash);
            }
            if let Some(d) = drop_count {
                if let Some(structural) = node.as_structural_mut() {
                    structural.set_descendant_count(structural.descendant_count().saturating_sub(d));
                }
            }
            next_key = node.logical_parent();
        }
        prev_old = old_hash;
        prev_new = new_hash;
        level += 1;
        key = next_key;
    }
    Ok(())
}

/// Rolling hash maintenance after a rename/revalue: `node_key`'s own
/// content hash changed from `old_content_hash` to `new_content_hash`
/// (descendant counts are untouched — renaming changes no topology).
pub(crate) fn rolling_update_chain(
    inner: &mut Inner,
    node_key: NodeKey,
    old_content_hash: i64,
    new_content_hash: i64,
) -> WtxResult<()> {
    let (mut prev_old, mut prev_new, mut key);
    {
        let node = inner.page_tx.prepare_entry_for_modification(node_key, RecordKind::Node, 0)?;
        let old_hash = node.hash();
        let new_hash = rolling::self_hash_after_update(old_hash, old_content_hash, new_content_hash);
        node.set_hash(new_hash);
        key = node.logical_parent();
        prev_old = old_hash;
        prev_new = new_hash;
    }
    while let Some(current_key) = key {
        let old_hash;
        let new_hash;
        let next_key;
        {
            let node = inner.page_tx.prepare_entry_for_modification(current_key, RecordKind::Node, 0)?;
            old_hash = node.hash();
            new_hash = rolling::ancestor_hash_after_refold(old_hash, prev_old, prev_new);
            node.set_hash(new_hash);
            next_key = node.logical_parent();
        }
        prev_old = old_hash;
        prev_new = new_hash;
        key = next_key;
    }
    Ok(())
}

/// Full POSTORDER recompute of the subtree rooted at `key`: namespaces,
/// then attributes, then structural children, in that order, folding each
/// into its parent via `postorder::fold`. Always recomputes and writes
/// every node's `descendant_count` (I3 holds regardless of hash mode);
/// `write_hash` additionally gates whether hashes are computed and
/// written at all (`HashKind::None` skips that work entirely). Returns
/// the root's new `(hash, descendant_count)` — `hash` is `0` when
/// `write_hash` is `false`.
pub(crate) fn postorder_recompute(inner: &mut Inner, key: NodeKey, write_hash: bool) -> WtxResult<(i64, u64)> {
    let node = inner.fetch(key)?;
    let mut child_hashes = Vec::new();
    let mut descendant_count = 0u64;

    if write_hash {
        if let Node::Element(element) = &node {
            for ns_key in element.namespaces.clone() {
                let ns = inner.fetch(ns_key)?;
                let h = crate::node::image::hash_of(&ns);
                inner
                    .page_tx
                    .prepare_entry_for_modification(ns_key, RecordKind::Namespace, 0)?
                    .set_hash(h);
                child_hashes.push(h);
            }
            for attr_key in element.attributes.clone() {
                let attr = inner.fetch(attr_key)?;
                let h = crate::node::image::hash_of(&attr);
                inner
                    .page_tx
                    .prepare_entry_for_modification(attr_key, RecordKind::Attribute, 0)?
                    .set_hash(h);
                child_hashes.push(h);
            }
        }
    }

    if let Some(structural) = node.as_structural() {
        let mut child = structural.first_child();
        while let Some(child_key) = child {
            let (child_hash, child_descendants) = postorder_recompute(inner, child_key, write_hash)?;
            if write_hash {
                child_hashes.push(child_hash);
            }
            descendant_count += child_descendants + 1;
            let child_node = inner.fetch(child_key)?;
            child = child_node.as_structural().and_then(|s| s.right_sibling());
        }
    }

    let folded = if write_hash {
        let own_content_hash = crate::node::image::hash_of(&node);
        postorder::fold(own_content_hash, child_hashes)
    } else {
        0
    };
    {
        let rec = inner.page_tx.prepare_entry_for_modification(key, RecordKind::Node, 0)?;
        if write_hash {
            rec.set_hash(folded);
        }
        if let Some(s) = rec.as_structural_mut() {
            s.set_descendant_count(descendant_count);
        }
    }
    Ok((folded, descendant_count))
}
