// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! `copy_subtree_as_{first_child,left_sibling,right_sibling}(other_trx)`:
//! replays a source subtree through insert operations.
//!
//! The source is another `NodeWriteTrx` handle (possibly `self`, for an
//! intra-document copy) positioned, via an explicit source key, on the
//! subtree root to duplicate. Unlike `insert_subtree_as_*` (which replays
//! a flat *event stream* whose names arrive as `QName`s the caller
//! supplies), a cross-transaction copy has no such stream: the source
//! subtree's names are already interned name ids in the source's own page
//! transaction, and this crate has no name-reversal capability (un-interning
//! a key back to a string belongs to the page layer). So a copy clones
//! node *records* directly — reusing each
//! node's existing `prefix_key`/`local_name_key`/`uri_key`/`path_node_key`
//! verbatim rather than re-deriving them through
//! `PathSummaryWriter::get_path_node_key` — and only resets the fields that
//! must be fresh in the destination: node key, structural pointers, hash,
//! and DeweyID. See DESIGN.md for the reasoning behind reusing
//! `path_node_key` as-is.
//!
//! Implementation shape: read the whole source subtree into a plain,
//! source-independent `ClonedTree` snapshot first (briefly locking
//! `source`, then releasing it), and only afterwards allocate keys and
//! write into `self`. This two-phase split means `self` and `source` are
//! never locked at the same time even when they are the same handle
//! (copying a subtree to another position within the same document).

use crate::error::WtxResult;
use crate::hash::HashKind;
use crate::index::IndexChangeType;
use crate::node::record::{AttributeNode, CommentNode, ElementNode, NamespaceNode, PiNode, TextNode};
use crate::node::{Node, NodeKey};
use crate::page::RecordKind;
use crate::wtx::{hashchain, topology, Inner, InsertPos, NodeWriteTrx};

/// An in-memory, source-independent snapshot of one subtree, read once
/// from the source transaction before any mutation of the destination
/// begins.
struct ClonedTree {
    node: Node,
    namespaces: Vec<Node>,
    attributes: Vec<Node>,
    children: Vec<ClonedTree>,
}

fn read_subtree(source: &Inner, key: NodeKey) -> WtxResult<ClonedTree> {
    let node = source.fetch(key)?;
    let mut namespaces = Vec::new();
    let mut attributes = Vec::new();
    if let Node::Element(element) = &node {
        for ns_key in &element.namespaces {
            namespaces.push(source.fetch(*ns_key)?);
        }
        for attr_key in &element.attributes {
            attributes.push(source.fetch(*attr_key)?);
        }
    }
    let mut children = Vec::new();
    if let Some(structural) = node.as_structural() {
        let mut child = structural.first_child();
        while let Some(child_key) = child {
            let child_node = source.fetch(child_key)?;
            children.push(read_subtree(source, child_key)?);
            child = child_node.as_structural().and_then(|s| s.right_sibling());
        }
    }
    Ok(ClonedTree {
        node,
        namespaces,
        attributes,
        children,
    })
}

/// A structural clone of `src`, stamped with `key`, cleared structural
/// pointers, `hash = 0` and `dewey_id = None` — everything a freshly
/// inserted node needs, matching `NodeFactory`'s own defaults.
fn clone_shape(src: &Node, key: NodeKey) -> Node {
    match src {
        Node::DocumentRoot(_) => unreachable!("document root is never copied"),
        Node::Element(e) => Node::Element(ElementNode {
            key,
            parent: None,
            first_child: None,
            left_sibling: None,
            right_sibling: None,
            child_count: 0,
            descendant_count: 0,
            hash: 0,
            prefix_key: e.prefix_key,
            local_name_key: e.local_name_key,
            uri_key: e.uri_key,
            path_node_key: e.path_node_key,
            attributes: Vec::new(),
            namespaces: Vec::new(),
            dewey_id: None,
        }),
        Node::Text(t) => Node::Text(TextNode {
            key,
            parent: None,
            first_child: None,
            left_sibling: None,
            right_sibling: None,
            child_count: 0,
            descendant_count: 0,
            hash: 0,
            value: t.value.clone(),
            dewey_id: None,
        }),
        Node::Comment(c) => Node::Comment(CommentNode {
            key,
            parent: None,
            first_child: None,
            left_sibling: None,
            right_sibling: None,
            child_count: 0,
            descendant_count: 0,
            hash: 0,
            value: c.value.clone(),
            dewey_id: None,
        }),
        Node::ProcessingInstruction(p) => Node::ProcessingInstruction(PiNode {
            key,
            parent: None,
            first_child: None,
            left_sibling: None,
            right_sibling: None,
            child_count: 0,
            descendant_count: 0,
            hash: 0,
            prefix_key: p.prefix_key,
            local_name_key: p.local_name_key,
            uri_key: p.uri_key,
            path_node_key: p.path_node_key,
            value: p.value.clone(),
            dewey_id: None,
        }),
        Node::Attribute(_) | Node::Namespace(_) => {
            unreachable!("attributes/namespaces cloned via clone_side_entry")
        }
    }
}

/// Same idea as [`clone_shape`] for an attribute or namespace hanging off
/// `owner`.
fn clone_side_entry(src: &Node, key: NodeKey, owner: NodeKey) -> Node {
    match src {
        Node::Attribute(a) => Node::Attribute(AttributeNode {
            key,
            owner,
            prefix_key: a.prefix_key,
            local_name_key: a.local_name_key,
            uri_key: a.uri_key,
            path_node_key: a.path_node_key,
            value: a.value.clone(),
            hash: 0,
            dewey_id: None,
        }),
        Node::Namespace(n) => Node::Namespace(NamespaceNode {
            key,
            owner,
            prefix_key: n.prefix_key,
            local_name_key: n.local_name_key,
            uri_key: n.uri_key,
            path_node_key: n.path_node_key,
            hash: 0,
            dewey_id: None,
        }),
        _ => unreachable!("clone_side_entry only handles attribute/namespace nodes"),
    }
}

impl Inner {
    /// Materializes a [`ClonedTree`] into this transaction's page store
    /// with freshly allocated keys, wiring up structural pointers among
    /// the copied nodes as they are created. The *top-level* root's
    /// `parent`/siblings are left for the caller to set via the insert
    /// site.
    fn materialize(&mut self, tree: &ClonedTree) -> WtxResult<NodeKey> {
        let new_key = self.page_tx.allocate_key();
        let new_node = clone_shape(&tree.node, new_key);
        self.page_tx.insert_record(new_node, RecordKind::Node, 0)?;

        if !tree.namespaces.is_empty() || !tree.attributes.is_empty() {
            let mut new_namespaces = Vec::with_capacity(tree.namespaces.len());
            for (idx, ns_src) in tree.namespaces.iter().enumerate() {
                let new_ns_key = self.page_tx.allocate_key();
                let new_ns = clone_side_entry(ns_src, new_ns_key, new_key);
                self.page_tx.insert_record(new_ns, RecordKind::Namespace, idx)?;
                new_namespaces.push(new_ns_key);
            }
            let mut new_attributes = Vec::with_capacity(tree.attributes.len());
            for (idx, attr_src) in tree.attributes.iter().enumerate() {
                let new_attr_key = self.page_tx.allocate_key();
                let new_attr = clone_side_entry(attr_src, new_attr_key, new_key);
                self.page_tx.insert_record(new_attr, RecordKind::Attribute, idx)?;
                new_attributes.push(new_attr_key);
            }
            let rec = self
                .page_tx
                .prepare_entry_for_modification(new_key, RecordKind::Node, 0)?;
            let elem = rec.as_element_mut().expect("namespaces/attributes only exist on Element");
            elem.namespaces = new_namespaces;
            elem.attributes = new_attributes;
        }

        let mut prev_new_child: Option<NodeKey> = None;
        for child in &tree.children {
            let new_child_key = self.materialize(child)?;
            {
                let rec = self
                    .page_tx
                    .prepare_entry_for_modification(new_child_key, RecordKind::Node, 0)?;
                let s = rec.as_structural_mut().expect("structural clone");
                s.set_parent(Some(new_key));
                s.set_left_sibling(prev_new_child);
            }
            if let Some(prev) = prev_new_child {
                self.page_tx
                    .prepare_entry_for_modification(prev, RecordKind::Node, 0)?
                    .as_structural_mut()
                    .expect("structural clone")
                    .set_right_sibling(Some(new_child_key));
            } else {
                self.page_tx
                    .prepare_entry_for_modification(new_key, RecordKind::Node, 0)?
                    .as_structural_mut()
                    .expect("just cloned a structural node")
                    .set_first_child(Some(new_child_key));
            }
            prev_new_child = Some(new_child_key);
        }
        if !tree.children.is_empty() {
            self.page_tx
                .prepare_entry_for_modification(new_key, RecordKind::Node, 0)?
                .as_structural_mut()
                .expect("just cloned a structural node")
                .set_child_count(tree.children.len() as u64);
        }

        Ok(new_key)
    }

    pub(crate) fn copy_subtree_snapshot(
        &mut self,
        snapshot: &ClonedTree,
        pos: InsertPos,
    ) -> WtxResult<NodeKey> {
        let anchor = self.require_structural_cursor("copy_subtree")?;
        let site = topology::resolve_insert_site(&anchor, pos)?;

        self.bulk_insert = true;
        let result = self.materialize(snapshot);
        self.bulk_insert = false;
        let new_root = result?;

        {
            let rec = self
                .page_tx
                .prepare_entry_for_modification(new_root, RecordKind::Node, 0)?;
            let s = rec.as_structural_mut().expect("copied root is structural");
            s.set_parent(Some(site.parent));
            s.set_left_sibling(site.left);
            s.set_right_sibling(site.right);
        }
        topology::splice_in(self, &site, new_root)?;

        let update_hash = self.config.hash_kind != HashKind::None;
        let (root_hash, root_descendant_count) = hashchain::postorder_recompute(self, new_root, update_hash)?;
        hashchain::rolling_insert_chain(self, site.parent, root_hash, Some(root_descendant_count), update_hash)?;

        self.notify_subtree(new_root, IndexChangeType::Insert)?;
        self.modification_count += 1;
        self.cursor = new_root;
        Ok(new_root)
    }
}

impl NodeWriteTrx {
    /// Reads `src_root`'s subtree out of `source` into a standalone
    /// snapshot, with `source`'s lock held only for the duration of this
    /// read.
    fn snapshot_subtree(source: &NodeWriteTrx, src_root: NodeKey) -> WtxResult<ClonedTree> {
        let guard = source.inner.lock();
        let state = guard.borrow();
        read_subtree(&state, src_root)
    }

    pub fn copy_subtree_as_first_child(&self, source: &NodeWriteTrx, src_root: NodeKey) -> WtxResult<NodeKey> {
        let snapshot = Self::snapshot_subtree(source, src_root)?;
        self.run(|state| state.copy_subtree_snapshot(&snapshot, InsertPos::FirstChild))
    }

    pub fn copy_subtree_as_left_sibling(&self, source: &NodeWriteTrx, src_root: NodeKey) -> WtxResult<NodeKey> {
        let snapshot = Self::snapshot_subtree(source, src_root)?;
        self.run(|state| state.copy_subtree_snapshot(&snapshot, InsertPos::LeftSibling))
    }

    pub fn copy_subtree_as_right_sibling(&self, source: &NodeWriteTrx, src_root: NodeKey) -> WtxResult<NodeKey> {
        let snapshot = Self::snapshot_subtree(source, src_root)?;
        self.run(|state| state.copy_subtree_snapshot(&snapshot, InsertPos::RightSibling))
    }
}
