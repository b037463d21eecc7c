// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! End-to-end boundary scenarios, driven through the public
//! `NodeWriteTrx` API against the in-memory `MockPageTx`/
//! `MockPathSummaryWriter` test doubles. Unlike the per-module unit tests
//! (`wtx::topology`, `hash::rolling`, ...), these exercise whole sequences
//! of operations the way a caller actually would and check the tree shape
//! that comes out the other end.

use crate::config::TransactionConfig;
use crate::error::WtxError;
use crate::factory::{DefaultNodeFactory, NodeFactory};
use crate::hash::HashKind;
use crate::node::{Node, NodeKey, Structural};
use crate::page::mock::MockPageTx;
use crate::page::{PageTx, RecordKind};
use crate::path_summary::MockPathSummaryWriter;
use crate::qname::QName;
use crate::wtx::{Movement, NodeWriteTrx, NodeWriteTrxBuilder};

fn new_trx_with_config(config: TransactionConfig) -> NodeWriteTrx {
    let mut page_tx = MockPageTx::new();
    let factory = DefaultNodeFactory;
    let root_key = page_tx.allocate_key();
    let root = factory.new_document_root(root_key);
    page_tx.insert_record(root, RecordKind::Node, 0).unwrap();
    NodeWriteTrxBuilder::new(
        Box::new(page_tx),
        Box::new(factory),
        Box::new(MockPathSummaryWriter::new()),
        root_key,
    )
    .with_config(config)
    .build()
}

fn new_trx() -> NodeWriteTrx {
    new_trx_with_config(TransactionConfig::default())
}

/// A document-order shape descriptor for one node, used to assert tree
/// structure without depending on interned name-key allocation order.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Shape {
    Elem(NodeKey),
    Text(String),
    Comment(String),
}

/// Flattens the subtree *below* `key` (not `key` itself) into document
/// order, the way `<r><a/><b/>xy</r>` reads left to right.
fn subtree_shape(trx: &NodeWriteTrx, key: NodeKey) -> Vec<Shape> {
    let mut out = Vec::new();
    append_children(trx, key, &mut out);
    out
}

fn append_children(trx: &NodeWriteTrx, key: NodeKey, out: &mut Vec<Shape>) {
    let node = trx.run(|state| state.fetch(key)).expect("node exists");
    let Some(structural) = node.as_structural() else { return };
    let mut child = structural.first_child();
    while let Some(child_key) = child {
        let child_node = trx.run(|state| state.fetch(child_key)).expect("child exists");
        match &child_node {
            Node::Element(_) => out.push(Shape::Elem(child_key)),
            Node::Text(t) => out.push(Shape::Text(String::from_utf8(t.value.clone()).unwrap())),
            Node::Comment(c) => out.push(Shape::Comment(String::from_utf8(c.value.clone()).unwrap())),
            Node::DocumentRoot(_) | Node::ProcessingInstruction(_) | Node::Attribute(_) | Node::Namespace(_) => {}
        }
        append_children(trx, child_key, out);
        child = child_node.as_structural().and_then(|s| s.right_sibling());
    }
}

fn child_count(trx: &NodeWriteTrx, key: NodeKey) -> u64 {
    let node = trx.run(|state| state.fetch(key)).expect("node exists");
    node.as_structural().expect("structural").child_count()
}

fn descendant_count(trx: &NodeWriteTrx, key: NodeKey) -> u64 {
    let node = trx.run(|state| state.fetch(key)).expect("node exists");
    node.descendant_count()
}

// Scenario 1: empty document with root element `<r/>`, insert `<a/>` as
// first child, `<b/>` as right sibling of `a`, text "x" as right sibling of
// `b`, text "y" as right sibling of that text node. Expected after commit:
// `<r><a/><b/>xy</r>` (text-merge invariant); r.child_count=3;
// r.descendant_count=3.
#[test]
fn scenario_1_insert_sequence_and_text_merge() {
    let trx = new_trx();

    trx.insert_element_as_first_child(QName::new("r")).unwrap();
    let r = trx.cursor();

    trx.insert_element_as_first_child(QName::new("a")).unwrap();
    let a = trx.cursor();

    trx.move_to(a).unwrap();
    trx.insert_element_as_right_sibling(QName::new("b")).unwrap();
    let b = trx.cursor();

    trx.move_to(b).unwrap();
    trx.insert_text_as_right_sibling("x").unwrap();
    trx.insert_text_as_right_sibling("y").unwrap();

    trx.commit(None).unwrap();

    assert_eq!(
        subtree_shape(&trx, r),
        vec![Shape::Elem(a), Shape::Elem(b), Shape::Text("xy".into())],
        "text 'x' and 'y' must merge into one text node (I4)"
    );
    assert_eq!(child_count(&trx, r), 3);
    assert_eq!(descendant_count(&trx, r), 3);
}

// Scenario 2: same setup with HashKind::Rolling; after every step the
// rolling hash recomputed from scratch via POSTORDER must match the stored
// value.
#[test]
fn scenario_2_rolling_hash_matches_postorder_recompute_at_every_step() {
    let trx = new_trx_with_config(TransactionConfig::default().with_hash_kind(HashKind::Rolling));

    trx.insert_element_as_first_child(QName::new("r")).unwrap();
    let r = trx.cursor();
    assert_hash_matches_postorder(&trx, r);

    trx.insert_element_as_first_child(QName::new("a")).unwrap();
    let a = trx.cursor();
    assert_hash_matches_postorder(&trx, r);

    trx.move_to(a).unwrap();
    trx.insert_element_as_right_sibling(QName::new("b")).unwrap();
    let b = trx.cursor();
    assert_hash_matches_postorder(&trx, r);

    trx.move_to(b).unwrap();
    trx.insert_text_as_right_sibling("x").unwrap();
    assert_hash_matches_postorder(&trx, r);

    trx.insert_text_as_right_sibling("y").unwrap();
    assert_hash_matches_postorder(&trx, r);
}

/// Recomputes the whole subtree's hash from scratch via POSTORDER and
/// checks it against the rolling hash already stored — the two maintenance
/// strategies must agree bit-for-bit after every single edit.
fn assert_hash_matches_postorder(trx: &NodeWriteTrx, root: NodeKey) {
    let stored = trx.run(|state| state.fetch(root)).unwrap().hash();
    let recomputed = trx
        .run(|state| crate::wtx::hashchain::postorder_recompute(state, root))
        .unwrap()
        .0;
    assert_eq!(stored, recomputed, "rolling hash diverged from postorder recompute");
}

// Scenario 3: move the subtree rooted at `a` (from scenario 1's result) to
// become the right sibling of the text node. Expected result:
// `<r><b/>xy<a/></r>`; child_count=3; descendant_count=3; attempt to move
// `a` under itself fails with a usage-taxonomy error.
#[test]
fn scenario_3_move_subtree_and_self_move_rejected() {
    let trx = new_trx();
    trx.insert_element_as_first_child(QName::new("r")).unwrap();
    let r = trx.cursor();
    trx.insert_element_as_first_child(QName::new("a")).unwrap();
    let a = trx.cursor();
    trx.insert_element_as_right_sibling(QName::new("b")).unwrap();
    let b = trx.cursor();
    trx.insert_text_as_right_sibling("x").unwrap();
    trx.insert_text_as_right_sibling("y").unwrap();
    let text = trx.cursor();

    trx.move_to(text).unwrap();
    trx.move_subtree_to_right_sibling(a).unwrap();

    assert_eq!(
        subtree_shape(&trx, r),
        vec![Shape::Elem(b), Shape::Text("xy".into()), Shape::Elem(a)]
    );
    assert_eq!(child_count(&trx, r), 3);
    assert_eq!(descendant_count(&trx, r), 3);

    trx.move_to(a).unwrap();
    let err = trx.move_subtree_to_first_child(a).unwrap_err();
    assert!(matches!(err, WtxError::SelfMove { .. }));
}

// Scenario 4: remove the `b` element in `<r><a/><b/>xy</r>`. "x" and "y"
// already merged into one text node at insert time (I4 applies on insert
// too), so `b`'s neighbours going into the remove are `a` (element) and the
// merged text — only one side is text, so no further merge happens here.
#[test]
fn scenario_4_remove_merges_adjacent_text() {
    let trx = new_trx();
    trx.insert_element_as_first_child(QName::new("r")).unwrap();
    let r = trx.cursor();
    trx.insert_element_as_first_child(QName::new("a")).unwrap();
    let a = trx.cursor();
    trx.insert_element_as_right_sibling(QName::new("b")).unwrap();
    let b = trx.cursor();
    trx.insert_text_as_right_sibling("x").unwrap();
    trx.insert_text_as_right_sibling("y").unwrap();

    assert_eq!(descendant_count(&trx, r), 3, "a, b and the already-merged 'xy' text");

    trx.move_to(b).unwrap();
    trx.remove().unwrap();

    assert_eq!(subtree_shape(&trx, r), vec![Shape::Elem(a), Shape::Text("xy".into())]);
    assert_eq!(child_count(&trx, r), 2);
    assert_eq!(descendant_count(&trx, r), 2);
}

// Scenario 4b: `<r>"x"<mid/>"y"</r>` — "x" and "y" are kept apart by `mid`
// at insert time, so they never merge there. Removing `mid` brings two
// genuine, distinct text nodes into adjacency and must merge them (I4),
// with the rolling hash on the survivor kept in sync (I9).
#[test]
fn scenario_4b_remove_merges_two_previously_unmerged_text_nodes() {
    let trx = new_trx_with_config(TransactionConfig::default().with_hash_kind(HashKind::Rolling));
    trx.insert_element_as_first_child(QName::new("r")).unwrap();
    let r = trx.cursor();
    trx.insert_text_as_first_child("x").unwrap();
    let text_x = trx.cursor();
    trx.insert_element_as_right_sibling(QName::new("mid")).unwrap();
    let mid = trx.cursor();
    trx.insert_text_as_right_sibling("y").unwrap();

    assert_eq!(descendant_count(&trx, r), 3);
    assert_hash_matches_postorder(&trx, r);

    trx.move_to(mid).unwrap();
    trx.remove().unwrap();

    assert_eq!(subtree_shape(&trx, r), vec![Shape::Text("xy".into())]);
    assert_eq!(child_count(&trx, r), 1);
    assert_eq!(descendant_count(&trx, r), 1);
    assert_hash_matches_postorder(&trx, r);

    let merged = trx.run(|state| state.fetch(text_x)).unwrap();
    assert_eq!(merged.as_valued().unwrap().value(), b"xy");
}

// Scenario 5: insert_attribute(qn("x"), "1") twice with the same name on
// the same element overwrites the first's value instead of adding a new
// attribute; duplicate prefix for a namespace raises a usage-taxonomy
// error.
#[test]
fn scenario_5_duplicate_attribute_overwrites_duplicate_namespace_rejected() {
    let trx = new_trx();
    trx.insert_element_as_first_child(QName::new("r")).unwrap();

    let key1 = trx.insert_attribute(QName::new("x"), "1").unwrap();
    let key2 = trx.insert_attribute(QName::new("x"), "2").unwrap();
    assert_eq!(key1, key2, "second insert_attribute with the same name must overwrite, not append");

    let node = trx.run(|state| state.fetch(key1)).unwrap();
    assert_eq!(node.as_valued().unwrap().value(), b"2");

    let current = trx.current_node().unwrap();
    assert_eq!(current.as_element().unwrap().attributes().len(), 1);

    trx.insert_namespace(QName::with_prefix("ns", "local", "urn:example")).unwrap();
    let err = trx
        .insert_namespace(QName::with_prefix("ns", "other", "urn:example2"))
        .unwrap_err();
    assert!(matches!(err, WtxError::DuplicateNamespace { .. }));
}

// `insert_attribute`/`insert_namespace` default to leaving the cursor on
// the owning element; `Movement::ToNode` moves it onto the attribute or
// namespace node just created instead.
#[test]
fn insert_attribute_and_namespace_movement_controls_cursor() {
    let trx = new_trx();
    trx.insert_element_as_first_child(QName::new("r")).unwrap();
    let r = trx.cursor();

    let attr_key = trx
        .insert_attribute_with_movement(QName::new("x"), "1", Movement::ToNode)
        .unwrap();
    assert_eq!(trx.cursor(), attr_key, "Movement::ToNode must move the cursor onto the attribute");

    trx.move_to(r).unwrap();
    let ns_key = trx
        .insert_namespace_with_movement(QName::with_prefix("ns", "local", "urn:example"), Movement::ToNode)
        .unwrap();
    assert_eq!(trx.cursor(), ns_key, "Movement::ToNode must move the cursor onto the namespace");

    trx.move_to(r).unwrap();
    trx.insert_attribute(QName::new("y"), "2").unwrap();
    assert_eq!(trx.cursor(), r, "plain insert_attribute must leave the cursor on the owning element");
}

// Scenario 6: commit, then revert_to(previous revision): the tree matches
// the pre-insert state exactly; a subsequent commit creates a new revision
// whose parent is the reverted-to revision's state (not the discarded
// revision 2).
#[test]
fn scenario_6_revert_to_restores_prior_revision() {
    let trx = new_trx();
    trx.insert_element_as_first_child(QName::new("r")).unwrap();
    let r = trx.cursor();
    let creds_rev1 = trx.commit(None).unwrap();
    assert_eq!(creds_rev1.revision, 1);

    trx.move_to(r).unwrap();
    trx.insert_element_as_first_child(QName::new("a")).unwrap();
    let creds_rev2 = trx.commit(None).unwrap();
    assert_eq!(creds_rev2.revision, 2);
    assert_eq!(child_count(&trx, r), 1);

    trx.revert_to(1).unwrap();
    assert_eq!(trx.cursor(), trx.document_root());
    assert_eq!(child_count(&trx, r), 0, "revert_to(1) must restore the pre-insert-of-a state");
    assert!(subtree_shape(&trx, r).is_empty());

    trx.move_to(r).unwrap();
    trx.insert_element_as_first_child(QName::new("c")).unwrap();
    let creds_rev3 = trx.commit(None).unwrap();
    assert_eq!(
        creds_rev3.revision, 3,
        "commit after revert_to produces the next revision regardless of how much history existed beyond the reverted-to point"
    );
}

#[test]
fn close_refuses_with_uncommitted_modifications() {
    let trx = new_trx();
    trx.insert_element_as_first_child(QName::new("r")).unwrap();
    let err = trx.close().unwrap_err();
    assert!(matches!(err, WtxError::UncommittedOnClose { pending: 1 }));
    trx.commit(None).unwrap();
    trx.close().unwrap();
}

#[test]
fn hash_mode_none_leaves_hash_at_zero() {
    let trx = new_trx_with_config(TransactionConfig::default().with_hash_kind(HashKind::None));
    trx.insert_element_as_first_child(QName::new("r")).unwrap();
    let r = trx.cursor();
    trx.insert_element_as_first_child(QName::new("a")).unwrap();
    let node = trx.run(|state| state.fetch(r)).unwrap();
    assert_eq!(node.hash(), 0);
}

#[test]
fn dewey_ids_strictly_increase_in_document_order() {
    let trx = new_trx();
    trx.insert_element_as_first_child(QName::new("r")).unwrap();
    let r = trx.cursor();
    trx.insert_element_as_first_child(QName::new("a")).unwrap();
    let a = trx.cursor();
    trx.insert_element_as_right_sibling(QName::new("b")).unwrap();
    trx.move_to(a).unwrap();
    trx.insert_text_as_right_sibling("mid").unwrap();

    let ids = preorder_dewey_ids(&trx, r);
    for pair in ids.windows(2) {
        assert!(pair[0] < pair[1], "DeweyID order must match document order: {:?}", ids);
    }
}

fn preorder_dewey_ids(trx: &NodeWriteTrx, key: NodeKey) -> Vec<crate::dewey::DeweyId> {
    let mut out = Vec::new();
    collect_dewey(trx, key, &mut out);
    out
}

fn collect_dewey(trx: &NodeWriteTrx, key: NodeKey, out: &mut Vec<crate::dewey::DeweyId>) {
    let node = trx.run(|state| state.fetch(key)).expect("node exists");
    if let Some(id) = node.dewey_id() {
        out.push(id.clone());
    }
    if let Some(structural) = node.as_structural() {
        let mut child = structural.first_child();
        while let Some(child_key) = child {
            collect_dewey(trx, child_key, out);
            let child_node = trx.run(|state| state.fetch(child_key)).expect("child exists");
            child = child_node.as_structural().and_then(|s| s.right_sibling());
        }
    }
}
