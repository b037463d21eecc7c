// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

use super::*;
use crate::node::record::{ElementNode, TextNode};

fn sample_element() -> ElementNode {
    ElementNode {
        key: NodeKey(1),
        parent: None,
        first_child: None,
        left_sibling: None,
        right_sibling: None,
        child_count: 0,
        descendant_count: 0,
        hash: 0,
        prefix_key: None,
        local_name_key: 42,
        uri_key: None,
        path_node_key: 1,
        attributes: Vec::new(),
        namespaces: Vec::new(),
        dewey_id: None,
    }
}

#[test]
fn structural_trait_round_trips_pointers() {
    let mut e = sample_element();
    e.set_parent(Some(NodeKey(9)));
    e.set_first_child(Some(NodeKey(2)));
    e.set_child_count(1);
    e.set_descendant_count(1);
    e.set_hash(123);
    assert_eq!(Structural::parent(&e), Some(NodeKey(9)));
    assert_eq!(e.first_child(), Some(NodeKey(2)));
    assert_eq!(e.child_count(), 1);
    assert_eq!(e.descendant_count(), 1);
    assert_eq!(e.hash(), 123);
}

#[test]
fn document_root_ignores_parent_and_siblings() {
    let mut root = DocumentRootNode::new(NodeKey(0));
    Structural::set_parent(&mut root, Some(NodeKey(99)));
    Structural::set_left_sibling(&mut root, Some(NodeKey(99)));
    assert_eq!(Structural::parent(&root), None);
    assert_eq!(root.left_sibling(), None);
    assert_eq!(root.right_sibling(), None);
}

#[test]
fn node_image_hash_ignores_structural_counters() {
    let mut e1 = sample_element();
    let mut e2 = sample_element();
    e1.child_count = 5;
    e1.descendant_count = 7;
    e1.hash = 999;
    e2.child_count = 0;
    e2.descendant_count = 0;
    e2.hash = 0;

    let h1 = image::hash_of(&Node::Element(e1));
    let h2 = image::hash_of(&Node::Element(e2));
    assert_eq!(h1, h2, "node image hash must not depend on counters or stored hash");
}

#[test]
fn node_image_hash_differs_by_value() {
    let t1 = TextNode {
        key: NodeKey(2),
        parent: None,
        first_child: None,
        left_sibling: None,
        right_sibling: None,
        child_count: 0,
        descendant_count: 0,
        hash: 0,
        value: b"x".to_vec(),
        dewey_id: None,
    };
    let mut t2 = t1.clone();
    t2.value = b"y".to_vec();

    let h1 = image::hash_of(&Node::Text(t1));
    let h2 = image::hash_of(&Node::Text(t2));
    assert_ne!(h1, h2);
}

#[test]
fn kind_is_structural_excludes_attribute_and_namespace() {
    assert!(!NodeKind::Attribute.is_structural());
    assert!(!NodeKind::Namespace.is_structural());
    assert!(NodeKind::Element.is_structural());
    assert!(NodeKind::Text.is_structural());
}
