// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

use super::*;

#[test]
fn new_child_extends_one_level() {
    let root = DeweyId::document_root();
    let child = root.new_child();
    assert_eq!(child.level(), root.level() + 1);
    assert!(root < child);
}

#[test]
fn new_between_orders_strictly() {
    let root = DeweyId::document_root();
    let a = root.new_child();
    let b = DeweyId::new_between(Some(&a), None);
    assert!(a < b, "{:?} should be < {:?}", a, b);

    let mid = DeweyId::new_between(Some(&a), Some(&b));
    assert!(a < mid && mid < b, "{:?} < {:?} < {:?}", a, mid, b);
}

#[test]
fn new_between_converges_on_repeated_inserts() {
    let root = DeweyId::document_root();
    let left = root.new_child();
    let mut right = DeweyId::new_between(Some(&left), None);
    let mut previous = left.clone();
    for _ in 0..20 {
        let mid = DeweyId::new_between(Some(&previous), Some(&right));
        assert!(previous < mid);
        assert!(mid < right);
        previous = mid;
    }
    let _ = &mut right;
}

#[test]
fn attribute_and_namespace_roots_never_collide_with_children() {
    let parent = DeweyId::document_root().new_child();
    let att = parent.new_attribute();
    let ns = parent.new_namespace();
    let child = parent.new_child();
    assert_ne!(att, ns);
    assert_ne!(att, child);
    assert_ne!(ns, child);
}

#[test]
fn new_between_with_no_neighbours_falls_back_to_fresh_child() {
    let id = DeweyId::new_between(None, None);
    assert_eq!(id.components(), &[FIRST_CHILD_ROOT]);
}

#[test]
fn preorder_sequence_is_strictly_increasing() {
    // Simulate <r><a/><b/>xy</r>: r, a, b, text all siblings under r.
    let r = DeweyId::document_root().new_child(); // element r
    let a = r.new_child(); // first child of r
    let b = DeweyId::new_between(Some(&a), None); // right sibling of a
    let text = DeweyId::new_between(Some(&b), None); // right sibling of b
    let mut sequence = vec![r.clone(), a.clone(), b.clone(), text.clone()];
    let sorted = {
        let mut s = sequence.clone();
        s.sort();
        s
    };
    sequence.sort();
    assert_eq!(sequence, sorted);
    assert!(r < a);
    assert!(a < b);
    assert!(b < text);
}
