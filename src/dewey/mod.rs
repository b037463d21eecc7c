// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! DeweyID arithmetic.
//!
//! A DeweyID is a variable-length sequence of positive integer components
//! encoding a node's position in the tree such that lexicographic ordering
//! of the component sequences matches document order. This module only
//! does the arithmetic (`new_between`, `new_child`, `new_attribute`,
//! `new_namespace`, `level`); assigning the results to nodes after a
//! topology change is the write transaction's job (see `crate::wtx`).
//!
//! ## Encoding
//!
//! Three reserved low-valued components partition a node's children by
//! kind so that attributes, namespaces and structural children never
//! collide:
//! - `ATTRIBUTE_ROOT = 1` — root component for a parent's attribute ids
//! - `NAMESPACE_ROOT = 2` — root component for a parent's namespace ids
//! - `FIRST_CHILD_ROOT = 3` — root component for a parent's first
//!   structural child
//!
//! Ordinary siblings then bisect the integer range between two existing
//! components (odd components are "freshly minted" midpoints, so repeated
//! inserts between the same two neighbours keep converging instead of
//! colliding).

#[cfg(test)]
mod dewey_test;

/// Root id reserved for a parent's attribute DeweyIDs.
pub const ATTRIBUTE_ROOT: i64 = 1;
/// Root id reserved for a parent's namespace DeweyIDs.
pub const NAMESPACE_ROOT: i64 = 2;
/// Root id reserved for a parent's first structural child.
pub const FIRST_CHILD_ROOT: i64 = 3;

/// A hierarchical order key whose lexicographic ordering equals document
/// order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DeweyId(Vec<i64>);

impl DeweyId {
    /// The root document's own id: a single component.
    pub fn document_root() -> Self {
        DeweyId(vec![1])
    }

    pub fn from_components(components: Vec<i64>) -> Self {
        DeweyId(components)
    }

    pub fn components(&self) -> &[i64] {
        &self.0
    }

    /// Depth of this id in the tree: one level per component after the
    /// document-root component.
    pub fn level(&self) -> usize {
        self.0.len().saturating_sub(1)
    }

    /// A fresh id strictly between `left` and `right`. Either bound may be
    /// absent (open range), but not both — use `new_child` for a node with
    /// no existing siblings on either side.
    pub fn new_between(left: Option<&DeweyId>, right: Option<&DeweyId>) -> Self {
        match (left, right) {
            (Some(l), Some(r)) => divide(&l.0, &r.0),
            (Some(l), None) => bump_last(&l.0),
            (None, Some(r)) => halve_last(&r.0),
            (None, None) => {
                // No neighbours at all: caller should have used new_child;
                // degrade gracefully to a fresh single-level id.
                DeweyId(vec![FIRST_CHILD_ROOT])
            }
        }
    }

    /// A fresh id for the first structural child of `self`.
    pub fn new_child(&self) -> Self {
        let mut components = self.0.clone();
        components.push(FIRST_CHILD_ROOT);
        DeweyId(components)
    }

    /// A fresh id for an attribute of the element identified by `self`.
    pub fn new_attribute(&self) -> Self {
        let mut components = self.0.clone();
        components.push(ATTRIBUTE_ROOT);
        DeweyId(components)
    }

    /// A fresh id for a namespace of the element identified by `self`.
    pub fn new_namespace(&self) -> Self {
        let mut components = self.0.clone();
        components.push(NAMESPACE_ROOT);
        DeweyId(components)
    }
}

/// A strictly-between id given two full component sequences.
///
/// Finds the first differing (or absent) component and inserts a midpoint,
/// falling back to extending with a fresh child level when `left` is a
/// prefix of `right` (or vice versa) — mirrors bisecting an ordered integer
/// range.
fn divide(left: &[i64], right: &[i64]) -> DeweyId {
    let mut out = Vec::with_capacity(left.len().max(right.len()) + 1);
    let mut i = 0;
    loop {
        let l = left.get(i).copied();
        let r = right.get(i).copied();
        match (l, r) {
            (Some(a), Some(b)) if a == b => {
                out.push(a);
                i += 1;
            }
            (Some(a), Some(b)) => {
                if b - a > 1 {
                    out.push(a + (b - a) / 2);
                } else {
                    // adjacent integers: no integer fits between a and b at
                    // this level. Descend under `left`'s own branch and bump
                    // whatever tail it already has there, so repeated
                    // bisection against the same neighbours keeps
                    // converging instead of landing on the same id twice.
                    out.push(a);
                    let tail = bump_last(&left[i + 1..]);
                    out.extend(tail.0);
                }
                break;
            }
            (Some(a), None) => {
                // left is longer: left is a proper prefix-extension of right
                out.push(a + 1);
                break;
            }
            (None, Some(b)) => {
                out.push(if b > FIRST_CHILD_ROOT + 1 {
                    (FIRST_CHILD_ROOT + b) / 2
                } else {
                    FIRST_CHILD_ROOT
                });
                break;
            }
            (None, None) => {
                out.push(FIRST_CHILD_ROOT);
                break;
            }
        }
    }
    DeweyId(out)
}

fn bump_last(components: &[i64]) -> DeweyId {
    let mut out = components.to_vec();
    if let Some(last) = out.last_mut() {
        *last += 2;
    } else {
        out.push(FIRST_CHILD_ROOT);
    }
    DeweyId(out)
}

fn halve_last(components: &[i64]) -> DeweyId {
    let mut out = components.to_vec();
    if let Some(last) = out.last_mut() {
        *last = if *last > FIRST_CHILD_ROOT + 1 {
            (FIRST_CHILD_ROOT + *last) / 2
        } else {
            FIRST_CHILD_ROOT
        };
    } else {
        out.push(FIRST_CHILD_ROOT);
    }
    DeweyId(out)
}
