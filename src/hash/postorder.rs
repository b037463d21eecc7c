// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! Pure arithmetic for the POSTORDER hash mode.
//!
//! `fold` is the per-node step of a post-order traversal: combine a node's
//! own content hash with the already-computed hashes of its namespaces,
//! attributes and structural children, in that order. The traversal order
//! itself (visit namespaces, then attributes, then structural children,
//! then rise to the parent) is driven by `crate::wtx`, which is the only
//! place with access to the page transaction needed to walk the tree.

use crate::hash::PRIME;

/// `H(image) + Σ PRIME·hash(child)` for one node, given its own content
/// hash and the hashes of its children in visitation order (namespaces,
/// then attributes, then structural children).
pub fn fold(own_content_hash: i64, child_hashes: impl IntoIterator<Item = i64>) -> i64 {
    child_hashes
        .into_iter()
        .fold(own_content_hash, |acc, child_hash| {
            acc.wrapping_add(child_hash.wrapping_mul(PRIME))
        })
}
