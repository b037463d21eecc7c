// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! Pure arithmetic for the ROLLING hash mode.
//!
//! These functions only compute new hash values from old ones; walking the
//! ancestor chain and fetching/storing each node through the page
//! transaction is `crate::wtx`'s job. Keeping the arithmetic here, free of
//! any page-transaction access, makes the formulas independently testable
//! and guarantees the rolling and postorder paths agree bit-for-bit.

use crate::hash::refold;

/// The immediate parent's new hash after inserting child `inserted_hash`
/// for the first time (no prior contribution to subtract).
pub fn parent_hash_after_insert(parent_hash_old: i64, inserted_hash: i64) -> i64 {
    parent_hash_old.wrapping_add(inserted_hash.wrapping_mul(crate::hash::PRIME))
}

/// The immediate parent's new hash after removing a child whose hash was
/// `removed_hash` (its sole contribution is subtracted, nothing replaces it).
pub fn parent_hash_after_remove(parent_hash_old: i64, removed_hash: i64) -> i64 {
    parent_hash_old.wrapping_sub(removed_hash.wrapping_mul(crate::hash::PRIME))
}

/// An ancestor further up the chain: its contribution from the
/// intermediate child changed from `child_hash_before` to
/// `child_hash_after`; replace that one folded-in term.
///
/// This same step is used for insert, remove and rename/revalue — only the
/// immediate parent step differs between insert (pure add) and remove
/// (pure subtract).
pub fn ancestor_hash_after_refold(
    ancestor_hash_old: i64,
    child_hash_before: i64,
    child_hash_after: i64,
) -> i64 {
    refold(ancestor_hash_old, child_hash_before, child_hash_after)
}

/// The updated node's own new hash after a rename/revalue: replace the
/// node's own content-hash component directly (no PRIME factor — this is
/// not a folded-in child contribution, it's the node's own `H(image)` term).
pub fn self_hash_after_update(self_hash_old: i64, old_content_hash: i64, new_content_hash: i64) -> i64 {
    self_hash_old
        .wrapping_sub(old_content_hash)
        .wrapping_add(new_content_hash)
}
