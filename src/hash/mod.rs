// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! Hash maintenance: the rolling Merkle hash kept in sync with every edit.
//!
//! Three modes, selected once at resource creation:
//! - `None`: hashing disabled, every maintenance call is a no-op
//! - `Rolling`: incremental path-to-root updates after each edit
//! - `Postorder`: bulk recompute of an entire subtree, used for bulk insert
//!
//! `PRIME` and the SHA-256-truncated-to-64-bits primitive live here so both
//! modes call the exact same function — this is what makes the rolling and
//! postorder formulas bit-exactly reproducible.

pub mod postorder;
pub mod rolling;

#[cfg(test)]
mod hash_test;

use sha2::{Digest, Sha256};

/// Multiplier folding a child's hash into its parent's.
pub const PRIME: i64 = 77081;

/// Hash maintenance mode for a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashKind {
    None,
    Rolling,
    Postorder,
}

/// `H(bytes)`: SHA-256 of `bytes`, truncated to the low 64 bits and
/// reinterpreted as a signed integer (matching the page layer's `i64` hash
/// field). Stateless — the hasher is constructed fresh every call.
pub fn sha256_truncated(bytes: &[u8]) -> i64 {
    let digest = Sha256::digest(bytes);
    let mut low8 = [0u8; 8];
    low8.copy_from_slice(&digest[24..32]);
    i64::from_be_bytes(low8)
}

/// `hash_old - prev_contribution*PRIME + new_contribution*PRIME`: the
/// shared "replace one child's folded-in contribution" step used by both
/// rolling add/remove (where `prev` is 0 or the removed/old hash) and
/// rolling update.
pub fn refold(old_ancestor_hash: i64, previous_child_hash: i64, current_child_hash: i64) -> i64 {
    old_ancestor_hash
        .wrapping_sub(previous_child_hash.wrapping_mul(PRIME))
        .wrapping_add(current_child_hash.wrapping_mul(PRIME))
}
