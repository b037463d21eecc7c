// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! Write transaction construction parameters.
//!
//! This is intentionally a plain settings struct, not a file-backed
//! configuration subsystem — configuration proper is an external
//! collaborator. A small struct with sensible defaults and a fluent
//! builder, without any TOML/CSV sync machinery, which this crate has no
//! use for.

use std::time::Duration;

use crate::hash::HashKind;

/// Unit for the periodic auto-commit timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    Milliseconds,
    Seconds,
    Minutes,
}

impl TimeUnit {
    pub fn to_duration(self, amount: u64) -> Duration {
        match self {
            TimeUnit::Milliseconds => Duration::from_millis(amount),
            TimeUnit::Seconds => Duration::from_secs(amount),
            TimeUnit::Minutes => Duration::from_secs(amount * 60),
        }
    }
}

/// Construction parameters for a `NodeWriteTrx`.
#[derive(Debug, Clone, Copy)]
pub struct TransactionConfig {
    pub hash_kind: HashKind,
    /// Auto-commit after this many modifications; `0` disables the
    /// size-based trigger.
    pub max_node_count: u64,
    /// Period for the time-based auto-commit trigger; `0` disables it.
    pub max_time: u64,
    pub time_unit: TimeUnit,
    /// Whether DeweyIDs are assigned/maintained for this resource.
    pub dewey_ids_enabled: bool,
}

impl Default for TransactionConfig {
    fn default() -> Self {
        TransactionConfig {
            hash_kind: HashKind::Rolling,
            max_node_count: 0,
            max_time: 0,
            time_unit: TimeUnit::Seconds,
            dewey_ids_enabled: true,
        }
    }
}

impl TransactionConfig {
    pub fn with_hash_kind(mut self, hash_kind: HashKind) -> Self {
        self.hash_kind = hash_kind;
        self
    }

    pub fn with_max_node_count(mut self, max_node_count: u64) -> Self {
        self.max_node_count = max_node_count;
        self
    }

    pub fn with_max_time(mut self, max_time: u64, time_unit: TimeUnit) -> Self {
        self.max_time = max_time;
        self.time_unit = time_unit;
        self
    }

    pub fn without_dewey_ids(mut self) -> Self {
        self.dewey_ids_enabled = false;
        self
    }

    /// Whether a re-entrant lock must be installed: only when the
    /// time-based trigger is active, since only then does a second
    /// thread — the scheduler — ever call into the transaction.
    pub fn needs_lock(&self) -> bool {
        self.max_time > 0
    }
}
