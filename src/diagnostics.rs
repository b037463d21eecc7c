// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! Diagnostics hook for the small set of engine-internal events worth
//! surfacing: commit, rollback, revert, auto-commit triggers and scheduler
//! shutdown. Full structured logging/metrics is an external collaborator
//! here; this is kept to the narrow boundary interface the engine itself
//! needs.

use std::fmt;

/// RFC 5424-style severity, trimmed to the levels the engine actually
/// emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum Level {
    Error = 0,
    Warn = 1,
    Info = 2,
    Debug = 3,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Level::Error => "ERROR",
            Level::Warn => "WARN",
            Level::Info => "INFO",
            Level::Debug => "DEBUG",
        };
        write!(f, "{}", s)
    }
}

/// A diagnostics sink. Implementations decide where (if anywhere) events
/// go; the engine only ever calls `record`.
pub trait Logger: Send + Sync {
    fn record(&self, level: Level, message: &str);
}

/// Writes every event to stderr, FreeBSD-syslog-ish (`[LEVEL] message`),
/// filtered by a minimum level. The default logger for a transaction that
/// does not supply its own.
pub struct StderrLogger {
    min_level: Level,
}

impl StderrLogger {
    pub fn new(min_level: Level) -> Self {
        StderrLogger { min_level }
    }
}

impl Default for StderrLogger {
    fn default() -> Self {
        StderrLogger::new(Level::Info)
    }
}

impl Logger for StderrLogger {
    fn record(&self, level: Level, message: &str) {
        if level <= self.min_level {
            eprintln!("[{}] {}", level, message);
        }
    }
}

/// Discards every event. Useful in tests that don't want stderr noise.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullLogger;

impl Logger for NullLogger {
    fn record(&self, _level: Level, _message: &str) {}
}
