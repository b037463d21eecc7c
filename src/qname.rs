// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! Qualified names, and the validation the write transaction enforces on
//! them before any name-bearing node is created (I6).

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{invalid_content, WtxError, WtxResult};

/// An (unresolved) qualified name as supplied by a caller, before its
/// components are interned into name keys by the page transaction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QName {
    pub prefix: Option<String>,
    pub local_name: String,
    pub uri: Option<String>,
}

impl QName {
    pub fn new(local_name: impl Into<String>) -> Self {
        QName {
            prefix: None,
            local_name: local_name.into(),
            uri: None,
        }
    }

    pub fn with_prefix(prefix: impl Into<String>, local_name: impl Into<String>, uri: impl Into<String>) -> Self {
        QName {
            prefix: Some(prefix.into()),
            local_name: local_name.into(),
            uri: Some(uri.into()),
        }
    }
}

// NCName production, simplified: a non-empty run of XML-name characters
// that does not contain ':'. Full XML 1.0 NameStartChar/NameChar is far
// broader (most of Unicode); this validates the ASCII-practical subset and
// rejects the structural mistakes (empty, whitespace, colon) that would
// otherwise corrupt the path summary.
static NC_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_.\-]*$").unwrap());

/// Validates that `name` is a well-formed QName (I6): non-empty local name
/// and prefix (if any) matching the NCName production.
pub fn validate_qname(name: &QName) -> WtxResult<()> {
    if !NC_NAME.is_match(&name.local_name) {
        return Err(invalid_content(
            "name",
            "qname",
            format!("local name '{}' is not a valid NCName", name.local_name),
        ));
    }
    if let Some(prefix) = &name.prefix {
        if !NC_NAME.is_match(prefix) {
            return Err(invalid_content(
                "name",
                "qname",
                format!("prefix '{}' is not a valid NCName", prefix),
            ));
        }
    }
    Ok(())
}

/// Validates a comment value: must not contain "--" and must not end in
/// "-" (I6).
pub fn validate_comment_value(value: &str) -> WtxResult<()> {
    if value.contains("--") {
        return Err(invalid_content("value", "comment", "comment value must not contain '--'"));
    }
    if value.ends_with('-') {
        return Err(invalid_content("value", "comment", "comment value must not end in '-'"));
    }
    Ok(())
}

/// Validates processing-instruction content: must not contain "?>-" (I6).
pub fn validate_pi_content(content: &str) -> WtxResult<()> {
    if content.contains("?>-") {
        return Err(invalid_content(
            "content",
            "processing-instruction",
            "PI content must not contain '?>-'",
        ));
    }
    Ok(())
}

/// Returns an error if `value` is empty, for operations that require
/// non-empty text content.
pub fn require_non_empty(value: &str) -> WtxResult<()> {
    if value.is_empty() {
        return Err(WtxError::InvalidContent {
            what: "value",
            operation: "insert_text",
            reason: "text value must not be empty".to_string(),
        });
    }
    Ok(())
}
