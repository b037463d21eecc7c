// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! Canonical byte projection of a node, used as the `H(node_image)` input
//! to the rolling/postorder hash formulas.
//!
//! The image intentionally excludes `child_count`, `descendant_count` and
//! the node's own `hash` field — those are folded in separately via the
//! `Σ PRIME·hash(child)` term, so including them here
//! would double-count structural information and make the formula
//! non-reproducible from the bare node content.

use serde::{Deserialize, Serialize};

use crate::hash::sha256_truncated;
use crate::node::kind::NodeKind;
use crate::node::record::Node;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeImage {
    kind: NodeKindTag,
    prefix_key: Option<u32>,
    local_name_key: Option<u32>,
    uri_key: Option<u32>,
    value: Option<Vec<u8>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
enum NodeKindTag {
    DocumentRoot,
    Element,
    Attribute,
    Namespace,
    Text,
    Comment,
    ProcessingInstruction,
}

impl From<NodeKind> for NodeKindTag {
    fn from(kind: NodeKind) -> Self {
        match kind {
            NodeKind::DocumentRoot => NodeKindTag::DocumentRoot,
            NodeKind::Element => NodeKindTag::Element,
            NodeKind::Attribute => NodeKindTag::Attribute,
            NodeKind::Namespace => NodeKindTag::Namespace,
            NodeKind::Text => NodeKindTag::Text,
            NodeKind::Comment => NodeKindTag::Comment,
            NodeKind::ProcessingInstruction => NodeKindTag::ProcessingInstruction,
        }
    }
}

impl NodeImage {
    pub fn from_node(node: &Node) -> Self {
        let named = node.as_named();
        let valued = node.as_valued();
        NodeImage {
            kind: node.kind().into(),
            prefix_key: named.and_then(|n| n.prefix_key()),
            local_name_key: named.map(|n| n.local_name_key()),
            uri_key: named.and_then(|n| n.uri_key()),
            value: valued.map(|v| v.value().to_vec()),
        }
    }

    /// `H(node_image)`: bincode-serialize this projection and feed it
    /// through the shared SHA-256-truncated primitive.
    pub fn hash(&self) -> i64 {
        let bytes = bincode::serialize(self).expect("NodeImage is always serializable");
        sha256_truncated(&bytes)
    }
}

/// Convenience: `H(image(node))` in one call.
pub fn hash_of(node: &Node) -> i64 {
    NodeImage::from_node(node).hash()
}
