// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! Node kind tag and the capability traits dispatched on it.
//!
//! Rather than a deep inheritance hierarchy, each node kind is a variant of
//! one tagged enum; fields shared by several kinds (structural pointers,
//! names, values) are exposed through small traits implemented only by the
//! kinds that actually carry them. Call sites match on `NodeKind` and then
//! narrow to the relevant trait.

use crate::node::NodeKey;

/// Tag identifying which concrete payload a `Node` wraps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    DocumentRoot,
    Element,
    Attribute,
    Namespace,
    Text,
    Comment,
    ProcessingInstruction,
}

impl NodeKind {
    /// Whether this kind participates in the sibling / first-child chain.
    ///
    /// Attributes and namespaces hang off an element's side lists instead.
    pub fn is_structural(self) -> bool {
        !matches!(self, NodeKind::Attribute | NodeKind::Namespace)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::DocumentRoot => "DocumentRoot",
            NodeKind::Element => "Element",
            NodeKind::Attribute => "Attribute",
            NodeKind::Namespace => "Namespace",
            NodeKind::Text => "Text",
            NodeKind::Comment => "Comment",
            NodeKind::ProcessingInstruction => "ProcessingInstruction",
        }
    }
}

/// Nodes that participate in the sibling/first-child chain: document-root,
/// element, text, comment, processing-instruction.
pub trait Structural {
    fn parent(&self) -> Option<NodeKey>;
    fn set_parent(&mut self, parent: Option<NodeKey>);

    fn first_child(&self) -> Option<NodeKey>;
    fn set_first_child(&mut self, child: Option<NodeKey>);

    fn left_sibling(&self) -> Option<NodeKey>;
    fn set_left_sibling(&mut self, sibling: Option<NodeKey>);

    fn right_sibling(&self) -> Option<NodeKey>;
    fn set_right_sibling(&mut self, sibling: Option<NodeKey>);

    fn child_count(&self) -> u64;
    fn set_child_count(&mut self, count: u64);

    fn descendant_count(&self) -> u64;
    fn set_descendant_count(&mut self, count: u64);

    fn hash(&self) -> i64;
    fn set_hash(&mut self, hash: i64);
}

/// Nodes that carry an interned name: element, attribute, namespace, PI
/// (PI's "name" is its target).
pub trait Named {
    fn prefix_key(&self) -> Option<u32>;
    fn local_name_key(&self) -> u32;
    fn uri_key(&self) -> Option<u32>;
    fn path_node_key(&self) -> u64;
    fn set_path_node_key(&mut self, key: u64);
    fn set_name_keys(&mut self, prefix_key: Option<u32>, local_name_key: u32, uri_key: Option<u32>);
}

/// Nodes that carry a byte-encoded value: text, comment, attribute, PI.
pub trait Valued {
    fn value(&self) -> &[u8];
    fn set_value(&mut self, value: Vec<u8>);
}

/// The element kind additionally owns non-structural attribute/namespace
/// children, which are not present in the sibling chain.
pub trait ElementLike {
    fn attributes(&self) -> &[NodeKey];
    fn attributes_mut(&mut self) -> &mut Vec<NodeKey>;
    fn namespaces(&self) -> &[NodeKey];
    fn namespaces_mut(&mut self) -> &mut Vec<NodeKey>;
}
