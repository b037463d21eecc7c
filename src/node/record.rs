// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! Concrete per-kind node records and the `Node` enum that wraps them.
//!
//! Field layout: structural pointers on every
//! structural kind (even leaves, where `first_child`/`child_count` stay at
//! their zero value), name fields on name-bearing kinds, a byte value on
//! value-bearing kinds, and attribute/namespace side-lists only on
//! `ElementNode`.

use crate::dewey::DeweyId;
use crate::node::kind::{ElementLike, Named, NodeKind, Structural, Valued};

/// A node key: a monotonically increasing, never-reused 64-bit integer
/// allocated by the page layer. Wrapped in a newtype so it is never
/// confused with `child_count`/`descendant_count` at the type level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeKey(pub u64);

impl NodeKey {
    pub fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for NodeKey {
    fn from(value: u64) -> Self {
        NodeKey(value)
    }
}

macro_rules! impl_structural {
    ($ty:ty) => {
        impl Structural for $ty {
            fn parent(&self) -> Option<NodeKey> {
                self.parent
            }
            fn set_parent(&mut self, parent: Option<NodeKey>) {
                self.parent = parent;
            }
            fn first_child(&self) -> Option<NodeKey> {
                self.first_child
            }
            fn set_first_child(&mut self, child: Option<NodeKey>) {
                self.first_child = child;
            }
            fn left_sibling(&self) -> Option<NodeKey> {
                self.left_sibling
            }
            fn set_left_sibling(&mut self, sibling: Option<NodeKey>) {
                self.left_sibling = sibling;
            }
            fn right_sibling(&self) -> Option<NodeKey> {
                self.right_sibling
            }
            fn set_right_sibling(&mut self, sibling: Option<NodeKey>) {
                self.right_sibling = sibling;
            }
            fn child_count(&self) -> u64 {
                self.child_count
            }
            fn set_child_count(&mut self, count: u64) {
                self.child_count = count;
            }
            fn descendant_count(&self) -> u64 {
                self.descendant_count
            }
            fn set_descendant_count(&mut self, count: u64) {
                self.descendant_count = count;
            }
            fn hash(&self) -> i64 {
                self.hash
            }
            fn set_hash(&mut self, hash: i64) {
                self.hash = hash;
            }
        }
    };
}

macro_rules! impl_valued {
    ($ty:ty) => {
        impl Valued for $ty {
            fn value(&self) -> &[u8] {
                &self.value
            }
            fn set_value(&mut self, value: Vec<u8>) {
                self.value = value;
            }
        }
    };
}

macro_rules! impl_named {
    ($ty:ty) => {
        impl Named for $ty {
            fn prefix_key(&self) -> Option<u32> {
                self.prefix_key
            }
            fn local_name_key(&self) -> u32 {
                self.local_name_key
            }
            fn uri_key(&self) -> Option<u32> {
                self.uri_key
            }
            fn path_node_key(&self) -> u64 {
                self.path_node_key
            }
            fn set_path_node_key(&mut self, key: u64) {
                self.path_node_key = key;
            }
            fn set_name_keys(
                &mut self,
                prefix_key: Option<u32>,
                local_name_key: u32,
                uri_key: Option<u32>,
            ) {
                self.prefix_key = prefix_key;
                self.local_name_key = local_name_key;
                self.uri_key = uri_key;
            }
        }
    };
}

/// The document root. At most one element child plus any number of
/// comments/PIs (I5); never has a parent or siblings.
#[derive(Debug, Clone)]
pub struct DocumentRootNode {
    pub key: NodeKey,
    pub first_child: Option<NodeKey>,
    pub child_count: u64,
    pub descendant_count: u64,
    pub hash: i64,
    pub dewey_id: Option<DeweyId>,
}

impl DocumentRootNode {
    pub fn new(key: NodeKey) -> Self {
        DocumentRootNode {
            key,
            first_child: None,
            child_count: 0,
            descendant_count: 0,
            hash: 0,
            dewey_id: Some(DeweyId::document_root()),
        }
    }

    // Document root never has a parent or siblings (I5); these accessors
    // exist so `Structural` can be implemented uniformly across kinds.
    pub fn parent(&self) -> Option<NodeKey> {
        None
    }
    pub fn left_sibling(&self) -> Option<NodeKey> {
        None
    }
    pub fn right_sibling(&self) -> Option<NodeKey> {
        None
    }
}

impl Structural for DocumentRootNode {
    fn parent(&self) -> Option<NodeKey> {
        None
    }
    fn set_parent(&mut self, _parent: Option<NodeKey>) {
        // I5: document root never has a parent; silently ignored rather
        // than panicking so generic topology code can stay uniform.
    }
    fn first_child(&self) -> Option<NodeKey> {
        self.first_child
    }
    fn set_first_child(&mut self, child: Option<NodeKey>) {
        self.first_child = child;
    }
    fn left_sibling(&self) -> Option<NodeKey> {
        None
    }
    fn set_left_sibling(&mut self, _sibling: Option<NodeKey>) {}
    fn right_sibling(&self) -> Option<NodeKey> {
        None
    }
    fn set_right_sibling(&mut self, _sibling: Option<NodeKey>) {}
    fn child_count(&self) -> u64 {
        self.child_count
    }
    fn set_child_count(&mut self, count: u64) {
        self.child_count = count;
    }
    fn descendant_count(&self) -> u64 {
        self.descendant_count
    }
    fn set_descendant_count(&mut self, count: u64) {
        self.descendant_count = count;
    }
    fn hash(&self) -> i64 {
        self.hash
    }
    fn set_hash(&mut self, hash: i64) {
        self.hash = hash;
    }
}

/// An element node.
#[derive(Debug, Clone)]
pub struct ElementNode {
    pub key: NodeKey,
    pub parent: Option<NodeKey>,
    pub first_child: Option<NodeKey>,
    pub left_sibling: Option<NodeKey>,
    pub right_sibling: Option<NodeKey>,
    pub child_count: u64,
    pub descendant_count: u64,
    pub hash: i64,
    pub prefix_key: Option<u32>,
    pub local_name_key: u32,
    pub uri_key: Option<u32>,
    pub path_node_key: u64,
    pub attributes: Vec<NodeKey>,
    pub namespaces: Vec<NodeKey>,
    pub dewey_id: Option<DeweyId>,
}

impl_structural!(ElementNode);
impl_named!(ElementNode);

impl ElementLike for ElementNode {
    fn attributes(&self) -> &[NodeKey] {
        &self.attributes
    }
    fn attributes_mut(&mut self) -> &mut Vec<NodeKey> {
        &mut self.attributes
    }
    fn namespaces(&self) -> &[NodeKey] {
        &self.namespaces
    }
    fn namespaces_mut(&mut self) -> &mut Vec<NodeKey> {
        &mut self.namespaces
    }
}

/// An attribute. Hangs off an owning element's attribute list; not part of
/// the sibling chain.
#[derive(Debug, Clone)]
pub struct AttributeNode {
    pub key: NodeKey,
    pub owner: NodeKey,
    pub prefix_key: Option<u32>,
    pub local_name_key: u32,
    pub uri_key: Option<u32>,
    pub path_node_key: u64,
    pub value: Vec<u8>,
    pub hash: i64,
    pub dewey_id: Option<DeweyId>,
}

impl_named!(AttributeNode);
impl_valued!(AttributeNode);

/// A namespace binding. `local_name_key` carries the interned prefix
/// (empty-string key for the default namespace); `uri_key` the bound URI.
#[derive(Debug, Clone)]
pub struct NamespaceNode {
    pub key: NodeKey,
    pub owner: NodeKey,
    pub prefix_key: Option<u32>,
    pub local_name_key: u32,
    pub uri_key: Option<u32>,
    pub path_node_key: u64,
    pub hash: i64,
    pub dewey_id: Option<DeweyId>,
}

impl_named!(NamespaceNode);

/// A text node. Adjacent text nodes are disallowed (I4) — merging is the
/// write transaction's responsibility at insert/remove time.
#[derive(Debug, Clone)]
pub struct TextNode {
    pub key: NodeKey,
    pub parent: Option<NodeKey>,
    pub first_child: Option<NodeKey>,
    pub left_sibling: Option<NodeKey>,
    pub right_sibling: Option<NodeKey>,
    pub child_count: u64,
    pub descendant_count: u64,
    pub hash: i64,
    pub value: Vec<u8>,
    pub dewey_id: Option<DeweyId>,
}

impl_structural!(TextNode);
impl_valued!(TextNode);

/// A comment node. Value must not contain "--" and must not end in "-" (I6).
#[derive(Debug, Clone)]
pub struct CommentNode {
    pub key: NodeKey,
    pub parent: Option<NodeKey>,
    pub first_child: Option<NodeKey>,
    pub left_sibling: Option<NodeKey>,
    pub right_sibling: Option<NodeKey>,
    pub child_count: u64,
    pub descendant_count: u64,
    pub hash: i64,
    pub value: Vec<u8>,
    pub dewey_id: Option<DeweyId>,
}

impl_structural!(CommentNode);
impl_valued!(CommentNode);

/// A processing instruction. Content must not contain "?>-" (I6).
#[derive(Debug, Clone)]
pub struct PiNode {
    pub key: NodeKey,
    pub parent: Option<NodeKey>,
    pub first_child: Option<NodeKey>,
    pub left_sibling: Option<NodeKey>,
    pub right_sibling: Option<NodeKey>,
    pub child_count: u64,
    pub descendant_count: u64,
    pub hash: i64,
    pub prefix_key: Option<u32>,
    pub local_name_key: u32,
    pub uri_key: Option<u32>,
    pub path_node_key: u64,
    pub value: Vec<u8>,
    pub dewey_id: Option<DeweyId>,
}

impl_structural!(PiNode);
impl_named!(PiNode);
impl_valued!(PiNode);

/// A tagged union over every node kind. Call sites match on `.kind()` (or
/// pattern-match the enum directly) and then use the capability traits to
/// reach shared fields.
#[derive(Debug, Clone)]
pub enum Node {
    DocumentRoot(DocumentRootNode),
    Element(ElementNode),
    Attribute(AttributeNode),
    Namespace(NamespaceNode),
    Text(TextNode),
    Comment(CommentNode),
    ProcessingInstruction(PiNode),
}

impl Node {
    pub fn key(&self) -> NodeKey {
        match self {
            Node::DocumentRoot(n) => n.key,
            Node::Element(n) => n.key,
            Node::Attribute(n) => n.key,
            Node::Namespace(n) => n.key,
            Node::Text(n) => n.key,
            Node::Comment(n) => n.key,
            Node::ProcessingInstruction(n) => n.key,
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Node::DocumentRoot(_) => NodeKind::DocumentRoot,
            Node::Element(_) => NodeKind::Element,
            Node::Attribute(_) => NodeKind::Attribute,
            Node::Namespace(_) => NodeKind::Namespace,
            Node::Text(_) => NodeKind::Text,
            Node::Comment(_) => NodeKind::Comment,
            Node::ProcessingInstruction(_) => NodeKind::ProcessingInstruction,
        }
    }

    pub fn dewey_id(&self) -> Option<&DeweyId> {
        match self {
            Node::DocumentRoot(n) => n.dewey_id.as_ref(),
            Node::Element(n) => n.dewey_id.as_ref(),
            Node::Attribute(n) => n.dewey_id.as_ref(),
            Node::Namespace(n) => n.dewey_id.as_ref(),
            Node::Text(n) => n.dewey_id.as_ref(),
            Node::Comment(n) => n.dewey_id.as_ref(),
            Node::ProcessingInstruction(n) => n.dewey_id.as_ref(),
        }
    }

    pub fn set_dewey_id(&mut self, id: Option<DeweyId>) {
        match self {
            Node::DocumentRoot(n) => n.dewey_id = id,
            Node::Element(n) => n.dewey_id = id,
            Node::Attribute(n) => n.dewey_id = id,
            Node::Namespace(n) => n.dewey_id = id,
            Node::Text(n) => n.dewey_id = id,
            Node::Comment(n) => n.dewey_id = id,
            Node::ProcessingInstruction(n) => n.dewey_id = id,
        }
    }

    /// Returns `self` as `&dyn Structural`, or `None` for attributes and
    /// namespaces.
    pub fn as_structural(&self) -> Option<&dyn Structural> {
        match self {
            Node::DocumentRoot(n) => Some(n),
            Node::Element(n) => Some(n),
            Node::Text(n) => Some(n),
            Node::Comment(n) => Some(n),
            Node::ProcessingInstruction(n) => Some(n),
            Node::Attribute(_) | Node::Namespace(_) => None,
        }
    }

    pub fn as_structural_mut(&mut self) -> Option<&mut dyn Structural> {
        match self {
            Node::DocumentRoot(n) => Some(n),
            Node::Element(n) => Some(n),
            Node::Text(n) => Some(n),
            Node::Comment(n) => Some(n),
            Node::ProcessingInstruction(n) => Some(n),
            Node::Attribute(_) | Node::Namespace(_) => None,
        }
    }

    pub fn as_named(&self) -> Option<&dyn Named> {
        match self {
            Node::Element(n) => Some(n),
            Node::Attribute(n) => Some(n),
            Node::Namespace(n) => Some(n),
            Node::ProcessingInstruction(n) => Some(n),
            Node::DocumentRoot(_) | Node::Text(_) | Node::Comment(_) => None,
        }
    }

    pub fn as_named_mut(&mut self) -> Option<&mut dyn Named> {
        match self {
            Node::Element(n) => Some(n),
            Node::Attribute(n) => Some(n),
            Node::Namespace(n) => Some(n),
            Node::ProcessingInstruction(n) => Some(n),
            Node::DocumentRoot(_) | Node::Text(_) | Node::Comment(_) => None,
        }
    }

    pub fn as_valued(&self) -> Option<&dyn Valued> {
        match self {
            Node::Text(n) => Some(n),
            Node::Comment(n) => Some(n),
            Node::Attribute(n) => Some(n),
            Node::ProcessingInstruction(n) => Some(n),
            Node::DocumentRoot(_) | Node::Element(_) | Node::Namespace(_) => None,
        }
    }

    pub fn as_valued_mut(&mut self) -> Option<&mut dyn Valued> {
        match self {
            Node::Text(n) => Some(n),
            Node::Comment(n) => Some(n),
            Node::Attribute(n) => Some(n),
            Node::ProcessingInstruction(n) => Some(n),
            Node::DocumentRoot(_) | Node::Element(_) | Node::Namespace(_) => None,
        }
    }

    /// The node's own hash, regardless of kind. `Structural` exposes this
    /// for structural kinds; attributes and namespaces carry the same field
    /// without being part of the sibling chain, so callers that need to
    /// walk a hash chain uniformly (an attribute's hash folds into its
    /// owning element just like a structural child's) use this instead.
    pub fn hash(&self) -> i64 {
        match self {
            Node::DocumentRoot(n) => n.hash,
            Node::Element(n) => n.hash,
            Node::Attribute(n) => n.hash,
            Node::Namespace(n) => n.hash,
            Node::Text(n) => n.hash,
            Node::Comment(n) => n.hash,
            Node::ProcessingInstruction(n) => n.hash,
        }
    }

    pub fn set_hash(&mut self, hash: i64) {
        match self {
            Node::DocumentRoot(n) => n.hash = hash,
            Node::Element(n) => n.hash = hash,
            Node::Attribute(n) => n.hash = hash,
            Node::Namespace(n) => n.hash = hash,
            Node::Text(n) => n.hash = hash,
            Node::Comment(n) => n.hash = hash,
            Node::ProcessingInstruction(n) => n.hash = hash,
        }
    }

    /// `descendant_count`, or `0` for attributes/namespaces (which have no
    /// descendants of their own).
    pub fn descendant_count(&self) -> u64 {
        self.as_structural().map(|s| s.descendant_count()).unwrap_or(0)
    }

    /// The node this node folds its hash contribution into and that owns
    /// its membership: `parent` for structural kinds, `owner` for
    /// attributes/namespaces. `None` only for the document root.
    pub fn logical_parent(&self) -> Option<NodeKey> {
        match self {
            Node::Attribute(n) => Some(n.owner),
            Node::Namespace(n) => Some(n.owner),
            _ => self.as_structural().and_then(|s| s.parent()),
        }
    }

    pub fn as_element(&self) -> Option<&ElementNode> {
        match self {
            Node::Element(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut ElementNode> {
        match self {
            Node::Element(n) => Some(n),
            _ => None,
        }
    }
}
