// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! Node factory: one method per node kind, each producing a fresh record
//! stamped with the key it is given, `hash = 0` and `descendant_count = 0`
//! The factory never allocates keys itself —
//! that counter is owned by the page layer (`PageTx::allocate_key`) — it
//! only assembles records.

use crate::dewey::DeweyId;
use crate::node::record::{
    AttributeNode, CommentNode, DocumentRootNode, ElementNode, NamespaceNode, Node, NodeKey,
    PiNode, TextNode,
};

/// Constructs fresh node records. Implementations only assemble records;
/// they do not allocate keys (see `PageTx::allocate_key`) or install the
/// record into the page transaction (see `PageTx::insert_record`).
pub trait NodeFactory: Send {
    fn new_document_root(&self, key: NodeKey) -> Node;

    #[allow(clippy::too_many_arguments)]
    fn new_element(
        &self,
        key: NodeKey,
        parent: Option<NodeKey>,
        prefix_key: Option<u32>,
        local_name_key: u32,
        uri_key: Option<u32>,
        path_node_key: u64,
    ) -> Node;

    fn new_attribute(
        &self,
        key: NodeKey,
        owner: NodeKey,
        prefix_key: Option<u32>,
        local_name_key: u32,
        uri_key: Option<u32>,
        path_node_key: u64,
        value: Vec<u8>,
    ) -> Node;

    fn new_namespace(
        &self,
        key: NodeKey,
        owner: NodeKey,
        prefix_key: Option<u32>,
        local_name_key: u32,
        uri_key: Option<u32>,
        path_node_key: u64,
    ) -> Node;

    fn new_text(&self, key: NodeKey, parent: Option<NodeKey>, value: Vec<u8>) -> Node;

    fn new_comment(&self, key: NodeKey, parent: Option<NodeKey>, value: Vec<u8>) -> Node;

    #[allow(clippy::too_many_arguments)]
    fn new_pi(
        &self,
        key: NodeKey,
        parent: Option<NodeKey>,
        prefix_key: Option<u32>,
        local_name_key: u32,
        uri_key: Option<u32>,
        path_node_key: u64,
        value: Vec<u8>,
    ) -> Node;
}

/// The stock `NodeFactory`: assembles records with every structural
/// pointer unset, `dewey_id: None` (the write transaction fills it in
/// separately when DeweyIDs are enabled).
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultNodeFactory;

impl NodeFactory for DefaultNodeFactory {
    fn new_document_root(&self, key: NodeKey) -> Node {
        Node::DocumentRoot(DocumentRootNode::new(key))
    }

    fn new_element(
        &self,
        key: NodeKey,
        parent: Option<NodeKey>,
        prefix_key: Option<u32>,
        local_name_key: u32,
        uri_key: Option<u32>,
        path_node_key: u64,
    ) -> Node {
        Node::Element(ElementNode {
            key,
            parent,
            first_child: None,
            left_sibling: None,
            right_sibling: None,
            child_count: 0,
            descendant_count: 0,
            hash: 0,
            prefix_key,
            local_name_key,
            uri_key,
            path_node_key,
            attributes: Vec::new(),
            namespaces: Vec::new(),
            dewey_id: None,
        })
    }

    fn new_attribute(
        &self,
        key: NodeKey,
        owner: NodeKey,
        prefix_key: Option<u32>,
        local_name_key: u32,
        uri_key: Option<u32>,
        path_node_key: u64,
        value: Vec<u8>,
    ) -> Node {
        Node::Attribute(AttributeNode {
            key,
            owner,
            prefix_key,
            local_name_key,
            uri_key,
            path_node_key,
            value,
            hash: 0,
            dewey_id: None,
        })
    }

    fn new_namespace(
        &self,
        key: NodeKey,
        owner: NodeKey,
        prefix_key: Option<u32>,
        local_name_key: u32,
        uri_key: Option<u32>,
        path_node_key: u64,
    ) -> Node {
        Node::Namespace(NamespaceNode {
            key,
            owner,
            prefix_key,
            local_name_key,
            uri_key,
            path_node_key,
            hash: 0,
            dewey_id: None,
        })
    }

    fn new_text(&self, key: NodeKey, parent: Option<NodeKey>, value: Vec<u8>) -> Node {
        Node::Text(TextNode {
            key,
            parent,
            first_child: None,
            left_sibling: None,
            right_sibling: None,
            child_count: 0,
            descendant_count: 0,
            hash: 0,
            value,
            dewey_id: None,
        })
    }

    fn new_comment(&self, key: NodeKey, parent: Option<NodeKey>, value: Vec<u8>) -> Node {
        Node::Comment(CommentNode {
            key,
            parent,
            first_child: None,
            left_sibling: None,
            right_sibling: None,
            child_count: 0,
            descendant_count: 0,
            hash: 0,
            value,
            dewey_id: None,
        })
    }

    fn new_pi(
        &self,
        key: NodeKey,
        parent: Option<NodeKey>,
        prefix_key: Option<u32>,
        local_name_key: u32,
        uri_key: Option<u32>,
        path_node_key: u64,
        value: Vec<u8>,
    ) -> Node {
        Node::ProcessingInstruction(PiNode {
            key,
            parent,
            first_child: None,
            left_sibling: None,
            right_sibling: None,
            child_count: 0,
            descendant_count: 0,
            hash: 0,
            prefix_key,
            local_name_key,
            uri_key,
            path_node_key,
            value,
            dewey_id: None,
        })
    }
}

/// Unused at factory-construction time but kept alongside the factory: a
/// default dewey id root, used by `crate::wtx` as the fallback when a
/// document is still empty.
pub fn bootstrap_dewey_id() -> DeweyId {
    DeweyId::document_root()
}
