// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! `insert_element_as_*`, `insert_text_as_*`, `insert_comment_as_*`,
//! `insert_pi_as_*`, `insert_attribute`, `insert_namespace` and
//! `insert_subtree_as_*`.

use crate::dewey::DeweyId;
use crate::error::{invalid_content, wrong_kind, WtxResult};
use crate::events::{EventStreamReader, XdmEvent};
use crate::hash::HashKind;
use crate::index::IndexChangeType;
use crate::node::{Node, NodeKey, NodeKind};
use crate::page::RecordKind;
use crate::qname::{validate_comment_value, validate_pi_content, validate_qname, QName};
use crate::wtx::hashchain;
use crate::wtx::topology::{self, InsertSite};
use crate::wtx::{Inner, InsertPos, Movement, NodeWriteTrx};

impl Inner {
    /// Checks whether either side of an already-resolved insert site is a
    /// text node, in which case the new value merges into it instead of a
    /// new node being created (the text-merge-on-insert rule). The
    /// anchor itself is one of `site.left`/`site.right` whenever `pos` is
    /// `LeftSibling`/`RightSibling`, so checking the site's pointers — not
    /// the anchor's far-side sibling — is what actually tests adjacency to
    /// the new node. Returns the existing node's key and whether the new
    /// value is a prefix (`true`) or a suffix (`false`) of the merged value.
    fn text_merge_target(&self, site: &InsertSite) -> WtxResult<Option<(NodeKey, bool)>> {
        if let Some(left) = site.left {
            if self.fetch(left)?.kind() == NodeKind::Text {
                return Ok(Some((left, false)));
            }
        }
        if let Some(right) = site.right {
            if self.fetch(right)?.kind() == NodeKind::Text {
                return Ok(Some((right, true)));
            }
        }
        Ok(None)
    }

    fn assign_insert_dewey_id(&mut self, key: NodeKey, site: &InsertSite) -> WtxResult<()> {
        if !self.config.dewey_ids_enabled {
            return Ok(());
        }
        let left_id = match site.left {
            Some(l) => self.fetch(l)?.dewey_id().cloned(),
            None => None,
        };
        let right_id = match site.right {
            Some(r) => self.fetch(r)?.dewey_id().cloned(),
            None => None,
        };
        let new_id = match (left_id.as_ref(), right_id.as_ref()) {
            (None, None) => {
                let parent = self.fetch(site.parent)?;
                parent
                    .dewey_id()
                    .map(|p| p.new_child())
                    .unwrap_or_else(DeweyId::document_root)
            }
            (l, r) => DeweyId::new_between(l, r),
        };
        self.page_tx
            .prepare_entry_for_modification(key, RecordKind::Node, 0)?
            .set_dewey_id(Some(new_id));
        Ok(())
    }

    /// Inserts a freshly factoried structural leaf node at `site`, wiring
    /// up topology, DeweyID, rolling hash and index notification. Returns
    /// the new node's key and moves the cursor onto it.
    fn install_structural_leaf(&mut self, site: InsertSite, node: Node) -> WtxResult<NodeKey> {
        let key = node.key();
        self.page_tx.insert_record(node.clone(), RecordKind::Node, 0)?;
        topology::splice_in(self, &site, key)?;
        self.assign_insert_dewey_id(key, &site)?;

        if !self.bulk_insert {
            let update_hash = self.config.hash_kind != HashKind::None;
            let own_hash = if update_hash {
                let h = crate::node::image::hash_of(&node);
                self.page_tx
                    .prepare_entry_for_modification(key, RecordKind::Node, 0)?
                    .set_hash(h);
                h
            } else {
                0
            };
            // descendant_count (I3) is maintained regardless of hash mode.
            hashchain::rolling_insert_chain(self, site.parent, own_hash, Some(0), update_hash)?;
        }

        let path_node_key = node.as_named().map(|n| n.path_node_key()).unwrap_or(0);
        self.index.notify_change(IndexChangeType::Insert, &node, path_node_key);
        self.modification_count += 1;
        self.cursor = key;
        Ok(key)
    }

    fn insert_element(&mut self, pos: InsertPos, name: &QName) -> WtxResult<NodeKey> {
        validate_qname(name)?;
        let anchor = self.current()?;
        if pos == InsertPos::FirstChild {
            self.require_kind(&anchor, &[NodeKind::Element, NodeKind::DocumentRoot], "insert_element")?;
        } else {
            self.require_kind(&anchor, &[NodeKind::Element], "insert_element")?;
        }
        let site = topology::resolve_insert_site(&anchor, pos)?;
        let path_node_key = self.path_summary.get_path_node_key(name, NodeKind::Element)?;
        let key = self.page_tx.allocate_key();
        let (prefix_key, local_name_key, uri_key) = self.resolve_name_keys(name, NodeKind::Element);
        let node = self
            .factory
            .new_element(key, Some(site.parent), prefix_key, local_name_key, uri_key, path_node_key);
        let mut node = node;
        if let Node::Element(e) = &mut node {
            e.parent = Some(site.parent);
            e.left_sibling = site.left;
            e.right_sibling = site.right;
        }
        self.install_structural_leaf(site, node)
    }

    fn insert_text(&mut self, pos: InsertPos, value: &str) -> WtxResult<NodeKey> {
        crate::qname::require_non_empty(value)?;
        let anchor = self.current()?;
        if !anchor.kind().is_structural() {
            return Err(wrong_kind(anchor.key().get(), anchor.kind().as_str(), "insert_text"));
        }
        let site = topology::resolve_insert_site(&anchor, pos)?;
        if let Some((merge_key, prepend)) = self.text_merge_target(&site)? {
            let old_content_hash;
            {
                let node = self.page_tx.prepare_entry_for_modification(merge_key, RecordKind::Node, 0)?;
                old_content_hash = crate::node::image::hash_of(node);
                let existing = node.as_valued_mut().expect("text node is valued");
                let mut bytes = existing.value().to_vec();
                if prepend {
                    let mut prefix = value.as_bytes().to_vec();
                    prefix.extend_from_slice(&bytes);
                    bytes = prefix;
                } else {
                    bytes.extend_from_slice(value.as_bytes());
                }
                existing.set_value(bytes);
            }
            if !self.bulk_insert && self.config.hash_kind != HashKind::None {
                let new_content_hash = crate::node::image::hash_of(&self.fetch(merge_key)?);
                hashchain::rolling_update_chain(self, merge_key, old_content_hash, new_content_hash)?;
            }
            self.modification_count += 1;
            self.cursor = merge_key;
            return Ok(merge_key);
        }
        let key = self.page_tx.allocate_key();
        let node = self.factory.new_text(key, Some(site.parent), value.as_bytes().to_vec());
        let mut node = node;
        if let Node::Text(t) = &mut node {
            t.left_sibling = site.left;
            t.right_sibling = site.right;
        }
        self.install_structural_leaf(site, node)
    }

    fn insert_comment(&mut self, pos: InsertPos, value: &str) -> WtxResult<NodeKey> {
        validate_comment_value(value)?;
        let anchor = self.require_structural_cursor("insert_comment")?;
        let site = topology::resolve_insert_site(&anchor, pos)?;
        let key = self.page_tx.allocate_key();
        let mut node = self.factory.new_comment(key, Some(site.parent), value.as_bytes().to_vec());
        if let Node::Comment(c) = &mut node {
            c.left_sibling = site.left;
            c.right_sibling = site.right;
        }
        self.install_structural_leaf(site, node)
    }

    fn insert_pi(&mut self, pos: InsertPos, target: &QName, content: &str) -> WtxResult<NodeKey> {
        validate_qname(target)?;
        validate_pi_content(content)?;
        let anchor = self.require_structural_cursor("insert_pi")?;
        let site = topology::resolve_insert_site(&anchor, pos)?;
        let path_node_key = self.path_summary.get_path_node_key(target, NodeKind::ProcessingInstruction)?;
        let key = self.page_tx.allocate_key();
        let (prefix_key, local_name_key, uri_key) = self.resolve_name_keys(target, NodeKind::ProcessingInstruction);
        let mut node = self.factory.new_pi(
            key,
            Some(site.parent),
            prefix_key,
            local_name_key,
            uri_key,
            path_node_key,
            content.as_bytes().to_vec(),
        );
        if let Node::ProcessingInstruction(p) = &mut node {
            p.left_sibling = site.left;
            p.right_sibling = site.right;
        }
        self.install_structural_leaf(site, node)
    }

    fn resolve_name_keys(&mut self, name: &QName, kind: NodeKind) -> (Option<u32>, u32, Option<u32>) {
        let local_name_key = self.page_tx.create_name_key(name, kind);
        let prefix_key = name
            .prefix
            .as_ref()
            .map(|_| self.page_tx.create_name_key(&QName::new(name.prefix.clone().unwrap()), kind));
        let uri_key = name
            .uri
            .as_ref()
            .map(|_| self.page_tx.create_name_key(&QName::new(name.uri.clone().unwrap()), kind));
        (prefix_key, local_name_key, uri_key)
    }

    pub(crate) fn insert_attribute_inner(
        &mut self,
        name: &QName,
        value: &str,
        movement: Movement,
    ) -> WtxResult<NodeKey> {
        validate_qname(name)?;
        let owner = self.current()?;
        self.require_kind(&owner, &[NodeKind::Element], "insert_attribute")?;
        let (prefix_key, local_name_key, uri_key) = self.resolve_name_keys(name, NodeKind::Attribute);

        let existing = owner.as_element().expect("checked Element above").attributes().iter().copied().find_map(|k| {
            let attr = self.fetch(k).ok()?;
            let named = attr.as_named()?;
            if named.local_name_key() == local_name_key && named.prefix_key() == prefix_key {
                Some(k)
            } else {
                None
            }
        });

        if let Some(existing_key) = existing {
            let old_content_hash;
            {
                let node = self.page_tx.prepare_entry_for_modification(existing_key, RecordKind::Attribute, 0)?;
                old_content_hash = crate::node::image::hash_of(node);
                node.as_valued_mut().expect("attribute is valued").set_value(value.as_bytes().to_vec());
            }
            if !self.bulk_insert && self.config.hash_kind != HashKind::None {
                let new_content_hash = crate::node::image::hash_of(&self.fetch(existing_key)?);
                hashchain::rolling_update_chain(self, existing_key, old_content_hash, new_content_hash)?;
            }
            self.modification_count += 1;
            if movement == Movement::ToNode {
                self.cursor = existing_key;
            }
            return Ok(existing_key);
        }

        let path_node_key = self.path_summary.get_path_node_key(name, NodeKind::Attribute)?;
        let owner_key = owner.key();
        let key = self.page_tx.allocate_key();
        let idx = owner.as_element().expect("checked Element above").attributes().len();
        let node = self.factory.new_attribute(
            key,
            owner_key,
            prefix_key,
            local_name_key,
            uri_key,
            path_node_key,
            value.as_bytes().to_vec(),
        );
        self.page_tx.insert_record(node.clone(), RecordKind::Attribute, idx)?;
        {
            let owner_mut = self.page_tx.prepare_entry_for_modification(owner_key, RecordKind::Node, 0)?;
            owner_mut
                .as_element_mut()
                .expect("checked Element above")
                .attributes_mut()
                .push(key);
        }
        if self.config.dewey_ids_enabled {
            let new_id = if idx == 0 {
                self.fetch(owner_key)?.dewey_id().map(|d| d.new_attribute())
            } else {
                let prev = owner.as_element().unwrap().attributes()[idx - 1];
                self.fetch(prev)?.dewey_id().map(|d| DeweyId::new_between(Some(d), None))
            };
            if let Some(id) = new_id {
                self.page_tx
                    .prepare_entry_for_modification(key, RecordKind::Attribute, idx)?
                    .set_dewey_id(Some(id));
            }
        }
        if !self.bulk_insert && self.config.hash_kind != HashKind::None {
            let own_hash = crate::node::image::hash_of(&node);
            self.page_tx
                .prepare_entry_for_modification(key, RecordKind::Attribute, idx)?
                .set_hash(own_hash);
            // attributes are not structural descendants (I3 exempts them),
            // so there is no count to maintain here even unconditionally.
            hashchain::rolling_insert_chain(self, owner_key, own_hash, None, true)?;
        }
        self.index.notify_change(IndexChangeType::Insert, &node, path_node_key);
        self.modification_count += 1;
        if movement == Movement::ToNode {
            self.cursor = key;
        }
        Ok(key)
    }

    pub(crate) fn insert_namespace_inner(&mut self, name: &QName, movement: Movement) -> WtxResult<NodeKey> {
        validate_qname(name)?;
        let owner = self.current()?;
        self.require_kind(&owner, &[NodeKind::Element], "insert_namespace")?;
        let (prefix_key, local_name_key, uri_key) = self.resolve_name_keys(name, NodeKind::Namespace);

        let duplicate = owner.as_element().expect("checked Element above").namespaces().iter().copied().any(|k| {
            self.fetch(k)
                .ok()
                .and_then(|n| n.as_named().map(|named| named.local_name_key() == local_name_key))
                .unwrap_or(false)
        });
        if duplicate {
            return Err(crate::error::WtxError::DuplicateNamespace {
                element: owner.key().get(),
                prefix: name.prefix.clone().unwrap_or_default(),
            });
        }

        let path_node_key = self.path_summary.get_path_node_key(name, NodeKind::Namespace)?;
        let owner_key = owner.key();
        let key = self.page_tx.allocate_key();
        let idx = owner.as_element().unwrap().namespaces().len();
        let node = self
            .factory
            .new_namespace(key, owner_key, prefix_key, local_name_key, uri_key, path_node_key);
        self.page_tx.insert_record(node.clone(), RecordKind::Namespace, idx)?;
        {
            let owner_mut = self.page_tx.prepare_entry_for_modification(owner_key, RecordKind::Node, 0)?;
            owner_mut
                .as_element_mut()
                .expect("checked Element above")
                .namespaces_mut()
                .push(key);
        }
        if self.config.dewey_ids_enabled {
            let new_id = if idx == 0 {
                self.fetch(owner_key)?.dewey_id().map(|d| d.new_namespace())
            } else {
                let prev = owner.as_element().unwrap().namespaces()[idx - 1];
                self.fetch(prev)?.dewey_id().map(|d| DeweyId::new_between(Some(d), None))
            };
            if let Some(id) = new_id {
                self.page_tx
                    .prepare_entry_for_modification(key, RecordKind::Namespace, idx)?
                    .set_dewey_id(Some(id));
            }
        }
        if !self.bulk_insert && self.config.hash_kind != HashKind::None {
            let own_hash = crate::node::image::hash_of(&node);
            self.page_tx
                .prepare_entry_for_modification(key, RecordKind::Namespace, idx)?
                .set_hash(own_hash);
            // namespaces are not structural descendants either (I3 exempt).
            hashchain::rolling_insert_chain(self, owner_key, own_hash, None, true)?;
        }
        self.index.notify_change(IndexChangeType::Insert, &node, path_node_key);
        self.modification_count += 1;
        if movement == Movement::ToNode {
            self.cursor = key;
        }
        Ok(key)
    }

    /// Bulk-loads the subtree described by `events` at `site`, deferring
    /// per-node hashing until the whole subtree is built, then recomputes
    /// it in one postorder pass.
    pub(crate) fn insert_subtree(&mut self, pos: InsertPos, events: &mut dyn EventStreamReader) -> WtxResult<NodeKey> {
        let anchor = self.require_structural_cursor("insert_subtree")?;
        let site = topology::resolve_insert_site(&anchor, pos)?;
        self.bulk_insert = true;
        let result = self.replay_event_stream(site, events);
        self.bulk_insert = false;
        let (root_key, root_parent) = result?;

        let update_hash = self.config.hash_kind != HashKind::None;
        let (root_hash, root_descendant_count) = hashchain::postorder_recompute(self, root_key, update_hash)?;
        hashchain::rolling_insert_chain(self, root_parent, root_hash, Some(root_descendant_count), update_hash)?;
        self.cursor = root_key;
        Ok(root_key)
    }

    /// Replays a flat event stream into a tree via the ordinary insert
    /// operations, returning the root node's key and its parent. The
    /// first `StartElement`/`Text`/`Comment`/`ProcessingInstruction` event
    /// becomes the subtree root, inserted at `site`; subsequent events
    /// nest under whichever element is currently open.
    fn replay_event_stream(
        &mut self,
        site: InsertSite,
        events: &mut dyn EventStreamReader,
    ) -> WtxResult<(NodeKey, NodeKey)> {
        // One stack entry per currently-open element; `last_child` tracks,
        // for each level (top level included, at index usize::MAX via
        // `top_last`), the most recently appended child so the next sibling
        // can be anchored with `RightSibling` instead of repeatedly
        // re-resolving `FirstChild` (which would reverse insertion order).
        let mut stack: Vec<NodeKey> = Vec::new();
        let mut last_child: Vec<Option<NodeKey>> = Vec::new();
        let mut top_last: Option<NodeKey> = None;
        let mut root: Option<NodeKey> = None;
        let saved_cursor = self.cursor;

        // Appends a freshly built leaf at the current nesting level, wiring
        // it in after whatever was appended last at that level.
        macro_rules! append_leaf {
            ($insert:expr) => {{
                let key: NodeKey = match (stack.last(), last_child.last()) {
                    (Some(&parent), Some(&Some(prev))) => {
                        self.cursor = prev;
                        let _ = parent;
                        $insert(self, InsertPos::RightSibling)?
                    }
                    (Some(&parent), _) => {
                        self.cursor = parent;
                        $insert(self, InsertPos::FirstChild)?
                    }
                    (None, _) => match top_last {
                        Some(prev) => {
                            self.cursor = prev;
                            $insert(self, InsertPos::RightSibling)?
                        }
                        None => {
                            self.cursor = site.parent;
                            $insert(self, InsertPos::FirstChild)?
                        }
                    },
                };
                if let Some(slot) = last_child.last_mut() {
                    *slot = Some(key);
                } else {
                    top_last = Some(key);
                }
                key
            }};
        }

        while let Some(event) = events.next_event() {
            match event {
                XdmEvent::StartElement { name } => {
                    let key = append_leaf!(|state: &mut Inner, pos: InsertPos| state.insert_element(pos, &name));
                    root.get_or_insert(key);
                    stack.push(key);
                    last_child.push(None);
                }
                XdmEvent::EndElement => {
                    stack.pop();
                    last_child.pop();
                }
                XdmEvent::Text { value } => {
                    if stack.is_empty() {
                        return Err(invalid_content(
                            "value",
                            "insert_subtree",
                            "top-level text node is not a valid subtree root",
                        ));
                    }
                    append_leaf!(|state: &mut Inner, pos: InsertPos| state.insert_text(pos, &value));
                }
                XdmEvent::Comment { value } => {
                    append_leaf!(|state: &mut Inner, pos: InsertPos| state.insert_comment(pos, &value));
                }
                XdmEvent::ProcessingInstruction { target, content } => {
                    let target = QName::new(target.clone());
                    append_leaf!(|state: &mut Inner, pos: InsertPos| state.insert_pi(pos, &target, &content));
                }
                XdmEvent::Attribute { name, value } => {
                    let owner = *stack.last().ok_or_else(|| {
                        invalid_content("name", "insert_subtree", "attribute event outside any open element")
                    })?;
                    self.cursor = owner;
                    self.insert_attribute_inner(&name, &value, Movement::ToParent)?;
                }
                XdmEvent::Namespace { name } => {
                    let owner = *stack.last().ok_or_else(|| {
                        invalid_content("name", "insert_subtree", "namespace event outside any open element")
                    })?;
                    self.cursor = owner;
                    self.insert_namespace_inner(&name, Movement::ToParent)?;
                }
            }
        }

        self.cursor = saved_cursor;
        let root_key = root.ok_or_else(|| invalid_content("events", "insert_subtree", "event stream produced no nodes"))?;
        Ok((root_key, site.parent))
    }
}

macro_rules! insert_ops {
    ($($method:ident => $pos:expr),+ $(,)?) => {
        $(
            pub fn $method(&self, name: QName) -> WtxResult<NodeKey> {
                self.run(|state| state.insert_element($pos, &name))
            }
        )+
    };
}

impl NodeWriteTrx {
    insert_ops! {
        insert_element_as_first_child => InsertPos::FirstChild,
        insert_element_as_left_sibling => InsertPos::LeftSibling,
        insert_element_as_right_sibling => InsertPos::RightSibling,
    }

    pub fn insert_text_as_first_child(&self, value: impl Into<String>) -> WtxResult<NodeKey> {
        let value = value.into();
        self.run(|state| state.insert_text(InsertPos::FirstChild, &value))
    }

    pub fn insert_text_as_left_sibling(&self, value: impl Into<String>) -> WtxResult<NodeKey> {
        let value = value.into();
        self.run(|state| state.insert_text(InsertPos::LeftSibling, &value))
    }

    pub fn insert_text_as_right_sibling(&self, value: impl Into<String>) -> WtxResult<NodeKey> {
        let value = value.into();
        self.run(|state| state.insert_text(InsertPos::RightSibling, &value))
    }

    pub fn insert_comment_as_first_child(&self, value: impl Into<String>) -> WtxResult<NodeKey> {
        let value = value.into();
        self.run(|state| state.insert_comment(InsertPos::FirstChild, &value))
    }

    pub fn insert_comment_as_left_sibling(&self, value: impl Into<String>) -> WtxResult<NodeKey> {
        let value = value.into();
        self.run(|state| state.insert_comment(InsertPos::LeftSibling, &value))
    }

    pub fn insert_comment_as_right_sibling(&self, value: impl Into<String>) -> WtxResult<NodeKey> {
        let value = value.into();
        self.run(|state| state.insert_comment(InsertPos::RightSibling, &value))
    }

    pub fn insert_pi_as_first_child(&self, target: QName, content: impl Into<String>) -> WtxResult<NodeKey> {
        let content = content.into();
        self.run(|state| state.insert_pi(InsertPos::FirstChild, &target, &content))
    }

    pub fn insert_pi_as_left_sibling(&self, target: QName, content: impl Into<String>) -> WtxResult<NodeKey> {
        let content = content.into();
        self.run(|state| state.insert_pi(InsertPos::LeftSibling, &target, &content))
    }

    pub fn insert_pi_as_right_sibling(&self, target: QName, content: impl Into<String>) -> WtxResult<NodeKey> {
        let content = content.into();
        self.run(|state| state.insert_pi(InsertPos::RightSibling, &target, &content))
    }

    /// Inserts an attribute on the current element, or overwrites its
    /// value if one with the same name already exists. Leaves the cursor
    /// on the owning element; use [`insert_attribute_with_movement`] to move
    /// it onto the attribute instead.
    ///
    /// [`insert_attribute_with_movement`]: NodeWriteTrx::insert_attribute_with_movement
    pub fn insert_attribute(&self, name: QName, value: impl Into<String>) -> WtxResult<NodeKey> {
        self.insert_attribute_with_movement(name, value, Movement::ToParent)
    }

    pub fn insert_attribute_with_movement(
        &self,
        name: QName,
        value: impl Into<String>,
        movement: Movement,
    ) -> WtxResult<NodeKey> {
        let value = value.into();
        self.run(|state| state.insert_attribute_inner(&name, &value, movement))
    }

    /// Inserts a namespace on the current element. Leaves the cursor on
    /// the owning element; use [`insert_namespace_with_movement`] to move
    /// it onto the namespace instead.
    ///
    /// [`insert_namespace_with_movement`]: NodeWriteTrx::insert_namespace_with_movement
    pub fn insert_namespace(&self, name: QName) -> WtxResult<NodeKey> {
        self.insert_namespace_with_movement(name, Movement::ToParent)
    }

    pub fn insert_namespace_with_movement(&self, name: QName, movement: Movement) -> WtxResult<NodeKey> {
        self.run(|state| state.insert_namespace_inner(&name, movement))
    }

    pub fn insert_subtree_as_first_child(&self, mut events: impl EventStreamReader + 'static) -> WtxResult<NodeKey> {
        self.run(|state| state.insert_subtree(InsertPos::FirstChild, &mut events))
    }

    pub fn insert_subtree_as_left_sibling(&self, mut events: impl EventStreamReader + 'static) -> WtxResult<NodeKey> {
        self.run(|state| state.insert_subtree(InsertPos::LeftSibling, &mut events))
    }

    pub fn insert_subtree_as_right_sibling(&self, mut events: impl EventStreamReader + 'static) -> WtxResult<NodeKey> {
        self.run(|state| state.insert_subtree(InsertPos::RightSibling, &mut events))
    }
}
