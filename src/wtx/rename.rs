// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! `set_name(name)` and `set_value(value)`.
//!
//! `set_name` only applies to name-bearing nodes (element, attribute,
//! namespace, PI) and notifies the path summary with `PathChangeType::SetName`
//! before folding the node's new content hash up the rolling chain.
//! `set_value` only applies to value-bearing nodes (text, comment,
//! attribute, PI); setting an empty value on a text node removes it
//! outright rather than leaving an empty text node behind (I4's corollary:
//! an empty text node is never a valid resting state).

use crate::error::{wrong_kind, WtxResult};
use crate::node::{NodeKey, NodeKind};
use crate::page::RecordKind;
use crate::path_summary::PathChangeType;
use crate::qname::{validate_qname, QName};
use crate::wtx::{hashchain, Inner, NodeWriteTrx};

impl Inner {
    pub(crate) fn set_name_current(&mut self, name: &QName) -> WtxResult<NodeKey> {
        validate_qname(name)?;
        let node = self.current()?;
        self.require_kind(
            &node,
            &[NodeKind::Element, NodeKind::Attribute, NodeKind::Namespace, NodeKind::ProcessingInstruction],
            "set_name",
        )?;
        let key = node.key();
        let record_kind = match node.kind() {
            NodeKind::Element | NodeKind::ProcessingInstruction => RecordKind::Node,
            NodeKind::Attribute => RecordKind::Attribute,
            NodeKind::Namespace => RecordKind::Namespace,
            other => return Err(wrong_kind(key.get(), other.as_str(), "set_name")),
        };

        let local_name_key = self.page_tx.create_name_key(name, node.kind());
        let prefix_key = name
            .prefix
            .as_ref()
            .map(|p| self.page_tx.create_name_key(&QName::new(p.clone()), node.kind()));
        let uri_key = name
            .uri
            .as_ref()
            .map(|u| self.page_tx.create_name_key(&QName::new(u.clone()), node.kind()));
        let new_path_node_key = self.path_summary.get_path_node_key(name, node.kind())?;

        let old_content_hash = crate::node::image::hash_of(&node);
        {
            let rec = self.page_tx.prepare_entry_for_modification(key, record_kind, 0)?;
            let named = rec.as_named_mut().expect("checked name-bearing kind above");
            named.set_name_keys(prefix_key, local_name_key, uri_key);
            named.set_path_node_key(new_path_node_key);
        }
        let new_node = self
            .page_tx
            .get_record(key, record_kind, 0)?
            .ok_or_else(|| crate::error::node_not_found(key.get()))?;
        let new_content_hash = crate::node::image::hash_of(&new_node);

        self.path_summary.adapt_path_for_changed_node(
            &new_node,
            name,
            uri_key,
            prefix_key,
            local_name_key,
            PathChangeType::SetName,
        )?;

        if self.config.hash_kind != crate::hash::HashKind::None {
            hashchain::rolling_update_chain(self, key, old_content_hash, new_content_hash)?;
        }
        self.modification_count += 1;
        Ok(key)
    }

    pub(crate) fn set_value_current(&mut self, value: &str) -> WtxResult<NodeKey> {
        let node = self.current()?;
        self.require_kind(
            &node,
            &[NodeKind::Text, NodeKind::Comment, NodeKind::Attribute, NodeKind::ProcessingInstruction],
            "set_value",
        )?;
        let key = node.key();

        if node.kind() == NodeKind::Text && value.is_empty() {
            self.remove_current()?;
            return Ok(key);
        }
        if node.kind() == NodeKind::Comment {
            crate::qname::validate_comment_value(value)?;
        }
        if node.kind() == NodeKind::ProcessingInstruction {
            crate::qname::validate_pi_content(value)?;
        }

        let record_kind = match node.kind() {
            NodeKind::Text | NodeKind::Comment | NodeKind::ProcessingInstruction => RecordKind::Node,
            NodeKind::Attribute => RecordKind::Attribute,
            other => return Err(wrong_kind(key.get(), other.as_str(), "set_value")),
        };

        let old_content_hash;
        {
            let rec = self.page_tx.prepare_entry_for_modification(key, record_kind, 0)?;
            old_content_hash = crate::node::image::hash_of(rec);
            rec.as_valued_mut().expect("checked value-bearing kind above").set_value(value.as_bytes().to_vec());
        }
        let new_node = self
            .page_tx
            .get_record(key, record_kind, 0)?
            .ok_or_else(|| crate::error::node_not_found(key.get()))?;
        let new_content_hash = crate::node::image::hash_of(&new_node);

        if self.config.hash_kind != crate::hash::HashKind::None {
            hashchain::rolling_update_chain(self, key, old_content_hash, new_content_hash)?;
        }
        self.modification_count += 1;
        Ok(key)
    }
}

impl NodeWriteTrx {
    /// Renames the name-bearing node under the cursor. Valid for
    /// element, attribute, namespace and PI cursors.
    pub fn set_name(&self, name: QName) -> WtxResult<NodeKey> {
        self.run(|state| state.set_name_current(&name))
    }

    /// Overwrites the value-bearing node under the cursor. Valid for
    /// text, comment, attribute and PI cursors; an
    /// empty value on a text node removes it instead of leaving it empty.
    pub fn set_value(&self, value: impl Into<String>) -> WtxResult<NodeKey> {
        let value = value.into();
        self.run(|state| state.set_value_current(&value))
    }
}
