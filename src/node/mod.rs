// Copyright 2025 Vivian Voss. Licensed under the Apache License, Version 2.0.
// SPDX-License-Identifier: Apache-2.0

//! Node model for the XDM tree.
//!
//! Provides:
//! - `kind`: the tagged `NodeKind` enum and capability traits
//!   (`Structural`, `Named`, `Valued`, `ElementLike`)
//! - `record`: the concrete per-kind payload structs and the `Node` enum
//!   that wraps them
//! - `image`: the canonical byte projection used as hash input (`H(node_image)`)

pub mod image;
pub mod kind;
pub mod record;

#[cfg(test)]
mod node_test;

pub use image::NodeImage;
pub use kind::{ElementLike, Named, NodeKind, Structural, Valued};
pub use record::{
    AttributeNode, CommentNode, DocumentRootNode, ElementNode, NamespaceNode, Node, NodeKey,
    PiNode, TextNode,
};
