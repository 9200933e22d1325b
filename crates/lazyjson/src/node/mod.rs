//! The document tree.
//!
//! A [`Document`] owns (or borrows) the source bytes and an arena of nodes.
//! Nodes refer to each other by [`NodeId`]; parents own their children
//! through the arena, children point back through a plain index.
//!
//! Scalars are decoded from their source span on first access and cached.
//! Containers keep their children structurally from the moment they are
//! parsed.
//!
//! A node is *dirty* once it, or anything below it, was mutated. Clean nodes
//! serialize as a copy of their source span; dirty nodes are re-rendered.

mod document;
mod mutate;
mod node_ref;

use alloc::{string::String, sync::Arc, vec::Vec};
use core::fmt;
use std::sync::OnceLock;

use indexmap::IndexMap;

pub use document::{Document, Input};
pub use node_ref::{Children, MAX_UNPACK_DEPTH, NodeRef, NodeValue};

/// Handle of a node inside a [`Document`].
///
/// Handles are only meaningful for the document that produced them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Position of the node in the document's arena.
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

/// The six JSON node types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    /// `null`
    Null,
    /// A number literal.
    Numeric,
    /// A string literal.
    String,
    /// `true` or `false`
    Bool,
    /// `[...]`
    Array,
    /// `{...}`
    Object,
}

impl NodeType {
    /// Whether nodes of this type hold children.
    #[must_use]
    pub fn is_container(self) -> bool {
        matches!(self, Self::Array | Self::Object)
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Null => "null",
            Self::Numeric => "numeric",
            Self::String => "string",
            Self::Bool => "bool",
            Self::Array => "array",
            Self::Object => "object",
        })
    }
}

/// Half-open byte range of a node inside the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn range(self) -> core::ops::Range<usize> {
        self.start..self.end
    }
}

/// Where a node sits inside its parent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Slot {
    /// The root, or a node that was detached or never attached.
    Free,
    Key(Arc<str>),
    Index(usize),
}

pub(crate) type Members = IndexMap<Arc<str>, NodeId>;

#[derive(Debug, Clone, Default)]
pub(crate) enum Links {
    #[default]
    None,
    Array(Vec<NodeId>),
    Object(Members),
}

impl Links {
    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        let (array, object) = match self {
            Links::None => (None, None),
            Links::Array(items) => (Some(items.iter().copied()), None),
            Links::Object(members) => (None, Some(members.values().copied())),
        };
        array.into_iter().flatten().chain(object.into_iter().flatten())
    }

    pub fn len(&self) -> usize {
        match self {
            Links::None => 0,
            Links::Array(items) => items.len(),
            Links::Object(members) => members.len(),
        }
    }
}

/// Decoded value of a scalar node.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Scalar {
    Null,
    Bool(bool),
    Numeric(f64),
    String(Text),
}

/// Decoded string contents.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Text {
    /// The source bytes between the quotes are the value.
    Verbatim,
    Owned(String),
}

impl Scalar {
    pub fn node_type(&self) -> NodeType {
        match self {
            Scalar::Null => NodeType::Null,
            Scalar::Bool(_) => NodeType::Bool,
            Scalar::Numeric(_) => NodeType::Numeric,
            Scalar::String(_) => NodeType::String,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct NodeData {
    pub kind: NodeType,
    /// Set once a parsed node is complete. Detached constructions have none.
    pub span: Option<Span>,
    pub parent: Option<NodeId>,
    pub slot: Slot,
    pub links: Links,
    pub cache: OnceLock<Scalar>,
    pub dirty: bool,
}

impl NodeData {
    /// A node produced by the decoder; its span is filled in when it ends.
    pub fn parsed(kind: NodeType, parent: Option<NodeId>, slot: Slot) -> Self {
        let links = match kind {
            NodeType::Array => Links::Array(Vec::new()),
            NodeType::Object => Links::Object(Members::default()),
            _ => Links::None,
        };
        Self {
            kind,
            span: None,
            parent,
            slot,
            links,
            cache: OnceLock::new(),
            dirty: false,
        }
    }

    /// A detached scalar built by the caller.
    pub fn scalar(value: Scalar) -> Self {
        Self {
            kind: value.node_type(),
            span: None,
            parent: None,
            slot: Slot::Free,
            links: Links::None,
            cache: OnceLock::from(value),
            dirty: true,
        }
    }

    /// A detached, empty container built by the caller.
    pub fn container(kind: NodeType) -> Self {
        Self {
            dirty: true,
            ..Self::parsed(kind, None, Slot::Free)
        }
    }
}
