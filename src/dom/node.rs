//! Node types: NodeId, NodeKind, NodeData.

use std::collections::HashMap;

use slotmap::new_key_type;

new_key_type! {
    /// Unique identifier for a node in the tree. Copy, lightweight (u64).
    pub struct NodeId;
}

/// The four renderable node kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Element,
    Text,
    Comment,
    Fragment,
}

/// Data for a single node, tagged by kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeData {
    /// A tagged element with attributes. Listeners live in the tree, not
    /// here, so node data stays cheaply cloneable.
    Element {
        tag: String,
        attributes: HashMap<String, String>,
    },
    /// Mutable character data.
    Text { data: String },
    /// An opaque marker, used as a stable anchor by reconciling primitives.
    Comment { data: String },
    /// A parentless grouping container.
    Fragment,
}

impl NodeData {
    /// An element with no attributes.
    pub fn element(tag: impl Into<String>) -> Self {
        Self::Element {
            tag: tag.into(),
            attributes: HashMap::new(),
        }
    }

    pub fn text(data: impl Into<String>) -> Self {
        Self::Text { data: data.into() }
    }

    pub fn comment(data: impl Into<String>) -> Self {
        Self::Comment { data: data.into() }
    }

    pub fn fragment() -> Self {
        Self::Fragment
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Self::Element { .. } => NodeKind::Element,
            Self::Text { .. } => NodeKind::Text,
            Self::Comment { .. } => NodeKind::Comment,
            Self::Fragment => NodeKind::Fragment,
        }
    }

    /// The element tag, or `None` for non-elements.
    pub fn tag(&self) -> Option<&str> {
        match self {
            Self::Element { tag, .. } => Some(tag),
            _ => None,
        }
    }

    /// Character data for text and comment nodes.
    pub fn data(&self) -> Option<&str> {
        match self {
            Self::Text { data } | Self::Comment { data } => Some(data),
            _ => None,
        }
    }

    /// Attribute lookup on elements; `None` elsewhere.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        match self {
            Self::Element { attributes, .. } => attributes.get(name).map(String::as_str),
            _ => None,
        }
    }

    /// Set an attribute (builder). No-op on non-elements.
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        if let Self::Element { attributes, .. } = &mut self {
            attributes.insert(name.into(), value.into());
        }
        self
    }
}
