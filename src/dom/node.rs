//! Node types: NodeId, NodeKind, ElementData, ShadowRootData.

use std::fmt;
use std::rc::Rc;

use slotmap::new_key_type;

use crate::css::stylesheet::CompiledStylesheet;
use crate::event::{Listener, ListenerId};

new_key_type! {
    /// Unique identifier for a DOM node. Copy, lightweight (u64).
    pub struct NodeId;
}

/// Encapsulation mode of a shadow root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ShadowRootMode {
    /// The shadow root is reachable from the host.
    #[default]
    Open,
    /// The shadow root is hidden from outside code.
    Closed,
}

impl ShadowRootMode {
    /// The `mode` keyword as written in markup.
    pub fn as_str(self) -> &'static str {
        match self {
            ShadowRootMode::Open => "open",
            ShadowRootMode::Closed => "closed",
        }
    }
}

/// What kind of node a slot holds.
#[derive(Debug, Clone)]
pub enum NodeKind {
    /// The global event target. Lives outside the tree.
    Window,
    /// The document node, root of the connected tree.
    Document,
    /// An element with a tag name and attributes.
    Element(ElementData),
    /// A text node.
    Text(String),
    /// A comment node.
    Comment(String),
    /// A document fragment. Its children move out when it is inserted.
    Fragment,
    /// A shadow root attached to a host element.
    ShadowRoot(ShadowRootData),
}

/// Element-specific data.
#[derive(Debug, Clone)]
pub struct ElementData {
    /// Lowercase tag name.
    pub tag: String,
    /// Attributes in insertion order.
    attributes: Vec<(String, String)>,
    /// Attached shadow root, if any.
    pub(crate) shadow_root: Option<NodeId>,
}

impl ElementData {
    /// Create element data for `tag` with no attributes.
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attributes: Vec::new(),
            shadow_root: None,
        }
    }

    /// Value of attribute `name`, if present.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Whether attribute `name` is present.
    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.iter().any(|(n, _)| n == name)
    }

    /// All attributes in insertion order.
    pub fn attributes(&self) -> &[(String, String)] {
        &self.attributes
    }

    /// Set an attribute, returning the previous value.
    pub(crate) fn set_attribute(&mut self, name: &str, value: &str) -> Option<String> {
        match self.attributes.iter_mut().find(|(n, _)| n == name) {
            Some((_, v)) => Some(std::mem::replace(v, value.to_owned())),
            None => {
                self.attributes.push((name.to_owned(), value.to_owned()));
                None
            }
        }
    }

    /// Remove an attribute, returning the previous value.
    pub(crate) fn remove_attribute(&mut self, name: &str) -> Option<String> {
        let idx = self.attributes.iter().position(|(n, _)| n == name)?;
        Some(self.attributes.remove(idx).1)
    }

    /// The `id` attribute.
    pub fn id(&self) -> Option<&str> {
        self.attribute("id")
    }

    /// Whitespace-separated entries of the `class` attribute.
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attribute("class")
            .unwrap_or_default()
            .split_ascii_whitespace()
    }

    /// Check whether this element has a given CSS class.
    pub fn has_class(&self, class: &str) -> bool {
        self.classes().any(|c| c == class)
    }

    /// The attached shadow root, if any.
    pub fn shadow_root(&self) -> Option<NodeId> {
        self.shadow_root
    }
}

/// Shadow-root-specific data.
#[derive(Debug, Clone)]
pub struct ShadowRootData {
    /// The element this root is attached to.
    pub host: NodeId,
    /// Encapsulation mode.
    pub mode: ShadowRootMode,
    /// Constructable stylesheets adopted by this root.
    pub(crate) adopted: Vec<Rc<CompiledStylesheet>>,
}

impl ShadowRootData {
    /// Stylesheets adopted by this root, in adoption order.
    pub fn adopted_stylesheets(&self) -> &[Rc<CompiledStylesheet>] {
        &self.adopted
    }
}

/// A registered event listener.
#[derive(Clone)]
pub(crate) struct ListenerEntry {
    pub id: ListenerId,
    pub event_type: String,
    pub callback: Listener,
}

impl fmt::Debug for ListenerEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerEntry")
            .field("id", &self.id)
            .field("event_type", &self.event_type)
            .finish_non_exhaustive()
    }
}

/// Data associated with a single DOM node.
#[derive(Debug, Clone)]
pub struct NodeData {
    /// The node's kind and kind-specific payload.
    pub kind: NodeKind,
    pub(crate) listeners: Vec<ListenerEntry>,
}

impl NodeData {
    /// Wrap a kind with no listeners.
    pub fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            listeners: Vec::new(),
        }
    }

    /// Element data, if this node is an element.
    pub fn as_element(&self) -> Option<&ElementData> {
        match &self.kind {
            NodeKind::Element(el) => Some(el),
            _ => None,
        }
    }

    pub(crate) fn as_element_mut(&mut self) -> Option<&mut ElementData> {
        match &mut self.kind {
            NodeKind::Element(el) => Some(el),
            _ => None,
        }
    }

    /// Shadow root data, if this node is a shadow root.
    pub fn as_shadow_root(&self) -> Option<&ShadowRootData> {
        match &self.kind {
            NodeKind::ShadowRoot(root) => Some(root),
            _ => None,
        }
    }

    /// Tag name, if this node is an element.
    pub fn tag(&self) -> Option<&str> {
        self.as_element().map(|el| el.tag.as_str())
    }

    /// Whether this node is an element.
    pub fn is_element(&self) -> bool {
        matches!(self.kind, NodeKind::Element(_))
    }

    /// Number of listeners registered on this node.
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}
