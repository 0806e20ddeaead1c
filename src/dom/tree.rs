//! Tree operations: create, insert, remove, reparent, walk.

use std::collections::VecDeque;
use std::rc::Rc;

use slotmap::{SecondaryMap, SlotMap};

use super::node::{ElementData, ListenerEntry, NodeData, NodeId, NodeKind, ShadowRootData, ShadowRootMode};
use crate::css::stylesheet::CompiledStylesheet;
use crate::event::{Listener, ListenerId};

/// Empty slice constant for returning when a node has no children.
const EMPTY_CHILDREN: &[NodeId] = &[];

/// Errors from DOM tree operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    #[error("node does not exist")]
    NotFound,
    #[error("hierarchy request error: {0}")]
    HierarchyRequest(&'static str),
    #[error("node is not an element")]
    NotAnElement,
    #[error("element already hosts a shadow root")]
    ShadowRootExists,
    #[error("node is not a child of the given parent")]
    NotAChild,
}

/// A recorded DOM mutation, in the shape of a `MutationObserver` record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationRecord {
    /// An attribute was set or removed.
    Attribute {
        target: NodeId,
        name: String,
        old_value: Option<String>,
    },
    /// Children were added to or removed from `target`.
    ChildList {
        target: NodeId,
        added: Vec<NodeId>,
        removed: Vec<NodeId>,
    },
}

/// The host document, backed by a slotmap arena.
///
/// All nodes live in a single `SlotMap`. Parent/child relationships are stored
/// in secondary maps so that node removal is O(subtree size) and lookup is O(1).
/// Shadow roots have no parent; they are reached through their host.
pub struct Dom {
    pub(crate) nodes: SlotMap<NodeId, NodeData>,
    children: SecondaryMap<NodeId, Vec<NodeId>>,
    parent: SecondaryMap<NodeId, NodeId>,
    window: NodeId,
    document: NodeId,
    head: NodeId,
    body: NodeId,
    mutations: Vec<MutationRecord>,
}

impl Dom {
    /// Create a document with `<html><head></head><body></body></html>`.
    pub fn new() -> Self {
        let mut nodes = SlotMap::with_key();
        let window = nodes.insert(NodeData::new(NodeKind::Window));
        let document = nodes.insert(NodeData::new(NodeKind::Document));
        let mut dom = Self {
            nodes,
            children: SecondaryMap::new(),
            parent: SecondaryMap::new(),
            window,
            document,
            head: document,
            body: document,
            mutations: Vec::new(),
        };
        dom.children.insert(window, Vec::new());
        dom.children.insert(document, Vec::new());
        let html = dom.create_element("html");
        let head = dom.create_element("head");
        let body = dom.create_element("body");
        dom.link(document, html, None);
        dom.link(html, head, None);
        dom.link(html, body, None);
        dom.head = head;
        dom.body = body;
        dom
    }

    // ── Well-known nodes ─────────────────────────────────────────────

    /// The window event target.
    pub fn window(&self) -> NodeId {
        self.window
    }

    /// The document node.
    pub fn document(&self) -> NodeId {
        self.document
    }

    /// The `<head>` element.
    pub fn head(&self) -> NodeId {
        self.head
    }

    /// The `<body>` element.
    pub fn body(&self) -> NodeId {
        self.body
    }

    // ── Creation ─────────────────────────────────────────────────────

    fn insert(&mut self, kind: NodeKind) -> NodeId {
        let id = self.nodes.insert(NodeData::new(kind));
        self.children.insert(id, Vec::new());
        id
    }

    /// Create a detached element.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.insert(NodeKind::Element(ElementData::new(tag.to_ascii_lowercase())))
    }

    /// Create a detached text node.
    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.insert(NodeKind::Text(text.into()))
    }

    /// Create a detached comment node.
    pub fn create_comment(&mut self, text: impl Into<String>) -> NodeId {
        self.insert(NodeKind::Comment(text.into()))
    }

    /// Create an empty document fragment.
    pub fn create_fragment(&mut self) -> NodeId {
        self.insert(NodeKind::Fragment)
    }

    /// Attach a shadow root to `host`.
    pub fn attach_shadow(&mut self, host: NodeId, mode: ShadowRootMode) -> Result<NodeId, DomError> {
        let el = self.element(host)?;
        if el.shadow_root.is_some() {
            return Err(DomError::ShadowRootExists);
        }
        let root = self.insert(NodeKind::ShadowRoot(ShadowRootData {
            host,
            mode,
            adopted: Vec::new(),
        }));
        self.element_mut(host)?.shadow_root = Some(root);
        Ok(root)
    }

    /// The shadow root attached to `host`, if any.
    pub fn shadow_root(&self, host: NodeId) -> Option<NodeId> {
        self.get(host)?.as_element()?.shadow_root
    }

    /// The host of a shadow root.
    pub fn host(&self, shadow_root: NodeId) -> Option<NodeId> {
        self.get(shadow_root)?.as_shadow_root().map(|r| r.host)
    }

    /// Adopt a constructable stylesheet into a shadow root.
    ///
    /// Returns `false` if the very same sheet was already adopted.
    pub fn adopt_stylesheet(
        &mut self,
        shadow_root: NodeId,
        sheet: Rc<CompiledStylesheet>,
    ) -> Result<bool, DomError> {
        let data = self.nodes.get_mut(shadow_root).ok_or(DomError::NotFound)?;
        match &mut data.kind {
            NodeKind::ShadowRoot(root) => {
                if root.adopted.iter().any(|s| Rc::ptr_eq(s, &sheet)) {
                    return Ok(false);
                }
                root.adopted.push(sheet);
                Ok(true)
            }
            _ => Err(DomError::HierarchyRequest("stylesheets can only be adopted by a shadow root")),
        }
    }

    // ── Insertion / removal ──────────────────────────────────────────

    /// Append `child` to `parent`. Returns the nodes actually inserted
    /// (the fragment's children when `child` is a fragment).
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<Vec<NodeId>, DomError> {
        self.insert_before(parent, child, None)
    }

    /// Insert `child` into `parent` before `reference` (or at the end).
    ///
    /// If `child` already has a parent it is detached first.
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> Result<Vec<NodeId>, DomError> {
        self.validate_insert(parent, child, reference)?;

        let moving = if matches!(self.nodes[child].kind, NodeKind::Fragment) {
            std::mem::take(&mut self.children[child])
        } else {
            self.detach(child);
            vec![child]
        };
        for &node in &moving {
            self.parent.remove(node);
        }

        let mut at = reference;
        for &node in moving.iter().rev() {
            self.link(parent, node, at);
            at = Some(node);
        }

        if !moving.is_empty() {
            self.mutations.push(MutationRecord::ChildList {
                target: parent,
                added: moving.clone(),
                removed: Vec::new(),
            });
        }
        Ok(moving)
    }

    fn validate_insert(
        &self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> Result<(), DomError> {
        let parent_data = self.get(parent).ok_or(DomError::NotFound)?;
        let child_data = self.get(child).ok_or(DomError::NotFound)?;
        if !matches!(
            parent_data.kind,
            NodeKind::Document | NodeKind::Element(_) | NodeKind::Fragment | NodeKind::ShadowRoot(_)
        ) {
            return Err(DomError::HierarchyRequest("parent cannot have children"));
        }
        if matches!(
            child_data.kind,
            NodeKind::Window | NodeKind::Document | NodeKind::ShadowRoot(_)
        ) {
            return Err(DomError::HierarchyRequest("node cannot be inserted"));
        }
        if child == parent || self.is_shadow_including_ancestor(child, parent) {
            return Err(DomError::HierarchyRequest("node is an ancestor of the parent"));
        }
        if let Some(r) = reference {
            if self.parent(r) != Some(parent) {
                return Err(DomError::NotAChild);
            }
        }
        Ok(())
    }

    fn link(&mut self, parent: NodeId, child: NodeId, before: Option<NodeId>) {
        self.parent.insert(child, parent);
        let siblings = self
            .children
            .get_mut(parent)
            .expect("parent must have children vec");
        match before.and_then(|r| siblings.iter().position(|&c| c == r)) {
            Some(idx) => siblings.insert(idx, child),
            None => siblings.push(child),
        }
    }

    /// Remove `child` from `parent` without destroying it.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        if self.parent(child) != Some(parent) {
            return Err(DomError::NotAChild);
        }
        self.detach(child);
        Ok(())
    }

    /// Detach a node from its parent. Returns `false` if it had none.
    pub fn detach(&mut self, node: NodeId) -> bool {
        let Some(parent_id) = self.parent.remove(node) else {
            return false;
        };
        if let Some(siblings) = self.children.get_mut(parent_id) {
            siblings.retain(|&child| child != node);
        }
        self.mutations.push(MutationRecord::ChildList {
            target: parent_id,
            added: Vec::new(),
            removed: vec![node],
        });
        true
    }

    /// Destroy a node and all its descendants, shadow trees included.
    ///
    /// Returns the `NodeData` for the removed node, or `None` if it didn't exist.
    pub fn remove(&mut self, id: NodeId) -> Option<NodeData> {
        if !self.nodes.contains_key(id) || id == self.document || id == self.window {
            return None;
        }

        self.detach(id);

        let mut to_remove = VecDeque::new();
        to_remove.push_back(id);
        let mut removed_root_data = None;

        while let Some(current) = to_remove.pop_front() {
            if let Some(kids) = self.children.remove(current) {
                to_remove.extend(kids);
            }
            if let Some(shadow) = self.shadow_root(current) {
                to_remove.push_back(shadow);
            }
            self.parent.remove(current);
            let data = self.nodes.remove(current);
            if current == id {
                removed_root_data = data;
            }
        }

        removed_root_data
    }

    /// Move `node` to become the last child of `new_parent`.
    pub fn reparent(&mut self, node: NodeId, new_parent: NodeId) -> Result<(), DomError> {
        self.append_child(new_parent, node).map(|_| ())
    }

    // ── Navigation ───────────────────────────────────────────────────

    /// Get the parent of a node, if it has one.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.parent.get(id).copied()
    }

    /// The parent, or the host when `id` is a shadow root.
    pub fn parent_or_host(&self, id: NodeId) -> Option<NodeId> {
        self.parent(id).or_else(|| self.host(id))
    }

    /// Get the children of a node. Returns an empty slice if the node has no children
    /// or does not exist.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.children
            .get(id)
            .map(Vec::as_slice)
            .unwrap_or(EMPTY_CHILDREN)
    }

    /// Walk from `id` up to the root, collecting ancestor node ids.
    ///
    /// The returned vec does **not** include `id` itself and does not cross
    /// shadow boundaries.
    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut current = id;
        while let Some(p) = self.parent.get(current).copied() {
            result.push(p);
            current = p;
        }
        result
    }

    fn is_shadow_including_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = node;
        while let Some(p) = self.parent_or_host(current) {
            if p == ancestor {
                return true;
            }
            current = p;
        }
        false
    }

    /// Whether the node is in the document, crossing shadow boundaries.
    pub fn is_connected(&self, id: NodeId) -> bool {
        if !self.contains(id) {
            return false;
        }
        let mut current = id;
        loop {
            if current == self.document {
                return true;
            }
            match self.parent_or_host(current) {
                Some(p) => current = p,
                None => return false,
            }
        }
    }

    /// Immutable access to a node's data.
    pub fn get(&self, id: NodeId) -> Option<&NodeData> {
        self.nodes.get(id)
    }

    /// Mutable access to a node's data.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut NodeData> {
        self.nodes.get_mut(id)
    }

    fn element(&self, id: NodeId) -> Result<&ElementData, DomError> {
        self.get(id)
            .ok_or(DomError::NotFound)?
            .as_element()
            .ok_or(DomError::NotAnElement)
    }

    fn element_mut(&mut self, id: NodeId) -> Result<&mut ElementData, DomError> {
        self.nodes
            .get_mut(id)
            .ok_or(DomError::NotFound)?
            .as_element_mut()
            .ok_or(DomError::NotAnElement)
    }

    /// Tag name of an element.
    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.get(id)?.tag()
    }

    /// Number of nodes in the arena, the built-in document nodes included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the arena is empty. Never true for a constructed `Dom`.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether the DOM contains a node with the given id.
    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    // ── Attributes & text ────────────────────────────────────────────

    /// Value of attribute `name` on element `id`.
    pub fn get_attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.get(id)?.as_element()?.attribute(name)
    }

    /// Set an attribute, returning the previous value.
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> Result<Option<String>, DomError> {
        let old = self.element_mut(id)?.set_attribute(name, value);
        self.mutations.push(MutationRecord::Attribute {
            target: id,
            name: name.to_owned(),
            old_value: old.clone(),
        });
        Ok(old)
    }

    /// Remove an attribute, returning the previous value.
    ///
    /// Removing an absent attribute records no mutation.
    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> Result<Option<String>, DomError> {
        let old = self.element_mut(id)?.remove_attribute(name);
        if old.is_some() {
            self.mutations.push(MutationRecord::Attribute {
                target: id,
                name: name.to_owned(),
                old_value: old.clone(),
            });
        }
        Ok(old)
    }

    /// Replace the data of a text or comment node.
    pub fn set_text(&mut self, id: NodeId, text: impl Into<String>) -> Result<(), DomError> {
        match &mut self.nodes.get_mut(id).ok_or(DomError::NotFound)?.kind {
            NodeKind::Text(t) | NodeKind::Comment(t) => {
                *t = text.into();
                Ok(())
            }
            _ => Err(DomError::HierarchyRequest("node has no character data")),
        }
    }

    /// Concatenated text of `id` and its light-tree descendants.
    pub fn text_content(&self, id: NodeId) -> String {
        self.walk_depth_first(id)
            .into_iter()
            .filter_map(|n| match &self.nodes[n].kind {
                NodeKind::Text(t) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }

    // ── Listeners ────────────────────────────────────────────────────

    pub(crate) fn add_listener(
        &mut self,
        target: NodeId,
        id: ListenerId,
        event_type: &str,
        callback: Listener,
    ) -> Result<(), DomError> {
        let data = self.nodes.get_mut(target).ok_or(DomError::NotFound)?;
        data.listeners.push(ListenerEntry {
            id,
            event_type: event_type.to_owned(),
            callback,
        });
        Ok(())
    }

    pub(crate) fn remove_listener(&mut self, target: NodeId, id: ListenerId) -> bool {
        let Some(data) = self.nodes.get_mut(target) else {
            return false;
        };
        let before = data.listeners.len();
        data.listeners.retain(|l| l.id != id);
        data.listeners.len() != before
    }

    pub(crate) fn listeners_for(&self, target: NodeId, event_type: &str) -> Vec<Listener> {
        self.get(target)
            .map(|data| {
                data.listeners
                    .iter()
                    .filter(|l| l.event_type == event_type)
                    .map(|l| l.callback.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Drain and return all recorded mutations.
    pub fn take_mutations(&mut self) -> Vec<MutationRecord> {
        std::mem::take(&mut self.mutations)
    }

    // ── Traversal ────────────────────────────────────────────────────

    /// Pre-order depth-first traversal of the light tree starting from `start`.
    pub fn walk_depth_first(&self, start: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut stack = vec![start];
        while let Some(current) = stack.pop() {
            if !self.nodes.contains_key(current) {
                continue;
            }
            result.push(current);
            for &child in self.children(current).iter().rev() {
                stack.push(child);
            }
        }
        result
    }

    /// Pre-order traversal that descends into shadow roots before light children.
    pub fn walk_shadow_including(&self, start: NodeId) -> Vec<NodeId> {
        let mut result = Vec::new();
        let mut stack = vec![start];
        while let Some(current) = stack.pop() {
            if !self.nodes.contains_key(current) {
                continue;
            }
            result.push(current);
            for &child in self.children(current).iter().rev() {
                stack.push(child);
            }
            if let Some(shadow) = self.shadow_root(current) {
                stack.push(shadow);
            }
        }
        result
    }
}

impl Default for Dom {
    fn default() -> Self {
        Self::new()
    }
}
