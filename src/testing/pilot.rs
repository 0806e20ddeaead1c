//! Pilot: programmatic interaction with a headless runtime.
//!
//! The `Pilot` wraps a [`Runtime`] and provides methods to mount elements,
//! simulate user interaction, flush the microtask queue, and serialize the
//! document for snapshot testing.

use crate::dom::NodeId;
use crate::element::{ComponentDefinition, ComponentRef, FieldValue};
use crate::event::Event;
use crate::runtime::{Runtime, RuntimeConfig, RuntimeError};
use crate::testing::snapshot::{inner_html, outer_html};

// ---------------------------------------------------------------------------
// Pilot
// ---------------------------------------------------------------------------

/// A headless runtime driver for testing.
///
/// # Examples
///
/// ```ignore
/// use petal::testing::Pilot;
///
/// let mut pilot = Pilot::new();
/// pilot.define(counter_definition()).unwrap();
/// let el = pilot.mount("x-counter").unwrap();
/// pilot.set_field(el, "count", 3).unwrap();
/// pilot.flush().unwrap();
/// assert_eq!(pilot.text(el), "3");
/// ```
pub struct Pilot {
    rt: Runtime,
}

impl Pilot {
    /// A pilot over a runtime with the default configuration.
    pub fn new() -> Self {
        Self { rt: Runtime::new() }
    }

    pub fn with_config(config: RuntimeConfig) -> Self {
        Self {
            rt: Runtime::with_config(config),
        }
    }

    pub fn define(&mut self, definition: ComponentDefinition) -> Result<ComponentRef, RuntimeError> {
        self.rt.define(definition)
    }

    // ── Tree ─────────────────────────────────────────────────────────

    /// Create `tag` and append it to the body, connecting it.
    pub fn mount(&mut self, tag: &str) -> Result<NodeId, RuntimeError> {
        let body = self.rt.body();
        self.mount_in(body, tag)
    }

    /// Create `tag` and append it to `parent`.
    pub fn mount_in(&mut self, parent: NodeId, tag: &str) -> Result<NodeId, RuntimeError> {
        let el = self.rt.create_element(tag);
        self.rt.append_child(parent, el)?;
        Ok(el)
    }

    /// Detach `node` from its parent, disconnecting it.
    pub fn unmount(&mut self, node: NodeId) -> Result<(), RuntimeError> {
        match self.rt.dom().parent(node) {
            Some(parent) => self.rt.remove_child(parent, node),
            None => Ok(()),
        }
    }

    // ── Interaction ──────────────────────────────────────────────────

    pub fn set_attribute(&mut self, el: NodeId, name: &str, value: &str) -> Result<(), RuntimeError> {
        self.rt.set_attribute(el, name, value)
    }

    pub fn set_field(
        &mut self,
        el: NodeId,
        name: &str,
        value: impl Into<FieldValue>,
    ) -> Result<bool, RuntimeError> {
        self.rt.set_field(el, name, value)
    }

    /// Dispatch a bubbling, composed `click` at `node`.
    pub fn click(&mut self, node: NodeId) -> Result<bool, RuntimeError> {
        self.rt.dispatch_event(node, Event::new("click").bubbles(true).composed(true))
    }

    /// Drain the microtask queue. Returns the number of renders committed.
    pub fn flush(&mut self) -> Result<usize, RuntimeError> {
        self.rt.run_microtasks()
    }

    // ── Query ────────────────────────────────────────────────────────

    pub fn runtime(&self) -> &Runtime {
        &self.rt
    }

    pub fn runtime_mut(&mut self) -> &mut Runtime {
        &mut self.rt
    }

    /// First element with `tag` in the shadow-including subtree of `root`.
    pub fn find(&self, root: NodeId, tag: &str) -> Option<NodeId> {
        let dom = self.rt.dom();
        dom.walk_shadow_including(root)
            .into_iter()
            .find(|&n| n != root && dom.tag_name(n) == Some(tag))
    }

    /// Serialized `node`, shadow roots included.
    pub fn html(&self, node: NodeId) -> String {
        outer_html(self.rt.dom(), node)
    }

    /// Serialized contents of the body.
    pub fn body_html(&self) -> String {
        inner_html(self.rt.dom(), self.rt.body())
    }

    /// Concatenated text of the light tree and, for hosts, the shadow tree.
    pub fn text(&self, node: NodeId) -> String {
        let dom = self.rt.dom();
        let mut text = String::new();
        if let Some(root) = dom.shadow_root(node) {
            text.push_str(&dom.text_content(root));
        }
        text.push_str(&dom.text_content(node));
        text
    }
}

impl Default for Pilot {
    fn default() -> Self {
        Self::new()
    }
}
