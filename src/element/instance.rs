//! Live component instances.

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::rc::Rc;

use slotmap::new_key_type;

use crate::dom::NodeId;
use crate::element::definition::ComponentDefinition;
use crate::element::field::FieldValue;
use crate::element::lifecycle::Lifecycle;
use crate::element::traits::Component;
use crate::event::Subscription;
use crate::reactive::RenderScheduleToken;

new_key_type! {
    /// Identifies a live component instance.
    pub struct InstanceId;
}

/// An attribute change delivered while the component's own hook was running.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct AttributeChange {
    pub name: String,
    pub old: Option<String>,
    pub new: Option<String>,
}

/// One live custom element: its component, state, and render bookkeeping.
pub struct ComponentInstance {
    pub(crate) definition: Rc<ComponentDefinition>,
    pub(crate) host: NodeId,
    /// Taken out while a hook or render runs.
    pub(crate) component: Option<Box<dyn Component>>,
    pub(crate) fields: HashMap<String, FieldValue>,
    pub(crate) dirty: bool,
    pub(crate) pending_render: Option<RenderScheduleToken>,
    pub(crate) lifecycle: Lifecycle,
    /// Shadow root or host, decided on first mount.
    pub(crate) render_root: Option<NodeId>,
    /// Inline `<style>` kept as the first child of the shadow root.
    pub(crate) style_node: Option<NodeId>,
    pub(crate) subscriptions: Vec<Subscription>,
    /// Set while the runtime writes a reflected attribute.
    pub(crate) reflecting: bool,
    /// Attribute hooks waiting for the component to come back.
    pub(crate) deferred_attribute_hooks: VecDeque<AttributeChange>,
    pub(crate) render_count: u64,
}

impl ComponentInstance {
    pub(crate) fn new(definition: Rc<ComponentDefinition>, host: NodeId) -> Self {
        let fields = definition
            .fields()
            .iter()
            .map(|spec| (spec.name().to_owned(), spec.default_value().clone()))
            .collect();
        let component = definition.construct();
        Self {
            definition,
            host,
            component: Some(component),
            fields,
            dirty: false,
            pending_render: None,
            lifecycle: Lifecycle::new(),
            render_root: None,
            style_node: None,
            subscriptions: Vec::new(),
            reflecting: false,
            deferred_attribute_hooks: VecDeque::new(),
            render_count: 0,
        }
    }

    pub fn tag(&self) -> &str {
        self.definition.tag()
    }

    pub fn host(&self) -> NodeId {
        self.host
    }

    pub fn definition(&self) -> &ComponentDefinition {
        &self.definition
    }

    /// Current value of a declared field.
    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    pub fn render_root(&self) -> Option<NodeId> {
        self.render_root
    }

    pub fn render_count(&self) -> u64 {
        self.render_count
    }

    pub fn pending_render(&self) -> Option<RenderScheduleToken> {
        self.pending_render
    }
}

impl fmt::Debug for ComponentInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentInstance")
            .field("tag", &self.tag())
            .field("host", &self.host)
            .field("fields", &self.fields)
            .field("dirty", &self.dirty)
            .field("lifecycle", &self.lifecycle)
            .field("render_count", &self.render_count)
            .finish_non_exhaustive()
    }
}
