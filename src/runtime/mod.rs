//! The component runtime.
//!
//! [`Runtime`] owns the host DOM, the custom element registry, every live
//! component instance, the microtask queue and the stylesheet cache. Tree
//! mutations made through the runtime drive the custom element callbacks the
//! same way a browser does: inserting a subtree into the document connects
//! every component host in it, removing it disconnects them.
//!
//! The runtime is single-threaded. It holds `Rc` values throughout and is
//! therefore neither `Send` nor `Sync`.

pub mod binding;
pub mod config;
pub mod context;
pub mod events;
pub mod lifecycle;
pub mod render;
pub mod style;

use std::rc::Rc;

use slotmap::{SecondaryMap, SlotMap};

use crate::css::stylesheet::StyleSheetCache;
use crate::dom::{Dom, DomError, MutationRecord, NodeId};
use crate::element::definition::DefinitionError;
use crate::element::instance::{ComponentInstance, InstanceId};
use crate::element::lifecycle::{HookPhase, LifecycleEvent, LifecycleLog};
use crate::element::registry::{CustomElementRegistry, RegistryError};
use crate::element::traits::{Component, ComponentError};
use crate::jsx::JsxError;
use crate::reactive::RenderScheduler;
use crate::router::History;

pub use config::{HostCapabilities, RuntimeConfig};
pub use context::{ElementContext, RenderContext};

// ---------------------------------------------------------------------------
// RuntimeError
// ---------------------------------------------------------------------------

/// Errors surfaced by runtime operations.
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Dom(#[from] DomError),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Definition(#[from] DefinitionError),
    #[error(transparent)]
    Jsx(#[from] JsxError),
    /// A user hook or render of one instance failed.
    #[error("<{tag}> {phase} failed: {source}")]
    Component {
        tag: String,
        phase: HookPhase,
        #[source]
        source: ComponentError,
    },
    /// An event listener failed.
    #[error("'{event_type}' listener failed: {source}")]
    Listener {
        event_type: String,
        #[source]
        source: ComponentError,
    },
    /// Several independent instances failed in one call.
    #[error("{} errors, first: {}", .0.len(), .0.first().map(ToString::to_string).unwrap_or_default())]
    Multiple(Vec<RuntimeError>),
    #[error("<{tag}> has no field '{field}'")]
    UnknownField { tag: String, field: String },
    #[error("node is not a component host")]
    NotAComponent,
    #[error("microtask queue did not settle after {0} tasks")]
    FlushLimit(usize),
}

impl RuntimeError {
    /// Fold per-instance errors: none is `Ok`, one is itself, more are `Multiple`.
    pub(crate) fn collect(mut errors: Vec<RuntimeError>) -> Result<(), RuntimeError> {
        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            _ => Err(RuntimeError::Multiple(errors)),
        }
    }

    /// All leaf errors, with `Multiple` expanded.
    pub fn flatten(&self) -> Vec<&RuntimeError> {
        match self {
            RuntimeError::Multiple(errors) => errors.iter().flat_map(RuntimeError::flatten).collect(),
            other => vec![other],
        }
    }
}

// ---------------------------------------------------------------------------
// Runtime
// ---------------------------------------------------------------------------

/// Host document plus everything needed to drive custom elements in it.
pub struct Runtime {
    pub(crate) dom: Dom,
    pub(crate) registry: CustomElementRegistry,
    pub(crate) instances: SlotMap<InstanceId, ComponentInstance>,
    pub(crate) hosts: SecondaryMap<NodeId, InstanceId>,
    pub(crate) scheduler: RenderScheduler,
    pub(crate) styles: StyleSheetCache,
    pub(crate) history: History,
    pub(crate) config: RuntimeConfig,
    pub(crate) lifecycle_log: LifecycleLog,
    /// Nodes created by each render in progress, innermost last.
    pub(crate) render_scopes: Vec<Vec<NodeId>>,
    pub(crate) next_listener: u64,
}

impl Runtime {
    /// A runtime with the default configuration.
    pub fn new() -> Self {
        Self::with_config(RuntimeConfig::default())
    }

    pub fn with_config(config: RuntimeConfig) -> Self {
        Self {
            dom: Dom::new(),
            registry: CustomElementRegistry::new(),
            instances: SlotMap::with_key(),
            hosts: SecondaryMap::new(),
            scheduler: RenderScheduler::new(),
            styles: StyleSheetCache::new(),
            history: History::new(config.initial_location.clone()),
            lifecycle_log: LifecycleLog::new(config.record_lifecycle),
            config,
            render_scopes: Vec::new(),
            next_listener: 0,
        }
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Read access to the host DOM. Mutations go through the runtime.
    pub fn dom(&self) -> &Dom {
        &self.dom
    }

    pub fn registry(&self) -> &CustomElementRegistry {
        &self.registry
    }

    pub fn stylesheets(&self) -> &StyleSheetCache {
        &self.styles
    }

    pub fn window(&self) -> NodeId {
        self.dom.window()
    }

    pub fn document(&self) -> NodeId {
        self.dom.document()
    }

    pub fn head(&self) -> NodeId {
        self.dom.head()
    }

    pub fn body(&self) -> NodeId {
        self.dom.body()
    }

    /// Drain recorded lifecycle events. Always empty unless
    /// [`RuntimeConfig::record_lifecycle`] is set.
    pub fn take_lifecycle_events(&mut self) -> Vec<LifecycleEvent> {
        self.lifecycle_log.take()
    }

    /// Drain the DOM mutation records accumulated since the last call.
    pub fn take_mutations(&mut self) -> Vec<MutationRecord> {
        self.dom.take_mutations()
    }

    // ── Node creation ────────────────────────────────────────────────

    /// Create a detached element. A defined custom element is constructed
    /// immediately.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        let el = self.dom.create_element(tag);
        self.track_created(el);
        if let Some(definition) = self.dom.tag_name(el).and_then(|t| self.registry.get(t)) {
            self.construct_instance(el, definition);
        }
        el
    }

    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        let node = self.dom.create_text(text);
        self.track_created(node);
        node
    }

    pub fn create_fragment(&mut self) -> NodeId {
        let node = self.dom.create_fragment();
        self.track_created(node);
        node
    }

    fn track_created(&mut self, node: NodeId) {
        if let Some(scope) = self.render_scopes.last_mut() {
            scope.push(node);
        }
    }

    // ── Tree mutation ────────────────────────────────────────────────

    /// Append `child` to `parent`, connecting any component hosts that end up
    /// in the document.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), RuntimeError> {
        self.insert_before(parent, child, None)
    }

    /// Insert `child` before `reference`. A child that is already connected is
    /// disconnected from its old position first.
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> Result<(), RuntimeError> {
        let moving = if self.dom.parent(child).is_some() && self.dom.is_connected(child) {
            self.hosts_in(child)
        } else {
            Vec::new()
        };
        let inserted = self.dom.insert_before(parent, child, reference)?;
        for id in moving {
            self.disconnect_instance(id);
        }
        self.connect_subtrees(&inserted)
    }

    /// Detach `child` from `parent` without destroying it.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), RuntimeError> {
        let hosts = self.hosts_in(child);
        self.dom.remove_child(parent, child)?;
        self.disconnect_detached(hosts);
        Ok(())
    }

    /// Destroy `node` and its subtree, dropping every component instance in it.
    pub fn destroy(&mut self, node: NodeId) -> Result<(), RuntimeError> {
        if !self.dom.contains(node) {
            return Err(DomError::NotFound.into());
        }
        if node == self.dom.document() || node == self.dom.window() {
            return Err(DomError::HierarchyRequest("the document cannot be destroyed").into());
        }
        let hosts = self.hosts_in(node);
        self.dom.detach(node);
        self.disconnect_detached(hosts.clone());
        for id in hosts {
            self.drop_instance(id);
        }
        self.dom.remove(node);
        Ok(())
    }

    /// Set the data of a text node.
    pub fn set_text(&mut self, node: NodeId, text: impl Into<String>) -> Result<(), RuntimeError> {
        Ok(self.dom.set_text(node, text)?)
    }

    // ── Instances ────────────────────────────────────────────────────

    /// The component instance hosted by `host`.
    pub fn instance(&self, host: NodeId) -> Option<&ComponentInstance> {
        self.hosts.get(host).and_then(|&id| self.instances.get(id))
    }

    pub fn is_component(&self, host: NodeId) -> bool {
        self.instance(host).is_some()
    }

    pub(crate) fn instance_id(&self, host: NodeId) -> Result<InstanceId, RuntimeError> {
        self.hosts
            .get(host)
            .copied()
            .filter(|&id| self.instances.contains_key(id))
            .ok_or(RuntimeError::NotAComponent)
    }

    /// The shadow root attached to `host`, if any.
    pub fn shadow_root(&self, host: NodeId) -> Option<NodeId> {
        self.dom.shadow_root(host)
    }

    /// Where `host` renders: its shadow root, or itself in light mode.
    pub fn render_root(&self, host: NodeId) -> Option<NodeId> {
        self.instance(host)?.render_root
    }

    /// Number of committed renders of `host`. Zero for non-components.
    pub fn render_count(&self, host: NodeId) -> u64 {
        self.instance(host).map_or(0, ComponentInstance::render_count)
    }

    /// Run `f` with the instance's component taken out, so the hook can borrow
    /// the runtime mutably. Returns `None` if the instance is gone or its
    /// component is already running further up the stack.
    pub(crate) fn with_component<R>(
        &mut self,
        id: InstanceId,
        f: impl FnOnce(&mut dyn Component, &mut Runtime, NodeId) -> R,
    ) -> Option<R> {
        let instance = self.instances.get_mut(id)?;
        let host = instance.host;
        let Some(mut component) = instance.component.take() else {
            tracing::trace!(?host, "component busy, hook skipped");
            return None;
        };
        let result = f(component.as_mut(), self, host);
        if let Some(instance) = self.instances.get_mut(id) {
            instance.component = Some(component);
        }
        Some(result)
    }

    pub(crate) fn tag_of(&self, id: InstanceId) -> String {
        self.instances
            .get(id)
            .map(|i| i.tag().to_owned())
            .unwrap_or_default()
    }

    pub(crate) fn definition_of(&self, id: InstanceId) -> Option<Rc<crate::element::ComponentDefinition>> {
        self.instances.get(id).map(|i| i.definition.clone())
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{ComponentDefinition, FieldSpec};
    use crate::jsx::{Child, Jsx, Props};
    use crate::testing::snapshot::outer_html;
    use pretty_assertions::assert_eq;

    struct Hello;

    impl Component for Hello {
        fn render(&self, cx: &mut RenderContext<'_>) -> Result<Child, ComponentError> {
            let name = cx.field("name");
            Ok(cx.h("p", Props::new(), vec![format!("hi {name}").into()])?.into())
        }
    }

    fn hello_runtime() -> Runtime {
        let mut rt = Runtime::new();
        rt.define(
            ComponentDefinition::builder("x-hello")
                .field(FieldSpec::new("name").default("you").attribute())
                .light()
                .build(|| Hello)
                .unwrap(),
        )
        .unwrap();
        rt
    }

    #[test]
    fn new_runtime_has_document_skeleton() {
        let rt = Runtime::new();
        assert_eq!(rt.dom().tag_name(rt.body()), Some("body"));
        assert_eq!(rt.dom().tag_name(rt.head()), Some("head"));
        assert!(rt.dom().is_connected(rt.body()));
        assert!(rt.registry().is_empty());
    }

    #[test]
    fn create_defined_element_constructs_instance() {
        let mut rt = hello_runtime();
        let el = rt.create_element("X-HELLO");
        assert!(rt.is_component(el));
        let plain = rt.create_element("div");
        assert!(!rt.is_component(plain));
        assert_eq!(rt.render_count(plain), 0);
    }

    #[test]
    fn append_to_document_renders_synchronously() {
        let mut rt = hello_runtime();
        let el = rt.create_element("x-hello");
        rt.append_child(rt.body(), el).unwrap();
        assert_eq!(rt.render_count(el), 1);
        assert_eq!(outer_html(rt.dom(), el), "<x-hello><p>hi you</p></x-hello>");
    }

    #[test]
    fn detached_insert_does_not_connect() {
        let mut rt = hello_runtime();
        let wrapper = rt.create_element("div");
        let el = rt.create_element("x-hello");
        rt.append_child(wrapper, el).unwrap();
        assert_eq!(rt.render_count(el), 0);
        rt.append_child(rt.body(), wrapper).unwrap();
        assert_eq!(rt.render_count(el), 1);
    }

    #[test]
    fn destroy_drops_instances() {
        let mut rt = hello_runtime();
        let el = rt.create_element("x-hello");
        rt.append_child(rt.body(), el).unwrap();
        rt.destroy(el).unwrap();
        assert!(!rt.dom().contains(el));
        assert!(!rt.is_component(el));
        assert!(rt.instances.is_empty());
        assert!(matches!(rt.destroy(el), Err(RuntimeError::Dom(DomError::NotFound))));
    }

    #[test]
    fn document_cannot_be_destroyed() {
        let mut rt = Runtime::new();
        let doc = rt.document();
        assert!(matches!(
            rt.destroy(doc),
            Err(RuntimeError::Dom(DomError::HierarchyRequest(_)))
        ));
    }

    #[test]
    fn collect_folds_errors() {
        assert!(RuntimeError::collect(vec![]).is_ok());
        assert!(matches!(
            RuntimeError::collect(vec![RuntimeError::NotAComponent]),
            Err(RuntimeError::NotAComponent)
        ));
        let err = RuntimeError::collect(vec![RuntimeError::NotAComponent, RuntimeError::FlushLimit(1)])
            .unwrap_err();
        assert_eq!(err.flatten().len(), 2);
        assert_eq!(err.to_string(), "2 errors, first: node is not a component host");
    }
}
