//! Lifecycle coordination: define/upgrade, connect, disconnect, destroy.

use std::rc::Rc;

use crate::dom::NodeId;
use crate::element::definition::ComponentDefinition;
use crate::element::instance::{ComponentInstance, InstanceId};
use crate::element::lifecycle::{ConnectOutcome, HookPhase, LifecycleEvent};
use crate::element::registry::ComponentRef;
use crate::runtime::{ElementContext, Runtime, RuntimeError};

impl Runtime {
    // ── Registration ─────────────────────────────────────────────────

    /// Register a component definition and upgrade existing elements with its
    /// tag. Connected ones are connected right away.
    ///
    /// Re-registering the same component type returns the existing ref.
    pub fn define(&mut self, definition: ComponentDefinition) -> Result<ComponentRef, RuntimeError> {
        let (component_ref, is_new) = self.registry.define(definition)?;
        if !is_new {
            tracing::debug!(tag = component_ref.tag(), "component already defined");
            return Ok(component_ref);
        }
        let Some(definition) = self.registry.get(component_ref.tag()) else {
            return Ok(component_ref);
        };
        tracing::debug!(
            tag = component_ref.tag(),
            fields = definition.fields().len(),
            "component defined"
        );

        let candidates: Vec<NodeId> = self
            .dom
            .walk_shadow_including(self.dom.document())
            .into_iter()
            .filter(|&n| self.dom.tag_name(n) == Some(definition.tag()) && !self.hosts.contains_key(n))
            .collect();

        let mut errors = Vec::new();
        for host in candidates {
            if !self.dom.contains(host) || self.hosts.contains_key(host) {
                continue;
            }
            let (id, replay_errors) = self.upgrade(host, definition.clone());
            errors.extend(replay_errors);
            if self.dom.is_connected(host) {
                if let Err(e) = self.connect_instance(id) {
                    errors.push(e);
                }
            }
        }
        RuntimeError::collect(errors)?;
        Ok(component_ref)
    }

    /// Create the instance for `host` without touching its attributes.
    pub(crate) fn construct_instance(
        &mut self,
        host: NodeId,
        definition: Rc<ComponentDefinition>,
    ) -> InstanceId {
        let id = self.instances.insert(ComponentInstance::new(definition, host));
        self.hosts.insert(host, id);
        self.lifecycle_log.record(LifecycleEvent::Constructed { host });
        id
    }

    /// Construct the instance for an existing element and replay its observed
    /// attributes through the attribute callback.
    ///
    /// The instance exists even when a replayed hook fails. Those failures are
    /// handed back so the caller can still connect the element.
    pub(crate) fn upgrade(
        &mut self,
        host: NodeId,
        definition: Rc<ComponentDefinition>,
    ) -> (InstanceId, Vec<RuntimeError>) {
        let present: Vec<(String, String)> = definition
            .observed_attributes()
            .into_iter()
            .filter_map(|name| {
                self.dom
                    .get_attribute(host, name)
                    .map(|v| (name.to_owned(), v.to_owned()))
            })
            .collect();
        tracing::debug!(tag = definition.tag(), replayed = present.len(), "upgrading element");
        let id = self.construct_instance(host, definition);
        let mut errors = Vec::new();
        for (name, value) in present {
            if let Err(e) = self.attribute_changed_callback(host, &name, None, Some(&value)) {
                errors.push(e);
            }
        }
        (id, errors)
    }

    // ── Callbacks ────────────────────────────────────────────────────

    /// Run the connect transition for `host`, as the platform does when the
    /// element enters the document.
    pub fn connected_callback(&mut self, host: NodeId) -> Result<(), RuntimeError> {
        let id = self.instance_id(host)?;
        self.connect_instance(id)
    }

    /// Run the disconnect transition for `host`, as the platform does when the
    /// element leaves the document.
    pub fn disconnected_callback(&mut self, host: NodeId) -> Result<(), RuntimeError> {
        let id = self.instance_id(host)?;
        self.disconnect_instance(id);
        Ok(())
    }

    pub(crate) fn connect_instance(&mut self, id: InstanceId) -> Result<(), RuntimeError> {
        let Some(instance) = self.instances.get_mut(id) else {
            return Ok(());
        };
        let host = instance.host;
        match instance.lifecycle.connect() {
            ConnectOutcome::AlreadyConnected => Ok(()),
            ConnectOutcome::FirstMount => {
                self.lifecycle_log.record(LifecycleEvent::Mounted { host });
                self.mount_instance(id)?;
                let rendered = self.render_instance(id).err();
                let hooked = self.run_connected_hook(id).err();
                RuntimeError::collect(rendered.into_iter().chain(hooked).collect())
            }
            ConnectOutcome::Reconnect => {
                let hooked = self.run_connected_hook(id);
                if let Some(instance) = self.instances.get_mut(id) {
                    if instance.dirty || instance.definition.rerender_on_reconnect() {
                        instance.dirty = true;
                        self.schedule_instance(id);
                    }
                }
                hooked
            }
        }
    }

    fn run_connected_hook(&mut self, id: InstanceId) -> Result<(), RuntimeError> {
        let result = self.with_component(id, |component, rt, host| {
            let mut cx = ElementContext::new(rt, host);
            component.connected(&mut cx)
        });
        if let Some(host) = self.instances.get(id).map(|i| i.host) {
            self.lifecycle_log.record(LifecycleEvent::Connected { host });
        }
        let mut errors = Vec::new();
        if let Some(Err(source)) = result {
            let tag = self.tag_of(id);
            tracing::error!(%tag, error = %source, "connected hook failed");
            errors.push(RuntimeError::Component {
                tag,
                phase: HookPhase::Connected,
                source,
            });
        }
        if let Err(e) = self.run_deferred_attribute_hooks(id) {
            errors.push(e);
        }
        RuntimeError::collect(errors)
    }

    pub(crate) fn disconnect_instance(&mut self, id: InstanceId) {
        let Some(instance) = self.instances.get_mut(id) else {
            return;
        };
        if !instance.lifecycle.disconnect() {
            return;
        }
        let host = instance.host;
        self.with_component(id, |component, rt, host| {
            let mut cx = ElementContext::new(rt, host);
            component.disconnected(&mut cx);
        });
        if let Err(error) = self.run_deferred_attribute_hooks(id) {
            tracing::error!(?host, %error, "attribute hook failed during disconnect");
        }
        let Some(instance) = self.instances.get_mut(id) else {
            return;
        };
        if let Some(token) = instance.pending_render.take() {
            tracing::trace!(?host, generation = token.generation, "pending render cancelled");
        }
        let subscriptions = std::mem::take(&mut instance.subscriptions);
        for sub in subscriptions {
            self.dom.remove_listener(sub.target, sub.listener);
        }
        self.lifecycle_log.record(LifecycleEvent::Disconnected { host });
    }

    /// Remove an instance for good. The host node itself is left alone.
    pub(crate) fn drop_instance(&mut self, id: InstanceId) {
        let Some(instance) = self.instances.remove(id) else {
            return;
        };
        for sub in &instance.subscriptions {
            self.dom.remove_listener(sub.target, sub.listener);
        }
        self.hosts.remove(instance.host);
        self.lifecycle_log
            .record(LifecycleEvent::Destroyed { host: instance.host });
    }

    // ── Tree walks ───────────────────────────────────────────────────

    /// Instances hosted in the shadow-including subtree of `node`, in tree order.
    pub(crate) fn hosts_in(&self, node: NodeId) -> Vec<InstanceId> {
        self.dom
            .walk_shadow_including(node)
            .into_iter()
            .filter_map(|n| self.hosts.get(n).copied())
            .collect()
    }

    /// Connect every host under the given roots that is now in the document,
    /// upgrading elements whose tag was defined while they were detached.
    pub(crate) fn connect_subtrees(&mut self, roots: &[NodeId]) -> Result<(), RuntimeError> {
        let mut errors = Vec::new();
        for &root in roots {
            if !self.dom.is_connected(root) {
                continue;
            }
            for node in self.dom.walk_shadow_including(root) {
                if !self.dom.is_connected(node) {
                    continue;
                }
                let id = match self.hosts.get(node).copied() {
                    Some(id) => id,
                    None => {
                        let Some(definition) = self.dom.tag_name(node).and_then(|t| self.registry.get(t))
                        else {
                            continue;
                        };
                        let (id, replay_errors) = self.upgrade(node, definition);
                        errors.extend(replay_errors);
                        id
                    }
                };
                if let Err(e) = self.connect_instance(id) {
                    errors.push(e);
                }
            }
        }
        RuntimeError::collect(errors)
    }

    /// Disconnect the given instances whose hosts are no longer in the document.
    pub(crate) fn disconnect_detached(&mut self, ids: Vec<InstanceId>) {
        for id in ids {
            let Some(host) = self.instances.get(id).map(|i| i.host) else {
                continue;
            };
            if !self.dom.is_connected(host) {
                self.disconnect_instance(id);
            }
        }
    }
}
