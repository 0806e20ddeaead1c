//! Render scheduling, the microtask flush loop, and render commits.

use std::collections::HashSet;

use crate::dom::NodeId;
use crate::element::instance::InstanceId;
use crate::element::lifecycle::{HookPhase, LifecycleEvent};
use crate::jsx::factory::flatten_children;
use crate::reactive::{Microtask, RenderScheduleToken};
use crate::runtime::{RenderContext, Runtime, RuntimeError};

impl Runtime {
    // ── Scheduling ───────────────────────────────────────────────────

    /// Mark `host` dirty and queue a render for it.
    ///
    /// Returns `false` if a render was already pending (the request coalesces)
    /// or the element is not mounted and connected.
    pub fn schedule_render(&mut self, host: NodeId) -> Result<bool, RuntimeError> {
        let id = self.instance_id(host)?;
        if let Some(instance) = self.instances.get_mut(id) {
            instance.dirty = true;
        }
        Ok(self.schedule_instance(id))
    }

    pub(crate) fn schedule_instance(&mut self, id: InstanceId) -> bool {
        let Some(instance) = self.instances.get_mut(id) else {
            return false;
        };
        if !(instance.lifecycle.is_mounted() && instance.lifecycle.is_connected()) {
            return false;
        }
        if let Some(pending) = instance.pending_render {
            tracing::trace!(host = ?instance.host, generation = pending.generation, "render coalesced");
            return false;
        }
        let token = self.scheduler.schedule(id);
        if let Some(instance) = self.instances.get_mut(id) {
            instance.pending_render = Some(token);
        }
        true
    }

    /// Queue a callback behind everything already queued.
    pub fn queue_microtask(&mut self, callback: impl FnOnce(&mut Runtime) + 'static) {
        self.scheduler.queue_microtask(callback);
    }

    /// Whether any microtask is queued.
    pub fn has_pending_microtasks(&self) -> bool {
        !self.scheduler.is_empty()
    }

    /// Drain the microtask queue, including tasks queued while draining.
    ///
    /// Returns the number of renders committed. Render failures of individual
    /// instances are collected and returned after the queue is empty.
    pub fn run_microtasks(&mut self) -> Result<usize, RuntimeError> {
        let limit = self.config.max_microtask_rounds;
        let mut processed = 0usize;
        let mut renders = 0usize;
        let mut errors = Vec::new();

        while let Some(task) = self.scheduler.pop() {
            processed += 1;
            if processed > limit {
                let dropped = self.scheduler.clear() + 1;
                for (_, instance) in self.instances.iter_mut() {
                    instance.pending_render = None;
                }
                tracing::error!(limit, dropped, "microtask queue did not settle");
                return Err(RuntimeError::FlushLimit(limit));
            }
            match task {
                Microtask::Render(token) => match self.run_render_task(token) {
                    Ok(true) => renders += 1,
                    Ok(false) => {}
                    Err(e) => errors.push(e),
                },
                Microtask::Callback(callback) => callback(self),
            }
        }

        if processed > 0 {
            tracing::debug!(processed, renders, errors = errors.len(), "microtasks flushed");
        }
        RuntimeError::collect(errors)?;
        Ok(renders)
    }

    fn run_render_task(&mut self, token: RenderScheduleToken) -> Result<bool, RuntimeError> {
        let Some(instance) = self.instances.get_mut(token.instance) else {
            tracing::trace!(generation = token.generation, "render skipped, instance destroyed");
            return Ok(false);
        };
        if instance.pending_render != Some(token) {
            tracing::trace!(generation = token.generation, "render skipped, token stale");
            return Ok(false);
        }
        instance.pending_render = None;
        if !instance.lifecycle.is_connected() || !instance.dirty {
            return Ok(false);
        }
        self.render_instance(token.instance)
    }

    // ── Rendering ────────────────────────────────────────────────────

    /// Run the component's render and replace the render root's content.
    ///
    /// On failure the previous DOM stays in place, nodes created by the failed
    /// render are destroyed and the instance stays dirty. Returns `false` if
    /// the component was busy further up the stack.
    pub(crate) fn render_instance(&mut self, id: InstanceId) -> Result<bool, RuntimeError> {
        let Some(instance) = self.instances.get_mut(id) else {
            return Ok(false);
        };
        let host = instance.host;
        let root = instance.render_root.unwrap_or(host);
        instance.dirty = false;

        self.render_scopes.push(Vec::new());
        let result = self.with_component(id, |component, rt, host| {
            let mut cx = RenderContext::new(rt, host);
            component.render(&mut cx)
        });
        let created = self.render_scopes.pop().unwrap_or_default();
        let deferred = self.run_deferred_attribute_hooks(id);

        let child = match result {
            Some(Ok(child)) => child,
            Some(Err(source)) => {
                self.discard_created(created);
                if let Some(instance) = self.instances.get_mut(id) {
                    instance.dirty = true;
                }
                let tag = self.tag_of(id);
                tracing::error!(%tag, error = %source, "render failed, keeping previous DOM");
                let failed = RuntimeError::Component {
                    tag,
                    phase: HookPhase::Render,
                    source,
                };
                return RuntimeError::collect(std::iter::once(failed).chain(deferred.err()).collect())
                    .map(|()| false);
            }
            None => {
                if let Some(instance) = self.instances.get_mut(id) {
                    instance.dirty = true;
                }
                return Ok(false);
            }
        };

        let mut nodes = Vec::new();
        flatten_children(self, child, &mut nodes);
        self.commit(id, root, nodes)?;
        deferred?;
        Ok(true)
    }

    fn discard_created(&mut self, created: Vec<NodeId>) {
        for node in created {
            if self.dom.contains(node) && self.dom.parent(node).is_none() {
                // Detached, so nothing is connected under it.
                let _ = self.destroy(node);
            }
        }
    }

    fn commit(&mut self, id: InstanceId, root: NodeId, nodes: Vec<NodeId>) -> Result<(), RuntimeError> {
        let style_node = self.instances.get(id).and_then(|i| i.style_node);
        let keep: HashSet<NodeId> = nodes.iter().copied().chain(style_node).collect();
        let stale: Vec<NodeId> = self
            .dom
            .children(root)
            .iter()
            .copied()
            .filter(|n| !keep.contains(n))
            .collect();
        for node in stale {
            self.destroy(node)?;
        }

        let mut errors = Vec::new();
        for node in nodes {
            if let Err(e) = self.append_child(root, node) {
                errors.push(e);
            }
        }

        if let Some(instance) = self.instances.get_mut(id) {
            instance.render_count += 1;
            let host = instance.host;
            tracing::trace!(?host, count = instance.render_count, "render committed");
            self.lifecycle_log.record(LifecycleEvent::Rendered { host });
        }
        RuntimeError::collect(errors)
    }
}
