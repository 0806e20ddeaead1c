//! Listener registration and event dispatch.

use std::rc::Rc;

use crate::dom::{DomError, NodeId};
use crate::element::traits::ComponentError;
use crate::event::{propagation_path, Event, Listener, ListenerId, PathEntry};
use crate::runtime::{Runtime, RuntimeError};

impl Runtime {
    /// Register an already boxed listener.
    pub fn add_listener(
        &mut self,
        target: NodeId,
        event_type: &str,
        listener: Listener,
    ) -> Result<ListenerId, RuntimeError> {
        self.next_listener += 1;
        let id = ListenerId(self.next_listener);
        self.dom.add_listener(target, id, event_type, listener)?;
        tracing::trace!(?target, event_type, "listener added");
        Ok(id)
    }

    /// Register `f` for events of `event_type` reaching `target`.
    pub fn add_event_listener<F>(
        &mut self,
        target: NodeId,
        event_type: &str,
        f: F,
    ) -> Result<ListenerId, RuntimeError>
    where
        F: Fn(&mut Runtime, &Event) -> Result<(), ComponentError> + 'static,
    {
        self.add_listener(target, event_type, Rc::new(f))
    }

    /// Returns `false` if no such listener was registered on `target`.
    pub fn remove_event_listener(&mut self, target: NodeId, id: ListenerId) -> bool {
        self.dom.remove_listener(target, id)
    }

    /// Dispatch `event` at `target`.
    ///
    /// Bubbling events walk the propagation path up to the window, crossing
    /// shadow boundaries only when composed. Every listener on the path runs
    /// even if an earlier one failed; failures are returned together after
    /// delivery. Returns `false` if a listener called `prevent_default`.
    pub fn dispatch_event(&mut self, target: NodeId, event: Event) -> Result<bool, RuntimeError> {
        if !self.dom.contains(target) {
            return Err(DomError::NotFound.into());
        }
        let path = if event.does_bubble() {
            propagation_path(&self.dom, target, event.is_composed())
        } else {
            vec![PathEntry { node: target, target }]
        };
        tracing::debug!(event_type = event.event_type(), ?target, hops = path.len(), "dispatch");

        let mut errors = Vec::new();
        for entry in path {
            event.set_target(entry.target);
            event.set_current_target(Some(entry.node));
            for listener in self.dom.listeners_for(entry.node, event.event_type()) {
                if let Err(source) = listener(self, &event) {
                    tracing::error!(event_type = event.event_type(), error = %source, "listener failed");
                    errors.push(RuntimeError::Listener {
                        event_type: event.event_type().to_owned(),
                        source,
                    });
                }
                if event.immediate_stopped() {
                    break;
                }
            }
            if event.propagation_stopped() {
                break;
            }
        }
        event.set_current_target(None);

        RuntimeError::collect(errors)?;
        Ok(!event.default_prevented())
    }
}
