//! Contexts handed to component hooks.
//!
//! Both contexts borrow the runtime mutably and dereference to it, so a hook
//! can call any [`Runtime`] method directly. They add shortcuts scoped to the
//! host being rendered or notified.

use std::ops::{Deref, DerefMut};

use crate::dom::NodeId;
use crate::element::field::FieldValue;
use crate::element::traits::ComponentError;
use crate::event::{Event, ListenerId, Subscription};
use crate::runtime::{Runtime, RuntimeError};

// ---------------------------------------------------------------------------
// RenderContext
// ---------------------------------------------------------------------------

/// Passed to [`Component::render`](crate::element::Component::render).
pub struct RenderContext<'a> {
    rt: &'a mut Runtime,
    host: NodeId,
}

impl<'a> RenderContext<'a> {
    pub(crate) fn new(rt: &'a mut Runtime, host: NodeId) -> Self {
        Self { rt, host }
    }

    /// The element being rendered.
    pub fn host(&self) -> NodeId {
        self.host
    }

    /// Current value of one of the host's fields, `Null` if undeclared.
    pub fn field(&self, name: &str) -> FieldValue {
        self.rt.field(self.host, name).unwrap_or_default()
    }
}

impl Deref for RenderContext<'_> {
    type Target = Runtime;

    fn deref(&self) -> &Runtime {
        self.rt
    }
}

impl DerefMut for RenderContext<'_> {
    fn deref_mut(&mut self) -> &mut Runtime {
        self.rt
    }
}

// ---------------------------------------------------------------------------
// ElementContext
// ---------------------------------------------------------------------------

/// Passed to the connected, disconnected and attribute hooks.
pub struct ElementContext<'a> {
    rt: &'a mut Runtime,
    host: NodeId,
}

impl<'a> ElementContext<'a> {
    pub(crate) fn new(rt: &'a mut Runtime, host: NodeId) -> Self {
        Self { rt, host }
    }

    pub fn host(&self) -> NodeId {
        self.host
    }

    /// The host's shadow root, once mounted into one.
    pub fn shadow_root(&self) -> Option<NodeId> {
        self.rt.shadow_root(self.host)
    }

    /// Current value of one of the host's fields, `Null` if undeclared.
    pub fn field(&self, name: &str) -> FieldValue {
        self.rt.field(self.host, name).unwrap_or_default()
    }

    /// Write one of the host's fields. See [`Runtime::set_field`].
    pub fn set_field(&mut self, name: &str, value: impl Into<FieldValue>) -> Result<bool, RuntimeError> {
        self.rt.set_field(self.host, name, value)
    }

    pub fn update_field(
        &mut self,
        name: &str,
        f: impl FnOnce(&FieldValue) -> FieldValue,
    ) -> Result<bool, RuntimeError> {
        self.rt.update_field(self.host, name, f)
    }

    /// Listen on `target` for as long as the host stays connected.
    ///
    /// The listener is removed when the host disconnects. Hooks that want it
    /// back register it again in their next `connected` call.
    pub fn listen<F>(&mut self, target: NodeId, event_type: &str, f: F) -> Result<ListenerId, RuntimeError>
    where
        F: Fn(&mut Runtime, &Event) -> Result<(), ComponentError> + 'static,
    {
        let id = self.rt.instance_id(self.host)?;
        let listener = self.rt.add_event_listener(target, event_type, f)?;
        self.rt.instances[id]
            .subscriptions
            .push(Subscription { target, listener });
        Ok(listener)
    }

    /// [`listen`](Self::listen) on the window.
    pub fn listen_window<F>(&mut self, event_type: &str, f: F) -> Result<ListenerId, RuntimeError>
    where
        F: Fn(&mut Runtime, &Event) -> Result<(), ComponentError> + 'static,
    {
        let window = self.rt.window();
        self.listen(window, event_type, f)
    }

    /// Dispatch `event` with the host as its target.
    pub fn emit(&mut self, event: Event) -> Result<bool, RuntimeError> {
        self.rt.dispatch_event(self.host, event)
    }
}

impl Deref for ElementContext<'_> {
    type Target = Runtime;

    fn deref(&self) -> &Runtime {
        self.rt
    }
}

impl DerefMut for ElementContext<'_> {
    fn deref_mut(&mut self) -> &mut Runtime {
        self.rt
    }
}
