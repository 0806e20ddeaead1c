//! DOM events: type, propagation flags, detail payload.
//!
//! An [`Event`] is built with its flags up front and handed to
//! `Runtime::dispatch_event`. Listeners receive it by shared reference and
//! use the interior-mutable flags to stop propagation or prevent the default.

use std::cell::Cell;

use crate::dom::node::NodeId;
use crate::element::field::FieldValue;

// ---------------------------------------------------------------------------
// Event
// ---------------------------------------------------------------------------

/// A dispatched event.
#[derive(Debug, Clone)]
pub struct Event {
    event_type: String,
    bubbles: bool,
    composed: bool,
    detail: FieldValue,
    target: Cell<Option<NodeId>>,
    current_target: Cell<Option<NodeId>>,
    propagation_stopped: Cell<bool>,
    immediate_stopped: Cell<bool>,
    default_prevented: Cell<bool>,
}

impl Event {
    /// A non-bubbling, non-composed event of the given type.
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            event_type: event_type.into(),
            bubbles: false,
            composed: false,
            detail: FieldValue::Null,
            target: Cell::new(None),
            current_target: Cell::new(None),
            propagation_stopped: Cell::new(false),
            immediate_stopped: Cell::new(false),
            default_prevented: Cell::new(false),
        }
    }

    /// A bubbling, composed event carrying `detail`, like `CustomEvent`.
    pub fn custom(event_type: impl Into<String>, detail: impl Into<FieldValue>) -> Self {
        Self::new(event_type).bubbles(true).composed(true).detail(detail)
    }

    /// Whether the event bubbles (builder).
    pub fn bubbles(mut self, bubbles: bool) -> Self {
        self.bubbles = bubbles;
        self
    }

    /// Whether the event crosses shadow boundaries (builder).
    pub fn composed(mut self, composed: bool) -> Self {
        self.composed = composed;
        self
    }

    /// Attach a payload (builder).
    pub fn detail(mut self, detail: impl Into<FieldValue>) -> Self {
        self.detail = detail.into();
        self
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn does_bubble(&self) -> bool {
        self.bubbles
    }

    pub fn is_composed(&self) -> bool {
        self.composed
    }

    pub fn detail_value(&self) -> &FieldValue {
        &self.detail
    }

    /// The target as seen from the listener currently running.
    ///
    /// Retargeted to the host once the event leaves a shadow tree.
    pub fn target(&self) -> Option<NodeId> {
        self.target.get()
    }

    /// The node whose listeners are currently running.
    pub fn current_target(&self) -> Option<NodeId> {
        self.current_target.get()
    }

    /// Stop after the listeners of the current node.
    pub fn stop_propagation(&self) {
        self.propagation_stopped.set(true);
    }

    /// Stop before the next listener.
    pub fn stop_immediate_propagation(&self) {
        self.propagation_stopped.set(true);
        self.immediate_stopped.set(true);
    }

    pub fn prevent_default(&self) {
        self.default_prevented.set(true);
    }

    pub fn propagation_stopped(&self) -> bool {
        self.propagation_stopped.get()
    }

    pub(crate) fn immediate_stopped(&self) -> bool {
        self.immediate_stopped.get()
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented.get()
    }

    pub(crate) fn set_target(&self, target: NodeId) {
        self.target.set(Some(target));
    }

    pub(crate) fn set_current_target(&self, node: Option<NodeId>) {
        self.current_target.set(node);
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_event_defaults() {
        let ev = Event::new("click");
        assert_eq!(ev.event_type(), "click");
        assert!(!ev.does_bubble());
        assert!(!ev.is_composed());
        assert!(ev.detail_value().is_null());
        assert!(ev.target().is_none());
        assert!(!ev.propagation_stopped());
        assert!(!ev.default_prevented());
    }

    #[test]
    fn custom_event_bubbles_and_composes() {
        let ev = Event::custom("item-selected", 3);
        assert!(ev.does_bubble());
        assert!(ev.is_composed());
        assert_eq!(ev.detail_value(), &FieldValue::Int(3));
    }

    #[test]
    fn stop_flags() {
        let ev = Event::new("x");
        ev.stop_propagation();
        assert!(ev.propagation_stopped());
        assert!(!ev.immediate_stopped());

        let ev = Event::new("x");
        ev.stop_immediate_propagation();
        assert!(ev.propagation_stopped());
        assert!(ev.immediate_stopped());
    }

    #[test]
    fn prevent_default_through_shared_ref() {
        let ev = Event::new("submit");
        let r = &ev;
        r.prevent_default();
        assert!(ev.default_prevented());
    }
}
