//! Component trait: render plus optional lifecycle hooks.
//!
//! A component is the per-instance behavior behind a custom element. Its
//! reactive state lives in the runtime (declared through
//! [`FieldSpec`](super::field::FieldSpec)s) so that writes can be observed and
//! coalesced; the component struct itself holds whatever else it needs.

use crate::dom::DomError;
use crate::jsx::{Child, JsxError};
use crate::runtime::{ElementContext, RenderContext, RuntimeError};

/// Errors raised by component hooks and render functions.
#[derive(Debug, thiserror::Error)]
pub enum ComponentError {
    #[error(transparent)]
    Jsx(#[from] JsxError),
    #[error(transparent)]
    Dom(#[from] DomError),
    #[error(transparent)]
    Runtime(Box<RuntimeError>),
    #[error("{0}")]
    Message(String),
}

impl ComponentError {
    /// A free-form error.
    pub fn msg(message: impl Into<String>) -> Self {
        ComponentError::Message(message.into())
    }
}

impl From<RuntimeError> for ComponentError {
    fn from(err: RuntimeError) -> Self {
        ComponentError::Runtime(Box::new(err))
    }
}

/// Core trait implemented by every custom element component.
///
/// Only `render` is required. Hooks default to no-ops.
pub trait Component: 'static {
    /// Build this component's DOM for the current field values.
    ///
    /// Called once on first connection and then once per dirty cycle. The
    /// returned nodes replace the previous render output wholesale.
    fn render(&self, cx: &mut RenderContext<'_>) -> Result<Child, ComponentError>;

    /// Called after every connection, after the initial render on the first one.
    fn connected(&mut self, _cx: &mut ElementContext<'_>) -> Result<(), ComponentError> {
        Ok(())
    }

    /// Called on disconnection, before subscriptions are released.
    fn disconnected(&mut self, _cx: &mut ElementContext<'_>) {}

    /// Called for every change of an observed attribute that the runtime did
    /// not cause itself through reflection.
    fn attribute_changed(
        &mut self,
        _cx: &mut ElementContext<'_>,
        _name: &str,
        _old: Option<&str>,
        _new: Option<&str>,
    ) -> Result<(), ComponentError> {
        Ok(())
    }
}

/// A component made from a render closure alone.
pub struct RenderFn<F>(pub F);

impl<F> Component for RenderFn<F>
where
    F: Fn(&mut RenderContext<'_>) -> Result<Child, ComponentError> + 'static,
{
    fn render(&self, cx: &mut RenderContext<'_>) -> Result<Child, ComponentError> {
        (self.0)(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn msg_error_displays_message() {
        let err = ComponentError::msg("boom");
        assert_eq!(err.to_string(), "boom");
    }

    #[test]
    fn dom_error_is_transparent() {
        let err = ComponentError::from(DomError::NotFound);
        assert_eq!(err.to_string(), "node does not exist");
    }

    #[test]
    fn component_is_object_safe() {
        fn assert_object_safe(_: Option<Box<dyn Component>>) {}
        assert_object_safe(None);
    }
}
