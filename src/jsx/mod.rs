//! JSX factory: tags, props, children and the `h()` function.
//!
//! The `jsx!` macro (feature `macros`) expands to calls of [`Jsx::h`], which
//! is implemented for [`Runtime`](crate::runtime::Runtime) and the render and
//! hook contexts.

pub mod factory;
pub mod props;

pub use factory::{event_name, h, FunctionComponent, JsxError, Tag};
pub use props::{Child, PropValue, Props};

use crate::dom::NodeId;
use crate::runtime::{ElementContext, RenderContext, Runtime};

/// Anything that can build DOM through the factory.
pub trait Jsx {
    fn runtime(&mut self) -> &mut Runtime;

    /// See [`h`].
    fn h(&mut self, tag: impl Into<Tag>, props: Props, children: Vec<Child>) -> Result<NodeId, JsxError> {
        factory::h(self.runtime(), tag, props, children)
    }
}

impl Jsx for Runtime {
    fn runtime(&mut self) -> &mut Runtime {
        self
    }
}

impl Jsx for RenderContext<'_> {
    fn runtime(&mut self) -> &mut Runtime {
        self
    }
}

impl Jsx for ElementContext<'_> {
    fn runtime(&mut self) -> &mut Runtime {
        self
    }
}
