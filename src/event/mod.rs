//! Event system: events, listeners, propagation paths, subscriptions.

pub mod handler;
pub mod message;

use std::rc::Rc;

use crate::element::traits::ComponentError;
use crate::runtime::Runtime;

pub use handler::{propagation_path, PathEntry, Subscription};
pub use message::Event;

/// An event listener callback.
///
/// Errors are reported from the `dispatch_event` call and do not stop
/// delivery to the remaining listeners.
pub type Listener = Rc<dyn Fn(&mut Runtime, &Event) -> Result<(), ComponentError>>;

/// Identifies a registered listener for removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub(crate) u64);
