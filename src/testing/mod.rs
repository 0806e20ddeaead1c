//! Headless testing framework: Pilot, snapshot helpers.
//!
//! Use the [`Pilot`] to drive a [`Runtime`](crate::runtime::Runtime) the way a
//! page would: mount elements, click, flush microtasks. Use [`outer_html`] and
//! [`inner_html`] to capture the document as HTML for snapshot assertions.

pub mod pilot;
pub mod snapshot;

pub use pilot::Pilot;
pub use snapshot::{inner_html, outer_html};
