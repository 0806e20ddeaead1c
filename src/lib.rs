//! # petal
//!
//! A custom-element component runtime: typed components with reactive fields,
//! JSX-style DOM construction, microtask-batched rendering and scoped styles.
//!
//! petal brings the Web Components programming model to Rust. Components are
//! registered under a custom element tag, react to attribute and field changes,
//! render straight into real DOM nodes (no virtual DOM), and keep their styles
//! inside a shadow root. The host document is a headless, slotmap-backed DOM
//! that drives lifecycle callbacks the way a browser does.
//!
//! ## Core Systems
//!
//! - **[`dom`]** — Slotmap-backed host DOM: tree operations, attributes, shadow roots, listeners
//! - **[`css`]** — CSS engine: logos tokenizer, parser, `:host` scoping, stylesheet cache
//! - **[`element`]** — Component trait, field declarations, definitions, lifecycle, registry
//! - **[`reactive`]** — Microtask render scheduler with coalescing and cancellation
//! - **[`event`]** — Events, listeners, composed propagation paths
//! - **[`jsx`]** — JSX factory: tags, props, children, function components, fragments
//! - **[`runtime`]** — The runtime tying everything together
//! - **[`router`]** — History navigation and a path-matching outlet element
//! - **[`testing`]** — Headless `Pilot` driver and HTML snapshot helpers

// Host platform
pub mod css;
pub mod dom;

// Component model
pub mod element;
pub mod event;
pub mod jsx;
pub mod reactive;

// Runtime
pub mod router;
pub mod runtime;

// Test harness
pub mod testing;

pub use dom::NodeId;
pub use element::{Component, ComponentDefinition, ComponentError, FieldSpec, FieldValue};
pub use runtime::{Runtime, RuntimeConfig, RuntimeError};

// Proc macros (feature-gated)
#[cfg(feature = "macros")]
pub use petal_macros::jsx;
