//! Host DOM: slotmap-backed document with shadow roots, attributes and listeners.

pub mod node;
pub mod tree;
pub mod query;

pub use node::{ElementData, NodeData, NodeId, NodeKind, ShadowRootData, ShadowRootMode};
pub use tree::{Dom, DomError, MutationRecord};
