//! Component model: the `Component` trait, field declarations, definitions,
//! lifecycle state and the custom element registry.

pub mod definition;
pub mod field;
pub mod instance;
pub mod lifecycle;
pub mod registry;
pub mod traits;

pub use definition::{ComponentDefinition, DefinitionBuilder, DefinitionError, RenderTarget};
pub use field::{kebab_case, FieldSpec, FieldValue};
pub use instance::{ComponentInstance, InstanceId};
pub use lifecycle::{ConnectOutcome, HookPhase, Lifecycle, LifecycleEvent, LifecycleLog, LifecyclePhase};
pub use registry::{validate_custom_element_name, ComponentRef, CustomElementRegistry, RegistryError};
pub use traits::{Component, ComponentError, RenderFn};
