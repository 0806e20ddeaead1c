//! Custom element registry: tag validation and one definition per tag.

use std::collections::HashMap;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::element::definition::ComponentDefinition;

/// Names the HTML standard reserves even though they contain a hyphen.
const RESERVED_NAMES: &[&str] = &[
    "annotation-xml",
    "color-profile",
    "font-face",
    "font-face-src",
    "font-face-uri",
    "font-face-format",
    "font-face-name",
    "missing-glyph",
];

static NEXT_REGISTRY_ID: AtomicU64 = AtomicU64::new(1);

/// Errors from [`CustomElementRegistry::define`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("'{tag}' is not a valid custom element name: {reason}")]
    InvalidTagName { tag: String, reason: &'static str },
    #[error("'{0}' is a reserved element name")]
    ReservedTagName(String),
    #[error("'{tag}' is already defined by {existing}")]
    DuplicateDefinition { tag: String, existing: &'static str },
}

/// Check that `name` is a valid custom element name.
pub fn validate_custom_element_name(name: &str) -> Result<(), RegistryError> {
    let invalid = |reason| RegistryError::InvalidTagName {
        tag: name.to_owned(),
        reason,
    };
    match name.chars().next() {
        Some(c) if c.is_ascii_lowercase() => {}
        _ => return Err(invalid("must start with a lowercase ASCII letter")),
    }
    if !name.contains('-') {
        return Err(invalid("must contain a hyphen"));
    }
    if name.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(invalid("must not contain uppercase ASCII letters"));
    }
    if !name
        .chars()
        .all(|c| matches!(c, '-' | '.' | '_' | '0'..='9' | 'a'..='z') || !c.is_ascii())
    {
        return Err(invalid("contains a character not allowed in element names"));
    }
    if RESERVED_NAMES.contains(&name) {
        return Err(RegistryError::ReservedTagName(name.to_owned()));
    }
    Ok(())
}

/// Handle to a registered component, usable as a JSX tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ComponentRef {
    tag: Rc<str>,
    registry: u64,
}

impl ComponentRef {
    /// The registered tag name.
    pub fn tag(&self) -> &str {
        &self.tag
    }
}

/// Maps tag names to their component definitions.
#[derive(Debug)]
pub struct CustomElementRegistry {
    id: u64,
    definitions: HashMap<String, Rc<ComponentDefinition>>,
}

impl CustomElementRegistry {
    pub fn new() -> Self {
        Self {
            id: NEXT_REGISTRY_ID.fetch_add(1, Ordering::Relaxed),
            definitions: HashMap::new(),
        }
    }

    /// Register `definition` under its tag.
    ///
    /// Returns the ref and whether the definition is new. Re-registering the
    /// same component type is a no-op that returns the existing ref.
    pub fn define(
        &mut self,
        definition: ComponentDefinition,
    ) -> Result<(ComponentRef, bool), RegistryError> {
        let tag = definition.tag().to_owned();
        validate_custom_element_name(&tag)?;

        if let Some(existing) = self.definitions.get(&tag) {
            if existing.same_implementation(&definition) {
                return Ok((self.make_ref(&tag), false));
            }
            return Err(RegistryError::DuplicateDefinition {
                tag,
                existing: existing.component_name(),
            });
        }

        let component_ref = self.make_ref(&tag);
        self.definitions.insert(tag, Rc::new(definition));
        Ok((component_ref, true))
    }

    fn make_ref(&self, tag: &str) -> ComponentRef {
        ComponentRef {
            tag: Rc::from(tag),
            registry: self.id,
        }
    }

    /// The definition registered for `tag`.
    pub fn get(&self, tag: &str) -> Option<Rc<ComponentDefinition>> {
        self.definitions.get(tag).cloned()
    }

    /// Resolve a ref issued by this registry.
    pub fn resolve(&self, component: &ComponentRef) -> Option<Rc<ComponentDefinition>> {
        if component.registry != self.id {
            return None;
        }
        self.get(component.tag())
    }

    pub fn is_defined(&self, tag: &str) -> bool {
        self.definitions.contains_key(tag)
    }

    /// Registered tag names, sorted.
    pub fn tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.definitions.keys().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

impl Default for CustomElementRegistry {
    fn default() -> Self {
        Self::new()
    }
}
