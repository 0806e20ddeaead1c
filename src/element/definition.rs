//! Component definitions: tag, fields, render target, styles, constructor.

use std::any::{type_name, TypeId};
use std::fmt;
use std::rc::Rc;

use crate::css::model::StyleSheet;
use crate::css::{parse_css, ParseError};
use crate::dom::ShadowRootMode;
use crate::element::field::FieldSpec;
use crate::element::traits::{Component, ComponentError, RenderFn};
use crate::jsx::Child;
use crate::runtime::RenderContext;

/// Errors from building a [`ComponentDefinition`].
#[derive(Debug, thiserror::Error)]
pub enum DefinitionError {
    #[error("invalid field name '{0}'")]
    InvalidFieldName(String),
    #[error("field '{0}' is declared twice")]
    DuplicateField(String),
    #[error("attribute '{0}' is bound to two fields")]
    DuplicateAttribute(String),
    #[error("invalid component stylesheet: {0}")]
    Stylesheet(#[from] ParseError),
}

/// Where a component renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderTarget {
    /// Into an attached shadow root. `None` uses the runtime's default mode.
    Shadow(Option<ShadowRootMode>),
    /// Directly into the host's light-DOM children.
    Light,
}

type Constructor = Rc<dyn Fn() -> Box<dyn Component>>;

/// Everything the runtime needs to construct and drive one custom element.
#[derive(Clone)]
pub struct ComponentDefinition {
    tag: String,
    fields: Vec<FieldSpec>,
    target: RenderTarget,
    styles: Option<StyleSheet>,
    rerender_on_reconnect: bool,
    constructor: Constructor,
    component_type: TypeId,
    component_name: &'static str,
}

impl fmt::Debug for ComponentDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentDefinition")
            .field("tag", &self.tag)
            .field("fields", &self.fields)
            .field("target", &self.target)
            .field("component", &self.component_name)
            .finish_non_exhaustive()
    }
}

impl ComponentDefinition {
    /// Start building a definition for `tag`.
    pub fn builder(tag: impl Into<String>) -> DefinitionBuilder {
        DefinitionBuilder {
            tag: tag.into(),
            fields: Vec::new(),
            target: RenderTarget::Shadow(None),
            css: None,
            rerender_on_reconnect: false,
        }
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    pub fn target(&self) -> RenderTarget {
        self.target
    }

    /// Parsed component CSS, if any.
    pub fn styles(&self) -> Option<&StyleSheet> {
        self.styles.as_ref()
    }

    pub fn rerender_on_reconnect(&self) -> bool {
        self.rerender_on_reconnect
    }

    /// Look up a declared field by name.
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name() == name)
    }

    /// The field bound to an observed attribute.
    pub fn field_for_attribute(&self, attribute: &str) -> Option<&FieldSpec> {
        self.fields
            .iter()
            .find(|f| f.attribute_name() == Some(attribute))
    }

    /// Attribute names whose changes are delivered to the element.
    pub fn observed_attributes(&self) -> Vec<&str> {
        self.fields.iter().filter_map(FieldSpec::attribute_name).collect()
    }

    /// Whether two definitions are backed by the same component type.
    pub fn same_implementation(&self, other: &ComponentDefinition) -> bool {
        self.component_type == other.component_type
    }

    /// Rust type name of the component, for diagnostics.
    pub fn component_name(&self) -> &'static str {
        self.component_name
    }

    pub(crate) fn construct(&self) -> Box<dyn Component> {
        (self.constructor)()
    }
}

/// Builder for [`ComponentDefinition`].
#[derive(Debug)]
pub struct DefinitionBuilder {
    tag: String,
    fields: Vec<FieldSpec>,
    target: RenderTarget,
    css: Option<String>,
    rerender_on_reconnect: bool,
}

impl DefinitionBuilder {
    /// Declare a reactive field.
    pub fn field(mut self, spec: FieldSpec) -> Self {
        self.fields.push(spec);
        self
    }

    /// Render into a shadow root with the runtime's default mode. This is the default.
    pub fn shadow(mut self) -> Self {
        self.target = RenderTarget::Shadow(None);
        self
    }

    /// Render into a shadow root with an explicit mode.
    pub fn shadow_mode(mut self, mode: ShadowRootMode) -> Self {
        self.target = RenderTarget::Shadow(Some(mode));
        self
    }

    /// Render into the host's light-DOM children.
    pub fn light(mut self) -> Self {
        self.target = RenderTarget::Light;
        self
    }

    /// Component CSS. Parsed when the definition is built.
    pub fn styles(mut self, css: impl Into<String>) -> Self {
        self.css = Some(css.into());
        self
    }

    /// Schedule a render on every reconnection, not only when dirty.
    pub fn rerender_on_reconnect(mut self, yes: bool) -> Self {
        self.rerender_on_reconnect = yes;
        self
    }

    /// Finish with a constructor producing a fresh component per instance.
    pub fn build<C, F>(self, constructor: F) -> Result<ComponentDefinition, DefinitionError>
    where
        C: Component,
        F: Fn() -> C + 'static,
    {
        self.validate_fields()?;
        let styles = self.css.as_deref().map(parse_css).transpose()?;
        Ok(ComponentDefinition {
            tag: self.tag,
            fields: self.fields,
            target: self.target,
            styles,
            rerender_on_reconnect: self.rerender_on_reconnect,
            constructor: Rc::new(move || Box::new(constructor()) as Box<dyn Component>),
            component_type: TypeId::of::<C>(),
            component_name: type_name::<C>(),
        })
    }

    /// Finish with a stateless render closure.
    pub fn render<F>(self, render: F) -> Result<ComponentDefinition, DefinitionError>
    where
        F: Fn(&mut RenderContext<'_>) -> Result<Child, ComponentError> + Clone + 'static,
    {
        self.build(move || RenderFn(render.clone()))
    }

    fn validate_fields(&self) -> Result<(), DefinitionError> {
        for (i, spec) in self.fields.iter().enumerate() {
            let name = spec.name();
            let valid = name
                .chars()
                .next()
                .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
                && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
            if !valid {
                return Err(DefinitionError::InvalidFieldName(name.to_owned()));
            }
            let earlier = &self.fields[..i];
            if earlier.iter().any(|f| f.name() == name) {
                return Err(DefinitionError::DuplicateField(name.to_owned()));
            }
            if let Some(attr) = spec.attribute_name() {
                if earlier.iter().any(|f| f.attribute_name() == Some(attr)) {
                    return Err(DefinitionError::DuplicateAttribute(attr.to_owned()));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Empty;

    impl Component for Empty {
        fn render(&self, _cx: &mut RenderContext<'_>) -> Result<Child, ComponentError> {
            Ok(Child::Empty)
        }
    }

    struct Other;

    impl Component for Other {
        fn render(&self, _cx: &mut RenderContext<'_>) -> Result<Child, ComponentError> {
            Ok(Child::Empty)
        }
    }

    #[test]
    fn builder_defaults() {
        let def = ComponentDefinition::builder("x-empty").build(|| Empty).unwrap();
        assert_eq!(def.tag(), "x-empty");
        assert_eq!(def.target(), RenderTarget::Shadow(None));
        assert!(def.fields().is_empty());
        assert!(def.styles().is_none());
        assert!(!def.rerender_on_reconnect());
        assert!(def.component_name().ends_with("Empty"));
    }

    #[test]
    fn observed_attributes_follow_fields() {
        let def = ComponentDefinition::builder("x-list")
            .field(FieldSpec::new("maxItems").default(5).attribute())
            .field(FieldSpec::new("items"))
            .field(FieldSpec::new("open").default(false).attribute_named("expanded"))
            .build(|| Empty)
            .unwrap();
        assert_eq!(def.observed_attributes(), vec!["max-items", "expanded"]);
        assert_eq!(def.field_for_attribute("expanded").unwrap().name(), "open");
        assert!(def.field_for_attribute("items").is_none());
        assert!(def.field("items").is_some());
    }

    #[test]
    fn targets() {
        let light = ComponentDefinition::builder("x-a").light().build(|| Empty).unwrap();
        assert_eq!(light.target(), RenderTarget::Light);
        let closed = ComponentDefinition::builder("x-b")
            .shadow_mode(ShadowRootMode::Closed)
            .build(|| Empty)
            .unwrap();
        assert_eq!(closed.target(), RenderTarget::Shadow(Some(ShadowRootMode::Closed)));
    }

    #[test]
    fn styles_are_parsed_at_build() {
        let def = ComponentDefinition::builder("x-a")
            .styles(":host { display: block }")
            .build(|| Empty)
            .unwrap();
        assert_eq!(def.styles().unwrap().items.len(), 1);

        let err = ComponentDefinition::builder("x-a")
            .styles(":host { display: block")
            .build(|| Empty)
            .unwrap_err();
        assert!(matches!(err, DefinitionError::Stylesheet(_)));
    }

    #[test]
    fn duplicate_field_rejected() {
        let err = ComponentDefinition::builder("x-a")
            .field(FieldSpec::new("a"))
            .field(FieldSpec::new("a"))
            .build(|| Empty)
            .unwrap_err();
        assert!(matches!(err, DefinitionError::DuplicateField(name) if name == "a"));
    }

    #[test]
    fn duplicate_attribute_rejected() {
        let err = ComponentDefinition::builder("x-a")
            .field(FieldSpec::new("a").attribute_named("shared"))
            .field(FieldSpec::new("b").attribute_named("shared"))
            .build(|| Empty)
            .unwrap_err();
        assert!(matches!(err, DefinitionError::DuplicateAttribute(_)));
    }

    #[test]
    fn invalid_field_name_rejected() {
        for bad in ["", "1st", "has-dash", "sp ace"] {
            let result = ComponentDefinition::builder("x-a")
                .field(FieldSpec::new(bad))
                .build(|| Empty);
            assert!(matches!(result, Err(DefinitionError::InvalidFieldName(_))), "{bad}");
        }
    }

    #[test]
    fn same_implementation_compares_types() {
        let a = ComponentDefinition::builder("x-a").build(|| Empty).unwrap();
        let b = ComponentDefinition::builder("x-a").build(|| Empty).unwrap();
        let c = ComponentDefinition::builder("x-a").build(|| Other).unwrap();
        assert!(a.same_implementation(&b));
        assert!(!a.same_implementation(&c));
    }
}
