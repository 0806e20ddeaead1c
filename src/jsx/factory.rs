//! The `h()` factory: builds real DOM nodes from a tag, props and children.
//!
//! Every call creates nodes immediately. There is no retained tree and no
//! diffing; a re-render simply builds a fresh subtree.

use std::fmt;
use std::rc::Rc;

use crate::dom::{DomError, NodeId};
use crate::element::registry::ComponentRef;
use crate::jsx::props::{Child, PropValue, Props};
use crate::runtime::{Runtime, RuntimeError};

/// Errors from the JSX factory.
#[derive(Debug, thiserror::Error)]
pub enum JsxError {
    #[error("component <{0}> is not defined in this runtime")]
    UnknownComponent(String),
    #[error("invalid tag name '{0}'")]
    InvalidTagName(String),
    #[error("invalid value for prop '{prop}': {reason}")]
    InvalidProp { prop: String, reason: &'static str },
    #[error(transparent)]
    Dom(#[from] DomError),
    #[error(transparent)]
    Runtime(Box<RuntimeError>),
}

impl From<RuntimeError> for JsxError {
    fn from(err: RuntimeError) -> Self {
        match err {
            RuntimeError::Dom(e) => JsxError::Dom(e),
            RuntimeError::Jsx(e) => e,
            other => JsxError::Runtime(Box::new(other)),
        }
    }
}

/// A function component: receives props and children, returns what to render.
pub type FunctionComponent = Rc<dyn Fn(&mut Runtime, Props, Vec<Child>) -> Result<Child, JsxError>>;

/// What the factory should create.
#[derive(Clone)]
pub enum Tag {
    /// A plain element, or a custom element looked up by name.
    Element(String),
    /// A registered component.
    Component(ComponentRef),
    /// A function component, expanded inline.
    Function(FunctionComponent),
    /// A document fragment grouping the children.
    Fragment,
}

impl Tag {
    /// Wrap a function component.
    pub fn function<F>(f: F) -> Self
    where
        F: Fn(&mut Runtime, Props, Vec<Child>) -> Result<Child, JsxError> + 'static,
    {
        Tag::Function(Rc::new(f))
    }
}

impl fmt::Debug for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tag::Element(name) => f.debug_tuple("Element").field(name).finish(),
            Tag::Component(r) => f.debug_tuple("Component").field(&r.tag()).finish(),
            Tag::Function(_) => f.write_str("Function(..)"),
            Tag::Fragment => f.write_str("Fragment"),
        }
    }
}

impl From<&str> for Tag {
    fn from(name: &str) -> Self {
        Tag::Element(name.to_owned())
    }
}

impl From<String> for Tag {
    fn from(name: String) -> Self {
        Tag::Element(name)
    }
}

impl From<ComponentRef> for Tag {
    fn from(r: ComponentRef) -> Self {
        Tag::Component(r)
    }
}

impl From<&ComponentRef> for Tag {
    fn from(r: &ComponentRef) -> Self {
        Tag::Component(r.clone())
    }
}

impl From<&Tag> for Tag {
    fn from(tag: &Tag) -> Self {
        tag.clone()
    }
}

/// Create DOM for `tag` with `props` and `children`.
///
/// Returns the created element, or a fragment holding the children for
/// [`Tag::Fragment`] and for function components that render several nodes.
pub fn h(
    rt: &mut Runtime,
    tag: impl Into<Tag>,
    mut props: Props,
    children: Vec<Child>,
) -> Result<NodeId, JsxError> {
    let children = match props.remove("children") {
        Some(PropValue::Children(mut from_props)) => {
            from_props.extend(children);
            from_props
        }
        Some(PropValue::Value(v)) => {
            let mut merged = vec![Child::from(v)];
            merged.extend(children);
            merged
        }
        Some(PropValue::Handler(_)) => {
            return Err(JsxError::InvalidProp {
                prop: "children".into(),
                reason: "handlers cannot be children",
            })
        }
        None => children,
    };

    match tag.into() {
        Tag::Fragment => {
            let fragment = rt.create_fragment();
            append_children(rt, fragment, children)?;
            Ok(fragment)
        }
        Tag::Function(component) => {
            let rendered = component(rt, props, children)?;
            into_node(rt, rendered)
        }
        Tag::Element(name) => {
            validate_tag_name(&name)?;
            let el = rt.create_element(&name);
            apply_props(rt, el, props)?;
            append_children(rt, el, children)?;
            Ok(el)
        }
        Tag::Component(component) => {
            if rt.registry().resolve(&component).is_none() {
                return Err(JsxError::UnknownComponent(component.tag().to_owned()));
            }
            let el = rt.create_element(component.tag());
            apply_props(rt, el, props)?;
            append_children(rt, el, children)?;
            Ok(el)
        }
    }
}

fn validate_tag_name(name: &str) -> Result<(), JsxError> {
    let mut chars = name.chars();
    let valid = chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ':') || !c.is_ascii());
    if valid {
        Ok(())
    } else {
        Err(JsxError::InvalidTagName(name.to_owned()))
    }
}

/// `onClick` → `click`. Keys without an uppercase letter after `on` are not events.
pub fn event_name(key: &str) -> Option<String> {
    let rest = key.strip_prefix("on")?;
    if rest.chars().next()?.is_ascii_uppercase() {
        Some(rest.to_ascii_lowercase())
    } else {
        None
    }
}

fn attribute_name(key: &str) -> &str {
    match key {
        "className" => "class",
        "htmlFor" => "for",
        other => other,
    }
}

fn apply_props(rt: &mut Runtime, el: NodeId, props: Props) -> Result<(), JsxError> {
    for (key, value) in props {
        if let Some(event) = event_name(&key) {
            match value {
                PropValue::Handler(listener) => {
                    rt.add_listener(el, &event, listener)?;
                }
                PropValue::Value(v) if v.is_null() => {}
                _ => {
                    return Err(JsxError::InvalidProp {
                        prop: key,
                        reason: "event props take a handler",
                    })
                }
            }
            continue;
        }

        let value = match value {
            PropValue::Value(v) => v,
            PropValue::Handler(_) => {
                return Err(JsxError::InvalidProp {
                    prop: key,
                    reason: "handlers are only valid on on* props",
                })
            }
            PropValue::Children(_) => {
                return Err(JsxError::InvalidProp {
                    prop: key,
                    reason: "children are only valid under the children key",
                })
            }
        };

        if rt.has_field(el, &key) {
            rt.set_field(el, &key, value)?;
            continue;
        }
        if let Some(text) = value.to_attribute() {
            rt.set_attribute(el, attribute_name(&key), &text)?;
        }
    }
    Ok(())
}

/// Flatten `children` into DOM nodes, in order.
pub(crate) fn flatten_children(rt: &mut Runtime, child: Child, out: &mut Vec<NodeId>) {
    match child {
        Child::Node(id) => out.push(id),
        Child::Text(text) => out.push(rt.create_text(text)),
        Child::List(items) => {
            for item in items {
                flatten_children(rt, item, out);
            }
        }
        Child::Empty => {}
    }
}

fn append_children(rt: &mut Runtime, parent: NodeId, children: Vec<Child>) -> Result<(), JsxError> {
    let mut nodes = Vec::new();
    flatten_children(rt, Child::List(children), &mut nodes);
    for node in nodes {
        rt.append_child(parent, node)?;
    }
    Ok(())
}

fn into_node(rt: &mut Runtime, child: Child) -> Result<NodeId, JsxError> {
    match child {
        Child::Node(id) => Ok(id),
        other => {
            let fragment = rt.create_fragment();
            append_children(rt, fragment, vec![other])?;
            Ok(fragment)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{Component, ComponentDefinition, ComponentError, FieldSpec, FieldValue};
    use crate::event::Event;
    use crate::runtime::RenderContext;
    use crate::testing::snapshot::outer_html;
    use pretty_assertions::assert_eq;
    use std::cell::Cell;

    struct Badge;

    impl Component for Badge {
        fn render(&self, _cx: &mut RenderContext<'_>) -> Result<Child, ComponentError> {
            Ok(Child::Empty)
        }
    }

    #[test]
    fn builds_element_with_attributes_and_text() {
        let mut rt = Runtime::new();
        let el = h(
            &mut rt,
            "div",
            Props::new().set("className", "box").set("htmlFor", "x").set("id", "main"),
            vec!["hello ".into(), 3.into()],
        )
        .unwrap();
        assert_eq!(
            outer_html(rt.dom(), el),
            r#"<div class="box" for="x" id="main">hello 3</div>"#
        );
    }

    #[test]
    fn boolean_and_null_props() {
        let mut rt = Runtime::new();
        let el = h(
            &mut rt,
            "input",
            Props::new()
                .set("disabled", true)
                .set("checked", false)
                .set("value", ())
                .set("size", 4),
            vec![],
        )
        .unwrap();
        assert_eq!(rt.dom().get_attribute(el, "disabled"), Some(""));
        assert_eq!(rt.dom().get_attribute(el, "checked"), None);
        assert_eq!(rt.dom().get_attribute(el, "value"), None);
        assert_eq!(rt.dom().get_attribute(el, "size"), Some("4"));
    }

    #[test]
    fn children_are_flattened_and_merged() {
        let mut rt = Runtime::new();
        let em = h(&mut rt, "em", Props::new(), vec!["b".into()]).unwrap();
        let el = h(
            &mut rt,
            "p",
            Props::new().children(vec!["a".into()]),
            vec![
                Child::List(vec![em.into(), Child::Empty, vec!["c", "d"].into()]),
                true.into(),
                None::<&str>.into(),
            ],
        )
        .unwrap();
        assert_eq!(outer_html(rt.dom(), el), "<p>a<em>b</em>cd</p>");
    }

    #[test]
    fn fragment_groups_children() {
        let mut rt = Runtime::new();
        let frag = h(&mut rt, Tag::Fragment, Props::new(), vec!["x".into(), "y".into()]).unwrap();
        let div = h(&mut rt, "div", Props::new(), vec![frag.into()]).unwrap();
        assert_eq!(outer_html(rt.dom(), div), "<div>xy</div>");
    }

    #[test]
    fn on_props_register_listeners() {
        let mut rt = Runtime::new();
        let clicks = Rc::new(Cell::new(0));
        let seen = clicks.clone();
        let button = h(
            &mut rt,
            "button",
            Props::new().on("click", move |_, _| {
                seen.set(seen.get() + 1);
                Ok(())
            }),
            vec![],
        )
        .unwrap();
        assert_eq!(rt.dom().get(button).unwrap().listener_count(), 1);
        rt.dispatch_event(button, Event::new("click")).unwrap();
        assert_eq!(clicks.get(), 1);
    }

    #[test]
    fn handler_on_plain_key_is_invalid() {
        let mut rt = Runtime::new();
        let handler = Props::new().on("click", |_, _| Ok(())).remove("onClick").unwrap();
        let err = h(&mut rt, "div", Props::new().set("title", handler), vec![]).unwrap_err();
        assert!(matches!(err, JsxError::InvalidProp { ref prop, .. } if prop == "title"));
    }

    #[test]
    fn value_on_event_key_is_invalid() {
        let mut rt = Runtime::new();
        let err = h(&mut rt, "div", Props::new().set("onClick", "alert()"), vec![]).unwrap_err();
        assert!(matches!(err, JsxError::InvalidProp { .. }));
    }

    #[test]
    fn invalid_tag_name() {
        let mut rt = Runtime::new();
        for bad in ["", "1div", "a b", "<p>"] {
            assert!(matches!(
                h(&mut rt, bad, Props::new(), vec![]),
                Err(JsxError::InvalidTagName(_))
            ));
        }
    }

    #[test]
    fn component_props_set_fields_or_attributes() {
        let mut rt = Runtime::new();
        let badge = rt
            .define(
                ComponentDefinition::builder("x-badge")
                    .field(FieldSpec::new("count").default(0))
                    .build(|| Badge)
                    .unwrap(),
            )
            .unwrap();
        let el = h(
            &mut rt,
            &badge,
            Props::new().set("count", 5).set("title", "hi"),
            vec![],
        )
        .unwrap();
        assert_eq!(rt.field(el, "count").unwrap(), FieldValue::Int(5));
        assert_eq!(rt.dom().get_attribute(el, "count"), None);
        assert_eq!(rt.dom().get_attribute(el, "title"), Some("hi"));
    }

    #[test]
    fn foreign_component_ref_is_unknown() {
        let mut other = Runtime::new();
        let foreign = other
            .define(ComponentDefinition::builder("x-badge").build(|| Badge).unwrap())
            .unwrap();
        let mut rt = Runtime::new();
        let err = h(&mut rt, foreign, Props::new(), vec![]).unwrap_err();
        assert!(matches!(err, JsxError::UnknownComponent(tag) if tag == "x-badge"));
    }

    #[test]
    fn function_components_expand_inline() {
        let mut rt = Runtime::new();
        let greeting = Tag::function(|rt, props, children| {
            let name = props.value("name").cloned().unwrap_or_default();
            let mut content = vec![Child::from(format!("Hello, {name}"))];
            content.extend(children);
            Ok(h(rt, "h1", Props::new(), content)?.into())
        });
        let el = h(&mut rt, &greeting, Props::new().set("name", "Ada"), vec!["!".into()]).unwrap();
        assert_eq!(outer_html(rt.dom(), el), "<h1>Hello, Ada!</h1>");
    }

    #[test]
    fn function_component_returning_text_gets_fragment() {
        let mut rt = Runtime::new();
        let text = Tag::function(|_, _, _| Ok(Child::from("plain")));
        let frag = h(&mut rt, text, Props::new(), vec![]).unwrap();
        assert_eq!(rt.dom().text_content(frag), "plain");
    }

    #[test]
    fn event_names() {
        assert_eq!(event_name("onClick").as_deref(), Some("click"));
        assert_eq!(event_name("onMouseEnter").as_deref(), Some("mouseenter"));
        assert_eq!(event_name("online"), None);
        assert_eq!(event_name("on"), None);
        assert_eq!(event_name("title"), None);
    }
}
