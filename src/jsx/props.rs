//! Props and children accepted by the JSX factory.

use std::fmt;
use std::rc::Rc;

use crate::dom::NodeId;
use crate::element::field::FieldValue;
use crate::element::traits::ComponentError;
use crate::event::{Event, Listener};
use crate::runtime::Runtime;

// ---------------------------------------------------------------------------
// PropValue
// ---------------------------------------------------------------------------

/// The value of one prop.
#[derive(Clone)]
pub enum PropValue {
    /// A plain value: attribute text or a field value.
    Value(FieldValue),
    /// An event handler, valid under `on*` keys.
    Handler(Listener),
    /// Children passed through the `children` key.
    Children(Vec<Child>),
}

impl fmt::Debug for PropValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropValue::Value(v) => f.debug_tuple("Value").field(v).finish(),
            PropValue::Handler(_) => f.write_str("Handler(..)"),
            PropValue::Children(c) => f.debug_tuple("Children").field(c).finish(),
        }
    }
}

macro_rules! prop_value_from {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for PropValue {
                fn from(v: $ty) -> Self {
                    PropValue::Value(FieldValue::from(v))
                }
            }
        )*
    };
}

prop_value_from!(&str, String, bool, i32, i64, u32, f64, ());

impl From<FieldValue> for PropValue {
    fn from(v: FieldValue) -> Self {
        PropValue::Value(v)
    }
}

impl From<&FieldValue> for PropValue {
    fn from(v: &FieldValue) -> Self {
        PropValue::Value(v.clone())
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for PropValue {
    fn from(v: Option<T>) -> Self {
        PropValue::Value(FieldValue::from(v))
    }
}

impl From<Listener> for PropValue {
    fn from(l: Listener) -> Self {
        PropValue::Handler(l)
    }
}

impl From<Vec<Child>> for PropValue {
    fn from(children: Vec<Child>) -> Self {
        PropValue::Children(children)
    }
}

// ---------------------------------------------------------------------------
// Props
// ---------------------------------------------------------------------------

/// Ordered prop map. Setting an existing key replaces it in place.
#[derive(Debug, Clone, Default)]
pub struct Props {
    entries: Vec<(String, PropValue)>,
}

impl Props {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a prop (builder).
    pub fn set(mut self, key: impl Into<String>, value: impl Into<PropValue>) -> Self {
        self.insert(key, value);
        self
    }

    /// Attach an event handler under `on` + the capitalized event name (builder).
    ///
    /// `on("click", ..)` sets `onClick`.
    pub fn on<F>(self, event: &str, handler: F) -> Self
    where
        F: Fn(&mut Runtime, &Event) -> Result<(), ComponentError> + 'static,
    {
        let mut chars = event.chars();
        let key = match chars.next() {
            Some(first) => format!("on{}{}", first.to_ascii_uppercase(), chars.as_str()),
            None => "on".to_owned(),
        };
        let listener: Listener = Rc::new(handler);
        self.set(key, listener)
    }

    /// Set the `children` prop (builder).
    pub fn children(self, children: Vec<Child>) -> Self {
        self.set("children", children)
    }

    /// Set a prop in place.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<PropValue>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, v)) => *v = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&PropValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Plain value of a prop, if present and not a handler or children.
    pub fn value(&self, key: &str) -> Option<&FieldValue> {
        match self.get(key)? {
            PropValue::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<PropValue> {
        let idx = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(idx).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl IntoIterator for Props {
    type Item = (String, PropValue);
    type IntoIter = std::vec::IntoIter<(String, PropValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

// ---------------------------------------------------------------------------
// Child
// ---------------------------------------------------------------------------

/// A child passed to the factory, or returned from a render.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Child {
    /// An existing node, moved into place.
    Node(NodeId),
    /// Text, becomes a text node.
    Text(String),
    /// Nested children, flattened.
    List(Vec<Child>),
    /// Renders nothing: null and booleans.
    #[default]
    Empty,
}

impl Child {
    /// Whether this child renders nothing at all.
    pub fn is_empty(&self) -> bool {
        match self {
            Child::Empty => true,
            Child::List(items) => items.iter().all(Child::is_empty),
            _ => false,
        }
    }
}

impl From<NodeId> for Child {
    fn from(id: NodeId) -> Self {
        Child::Node(id)
    }
}

impl From<&str> for Child {
    fn from(s: &str) -> Self {
        Child::Text(s.to_owned())
    }
}

impl From<String> for Child {
    fn from(s: String) -> Self {
        Child::Text(s)
    }
}

impl From<&String> for Child {
    fn from(s: &String) -> Self {
        Child::Text(s.clone())
    }
}

impl From<bool> for Child {
    fn from(_: bool) -> Self {
        Child::Empty
    }
}

impl From<()> for Child {
    fn from(_: ()) -> Self {
        Child::Empty
    }
}

macro_rules! child_from_number {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Child {
                fn from(n: $ty) -> Self {
                    Child::Text(n.to_string())
                }
            }
        )*
    };
}

child_from_number!(i32, i64, u32, u64, usize, f64);

impl From<FieldValue> for Child {
    fn from(v: FieldValue) -> Self {
        match v {
            FieldValue::Null | FieldValue::Bool(_) => Child::Empty,
            FieldValue::Text(s) => Child::Text(s),
            other => Child::Text(other.to_string()),
        }
    }
}

impl From<&FieldValue> for Child {
    fn from(v: &FieldValue) -> Self {
        Child::from(v.clone())
    }
}

impl<T: Into<Child>> From<Option<T>> for Child {
    fn from(v: Option<T>) -> Self {
        v.map_or(Child::Empty, Into::into)
    }
}

impl<T: Into<Child>> From<Vec<T>> for Child {
    fn from(items: Vec<T>) -> Self {
        Child::List(items.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_replaces_in_place() {
        let props = Props::new().set("a", 1).set("b", "x").set("a", 2);
        assert_eq!(props.len(), 2);
        let keys: Vec<&str> = props.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(props.value("a"), Some(&FieldValue::Int(2)));
    }

    #[test]
    fn on_capitalizes_event_name() {
        let props = Props::new().on("click", |_, _| Ok(()));
        assert!(matches!(props.get("onClick"), Some(PropValue::Handler(_))));
        assert!(props.value("onClick").is_none());
    }

    #[test]
    fn children_prop() {
        let mut props = Props::new().children(vec![Child::from("a")]);
        assert!(matches!(props.remove("children"), Some(PropValue::Children(c)) if c.len() == 1));
        assert!(props.is_empty());
    }

    #[test]
    fn child_conversions() {
        assert_eq!(Child::from(3), Child::Text("3".into()));
        assert_eq!(Child::from(1.5), Child::Text("1.5".into()));
        assert_eq!(Child::from(true), Child::Empty);
        assert_eq!(Child::from(None::<&str>), Child::Empty);
        assert_eq!(Child::from(FieldValue::Null), Child::Empty);
        assert_eq!(Child::from(FieldValue::Int(7)), Child::Text("7".into()));
        assert_eq!(
            Child::from(vec!["a", "b"]),
            Child::List(vec![Child::Text("a".into()), Child::Text("b".into())])
        );
    }

    #[test]
    fn child_emptiness() {
        assert!(Child::Empty.is_empty());
        assert!(Child::List(vec![Child::Empty, Child::List(vec![])]).is_empty());
        assert!(!Child::from("x").is_empty());
    }
}
