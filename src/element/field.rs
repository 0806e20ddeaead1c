//! Reactive field declarations and values.
//!
//! A [`FieldSpec`] is the contract for one reactive field: its name, default
//! value and optional attribute binding. [`FieldValue`] is the dynamically
//! typed value stored per instance and compared on every write.

use std::fmt;

/// A reactive field value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FieldValue {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl FieldValue {
    /// The attribute text this value reflects to, `None` meaning "absent".
    ///
    /// `Null` and `false` remove the attribute, `true` sets it empty.
    pub fn to_attribute(&self) -> Option<String> {
        match self {
            FieldValue::Null | FieldValue::Bool(false) => None,
            FieldValue::Bool(true) => Some(String::new()),
            other => Some(other.to_string()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Integer view. Text is parsed, floats with no fraction are accepted.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Int(n) => Some(*n),
            FieldValue::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            FieldValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Float view. Integers widen, text is parsed.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Int(n) => Some(*n as f64),
            FieldValue::Float(f) => Some(*f),
            FieldValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => Ok(()),
            FieldValue::Bool(b) => write!(f, "{b}"),
            FieldValue::Int(n) => write!(f, "{n}"),
            FieldValue::Float(x) => write!(f, "{x}"),
            FieldValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_owned())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

impl From<i32> for FieldValue {
    fn from(n: i32) -> Self {
        FieldValue::Int(n.into())
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        FieldValue::Int(n)
    }
}

impl From<u32> for FieldValue {
    fn from(n: u32) -> Self {
        FieldValue::Int(n.into())
    }
}

impl From<f64> for FieldValue {
    fn from(x: f64) -> Self {
        FieldValue::Float(x)
    }
}

impl From<()> for FieldValue {
    fn from(_: ()) -> Self {
        FieldValue::Null
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(FieldValue::Null, Into::into)
    }
}

/// Convert a camelCase or snake_case field name to its kebab-case attribute.
///
/// `maxItems` → `max-items`, `max_items` → `max-items`.
pub fn kebab_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for (i, c) in name.chars().enumerate() {
        if c.is_ascii_uppercase() {
            if i > 0 && !out.ends_with('-') {
                out.push('-');
            }
            out.push(c.to_ascii_lowercase());
        } else if c == '_' {
            out.push('-');
        } else {
            out.push(c);
        }
    }
    out
}

/// Declaration of one reactive field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    name: String,
    default: FieldValue,
    attribute: Option<String>,
    reflect: bool,
}

impl FieldSpec {
    /// A field with a `Null` default and no attribute binding.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            default: FieldValue::Null,
            attribute: None,
            reflect: false,
        }
    }

    /// Set the initial value (builder).
    pub fn default(mut self, value: impl Into<FieldValue>) -> Self {
        self.default = value.into();
        self
    }

    /// Observe and reflect the kebab-case attribute of this field (builder).
    pub fn attribute(mut self) -> Self {
        self.attribute = Some(kebab_case(&self.name));
        self.reflect = true;
        self
    }

    /// Observe and reflect an explicitly named attribute (builder).
    pub fn attribute_named(mut self, attribute: impl Into<String>) -> Self {
        self.attribute = Some(attribute.into().to_ascii_lowercase());
        self.reflect = true;
        self
    }

    /// Whether field writes are mirrored to the attribute (builder).
    ///
    /// With `false` the attribute is still observed.
    pub fn reflect(mut self, reflect: bool) -> Self {
        self.reflect = reflect;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn default_value(&self) -> &FieldValue {
        &self.default
    }

    /// The observed attribute name, if any.
    pub fn attribute_name(&self) -> Option<&str> {
        self.attribute.as_deref()
    }

    /// Whether writes are reflected to the attribute.
    pub fn reflects(&self) -> bool {
        self.reflect && self.attribute.is_some()
    }

    /// Convert an attribute value into this field's value.
    ///
    /// Boolean fields use presence semantics. Every other field takes the
    /// attribute text as-is, or `Null` when the attribute is removed.
    pub fn from_attribute(&self, value: Option<&str>) -> FieldValue {
        match self.default {
            FieldValue::Bool(_) => FieldValue::Bool(value.is_some()),
            _ => value.map_or(FieldValue::Null, FieldValue::from),
        }
    }

    /// Whether `current` already reads as the attribute `value`.
    ///
    /// Compares the attribute form of `current` with `value`, by presence for
    /// boolean fields.
    pub fn matches_attribute(&self, current: &FieldValue, value: Option<&str>) -> bool {
        let reflected = current.to_attribute();
        match self.default {
            FieldValue::Bool(_) => reflected.is_some() == value.is_some(),
            _ => reflected.as_deref() == value,
        }
    }
}
