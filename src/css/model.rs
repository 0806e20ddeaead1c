//! CSS AST: StyleSheet, CssItem, RuleSet, Selector, Declaration, AtRule.
//!
//! Selector compounds, declaration values and raw at-rule bodies are kept as
//! normalized source text. The runtime never evaluates styles, it only moves
//! them into shadow roots or rewrites selectors for light-DOM scoping.

use std::fmt;

/// A combinator between compound selectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    /// Descendant combinator (whitespace): `A B`.
    Descendant,
    /// Child combinator: `A > B`.
    Child,
    /// Next-sibling combinator: `A + B`.
    NextSibling,
    /// Subsequent-sibling combinator: `A ~ B`.
    SubsequentSibling,
}

impl Combinator {
    fn as_str(self) -> &'static str {
        match self {
            Combinator::Descendant => " ",
            Combinator::Child => " > ",
            Combinator::NextSibling => " + ",
            Combinator::SubsequentSibling => " ~ ",
        }
    }
}

/// One element in a selector chain: either a compound selector or a combinator.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectorPart {
    /// A compound selector such as `li.item:hover`, as source text.
    Compound(String),
    /// A combinator between compound selectors.
    Combinator(Combinator),
}

/// A full CSS selector: chain of compound selectors joined by combinators.
///
/// `ul > li.active` has parts
/// `[Compound("ul"), Combinator(Child), Compound("li.active")]`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Selector {
    /// Alternating compound selectors and combinators.
    /// Always starts and ends with a `SelectorPart::Compound`.
    pub parts: Vec<SelectorPart>,
}

impl Selector {
    /// Create an empty selector.
    pub fn new() -> Self {
        Self { parts: Vec::new() }
    }

    /// The leftmost compound, if any.
    pub fn first_compound(&self) -> Option<&str> {
        match self.parts.first() {
            Some(SelectorPart::Compound(c)) => Some(c),
            _ => None,
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for part in &self.parts {
            match part {
                SelectorPart::Compound(c) => f.write_str(c)?,
                SelectorPart::Combinator(c) => f.write_str(c.as_str())?,
            }
        }
        Ok(())
    }
}

/// A single CSS property declaration, e.g. `color: red`.
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    /// The property name, e.g. `"color"`, `"--accent"`.
    pub property: String,
    /// The value as normalized source text.
    pub value: String,
    /// Whether `!important` was specified.
    pub important: bool,
}

impl Declaration {
    /// Create a new declaration.
    pub fn new(property: impl Into<String>, value: impl Into<String>, important: bool) -> Self {
        Self {
            property: property.into(),
            value: value.into(),
            important,
        }
    }
}

impl fmt::Display for Declaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.property, self.value)?;
        if self.important {
            f.write_str(" !important")?;
        }
        f.write_str(";")
    }
}

/// A CSS rule: one or more selectors paired with declarations.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleSet {
    /// The selectors for this rule (comma-separated in CSS).
    pub selectors: Vec<Selector>,
    /// The property declarations inside the `{ ... }` block.
    pub declarations: Vec<Declaration>,
}

impl fmt::Display for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, sel) in self.selectors.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{sel}")?;
        }
        f.write_str(" {")?;
        for decl in &self.declarations {
            write!(f, " {decl}")?;
        }
        f.write_str(" }")
    }
}

/// Body of an at-rule.
#[derive(Debug, Clone, PartialEq)]
pub enum AtRuleBody {
    /// Statement at-rule ending in `;`, e.g. `@import url(x.css);`.
    Statement,
    /// Conditional group whose body holds nested rules (`@media`, `@supports`).
    Rules(Vec<CssItem>),
    /// Any other block (`@font-face`, `@keyframes`), kept as source text.
    Raw(String),
}

/// An at-rule such as `@media (min-width: 600px) { ... }`.
#[derive(Debug, Clone, PartialEq)]
pub struct AtRule {
    /// Name without the `@`.
    pub name: String,
    /// Text between the name and the block.
    pub prelude: String,
    pub body: AtRuleBody,
}

impl fmt::Display for AtRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.name)?;
        if !self.prelude.is_empty() {
            write!(f, " {}", self.prelude)?;
        }
        match &self.body {
            AtRuleBody::Statement => f.write_str(";"),
            AtRuleBody::Raw(text) => write!(f, " {{ {text} }}"),
            AtRuleBody::Rules(items) => {
                f.write_str(" {")?;
                for item in items {
                    write!(f, " {item}")?;
                }
                f.write_str(" }")
            }
        }
    }
}

/// A top-level or nested stylesheet entry.
#[derive(Debug, Clone, PartialEq)]
pub enum CssItem {
    Rule(RuleSet),
    AtRule(AtRule),
}

impl fmt::Display for CssItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CssItem::Rule(rule) => write!(f, "{rule}"),
            CssItem::AtRule(at) => write!(f, "{at}"),
        }
    }
}

/// A parsed stylesheet.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StyleSheet {
    pub items: Vec<CssItem>,
}

impl StyleSheet {
    /// Create an empty stylesheet.
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Whether the stylesheet has no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl fmt::Display for StyleSheet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, item) in self.items.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{item}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compound(s: &str) -> SelectorPart {
        SelectorPart::Compound(s.to_owned())
    }

    #[test]
    fn selector_display() {
        let sel = Selector {
            parts: vec![
                compound("ul"),
                SelectorPart::Combinator(Combinator::Child),
                compound("li.active"),
                SelectorPart::Combinator(Combinator::Descendant),
                compound("a"),
            ],
        };
        assert_eq!(sel.to_string(), "ul > li.active a");
        assert_eq!(sel.first_compound(), Some("ul"));
    }

    #[test]
    fn rule_display() {
        let rule = RuleSet {
            selectors: vec![
                Selector { parts: vec![compound("a")] },
                Selector { parts: vec![compound("b")] },
            ],
            declarations: vec![
                Declaration::new("color", "red", false),
                Declaration::new("margin", "0 auto", true),
            ],
        };
        assert_eq!(rule.to_string(), "a, b { color: red; margin: 0 auto !important; }");
    }

    #[test]
    fn at_rule_display() {
        let statement = AtRule {
            name: "import".into(),
            prelude: "url(x.css)".into(),
            body: AtRuleBody::Statement,
        };
        assert_eq!(statement.to_string(), "@import url(x.css);");

        let raw = AtRule {
            name: "font-face".into(),
            prelude: String::new(),
            body: AtRuleBody::Raw("font-family: x;".into()),
        };
        assert_eq!(raw.to_string(), "@font-face { font-family: x; }");
    }

    #[test]
    fn empty_stylesheet() {
        let sheet = StyleSheet::default();
        assert!(sheet.is_empty());
        assert_eq!(sheet.to_string(), "");
    }
}
