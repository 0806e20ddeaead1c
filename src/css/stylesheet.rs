//! Compiled component stylesheets and the process-wide stylesheet cache.
//!
//! A [`CompiledStylesheet`] is immutable once built. Shadow-DOM components
//! share one compiled sheet per tag (adopted, or cloned into a `<style>`).
//! Light-DOM components get a copy whose selectors are rewritten to the host
//! tag, since there is no shadow boundary to scope them.

use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use crate::css::model::{AtRule, AtRuleBody, CssItem, RuleSet, Selector, SelectorPart, StyleSheet, Combinator};

/// Where a compiled sheet is going to be applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StyleScope {
    /// Inside a shadow root; selectors are used as written.
    Shadow,
    /// In the document; selectors are rewritten to the host tag.
    Light,
}

/// A stylesheet ready to be attached to a shadow root or the document.
#[derive(Debug)]
pub struct CompiledStylesheet {
    tag: String,
    scope: StyleScope,
    sheet: StyleSheet,
    text: String,
}

impl CompiledStylesheet {
    /// Compile `sheet` for component `tag` in the given scope.
    pub fn compile(tag: &str, sheet: &StyleSheet, scope: StyleScope) -> Self {
        let sheet = match scope {
            StyleScope::Shadow => sheet.clone(),
            StyleScope::Light => StyleSheet {
                items: sheet.items.iter().map(|item| scope_item(item, tag)).collect(),
            },
        };
        let text = sheet.to_string();
        Self {
            tag: tag.to_owned(),
            scope,
            sheet,
            text,
        }
    }

    /// The component tag this sheet belongs to.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// The scope this sheet was compiled for.
    pub fn scope(&self) -> StyleScope {
        self.scope
    }

    /// The compiled rules.
    pub fn sheet(&self) -> &StyleSheet {
        &self.sheet
    }

    /// Serialized CSS, used for `<style>` elements.
    pub fn css_text(&self) -> &str {
        &self.text
    }
}

fn scope_item(item: &CssItem, tag: &str) -> CssItem {
    match item {
        CssItem::Rule(rule) => CssItem::Rule(RuleSet {
            selectors: rule.selectors.iter().map(|s| scope_selector(s, tag)).collect(),
            declarations: rule.declarations.clone(),
        }),
        CssItem::AtRule(at) => CssItem::AtRule(AtRule {
            name: at.name.clone(),
            prelude: at.prelude.clone(),
            body: match &at.body {
                AtRuleBody::Rules(items) => {
                    AtRuleBody::Rules(items.iter().map(|i| scope_item(i, tag)).collect())
                }
                other => other.clone(),
            },
        }),
    }
}

/// Rewrite a selector so it only matches inside elements named `tag`.
///
/// - `:host` → `tag`
/// - `:host(.x)` → `tag.x`
/// - `:host-context(.dark)` → `.dark tag`
/// - `::slotted(li)` → `li`
/// - anything else → `tag <selector>`
pub fn scope_selector(selector: &Selector, tag: &str) -> Selector {
    let mut parts: Vec<SelectorPart> = selector
        .parts
        .iter()
        .map(|part| match part {
            SelectorPart::Compound(c) => SelectorPart::Compound(unwrap_slotted(c)),
            other => other.clone(),
        })
        .collect();

    let Some(SelectorPart::Compound(first)) = parts.first().cloned() else {
        return selector.clone();
    };

    if let Some((inner, rest)) = functional_pseudo(&first, ":host-context(") {
        parts[0] = SelectorPart::Compound(format!("{tag}{rest}"));
        parts.insert(0, SelectorPart::Combinator(Combinator::Descendant));
        parts.insert(0, SelectorPart::Compound(inner.to_owned()));
    } else if let Some((inner, rest)) = functional_pseudo(&first, ":host(") {
        parts[0] = SelectorPart::Compound(format!("{tag}{inner}{rest}"));
    } else if let Some(rest) = first.strip_prefix(":host").filter(|r| !starts_with_name_char(r)) {
        parts[0] = SelectorPart::Compound(format!("{tag}{rest}"));
    } else {
        parts.insert(0, SelectorPart::Combinator(Combinator::Descendant));
        parts.insert(0, SelectorPart::Compound(tag.to_owned()));
    }

    Selector { parts }
}

fn starts_with_name_char(s: &str) -> bool {
    s.chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '(')
}

/// Split `prefix(inner)rest` into `(inner, rest)`, honoring nested parens.
fn functional_pseudo<'a>(compound: &'a str, prefix: &str) -> Option<(&'a str, &'a str)> {
    let body = compound.strip_prefix(prefix)?;
    let mut depth = 1usize;
    for (i, c) in body.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some((&body[..i], &body[i + 1..]));
                }
            }
            _ => {}
        }
    }
    None
}

fn unwrap_slotted(compound: &str) -> String {
    match functional_pseudo(compound, "::slotted(") {
        Some((inner, rest)) => format!("{inner}{rest}"),
        None => compound.to_owned(),
    }
}

// ---------------------------------------------------------------------------
// StyleSheetCache
// ---------------------------------------------------------------------------

/// Process-wide mapping from component tag to its compiled stylesheet.
///
/// Entries are created lazily on first instantiation and shared read-only by
/// every instance of the tag. Sheets are never mutated in place.
#[derive(Debug, Default)]
pub struct StyleSheetCache {
    sheets: HashMap<(String, StyleScope), Rc<CompiledStylesheet>>,
    injected: HashSet<String>,
}

impl StyleSheetCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// The cached sheet for `(tag, scope)`, compiling it on first use.
    pub fn get_or_compile(&mut self, tag: &str, sheet: &StyleSheet, scope: StyleScope) -> Rc<CompiledStylesheet> {
        self.sheets
            .entry((tag.to_owned(), scope))
            .or_insert_with(|| {
                tracing::trace!(tag, ?scope, "compiling component stylesheet");
                Rc::new(CompiledStylesheet::compile(tag, sheet, scope))
            })
            .clone()
    }

    /// The cached sheet, if compiled.
    pub fn get(&self, tag: &str, scope: StyleScope) -> Option<Rc<CompiledStylesheet>> {
        self.sheets.get(&(tag.to_owned(), scope)).cloned()
    }

    /// Record that the document-level sheet for `tag` was injected.
    ///
    /// Returns `true` the first time only.
    pub fn mark_injected(&mut self, tag: &str) -> bool {
        self.injected.insert(tag.to_owned())
    }

    /// Number of compiled sheets.
    pub fn len(&self) -> usize {
        self.sheets.len()
    }

    /// Whether nothing has been compiled yet.
    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::css::parser::parse_css;

    fn scoped(css: &str, tag: &str) -> String {
        CompiledStylesheet::compile(tag, &parse_css(css).unwrap(), StyleScope::Light)
            .css_text()
            .to_owned()
    }

    #[test]
    fn shadow_scope_keeps_selectors() {
        let sheet = parse_css(":host { display: block; } p { margin: 0; }").unwrap();
        let compiled = CompiledStylesheet::compile("x-card", &sheet, StyleScope::Shadow);
        assert_eq!(compiled.css_text(), ":host { display: block; }\np { margin: 0; }");
        assert_eq!(compiled.tag(), "x-card");
        assert_eq!(compiled.scope(), StyleScope::Shadow);
    }

    #[test]
    fn host_becomes_tag() {
        assert_eq!(scoped(":host { display: block }", "x-card"), "x-card { display: block; }");
        assert_eq!(scoped(":host:hover { a: b }", "x-card"), "x-card:hover { a: b; }");
    }

    #[test]
    fn host_function_becomes_compound() {
        assert_eq!(scoped(":host(.open) p { a: b }", "x-card"), "x-card.open p { a: b; }");
        assert_eq!(scoped(":host([size=\"2\"]) { a: b }", "x-card"), "x-card[size=\"2\"] { a: b; }");
    }

    #[test]
    fn host_context_becomes_ancestor() {
        assert_eq!(scoped(":host-context(.dark) { a: b }", "x-card"), ".dark x-card { a: b; }");
    }

    #[test]
    fn plain_selector_gets_descendant_prefix() {
        assert_eq!(scoped("p > em, li { a: b }", "x-card"), "x-card p > em, x-card li { a: b; }");
    }

    #[test]
    fn host_prefix_of_other_name_is_not_host() {
        assert_eq!(scoped(":hostile { a: b }", "x-card"), "x-card :hostile { a: b; }");
    }

    #[test]
    fn slotted_is_unwrapped() {
        assert_eq!(scoped("::slotted(li) { a: b }", "x-list"), "x-list li { a: b; }");
    }

    #[test]
    fn media_rules_are_scoped() {
        assert_eq!(
            scoped("@media (min-width: 1px) { p { a: b } }", "x-card"),
            "@media (min-width: 1px) { x-card p { a: b; } }"
        );
    }

    #[test]
    fn keyframes_untouched() {
        assert_eq!(
            scoped("@keyframes spin { from { a: b } }", "x-card"),
            "@keyframes spin { from { a: b } }"
        );
    }

    #[test]
    fn cache_compiles_once_per_tag_and_scope() {
        let sheet = parse_css("p { a: b }").unwrap();
        let mut cache = StyleSheetCache::new();
        assert!(cache.is_empty());

        let a = cache.get_or_compile("x-card", &sheet, StyleScope::Shadow);
        let b = cache.get_or_compile("x-card", &sheet, StyleScope::Shadow);
        assert!(Rc::ptr_eq(&a, &b));

        let light = cache.get_or_compile("x-card", &sheet, StyleScope::Light);
        assert!(!Rc::ptr_eq(&a, &light));
        assert_eq!(cache.len(), 2);
        assert!(cache.get("x-card", StyleScope::Light).is_some());
        assert!(cache.get("x-other", StyleScope::Light).is_none());
    }

    #[test]
    fn mark_injected_only_once() {
        let mut cache = StyleSheetCache::new();
        assert!(cache.mark_injected("x-card"));
        assert!(!cache.mark_injected("x-card"));
        assert!(cache.mark_injected("x-list"));
    }
}
