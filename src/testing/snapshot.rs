//! HTML serialization for snapshot testing.
//!
//! Attributes are written in insertion order. Shadow roots are serialized as
//! declarative `<template shadowrootmode="...">` children of their host, so a
//! snapshot shows both the shadow tree and the light children.

use crate::dom::{Dom, NodeId, NodeKind};

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Serialize `node` and its subtree.
///
/// # Examples
///
/// ```ignore
/// use petal::runtime::Runtime;
/// use petal::testing::snapshot::outer_html;
///
/// let mut rt = Runtime::new();
/// let div = rt.create_element("div");
/// rt.set_attribute(div, "id", "main").unwrap();
/// assert_eq!(outer_html(rt.dom(), div), r#"<div id="main"></div>"#);
/// ```
pub fn outer_html(dom: &Dom, node: NodeId) -> String {
    let mut out = String::new();
    write_node(dom, node, &mut out);
    out
}

/// Serialize the children of `node`, including a host's shadow root.
pub fn inner_html(dom: &Dom, node: NodeId) -> String {
    let mut out = String::new();
    write_children(dom, node, &mut out);
    out
}

// ---------------------------------------------------------------------------
// Internals
// ---------------------------------------------------------------------------

fn write_node(dom: &Dom, node: NodeId, out: &mut String) {
    let Some(data) = dom.get(node) else {
        return;
    };
    match &data.kind {
        NodeKind::Element(el) => {
            out.push('<');
            out.push_str(&el.tag);
            for (name, value) in el.attributes() {
                out.push(' ');
                out.push_str(name);
                out.push_str("=\"");
                escape_into(value, true, out);
                out.push('"');
            }
            out.push('>');
            write_children(dom, node, out);
            out.push_str("</");
            out.push_str(&el.tag);
            out.push('>');
        }
        NodeKind::Text(text) => {
            let raw = dom
                .parent(node)
                .and_then(|p| dom.tag_name(p))
                .is_some_and(|tag| matches!(tag, "style" | "script"));
            if raw {
                out.push_str(text);
            } else {
                escape_into(text, false, out);
            }
        }
        NodeKind::Comment(text) => {
            out.push_str("<!--");
            out.push_str(text);
            out.push_str("-->");
        }
        NodeKind::ShadowRoot(root) => {
            out.push_str("<template shadowrootmode=\"");
            out.push_str(root.mode.as_str());
            out.push_str("\">");
            write_children(dom, node, out);
            out.push_str("</template>");
        }
        NodeKind::Document | NodeKind::Fragment | NodeKind::Window => write_children(dom, node, out),
    }
}

fn write_children(dom: &Dom, node: NodeId, out: &mut String) {
    if let Some(root) = dom.shadow_root(node) {
        write_node(dom, root, out);
    }
    for &child in dom.children(node) {
        write_node(dom, child, out);
    }
}

fn escape_into(text: &str, attribute: bool, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' if !attribute => out.push_str("&lt;"),
            '>' if !attribute => out.push_str("&gt;"),
            '"' if attribute => out.push_str("&quot;"),
            c => out.push(c),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::ShadowRootMode;

    #[test]
    fn elements_attributes_and_text() {
        let mut dom = Dom::new();
        let div = dom.create_element("div");
        dom.set_attribute(div, "class", "box").unwrap();
        dom.set_attribute(div, "title", "a \"b\" & c").unwrap();
        let text = dom.create_text("1 < 2 & 3");
        dom.append_child(div, text).unwrap();
        assert_eq!(
            outer_html(&dom, div),
            r#"<div class="box" title="a &quot;b&quot; &amp; c">1 &lt; 2 &amp; 3</div>"#
        );
        assert_eq!(inner_html(&dom, div), "1 &lt; 2 &amp; 3");
    }

    #[test]
    fn style_text_is_raw() {
        let mut dom = Dom::new();
        let style = dom.create_element("style");
        let css = dom.create_text("a > b { color: red }");
        dom.append_child(style, css).unwrap();
        assert_eq!(outer_html(&dom, style), "<style>a > b { color: red }</style>");
    }

    #[test]
    fn shadow_root_as_template() {
        let mut dom = Dom::new();
        let host = dom.create_element("x-card");
        let root = dom.attach_shadow(host, ShadowRootMode::Open).unwrap();
        let p = dom.create_element("p");
        dom.append_child(root, p).unwrap();
        let slot_text = dom.create_text("light");
        dom.append_child(host, slot_text).unwrap();
        let comment = dom.create_comment("c");
        dom.append_child(host, comment).unwrap();
        assert_eq!(
            outer_html(&dom, host),
            r#"<x-card><template shadowrootmode="open"><p></p></template>light<!--c--></x-card>"#
        );
        assert_eq!(inner_html(&dom, root), "<p></p>");
    }

    #[test]
    fn document_serializes_children() {
        let dom = Dom::new();
        assert_eq!(
            outer_html(&dom, dom.document()),
            "<html><head></head><body></body></html>"
        );
    }
}
