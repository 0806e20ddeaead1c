//! jsx! macro: parse JSX-like markup and generate petal factory calls.

use proc_macro2::{Span, TokenStream};
use quote::{format_ident, quote, quote_spanned};
use syn::ext::IdentExt;
use syn::parse::{Parse, ParseStream};
use syn::{braced, token, Error, Expr, Ident, Lit, LitStr, Path, Result, Token};

// ---------------------------------------------------------------------------
// AST types
// ---------------------------------------------------------------------------

/// Element tag: an HTML or custom element name, a component value, or `<>`.
#[derive(Clone)]
pub(crate) enum TagName {
    /// `div`, `x-card`: passed to the factory as a string.
    Named(String, Span),
    /// `Greeting`, `routes::Home`: a `Tag` or `ComponentRef` value in scope.
    Value(Path),
    Fragment,
}

impl TagName {
    fn label(&self) -> String {
        match self {
            TagName::Named(name, _) => name.clone(),
            TagName::Value(path) => quote!(#path).to_string().replace(' ', ""),
            TagName::Fragment => String::new(),
        }
    }
}

impl std::fmt::Debug for TagName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TagName::Named(name, _) => write!(f, "Named({name})"),
            TagName::Value(_) => write!(f, "Value({})", self.label()),
            TagName::Fragment => write!(f, "Fragment"),
        }
    }
}

/// Attribute value: `"lit"`, `{expr}`, or nothing (`<input disabled />`).
#[derive(Clone)]
pub(crate) enum AttrValue {
    Lit(Lit),
    Expr(Expr),
    Implicit,
}

/// A parsed attribute: `name`, `name="value"` or `name={expr}`.
#[derive(Clone)]
pub(crate) struct Attribute {
    pub name: String,
    pub span: Span,
    pub value: AttrValue,
}

impl std::fmt::Debug for Attribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self.value {
            AttrValue::Lit(_) => "lit",
            AttrValue::Expr(_) => "expr",
            AttrValue::Implicit => "implicit",
        };
        f.debug_struct("Attribute")
            .field("name", &self.name)
            .field("value", &kind)
            .finish()
    }
}

/// One child of an element.
#[derive(Clone)]
pub(crate) enum Node {
    Element(Element),
    Text(LitStr),
    Expr(Expr),
}

impl std::fmt::Debug for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Node::Element(el) => el.fmt(f),
            Node::Text(lit) => write!(f, "Text({:?})", lit.value()),
            Node::Expr(_) => write!(f, "Expr"),
        }
    }
}

/// A parsed element: `<tag attrs... />` or `<tag attrs...> children </tag>`.
#[derive(Clone)]
pub(crate) struct Element {
    pub tag: TagName,
    pub attrs: Vec<Attribute>,
    pub children: Vec<Node>,
    pub self_closing: bool,
}

impl std::fmt::Debug for Element {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Element")
            .field("tag", &self.tag)
            .field("attrs", &self.attrs)
            .field("children", &self.children)
            .field("self_closing", &self.self_closing)
            .finish()
    }
}

/// The jsx! input: a context expression, a comma, one root element.
pub(crate) struct JsxInput {
    pub cx: Expr,
    pub root: Element,
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

impl Parse for JsxInput {
    fn parse(input: ParseStream) -> Result<Self> {
        let cx: Expr = input.parse()?;
        input.parse::<Token![,]>()?;
        if !input.peek(Token![<]) {
            return Err(input.error("expected a root element after the context"));
        }
        let root = parse_element(input)?;
        if !input.is_empty() {
            return Err(input.error("jsx! takes exactly one root element; wrap siblings in <>...</>"));
        }
        Ok(JsxInput { cx, root })
    }
}

/// Parse `a`, `a-b`, `data-user-id`. Keywords are allowed (`type`, `for`).
fn parse_dashed_name(input: ParseStream) -> Result<(String, Span)> {
    let first = Ident::parse_any(input)?;
    let span = first.span();
    let mut name = first.to_string();
    while input.peek(Token![-]) {
        input.parse::<Token![-]>()?;
        let part = Ident::parse_any(input)?;
        name.push('-');
        name.push_str(&part.to_string());
    }
    Ok((name, span))
}

fn parse_tag_name(input: ParseStream) -> Result<TagName> {
    if input.peek(Token![>]) {
        return Ok(TagName::Fragment);
    }
    let fork = input.fork();
    let first = Ident::parse_any(&fork)?;
    let is_value = first.to_string().starts_with(|c: char| c.is_ascii_uppercase())
        || fork.peek(Token![::]);
    if is_value {
        Ok(TagName::Value(Path::parse_mod_style(input)?))
    } else {
        let (name, span) = parse_dashed_name(input)?;
        Ok(TagName::Named(name, span))
    }
}

fn parse_attribute(input: ParseStream) -> Result<Attribute> {
    let (name, span) = parse_dashed_name(input)?;
    let value = if input.peek(Token![=]) {
        input.parse::<Token![=]>()?;
        if input.peek(token::Brace) {
            let content;
            braced!(content in input);
            AttrValue::Expr(content.parse()?)
        } else {
            AttrValue::Lit(input.parse()?)
        }
    } else {
        AttrValue::Implicit
    };
    Ok(Attribute { name, span, value })
}

/// Parse a single element from the token stream.
pub(crate) fn parse_element(input: ParseStream) -> Result<Element> {
    input.parse::<Token![<]>()?;
    let tag = parse_tag_name(input)?;

    let mut attrs = Vec::new();
    loop {
        if input.peek(Token![/]) {
            input.parse::<Token![/]>()?;
            input.parse::<Token![>]>()?;
            if matches!(tag, TagName::Fragment) {
                return Err(input.error("a fragment cannot be self-closing"));
            }
            return Ok(Element {
                tag,
                attrs,
                children: Vec::new(),
                self_closing: true,
            });
        }
        if input.peek(Token![>]) {
            input.parse::<Token![>]>()?;
            break;
        }
        if matches!(tag, TagName::Fragment) {
            return Err(input.error("a fragment takes no attributes"));
        }
        attrs.push(parse_attribute(input)?);
    }

    let mut children = Vec::new();
    loop {
        if input.peek(Token![<]) && input.peek2(Token![/]) {
            input.parse::<Token![<]>()?;
            input.parse::<Token![/]>()?;
            let closing = parse_tag_name(input)?;
            if closing.label() != tag.label() || matches!(closing, TagName::Fragment) != matches!(tag, TagName::Fragment) {
                return Err(Error::new(
                    input.span(),
                    format!(
                        "mismatched closing tag: expected `</{}>`, found `</{}>`",
                        tag.label(),
                        closing.label()
                    ),
                ));
            }
            input.parse::<Token![>]>()?;
            break;
        }

        if input.is_empty() {
            return Err(Error::new(
                Span::call_site(),
                format!("unclosed element `<{}>`", tag.label()),
            ));
        }

        if input.peek(Token![<]) {
            children.push(Node::Element(parse_element(input)?));
        } else if input.peek(LitStr) {
            children.push(Node::Text(input.parse()?));
        } else if input.peek(token::Brace) {
            let content;
            braced!(content in input);
            children.push(Node::Expr(content.parse()?));
        } else if input.peek(Lit) {
            let lit: Lit = input.parse()?;
            children.push(Node::Expr(Expr::Lit(syn::ExprLit { attrs: Vec::new(), lit })));
        } else {
            return Err(input.error("expected a child element, a string literal or a `{expression}`"));
        }
    }

    Ok(Element {
        tag,
        attrs,
        children,
        self_closing: false,
    })
}

// ---------------------------------------------------------------------------
// Code generation
// ---------------------------------------------------------------------------

/// Collects hoisted `let` statements.
///
/// Every prop map and child is bound before the factory call that uses it, so
/// no call borrows the context while another borrow is still live.
struct Codegen<'a> {
    cx: &'a Expr,
    stmts: Vec<TokenStream>,
    next: usize,
}

impl<'a> Codegen<'a> {
    fn new(cx: &'a Expr) -> Self {
        Self {
            cx,
            stmts: Vec::new(),
            next: 0,
        }
    }

    fn fresh(&mut self, kind: &str) -> Ident {
        let id = format_ident!("__petal_{}{}", kind, self.next);
        self.next += 1;
        id
    }

    fn tag(tag: &TagName) -> TokenStream {
        match tag {
            TagName::Named(name, span) => {
                let lit = LitStr::new(name, *span);
                quote! { #lit }
            }
            TagName::Value(path) => quote! { &#path },
            TagName::Fragment => quote! { ::petal::jsx::Tag::Fragment },
        }
    }

    fn props(&mut self, attrs: &[Attribute]) -> Ident {
        let props = self.fresh("p");
        if attrs.is_empty() {
            self.stmts.push(quote! { let #props = ::petal::jsx::Props::new(); });
            return props;
        }
        self.stmts.push(quote! { let mut #props = ::petal::jsx::Props::new(); });
        for attr in attrs {
            let span = attr.span;
            let value = match &attr.value {
                AttrValue::Lit(lit) => quote! { #lit },
                AttrValue::Expr(expr) => quote! { #expr },
                AttrValue::Implicit => quote_spanned! {span=> true },
            };
            let stmt = match handler_event(&attr.name) {
                Some(event) => quote_spanned! {span=> #props = #props.on(#event, #value); },
                None => {
                    let name = &attr.name;
                    quote_spanned! {span=> #props.insert(#name, #value); }
                }
            };
            self.stmts.push(stmt);
        }
        props
    }

    /// Hoist one child into a `Child` binding.
    fn child(&mut self, node: &Node) -> Ident {
        let value = match node {
            Node::Element(el) => {
                let call = self.element(el);
                quote! { #call? }
            }
            Node::Text(lit) => quote! { #lit },
            Node::Expr(expr) => quote! { #expr },
        };
        let id = self.fresh("c");
        self.stmts
            .push(quote! { let #id = ::petal::jsx::Child::from(#value); });
        id
    }

    /// The factory call for `el`, with its props and children hoisted.
    fn element(&mut self, el: &Element) -> TokenStream {
        let tag = Self::tag(&el.tag);
        let props = self.props(&el.attrs);
        let children: Vec<Ident> = el.children.iter().map(|c| self.child(c)).collect();
        let cx = self.cx;
        quote! { #cx.h(#tag, #props, ::std::vec![#(#children),*]) }
    }
}

/// `onClick` → `Some("click")`. Other names are plain props.
fn handler_event(name: &str) -> Option<String> {
    let rest = name.strip_prefix("on")?;
    rest.starts_with(|c: char| c.is_ascii_uppercase())
        .then(|| rest.to_ascii_lowercase())
}

/// Entry point: generate code for a jsx! invocation.
pub(crate) fn jsx_impl(input: TokenStream) -> Result<TokenStream> {
    let parsed: JsxInput = syn::parse2(input)?;
    let mut gen = Codegen::new(&parsed.cx);
    let root = gen.element(&parsed.root);
    let stmts = gen.stmts;
    Ok(quote! {
        {
            #[allow(unused_imports)]
            use ::petal::jsx::Jsx as _;
            #(#stmts)*
            #root
        }
    })
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use quote::quote;

    fn parse(tokens: TokenStream) -> Result<JsxInput> {
        syn::parse2(tokens)
    }

    fn root(tokens: TokenStream) -> Element {
        parse(tokens).unwrap().root
    }

    // -----------------------------------------------------------------------
    // Parsing tests
    // -----------------------------------------------------------------------

    #[test]
    fn parse_self_closing_element() {
        let el = root(quote! { cx, <input type="text" disabled /> });
        assert!(matches!(el.tag, TagName::Named(ref n, _) if n == "input"));
        assert!(el.self_closing);
        assert_eq!(el.attrs.len(), 2);
        assert_eq!(el.attrs[0].name, "type");
        assert!(matches!(el.attrs[1].value, AttrValue::Implicit));
    }

    #[test]
    fn parse_dashed_names() {
        let el = root(quote! { cx, <x-user-card data-user-id={id} aria-label="card"></x-user-card> });
        assert_eq!(el.tag.label(), "x-user-card");
        assert_eq!(el.attrs[0].name, "data-user-id");
        assert!(matches!(el.attrs[0].value, AttrValue::Expr(_)));
        assert_eq!(el.attrs[1].name, "aria-label");
    }

    #[test]
    fn parse_children_kinds() {
        let el = root(quote! {
            cx,
            <p>
                "Hello, "
                <b>{name}</b>
                42
            </p>
        });
        assert_eq!(el.children.len(), 3);
        assert!(matches!(el.children[0], Node::Text(_)));
        assert!(matches!(el.children[1], Node::Element(_)));
        assert!(matches!(el.children[2], Node::Expr(_)));
    }

    #[test]
    fn parse_component_and_fragment_tags() {
        let el = root(quote! { cx, <><Greeting name="Ada" /><routes::Home /></> });
        assert!(matches!(el.tag, TagName::Fragment));
        let Node::Element(first) = &el.children[0] else { panic!("expected element") };
        assert!(matches!(first.tag, TagName::Value(_)));
        let Node::Element(second) = &el.children[1] else { panic!("expected element") };
        assert_eq!(second.tag.label(), "routes::Home");
    }

    #[test]
    fn parse_context_expression() {
        let input = parse(quote! { self.rt, <div /> }).unwrap();
        assert!(matches!(input.cx, Expr::Field(_)));
    }

    #[test]
    fn parse_error_mismatched_closing_tag() {
        let err = parse(quote! { cx, <div><span></div></span> }).err().unwrap();
        assert!(err.to_string().contains("mismatched closing tag"));
    }

    #[test]
    fn parse_error_multiple_roots() {
        let err = parse(quote! { cx, <a /><b /> }).err().unwrap();
        assert!(err.to_string().contains("exactly one root"));
    }

    #[test]
    fn parse_error_bare_text() {
        assert!(parse(quote! { cx, <p>hello</p> }).is_err());
    }

    #[test]
    fn parse_error_fragment_attributes() {
        let err = parse(quote! { cx, <key="a"></> }).err();
        assert!(err.is_some());
    }

    // -----------------------------------------------------------------------
    // Code generation tests
    // -----------------------------------------------------------------------

    fn expand(tokens: TokenStream) -> String {
        jsx_impl(tokens).unwrap().to_string()
    }

    #[test]
    fn codegen_imports_trait_and_calls_factory() {
        let code = expand(quote! { cx, <div class="box" /> });
        assert!(code.contains("use :: petal :: jsx :: Jsx as _"), "{code}");
        assert!(code.contains("__petal_p0 . insert (\"class\" , \"box\")"), "{code}");
        assert!(code.contains("cx . h (\"div\" , __petal_p0 , :: std :: vec ! [])"), "{code}");
    }

    #[test]
    fn codegen_hoists_nested_elements() {
        let code = expand(quote! { cx, <ul><li>"a"</li></ul> });
        let inner = code.find("cx . h (\"li\"").unwrap();
        let outer = code.find("cx . h (\"ul\"").unwrap();
        assert!(inner < outer, "{code}");
        assert!(code.contains("let __petal_c3 = :: petal :: jsx :: Child :: from (cx . h (\"li\" , __petal_p1 , :: std :: vec ! [__petal_c2]) ?)"), "{code}");
        assert!(code.contains("cx . h (\"ul\" , __petal_p0 , :: std :: vec ! [__petal_c3])"), "{code}");
    }

    #[test]
    fn codegen_event_handlers_use_on() {
        let code = expand(quote! { cx, <button onClick={handler} onMouseDown={other} /> });
        assert!(code.contains(". on (\"click\" , handler)"), "{code}");
        assert!(code.contains(". on (\"mousedown\" , other)"), "{code}");
    }

    #[test]
    fn codegen_component_and_fragment_tags() {
        let code = expand(quote! { cx, <><Greeting /></> });
        assert!(code.contains("cx . h (& Greeting"), "{code}");
        assert!(code.contains(":: petal :: jsx :: Tag :: Fragment"), "{code}");
    }

    #[test]
    fn codegen_implicit_attribute_is_true() {
        let code = expand(quote! { cx, <input disabled /> });
        assert!(code.contains("insert (\"disabled\" , true)"), "{code}");
    }

    #[test]
    fn handler_event_names() {
        assert_eq!(handler_event("onClick").as_deref(), Some("click"));
        assert_eq!(handler_event("onion"), None);
        assert_eq!(handler_event("class"), None);
    }
}
