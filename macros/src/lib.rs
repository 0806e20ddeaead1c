//! Proc macros for petal: `jsx!` markup compiled to factory calls.
//!
//! This crate is not meant to be used directly — enable the `macros` feature on `petal`.

use proc_macro::TokenStream;

mod jsx_macro;

/// JSX-style DOM construction.
///
/// Takes a context (anything implementing `petal::jsx::Jsx`, usually the
/// render context) and one root element, and expands to a block evaluating to
/// `Result<NodeId, JsxError>`. Nested elements are built first and propagate
/// their errors with `?`, so the enclosing function's error type must convert
/// from `JsxError`.
///
/// # Syntax
///
/// - `<div class="box" />`, `<x-card>...</x-card>`: named elements
/// - `<Greeting name="Ada" />`: a `Tag` or `ComponentRef` value in scope
/// - `<>...</>`: a fragment
/// - `name="lit"`, `name={expr}`, `name`: props (a bare name is `true`)
/// - `onClick={|rt, event| ...}`: event listeners
/// - children: nested elements, string literals, `{expr}`
///
/// # Example
///
/// ```ignore
/// .render(|cx| {
///     let count = cx.field("count");
///     Ok(jsx!(cx,
///         <button class="counter" onClick={move |rt, _| Ok(())}>
///             "Count: " {count}
///         </button>
///     )?.into())
/// })
/// ```
#[proc_macro]
pub fn jsx(input: TokenStream) -> TokenStream {
    jsx_macro::jsx_impl(input.into())
        .unwrap_or_else(|err| err.to_compile_error())
        .into()
}
