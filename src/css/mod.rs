//! CSS engine: tokenizer, parser, compiled stylesheets, light-DOM scoping.

pub mod tokenizer;
pub mod model;
pub mod parser;
pub mod stylesheet;

pub use parser::{parse_css, ParseError};
pub use stylesheet::{CompiledStylesheet, StyleScope, StyleSheetCache};
