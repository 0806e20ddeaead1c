//! logos-based CSS tokenizer.
//!
//! Token priority in logos is determined by:
//! 1. Longest match wins (e.g. `10px` as Dimension beats `10` as Number)
//! 2. For equal length matches, earlier-defined variants win
//!
//! The tokenizer only needs to be precise enough to find rule boundaries,
//! selector structure and declaration spans. Values are kept as source text.

use logos::Logos;

/// CSS token produced by the lexer.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\n\r\f]+")]
pub enum Token {
    // ── Compound tokens (longer matches, defined first) ──────────────

    /// `!important` flag.
    #[regex(r"![ \t]*important")]
    Important,

    /// At-keyword: `@media`, `@font-face`, `@keyframes`.
    #[regex(r"@[a-zA-Z-]+")]
    AtKeyword,

    /// Hash: `#main` as an id selector, `#ff00aa` as a color.
    #[regex(r"#[a-zA-Z0-9_-]+")]
    Hash,

    /// Dimension or percentage: `10px`, `1.5rem`, `50%`, `.5em`.
    #[regex(r"-?([0-9]+(\.[0-9]+)?|\.[0-9]+)([a-zA-Z]+|%)")]
    Dimension,

    /// Number: integer or float, possibly negative.
    #[regex(r"-?([0-9]+(\.[0-9]+)?|\.[0-9]+)")]
    Number,

    /// Double-quoted string literal.
    #[regex(r#""[^"]*""#)]
    StringLiteral,

    /// Single-quoted string literal.
    #[regex(r"'[^']*'")]
    StringLiteralSingle,

    /// Identifier: property names, tag names, keywords, custom properties (`--x`).
    #[regex(r"-{0,2}[a-zA-Z_][a-zA-Z0-9_-]*")]
    Ident,

    /// Attribute selector operator: `=`, `~=`, `^=`, `$=`, `*=`, `|=`.
    #[regex(r"[~^$*|]?=")]
    AttrOperator,

    /// `::`
    #[token("::")]
    DoubleColon,

    // ── Single-character punctuation ─────────────────────────────────

    /// `{`
    #[token("{")]
    BraceOpen,

    /// `}`
    #[token("}")]
    BraceClose,

    /// `(`
    #[token("(")]
    ParenOpen,

    /// `)`
    #[token(")")]
    ParenClose,

    /// `[`
    #[token("[")]
    BracketOpen,

    /// `]`
    #[token("]")]
    BracketClose,

    /// `:`
    #[token(":")]
    Colon,

    /// `;`
    #[token(";")]
    Semicolon,

    /// `,`
    #[token(",")]
    Comma,

    /// `.`
    #[token(".")]
    Dot,

    /// `*`
    #[token("*")]
    Star,

    /// `>`
    #[token(">")]
    GreaterThan,

    /// `+`
    #[token("+")]
    Plus,

    /// `~`
    #[token("~")]
    Tilde,

    /// `/`
    #[token("/")]
    Slash,
}

/// Tokenize a CSS string into a vector of `(Token, String)` pairs.
///
/// Characters the lexer does not recognise are skipped.
pub fn tokenize(input: &str) -> Vec<(Token, String)> {
    let lexer = Token::lexer(input);
    lexer
        .spanned()
        .filter_map(|(result, span)| {
            result.ok().map(|token| (token, input[span].to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(input: &str) -> Vec<Token> {
        tokenize(input).into_iter().map(|(t, _)| t).collect()
    }

    #[test]
    fn punctuation() {
        assert_eq!(
            tokens("{ } ( ) [ ] : ; , . * > + ~ / ::"),
            vec![
                Token::BraceOpen,
                Token::BraceClose,
                Token::ParenOpen,
                Token::ParenClose,
                Token::BracketOpen,
                Token::BracketClose,
                Token::Colon,
                Token::Semicolon,
                Token::Comma,
                Token::Dot,
                Token::Star,
                Token::GreaterThan,
                Token::Plus,
                Token::Tilde,
                Token::Slash,
                Token::DoubleColon,
            ]
        );
    }

    #[test]
    fn dimension_beats_number() {
        assert_eq!(tokens("10px"), vec![Token::Dimension]);
        assert_eq!(tokens("50%"), vec![Token::Dimension]);
        assert_eq!(tokens(".5em"), vec![Token::Dimension]);
        assert_eq!(tokens("-2"), vec![Token::Number]);
    }

    #[test]
    fn hash_and_ident() {
        assert_eq!(tokens("#main"), vec![Token::Hash]);
        assert_eq!(tokens("#fff"), vec![Token::Hash]);
        assert_eq!(tokens("--accent-color"), vec![Token::Ident]);
        assert_eq!(tokens("font-size"), vec![Token::Ident]);
    }

    #[test]
    fn class_selector_is_dot_then_ident() {
        assert_eq!(tokens(".item"), vec![Token::Dot, Token::Ident]);
    }

    #[test]
    fn at_keyword() {
        let toks = tokenize("@media (min-width: 600px)");
        assert_eq!(toks[0], (Token::AtKeyword, "@media".to_string()));
        assert_eq!(toks[1].0, Token::ParenOpen);
    }

    #[test]
    fn important_with_space() {
        assert_eq!(tokens("! important"), vec![Token::Important]);
        assert_eq!(tokens("!important"), vec![Token::Important]);
    }

    #[test]
    fn attribute_operators() {
        assert_eq!(
            tokens("[type^=\"text\"]"),
            vec![
                Token::BracketOpen,
                Token::Ident,
                Token::AttrOperator,
                Token::StringLiteral,
                Token::BracketClose
            ]
        );
        assert_eq!(tokens("~="), vec![Token::AttrOperator]);
    }

    #[test]
    fn strings() {
        assert_eq!(tokens(r#""a b""#), vec![Token::StringLiteral]);
        assert_eq!(tokens("'a b'"), vec![Token::StringLiteralSingle]);
    }

    #[test]
    fn unknown_characters_are_skipped() {
        assert_eq!(tokens("a ` b"), vec![Token::Ident, Token::Ident]);
    }
}
