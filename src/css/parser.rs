//! Recursive descent CSS parser.
//!
//! Parses CSS text into a [`StyleSheet`]. Uses the logos-based tokenizer from
//! [`crate::css::tokenizer`] for structure and byte spans into the
//! comment-stripped source for text, so values survive untouched.

use logos::Logos;

use crate::css::model::*;
use crate::css::tokenizer::Token;

/// At-rules whose block contains nested style rules.
const GROUPING_AT_RULES: &[&str] = &["media", "supports", "container", "layer", "document"];

/// Errors from CSS parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("unexpected token at byte {position}: {message}")]
    UnexpectedToken { position: usize, message: String },
    #[error("unexpected end of input: {0}")]
    UnexpectedEof(String),
}

/// A positioned token with byte-level span information for whitespace detection.
#[derive(Debug, Clone)]
struct PToken {
    token: Token,
    text: String,
    /// Byte offset where this token starts in the source.
    byte_start: usize,
    /// Byte offset where this token ends in the source.
    byte_end: usize,
}

/// Strip CSS block comments (`/* ... */`) from the input, replacing each
/// comment with a single space.
fn strip_comments(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(start) = rest.find("/*") {
        result.push_str(&rest[..start]);
        result.push(' ');
        match rest[start + 2..].find("*/") {
            Some(end) => rest = &rest[start + 2 + end + 2..],
            // Unterminated comment: consume the rest of the input.
            None => rest = "",
        }
    }
    result.push_str(rest);
    result
}

/// Tokenize input using logos with span information preserved.
fn tokenize_with_spans(input: &str) -> Vec<PToken> {
    Token::lexer(input)
        .spanned()
        .filter_map(|(result, span)| {
            result.ok().map(|token| PToken {
                text: input[span.clone()].to_string(),
                token,
                byte_start: span.start,
                byte_end: span.end,
            })
        })
        .collect()
}

/// Collapse whitespace runs to single spaces and trim.
fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Parse a CSS string into a [`StyleSheet`].
pub fn parse_css(input: &str) -> Result<StyleSheet, ParseError> {
    let cleaned = strip_comments(input);
    let tokens = tokenize_with_spans(&cleaned);

    let mut parser = Parser {
        tokens,
        cursor: 0,
        src: &cleaned,
    };
    let items = parser.parse_items(false)?;
    Ok(StyleSheet { items })
}

/// Recursive descent parser state.
struct Parser<'a> {
    tokens: Vec<PToken>,
    cursor: usize,
    src: &'a str,
}

impl Parser<'_> {
    fn is_eof(&self) -> bool {
        self.cursor >= self.tokens.len()
    }

    fn peek(&self) -> Option<&PToken> {
        self.tokens.get(self.cursor)
    }

    fn peek_token(&self) -> Option<Token> {
        self.peek().map(|t| t.token.clone())
    }

    fn advance(&mut self) -> Option<PToken> {
        let tok = self.tokens.get(self.cursor).cloned();
        if tok.is_some() {
            self.cursor += 1;
        }
        tok
    }

    fn expect(&mut self, expected: &Token) -> Result<PToken, ParseError> {
        match self.advance() {
            Some(tok) if &tok.token == expected => Ok(tok),
            Some(tok) => Err(unexpected(&tok, format!("expected {expected:?}, got '{}'", tok.text))),
            None => Err(ParseError::UnexpectedEof(format!("expected {expected:?}"))),
        }
    }

    fn slice(&self, start: usize, end: usize) -> String {
        normalize(&self.src[start..end])
    }

    /// Parse rules and at-rules until EOF, or until `}` when `nested`.
    fn parse_items(&mut self, nested: bool) -> Result<Vec<CssItem>, ParseError> {
        let mut items = Vec::new();
        loop {
            match self.peek_token() {
                None if nested => {
                    return Err(ParseError::UnexpectedEof("expected '}' to close block".into()))
                }
                None => break,
                Some(Token::BraceClose) if nested => break,
                Some(Token::BraceClose) => {
                    let tok = self.advance().expect("peeked token");
                    return Err(unexpected(&tok, "unmatched '}'".into()));
                }
                Some(Token::Semicolon) => {
                    self.advance();
                }
                Some(Token::AtKeyword) => items.push(CssItem::AtRule(self.parse_at_rule()?)),
                Some(_) => items.push(CssItem::Rule(self.parse_rule()?)),
            }
        }
        Ok(items)
    }

    fn parse_at_rule(&mut self) -> Result<AtRule, ParseError> {
        let keyword = self.expect(&Token::AtKeyword)?;
        let name = keyword.text[1..].to_ascii_lowercase();

        let mut prelude_span: Option<(usize, usize)> = None;
        let mut depth = 0usize;
        loop {
            let tok = self
                .peek()
                .cloned()
                .ok_or_else(|| ParseError::UnexpectedEof(format!("unterminated @{name}")))?;
            match tok.token {
                Token::BraceOpen | Token::Semicolon if depth == 0 => break,
                Token::ParenOpen | Token::BracketOpen => depth += 1,
                Token::ParenClose | Token::BracketClose => depth = depth.saturating_sub(1),
                _ => {}
            }
            self.advance();
            let start = prelude_span.map_or(tok.byte_start, |(s, _)| s);
            prelude_span = Some((start, tok.byte_end));
        }
        let prelude = prelude_span
            .map(|(s, e)| self.slice(s, e))
            .unwrap_or_default();

        if self.peek_token() == Some(Token::Semicolon) {
            self.advance();
            return Ok(AtRule {
                name,
                prelude,
                body: AtRuleBody::Statement,
            });
        }

        let open = self.expect(&Token::BraceOpen)?;
        let body = if GROUPING_AT_RULES.contains(&name.as_str()) {
            let items = self.parse_items(true)?;
            self.expect(&Token::BraceClose)?;
            AtRuleBody::Rules(items)
        } else {
            let close = self.skip_block()?;
            AtRuleBody::Raw(self.slice(open.byte_end, close.byte_start))
        };

        Ok(AtRule { name, prelude, body })
    }

    /// Skip to the `}` matching an already consumed `{`, returning it.
    fn skip_block(&mut self) -> Result<PToken, ParseError> {
        let mut depth = 1usize;
        while let Some(tok) = self.advance() {
            match tok.token {
                Token::BraceOpen => depth += 1,
                Token::BraceClose => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(tok);
                    }
                }
                _ => {}
            }
        }
        Err(ParseError::UnexpectedEof("expected '}' to close block".into()))
    }

    /// Parse a single CSS rule: selector(s) `{` declarations `}`.
    fn parse_rule(&mut self) -> Result<RuleSet, ParseError> {
        let selectors = self.parse_selector_list()?;
        self.expect(&Token::BraceOpen)?;
        let declarations = self.parse_declarations()?;
        self.expect(&Token::BraceClose)?;

        Ok(RuleSet {
            selectors,
            declarations,
        })
    }

    /// Parse a comma-separated list of selectors (before `{`).
    ///
    /// Compound boundaries are found by span adjacency: tokens with no
    /// whitespace between them belong to the same compound. Parenthesized and
    /// bracketed groups (`:not(a, b)`, `[type="x"]`) are kept whole.
    fn parse_selector_list(&mut self) -> Result<Vec<Selector>, ParseError> {
        let mut selectors = Vec::new();
        let mut parts: Vec<SelectorPart> = Vec::new();
        let mut current: Option<(usize, usize)> = None;
        let mut pending: Option<Combinator> = None;

        loop {
            let tok = self
                .peek()
                .cloned()
                .ok_or_else(|| ParseError::UnexpectedEof("expected '{' after selector".into()))?;

            match tok.token {
                Token::BraceOpen | Token::Comma => {
                    self.close_compound(&mut parts, &mut current);
                    if pending.is_some() {
                        return Err(unexpected(&tok, "selector ends with a combinator".into()));
                    }
                    if parts.is_empty() {
                        return Err(unexpected(&tok, "empty selector".into()));
                    }
                    selectors.push(Selector {
                        parts: std::mem::take(&mut parts),
                    });
                    if tok.token == Token::BraceOpen {
                        return Ok(selectors);
                    }
                    self.advance();
                }
                Token::GreaterThan | Token::Plus | Token::Tilde => {
                    self.close_compound(&mut parts, &mut current);
                    if parts.is_empty() || pending.is_some() {
                        return Err(unexpected(&tok, "misplaced combinator".into()));
                    }
                    pending = Some(match tok.token {
                        Token::GreaterThan => Combinator::Child,
                        Token::Plus => Combinator::NextSibling,
                        _ => Combinator::SubsequentSibling,
                    });
                    self.advance();
                }
                Token::BraceClose | Token::Semicolon | Token::AtKeyword => {
                    return Err(unexpected(&tok, format!("unexpected '{}' in selector", tok.text)));
                }
                _ => {
                    if let Some((_, end)) = current {
                        if end != tok.byte_start {
                            self.close_compound(&mut parts, &mut current);
                        }
                    }
                    if current.is_none() && !parts.is_empty() {
                        parts.push(SelectorPart::Combinator(
                            pending.take().unwrap_or(Combinator::Descendant),
                        ));
                    }
                    let end = self.consume_selector_piece()?;
                    let start = current.map_or(tok.byte_start, |(s, _)| s);
                    current = Some((start, end));
                }
            }
        }
    }

    fn close_compound(&self, parts: &mut Vec<SelectorPart>, current: &mut Option<(usize, usize)>) {
        if let Some((start, end)) = current.take() {
            parts.push(SelectorPart::Compound(self.src[start..end].to_string()));
        }
    }

    /// Consume one token, or a whole balanced group, returning its end byte.
    fn consume_selector_piece(&mut self) -> Result<usize, ParseError> {
        let first = self.advance().expect("caller peeked a token");
        if !matches!(first.token, Token::ParenOpen | Token::BracketOpen) {
            return Ok(first.byte_end);
        }
        let mut depth = 1usize;
        while let Some(tok) = self.advance() {
            match tok.token {
                Token::ParenOpen | Token::BracketOpen => depth += 1,
                Token::ParenClose | Token::BracketClose => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(tok.byte_end);
                    }
                }
                Token::BraceOpen | Token::BraceClose => {
                    return Err(unexpected(&tok, "unbalanced group in selector".into()));
                }
                _ => {}
            }
        }
        Err(ParseError::UnexpectedEof("unbalanced group in selector".into()))
    }

    /// Parse declarations until (not including) the closing `}`.
    fn parse_declarations(&mut self) -> Result<Vec<Declaration>, ParseError> {
        let mut declarations = Vec::new();
        loop {
            match self.peek_token() {
                None => return Err(ParseError::UnexpectedEof("expected '}' after declarations".into())),
                Some(Token::BraceClose) => return Ok(declarations),
                Some(Token::Semicolon) => {
                    self.advance();
                }
                Some(_) => declarations.push(self.parse_declaration()?),
            }
        }
    }

    /// Parse `property: value [!important]`.
    fn parse_declaration(&mut self) -> Result<Declaration, ParseError> {
        let name = self.advance().expect("caller peeked a token");
        if name.token != Token::Ident {
            return Err(unexpected(&name, format!("expected property name, got '{}'", name.text)));
        }
        self.expect(&Token::Colon)?;

        let mut span: Option<(usize, usize)> = None;
        let mut important = false;
        let mut depth = 0usize;
        while let Some(tok) = self.peek().cloned() {
            match tok.token {
                Token::Semicolon | Token::BraceClose if depth == 0 => break,
                Token::Important if depth == 0 => {
                    important = true;
                    self.advance();
                    continue;
                }
                Token::ParenOpen | Token::BracketOpen => depth += 1,
                Token::ParenClose | Token::BracketClose => depth = depth.saturating_sub(1),
                _ => {}
            }
            if important {
                return Err(unexpected(&tok, "'!important' must end the declaration".into()));
            }
            self.advance();
            let start = span.map_or(tok.byte_start, |(s, _)| s);
            span = Some((start, tok.byte_end));
        }

        let value = span.map(|(s, e)| self.slice(s, e)).unwrap_or_default();
        if value.is_empty() && !name.text.starts_with("--") {
            return Err(ParseError::UnexpectedToken {
                position: name.byte_start,
                message: format!("empty value for '{}'", name.text),
            });
        }

        Ok(Declaration::new(name.text, value, important))
    }
}

fn unexpected(tok: &PToken, message: String) -> ParseError {
    ParseError::UnexpectedToken {
        position: tok.byte_start,
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(sheet: &StyleSheet, idx: usize) -> &RuleSet {
        match &sheet.items[idx] {
            CssItem::Rule(r) => r,
            other => panic!("expected rule, got {other:?}"),
        }
    }

    #[test]
    fn simple_rule() {
        let sheet = parse_css("p { color: red; }").unwrap();
        let r = rule(&sheet, 0);
        assert_eq!(r.selectors[0].to_string(), "p");
        assert_eq!(r.declarations, vec![Declaration::new("color", "red", false)]);
    }

    #[test]
    fn selector_list_and_combinators() {
        let sheet = parse_css("ul > li.active, a:hover span + em ~ b { x: y }").unwrap();
        let r = rule(&sheet, 0);
        assert_eq!(r.selectors.len(), 2);
        assert_eq!(r.selectors[0].to_string(), "ul > li.active");
        assert_eq!(r.selectors[1].to_string(), "a:hover span + em ~ b");
        assert_eq!(r.selectors[1].parts.len(), 7);
    }

    #[test]
    fn groups_stay_in_one_compound() {
        let sheet = parse_css(":host(.open) ::slotted(li), input[type=\"text\"]:not(.a, .b) { x: y }").unwrap();
        let r = rule(&sheet, 0);
        assert_eq!(r.selectors.len(), 2);
        assert_eq!(r.selectors[0].first_compound(), Some(":host(.open)"));
        assert_eq!(r.selectors[0].to_string(), ":host(.open) ::slotted(li)");
        assert_eq!(r.selectors[1].to_string(), "input[type=\"text\"]:not(.a, .b)");
    }

    #[test]
    fn values_keep_source_text() {
        let sheet = parse_css(
            "div { font: 12px/1.5  \"Helvetica Neue\", sans-serif; width: calc(100% - 2rem); background: url(http://x/y.png) !important }",
        )
        .unwrap();
        let decls = &rule(&sheet, 0).declarations;
        assert_eq!(decls[0].value, "12px/1.5 \"Helvetica Neue\", sans-serif");
        assert_eq!(decls[1].value, "calc(100% - 2rem)");
        assert_eq!(decls[2].value, "url(http://x/y.png)");
        assert!(decls[2].important);
    }

    #[test]
    fn custom_properties() {
        let sheet = parse_css(":host { --accent: #ff00aa; color: var(--accent); }").unwrap();
        let decls = &rule(&sheet, 0).declarations;
        assert_eq!(decls[0].property, "--accent");
        assert_eq!(decls[0].value, "#ff00aa");
        assert_eq!(decls[1].value, "var(--accent)");
    }

    #[test]
    fn comments_are_stripped() {
        let sheet = parse_css("/* head */ a { /* inner */ color: blue; } /* tail").unwrap();
        assert_eq!(sheet.items.len(), 1);
        assert_eq!(rule(&sheet, 0).declarations[0].value, "blue");
    }

    #[test]
    fn media_rule_nests_rules() {
        let sheet = parse_css("@media (min-width: 600px) { a { color: red } b { color: blue } }").unwrap();
        match &sheet.items[0] {
            CssItem::AtRule(at) => {
                assert_eq!(at.name, "media");
                assert_eq!(at.prelude, "(min-width: 600px)");
                match &at.body {
                    AtRuleBody::Rules(items) => assert_eq!(items.len(), 2),
                    other => panic!("expected nested rules, got {other:?}"),
                }
            }
            other => panic!("expected at-rule, got {other:?}"),
        }
    }

    #[test]
    fn keyframes_kept_raw() {
        let sheet = parse_css("@keyframes spin { from { transform: rotate(0) } to { transform: rotate(1turn) } }").unwrap();
        match &sheet.items[0] {
            CssItem::AtRule(at) => {
                assert_eq!(at.prelude, "spin");
                assert_eq!(
                    at.body,
                    AtRuleBody::Raw("from { transform: rotate(0) } to { transform: rotate(1turn) }".into())
                );
            }
            other => panic!("expected at-rule, got {other:?}"),
        }
    }

    #[test]
    fn statement_at_rule() {
        let sheet = parse_css("@import url(theme.css); a { b: c }").unwrap();
        assert_eq!(sheet.items.len(), 2);
        assert_eq!(sheet.items[0].to_string(), "@import url(theme.css);");
    }

    #[test]
    fn round_trip_display() {
        let css = "a, b > c { color: red; margin: 0 auto !important; }";
        assert_eq!(parse_css(css).unwrap().to_string(), css);
    }

    #[test]
    fn empty_input() {
        assert!(parse_css("").unwrap().is_empty());
        assert!(parse_css("  /* only a comment */ ").unwrap().is_empty());
    }

    #[test]
    fn error_missing_brace() {
        assert!(matches!(parse_css("a { color: red"), Err(ParseError::UnexpectedEof(_))));
    }

    #[test]
    fn error_unmatched_close() {
        assert!(matches!(parse_css("}"), Err(ParseError::UnexpectedToken { .. })));
    }

    #[test]
    fn error_empty_value() {
        assert!(parse_css("a { color: ; }").is_err());
        assert!(parse_css("a { --empty: ; }").is_ok());
    }

    #[test]
    fn error_dangling_combinator() {
        assert!(parse_css("a > { x: y }").is_err());
        assert!(parse_css("> a { x: y }").is_err());
    }

    #[test]
    fn error_missing_property_name() {
        assert!(parse_css("a { : red }").is_err());
    }
}
