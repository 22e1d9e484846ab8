//! Operator-precedence parser producing [`Predicate`] trees.
//!
//! One call parses one line of query text. All cursor state lives in the
//! [`ParseCursor`] owned by that call.
use crate::error::QueryError;
use crate::lexer::{self, Token, TokenKind};
use crate::predicate::Predicate;

mod expressions;

pub use expressions::{PREC_AND, PREC_NOT, PREC_OR};

/// Deepest allowed nesting of `not` and parenthesised groups in one line.
pub const MAX_NESTING: usize = 64;

// ──────────────────────────────────────────────
// Cursor
// ──────────────────────────────────────────────

/// Position over the whitespace-free token list of a single line.
pub struct ParseCursor<'a> {
    tokens: &'a [Token],
    pos: usize,
    /// Byte length of the line, reported for errors at end of input.
    end: usize,
    /// Open `not` and `(` groups around the current token.
    nesting: usize,
}

impl<'a> ParseCursor<'a> {
    pub fn new(tokens: &'a [Token], source_len: usize) -> Self {
        ParseCursor {
            tokens,
            pos: 0,
            end: source_len,
            nesting: 0,
        }
    }

    pub fn is_at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    pub fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos)
    }

    pub fn peek_kind(&self) -> Option<TokenKind> {
        self.peek().map(|t| t.kind)
    }

    pub fn is_next(&self, kind: TokenKind) -> bool {
        self.peek_kind() == Some(kind)
    }

    pub fn advance(&mut self) -> Option<&'a Token> {
        let t = self.tokens.get(self.pos);
        if t.is_some() {
            self.pos += 1;
        }
        t
    }

    /// Byte offset of the current token, or of end of input.
    pub fn position(&self) -> usize {
        self.peek().map_or(self.end, |t| t.position)
    }

    pub fn expect(&mut self, kind: TokenKind) -> Result<&'a Token, QueryError> {
        match self.peek() {
            Some(t) if t.kind == kind => {
                self.pos += 1;
                Ok(t)
            }
            Some(t) => Err(self.error(format!("expected '{}', got {}", kind, t.kind))),
            None => Err(self.error(format!("expected '{}' at end of input", kind))),
        }
    }

    pub fn expect_not_end(&self) -> Result<(), QueryError> {
        if self.is_at_end() {
            Err(self.error("unexpected end of input"))
        } else {
            Ok(())
        }
    }

    /// Open a `not` or `(` group.
    pub fn enter(&mut self) -> Result<(), QueryError> {
        if self.nesting >= MAX_NESTING {
            return Err(self.error(format!(
                "query nested deeper than {} levels",
                MAX_NESTING
            )));
        }
        self.nesting += 1;
        Ok(())
    }

    pub fn leave(&mut self) {
        self.nesting = self.nesting.saturating_sub(1);
    }

    pub fn error(&self, msg: impl Into<String>) -> QueryError {
        QueryError::parse(self.position(), msg)
    }
}

// ──────────────────────────────────────────────
// Entry point
// ──────────────────────────────────────────────

/// Compile one line of query text into a predicate.
pub fn parse_query(text: &str) -> Result<Predicate, QueryError> {
    let tokens = lexer::significant_tokens(text)?;
    parse_tokens(&tokens, text.len())
}

/// Parse an already lexed, whitespace-free token list.
pub fn parse_tokens(tokens: &[Token], source_len: usize) -> Result<Predicate, QueryError> {
    let mut cursor = ParseCursor::new(tokens, source_len);
    if cursor.is_at_end() {
        return Err(cursor.error("unexpected end of input"));
    }

    let result = cursor.inner_parse(0)?;
    if !cursor.is_at_end() {
        return Err(cursor.error("leftover input after completed parse"));
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predicate::Terminal;

    fn role(r: &str) -> Predicate {
        Terminal::Role(r.into()).into()
    }

    fn status(s: &str) -> Predicate {
        Terminal::Status(s.into()).into()
    }

    fn tagged(t: &str) -> Predicate {
        Terminal::Tagged(t.into()).into()
    }

    fn parse(text: &str) -> Predicate {
        parse_query(text).unwrap()
    }

    #[test]
    fn single_terminal() {
        assert_eq!(parse("role:student"), role("student"));
        assert_eq!(parse("  role:student\t"), role("student"));
    }

    #[test]
    fn every_terminal_kind_maps_to_its_condition() {
        let p = parse(
            "id:12 email:a@b.c email-contains:b.c username:u username-contains:s \
             tagged:t-1 role:ta status:denied has-started:f1 has-submitted:f-2",
        );
        let expected = [
            Terminal::UserId(12),
            Terminal::EmailIs("a@b.c".into()),
            Terminal::EmailContains("b.c".into()),
            Terminal::UsernameIs("u".into()),
            Terminal::UsernameContains("s".into()),
            Terminal::Tagged("t-1".into()),
            Terminal::Role("ta".into()),
            Terminal::Status("denied".into()),
            Terminal::HasStarted("f1".into()),
            Terminal::HasSubmitted("f-2".into()),
        ]
        .into_iter()
        .map(Predicate::from);
        assert_eq!(Some(p), Predicate::all(expected));
    }

    #[test]
    fn implicit_and_matches_explicit_and() {
        assert_eq!(
            parse("role:student tagged:foo"),
            parse("role:student and tagged:foo")
        );
        assert_eq!(
            parse("role:student not tagged:foo (status:active)"),
            role("student").and(tagged("foo").not()).and(status("active"))
        );
    }

    #[test]
    fn implicit_and_binds_tighter_than_or() {
        assert_eq!(
            parse("role:a or role:b tagged:x"),
            role("a").or(role("b").and(tagged("x")))
        );
    }

    #[test]
    fn and_binds_tighter_than_or() {
        assert_eq!(
            parse("role:student and not status:active or tagged:foo"),
            role("student").and(status("active").not()).or(tagged("foo"))
        );
    }

    #[test]
    fn not_binds_only_the_next_unary() {
        assert_eq!(
            parse("not role:a and role:b"),
            role("a").not().and(role("b"))
        );
        assert_eq!(parse("not not role:a"), role("a").not().not());
        assert_eq!(
            parse("not (role:a or role:b)"),
            role("a").or(role("b")).not()
        );
    }

    #[test]
    fn same_precedence_chains_keep_operand_order() {
        assert_eq!(
            parse("role:a or role:b or role:c"),
            role("a").or(role("b")).or(role("c"))
        );
        assert_eq!(
            parse("role:a and role:b and role:c"),
            role("a").and(role("b")).and(role("c"))
        );
        assert_eq!(
            parse("role:a or role:b tagged:x or role:c or role:d"),
            role("a")
                .or(role("b").and(tagged("x")))
                .or(role("c").or(role("d")))
        );
    }

    #[test]
    fn long_chains_parse_into_shallow_trees() {
        let ors = (0..3000).map(|i| format!("id:{i}")).collect::<Vec<_>>();
        let p = parse(&ors.join(" or "));
        assert_eq!(p.depth(), 13);
        assert_eq!(p.to_string().replace(['(', ')'], ""), ors.join(" or "));

        let p = parse(&ors.join(" "));
        assert_eq!(p.depth(), 13);
        assert_eq!(p.to_string().replace(['(', ')'], ""), ors.join(" and "));
    }

    #[test]
    fn nesting_is_bounded() {
        let ok = format!("{}role:a{}", "(".repeat(MAX_NESTING), ")".repeat(MAX_NESTING));
        assert_eq!(parse(&ok), role("a"));
        assert_eq!(
            parse(&format!("{}role:a", "not ".repeat(MAX_NESTING))).depth(),
            MAX_NESTING + 1
        );

        let deep = format!("{}role:a", "not ".repeat(MAX_NESTING + 1));
        let err = parse_query(&deep).unwrap_err();
        assert_eq!(err.position(), 4 * MAX_NESTING + 4);
        assert!(err.to_string().contains("nested deeper than"));

        let deep = "(".repeat(10_000);
        assert!(matches!(parse_query(&deep), Err(QueryError::Parse { .. })));
    }

    #[test]
    fn parentheses_group_and_reset_precedence() {
        assert_eq!(parse("(role:a)"), role("a"));
        assert_eq!(parse("((role:a))"), role("a"));
        assert_eq!(
            parse("role:a and (role:b or role:c)"),
            role("a").and(role("b").or(role("c")))
        );
    }

    #[test]
    fn empty_input_is_a_parse_error() {
        for text in ["", "   ", "\t"] {
            let err = parse_query(text).unwrap_err();
            assert!(matches!(err, QueryError::Parse { .. }), "{text:?}: {err}");
            assert!(err.to_string().contains("unexpected end of input"));
        }
    }

    #[test]
    fn unclosed_paren_is_a_parse_error() {
        let err = parse_query("(").unwrap_err();
        assert_eq!(err, QueryError::parse(1, "unexpected end of input"));

        let err = parse_query("(role:a").unwrap_err();
        assert_eq!(err, QueryError::parse(7, "expected ')' at end of input"));
    }

    #[test]
    fn stray_close_paren_is_leftover_input() {
        let err = parse_query("role:a)").unwrap_err();
        assert_eq!(
            err,
            QueryError::parse(6, "leftover input after completed parse")
        );
    }

    #[test]
    fn dangling_operator_is_an_error() {
        let err = parse_query("role:student role:student and").unwrap_err();
        assert!(matches!(err, QueryError::Parse { .. }));
        assert_eq!(err.position(), 29);

        let err = parse_query("role:student or").unwrap_err();
        assert!(err.to_string().contains("unexpected end of input"));
    }

    #[test]
    fn operator_in_primary_position_is_an_error() {
        let err = parse_query("and role:a").unwrap_err();
        assert_eq!(err, QueryError::parse(0, "expected terminal, got and"));
        let err = parse_query("role:a or or role:b").unwrap_err();
        assert_eq!(err.position(), 10);
    }

    #[test]
    fn missing_value_fails_to_compile() {
        assert!(matches!(
            parse_query("role:"),
            Err(QueryError::Lex { position: 0, .. })
        ));
    }

    #[test]
    fn oversized_id_is_a_parse_error() {
        let err = parse_query("id:99999999999999999999").unwrap_err();
        assert!(matches!(err, QueryError::Parse { position: 0, .. }));
    }
}
