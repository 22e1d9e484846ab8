//! Table-driven lexer for participant queries.
//!
//! Rules are tried in table order at each unconsumed offset and the first
//! rule that matches wins. Order matters: keywords and `kind:` prefixes sit
//! ahead of the whitespace rule, and `and`/`or`/`not` only match whole words.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::error::QueryError;

/// Closed set of token kinds recognised by the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    // Structural
    And,
    Or,
    Not,
    LParen,
    RParen,
    // Terminals
    Id,
    Email,
    EmailContains,
    Username,
    UsernameContains,
    Tagged,
    Role,
    Status,
    HasStarted,
    HasSubmitted,
    /// Produced by the lexer, dropped before parsing.
    Whitespace,
}

impl TokenKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TokenKind::And => "and",
            TokenKind::Or => "or",
            TokenKind::Not => "not",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::Id => "id",
            TokenKind::Email => "email",
            TokenKind::EmailContains => "email-contains",
            TokenKind::Username => "username",
            TokenKind::UsernameContains => "username-contains",
            TokenKind::Tagged => "tagged",
            TokenKind::Role => "role",
            TokenKind::Status => "status",
            TokenKind::HasStarted => "has-started",
            TokenKind::HasSubmitted => "has-submitted",
            TokenKind::Whitespace => "whitespace",
        }
    }

    /// True for the ten `kind:value` terminal forms.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TokenKind::Id
                | TokenKind::Email
                | TokenKind::EmailContains
                | TokenKind::Username
                | TokenKind::UsernameContains
                | TokenKind::Tagged
                | TokenKind::Role
                | TokenKind::Status
                | TokenKind::HasStarted
                | TokenKind::HasSubmitted
        )
    }

    /// True if a token of this kind can begin a primary expression.
    pub fn starts_primary(self) -> bool {
        self.is_terminal() || matches!(self, TokenKind::Not | TokenKind::LParen)
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    /// The full matched text.
    pub lexeme: String,
    /// Byte offset of the first character of `lexeme`.
    pub position: usize,
    /// Payload groups of the rule, in group order.
    pub captures: Vec<String>,
}

impl Token {
    /// The single payload of a terminal token (empty for structural tokens).
    pub fn value(&self) -> &str {
        self.captures.first().map(String::as_str).unwrap_or("")
    }
}

/// One row of the lexer table.
#[derive(Debug)]
pub struct LexRule {
    pub kind: TokenKind,
    pub pattern: &'static str,
    regex: Regex,
}

impl LexRule {
    fn new(kind: TokenKind, pattern: &'static str) -> Result<Self, QueryError> {
        let regex = Regex::new(&format!("^(?:{})", pattern))
            .map_err(|e| QueryError::rule(pattern, e.to_string()))?;
        Ok(LexRule {
            kind,
            pattern,
            regex,
        })
    }
}

const RULES: &[(TokenKind, &str)] = &[
    (TokenKind::And, r"and\b"),
    (TokenKind::Or, r"or\b"),
    (TokenKind::Not, r"not\b"),
    (TokenKind::LParen, r"\("),
    (TokenKind::RParen, r"\)"),
    (TokenKind::Id, r"id:([0-9]+)"),
    (TokenKind::Email, r"email:([^ \t\n\r\f\v)]+)"),
    (TokenKind::EmailContains, r"email-contains:([^ \t\n\r\f\v)]+)"),
    (TokenKind::Username, r"username:([^ \t\n\r\f\v)]+)"),
    (TokenKind::UsernameContains, r"username-contains:([^ \t\n\r\f\v)]+)"),
    (TokenKind::Tagged, r"tagged:([-\w]+)"),
    (TokenKind::Role, r"role:(\w+)"),
    (TokenKind::Status, r"status:(\w+)"),
    (TokenKind::HasStarted, r"has-started:([-_\w]+)"),
    (TokenKind::HasSubmitted, r"has-submitted:([-_\w]+)"),
    (TokenKind::Whitespace, r"[ \t]+"),
];

static LEX_TABLE: LazyLock<Result<Vec<LexRule>, QueryError>> = LazyLock::new(|| {
    RULES
        .iter()
        .map(|(kind, pattern)| LexRule::new(*kind, pattern))
        .collect()
});

/// The lexer table in match-priority order.
///
/// Fails with [`QueryError::Rule`] if a pattern does not compile.
pub fn lex_table() -> Result<&'static [LexRule], QueryError> {
    LEX_TABLE.as_deref().map_err(Clone::clone)
}

/// Split `text` into tokens, whitespace included.
pub fn tokenize(text: &str) -> Result<Vec<Token>, QueryError> {
    let table = lex_table()?;
    let mut tokens = Vec::new();
    let mut pos = 0usize;

    while pos < text.len() {
        let rest = &text[pos..];
        let hit = table
            .iter()
            .find_map(|rule| rule.regex.captures(rest).map(|caps| (rule.kind, caps)));

        let Some((kind, caps)) = hit else {
            let remainder: String = rest.chars().take(24).collect();
            return Err(QueryError::lex(pos, remainder));
        };

        let whole = caps.get(0).map(|m| m.as_str()).unwrap_or("");
        if whole.is_empty() {
            return Err(QueryError::lex(pos, rest.chars().take(24).collect::<String>()));
        }
        let captures = caps
            .iter()
            .skip(1)
            .flatten()
            .map(|m| m.as_str().to_owned())
            .collect();

        tokens.push(Token {
            kind,
            lexeme: whole.to_owned(),
            position: pos,
            captures,
        });
        pos += whole.len();
    }

    Ok(tokens)
}

/// Tokens the parser consumes: everything except whitespace.
pub fn significant_tokens(text: &str) -> Result<Vec<Token>, QueryError> {
    Ok(tokenize(text)?
        .into_iter()
        .filter(|t| t.kind != TokenKind::Whitespace)
        .collect())
}
