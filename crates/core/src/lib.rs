//! roster-core: the participant query language.
//!
//! Compiles one line of query text such as
//! `role:student and not tagged:late` into a [`Predicate`] tree and
//! evaluates that tree against participant records.
//!
//! # Public API
//!
//! - [`parse_query()`] -- lex and parse one line
//! - [`tokenize()`] / [`significant_tokens()`] -- the lexer on its own
//! - [`lex_table()`] -- the ordered lexer rules
//! - [`Predicate`], [`Terminal`] -- the predicate tree
//! - [`evaluate()`], [`ParticipantView`] -- in-memory evaluation
//! - [`QueryError`] -- lex and parse failures

pub mod error;
pub mod eval;
pub mod lexer;
pub mod parser;
pub mod predicate;

// ── Convenience re-exports ───────────────────────────────────────────

pub use error::QueryError;
pub use eval::{evaluate, ParticipantView};
pub use lexer::{lex_table, significant_tokens, tokenize, LexRule, Token, TokenKind};
pub use parser::{parse_query, parse_tokens, ParseCursor, MAX_NESTING};
pub use predicate::{Predicate, Terminal};
