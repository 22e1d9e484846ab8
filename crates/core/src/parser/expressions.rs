use super::ParseCursor;
use crate::error::QueryError;
use crate::lexer::TokenKind;
use crate::predicate::{Predicate, Terminal};

pub const PREC_OR: u8 = 10;
pub const PREC_AND: u8 = 20;
pub const PREC_NOT: u8 = 30;

impl<'a> ParseCursor<'a> {
    // -- Precedence climbing -------------------------------------

    /// Parse one primary, then extend it with operators binding tighter
    /// than `min_precedence`.
    ///
    /// Runs of the same connective at one level are collected and joined
    /// with [`Predicate::all`] / [`Predicate::any`], so long chains do not
    /// produce deep trees.
    pub(super) fn inner_parse(&mut self, min_precedence: u8) -> Result<Predicate, QueryError> {
        let mut disjuncts = Vec::new();
        let mut conjuncts = vec![self.parse_primary()?];

        while let Some(kind) = self.peek_kind() {
            if kind == TokenKind::And && PREC_AND > min_precedence {
                self.advance();
                conjuncts.push(self.inner_parse(PREC_AND)?);
            } else if kind == TokenKind::Or && PREC_OR > min_precedence {
                self.advance();
                disjuncts.extend(Predicate::all(conjuncts.drain(..)));
                conjuncts.push(self.inner_parse(PREC_OR)?);
            } else if kind.starts_primary() && PREC_AND > min_precedence {
                // Implicit `and`: a new primary with no connective.
                conjuncts.push(self.inner_parse(PREC_AND)?);
            } else {
                break;
            }
        }

        disjuncts.extend(Predicate::all(conjuncts));
        Predicate::any(disjuncts).ok_or_else(|| self.error("unexpected end of input"))
    }

    fn parse_primary(&mut self) -> Result<Predicate, QueryError> {
        self.expect_not_end()?;

        if self.is_next(TokenKind::Not) {
            self.advance();
            self.enter()?;
            let inner = self.inner_parse(PREC_NOT)?;
            self.leave();
            Ok(inner.not())
        } else if self.is_next(TokenKind::LParen) {
            self.advance();
            self.enter()?;
            let inner = self.inner_parse(0)?;
            self.expect(TokenKind::RParen)?;
            self.leave();
            Ok(inner)
        } else {
            self.parse_terminal()
        }
    }

    // -- Terminals -----------------------------------------------

    fn parse_terminal(&mut self) -> Result<Predicate, QueryError> {
        let Some(token) = self.peek() else {
            return Err(self.error("unexpected end of input"));
        };
        let value = token.value().to_owned();

        let terminal = match token.kind {
            TokenKind::Id => {
                let id = value
                    .parse::<i64>()
                    .map_err(|_| self.error(format!("invalid user id '{}'", value)))?;
                Terminal::UserId(id)
            }
            TokenKind::Email => Terminal::EmailIs(value),
            TokenKind::EmailContains => Terminal::EmailContains(value),
            TokenKind::Username => Terminal::UsernameIs(value),
            TokenKind::UsernameContains => Terminal::UsernameContains(value),
            TokenKind::Tagged => Terminal::Tagged(value),
            TokenKind::Role => Terminal::Role(value),
            TokenKind::Status => Terminal::Status(value),
            TokenKind::HasStarted => Terminal::HasStarted(value),
            TokenKind::HasSubmitted => Terminal::HasSubmitted(value),
            other => return Err(self.error(format!("expected terminal, got {}", other))),
        };

        self.advance();
        Ok(Predicate::Terminal(terminal))
    }
}
