//! Translation of predicate trees into SQLite `WHERE` fragments.
//!
//! The fragment refers to the participation row as `p` and uses anonymous
//! `?` placeholders; [`SqlFilter::params`] lists the bound values in
//! placeholder order.

use roster_core::{Predicate, Terminal};
use rusqlite::types::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct SqlFilter {
    pub clause: String,
    pub params: Vec<Value>,
}

/// Translate `predicate` into a boolean SQL expression over `p`.
pub fn translate(predicate: &Predicate) -> SqlFilter {
    let mut params = Vec::new();
    let clause = build(predicate, &mut params);
    SqlFilter { clause, params }
}

fn build(predicate: &Predicate, params: &mut Vec<Value>) -> String {
    match predicate {
        Predicate::And(l, r) => {
            let l = build(l, params);
            let r = build(r, params);
            format!("({} AND {})", l, r)
        }
        Predicate::Or(l, r) => {
            let l = build(l, params);
            let r = build(r, params);
            format!("({} OR {})", l, r)
        }
        Predicate::Not(inner) => format!("(NOT {})", build(inner, params)),
        Predicate::Terminal(t) => terminal(t, params),
    }
}

fn terminal(t: &Terminal, params: &mut Vec<Value>) -> String {
    let (sql, value) = match t {
        Terminal::UserId(id) => ("p.user_id = ?", Value::Integer(*id)),
        Terminal::EmailIs(s) => ("lower(p.email) = lower(?)", text(s)),
        // instr() instead of LIKE keeps `%` and `_` literal.
        Terminal::EmailContains(s) => ("instr(lower(p.email), lower(?)) > 0", text(s)),
        Terminal::UsernameIs(s) => ("p.username = ?", text(s)),
        Terminal::UsernameContains(s) => ("instr(p.username, ?) > 0", text(s)),
        Terminal::Tagged(name) => (
            "EXISTS (SELECT 1 FROM participant_tags pt \
             JOIN tags t ON t.id = pt.tag_id \
             WHERE pt.participant_id = p.id AND t.course = p.course AND t.name = ?)",
            text(name),
        ),
        Terminal::Role(role) => (
            "EXISTS (SELECT 1 FROM participant_roles r \
             WHERE r.participant_id = p.id AND r.role = ?)",
            text(role),
        ),
        Terminal::Status(status) => ("p.status = ?", text(status)),
        Terminal::HasStarted(flow) => (
            "EXISTS (SELECT 1 FROM flow_sessions fs \
             WHERE fs.participant_id = p.id AND fs.course = p.course AND fs.flow_id = ?)",
            text(flow),
        ),
        Terminal::HasSubmitted(flow) => (
            "EXISTS (SELECT 1 FROM flow_sessions fs \
             WHERE fs.participant_id = p.id AND fs.course = p.course AND fs.flow_id = ? \
             AND fs.in_progress = 0)",
            text(flow),
        ),
    };
    params.push(value);
    sql.to_owned()
}

fn text(s: &str) -> Value {
    Value::Text(s.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use roster_core::parse_query;

    #[test]
    fn params_follow_placeholder_order() {
        let f = translate(&parse_query("id:5 or not username:bo").unwrap());
        assert_eq!(
            f.clause,
            "(p.user_id = ? OR (NOT p.username = ?))"
        );
        assert_eq!(f.params, vec![Value::Integer(5), Value::Text("bo".into())]);
        assert_eq!(f.clause.matches('?').count(), f.params.len());
    }

    #[test]
    fn existence_terminals_become_subqueries() {
        let f = translate(&parse_query("not has-submitted:quiz-1").unwrap());
        assert!(f.clause.starts_with("(NOT EXISTS (SELECT 1 FROM flow_sessions"));
        assert!(f.clause.contains("fs.in_progress = 0"));
        assert_eq!(f.params, vec![Value::Text("quiz-1".into())]);
    }
}
