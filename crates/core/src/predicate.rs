//! Boolean predicate trees over participant terminal conditions.
//!
//! Trees are immutable once built. The combinators consume their operands
//! and return a new tree, which is how independently parsed lines are
//! unioned into one predicate.

use std::fmt;

use serde::Serialize;

/// A single attribute or relationship condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "terminal", content = "value", rename_all = "snake_case")]
pub enum Terminal {
    /// Owning user's identifier equals the value.
    UserId(i64),
    /// Email equals the value, ignoring case.
    EmailIs(String),
    /// Email contains the value, ignoring case.
    EmailContains(String),
    /// Username equals the value exactly.
    UsernameIs(String),
    /// Username contains the value (case-sensitive).
    UsernameContains(String),
    /// Participant carries the course tag with this name.
    Tagged(String),
    Role(String),
    Status(String),
    /// Some flow session for this flow exists in the course.
    HasStarted(String),
    /// Some flow session for this flow exists and is no longer in progress.
    HasSubmitted(String),
}

impl fmt::Display for Terminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Terminal::UserId(id) => write!(f, "id:{}", id),
            Terminal::EmailIs(s) => write!(f, "email:{}", s),
            Terminal::EmailContains(s) => write!(f, "email-contains:{}", s),
            Terminal::UsernameIs(s) => write!(f, "username:{}", s),
            Terminal::UsernameContains(s) => write!(f, "username-contains:{}", s),
            Terminal::Tagged(s) => write!(f, "tagged:{}", s),
            Terminal::Role(s) => write!(f, "role:{}", s),
            Terminal::Status(s) => write!(f, "status:{}", s),
            Terminal::HasStarted(s) => write!(f, "has-started:{}", s),
            Terminal::HasSubmitted(s) => write!(f, "has-submitted:{}", s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Predicate {
    And(Box<Predicate>, Box<Predicate>),
    Or(Box<Predicate>, Box<Predicate>),
    Not(Box<Predicate>),
    Terminal(Terminal),
}

impl Predicate {
    pub fn and(self, other: Predicate) -> Self {
        Predicate::And(Box::new(self), Box::new(other))
    }

    pub fn or(self, other: Predicate) -> Self {
        Predicate::Or(Box::new(self), Box::new(other))
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Predicate::Not(Box::new(self))
    }

    /// Join the predicates with `Or`. `None` when the iterator is empty.
    ///
    /// Operands are paired off level by level, so the tree is
    /// logarithmically deep in the number of operands and keeps their order.
    pub fn any<I>(predicates: I) -> Option<Predicate>
    where
        I: IntoIterator<Item = Predicate>,
    {
        balanced(predicates.into_iter().collect(), Predicate::or)
    }

    /// Join the predicates with `And`, shaped like [`Predicate::any`].
    pub fn all<I>(predicates: I) -> Option<Predicate>
    where
        I: IntoIterator<Item = Predicate>,
    {
        balanced(predicates.into_iter().collect(), Predicate::and)
    }

    /// Tag names referenced by `tagged:` terminals, first occurrence order.
    pub fn tag_names(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_tags(&mut out);
        out
    }

    fn collect_tags<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Predicate::And(l, r) | Predicate::Or(l, r) => {
                l.collect_tags(out);
                r.collect_tags(out);
            }
            Predicate::Not(inner) => inner.collect_tags(out),
            Predicate::Terminal(Terminal::Tagged(name)) => {
                if !out.contains(&name.as_str()) {
                    out.push(name);
                }
            }
            Predicate::Terminal(_) => {}
        }
    }

    /// Longest path from the root to a terminal, counting every node.
    pub fn depth(&self) -> usize {
        match self {
            Predicate::And(l, r) | Predicate::Or(l, r) => 1 + l.depth().max(r.depth()),
            Predicate::Not(inner) => 1 + inner.depth(),
            Predicate::Terminal(_) => 1,
        }
    }
}

fn balanced(
    mut items: Vec<Predicate>,
    join: fn(Predicate, Predicate) -> Predicate,
) -> Option<Predicate> {
    while items.len() > 1 {
        let mut next = Vec::with_capacity(items.len().div_ceil(2));
        let mut iter = items.into_iter();
        while let Some(left) = iter.next() {
            next.push(match iter.next() {
                Some(right) => join(left, right),
                None => left,
            });
        }
        items = next;
    }
    items.pop()
}

impl From<Terminal> for Predicate {
    fn from(t: Terminal) -> Self {
        Predicate::Terminal(t)
    }
}

/// Canonical, fully parenthesised rendering in query syntax.
impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::And(l, r) => write!(f, "({} and {})", l, r),
            Predicate::Or(l, r) => write!(f, "({} or {})", l, r),
            Predicate::Not(inner) => write!(f, "(not {})", inner),
            Predicate::Terminal(t) => write!(f, "{}", t),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn role(r: &str) -> Predicate {
        Terminal::Role(r.into()).into()
    }

    fn tagged(t: &str) -> Predicate {
        Terminal::Tagged(t.into()).into()
    }

    #[test]
    fn display_is_fully_parenthesised() {
        let p = role("student").and(tagged("foo").not()).or(role("ta"));
        assert_eq!(
            p.to_string(),
            "((role:student and (not tagged:foo)) or role:ta)"
        );
    }

    #[test]
    fn any_pairs_operands_in_order() {
        let p = Predicate::any(vec![role("a"), role("b"), role("c")]).unwrap();
        assert_eq!(p, role("a").or(role("b")).or(role("c")));
        let p = Predicate::any(vec![role("a"), role("b"), role("c"), role("d")]).unwrap();
        assert_eq!(p, role("a").or(role("b")).or(role("c").or(role("d"))));
        assert_eq!(Predicate::any(vec![role("a")]), Some(role("a")));
        assert!(Predicate::any(Vec::new()).is_none());
    }

    #[test]
    fn all_pairs_operands_with_and() {
        let p = Predicate::all(vec![role("a"), tagged("b"), role("c")]).unwrap();
        assert_eq!(p.to_string(), "((role:a and tagged:b) and role:c)");
        assert!(Predicate::all(Vec::new()).is_none());
    }

    #[test]
    fn long_unions_stay_shallow() {
        let p = Predicate::any((0..5000).map(|id| Predicate::from(Terminal::UserId(id)))).unwrap();
        assert_eq!(p.depth(), 14);
        let ids: Vec<String> = (0..5000).map(|id| format!("id:{id}")).collect();
        let rendered = p.to_string().replace(['(', ')'], "");
        assert_eq!(rendered, ids.join(" or "));
    }

    #[test]
    fn tag_names_are_deduplicated_in_order() {
        let p = tagged("x")
            .and(tagged("y").not())
            .or(tagged("x").and(role("student")));
        assert_eq!(p.tag_names(), vec!["x", "y"]);
    }

    #[test]
    fn serializes_with_terminal_tags() {
        let p = Predicate::from(Terminal::UserId(7)).not();
        let json = serde_json::to_value(&p).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"not": {"terminal": {"terminal": "user_id", "value": 7}}})
        );
    }
}
