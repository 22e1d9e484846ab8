//! In-memory predicate evaluation against a single participant.

use crate::predicate::{Predicate, Terminal};

/// Read access to the attributes and relations a predicate can test.
///
/// Implemented by whatever record type a backend holds in memory. Tag and
/// flow-session lookups are already scoped to the evaluating course.
pub trait ParticipantView {
    fn user_id(&self) -> i64;
    fn email(&self) -> &str;
    fn username(&self) -> &str;
    fn has_role(&self, role: &str) -> bool;
    /// Lower-case status name (`requested`, `active`, `dropped`, `denied`).
    fn status(&self) -> &str;
    fn has_tag(&self, name: &str) -> bool;
    /// True if some flow session for `flow_id` exists; with `submitted_only`
    /// the session must also be out of progress.
    fn has_flow_session(&self, flow_id: &str, submitted_only: bool) -> bool;
}

/// Decide whether `participant` satisfies `predicate`.
pub fn evaluate<P>(predicate: &Predicate, participant: &P) -> bool
where
    P: ParticipantView + ?Sized,
{
    match predicate {
        Predicate::And(l, r) => evaluate(l, participant) && evaluate(r, participant),
        Predicate::Or(l, r) => evaluate(l, participant) || evaluate(r, participant),
        Predicate::Not(inner) => !evaluate(inner, participant),
        Predicate::Terminal(t) => evaluate_terminal(t, participant),
    }
}

fn evaluate_terminal<P>(terminal: &Terminal, p: &P) -> bool
where
    P: ParticipantView + ?Sized,
{
    match terminal {
        Terminal::UserId(id) => p.user_id() == *id,
        Terminal::EmailIs(s) => p.email().to_lowercase() == s.to_lowercase(),
        Terminal::EmailContains(s) => p.email().to_lowercase().contains(&s.to_lowercase()),
        Terminal::UsernameIs(s) => p.username() == s,
        Terminal::UsernameContains(s) => p.username().contains(s.as_str()),
        Terminal::Tagged(name) => p.has_tag(name),
        Terminal::Role(role) => p.has_role(role),
        Terminal::Status(status) => p.status() == status,
        Terminal::HasStarted(flow) => p.has_flow_session(flow, false),
        Terminal::HasSubmitted(flow) => p.has_flow_session(flow, true),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixture {
        id: i64,
        email: &'static str,
        username: &'static str,
        roles: Vec<&'static str>,
        status: &'static str,
        tags: Vec<&'static str>,
        sessions: Vec<(&'static str, bool)>,
    }

    impl ParticipantView for Fixture {
        fn user_id(&self) -> i64 {
            self.id
        }
        fn email(&self) -> &str {
            self.email
        }
        fn username(&self) -> &str {
            self.username
        }
        fn has_role(&self, role: &str) -> bool {
            self.roles.iter().any(|r| *r == role)
        }
        fn status(&self) -> &str {
            self.status
        }
        fn has_tag(&self, name: &str) -> bool {
            self.tags.iter().any(|t| *t == name)
        }
        fn has_flow_session(&self, flow_id: &str, submitted_only: bool) -> bool {
            self.sessions
                .iter()
                .any(|(f, in_progress)| *f == flow_id && !(submitted_only && *in_progress))
        }
    }

    fn alice() -> Fixture {
        Fixture {
            id: 3,
            email: "Alice@Example.com",
            username: "alice",
            roles: vec!["student"],
            status: "active",
            tags: vec!["section-a"],
            sessions: vec![("quiz1", true), ("quiz1", true), ("hw1", false)],
        }
    }

    fn t(term: Terminal) -> Predicate {
        Predicate::Terminal(term)
    }

    #[test]
    fn email_comparisons_ignore_case() {
        let a = alice();
        assert!(evaluate(&t(Terminal::EmailIs("alice@EXAMPLE.COM".into())), &a));
        assert!(evaluate(&t(Terminal::EmailContains("EXAMPLE".into())), &a));
        assert!(!evaluate(&t(Terminal::EmailIs("alice@example".into())), &a));
    }

    #[test]
    fn username_comparisons_are_case_sensitive() {
        let a = alice();
        assert!(evaluate(&t(Terminal::UsernameIs("alice".into())), &a));
        assert!(!evaluate(&t(Terminal::UsernameIs("Alice".into())), &a));
        assert!(evaluate(&t(Terminal::UsernameContains("lic".into())), &a));
        assert!(!evaluate(&t(Terminal::UsernameContains("LIC".into())), &a));
    }

    #[test]
    fn submitted_requires_a_finished_session() {
        let a = alice();
        assert!(evaluate(&t(Terminal::HasStarted("quiz1".into())), &a));
        assert!(!evaluate(&t(Terminal::HasSubmitted("quiz1".into())), &a));
        assert!(evaluate(&t(Terminal::HasSubmitted("hw1".into())), &a));
        assert!(!evaluate(&t(Terminal::HasStarted("hw2".into())), &a));
    }

    #[test]
    fn negation_applies_to_existence() {
        // Two in-progress sessions: "not has-started" must be false, not
        // "some session is not quiz1".
        let a = alice();
        let started = t(Terminal::HasStarted("quiz1".into()));
        assert!(!evaluate(&started.clone().not(), &a));
        assert!(evaluate(&started.not().not(), &a));
    }

    #[test]
    fn connectives_combine_terminals() {
        let a = alice();
        let p = t(Terminal::Role("student".into()))
            .and(t(Terminal::Status("dropped".into())).not())
            .or(t(Terminal::UserId(99)));
        assert!(evaluate(&p, &a));
        let q = t(Terminal::Tagged("section-b".into())).or(t(Terminal::UserId(3)));
        assert!(evaluate(&q, &a));
        assert!(!evaluate(&t(Terminal::Tagged("section-b".into())), &a));
    }
}
