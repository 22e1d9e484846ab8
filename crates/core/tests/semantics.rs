//! Semantic equivalence checks for compiled queries.
//!
//! Two queries are considered equal when they select the same members of a
//! small roster that covers every combination of the attributes the queries
//! below touch.

use roster_core::{evaluate, parse_query, ParticipantView, Predicate, QueryError};

struct Member {
    id: i64,
    email: String,
    username: String,
    role: &'static str,
    status: &'static str,
    tags: Vec<&'static str>,
    /// (flow id, in progress)
    sessions: Vec<(&'static str, bool)>,
}

impl ParticipantView for Member {
    fn user_id(&self) -> i64 {
        self.id
    }
    fn email(&self) -> &str {
        &self.email
    }
    fn username(&self) -> &str {
        &self.username
    }
    fn has_role(&self, role: &str) -> bool {
        self.role == role
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

fn roster() -> Vec<Member> {
    let roles = ["student", "observer"];
    let statuses = ["active", "requested", "dropped"];
    let tag_sets: [&[&'static str]; 3] = [&[], &["foo"], &["foo", "bar"]];
    let session_sets: [&[(&'static str, bool)]; 3] =
        [&[], &[("quiz", true)], &[("quiz", true), ("quiz", false)]];

    let mut out = Vec::new();
    let mut id = 1;
    for role in roles {
        for status in statuses {
            for tags in tag_sets {
                for sessions in session_sets {
                    out.push(Member {
                        id,
                        email: format!("User{}@Example.com", id),
                        username: format!("user{:02}", id),
                        role,
                        status,
                        tags: tags.to_vec(),
                        sessions: sessions.to_vec(),
                    });
                    id += 1;
                }
            }
        }
    }
    out
}

fn selected(p: &Predicate, members: &[Member]) -> Vec<i64> {
    members
        .iter()
        .filter(|m| evaluate(p, *m))
        .map(|m| m.id)
        .collect()
}

fn assert_equivalent(a: &str, b: &str) {
    let members = roster();
    let pa = parse_query(a).unwrap();
    let pb = parse_query(b).unwrap();
    assert_eq!(
        selected(&pa, &members),
        selected(&pb, &members),
        "'{a}' and '{b}' select different members"
    );
}

const QUERIES: &[&str] = &[
    "role:student",
    "tagged:foo",
    "not tagged:bar",
    "status:active or status:requested",
    "has-started:quiz",
    "has-submitted:quiz",
    "role:observer tagged:foo",
];

#[test]
fn implicit_and_is_equivalent_to_explicit_and() {
    assert_equivalent("role:student tagged:foo", "role:student and tagged:foo");
    assert_equivalent(
        "status:active not has-submitted:quiz tagged:bar",
        "status:active and not has-submitted:quiz and tagged:bar",
    );
}

#[test]
fn and_binds_tighter_than_or() {
    assert_equivalent(
        "role:student and not status:active or tagged:foo",
        "(role:student and (not status:active)) or tagged:foo",
    );

    let members = roster();
    let grouped_right =
        parse_query("role:student and (not status:active or tagged:foo)").unwrap();
    let natural = parse_query("role:student and not status:active or tagged:foo").unwrap();
    assert_ne!(selected(&natural, &members), selected(&grouped_right, &members));
}

#[test]
fn parenthesised_terminal_equals_bare_terminal() {
    for q in QUERIES {
        assert_equivalent(&format!("({q})"), q);
    }
}

#[test]
fn double_negation_is_identity() {
    for q in ["has-started:quiz", "has-submitted:quiz", "tagged:foo", "role:student"] {
        assert_equivalent(&format!("not not {q}"), q);
    }
}

#[test]
fn negated_existence_selects_members_without_sessions() {
    let members = roster();
    let p = parse_query("not has-started:quiz").unwrap();
    for m in members.iter().filter(|m| evaluate(&p, *m)) {
        assert!(m.sessions.is_empty());
    }
    let p = parse_query("not has-submitted:quiz").unwrap();
    for m in members.iter().filter(|m| evaluate(&p, *m)) {
        assert!(m.sessions.iter().all(|(_, in_progress)| *in_progress));
    }
}

#[test]
fn union_of_lines_matches_or() {
    let members = roster();
    for a in QUERIES {
        for b in QUERIES {
            let union = parse_query(a).unwrap().or(parse_query(b).unwrap());
            let mut expected: Vec<i64> = selected(&parse_query(a).unwrap(), &members);
            for id in selected(&parse_query(b).unwrap(), &members) {
                if !expected.contains(&id) {
                    expected.push(id);
                }
            }
            expected.sort_unstable();
            assert_eq!(selected(&union, &members), expected, "{a} | {b}");
        }
    }
}

#[test]
fn email_match_ignores_case() {
    let members = roster();
    let p = parse_query("email:USER7@EXAMPLE.com").unwrap();
    assert_eq!(selected(&p, &members), vec![7]);
    let p = parse_query("email-contains:R1").unwrap();
    let mut expected = vec![1];
    expected.extend(10..=19);
    assert_eq!(selected(&p, &members), expected);
}

#[test]
fn malformed_queries_fail_instead_of_matching() {
    for text in ["", "(", "role:", "role:student role:student and", "( role:a ))"] {
        let err = parse_query(text).unwrap_err();
        assert!(
            matches!(err, QueryError::Parse { .. } | QueryError::Lex { .. }),
            "{text:?}"
        );
    }
}
