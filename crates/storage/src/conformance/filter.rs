//! Filtering conformance tests.
//!
//! Verifies terminal semantics, connectives, course scoping, and ordering
//! against the roster built by `seed`.

use super::{ensure, expect_names, seed, se, Check};
use crate::ParticipantStore;

pub(super) fn checks<S: ParticipantStore>() -> Vec<(&'static str, Check<S>)> {
    vec![
        ("conjunction_of_role_and_status", conjunction_of_role_and_status::<S>),
        ("tagged_selects_tag_holders", tagged_selects_tag_holders::<S>),
        ("disjunction_unions_matches", disjunction_unions_matches::<S>),
        ("negation_is_complement_within_course", negation_is_complement_within_course::<S>),
        ("email_matching_ignores_case", email_matching_ignores_case::<S>),
        ("username_matching_is_exact", username_matching_is_exact::<S>),
        ("user_id_matches_owning_user", user_id_matches_owning_user::<S>),
        ("flow_session_existence", flow_session_existence::<S>),
        ("unknown_tag_matches_nobody", unknown_tag_matches_nobody::<S>),
        ("results_ordered_by_username", results_ordered_by_username::<S>),
    ]
}

fn conjunction_of_role_and_status<S: ParticipantStore>(store: &S) -> Result<(), String> {
    seed(store)?;
    expect_names(store, "role:student and status:active", &["ann"])?;
    expect_names(store, "role:student status:active", &["ann"])
}

fn tagged_selects_tag_holders<S: ParticipantStore>(store: &S) -> Result<(), String> {
    seed(store)?;
    // cs102's ann also carries `foo`; it must not leak into cs101.
    expect_names(store, "tagged:foo", &["ben", "cat"])
}

fn disjunction_unions_matches<S: ParticipantStore>(store: &S) -> Result<(), String> {
    seed(store)?;
    expect_names(store, "role:student or tagged:foo", &["ann", "ben", "cat"])?;
    expect_names(store, "status:requested or role:observer", &["ben", "cat"])
}

fn negation_is_complement_within_course<S: ParticipantStore>(store: &S) -> Result<(), String> {
    seed(store)?;
    expect_names(store, "not tagged:foo", &["ann"])?;
    expect_names(store, "not not tagged:foo", &["ben", "cat"])?;
    expect_names(store, "not (role:student or tagged:foo)", &[])
}

fn email_matching_ignores_case<S: ParticipantStore>(store: &S) -> Result<(), String> {
    seed(store)?;
    expect_names(store, "email:ANN@example.COM", &["ann"])?;
    expect_names(store, "email-contains:EXAMPLE.com", &["ann", "ben"])?;
    expect_names(store, "email:ann@example", &[])
}

fn username_matching_is_exact<S: ParticipantStore>(store: &S) -> Result<(), String> {
    seed(store)?;
    expect_names(store, "username:ben", &["ben"])?;
    expect_names(store, "username:Ben", &[])?;
    expect_names(store, "username-contains:a", &["ann", "cat"])?;
    expect_names(store, "username-contains:A", &[])
}

fn user_id_matches_owning_user<S: ParticipantStore>(store: &S) -> Result<(), String> {
    seed(store)?;
    expect_names(store, "id:3", &["cat"])?;
    expect_names(store, "id:3 or id:1", &["ann", "cat"])?;
    expect_names(store, "id:4", &[])
}

fn flow_session_existence<S: ParticipantStore>(store: &S) -> Result<(), String> {
    seed(store)?;
    expect_names(store, "has-started:quiz", &["ann", "ben"])?;
    expect_names(store, "has-submitted:quiz", &["ben"])?;
    expect_names(store, "has-started:quiz not has-submitted:quiz", &["ann"])?;
    expect_names(store, "not has-started:quiz", &["cat"])?;
    expect_names(store, "has-started:exam", &[])
}

fn unknown_tag_matches_nobody<S: ParticipantStore>(store: &S) -> Result<(), String> {
    seed(store)?;
    expect_names(store, "tagged:never-made", &[])?;
    expect_names(store, "not tagged:never-made", &["ann", "ben", "cat"])
}

fn results_ordered_by_username<S: ParticipantStore>(store: &S) -> Result<(), String> {
    seed(store)?;
    let mut snap = store.begin_snapshot().map_err(se)?;
    let all = store.list_participants(&mut snap, "cs101").map_err(se)?;
    let names: Vec<&str> = all.iter().map(|p| p.username.as_str()).collect();
    ensure(names == ["ann", "ben", "cat"], || {
        format!("list order: {:?}", names)
    })?;
    let first = all.first().ok_or("empty roster")?;
    ensure(
        first.roles.contains("student") && first.flow_sessions.len() == 1,
        || format!("ann not fully loaded: {:?}", first),
    )
}
