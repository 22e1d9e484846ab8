//! Snapshot conformance tests.
//!
//! Verifies that committed writes are visible and that aborted or dropped
//! snapshots leave no trace.

use super::{ensure, expect_names, seed, se, Check};
use crate::record::ParticipationStatus;
use crate::ParticipantStore;

pub(super) fn checks<S: ParticipantStore>() -> Vec<(&'static str, Check<S>)> {
    vec![
        ("committed_status_change_visible", committed_status_change_visible::<S>),
        ("aborted_status_change_discarded", aborted_status_change_discarded::<S>),
        ("dropped_snapshot_discarded", dropped_snapshot_discarded::<S>),
        ("writes_visible_inside_snapshot", writes_visible_inside_snapshot::<S>),
    ]
}

fn first_id<S: ParticipantStore>(store: &S, query: &str) -> Result<i64, String> {
    let predicate = roster_core::parse_query(query).map_err(|e| e.to_string())?;
    let mut snap = store.begin_snapshot().map_err(se)?;
    let matched = store
        .filter_participants(&mut snap, "cs101", &predicate)
        .map_err(se)?;
    store.abort_snapshot(snap).map_err(se)?;
    matched
        .first()
        .map(|p| p.id)
        .ok_or_else(|| format!("'{}' matched nobody", query))
}

fn committed_status_change_visible<S: ParticipantStore>(store: &S) -> Result<(), String> {
    seed(store)?;
    let ben = first_id(store, "username:ben")?;
    let mut snap = store.begin_snapshot().map_err(se)?;
    store
        .set_status(&mut snap, ben, ParticipationStatus::Dropped)
        .map_err(se)?;
    store.commit_snapshot(snap).map_err(se)?;
    expect_names(store, "status:requested", &[])?;
    expect_names(store, "status:dropped", &["ben"])
}

fn aborted_status_change_discarded<S: ParticipantStore>(store: &S) -> Result<(), String> {
    seed(store)?;
    let ben = first_id(store, "username:ben")?;
    let mut snap = store.begin_snapshot().map_err(se)?;
    store
        .set_status(&mut snap, ben, ParticipationStatus::Dropped)
        .map_err(se)?;
    store.get_or_create_tag(&mut snap, "cs101", "temp").map_err(se)?;
    store.abort_snapshot(snap).map_err(se)?;
    expect_names(store, "status:requested", &["ben"])?;

    let mut snap = store.begin_snapshot().map_err(se)?;
    let tag = store.find_tag(&mut snap, "cs101", "temp").map_err(se)?;
    ensure(tag.is_none(), || "aborted tag creation persisted".into())
}

fn dropped_snapshot_discarded<S: ParticipantStore>(store: &S) -> Result<(), String> {
    seed(store)?;
    let ann = first_id(store, "username:ann")?;
    {
        let mut snap = store.begin_snapshot().map_err(se)?;
        store
            .set_status(&mut snap, ann, ParticipationStatus::Denied)
            .map_err(se)?;
    }
    expect_names(store, "status:denied", &[])
}

fn writes_visible_inside_snapshot<S: ParticipantStore>(store: &S) -> Result<(), String> {
    seed(store)?;
    let cat = first_id(store, "username:cat")?;
    let predicate = roster_core::parse_query("status:dropped").map_err(|e| e.to_string())?;
    let mut snap = store.begin_snapshot().map_err(se)?;
    store
        .set_status(&mut snap, cat, ParticipationStatus::Dropped)
        .map_err(se)?;
    let seen = store
        .filter_participants(&mut snap, "cs101", &predicate)
        .map_err(se)?;
    ensure(seen.len() == 1 && seen[0].id == cat, || {
        format!("uncommitted write not visible in its own snapshot: {:?}", seen)
    })
}
