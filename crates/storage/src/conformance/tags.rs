//! Tag conformance tests.
//!
//! Verifies get-or-create semantics, per-course tag identity, and
//! attach/detach behaviour.

use super::{ensure, expect_names, seed, se, Check};
use crate::ParticipantStore;

pub(super) fn checks<S: ParticipantStore>() -> Vec<(&'static str, Check<S>)> {
    vec![
        ("get_or_create_is_idempotent", get_or_create_is_idempotent::<S>),
        ("tags_are_scoped_per_course", tags_are_scoped_per_course::<S>),
        ("find_tag_does_not_create", find_tag_does_not_create::<S>),
        ("add_and_remove_report_changes", add_and_remove_report_changes::<S>),
        ("seeded_tags_are_listed", seeded_tags_are_listed::<S>),
    ]
}

fn get_or_create_is_idempotent<S: ParticipantStore>(store: &S) -> Result<(), String> {
    let mut snap = store.begin_snapshot().map_err(se)?;
    let (first, created) = store.get_or_create_tag(&mut snap, "cs101", "late").map_err(se)?;
    ensure(created, || "first call must create".into())?;
    let (second, created) = store.get_or_create_tag(&mut snap, "cs101", "late").map_err(se)?;
    ensure(!created, || "second call must not create".into())?;
    ensure(first == second, || format!("{:?} != {:?}", first, second))?;
    store.commit_snapshot(snap).map_err(se)
}

fn tags_are_scoped_per_course<S: ParticipantStore>(store: &S) -> Result<(), String> {
    let mut snap = store.begin_snapshot().map_err(se)?;
    let (a, _) = store.get_or_create_tag(&mut snap, "cs101", "x").map_err(se)?;
    let (b, created) = store.get_or_create_tag(&mut snap, "cs102", "x").map_err(se)?;
    ensure(created && a.id != b.id, || {
        "same name in another course must be a distinct tag".into()
    })?;
    let listed = store.list_tags(&mut snap, "cs101").map_err(se)?;
    ensure(listed == vec![a], || format!("cs101 tags: {:?}", listed))
}

fn find_tag_does_not_create<S: ParticipantStore>(store: &S) -> Result<(), String> {
    let mut snap = store.begin_snapshot().map_err(se)?;
    let found = store.find_tag(&mut snap, "cs101", "ghost").map_err(se)?;
    ensure(found.is_none(), || "unexpected tag".into())?;
    let listed = store.list_tags(&mut snap, "cs101").map_err(se)?;
    ensure(listed.is_empty(), || format!("find_tag created {:?}", listed))
}

fn add_and_remove_report_changes<S: ParticipantStore>(store: &S) -> Result<(), String> {
    seed(store)?;
    let mut snap = store.begin_snapshot().map_err(se)?;
    let (tag, _) = store.get_or_create_tag(&mut snap, "cs101", "foo").map_err(se)?;
    let all = store.list_participants(&mut snap, "cs101").map_err(se)?;
    let ann = all.iter().find(|p| p.username == "ann").ok_or("ann missing")?;
    let ben = all.iter().find(|p| p.username == "ben").ok_or("ben missing")?;

    ensure(store.add_tag(&mut snap, ann.id, &tag).map_err(se)?, || {
        "adding a new tag must report true".into()
    })?;
    ensure(!store.add_tag(&mut snap, ann.id, &tag).map_err(se)?, || {
        "re-adding must report false".into()
    })?;
    ensure(store.remove_tag(&mut snap, ben.id, &tag).map_err(se)?, || {
        "removing a held tag must report true".into()
    })?;
    ensure(!store.remove_tag(&mut snap, ben.id, &tag).map_err(se)?, || {
        "removing an absent tag must report false".into()
    })?;
    store.commit_snapshot(snap).map_err(se)?;
    expect_names(store, "tagged:foo", &["ann", "cat"])
}

fn seeded_tags_are_listed<S: ParticipantStore>(store: &S) -> Result<(), String> {
    seed(store)?;
    let mut snap = store.begin_snapshot().map_err(se)?;
    let names: Vec<String> = store
        .list_tags(&mut snap, "cs101")
        .map_err(se)?
        .into_iter()
        .map(|t| t.name)
        .collect();
    ensure(names == ["foo"], || format!("cs101 tags: {:?}", names))
}
