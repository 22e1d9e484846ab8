//! Error-handling conformance tests.

use super::{ensure, seed, se, Check};
use crate::record::{NewParticipant, ParticipationStatus, TagRecord};
use crate::{ParticipantStore, StorageError};

pub(super) fn checks<S: ParticipantStore>() -> Vec<(&'static str, Check<S>)> {
    vec![
        ("duplicate_enrollment_rejected", duplicate_enrollment_rejected::<S>),
        ("same_user_other_course_allowed", same_user_other_course_allowed::<S>),
        ("set_status_on_missing_participant", set_status_on_missing_participant::<S>),
        ("add_tag_on_missing_participant", add_tag_on_missing_participant::<S>),
    ]
}

fn duplicate_enrollment_rejected<S: ParticipantStore>(store: &S) -> Result<(), String> {
    seed(store)?;
    let mut snap = store.begin_snapshot().map_err(se)?;
    match store.insert_participant(&mut snap, NewParticipant::new("cs101", 2, "ben2", "b2@x")) {
        Err(StorageError::AlreadyEnrolled { user_id: 2, .. }) => Ok(()),
        other => Err(format!("expected AlreadyEnrolled, got {:?}", other)),
    }
}

fn same_user_other_course_allowed<S: ParticipantStore>(store: &S) -> Result<(), String> {
    seed(store)?;
    let mut snap = store.begin_snapshot().map_err(se)?;
    let rec = store
        .insert_participant(&mut snap, NewParticipant::new("cs103", 2, "ben", "ben@example.com"))
        .map_err(se)?;
    ensure(rec.status == ParticipationStatus::Requested, || {
        format!("default status should be requested, got {}", rec.status)
    })
}

fn set_status_on_missing_participant<S: ParticipantStore>(store: &S) -> Result<(), String> {
    let mut snap = store.begin_snapshot().map_err(se)?;
    match store.set_status(&mut snap, 4242, ParticipationStatus::Dropped) {
        Err(StorageError::ParticipantNotFound { participant_id: 4242 }) => Ok(()),
        other => Err(format!("expected ParticipantNotFound, got {:?}", other)),
    }
}

fn add_tag_on_missing_participant<S: ParticipantStore>(store: &S) -> Result<(), String> {
    let mut snap = store.begin_snapshot().map_err(se)?;
    let (tag, _): (TagRecord, bool) = store
        .get_or_create_tag(&mut snap, "cs101", "t")
        .map_err(se)?;
    match store.add_tag(&mut snap, 4242, &tag) {
        Err(StorageError::ParticipantNotFound { .. }) => Ok(()),
        other => Err(format!("expected ParticipantNotFound, got {:?}", other)),
    }
}
