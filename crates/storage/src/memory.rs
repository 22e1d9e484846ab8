//! In-process `ParticipantStore` backed by plain vectors.
//!
//! `begin_snapshot` clones the committed state; the snapshot mutates its
//! copy and `commit_snapshot` swaps it in. Dropping or aborting a snapshot
//! discards the copy.

use std::cell::RefCell;

use roster_core::{evaluate, Predicate};

use crate::error::StorageError;
use crate::record::{NewParticipant, ParticipantRecord, ParticipationStatus, TagRecord};
use crate::traits::ParticipantStore;

#[derive(Debug, Clone, Default)]
struct MemoryState {
    participants: Vec<ParticipantRecord>,
    tags: Vec<TagRecord>,
    next_participant_id: i64,
    next_tag_id: i64,
}

impl MemoryState {
    fn participant_mut(&mut self, id: i64) -> Result<&mut ParticipantRecord, StorageError> {
        self.participants
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(StorageError::ParticipantNotFound { participant_id: id })
    }

    fn tag(&self, course: &str, name: &str) -> Option<&TagRecord> {
        self.tags
            .iter()
            .find(|t| t.course == course && t.name == name)
    }

    fn ensure_tag(&mut self, course: &str, name: &str) -> (TagRecord, bool) {
        if let Some(tag) = self.tag(course, name) {
            return (tag.clone(), false);
        }
        self.next_tag_id += 1;
        let tag = TagRecord {
            id: self.next_tag_id,
            course: course.to_owned(),
            name: name.to_owned(),
        };
        self.tags.push(tag.clone());
        (tag, true)
    }

    fn course_participants(&self, course: &str) -> Vec<ParticipantRecord> {
        let mut out: Vec<ParticipantRecord> = self
            .participants
            .iter()
            .filter(|p| p.course == course)
            .cloned()
            .collect();
        out.sort_by(|a, b| a.username.cmp(&b.username).then(a.id.cmp(&b.id)));
        out
    }
}

/// Working copy of the store state for one transaction.
#[derive(Debug)]
pub struct MemorySnapshot {
    state: MemoryState,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RefCell<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store pre-populated with `participants` in one snapshot.
    pub fn with_participants<I>(participants: I) -> Result<Self, StorageError>
    where
        I: IntoIterator<Item = NewParticipant>,
    {
        let store = MemoryStore::new();
        let mut snap = store.begin_snapshot()?;
        for p in participants {
            store.insert_participant(&mut snap, p)?;
        }
        store.commit_snapshot(snap)?;
        Ok(store)
    }

    /// Number of committed participations, across all courses.
    pub fn participant_count(&self) -> usize {
        self.state.borrow().participants.len()
    }
}

impl ParticipantStore for MemoryStore {
    type Snapshot<'a>
        = MemorySnapshot
    where
        Self: 'a;

    fn begin_snapshot(&self) -> Result<MemorySnapshot, StorageError> {
        Ok(MemorySnapshot {
            state: self.state.borrow().clone(),
        })
    }

    fn commit_snapshot<'a>(&'a self, snapshot: MemorySnapshot) -> Result<(), StorageError> {
        *self.state.borrow_mut() = snapshot.state;
        Ok(())
    }

    fn abort_snapshot<'a>(&'a self, snapshot: MemorySnapshot) -> Result<(), StorageError> {
        drop(snapshot);
        Ok(())
    }

    fn insert_participant<'a>(
        &'a self,
        snapshot: &mut MemorySnapshot,
        participant: NewParticipant,
    ) -> Result<ParticipantRecord, StorageError> {
        let state = &mut snapshot.state;
        if state
            .participants
            .iter()
            .any(|p| p.course == participant.course && p.user_id == participant.user_id)
        {
            return Err(StorageError::AlreadyEnrolled {
                course: participant.course,
                user_id: participant.user_id,
            });
        }
        for name in &participant.tags {
            state.ensure_tag(&participant.course, name);
        }

        state.next_participant_id += 1;
        let record = ParticipantRecord {
            id: state.next_participant_id,
            course: participant.course,
            user_id: participant.user_id,
            email: participant.email,
            username: participant.username,
            institutional_id: participant.institutional_id,
            status: participant.status,
            roles: participant.roles,
            tags: participant.tags,
            flow_sessions: participant.flow_sessions,
        };
        state.participants.push(record.clone());
        Ok(record)
    }

    fn list_participants<'a>(
        &'a self,
        snapshot: &mut MemorySnapshot,
        course: &str,
    ) -> Result<Vec<ParticipantRecord>, StorageError> {
        Ok(snapshot.state.course_participants(course))
    }

    fn filter_participants<'a>(
        &'a self,
        snapshot: &mut MemorySnapshot,
        course: &str,
        predicate: &Predicate,
    ) -> Result<Vec<ParticipantRecord>, StorageError> {
        let mut matched = snapshot.state.course_participants(course);
        matched.retain(|p| evaluate(predicate, p));
        tracing::debug!(course, matched = matched.len(), "memory filter");
        Ok(matched)
    }

    fn set_status<'a>(
        &'a self,
        snapshot: &mut MemorySnapshot,
        participant_id: i64,
        status: ParticipationStatus,
    ) -> Result<(), StorageError> {
        snapshot.state.participant_mut(participant_id)?.status = status;
        Ok(())
    }

    fn get_or_create_tag<'a>(
        &'a self,
        snapshot: &mut MemorySnapshot,
        course: &str,
        name: &str,
    ) -> Result<(TagRecord, bool), StorageError> {
        Ok(snapshot.state.ensure_tag(course, name))
    }

    fn find_tag<'a>(
        &'a self,
        snapshot: &mut MemorySnapshot,
        course: &str,
        name: &str,
    ) -> Result<Option<TagRecord>, StorageError> {
        Ok(snapshot.state.tag(course, name).cloned())
    }

    fn list_tags<'a>(
        &'a self,
        snapshot: &mut MemorySnapshot,
        course: &str,
    ) -> Result<Vec<TagRecord>, StorageError> {
        let mut tags: Vec<TagRecord> = snapshot
            .state
            .tags
            .iter()
            .filter(|t| t.course == course)
            .cloned()
            .collect();
        tags.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(tags)
    }

    fn add_tag<'a>(
        &'a self,
        snapshot: &mut MemorySnapshot,
        participant_id: i64,
        tag: &TagRecord,
    ) -> Result<bool, StorageError> {
        let p = snapshot.state.participant_mut(participant_id)?;
        if p.course != tag.course {
            return Err(StorageError::Backend(format!(
                "tag {}/{} does not belong to course {}",
                tag.course, tag.name, p.course
            )));
        }
        Ok(p.tags.insert(tag.name.clone()))
    }

    fn remove_tag<'a>(
        &'a self,
        snapshot: &mut MemorySnapshot,
        participant_id: i64,
        tag: &TagRecord,
    ) -> Result<bool, StorageError> {
        let p = snapshot.state.participant_mut(participant_id)?;
        if p.course != tag.course {
            return Ok(false);
        }
        Ok(p.tags.remove(&tag.name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conformance::run_conformance_suite;

    #[test]
    fn memory_store_passes_conformance() {
        let report = run_conformance_suite(MemoryStore::new);
        assert!(report.failed == 0, "{report}");
    }

    #[test]
    fn uncommitted_snapshot_is_invisible() {
        let store = MemoryStore::new();
        let mut snap = store.begin_snapshot().unwrap();
        store
            .insert_participant(&mut snap, NewParticipant::new("c", 1, "u", "u@x"))
            .unwrap();
        assert_eq!(store.participant_count(), 0);
        store.commit_snapshot(snap).unwrap();
        assert_eq!(store.participant_count(), 1);
    }
}
