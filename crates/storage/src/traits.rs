use roster_core::Predicate;

use crate::error::StorageError;
use crate::record::{NewParticipant, ParticipantRecord, ParticipationStatus, TagRecord};

/// The storage trait for participant backends.
///
/// A `ParticipantStore` holds participations, their tags and flow sessions,
/// and the per-course tag table.
///
/// ## Snapshot Semantics
///
/// Every operation runs inside a `Snapshot`, a type representing an
/// in-progress transaction. The lifecycle is:
///
/// 1. `begin_snapshot()`: start a transaction, returns a `Snapshot`
/// 2. Call query and mutating methods with `&mut snapshot`
/// 3. `commit_snapshot(snapshot)`: commit and consume the transaction
///    OR `abort_snapshot(snapshot)`: roll back and consume the transaction
///
/// If a `Snapshot` is dropped without committing, the underlying transaction
/// MUST be rolled back. Concurrent snapshots are serialized by the backend;
/// the last commit wins.
///
/// ## Course Scoping
///
/// Tags and flow sessions are scoped to a course. `filter_participants`
/// only ever returns participations of the requested course, so `tagged:`
/// and `has-started:` terminals never see another course's records.
pub trait ParticipantStore {
    /// The snapshot (transaction) type used by this storage backend.
    type Snapshot<'a>
    where
        Self: 'a;

    // ── Snapshot lifecycle ────────────────────────────────────────────────────

    /// Begin a new snapshot (transaction).
    fn begin_snapshot(&self) -> Result<Self::Snapshot<'_>, StorageError>;

    /// Commit a snapshot, making all mutations durable.
    fn commit_snapshot<'a>(&'a self, snapshot: Self::Snapshot<'a>) -> Result<(), StorageError>;

    /// Abort (roll back) a snapshot, discarding all mutations.
    fn abort_snapshot<'a>(&'a self, snapshot: Self::Snapshot<'a>) -> Result<(), StorageError>;

    // ── Participants ──────────────────────────────────────────────────────────

    /// Insert a new participation.
    ///
    /// Returns `Err(StorageError::AlreadyEnrolled)` if the user already holds a
    /// participation in the course.
    fn insert_participant<'a>(
        &'a self,
        snapshot: &mut Self::Snapshot<'a>,
        participant: NewParticipant,
    ) -> Result<ParticipantRecord, StorageError>;

    /// All participations of a course, ordered by username.
    fn list_participants<'a>(
        &'a self,
        snapshot: &mut Self::Snapshot<'a>,
        course: &str,
    ) -> Result<Vec<ParticipantRecord>, StorageError>;

    /// Participations of a course satisfying `predicate`, ordered by username.
    fn filter_participants<'a>(
        &'a self,
        snapshot: &mut Self::Snapshot<'a>,
        course: &str,
        predicate: &Predicate,
    ) -> Result<Vec<ParticipantRecord>, StorageError>;

    /// Set the status of a participation.
    ///
    /// Returns `Err(StorageError::ParticipantNotFound)` if it does not exist.
    fn set_status<'a>(
        &'a self,
        snapshot: &mut Self::Snapshot<'a>,
        participant_id: i64,
        status: ParticipationStatus,
    ) -> Result<(), StorageError>;

    // ── Tags ──────────────────────────────────────────────────────────────────

    /// Return the tag `(course, name)`, creating it if absent.
    ///
    /// The boolean is `true` when the tag was created by this call.
    fn get_or_create_tag<'a>(
        &'a self,
        snapshot: &mut Self::Snapshot<'a>,
        course: &str,
        name: &str,
    ) -> Result<(TagRecord, bool), StorageError>;

    /// Look up the tag `(course, name)` without creating it.
    fn find_tag<'a>(
        &'a self,
        snapshot: &mut Self::Snapshot<'a>,
        course: &str,
        name: &str,
    ) -> Result<Option<TagRecord>, StorageError>;

    /// All tags of a course, ordered by name.
    fn list_tags<'a>(
        &'a self,
        snapshot: &mut Self::Snapshot<'a>,
        course: &str,
    ) -> Result<Vec<TagRecord>, StorageError>;

    /// Attach `tag` to a participation. Returns `false` if it was already attached.
    fn add_tag<'a>(
        &'a self,
        snapshot: &mut Self::Snapshot<'a>,
        participant_id: i64,
        tag: &TagRecord,
    ) -> Result<bool, StorageError>;

    /// Detach `tag` from a participation. Returns `false` if it was not attached.
    fn remove_tag<'a>(
        &'a self,
        snapshot: &mut Self::Snapshot<'a>,
        participant_id: i64,
        tag: &TagRecord,
    ) -> Result<bool, StorageError>;
}
