//! Participant storage for roster queries.
//!
//! [`ParticipantStore`] is the seam between the query executor and a
//! backend. Two backends ship here: [`MemoryStore`] for tests and embedding,
//! and [`SqliteStore`] for on-disk rosters. Both are checked by
//! [`conformance::run_conformance_suite`].

pub mod conformance;
mod error;
mod memory;
mod record;
pub mod sqlite;
mod traits;

pub use error::StorageError;
pub use memory::{MemorySnapshot, MemoryStore};
pub use record::{
    FlowSessionRecord, NewParticipant, ParticipantRecord, ParticipationStatus, TagRecord,
};
pub use sqlite::SqliteStore;
pub use traits::ParticipantStore;
