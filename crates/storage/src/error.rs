/// All errors that can be returned by a ParticipantStore implementation.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The user already holds a participation in the course.
    #[error("user {user_id} is already enrolled in course {course}")]
    AlreadyEnrolled { course: String, user_id: i64 },

    /// No participation with the given id.
    #[error("participant not found: {participant_id}")]
    ParticipantNotFound { participant_id: i64 },

    /// A stored value could not be decoded (e.g. an unknown status string).
    #[error("invalid stored value: {0}")]
    InvalidValue(String),

    /// A backend-specific storage error (DB connection, constraint, I/O, etc.).
    #[error("storage backend error: {0}")]
    Backend(String),
}

impl From<rusqlite::Error> for StorageError {
    fn from(e: rusqlite::Error) -> Self {
        StorageError::Backend(e.to_string())
    }
}
