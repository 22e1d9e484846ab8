use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use roster_core::ParticipantView;
use serde::{Deserialize, Serialize};

use crate::error::StorageError;

/// Lifecycle state of a participation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ParticipationStatus {
    #[default]
    Requested,
    Active,
    Dropped,
    Denied,
}

impl ParticipationStatus {
    pub const ALL: [ParticipationStatus; 4] = [
        ParticipationStatus::Requested,
        ParticipationStatus::Active,
        ParticipationStatus::Dropped,
        ParticipationStatus::Denied,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ParticipationStatus::Requested => "requested",
            ParticipationStatus::Active => "active",
            ParticipationStatus::Dropped => "dropped",
            ParticipationStatus::Denied => "denied",
        }
    }
}

impl fmt::Display for ParticipationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParticipationStatus {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ParticipationStatus::ALL
            .into_iter()
            .find(|st| st.as_str() == s)
            .ok_or_else(|| StorageError::InvalidValue(format!("unknown status '{}'", s)))
    }
}

/// A flow session belonging to a participant, in the participant's course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowSessionRecord {
    pub flow_id: String,
    pub in_progress: bool,
}

/// A tag, unique per `(course, name)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagRecord {
    pub id: i64,
    pub course: String,
    pub name: String,
}

/// One participation of a user in a course, with its tags and sessions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantRecord {
    /// Participation id (not the user id).
    pub id: i64,
    pub course: String,
    pub user_id: i64,
    pub email: String,
    pub username: String,
    pub institutional_id: Option<String>,
    pub status: ParticipationStatus,
    pub roles: BTreeSet<String>,
    /// Names of the course tags attached to this participation.
    pub tags: BTreeSet<String>,
    pub flow_sessions: Vec<FlowSessionRecord>,
}

/// Input for [`crate::ParticipantStore::insert_participant`].
///
/// Tags listed here are get-or-created in the participant's course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewParticipant {
    pub course: String,
    pub user_id: i64,
    pub email: String,
    pub username: String,
    #[serde(default)]
    pub institutional_id: Option<String>,
    #[serde(default)]
    pub status: ParticipationStatus,
    #[serde(default)]
    pub roles: BTreeSet<String>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub flow_sessions: Vec<FlowSessionRecord>,
}

impl NewParticipant {
    pub fn new(course: &str, user_id: i64, username: &str, email: &str) -> Self {
        NewParticipant {
            course: course.to_owned(),
            user_id,
            email: email.to_owned(),
            username: username.to_owned(),
            institutional_id: None,
            status: ParticipationStatus::default(),
            roles: BTreeSet::new(),
            tags: BTreeSet::new(),
            flow_sessions: Vec::new(),
        }
    }

    pub fn with_status(mut self, status: ParticipationStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_role(mut self, role: &str) -> Self {
        self.roles.insert(role.to_owned());
        self
    }

    pub fn with_tag(mut self, tag: &str) -> Self {
        self.tags.insert(tag.to_owned());
        self
    }

    pub fn with_session(mut self, flow_id: &str, in_progress: bool) -> Self {
        self.flow_sessions.push(FlowSessionRecord {
            flow_id: flow_id.to_owned(),
            in_progress,
        });
        self
    }
}

impl ParticipantView for ParticipantRecord {
    fn user_id(&self) -> i64 {
        self.user_id
    }

    fn email(&self) -> &str {
        &self.email
    }

    fn username(&self) -> &str {
        &self.username
    }

    fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }

    fn status(&self) -> &str {
        self.status.as_str()
    }

    fn has_tag(&self, name: &str) -> bool {
        self.tags.contains(name)
    }

    fn has_flow_session(&self, flow_id: &str, submitted_only: bool) -> bool {
        self.flow_sessions
            .iter()
            .any(|s| s.flow_id == flow_id && !(submitted_only && s.in_progress))
    }
}
