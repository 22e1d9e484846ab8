//! SQLite-backed `ParticipantStore`.
//!
//! A snapshot is a SQLite transaction on the store's connection; dropping
//! it without `commit_snapshot` rolls back.

mod filter;

use std::collections::BTreeSet;
use std::path::Path;

use roster_core::Predicate;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row, Transaction};

use crate::error::StorageError;
use crate::record::{
    FlowSessionRecord, NewParticipant, ParticipantRecord, ParticipationStatus, TagRecord,
};
use crate::traits::ParticipantStore;

pub use filter::{translate, SqlFilter};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS participants (
        id INTEGER PRIMARY KEY,
        course TEXT NOT NULL,
        user_id INTEGER NOT NULL,
        email TEXT NOT NULL,
        username TEXT NOT NULL,
        institutional_id TEXT,
        status TEXT NOT NULL,
        UNIQUE (course, user_id)
    );
    CREATE TABLE IF NOT EXISTS participant_roles (
        participant_id INTEGER NOT NULL REFERENCES participants(id),
        role TEXT NOT NULL,
        PRIMARY KEY (participant_id, role)
    );
    CREATE TABLE IF NOT EXISTS tags (
        id INTEGER PRIMARY KEY,
        course TEXT NOT NULL,
        name TEXT NOT NULL,
        UNIQUE (course, name)
    );
    CREATE TABLE IF NOT EXISTS participant_tags (
        participant_id INTEGER NOT NULL REFERENCES participants(id),
        tag_id INTEGER NOT NULL REFERENCES tags(id),
        PRIMARY KEY (participant_id, tag_id)
    );
    CREATE TABLE IF NOT EXISTS flow_sessions (
        id INTEGER PRIMARY KEY,
        participant_id INTEGER NOT NULL REFERENCES participants(id),
        course TEXT NOT NULL,
        flow_id TEXT NOT NULL,
        in_progress INTEGER NOT NULL
    );";

const PARTICIPANT_COLUMNS: &str =
    "p.id, p.course, p.user_id, p.email, p.username, p.institutional_id, p.status";

#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (creating if needed) the database at `path` and ensure the schema.
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        let conn = Connection::open(path).map_err(|e| {
            StorageError::Backend(format!("failed to open '{}': {}", path.display(), e))
        })?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StorageError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA)?;
        Ok(SqliteStore { conn })
    }
}

fn read_participant_row(row: &Row<'_>) -> rusqlite::Result<(ParticipantRecord, String)> {
    let status: String = row.get(6)?;
    Ok((
        ParticipantRecord {
            id: row.get(0)?,
            course: row.get(1)?,
            user_id: row.get(2)?,
            email: row.get(3)?,
            username: row.get(4)?,
            institutional_id: row.get(5)?,
            status: ParticipationStatus::default(),
            roles: BTreeSet::new(),
            tags: BTreeSet::new(),
            flow_sessions: Vec::new(),
        },
        status,
    ))
}

/// Run a participant SELECT and hydrate roles, tags, and sessions.
fn load_participants(
    tx: &Transaction<'_>,
    sql: &str,
    params: Vec<rusqlite::types::Value>,
) -> Result<Vec<ParticipantRecord>, StorageError> {
    let mut stmt = tx.prepare(sql)?;
    let rows = stmt
        .query_map(params_from_iter(params), read_participant_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut out = Vec::with_capacity(rows.len());
    for (mut record, status) in rows {
        record.status = status.parse()?;
        hydrate(tx, &mut record)?;
        out.push(record);
    }
    Ok(out)
}

fn hydrate(tx: &Transaction<'_>, record: &mut ParticipantRecord) -> Result<(), StorageError> {
    let mut roles = tx.prepare_cached(
        "SELECT role FROM participant_roles WHERE participant_id = ?1 ORDER BY role",
    )?;
    record.roles = roles
        .query_map([record.id], |r| r.get::<_, String>(0))?
        .collect::<rusqlite::Result<_>>()?;

    let mut tags = tx.prepare_cached(
        "SELECT t.name FROM participant_tags pt JOIN tags t ON t.id = pt.tag_id \
         WHERE pt.participant_id = ?1 ORDER BY t.name",
    )?;
    record.tags = tags
        .query_map([record.id], |r| r.get::<_, String>(0))?
        .collect::<rusqlite::Result<_>>()?;

    let mut sessions = tx.prepare_cached(
        "SELECT flow_id, in_progress FROM flow_sessions \
         WHERE participant_id = ?1 AND course = ?2 ORDER BY id",
    )?;
    record.flow_sessions = sessions
        .query_map(params![record.id, record.course], |r| {
            Ok(FlowSessionRecord {
                flow_id: r.get(0)?,
                in_progress: r.get(1)?,
            })
        })?
        .collect::<rusqlite::Result<_>>()?;
    Ok(())
}

fn find_tag_in(tx: &Transaction<'_>, course: &str, name: &str) -> Result<Option<TagRecord>, StorageError> {
    Ok(tx
        .query_row(
            "SELECT id, course, name FROM tags WHERE course = ?1 AND name = ?2",
            params![course, name],
            |r| {
                Ok(TagRecord {
                    id: r.get(0)?,
                    course: r.get(1)?,
                    name: r.get(2)?,
                })
            },
        )
        .optional()?)
}

fn ensure_tag(tx: &Transaction<'_>, course: &str, name: &str) -> Result<(TagRecord, bool), StorageError> {
    if let Some(tag) = find_tag_in(tx, course, name)? {
        return Ok((tag, false));
    }
    tx.execute(
        "INSERT INTO tags (course, name) VALUES (?1, ?2)",
        params![course, name],
    )?;
    let tag = TagRecord {
        id: tx.last_insert_rowid(),
        course: course.to_owned(),
        name: name.to_owned(),
    };
    tracing::debug!(course, name, "created tag");
    Ok((tag, true))
}

fn participant_course(tx: &Transaction<'_>, participant_id: i64) -> Result<String, StorageError> {
    tx.query_row(
        "SELECT course FROM participants WHERE id = ?1",
        [participant_id],
        |r| r.get::<_, String>(0),
    )
    .optional()?
    .ok_or(StorageError::ParticipantNotFound { participant_id })
}

impl ParticipantStore for SqliteStore {
    type Snapshot<'a>
        = Transaction<'a>
    where
        Self: 'a;

    fn begin_snapshot(&self) -> Result<Transaction<'_>, StorageError> {
        Ok(self.conn.unchecked_transaction()?)
    }

    fn commit_snapshot<'a>(&'a self, snapshot: Transaction<'a>) -> Result<(), StorageError> {
        Ok(snapshot.commit()?)
    }

    fn abort_snapshot<'a>(&'a self, snapshot: Transaction<'a>) -> Result<(), StorageError> {
        Ok(snapshot.rollback()?)
    }

    fn insert_participant<'a>(
        &'a self,
        snapshot: &mut Transaction<'a>,
        participant: NewParticipant,
    ) -> Result<ParticipantRecord, StorageError> {
        let exists: Option<i64> = snapshot
            .query_row(
                "SELECT id FROM participants WHERE course = ?1 AND user_id = ?2",
                params![participant.course, participant.user_id],
                |r| r.get(0),
            )
            .optional()?;
        if exists.is_some() {
            return Err(StorageError::AlreadyEnrolled {
                course: participant.course,
                user_id: participant.user_id,
            });
        }

        snapshot.execute(
            "INSERT INTO participants (course, user_id, email, username, institutional_id, status) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                participant.course,
                participant.user_id,
                participant.email,
                participant.username,
                participant.institutional_id,
                participant.status.as_str(),
            ],
        )?;
        let id = snapshot.last_insert_rowid();

        for role in &participant.roles {
            snapshot.execute(
                "INSERT INTO participant_roles (participant_id, role) VALUES (?1, ?2)",
                params![id, role],
            )?;
        }
        for name in &participant.tags {
            let (tag, _) = ensure_tag(snapshot, &participant.course, name)?;
            snapshot.execute(
                "INSERT INTO participant_tags (participant_id, tag_id) VALUES (?1, ?2)",
                params![id, tag.id],
            )?;
        }
        for session in &participant.flow_sessions {
            snapshot.execute(
                "INSERT INTO flow_sessions (participant_id, course, flow_id, in_progress) \
                 VALUES (?1, ?2, ?3, ?4)",
                params![id, participant.course, session.flow_id, session.in_progress],
            )?;
        }

        Ok(ParticipantRecord {
            id,
            course: participant.course,
            user_id: participant.user_id,
            email: participant.email,
            username: participant.username,
            institutional_id: participant.institutional_id,
            status: participant.status,
            roles: participant.roles,
            tags: participant.tags,
            flow_sessions: participant.flow_sessions,
        })
    }

    fn list_participants<'a>(
        &'a self,
        snapshot: &mut Transaction<'a>,
        course: &str,
    ) -> Result<Vec<ParticipantRecord>, StorageError> {
        let sql = format!(
            "SELECT {} FROM participants p WHERE p.course = ? ORDER BY p.username, p.id",
            PARTICIPANT_COLUMNS
        );
        load_participants(snapshot, &sql, vec![course.to_owned().into()])
    }

    fn filter_participants<'a>(
        &'a self,
        snapshot: &mut Transaction<'a>,
        course: &str,
        predicate: &Predicate,
    ) -> Result<Vec<ParticipantRecord>, StorageError> {
        let filter = translate(predicate);
        let sql = format!(
            "SELECT {} FROM participants p WHERE p.course = ? AND {} ORDER BY p.username, p.id",
            PARTICIPANT_COLUMNS, filter.clause
        );
        tracing::trace!(%sql, "sqlite filter");

        let mut params: Vec<rusqlite::types::Value> = Vec::with_capacity(filter.params.len() + 1);
        params.push(course.to_owned().into());
        params.extend(filter.params);
        let matched = load_participants(snapshot, &sql, params)?;
        tracing::debug!(course, matched = matched.len(), "sqlite filter");
        Ok(matched)
    }

    fn set_status<'a>(
        &'a self,
        snapshot: &mut Transaction<'a>,
        participant_id: i64,
        status: ParticipationStatus,
    ) -> Result<(), StorageError> {
        let n = snapshot.execute(
            "UPDATE participants SET status = ?1 WHERE id = ?2",
            params![status.as_str(), participant_id],
        )?;
        if n == 0 {
            return Err(StorageError::ParticipantNotFound { participant_id });
        }
        Ok(())
    }

    fn get_or_create_tag<'a>(
        &'a self,
        snapshot: &mut Transaction<'a>,
        course: &str,
        name: &str,
    ) -> Result<(TagRecord, bool), StorageError> {
        ensure_tag(snapshot, course, name)
    }

    fn find_tag<'a>(
        &'a self,
        snapshot: &mut Transaction<'a>,
        course: &str,
        name: &str,
    ) -> Result<Option<TagRecord>, StorageError> {
        find_tag_in(snapshot, course, name)
    }

    fn list_tags<'a>(
        &'a self,
        snapshot: &mut Transaction<'a>,
        course: &str,
    ) -> Result<Vec<TagRecord>, StorageError> {
        let mut stmt =
            snapshot.prepare("SELECT id, course, name FROM tags WHERE course = ?1 ORDER BY name")?;
        let tags = stmt
            .query_map([course], |r| {
                Ok(TagRecord {
                    id: r.get(0)?,
                    course: r.get(1)?,
                    name: r.get(2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(tags)
    }

    fn add_tag<'a>(
        &'a self,
        snapshot: &mut Transaction<'a>,
        participant_id: i64,
        tag: &TagRecord,
    ) -> Result<bool, StorageError> {
        let course = participant_course(snapshot, participant_id)?;
        if course != tag.course {
            return Err(StorageError::Backend(format!(
                "tag {}/{} does not belong to course {}",
                tag.course, tag.name, course
            )));
        }
        let n = snapshot.execute(
            "INSERT OR IGNORE INTO participant_tags (participant_id, tag_id) VALUES (?1, ?2)",
            params![participant_id, tag.id],
        )?;
        Ok(n > 0)
    }

    fn remove_tag<'a>(
        &'a self,
        snapshot: &mut Transaction<'a>,
        participant_id: i64,
        tag: &TagRecord,
    ) -> Result<bool, StorageError> {
        participant_course(snapshot, participant_id)?;
        let n = snapshot.execute(
            "DELETE FROM participant_tags WHERE participant_id = ?1 AND tag_id = ?2",
            params![participant_id, tag.id],
        )?;
        Ok(n > 0)
    }
}
