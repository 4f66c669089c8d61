// SPDX-License-Identifier: Apache-2.0

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use campus_checkin_model::{
    AttendanceCounts, EventId, EventRecord, EventStatus, Profile, Registration, RegistrationId,
    RegistrationStatus, Role, StudentId, UserId,
};
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use tracing::{debug, instrument};

use crate::error::{StoreError, StoreErrorCode};
use crate::ledger::{CampusDirectory, RegistrationLedger};

pub const SCHEMA_VERSION: i64 = 1;
const BUSY_TIMEOUT_MS: u64 = 5_000;

const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS events (
  id TEXT PRIMARY KEY,
  title TEXT NOT NULL,
  venue TEXT NOT NULL,
  starts_at TEXT NOT NULL,
  status TEXT NOT NULL CHECK (status IN ('open', 'closed'))
);
CREATE TABLE IF NOT EXISTS profiles (
  id TEXT PRIMARY KEY,
  full_name TEXT NOT NULL,
  college_code TEXT,
  role TEXT NOT NULL CHECK (role IN ('student', 'club_admin', 'college_admin'))
);
CREATE TABLE IF NOT EXISTS event_registrations (
  id TEXT PRIMARY KEY,
  event_id TEXT NOT NULL,
  student_id TEXT NOT NULL,
  status TEXT NOT NULL CHECK (status IN ('registered', 'attended')),
  registered_at TEXT NOT NULL,
  attended_at TEXT,
  UNIQUE (event_id, student_id)
);
CREATE INDEX IF NOT EXISTS idx_event_registrations_student ON event_registrations(student_id);
PRAGMA user_version = 1;
";

const REGISTRATION_COLUMNS: &str =
    "id, event_id, student_id, status, registered_at, attended_at";

/// Ledger and directory over a single sqlite file.
///
/// Calls run on the blocking pool; the connection is serialized behind a
/// mutex and the attendance transition relies on the guarded `UPDATE`.
#[derive(Clone)]
pub struct SqliteLedger {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteLedger {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                StoreError::disconnected(format!("create {}: {e}", parent.display()))
            })?;
        }
        let conn = Connection::open(path).map_err(sqlite_error)?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(sqlite_error)?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.busy_timeout(Duration::from_millis(BUSY_TIMEOUT_MS))
            .map_err(sqlite_error)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")
            .map_err(sqlite_error)?;
        conn.execute_batch(SCHEMA_SQL).map_err(sqlite_error)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub async fn schema_version(&self) -> Result<i64, StoreError> {
        self.with_conn(|conn| {
            conn.query_row("PRAGMA user_version", [], |row| row.get(0))
                .map_err(sqlite_error)
        })
        .await
    }

    pub async fn put_event(&self, event: &EventRecord) -> Result<(), StoreError> {
        let event = event.clone();
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO events (id, title, venue, starts_at, status) VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(id) DO UPDATE SET title = excluded.title, venue = excluded.venue,
                   starts_at = excluded.starts_at, status = excluded.status",
                params![
                    event.id.as_str(),
                    event.title,
                    event.venue,
                    format_ts(&event.starts_at),
                    event.status.as_str(),
                ],
            )
            .map_err(sqlite_error)?;
            Ok(())
        })
        .await
    }

    pub async fn put_profile(&self, profile: &Profile) -> Result<(), StoreError> {
        let profile = profile.clone();
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT INTO profiles (id, full_name, college_code, role) VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(id) DO UPDATE SET full_name = excluded.full_name,
                   college_code = excluded.college_code, role = excluded.role",
                params![
                    profile.id.as_str(),
                    profile.full_name,
                    profile.college_code,
                    profile.role.as_str(),
                ],
            )
            .map_err(sqlite_error)?;
            Ok(())
        })
        .await
    }

    async fn with_conn<T, F>(&self, op: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, StoreError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn
                .lock()
                .map_err(|_| StoreError::internal("sqlite connection mutex poisoned"))?;
            op(&*guard)
        })
        .await
        .map_err(|e| StoreError::internal(format!("sqlite task failed: {e}")))?
    }

    async fn query_registrations(
        &self,
        filter_column: &'static str,
        value: String,
    ) -> Result<Vec<Registration>, StoreError> {
        self.with_conn(move |conn| {
            let sql = format!(
                "SELECT {REGISTRATION_COLUMNS} FROM event_registrations WHERE {filter_column} = ?1 ORDER BY registered_at, id"
            );
            let mut stmt = conn.prepare(&sql).map_err(sqlite_error)?;
            let rows = stmt
                .query_map(params![value], RawRegistration::read)
                .map_err(sqlite_error)?;
            let mut out = Vec::new();
            for row in rows {
                out.push(row.map_err(sqlite_error)?.into_registration()?);
            }
            Ok(out)
        })
        .await
    }
}

#[async_trait]
impl RegistrationLedger for SqliteLedger {
    fn backend_tag(&self) -> &'static str {
        "sqlite"
    }

    #[instrument(level = "debug", skip(self))]
    async fn create_registration(
        &self,
        event_id: &EventId,
        student_id: &StudentId,
        registered_at: DateTime<Utc>,
    ) -> Result<Registration, StoreError> {
        let registration =
            Registration::new(event_id.clone(), student_id.clone(), registered_at.trunc_subsecs(3));
        let row = registration.clone();
        self.with_conn(move |conn| {
            let inserted = conn.execute(
                "INSERT INTO event_registrations (id, event_id, student_id, status, registered_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    row.id.as_str(),
                    row.event_id.as_str(),
                    row.student_id.as_str(),
                    row.status.as_str(),
                    format_ts(&row.registered_at),
                ],
            );
            match inserted {
                Ok(_) => Ok(()),
                Err(rusqlite::Error::SqliteFailure(err, _))
                    if err.code == ErrorCode::ConstraintViolation =>
                {
                    Err(StoreError::new(
                        StoreErrorCode::Duplicate,
                        format!(
                            "registration already exists for event {} and student {}",
                            row.event_id, row.student_id
                        ),
                    ))
                }
                Err(e) => Err(sqlite_error(e)),
            }
        })
        .await?;
        Ok(registration)
    }

    async fn get_registration(
        &self,
        event_id: &EventId,
        student_id: &StudentId,
    ) -> Result<Option<Registration>, StoreError> {
        let event = event_id.as_str().to_string();
        let student = student_id.as_str().to_string();
        self.with_conn(move |conn| {
            let sql = format!(
                "SELECT {REGISTRATION_COLUMNS} FROM event_registrations WHERE event_id = ?1 AND student_id = ?2"
            );
            conn.query_row(&sql, params![event, student], RawRegistration::read)
                .optional()
                .map_err(sqlite_error)?
                .map(RawRegistration::into_registration)
                .transpose()
        })
        .await
    }

    #[instrument(level = "debug", skip(self))]
    async fn mark_attended(
        &self,
        id: &RegistrationId,
        attended_at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let id = id.as_str().to_string();
        let at = format_ts(&attended_at.trunc_subsecs(3));
        let applied = self
            .with_conn(move |conn| {
                conn.execute(
                    "UPDATE event_registrations SET status = 'attended', attended_at = ?2
                     WHERE id = ?1 AND status = 'registered'",
                    params![id, at],
                )
                .map_err(sqlite_error)
            })
            .await?
            == 1;
        debug!(applied, "conditional attendance update");
        Ok(applied)
    }

    async fn list_for_student(
        &self,
        student_id: &StudentId,
    ) -> Result<Vec<Registration>, StoreError> {
        self.query_registrations("student_id", student_id.as_str().to_string())
            .await
    }

    async fn list_for_event(&self, event_id: &EventId) -> Result<Vec<Registration>, StoreError> {
        self.query_registrations("event_id", event_id.as_str().to_string())
            .await
    }

    async fn attendance_counts(&self, event_id: &EventId) -> Result<AttendanceCounts, StoreError> {
        let event = event_id.as_str().to_string();
        self.with_conn(move |conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT status, COUNT(*) FROM event_registrations WHERE event_id = ?1 GROUP BY status",
                )
                .map_err(sqlite_error)?;
            let rows = stmt
                .query_map(params![event], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
                })
                .map_err(sqlite_error)?;
            let mut counts = AttendanceCounts::default();
            for row in rows {
                let (status, n) = row.map_err(sqlite_error)?;
                let n = u64::try_from(n).unwrap_or(0);
                match RegistrationStatus::parse(&status).map_err(corrupt)? {
                    RegistrationStatus::Registered => counts.registered = n,
                    RegistrationStatus::Attended => counts.attended = n,
                }
            }
            Ok(counts)
        })
        .await
    }

    async fn probe(&self) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
                .map_err(sqlite_error)?;
            Ok(())
        })
        .await
    }
}

#[async_trait]
impl CampusDirectory for SqliteLedger {
    async fn event(&self, id: &EventId) -> Result<Option<EventRecord>, StoreError> {
        let id = id.as_str().to_string();
        self.with_conn(move |conn| {
            let raw = conn
                .query_row(
                    "SELECT id, title, venue, starts_at, status FROM events WHERE id = ?1",
                    params![id],
                    |row| {
                        Ok((
                            row.get::<_, String>(0)?,
                            row.get::<_, String>(1)?,
                            row.get::<_, String>(2)?,
                            row.get::<_, String>(3)?,
                            row.get::<_, String>(4)?,
                        ))
                    },
                )
                .optional()
                .map_err(sqlite_error)?;
            let Some((id, title, venue, starts_at, status)) = raw else {
                return Ok(None);
            };
            Ok(Some(EventRecord {
                id: EventId::parse(&id).map_err(corrupt)?,
                title,
                venue,
                starts_at: parse_ts(&starts_at)?,
                status: EventStatus::parse(&status).map_err(corrupt)?,
            }))
        })
        .await
    }

    async fn profile(&self, id: &UserId) -> Result<Option<Profile>, StoreError> {
        let id = id.as_str().to_string();
        self.with_conn(move |conn| {
            let raw = conn
                .query_row(
                    "SELECT id, full_name, college_code, role FROM profiles WHERE id = ?1",
                    params![id],
                    |row| {
                        Ok((
                            row.get::<_, String>(0)?,
                            row.get::<_, String>(1)?,
                            row.get::<_, Option<String>>(2)?,
                            row.get::<_, String>(3)?,
                        ))
                    },
                )
                .optional()
                .map_err(sqlite_error)?;
            let Some((id, full_name, college_code, role)) = raw else {
                return Ok(None);
            };
            Ok(Some(Profile {
                id: UserId::parse(&id).map_err(corrupt)?,
                full_name,
                college_code,
                role: Role::parse(&role).map_err(corrupt)?,
            }))
        })
        .await
    }
}

struct RawRegistration {
    id: String,
    event_id: String,
    student_id: String,
    status: String,
    registered_at: String,
    attended_at: Option<String>,
}

impl RawRegistration {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            event_id: row.get(1)?,
            student_id: row.get(2)?,
            status: row.get(3)?,
            registered_at: row.get(4)?,
            attended_at: row.get(5)?,
        })
    }

    fn into_registration(self) -> Result<Registration, StoreError> {
        Ok(Registration {
            id: RegistrationId::parse(&self.id).map_err(corrupt)?,
            event_id: EventId::parse(&self.event_id).map_err(corrupt)?,
            student_id: UserId::parse(&self.student_id).map_err(corrupt)?,
            status: RegistrationStatus::parse(&self.status).map_err(corrupt)?,
            registered_at: parse_ts(&self.registered_at)?,
            attended_at: self.attended_at.as_deref().map(parse_ts).transpose()?,
        })
    }
}

fn format_ts(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_ts(raw: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| corrupt(format!("timestamp {raw}: {e}")))
}

fn corrupt(e: impl std::fmt::Display) -> StoreError {
    StoreError::internal(format!("corrupt row: {e}"))
}

pub(crate) fn sqlite_error(e: rusqlite::Error) -> StoreError {
    let code = match &e {
        rusqlite::Error::SqliteFailure(err, _) => match err.code {
            ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked => StoreErrorCode::Unavailable,
            ErrorCode::CannotOpen
            | ErrorCode::NotADatabase
            | ErrorCode::SystemIoFailure
            | ErrorCode::PermissionDenied
            | ErrorCode::DatabaseCorrupt => StoreErrorCode::Disconnected,
            ErrorCode::ConstraintViolation => StoreErrorCode::Validation,
            _ => StoreErrorCode::Internal,
        },
        _ => StoreErrorCode::Internal,
    };
    StoreError::new(code, e.to_string())
}
