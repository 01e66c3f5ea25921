//! SQLite-backed [`LogStore`].
//!
//! Layout:
//!   daily_logs  — one row per execution record, soft-deleted via `deleted_at`
//!   deviations  — rows owned by a daily log, removed with it
//!
//! Timestamps are RFC 3339 text, dates are `YYYY-MM-DD`.

use crate::error::{ControlError, Result};
use crate::store::LogStore;
use crate::types::{Deviation, DeviationKind, ExecutionRecord, ExecutionStatus};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS daily_logs (
    id                       TEXT PRIMARY KEY,
    step_id                  TEXT NOT NULL,
    user_id                  TEXT NOT NULL,
    execution_date           TEXT NOT NULL,
    planned_start            TEXT,
    actual_start             TEXT,
    actual_end               TEXT,
    planned_duration_minutes REAL,
    status                   TEXT NOT NULL DEFAULT 'pending',
    quality_score            REAL,
    quality_notes            TEXT,
    created_at               TEXT NOT NULL,
    deleted_at               TEXT
);
CREATE INDEX IF NOT EXISTS idx_daily_logs_user_date ON daily_logs (user_id, execution_date);
CREATE TABLE IF NOT EXISTS deviations (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    daily_log_id   TEXT NOT NULL REFERENCES daily_logs (id) ON DELETE CASCADE,
    deviation_type TEXT NOT NULL,
    description    TEXT NOT NULL,
    impact_level   REAL,
    root_cause     TEXT
);
CREATE INDEX IF NOT EXISTS idx_deviations_log ON deviations (daily_log_id);
";

const SELECT_COLUMNS: &str = "id, step_id, user_id, execution_date, planned_start, actual_start, \
     actual_end, planned_duration_minutes, status, quality_score, quality_notes";

// ---------------------------------------------------------------------------
// Row decoding
// ---------------------------------------------------------------------------

struct RawRecord {
    id: String,
    step_id: String,
    user_id: String,
    execution_date: String,
    planned_start: Option<String>,
    actual_start: Option<String>,
    actual_end: Option<String>,
    planned_duration_minutes: Option<f64>,
    status: String,
    quality_score: Option<f64>,
    notes: Option<String>,
}

impl RawRecord {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            step_id: row.get(1)?,
            user_id: row.get(2)?,
            execution_date: row.get(3)?,
            planned_start: row.get(4)?,
            actual_start: row.get(5)?,
            actual_end: row.get(6)?,
            planned_duration_minutes: row.get(7)?,
            status: row.get(8)?,
            quality_score: row.get(9)?,
            notes: row.get(10)?,
        })
    }

    fn decode(self) -> Result<ExecutionRecord> {
        let id = self.id;
        let execution_date = NaiveDate::parse_from_str(&self.execution_date, "%Y-%m-%d")
            .map_err(|e| {
                ControlError::malformed(&id, format!("execution_date '{}': {e}", self.execution_date))
            })?;
        let status = ExecutionStatus::parse(&self.status)
            .ok_or_else(|| ControlError::malformed(&id, format!("unknown status '{}'", self.status)))?;
        Ok(ExecutionRecord {
            planned_start: parse_timestamp(&id, "planned_start", self.planned_start)?,
            actual_start: parse_timestamp(&id, "actual_start", self.actual_start)?,
            actual_end: parse_timestamp(&id, "actual_end", self.actual_end)?,
            planned_duration_minutes: self.planned_duration_minutes,
            quality_score: self.quality_score,
            notes: self.notes,
            deviations: Vec::new(),
            step_id: self.step_id,
            actor_id: self.user_id,
            execution_date,
            status,
            id,
        })
    }
}

fn parse_timestamp(id: &str, field: &str, raw: Option<String>) -> Result<Option<DateTime<Utc>>> {
    raw.map(|s| {
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| ControlError::malformed(id, format!("{field} '{s}': {e}")))
    })
    .transpose()
}

fn format_timestamp(ts: Option<DateTime<Utc>>) -> Option<String> {
    ts.map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true))
}

/// Enable foreign keys and create the tables if they do not exist.
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// SqliteLogStore
// ---------------------------------------------------------------------------

pub struct SqliteLogStore {
    conn: Mutex<Connection>,
}

impl SqliteLogStore {
    /// Open the database at `path` and ensure the schema exists.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| ControlError::DataAccess("sqlite connection lock poisoned".to_string()))
    }

    /// Insert a record and its deviations. Used for seeding and local tooling;
    /// the engine itself never writes.
    pub fn insert_record(&self, record: &ExecutionRecord) -> Result<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO daily_logs (id, step_id, user_id, execution_date, planned_start, \
             actual_start, actual_end, planned_duration_minutes, status, quality_score, \
             quality_notes, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                record.id,
                record.step_id,
                record.actor_id,
                record.execution_date.format("%Y-%m-%d").to_string(),
                format_timestamp(record.planned_start),
                format_timestamp(record.actual_start),
                format_timestamp(record.actual_end),
                record.planned_duration_minutes,
                record.status.as_str(),
                record.quality_score,
                record.notes,
                Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true),
            ],
        )?;
        for deviation in &record.deviations {
            tx.execute(
                "INSERT INTO deviations (daily_log_id, deviation_type, description, \
                 impact_level, root_cause) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    record.id,
                    deviation.kind.as_str(),
                    deviation.description,
                    deviation.impact_level,
                    deviation.root_cause,
                ],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Mark a record deleted. Returns false if no live record has this id.
    pub fn soft_delete(&self, id: &str) -> Result<bool> {
        let conn = self.lock()?;
        let changed = conn.execute(
            "UPDATE daily_logs SET deleted_at = ?2 WHERE id = ?1 AND deleted_at IS NULL",
            params![id, Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)],
        )?;
        Ok(changed > 0)
    }

    /// Permanently remove a record; its deviations go with it.
    pub fn purge(&self, id: &str) -> Result<bool> {
        let conn = self.lock()?;
        let changed = conn.execute("DELETE FROM daily_logs WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    }

    pub fn deviation_count(&self, id: &str) -> Result<usize> {
        let conn = self.lock()?;
        let count: Option<i64> = conn
            .query_row(
                "SELECT COUNT(*) FROM deviations WHERE daily_log_id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(count.unwrap_or(0) as usize)
    }

    fn query(&self, where_clause: &str, args: &[&dyn rusqlite::ToSql]) -> Result<Vec<ExecutionRecord>> {
        let conn = self.lock()?;
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM daily_logs WHERE deleted_at IS NULL AND {where_clause} \
             ORDER BY execution_date, created_at, rowid"
        );
        let mut stmt = conn.prepare(&sql)?;
        let raws = stmt
            .query_map(args, RawRecord::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut dev_stmt = conn.prepare(
            "SELECT deviation_type, description, impact_level, root_cause \
             FROM deviations WHERE daily_log_id = ?1 ORDER BY id",
        )?;
        let mut records = Vec::with_capacity(raws.len());
        for raw in raws {
            let mut record = raw.decode()?;
            let rows = dev_stmt
                .query_map(params![record.id], |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, Option<f64>>(2)?,
                        row.get::<_, Option<String>>(3)?,
                    ))
                })?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            for (kind, description, impact_level, root_cause) in rows {
                let kind = DeviationKind::parse(&kind).ok_or_else(|| {
                    ControlError::malformed(&record.id, format!("unknown deviation type '{kind}'"))
                })?;
                record.deviations.push(Deviation {
                    kind,
                    description,
                    impact_level,
                    root_cause,
                });
            }
            records.push(record);
        }
        Ok(records)
    }
}

impl LogStore for SqliteLogStore {
    fn fetch_records(&self, actor_id: &str, date: NaiveDate) -> Result<Vec<ExecutionRecord>> {
        let date = date.format("%Y-%m-%d").to_string();
        self.query(
            "user_id = ?1 AND execution_date = ?2",
            params![actor_id, date],
        )
    }

    fn fetch_records_range(
        &self,
        actor_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<ExecutionRecord>> {
        let start = start.format("%Y-%m-%d").to_string();
        let end = end.format("%Y-%m-%d").to_string();
        self.query(
            "user_id = ?1 AND execution_date >= ?2 AND execution_date <= ?3",
            params![actor_id, start, end],
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
