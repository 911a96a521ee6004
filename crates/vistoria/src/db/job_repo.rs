//! Job repository: durable records of dispatched work in the `jobs` table.

use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DatabaseError};

/// Last error stored on jobs found unfinished after a restart.
pub const INTERRUPTED: &str = "interrupted";

/// A raw job row from the database.
#[derive(Debug, Clone)]
pub struct JobRow {
    pub id: String,
    pub kind: String,
    pub inspection_id: Option<i64>,
    pub payload: String,
    pub state: String,
    pub attempts: u32,
    pub last_error: Option<String>,
    pub result: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub finished_at: Option<String>,
}

impl JobRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            kind: row.get("kind")?,
            inspection_id: row.get("inspection_id")?,
            payload: row.get("payload")?,
            state: row.get("state")?,
            attempts: row.get("attempts")?,
            last_error: row.get("last_error")?,
            result: row.get("result")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
            finished_at: row.get("finished_at")?,
        })
    }
}

/// Query filter parameters for job listing.
#[derive(Debug, Default, Clone)]
pub struct JobFilter {
    pub state: Option<String>,
    pub kind: Option<String>,
    pub inspection_id: Option<i64>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

/// Inserts a new job row.
pub fn insert(db: &Database, job: &JobRow) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO jobs (id, kind, inspection_id, payload, state, attempts, last_error,
             result, created_at, updated_at, finished_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                job.id,
                job.kind,
                job.inspection_id,
                job.payload,
                job.state,
                job.attempts,
                job.last_error,
                job.result,
                job.created_at,
                job.updated_at,
                job.finished_at,
            ],
        )?;
        Ok(())
    })
}

/// Finds a job by its ID.
pub fn find_by_id(db: &Database, id: &str) -> Result<Option<JobRow>, DatabaseError> {
    db.with_conn(|conn| {
        let found = conn
            .query_row(
                "SELECT * FROM jobs WHERE id = ?1",
                params![id],
                JobRow::from_row,
            )
            .optional()?;
        Ok(found)
    })
}

/// Queries jobs with filters, returning (rows, total_count).
pub fn query(db: &Database, filter: &JobFilter) -> Result<(Vec<JobRow>, u64), DatabaseError> {
    db.with_conn(|conn| {
        let mut conditions = Vec::new();
        let mut param_values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

        if let Some(ref state) = filter.state {
            conditions.push(format!("state = ?{}", param_values.len() + 1));
            param_values.push(Box::new(state.clone()));
        }
        if let Some(ref kind) = filter.kind {
            conditions.push(format!("kind = ?{}", param_values.len() + 1));
            param_values.push(Box::new(kind.clone()));
        }
        if let Some(inspection_id) = filter.inspection_id {
            conditions.push(format!("inspection_id = ?{}", param_values.len() + 1));
            param_values.push(Box::new(inspection_id));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let count_sql = format!("SELECT COUNT(*) FROM jobs {}", where_clause);
        let params_ref: Vec<&dyn rusqlite::types::ToSql> =
            param_values.iter().map(|p| p.as_ref()).collect();
        let total: u64 = conn.query_row(&count_sql, params_ref.as_slice(), |r| r.get(0))?;

        let limit = filter.limit.unwrap_or(100) as i64;
        let offset = filter.offset.unwrap_or(0) as i64;
        param_values.push(Box::new(limit));
        param_values.push(Box::new(offset));
        let query_sql = format!(
            "SELECT * FROM jobs {} ORDER BY created_at DESC LIMIT ?{} OFFSET ?{}",
            where_clause,
            param_values.len() - 1,
            param_values.len()
        );

        let params_ref: Vec<&dyn rusqlite::types::ToSql> =
            param_values.iter().map(|p| p.as_ref()).collect();
        let mut stmt = conn.prepare(&query_sql)?;
        let rows: Vec<JobRow> = stmt
            .query_map(params_ref.as_slice(), JobRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok((rows, total))
    })
}

/// Counts jobs in the given state.
pub fn count_by_state(db: &Database, state: &str) -> Result<u64, DatabaseError> {
    db.with_conn(|conn| {
        let count: u64 = conn.query_row(
            "SELECT COUNT(*) FROM jobs WHERE state = ?1",
            params![state],
            |r| r.get(0),
        )?;
        Ok(count)
    })
}

/// Flags a job as picked up by a worker and counts the attempt.
pub fn mark_running(db: &Database, id: &str, updated_at: &str) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "UPDATE jobs SET state = 'running', attempts = attempts + 1, updated_at = ?2
             WHERE id = ?1",
            params![id, updated_at],
        )?;
        Ok(())
    })
}

/// Stores the terminal state and result payload of a job.
pub fn finish(
    db: &Database,
    id: &str,
    state: &str,
    last_error: Option<&str>,
    result: &str,
    finished_at: &str,
) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "UPDATE jobs SET state = ?2, last_error = ?3, result = ?4, updated_at = ?5,
             finished_at = ?5 WHERE id = ?1",
            params![id, state, last_error, result, finished_at],
        )?;
        Ok(())
    })
}

/// Puts a finished job back in the queue, clearing its previous outcome.
pub fn reset_for_redispatch(
    db: &Database,
    id: &str,
    updated_at: &str,
) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "UPDATE jobs SET state = 'pending', last_error = NULL, result = NULL,
             finished_at = NULL, updated_at = ?2 WHERE id = ?1",
            params![id, updated_at],
        )?;
        Ok(())
    })
}

/// Fails every job still `pending` or `running` that was created and last
/// touched before `cutoff`. A job redispatched after `cutoff` keeps its
/// state. Returns the number of jobs marked.
pub fn mark_interrupted(db: &Database, cutoff: &str, now: &str) -> Result<usize, DatabaseError> {
    db.with_conn(|conn| {
        let changed = conn.execute(
            "UPDATE jobs SET state = 'failed', last_error = ?2, updated_at = ?3, finished_at = ?3
             WHERE state IN ('pending', 'running') AND created_at < ?1 AND updated_at < ?1",
            params![cutoff, INTERRUPTED, now],
        )?;
        Ok(changed)
    })
}
