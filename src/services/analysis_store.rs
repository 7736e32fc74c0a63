use std::path::Path;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension};
use thiserror::Error;
use tracing::{debug, error, info};

use crate::models::{AnalysisResult, ColumnStat, StoredAnalysis};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS data_analysis (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    original_data TEXT NOT NULL,
    number_of_rows INTEGER NOT NULL,
    number_of_columns INTEGER NOT NULL,
    total_characters INTEGER NOT NULL,
    created_at TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS column_statistics (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    data_analysis_id INTEGER NOT NULL REFERENCES data_analysis(id) ON DELETE CASCADE,
    position INTEGER NOT NULL,
    column_name TEXT NOT NULL,
    null_count INTEGER NOT NULL,
    unique_count INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_column_statistics_analysis
    ON column_statistics (data_analysis_id, position);
";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Invalid stored data: {0}")]
    InvalidData(String),
}

/// SQLite-backed persistence for analysis results and the raw CSV they came from.
pub struct AnalysisStore {
    conn: Mutex<Connection>,
}

impl AnalysisStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        info!("Opening analysis store at {}", path.display());
        let conn = Connection::open(path).map_err(|e| {
            error!("Failed to open database {}: {}", path.display(), e);
            StoreError::Sqlite(e)
        })?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        debug!("Opening in-memory analysis store");
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Persists `result` and its column statistics atomically, returning the new id.
    pub fn save(&self, result: &AnalysisResult, original_data: &str) -> Result<i64, StoreError> {
        let mut conn = self.conn.lock();
        let tx = conn.transaction()?;

        tx.execute(
            "INSERT INTO data_analysis (original_data, number_of_rows, number_of_columns, total_characters, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                original_data,
                to_sql_count(result.number_of_rows)?,
                to_sql_count(result.number_of_columns)?,
                result.total_characters,
                result.created_at.to_rfc3339(),
            ],
        )?;
        let id = tx.last_insert_rowid();

        {
            let mut stmt = tx.prepare(
                "INSERT INTO column_statistics (data_analysis_id, position, column_name, null_count, unique_count)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for (position, stat) in result.column_statistics.iter().enumerate() {
                stmt.execute(params![
                    id,
                    to_sql_count(position)?,
                    stat.column_name,
                    to_sql_count(stat.null_count)?,
                    to_sql_count(stat.unique_count)?,
                ])?;
            }
        }

        tx.commit()?;
        debug!(
            "Stored analysis {} with {} column statistics",
            id,
            result.column_statistics.len()
        );
        Ok(id)
    }

    pub fn find_by_id(&self, id: i64) -> Result<Option<StoredAnalysis>, StoreError> {
        let conn = self.conn.lock();

        let row = conn
            .query_row(
                "SELECT original_data, number_of_rows, number_of_columns, total_characters, created_at
                 FROM data_analysis WHERE id = ?1",
                params![id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, i64>(1)?,
                        row.get::<_, i64>(2)?,
                        row.get::<_, i64>(3)?,
                        row.get::<_, String>(4)?,
                    ))
                },
            )
            .optional()?;

        let Some((original_data, rows, columns, total_characters, created_at)) = row else {
            return Ok(None);
        };

        let mut stmt = conn.prepare(
            "SELECT column_name, null_count, unique_count FROM column_statistics
             WHERE data_analysis_id = ?1 ORDER BY position",
        )?;
        let column_statistics = stmt
            .query_map(params![id], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, i64>(2)?,
                ))
            })?
            .map(|entry| -> Result<ColumnStat, StoreError> {
                let (column_name, null_count, unique_count) = entry?;
                Ok(ColumnStat {
                    column_name,
                    null_count: from_sql_count(null_count)?,
                    unique_count: from_sql_count(unique_count)?,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(StoredAnalysis {
            id,
            result: AnalysisResult {
                number_of_rows: from_sql_count(rows)?,
                number_of_columns: from_sql_count(columns)?,
                total_characters,
                column_statistics,
                created_at: parse_timestamp(&created_at)?,
            },
            original_data,
        }))
    }

    pub fn exists(&self, id: i64) -> Result<bool, StoreError> {
        let conn = self.conn.lock();
        let found = conn
            .query_row(
                "SELECT 1 FROM data_analysis WHERE id = ?1",
                params![id],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// Removes the analysis and, via cascade, its column statistics.
    /// Returns whether a row was deleted.
    pub fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let conn = self.conn.lock();
        let removed = conn.execute("DELETE FROM data_analysis WHERE id = ?1", params![id])?;
        debug!("Deleted analysis {} ({} rows affected)", id, removed);
        Ok(removed > 0)
    }
}

fn to_sql_count(value: usize) -> Result<i64, StoreError> {
    i64::try_from(value).map_err(|_| StoreError::InvalidData(format!("count {value} out of range")))
}

fn from_sql_count(value: i64) -> Result<usize, StoreError> {
    usize::try_from(value).map_err(|_| StoreError::InvalidData(format!("negative count {value}")))
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| StoreError::InvalidData(format!("bad timestamp {value:?}: {e}")))
}
