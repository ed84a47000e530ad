//! `SQLite`-backed answer cache

use chrono::Utc;

use super::{DbConn, DbPool};
use crate::cache::{AnswerStore, CacheEntry};
use crate::{Error, Result};

/// Answer repository
#[derive(Clone)]
pub struct AnswerRepo {
    pool: DbPool,
}

impl AnswerRepo {
    /// Create a new answer repository
    #[must_use]
    #[allow(clippy::missing_const_for_fn)]
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> Result<DbConn> {
        self.pool.get().map_err(|e| Error::Database(e.to_string()))
    }
}

impl AnswerStore for AnswerRepo {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn()?;

        let value = conn.query_row("SELECT value FROM answers WHERE key = ?1", [key], |row| {
            row.get(0)
        });

        match value {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Error::Database(e.to_string())),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.conn()?;
        let now = Utc::now().to_rfc3339();

        conn.execute(
            "INSERT INTO answers (key, value, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?3)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at",
            rusqlite::params![key, value, now],
        )
        .map_err(|e| Error::Database(e.to_string()))?;

        tracing::debug!(key, "cached answer");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool> {
        let conn = self.conn()?;
        let deleted = conn
            .execute("DELETE FROM answers WHERE key = ?1", [key])
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(deleted > 0)
    }

    fn entries(&self) -> Result<Vec<CacheEntry>> {
        let conn = self.conn()?;

        let mut stmt = conn
            .prepare("SELECT key, value FROM answers ORDER BY key")
            .map_err(|e| Error::Database(e.to_string()))?;

        let entries = stmt
            .query_map([], |row| {
                Ok(CacheEntry {
                    key: row.get(0)?,
                    value: row.get(1)?,
                })
            })
            .map_err(|e| Error::Database(e.to_string()))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| Error::Database(e.to_string()))?;

        Ok(entries)
    }

    fn clear(&self) -> Result<usize> {
        let conn = self.conn()?;
        let deleted = conn
            .execute("DELETE FROM answers", [])
            .map_err(|e| Error::Database(e.to_string()))?;
        Ok(deleted)
    }
}
