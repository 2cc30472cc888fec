//! Shared type definitions for the database layer.

use thiserror::Error;

pub use rusqlite::types::Value as SqlValue;

/// Errors specific to database operations.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Database connection error: {0}")]
    Connection(tokio_rusqlite::Error),

    #[error("Home directory not found")]
    HomeDirNotFound,

    #[error("Failed to create database directory: {0}")]
    CreateDir(std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Column not present in row: {0}")]
    MissingColumn(String),

    #[error("Column {column} is not {expected}")]
    ColumnType {
        column: String,
        expected: &'static str,
    },

    #[error("Schema migration failed: {0}")]
    Migration(String),
}

impl From<tokio_rusqlite::Error> for DbError {
    fn from(err: tokio_rusqlite::Error) -> Self {
        match err {
            tokio_rusqlite::Error::Rusqlite(inner) => DbError::Sqlite(inner),
            other => DbError::Connection(other),
        }
    }
}

impl DbError {
    /// True for the "column already exists" failure of an additive
    /// `ALTER TABLE ... ADD COLUMN`.
    pub fn is_duplicate_column(&self) -> bool {
        match self {
            DbError::Sqlite(rusqlite::Error::SqliteFailure(_, Some(msg))) => {
                msg.contains("duplicate column name")
            }
            other => other.to_string().contains("duplicate column name"),
        }
    }
}

/// One result row, addressed by column name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Vec<(String, SqlValue)>,
}

impl Row {
    pub fn new(columns: Vec<(String, SqlValue)>) -> Self {
        Self { columns }
    }

    pub fn value(&self, column: &str) -> Result<&SqlValue, DbError> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
            .ok_or_else(|| DbError::MissingColumn(column.to_string()))
    }

    pub fn text(&self, column: &str) -> Result<String, DbError> {
        match self.value(column)? {
            SqlValue::Text(s) => Ok(s.clone()),
            _ => Err(DbError::ColumnType {
                column: column.to_string(),
                expected: "TEXT",
            }),
        }
    }

    /// TEXT or NULL.
    pub fn opt_text(&self, column: &str) -> Result<Option<String>, DbError> {
        match self.value(column)? {
            SqlValue::Null => Ok(None),
            SqlValue::Text(s) => Ok(Some(s.clone())),
            _ => Err(DbError::ColumnType {
                column: column.to_string(),
                expected: "TEXT or NULL",
            }),
        }
    }

    pub fn integer(&self, column: &str) -> Result<i64, DbError> {
        match self.value(column)? {
            SqlValue::Integer(n) => Ok(*n),
            _ => Err(DbError::ColumnType {
                column: column.to_string(),
                expected: "INTEGER",
            }),
        }
    }
}
