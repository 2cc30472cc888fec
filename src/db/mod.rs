//! SQLite-backed durable store for notes and templates.
//!
//! The database lives at `~/.chartnote/chartnote.db` unless the config points
//! elsewhere. Everything above this module talks to the [`StoreHandle`]
//! trait, never to a connection directly: the handle is created once at
//! startup and injected into the migration runner and both entity stores.
//!
//! The connection itself is opened lazily on first use and memoized, so
//! constructing a [`SqliteStore`] is free and cannot fail.

use std::path::PathBuf;

use async_trait::async_trait;
use rusqlite::params_from_iter;
use tokio::sync::OnceCell;

pub mod notes;
pub mod templates;
pub mod types;
pub use types::*;

/// Parameterized statement execution against the durable store.
///
/// Positional parameters bind to `?1`, `?2`, ... in order.
#[async_trait]
pub trait StoreHandle: Send + Sync {
    /// Run one statement; returns the number of rows changed.
    async fn execute(&self, sql: &str, params: Vec<SqlValue>) -> Result<usize, DbError>;

    /// Run one query and return every row.
    async fn select(&self, sql: &str, params: Vec<SqlValue>) -> Result<Vec<Row>, DbError>;
}

/// Where a [`SqliteStore`] keeps its data.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Location {
    File(PathBuf),
    Memory,
}

pub struct SqliteStore {
    location: Location,
    conn: OnceCell<tokio_rusqlite::Connection>,
}

impl SqliteStore {
    /// A store backed by the file at `path`. Nothing is opened yet.
    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self {
            location: Location::File(path.into()),
            conn: OnceCell::new(),
        }
    }

    /// A private in-memory database. Useful for testing.
    pub fn in_memory() -> Self {
        Self {
            location: Location::Memory,
            conn: OnceCell::new(),
        }
    }

    /// Resolve the default database path: `~/.chartnote/chartnote.db`.
    pub fn default_path() -> Result<PathBuf, DbError> {
        let home = dirs::home_dir().ok_or(DbError::HomeDirNotFound)?;
        Ok(home.join(".chartnote").join("chartnote.db"))
    }

    /// Borrow the connection, opening it on first call.
    async fn connection(&self) -> Result<&tokio_rusqlite::Connection, DbError> {
        self.conn.get_or_try_init(|| self.open()).await
    }

    async fn open(&self) -> Result<tokio_rusqlite::Connection, DbError> {
        match &self.location {
            Location::File(path) => {
                if let Some(parent) = path.parent() {
                    if !parent.as_os_str().is_empty() && !parent.exists() {
                        std::fs::create_dir_all(parent).map_err(DbError::CreateDir)?;
                    }
                }

                let conn = tokio_rusqlite::Connection::open(path).await?;
                conn.call(|conn| {
                    conn.execute_batch("PRAGMA journal_mode=WAL;")?;
                    Ok(())
                })
                .await?;

                log::info!("Opened database at {}", path.display());
                Ok(conn)
            }
            Location::Memory => Ok(tokio_rusqlite::Connection::open_in_memory().await?),
        }
    }
}

#[async_trait]
impl StoreHandle for SqliteStore {
    async fn execute(&self, sql: &str, params: Vec<SqlValue>) -> Result<usize, DbError> {
        let conn = self.connection().await?;
        let sql = sql.to_owned();
        let changed = conn
            .call(move |conn| Ok(conn.execute(&sql, params_from_iter(params))?))
            .await?;
        Ok(changed)
    }

    async fn select(&self, sql: &str, params: Vec<SqlValue>) -> Result<Vec<Row>, DbError> {
        let conn = self.connection().await?;
        let sql = sql.to_owned();
        let rows = conn
            .call(move |conn| {
                let mut stmt = conn.prepare(&sql)?;
                let names: Vec<String> =
                    stmt.column_names().into_iter().map(String::from).collect();

                let mapped = stmt.query_map(params_from_iter(params), |row| {
                    let mut columns = Vec::with_capacity(names.len());
                    for (idx, name) in names.iter().enumerate() {
                        columns.push((name.clone(), row.get::<_, SqlValue>(idx)?));
                    }
                    Ok(Row::new(columns))
                })?;

                let mut items = Vec::new();
                for row in mapped {
                    items.push(row?);
                }
                Ok(items)
            })
            .await?;
        Ok(rows)
    }
}

// =============================================================================
// Test utilities
// =============================================================================

#[cfg(test)]
pub mod test_utils {
    use std::sync::atomic::{AtomicBool, Ordering};

    use parking_lot::Mutex;

    use super::*;

    /// A statement the store was asked to run.
    #[derive(Debug, Clone, PartialEq)]
    pub struct RecordedCall {
        pub sql: String,
        pub params: Vec<SqlValue>,
    }

    /// Store double that records every `execute` and can be told to fail.
    ///
    /// `detached()` answers writes with `Ok(1)` and queries with no rows, so
    /// it never leaves the runtime thread (paused-clock tests rely on that).
    /// `over_sqlite()` forwards to a real in-memory database after recording.
    pub struct RecordingStore {
        inner: Option<SqliteStore>,
        executed: Mutex<Vec<RecordedCall>>,
        fail_execute_matching: Mutex<Option<String>>,
        fail_select: AtomicBool,
    }

    impl RecordingStore {
        pub fn detached() -> Self {
            Self {
                inner: None,
                executed: Mutex::new(Vec::new()),
                fail_execute_matching: Mutex::new(None),
                fail_select: AtomicBool::new(false),
            }
        }

        pub fn over_sqlite() -> Self {
            Self {
                inner: Some(SqliteStore::in_memory()),
                ..Self::detached()
            }
        }

        /// Fail every `execute` whose SQL contains `fragment`.
        pub fn fail_execute_containing(&self, fragment: &str) {
            *self.fail_execute_matching.lock() = Some(fragment.to_string());
        }

        pub fn fail_selects(&self, fail: bool) {
            self.fail_select.store(fail, Ordering::SeqCst);
        }

        pub fn clear_failures(&self) {
            *self.fail_execute_matching.lock() = None;
            self.fail_select.store(false, Ordering::SeqCst);
        }

        pub fn executed(&self) -> Vec<RecordedCall> {
            self.executed.lock().clone()
        }

        /// Recorded statements whose SQL starts with `prefix` (e.g. "UPDATE notes").
        pub fn executed_starting_with(&self, prefix: &str) -> Vec<RecordedCall> {
            self.executed
                .lock()
                .iter()
                .filter(|c| c.sql.trim_start().starts_with(prefix))
                .cloned()
                .collect()
        }

        fn injected_failure() -> DbError {
            DbError::Sqlite(rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_IOERR),
                Some("injected failure".into()),
            ))
        }
    }

    #[async_trait]
    impl StoreHandle for RecordingStore {
        async fn execute(&self, sql: &str, params: Vec<SqlValue>) -> Result<usize, DbError> {
            let should_fail = self
                .fail_execute_matching
                .lock()
                .as_deref()
                .map(|fragment| sql.contains(fragment))
                .unwrap_or(false);
            if should_fail {
                return Err(Self::injected_failure());
            }

            self.executed.lock().push(RecordedCall {
                sql: sql.to_string(),
                params: params.clone(),
            });

            match &self.inner {
                Some(store) => store.execute(sql, params).await,
                None => Ok(1),
            }
        }

        async fn select(&self, sql: &str, params: Vec<SqlValue>) -> Result<Vec<Row>, DbError> {
            if self.fail_select.load(Ordering::SeqCst) {
                return Err(Self::injected_failure());
            }
            match &self.inner {
                Some(store) => store.select(sql, params).await,
                None => Ok(Vec::new()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_in_memory_execute_and_select() {
        let store = SqliteStore::in_memory();
        store
            .execute("CREATE TABLE t (id TEXT PRIMARY KEY, n INTEGER, note TEXT)", vec![])
            .await
            .expect("create table");

        let changed = store
            .execute(
                "INSERT INTO t (id, n, note) VALUES (?1, ?2, ?3)",
                vec![SqlValue::Text("a".into()), SqlValue::Integer(7), SqlValue::Null],
            )
            .await
            .expect("insert");
        assert_eq!(changed, 1);

        let rows = store
            .select("SELECT id, n, note FROM t WHERE id = ?1", vec![SqlValue::Text("a".into())])
            .await
            .expect("select");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].text("id").unwrap(), "a");
        assert_eq!(rows[0].integer("n").unwrap(), 7);
        assert_eq!(rows[0].opt_text("note").unwrap(), None);
    }

    #[tokio::test]
    async fn test_connection_is_memoized() {
        let store = SqliteStore::in_memory();
        store
            .execute("CREATE TABLE t (id TEXT)", vec![])
            .await
            .unwrap();
        // A second connection to :memory: would not see the table.
        let rows = store.select("SELECT id FROM t", vec![]).await.unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_file_store_creates_parent_dir() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("chartnote.db");
        let store = SqliteStore::at_path(&path);

        store
            .execute("CREATE TABLE IF NOT EXISTS t (id TEXT)", vec![])
            .await
            .expect("create table on disk");
        assert!(path.exists());
    }

    #[tokio::test]
    async fn test_sql_error_is_reported() {
        let store = SqliteStore::in_memory();
        let err = store
            .execute("INSERT INTO missing_table VALUES (1)", vec![])
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Sqlite(_)));
        assert!(err.to_string().contains("missing_table"));
    }
}
