//! Embedded SQLite backend.

use crate::backend::{BanTable, Connector};
use crate::error::{StoreError, StoreResult};
use crate::sql::{Dialect, Row, SqlBanTable, SqlConnection, SqlValue, Statement};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection, ErrorCode, OpenFlags};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

const BACKEND: &str = "sqlite";

/// Opens connections to a SQLite database file.
///
/// The file is created on first connect. Each connection is opened fresh
/// and closed when its handle is dropped.
#[derive(Debug, Clone)]
pub struct SqliteConnector {
    path: PathBuf,
    busy_timeout: Duration,
}

impl SqliteConnector {
    /// Creates a connector for the given file.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            busy_timeout: Duration::from_secs(5),
        }
    }

    /// Sets how long a statement waits on a locked database.
    #[must_use]
    pub fn with_busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    /// Returns the database path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Opens a raw connection.
    pub fn open(&self) -> StoreResult<SqliteConnection> {
        let conn = Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| StoreError::connection(BACKEND, e))?;
        conn.busy_timeout(self.busy_timeout)
            .map_err(|e| StoreError::connection(BACKEND, e))?;

        debug!(path = %self.path.display(), "opened sqlite connection");
        Ok(SqliteConnection { conn })
    }
}

impl Connector for SqliteConnector {
    fn name(&self) -> &'static str {
        BACKEND
    }

    fn connect(&self) -> StoreResult<Box<dyn BanTable>> {
        Ok(Box::new(SqlBanTable::new(self.open()?, Dialect::Sqlite)))
    }
}

/// A single SQLite connection.
pub struct SqliteConnection {
    conn: Connection,
}

impl SqliteConnection {
    fn map_err(statement: &Statement, err: rusqlite::Error) -> StoreError {
        match err.sqlite_error_code() {
            Some(ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked | ErrorCode::CannotOpen) => {
                StoreError::connection(BACKEND, err)
            }
            _ => StoreError::query(statement.sql.clone(), err),
        }
    }
}

impl SqlConnection for SqliteConnection {
    fn query(&mut self, statement: &Statement) -> StoreResult<Vec<Row>> {
        let mut stmt = self
            .conn
            .prepare(&statement.sql)
            .map_err(|e| Self::map_err(statement, e))?;
        let columns = stmt.column_count();
        let params = statement.params.iter().map(to_sqlite).collect::<Vec<_>>();

        let rows = stmt
            .query_map(params_from_iter(params), |row| {
                (0..columns)
                    .map(|i| row.get::<_, Value>(i).map(from_sqlite))
                    .collect::<rusqlite::Result<Row>>()
            })
            .map_err(|e| Self::map_err(statement, e))?;

        rows.collect::<rusqlite::Result<Vec<Row>>>()
            .map_err(|e| Self::map_err(statement, e))
    }

    fn execute(&mut self, statement: &Statement) -> StoreResult<u64> {
        let params = statement.params.iter().map(to_sqlite).collect::<Vec<_>>();
        let affected = self
            .conn
            .execute(&statement.sql, params_from_iter(params))
            .map_err(|e| Self::map_err(statement, e))?;
        Ok(affected as u64)
    }

    fn close(self) -> StoreResult<()> {
        self.conn
            .close()
            .map_err(|(_, e)| StoreError::connection(BACKEND, e))
    }
}

fn to_sqlite(value: &SqlValue) -> Value {
    match value {
        SqlValue::Null => Value::Null,
        SqlValue::Int(v) => Value::Integer(*v),
        SqlValue::UInt(v) => match i64::try_from(*v) {
            Ok(v) => Value::Integer(v),
            Err(_) => Value::Text(v.to_string()),
        },
        SqlValue::Real(v) => Value::Real(*v),
        SqlValue::Text(v) => Value::Text(v.clone()),
        SqlValue::Bytes(v) => Value::Blob(v.clone()),
    }
}

fn from_sqlite(value: Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Integer(v) => SqlValue::Int(v),
        Value::Real(v) => SqlValue::Real(v),
        Value::Text(v) => SqlValue::Text(v),
        Value::Blob(v) => SqlValue::Bytes(v),
    }
}
