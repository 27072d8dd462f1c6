//! SQL statements, dialects, and the shared SQL-backed table.

use crate::backend::BanTable;
use crate::error::{StoreError, StoreResult};
use bansync_core::{IdentityId, IdentityRecord, BAN_TABLE};
use std::fmt;
use tracing::debug;

/// A value bound to a statement parameter or read from a row.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// SQL NULL.
    Null,
    /// Signed integer.
    Int(i64),
    /// Unsigned integer.
    UInt(u64),
    /// Floating point.
    Real(f64),
    /// UTF-8 text.
    Text(String),
    /// Raw bytes (MySQL returns text columns this way).
    Bytes(Vec<u8>),
}

/// One result row, columns in select order.
pub type Row = Vec<SqlValue>;

/// A parameterized SQL statement.
///
/// Values never appear in `sql`; they are bound positionally from `params`.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    /// SQL text with `?` placeholders.
    pub sql: String,
    /// Positional parameters.
    pub params: Vec<SqlValue>,
}

impl Statement {
    /// Creates a statement without parameters.
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    /// Creates a statement with parameters.
    pub fn with_params(sql: impl Into<String>, params: Vec<SqlValue>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}

/// A raw SQL connection: the driver-level half of the store adapter.
pub trait SqlConnection: Send {
    /// Runs a statement that returns rows.
    fn query(&mut self, statement: &Statement) -> StoreResult<Vec<Row>>;

    /// Runs a statement and returns the number of affected rows.
    fn execute(&mut self, statement: &Statement) -> StoreResult<u64>;

    /// Closes the connection.
    fn close(self) -> StoreResult<()>
    where
        Self: Sized;
}

/// SQL dialect of a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// SQLite: textual, case-insensitive key column.
    Sqlite,
    /// MySQL: unsigned 64-bit key column.
    MySql,
}

impl Dialect {
    /// Statement returning one row if the ban table exists.
    pub fn table_exists(self) -> Statement {
        let sql = match self {
            Dialect::Sqlite => "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?",
            Dialect::MySql => {
                "SELECT TABLE_NAME FROM information_schema.TABLES \
                 WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = ?"
            }
        };
        Statement::with_params(sql, vec![SqlValue::Text(BAN_TABLE.to_string())])
    }

    /// Statement creating the ban table.
    ///
    /// Uses `IF NOT EXISTS` so two processes bootstrapping at once both
    /// succeed.
    pub fn create_table(self) -> Statement {
        let key = match self {
            Dialect::Sqlite => "TEXT NOT NULL COLLATE NOCASE PRIMARY KEY",
            Dialect::MySql => "BIGINT UNSIGNED NOT NULL PRIMARY KEY",
        };
        Statement::new(format!(
            "CREATE TABLE IF NOT EXISTS {BAN_TABLE} \
             (UserId {key}, Name TEXT NOT NULL, Reason TEXT NOT NULL)"
        ))
    }

    /// Statement reading every row.
    pub fn select_all(self) -> Statement {
        Statement::new(format!("SELECT UserId, Name, Reason FROM {BAN_TABLE}"))
    }

    /// Statement inserting or replacing all `records`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DataShape`] if an id cannot be stored in this
    /// dialect's key column.
    pub fn bulk_upsert(self, records: &[IdentityRecord]) -> StoreResult<Statement> {
        let mut params = Vec::with_capacity(records.len() * 3);
        for record in records {
            params.push(self.bind_id(&record.id)?);
            params.push(SqlValue::Text(record.name.clone()));
            params.push(SqlValue::Text(record.reason.clone()));
        }

        let values = vec!["(?, ?, ?)"; records.len()].join(", ");
        let sql = match self {
            Dialect::Sqlite => {
                format!("INSERT OR REPLACE INTO {BAN_TABLE} (UserId, Name, Reason) VALUES {values}")
            }
            Dialect::MySql => format!(
                "INSERT INTO {BAN_TABLE} (UserId, Name, Reason) VALUES {values} \
                 ON DUPLICATE KEY UPDATE Name = VALUES(Name), Reason = VALUES(Reason)"
            ),
        };

        Ok(Statement::with_params(sql, params))
    }

    /// Statement deleting every row whose id is in `ids`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::DataShape`] if an id cannot be bound.
    pub fn bulk_delete(self, ids: &[IdentityId]) -> StoreResult<Statement> {
        let params = ids
            .iter()
            .map(|id| self.bind_id(id))
            .collect::<StoreResult<Vec<_>>>()?;
        let placeholders = vec!["?"; ids.len()].join(", ");
        Ok(Statement::with_params(
            format!("DELETE FROM {BAN_TABLE} WHERE UserId IN ({placeholders})"),
            params,
        ))
    }

    /// Converts an id into the key column's parameter type.
    ///
    /// Digit-only textual ids are bound in their numeric form.
    pub fn bind_id(self, id: &IdentityId) -> StoreResult<SqlValue> {
        match (self, id.canonical()) {
            (Dialect::Sqlite, id) => Ok(SqlValue::Text(id.to_string())),
            (Dialect::MySql, IdentityId::Numeric(value)) => Ok(SqlValue::UInt(value)),
            (Dialect::MySql, IdentityId::Text(text)) => Err(StoreError::DataShape(format!(
                "textual id {text:?} cannot be stored in a numeric key column"
            ))),
        }
    }

    /// Decodes a `UserId, Name, Reason` row.
    pub fn decode_row(self, row: Row) -> StoreResult<IdentityRecord> {
        let [id, name, reason]: [SqlValue; 3] = row.try_into().map_err(|row: Row| {
            StoreError::DataShape(format!("expected 3 columns, got {}", row.len()))
        })?;

        Ok(IdentityRecord {
            id: decode_id(id)?,
            name: decode_text("Name", name)?,
            reason: decode_text("Reason", reason)?,
        })
    }
}

fn decode_id(value: SqlValue) -> StoreResult<IdentityId> {
    let text = match value {
        SqlValue::UInt(value) => return Ok(IdentityId::Numeric(value)),
        SqlValue::Int(value) => {
            return u64::try_from(value)
                .map(IdentityId::Numeric)
                .map_err(|_| StoreError::DataShape(format!("negative UserId {value}")));
        }
        SqlValue::Text(text) => text,
        SqlValue::Bytes(bytes) => String::from_utf8(bytes)
            .map_err(|_| StoreError::DataShape("UserId is not valid UTF-8".into()))?,
        other => {
            return Err(StoreError::DataShape(format!(
                "UserId has unexpected value {other:?}"
            )))
        }
    };

    IdentityId::parse(&text).map_err(|e| StoreError::DataShape(format!("UserId: {e}")))
}

fn decode_text(column: &str, value: SqlValue) -> StoreResult<String> {
    match value {
        SqlValue::Text(text) => Ok(text),
        SqlValue::Bytes(bytes) => String::from_utf8(bytes)
            .map_err(|_| StoreError::DataShape(format!("{column} is not valid UTF-8"))),
        other => Err(StoreError::DataShape(format!(
            "{column} has unexpected value {other:?}"
        ))),
    }
}

/// The ban table on top of any [`SqlConnection`].
pub struct SqlBanTable<C: SqlConnection> {
    conn: C,
    dialect: Dialect,
}

impl<C: SqlConnection> SqlBanTable<C> {
    /// Wraps a connection.
    pub fn new(conn: C, dialect: Dialect) -> Self {
        Self { conn, dialect }
    }

    /// Returns the dialect in use.
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }
}

impl<C: SqlConnection> BanTable for SqlBanTable<C> {
    fn table_exists(&mut self) -> StoreResult<bool> {
        let rows = self.conn.query(&self.dialect.table_exists())?;
        Ok(!rows.is_empty())
    }

    fn create_table(&mut self) -> StoreResult<()> {
        self.conn.execute(&self.dialect.create_table())?;
        Ok(())
    }

    fn fetch_all(&mut self) -> StoreResult<Vec<IdentityRecord>> {
        let rows = self.conn.query(&self.dialect.select_all())?;
        rows.into_iter()
            .map(|row| self.dialect.decode_row(row))
            .collect()
    }

    fn upsert(&mut self, records: &[IdentityRecord]) -> StoreResult<u64> {
        if records.is_empty() {
            return Ok(0);
        }
        let statement = self.dialect.bulk_upsert(records)?;
        let affected = self.conn.execute(&statement)?;
        debug!(rows = records.len(), affected, "upserted bans");
        Ok(affected)
    }

    fn delete(&mut self, ids: &[IdentityId]) -> StoreResult<u64> {
        if ids.is_empty() {
            return Ok(0);
        }
        let statement = self.dialect.bulk_delete(ids)?;
        let affected = self.conn.execute(&statement)?;
        debug!(rows = ids.len(), affected, "deleted bans");
        Ok(affected)
    }

    fn close(self: Box<Self>) -> StoreResult<()> {
        let table = *self;
        table.conn.close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bulk_upsert_binds_every_value() {
        let records = vec![
            IdentityRecord::new(1u64, "a", "it's spam"),
            IdentityRecord::new(2u64, "b'); DROP TABLE userbans; --", "r2"),
        ];
        let statement = Dialect::Sqlite.bulk_upsert(&records).unwrap();

        assert_eq!(
            statement.sql,
            "INSERT OR REPLACE INTO userbans (UserId, Name, Reason) VALUES (?, ?, ?), (?, ?, ?)"
        );
        assert_eq!(statement.params.len(), 6);
        assert_eq!(statement.params[0], SqlValue::Text("1".into()));
        assert_eq!(statement.params[2], SqlValue::Text("it's spam".into()));
        assert!(!statement.sql.contains("DROP"));
    }

    #[test]
    fn mysql_upsert_uses_duplicate_key_update() {
        let records = vec![IdentityRecord::new(76_561_198_000_000_001u64, "a", "r")];
        let statement = Dialect::MySql.bulk_upsert(&records).unwrap();

        assert!(statement.sql.starts_with("INSERT INTO userbans"));
        assert!(statement.sql.contains("ON DUPLICATE KEY UPDATE"));
        assert_eq!(statement.params[0], SqlValue::UInt(76_561_198_000_000_001));
    }

    #[test]
    fn mysql_rejects_textual_ids() {
        let records = vec![IdentityRecord::new(
            IdentityId::parse("STEAM_0:1:5").unwrap(),
            "a",
            "r",
        )];
        let err = Dialect::MySql.bulk_upsert(&records).unwrap_err();
        assert!(matches!(err, StoreError::DataShape(_)));
    }

    #[test]
    fn digit_text_ids_bind_as_numbers() {
        let id = IdentityId::Text("0042".into());
        assert_eq!(Dialect::Sqlite.bind_id(&id).unwrap(), SqlValue::Text("42".into()));
        assert_eq!(Dialect::MySql.bind_id(&id).unwrap(), SqlValue::UInt(42));
    }

    #[test]
    fn bulk_delete_uses_in_list() {
        let ids = vec![IdentityId::from(3), IdentityId::from(4), IdentityId::from(5)];
        let statement = Dialect::MySql.bulk_delete(&ids).unwrap();
        assert_eq!(statement.sql, "DELETE FROM userbans WHERE UserId IN (?, ?, ?)");
        assert_eq!(statement.params.len(), 3);
    }

    #[test]
    fn create_table_key_types() {
        assert!(Dialect::Sqlite.create_table().sql.contains("COLLATE NOCASE"));
        assert!(Dialect::MySql.create_table().sql.contains("BIGINT UNSIGNED"));
    }

    #[test]
    fn decode_accepts_driver_variants() {
        let record = Dialect::MySql
            .decode_row(vec![
                SqlValue::UInt(9),
                SqlValue::Bytes(b"y".to_vec()),
                SqlValue::Bytes(b"cheat".to_vec()),
            ])
            .unwrap();
        assert!(record.same_details(&IdentityRecord::new(9u64, "y", "cheat")));

        let record = Dialect::Sqlite
            .decode_row(vec![
                SqlValue::Text("Griefer".into()),
                SqlValue::Text("g".into()),
                SqlValue::Text("r".into()),
            ])
            .unwrap();
        assert_eq!(record.id, IdentityId::parse("griefer").unwrap());
    }

    #[test]
    fn decode_rejects_bad_shapes() {
        let short = Dialect::Sqlite.decode_row(vec![SqlValue::Int(1)]);
        assert!(matches!(short, Err(StoreError::DataShape(_))));

        let negative = Dialect::Sqlite.decode_row(vec![
            SqlValue::Int(-1),
            SqlValue::Text("a".into()),
            SqlValue::Text("r".into()),
        ]);
        assert!(matches!(negative, Err(StoreError::DataShape(_))));

        let null_name = Dialect::Sqlite.decode_row(vec![
            SqlValue::Int(1),
            SqlValue::Null,
            SqlValue::Text("r".into()),
        ]);
        assert!(matches!(null_name, Err(StoreError::DataShape(_))));
    }
}
