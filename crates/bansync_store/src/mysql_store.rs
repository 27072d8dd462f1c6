//! Networked MySQL backend.

use crate::backend::{BanTable, Connector};
use crate::error::{StoreError, StoreResult};
use crate::settings::MySqlSettings;
use crate::sql::{Dialect, Row, SqlBanTable, SqlConnection, SqlValue, Statement};
use mysql::prelude::Queryable;
use mysql::{Conn, OptsBuilder, Params, Value};
use std::time::Duration;
use tracing::debug;

const BACKEND: &str = "mysql";

/// Opens connections to a MySQL server.
#[derive(Debug, Clone)]
pub struct MySqlConnector {
    settings: MySqlSettings,
    connect_timeout: Duration,
}

impl MySqlConnector {
    /// Creates a connector from settings.
    pub fn new(settings: MySqlSettings) -> Self {
        Self {
            settings,
            connect_timeout: Duration::from_secs(10),
        }
    }

    /// Sets the TCP connect timeout.
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Opens a raw connection.
    ///
    /// Every failure here, including rejected credentials, is a
    /// [`StoreError::Connection`].
    pub fn open(&self) -> StoreResult<MySqlConnection> {
        let opts = OptsBuilder::new()
            .ip_or_hostname(Some(self.settings.host.clone()))
            .tcp_port(self.settings.port)
            .db_name(Some(self.settings.database.clone()))
            .user(Some(self.settings.user.clone()))
            .pass(Some(self.settings.password.clone()))
            .tcp_connect_timeout(Some(self.connect_timeout));

        let conn = Conn::new(opts).map_err(|e| StoreError::connection(BACKEND, e))?;
        debug!(
            host = %self.settings.host,
            port = self.settings.port,
            database = %self.settings.database,
            "opened mysql connection"
        );
        Ok(MySqlConnection { conn })
    }
}

impl Connector for MySqlConnector {
    fn name(&self) -> &'static str {
        BACKEND
    }

    fn connect(&self) -> StoreResult<Box<dyn BanTable>> {
        Ok(Box::new(SqlBanTable::new(self.open()?, Dialect::MySql)))
    }
}

/// A single MySQL connection.
pub struct MySqlConnection {
    conn: Conn,
}

impl MySqlConnection {
    fn map_err(statement: &Statement, err: mysql::Error) -> StoreError {
        match err {
            mysql::Error::IoError(_) | mysql::Error::DriverError(_) => {
                StoreError::connection(BACKEND, err)
            }
            other => StoreError::query(statement.sql.clone(), other),
        }
    }
}

impl SqlConnection for MySqlConnection {
    fn query(&mut self, statement: &Statement) -> StoreResult<Vec<Row>> {
        let rows: Vec<mysql::Row> = self
            .conn
            .exec(statement.sql.as_str(), to_params(&statement.params))
            .map_err(|e| Self::map_err(statement, e))?;

        Ok(rows
            .into_iter()
            .map(|row| row.unwrap().into_iter().map(from_mysql).collect())
            .collect())
    }

    fn execute(&mut self, statement: &Statement) -> StoreResult<u64> {
        self.conn
            .exec_drop(statement.sql.as_str(), to_params(&statement.params))
            .map_err(|e| Self::map_err(statement, e))?;
        Ok(self.conn.affected_rows())
    }

    fn close(self) -> StoreResult<()> {
        // Dropping the connection sends COM_QUIT.
        drop(self.conn);
        Ok(())
    }
}

fn to_params(values: &[SqlValue]) -> Params {
    if values.is_empty() {
        return Params::Empty;
    }
    Params::Positional(values.iter().map(to_mysql).collect())
}

fn to_mysql(value: &SqlValue) -> Value {
    match value {
        SqlValue::Null => Value::NULL,
        SqlValue::Int(v) => Value::Int(*v),
        SqlValue::UInt(v) => Value::UInt(*v),
        SqlValue::Real(v) => Value::Double(*v),
        SqlValue::Text(v) => Value::Bytes(v.clone().into_bytes()),
        SqlValue::Bytes(v) => Value::Bytes(v.clone()),
    }
}

fn from_mysql(value: Value) -> SqlValue {
    match value {
        Value::NULL => SqlValue::Null,
        Value::Bytes(v) => SqlValue::Bytes(v),
        Value::Int(v) => SqlValue::Int(v),
        Value::UInt(v) => SqlValue::UInt(v),
        Value::Float(v) => SqlValue::Real(f64::from(v)),
        Value::Double(v) => SqlValue::Real(v),
        other => SqlValue::Text(other.as_sql(false)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_conversion() {
        assert_eq!(to_mysql(&SqlValue::UInt(7)), Value::UInt(7));
        assert_eq!(
            to_mysql(&SqlValue::Text("x".into())),
            Value::Bytes(b"x".to_vec())
        );
        assert_eq!(from_mysql(Value::NULL), SqlValue::Null);
        assert_eq!(from_mysql(Value::Int(-3)), SqlValue::Int(-3));
        assert!(matches!(to_params(&[]), Params::Empty));
    }

    #[test]
    fn unreachable_server_is_connection_error() {
        let settings = MySqlSettings {
            host: "127.0.0.1".into(),
            port: 1,
            ..MySqlSettings::default()
        };
        let connector = MySqlConnector::new(settings).with_connect_timeout(Duration::from_secs(1));
        let err = connector.connect().err().unwrap();
        assert!(err.is_connection());
    }
}
