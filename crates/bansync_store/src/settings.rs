//! Backend selection and connection settings.

use crate::backend::Connector;
use crate::mysql_store::MySqlConnector;
use crate::sqlite_store::SqliteConnector;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Which backend holds the shared table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Embedded SQLite file.
    #[default]
    Sqlite,
    /// Networked MySQL server.
    MySql,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Sqlite => f.write_str("sqlite"),
            BackendKind::MySql => f.write_str("mysql"),
        }
    }
}

/// MySQL connection settings.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MySqlSettings {
    /// Server host name or IP address.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Database (schema) name.
    pub database: String,
    /// User name.
    pub user: String,
    /// Password.
    pub password: String,
}

impl Default for MySqlSettings {
    fn default() -> Self {
        Self {
            host: "localhost".into(),
            port: 3306,
            database: "bansync".into(),
            user: "root".into(),
            password: String::new(),
        }
    }
}

impl fmt::Debug for MySqlSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MySqlSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Settings selecting and configuring the shared store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    /// Backend kind.
    pub backend: BackendKind,
    /// SQLite database file.
    pub sqlite_file_name: PathBuf,
    /// MySQL connection settings.
    pub mysql: MySqlSettings,
    /// Connect timeout in seconds (MySQL TCP connect, SQLite busy wait).
    pub connect_timeout_secs: u64,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            backend: BackendKind::Sqlite,
            sqlite_file_name: PathBuf::from("bansync.db"),
            mysql: MySqlSettings::default(),
            connect_timeout_secs: 10,
        }
    }
}

impl StoreSettings {
    /// Settings for a SQLite file.
    pub fn sqlite(path: impl Into<PathBuf>) -> Self {
        Self {
            backend: BackendKind::Sqlite,
            sqlite_file_name: path.into(),
            ..Self::default()
        }
    }

    /// Settings for a MySQL server.
    pub fn mysql(mysql: MySqlSettings) -> Self {
        Self {
            backend: BackendKind::MySql,
            mysql,
            ..Self::default()
        }
    }

    /// Sets the connect timeout.
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout_secs = timeout.as_secs();
        self
    }

    /// Returns the connect timeout.
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Builds the connector for the configured backend.
    pub fn connector(&self) -> Box<dyn Connector> {
        match self.backend {
            BackendKind::Sqlite => Box::new(
                SqliteConnector::new(&self.sqlite_file_name)
                    .with_busy_timeout(self.connect_timeout()),
            ),
            BackendKind::MySql => Box::new(
                MySqlConnector::new(self.mysql.clone())
                    .with_connect_timeout(self.connect_timeout()),
            ),
        }
    }
}
