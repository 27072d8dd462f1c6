//! Configuration for the sync engine.

use crate::error::{SyncError, SyncResult};
use bansync_store::StoreSettings;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

/// Default delay between the end of one apply and the next push.
pub const DEFAULT_PUSH_DELAY: Duration = Duration::from_secs(20);

/// Configuration for the sync engine.
///
/// Stored as JSON. Missing fields take their defaults, so older files keep
/// loading as options are added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Shared store selection and connection settings.
    pub store: StoreSettings,
    /// Delay between the end of an apply phase and the next push, in
    /// milliseconds.
    pub push_delay_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            store: StoreSettings::default(),
            push_delay_ms: DEFAULT_PUSH_DELAY.as_millis() as u64,
        }
    }
}

impl SyncConfig {
    /// Creates a configuration for the given store.
    pub fn new(store: StoreSettings) -> Self {
        Self {
            store,
            ..Self::default()
        }
    }

    /// Sets the push delay.
    #[must_use]
    pub fn with_push_delay(mut self, delay: Duration) -> Self {
        self.push_delay_ms = delay.as_millis() as u64;
        self
    }

    /// Returns the push delay.
    pub fn push_delay(&self) -> Duration {
        Duration::from_millis(self.push_delay_ms)
    }

    /// Loads the configuration at `path`.
    ///
    /// A missing or unparsable file is replaced with the defaults, which
    /// are written back before returning.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read, or if the
    /// defaults cannot be written.
    pub fn load_or_init(path: &Path) -> SyncResult<Self> {
        match std::fs::read_to_string(path) {
            Ok(text) => match serde_json::from_str(&text) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "config is corrupt, restoring defaults");
                }
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!(path = %path.display(), "no config found, writing defaults");
            }
            Err(e) => return Err(e.into()),
        }

        let config = Self::default();
        config.save(path)?;
        Ok(config)
    }

    /// Writes the configuration to `path` as pretty JSON.
    pub fn save(&self, path: &Path) -> SyncResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let json =
            serde_json::to_string_pretty(self).map_err(|e| SyncError::Config(e.to_string()))?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
