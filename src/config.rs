use std::path::{Path, PathBuf};
use std::time::Duration;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::errors::KartTimerError;
use crate::storage::database::DEFAULT_SESSION_LIST_LIMIT;
use crate::timing::Precision;

const CONFIG_FILE_NAME: &str = "config.json";

pub const SINGLE_TICK_INTERVAL_MS: u64 = 50;
pub const MULTI_TICK_INTERVAL_MS: u64 = 10;
pub const DEFAULT_MULTI_SESSION_NAME: &str = "Practice Session";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub single_tick_interval_ms: u64,
    pub multi_tick_interval_ms: u64,
    pub session_list_limit: usize,
    pub display_precision: Precision,
    pub default_multi_session_name: String,
    /// Overrides the session database location
    pub database_path: Option<PathBuf>,
    /// Overrides the driver profiles location
    pub profiles_path: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            single_tick_interval_ms: SINGLE_TICK_INTERVAL_MS,
            multi_tick_interval_ms: MULTI_TICK_INTERVAL_MS,
            session_list_limit: DEFAULT_SESSION_LIST_LIMIT,
            display_precision: Precision::default(),
            default_multi_session_name: DEFAULT_MULTI_SESSION_NAME.to_string(),
            database_path: None,
            profiles_path: None,
        }
    }
}

impl AppConfig {
    pub fn default_config_path() -> Result<PathBuf, KartTimerError> {
        Ok(dirs::config_dir()
            .ok_or(KartTimerError::NoConfigDir)?
            .join("karttimer")
            .join(CONFIG_FILE_NAME))
    }

    /// Load the config at `path`, falling back to defaults when the file doesn't exist
    pub fn load(path: &Path) -> Result<Self, KartTimerError> {
        if !path.exists() {
            debug!("No config file at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let file =
            std::fs::File::open(path).map_err(|e| KartTimerError::ConfigIOError { source: e })?;
        serde_json::from_reader(file).map_err(|e| KartTimerError::ConfigSerializeError { source: e })
    }

    pub fn from_local_file() -> Result<Self, KartTimerError> {
        Self::load(&Self::default_config_path()?)
    }

    pub fn save(&self, path: &Path) -> Result<(), KartTimerError> {
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| KartTimerError::ConfigIOError { source: e })?;
            }
        }

        let file = std::fs::File::create(path)
            .map_err(|e| KartTimerError::ConfigIOError { source: e })?;
        serde_json::to_writer_pretty(file, self)
            .map_err(|e| KartTimerError::ConfigSerializeError { source: e })
    }

    pub fn single_tick_interval(&self) -> Duration {
        Duration::from_millis(self.single_tick_interval_ms.max(1))
    }

    pub fn multi_tick_interval(&self) -> Duration {
        Duration::from_millis(self.multi_tick_interval_ms.max(1))
    }

    pub fn database_path(&self) -> Result<PathBuf, KartTimerError> {
        match &self.database_path {
            Some(path) => Ok(path.clone()),
            None => crate::storage::Database::default_database_path(),
        }
    }

    pub fn profiles_path(&self) -> Result<PathBuf, KartTimerError> {
        match &self.profiles_path {
            Some(path) => Ok(path.clone()),
            None => crate::storage::DriverProfiles::default_profiles_path(),
        }
    }
}
