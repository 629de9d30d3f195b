// Driver profile persistence, kept as a JSON array next to the session database

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use uuid::Uuid;

use crate::errors::KartTimerError;
use crate::storage::DriverProfileStore;
use crate::storage::types::{Driver, validate_name};

pub(crate) const PROFILES_FILE_NAME: &str = "drivers.json";
/// Most profiles a user can keep
pub const MAX_DRIVERS: usize = 10;

/// File-backed list of driver profiles. The whole list is loaded at open and rewritten on
/// every change.
pub struct DriverProfiles {
    path: PathBuf,
    drivers: Vec<Driver>,
}

impl DriverProfiles {
    pub fn open(path: PathBuf) -> Result<Self, KartTimerError> {
        let drivers = Self::load_from_file(&path)?;
        debug!("Loaded {} driver profiles from {:?}", drivers.len(), path);
        Ok(Self { path, drivers })
    }

    pub fn new_default() -> Result<Self, KartTimerError> {
        Self::open(Self::default_profiles_path()?)
    }

    pub fn default_profiles_path() -> Result<PathBuf, KartTimerError> {
        let app_data_dir = dirs::data_dir().ok_or(KartTimerError::NoDataDir)?;
        Ok(app_data_dir.join("karttimer").join(PROFILES_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn can_add(&self) -> bool {
        self.drivers.len() < MAX_DRIVERS
    }

    pub fn get(&self, id: Uuid) -> Option<&Driver> {
        self.drivers.iter().find(|d| d.id == id)
    }

    /// Resolve a driver from user input: a full id, an id prefix, or a case-insensitive name
    pub fn find(&self, query: &str) -> Option<&Driver> {
        let query = query.trim();
        if let Ok(id) = Uuid::parse_str(query) {
            return self.get(id);
        }
        self.drivers
            .iter()
            .find(|d| d.name.eq_ignore_ascii_case(query))
            .or_else(|| {
                let mut by_prefix = self
                    .drivers
                    .iter()
                    .filter(|d| !query.is_empty() && d.id.to_string().starts_with(query));
                match (by_prefix.next(), by_prefix.next()) {
                    (Some(driver), None) => Some(driver),
                    _ => None,
                }
            })
    }

    fn load_from_file(path: &Path) -> Result<Vec<Driver>, KartTimerError> {
        if !path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(path).map_err(|e| KartTimerError::ProfileIOError {
            path: path.to_path_buf(),
            source: e,
        })?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str(&content).map_err(|e| KartTimerError::ProfileSerializeError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Write through a temporary file so a failed save never leaves a truncated profile list
    fn save_to_file(&self, drivers: &[Driver]) -> Result<(), KartTimerError> {
        let io_error = |source| KartTimerError::ProfileIOError {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(io_error)?;
            }
        }

        let content = serde_json::to_string_pretty(drivers).map_err(|e| {
            KartTimerError::ProfileSerializeError {
                path: self.path.clone(),
                source: e,
            }
        })?;

        let temp_path = self.path.with_extension("json.tmp");
        {
            let mut temp_file = fs::File::create(&temp_path).map_err(io_error)?;
            temp_file
                .write_all(content.as_bytes())
                .map_err(io_error)?;
            temp_file.sync_all().map_err(io_error)?;
        }

        fs::rename(&temp_path, &self.path).map_err(|e| {
            let _ = fs::remove_file(&temp_path);
            io_error(e)
        })
    }

    /// Persist `drivers` and only then make them the in-memory state
    fn commit(&mut self, drivers: Vec<Driver>) -> Result<(), KartTimerError> {
        self.save_to_file(&drivers)?;
        self.drivers = drivers;
        Ok(())
    }
}

impl DriverProfileStore for DriverProfiles {
    fn list_drivers(&self) -> &[Driver] {
        &self.drivers
    }

    fn add_driver(
        &mut self,
        name: &str,
        kart_number: &str,
    ) -> Result<Option<Driver>, KartTimerError> {
        validate_name("name", name)?;
        validate_name("kart_number", kart_number)?;

        if !self.can_add() {
            warn!(
                "Driver profile limit of {} reached, not adding {}",
                MAX_DRIVERS, name
            );
            return Ok(None);
        }

        let driver = Driver::new(name.trim().to_string(), kart_number.trim().to_string());
        let mut drivers = self.drivers.clone();
        drivers.push(driver.clone());
        self.commit(drivers)?;

        info!("Added driver profile {} ({})", driver.name, driver.id);
        Ok(Some(driver))
    }

    fn update_driver(
        &mut self,
        id: Uuid,
        name: &str,
        kart_number: &str,
    ) -> Result<Driver, KartTimerError> {
        validate_name("name", name)?;
        validate_name("kart_number", kart_number)?;

        let mut drivers = self.drivers.clone();
        let driver = drivers
            .iter_mut()
            .find(|d| d.id == id)
            .ok_or_else(|| KartTimerError::DriverNotFound { id: id.to_string() })?;
        driver.name = name.trim().to_string();
        driver.kart_number = kart_number.trim().to_string();
        let updated = driver.clone();
        self.commit(drivers)?;

        info!("Updated driver profile {}", id);
        Ok(updated)
    }

    fn delete_driver(&mut self, id: Uuid) -> Result<bool, KartTimerError> {
        let mut drivers = self.drivers.clone();
        let before = drivers.len();
        drivers.retain(|d| d.id != id);
        if drivers.len() == before {
            return Ok(false);
        }

        self.commit(drivers)?;
        info!("Deleted driver profile {}", id);
        Ok(true)
    }
}
