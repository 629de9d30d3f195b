// Session history and driver profile storage
// Sessions live in SQLite, driver profiles in a JSON file

pub mod database;
pub mod drivers;
pub mod multiple;
pub mod sessions;
pub mod types;
pub mod worker;

use uuid::Uuid;

use crate::errors::KartTimerError;

pub use database::Database;
pub use drivers::{DriverProfiles, MAX_DRIVERS};
pub use types::{
    Driver, DriverRemoval, Lap, LapTime, MultipleDriverEntry, MultipleLap, MultipleSession,
    NewMultipleDriver, NewMultipleSession, NewSession, Session, WeatherCondition,
};
pub use worker::StorageWorker;

/// Storage operations for single-driver sessions
pub trait SessionStore {
    /// Insert a session and its laps atomically, numbering laps from 1 in order
    fn create_session(&mut self, session: &NewSession) -> Result<i64, KartTimerError>;

    /// Most recent sessions first, each with its laps in lap order
    fn list_sessions(&self) -> Result<Vec<Session>, KartTimerError>;

    fn get_session(&self, id: i64) -> Result<Option<Session>, KartTimerError>;

    /// Delete a session and its laps. Returns false when there was nothing to delete.
    fn delete_session(&mut self, id: i64) -> Result<bool, KartTimerError>;
}

/// Storage operations for multi-kart sessions
pub trait MultipleSessionStore {
    fn create_multiple_session(
        &mut self,
        session: &NewMultipleSession,
    ) -> Result<i64, KartTimerError>;

    fn list_multiple_sessions(&self) -> Result<Vec<MultipleSession>, KartTimerError>;

    fn get_multiple_session(&self, id: i64) -> Result<Option<MultipleSession>, KartTimerError>;

    fn delete_multiple_session(&mut self, id: i64) -> Result<bool, KartTimerError>;

    /// Remove one driver and its laps; the session goes too once it has no drivers left
    fn delete_multiple_driver(
        &mut self,
        session_id: i64,
        driver_id: i64,
    ) -> Result<DriverRemoval, KartTimerError>;

    fn delete_all_multiple_sessions(&mut self) -> Result<usize, KartTimerError>;
}

/// Storage operations for driver profiles
pub trait DriverProfileStore {
    fn list_drivers(&self) -> &[Driver];

    /// Returns `None` without failing when the profile limit is reached
    fn add_driver(&mut self, name: &str, kart_number: &str)
    -> Result<Option<Driver>, KartTimerError>;

    fn update_driver(
        &mut self,
        id: Uuid,
        name: &str,
        kart_number: &str,
    ) -> Result<Driver, KartTimerError>;

    fn delete_driver(&mut self, id: Uuid) -> Result<bool, KartTimerError>;
}
