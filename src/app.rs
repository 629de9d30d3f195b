// Application facade: the operations a front end calls, wired to injected stores

use std::time::Duration;

use log::{debug, info};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::errors::KartTimerError;
use crate::storage::{
    Driver, DriverProfileStore, DriverRemoval, MultipleSession, MultipleSessionStore, Session,
    SessionStore, WeatherCondition,
};
use crate::timing::{MultiTimer, SingleTimer};

/// Owns the live timers and the stores they save into. Build one at startup with the stores
/// of your choice and pass it to the front end.
pub struct KartTimer<S, D> {
    store: S,
    drivers: D,
    single: SingleTimer,
    multi: MultiTimer,
    default_multi_session_name: String,
}

impl<S, D> KartTimer<S, D>
where
    S: SessionStore + MultipleSessionStore,
    D: DriverProfileStore,
{
    pub fn new(store: S, drivers: D, config: &AppConfig) -> Self {
        Self {
            store,
            drivers,
            single: SingleTimer::new(config.single_tick_interval()),
            multi: MultiTimer::new(config.multi_tick_interval()),
            default_multi_session_name: config.default_multi_session_name.clone(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn drivers(&self) -> &D {
        &self.drivers
    }

    pub fn single(&self) -> &SingleTimer {
        &self.single
    }

    pub fn multi(&self) -> &MultiTimer {
        &self.multi
    }

    /// Mutable access for renaming slots and setting kart numbers
    pub fn multi_mut(&mut self) -> &mut MultiTimer {
        &mut self.multi
    }

    // Single-driver timing

    pub fn select_driver(&mut self, id: Uuid) -> Result<(), KartTimerError> {
        let driver = self
            .drivers
            .list_drivers()
            .iter()
            .find(|d| d.id == id)
            .cloned()
            .ok_or_else(|| KartTimerError::DriverNotFound { id: id.to_string() })?;
        debug!("Selected driver {} for the next session", driver.name);
        self.single.driver = Some(driver);
        Ok(())
    }

    pub fn set_session_name(&mut self, session_name: &str) {
        self.single.session_name = session_name.to_string();
    }

    pub fn set_weather(&mut self, weather: WeatherCondition) {
        self.single.weather = weather;
    }

    /// Start the single stopwatch once a driver and a session name are set
    pub fn start_timer(&mut self) -> Result<(), KartTimerError> {
        if self.single.driver.is_none() {
            return Err(KartTimerError::constraint("driver", "no driver selected"));
        }
        if !self.single.can_start() {
            return Err(KartTimerError::constraint("session_name", "cannot be empty"));
        }
        self.single.start();
        Ok(())
    }

    pub fn tick(&mut self) {
        self.single.tick();
    }

    /// Ignored unless the stopwatch is running
    pub fn record_lap(&mut self) -> Option<Duration> {
        self.single.lap()
    }

    pub fn stop_timer(&mut self) {
        self.single.stop();
    }

    pub fn reset_timer(&mut self) {
        self.single.reset();
    }

    /// Stop the stopwatch and store the run. The timer is only reset once the write succeeded,
    /// so a failed save can be retried.
    pub fn save_session(&mut self) -> Result<i64, KartTimerError> {
        if !self.single.has_recording() {
            return Err(KartTimerError::constraint(
                "session",
                "the stopwatch was never started",
            ));
        }
        self.single.stop();
        let session = self.single.to_new_session()?;
        let id = self.store.create_session(&session)?;
        self.single.reset();
        Ok(id)
    }

    pub fn list_sessions(&self) -> Result<Vec<Session>, KartTimerError> {
        self.store.list_sessions()
    }

    pub fn get_session(&self, id: i64) -> Result<Option<Session>, KartTimerError> {
        self.store.get_session(id)
    }

    pub fn delete_session(&mut self, id: i64) -> Result<bool, KartTimerError> {
        self.store.delete_session(id)
    }

    // Multi-kart timing

    pub fn start_slot(&mut self, index: usize) {
        self.multi.start(index);
    }

    pub fn stop_slot(&mut self, index: usize) {
        self.multi.stop(index);
    }

    pub fn toggle_slot(&mut self, index: usize) {
        self.multi.toggle(index);
    }

    pub fn record_slot_lap(&mut self, index: usize) -> Option<Duration> {
        self.multi.lap(index)
    }

    pub fn tick_slots(&mut self) {
        self.multi.tick_all();
    }

    /// Stop every slot and discard its times and laps without saving. Slot labels stay.
    pub fn stop_all(&mut self) {
        self.multi.stop_all();
    }

    /// Store every slot that has laps, then clear the slots. Uses the configured default name
    /// when `session_name` is `None`.
    pub fn save_multiple_session(
        &mut self,
        session_name: Option<&str>,
    ) -> Result<i64, KartTimerError> {
        for index in 0..self.multi.slots().len() {
            self.multi.stop(index);
        }
        let name = session_name.unwrap_or(&self.default_multi_session_name);
        let session = self.multi.to_new_session(name)?;
        let id = self.store.create_multiple_session(&session)?;
        self.multi.clear();
        Ok(id)
    }

    pub fn list_multiple_sessions(&self) -> Result<Vec<MultipleSession>, KartTimerError> {
        self.store.list_multiple_sessions()
    }

    pub fn get_multiple_session(&self, id: i64) -> Result<Option<MultipleSession>, KartTimerError> {
        self.store.get_multiple_session(id)
    }

    pub fn delete_multiple_session(&mut self, id: i64) -> Result<bool, KartTimerError> {
        self.store.delete_multiple_session(id)
    }

    pub fn delete_multiple_driver(
        &mut self,
        session_id: i64,
        driver_id: i64,
    ) -> Result<DriverRemoval, KartTimerError> {
        self.store.delete_multiple_driver(session_id, driver_id)
    }

    pub fn delete_all_multiple_sessions(&mut self) -> Result<usize, KartTimerError> {
        self.store.delete_all_multiple_sessions()
    }

    // Driver profiles

    pub fn list_drivers(&self) -> &[Driver] {
        self.drivers.list_drivers()
    }

    pub fn add_driver(
        &mut self,
        name: &str,
        kart_number: &str,
    ) -> Result<Option<Driver>, KartTimerError> {
        self.drivers.add_driver(name, kart_number)
    }

    /// Edits also apply to the driver currently selected for timing
    pub fn update_driver(
        &mut self,
        id: Uuid,
        name: &str,
        kart_number: &str,
    ) -> Result<Driver, KartTimerError> {
        let driver = self.drivers.update_driver(id, name, kart_number)?;
        if self.single.driver.as_ref().is_some_and(|d| d.id == id) {
            self.single.driver = Some(driver.clone());
        }
        Ok(driver)
    }

    pub fn delete_driver(&mut self, id: Uuid) -> Result<bool, KartTimerError> {
        let removed = self.drivers.delete_driver(id)?;
        if removed && self.single.driver.as_ref().is_some_and(|d| d.id == id) {
            info!("Deleted the selected driver, clearing selection");
            self.single.driver = None;
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{Database, DriverProfiles};
    use tempfile::TempDir;

    fn app(temp_dir: &TempDir) -> KartTimer<Database, DriverProfiles> {
        let profiles = DriverProfiles::open(temp_dir.path().join("drivers.json")).unwrap();
        KartTimer::new(
            Database::open_in_memory().unwrap(),
            profiles,
            &AppConfig::default(),
        )
    }

    fn ticks(app: &mut KartTimer<Database, DriverProfiles>, count: usize) {
        for _ in 0..count {
            app.tick();
        }
    }

    #[test]
    fn test_start_requires_driver_and_name() {
        let temp_dir = TempDir::new().unwrap();
        let mut app = app(&temp_dir);

        assert!(app.start_timer().is_err());
        let alice = app.add_driver("Alice", "7").unwrap().unwrap();
        app.select_driver(alice.id).unwrap();
        assert!(app.start_timer().is_err());

        app.set_session_name("Practice");
        app.start_timer().unwrap();
        assert!(app.single().is_running());
    }

    #[test]
    fn test_single_session_flow() {
        let temp_dir = TempDir::new().unwrap();
        let mut app = app(&temp_dir);
        let alice = app.add_driver("Alice", "7").unwrap().unwrap();
        app.select_driver(alice.id).unwrap();
        app.set_session_name("Practice");
        app.set_weather(WeatherCondition::Wet);

        app.start_timer().unwrap();
        ticks(&mut app, 20);
        assert_eq!(app.record_lap(), Some(Duration::from_secs(1)));
        ticks(&mut app, 10);
        app.record_lap();

        let id = app.save_session().unwrap();
        assert!(!app.single().is_running());
        assert!(app.single().driver.is_none());

        let sessions = app.list_sessions().unwrap();
        assert_eq!(sessions[0].id, id);
        assert_eq!(sessions[0].driver_name, "Alice");
        assert_eq!(sessions[0].weather, WeatherCondition::Wet);
        let times: Vec<f64> = sessions[0].laps.iter().map(|l| l.lap_time).collect();
        assert_eq!(times, vec![1.0, 0.5]);

        assert!(app.delete_session(id).unwrap());
        assert!(app.list_sessions().unwrap().is_empty());
    }

    #[test]
    fn test_lap_ignored_when_stopped() {
        let temp_dir = TempDir::new().unwrap();
        let mut app = app(&temp_dir);
        assert_eq!(app.record_lap(), None);
        assert!(app.single().stopwatch().laps().is_empty());
    }

    #[test]
    fn test_failed_save_keeps_timer_state() {
        let temp_dir = TempDir::new().unwrap();
        let mut app = app(&temp_dir);
        app.set_session_name("Practice");
        app.single.start();
        app.tick();
        app.record_lap();

        // no driver selected
        assert!(app.save_session().is_err());
        assert_eq!(app.single().stopwatch().laps().len(), 1);
        assert_eq!(app.single().session_name, "Practice");
    }

    #[test]
    fn test_save_before_start_stores_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let mut app = app(&temp_dir);
        let alice = app.add_driver("Alice", "7").unwrap().unwrap();
        app.select_driver(alice.id).unwrap();
        app.set_session_name("Practice");

        assert!(matches!(
            app.save_session(),
            Err(KartTimerError::ConstraintViolation { .. })
        ));
        assert!(app.list_sessions().unwrap().is_empty());
        assert_eq!(app.single().session_name, "Practice");

        // started but no lap closed yet still counts as a run
        app.start_timer().unwrap();
        app.tick();
        let id = app.save_session().unwrap();
        assert!(app.get_session(id).unwrap().unwrap().laps.is_empty());
    }

    #[test]
    fn test_multiple_session_flow() {
        let temp_dir = TempDir::new().unwrap();
        let mut app = app(&temp_dir);
        app.multi_mut().slot_mut(0).unwrap().name = "Alice".to_string();

        app.start_slot(0);
        app.start_slot(1);
        for _ in 0..100 {
            app.tick_slots();
        }
        app.record_slot_lap(0);
        app.stop_slot(1);

        let id = app.save_multiple_session(None).unwrap();
        assert!(!app.multi().any_running());

        let session = app.get_multiple_session(id).unwrap().unwrap();
        assert_eq!(session.session_name, "Practice Session");
        assert_eq!(session.drivers.len(), 1);
        assert_eq!(session.drivers[0].driver_name, "Alice");
        assert_eq!(session.drivers[0].laps[0].lap_time, 1.0);

        let driver_id = session.drivers[0].id;
        assert_eq!(
            app.delete_multiple_driver(id, driver_id).unwrap(),
            DriverRemoval::SessionRemoved
        );
        assert!(app.list_multiple_sessions().unwrap().is_empty());
    }

    #[test]
    fn test_stop_all_discards_without_saving() {
        let temp_dir = TempDir::new().unwrap();
        let mut app = app(&temp_dir);
        app.toggle_slot(2);
        app.tick_slots();
        app.record_slot_lap(2);

        app.stop_all();

        assert!(app.save_multiple_session(Some("Heat 1")).is_err());
        assert!(app.list_multiple_sessions().unwrap().is_empty());
    }

    #[test]
    fn test_slot_labels_kept_until_saved() {
        let temp_dir = TempDir::new().unwrap();
        let mut app = app(&temp_dir);
        let slot = app.multi_mut().slot_mut(0).unwrap();
        slot.name = "Alice".to_string();
        slot.kart_number = "7".to_string();

        app.start_slot(0);
        app.tick_slots();
        app.record_slot_lap(0);
        app.stop_all();

        app.start_slot(0);
        app.tick_slots();
        app.record_slot_lap(0);
        let id = app.save_multiple_session(Some("Heat 1")).unwrap();

        let session = app.get_multiple_session(id).unwrap().unwrap();
        assert_eq!(session.drivers.len(), 1);
        assert_eq!(session.drivers[0].driver_name, "Alice");
        assert_eq!(session.drivers[0].kart_number, "7");
        assert_eq!(session.drivers[0].laps.len(), 1);

        // a saved session hands back fresh slots
        assert_eq!(app.multi().slot(0).unwrap().name, "Kart 1");
        assert!(app.multi().slot(0).unwrap().kart_number.is_empty());
    }

    #[test]
    fn test_driver_edits_follow_selection() {
        let temp_dir = TempDir::new().unwrap();
        let mut app = app(&temp_dir);
        let alice = app.add_driver("Alice", "7").unwrap().unwrap();
        app.select_driver(alice.id).unwrap();

        app.update_driver(alice.id, "Alice", "9").unwrap();
        assert_eq!(app.single().driver.as_ref().unwrap().kart_number, "9");

        assert!(app.delete_driver(alice.id).unwrap());
        assert!(app.single().driver.is_none());
        assert!(app.list_drivers().is_empty());
        assert!(matches!(
            app.select_driver(alice.id),
            Err(KartTimerError::DriverNotFound { .. })
        ));
    }
}
