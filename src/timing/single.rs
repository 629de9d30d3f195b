use std::time::Duration;

use crate::errors::KartTimerError;
use crate::storage::{Driver, NewSession, WeatherCondition};
use crate::timing::stopwatch::Stopwatch;

/// Timing state for one driver: the stopwatch plus the details the run is saved under
#[derive(Clone, Debug)]
pub struct SingleTimer {
    stopwatch: Stopwatch,
    pub session_name: String,
    pub driver: Option<Driver>,
    pub weather: WeatherCondition,
}

impl SingleTimer {
    pub fn new(tick_interval: Duration) -> Self {
        Self {
            stopwatch: Stopwatch::new(tick_interval),
            session_name: String::new(),
            driver: None,
            weather: WeatherCondition::default(),
        }
    }

    /// True once a driver is selected and the session has a name. Callers check this before
    /// calling [`SingleTimer::start`]; the timer itself does not.
    pub fn can_start(&self) -> bool {
        self.driver.is_some() && !self.session_name.trim().is_empty()
    }

    pub fn start(&mut self) {
        self.stopwatch.start();
    }

    pub fn stop(&mut self) {
        self.stopwatch.stop();
    }

    pub fn tick(&mut self) {
        self.stopwatch.tick();
    }

    pub fn lap(&mut self) -> Option<Duration> {
        self.stopwatch.lap()
    }

    /// Clear time, laps and the session details
    pub fn reset(&mut self) {
        self.stopwatch.reset();
        self.session_name.clear();
        self.driver = None;
        self.weather = WeatherCondition::default();
    }

    pub fn stopwatch(&self) -> &Stopwatch {
        &self.stopwatch
    }

    pub fn is_running(&self) -> bool {
        self.stopwatch.is_running()
    }

    /// Whether there is a run to save: the stopwatch is going or has closed at least one lap
    pub fn has_recording(&self) -> bool {
        self.stopwatch.is_running() || !self.stopwatch.laps().is_empty()
    }

    /// Snapshot of the run as a storage payload
    pub fn to_new_session(&self) -> Result<NewSession, KartTimerError> {
        let driver = self
            .driver
            .as_ref()
            .ok_or_else(|| KartTimerError::constraint("driver", "no driver selected"))?;
        let session = NewSession {
            session_name: self.session_name.trim().to_string(),
            driver_name: driver.name.clone(),
            kart_number: driver.kart_number.clone(),
            weather: self.weather,
            laps: self.stopwatch.lap_seconds(),
        };
        session.validate()?;
        Ok(session)
    }
}
