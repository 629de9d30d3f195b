// Core data structures for stored sessions and driver profiles

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::KartTimerError;

/// Track conditions recorded with a single-driver session
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum WeatherCondition {
    #[default]
    Dry,
    Wet,
    Greasy,
}

impl WeatherCondition {
    /// Integer code persisted in the `isWet` column
    pub fn code(&self) -> i64 {
        match self {
            WeatherCondition::Dry => 0,
            WeatherCondition::Wet => 1,
            WeatherCondition::Greasy => 2,
        }
    }

    /// Decode a persisted code. Anything unknown is shown as dry.
    pub fn from_code(code: i64) -> Self {
        match code {
            1 => WeatherCondition::Wet,
            2 => WeatherCondition::Greasy,
            _ => WeatherCondition::Dry,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            WeatherCondition::Dry => "DRY",
            WeatherCondition::Wet => "WET",
            WeatherCondition::Greasy => "GREASY",
        }
    }
}

/// A reusable entrant identity, independent of any session
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Driver {
    pub id: Uuid,
    pub name: String,
    pub kart_number: String,
}

impl Driver {
    pub fn new(name: String, kart_number: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            kart_number,
        }
    }
}

/// One recorded lap of a single-driver session
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Lap {
    pub id: i64,
    /// Lap duration in seconds
    pub lap_time: f64,
    /// 1-based position in recording order
    pub lap_number: u32,
}

/// A completed single-driver timing run
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Session {
    pub id: i64,
    pub session_name: String,
    pub driver_name: String,
    pub kart_number: String,
    pub weather: WeatherCondition,
    /// UTC, as stamped by the database
    pub created_at: NaiveDateTime,
    pub laps: Vec<Lap>,
}

/// One recorded lap of a driver inside a multiple session
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct MultipleLap {
    pub id: i64,
    pub lap_time: f64,
    pub lap_number: u32,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct MultipleDriverEntry {
    pub id: i64,
    pub driver_name: String,
    pub kart_number: String,
    pub laps: Vec<MultipleLap>,
}

/// A completed run covering up to four karts at once
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct MultipleSession {
    pub id: i64,
    pub session_name: String,
    pub created_at: NaiveDateTime,
    pub drivers: Vec<MultipleDriverEntry>,
}

/// Insert payload for a single-driver session. Laps are in recording order.
#[derive(Clone, Debug, PartialEq)]
pub struct NewSession {
    pub session_name: String,
    pub driver_name: String,
    pub kart_number: String,
    pub weather: WeatherCondition,
    pub laps: Vec<f64>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NewMultipleDriver {
    pub driver_name: String,
    pub kart_number: String,
    pub laps: Vec<f64>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NewMultipleSession {
    pub session_name: String,
    pub drivers: Vec<NewMultipleDriver>,
}

/// Outcome of removing one driver from a multiple session
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DriverRemoval {
    /// The driver is gone, other drivers remain
    DriverRemoved,
    /// The driver was the last one, so the whole session went with it
    SessionRemoved,
    NotFound,
}

/// Anything that carries a lap time can be fed to the lap statistics helpers
pub trait LapTime {
    fn lap_time(&self) -> f64;
}

impl LapTime for Lap {
    fn lap_time(&self) -> f64 {
        self.lap_time
    }
}

impl LapTime for MultipleLap {
    fn lap_time(&self) -> f64 {
        self.lap_time
    }
}

impl LapTime for f64 {
    fn lap_time(&self) -> f64 {
        *self
    }
}

pub(crate) fn validate_name(field: &str, value: &str) -> Result<(), KartTimerError> {
    if value.trim().is_empty() {
        return Err(KartTimerError::constraint(field, "cannot be empty"));
    }
    Ok(())
}

pub(crate) fn validate_laps(laps: &[f64]) -> Result<(), KartTimerError> {
    if let Some((index, time)) = laps
        .iter()
        .enumerate()
        .find(|(_, t)| !t.is_finite() || **t < 0.0)
    {
        return Err(KartTimerError::constraint(
            "lap_time",
            format!("lap {} has invalid time {}", index + 1, time),
        ));
    }
    Ok(())
}

impl NewSession {
    pub fn validate(&self) -> Result<(), KartTimerError> {
        validate_name("session_name", &self.session_name)?;
        validate_name("driver_name", &self.driver_name)?;
        validate_laps(&self.laps)
    }
}

impl NewMultipleSession {
    pub fn validate(&self) -> Result<(), KartTimerError> {
        validate_name("session_name", &self.session_name)?;
        if self.drivers.is_empty() {
            return Err(KartTimerError::constraint(
                "drivers",
                "a multiple session needs at least one driver",
            ));
        }
        for driver in &self.drivers {
            validate_name("driver_name", &driver.driver_name)?;
            validate_laps(&driver.laps)?;
        }
        Ok(())
    }
}
