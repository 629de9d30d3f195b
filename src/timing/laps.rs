// Lap statistics and display formatting shared by the live timer and history views

use std::fmt::Display;

use chrono::{Local, NaiveDateTime, TimeZone};
use clap::ValueEnum;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::storage::LapTime;

/// Fractional digits shown for a lap time
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Precision {
    /// `MM:SS.cc`
    #[default]
    Hundredths,
    /// `MM:SS.mmm`
    Milliseconds,
}

impl Precision {
    fn units_per_second(&self) -> u64 {
        match self {
            Precision::Hundredths => 100,
            Precision::Milliseconds => 1000,
        }
    }

    fn digits(&self) -> usize {
        match self {
            Precision::Hundredths => 2,
            Precision::Milliseconds => 3,
        }
    }
}

/// Render seconds as minutes, seconds and a fraction at the requested precision.
/// The value is rounded to the last shown digit; negative or non-finite input shows as zero.
pub fn format_lap_time(seconds: f64, precision: Precision) -> String {
    let per_second = precision.units_per_second();
    let units = if seconds.is_finite() && seconds > 0.0 {
        (seconds * per_second as f64).round() as u64
    } else {
        0
    };

    let whole_seconds = units / per_second;
    format!(
        "{:02}:{:02}.{:0width$}",
        whole_seconds / 60,
        whole_seconds % 60,
        units % per_second,
        width = precision.digits()
    )
}

/// First lap with the minimum time
pub fn fastest_lap<L: LapTime>(laps: &[L]) -> Option<&L> {
    fastest_lap_index(laps).map(|index| &laps[index])
}

pub fn fastest_lap_index<L: LapTime>(laps: &[L]) -> Option<usize> {
    laps.iter()
        .position_min_by(|a, b| a.lap_time().total_cmp(&b.lap_time()))
}

/// Compares by value, so every lap matching the best time counts as fastest
pub fn is_fastest<L: LapTime>(lap_time: f64, laps: &[L]) -> bool {
    fastest_lap(laps).is_some_and(|fastest| fastest.lap_time() == lap_time)
}

pub fn total_time<L: LapTime>(laps: &[L]) -> f64 {
    laps.iter().map(LapTime::lap_time).sum()
}

pub fn average_lap_time<L: LapTime>(laps: &[L]) -> Option<f64> {
    if laps.is_empty() {
        None
    } else {
        Some(total_time(laps) / laps.len() as f64)
    }
}

/// Session timestamp in local time, e.g. `Dec 13, 4:05 PM`
pub fn format_created_at(created_at: &NaiveDateTime) -> String {
    format_created_at_in(created_at, &Local)
}

/// Render a UTC timestamp in the given zone
pub fn format_created_at_in<Tz>(created_at: &NaiveDateTime, zone: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    zone.from_utc_datetime(created_at)
        .format("%b %-d, %-I:%M %p")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Lap;
    use chrono::{NaiveDate, Utc};

    fn lap(id: i64, lap_time: f64) -> Lap {
        Lap {
            id,
            lap_time,
            lap_number: id as u32,
        }
    }

    #[test]
    fn test_format_hundredths() {
        assert_eq!(format_lap_time(31.2, Precision::Hundredths), "00:31.20");
        assert_eq!(format_lap_time(65.437, Precision::Hundredths), "01:05.44");
        assert_eq!(format_lap_time(0.0, Precision::Hundredths), "00:00.00");
        assert_eq!(format_lap_time(59.999, Precision::Hundredths), "01:00.00");
    }

    #[test]
    fn test_format_milliseconds() {
        assert_eq!(format_lap_time(31.2, Precision::Milliseconds), "00:31.200");
        assert_eq!(format_lap_time(125.0456, Precision::Milliseconds), "02:05.046");
    }

    #[test]
    fn test_format_invalid_input() {
        assert_eq!(format_lap_time(-3.0, Precision::Hundredths), "00:00.00");
        assert_eq!(format_lap_time(f64::NAN, Precision::Milliseconds), "00:00.000");
        assert_eq!(format_lap_time(f64::INFINITY, Precision::Hundredths), "00:00.00");
    }

    #[test]
    fn test_fastest_lap() {
        let laps = vec![lap(1, 32.451), lap(2, 31.200), lap(3, 33.0)];
        assert_eq!(fastest_lap(&laps), Some(&laps[1]));
        assert_eq!(fastest_lap::<Lap>(&[]), None);
    }

    #[test]
    fn test_fastest_lap_ties() {
        let laps = vec![lap(1, 31.5), lap(2, 30.9), lap(3, 30.9)];
        assert_eq!(fastest_lap_index(&laps), Some(1));
        assert!(is_fastest(laps[1].lap_time, &laps));
        assert!(is_fastest(laps[2].lap_time, &laps));
        assert!(!is_fastest(laps[0].lap_time, &laps));
    }

    #[test]
    fn test_plain_seconds_work_as_laps() {
        let laps = [31.2, 30.9, 31.5];
        assert_eq!(fastest_lap(&laps), Some(&30.9));
        assert!((total_time(&laps) - 93.6).abs() < 1e-9);
        assert!((average_lap_time(&laps).unwrap() - 31.2).abs() < 1e-9);
        assert_eq!(average_lap_time::<f64>(&[]), None);
    }

    #[test]
    fn test_format_created_at() {
        let created_at = NaiveDate::from_ymd_opt(2025, 12, 13)
            .unwrap()
            .and_hms_opt(16, 5, 0)
            .unwrap();
        assert_eq!(format_created_at_in(&created_at, &Utc), "Dec 13, 4:05 PM");
    }
}
