// Plain-text views of stored sessions for the terminal front end

use std::fmt::Write;

use itertools::Itertools;

use crate::storage::{LapTime, MultipleSession, Session};
use crate::timing::{
    Precision, average_lap_time, fastest_lap, format_created_at, format_lap_time, is_fastest,
};

fn best_lap_label<L: LapTime>(laps: &[L], precision: Precision) -> String {
    fastest_lap(laps)
        .map(|lap| format_lap_time(lap.lap_time(), precision))
        .unwrap_or_else(|| "---".to_string())
}

/// Laps in recording order, fastest ones flagged
fn write_laps<L: LapTime>(out: &mut String, indent: &str, laps: &[L], precision: Precision) {
    for (index, lap) in laps.iter().enumerate() {
        let marker = if is_fastest(lap.lap_time(), laps) {
            "  fastest"
        } else {
            ""
        };
        let _ = writeln!(
            out,
            "{}Lap {:>3}  {}{}",
            indent,
            index + 1,
            format_lap_time(lap.lap_time(), precision),
            marker
        );
    }
}

/// One line per session: id, name, driver, weather, lap count, best lap and date
pub fn session_summary(session: &Session, precision: Precision) -> String {
    format!(
        "#{:<4} {:<20} {} (kart {})  {}  {} laps  best {}  {}",
        session.id,
        session.session_name,
        session.driver_name,
        session.kart_number,
        session.weather.label(),
        session.laps.len(),
        best_lap_label(&session.laps, precision),
        format_created_at(&session.created_at)
    )
}

pub fn session_detail(session: &Session, precision: Precision) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", session.session_name.to_uppercase());
    let _ = writeln!(
        out,
        "{} - KART {} - {} - {}",
        session.driver_name,
        session.kart_number,
        session.weather.label(),
        format_created_at(&session.created_at)
    );
    write_laps(&mut out, "  ", &session.laps, precision);
    let _ = writeln!(out, "Best lap {}", best_lap_label(&session.laps, precision));
    if let Some(average) = average_lap_time(&session.laps) {
        let _ = writeln!(out, "Average  {}", format_lap_time(average, precision));
    }
    out
}

pub fn multiple_session_summary(session: &MultipleSession, precision: Precision) -> String {
    let drivers = session
        .drivers
        .iter()
        .map(|d| format!("{} {}", d.driver_name, best_lap_label(&d.laps, precision)))
        .join(", ");
    format!(
        "#{:<4} {:<20} {}  {}",
        session.id,
        session.session_name,
        drivers,
        format_created_at(&session.created_at)
    )
}

pub fn multiple_session_detail(session: &MultipleSession, precision: Precision) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} - {}",
        session.session_name.to_uppercase(),
        format_created_at(&session.created_at)
    );
    for driver in &session.drivers {
        let kart = if driver.kart_number.is_empty() {
            String::new()
        } else {
            format!(" (kart {})", driver.kart_number)
        };
        let _ = writeln!(out, "[driver {}] {}{}", driver.id, driver.driver_name, kart);
        write_laps(&mut out, "  ", &driver.laps, precision);
    }
    out
}
