use std::sync::mpsc;

use log::{error, warn};

use crate::app::KartTimer;
use crate::errors::KartTimerError;
use crate::live::{LiveEvent, redraw, spawn_input_reader, status_line, ticks_per_refresh};
use crate::storage::{DriverProfileStore, MultipleSessionStore, SessionStore};
use crate::timing::{Precision, Ticker, format_lap_time, is_fastest};

/// How a recording loop ended
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Saved(i64),
    Discarded,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SingleCommand {
    /// Enter: start the stopwatch, or close the lap when it is already running
    StartOrLap,
    Save,
    Quit,
    Unknown,
}

impl SingleCommand {
    pub fn parse(line: &str) -> Self {
        match line.trim().to_ascii_lowercase().as_str() {
            "" | "l" | "lap" => SingleCommand::StartOrLap,
            "s" | "stop" | "save" => SingleCommand::Save,
            "q" | "quit" => SingleCommand::Quit,
            _ => SingleCommand::Unknown,
        }
    }
}

/// Run one single-driver session from the terminal. The session name and driver must already
/// be set on `app`.
pub fn record_session<S, D>(
    app: &mut KartTimer<S, D>,
    precision: Precision,
) -> Result<Outcome, KartTimerError>
where
    S: SessionStore + MultipleSessionStore,
    D: DriverProfileStore,
{
    if !app.single().can_start() {
        return Err(KartTimerError::constraint(
            "session",
            "select a driver and name the session before recording",
        ));
    }

    let tick_interval = app.single().stopwatch().tick_interval();
    let refresh = ticks_per_refresh(tick_interval);
    let (events_tx, events_rx) = mpsc::channel();
    spawn_input_reader(events_tx.clone());
    let mut ticker: Option<Ticker> = None;
    let mut ticks: u64 = 0;
    let mut input_open = true;

    println!("Enter: start / lap    s: stop and save    q: discard");

    for event in &events_rx {
        let command = match event {
            LiveEvent::Tick => {
                app.tick();
                ticks += 1;
                if ticks % refresh == 0 {
                    redraw(&status_line(app.single().stopwatch(), precision));
                }
                continue;
            }
            LiveEvent::Input(line) => SingleCommand::parse(&line),
            LiveEvent::InputClosed if app.single().stopwatch().laps().is_empty() => {
                SingleCommand::Quit
            }
            LiveEvent::InputClosed => {
                warn!("Input closed, saving recorded laps");
                input_open = false;
                SingleCommand::Save
            }
        };

        match command {
            SingleCommand::StartOrLap if !app.single().is_running() => {
                app.start_timer()?;
                ticker = Some(Ticker::spawn(tick_interval, events_tx.clone(), LiveEvent::Tick));
            }
            SingleCommand::StartOrLap => {
                if let Some(lap) = app.record_lap() {
                    let laps = app.single().stopwatch().lap_seconds();
                    let marker = if is_fastest(lap.as_secs_f64(), &laps) { " *" } else { "" };
                    println!(
                        "\rLap {:>3}  {}{}",
                        laps.len(),
                        format_lap_time(lap.as_secs_f64(), precision),
                        marker
                    );
                }
            }
            SingleCommand::Save if !app.single().has_recording() => {
                println!("\rNothing recorded yet, press Enter to start");
            }
            SingleCommand::Save => {
                if let Some(mut t) = ticker.take() {
                    t.invalidate();
                }
                match app.save_session() {
                    Ok(id) => {
                        println!("\nSaved session {}", id);
                        return Ok(Outcome::Saved(id));
                    }
                    Err(e) if e.is_retryable() && input_open => {
                        error!("{}, press s to try again", e);
                    }
                    Err(e) => return Err(e),
                }
            }
            SingleCommand::Quit => {
                if let Some(mut t) = ticker.take() {
                    t.invalidate();
                }
                app.reset_timer();
                println!("\nSession discarded");
                return Ok(Outcome::Discarded);
            }
            SingleCommand::Unknown => {
                println!("\rEnter: start / lap    s: stop and save    q: discard");
            }
        }
    }

    Ok(Outcome::Discarded)
}
