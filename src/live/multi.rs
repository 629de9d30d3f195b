use std::sync::mpsc;

use itertools::Itertools;
use log::{error, warn};

use crate::app::KartTimer;
use crate::errors::KartTimerError;
use crate::live::single::Outcome;
use crate::live::{LiveEvent, redraw, spawn_input_reader, ticks_per_refresh};
use crate::storage::{DriverProfileStore, MultipleSessionStore, SessionStore};
use crate::timing::{MultiTimer, Precision, SLOT_COUNT, Ticker, format_lap_time};

const HELP: &str = "1-4: start / lap a kart    p1-p4: pause    x: stop all and clear    s: save    q: quit";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MultiCommand {
    StartOrLap(usize),
    Pause(usize),
    StopAll,
    Save,
    Quit,
    Unknown,
}

impl MultiCommand {
    pub fn parse(line: &str) -> Self {
        let line = line.trim().to_ascii_lowercase();
        let slot = |digits: &str| {
            digits
                .parse::<usize>()
                .ok()
                .filter(|n| (1..=SLOT_COUNT).contains(n))
                .map(|n| n - 1)
        };

        match line.as_str() {
            "x" => MultiCommand::StopAll,
            "s" | "save" => MultiCommand::Save,
            "q" | "quit" => MultiCommand::Quit,
            other => {
                if let Some(index) = other.strip_prefix('p').and_then(slot) {
                    MultiCommand::Pause(index)
                } else if let Some(index) = slot(other) {
                    MultiCommand::StartOrLap(index)
                } else {
                    MultiCommand::Unknown
                }
            }
        }
    }
}

/// One compact column per kart: name, current lap time and lap count
pub fn multi_status_line(timer: &MultiTimer, precision: Precision) -> String {
    timer
        .slots()
        .iter()
        .map(|slot| {
            let stopwatch = slot.stopwatch();
            format!(
                "{}{} {} ({})",
                slot.name,
                if stopwatch.is_running() { "" } else { " ||" },
                format_lap_time(stopwatch.elapsed().as_secs_f64(), precision),
                stopwatch.laps().len()
            )
        })
        .join(" | ")
}

/// Run the four-kart timer from the terminal until the session is saved or abandoned
pub fn record_multiple_session<S, D>(
    app: &mut KartTimer<S, D>,
    session_name: Option<&str>,
    precision: Precision,
) -> Result<Outcome, KartTimerError>
where
    S: SessionStore + MultipleSessionStore,
    D: DriverProfileStore,
{
    if session_name.is_some_and(|name| name.trim().is_empty()) {
        return Err(KartTimerError::constraint("session_name", "cannot be empty"));
    }

    let tick_interval = app.multi().tick_interval();
    let refresh = ticks_per_refresh(tick_interval);
    let (events_tx, events_rx) = mpsc::channel();
    spawn_input_reader(events_tx.clone());
    let mut ticker = Ticker::spawn(tick_interval, events_tx, LiveEvent::Tick);
    let mut ticks: u64 = 0;
    let mut input_open = true;

    println!("{}", HELP);

    for event in &events_rx {
        let command = match event {
            LiveEvent::Tick => {
                app.tick_slots();
                ticks += 1;
                if ticks % refresh == 0 && app.multi().any_running() {
                    redraw(&multi_status_line(app.multi(), precision));
                }
                continue;
            }
            LiveEvent::Input(line) => MultiCommand::parse(&line),
            LiveEvent::InputClosed => {
                warn!("Input closed, saving any recorded laps");
                input_open = false;
                MultiCommand::Save
            }
        };

        match command {
            MultiCommand::StartOrLap(index) => {
                if app.multi().slot(index).is_some_and(|s| s.stopwatch().is_running()) {
                    if let Some(lap) = app.record_slot_lap(index) {
                        let slot = &app.multi().slots()[index];
                        println!(
                            "\r{} lap {:>3}  {}",
                            slot.name,
                            slot.stopwatch().laps().len(),
                            format_lap_time(lap.as_secs_f64(), precision)
                        );
                    }
                } else {
                    app.start_slot(index);
                }
            }
            MultiCommand::Pause(index) => app.stop_slot(index),
            MultiCommand::StopAll => {
                app.stop_all();
                println!("\rAll karts stopped and cleared");
            }
            MultiCommand::Save => match app.save_multiple_session(session_name) {
                Ok(id) => {
                    ticker.invalidate();
                    println!("\nSaved multiple session {}", id);
                    return Ok(Outcome::Saved(id));
                }
                Err(e @ KartTimerError::ConstraintViolation { .. }) => {
                    println!("\rNot saved: {}", e);
                    if !input_open {
                        break;
                    }
                }
                Err(e) if e.is_retryable() && input_open => error!("{}, press s to try again", e),
                Err(e) => return Err(e),
            },
            MultiCommand::Quit => break,
            MultiCommand::Unknown => println!("\r{}", HELP),
        }
    }

    ticker.invalidate();
    app.stop_all();
    println!("\nMultiple session discarded");
    Ok(Outcome::Discarded)
}
