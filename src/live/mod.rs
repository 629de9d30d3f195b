pub mod multi;
pub mod single;

use std::io::{self, BufRead, Write};
use std::sync::mpsc::Sender;
use std::thread;
use std::time::Duration;

use log::debug;

use crate::timing::{Precision, Stopwatch, format_lap_time};

/// How often the status line is redrawn, independent of the tick rate
const STATUS_REFRESH_MS: u64 = 100;

/// Everything the recording loops react to, delivered on one channel so timer state is only
/// touched by the loop's own thread
#[derive(Clone, Debug, PartialEq)]
pub enum LiveEvent {
    Tick,
    Input(String),
    InputClosed,
}

/// Forward stdin lines as [`LiveEvent::Input`] until stdin closes or the loop goes away
pub(crate) fn spawn_input_reader(sender: Sender<LiveEvent>) {
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else {
                break;
            };
            if sender.send(LiveEvent::Input(line)).is_err() {
                return;
            }
        }
        debug!("Terminal input closed");
        let _ = sender.send(LiveEvent::InputClosed);
    });
}

/// Ticks between two redraws of the status line
pub(crate) fn ticks_per_refresh(tick_interval: Duration) -> u64 {
    let tick_ms = tick_interval.as_millis().max(1) as u64;
    (STATUS_REFRESH_MS / tick_ms).max(1)
}

pub(crate) fn redraw(status: &str) {
    print!("\r{}  ", status);
    let _ = io::stdout().flush();
}

/// Current lap time, lap count and the last completed lap
pub fn status_line(stopwatch: &Stopwatch, precision: Precision) -> String {
    let last = stopwatch
        .last_lap()
        .map(|lap| format_lap_time(lap.as_secs_f64(), precision))
        .unwrap_or_else(|| "---".to_string());
    format!(
        "{} | laps {} | last {}",
        format_lap_time(stopwatch.elapsed().as_secs_f64(), precision),
        stopwatch.laps().len(),
        last
    )
}
