use std::time::Duration;

use log::debug;

use crate::errors::KartTimerError;
use crate::storage::{NewMultipleDriver, NewMultipleSession};
use crate::timing::stopwatch::Stopwatch;

/// Number of karts timed side by side
pub const SLOT_COUNT: usize = 4;

/// One kart's independent stopwatch in multiple mode
#[derive(Clone, Debug)]
pub struct TimerSlot {
    pub name: String,
    pub kart_number: String,
    stopwatch: Stopwatch,
}

impl TimerSlot {
    fn new(index: usize, tick_interval: Duration) -> Self {
        Self {
            name: format!("Kart {}", index + 1),
            kart_number: String::new(),
            stopwatch: Stopwatch::new(tick_interval),
        }
    }

    pub fn stopwatch(&self) -> &Stopwatch {
        &self.stopwatch
    }
}

/// Four independent timers, one per kart
#[derive(Clone, Debug)]
pub struct MultiTimer {
    tick_interval: Duration,
    slots: [TimerSlot; SLOT_COUNT],
}

impl MultiTimer {
    pub fn new(tick_interval: Duration) -> Self {
        Self {
            tick_interval,
            slots: std::array::from_fn(|i| TimerSlot::new(i, tick_interval)),
        }
    }

    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    pub fn slots(&self) -> &[TimerSlot] {
        &self.slots
    }

    pub fn slot(&self, index: usize) -> Option<&TimerSlot> {
        self.slots.get(index)
    }

    pub fn slot_mut(&mut self, index: usize) -> Option<&mut TimerSlot> {
        self.slots.get_mut(index)
    }

    pub fn start(&mut self, index: usize) {
        if let Some(slot) = self.slots.get_mut(index) {
            slot.stopwatch.start();
        }
    }

    pub fn stop(&mut self, index: usize) {
        if let Some(slot) = self.slots.get_mut(index) {
            slot.stopwatch.stop();
        }
    }

    /// Start a stopped slot or stop a running one
    pub fn toggle(&mut self, index: usize) {
        if let Some(slot) = self.slots.get_mut(index) {
            if slot.stopwatch.is_running() {
                slot.stopwatch.stop();
            } else {
                slot.stopwatch.start();
            }
        }
    }

    pub fn lap(&mut self, index: usize) -> Option<Duration> {
        self.slots.get_mut(index)?.stopwatch.lap()
    }

    pub fn tick_all(&mut self) {
        for slot in self.slots.iter_mut() {
            slot.stopwatch.tick();
        }
    }

    pub fn any_running(&self) -> bool {
        self.slots.iter().any(|s| s.stopwatch.is_running())
    }

    /// Halt every slot and throw away times and laps without saving anything. Names and kart
    /// numbers stay.
    pub fn stop_all(&mut self) {
        debug!("Stopping and clearing all {} timer slots", SLOT_COUNT);
        for slot in self.slots.iter_mut() {
            slot.stopwatch.reset();
        }
    }

    /// Back to four fresh "Kart N" slots, labels included
    pub fn clear(&mut self) {
        self.slots = std::array::from_fn(|i| TimerSlot::new(i, self.tick_interval));
    }

    /// Snapshot of every slot that recorded at least one lap
    pub fn to_new_session(&self, session_name: &str) -> Result<NewMultipleSession, KartTimerError> {
        let drivers: Vec<NewMultipleDriver> = self
            .slots
            .iter()
            .filter(|slot| !slot.stopwatch.laps().is_empty())
            .map(|slot| NewMultipleDriver {
                driver_name: slot.name.clone(),
                kart_number: slot.kart_number.clone(),
                laps: slot.stopwatch.lap_seconds(),
            })
            .collect();

        if drivers.is_empty() {
            return Err(KartTimerError::constraint(
                "drivers",
                "no kart has recorded a lap",
            ));
        }

        let session = NewMultipleSession {
            session_name: session_name.trim().to_string(),
            drivers,
        };
        session.validate()?;
        Ok(session)
    }
}
