use std::time::Duration;

/// Lap stopwatch advanced by a fixed periodic tick.
///
/// Elapsed time is only ever the sum of the ticks received while running, so precision is
/// bounded by the tick interval and by how regularly ticks are delivered.
#[derive(Clone, Debug, PartialEq)]
pub struct Stopwatch {
    tick_interval: Duration,
    elapsed: Duration,
    running: bool,
    laps: Vec<Duration>,
}

impl Stopwatch {
    pub fn new(tick_interval: Duration) -> Self {
        Self {
            tick_interval,
            elapsed: Duration::ZERO,
            running: false,
            laps: Vec::new(),
        }
    }

    pub fn start(&mut self) {
        self.running = true;
    }

    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Advance by one tick interval. Ticks arriving while stopped are dropped.
    pub fn tick(&mut self) {
        if self.running {
            self.elapsed += self.tick_interval;
        }
    }

    /// Close the current lap. Returns the lap time, or `None` when not running.
    pub fn lap(&mut self) -> Option<Duration> {
        if !self.running {
            return None;
        }
        let lap_time = self.elapsed;
        self.laps.push(lap_time);
        self.elapsed = Duration::ZERO;
        Some(lap_time)
    }

    pub fn reset(&mut self) {
        self.running = false;
        self.elapsed = Duration::ZERO;
        self.laps.clear();
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Time accumulated in the current, unfinished lap
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn laps(&self) -> &[Duration] {
        &self.laps
    }

    pub fn last_lap(&self) -> Option<Duration> {
        self.laps.last().copied()
    }

    /// Recorded laps in seconds, the unit sessions are stored in
    pub fn lap_seconds(&self) -> Vec<f64> {
        self.laps.iter().map(Duration::as_secs_f64).collect()
    }

    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const TICK: Duration = Duration::from_millis(50);

    #[test]
    fn test_ticks_only_count_while_running() {
        let mut stopwatch = Stopwatch::new(TICK);
        stopwatch.tick();
        assert_eq!(stopwatch.elapsed(), Duration::ZERO);

        stopwatch.start();
        for _ in 0..20 {
            stopwatch.tick();
        }
        assert_eq!(stopwatch.elapsed(), Duration::from_secs(1));

        stopwatch.stop();
        stopwatch.tick();
        assert_eq!(stopwatch.elapsed(), Duration::from_secs(1));
    }

    #[test]
    fn test_lap_resets_elapsed() {
        let mut stopwatch = Stopwatch::new(TICK);
        stopwatch.start();
        for _ in 0..3 {
            stopwatch.tick();
        }

        assert_eq!(stopwatch.lap(), Some(Duration::from_millis(150)));
        assert_eq!(stopwatch.elapsed(), Duration::ZERO);
        assert_eq!(stopwatch.laps(), &[Duration::from_millis(150)]);
        assert_eq!(stopwatch.lap_seconds(), vec![0.15]);
    }

    #[test]
    fn test_lap_while_stopped_is_ignored() {
        let mut stopwatch = Stopwatch::new(TICK);
        assert_eq!(stopwatch.lap(), None);
        assert!(stopwatch.laps().is_empty());

        stopwatch.start();
        stopwatch.tick();
        stopwatch.stop();
        assert_eq!(stopwatch.lap(), None);
        assert_eq!(stopwatch.elapsed(), TICK);
    }

    #[test]
    fn test_reset_clears_everything() {
        let mut stopwatch = Stopwatch::new(TICK);
        stopwatch.start();
        stopwatch.tick();
        stopwatch.lap();
        stopwatch.tick();

        stopwatch.reset();

        assert!(!stopwatch.is_running());
        assert_eq!(stopwatch.elapsed(), Duration::ZERO);
        assert!(stopwatch.laps().is_empty());
        assert_eq!(stopwatch.last_lap(), None);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_lap_count_matches_calls(ticks in prop::collection::vec(0usize..40, 0..50)) {
            let mut stopwatch = Stopwatch::new(TICK);
            stopwatch.start();

            for tick_count in &ticks {
                for _ in 0..*tick_count {
                    stopwatch.tick();
                }
                prop_assert!(stopwatch.lap().is_some());
            }

            prop_assert_eq!(stopwatch.laps().len(), ticks.len());
            for (lap, tick_count) in stopwatch.laps().iter().zip(&ticks) {
                prop_assert_eq!(*lap, TICK * *tick_count as u32);
            }
            prop_assert!(stopwatch.lap_seconds().iter().all(|t| *t >= 0.0));
        }

        #[test]
        fn prop_stopped_stopwatch_ignores_laps(calls in 0usize..30) {
            let mut stopwatch = Stopwatch::new(TICK);
            for _ in 0..calls {
                prop_assert!(stopwatch.lap().is_none());
            }
            prop_assert!(stopwatch.laps().is_empty());
        }
    }
}
