use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::debug;

/// Periodic tick source. A background thread sends a copy of `message` every interval; the
/// receiving thread owns all timer state and applies the ticks itself.
pub struct Ticker {
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Ticker {
    pub fn spawn<T>(interval: Duration, sender: Sender<T>, message: T) -> Self
    where
        T: Clone + Send + 'static,
    {
        let running = Arc::new(AtomicBool::new(true));
        let thread_running = running.clone();
        let handle = thread::spawn(move || {
            while thread_running.load(Ordering::Relaxed) {
                thread::sleep(interval);
                if !thread_running.load(Ordering::Relaxed) {
                    break;
                }
                if sender.send(message.clone()).is_err() {
                    debug!("Tick receiver dropped, stopping ticker");
                    break;
                }
            }
        });

        Self {
            running,
            handle: Some(handle),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Stop emitting ticks. At most one tick already in flight may still be delivered.
    pub fn invalidate(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.invalidate();
    }
}
