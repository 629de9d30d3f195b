// Background thread that owns the database so history reads don't block the timing loop

use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

use log::{debug, warn};

use crate::errors::KartTimerError;
use crate::storage::database::Database;

type Job = Box<dyn FnOnce(&mut Database) + Send>;

/// Runs storage jobs one at a time on a dedicated thread and sends each result back over its
/// own channel. Jobs cannot be cancelled once submitted.
pub struct StorageWorker {
    jobs: Option<Sender<Job>>,
    handle: Option<JoinHandle<Database>>,
}

impl StorageWorker {
    pub fn spawn(mut database: Database) -> Self {
        let (jobs_tx, jobs_rx) = mpsc::channel::<Job>();
        let handle = thread::spawn(move || {
            for job in &jobs_rx {
                job(&mut database);
            }
            debug!("Storage worker shutting down");
            database
        });

        Self {
            jobs: Some(jobs_tx),
            handle: Some(handle),
        }
    }

    /// Queue `job` and return the channel its result will arrive on
    pub fn submit<T, F>(&self, job: F) -> Result<Receiver<T>, KartTimerError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Database) -> T + Send + 'static,
    {
        let (result_tx, result_rx) = mpsc::channel();
        let job: Job = Box::new(move |database| {
            // the caller may have stopped waiting, nothing to do then
            let _ = result_tx.send(job(database));
        });

        self.jobs
            .as_ref()
            .ok_or(KartTimerError::WorkerDisconnected)?
            .send(job)
            .map_err(|_| KartTimerError::WorkerDisconnected)?;
        Ok(result_rx)
    }

    /// Submit and wait for the result
    pub fn run<T, F>(&self, job: F) -> Result<T, KartTimerError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Database) -> T + Send + 'static,
    {
        self.submit(job)?
            .recv()
            .map_err(|_| KartTimerError::WorkerDisconnected)
    }

    /// Finish queued jobs and hand the database back
    pub fn shutdown(mut self) -> Result<Database, KartTimerError> {
        self.jobs.take();
        self.handle
            .take()
            .ok_or(KartTimerError::WorkerDisconnected)?
            .join()
            .map_err(|_| KartTimerError::WorkerDisconnected)
    }
}

impl Drop for StorageWorker {
    fn drop(&mut self) {
        self.jobs.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("Storage worker panicked");
            }
        }
    }
}
