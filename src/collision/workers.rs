//! Fixed pool of threads running narrow-phase overlap tests.
//!
//! Each worker accepts one request at a time: [`NarrowPhaseWorkerPool::write`]
//! hands it a batch without blocking, [`NarrowPhaseWorkerPool::read`] blocks
//! until that batch's results are back. Writing to a busy worker or reading
//! from an idle one is reported as an error rather than queued.

use std::{
    fmt,
    sync::mpsc::{self, Receiver, Sender},
    thread::{self, JoinHandle},
};

use parking_lot::Mutex;

use super::simplex::Simplex;
use crate::core::collider::Collider;

/// A candidate pair with snapshots of both narrow-phase colliders.
#[derive(Debug, Clone)]
pub struct NarrowPhaseJob {
    pub first: u32,
    pub second: u32,
    pub first_collider: Collider,
    pub second_collider: Collider,
}

#[derive(Debug, Clone)]
pub struct NarrowPhaseResult {
    pub first: u32,
    pub second: u32,
    pub overlap: bool,
    /// GJK tetrahedron for the EPA run that follows an overlap.
    pub seed: Option<Simplex>,
}

impl NarrowPhaseJob {
    pub fn run(&self) -> NarrowPhaseResult {
        let hit = self.first_collider.intersect(&self.second_collider);
        NarrowPhaseResult {
            first: self.first,
            second: self.second,
            overlap: hit.touching,
            seed: hit.seed,
        }
    }
}

#[derive(Debug)]
pub enum WorkerError {
    /// The worker already has a request in flight.
    Busy(usize),
    /// Nothing was written to the worker, so there is nothing to read.
    Idle(usize),
    NoSuchWorker(usize),
    /// The worker thread exited.
    Disconnected(usize),
    Spawn(std::io::Error),
}

impl fmt::Display for WorkerError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Busy(id) => write!(f, "worker {id} already has a request in flight"),
            Self::Idle(id) => write!(f, "worker {id} has no request in flight"),
            Self::NoSuchWorker(id) => write!(f, "no worker with index {id}"),
            Self::Disconnected(id) => write!(f, "worker {id} disconnected"),
            Self::Spawn(err) => write!(f, "failed to spawn worker thread: {err}"),
        }
    }
}

impl std::error::Error for WorkerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Spawn(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for WorkerError {
    fn from(err: std::io::Error) -> Self {
        Self::Spawn(err)
    }
}

enum WorkerCommand {
    Test(Vec<NarrowPhaseJob>),
    Shutdown,
}

struct Worker {
    tx_cmd: Sender<WorkerCommand>,
    rx_result: Receiver<Vec<NarrowPhaseResult>>,
    in_flight: bool,
    thread: Option<JoinHandle<()>>,
}

pub struct NarrowPhaseWorkerPool {
    workers: Vec<Mutex<Worker>>,
}

impl fmt::Debug for NarrowPhaseWorkerPool {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("NarrowPhaseWorkerPool")
            .field("workers", &self.workers.len())
            .finish()
    }
}

impl NarrowPhaseWorkerPool {
    /// Spawns `count` workers (at least one).
    pub fn new(count: usize) -> Result<Self, WorkerError> {
        let count = count.max(1);
        let mut workers = Vec::with_capacity(count);

        for id in 0..count {
            let (tx_cmd, rx_cmd) = mpsc::channel::<WorkerCommand>();
            let (tx_result, rx_result) = mpsc::channel::<Vec<NarrowPhaseResult>>();

            let thread = thread::Builder::new()
                .name(format!("narrow-phase-{id}"))
                .spawn(move || worker_loop(rx_cmd, tx_result))?;

            workers.push(Mutex::new(Worker {
                tx_cmd,
                rx_result,
                in_flight: false,
                thread: Some(thread),
            }));
        }

        log::debug!("started {count} narrow-phase workers");
        Ok(Self { workers })
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    pub fn is_busy(&self, worker: usize) -> bool {
        self.workers
            .get(worker)
            .map(|w| w.lock().in_flight)
            .unwrap_or(false)
    }

    /// Hands `jobs` to `worker` and returns immediately.
    pub fn write(&self, worker: usize, jobs: Vec<NarrowPhaseJob>) -> Result<(), WorkerError> {
        let mut slot = self
            .workers
            .get(worker)
            .ok_or(WorkerError::NoSuchWorker(worker))?
            .lock();
        if slot.in_flight {
            return Err(WorkerError::Busy(worker));
        }
        slot.tx_cmd
            .send(WorkerCommand::Test(jobs))
            .map_err(|_| WorkerError::Disconnected(worker))?;
        slot.in_flight = true;
        Ok(())
    }

    /// Blocks until `worker` finishes the request written to it.
    pub fn read(&self, worker: usize) -> Result<Vec<NarrowPhaseResult>, WorkerError> {
        let mut slot = self
            .workers
            .get(worker)
            .ok_or(WorkerError::NoSuchWorker(worker))?
            .lock();
        if !slot.in_flight {
            return Err(WorkerError::Idle(worker));
        }
        let results = slot
            .rx_result
            .recv()
            .map_err(|_| WorkerError::Disconnected(worker))?;
        slot.in_flight = false;
        Ok(results)
    }

    /// Splits `jobs` evenly across the pool and gathers every result, in job order.
    ///
    /// On error every worker that accepted a batch is still drained, so the
    /// pool stays usable for the next call.
    pub fn run_batch(
        &self,
        jobs: Vec<NarrowPhaseJob>,
    ) -> Result<Vec<NarrowPhaseResult>, WorkerError> {
        if jobs.is_empty() {
            return Ok(Vec::new());
        }

        let chunk = jobs.len().div_ceil(self.workers.len());
        let mut jobs = jobs.into_iter();
        let mut used = 0;
        let mut first_error = None;
        for worker in 0..self.workers.len() {
            let batch: Vec<_> = jobs.by_ref().take(chunk).collect();
            if batch.is_empty() {
                break;
            }
            if let Err(err) = self.write(worker, batch) {
                first_error = Some(err);
                break;
            }
            used += 1;
        }

        let mut results = Vec::new();
        for worker in 0..used {
            match self.read(worker) {
                Ok(batch) => results.extend(batch),
                Err(err) => {
                    first_error.get_or_insert(err);
                }
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(results),
        }
    }
}

#[cfg(test)]
impl NarrowPhaseWorkerPool {
    /// Shuts one worker down and waits for its thread to exit.
    fn stop_worker(&self, worker: usize) {
        if let Some(slot) = self.workers.get(worker) {
            let mut slot = slot.lock();
            let _ = slot.tx_cmd.send(WorkerCommand::Shutdown);
            if let Some(thread) = slot.thread.take() {
                let _ = thread.join();
            }
        }
    }
}

impl Drop for NarrowPhaseWorkerPool {
    fn drop(&mut self) {
        for worker in &self.workers {
            let _ = worker.lock().tx_cmd.send(WorkerCommand::Shutdown);
        }
        for worker in &self.workers {
            if let Some(thread) = worker.lock().thread.take() {
                let _ = thread.join();
            }
        }
        log::debug!("stopped {} narrow-phase workers", self.workers.len());
    }
}

fn worker_loop(rx_cmd: Receiver<WorkerCommand>, tx_result: Sender<Vec<NarrowPhaseResult>>) {
    while let Ok(cmd) = rx_cmd.recv() {
        match cmd {
            WorkerCommand::Test(jobs) => {
                let results = jobs.iter().map(NarrowPhaseJob::run).collect();
                if tx_result.send(results).is_err() {
                    break;
                }
            }
            WorkerCommand::Shutdown => break,
        }
    }
}
