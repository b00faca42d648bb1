// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory coordinator state: jobs, queue, results, worker registry.
//!
//! One value bundles everything the handlers share, guarded by a single
//! mutex at the call sites. Every operation that spans multiple maps
//! (dispatch reservation, result recording, eviction with requeue) is one
//! method, so callers holding the lock observe it atomically.

use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use mc_core::{Job, JobResult, JobSpec, JobState, WorkerId, WorkerInfo};
use thiserror::Error;

/// A dispatch reservation: the job snapshot to send (already RUNNING) and
/// the worker chosen for it.
#[derive(Debug, Clone)]
pub struct Dispatch {
    pub job: Job,
    pub worker_id: WorkerId,
    pub endpoint: String,
}

/// Outcome of recording an inbound job result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordOutcome {
    Completed,
    Failed,
    /// The job is unknown or no longer RUNNING; the result was dropped.
    Ignored,
}

/// Why a cancellation was refused.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CancelError {
    #[error("unknown job")]
    UnknownJob,

    #[error("job is {0} and can no longer be cancelled")]
    NotCancellable(JobState),
}

#[derive(Default)]
pub struct CoordinatorState {
    /// Last assigned job id; ids are the decimal counter starting at "1".
    next_job_id: u64,
    jobs: HashMap<String, Job>,
    /// FIFO of PENDING job ids awaiting dispatch.
    queue: VecDeque<String>,
    results: HashMap<String, JobResult>,
    /// Insertion order doubles as registration order for worker selection.
    workers: IndexMap<WorkerId, WorkerInfo>,
}

impl CoordinatorState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign the next job id and enqueue the job. Callers hold the state
    /// lock, which makes id assignment and enqueue atomic across submits.
    pub fn submit(&mut self, spec: JobSpec, now: DateTime<Utc>) -> String {
        self.next_job_id += 1;
        let job_id = self.next_job_id.to_string();
        self.jobs.insert(job_id.clone(), Job::new(job_id.clone(), spec, now));
        self.queue.push_back(job_id.clone());
        job_id
    }

    pub fn job(&self, job_id: &str) -> Option<&Job> {
        self.jobs.get(job_id)
    }

    pub fn job_state(&self, job_id: &str) -> Option<JobState> {
        self.jobs.get(job_id).map(|job| job.state)
    }

    /// Stored result for a job. Present iff the job is COMPLETED or FAILED.
    pub fn result(&self, job_id: &str) -> Option<&JobResult> {
        self.results.get(job_id)
    }

    /// Cancel a job that is still queued. Running and terminal jobs are
    /// refused: there is no kill channel to a worker.
    pub fn cancel(&mut self, job_id: &str, now: DateTime<Utc>) -> Result<(), CancelError> {
        match self.jobs.get_mut(job_id) {
            None => Err(CancelError::UnknownJob),
            Some(job) if job.state == JobState::Pending => {
                self.queue.retain(|queued| queued != job_id);
                job.cancel(now);
                Ok(())
            }
            Some(job) => Err(CancelError::NotCancellable(job.state)),
        }
    }

    /// Add a worker to the registry. Re-registration of a known worker only
    /// refreshes its liveness, keeping any outstanding reservation.
    pub fn register_worker(&mut self, address: &str, port: u16, now: Instant) -> WorkerId {
        let id = WorkerId::new(address, port);
        match self.workers.get_mut(id.as_str()) {
            Some(existing) => existing.last_heartbeat = now,
            None => {
                self.workers.insert(id.clone(), WorkerInfo::new(address, port, now));
            }
        }
        id
    }

    /// Refresh a worker's liveness. Returns false for unregistered workers.
    /// Heartbeats never move the timestamp backwards.
    pub fn heartbeat(&mut self, worker_id: &str, now: Instant) -> bool {
        match self.workers.get_mut(worker_id) {
            Some(worker) => {
                if now > worker.last_heartbeat {
                    worker.last_heartbeat = now;
                }
                true
            }
            None => false,
        }
    }

    /// Pick the next dispatch: head of the queue paired with the earliest
    /// registered non-busy worker.
    ///
    /// Returns `None` when the queue is empty or no worker can take the
    /// job (the head job stays put). Otherwise the reservation (job to
    /// RUNNING with its start time, worker marked busy) is applied before
    /// returning, so no other dispatch can double-book either side.
    pub fn reserve_dispatch(&mut self, now: DateTime<Utc>) -> Option<Dispatch> {
        if self.queue.is_empty() {
            return None;
        }
        let (worker_id, endpoint) = self
            .workers
            .values()
            .find(|worker| !worker.is_busy())
            .map(|worker| (worker.id.clone(), worker.endpoint()))?;

        let job_id = self.queue.pop_front()?;
        let job = self.jobs.get_mut(&job_id)?;
        job.start(now);
        if let Some(worker) = self.workers.get_mut(worker_id.as_str()) {
            worker.assigned_job = Some(job_id);
        }
        Some(Dispatch { job: job.clone(), worker_id, endpoint })
    }

    /// Roll back a dispatch whose send failed: the worker is treated as
    /// dead and the job goes to the queue tail, giving other jobs a chance
    /// before it is retried.
    pub fn fail_dispatch(&mut self, job_id: &str, worker_id: &str) {
        self.workers.shift_remove(worker_id);
        self.requeue(job_id);
    }

    /// Record a worker-reported result. Only RUNNING jobs accept results;
    /// anything else is a late or duplicate report and is dropped without
    /// touching state.
    pub fn record_result(&mut self, result: JobResult, now: DateTime<Utc>) -> RecordOutcome {
        let Some(job) = self.jobs.get_mut(&result.job_id) else {
            return RecordOutcome::Ignored;
        };
        if job.state != JobState::Running {
            return RecordOutcome::Ignored;
        }
        job.finish(result.success, now);
        let outcome = if result.success { RecordOutcome::Completed } else { RecordOutcome::Failed };

        // Release the worker that ran it.
        if let Some(worker) = self
            .workers
            .values_mut()
            .find(|worker| worker.assigned_job.as_deref() == Some(result.job_id.as_str()))
        {
            worker.assigned_job = None;
        }

        self.results.insert(result.job_id.clone(), result);
        outcome
    }

    /// Evict workers whose last heartbeat is older than `stale_after`,
    /// requeueing any job still assigned to them. Returns the evicted ids.
    pub fn evict_stale(&mut self, now: Instant, stale_after: Duration) -> Vec<WorkerId> {
        let stale: Vec<WorkerId> = self
            .workers
            .values()
            .filter(|worker| now.duration_since(worker.last_heartbeat) > stale_after)
            .map(|worker| worker.id.clone())
            .collect();

        for worker_id in &stale {
            if let Some(worker) = self.workers.shift_remove(worker_id.as_str()) {
                if let Some(job_id) = worker.assigned_job {
                    self.requeue(&job_id);
                }
            }
        }
        stale
    }

    /// Return a RUNNING job to the queue tail with its start time cleared.
    fn requeue(&mut self, job_id: &str) {
        if let Some(job) = self.jobs.get_mut(job_id) {
            if job.state == JobState::Running {
                job.reset_pending();
                self.queue.push_back(job_id.to_string());
            }
        }
    }

    pub fn worker(&self, worker_id: &str) -> Option<&WorkerInfo> {
        self.workers.get(worker_id)
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Queue contents, head first. Used by tests and status logging.
    pub fn queued_ids(&self) -> Vec<String> {
        self.queue.iter().cloned().collect()
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
