// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dispatch loop: match pending jobs to live workers.
//!
//! Reservation happens atomically under the state lock; the outbound
//! connect and send happen with the lock released. There is no per-job
//! timer here: timeouts are the worker's responsibility, and the
//! liveness loop requeues jobs whose worker dies before reporting.

use std::sync::Arc;
use std::time::Duration;

use mc_core::{Clock, Job};
use mc_wire::ProtocolError;
use parking_lot::Mutex;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::state::{CoordinatorState, Dispatch};

pub struct Dispatcher<C: Clock> {
    state: Arc<Mutex<CoordinatorState>>,
    clock: C,
    /// Poll interval when there is nothing to dispatch.
    tick: Duration,
    io_timeout: Duration,
    shutdown: CancellationToken,
}

impl<C: Clock> Dispatcher<C> {
    pub fn new(
        state: Arc<Mutex<CoordinatorState>>,
        clock: C,
        tick: Duration,
        io_timeout: Duration,
        shutdown: CancellationToken,
    ) -> Self {
        Self { state, clock, tick, io_timeout, shutdown }
    }

    /// Run until shutdown. Each iteration dispatches at most one job;
    /// with nothing dispatchable the loop sleeps for one tick.
    pub async fn run(self) {
        loop {
            if self.shutdown.is_cancelled() {
                break;
            }
            let reserved = self.state.lock().reserve_dispatch(self.clock.now_utc());
            match reserved {
                Some(dispatch) => self.deliver(dispatch).await,
                None => {
                    tokio::select! {
                        _ = self.shutdown.cancelled() => break,
                        _ = tokio::time::sleep(self.tick) => {}
                    }
                }
            }
        }
        debug!("dispatcher stopped");
    }

    /// Send the job frame to the chosen worker over a fresh connection.
    /// A failed send evicts the worker and requeues the job at the tail.
    async fn deliver(&self, dispatch: Dispatch) {
        let Dispatch { job, worker_id, endpoint } = dispatch;
        match send_job(&endpoint, &job, self.io_timeout).await {
            Ok(()) => info!(job = %job.job_id, worker = %worker_id, "job dispatched"),
            Err(e) => {
                warn!(job = %job.job_id, worker = %worker_id, "dispatch failed, evicting worker: {}", e);
                self.state.lock().fail_dispatch(&job.job_id, worker_id.as_str());
            }
        }
    }
}

/// Open a fresh connection to the worker's advertised endpoint and write
/// the single dispatch frame.
async fn send_job(endpoint: &str, job: &Job, io_timeout: Duration) -> Result<(), ProtocolError> {
    let mut stream = tokio::time::timeout(io_timeout, TcpStream::connect(endpoint))
        .await
        .map_err(|_| ProtocolError::Timeout)??;
    mc_wire::write_message(&mut stream, job, io_timeout).await?;
    stream.shutdown().await?;
    Ok(())
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;
