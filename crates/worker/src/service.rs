// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker service: registration, heartbeats, and the dispatch listener.

use std::time::Duration;

use mc_core::{Job, JobResult};
use mc_wire::{Envelope, ProtocolError};
use thiserror::Error;
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::env;
use crate::executor;

/// Worker endpoints and timings.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Coordinator endpoint, e.g. `127.0.0.1:5000`.
    pub coordinator: String,
    /// Address to bind the dispatch listener on.
    pub bind_addr: String,
    /// Port for the dispatch listener. Port 0 picks an ephemeral port.
    pub port: u16,
    /// Address advertised to the coordinator, i.e. how it reaches us.
    pub advertise_addr: String,
    pub heartbeat_interval: Duration,
    pub job_timeout: Duration,
    pub io_timeout: Duration,
    /// Pause between registration attempts while the coordinator is down.
    pub register_retry: Duration,
}

impl WorkerConfig {
    pub fn new(coordinator: impl Into<String>) -> Self {
        Self {
            coordinator: coordinator.into(),
            bind_addr: "0.0.0.0".to_string(),
            port: 0,
            advertise_addr: "127.0.0.1".to_string(),
            heartbeat_interval: env::heartbeat_interval(),
            job_timeout: env::job_timeout(),
            io_timeout: env::io_timeout(),
            register_retry: env::register_retry(),
        }
    }
}

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("failed to bind {0}: {1}")]
    BindFailed(String, #[source] std::io::Error),

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

/// A bound worker ready to serve dispatches.
pub struct Worker {
    config: WorkerConfig,
    listener: TcpListener,
    local_port: u16,
    shutdown: CancellationToken,
}

impl Worker {
    /// Bind the dispatch listener. Registration happens in [`Worker::run`]
    /// so a coordinator that is still starting does not fail the worker.
    pub async fn bind(
        config: WorkerConfig,
        shutdown: CancellationToken,
    ) -> Result<Self, WorkerError> {
        let addr = format!("{}:{}", config.bind_addr, config.port);
        let listener =
            TcpListener::bind(&addr).await.map_err(|e| WorkerError::BindFailed(addr.clone(), e))?;
        let local_port =
            listener.local_addr().map_err(|e| WorkerError::BindFailed(addr, e))?.port();
        Ok(Self { config, listener, local_port, shutdown })
    }

    /// Port the dispatch listener actually bound (resolves port 0).
    pub fn port(&self) -> u16 {
        self.local_port
    }

    /// Register, start heartbeats, and serve dispatches until shutdown.
    ///
    /// Jobs execute serially: the accept loop handles one connection at a
    /// time and further dispatch connections wait in the OS backlog. The
    /// coordinator's busy flag keeps it from dispatching concurrently to
    /// the same worker anyway. On shutdown an in-flight job runs to
    /// completion (bounded by the job timeout) and its result is sent
    /// before the loop exits.
    pub async fn run(self) -> Result<(), WorkerError> {
        if !self.register_with_retry().await {
            return Ok(());
        }
        let heartbeat = tokio::spawn(heartbeat_loop(
            self.config.coordinator.clone(),
            self.local_port,
            self.config.heartbeat_interval,
            self.config.io_timeout,
            self.shutdown.clone(),
        ));

        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, addr)) => {
                        debug!(%addr, "dispatch connection");
                        if let Err(e) = self.serve_dispatch(stream).await {
                            warn!("dispatch connection failed: {}", e);
                        }
                    }
                    Err(e) => error!("accept error: {}", e),
                },
            }
        }

        heartbeat.abort();
        info!("worker stopped");
        Ok(())
    }

    /// Read one job from a dispatch connection, run it, report the result.
    async fn serve_dispatch(&self, stream: TcpStream) -> Result<(), WorkerError> {
        let mut reader = BufReader::new(stream);
        let job: Job = mc_wire::read_message(&mut reader, self.config.io_timeout).await?;
        // The dispatch connection carries exactly one frame.
        drop(reader);

        info!(job = %job.job_id, "job received");
        let result = executor::run_job(&job, self.config.job_timeout).await;
        info!(job = %job.job_id, success = result.success, "job finished");
        self.report_result(result).await;
        Ok(())
    }

    /// Deliver a result on a fresh connection, retrying a few times if the
    /// coordinator is briefly unreachable. An undeliverable result is
    /// dropped; the coordinator's eviction path requeues the job.
    async fn report_result(&self, result: JobResult) {
        const ATTEMPTS: u32 = 3;
        for attempt in 1..=ATTEMPTS {
            match send_envelope(
                &self.config.coordinator,
                &Envelope::JobResult { result: result.clone() },
                self.config.io_timeout,
            )
            .await
            {
                Ok(()) => return,
                Err(e) if attempt < ATTEMPTS => {
                    warn!(attempt, "failed to report result: {}", e);
                    tokio::time::sleep(Duration::from_secs(1)).await;
                }
                Err(e) => error!(job = %result.job_id, "giving up on result delivery: {}", e),
            }
        }
    }

    /// Send the registration envelope, retrying until it lands or the
    /// worker is shut down. Returns false when shutdown won the race.
    async fn register_with_retry(&self) -> bool {
        loop {
            let register = Envelope::WorkerRegister {
                address: self.config.advertise_addr.clone(),
                port: self.local_port,
            };
            match send_envelope(&self.config.coordinator, &register, self.config.io_timeout).await {
                Ok(()) => {
                    info!(
                        coordinator = %self.config.coordinator,
                        port = self.local_port,
                        "registered"
                    );
                    return true;
                }
                Err(e) => {
                    warn!(
                        "registration failed, retrying in {:?}: {}",
                        self.config.register_retry, e
                    );
                    tokio::select! {
                        _ = self.shutdown.cancelled() => return false,
                        _ = tokio::time::sleep(self.config.register_retry) => {}
                    }
                }
            }
        }
    }
}

/// Open a short-lived connection and send a single envelope frame.
async fn send_envelope(
    coordinator: &str,
    envelope: &Envelope,
    io_timeout: Duration,
) -> Result<(), ProtocolError> {
    let mut stream = tokio::time::timeout(io_timeout, TcpStream::connect(coordinator))
        .await
        .map_err(|_| ProtocolError::Timeout)??;
    mc_wire::write_message(&mut stream, envelope, io_timeout).await?;
    stream.shutdown().await?;
    Ok(())
}

/// Send `{type: "heartbeat"}` on a fixed interval until shutdown.
async fn heartbeat_loop(
    coordinator: String,
    port: u16,
    interval: Duration,
    io_timeout: Duration,
    shutdown: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    // Registration just signalled liveness; skip the immediate first tick.
    ticker.tick().await;
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = ticker.tick() => {
                if let Err(e) = send_envelope(&coordinator, &Envelope::Heartbeat { port }, io_timeout).await {
                    warn!("heartbeat failed: {}", e);
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;
