// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Coordinator lifecycle: configuration, startup, shutdown.

use std::net::SocketAddr;
use std::sync::Arc;

use mc_core::SystemClock;
use parking_lot::Mutex;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::dispatch::Dispatcher;
use crate::env;
use crate::listener::{ListenCtx, Listener};
use crate::liveness::LivenessMonitor;
use crate::state::CoordinatorState;

/// Coordinator tuning knobs. Defaults come from the environment; tests
/// construct shorter timings directly.
#[derive(Debug, Clone)]
pub struct Config {
    /// Address to bind the listening socket on.
    pub bind_addr: String,
    /// Listening port. Port 0 picks an ephemeral port.
    pub port: u16,
    pub io_timeout: Duration,
    pub dispatch_tick: Duration,
    pub liveness_scan_interval: Duration,
    pub worker_stale_after: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0".to_string(),
            port: env::port(),
            io_timeout: env::io_timeout(),
            dispatch_tick: env::dispatch_tick(),
            liveness_scan_interval: env::liveness_scan_interval(),
            worker_stale_after: env::worker_stale_after(),
        }
    }
}

/// Lifecycle errors. A failed bind is the only fatal startup error.
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("failed to bind {0}: {1}")]
    BindFailed(String, #[source] std::io::Error),
}

/// A running coordinator: the shared state plus its shutdown token.
pub struct Coordinator {
    pub state: Arc<Mutex<CoordinatorState>>,
    pub local_addr: SocketAddr,
    shutdown: CancellationToken,
}

impl Coordinator {
    /// Signal the listener, dispatcher, and liveness loops to exit.
    /// In-flight connection handlers finish their current message.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    /// Wait until shutdown has been requested.
    pub async fn cancelled(&self) {
        self.shutdown.cancelled().await;
    }
}

/// Bind the listening socket and spawn the listener, dispatcher, and
/// liveness tasks. Returns a handle for observation and shutdown.
pub async fn start(config: Config) -> Result<Coordinator, LifecycleError> {
    let addr = format!("{}:{}", config.bind_addr, config.port);
    let tcp = TcpListener::bind(&addr)
        .await
        .map_err(|e| LifecycleError::BindFailed(addr.clone(), e))?;
    let local_addr = tcp.local_addr().map_err(|e| LifecycleError::BindFailed(addr, e))?;
    info!(%local_addr, "coordinator listening");

    let state = Arc::new(Mutex::new(CoordinatorState::new()));
    let shutdown = CancellationToken::new();
    let ctx = Arc::new(ListenCtx {
        state: Arc::clone(&state),
        clock: SystemClock,
        io_timeout: config.io_timeout,
    });

    tokio::spawn(Listener::new(tcp, ctx, shutdown.child_token()).run());
    tokio::spawn(
        Dispatcher::new(
            Arc::clone(&state),
            SystemClock,
            config.dispatch_tick,
            config.io_timeout,
            shutdown.child_token(),
        )
        .run(),
    );
    tokio::spawn(
        LivenessMonitor::new(
            Arc::clone(&state),
            SystemClock,
            config.liveness_scan_interval,
            config.worker_stale_after,
            shutdown.child_token(),
        )
        .run(),
    );

    Ok(Coordinator { state, local_addr, shutdown })
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
