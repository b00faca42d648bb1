// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Liveness scan: evict workers with stale heartbeats.

use std::sync::Arc;
use std::time::Duration;

use mc_core::Clock;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::state::CoordinatorState;

pub struct LivenessMonitor<C: Clock> {
    state: Arc<Mutex<CoordinatorState>>,
    clock: C,
    scan_interval: Duration,
    stale_after: Duration,
    shutdown: CancellationToken,
}

impl<C: Clock> LivenessMonitor<C> {
    pub fn new(
        state: Arc<Mutex<CoordinatorState>>,
        clock: C,
        scan_interval: Duration,
        stale_after: Duration,
        shutdown: CancellationToken,
    ) -> Self {
        Self { state, clock, scan_interval, stale_after, shutdown }
    }

    /// Scan the registry on a fixed interval until shutdown. Eviction and
    /// the requeue of any assigned job happen in one state operation.
    pub async fn run(self) {
        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                _ = tokio::time::sleep(self.scan_interval) => {
                    let evicted = self.state.lock().evict_stale(self.clock.now(), self.stale_after);
                    for worker_id in evicted {
                        warn!(worker = %worker_id, "worker evicted after missed heartbeats");
                    }
                }
            }
        }
        debug!("liveness monitor stopped");
    }
}

#[cfg(test)]
#[path = "liveness_tests.rs"]
mod tests;
