// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the coordinator.

use std::time::Duration;

/// Default listening port.
pub const DEFAULT_PORT: u16 = 5000;

fn duration_ms(var: &str, default: Duration) -> Duration {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(default)
}

/// Listening port (`MC_PORT`, default 5000).
pub fn port() -> u16 {
    std::env::var("MC_PORT").ok().and_then(|s| s.parse::<u16>().ok()).unwrap_or(DEFAULT_PORT)
}

/// Per-read/write socket timeout (`MC_IO_TIMEOUT_MS`, default 5s).
pub fn io_timeout() -> Duration {
    duration_ms("MC_IO_TIMEOUT_MS", Duration::from_secs(5))
}

/// Dispatcher poll interval (`MC_DISPATCH_TICK_MS`, default 100ms).
pub fn dispatch_tick() -> Duration {
    duration_ms("MC_DISPATCH_TICK_MS", Duration::from_millis(100))
}

/// Liveness scan interval (`MC_LIVENESS_SCAN_MS`, default 10s).
pub fn liveness_scan_interval() -> Duration {
    duration_ms("MC_LIVENESS_SCAN_MS", Duration::from_secs(10))
}

/// Heartbeat staleness threshold for eviction (`MC_WORKER_STALE_MS`, default 60s).
pub fn worker_stale_after() -> Duration {
    duration_ms("MC_WORKER_STALE_MS", Duration::from_secs(60))
}

/// Grace period for in-flight handlers on shutdown (`MC_DRAIN_TIMEOUT_MS`, default 500ms).
pub fn drain_timeout() -> Duration {
    duration_ms("MC_DRAIN_TIMEOUT_MS", Duration::from_millis(500))
}
