// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the worker.

use std::time::Duration;

fn duration_ms(var: &str, default: Duration) -> Duration {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(default)
}

/// Heartbeat interval (`MC_HEARTBEAT_INTERVAL_MS`, default 30s).
pub fn heartbeat_interval() -> Duration {
    duration_ms("MC_HEARTBEAT_INTERVAL_MS", Duration::from_secs(30))
}

/// Wall-clock limit for one job subprocess (`MC_JOB_TIMEOUT_MS`, default 60s).
pub fn job_timeout() -> Duration {
    duration_ms("MC_JOB_TIMEOUT_MS", Duration::from_secs(60))
}

/// Per-read/write socket timeout (`MC_IO_TIMEOUT_MS`, default 5s).
pub fn io_timeout() -> Duration {
    duration_ms("MC_IO_TIMEOUT_MS", Duration::from_secs(5))
}

/// Pause between registration attempts while the coordinator is down
/// (`MC_REGISTER_RETRY_MS`, default 5s).
pub fn register_retry() -> Duration {
    duration_ms("MC_REGISTER_RETRY_MS", Duration::from_secs(5))
}
