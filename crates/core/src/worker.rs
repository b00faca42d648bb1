// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker identity and registry entry.

use std::borrow::Borrow;
use std::fmt;
use std::time::Instant;

/// Unique identifier for a registered worker: `"address:port"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WorkerId(String);

impl WorkerId {
    /// Build the id from a worker's advertised endpoint.
    pub fn new(address: &str, port: u16) -> Self {
        Self(format!("{address}:{port}"))
    }

    /// Get the string value of this WorkerId.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Borrow<str> for WorkerId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Registry entry for a live worker.
///
/// Holds only the advertised endpoint, never a connection handle; the
/// dispatcher opens a fresh connection per dispatch.
#[derive(Debug, Clone)]
pub struct WorkerInfo {
    pub id: WorkerId,
    pub address: String,
    pub port: u16,
    /// Monotonic timestamp of the last observed liveness signal.
    pub last_heartbeat: Instant,
    /// Job currently dispatched to this worker, if any.
    pub assigned_job: Option<String>,
}

impl WorkerInfo {
    pub fn new(address: impl Into<String>, port: u16, now: Instant) -> Self {
        let address = address.into();
        Self {
            id: WorkerId::new(&address, port),
            address,
            port,
            last_heartbeat: now,
            assigned_job: None,
        }
    }

    /// Endpoint the dispatcher connects to.
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }

    /// A worker with an outstanding job does not accept another dispatch.
    pub fn is_busy(&self) -> bool {
        self.assigned_job.is_some()
    }
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
