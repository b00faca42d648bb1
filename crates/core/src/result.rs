// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Outcome of an executed job.

use serde::{Deserialize, Serialize};

/// Worker-reported outcome of a job.
///
/// Invariant: `success` implies `error` is absent; failure implies it is
/// present. The constructors are the only way the rest of the system
/// builds results, so the invariant holds everywhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobResult {
    pub job_id: String,
    pub success: bool,
    pub output: Option<String>,
    pub error: Option<String>,
}

impl JobResult {
    /// Successful run with the captured stdout.
    pub fn ok(job_id: impl Into<String>, output: impl Into<String>) -> Self {
        Self { job_id: job_id.into(), success: true, output: Some(output.into()), error: None }
    }

    /// Failed run with the captured stderr or failure reason.
    pub fn err(job_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self { job_id: job_id.into(), success: false, output: None, error: Some(error.into()) }
    }
}

#[cfg(test)]
#[path = "result_tests.rs"]
mod tests;
