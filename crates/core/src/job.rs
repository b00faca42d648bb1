// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job type and state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Lifecycle state of a job.
///
/// Transitions follow the DAG PENDING → RUNNING → {COMPLETED, FAILED},
/// with RUNNING → PENDING on requeue and PENDING → CANCELLED on
/// cancellation. Serialized as the wire integers 1..=5; displayed as the
/// upper-case names used by `get_job_state`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum JobState {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl JobState {
    /// Upper-case name used in client-facing state replies.
    pub fn name(&self) -> &'static str {
        match self {
            JobState::Pending => "PENDING",
            JobState::Running => "RUNNING",
            JobState::Completed => "COMPLETED",
            JobState::Failed => "FAILED",
            JobState::Cancelled => "CANCELLED",
        }
    }

    /// Parse one of the upper-case state names.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "PENDING" => Some(JobState::Pending),
            "RUNNING" => Some(JobState::Running),
            "COMPLETED" => Some(JobState::Completed),
            "FAILED" => Some(JobState::Failed),
            "CANCELLED" => Some(JobState::Cancelled),
            _ => None,
        }
    }

    /// Terminal states never transition again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Completed | JobState::Failed | JobState::Cancelled)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl From<JobState> for u8 {
    fn from(state: JobState) -> Self {
        match state {
            JobState::Pending => 1,
            JobState::Running => 2,
            JobState::Completed => 3,
            JobState::Failed => 4,
            JobState::Cancelled => 5,
        }
    }
}

/// Error for out-of-range wire state values.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid job state: {0}")]
pub struct InvalidJobState(pub u8);

impl TryFrom<u8> for JobState {
    type Error = InvalidJobState;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(JobState::Pending),
            2 => Ok(JobState::Running),
            3 => Ok(JobState::Completed),
            4 => Ok(JobState::Failed),
            5 => Ok(JobState::Cancelled),
            other => Err(InvalidJobState(other)),
        }
    }
}

/// Validation errors for submitted job specs.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum JobSpecError {
    #[error("submit_job requires scriptPath or scriptContent")]
    MissingScript,

    #[error("scriptPath and scriptContent are mutually exclusive")]
    AmbiguousScript,
}

/// What a client submits: a script plus its arguments.
///
/// Exactly one of `script_path` / `script_content` is set; the constructor
/// rejects anything else before a job id is assigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSpec {
    pub script_path: Option<String>,
    pub script_content: Option<String>,
    pub args: Vec<String>,
}

impl JobSpec {
    /// Build a spec from the raw submit fields, enforcing that exactly one
    /// script source is present.
    pub fn new(
        script_path: Option<String>,
        script_content: Option<String>,
        args: Vec<String>,
    ) -> Result<Self, JobSpecError> {
        match (&script_path, &script_content) {
            (None, None) => Err(JobSpecError::MissingScript),
            (Some(_), Some(_)) => Err(JobSpecError::AmbiguousScript),
            _ => Ok(Self { script_path, script_content, args }),
        }
    }

    /// Spec for a script resolved by path on the worker host.
    pub fn path(path: impl Into<String>, args: Vec<String>) -> Self {
        Self { script_path: Some(path.into()), script_content: None, args }
    }

    /// Spec carrying the script body inline.
    pub fn content(content: impl Into<String>, args: Vec<String>) -> Self {
        Self { script_path: None, script_content: Some(content.into()), args }
    }
}

/// A unit of work: one script invocation with arguments.
///
/// This is also the dispatch frame sent to workers, so the serde shape is
/// wire-fixed: camelCase fields, integer state, RFC 3339 or null timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub job_id: String,
    pub script_path: Option<String>,
    pub script_content: Option<String>,
    #[serde(default)]
    pub args: Vec<String>,
    pub state: JobState,
    pub submit_time: DateTime<Utc>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
}

impl Job {
    /// Create a pending job from an accepted submission.
    pub fn new(job_id: impl Into<String>, spec: JobSpec, submit_time: DateTime<Utc>) -> Self {
        Self {
            job_id: job_id.into(),
            script_path: spec.script_path,
            script_content: spec.script_content,
            args: spec.args,
            state: JobState::Pending,
            submit_time,
            start_time: None,
            end_time: None,
        }
    }

    /// PENDING → RUNNING on dispatch.
    pub fn start(&mut self, at: DateTime<Utc>) {
        self.state = JobState::Running;
        self.start_time = Some(at);
    }

    /// RUNNING → PENDING when a dispatch is rolled back (send failure or
    /// worker eviction). Clears the start timestamp.
    pub fn reset_pending(&mut self) {
        self.state = JobState::Pending;
        self.start_time = None;
    }

    /// RUNNING → COMPLETED / FAILED when a result arrives.
    pub fn finish(&mut self, success: bool, at: DateTime<Utc>) {
        self.state = if success { JobState::Completed } else { JobState::Failed };
        self.end_time = Some(at);
    }

    /// PENDING → CANCELLED.
    pub fn cancel(&mut self, at: DateTime<Utc>) {
        self.state = JobState::Cancelled;
        self.end_time = Some(at);
    }

    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
