// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Message schema shared by all three peers.
//!
//! Every inbound coordinator connection opens with an [`Envelope`] frame;
//! only `client` envelopes are followed by more frames. The dispatch frame
//! sent to workers is a serialized [`mc_core::Job`].

use mc_core::{JobResult, JobState};
use serde::{Deserialize, Serialize};

/// First frame of every inbound coordinator connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Envelope {
    /// Opens a multi-frame client session.
    Client,

    /// One-shot worker registration with the advertised dispatch endpoint.
    WorkerRegister { address: String, port: u16 },

    /// One-shot liveness refresh. The coordinator infers the worker's
    /// address from the socket peer.
    Heartbeat { port: u16 },

    /// One-shot result report from a worker.
    JobResult { result: JobResult },
}

/// Actions a client may issue inside a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ClientRequest {
    /// Enqueue a new job. Exactly one of `scriptPath` / `scriptContent`
    /// must be set; validation happens before a job id is assigned.
    #[serde(rename_all = "camelCase")]
    SubmitJob {
        #[serde(default)]
        script_path: Option<String>,
        #[serde(default)]
        script_content: Option<String>,
        #[serde(default)]
        args: Vec<String>,
    },

    /// Fetch the stored result of a finished job.
    #[serde(rename_all = "camelCase")]
    GetResult { job_id: String },

    /// Report the lifecycle state of a job.
    #[serde(rename_all = "camelCase")]
    GetJobState { job_id: String },

    /// Cancel a job that has not been dispatched yet.
    #[serde(rename_all = "camelCase")]
    CancelJob { job_id: String },
}

/// Status replies for client actions.
///
/// `get_job_state` answers with [`JobStateReply`] instead; it carries no
/// `status` tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ClientResponse {
    #[serde(rename_all = "camelCase")]
    JobSubmitted { job_id: String },

    ResultReady { result: JobResult },

    ResultNotReady,

    #[serde(rename_all = "camelCase")]
    JobCancelled { job_id: String },

    Error { message: String },
}

impl ClientResponse {
    pub fn error(message: impl Into<String>) -> Self {
        ClientResponse::Error { message: message.into() }
    }
}

/// Reply to `get_job_state`: the job id plus the state's upper-case name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStateReply {
    pub job_id: String,
    #[serde(with = "state_name")]
    pub state: JobState,
}

/// Client-facing states travel as names ("PENDING"), not wire integers.
mod state_name {
    use mc_core::JobState;
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(state: &JobState, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(state.name())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<JobState, D::Error> {
        let name = String::deserialize(deserializer)?;
        JobState::from_name(&name)
            .ok_or_else(|| de::Error::custom(format!("unknown job state: {name}")))
    }
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
