// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! TCP client session against the coordinator.
//!
//! Each call opens a fresh connection, announces `{type: "client"}`, sends
//! one action frame, and reads one reply. The whole exchange is bounded by
//! a 30-second timeout.

use std::time::Duration;

use mc_core::{JobResult, JobState};
use mc_wire::{ClientRequest, ClientResponse, Envelope, JobStateReply, ProtocolError};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tokio::io::BufReader;
use tokio::net::TcpStream;

/// Read timeout for one request/response exchange.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("could not connect to coordinator at {0}: {1}")]
    Connect(String, #[source] std::io::Error),

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The coordinator answered `{status: "error"}`.
    #[error("{0}")]
    Rejected(String),

    #[error("unexpected reply from coordinator")]
    UnexpectedReply,
}

/// Client-side handle for one coordinator endpoint.
pub struct ClientSession {
    coordinator: String,
    timeout: Duration,
}

impl ClientSession {
    pub fn new(coordinator: impl Into<String>) -> Self {
        Self { coordinator: coordinator.into(), timeout: REQUEST_TIMEOUT }
    }

    #[cfg(test)]
    pub fn with_timeout(coordinator: impl Into<String>, timeout: Duration) -> Self {
        Self { coordinator: coordinator.into(), timeout }
    }

    /// Submit a job; returns the assigned job id.
    pub async fn submit_job(
        &self,
        script_path: Option<String>,
        script_content: Option<String>,
        args: Vec<String>,
    ) -> Result<String, ClientError> {
        let request = ClientRequest::SubmitJob { script_path, script_content, args };
        match self.exchange(&request).await? {
            ClientResponse::JobSubmitted { job_id } => Ok(job_id),
            other => Self::reject(other),
        }
    }

    /// Fetch a finished job's result; `None` while the job is still in flight.
    pub async fn get_result(&self, job_id: &str) -> Result<Option<JobResult>, ClientError> {
        let request = ClientRequest::GetResult { job_id: job_id.to_string() };
        match self.exchange(&request).await? {
            ClientResponse::ResultReady { result } => Ok(Some(result)),
            ClientResponse::ResultNotReady => Ok(None),
            other => Self::reject(other),
        }
    }

    /// Report a job's lifecycle state.
    pub async fn get_job_state(&self, job_id: &str) -> Result<JobState, ClientError> {
        // get_job_state replies with its own shape, not a status envelope.
        let request = ClientRequest::GetJobState { job_id: job_id.to_string() };
        let reply: JobStateReply = self.exchange_raw(&request).await?;
        Ok(reply.state)
    }

    /// Cancel a job that has not been dispatched yet.
    pub async fn cancel_job(&self, job_id: &str) -> Result<(), ClientError> {
        let request = ClientRequest::CancelJob { job_id: job_id.to_string() };
        match self.exchange(&request).await? {
            ClientResponse::JobCancelled { .. } => Ok(()),
            other => Self::reject(other),
        }
    }

    async fn exchange(&self, request: &ClientRequest) -> Result<ClientResponse, ClientError> {
        self.exchange_raw(request).await
    }

    /// Open a session, send one action, read one typed reply.
    async fn exchange_raw<T: DeserializeOwned>(
        &self,
        request: &ClientRequest,
    ) -> Result<T, ClientError> {
        let stream =
            match tokio::time::timeout(self.timeout, TcpStream::connect(&self.coordinator)).await {
                Ok(Ok(stream)) => stream,
                Ok(Err(e)) => return Err(ClientError::Connect(self.coordinator.clone(), e)),
                Err(_) => return Err(ClientError::Protocol(ProtocolError::Timeout)),
            };
        let (read, mut write) = stream.into_split();
        let mut read = BufReader::new(read);

        mc_wire::write_message(&mut write, &Envelope::Client, self.timeout).await?;
        mc_wire::write_message(&mut write, request, self.timeout).await?;
        Ok(mc_wire::read_message(&mut read, self.timeout).await?)
    }

    fn reject<T>(other: ClientResponse) -> Result<T, ClientError> {
        match other {
            ClientResponse::Error { message } => Err(ClientError::Rejected(message)),
            _ => Err(ClientError::UnexpectedReply),
        }
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
