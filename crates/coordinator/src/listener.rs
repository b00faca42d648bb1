// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Listener task for handling socket I/O.
//!
//! The Listener runs in a spawned task, accepting connections and handing
//! each to its own task. The first frame announces the peer role: `client`
//! upgrades the connection to a request/response session, while
//! `worker_register`, `heartbeat`, and `job_result` are one-shot.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use mc_core::{Clock, JobSpec, JobState, WorkerId};
use mc_wire::{ClientRequest, ClientResponse, Envelope, JobStateReply, ProtocolError};
use parking_lot::Mutex;
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncWrite, BufReader};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::state::{CoordinatorState, RecordOutcome};

/// Shared coordinator context for all connection handlers.
pub struct ListenCtx<C: Clock> {
    pub state: Arc<Mutex<CoordinatorState>>,
    pub clock: C,
    pub io_timeout: Duration,
}

/// Errors from connection handling.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

/// Listener task for accepting socket connections.
pub struct Listener<C: Clock> {
    tcp: TcpListener,
    ctx: Arc<ListenCtx<C>>,
    shutdown: CancellationToken,
}

impl<C: Clock + 'static> Listener<C> {
    pub fn new(tcp: TcpListener, ctx: Arc<ListenCtx<C>>, shutdown: CancellationToken) -> Self {
        Self { tcp, ctx, shutdown }
    }

    /// Run the accept loop until shutdown, spawning a task per connection.
    pub async fn run(self) {
        loop {
            tokio::select! {
                _ = self.shutdown.cancelled() => break,
                result = self.tcp.accept() => match result {
                    Ok((stream, addr)) => {
                        debug!(%addr, "connection accepted");
                        let ctx = Arc::clone(&self.ctx);
                        tokio::spawn(async move {
                            let (reader, mut writer) = stream.into_split();
                            let mut reader = BufReader::new(reader);
                            if let Err(e) =
                                handle_connection(&mut reader, &mut writer, addr, &ctx).await
                            {
                                log_connection_error(e);
                            }
                        });
                    }
                    Err(e) => error!("accept error: {}", e),
                },
            }
        }
        debug!("listener stopped");
    }
}

fn log_connection_error(e: ConnectionError) {
    match e {
        ConnectionError::Protocol(ProtocolError::ConnectionClosed) => {
            debug!("peer disconnected")
        }
        ConnectionError::Protocol(ProtocolError::Timeout) => {
            warn!("connection timed out")
        }
        _ => error!("connection error: {}", e),
    }
}

/// Handle a single inbound connection.
///
/// Generic over reader/writer so tests can drive it with in-memory pipes.
/// Protocol errors on the first frame close the connection without touching
/// state; worker envelopes never get a reply.
pub(crate) async fn handle_connection<R, W, C>(
    reader: &mut R,
    writer: &mut W,
    peer: SocketAddr,
    ctx: &ListenCtx<C>,
) -> Result<(), ConnectionError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
    C: Clock,
{
    let envelope: Envelope = mc_wire::read_message(reader, ctx.io_timeout).await?;
    match envelope {
        Envelope::Client => client_session(reader, writer, ctx).await,

        Envelope::WorkerRegister { address, port } => {
            let id = ctx.state.lock().register_worker(&address, port, ctx.clock.now());
            info!(worker = %id, "worker registered");
            Ok(())
        }

        Envelope::Heartbeat { port } => {
            let id = WorkerId::new(&peer.ip().to_string(), port);
            let known = ctx.state.lock().heartbeat(id.as_str(), ctx.clock.now());
            if known {
                debug!(worker = %id, "heartbeat");
            } else {
                warn!(worker = %id, "heartbeat from unregistered worker");
            }
            Ok(())
        }

        Envelope::JobResult { result } => {
            let job_id = result.job_id.clone();
            let success = result.success;
            let outcome = ctx.state.lock().record_result(result, ctx.clock.now_utc());
            match outcome {
                RecordOutcome::Ignored => {
                    warn!(job = %job_id, "dropping late or duplicate result")
                }
                _ => info!(job = %job_id, success, "job finished"),
            }
            Ok(())
        }
    }
}

/// Serve client actions until the peer disconnects.
///
/// A malformed frame gets one `{status: "error"}` reply, then the session
/// ends; well-formed requests with invalid contents answer an error and
/// keep the session open. State is never mutated on either path.
async fn client_session<R, W, C>(
    reader: &mut R,
    writer: &mut W,
    ctx: &ListenCtx<C>,
) -> Result<(), ConnectionError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
    C: Clock,
{
    loop {
        let request: ClientRequest = match mc_wire::read_message(reader, ctx.io_timeout).await {
            Ok(request) => request,
            Err(ProtocolError::ConnectionClosed) => return Ok(()),
            Err(e @ ProtocolError::Json(_)) => {
                warn!("malformed client request: {}", e);
                let reply = ClientResponse::error("malformed request");
                mc_wire::write_message(writer, &reply, ctx.io_timeout).await?;
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };
        debug!(request = ?request, "client request");
        handle_request(request, writer, ctx).await?;
    }
}

/// Handle one client action and write its reply.
async fn handle_request<W, C>(
    request: ClientRequest,
    writer: &mut W,
    ctx: &ListenCtx<C>,
) -> Result<(), ConnectionError>
where
    W: AsyncWrite + Unpin,
    C: Clock,
{
    match request {
        ClientRequest::SubmitJob { script_path, script_content, args } => {
            let reply = match JobSpec::new(script_path, script_content, args) {
                Ok(spec) => {
                    let job_id = ctx.state.lock().submit(spec, ctx.clock.now_utc());
                    info!(job = %job_id, "job submitted");
                    ClientResponse::JobSubmitted { job_id }
                }
                Err(e) => {
                    warn!("rejected submission: {}", e);
                    ClientResponse::error(e.to_string())
                }
            };
            mc_wire::write_message(writer, &reply, ctx.io_timeout).await?;
        }

        ClientRequest::GetResult { job_id } => {
            let reply = {
                let state = ctx.state.lock();
                match state.job_state(&job_id) {
                    None => ClientResponse::error(format!("unknown job: {job_id}")),
                    // Results are read-and-keep: present iff COMPLETED / FAILED.
                    Some(_) => match state.result(&job_id) {
                        Some(result) => ClientResponse::ResultReady { result: result.clone() },
                        None => ClientResponse::ResultNotReady,
                    },
                }
            };
            mc_wire::write_message(writer, &reply, ctx.io_timeout).await?;
        }

        ClientRequest::GetJobState { job_id } => {
            // Unknown ids report PENDING; long-standing client contract.
            let state = ctx.state.lock().job_state(&job_id).unwrap_or(JobState::Pending);
            let reply = JobStateReply { job_id, state };
            mc_wire::write_message(writer, &reply, ctx.io_timeout).await?;
        }

        ClientRequest::CancelJob { job_id } => {
            let reply = match ctx.state.lock().cancel(&job_id, ctx.clock.now_utc()) {
                Ok(()) => {
                    info!(job = %job_id, "job cancelled");
                    ClientResponse::JobCancelled { job_id }
                }
                Err(e) => ClientResponse::error(e.to_string()),
            };
            mc_wire::write_message(writer, &reply, ctx.io_timeout).await?;
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "listener_tests.rs"]
mod tests;
