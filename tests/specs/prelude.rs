// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared helpers for the end-to-end scenarios.

use std::time::Duration;

use mc_coordinator::{Config, Coordinator};
use mc_wire::{ClientRequest, ClientResponse, Envelope, JobStateReply};
use mc_worker::{Worker, WorkerConfig};
use serde::de::DeserializeOwned;
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio_util::sync::CancellationToken;

pub const IO_TIMEOUT: Duration = Duration::from_secs(2);

/// Generous ceiling for condition polling; scenarios normally settle in
/// tens of milliseconds.
pub const WAIT_MAX: Duration = Duration::from_secs(10);

/// Coordinator config with test-fast timings on an ephemeral port.
pub fn coordinator_config() -> Config {
    Config {
        bind_addr: "127.0.0.1".to_string(),
        port: 0,
        io_timeout: IO_TIMEOUT,
        dispatch_tick: Duration::from_millis(20),
        liveness_scan_interval: Duration::from_millis(50),
        worker_stale_after: Duration::from_secs(60),
    }
}

pub async fn start_coordinator() -> Coordinator {
    mc_coordinator::start(coordinator_config()).await.expect("coordinator should start")
}

pub async fn start_coordinator_with(config: Config) -> Coordinator {
    mc_coordinator::start(config).await.expect("coordinator should start")
}

/// Spawn a worker wired to the coordinator. Returns its shutdown token
/// and dispatch port.
pub async fn start_worker(coordinator: &Coordinator) -> (CancellationToken, u16) {
    let config = WorkerConfig {
        coordinator: coordinator.local_addr.to_string(),
        bind_addr: "127.0.0.1".to_string(),
        port: 0,
        advertise_addr: "127.0.0.1".to_string(),
        heartbeat_interval: Duration::from_millis(100),
        job_timeout: Duration::from_secs(5),
        io_timeout: IO_TIMEOUT,
        register_retry: Duration::from_millis(50),
    };
    let shutdown = CancellationToken::new();
    let worker = Worker::bind(config, shutdown.clone()).await.expect("worker should bind");
    let port = worker.port();
    tokio::spawn(worker.run());
    (shutdown, port)
}

/// Open a client session and run one action, returning the typed reply.
pub async fn client_exchange<T: DeserializeOwned>(
    coordinator: &Coordinator,
    request: &ClientRequest,
) -> T {
    let stream =
        TcpStream::connect(coordinator.local_addr).await.expect("connect to coordinator");
    let (read, mut write) = stream.into_split();
    let mut read = BufReader::new(read);
    mc_wire::write_message(&mut write, &Envelope::Client, IO_TIMEOUT).await.expect("send envelope");
    mc_wire::write_message(&mut write, request, IO_TIMEOUT).await.expect("send request");
    mc_wire::read_message(&mut read, IO_TIMEOUT).await.expect("read reply")
}

/// Submit a path-based job, asserting acceptance.
pub async fn submit_path(coordinator: &Coordinator, script: &str, args: &[&str]) -> String {
    let request = ClientRequest::SubmitJob {
        script_path: Some(script.to_string()),
        script_content: None,
        args: args.iter().map(|s| s.to_string()).collect(),
    };
    match client_exchange::<ClientResponse>(coordinator, &request).await {
        ClientResponse::JobSubmitted { job_id } => job_id,
        other => panic!("submission rejected: {other:?}"),
    }
}

/// Submit an inline-content job, asserting acceptance.
pub async fn submit_content(coordinator: &Coordinator, content: &str, args: &[&str]) -> String {
    let request = ClientRequest::SubmitJob {
        script_path: None,
        script_content: Some(content.to_string()),
        args: args.iter().map(|s| s.to_string()).collect(),
    };
    match client_exchange::<ClientResponse>(coordinator, &request).await {
        ClientResponse::JobSubmitted { job_id } => job_id,
        other => panic!("submission rejected: {other:?}"),
    }
}

/// Query a job's state over the protocol.
pub async fn get_state(coordinator: &Coordinator, job_id: &str) -> JobStateReply {
    let request = ClientRequest::GetJobState { job_id: job_id.to_string() };
    client_exchange(coordinator, &request).await
}

/// Query a job's result over the protocol.
pub async fn get_result(coordinator: &Coordinator, job_id: &str) -> ClientResponse {
    let request = ClientRequest::GetResult { job_id: job_id.to_string() };
    client_exchange(coordinator, &request).await
}

/// Register a worker endpoint directly, without running a worker process.
pub async fn register_fake_worker(coordinator: &Coordinator, port: u16) {
    let mut stream =
        TcpStream::connect(coordinator.local_addr).await.expect("connect to coordinator");
    let register = Envelope::WorkerRegister { address: "127.0.0.1".to_string(), port };
    mc_wire::write_message(&mut stream, &register, IO_TIMEOUT).await.expect("send registration");
    stream.shutdown().await.expect("close registration connection");
}

/// Poll until `check` holds or the deadline passes.
pub async fn wait_for(max: Duration, mut check: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + max;
    while tokio::time::Instant::now() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}
