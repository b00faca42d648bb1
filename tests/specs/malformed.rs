// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Protocol robustness: malformed and truncated frames never corrupt
//! coordinator state.

use crate::prelude::*;
use mc_wire::{ClientResponse, Envelope};
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

#[tokio::test]
async fn submit_without_script_is_rejected_and_burns_no_id() {
    let coordinator = start_coordinator().await;

    // Raw frame: well-formed JSON, missing both script fields.
    let stream = TcpStream::connect(coordinator.local_addr).await.unwrap();
    let (read, mut write) = stream.into_split();
    let mut read = BufReader::new(read);
    mc_wire::write_message(&mut write, &Envelope::Client, IO_TIMEOUT).await.unwrap();
    mc_wire::write_frame(&mut write, br#"{"action":"submit_job"}"#).await.unwrap();
    let reply: ClientResponse = mc_wire::read_message(&mut read, IO_TIMEOUT).await.unwrap();

    match reply {
        ClientResponse::Error { message } => assert!(!message.is_empty()),
        other => panic!("expected error reply, got {other:?}"),
    }

    // The failed submission must not have incremented the job counter.
    let job_id = submit_path(&coordinator, "/bin/echo", &["first"]).await;
    assert_eq!(job_id, "1");

    coordinator.shutdown();
}

#[tokio::test]
async fn malformed_json_in_session_gets_error_reply() {
    let coordinator = start_coordinator().await;

    let stream = TcpStream::connect(coordinator.local_addr).await.unwrap();
    let (read, mut write) = stream.into_split();
    let mut read = BufReader::new(read);
    mc_wire::write_message(&mut write, &Envelope::Client, IO_TIMEOUT).await.unwrap();
    mc_wire::write_frame(&mut write, br#"{"action": submit"#).await.unwrap();
    let reply: ClientResponse = mc_wire::read_message(&mut read, IO_TIMEOUT).await.unwrap();

    assert!(matches!(reply, ClientResponse::Error { .. }));
    assert_eq!(coordinator.state.lock().queue_len(), 0);

    coordinator.shutdown();
}

#[tokio::test]
async fn truncated_first_frame_leaves_state_untouched() {
    let coordinator = start_coordinator().await;

    let mut stream = TcpStream::connect(coordinator.local_addr).await.unwrap();
    stream.write_all(br#"{"type":"worker_regi"#).await.unwrap();
    stream.shutdown().await.unwrap();
    drop(stream);
    tokio::time::sleep(std::time::Duration::from_millis(100)).await;

    {
        let state = coordinator.state.lock();
        assert_eq!(state.worker_count(), 0);
        assert_eq!(state.queue_len(), 0);
    }

    // The coordinator still serves new connections normally.
    let job_id = submit_path(&coordinator, "/bin/echo", &["after"]).await;
    assert_eq!(job_id, "1");

    coordinator.shutdown();
}

#[tokio::test]
async fn unknown_envelope_type_closes_connection_silently() {
    let coordinator = start_coordinator().await;

    let mut stream = TcpStream::connect(coordinator.local_addr).await.unwrap();
    stream.write_all(b"{\"type\":\"mystery\"}\n").await.unwrap();

    // The coordinator closes without replying; reading yields EOF.
    let mut reader = BufReader::new(stream);
    let reply: Result<ClientResponse, _> = mc_wire::read_message(&mut reader, IO_TIMEOUT).await;
    assert!(reply.is_err());
    assert_eq!(coordinator.state.lock().worker_count(), 0);

    coordinator.shutdown();
}
