// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Heartbeat timeout: silent workers are evicted and their running jobs
//! return to the queue.

use crate::prelude::*;
use mc_core::JobState;
use mc_wire::ProtocolError;
use std::time::Duration;
use tokio::io::BufReader;
use tokio::net::TcpListener;

fn short_stale_config() -> mc_coordinator::Config {
    let mut config = coordinator_config();
    config.worker_stale_after = Duration::from_millis(300);
    config
}

#[tokio::test]
async fn silent_worker_is_removed_from_registry() {
    let coordinator = start_coordinator_with(short_stale_config()).await;

    // Register an endpoint that never heartbeats. Keep the listener alive
    // so dispatches could connect; there are no jobs anyway.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    register_fake_worker(&coordinator, port).await;
    assert_eq!(coordinator.state.lock().worker_count(), 1);

    let evicted = wait_for(WAIT_MAX, || coordinator.state.lock().worker_count() == 0).await;
    assert!(evicted, "silent worker should be evicted after the stale threshold");

    coordinator.shutdown();
}

#[tokio::test]
async fn eviction_requeues_job_held_by_silent_worker() {
    let coordinator = start_coordinator_with(short_stale_config()).await;

    // A fake worker that swallows the dispatched job and never reports.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else { break };
            let mut reader = BufReader::new(stream);
            let _: Result<mc_core::Job, ProtocolError> =
                mc_wire::read_message(&mut reader, Duration::from_secs(1)).await;
        }
    });
    register_fake_worker(&coordinator, port).await;

    let job_id = submit_path(&coordinator, "/bin/echo", &["stuck"]).await;
    let running = wait_for(WAIT_MAX, || {
        coordinator.state.lock().job_state(&job_id) == Some(JobState::Running)
    })
    .await;
    assert!(running, "job should be dispatched to the swallowing worker");

    // No heartbeats arrive, so the worker goes stale and its job returns
    // to PENDING with the start time cleared.
    let requeued = wait_for(WAIT_MAX, || {
        let state = coordinator.state.lock();
        state.worker_count() == 0 && state.job_state(&job_id) == Some(JobState::Pending)
    })
    .await;
    assert!(requeued, "running job should be requeued when its worker is evicted");
    assert!(coordinator.state.lock().job(&job_id).unwrap().start_time.is_none());

    coordinator.shutdown();
}

#[tokio::test]
async fn heartbeating_worker_is_not_evicted() {
    let coordinator = start_coordinator_with(short_stale_config()).await;
    let (worker_shutdown, _port) = start_worker(&coordinator).await;

    let registered = wait_for(WAIT_MAX, || coordinator.state.lock().worker_count() == 1).await;
    assert!(registered);

    // Well past the stale threshold, the heartbeating worker survives.
    tokio::time::sleep(Duration::from_millis(900)).await;
    assert_eq!(coordinator.state.lock().worker_count(), 1);

    worker_shutdown.cancel();
    coordinator.shutdown();
}
