// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Queueing without workers: jobs accumulate, then drain in FIFO order
//! once a worker appears. Also covers cancellation of queued jobs.

use crate::prelude::*;
use mc_core::JobState;
use mc_wire::{ClientRequest, ClientResponse};

#[tokio::test]
async fn jobs_queue_until_a_worker_registers() {
    let coordinator = start_coordinator().await;

    for (n, expected) in [("one", "1"), ("two", "2"), ("three", "3")] {
        let job_id = submit_path(&coordinator, "/bin/echo", &[n]).await;
        assert_eq!(job_id, expected);
    }
    for job_id in ["1", "2", "3"] {
        assert_eq!(get_state(&coordinator, job_id).await.state, JobState::Pending);
    }

    let (worker_shutdown, _port) = start_worker(&coordinator).await;

    let all_done = wait_for(WAIT_MAX, || {
        let state = coordinator.state.lock();
        ["1", "2", "3"].iter().all(|id| state.job_state(id) == Some(JobState::Completed))
    })
    .await;
    assert!(all_done, "all queued jobs should drain through the single worker");

    // Each job's result matches its own argument: FIFO pairing held.
    for (job_id, arg) in [("1", "one\n"), ("2", "two\n"), ("3", "three\n")] {
        match get_result(&coordinator, job_id).await {
            ClientResponse::ResultReady { result } => {
                assert_eq!(result.output.as_deref(), Some(arg))
            }
            other => panic!("expected result for job {job_id}, got {other:?}"),
        }
    }

    worker_shutdown.cancel();
    coordinator.shutdown();
}

#[tokio::test]
async fn queued_job_can_be_cancelled() {
    let coordinator = start_coordinator().await;

    let job_id = submit_path(&coordinator, "/bin/echo", &["never"]).await;
    let request = ClientRequest::CancelJob { job_id: job_id.clone() };
    let reply: ClientResponse = client_exchange(&coordinator, &request).await;
    assert_eq!(reply, ClientResponse::JobCancelled { job_id: job_id.clone() });

    assert_eq!(get_state(&coordinator, &job_id).await.state, JobState::Cancelled);
    // Cancelled jobs never produce a result.
    assert_eq!(get_result(&coordinator, &job_id).await, ClientResponse::ResultNotReady);

    // A late worker must not pick the cancelled job up.
    let (worker_shutdown, _port) = start_worker(&coordinator).await;
    tokio::time::sleep(std::time::Duration::from_millis(300)).await;
    assert_eq!(get_state(&coordinator, &job_id).await.state, JobState::Cancelled);

    worker_shutdown.cancel();
    coordinator.shutdown();
}

#[tokio::test]
async fn cancel_is_refused_for_unknown_jobs() {
    let coordinator = start_coordinator().await;

    let request = ClientRequest::CancelJob { job_id: "42".to_string() };
    let reply: ClientResponse = client_exchange(&coordinator, &request).await;
    assert!(matches!(reply, ClientResponse::Error { .. }));

    coordinator.shutdown();
}
