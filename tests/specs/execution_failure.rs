// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Execution failure: a script that exits non-zero produces a FAILED job
//! with the captured stderr, delivered through get_result.

use crate::prelude::*;
use mc_core::JobState;
use mc_wire::ClientResponse;

#[tokio::test]
async fn failing_script_marks_job_failed_with_stderr() {
    let coordinator = start_coordinator().await;
    let (worker_shutdown, _port) = start_worker(&coordinator).await;

    // Inline content exercises the temp-file materialization path too.
    let script = "#!/bin/sh\necho boom >&2\nexit 2\n";
    let job_id = submit_content(&coordinator, script, &[]).await;

    let failed = wait_for(WAIT_MAX, || {
        coordinator.state.lock().job_state(&job_id) == Some(JobState::Failed)
    })
    .await;
    assert!(failed, "job should end FAILED");

    assert_eq!(get_state(&coordinator, &job_id).await.state, JobState::Failed);
    match get_result(&coordinator, &job_id).await {
        ClientResponse::ResultReady { result } => {
            assert!(!result.success);
            assert!(result.output.is_none());
            assert_eq!(result.error.as_deref(), Some("boom\n"));
        }
        other => panic!("expected result_ready, got {other:?}"),
    }

    worker_shutdown.cancel();
    coordinator.shutdown();
}

#[tokio::test]
async fn scripts_receive_their_arguments() {
    let coordinator = start_coordinator().await;
    let (worker_shutdown, _port) = start_worker(&coordinator).await;

    let script = "#!/bin/sh\necho \"$1 $2\"\n";
    let job_id = submit_content(&coordinator, script, &["alpha", "beta"]).await;

    let done = wait_for(WAIT_MAX, || {
        coordinator.state.lock().job_state(&job_id) == Some(JobState::Completed)
    })
    .await;
    assert!(done);

    match get_result(&coordinator, &job_id).await {
        ClientResponse::ResultReady { result } => {
            assert_eq!(result.output.as_deref(), Some("alpha beta\n"))
        }
        other => panic!("expected result_ready, got {other:?}"),
    }

    worker_shutdown.cancel();
    coordinator.shutdown();
}
