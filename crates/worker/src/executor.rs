// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subprocess execution of dispatched jobs.

use std::io::Write;
use std::process::Stdio;
use std::time::Duration;

use mc_core::{Job, JobResult};
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum ExecuteError {
    #[error("job carries no script")]
    NoScript,

    #[error("failed to materialize script: {0}")]
    Io(#[from] std::io::Error),
}

/// Run a job to completion and fold the outcome into a `JobResult`.
///
/// Inline script content is materialized to an executable temp file for
/// the duration of the run; path jobs run the advertised path directly.
/// Wall-clock is bounded by `timeout`: a timed out subprocess is killed
/// and reported as `error: "timeout"`. Exit 0 maps to success with the
/// captured stdout, anything else to failure with the captured stderr.
pub async fn run_job(job: &Job, timeout: Duration) -> JobResult {
    // The guard keeps a materialized script on disk until the child exits.
    let (program, _guard) = match script_program(job) {
        Ok(resolved) => resolved,
        Err(e) => return JobResult::err(&job.job_id, e.to_string()),
    };

    let mut command = Command::new(&program);
    command
        .args(&job.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    debug!(job = %job.job_id, program = %program, "spawning");
    let child = match command.spawn() {
        Ok(child) => child,
        Err(e) => return JobResult::err(&job.job_id, format!("failed to spawn {program}: {e}")),
    };

    let output = match tokio::time::timeout(timeout, child.wait_with_output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => return JobResult::err(&job.job_id, format!("failed to run {program}: {e}")),
        Err(_) => {
            // Dropping the wait future kills the child (kill_on_drop).
            warn!(job = %job.job_id, "job timed out");
            return JobResult::err(&job.job_id, "timeout");
        }
    };

    if output.status.success() {
        JobResult::ok(&job.job_id, String::from_utf8_lossy(&output.stdout))
    } else {
        JobResult::err(&job.job_id, String::from_utf8_lossy(&output.stderr))
    }
}

/// Resolve the program to execute: the job's script path, or its inline
/// content written to an executable temp file.
fn script_program(job: &Job) -> Result<(String, Option<tempfile::TempPath>), ExecuteError> {
    if let Some(path) = &job.script_path {
        return Ok((path.clone(), None));
    }
    let Some(content) = &job.script_content else {
        return Err(ExecuteError::NoScript);
    };

    let mut file = tempfile::Builder::new().prefix("mc-job-").tempfile()?;
    file.write_all(content.as_bytes())?;
    file.flush()?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.as_file().set_permissions(std::fs::Permissions::from_mode(0o700))?;
    }
    let path = file.into_temp_path();
    let program = path.to_string_lossy().into_owned();
    Ok((program, Some(path)))
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;
