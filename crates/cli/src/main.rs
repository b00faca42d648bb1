// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `mc`, the client CLI for the microcluster coordinator.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod client;
mod exit_error;

use clap::{Parser, Subcommand};
use client::{ClientError, ClientSession};
use exit_error::ExitError;

#[derive(Parser)]
#[command(name = "mc", about = "Submit and track jobs on a microcluster coordinator", version)]
struct Cli {
    /// Coordinator endpoint (host:port)
    #[arg(long, global = true, default_value = "127.0.0.1:5000")]
    coordinator: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Submit a script for execution
    Submit {
        /// Path to the script (resolved on the worker host unless --inline)
        script: String,

        /// Arguments passed to the script
        args: Vec<String>,

        /// Read the script here and ship its content inline
        #[arg(long)]
        inline: bool,
    },

    /// Fetch the result of a finished job
    Result { job_id: String },

    /// Show the lifecycle state of a job
    State { job_id: String },

    /// Cancel a job that has not started yet
    Cancel { job_id: String },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("{}", e.message);
        std::process::exit(e.code);
    }
}

async fn run(cli: Cli) -> Result<(), ExitError> {
    let session = ClientSession::new(&cli.coordinator);
    match cli.command {
        Command::Submit { script, args, inline } => {
            let (path, content) = if inline {
                let content = std::fs::read_to_string(&script)
                    .map_err(|e| ExitError::new(1, format!("Failed to read {script}: {e}")))?;
                (None, Some(content))
            } else {
                (Some(script), None)
            };
            let job_id =
                session.submit_job(path, content, args).await.map_err(|e| failed("submit job", e))?;
            println!("Job submitted with ID: {job_id}");
        }

        Command::Result { job_id } => {
            match session.get_result(&job_id).await.map_err(|e| failed("get result", e))? {
                None => println!("Result not ready for job {job_id}"),
                Some(result) if result.success => {
                    println!("Job {} completed successfully:", result.job_id);
                    if let Some(output) = result.output {
                        print!("{output}");
                    }
                }
                Some(result) => {
                    println!("Job {} failed:", result.job_id);
                    if let Some(error) = result.error {
                        print!("{error}");
                    }
                }
            }
        }

        Command::State { job_id } => {
            let state =
                session.get_job_state(&job_id).await.map_err(|e| failed("get job state", e))?;
            println!("State of job {job_id}: {state}");
        }

        Command::Cancel { job_id } => {
            session.cancel_job(&job_id).await.map_err(|e| failed("cancel job", e))?;
            println!("Job {job_id} cancelled");
        }
    }
    Ok(())
}

/// Map client errors to the documented CLI failure text.
fn failed(verb: &str, e: ClientError) -> ExitError {
    match e {
        ClientError::Rejected(message) => ExitError::new(1, format!("Error: {message}")),
        other => ExitError::new(1, format!("Failed to {verb}: {other}; check logs")),
    }
}
