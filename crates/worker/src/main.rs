// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `mcw`, the microcluster worker daemon.

use clap::Parser;
use mc_worker::{Worker, WorkerConfig};
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mcw", about = "microcluster worker daemon", version)]
struct Args {
    /// Coordinator endpoint (host:port)
    #[arg(long, default_value = "127.0.0.1:5000")]
    coordinator: String,

    /// Address to bind the dispatch listener on
    #[arg(long, default_value = "0.0.0.0")]
    bind: String,

    /// Dispatch listener port (0 picks an ephemeral port)
    #[arg(long, default_value_t = 0)]
    port: u16,

    /// Address advertised to the coordinator
    #[arg(long, default_value = "127.0.0.1")]
    advertise: String,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_tracing();

    let config = WorkerConfig {
        bind_addr: args.bind,
        port: args.port,
        advertise_addr: args.advertise,
        ..WorkerConfig::new(args.coordinator)
    };

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        info!("shutting down");
        signal_token.cancel();
    });

    let worker = match Worker::bind(config, shutdown).await {
        Ok(worker) => worker,
        Err(e) => {
            eprintln!("mcw: {e}");
            std::process::exit(1);
        }
    };
    info!(port = worker.port(), "worker listening for dispatches");

    if let Err(e) = worker.run().await {
        eprintln!("mcw: {e}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_env("MC_LOG").unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut term = match signal(SignalKind::terminate()) {
            Ok(term) => term,
            Err(_) => {
                let _ = tokio::signal::ctrl_c().await;
                return;
            }
        };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = term.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
