// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `mcd`, the microcluster coordinator daemon.

use clap::Parser;
use mc_coordinator::{env, start, Config};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mcd", about = "microcluster coordinator daemon", version)]
struct Args {
    /// Address to bind the listening socket on
    #[arg(long, default_value = "0.0.0.0")]
    bind: String,

    /// TCP port to listen on
    #[arg(long, default_value_t = env::port())]
    port: u16,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_tracing();

    let config = Config { bind_addr: args.bind, port: args.port, ..Config::default() };
    let coordinator = match start(config).await {
        Ok(coordinator) => coordinator,
        Err(e) => {
            eprintln!("mcd: {e}");
            std::process::exit(1);
        }
    };

    shutdown_signal().await;
    info!("shutting down");
    coordinator.shutdown();
    // Let in-flight handlers finish their current message.
    tokio::time::sleep(env::drain_timeout()).await;
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
