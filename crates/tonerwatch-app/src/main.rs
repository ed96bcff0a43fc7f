// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Tonerwatch: printer fleet health monitor
//
// Entry point. Initialises logging, loads the printer roster, then either
// serves the JSON API or runs a one-shot poll from the command line.

mod api;
mod cli;

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;

use clap::Parser;
use serde::Serialize;
use tokio::net::TcpListener;
use tracing::{info, warn};

use tonerwatch_core::AppConfig;
use tonerwatch_core::error::Result;
use tonerwatch_poll::Fleet;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load_or_default(&cli.config)?;
    info!(
        config = %cli.config.display(),
        printers = config.printers.len(),
        "Tonerwatch starting"
    );
    let fleet = Fleet::from_config(&config);

    match cli.command {
        Commands::Serve { port } => serve(fleet, port.unwrap_or(config.server_port)).await,
        Commands::Poll { names } => {
            let selection = (!names.is_empty()).then_some(names.as_slice());
            print_json(&fleet.poll_selected(selection).await)
        }
        Commands::Check { name } => print_json(&fleet.poll_named(&name).await?),
    }
}

async fn serve(fleet: Fleet, port: u16) -> Result<()> {
    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, printers = fleet.devices().len(), "status API listening");

    axum::serve(listener, api::router(Arc::new(fleet)))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("status API stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "cannot listen for Ctrl-C, running until killed");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
