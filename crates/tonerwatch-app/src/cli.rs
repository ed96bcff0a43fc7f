// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Command-line argument parsing.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Printer fleet health monitor
#[derive(Debug, Parser)]
#[command(name = "tonerwatch", version)]
#[command(about = "Printer fleet health monitor: toner, trays and reachability over SNMP", long_about = None)]
pub struct Cli {
    /// Path to the JSON config file
    #[arg(long, global = true, env = "TONERWATCH_CONFIG", default_value = "tonerwatch.json")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Serve the JSON status API
    Serve {
        /// Listen port (overrides `server_port` from the config file)
        #[arg(long, env = "PORT")]
        port: Option<u16>,
    },

    /// Poll printers once and print the fleet report as JSON
    Poll {
        /// Printer names to poll; all printers when omitted
        names: Vec<String>,
    },

    /// Poll a single printer and print its snapshot as JSON
    Check {
        /// Printer name as it appears in the config file
        name: String,
    },
}
