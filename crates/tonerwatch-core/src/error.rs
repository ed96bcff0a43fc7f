// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Tonerwatch.

use std::time::Duration;

use thiserror::Error;

/// Top-level error type for all Tonerwatch operations.
#[derive(Debug, Error)]
pub enum TonerwatchError {
    // -- Poll errors (caught at the per-device poll boundary) --
    #[error("printer not reachable on any common port")]
    ProbeUnreachable,

    #[error("SNMP request timed out after {attempts} attempt(s) of {}ms", timeout.as_millis())]
    QueryTimeout { attempts: u32, timeout: Duration },

    #[error("no valid SNMP responses received")]
    NoValidData,

    #[error("SNMP transport failed: {0}")]
    Transport(String),

    #[error("health check did not complete: {0}")]
    PollAborted(String),

    // -- Collaborator errors --
    #[error("printer not found: {0}")]
    UnknownDevice(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl TonerwatchError {
    /// Whether this error belongs to the query stage of a device poll.
    pub fn is_query_failure(&self) -> bool {
        matches!(
            self,
            Self::QueryTimeout { .. } | Self::NoValidData | Self::Transport(_)
        )
    }
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, TonerwatchError>;
