// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Retry policy for SNMP queries.
//
// SNMP runs over UDP, so a lost request or response only shows up as a
// timeout. Transient failures are retransmitted immediately, up to a small
// fixed budget. An agent that answered with nothing useful is not asked again.

use std::time::Duration;

use tracing::{debug, warn};

use tonerwatch_core::config::QuerySettings;
use tonerwatch_core::error::TonerwatchError;

/// Retry configuration for one query.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Attempts after the first one.
    pub max_retries: u32,
    /// Timeout for each attempt.
    pub attempt_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            attempt_timeout: Duration::from_secs(8),
        }
    }
}

impl From<&QuerySettings> for RetryPolicy {
    fn from(settings: &QuerySettings) -> Self {
        Self {
            max_retries: settings.retries,
            attempt_timeout: settings.timeout(),
        }
    }
}

impl RetryPolicy {
    pub fn max_attempts(&self) -> u32 {
        self.max_retries + 1
    }

    /// Longest a query can take before it gives up.
    pub fn worst_case(&self) -> Duration {
        self.attempt_timeout * self.max_attempts()
    }
}

/// Coarse classification of a query failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Lost packet or socket error. Worth another attempt.
    Transient,
    /// The agent answered; asking again will not change the answer.
    Permanent,
}

/// Result of evaluating whether to retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Send the request again right away.
    Retry,
    /// Do not retry; the error is final.
    GiveUp,
    /// Retry budget used up.
    Exhausted,
}

pub fn classify_error(err: &TonerwatchError) -> ErrorClass {
    match err {
        TonerwatchError::QueryTimeout { .. } | TonerwatchError::Transport(_) => {
            ErrorClass::Transient
        }
        TonerwatchError::Io(_) => ErrorClass::Transient,
        _ => ErrorClass::Permanent,
    }
}

/// Decide whether attempt number `attempt` (0-based) should be followed by
/// another one.
pub fn should_retry(err: &TonerwatchError, attempt: u32, policy: &RetryPolicy) -> RetryDecision {
    match classify_error(err) {
        ErrorClass::Permanent => {
            debug!(error = %err, "permanent query error, not retrying");
            RetryDecision::GiveUp
        }
        ErrorClass::Transient => {
            if attempt >= policy.max_retries {
                warn!(attempt, max = policy.max_retries, "query retry budget exhausted");
                RetryDecision::Exhausted
            } else {
                debug!(attempt, error = %err, "retrying query");
                RetryDecision::Retry
            }
        }
    }
}
