// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable diagnostics for the people who look after the printers.
//
// Every technical error is mapped to plain English with a clear suggestion.
// The wording ends up in the `hint` field of degraded health records.

use crate::error::TonerwatchError;

/// Severity of an error from the operator's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Network blip or busy agent. The next poll may well succeed.
    Transient,
    /// Someone has to do something (power on, fix SNMP settings, edit config).
    ActionRequired,
    /// Cannot be fixed by polling again.
    Permanent,
}

impl Severity {
    /// Whether an operator has to step in before the next poll can succeed.
    pub fn needs_attention(self) -> bool {
        !matches!(self, Self::Transient)
    }
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary.
    pub message: String,
    /// What the operator should try.
    pub suggestion: String,
    pub severity: Severity,
}

impl HumanError {
    /// Message and suggestion as one line.
    pub fn to_hint(&self) -> String {
        format!("{} {}", self.message, self.suggestion)
    }
}

/// Convert a `TonerwatchError` into a `HumanError`.
pub fn humanize_error(err: &TonerwatchError) -> HumanError {
    match err {
        // -- Poll errors --
        TonerwatchError::ProbeUnreachable => HumanError {
            message: "The printer isn't answering on the network.".into(),
            suggestion: "Check that it is switched on and its network cable or Wi-Fi is connected.".into(),
            severity: Severity::ActionRequired,
        },

        TonerwatchError::QueryTimeout { .. } => HumanError {
            message: "The printer is on the network but didn't answer the status query.".into(),
            suggestion: "Make sure SNMP is enabled on the printer and UDP port 161 isn't blocked.".into(),
            severity: Severity::Transient,
        },

        TonerwatchError::NoValidData => HumanError {
            message: "The printer answered but didn't report any supply or tray data.".into(),
            suggestion: "Check the SNMP community string, and that the printer supports the standard Printer MIB.".into(),
            severity: Severity::ActionRequired,
        },

        TonerwatchError::Transport(detail) => humanize_transport_error(detail),

        TonerwatchError::PollAborted(_) => HumanError {
            message: "The health check stopped before it could reach the printer's status.".into(),
            suggestion: "This says nothing about the printer itself. Check the service logs; the next poll will try again.".into(),
            severity: Severity::Transient,
        },

        // -- Collaborator errors --
        TonerwatchError::UnknownDevice(name) => HumanError {
            message: "That printer isn't in the monitored list.".into(),
            suggestion: format!("Check the spelling of '{name}', or add it to the configuration file."),
            severity: Severity::ActionRequired,
        },

        TonerwatchError::Config(detail) => HumanError {
            message: "The configuration file has a problem.".into(),
            suggestion: format!("Fix the configuration and restart. ({detail})"),
            severity: Severity::Permanent,
        },

        TonerwatchError::Io(io_err) => {
            if io_err.kind() == std::io::ErrorKind::NotFound {
                HumanError {
                    message: "A file couldn't be found.".into(),
                    suggestion: "Check the configuration file path.".into(),
                    severity: Severity::ActionRequired,
                }
            } else if io_err.kind() == std::io::ErrorKind::PermissionDenied {
                HumanError {
                    message: "Permission was denied.".into(),
                    suggestion: "Check file permissions, or that the service may bind its port.".into(),
                    severity: Severity::ActionRequired,
                }
            } else {
                HumanError {
                    message: "There was an input/output problem.".into(),
                    suggestion: "Try again. If this keeps happening, check the host's disk and network.".into(),
                    severity: Severity::Transient,
                }
            }
        }

        TonerwatchError::Serialization(_) => HumanError {
            message: "Some data couldn't be read or written as JSON.".into(),
            suggestion: "If this is the configuration file, check it for typos such as missing commas.".into(),
            severity: Severity::Permanent,
        },
    }
}

/// Parse socket-level error details into human-readable messages.
fn humanize_transport_error(detail: &str) -> HumanError {
    let lower = detail.to_ascii_lowercase();

    if lower.contains("connection refused") {
        HumanError {
            message: "The printer refused the status query.".into(),
            suggestion: "SNMP is probably disabled on the printer. Enable it in the printer's web settings.".into(),
            severity: Severity::ActionRequired,
        }
    } else if lower.contains("unreachable") {
        HumanError {
            message: "The network route to the printer is down.".into(),
            suggestion: "Check that the monitoring host can still reach the printer's subnet.".into(),
            severity: Severity::Transient,
        }
    } else {
        HumanError {
            message: "The status query failed.".into(),
            suggestion: format!("It will be retried on the next poll. (Detail: {detail})"),
            severity: Severity::Transient,
        }
    }
}
