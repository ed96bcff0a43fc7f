// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Reachability probing.
//
// A printer counts as reachable if it completes a TCP handshake on any of a
// fixed list of well-known printing ports. Ports are tried in order and the
// first success wins. A refused connection and a timeout are the same thing
// here: not reachable on that port. No retries within a port attempt.

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use tokio::net::TcpStream;
use tracing::{debug, info, warn};

use tonerwatch_core::config::{DEFAULT_PROBE_PORTS, ProbeSettings};
use tonerwatch_core::types::ProbeResult;

/// Ordered candidate ports and the per-port connect timeout.
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    pub ports: Vec<u16>,
    pub timeout: Duration,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            ports: DEFAULT_PROBE_PORTS.to_vec(),
            timeout: Duration::from_secs(2),
        }
    }
}

impl From<&ProbeSettings> for ProbeConfig {
    fn from(settings: &ProbeSettings) -> Self {
        Self {
            ports: settings.ports.clone(),
            timeout: settings.timeout(),
        }
    }
}

impl ProbeConfig {
    /// Longest a full probe can take.
    pub fn worst_case(&self) -> Duration {
        self.timeout * self.ports.len() as u32
    }
}

/// Probe the candidate ports in order and report the first that accepts.
pub async fn probe_device(ip: IpAddr, config: &ProbeConfig) -> ProbeResult {
    for &port in &config.ports {
        match probe_port(ip, port, config.timeout).await {
            Ok(()) => {
                info!(%ip, port, "printer reachable");
                return ProbeResult::reached(port);
            }
            Err(e) => {
                debug!(%ip, port, error = %e, "port not answering, trying next");
            }
        }
    }

    warn!(%ip, ports = config.ports.len(), "printer not reachable on any candidate port");
    ProbeResult::unreachable()
}

/// Attempt one TCP handshake. The connection is dropped straight away.
async fn probe_port(ip: IpAddr, port: u16, timeout: Duration) -> Result<(), String> {
    let addr = SocketAddr::new(ip, port);
    let _stream = tokio::time::timeout(timeout, TcpStream::connect(addr))
        .await
        .map_err(|_| format!("connect to {addr} timed out after {}ms", timeout.as_millis()))?
        .map_err(|e| format!("connect to {addr}: {e}"))?;
    Ok(())
}
