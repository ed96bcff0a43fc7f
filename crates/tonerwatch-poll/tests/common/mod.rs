// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Shared fixtures for the tonerwatch-poll integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use tokio::net::TcpListener;

use tonerwatch_core::config::MetricOids;
use tonerwatch_core::error::{Result, TonerwatchError};
use tonerwatch_core::types::RawMetric;
use tonerwatch_poll::health::HealthChecker;
use tonerwatch_poll::probe::ProbeConfig;
use tonerwatch_poll::retry::RetryPolicy;
use tonerwatch_poll::snmp_client::{MetricQueryClient, MetricTransport, SNMP_PORT};

pub const LOCALHOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

/// What one simulated printer answers with.
#[derive(Debug, Clone)]
pub struct Fixture {
    pub values: HashMap<String, i64>,
    pub delay: Duration,
}

/// Serves canned answers keyed by community string, so printers sharing an
/// address can still be told apart.
#[derive(Debug, Default)]
pub struct FixtureTransport {
    pub fixtures: HashMap<String, Fixture>,
}

impl MetricTransport for FixtureTransport {
    async fn fetch(&self, _: SocketAddr, community: &str, ids: &[String]) -> Result<Vec<RawMetric>> {
        let fixture = self
            .fixtures
            .get(community)
            .ok_or_else(|| TonerwatchError::Transport(format!("no agent for {community}")))?;
        tokio::time::sleep(fixture.delay).await;
        Ok(ids
            .iter()
            .map(|id| match fixture.values.get(id) {
                Some(v) => RawMetric::integer(id.as_str(), *v),
                None => RawMetric::absent(id.as_str()),
            })
            .collect())
    }
}

pub async fn open_port() -> (TcpListener, u16) {
    let listener = TcpListener::bind((LOCALHOST, 0)).await.unwrap();
    let port = listener.local_addr().unwrap().port();
    (listener, port)
}

pub async fn closed_ports(n: usize) -> Vec<u16> {
    let mut ports = Vec::with_capacity(n);
    for _ in 0..n {
        let (listener, port) = open_port().await;
        drop(listener);
        ports.push(port);
    }
    ports
}

pub fn checker<T: MetricTransport>(transport: T, ports: Vec<u16>) -> HealthChecker<T> {
    HealthChecker::new(
        ProbeConfig {
            ports,
            timeout: Duration::from_millis(500),
        },
        MetricQueryClient::new(
            transport,
            RetryPolicy {
                max_retries: 1,
                attempt_timeout: Duration::from_secs(2),
            },
            SNMP_PORT,
        ),
        MetricOids::default(),
    )
}
