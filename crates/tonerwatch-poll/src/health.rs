// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Per-printer health check.
//
// Runs a fixed sequence: port probe → SNMP query → normalization. Every path
// ends in a complete `DeviceHealth`, never an error:
//
//   unreachable          probe failed, nothing queried, offline placeholders
//   full-protocol        query succeeded, real readings (optimistic
//                        placeholders for categories the printer left empty)
//   connectivity-only    query failed, a fresh probe decides online/offline,
//                        offline placeholders plus the error that caused it

use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::{debug, info, instrument, warn};

use tonerwatch_core::config::{AppConfig, MetricOids};
use tonerwatch_core::error::TonerwatchError;
use tonerwatch_core::human_errors::humanize_error;
use tonerwatch_core::types::{
    Device, DeviceHealth, DeviceState, PollMethod, PollStatus, ProbeResult, TonerReading,
    TrayReading,
};

use crate::normalize::{NormalizedMetrics, normalize};
use crate::probe::{ProbeConfig, probe_device};
use crate::retry::RetryPolicy;
use crate::snmp_client::{MetricQueryClient, MetricTransport, SnmpTransport};

/// Polls single printers. Holds only immutable settings, so one instance can
/// serve any number of concurrent polls.
#[derive(Debug, Clone)]
pub struct HealthChecker<T = SnmpTransport> {
    probe: ProbeConfig,
    query: MetricQueryClient<T>,
    oids: MetricOids,
}

impl HealthChecker<SnmpTransport> {
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            ProbeConfig::from(&config.probe),
            MetricQueryClient::snmp(RetryPolicy::from(&config.query), config.query.port),
            config.oids.clone(),
        )
    }
}

impl<T: MetricTransport> HealthChecker<T> {
    pub fn new(probe: ProbeConfig, query: MetricQueryClient<T>, oids: MetricOids) -> Self {
        Self { probe, query, oids }
    }

    /// Upper bound on how long [`poll_device`](Self::poll_device) can take:
    /// two full probes plus every query attempt.
    pub fn worst_case(&self) -> Duration {
        self.probe.worst_case() * 2 + self.query.policy().worst_case()
    }

    /// Poll one printer. Always returns a fully populated record.
    #[instrument(skip_all, fields(device = %device.name, ip = %device.address))]
    pub async fn poll_device(&self, device: &Device) -> DeviceHealth {
        let started = Instant::now();

        let probe = probe_device(device.address, &self.probe).await;
        if !probe.reachable {
            let err = TonerwatchError::ProbeUnreachable;
            let hint = diagnose(&err);
            let health = unreachable_record(device, started.elapsed(), err.to_string(), hint);
            info!(elapsed_ms = health.response_time_ms, "printer unreachable");
            return health;
        }

        let identifiers = self.oids.for_capability(device.capability);
        match self
            .query
            .query(device.address, &device.community, &identifiers)
            .await
        {
            Ok(metrics) => {
                let readings = normalize(&metrics, &self.oids);
                let health = full_protocol_record(device, probe, readings, started.elapsed());
                info!(
                    port = ?health.reachable_port,
                    toners = health.toners.len(),
                    trays = health.trays.len(),
                    elapsed_ms = health.response_time_ms,
                    "printer polled"
                );
                health
            }
            Err(err) => {
                warn!(error = %err, "SNMP query failed, falling back to connectivity check");
                let recheck = probe_device(device.address, &self.probe).await;
                let health = connectivity_only_record(device, recheck, &err, started.elapsed());
                info!(
                    status = ?health.status,
                    elapsed_ms = health.response_time_ms,
                    "printer polled without metrics"
                );
                health
            }
        }
    }
}

/// Human hint for `err`. Errors an operator has to act on are logged at warn.
fn diagnose(err: &TonerwatchError) -> String {
    let human = humanize_error(err);
    if human.severity.needs_attention() {
        warn!(severity = ?human.severity, error = %err, "printer needs attention");
    } else {
        debug!(severity = ?human.severity, error = %err, "transient poll failure");
    }
    human.to_hint()
}

fn millis(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

/// Record for a printer that answered on no candidate port.
fn unreachable_record(
    device: &Device,
    elapsed: Duration,
    error: String,
    hint: String,
) -> DeviceHealth {
    DeviceHealth {
        name: device.name.clone(),
        address: device.address,
        location: device.location.clone(),
        status: PollStatus::Offline,
        reachable: false,
        reachable_port: None,
        toners: vec![TonerReading::unqueried()],
        trays: vec![TrayReading::unqueried()],
        device_state: DeviceState::Unknown,
        page_count: None,
        response_time_ms: millis(elapsed),
        timestamp: Utc::now(),
        method: PollMethod::Unreachable,
        error: Some(error),
        hint: Some(hint),
    }
}

/// Record for a printer whose health check never finished (the poll task
/// panicked or was cancelled). No probe decided the outcome; the error and
/// hint say so.
pub(crate) fn poll_failed_record(device: &Device, detail: &str) -> DeviceHealth {
    let err = TonerwatchError::PollAborted(detail.to_string());
    let hint = diagnose(&err);
    unreachable_record(device, Duration::ZERO, err.to_string(), hint)
}

fn full_protocol_record(
    device: &Device,
    probe: ProbeResult,
    readings: NormalizedMetrics,
    elapsed: Duration,
) -> DeviceHealth {
    let NormalizedMetrics {
        mut toners,
        mut trays,
        device_state,
        page_count,
    } = readings;
    if toners.is_empty() {
        toners.push(TonerReading::assumed_full());
    }
    if trays.is_empty() {
        trays.push(TrayReading::assumed_ok());
    }

    DeviceHealth {
        name: device.name.clone(),
        address: device.address,
        location: device.location.clone(),
        status: PollStatus::Online,
        reachable: true,
        reachable_port: probe.port,
        toners,
        trays,
        device_state,
        page_count,
        response_time_ms: millis(elapsed),
        timestamp: Utc::now(),
        method: PollMethod::FullProtocol,
        error: None,
        hint: None,
    }
}

fn connectivity_only_record(
    device: &Device,
    recheck: ProbeResult,
    err: &TonerwatchError,
    elapsed: Duration,
) -> DeviceHealth {
    DeviceHealth {
        name: device.name.clone(),
        address: device.address,
        location: device.location.clone(),
        status: if recheck.reachable {
            PollStatus::Online
        } else {
            PollStatus::Offline
        },
        reachable: recheck.reachable,
        reachable_port: recheck.port,
        toners: vec![TonerReading::unqueried()],
        trays: vec![TrayReading::unqueried()],
        device_state: DeviceState::Unknown,
        page_count: None,
        response_time_ms: millis(elapsed),
        timestamp: Utc::now(),
        method: PollMethod::ConnectivityOnly,
        error: Some(err.to_string()),
        hint: Some(diagnose(err)),
    }
}
