// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Fleet fan-out: poll many printers at once and collect the snapshots.
//
// Every printer gets its own task on a `JoinSet`; polls share nothing but the
// read-only `HealthChecker`. Results come back in roster order regardless of
// completion order.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::task::JoinSet;
use tracing::{error, info};

use tonerwatch_core::config::AppConfig;
use tonerwatch_core::error::{Result, TonerwatchError};
use tonerwatch_core::types::{Device, DeviceHealth};

use crate::health::{HealthChecker, poll_failed_record};
use crate::snmp_client::{MetricTransport, SnmpTransport};

/// Aggregated result of polling several printers.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FleetReport {
    pub data: Vec<DeviceHealth>,
    pub count: usize,
    pub online: usize,
    pub offline: usize,
    pub timestamp: DateTime<Utc>,
}

impl FleetReport {
    pub fn from_results(data: Vec<DeviceHealth>) -> Self {
        let online = data.iter().filter(|h| h.is_online()).count();
        Self {
            count: data.len(),
            online,
            offline: data.len() - online,
            data,
            timestamp: Utc::now(),
        }
    }
}

/// Poll `devices` concurrently. Returns one record per device, in input order.
pub async fn poll_devices<T>(checker: Arc<HealthChecker<T>>, devices: &[Device]) -> Vec<DeviceHealth>
where
    T: MetricTransport + 'static,
{
    let mut set = JoinSet::new();
    for (index, device) in devices.iter().cloned().enumerate() {
        let checker = Arc::clone(&checker);
        set.spawn(async move { (index, checker.poll_device(&device).await) });
    }

    let mut slots: Vec<Option<DeviceHealth>> = vec![None; devices.len()];
    let mut failure = None;
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok((index, health)) => slots[index] = Some(health),
            Err(e) => {
                error!(error = %e, "health check task failed");
                let detail = if e.is_panic() {
                    "poll task panicked"
                } else {
                    "poll task was cancelled"
                };
                failure = Some(detail);
            }
        }
    }

    let detail = failure.unwrap_or("poll task produced no result");
    slots
        .into_iter()
        .zip(devices)
        .map(|(slot, device)| slot.unwrap_or_else(|| poll_failed_record(device, detail)))
        .collect()
}

/// The monitored roster plus the checker used to poll it.
pub struct Fleet<T = SnmpTransport> {
    checker: Arc<HealthChecker<T>>,
    devices: Vec<Device>,
}

impl Fleet<SnmpTransport> {
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(HealthChecker::from_config(config), config.devices())
    }
}

impl<T: MetricTransport + 'static> Fleet<T> {
    pub fn new(checker: HealthChecker<T>, devices: Vec<Device>) -> Self {
        Self {
            checker: Arc::new(checker),
            devices,
        }
    }

    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    /// Look up a printer by its exact name.
    pub fn find(&self, name: &str) -> Result<&Device> {
        self.devices
            .iter()
            .find(|d| d.name == name)
            .ok_or_else(|| TonerwatchError::UnknownDevice(name.to_string()))
    }

    /// Poll one printer by name.
    pub async fn poll_named(&self, name: &str) -> Result<DeviceHealth> {
        let device = self.find(name)?;
        Ok(self.checker.poll_device(device).await)
    }

    /// Poll the whole roster.
    pub async fn poll_all(&self) -> FleetReport {
        self.poll_selected(None).await
    }

    /// Poll the printers whose names appear in `names`, or all of them when
    /// `names` is `None`. Unknown names are ignored; roster order is kept.
    pub async fn poll_selected(&self, names: Option<&[String]>) -> FleetReport {
        let selected: Vec<Device> = match names {
            Some(names) => self
                .devices
                .iter()
                .filter(|d| names.iter().any(|n| *n == d.name))
                .cloned()
                .collect(),
            None => self.devices.clone(),
        };

        info!(count = selected.len(), "polling printers");
        let report = FleetReport::from_results(poll_devices(Arc::clone(&self.checker), &selected).await);
        info!(
            count = report.count,
            online = report.online,
            offline = report.offline,
            "fleet poll complete"
        );
        report
    }
}
