// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Application configuration: the printer roster, the SNMP identifier table,
// and the probe/query timing budgets.

use std::collections::HashSet;
use std::net::IpAddr;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Result, TonerwatchError};
use crate::types::{Device, DeviceCapability};

/// Candidate ports in probe order: raw/JetDirect, LPD, IPP, HTTP, HTTPS,
/// alternate PCL.
pub const DEFAULT_PROBE_PORTS: [u16; 6] = [9100, 515, 631, 80, 443, 9220];

/// Persistent application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Port for the JSON status API.
    pub server_port: u16,
    pub probe: ProbeSettings,
    pub query: QuerySettings,
    pub oids: MetricOids,
    /// Monitored printers, in display order.
    pub printers: Vec<PrinterEntry>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_port: 3001,
            probe: ProbeSettings::default(),
            query: QuerySettings::default(),
            oids: MetricOids::default(),
            printers: Vec::new(),
        }
    }
}

/// Reachability probe budget.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeSettings {
    pub ports: Vec<u16>,
    /// Per-port connect timeout.
    pub timeout_ms: u64,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            ports: DEFAULT_PROBE_PORTS.to_vec(),
            timeout_ms: 2000,
        }
    }
}

impl ProbeSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// SNMP query budget.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QuerySettings {
    /// Agent UDP port.
    pub port: u16,
    /// Timeout for one attempt at the whole identifier batch.
    pub timeout_ms: u64,
    /// Extra attempts after the first one times out.
    pub retries: u32,
}

impl Default for QuerySettings {
    fn default() -> Self {
        Self {
            port: 161,
            timeout_ms: 8000,
            retries: 2,
        }
    }
}

impl QuerySettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Named SNMP identifiers queried on every printer.
///
/// Defaults are the standard Printer-MIB (RFC 3805) and Host-Resources-MIB
/// (RFC 2790) instances for the first marker, input and printer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricOids {
    pub toner_black: String,
    pub toner_cyan: String,
    pub toner_magenta: String,
    pub toner_yellow: String,
    pub tray_1: String,
    pub tray_2: String,
    pub device_state: String,
    pub page_count: String,
}

impl Default for MetricOids {
    fn default() -> Self {
        Self {
            toner_black: "1.3.6.1.2.1.43.11.1.1.9.1.1".into(),
            toner_cyan: "1.3.6.1.2.1.43.11.1.1.9.1.2".into(),
            toner_magenta: "1.3.6.1.2.1.43.11.1.1.9.1.3".into(),
            toner_yellow: "1.3.6.1.2.1.43.11.1.1.9.1.4".into(),
            tray_1: "1.3.6.1.2.1.43.8.2.1.12.1.1".into(),
            tray_2: "1.3.6.1.2.1.43.8.2.1.12.1.2".into(),
            device_state: "1.3.6.1.2.1.25.3.5.1.1.1".into(),
            page_count: "1.3.6.1.2.1.43.10.2.1.4.1.1".into(),
        }
    }
}

impl MetricOids {
    /// Identifiers to request from a device with the given capability.
    pub fn for_capability(&self, capability: DeviceCapability) -> Vec<String> {
        let mut oids = vec![
            self.toner_black.clone(),
            self.tray_1.clone(),
            self.tray_2.clone(),
            self.device_state.clone(),
            self.page_count.clone(),
        ];
        if capability == DeviceCapability::Color {
            oids.push(self.toner_cyan.clone());
            oids.push(self.toner_magenta.clone());
            oids.push(self.toner_yellow.clone());
        }
        oids
    }
}

/// One roster entry as written in the config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrinterEntry {
    pub name: String,
    pub ip: IpAddr,
    #[serde(default = "default_community")]
    pub community: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub location: String,
    /// Overrides the capability inferred from `model`.
    #[serde(default)]
    pub capability: Option<DeviceCapability>,
}

fn default_community() -> String {
    "public".into()
}

impl PrinterEntry {
    pub fn to_device(&self) -> Device {
        let capability = self.capability.unwrap_or_else(|| {
            self.model
                .as_deref()
                .map(DeviceCapability::from_model)
                .unwrap_or_default()
        });
        Device {
            name: self.name.clone(),
            address: self.ip,
            community: self.community.clone(),
            capability,
            model: self.model.clone(),
            location: self.location.clone(),
        }
    }
}

impl AppConfig {
    /// Read and validate a JSON config file.
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&data)?;
        config.validate()?;
        info!(
            path = %path.display(),
            printers = config.printers.len(),
            "configuration loaded"
        );
        Ok(config)
    }

    /// Like [`load`](Self::load), but a missing file yields the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            warn!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }
        Self::load(path)
    }

    /// Write the config as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.probe.ports.is_empty() {
            return Err(TonerwatchError::Config("probe.ports must not be empty".into()));
        }
        if self.probe.timeout_ms == 0 || self.query.timeout_ms == 0 {
            return Err(TonerwatchError::Config("timeouts must be non-zero".into()));
        }
        let mut seen = HashSet::new();
        for printer in &self.printers {
            if printer.name.trim().is_empty() {
                return Err(TonerwatchError::Config("printer name must not be empty".into()));
            }
            if !seen.insert(printer.name.as_str()) {
                return Err(TonerwatchError::Config(format!(
                    "duplicate printer name '{}'",
                    printer.name
                )));
            }
        }
        Ok(())
    }

    /// The roster as immutable devices, in config order.
    pub fn devices(&self) -> Vec<Device> {
        self.printers.iter().map(PrinterEntry::to_device).collect()
    }
}
