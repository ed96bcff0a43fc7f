// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Tonerwatch printer monitor.

use std::net::IpAddr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Whether a printer has colour marker supplies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceCapability {
    #[default]
    Monochrome,
    Color,
}

impl DeviceCapability {
    /// Infer the capability from a vendor model tag such as `"hp-color"`.
    pub fn from_model(model: &str) -> Self {
        if model.to_ascii_lowercase().contains("color") {
            Self::Color
        } else {
            Self::Monochrome
        }
    }
}

/// A monitored printer. Built once from configuration and only read afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    pub name: String,
    pub address: IpAddr,
    /// SNMP v2c community string.
    pub community: String,
    pub capability: DeviceCapability,
    /// Vendor model tag, informational only.
    pub model: Option<String>,
    pub location: String,
}

impl Device {
    pub fn new(
        name: impl Into<String>,
        address: IpAddr,
        community: impl Into<String>,
        capability: DeviceCapability,
        location: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            address,
            community: community.into(),
            capability,
            model: None,
            location: location.into(),
        }
    }
}

/// Outcome of a reachability probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProbeResult {
    pub reachable: bool,
    pub port: Option<u16>,
}

impl ProbeResult {
    pub fn reached(port: u16) -> Self {
        Self {
            reachable: true,
            port: Some(port),
        }
    }

    pub fn unreachable() -> Self {
        Self {
            reachable: false,
            port: None,
        }
    }
}

/// A decoded protocol value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RawValue {
    Integer(i64),
    Text(String),
}

impl RawValue {
    /// Numeric interpretation; text is accepted only if it is a plain integer.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Self::Integer(v) => Some(*v),
            Self::Text(s) => s.trim().parse().ok(),
        }
    }
}

/// One queried counter as returned by the metric query client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawMetric {
    pub identifier: String,
    pub value: Option<RawValue>,
}

impl RawMetric {
    pub fn new(identifier: impl Into<String>, value: Option<RawValue>) -> Self {
        Self {
            identifier: identifier.into(),
            value,
        }
    }

    pub fn integer(identifier: impl Into<String>, value: i64) -> Self {
        Self::new(identifier, Some(RawValue::Integer(value)))
    }

    pub fn absent(identifier: impl Into<String>) -> Self {
        Self::new(identifier, None)
    }
}

/// Marker supply colours, in Printer-MIB marker index order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TonerColor {
    Black,
    Cyan,
    Magenta,
    Yellow,
}

/// Toner level of one marker supply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TonerReading {
    pub color: TonerColor,
    /// Percentage, always within 0..=100.
    pub level: u8,
    pub raw_value: i64,
}

impl TonerReading {
    /// Build a reading, clamping the raw level into 0..=100.
    pub fn from_raw(color: TonerColor, raw_value: i64) -> Self {
        Self {
            color,
            level: raw_value.clamp(0, 100) as u8,
            raw_value,
        }
    }

    /// Placeholder used when the device was never queried.
    pub fn unqueried() -> Self {
        Self::from_raw(TonerColor::Black, 0)
    }

    /// Placeholder used when a live device returned no toner data.
    pub fn assumed_full() -> Self {
        Self::from_raw(TonerColor::Black, 100)
    }
}

/// Paper input tray condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrayState {
    Ok,
    Low,
    Empty,
    Open,
    Jammed,
    Unknown,
}

impl TrayState {
    pub fn from_raw(value: i64) -> Self {
        match value {
            1 => Self::Ok,
            2 => Self::Low,
            3 => Self::Empty,
            4 => Self::Open,
            5 => Self::Jammed,
            _ => Self::Unknown,
        }
    }
}

/// State of one paper input tray.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrayReading {
    pub label: String,
    pub state: TrayState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_value: Option<i64>,
}

impl TrayReading {
    pub fn from_raw(index: u32, raw_value: i64) -> Self {
        Self {
            label: format!("Tray {index}"),
            state: TrayState::from_raw(raw_value),
            raw_value: Some(raw_value),
        }
    }

    fn first_tray(state: TrayState) -> Self {
        Self {
            label: "Tray 1".into(),
            state,
            raw_value: None,
        }
    }

    /// Placeholder used when the device was never queried.
    pub fn unqueried() -> Self {
        Self::first_tray(TrayState::Unknown)
    }

    /// Placeholder used when a live device returned no tray data.
    pub fn assumed_ok() -> Self {
        Self::first_tray(TrayState::Ok)
    }
}

/// Overall printer state (Host-Resources-MIB hrPrinterStatus).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeviceState {
    Other,
    #[default]
    Unknown,
    Idle,
    Printing,
    Warmup,
}

impl DeviceState {
    pub fn from_raw(value: i64) -> Self {
        match value {
            1 => Self::Other,
            3 => Self::Idle,
            4 => Self::Printing,
            5 => Self::Warmup,
            _ => Self::Unknown,
        }
    }
}

/// Whether the printer answered at all during the poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PollStatus {
    Online,
    Offline,
}

/// How the data in a [`DeviceHealth`] was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PollMethod {
    /// Port probe and SNMP query both succeeded.
    FullProtocol,
    /// SNMP failed; only the port probe result is real.
    ConnectivityOnly,
    /// No candidate port answered; nothing was queried.
    Unreachable,
}

/// Snapshot of one printer's health, produced fresh by every poll.
///
/// Toner and tray lists are never empty: when no real reading exists a
/// placeholder is substituted so consumers never branch on absence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceHealth {
    pub name: String,
    pub address: IpAddr,
    pub location: String,
    pub status: PollStatus,
    pub reachable: bool,
    pub reachable_port: Option<u16>,
    pub toners: Vec<TonerReading>,
    pub trays: Vec<TrayReading>,
    pub device_state: DeviceState,
    pub page_count: Option<u64>,
    /// Wall-clock time from poll start to this record, in milliseconds.
    pub response_time_ms: u64,
    pub timestamp: DateTime<Utc>,
    pub method: PollMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Plain-English advice accompanying `error`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl DeviceHealth {
    pub fn is_online(&self) -> bool {
        self.status == PollStatus::Online
    }
}
