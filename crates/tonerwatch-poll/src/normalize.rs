// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Response normalization: raw SNMP values into typed readings.
//
// Identifiers are sorted into a closed set of families. The configured
// identifier table is matched exactly first; toner and tray identifiers not in
// the table are then recognised by their Printer-MIB column prefix followed by
// a single index arc. Anything else is ignored, as are absent and non-numeric
// values.

use tonerwatch_core::config::MetricOids;
use tonerwatch_core::types::{
    DeviceState, RawMetric, TonerColor, TonerReading, TrayReading,
};

/// prtMarkerSuppliesLevel, first marker device (RFC 3805).
pub const TONER_LEVEL_PREFIX: &str = "1.3.6.1.2.1.43.11.1.1.9.1.";

/// prtInputStatus, first input device (RFC 3805).
pub const TRAY_STATUS_PREFIX: &str = "1.3.6.1.2.1.43.8.2.1.12.1.";

/// Toner colours by 1-based marker supply index.
const TONER_COLORS: [TonerColor; 4] = [
    TonerColor::Black,
    TonerColor::Cyan,
    TonerColor::Magenta,
    TonerColor::Yellow,
];

/// What a metric identifier refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricFamily {
    /// Marker supply level, with its 1-based supply index.
    TonerLevel(u32),
    /// Input tray status, with its 1-based tray index.
    TrayStatus(u32),
    DeviceState,
    PageCount,
    Unrecognized,
}

/// Readings extracted from one query response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizedMetrics {
    pub toners: Vec<TonerReading>,
    pub trays: Vec<TrayReading>,
    pub device_state: DeviceState,
    pub page_count: Option<u64>,
}

/// Sort an identifier into its family.
pub fn classify(identifier: &str, oids: &MetricOids) -> MetricFamily {
    let configured = [
        (&oids.device_state, MetricFamily::DeviceState),
        (&oids.page_count, MetricFamily::PageCount),
        (&oids.toner_black, MetricFamily::TonerLevel(1)),
        (&oids.toner_cyan, MetricFamily::TonerLevel(2)),
        (&oids.toner_magenta, MetricFamily::TonerLevel(3)),
        (&oids.toner_yellow, MetricFamily::TonerLevel(4)),
        (&oids.tray_1, MetricFamily::TrayStatus(1)),
        (&oids.tray_2, MetricFamily::TrayStatus(2)),
    ];
    if let Some((_, family)) = configured.iter().find(|(id, _)| id.as_str() == identifier) {
        return *family;
    }
    if let Some(index) = column_index(identifier, TONER_LEVEL_PREFIX) {
        return MetricFamily::TonerLevel(index);
    }
    if let Some(index) = column_index(identifier, TRAY_STATUS_PREFIX) {
        return MetricFamily::TrayStatus(index);
    }
    MetricFamily::Unrecognized
}

/// The index arc after `prefix`, if `identifier` is exactly `prefix` + digits.
fn column_index(identifier: &str, prefix: &str) -> Option<u32> {
    let suffix = identifier.strip_prefix(prefix)?;
    if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    suffix.parse().ok()
}

fn toner_color(index: u32) -> Option<TonerColor> {
    let slot = usize::try_from(index.checked_sub(1)?).ok()?;
    TONER_COLORS.get(slot).copied()
}

/// Turn raw metrics into typed readings. Input order does not matter.
pub fn normalize(metrics: &[RawMetric], oids: &MetricOids) -> NormalizedMetrics {
    let mut out = NormalizedMetrics::default();

    for metric in metrics {
        let Some(value) = metric.value.as_ref().and_then(|v| v.as_integer()) else {
            continue;
        };

        match classify(&metric.identifier, oids) {
            MetricFamily::TonerLevel(index) => {
                if let Some(color) = toner_color(index) {
                    out.toners.push(TonerReading::from_raw(color, value));
                }
            }
            MetricFamily::TrayStatus(index) => {
                out.trays.push(TrayReading::from_raw(index, value));
            }
            MetricFamily::DeviceState => {
                out.device_state = DeviceState::from_raw(value);
            }
            MetricFamily::PageCount => {
                out.page_count = u64::try_from(value).ok();
            }
            MetricFamily::Unrecognized => {}
        }
    }

    out
}
