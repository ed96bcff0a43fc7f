// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Tonerwatch Poll: reachability probing, SNMP metric queries, response
// normalization and the per-printer health check that sequences them.  The
// fleet module fans the health check out across the whole roster.

pub mod fleet;
pub mod health;
pub mod normalize;
pub mod probe;
pub mod retry;
pub mod snmp_client;

pub use fleet::{Fleet, FleetReport};
pub use health::HealthChecker;
pub use snmp_client::{MetricQueryClient, MetricTransport, SnmpTransport};
