// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for response normalization and snapshot serialization
// in the tonerwatch-poll crate.

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use tonerwatch_core::config::MetricOids;
use tonerwatch_core::types::{
    DeviceCapability, PollMethod, PollStatus, RawMetric, RawValue, TonerColor, TonerReading,
};
use tonerwatch_poll::normalize::{classify, normalize};

// ---------------------------------------------------------------------------
// Helper: a full color printer response
// ---------------------------------------------------------------------------

/// The eight metrics a color printer answers with, plus one identifier the
/// normalizer has to skip.
fn color_response(oids: &MetricOids) -> Vec<RawMetric> {
    let mut metrics: Vec<RawMetric> = oids
        .for_capability(DeviceCapability::Color)
        .into_iter()
        .enumerate()
        .map(|(i, id)| RawMetric::integer(id, 10 * i as i64 + 3))
        .collect();
    metrics.push(RawMetric::new(
        "1.3.6.1.2.1.1.5.0",
        Some(RawValue::Text("lab-printer".into())),
    ));
    metrics
}

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

/// Benchmark identifier classification across every family.
fn bench_classify(c: &mut Criterion) {
    let oids = MetricOids::default();
    let ids = oids.for_capability(DeviceCapability::Color);

    c.bench_function("classify (8 identifiers)", |b| {
        b.iter(|| {
            for id in &ids {
                black_box(classify(black_box(id), &oids));
            }
        });
    });
}

/// Benchmark normalizing a complete color printer response.
fn bench_normalize(c: &mut Criterion) {
    let oids = MetricOids::default();
    let metrics = color_response(&oids);

    c.bench_function("normalize (color response)", |b| {
        b.iter(|| {
            let out = normalize(black_box(&metrics), &oids);
            assert_eq!(out.toners.len(), 4);
            black_box(out);
        });
    });
}

/// Benchmark serializing a fleet's worth of toner readings to JSON, the
/// dominant cost of the status endpoints.
fn bench_serialize_readings(c: &mut Criterion) {
    let readings: Vec<TonerReading> = (0..200)
        .map(|i| TonerReading::from_raw(TonerColor::Black, i % 120))
        .collect();

    c.bench_function("serialize toner readings (200)", |b| {
        b.iter(|| {
            let json = serde_json::to_string(black_box(&readings)).unwrap();
            black_box(json);
        });
    });

    c.bench_function("serialize status enums", |b| {
        b.iter(|| {
            black_box(serde_json::to_string(black_box(&PollStatus::Online)).unwrap());
            black_box(serde_json::to_string(black_box(&PollMethod::FullProtocol)).unwrap());
        });
    });
}

criterion_group!(
    benches,
    bench_classify,
    bench_normalize,
    bench_serialize_readings,
);
criterion_main!(benches);
