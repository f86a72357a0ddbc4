// Copyright 2026 The async-siril developers
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Benchmarks for the event line parser.
//!
//! Run with: `cargo bench --bench event`

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::hint::black_box;

use async_siril::event::SirilEvent;

fn bench_parse(c: &mut Criterion) {
    let mut group = c.benchmark_group("event_parse");

    let lines = [
        ("ready", "ready"),
        ("status", "status: success stacking done"),
        ("progress", "progress: 42"),
        ("log", "log: loading frame light_00042.fits"),
        ("implicit_log", "cannot open file /data/missing.fits"),
    ];

    for (name, line) in lines {
        group.throughput(Throughput::Bytes(line.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(name), line, |b, line| {
            b.iter(|| black_box(SirilEvent::parse(black_box(line))));
        });
    }

    group.finish();
}

fn bench_predicates(c: &mut Criterion) {
    let mut group = c.benchmark_group("event_predicates");

    let event = SirilEvent::parse("status: success stacking done");
    group.bench_function("completed", |b| {
        b.iter(|| black_box(event.completed()));
    });
    group.bench_function("errored", |b| {
        b.iter(|| black_box(event.errored()));
    });

    group.finish();
}

criterion_group!(benches, bench_parse, bench_predicates);
criterion_main!(benches);
