// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Monitor metrics
//!
//! Counters for capture, delivery and queue churn, plus delivery latency
//! percentiles over a bounded window.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

/// Latency samples kept for percentile calculation
const LATENCY_WINDOW: usize = 10_000;

/// Monitor metrics collector
#[derive(Debug)]
pub struct MonitorMetrics {
    violations_captured: AtomicU64,
    violations_rejected: AtomicU64,
    reports_delivered: AtomicU64,
    delivery_failures: AtomicU64,
    reports_evicted: AtomicU64,
    reports_cleared: AtomicU64,
    drains_started: AtomicU64,
    retry_passes: AtomicU64,
    start_time: Instant,
    delivery_latencies: RwLock<Vec<u64>>,
}

/// Metrics report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsReport {
    pub uptime_secs: u64,
    pub violations_captured: u64,
    /// Violations refused because the monitor was destroyed
    pub violations_rejected: u64,
    pub reports_delivered: u64,
    pub delivery_failures: u64,
    pub reports_evicted: u64,
    pub reports_cleared: u64,
    pub drains_started: u64,
    pub retry_passes: u64,
    pub latency_p50_ms: u64,
    pub latency_p95_ms: u64,
    pub latency_p99_ms: u64,
}

impl Default for MonitorMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl MonitorMetrics {
    /// Create new metrics collector
    pub fn new() -> Self {
        Self {
            violations_captured: AtomicU64::new(0),
            violations_rejected: AtomicU64::new(0),
            reports_delivered: AtomicU64::new(0),
            delivery_failures: AtomicU64::new(0),
            reports_evicted: AtomicU64::new(0),
            reports_cleared: AtomicU64::new(0),
            drains_started: AtomicU64::new(0),
            retry_passes: AtomicU64::new(0),
            start_time: Instant::now(),
            delivery_latencies: RwLock::new(Vec::new()),
        }
    }

    pub fn record_capture(&self) {
        self.violations_captured.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejected(&self) {
        self.violations_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_eviction(&self) {
        self.reports_evicted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_cleared(&self, count: usize) {
        self.reports_cleared.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub fn record_drain(&self) {
        self.drains_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_pass(&self) {
        self.retry_passes.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one delivery attempt
    pub fn record_delivery(&self, latency_ms: u64, success: bool) {
        if success {
            self.reports_delivered.fetch_add(1, Ordering::Relaxed);
        } else {
            self.delivery_failures.fetch_add(1, Ordering::Relaxed);
        }

        let mut latencies = self.delivery_latencies.write();
        latencies.push(latency_ms);

        if latencies.len() > LATENCY_WINDOW {
            latencies.drain(0..LATENCY_WINDOW / 2);
        }
    }

    /// Build a report
    pub fn report(&self) -> MetricsReport {
        let mut latencies = self.delivery_latencies.read().clone();
        latencies.sort_unstable();

        MetricsReport {
            uptime_secs: self.start_time.elapsed().as_secs(),
            violations_captured: self.violations_captured.load(Ordering::Relaxed),
            violations_rejected: self.violations_rejected.load(Ordering::Relaxed),
            reports_delivered: self.reports_delivered.load(Ordering::Relaxed),
            delivery_failures: self.delivery_failures.load(Ordering::Relaxed),
            reports_evicted: self.reports_evicted.load(Ordering::Relaxed),
            reports_cleared: self.reports_cleared.load(Ordering::Relaxed),
            drains_started: self.drains_started.load(Ordering::Relaxed),
            retry_passes: self.retry_passes.load(Ordering::Relaxed),
            latency_p50_ms: percentile(&latencies, 50),
            latency_p95_ms: percentile(&latencies, 95),
            latency_p99_ms: percentile(&latencies, 99),
        }
    }
}

fn percentile(sorted: &[u64], pct: usize) -> u64 {
    if sorted.is_empty() {
        return 0;
    }
    let idx = (sorted.len() * pct / 100).min(sorted.len() - 1);
    sorted[idx]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let metrics = MonitorMetrics::new();
        metrics.record_capture();
        metrics.record_capture();
        metrics.record_eviction();
        metrics.record_cleared(4);
        metrics.record_delivery(12, true);
        metrics.record_delivery(30, false);

        let report = metrics.report();
        assert_eq!(report.violations_captured, 2);
        assert_eq!(report.reports_evicted, 1);
        assert_eq!(report.reports_cleared, 4);
        assert_eq!(report.reports_delivered, 1);
        assert_eq!(report.delivery_failures, 1);
    }

    #[test]
    fn test_percentiles() {
        let metrics = MonitorMetrics::new();
        for ms in 1..=100 {
            metrics.record_delivery(ms, true);
        }

        let report = metrics.report();
        assert_eq!(report.latency_p50_ms, 51);
        assert_eq!(report.latency_p99_ms, 100);
    }

    #[test]
    fn test_empty_percentiles() {
        assert_eq!(MonitorMetrics::new().report().latency_p95_ms, 0);
    }
}
