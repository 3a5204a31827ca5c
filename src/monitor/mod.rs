// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! CSP violation monitoring
//!
//! - [`MonitorController`]: enable/disable gating, capture, status
//! - [`RetryCoordinator`]: multi-pass queue draining with backoff
//! - [`ViolationSender`]: channel subscription for inbound events

mod config;
mod controller;
mod metrics;
mod retry;
mod status;
mod subscription;

pub use config::{DeliveredReportPolicy, MonitorConfig};
pub use controller::{MonitorBuilder, MonitorController};
pub use metrics::{MetricsReport, MonitorMetrics};
pub use retry::{backoff_delay, DrainOutcome, RetryCoordinator, Sleeper, TokioSleeper};
pub use status::{
    analyze_reports, queue_risk, CaptureOutcome, ClearOutcome, DirectiveCount, MonitorStatus,
    QueuePage, ViolationAnalysis,
};
pub use subscription::ViolationSender;
