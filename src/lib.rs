// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! # csp-sentinel - CSP Violation Monitor
//!
//! Captures Content Security Policy violations, normalizes them into
//! reports, keeps them in a bounded queue and delivers them to a collector
//! endpoint with multi-pass exponential backoff.
//!
//! ## Features
//!
//! - Bounded FIFO queue: oldest report is evicted at capacity
//! - Enable/disable gating: reports are queued regardless, sent only when enabled
//! - Retry drains: `2^pass` backoff between passes, successes retired
//! - Pluggable delivery: [`DeliveryClient`] trait, reqwest-backed default
//! - Policy analysis: required directives, unsafe sources, suspicious domains
//!
//! ## Example
//!
//! ```rust,no_run
//! use csp_sentinel::{MonitorConfig, MonitorController, ViolationEvent};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let monitor = MonitorController::new(
//!         MonitorConfig::new()
//!             .endpoint("https://collector.example.com/csp")
//!             .page_url("https://app.example.com/"),
//!     )?;
//!
//!     let event = ViolationEvent::new()
//!         .blocked_uri("https://evil.example/x.js")
//!         .directive("script-src");
//!     monitor.on_violation(event).await?;
//!
//!     // Enabling flushes the queue once; await it before retrying leftovers
//!     if let Some(flush) = monitor.enable() {
//!         flush.await?;
//!     }
//!     let outcome = monitor.send_queued().await;
//!     println!("{} reports still queued", outcome.failed);
//!
//!     Ok(())
//! }
//! ```

pub mod delivery;
pub mod error;
pub mod monitor;
pub mod policy;
pub mod report;

// Re-exports for convenience

// Errors
pub use error::{Error, ErrorContext, Result};

// Reports and queue
pub use report::{
    build_report, load_events, parse_events, Report, ReportBuilder, ReportId, ReportQueue,
    RiskLevel, ViolationEvent, ViolationPayload,
};

// Delivery
pub use delivery::{
    Delivered, DeliveryClient, DeliveryConfig, DeliveryFailure, DeliveryResult, Endpoint,
    HttpDeliveryClient,
};

// Monitor
pub use monitor::{
    CaptureOutcome, ClearOutcome, DrainOutcome, MetricsReport, MonitorBuilder, MonitorConfig,
    MonitorController, MonitorStatus, RetryCoordinator, ViolationAnalysis, ViolationSender,
};

// Policy analysis
pub use policy::{DirectiveAnalysis, DirectiveAnalyzer, DomainAnalysis, DomainAnalyzer};

/// csp-sentinel version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
