// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Violation events, normalized reports and the bounded report queue

mod builder;
mod event;
mod queue;

pub use builder::{
    build_report, format_timestamp, Report, ReportBuilder, RiskLevel, ViolationPayload,
    SCRIPT_SAMPLE_LIMIT,
};
pub use event::{load_events, parse_events, ViolationEvent};
pub use queue::{EnqueueOutcome, QueuedReport, ReportId, ReportQueue, DEFAULT_MAX_QUEUE_SIZE};
