// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Status and inspection views of a monitor

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::delivery::DeliveryResult;
use crate::report::{Report, ReportId, RiskLevel};

/// Reports kept in `recent_violations`
const RECENT_VIOLATIONS: usize = 10;

/// Directives listed in `top_violated_directives`
const TOP_DIRECTIVES: usize = 5;

/// Point-in-time monitor status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitorStatus {
    pub enabled: bool,
    pub endpoint: String,
    pub queued_reports: usize,
    pub max_queue_size: usize,
}

/// Result of capturing one violation
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureOutcome {
    /// Queue id of the new report
    pub id: ReportId,
    /// Report evicted to make room
    pub evicted: Option<ReportId>,
    /// Immediate delivery result; `None` while disabled
    pub delivery: Option<DeliveryResult>,
}

impl CaptureOutcome {
    pub fn was_delivered(&self) -> bool {
        matches!(self.delivery, Some(Ok(_)))
    }
}

/// Result of a guarded queue clear
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum ClearOutcome {
    /// Queue emptied; carries the number of reports discarded
    Cleared { count: usize },
    /// Queue was not empty and no confirmation was given; nothing changed
    ConfirmationRequired { queued: usize },
}

impl ClearOutcome {
    pub fn is_cleared(&self) -> bool {
        matches!(self, ClearOutcome::Cleared { .. })
    }
}

/// One page of queued reports
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueuePage {
    pub reports: Vec<Report>,
    pub total: usize,
    pub offset: usize,
    pub limit: usize,
}

/// Violation count for one directive
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectiveCount {
    pub directive: String,
    pub count: usize,
}

/// Aggregate view of queued violations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViolationAnalysis {
    pub total_violations: usize,
    pub recent_violations: Vec<Report>,
    pub top_violated_directives: Vec<DirectiveCount>,
    pub risk_level: RiskLevel,
}

/// Risk of a queue holding `queued` undelivered reports
pub fn queue_risk(queued: usize) -> RiskLevel {
    if queued > 50 {
        RiskLevel::High
    } else if queued > 10 {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

/// Summarize queued reports, head first.
///
/// Directives are ranked by count; ties keep first-seen order.
pub fn analyze_reports(reports: &[Arc<Report>], include_recent: bool) -> ViolationAnalysis {
    let mut order: Vec<&str> = Vec::new();
    let mut counts: HashMap<&str, usize> = HashMap::new();

    for report in reports {
        let directive = report.violation.violated_directive.as_str();
        let count = counts.entry(directive).or_insert(0);
        if *count == 0 {
            order.push(directive);
        }
        *count += 1;
    }

    let mut top: Vec<DirectiveCount> = order
        .into_iter()
        .map(|directive| DirectiveCount {
            directive: directive.to_string(),
            count: counts[directive],
        })
        .collect();
    top.sort_by(|a, b| b.count.cmp(&a.count));
    top.truncate(TOP_DIRECTIVES);

    let recent_violations = if include_recent {
        let skip = reports.len().saturating_sub(RECENT_VIOLATIONS);
        reports[skip..].iter().map(|r| (**r).clone()).collect()
    } else {
        Vec::new()
    };

    ViolationAnalysis {
        total_violations: reports.len(),
        recent_violations,
        top_violated_directives: top,
        risk_level: queue_risk(reports.len()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::ViolationPayload;

    fn report(directive: &str) -> Arc<Report> {
        Arc::new(Report {
            timestamp: String::new(),
            user_agent: String::new(),
            url: String::new(),
            violation: ViolationPayload {
                violated_directive: directive.to_string(),
                ..Default::default()
            },
            additional_info: None,
        })
    }

    #[test]
    fn test_top_directives_ranked() {
        let reports: Vec<_> = ["img-src", "script-src", "script-src", "style-src", "img-src", "script-src"]
            .iter()
            .map(|d| report(d))
            .collect();

        let analysis = analyze_reports(&reports, false);
        assert_eq!(analysis.total_violations, 6);
        assert_eq!(analysis.top_violated_directives[0].directive, "script-src");
        assert_eq!(analysis.top_violated_directives[0].count, 3);
        assert_eq!(analysis.top_violated_directives[1].directive, "img-src");
        assert_eq!(analysis.top_violated_directives[2].directive, "style-src");
        assert!(analysis.recent_violations.is_empty());
    }

    #[test]
    fn test_top_directives_truncated() {
        let reports: Vec<_> = (0..8).map(|i| report(&format!("d{}", i))).collect();
        let analysis = analyze_reports(&reports, false);
        assert_eq!(analysis.top_violated_directives.len(), 5);
        assert_eq!(analysis.top_violated_directives[0].directive, "d0");
    }

    #[test]
    fn test_recent_violations_are_tail() {
        let reports: Vec<_> = (0..15).map(|i| report(&format!("d{}", i))).collect();
        let analysis = analyze_reports(&reports, true);

        assert_eq!(analysis.recent_violations.len(), 10);
        assert_eq!(analysis.recent_violations[0].violation.violated_directive, "d5");
        assert_eq!(analysis.risk_level, RiskLevel::Medium);
    }

    #[test]
    fn test_queue_risk() {
        assert_eq!(queue_risk(0), RiskLevel::Low);
        assert_eq!(queue_risk(10), RiskLevel::Low);
        assert_eq!(queue_risk(11), RiskLevel::Medium);
        assert_eq!(queue_risk(51), RiskLevel::High);
    }

    #[test]
    fn test_clear_outcome_serializes_tagged() {
        let json = serde_json::to_value(ClearOutcome::ConfirmationRequired { queued: 3 }).unwrap();
        assert_eq!(json["outcome"], "confirmationRequired");
        assert_eq!(json["queued"], 3);
    }
}
