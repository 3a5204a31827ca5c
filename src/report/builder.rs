// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Report normalization
//!
//! Turns a [`ViolationEvent`] into the immutable [`Report`] envelope that is
//! queued and POSTed to the collector. The JSON field names are a wire
//! contract with existing collectors and must not change.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::event::ViolationEvent;

/// Maximum number of characters kept from an inline script sample
pub const SCRIPT_SAMPLE_LIMIT: usize = 40;

/// Violation payload with the hyphenated keys collectors expect
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViolationPayload {
    #[serde(rename = "blocked-uri")]
    pub blocked_uri: String,
    #[serde(rename = "document-uri")]
    pub document_uri: String,
    #[serde(rename = "effective-directive")]
    pub effective_directive: String,
    #[serde(rename = "original-policy")]
    pub original_policy: String,
    pub referrer: String,
    #[serde(rename = "script-sample")]
    pub script_sample: String,
    #[serde(rename = "status-code")]
    pub status_code: u16,
    #[serde(rename = "violated-directive")]
    pub violated_directive: String,
}

/// Risk classification of a violation or of a queue
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl ViolationPayload {
    /// Whether the violated directive guards script execution or document base
    pub fn is_high_risk(&self) -> bool {
        ["script-src", "object-src", "base-uri"]
            .iter()
            .any(|d| self.violated_directive.contains(d))
    }

    /// Risk level derived from the violated directive
    pub fn risk_level(&self) -> RiskLevel {
        if self.is_high_risk() {
            RiskLevel::High
        } else if self.violated_directive.contains("style-src")
            || self.violated_directive.contains("img-src")
        {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    /// One-line human summary
    pub fn summary(&self) -> String {
        format!(
            "Violation: {} - Blocked: {}",
            self.violated_directive, self.blocked_uri
        )
    }
}

/// Normalized violation report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    /// Capture time, ISO-8601 with millisecond precision
    pub timestamp: String,
    /// Client identity (user agent)
    pub user_agent: String,
    /// Page URL at capture time
    pub url: String,
    pub violation: ViolationPayload,
    /// Positional metadata (line, column, source file)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_info: Option<Map<String, Value>>,
}

impl Report {
    /// Serialize to the collector wire format
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Risk level of the carried violation
    pub fn risk_level(&self) -> RiskLevel {
        self.violation.risk_level()
    }
}

/// Format a timestamp the way `Date.prototype.toISOString` does
pub fn format_timestamp(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Build a report from a violation event.
///
/// Pure and total: absent fields become empty strings or zero.
pub fn build_report(
    event: &ViolationEvent,
    now: DateTime<Utc>,
    client_id: &str,
    context_url: &str,
) -> Report {
    let text = |field: &Option<String>| field.clone().unwrap_or_default();

    let violation = ViolationPayload {
        blocked_uri: text(&event.blocked_uri),
        document_uri: text(&event.document_uri),
        effective_directive: text(&event.effective_directive),
        original_policy: text(&event.original_policy),
        referrer: text(&event.referrer),
        script_sample: event
            .sample
            .as_deref()
            .map(|s| s.chars().take(SCRIPT_SAMPLE_LIMIT).collect())
            .unwrap_or_default(),
        status_code: event.status_code.unwrap_or(0),
        violated_directive: text(&event.violated_directive),
    };

    let mut info = Map::new();
    if let Some(line) = event.line_number {
        info.insert("lineNumber".to_string(), Value::from(line));
    }
    if let Some(column) = event.column_number {
        info.insert("columnNumber".to_string(), Value::from(column));
    }
    if let Some(ref file) = event.source_file {
        info.insert("sourceFile".to_string(), Value::from(file.clone()));
    }

    Report {
        timestamp: format_timestamp(now),
        user_agent: client_id.to_string(),
        url: context_url.to_string(),
        violation,
        additional_info: Some(info),
    }
}

/// Report builder bound to a client identity and page URL
#[derive(Debug, Clone)]
pub struct ReportBuilder {
    client_id: String,
    context_url: String,
}

impl ReportBuilder {
    /// Create a new builder
    pub fn new(client_id: impl Into<String>, context_url: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            context_url: context_url.into(),
        }
    }

    /// Build a report stamped with the given time
    pub fn build_at(&self, event: &ViolationEvent, now: DateTime<Utc>) -> Report {
        build_report(event, now, &self.client_id, &self.context_url)
    }

    /// Build a report stamped with the current time
    pub fn build(&self, event: &ViolationEvent) -> Report {
        self.build_at(event, Utc::now())
    }

    /// Client identity
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Context URL
    pub fn context_url(&self) -> &str {
        &self.context_url
    }
}
