// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Inbound violation events
//!
//! Mirrors the fields a browser surfaces on a `securitypolicyviolation`
//! event. Every field is optional: hosts differ in what they populate.

use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

/// Raw policy violation as reported by the host environment
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViolationEvent {
    /// URI of the resource that was blocked
    #[serde(rename = "blockedURI", default, skip_serializing_if = "Option::is_none")]
    pub blocked_uri: Option<String>,
    /// URI of the document in which the violation occurred
    #[serde(rename = "documentURI", default, skip_serializing_if = "Option::is_none")]
    pub document_uri: Option<String>,
    /// Directive whose enforcement caused the violation
    #[serde(rename = "effectiveDirective", default, skip_serializing_if = "Option::is_none")]
    pub effective_directive: Option<String>,
    /// Full policy text
    #[serde(rename = "originalPolicy", default, skip_serializing_if = "Option::is_none")]
    pub original_policy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referrer: Option<String>,
    /// Inline script sample
    #[serde(rename = "sample", default, skip_serializing_if = "Option::is_none")]
    pub sample: Option<String>,
    /// HTTP status code of the document; out-of-range values saturate
    #[serde(
        rename = "statusCode",
        default,
        deserialize_with = "lenient_status_code",
        skip_serializing_if = "Option::is_none"
    )]
    pub status_code: Option<u16>,
    /// Directive that was violated
    #[serde(rename = "violatedDirective", default, skip_serializing_if = "Option::is_none")]
    pub violated_directive: Option<String>,
    #[serde(rename = "lineNumber", default, skip_serializing_if = "Option::is_none")]
    pub line_number: Option<u32>,
    #[serde(rename = "columnNumber", default, skip_serializing_if = "Option::is_none")]
    pub column_number: Option<u32>,
    #[serde(rename = "sourceFile", default, skip_serializing_if = "Option::is_none")]
    pub source_file: Option<String>,
}

impl ViolationEvent {
    /// Create an empty event
    pub fn new() -> Self {
        Self::default()
    }

    /// Set blocked URI
    pub fn blocked_uri(mut self, uri: impl Into<String>) -> Self {
        self.blocked_uri = Some(uri.into());
        self
    }

    /// Set document URI
    pub fn document_uri(mut self, uri: impl Into<String>) -> Self {
        self.document_uri = Some(uri.into());
        self
    }

    /// Set both violated and effective directive
    pub fn directive(mut self, directive: impl Into<String>) -> Self {
        let directive = directive.into();
        self.effective_directive = Some(directive.clone());
        self.violated_directive = Some(directive);
        self
    }

    /// Set original policy text
    pub fn original_policy(mut self, policy: impl Into<String>) -> Self {
        self.original_policy = Some(policy.into());
        self
    }

    /// Set referrer
    pub fn referrer(mut self, referrer: impl Into<String>) -> Self {
        self.referrer = Some(referrer.into());
        self
    }

    /// Set inline script sample
    pub fn sample(mut self, sample: impl Into<String>) -> Self {
        self.sample = Some(sample.into());
        self
    }

    /// Set status code
    pub fn status_code(mut self, code: u16) -> Self {
        self.status_code = Some(code);
        self
    }

    /// Set source location
    pub fn location(mut self, source_file: impl Into<String>, line: u32, column: u32) -> Self {
        self.source_file = Some(source_file.into());
        self.line_number = Some(line);
        self.column_number = Some(column);
        self
    }
}

/// Accept any numeric or numeric-string status, clamped to `0..=65535`.
/// Negative or non-numeric values are dropped rather than failing the event.
fn lenient_status_code<'de, D>(deserializer: D) -> std::result::Result<Option<u16>, D::Error>
where
    D: Deserializer<'de>,
{
    let clamp = |code: u64| code.min(u64::from(u16::MAX)) as u16;

    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .map(clamp),
        Some(Value::String(s)) => s.trim().parse::<u64>().ok().map(clamp),
        _ => None,
    })
}

/// Parse violation events from a JSON array or from JSON lines
pub fn parse_events(input: &str) -> Result<Vec<ViolationEvent>> {
    let trimmed = input.trim_start();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    if trimmed.starts_with('[') {
        return Ok(serde_json::from_str(trimmed)?);
    }

    let mut events = Vec::new();
    for (index, line) in input.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let event = serde_json::from_str(line)
            .map_err(|e| Error::other(format!("line {}: {}", index + 1, e)))?;
        events.push(event);
    }
    Ok(events)
}

/// Load violation events from a file
pub fn load_events(path: impl AsRef<Path>) -> Result<Vec<ViolationEvent>> {
    let contents = std::fs::read_to_string(path)?;
    parse_events(&contents)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_deserialize_browser_shape() {
        let json = r#"{
            "blockedURI": "https://evil.example/x.js",
            "documentURI": "https://app.example/",
            "effectiveDirective": "script-src-elem",
            "violatedDirective": "script-src",
            "statusCode": 200,
            "lineNumber": 12
        }"#;
        let event: ViolationEvent = serde_json::from_str(json).unwrap();

        assert_eq!(event.blocked_uri.as_deref(), Some("https://evil.example/x.js"));
        assert_eq!(event.effective_directive.as_deref(), Some("script-src-elem"));
        assert_eq!(event.status_code, Some(200));
        assert_eq!(event.line_number, Some(12));
        assert!(event.sample.is_none());
    }

    #[test]
    fn test_status_code_saturates() {
        let input = r#"[
            {"statusCode": 70000},
            {"statusCode": "404"},
            {"statusCode": -1},
            {"statusCode": null},
            {"statusCode": 200.0}
        ]"#;
        let events = parse_events(input).unwrap();

        let codes: Vec<Option<u16>> = events.iter().map(|e| e.status_code).collect();
        assert_eq!(codes, vec![Some(u16::MAX), Some(404), None, None, Some(200)]);
    }

    #[test]
    fn test_parse_json_lines() {
        let input = "{\"violatedDirective\":\"img-src\"}\n\n{\"violatedDirective\":\"style-src\"}\n";
        let events = parse_events(input).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1].violated_directive.as_deref(), Some("style-src"));
    }

    #[test]
    fn test_parse_reports_bad_line() {
        let err = parse_events("{}\nnot json\n").unwrap_err();
        assert!(err.to_string().starts_with("line 2:"));
    }

    #[test]
    fn test_load_events_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"[{{"violatedDirective":"script-src"}}, {{}}]"#).unwrap();

        let events = load_events(file.path()).unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[1], ViolationEvent::default());
    }
}
