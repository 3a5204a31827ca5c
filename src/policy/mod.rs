// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Content Security Policy analysis
//!
//! - Directive compliance and recommendations
//! - Source domain review
//! - Policy extraction from headers and `<meta http-equiv>` tags

mod directives;
mod domains;

use std::collections::{HashMap, HashSet};

use lazy_static::lazy_static;
use regex::Regex;

pub use directives::{DirectiveAnalysis, DirectiveAnalyzer, DEFAULT_REQUIRED_DIRECTIVES};
pub use domains::{extract_domains, DomainAnalysis, DomainAnalyzer};

lazy_static! {
    static ref META_CSP: Regex = Regex::new(
        r#"(?i)<meta[^>]+http-equiv\s*=\s*["']Content-Security-Policy["'][^>]+content\s*=\s*"([^"]*)""#
    )
    .expect("valid meta CSP pattern");
    static ref META_CSP_SINGLE: Regex = Regex::new(
        r#"(?i)<meta[^>]+http-equiv\s*=\s*["']Content-Security-Policy["'][^>]+content\s*=\s*'([^']*)'"#
    )
    .expect("valid meta CSP pattern");
}

/// Where a policy was found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicySource {
    /// `Content-Security-Policy` header
    Header,
    /// `Content-Security-Policy-Report-Only` header (not enforced)
    ReportOnlyHeader,
    /// `<meta http-equiv>` tag
    Meta,
}

/// Split a policy into directive name → source list, in declaration order.
///
/// Names are lowercased. A repeated directive keeps its first occurrence,
/// as browsers do.
pub fn parse_directives(policy: &str) -> Vec<(String, Vec<String>)> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut directives = Vec::new();

    for directive in policy.split(';') {
        let mut parts = directive.split_whitespace();
        let name = match parts.next() {
            Some(name) => name.to_lowercase(),
            None => continue,
        };
        if !seen.insert(name.clone()) {
            continue;
        }
        directives.push((name, parts.map(str::to_string).collect()));
    }

    directives
}

/// Extract a policy from a `<meta http-equiv="Content-Security-Policy">` tag
pub fn extract_policy_from_html(html: &str) -> Option<String> {
    META_CSP
        .captures(html)
        .or_else(|| META_CSP_SINGLE.captures(html))
        .map(|c| c[1].to_string())
}

/// Find the policy in response headers (names matched case-insensitively)
pub fn policy_from_headers(headers: &HashMap<String, String>) -> Option<(String, PolicySource)> {
    let find = |wanted: &str| {
        headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(wanted))
            .map(|(_, value)| value.clone())
    };

    if let Some(policy) = find("content-security-policy") {
        return Some((policy, PolicySource::Header));
    }
    find("content-security-policy-report-only").map(|p| (p, PolicySource::ReportOnlyHeader))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_directives() {
        let parsed = parse_directives("default-src 'self'; Script-Src 'self' cdn.example.com;; script-src *");

        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0], ("default-src".to_string(), vec!["'self'".to_string()]));
        assert_eq!(parsed[1].0, "script-src");
        assert_eq!(parsed[1].1, vec!["'self'", "cdn.example.com"]);
    }

    #[test]
    fn test_extract_from_html() {
        let html = r#"<html><head><meta http-equiv="Content-Security-Policy" content="default-src 'self'"></head></html>"#;
        assert_eq!(extract_policy_from_html(html), Some("default-src 'self'".to_string()));

        let single = r#"<meta http-equiv='content-security-policy' content='img-src *'>"#;
        assert_eq!(extract_policy_from_html(single), Some("img-src *".to_string()));

        assert_eq!(extract_policy_from_html("<html></html>"), None);
    }

    #[test]
    fn test_policy_from_headers() {
        let mut headers = HashMap::new();
        headers.insert(
            "Content-Security-Policy-Report-Only".to_string(),
            "default-src 'none'".to_string(),
        );
        assert_eq!(
            policy_from_headers(&headers),
            Some(("default-src 'none'".to_string(), PolicySource::ReportOnlyHeader))
        );

        headers.insert("content-security-policy".to_string(), "script-src 'self'".to_string());
        assert_eq!(
            policy_from_headers(&headers),
            Some(("script-src 'self'".to_string(), PolicySource::Header))
        );
    }
}
