// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Source domain review

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::parse_directives;

lazy_static! {
    /// Free TLDs and URL shorteners, matched against the bare host
    static ref SUSPICIOUS_HOSTS: Vec<Regex> = [
        r"\.tk$",
        r"\.ml$",
        r"\.ga$",
        r"\.cf$",
        r"(^|\.)bit\.ly$",
        r"tinyurl",
        r"(^|\.)goo\.gl$",
        r"(^|\.)t\.co$",
        r"(^|\.)short\.link$",
        r"(^|\.)is\.gd$",
        r"(^|\.)v\.gd$",
        r"(^|\.)ow\.ly$",
        r"(^|\.)buff\.ly$",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("valid host pattern"))
    .collect();
    static ref IP_LITERAL: Regex =
        Regex::new(r"^\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3}$").expect("valid IP pattern");
}

/// Source expressions that never name a host
const KEYWORD_SOURCES: [&str; 5] = ["*", "data:", "blob:", "mediastream:", "filesystem:"];

/// Result of a domain review
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainAnalysis {
    /// Host sources found, in policy order, without duplicates
    pub domains: Vec<String>,
    pub suspicious_domains: Vec<String>,
    pub recommendations: Vec<String>,
    pub is_secure: bool,
}

/// Reviews the host sources a policy allows
#[derive(Debug, Clone, Default)]
pub struct DomainAnalyzer {
    allowed: Vec<String>,
}

impl DomainAnalyzer {
    /// Analyzer using the built-in suspicious host patterns
    pub fn new() -> Self {
        Self::default()
    }

    /// Analyzer flagging every host outside `allowed`
    pub fn with_allowed<I, S>(allowed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed: allowed.into_iter().map(Into::into).collect(),
        }
    }

    /// Analyze a policy string
    pub fn analyze(&self, policy: &str) -> DomainAnalysis {
        if policy.trim().is_empty() {
            return DomainAnalysis {
                recommendations: vec!["No CSP policy found for domain analysis".to_string()],
                is_secure: true,
                ..Default::default()
            };
        }

        let domains = extract_domains(policy);
        let suspicious_domains: Vec<String> = domains
            .iter()
            .filter(|d| self.is_suspicious(d))
            .cloned()
            .collect();
        let recommendations = recommendations(&domains);

        DomainAnalysis {
            is_secure: suspicious_domains.is_empty(),
            domains,
            suspicious_domains,
            recommendations,
        }
    }

    fn is_suspicious(&self, domain: &str) -> bool {
        if !self.allowed.is_empty() {
            return !self
                .allowed
                .iter()
                .any(|allowed| domain.contains(allowed.as_str()) || allowed.contains(domain));
        }

        let host = host_of(domain);
        SUSPICIOUS_HOSTS.iter().any(|re| re.is_match(&host))
    }
}

/// Host sources of a policy (anything with a dot or an http scheme)
pub fn extract_domains(policy: &str) -> Vec<String> {
    let mut domains: Vec<String> = Vec::new();

    for (_, sources) in parse_directives(policy) {
        for source in sources {
            if source.starts_with('\'') || KEYWORD_SOURCES.contains(&source.as_str()) {
                continue;
            }
            if !(source.contains('.') || source.starts_with("http")) {
                continue;
            }
            if !domains.contains(&source) {
                domains.push(source);
            }
        }
    }

    domains
}

/// Lowercased host of a source expression, without scheme, port, path or `*.`
fn host_of(source: &str) -> String {
    let rest = source.split_once("://").map(|(_, r)| r).unwrap_or(source);
    let host = rest.split(['/', '?', '#']).next().unwrap_or(rest);
    let host = host.rsplit_once(':').map(|(h, _)| h).unwrap_or(host);
    host.trim_start_matches("*.").to_lowercase()
}

fn recommendations(domains: &[String]) -> Vec<String> {
    if domains.is_empty() {
        return vec!["No domains found in CSP policy".to_string()];
    }

    let mut recommendations = Vec::new();
    let list = |pred: &dyn Fn(&str) -> bool| -> Vec<&str> {
        domains.iter().map(String::as_str).filter(|d| pred(d)).collect()
    };

    let wildcards = list(&|d| d.contains('*'));
    if !wildcards.is_empty() {
        recommendations.push(format!(
            "Consider restricting wildcard domains: {}",
            wildcards.join(", ")
        ));
    }

    let plain_http = list(&|d| d.starts_with("http://"));
    if !plain_http.is_empty() {
        recommendations.push(format!("Consider using HTTPS for: {}", plain_http.join(", ")));
    }

    let ips = list(&|d| IP_LITERAL.is_match(&host_of(d)));
    if !ips.is_empty() {
        recommendations.push(format!(
            "Consider using domain names instead of IP addresses: {}",
            ips.join(", ")
        ));
    }

    let local = list(&|d| d.contains("localhost") || d.contains("127.0.0.1"));
    if !local.is_empty() {
        recommendations.push(format!(
            "Remove localhost domains from production CSP: {}",
            local.join(", ")
        ));
    }

    recommendations
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_domains() {
        let policy = "default-src 'self'; script-src 'self' cdn.example.com https://api.example.com data: *; img-src cdn.example.com";
        assert_eq!(
            extract_domains(policy),
            vec!["cdn.example.com", "https://api.example.com"]
        );
    }

    #[test]
    fn test_suspicious_patterns() {
        let policy = "script-src https://bit.ly/x free.tk cdn.example.com https://microsoft.com";
        let analysis = DomainAnalyzer::new().analyze(policy);

        assert_eq!(analysis.suspicious_domains, vec!["https://bit.ly/x", "free.tk"]);
        assert!(!analysis.is_secure);
    }

    #[test]
    fn test_allow_list() {
        let analyzer = DomainAnalyzer::with_allowed(["example.com"]);
        let analysis = analyzer.analyze("script-src cdn.example.com other.net");
        assert_eq!(analysis.suspicious_domains, vec!["other.net"]);
    }

    #[test]
    fn test_recommendations() {
        let policy = "script-src *.example.com http://legacy.example.org 10.0.0.5 localhost:8080 http://127.0.0.1:3000";
        let analysis = DomainAnalyzer::new().analyze(policy);

        assert!(analysis.is_secure);
        let recs = analysis.recommendations.join("\n");
        assert!(recs.contains("wildcard domains: *.example.com"));
        assert!(recs.contains("HTTPS for: http://legacy.example.org, http://127.0.0.1:3000"));
        assert!(recs.contains("IP addresses: 10.0.0.5, http://127.0.0.1:3000"));
        assert!(recs.contains("localhost domains"));
    }

    #[test]
    fn test_empty_policy() {
        let analysis = DomainAnalyzer::new().analyze("");
        assert!(analysis.is_secure);
        assert_eq!(
            analysis.recommendations,
            vec!["No CSP policy found for domain analysis"]
        );
    }

    #[test]
    fn test_host_of() {
        assert_eq!(host_of("https://CDN.Example.com:443/lib/"), "cdn.example.com");
        assert_eq!(host_of("*.example.com"), "example.com");
        assert_eq!(host_of("t.co"), "t.co");
    }
}
