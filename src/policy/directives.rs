// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Directive compliance analysis

use serde::{Deserialize, Serialize};

use super::parse_directives;

/// Directives a compliant policy must declare unless overridden
pub const DEFAULT_REQUIRED_DIRECTIVES: [&str; 4] = ["default-src", "script-src", "style-src", "img-src"];

/// Result of a directive analysis
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectiveAnalysis {
    /// Policy as analyzed
    pub policy: String,
    /// Compliance problems
    pub violations: Vec<String>,
    /// Hardening suggestions
    pub recommendations: Vec<String>,
    pub is_compliant: bool,
}

/// Checks a policy for required directives and unsafe sources
#[derive(Debug, Clone)]
pub struct DirectiveAnalyzer {
    required: Vec<String>,
}

impl Default for DirectiveAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl DirectiveAnalyzer {
    /// Analyzer requiring [`DEFAULT_REQUIRED_DIRECTIVES`]
    pub fn new() -> Self {
        Self {
            required: DEFAULT_REQUIRED_DIRECTIVES.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Analyzer with a custom required set; an empty set keeps the defaults
    pub fn with_required<I, S>(required: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let required: Vec<String> = required.into_iter().map(Into::into).collect();
        if required.is_empty() {
            return Self::new();
        }
        Self { required }
    }

    /// Directives this analyzer requires
    pub fn required(&self) -> &[String] {
        &self.required
    }

    /// Analyze a policy string
    pub fn analyze(&self, policy: &str) -> DirectiveAnalysis {
        let policy = policy.trim();
        if policy.is_empty() {
            return DirectiveAnalysis {
                policy: String::new(),
                violations: vec!["No CSP policy found".to_string()],
                recommendations: vec!["Add a Content Security Policy".to_string()],
                is_compliant: false,
            };
        }

        let directives = parse_directives(policy);
        let has = |name: &str| directives.iter().any(|(n, _)| n == name);

        let mut violations = Vec::new();
        for required in &self.required {
            if !has(required) {
                violations.push(format!("Missing required directive: {}", required));
            }
        }

        for (name, sources) in &directives {
            if sources.iter().any(|s| is_unsafe_source(s)) {
                violations.push(format!(
                    "Potentially unsafe directive found: {} {}",
                    name,
                    sources.join(" ")
                ));
            }
        }

        let any_source = |keyword: &str| {
            directives
                .iter()
                .any(|(_, sources)| sources.iter().any(|s| s.eq_ignore_ascii_case(keyword)))
        };

        let mut recommendations = Vec::new();
        if !has("default-src") {
            recommendations.push("Add 'default-src' directive as fallback".to_string());
        }
        if !has("script-src") {
            recommendations.push("Add 'script-src' directive to control script execution".to_string());
        }
        if !has("object-src") {
            recommendations
                .push("Add 'object-src' directive to prevent object/embed/applet execution".to_string());
        }
        if any_source("'unsafe-inline'") {
            recommendations.push("Consider removing 'unsafe-inline' for better security".to_string());
        }
        if any_source("'unsafe-eval'") {
            recommendations.push("Consider removing 'unsafe-eval' for better security".to_string());
        }
        if !has("base-uri") {
            recommendations.push("Add 'base-uri' directive to control base element".to_string());
        }
        if !has("form-action") {
            recommendations.push("Add 'form-action' directive to control form submissions".to_string());
        }

        DirectiveAnalysis {
            policy: policy.to_string(),
            is_compliant: violations.is_empty(),
            violations,
            recommendations,
        }
    }
}

fn is_unsafe_source(source: &str) -> bool {
    source.eq_ignore_ascii_case("'unsafe-inline'")
        || source.eq_ignore_ascii_case("'unsafe-eval'")
        || source == "*"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_policy() {
        let analysis = DirectiveAnalyzer::new().analyze("   ");
        assert!(!analysis.is_compliant);
        assert_eq!(analysis.violations, vec!["No CSP policy found"]);
    }

    #[test]
    fn test_unsafe_inline_flagged() {
        let policy = "default-src 'self'; script-src 'self' 'unsafe-inline'; style-src 'self'; img-src 'self'";
        let analysis = DirectiveAnalyzer::new().analyze(policy);

        assert!(!analysis.is_compliant);
        assert_eq!(
            analysis.violations,
            vec!["Potentially unsafe directive found: script-src 'self' 'unsafe-inline'"]
        );
        assert!(analysis
            .recommendations
            .contains(&"Consider removing 'unsafe-inline' for better security".to_string()));
    }

    #[test]
    fn test_missing_required() {
        let analysis = DirectiveAnalyzer::new().analyze("script-src 'self'");
        assert!(analysis.violations.contains(&"Missing required directive: default-src".to_string()));
        assert!(analysis.violations.contains(&"Missing required directive: img-src".to_string()));
        assert!(!analysis.violations.iter().any(|v| v.ends_with("script-src")));
    }

    #[test]
    fn test_custom_required() {
        let analyzer = DirectiveAnalyzer::with_required(["script-src", "style-src"]);
        let analysis = analyzer.analyze("script-src 'self'; style-src 'self'");
        assert!(analysis.is_compliant);

        assert_eq!(
            DirectiveAnalyzer::with_required(Vec::<String>::new()).required().len(),
            4
        );
    }

    #[test]
    fn test_strict_policy_compliant() {
        let policy = "default-src 'none'; script-src 'self'; style-src 'self'; img-src 'self'; \
                      object-src 'none'; base-uri 'self'; form-action 'self'";
        let analysis = DirectiveAnalyzer::new().analyze(policy);

        assert!(analysis.is_compliant);
        assert!(analysis.recommendations.is_empty());
    }

    #[test]
    fn test_wildcard_source_flagged() {
        let analysis = DirectiveAnalyzer::new().analyze("default-src *");
        assert!(analysis
            .violations
            .iter()
            .any(|v| v == "Potentially unsafe directive found: default-src *"));
    }
}
