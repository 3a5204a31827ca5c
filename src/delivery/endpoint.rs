// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Collector endpoint

use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Error, Result};

/// Default collector path
pub const DEFAULT_ENDPOINT: &str = "/csp-violations";

/// Validated collector endpoint: an absolute http(s) URL or a `/`-path
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Endpoint(String);

impl Endpoint {
    /// Validate and wrap an endpoint
    pub fn parse(value: impl AsRef<str>) -> Result<Self> {
        let value = value.as_ref().trim();

        if value.is_empty() {
            return Err(Error::invalid_endpoint(value, "endpoint cannot be empty"));
        }

        if value.starts_with('/') {
            return Ok(Self(value.to_string()));
        }

        let url = Url::parse(value)
            .map_err(|e| Error::invalid_endpoint(value, format!("not a URL or absolute path: {}", e)))?;

        match url.scheme() {
            "http" | "https" => Ok(Self(value.to_string())),
            other => Err(Error::invalid_endpoint(
                value,
                format!("unsupported scheme '{}'", other),
            )),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Path relative to the page origin
    pub fn is_relative(&self) -> bool {
        self.0.starts_with('/')
    }

    pub fn is_absolute(&self) -> bool {
        !self.is_relative()
    }

    /// Resolve to a full URL, using `base` for relative endpoints
    pub fn resolve(&self, base: Option<&Url>) -> Result<Url> {
        if self.is_absolute() {
            return Ok(Url::parse(&self.0)?);
        }

        match base {
            Some(base) => Ok(base.join(&self.0)?),
            None => Err(Error::invalid_endpoint(
                self.0.as_str(),
                "relative endpoint needs a base URL",
            )),
        }
    }
}

impl Default for Endpoint {
    fn default() -> Self {
        Self(DEFAULT_ENDPOINT.to_string())
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Endpoint {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(value)
    }
}

impl From<Endpoint> for String {
    fn from(endpoint: Endpoint) -> Self {
        endpoint.0
    }
}

impl AsRef<str> for Endpoint {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_paths_and_urls() {
        assert!(Endpoint::parse("/csp-violations").unwrap().is_relative());
        assert!(Endpoint::parse("https://collector.example/csp").unwrap().is_absolute());
        assert_eq!(Endpoint::parse("  /trimmed ").unwrap().as_str(), "/trimmed");
    }

    #[test]
    fn test_rejects_invalid() {
        for bad in ["", "   ", "csp-violations", "ftp://collector.example/", "mailto:a@b.c"] {
            let err = Endpoint::parse(bad).unwrap_err();
            assert!(err.is_config(), "{} should be rejected", bad);
        }
    }

    #[test]
    fn test_resolve() {
        let base = Url::parse("https://app.example/account/settings").unwrap();

        let relative = Endpoint::parse("/csp-violations").unwrap();
        assert_eq!(
            relative.resolve(Some(&base)).unwrap().as_str(),
            "https://app.example/csp-violations"
        );
        assert!(relative.resolve(None).is_err());

        let absolute = Endpoint::parse("https://collector.example/r").unwrap();
        assert_eq!(
            absolute.resolve(Some(&base)).unwrap().as_str(),
            "https://collector.example/r"
        );
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: Endpoint = serde_json::from_str("\"/reports\"").unwrap();
        assert_eq!(ok.as_str(), "/reports");
        assert!(serde_json::from_str::<Endpoint>("\"reports\"").is_err());
    }
}
