// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Monitor configuration

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::delivery::{Endpoint, DEFAULT_ENDPOINT, DEFAULT_USER_AGENT};
use crate::error::{Error, Result};
use crate::report::DEFAULT_MAX_QUEUE_SIZE;

/// What happens to a report that was delivered at capture time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveredReportPolicy {
    /// Leave it queued; only a drain retires reports
    #[default]
    Retain,
    /// Remove it from the queue as soon as the collector accepts it
    Dequeue,
}

/// Monitor configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MonitorConfig {
    /// Collector endpoint (absolute http(s) URL or `/`-path)
    pub endpoint: String,
    /// Maximum number of queued reports
    pub max_queue_size: usize,
    /// Start in the enabled state
    pub enabled: bool,
    /// Client identity recorded in every report
    pub user_agent: String,
    /// Page URL recorded in every report; base for relative endpoints
    pub page_url: String,
    /// Passes made by a drain when the caller gives no explicit count
    pub max_retries: u32,
    /// Backoff unit; a drain waits `2^pass` units between passes
    #[serde(rename = "retryBaseDelayMs", with = "duration_ms")]
    pub retry_base_delay: Duration,
    /// Per-request delivery timeout
    #[serde(rename = "deliveryTimeoutMs", with = "duration_ms")]
    pub delivery_timeout: Duration,
    /// Run one delivery pass over queued reports when monitoring is enabled
    pub flush_on_enable: bool,
    /// Send every report of a pass concurrently instead of one by one
    pub concurrent_dispatch: bool,
    /// Capture-time delivery policy
    pub delivered_report_policy: DeliveredReportPolicy,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            max_queue_size: DEFAULT_MAX_QUEUE_SIZE,
            enabled: false,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            page_url: String::new(),
            max_retries: 3,
            retry_base_delay: Duration::from_secs(1),
            delivery_timeout: Duration::from_secs(10),
            flush_on_enable: true,
            concurrent_dispatch: false,
            delivered_report_policy: DeliveredReportPolicy::Retain,
        }
    }
}

impl MonitorConfig {
    /// Create a new monitor config
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from a JSON file; missing fields keep their defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Set endpoint
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Set queue capacity
    pub fn max_queue_size(mut self, size: usize) -> Self {
        self.max_queue_size = size;
        self
    }

    /// Start enabled or disabled
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Set user agent
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set page URL
    pub fn page_url(mut self, url: impl Into<String>) -> Self {
        self.page_url = url.into();
        self
    }

    /// Set default drain pass count
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Set backoff unit
    pub fn retry_base_delay(mut self, delay: Duration) -> Self {
        self.retry_base_delay = delay;
        self
    }

    /// Set delivery timeout
    pub fn delivery_timeout(mut self, timeout: Duration) -> Self {
        self.delivery_timeout = timeout;
        self
    }

    /// Flush queued reports on enable
    pub fn flush_on_enable(mut self, flush: bool) -> Self {
        self.flush_on_enable = flush;
        self
    }

    /// Dispatch a pass concurrently
    pub fn concurrent_dispatch(mut self, concurrent: bool) -> Self {
        self.concurrent_dispatch = concurrent;
        self
    }

    /// Set capture-time delivery policy
    pub fn delivered_report_policy(mut self, policy: DeliveredReportPolicy) -> Self {
        self.delivered_report_policy = policy;
        self
    }

    /// Check the configuration and return the validated endpoint
    pub fn validate(&self) -> Result<Endpoint> {
        if self.max_queue_size == 0 {
            return Err(Error::config("maxQueueSize must be at least 1"));
        }
        if self.max_retries == 0 {
            return Err(Error::config("maxRetries must be at least 1"));
        }
        Endpoint::parse(&self.endpoint)
    }
}

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}
