// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Delivery client trait
//!
//! One call, one attempt. Retry policy lives in the monitor's
//! [`RetryCoordinator`](crate::monitor::RetryCoordinator).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::endpoint::Endpoint;
use crate::report::Report;

/// Successful delivery
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delivered {
    /// HTTP status returned by the collector
    pub status: u16,
}

/// Why a single delivery attempt did not succeed
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeliveryFailure {
    /// Collector answered with a non-2xx status
    #[error("collector responded with status {0}")]
    Status(u16),

    /// Network or transport error
    #[error("transport error: {0}")]
    Transport(String),

    /// Request timed out
    #[error("timed out after {0}ms")]
    Timeout(u64),

    /// Endpoint could not be turned into a URL
    #[error("cannot resolve endpoint: {0}")]
    Unresolvable(String),

    /// Report could not be encoded
    #[error("cannot encode report: {0}")]
    Encoding(String),
}

impl DeliveryFailure {
    /// Status code, if the collector answered
    pub fn status_code(&self) -> Option<u16> {
        match self {
            DeliveryFailure::Status(code) => Some(*code),
            _ => None,
        }
    }

    /// Whether a later attempt could plausibly succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            DeliveryFailure::Status(code) => *code == 408 || *code == 429 || *code >= 500,
            DeliveryFailure::Transport(_) | DeliveryFailure::Timeout(_) => true,
            DeliveryFailure::Unresolvable(_) | DeliveryFailure::Encoding(_) => false,
        }
    }
}

/// Outcome of one delivery attempt
pub type DeliveryResult = std::result::Result<Delivered, DeliveryFailure>;

/// Sends a single report to a collector endpoint.
///
/// Implementations must never panic or propagate errors: every failure is
/// returned as a [`DeliveryFailure`] so callers decide the policy.
///
/// # Example
///
/// ```rust,no_run
/// use async_trait::async_trait;
/// use csp_sentinel::delivery::{Delivered, DeliveryClient, DeliveryResult, Endpoint};
/// use csp_sentinel::report::Report;
///
/// struct Discard;
///
/// #[async_trait]
/// impl DeliveryClient for Discard {
///     async fn send(&self, _endpoint: &Endpoint, _report: &Report) -> DeliveryResult {
///         Ok(Delivered { status: 204 })
///     }
/// }
/// ```
#[async_trait]
pub trait DeliveryClient: Send + Sync {
    /// Attempt to deliver one report
    async fn send(&self, endpoint: &Endpoint, report: &Report) -> DeliveryResult;

    /// Short name used in logs
    fn name(&self) -> &str {
        "delivery"
    }
}
