// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Queue draining with exponential backoff
//!
//! A drain makes up to `max_passes` passes. Each pass attempts every
//! report queued at its start, head first, and retires the ones the
//! collector accepted. Between passes it waits `2^pass` backoff units.
//!
//! Entries are retired by id, so reports captured while a pass is in
//! flight are neither lost nor duplicated; they join the next pass.
//! Drains over the same queue are serialized: a second drain waits for
//! the first to finish and then sees only what it left behind.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::controller::Shared;
use crate::delivery::DeliveryResult;
use crate::report::{QueuedReport, ReportId};

/// Waits between retry passes
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Sleeps on the tokio timer
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Result of a drain
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DrainOutcome {
    /// Reports the collector accepted
    pub sent: usize,
    /// Reports attempted during the drain and still queued at its end
    pub failed: usize,
    /// Passes actually run
    pub passes: u32,
    /// Delivery attempts across all passes
    pub attempts: usize,
    /// Stopped early because the monitor was destroyed
    pub cancelled: bool,
}

impl DrainOutcome {
    /// Every attempted report was delivered
    pub fn is_complete(&self) -> bool {
        self.failed == 0 && !self.cancelled
    }
}

/// Backoff before the pass following `pass` (1-based): `base * 2^pass`
pub fn backoff_delay(base: Duration, pass: u32) -> Duration {
    base.saturating_mul(2u32.saturating_pow(pass))
}

/// Drains a monitor's queue
#[derive(Clone)]
pub struct RetryCoordinator {
    shared: Arc<Shared>,
}

impl RetryCoordinator {
    pub(crate) fn new(shared: Arc<Shared>) -> Self {
        Self { shared }
    }

    /// Run up to `max_passes` delivery passes
    pub async fn drain(&self, max_passes: u32) -> DrainOutcome {
        let _running = self.shared.drain_lock.lock().await;
        let mut outcome = DrainOutcome::default();

        if self.shared.queue.lock().is_empty() {
            info!("No queued reports to send");
            return outcome;
        }

        self.shared.metrics.record_drain();
        let mut attempted: HashSet<ReportId> = HashSet::new();
        let mut remaining = 0;

        for pass in 1..=max_passes {
            if self.shared.is_destroyed() {
                outcome.cancelled = true;
                break;
            }

            let batch = self.shared.queue.lock().snapshot();
            if batch.is_empty() {
                break;
            }

            info!(pass, max_passes, queued = batch.len(), "Sending queued reports");
            self.shared.metrics.record_pass();
            outcome.passes = pass;
            outcome.attempts += batch.len();
            attempted.extend(batch.iter().map(|entry| entry.id));

            let delivered = self.run_pass(&batch).await;
            outcome.sent += delivered.len();

            remaining = {
                let mut queue = self.shared.queue.lock();
                queue.remove_if(|entry| delivered.contains(&entry.id));
                queue.len()
            };

            if remaining == 0 {
                info!(sent = outcome.sent, "All queued reports sent successfully");
                break;
            }

            if pass < max_passes {
                if self.shared.is_destroyed() {
                    outcome.cancelled = true;
                    break;
                }
                let delay = backoff_delay(self.shared.config.retry_base_delay, pass);
                info!(
                    retry = pass,
                    max_passes,
                    remaining,
                    delay_ms = delay.as_millis() as u64,
                    "Reports still queued, backing off"
                );
                self.shared.sleeper.sleep(delay).await;
            }
        }

        outcome.failed = {
            let queue = self.shared.queue.lock();
            attempted.iter().filter(|id| queue.contains(**id)).count()
        };

        if outcome.failed > 0 {
            warn!(
                sent = outcome.sent,
                failed = outcome.failed,
                remaining,
                "Drain finished with undelivered reports"
            );
        }
        outcome
    }

    /// Attempt every entry of `batch`, returning the ids that were delivered
    async fn run_pass(&self, batch: &[QueuedReport]) -> HashSet<ReportId> {
        let results: Vec<(ReportId, DeliveryResult)> = if self.shared.config.concurrent_dispatch {
            let sends = batch.iter().map(|entry| async move {
                (entry.id, self.shared.deliver(&entry.report).await)
            });
            futures::future::join_all(sends).await
        } else {
            let mut results = Vec::with_capacity(batch.len());
            for entry in batch {
                results.push((entry.id, self.shared.deliver(&entry.report).await));
            }
            results
        };

        let delivered: HashSet<ReportId> = results
            .into_iter()
            .filter_map(|(id, result)| result.ok().map(|_| id))
            .collect();
        debug!(attempted = batch.len(), delivered = delivered.len(), "Pass finished");
        delivered
    }
}

/// Sleeper that records requested delays instead of waiting
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct RecordingSleeper {
    pub(crate) delays: parking_lot::Mutex<Vec<Duration>>,
}

#[cfg(test)]
#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.delays.lock().push(duration);
    }
}
