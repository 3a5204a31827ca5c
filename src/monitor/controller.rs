// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Monitor controller
//!
//! Owns the enabled flag, the validated endpoint and the report queue.
//! Every captured violation is queued; while enabled it is also delivered
//! immediately. A controller is a cheap handle: clones share state.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use url::Url;

use super::config::{DeliveredReportPolicy, MonitorConfig};
use super::metrics::{MetricsReport, MonitorMetrics};
use super::retry::{DrainOutcome, RetryCoordinator, Sleeper, TokioSleeper};
use super::status::{
    analyze_reports, CaptureOutcome, ClearOutcome, MonitorStatus, QueuePage, ViolationAnalysis,
};
use super::subscription::{spawn_subscription, ViolationSender};
use crate::delivery::{
    DeliveryClient, DeliveryConfig, DeliveryResult, Endpoint, HttpDeliveryClient,
};
use crate::error::{Error, Result};
use crate::report::{Report, ReportBuilder, ReportQueue, ViolationEvent};

/// State shared by a controller, its retry coordinator and its subscription
pub(crate) struct Shared {
    pub(crate) config: MonitorConfig,
    pub(crate) endpoint: Endpoint,
    pub(crate) enabled: AtomicBool,
    pub(crate) destroyed: AtomicBool,
    pub(crate) queue: Mutex<ReportQueue>,
    pub(crate) builder: ReportBuilder,
    pub(crate) client: Arc<dyn DeliveryClient>,
    pub(crate) sleeper: Arc<dyn Sleeper>,
    pub(crate) metrics: MonitorMetrics,
    pub(crate) subscription: Mutex<Option<JoinHandle<()>>>,
    /// Held for the whole of a drain so drains run one after another
    pub(crate) drain_lock: tokio::sync::Mutex<()>,
}

impl Shared {
    pub(crate) fn is_destroyed(&self) -> bool {
        self.destroyed.load(Ordering::SeqCst)
    }

    /// One delivery attempt with metrics and logging
    pub(crate) async fn deliver(&self, report: &Report) -> DeliveryResult {
        let start = Instant::now();
        let result = self.client.send(&self.endpoint, report).await;
        let elapsed_ms = start.elapsed().as_millis() as u64;

        self.metrics.record_delivery(elapsed_ms, result.is_ok());
        match &result {
            Ok(delivered) => debug!(
                endpoint = %self.endpoint,
                status = delivered.status,
                client = self.client.name(),
                "CSP violation report sent"
            ),
            Err(failure) => warn!(
                endpoint = %self.endpoint,
                error = %failure,
                client = self.client.name(),
                "Failed to send CSP report"
            ),
        }
        result
    }
}

/// Builder for [`MonitorController`]
pub struct MonitorBuilder {
    config: MonitorConfig,
    client: Option<Arc<dyn DeliveryClient>>,
    delivery_config: Option<DeliveryConfig>,
    sleeper: Option<Arc<dyn Sleeper>>,
}

impl MonitorBuilder {
    /// Use a custom delivery client
    pub fn client(mut self, client: Arc<dyn DeliveryClient>) -> Self {
        self.client = Some(client);
        self
    }

    /// Configure the default HTTP delivery client
    pub fn delivery_config(mut self, config: DeliveryConfig) -> Self {
        self.delivery_config = Some(config);
        self
    }

    /// Use a custom backoff sleeper
    pub fn sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = Some(sleeper);
        self
    }

    /// Validate the configuration and build the controller
    pub fn build(self) -> Result<MonitorController> {
        let endpoint = self.config.validate()?;

        let client: Arc<dyn DeliveryClient> = match self.client {
            Some(client) => client,
            None => {
                let delivery_config = match self.delivery_config {
                    Some(config) => config,
                    None => {
                        let mut config = DeliveryConfig::new().timeout(self.config.delivery_timeout);
                        config.user_agent = self.config.user_agent.clone();
                        config.base_url = Url::parse(&self.config.page_url).ok();
                        config
                    }
                };
                Arc::new(HttpDeliveryClient::with_config(delivery_config)?)
            }
        };

        let builder = ReportBuilder::new(&self.config.user_agent, &self.config.page_url);

        info!(
            endpoint = %endpoint,
            max_queue_size = self.config.max_queue_size,
            enabled = self.config.enabled,
            "CSP monitor initialized"
        );

        Ok(MonitorController {
            shared: Arc::new(Shared {
                endpoint,
                enabled: AtomicBool::new(self.config.enabled),
                destroyed: AtomicBool::new(false),
                queue: Mutex::new(ReportQueue::new(self.config.max_queue_size)),
                builder,
                client,
                sleeper: self.sleeper.unwrap_or_else(|| Arc::new(TokioSleeper)),
                metrics: MonitorMetrics::new(),
                subscription: Mutex::new(None),
                drain_lock: tokio::sync::Mutex::new(()),
                config: self.config,
            }),
        })
    }
}

/// CSP violation monitor
#[derive(Clone)]
pub struct MonitorController {
    shared: Arc<Shared>,
}

impl MonitorController {
    /// Create a monitor with the default HTTP delivery client
    pub fn new(config: MonitorConfig) -> Result<Self> {
        Self::builder(config).build()
    }

    /// Start building a monitor
    pub fn builder(config: MonitorConfig) -> MonitorBuilder {
        MonitorBuilder {
            config,
            client: None,
            delivery_config: None,
            sleeper: None,
        }
    }

    /// Switch to Enabled.
    ///
    /// On the Disabled → Enabled transition, with reports queued and
    /// `flush_on_enable` set, one delivery pass is spawned in the
    /// background. The handle is returned; awaiting it is optional.
    pub fn enable(&self) -> Option<JoinHandle<DrainOutcome>> {
        if self.shared.is_destroyed() {
            warn!("Ignoring enable on a destroyed CSP monitor");
            return None;
        }

        let was_enabled = self.shared.enabled.swap(true, Ordering::SeqCst);
        if was_enabled {
            return None;
        }
        info!("CSP monitoring enabled");

        let queued = self.queued_count();
        if queued == 0 || !self.shared.config.flush_on_enable {
            return None;
        }

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                warn!(queued, "No async runtime; queued reports stay queued until drained");
                return None;
            }
        };

        info!(queued, "Sending queued reports");
        let coordinator = self.retry_coordinator();
        Some(runtime.spawn(async move { coordinator.drain(1).await }))
    }

    /// Switch to Disabled. Returns whether the state changed.
    pub fn disable(&self) -> bool {
        let was_enabled = self.shared.enabled.swap(false, Ordering::SeqCst);
        if was_enabled {
            info!("CSP monitoring disabled");
        }
        was_enabled
    }

    /// Disable and discard every queued report
    pub fn disable_and_clear(&self) -> usize {
        self.disable();
        let count = self.shared.queue.lock().clear();
        self.shared.metrics.record_cleared(count);
        info!(count, "Report queue cleared on disable");
        count
    }

    pub fn is_enabled(&self) -> bool {
        self.shared.enabled.load(Ordering::SeqCst)
    }

    pub fn is_destroyed(&self) -> bool {
        self.shared.is_destroyed()
    }

    /// Capture a violation.
    ///
    /// The report is always queued. While enabled it is also sent right
    /// away; a failed send leaves it queued and is not an error. Only a
    /// destroyed monitor rejects the call.
    pub async fn on_violation(&self, event: ViolationEvent) -> Result<CaptureOutcome> {
        let report = Arc::new(self.shared.builder.build(&event));

        let enqueued = {
            let mut queue = self.shared.queue.lock();
            if self.shared.is_destroyed() {
                self.shared.metrics.record_rejected();
                return Err(Error::MonitorDestroyed);
            }
            queue.enqueue(report.clone())
        };

        self.shared.metrics.record_capture();
        if enqueued.evicted.is_some() {
            self.shared.metrics.record_eviction();
        }

        warn!(
            directive = %report.violation.violated_directive,
            blocked_uri = %report.violation.blocked_uri,
            risk = ?report.risk_level(),
            id = %enqueued.id,
            "CSP violation detected"
        );

        let delivery = if self.is_enabled() {
            let result = self.shared.deliver(&report).await;
            if result.is_ok()
                && self.shared.config.delivered_report_policy == DeliveredReportPolicy::Dequeue
            {
                self.shared.queue.lock().remove(enqueued.id);
            }
            Some(result)
        } else {
            None
        };

        Ok(CaptureOutcome {
            id: enqueued.id,
            evicted: enqueued.evicted,
            delivery,
        })
    }

    /// Current status; no side effects
    pub fn status(&self) -> MonitorStatus {
        MonitorStatus {
            enabled: self.is_enabled(),
            endpoint: self.shared.endpoint.to_string(),
            queued_reports: self.queued_count(),
            max_queue_size: self.shared.config.max_queue_size,
        }
    }

    /// Copy of the queued reports, oldest first
    pub fn queued(&self) -> Vec<Arc<Report>> {
        self.shared.queue.lock().reports()
    }

    pub fn queued_count(&self) -> usize {
        self.shared.queue.lock().len()
    }

    /// A page of queued reports; `limit` defaults to everything after `offset`
    pub fn queued_reports(&self, offset: usize, limit: Option<usize>) -> QueuePage {
        let queue = self.shared.queue.lock();
        let total = queue.len();
        let limit = limit.filter(|l| *l > 0).unwrap_or(total);
        let reports = queue
            .page(offset, limit)
            .into_iter()
            .map(|entry| (*entry.report).clone())
            .collect();

        QueuePage {
            reports,
            total,
            offset,
            limit,
        }
    }

    /// Clear the queue. A non-empty queue is only cleared when `confirm` is set.
    pub fn clear_queue(&self, confirm: bool) -> ClearOutcome {
        let mut queue = self.shared.queue.lock();
        let queued = queue.len();

        if queued > 0 && !confirm {
            info!(queued, "Refusing to clear report queue without confirmation");
            return ClearOutcome::ConfirmationRequired { queued };
        }

        let count = queue.clear();
        drop(queue);

        self.shared.metrics.record_cleared(count);
        info!(count, "Cleared queued CSP reports");
        ClearOutcome::Cleared { count }
    }

    /// Aggregate view of the queued violations
    pub fn analyze_violations(&self, include_recent: bool) -> ViolationAnalysis {
        analyze_reports(&self.queued(), include_recent)
    }

    /// Retry coordinator over this monitor's queue
    pub fn retry_coordinator(&self) -> RetryCoordinator {
        RetryCoordinator::new(self.shared.clone())
    }

    /// Drain the queue with up to `max_passes` passes.
    ///
    /// Waits for a drain already in flight (such as the flush started by
    /// [`enable`](Self::enable)) before taking its own snapshot.
    pub async fn drain(&self, max_passes: u32) -> DrainOutcome {
        self.retry_coordinator().drain(max_passes).await
    }

    /// Drain using the configured `max_retries`
    pub async fn send_queued(&self) -> DrainOutcome {
        self.drain(self.shared.config.max_retries).await
    }

    /// Subscribe to inbound violations through a channel.
    ///
    /// Events are processed one at a time in arrival order. A new
    /// subscription replaces the previous one.
    pub fn subscribe(&self) -> Result<ViolationSender> {
        if self.is_destroyed() {
            return Err(Error::MonitorDestroyed);
        }

        let (sender, handle) = spawn_subscription(self.clone())?;
        if let Some(previous) = self.shared.subscription.lock().replace(handle) {
            previous.abort();
        }
        Ok(sender)
    }

    /// Tear down: release the subscription and refuse further violations.
    ///
    /// Safe at any time. A drain in flight finishes its current pass and
    /// schedules no more.
    pub fn destroy(&self) {
        {
            let _queue = self.shared.queue.lock();
            if self.shared.destroyed.swap(true, Ordering::SeqCst) {
                return;
            }
        }
        self.shared.enabled.store(false, Ordering::SeqCst);

        if let Some(handle) = self.shared.subscription.lock().take() {
            handle.abort();
        }
        info!(endpoint = %self.shared.endpoint, "CSP monitor destroyed");
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.shared.endpoint
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.shared.config
    }

    pub fn metrics(&self) -> MetricsReport {
        self.shared.metrics.report()
    }
}
