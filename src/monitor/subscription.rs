// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Channel subscription for inbound violations
//!
//! The host pushes events into a [`ViolationSender`]; a single task feeds
//! them to the controller in arrival order. Destroying the controller
//! aborts the task and closes the channel.

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::debug;

use super::controller::MonitorController;
use super::status::CaptureOutcome;
use crate::error::{Error, Result};
use crate::report::ViolationEvent;

type Reply = oneshot::Sender<Result<CaptureOutcome>>;

/// Handle for pushing violations to a monitor
#[derive(Clone)]
pub struct ViolationSender {
    tx: mpsc::UnboundedSender<(ViolationEvent, Option<Reply>)>,
}

impl ViolationSender {
    /// Queue an event without waiting for it to be processed
    pub fn send(&self, event: ViolationEvent) -> Result<()> {
        self.tx
            .send((event, None))
            .map_err(|_| Error::MonitorDestroyed)
    }

    /// Queue an event and wait until the monitor has captured it
    pub async fn capture(&self, event: ViolationEvent) -> Result<CaptureOutcome> {
        let (reply, outcome) = oneshot::channel();
        self.tx
            .send((event, Some(reply)))
            .map_err(|_| Error::MonitorDestroyed)?;
        outcome.await.map_err(|_| Error::MonitorDestroyed)?
    }

    /// Whether the subscription has been released
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Spawn the task that feeds events to `controller`
pub(crate) fn spawn_subscription(
    controller: MonitorController,
) -> Result<(ViolationSender, JoinHandle<()>)> {
    let runtime = tokio::runtime::Handle::try_current()
        .map_err(|e| Error::other(format!("subscription needs an async runtime: {}", e)))?;

    let (tx, mut rx) = mpsc::unbounded_channel::<(ViolationEvent, Option<Reply>)>();

    let handle = runtime.spawn(async move {
        while let Some((event, reply)) = rx.recv().await {
            let result = controller.on_violation(event).await;
            let stop = matches!(result, Err(Error::MonitorDestroyed));
            if let Some(reply) = reply {
                let _ = reply.send(result);
            }
            if stop {
                break;
            }
        }
        debug!("Violation subscription closed");
    });

    Ok((ViolationSender { tx }, handle))
}
