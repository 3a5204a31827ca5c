// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Bounded report queue
//!
//! Holds the most recent `capacity` reports in insertion order. Once full,
//! every enqueue evicts the oldest entry first. Reports are shared as
//! `Arc<Report>` so snapshots are cheap and can never alias mutable state.

use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::builder::Report;

/// Default queue capacity
pub const DEFAULT_MAX_QUEUE_SIZE: usize = 100;

/// Identity of a queued entry, unique for the queue's lifetime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ReportId(u64);

impl ReportId {
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ReportId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A report together with its queue identity
#[derive(Debug, Clone, PartialEq)]
pub struct QueuedReport {
    pub id: ReportId,
    pub report: Arc<Report>,
}

/// Result of an enqueue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnqueueOutcome {
    /// Id assigned to the new entry
    pub id: ReportId,
    /// Entry dropped to make room, if the queue was full
    pub evicted: Option<ReportId>,
}

/// Bounded FIFO of pending reports
#[derive(Debug)]
pub struct ReportQueue {
    entries: VecDeque<QueuedReport>,
    capacity: usize,
    next_id: u64,
}

impl Default for ReportQueue {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_QUEUE_SIZE)
    }
}

impl ReportQueue {
    /// Create a queue holding at most `capacity` reports (minimum 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity.min(1024)),
            capacity,
            next_id: 0,
        }
    }

    /// Append a report, evicting the oldest entry if over capacity
    pub fn enqueue(&mut self, report: impl Into<Arc<Report>>) -> EnqueueOutcome {
        let id = ReportId(self.next_id);
        self.next_id += 1;

        self.entries.push_back(QueuedReport {
            id,
            report: report.into(),
        });

        let evicted = if self.entries.len() > self.capacity {
            self.entries.pop_front().map(|entry| entry.id)
        } else {
            None
        };

        EnqueueOutcome { id, evicted }
    }

    /// Copy of the queued entries, head first
    pub fn snapshot(&self) -> Vec<QueuedReport> {
        self.entries.iter().cloned().collect()
    }

    /// Copy of the queued reports, head first
    pub fn reports(&self) -> Vec<Arc<Report>> {
        self.entries.iter().map(|e| e.report.clone()).collect()
    }

    /// Entries in `[offset, offset + limit)`
    pub fn page(&self, offset: usize, limit: usize) -> Vec<QueuedReport> {
        self.entries.iter().skip(offset).take(limit).cloned().collect()
    }

    /// Empty the queue, returning how many reports were discarded
    pub fn clear(&mut self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        count
    }

    /// Keep only entries matching the predicate, preserving order
    pub fn retain_only<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(&QueuedReport) -> bool,
    {
        let before = self.entries.len();
        self.entries.retain(|entry| keep(entry));
        before - self.entries.len()
    }

    /// Drop entries matching the predicate, preserving order
    pub fn remove_if<F>(&mut self, mut remove: F) -> usize
    where
        F: FnMut(&QueuedReport) -> bool,
    {
        self.retain_only(|entry| !remove(entry))
    }

    /// Remove a single entry by id
    pub fn remove(&mut self, id: ReportId) -> bool {
        self.remove_if(|entry| entry.id == id) > 0
    }

    /// Check whether an entry is still queued
    pub fn contains(&self, id: ReportId) -> bool {
        self.entries.iter().any(|entry| entry.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of reports held
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::builder::ViolationPayload;

    fn report(tag: &str) -> Report {
        Report {
            timestamp: "2026-01-01T00:00:00.000Z".to_string(),
            user_agent: "ua".to_string(),
            url: "https://app.example/".to_string(),
            violation: ViolationPayload {
                blocked_uri: tag.to_string(),
                ..Default::default()
            },
            additional_info: None,
        }
    }

    fn tags(queue: &ReportQueue) -> Vec<String> {
        queue
            .reports()
            .iter()
            .map(|r| r.violation.blocked_uri.clone())
            .collect()
    }

    #[test]
    fn test_evicts_oldest() {
        let mut queue = ReportQueue::new(2);
        queue.enqueue(report("A"));
        queue.enqueue(report("B"));
        let outcome = queue.enqueue(report("C"));

        assert_eq!(tags(&queue), vec!["B", "C"]);
        assert_eq!(outcome.evicted, Some(ReportId(0)));
    }

    #[test]
    fn test_capacity_invariant() {
        let mut queue = ReportQueue::new(5);
        for i in 0..50 {
            let outcome = queue.enqueue(report(&i.to_string()));
            assert!(queue.len() <= queue.capacity());
            if i >= 5 {
                assert_eq!(outcome.evicted, Some(ReportId(i - 5)));
            } else {
                assert!(outcome.evicted.is_none());
            }
        }
        assert_eq!(tags(&queue), vec!["45", "46", "47", "48", "49"]);
    }

    #[test]
    fn test_snapshot_is_detached() {
        let mut queue = ReportQueue::new(10);
        queue.enqueue(report("A"));

        let mut snapshot = queue.snapshot();
        snapshot.clear();

        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_clear_returns_count() {
        let mut queue = ReportQueue::new(10);
        queue.enqueue(report("A"));
        queue.enqueue(report("B"));

        assert_eq!(queue.clear(), 2);
        assert!(queue.is_empty());
        assert_eq!(queue.clear(), 0);
    }

    #[test]
    fn test_retain_preserves_order() {
        let mut queue = ReportQueue::new(10);
        for tag in ["A", "B", "C", "D", "E"] {
            queue.enqueue(report(tag));
        }

        let removed = queue.remove_if(|e| e.report.violation.blocked_uri == "B" || e.report.violation.blocked_uri == "D");
        assert_eq!(removed, 2);
        assert_eq!(tags(&queue), vec!["A", "C", "E"]);
    }

    #[test]
    fn test_ids_not_reused_after_clear() {
        let mut queue = ReportQueue::new(10);
        let first = queue.enqueue(report("A")).id;
        queue.clear();
        let second = queue.enqueue(report("B")).id;

        assert!(second > first);
        assert!(!queue.contains(first));
        assert!(queue.remove(second));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_page() {
        let mut queue = ReportQueue::new(10);
        for tag in ["A", "B", "C", "D"] {
            queue.enqueue(report(tag));
        }

        let page: Vec<String> = queue
            .page(1, 2)
            .iter()
            .map(|e| e.report.violation.blocked_uri.clone())
            .collect();
        assert_eq!(page, vec!["B", "C"]);
        assert!(queue.page(10, 2).is_empty());
    }

    #[test]
    fn test_zero_capacity_clamped() {
        let queue = ReportQueue::new(0);
        assert_eq!(queue.capacity(), 1);
    }
}
