//! Snapshot and action-log publication.

use crate::sampler::{now_unix, Snapshot};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;

pub const DEFAULT_LOG_CAPACITY: usize = 100;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionLogEntry {
    /// Unix seconds.
    pub timestamp: i64,
    pub message: String,
}

/// Owns the current snapshot and the bounded action log.
///
/// `publish` atomically replaces the current snapshot: concurrent readers see
/// either the old or the new snapshot in full, never a mix, and two sequential
/// `current` calls never observe an older snapshot after a newer one. The
/// scheduler loop is the only writer; reads never block on a pass in progress.
pub struct Publisher {
    snapshot_tx: watch::Sender<Arc<Snapshot>>,
    log: Mutex<VecDeque<ActionLogEntry>>,
    log_capacity: usize,
}

impl Publisher {
    pub fn new(log_capacity: usize) -> Self {
        let (snapshot_tx, _) = watch::channel(Arc::new(Snapshot::default()));
        Self {
            snapshot_tx,
            log: Mutex::new(VecDeque::with_capacity(log_capacity)),
            log_capacity,
        }
    }

    pub fn publish(&self, snapshot: Snapshot) {
        self.snapshot_tx.send_replace(Arc::new(snapshot));
    }

    /// The most recently published snapshot.
    pub fn current(&self) -> Arc<Snapshot> {
        self.snapshot_tx.borrow().clone()
    }

    /// Receiver that resolves whenever a new snapshot is published, for push
    /// consumers that would rather wait than poll.
    pub fn subscribe(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.snapshot_tx.subscribe()
    }

    /// Append one entry, dropping the oldest past capacity.
    pub fn append_log(&self, message: String) {
        let mut log = self.log.lock().unwrap();
        log.push_back(ActionLogEntry {
            timestamp: now_unix(),
            message,
        });
        while log.len() > self.log_capacity {
            log.pop_front();
        }
    }

    /// Up to `n` most recent entries in append order, most recent last.
    pub fn recent_log(&self, n: usize) -> Vec<ActionLogEntry> {
        let log = self.log.lock().unwrap();
        let skip = log.len().saturating_sub(n);
        log.iter().skip(skip).cloned().collect()
    }
}

impl Default for Publisher {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_CAPACITY)
    }
}
