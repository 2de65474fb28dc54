//! Queue replay driver
//!
//! Drains the retry queue head to tail, re-issuing each item through an
//! [`ItemDispatcher`]. The first retained failure halts the run: later items
//! may depend on earlier state, so none is attempted ahead of a failed one.

use std::sync::Arc;

use async_trait::async_trait;
use pw_common::QueueItem;
use serde_json::Value;
use tokio::time::{sleep, Duration};
use tracing::{debug, error, info, warn};

use crate::dispatch::ItemDispatcher;
use crate::store::{HeadFailure, QueueStore};
use crate::Result;

/// Notified when a previously-failed item of a matching action succeeds on
/// replay.
#[async_trait]
pub trait ReplayListener: Send + Sync {
    /// Action tag this listener subscribes to.
    fn action(&self) -> &str;

    async fn on_replayed(&self, item: &QueueItem, result: &Value);
}

/// Summary of one replay run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReplayReport {
    /// Items replayed successfully and removed from the queue.
    pub replayed: usize,
    /// Items moved to the dead-letter record after exceeding the bound.
    pub dead_lettered: usize,
    /// Whether the run stopped early on a retained failure.
    pub halted: bool,
}

pub struct ReplayDriver {
    store: Arc<dyn QueueStore>,
    dispatcher: Arc<dyn ItemDispatcher>,
    listeners: Vec<Arc<dyn ReplayListener>>,
    max_attempts: Option<u32>,
}

impl ReplayDriver {
    pub fn new(store: Arc<dyn QueueStore>, dispatcher: Arc<dyn ItemDispatcher>) -> Self {
        Self {
            store,
            dispatcher,
            listeners: Vec::new(),
            max_attempts: None,
        }
    }

    /// Bounds replay attempts per item. Unbounded by default: an item is
    /// never dropped, at the cost of a deterministic failure blocking the
    /// queue behind it.
    pub fn with_max_attempts(mut self, max_attempts: Option<u32>) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn subscribe(&mut self, listener: Arc<dyn ReplayListener>) {
        self.listeners.push(listener);
    }

    pub fn subscribe_all(&mut self, listeners: Vec<Arc<dyn ReplayListener>>) {
        self.listeners.extend(listeners);
    }

    /// Performs one replay pass over the queue.
    ///
    /// The snapshot length taken up front is the processing limit: items
    /// added while the run is in flight wait for the next run, so sustained
    /// load cannot produce an unbounded pass.
    pub async fn run_once(&self) -> Result<ReplayReport> {
        let snapshot = self.store.load().await?;
        if snapshot.is_empty() {
            return Ok(ReplayReport::default());
        }

        debug!(pending = snapshot.len(), "Starting replay run");
        let mut report = ReplayReport::default();

        for item in snapshot {
            match self.dispatcher.dispatch(&item).await {
                Ok(value) => {
                    if self.store.complete_head().await?.is_none() {
                        warn!(id = %item.id, "Queue emptied underneath an in-flight replay run");
                        break;
                    }
                    report.replayed += 1;
                    debug!(action = %item.action, id = %item.id, "Replayed queue item");
                    self.notify(&item, &value).await;
                }
                Err(e) => match self.store.fail_head(self.max_attempts).await? {
                    HeadFailure::Retained => {
                        warn!(
                            action = %item.action,
                            id = %item.id,
                            attempts = item.attempts + 1,
                            error = %e,
                            "Replay failed, item retained at head, run halted"
                        );
                        report.halted = true;
                        break;
                    }
                    HeadFailure::DeadLettered(dead) => {
                        error!(
                            action = %dead.action,
                            id = %dead.id,
                            attempts = dead.attempts,
                            error = %e,
                            "Replay attempts exhausted, item moved to dead letters"
                        );
                        report.dead_lettered += 1;
                    }
                    HeadFailure::Empty => break,
                },
            }
        }

        info!(
            replayed = report.replayed,
            dead_lettered = report.dead_lettered,
            halted = report.halted,
            "Replay run finished"
        );
        Ok(report)
    }

    /// Runs replay passes on a fixed timer until the task is dropped.
    pub async fn run_interval(&self, period: Duration) {
        info!(period_secs = period.as_secs(), "Starting replay loop");
        loop {
            if let Err(e) = self.run_once().await {
                error!(error = %e, "Replay run failed");
            }
            sleep(period).await;
        }
    }

    async fn notify(&self, item: &QueueItem, value: &Value) {
        for listener in &self.listeners {
            if listener.action() == item.action {
                listener.on_replayed(item, value).await;
            }
        }
    }
}
