//! WeightedQueue - FIFO bounded by item count and byte weight

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use contracts::WeightedItem;
use tokio::sync::Notify;
use tracing::{debug, trace};

use crate::metrics::QueueMetrics;

struct Inner<T> {
    items: VecDeque<T>,
    weight: u64,
    stopped: bool,
}

/// Concurrent FIFO bounded by count and cumulative weight
///
/// `add` never blocks: when the new item would exceed either bound, the
/// oldest items are evicted until it fits. An item heavier than the weight
/// bound on its own is still accepted, after everything else was evicted.
pub struct WeightedQueue<T> {
    name: String,
    max_size: usize,
    max_weight: u64,
    inner: Mutex<Inner<T>>,
    notify: Notify,
    metrics: QueueMetrics,
}

impl<T: WeightedItem> WeightedQueue<T> {
    /// Create a queue; `max_size` is clamped to at least one item.
    pub fn new(name: impl Into<String>, max_size: usize, max_weight: u64) -> Self {
        Self {
            name: name.into(),
            max_size: max_size.max(1),
            max_weight,
            inner: Mutex::new(Inner {
                items: VecDeque::new(),
                weight: 0,
                stopped: false,
            }),
            notify: Notify::new(),
            metrics: QueueMetrics::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn max_weight(&self) -> u64 {
        self.max_weight
    }

    pub fn metrics(&self) -> &QueueMetrics {
        &self.metrics
    }

    /// Enqueue an item, evicting the oldest items if needed
    ///
    /// No-op after `stop`.
    pub fn add(&self, item: T) {
        let item_weight = item.weight();
        let evicted = {
            let mut inner = self.lock();
            if inner.stopped {
                drop(inner);
                self.metrics.add_discarded(1);
                trace!(queue = %self.name, "queue stopped, item discarded");
                return;
            }

            let mut evicted = 0u64;
            while !inner.items.is_empty()
                && (inner.items.len() >= self.max_size
                    || inner.weight.saturating_add(item_weight) > self.max_weight)
            {
                if let Some(old) = inner.items.pop_front() {
                    inner.weight = inner.weight.saturating_sub(old.weight());
                    evicted += 1;
                }
            }

            inner.items.push_back(item);
            inner.weight = inner.weight.saturating_add(item_weight);
            evicted
        };

        self.metrics.inc_added();
        if evicted > 0 {
            self.metrics.add_evicted(evicted);
            ::metrics::counter!("process_agent_queue_evicted_total", "queue" => self.name.clone())
                .increment(evicted);
            debug!(
                queue = %self.name,
                evicted,
                item_weight,
                max_size = self.max_size,
                max_weight = self.max_weight,
                "Queue full, evicted oldest items"
            );
        }
        if item_weight > self.max_weight {
            debug!(
                queue = %self.name,
                item_weight,
                max_weight = self.max_weight,
                "Item exceeds queue weight bound on its own"
            );
        }

        self.notify.notify_one();
    }

    /// Wait for the next item
    ///
    /// Returns `None` once the queue is stopped; that signal is permanent.
    pub async fn poll(&self) -> Option<T> {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            // Register before checking state so a concurrent stop cannot be missed.
            notified.as_mut().enable();

            {
                let mut inner = self.lock();
                if inner.stopped {
                    return None;
                }
                if let Some(item) = inner.items.pop_front() {
                    inner.weight = inner.weight.saturating_sub(item.weight());
                    return Some(item);
                }
            }

            notified.await;
        }
    }

    /// Stop the queue and release every waiting consumer
    ///
    /// Items still queued are discarded. Idempotent.
    pub fn stop(&self) {
        let discarded = {
            let mut inner = self.lock();
            if inner.stopped {
                return;
            }
            inner.stopped = true;
            let discarded = inner.items.len() as u64;
            inner.items.clear();
            inner.weight = 0;
            discarded
        };

        if discarded > 0 {
            self.metrics.add_discarded(discarded);
        }
        debug!(queue = %self.name, discarded, "Queue stopped");
        self.notify.notify_waiters();
    }

    pub fn is_stopped(&self) -> bool {
        self.lock().stopped
    }

    /// Current item count
    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().items.is_empty()
    }

    /// Current cumulative weight
    pub fn weight(&self) -> u64 {
        self.lock().weight
    }

    fn lock(&self) -> MutexGuard<'_, Inner<T>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T> std::fmt::Debug for WeightedQueue<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeightedQueue")
            .field("name", &self.name)
            .field("max_size", &self.max_size)
            .field("max_weight", &self.max_weight)
            .finish()
    }
}
