//! Last-run output store for status introspection

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use contracts::BoxedMessage;

/// Summary of a check's most recent output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LastRun {
    pub at: DateTime<Utc>,
    pub messages: usize,
    pub processes: usize,
    pub containers: usize,
}

#[derive(Debug, Default)]
struct StoreInner {
    runs: HashMap<String, Option<LastRun>>,
    last_collect: Option<DateTime<Utc>>,
}

/// Shared by all schedulers of one collector
#[derive(Debug, Default)]
pub struct LastRunStore {
    inner: Mutex<StoreInner>,
}

impl LastRunStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a run; `None` marks a check that does not keep its output
    pub fn store(&self, name: &str, at: DateTime<Utc>, messages: Option<&[BoxedMessage]>) {
        let summary = messages.map(|messages| LastRun {
            at,
            messages: messages.len(),
            processes: messages.iter().map(|m| m.process_count()).sum(),
            containers: messages.iter().map(|m| m.container_count()).sum(),
        });
        self.lock().runs.insert(name.to_string(), summary);
    }

    /// Last output of `name`; `None` if never stored or not kept
    pub fn get(&self, name: &str) -> Option<LastRun> {
        self.lock().runs.get(name).cloned().flatten()
    }

    pub fn set_last_collect_time(&self, at: DateTime<Utc>) {
        self.lock().last_collect = Some(at);
    }

    pub fn last_collect_time(&self) -> Option<DateTime<Utc>> {
        self.lock().last_collect
    }

    fn lock(&self) -> MutexGuard<'_, StoreInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
