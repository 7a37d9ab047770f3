//! Payload / CheckResult - Scheduler output, Dispatcher input

use std::collections::BTreeMap;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Anything stored in a weighted queue exposes its byte cost.
pub trait WeightedItem: Send {
    /// Weight in bytes (never negative)
    fn weight(&self) -> u64;
}

/// Delivery metadata attached to one payload
///
/// Keys are compared case-sensitively; use the constants in [`crate::headers`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadHeaders(BTreeMap<String, String>);

impl PayloadHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set (or replace) a header value
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// Encoded body plus its headers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payload {
    pub body: Bytes,
    pub headers: PayloadHeaders,
}

/// All payloads produced by one check invocation
///
/// Immutable once queued; consumed by exactly one dispatcher.
#[derive(Debug, Clone)]
pub struct CheckResult {
    name: String,
    payloads: Vec<Payload>,
    size_in_bytes: u64,
}

impl CheckResult {
    /// Build a result; the weight is the sum of the payload body sizes.
    pub fn new(name: impl Into<String>, payloads: Vec<Payload>) -> Self {
        let size_in_bytes = payloads.iter().map(|p| p.body.len() as u64).sum();
        Self {
            name: name.into(),
            payloads,
            size_in_bytes,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn payloads(&self) -> &[Payload] {
        &self.payloads
    }

    pub fn size_in_bytes(&self) -> u64 {
        self.size_in_bytes
    }
}

impl WeightedItem for CheckResult {
    fn weight(&self) -> u64 {
        self.size_in_bytes
    }
}
