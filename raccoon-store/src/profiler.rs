//! Session profiler
//!
//! Captures the requests sessions send to the store so they can be inspected
//! from the admin area. Captured bodies never contain the filtered fields: they
//! are removed, at any depth, before the capture is stored.

use crate::store::DocumentStore;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace};
use uuid::Uuid;

pub const DEFAULT_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ProfiledOperation {
    Load,
    SaveChanges,
}

/// One store request as seen by the profiler
#[derive(Debug, Clone, Serialize)]
pub struct CapturedRequest {
    pub session_id: Uuid,
    pub at: DateTime<Utc>,
    pub operation: ProfiledOperation,
    pub document_ids: Vec<String>,
    pub duration_ms: u64,
    pub body: Option<Value>,
}

pub struct Profiler {
    filtered_fields: HashSet<String>,
    capacity: usize,
    captured: Mutex<VecDeque<CapturedRequest>>,
}

impl Profiler {
    pub fn new<I, S>(filtered_fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_capacity(filtered_fields, DEFAULT_CAPACITY)
    }

    pub fn with_capacity<I, S>(filtered_fields: I, capacity: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            filtered_fields: filtered_fields.into_iter().map(Into::into).collect(),
            capacity: capacity.max(1),
            captured: Mutex::new(VecDeque::new()),
        }
    }

    /// Create a profiler and attach it to `store`
    ///
    /// Returns the profiler already attached if the store has one.
    pub fn initialize_for<I, S>(store: &DocumentStore, filtered_fields: I, capacity: usize) -> Arc<Profiler>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let profiler = Arc::new(Self::with_capacity(filtered_fields, capacity));
        if store.attach_profiler(profiler.clone()) {
            debug!(fields = ?profiler.filtered_fields, "Profiler attached to document store");
            profiler
        } else {
            store.profiler().cloned().unwrap_or(profiler)
        }
    }

    pub fn is_filtered(&self, field: &str) -> bool {
        self.filtered_fields.contains(field)
    }

    /// Remove filtered fields from `value`, recursively
    pub fn filter(&self, value: &Value) -> Value {
        match value {
            Value::Object(map) => Value::Object(
                map.iter()
                    .filter(|(key, _)| !self.is_filtered(key))
                    .map(|(key, value)| (key.clone(), self.filter(value)))
                    .collect(),
            ),
            Value::Array(items) => Value::Array(items.iter().map(|item| self.filter(item)).collect()),
            other => other.clone(),
        }
    }

    pub(crate) fn capture(
        &self,
        session_id: Uuid,
        operation: ProfiledOperation,
        document_ids: Vec<String>,
        duration: Duration,
        body: Option<&Value>,
    ) {
        let request = CapturedRequest {
            session_id,
            at: Utc::now(),
            operation,
            document_ids,
            duration_ms: duration.as_millis() as u64,
            body: body.map(|b| self.filter(b)),
        };
        trace!(session = %session_id, operation = ?operation, "Captured store request");

        let mut captured = self.captured.lock();
        if captured.len() == self.capacity {
            captured.pop_front();
        }
        captured.push_back(request);
    }

    /// Captured requests, oldest first
    pub fn results(&self) -> Vec<CapturedRequest> {
        self.captured.lock().iter().cloned().collect()
    }

    pub fn results_for(&self, session_id: Uuid) -> Vec<CapturedRequest> {
        self.captured
            .lock()
            .iter()
            .filter(|r| r.session_id == session_id)
            .cloned()
            .collect()
    }

    pub fn clear(&self) {
        self.captured.lock().clear();
    }
}
