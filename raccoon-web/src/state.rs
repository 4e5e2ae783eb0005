//! Application state shared by every request

use raccoon_core::RaccoonConfig;
use raccoon_store::{DocumentStore, Profiler, TaskExecutor, TransportErrorKind};
use serde::Serialize;
use std::sync::Arc;

/// Outcome of the startup connectivity check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "kind")]
pub enum StoreAvailability {
    Available,
    Unreachable(TransportErrorKind),
}

impl StoreAvailability {
    pub fn is_available(&self) -> bool {
        matches!(self, StoreAvailability::Available)
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<RaccoonConfig>,
    pub store: Arc<DocumentStore>,
    pub tasks: Arc<TaskExecutor>,
    pub availability: StoreAvailability,
}

impl AppState {
    pub fn new(
        config: Arc<RaccoonConfig>,
        store: Arc<DocumentStore>,
        tasks: Arc<TaskExecutor>,
        availability: StoreAvailability,
    ) -> Self {
        Self {
            config,
            store,
            tasks,
            availability,
        }
    }

    pub fn profiler(&self) -> Option<&Arc<Profiler>> {
        self.store.profiler()
    }
}
