//! Background task execution
//!
//! Requests queue tasks while they run; once the request's own session has been
//! committed the queued tasks are handed to the executor and the request moves
//! on without waiting for them. Each task gets a fresh session that is committed
//! when the task succeeds. Failed tasks are logged and dropped, never retried.

use crate::error::StoreResult;
use crate::session::DocumentSession;
use crate::store::DocumentStore;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

#[async_trait]
pub trait BackgroundTask: Send + Sync {
    fn name(&self) -> &str;

    async fn execute(&self, session: &mut DocumentSession) -> StoreResult<()>;
}

pub type BoxedTask = Box<dyn BackgroundTask>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    Completed { saved: usize },
    Failed { error: String },
}

pub struct TaskExecutor {
    sender: mpsc::UnboundedSender<Vec<BoxedTask>>,
    shutdown_tx: watch::Sender<()>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl TaskExecutor {
    /// Spawn the worker that runs queued tasks against `store`
    pub fn start(store: Arc<DocumentStore>) -> Self {
        let (sender, mut receiver) = mpsc::unbounded_channel::<Vec<BoxedTask>>();
        let (shutdown_tx, mut shutdown_rx) = watch::channel(());

        let handle = tokio::spawn(async move {
            info!("Background task executor started");

            loop {
                tokio::select! {
                    _ = shutdown_rx.changed() => break,
                    batch = receiver.recv() => match batch {
                        Some(tasks) => Self::run_batch(&store, tasks).await,
                        None => break,
                    },
                }
            }

            // Work already handed over before shutdown still runs
            while let Ok(tasks) = receiver.try_recv() {
                Self::run_batch(&store, tasks).await;
            }

            info!("Background task executor shutting down");
        });

        Self {
            sender,
            shutdown_tx,
            handle: Mutex::new(Some(handle)),
        }
    }

    /// Hand `tasks` to the worker without waiting for them
    pub fn start_executing(&self, tasks: Vec<BoxedTask>) {
        if tasks.is_empty() {
            return;
        }

        let count = tasks.len();
        if self.sender.send(tasks).is_err() {
            warn!("Task executor is stopped, dropping {} task(s)", count);
        } else {
            debug!(count, "Queued background tasks");
        }
    }

    /// Stop the worker once the tasks already queued have run
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
        let handle = self.handle.lock().take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                error!("Task executor worker panicked: {}", e);
            }
        }
    }

    pub fn is_running(&self) -> bool {
        !self.sender.is_closed()
    }

    /// Run one task in its own session, committing on success
    pub async fn execute_task(store: &Arc<DocumentStore>, task: &dyn BackgroundTask) -> TaskOutcome {
        let mut session = store.open_session();

        let result = match task.execute(&mut session).await {
            Ok(()) => session.save_changes().await,
            Err(e) => Err(e),
        };

        match result {
            Ok(saved) => {
                debug!(task = task.name(), saved, "Background task completed");
                TaskOutcome::Completed { saved }
            }
            Err(e) => {
                error!(task = task.name(), "Background task failed: {}", e);
                TaskOutcome::Failed {
                    error: e.to_string(),
                }
            }
        }
    }

    async fn run_batch(store: &Arc<DocumentStore>, tasks: Vec<BoxedTask>) {
        for task in tasks {
            Self::execute_task(store, task.as_ref()).await;
        }
    }
}
