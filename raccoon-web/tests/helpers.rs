//! Integration test helpers
//!
//! Builds the app on top of an in-memory backend that counts the calls it gets,
//! so tests can assert what reached the store.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{HeaderMap, Method, Request, StatusCode};
use axum::Router;
use parking_lot::Mutex;
use raccoon_core::RaccoonConfig;
use raccoon_store::{
    BatchCommand, ConnectionString, IndexDefinition, MemoryBackend, StoreBackend, StoreConnector,
    StoreError, StoreResult, StoredDocument, TransportErrorKind,
};
use raccoon_web::{create_app, AppState, Bootstrapper};
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, LazyLock};
use tower::ServiceExt;

// Ensure tracing is only initialized once
static TRACING: LazyLock<()> = LazyLock::new(|| {
    if std::env::var("TEST_LOG").is_ok() {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .finish();
        tracing::subscriber::set_global_default(subscriber).ok();
    } else {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_writer(std::io::sink)
            .finish();
        tracing::subscriber::set_global_default(subscriber).ok();
    }
});

/// Memory backend that records every call
#[derive(Default)]
pub struct CountingBackend {
    pub inner: MemoryBackend,
    pub batches: AtomicUsize,
    pub index_calls: AtomicUsize,
    index_failure: Mutex<Option<TransportErrorKind>>,
}

impl CountingBackend {
    /// Fail every index creation with a transport error of `kind`
    pub fn fail_indexes_with(&self, kind: TransportErrorKind) {
        *self.index_failure.lock() = Some(kind);
    }

    pub fn batches(&self) -> usize {
        self.batches.load(Ordering::SeqCst)
    }

    pub fn index_calls(&self) -> usize {
        self.index_calls.load(Ordering::SeqCst)
    }

    pub async fn document(&self, id: &str) -> Option<Value> {
        self.inner.load(id).await.unwrap().map(|d| d.body)
    }
}

#[async_trait]
impl StoreBackend for CountingBackend {
    fn name(&self) -> &'static str {
        "counting"
    }

    async fn load(&self, id: &str) -> StoreResult<Option<StoredDocument>> {
        self.inner.load(id).await
    }

    async fn batch(&self, commands: &[BatchCommand]) -> StoreResult<()> {
        self.batches.fetch_add(1, Ordering::SeqCst);
        self.inner.batch(commands).await
    }

    async fn put_index(&self, index: &IndexDefinition) -> StoreResult<()> {
        self.index_calls.fetch_add(1, Ordering::SeqCst);
        let failure = *self.index_failure.lock();
        if let Some(kind) = failure {
            return Err(StoreError::transport(kind, format!("{} while creating {}", kind, index.name)));
        }
        self.inner.put_index(index).await
    }

    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }
}

/// Connector handing out the same backend, counting connections
pub struct TestConnector {
    pub backend: Arc<CountingBackend>,
    pub connects: AtomicUsize,
}

impl TestConnector {
    pub fn new(backend: Arc<CountingBackend>) -> Self {
        Self {
            backend,
            connects: AtomicUsize::new(0),
        }
    }

    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StoreConnector for TestConnector {
    async fn connect(&self, _connection: &ConnectionString) -> StoreResult<Arc<dyn StoreBackend>> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        Ok(self.backend.clone())
    }
}

/// Test application instance
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub backend: Arc<CountingBackend>,
    pub connector: Arc<TestConnector>,
    pub bootstrapper: Bootstrapper,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
    pub text: String,
}

impl TestApp {
    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> TestResponse {
        send(&self.router, method, uri, body).await
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.request(Method::GET, uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> TestResponse {
        self.request(Method::POST, uri, Some(body)).await
    }

    /// Create a published post and return its key
    pub async fn create_post(&self, title: &str) -> String {
        let response = self
            .post(
                "/admin/posts",
                serde_json::json!({
                    "title": title,
                    "body": "Post body",
                    "tags": ["raven"],
                }),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.text);
        response.body["id"].as_str().unwrap().to_string()
    }

    /// Wait for every task queued so far to finish
    pub async fn drain_tasks(&self) {
        self.state.tasks.shutdown().await;
    }
}

pub async fn send(router: &Router, method: Method, uri: &str, body: Option<Value>) -> TestResponse {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).unwrap())
        }
        None => Body::empty(),
    };

    let response = router
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8_lossy(&bytes).to_string();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

    TestResponse {
        status,
        headers,
        body,
        text,
    }
}

pub fn bootstrapper(backend: Arc<CountingBackend>) -> (Bootstrapper, Arc<TestConnector>) {
    LazyLock::force(&TRACING);
    let connector = Arc::new(TestConnector::new(backend));
    let bootstrapper = Bootstrapper::with_connector(RaccoonConfig::default(), connector.clone());
    (bootstrapper, connector)
}

/// Start the app against a fresh counting backend
pub async fn spawn_app() -> TestApp {
    spawn_app_with(Arc::new(CountingBackend::default()), create_app).await
}

/// Start the app with a custom router built from the state
pub async fn spawn_app_with(
    backend: Arc<CountingBackend>,
    build: impl FnOnce(AppState) -> Router,
) -> TestApp {
    let (bootstrapper, connector) = bootstrapper(backend.clone());
    let state = bootstrapper.start().await.expect("Failed to start app");
    let router = build(state.clone());

    TestApp {
        router,
        state,
        backend,
        connector,
        bootstrapper,
    }
}
