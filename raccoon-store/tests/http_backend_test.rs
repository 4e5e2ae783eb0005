//! HTTP backend tests against a loopback document server

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use raccoon_store::{
    create_indexes, DefaultConnector, Document, DocumentStore, IndexDefinition, StoreError,
    TransportErrorKind,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

#[derive(Default)]
struct FakeServer {
    documents: Mutex<HashMap<String, Value>>,
    indexes: Mutex<HashMap<String, String>>,
    batches: Mutex<usize>,
}

type Shared = Arc<FakeServer>;

async fn get_doc(State(server): State<Shared>, Path(id): Path<String>) -> impl IntoResponse {
    let body = server.documents.lock().unwrap().get(&id).cloned();
    match body {
        Some(body) => Json(body).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn bulk_docs(State(server): State<Shared>, Json(commands): Json<Vec<Value>>) -> StatusCode {
    let mut documents = server.documents.lock().unwrap();
    for command in commands {
        let key = command["Key"].as_str().unwrap_or_default().to_string();
        match command["Method"].as_str() {
            Some("PUT") => {
                documents.insert(key, command["Document"].clone());
            }
            Some("DELETE") => {
                documents.remove(&key);
            }
            _ => return StatusCode::BAD_REQUEST,
        }
    }
    *server.batches.lock().unwrap() += 1;
    StatusCode::OK
}

async fn put_index(
    State(server): State<Shared>,
    Path(name): Path<String>,
    Json(body): Json<Value>,
) -> StatusCode {
    let map = body["Map"].as_str().unwrap_or_default().to_string();
    server.indexes.lock().unwrap().insert(name, map);
    StatusCode::CREATED
}

async fn spawn_fake_server() -> (String, Shared) {
    let server = Shared::default();
    let router = Router::new()
        .route("/databases/Blog/docs/{*id}", get(get_doc))
        .route("/databases/Blog/bulk_docs", post(bulk_docs))
        .route("/databases/Blog/indexes/{*name}", put(put_index))
        .route("/databases/Blog/stats", get(|| async { Json(serde_json::json!({})) }))
        .with_state(server.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    (format!("http://{}", address), server)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Tag {
    id: String,
    name: String,
}

impl Document for Tag {
    const COLLECTION: Option<&'static str> = Some("Tags");

    fn id(&self) -> &str {
        &self.id
    }
}

fn connector() -> DefaultConnector {
    DefaultConnector {
        request_timeout: Duration::from_secs(5),
    }
}

#[tokio::test]
async fn test_session_round_trip_over_http() {
    let (address, server) = spawn_fake_server().await;
    let connection = format!("Url={};Database=Blog", address).parse().unwrap();
    let store = Arc::new(DocumentStore::initialize(connection, &connector()).await.unwrap());

    let mut session = store.open_session();
    session
        .store(&Tag {
            id: "tags/rust".to_string(),
            name: "rust".to_string(),
        })
        .unwrap();
    session.delete("tags/old");
    assert_eq!(session.save_changes().await.unwrap(), 2);
    assert_eq!(*server.batches.lock().unwrap(), 1);

    let mut reader = store.open_session();
    let tag: Tag = reader.load("tags/rust").await.unwrap().unwrap();
    assert_eq!(tag.name, "rust");
    assert!(reader.load::<Tag>("tags/missing").await.unwrap().is_none());

    store.health_check().await.unwrap();
}

#[tokio::test]
async fn test_indexes_are_put_by_name() {
    let (address, server) = spawn_fake_server().await;
    let connection = format!("Url={};Database=Blog", address).parse().unwrap();
    let store = DocumentStore::initialize(connection, &connector()).await.unwrap();

    create_indexes(
        &store,
        &[
            IndexDefinition::new("Tags/Count", "Tags", &["Name"]),
            IndexDefinition::new("Users/ByEmail", "Users", &["Email"]),
        ],
    )
    .await
    .unwrap();

    let indexes = server.indexes.lock().unwrap();
    assert_eq!(indexes.len(), 2);
    assert_eq!(
        indexes.get("Users/ByEmail").map(String::as_str),
        Some("from doc in docs.Users select new { doc.Email }")
    );
}

#[tokio::test]
async fn test_refused_connection_is_a_transport_error() {
    // Nothing listens on the port once the listener is dropped
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    drop(listener);

    let connection = format!("Url=http://{};Database=Blog", address).parse().unwrap();
    let store = DocumentStore::initialize(connection, &connector()).await.unwrap();

    let err = store
        .execute_index(&IndexDefinition::new("Tags/Count", "Tags", &["Name"]))
        .await
        .unwrap_err();

    assert!(
        matches!(
            err,
            StoreError::Transport {
                kind: TransportErrorKind::ConnectionRefused,
                ..
            }
        ),
        "unexpected error: {:?}",
        err
    );
    assert!(err.is_unreachable());
}

#[tokio::test]
async fn test_unknown_host_is_host_not_found() {
    let connection = "Url=http://no-such-host.invalid:8080;Database=Blog"
        .parse()
        .unwrap();
    let store = DocumentStore::initialize(connection, &connector()).await.unwrap();

    let err = create_indexes(
        &store,
        &[IndexDefinition::new("Tags/Count", "Tags", &["Name"])],
    )
    .await
    .unwrap_err();

    assert_eq!(
        err.transport_kind(),
        Some(TransportErrorKind::HostNotFound),
        "unexpected error: {:?}",
        err
    );
    assert!(err.is_unreachable());
}
