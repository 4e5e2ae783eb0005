//! Startup sequence: run-once guarantees, the unreachable-database branch and
//! the versioning seed

mod helpers;

use axum::http::{header, StatusCode};
use helpers::{bootstrapper, send, spawn_app, CountingBackend};
use raccoon_core::RaccoonConfig;
use raccoon_store::{
    StoreError, TransportErrorKind, VersioningConfiguration, VERSIONING_CONFIGURATION_ID,
};
use raccoon_web::startup::{blog_indexes, NOT_REACHABLE_PAGE};
use raccoon_web::{create_app, Bootstrapper, StartupError, StoreAvailability};
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::test]
async fn test_start_twice_reuses_store_and_indexes() {
    let backend = Arc::new(CountingBackend::default());
    let (bootstrapper, connector) = bootstrapper(backend.clone());

    let first = bootstrapper.start().await.unwrap();
    let second = bootstrapper.start().await.unwrap();

    assert!(bootstrapper.is_initialized());
    assert_eq!(connector.connects(), 1);
    assert_eq!(backend.index_calls(), blog_indexes().len());
    assert!(Arc::ptr_eq(&first.store, &second.store));
    assert!(Arc::ptr_eq(&first.tasks, &second.tasks));
    assert!(Arc::ptr_eq(
        first.store.profiler().unwrap(),
        second.store.profiler().unwrap()
    ));

    // The seed is written on every start
    assert_eq!(backend.batches(), 2);
    first.tasks.shutdown().await;
}

#[tokio::test]
async fn test_seeded_configuration_excludes_versioning() {
    let app = spawn_app().await;

    // Tamper with the seed, then start again
    let mut session = app.state.store.open_session();
    session
        .store(&VersioningConfiguration {
            exclude: false,
            id: VERSIONING_CONFIGURATION_ID.to_string(),
        })
        .unwrap();
    session.save_changes().await.unwrap();

    app.bootstrapper.start().await.unwrap();

    let seeded = app.backend.document(VERSIONING_CONFIGURATION_ID).await.unwrap();
    assert_eq!(
        seeded,
        serde_json::json!({ "Exclude": true, "Id": "Raven/Versioning/DefaultConfiguration" })
    );
}

#[tokio::test]
async fn test_refused_connection_redirects_to_static_page() {
    let backend = Arc::new(CountingBackend::default());
    backend.fail_indexes_with(TransportErrorKind::ConnectionRefused);
    let (bootstrapper, _) = bootstrapper(backend.clone());

    let state = bootstrapper.start().await.unwrap();
    assert_eq!(
        state.availability,
        StoreAvailability::Unreachable(TransportErrorKind::ConnectionRefused)
    );
    // Nothing after index creation ran
    assert!(state.store.profiler().is_none());
    assert_eq!(backend.batches(), 0);

    let router = create_app(state);
    for uri in ["/posts/1", "/api/health", "/admin/profiler", "/no-such-page"] {
        let response = send(&router, axum::http::Method::GET, uri, None).await;
        assert_eq!(response.status, StatusCode::FOUND, "{}", uri);
        assert_eq!(
            response.headers.get(header::LOCATION).unwrap(),
            NOT_REACHABLE_PAGE
        );
    }

    let page = send(&router, axum::http::Method::GET, NOT_REACHABLE_PAGE, None).await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.text.contains("not reachable"));
    assert_eq!(backend.batches(), 0);
}

#[tokio::test]
async fn test_every_listed_transport_failure_degrades() {
    let listed = [
        TransportErrorKind::AddressNotAvailable,
        TransportErrorKind::NetworkDown,
        TransportErrorKind::NetworkUnreachable,
        TransportErrorKind::ConnectionAborted,
        TransportErrorKind::ConnectionReset,
        TransportErrorKind::TimedOut,
        TransportErrorKind::ConnectionRefused,
        TransportErrorKind::HostDown,
        TransportErrorKind::HostUnreachable,
        TransportErrorKind::HostNotFound,
    ];

    for kind in listed {
        let backend = Arc::new(CountingBackend::default());
        backend.fail_indexes_with(kind);
        let (bootstrapper, _) = bootstrapper(backend);

        let state = bootstrapper.start().await.unwrap();
        assert_eq!(state.availability, StoreAvailability::Unreachable(kind));
        state.tasks.shutdown().await;
    }
}

#[tokio::test]
async fn test_access_denied_aborts_startup() {
    let backend = Arc::new(CountingBackend::default());
    backend.fail_indexes_with(TransportErrorKind::AccessDenied);
    let (bootstrapper, _) = bootstrapper(backend.clone());

    let Err(err) = bootstrapper.start().await else {
        panic!("startup should fail when the database refuses access");
    };
    assert!(
        matches!(
            err,
            StartupError::Indexes(StoreError::Transport {
                kind: TransportErrorKind::AccessDenied,
                ..
            })
        ),
        "unexpected error: {:?}",
        err
    );
    assert_eq!(backend.batches(), 0);
}

#[tokio::test]
async fn test_unreachable_document_server_degrades() {
    // Bind and drop a listener to get a port nothing listens on
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    drop(listener);

    let mut config = RaccoonConfig::default();
    config.store.request_timeout_secs = 5;
    config.connection_strings.insert(
        "RavenDB".to_string(),
        format!("Url=http://{};Database=Blog", address),
    );

    let state = Bootstrapper::new(config).start().await.unwrap();
    assert_eq!(
        state.availability,
        StoreAvailability::Unreachable(TransportErrorKind::ConnectionRefused)
    );
    state.tasks.shutdown().await;
}
