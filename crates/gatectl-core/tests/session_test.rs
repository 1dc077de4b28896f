#![allow(clippy::unwrap_used)]
// Integration tests for `Session` against a wiremock management API.

use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use gatectl_core::{
    CoreError, Edit, EditError, EditPhase, FailureReason, GatewayMode, ListenerRef, Route,
    RouteLocator, RouteRef, RouteSpec, Selection, Session, SessionConfig, Target, TargetKind,
    WriteMode,
};

// ── Helpers ─────────────────────────────────────────────────────────

fn document() -> Value {
    json!({
        "binds": [{
            "port": 8080,
            "listeners": [{ "name": "default", "protocol": "HTTP", "routes": [] }]
        }],
        "targets": [{ "name": "everything", "listeners": ["default"], "stdio": { "cmd": "npx" } }]
    })
}

async fn setup(write_mode: WriteMode) -> (MockServer, Session) {
    let server = MockServer::start().await;
    let mut config = SessionConfig::new(Url::parse(&server.uri()).unwrap());
    config.write_mode = write_mode;
    let session = Session::new(config).unwrap();
    (server, session)
}

async fn mount_config(server: &MockServer, body: Value) {
    Mock::given(method("GET"))
        .and(path("/config"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

fn add_route_edit() -> Edit {
    Edit::AddRoute {
        port: 8080,
        listener: "default".into(),
        route: RouteSpec::Http(Route {
            hostnames: vec!["*".into()],
            ..Route::default()
        }),
    }
}

// ── Happy path ──────────────────────────────────────────────────────

#[tokio::test]
async fn test_edit_persists_whole_document_and_reconciles() {
    let (server, session) = setup(WriteMode::Document).await;

    let mut updated = document();
    updated["binds"][0]["listeners"][0]["routes"] = json!([{ "hostnames": ["*"] }]);

    Mock::given(method("GET"))
        .and(path("/config"))
        .respond_with(ResponseTemplate::new(200).set_body_json(document()))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_config(&server, updated.clone()).await;
    Mock::given(method("POST"))
        .and(path("/config"))
        .and(wiremock::matchers::body_json(updated))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = session.apply(add_route_edit()).await.unwrap();

    assert!(outcome.reconciled);
    assert_eq!(session.phase(), EditPhase::Idle);
    assert_eq!(session.mode().get(), GatewayMode::Local);
    let snapshot = session.snapshot().unwrap();
    assert_eq!(
        snapshot.binds[0].listeners[0].routes.as_ref().unwrap().len(),
        1
    );
}

#[tokio::test]
async fn test_new_route_keeps_its_id_through_reconcile() {
    let (server, session) = setup(WriteMode::Document).await;

    let mut updated = document();
    updated["binds"][0]["listeners"][0]["routes"] = json!([{ "hostnames": ["*"] }]);
    Mock::given(method("GET"))
        .and(path("/config"))
        .respond_with(ResponseTemplate::new(200).set_body_json(document()))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_config(&server, updated).await;
    Mock::given(method("POST"))
        .and(path("/config"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let edit = add_route_edit();
    let Edit::AddRoute { route, .. } = &edit else {
        unreachable!()
    };
    let id = route.id();

    let outcome = session.apply(edit).await.unwrap();
    let at = RouteLocator::http(8080, "default", RouteRef::Id(id));
    assert!(outcome.config.find_route(&at).is_ok());
}

// ── Failure phases ──────────────────────────────────────────────────

#[tokio::test]
async fn test_fetch_failure_changes_nothing() {
    let (server, session) = setup(WriteMode::Document).await;

    Mock::given(method("GET"))
        .and(path("/config"))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/config"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = session.apply(add_route_edit()).await.unwrap_err();
    assert!(matches!(err, CoreError::Fetch { .. }), "got: {err:?}");
    assert_eq!(err.reason(), Some(FailureReason::Rejected));
    assert_eq!(session.phase(), EditPhase::Failed);
    assert!(session.snapshot().is_none());
}

#[tokio::test]
async fn test_edit_failure_is_not_persisted() {
    let (server, session) = setup(WriteMode::Document).await;

    mount_config(&server, document()).await;
    Mock::given(method("POST"))
        .and(path("/config"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let err = session
        .apply(Edit::AddRoute {
            port: 8080,
            listener: "missing".into(),
            route: RouteSpec::Http(Route::default()),
        })
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        CoreError::Edit(EditError::ListenerNotFound { .. })
    ));
    assert_eq!(session.phase(), EditPhase::Failed);
}

#[tokio::test]
async fn test_persist_failure_keeps_last_known_document() {
    let (server, session) = setup(WriteMode::Document).await;

    mount_config(&server, document()).await;
    Mock::given(method("POST"))
        .and(path("/config"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!("invalid route")))
        .mount(&server)
        .await;

    let (before, _) = session.refresh().await.unwrap();
    let err = session.apply(add_route_edit()).await.unwrap_err();

    match &err {
        CoreError::Persist { reason, message } => {
            assert_eq!(*reason, FailureReason::Rejected);
            assert!(message.contains("invalid route"));
        }
        other => panic!("expected Persist, got: {other:?}"),
    }
    assert_eq!(*session.snapshot().unwrap(), *before);
}

#[tokio::test]
async fn test_reconcile_failure_keeps_applied_document() {
    let (server, session) = setup(WriteMode::Document).await;

    Mock::given(method("GET"))
        .and(path("/config"))
        .respond_with(ResponseTemplate::new(200).set_body_json(document()))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/config"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/config"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let outcome = session.apply(add_route_edit()).await.unwrap();
    assert!(!outcome.reconciled);
    assert_eq!(
        outcome.config.binds[0].listeners[0].routes.as_ref().unwrap().len(),
        1
    );
}

// ── Mode ────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_xds_mode_is_read_only() {
    let (server, session) = setup(WriteMode::Document).await;

    Mock::given(method("GET"))
        .and(path("/config"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!("local config not setup")))
        .expect(1)
        .mount(&server)
        .await;

    assert_eq!(session.probe_mode().await.unwrap(), GatewayMode::Xds);
    assert!(session.mode().get().is_read_only());

    // Refused before any request is made.
    let err = session.apply(add_route_edit()).await.unwrap_err();
    assert!(matches!(err, CoreError::ReadOnly));
}

// ── Concurrency / cancellation ──────────────────────────────────────

#[tokio::test]
async fn test_cancel_mid_fetch() {
    let (server, session) = setup(WriteMode::Document).await;

    Mock::given(method("GET"))
        .and(path("/config"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(document())
                .set_delay(Duration::from_secs(10)),
        )
        .mount(&server)
        .await;

    let token = CancellationToken::new();
    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        canceller.cancel();
    });

    let err = session
        .apply_with(add_route_edit(), &token)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Cancelled));
    assert_eq!(session.phase(), EditPhase::Idle);
    assert!(session.snapshot().is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_second_edit_while_busy_is_refused() {
    let (server, session) = setup(WriteMode::Document).await;

    Mock::given(method("GET"))
        .and(path("/config"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(document())
                .set_delay(Duration::from_secs(10)),
        )
        .mount(&server)
        .await;

    let mut phase = session.subscribe_phase();
    let first = {
        let session = session.clone();
        tokio::spawn(async move { session.apply(add_route_edit()).await })
    };
    phase.wait_for(|p| p.is_busy()).await.unwrap();
    assert!(session.is_busy());

    let err = session.apply(add_route_edit()).await.unwrap_err();
    assert!(matches!(err, CoreError::EditInProgress));

    session.cancel();
    assert!(matches!(first.await.unwrap(), Err(CoreError::Cancelled)));
}

#[tokio::test]
async fn test_cancel_after_persist_keeps_applied_document() {
    let (server, session) = setup(WriteMode::Document).await;

    Mock::given(method("GET"))
        .and(path("/config"))
        .respond_with(ResponseTemplate::new(200).set_body_json(document()))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/config"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(document())
                .set_delay(Duration::from_secs(10)),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/config"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let token = CancellationToken::new();
    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        canceller.cancel();
    });

    let outcome = session.apply_with(add_route_edit(), &token).await.unwrap();
    assert!(!outcome.reconciled);
    assert_eq!(session.phase(), EditPhase::Idle);
    let snapshot = session.snapshot().unwrap();
    let routes = snapshot.binds[0].listeners[0].routes.as_ref().unwrap();
    assert_eq!(routes.len(), 1);
    assert_eq!(routes[0].hostnames, vec!["*".to_owned()]);
}

// ── Selection ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_reconcile_prunes_stale_selection() {
    let (server, session) = setup(WriteMode::Document).await;

    // Foreign editor already removed listener "default" on the server.
    let foreign = json!({ "binds": [{ "port": 9000, "listeners": [{ "name": "other" }] }] });
    mount_config(&server, foreign).await;
    Mock::given(method("POST"))
        .and(path("/config"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    session
        .select(Selection {
            listener: Some(ListenerRef {
                port: 8080,
                name: "default".into(),
            }),
            route: Some(RouteLocator::http(8080, "default", RouteRef::Index(0))),
            target: None,
        })
        .await;

    let outcome = session
        .apply(Edit::AddTarget {
            target: Target::new("fresh", TargetKind::Mcp, json!({ "targets": [] })),
        })
        .await
        .unwrap();
    assert!(outcome.selection_cleared);
    assert_eq!(session.selection().await, Selection::default());
}

// ── Endpoint writes ─────────────────────────────────────────────────

#[tokio::test]
async fn test_endpoint_mode_uses_target_endpoints() {
    let (server, session) = setup(WriteMode::Endpoints).await;

    mount_config(&server, document()).await;
    Mock::given(method("POST"))
        .and(path("/targets/a2a"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/targets/mcp/everything"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/config"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let mut agent = Target::new("agent", TargetKind::A2a, json!({ "host": "h", "port": 1 }));
    agent.listeners = Some(vec!["default".into()]);
    session.apply(Edit::AddTarget { target: agent }).await.unwrap();
    session
        .apply(Edit::DeleteTarget {
            name: "everything".into(),
        })
        .await
        .unwrap();
}

#[tokio::test]
async fn test_endpoint_mode_creates_listener_via_bind_path() {
    let (server, session) = setup(WriteMode::Endpoints).await;

    mount_config(&server, document()).await;
    Mock::given(method("POST"))
        .and(path("/binds/9000/listeners"))
        .and(wiremock::matchers::body_json(json!({ "name": "tcp", "protocol": "TCP" })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    session
        .apply(Edit::AddListener {
            port: 9000,
            listener: gatectl_core::Listener::new("tcp", gatectl_core::Protocol::Tcp),
        })
        .await
        .unwrap();
}

// ── Reads ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_typed_projections() {
    let (server, session) = setup(WriteMode::Document).await;

    Mock::given(method("GET"))
        .and(path("/binds"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "port": 8080, "listeners": [{ "name": "default" }] }
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/listeners"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{ "name": "default", "protocol": "TLS" }])),
        )
        .mount(&server)
        .await;

    let binds = session.list_binds().await.unwrap();
    assert_eq!(binds[0].port, 8080);
    let listeners = session.list_listeners().await.unwrap();
    assert!(listeners[0].is_tcp_listener());
}

#[tokio::test]
async fn test_cancelled_projection_read() {
    let (server, session) = setup(WriteMode::Document).await;

    Mock::given(method("GET"))
        .and(path("/binds"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([]))
                .set_delay(Duration::from_secs(10)),
        )
        .mount(&server)
        .await;

    let token = CancellationToken::new();
    token.cancel();
    let err = session.list_binds_with(&token).await.unwrap_err();
    assert!(matches!(err, CoreError::Cancelled));
    let err = session.list_listeners_with(&token).await.unwrap_err();
    assert!(matches!(err, CoreError::Cancelled));
}
