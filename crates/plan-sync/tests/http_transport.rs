//! Functional tests for the HTTP transport against an in-test plan server.
//!
//! The server is a warp filter over [`MemoryPlanStore`] that speaks the
//! store protocol: `GET`/`PUT /plan/{name}?tenantId=..` with `if-match`.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use plan_model::{PlanEdit, PlanHash};
use plan_sync::{
    ConflictBody, EditSession, ErrorBody, HttpPlanTransport, MemoryPlanStore, PlanEnvelope,
    PlanLocator, PlanTransport, SaveOutcome, SyncConfig, TransportError, WriteError, WriteRequest,
    CONFLICT_CODE,
};
use plan_test_utils::{abc_plan, TENANT};
use pretty_assertions::assert_eq;
use serde::{Deserialize, Serialize};
use warp::http::StatusCode;
use warp::reply::{Json, WithStatus};
use warp::Filter;

#[derive(Debug, Deserialize)]
struct TenantQuery {
    #[serde(rename = "tenantId")]
    tenant_id: String,
}

fn reply(status: StatusCode, body: &impl Serialize) -> WithStatus<Json> {
    warp::reply::with_status(warp::reply::json(body), status)
}

fn error(status: StatusCode, code: &str) -> WithStatus<Json> {
    reply(status, &ErrorBody { error: code.to_string() })
}

fn envelope(stored: &plan_sync::StoredPlan) -> WithStatus<Json> {
    match PlanEnvelope::from_stored(stored) {
        Ok(envelope) => reply(StatusCode::OK, &envelope),
        Err(_) => error(StatusCode::INTERNAL_SERVER_ERROR, "encode_failed"),
    }
}

async fn get_plan(
    name: String,
    query: TenantQuery,
    store: Arc<MemoryPlanStore>,
) -> Result<WithStatus<Json>, warp::Rejection> {
    let locator = PlanLocator::new(query.tenant_id, name);
    Ok(match store.fetch_current(&locator).await {
        Ok(stored) => envelope(&stored),
        Err(_) => error(StatusCode::NOT_FOUND, "not_found"),
    })
}

async fn put_plan(
    name: String,
    query: TenantQuery,
    if_match: Option<String>,
    body: WriteRequest,
    store: Arc<MemoryPlanStore>,
) -> Result<WithStatus<Json>, warp::Rejection> {
    let locator = PlanLocator::new(query.tenant_id, name);
    let Some(raw) = if_match else {
        return Ok(error(StatusCode::PRECONDITION_REQUIRED, "missing_if_match"));
    };
    let Ok(expected) = raw.parse::<PlanHash>() else {
        return Ok(error(StatusCode::BAD_REQUEST, "invalid_if_match"));
    };
    Ok(match store.write_if_match(&locator, &body.plan, &expected).await {
        Ok(stored) => envelope(&stored),
        Err(WriteError::Conflict { current_hash }) => reply(
            StatusCode::PRECONDITION_FAILED,
            &ConflictBody {
                error: CONFLICT_CODE.to_string(),
                plan_hash: current_hash,
            },
        ),
        Err(WriteError::Invalid(_)) => error(StatusCode::UNPROCESSABLE_ENTITY, "invalid_plan"),
        Err(WriteError::Rejected { status, code }) => error(
            StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            &code,
        ),
        Err(WriteError::Transport(_)) => error(StatusCode::NOT_FOUND, "not_found"),
    })
}

fn spawn_store_server(store: Arc<MemoryPlanStore>) -> SocketAddr {
    let with_store = warp::any().map(move || Arc::clone(&store));
    let get = warp::get()
        .and(warp::path!("plan" / String))
        .and(warp::query::<TenantQuery>())
        .and(with_store.clone())
        .and_then(get_plan);
    let put = warp::put()
        .and(warp::path!("plan" / String))
        .and(warp::query::<TenantQuery>())
        .and(warp::header::optional::<String>("if-match"))
        .and(warp::body::json())
        .and(with_store)
        .and_then(put_plan);

    let (addr, server) = warp::serve(get.or(put)).bind_ephemeral(([127, 0, 0, 1], 0));
    tokio::spawn(server);
    addr
}

macro_rules! spawn_raw_server {
    ($filter:expr $(,)?) => {{
        let (addr, server) = warp::serve($filter).bind_ephemeral(([127, 0, 0, 1], 0));
        tokio::spawn(server);
        addr
    }};
}

fn transport(addr: SocketAddr) -> HttpPlanTransport {
    let config = SyncConfig::new()
        .with_base_url(format!("http://{addr}"))
        .with_timeout_ms(2_000);
    HttpPlanTransport::new(&config).unwrap()
}

fn seeded() -> (Arc<MemoryPlanStore>, PlanLocator) {
    let locator = PlanLocator::default_for(TENANT);
    let store = MemoryPlanStore::seeded(locator.clone(), abc_plan()).unwrap();
    (Arc::new(store), locator)
}

#[tokio::test]
async fn fetch_returns_store_state() {
    let (store, locator) = seeded();
    let client = transport(spawn_store_server(Arc::clone(&store)));

    let fetched = client.fetch_current(&locator).await.unwrap();

    assert_eq!(fetched, store.current(&locator).unwrap());
    assert_eq!(PlanHash::of_plan(&fetched.plan).unwrap(), fetched.hash);
}

#[tokio::test]
async fn unknown_tenant_is_not_found() {
    let (store, _) = seeded();
    let client = transport(spawn_store_server(store));

    let err = client
        .fetch_current(&PlanLocator::default_for("globex"))
        .await
        .unwrap_err();
    assert!(matches!(err, TransportError::NotFound(_)));
}

#[tokio::test]
async fn matching_write_returns_new_version() {
    let (store, locator) = seeded();
    let client = transport(spawn_store_server(Arc::clone(&store)));
    let before = client.fetch_current(&locator).await.unwrap();
    let edited = PlanEdit::SwapBlocks { a: "a".into(), b: "c".into() }
        .apply(&before.plan)
        .unwrap();

    let after = client
        .write_if_match(&locator, &edited, &before.hash)
        .await
        .unwrap();

    assert_ne!(after.hash, before.hash);
    assert_eq!(after.plan.keys(), vec!["c", "b", "a"]);
    assert_eq!(store.current(&locator).unwrap(), after);
}

#[tokio::test]
async fn stale_write_maps_412_to_conflict() {
    let (store, locator) = seeded();
    let client = transport(spawn_store_server(Arc::clone(&store)));
    let before = client.fetch_current(&locator).await.unwrap();
    let winner = client
        .write_if_match(&locator, &before.plan, &before.hash)
        .await
        .unwrap();

    let err = client
        .write_if_match(&locator, &before.plan, &before.hash)
        .await
        .unwrap_err();

    match err {
        WriteError::Conflict { current_hash } => assert_eq!(current_hash, winner.hash),
        other => panic!("expected conflict, got {other:?}"),
    }
}

#[tokio::test]
async fn invalid_write_is_rejected_with_code() {
    let (store, locator) = seeded();
    let client = transport(spawn_store_server(Arc::clone(&store)));
    let before = client.fetch_current(&locator).await.unwrap();
    let mut invalid = before.plan.clone();
    invalid.title.clear();

    let err = client
        .write_if_match(&locator, &invalid, &before.hash)
        .await
        .unwrap_err();

    match err {
        WriteError::Rejected { status, code } => {
            assert_eq!(status, 422);
            assert_eq!(code, "invalid_plan");
        }
        other => panic!("expected rejection, got {other:?}"),
    }
    assert_eq!(store.write_count(), 0);
}

#[tokio::test]
async fn two_sessions_over_http() {
    let (store, locator) = seeded();
    let addr = spawn_store_server(Arc::clone(&store));
    let first = EditSession::open(transport(addr), locator.clone()).await.unwrap();
    let second = EditSession::open(transport(addr), locator.clone()).await.unwrap();

    first
        .apply(&PlanEdit::MoveBlock { key: "b".into(), to: 0 })
        .unwrap();
    let h1 = first.save().await.unwrap().reference().hash;

    second
        .apply(&PlanEdit::MoveBlock { key: "c".into(), to: 1 })
        .unwrap();
    let SaveOutcome::Conflicted(report) = second.save().await.unwrap() else {
        panic!("expected conflict");
    };

    assert_eq!(report.current_hash, h1);
    assert_eq!(second.reference_hash(), h1);
    assert_eq!(second.local_plan().keys(), vec!["b", "a", "c"]);
}

#[tokio::test]
async fn non_json_body_is_malformed() {
    let addr = spawn_raw_server!(warp::any().map(|| "definitely not a plan"));
    let err = transport(addr)
        .fetch_current(&PlanLocator::default_for(TENANT))
        .await
        .unwrap_err();
    assert!(matches!(err, TransportError::MalformedResponse(_)));
}

#[tokio::test]
async fn server_error_without_body_is_status() {
    let addr = spawn_raw_server!(
        warp::any().map(|| warp::reply::with_status("", StatusCode::INTERNAL_SERVER_ERROR)),
    );
    let client = transport(addr);
    let locator = PlanLocator::default_for(TENANT);

    let fetch = client.fetch_current(&locator).await.unwrap_err();
    assert!(matches!(fetch, TransportError::Status { status: 500, code: None }));

    let write = client
        .write_if_match(&locator, &abc_plan(), &PlanHash::compute(b"h0"))
        .await
        .unwrap_err();
    assert!(matches!(
        write,
        WriteError::Transport(TransportError::Status { status: 500, code: None })
    ));
}

#[tokio::test]
async fn error_code_is_surfaced_on_write() {
    let addr = spawn_raw_server!(warp::any().map(|| {
        reply(StatusCode::SERVICE_UNAVAILABLE, &ErrorBody { error: "maintenance".into() })
    }));
    let err = transport(addr)
        .write_if_match(
            &PlanLocator::default_for(TENANT),
            &abc_plan(),
            &PlanHash::compute(b"h0"),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, WriteError::Rejected { status: 503, ref code } if code == "maintenance"));
}

#[tokio::test]
async fn slow_store_times_out() {
    let addr = spawn_raw_server!(warp::any().and_then(|| async {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok::<_, warp::Rejection>("late")
    }));
    let config = SyncConfig::new()
        .with_base_url(format!("http://{addr}"))
        .with_timeout_ms(50);
    let client = HttpPlanTransport::new(&config).unwrap();

    let err = client
        .fetch_current(&PlanLocator::default_for(TENANT))
        .await
        .unwrap_err();
    match err {
        TransportError::Request(inner) => assert!(inner.is_timeout()),
        other => panic!("expected timeout, got {other:?}"),
    }
}
