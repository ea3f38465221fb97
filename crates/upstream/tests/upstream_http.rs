use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use chrono::{TimeZone, Utc};
use reviewdesk_core::config::UpstreamConfig;
use reviewdesk_core::gateway::{DecisionGateway, DecisionPayload, GatewayError, RequestFeed};
use reviewdesk_core::{
    load_snapshot, ActionDispatcher, ActionStamp, AdminAction, DispatchError, FixedClock,
    RequestId, ReviewConsole, ReviewStatus, Session,
};
use reviewdesk_upstream::HttpUpstream;
use rust_decimal::Decimal;
use secrecy::SecretString;
use serde_json::{json, Value};
use tokio::sync::RwLock;

#[derive(Clone, Default)]
struct Backend {
    decision_reply: Arc<Mutex<Value>>,
    fetches: Arc<Mutex<Vec<(Option<String>, Value)>>>,
    decisions: Arc<Mutex<Vec<Value>>>,
}

impl Backend {
    fn replying(decision_reply: Value) -> Self {
        Self { decision_reply: Arc::new(Mutex::new(decision_reply)), ..Self::default() }
    }
}

async fn fetch_handler(
    State(backend): State<Backend>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    let auth = headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .map(ToString::to_string);
    backend.fetches.lock().expect("fetch log").push((auth, body));
    Json(json!([{
        "success": true,
        "requestId": "corr-42",
        "data": [
            {
                "requestId": 7,
                "createdAt": "2025-08-07T07:07:13.000+0000",
                "customerName": "Shree Traders",
                "campaignType": "Monsoon",
                "skuName": "Cattle Feed 50kg",
                "discountType": "Re 1 per kg",
                "discountValue": "40",
                "orderQty": 40,
                "isEligible": 1
            },
            { "customerName": "missing id" }
        ]
    }]))
}

async fn decision_handler(State(backend): State<Backend>, Json(body): Json<Value>) -> Json<Value> {
    backend.decisions.lock().expect("decision log").push(body);
    Json(backend.decision_reply.lock().expect("reply").clone())
}

async fn failing_handler() -> (StatusCode, &'static str) {
    (StatusCode::BAD_GATEWAY, "upstream workflow engine unavailable")
}

async fn serve(backend: Backend) -> String {
    let router = Router::new()
        .route("/fetch", post(fetch_handler))
        .route("/decision", post(decision_handler))
        .route("/broken", post(failing_handler))
        .with_state(backend);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind mock backend");
    let address = listener.local_addr().expect("mock address");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("mock backend");
    });
    format!("http://{address}")
}

fn upstream(base: &str, fetch: &str, decision: &str) -> HttpUpstream {
    HttpUpstream::from_config(&UpstreamConfig {
        fetch_url: format!("{base}{fetch}"),
        decision_url: format!("{base}{decision}"),
        timeout_secs: 5,
        auth_token: Some(SecretString::from("backend-token".to_string())),
    })
    .expect("client")
}

fn clock() -> FixedClock {
    FixedClock(Utc.with_ymd_and_hms(2025, 8, 9, 3, 40, 13).single().expect("instant"))
}

#[tokio::test]
async fn fetch_posts_username_with_bearer_token() {
    let backend = Backend::default();
    let base = serve(backend.clone()).await;
    let upstream = upstream(&base, "/fetch", "/decision");

    let session = Session::new("ops.admin").expect("session");
    let snapshot = load_snapshot(&upstream, &session).await.expect("snapshot");

    assert_eq!(snapshot.request_id.as_deref(), Some("corr-42"));
    assert_eq!(snapshot.requests.len(), 1);
    assert_eq!(snapshot.skipped.len(), 1);
    assert_eq!(snapshot.requests[0].title, "Monsoon - Cattle Feed 50kg");

    let fetches = backend.fetches.lock().expect("fetch log").clone();
    assert_eq!(fetches.len(), 1);
    assert_eq!(fetches[0].0.as_deref(), Some("Bearer backend-token"));
    assert_eq!(fetches[0].1, json!({ "username": "ops.admin" }));
}

#[tokio::test]
async fn non_success_status_is_reported_with_body() {
    let base = serve(Backend::default()).await;
    let upstream = upstream(&base, "/broken", "/broken");

    let error = upstream.fetch("ops.admin").await.expect_err("bad gateway");

    assert_eq!(
        error,
        GatewayError::Status {
            status: 502,
            body: "upstream workflow engine unavailable".to_string()
        }
    );
    assert!(!error.is_connectivity());
}

#[tokio::test]
async fn unreachable_backend_is_a_connectivity_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let address = listener.local_addr().expect("address");
    drop(listener);
    let upstream = upstream(&format!("http://{address}"), "/fetch", "/decision");

    let error = upstream.fetch("ops.admin").await.expect_err("nothing listening");

    assert!(error.is_connectivity(), "unexpected error: {error:?}");
}

#[tokio::test]
async fn modification_payload_uses_backend_field_names() {
    let backend = Backend::replying(json!({ "success": true, "message": "saved" }));
    let base = serve(backend.clone()).await;
    let upstream = upstream(&base, "/fetch", "/decision");
    let action = AdminAction::modify("Rs 0.75 per kg", Decimal::new(3000, 2)).expect("action");
    let payload = DecisionPayload::new(
        &RequestId::from_number(7),
        "ops.admin",
        &ActionStamp::at(clock().0),
        &action,
    )
    .expect("payload");

    let ack = upstream.submit(&payload).await.expect("ack");

    assert_eq!(ack.message.as_deref(), Some("saved"));
    let decisions = backend.decisions.lock().expect("decision log").clone();
    assert_eq!(
        decisions,
        vec![json!({
            "RequestId": "7",
            "AdminUsername": "ops.admin",
            "AdminReviewedAt": "2025-08-09 09:10:13",
            "AdminStatus": "MODIFIED",
            "adminDiscountType": "Rs 0.75 per kg",
            "adminDiscountValue": 30.0
        })]
    );
}

async fn dispatch_against(reply: Value) -> (ActionDispatcher<HttpUpstream, FixedClock>, Backend) {
    let backend = Backend::replying(reply);
    let base = serve(backend.clone()).await;
    let upstream = upstream(&base, "/fetch", "/decision");
    let session = Session::new("ops.admin").expect("session");
    let snapshot = load_snapshot(&upstream, &session).await.expect("snapshot");
    let console = Arc::new(RwLock::new(ReviewConsole::from_snapshot(snapshot)));
    (ActionDispatcher::new(console, upstream, session, clock()), backend)
}

#[tokio::test]
async fn refused_decision_keeps_request_pending_and_actionable() {
    let (dispatcher, backend) =
        dispatch_against(json!({ "success": false, "message": "locked" })).await;
    let id = RequestId::from_number(7);
    let before = dispatcher.console().read().await.get(&id).map(|request| request.status);
    assert_eq!(before, Some(ReviewStatus::Pending));

    let error = dispatcher.approve(&id).await.expect_err("refused");

    assert!(matches!(
        error,
        DispatchError::Gateway { source: GatewayError::Rejected { ref message }, .. }
            if message == "locked"
    ));
    let console = dispatcher.console().read().await;
    assert_eq!(console.get(&id).map(|request| request.status), before);
    assert!(console.is_actionable(&id));
    assert_eq!(backend.decisions.lock().expect("decision log").len(), 1);
}

#[tokio::test]
async fn accepted_decision_marks_request_acted_with_turnaround() {
    let (dispatcher, _backend) = dispatch_against(json!({ "success": true })).await;
    let id = RequestId::from_number(7);

    let updated = dispatcher.approve(&id).await.expect("approved");

    assert_eq!(updated.status, ReviewStatus::Accepted);
    let tat = updated.tat.expect("turnaround");
    assert!(tat.is_duration());
    assert_eq!(tat.to_string(), "2 days, 2 hours, 3 minutes");
    assert!(!dispatcher.console().read().await.is_actionable(&id));
}
