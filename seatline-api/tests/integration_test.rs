use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use seatline_api::{app, AppState};
use seatline_core::{InventoryLayout, ManualClock, MemorySeatRepository, SeatLedger};
use seatline_store::app_config::BusinessRules;
use serde_json::Value;
use tower::ServiceExt;

struct TestApp {
    router: Router,
    clock: Arc<ManualClock>,
}

impl TestApp {
    async fn new(seats: u32, prefix: &str, hold_seconds: u64) -> Self {
        let ledger = Arc::new(SeatLedger::new(Arc::new(MemorySeatRepository::new())));
        ledger
            .initialize(&InventoryLayout::new(seats, prefix))
            .await
            .expect("Failed to seed inventory");

        let clock = Arc::new(ManualClock::new(0));
        let state = AppState {
            ledger,
            clock: clock.clone(),
            business_rules: BusinessRules {
                seat_hold_seconds: hold_seconds,
            },
        };

        Self {
            router: app(state),
            clock,
        }
    }

    async fn send(&self, method: &str, uri: &str) -> (StatusCode, Value) {
        let response = self
            .router
            .clone()
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }
}

fn status_of<'a>(seats: &'a Value, label: &str) -> &'a str {
    seats
        .as_array()
        .unwrap()
        .iter()
        .find(|s| s["label"] == label)
        .unwrap()["status"]
        .as_str()
        .unwrap()
}

#[tokio::test]
async fn test_list_seats_in_order() {
    let app = TestApp::new(200, "A", 30).await;

    let (status, body) = app.send("GET", "/api/seats").await;
    assert_eq!(status, StatusCode::OK);

    let seats = body.as_array().unwrap();
    assert_eq!(seats.len(), 200);
    assert_eq!(seats[0]["id"], 1);
    assert_eq!(seats[0]["label"], "A1");
    assert_eq!(seats[0]["status"], "AVAILABLE");
    assert_eq!(seats[199]["label"], "A200");
    assert!(seats[0].get("hold_deadline").is_none());
}

#[tokio::test]
async fn test_reserve_then_purchase_flow() {
    let app = TestApp::new(3, "S", 30).await;

    // t=0 reserve S1
    let (status, body) = app.send("POST", "/api/seats/S1/reserve").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "RESERVED");
    assert_eq!(body["hold_deadline"], 30);
    assert_eq!(body["hold_seconds"], 30);

    // t=10 purchase S1, reserve S2
    app.clock.set(10);
    let (status, body) = app.send("POST", "/api/seats/S1/purchase").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "SOLD");

    let (status, body) = app.send("POST", "/api/seats/S2/reserve").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["hold_deadline"], 40);

    // t=41 S2 has lapsed
    app.clock.set(41);
    let (status, seats) = app.send("GET", "/api/seats").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(status_of(&seats, "S1"), "SOLD");
    assert_eq!(status_of(&seats, "S2"), "AVAILABLE");
    assert_eq!(status_of(&seats, "S3"), "AVAILABLE");

    let (status, body) = app.send("POST", "/api/seats/S2/reserve").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["hold_deadline"], 71);
}

#[tokio::test]
async fn test_conflicts_report_current_status() {
    let app = TestApp::new(2, "A", 30).await;

    let (status, body) = app.send("POST", "/api/seats/A1/purchase").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["status"], "AVAILABLE");

    app.send("POST", "/api/seats/A1/reserve").await;
    let (status, body) = app.send("POST", "/api/seats/A1/reserve").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["status"], "RESERVED");

    app.send("POST", "/api/seats/A1/purchase").await;
    let (status, body) = app.send("POST", "/api/seats/A1/reserve").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["status"], "SOLD");

    let (status, body) = app.send("POST", "/api/seats/A1/purchase").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["status"], "SOLD");
}

#[tokio::test]
async fn test_unknown_seat_is_not_found() {
    let app = TestApp::new(3, "S", 30).await;

    for (method, uri) in [
        ("POST", "/api/seats/Z99/reserve"),
        ("POST", "/api/seats/Z99/purchase"),
        ("GET", "/api/seats/Z99"),
    ] {
        let (status, body) = app.send(method, uri).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{} {}", method, uri);
        assert!(body["message"].as_str().unwrap().contains("Z99"));
    }
}

#[tokio::test]
async fn test_seat_detail_shows_deadline_only_while_held() {
    let app = TestApp::new(1, "A", 30).await;
    app.send("POST", "/api/seats/A1/reserve").await;

    let (status, body) = app.send("GET", "/api/seats/A1").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "RESERVED");
    assert_eq!(body["hold_deadline"], 30);

    app.clock.set(31);
    let (_, body) = app.send("GET", "/api/seats/A1").await;
    assert_eq!(body["status"], "AVAILABLE");
    assert!(body["hold_deadline"].is_null());
}

#[tokio::test]
async fn test_health() {
    let app = TestApp::new(5, "A", 30).await;
    let (status, body) = app.send("GET", "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["seats"], 5);
}

#[tokio::test]
async fn test_health_leaves_lapsed_holds_alone() {
    let app = TestApp::new(2, "A", 30).await;
    app.send("POST", "/api/seats/A1/reserve").await;

    app.clock.set(100);
    let (status, _) = app.send("GET", "/health").await;
    assert_eq!(status, StatusCode::OK);

    // Still reserved: health did not sweep, so purchase goes through
    let (status, body) = app.send("POST", "/api/seats/A1/purchase").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "SOLD");
}

#[tokio::test]
async fn test_purchase_after_deadline_without_intervening_sweep_still_sells() {
    let app = TestApp::new(1, "A", 30).await;

    let (status, body) = app.send("POST", "/api/seats/A1/reserve").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["hold_deadline"], 30);

    // Well past the deadline, nothing has listed or swept
    app.clock.set(100);
    let (status, body) = app.send("POST", "/api/seats/A1/purchase").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "SOLD");

    let (_, body) = app.send("GET", "/api/seats/A1").await;
    assert_eq!(body["status"], "SOLD");
}

#[tokio::test]
async fn test_seat_stream_is_event_stream() {
    let app = TestApp::new(1, "A", 30).await;

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/seats/stream")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["content-type"].to_str().unwrap(),
        "text/event-stream"
    );
}
