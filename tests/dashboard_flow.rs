//! End-to-end tests: the real HTTP client and controller against an
//! in-process stub of the monitoring backend.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{http::StatusCode, Json, Router};
use serde_json::{json, Value};

use cityscope::{
    AlertSource, Config, DashboardController, FetchError, HttpSensorClient, SessionStore, Theme,
    ThresholdRequest, TrafficRecord, TOKEN_KEY, TRAFFIC,
};

// ---

/// One request as the stub backend saw it.
#[derive(Debug, Clone)]
struct SeenRequest {
    params: HashMap<String, String>,
    authorization: Option<String>,
}

#[derive(Clone, Default)]
struct StubState {
    seen: Arc<Mutex<Vec<SeenRequest>>>,
    reject_unauthorized: Arc<AtomicBool>,
}

impl StubState {
    // ---
    fn seen(&self) -> Vec<SeenRequest> {
        self.seen.lock().unwrap().clone()
    }
}

async fn traffic_handler(
    State(state): State<StubState>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> axum::response::Response {
    // ---
    let authorization = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(String::from);
    state.seen.lock().unwrap().push(SeenRequest { params, authorization });

    if state.reject_unauthorized.load(Ordering::SeqCst) {
        return StatusCode::UNAUTHORIZED.into_response();
    }

    Json(json!({
        "content": [{
            "id": "6f2b2c64-5f2e-4e8e-9c3b-6a1d2b3c4d5e",
            "location": "5th Avenue",
            "timestamp": "2025-03-26T18:45:00",
            "trafficDensity": 320,
            "avgSpeed": 42.5,
            "congestionLevel": "High"
        }],
        "totalElements": 1,
        "totalPages": 1,
        "size": 10,
        "number": 0
    }))
    .into_response()
}

async fn alerts_handler() -> Json<Value> {
    // ---
    Json(json!({
        "message": "Recent alerts fetched successfully",
        "count": 1,
        "data": [{
            "id": "d3b07384-d9a0-4c9b-8f3a-1b2c3d4e5f60",
            "metric": "trafficDensity",
            "value": 480.0,
            "thresholdValue": 400.0,
            "alertType": "Above",
            "type": "Traffic",
            "triggeredAt": "2025-03-26T18:45:00"
        }]
    }))
}

async fn save_settings_handler(Json(body): Json<Value>) -> Json<Value> {
    // ---
    // Echo the stored setting the way the backend does
    Json(json!({
        "id": "1b671a64-40d5-491e-99b0-da01ff1f3341",
        "type": body["type"],
        "metric": body["metric"],
        "thresholdValue": body["thresholdValue"],
        "alertType": body["alertType"],
        "createdAt": "2025-03-26T18:45:00"
    }))
}

/// Bind the stub backend on an ephemeral port and return its base URL.
async fn serve_stub(state: StubState) -> Result<String> {
    // ---
    let app = Router::new()
        .route("/api/sensors/traffic", get(traffic_handler))
        .route("/api/alerts/recent", get(alerts_handler))
        .route("/api/settings", post(save_settings_handler))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    Ok(format!("http://{addr}"))
}

fn stub_config(base_url: &str) -> Config {
    // ---
    Config {
        api_base_url: base_url.to_string(),
        page_size: 10,
        refresh_interval_secs: 60,
        alert_poll_secs: 60,
        alert_display_ms: 5_000,
        alert_advance_ms: 100,
        theme: Theme::Dark,
    }
}

// ---

#[tokio::test]
async fn traffic_page_round_trip_with_wire_params() -> Result<()> {
    // ---
    let state = StubState::default();
    let base = serve_stub(state.clone()).await?;

    let session = SessionStore::new();
    let client = HttpSensorClient::new(&stub_config(&base), session.clone());
    let mut ctl = DashboardController::<TrafficRecord, _>::new(&TRAFFIC, client);

    ctl.load().await?;
    assert_eq!(ctl.data().len(), 1);
    assert_eq!(ctl.data()[0].location, "5th Avenue");
    assert_eq!(ctl.total_elements(), 1);
    assert_eq!(ctl.total_pages(), 1);

    let seen = state.seen();
    assert_eq!(seen.len(), 1);
    let request = &seen[0];

    // 1-based controller page travels 0-based, with sort and size
    assert_eq!(request.params.get("page").map(String::as_str), Some("0"));
    assert_eq!(request.params.get("size").map(String::as_str), Some("10"));
    assert_eq!(request.params.get("sortBy").map(String::as_str), Some("timestamp"));
    assert_eq!(request.params.get("order").map(String::as_str), Some("desc"));
    // Blank filters stay off the wire entirely
    assert!(!request.params.contains_key("location"));
    assert!(!request.params.contains_key("congestionLevel"));
    // No token stored: the Authorization header is omitted, not sent empty
    assert_eq!(request.authorization, None);

    Ok(())
}

#[tokio::test]
async fn bearer_token_and_filters_reach_the_wire() -> Result<()> {
    // ---
    let state = StubState::default();
    let base = serve_stub(state.clone()).await?;

    let session = SessionStore::new();
    session.put(TOKEN_KEY, "test-token");
    let client = HttpSensorClient::new(&stub_config(&base), session);
    let mut ctl = DashboardController::<TrafficRecord, _>::new(&TRAFFIC, client);

    ctl.set_location_filter("5th Avenue");
    ctl.set_status_filter("High");
    ctl.on_filter_change().await?;

    let seen = state.seen();
    let request = &seen[0];
    assert_eq!(
        request.authorization.as_deref(),
        Some("Bearer test-token")
    );
    assert_eq!(request.params.get("location").map(String::as_str), Some("5th Avenue"));
    assert_eq!(
        request.params.get("congestionLevel").map(String::as_str),
        Some("High")
    );

    Ok(())
}

#[tokio::test]
async fn unauthorized_fetch_clears_loaded_data() -> Result<()> {
    // ---
    let state = StubState::default();
    let base = serve_stub(state.clone()).await?;

    let client = HttpSensorClient::new(&stub_config(&base), SessionStore::new());
    let mut ctl = DashboardController::<TrafficRecord, _>::new(&TRAFFIC, client);

    ctl.load().await?;
    assert_eq!(ctl.data().len(), 1);

    state.reject_unauthorized.store(true, Ordering::SeqCst);
    let err = ctl.load().await.unwrap_err();
    assert_eq!(err, FetchError::Unauthorized);
    assert!(ctl.data().is_empty());

    Ok(())
}

#[tokio::test]
async fn recent_alerts_parse_off_the_wire() -> Result<()> {
    // ---
    let base = serve_stub(StubState::default()).await?;
    let client = HttpSensorClient::new(&stub_config(&base), SessionStore::new());

    let batch = client.recent_alerts().await?;
    assert_eq!(batch.count, 1);
    assert_eq!(batch.data.len(), 1);
    assert_eq!(batch.data[0].metric, "trafficDensity");
    assert_eq!(batch.data[0].threshold_value, 400.0);

    Ok(())
}

#[tokio::test]
async fn threshold_setting_round_trip() -> Result<()> {
    // ---
    let base = serve_stub(StubState::default()).await?;
    let client = HttpSensorClient::new(&stub_config(&base), SessionStore::new());

    let stored = client
        .save_threshold(&ThresholdRequest {
            sensor: cityscope::SensorFamily::Traffic,
            metric: "trafficDensity".to_string(),
            threshold_value: 400.0,
            alert_type: cityscope::AlertDirection::Above,
        })
        .await?;

    assert_eq!(stored.metric, "trafficDensity");
    assert_eq!(stored.threshold_value, 400.0);
    assert_eq!(stored.created_at, "2025-03-26T18:45:00");

    Ok(())
}

#[tokio::test]
async fn unreachable_backend_is_classified() -> Result<()> {
    // ---
    // Nothing listens here; the connection itself fails
    let client = HttpSensorClient::new(&stub_config("http://127.0.0.1:1"), SessionStore::new());
    let mut ctl = DashboardController::<TrafficRecord, _>::new(&TRAFFIC, client);

    let err = ctl.load().await.unwrap_err();
    assert_eq!(err.kind(), cityscope::FetchErrorKind::Unreachable);
    assert!(ctl.data().is_empty());

    Ok(())
}
