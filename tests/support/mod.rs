//! In-process fake upstream, relay and enrichment servers.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
};
use serde_json::{Value, json};
use tokio::net::TcpListener;

/// Serve `app` on an ephemeral localhost port and return its base URL.
pub async fn spawn(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

/// A base URL nothing listens on.
pub async fn closed_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

/// Request counter shared with a fake server.
#[derive(Clone, Default)]
pub struct Hits(Arc<AtomicUsize>);

impl Hits {
    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }

    fn record(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

pub fn station(code: &str, state: &str, district: &str, value: f64, time: &str) -> Value {
    json!({
        "stationCode": code,
        "stationName": format!("{} Station", code),
        "stationType": "Dug Well",
        "latitude": 20.3,
        "longitude": 85.8,
        "agencyName": "CGWB",
        "state": state,
        "district": district,
        "dataValue": value,
        "dataTime": time,
        "wellType": "Dug Well",
        "wellDepth": 60.0,
        "wellAquiferType": "Unconfined",
    })
}

/// Two stations per query, named after the requested state.
fn readings_for(query: &HashMap<String, String>) -> Vec<Value> {
    let state = query.get("stateName").cloned().unwrap_or_default();
    let district = query.get("districtName").cloned().unwrap_or_default();
    let prefix: String = state.chars().take(2).collect::<String>().to_uppercase();
    vec![
        station(&format!("{}001", prefix), &state, &district, -5.25, "2024-01-05T08:00:00"),
        station(&format!("{}002", prefix), &state, &district, -7.75, "2024-01-10T08:00:00"),
    ]
}

async fn dataset(State(hits): State<Hits>, Query(query): Query<HashMap<String, String>>) -> Json<Value> {
    hits.record();
    Json(json!({
        "statusCode": 200,
        "message": "Data fetched successfully",
        "data": readings_for(&query),
    }))
}

/// Healthy dataset endpoint at `POST /data`.
pub async fn upstream() -> (String, Hits) {
    let hits = Hits::default();
    let app = Router::new()
        .route("/data", post(dataset))
        .with_state(hits.clone());
    (format!("{}/data", spawn(app).await), hits)
}

/// Dataset endpoint that always answers `status`.
pub async fn failing_upstream(status: StatusCode) -> (String, Hits) {
    let hits = Hits::default();
    let app = Router::new()
        .route(
            "/data",
            post(move |State(hits): State<Hits>| async move {
                hits.record();
                (status, "upstream unavailable")
            }),
        )
        .with_state(hits.clone());
    (format!("{}/data", spawn(app).await), hits)
}

/// Dataset endpoint that answers correctly but only after `delay`.
pub async fn slow_upstream(delay: Duration) -> (String, Hits) {
    let hits = Hits::default();
    let app = Router::new()
        .route(
            "/data",
            post(move |State(hits): State<Hits>, Query(query): Query<HashMap<String, String>>| async move {
                hits.record();
                tokio::time::sleep(delay).await;
                Json(json!({
                    "statusCode": 200,
                    "message": "Data fetched successfully",
                    "data": readings_for(&query),
                }))
            }),
        )
        .with_state(hits.clone());
    (format!("{}/data", spawn(app).await), hits)
}

/// Relay at `POST /raw?url=<encoded target>` that answers as the target
/// would. Returns the prefix to configure.
pub async fn relay() -> (String, Hits) {
    let hits = Hits::default();
    let app = Router::new()
        .route(
            "/raw",
            post(move |State(hits): State<Hits>, Query(query): Query<HashMap<String, String>>| async move {
                hits.record();
                let target = query.get("url").cloned().unwrap_or_default();
                let target_query: HashMap<String, String> = target
                    .split_once('?')
                    .map(|(_, q)| {
                        q.split('&')
                            .filter_map(|pair| pair.split_once('='))
                            .map(|(k, v)| {
                                (k.to_string(), urlencoding::decode(v).unwrap().into_owned())
                            })
                            .collect()
                    })
                    .unwrap_or_default();
                Json(json!({
                    "statusCode": 200,
                    "message": "Data fetched successfully",
                    "data": readings_for(&target_query),
                }))
            }),
        )
        .with_state(hits.clone());
    (format!("{}/raw?url=", spawn(app).await), hits)
}

/// Enrichment backend serving five records with three predictions.
pub async fn enrichment_backend() -> (String, Hits) {
    let hits = Hits::default();
    let app = Router::new()
        .route(
            "/api/fetch-groundwater-data",
            post(|State(hits): State<Hits>, Json(body): Json<Value>| async move {
                hits.record();
                let state = body["state"].as_str().unwrap_or_default().to_string();
                let district = body["district"].as_str().unwrap_or_default().to_string();
                let records: Vec<Value> = (1..=5)
                    .map(|i| {
                        station(&format!("ML{:03}", i), &state, &district, -6.0 - i as f64, "2024-01-03")
                    })
                    .collect();
                Json(json!({
                    "wrs_data": records,
                    "ml_predictions": {
                        "predictions": [-6.5, -7.5, -8.5],
                        "confidence": 0.85,
                        "model_type": "RandomForest",
                    },
                    "metadata": {"data_source": "wrs_api", "records_count": 5},
                }))
            }),
        )
        .route("/api/status", get(|| async { Json(json!({"status": "running"})) }))
        .route(
            "/api/train-model",
            post(|| async { Json(json!({"message": "Model trained successfully!", "status": "success"})) }),
        )
        .with_state(hits.clone());
    (spawn(app).await, hits)
}

/// Enrichment backend whose every endpoint answers 500.
pub async fn broken_backend() -> String {
    let app = Router::new().fallback(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") });
    spawn(app).await
}
