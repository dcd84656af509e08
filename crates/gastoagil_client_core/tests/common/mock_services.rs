//! In-process stand-in for the identity, storage, table and OCR services.
//! Every request is recorded so tests can assert on what the client sent.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use gastoagil_client_core::{ClientConfig, GastoClient};

pub const USER_ID: &str = "user-1";
pub const EMAIL: &str = "ana@example.com";
pub const PASSWORD: &str = "secret";
pub const ACCESS_TOKEN: &str = "tok-1";
pub const REFRESH_TOKEN: &str = "ref-1";
pub const ANON_KEY: &str = "anon-key";

#[derive(Clone, Debug)]
pub struct Upload {
    pub path: String,
    pub content_type: Option<String>,
    pub upsert: Option<String>,
    pub size: usize,
}

#[derive(Default)]
struct Recorded {
    calls: Vec<String>,
    uploads: Vec<Upload>,
    sign_requests: Vec<(String, Value)>,
    ocr_requests: Vec<Value>,
    inserts: Vec<Value>,
    ocr_reply: Option<(u16, String)>,
}

#[derive(Clone, Default)]
pub struct MockServices {
    inner: Arc<Mutex<Recorded>>,
}

impl MockServices {
    fn record(&self, call: String) {
        self.inner.lock().unwrap().calls.push(call);
    }

    pub fn calls(&self) -> Vec<String> {
        self.inner.lock().unwrap().calls.clone()
    }

    pub fn uploads(&self) -> Vec<Upload> {
        self.inner.lock().unwrap().uploads.clone()
    }

    pub fn sign_requests(&self) -> Vec<(String, Value)> {
        self.inner.lock().unwrap().sign_requests.clone()
    }

    pub fn ocr_requests(&self) -> Vec<Value> {
        self.inner.lock().unwrap().ocr_requests.clone()
    }

    pub fn inserts(&self) -> Vec<Value> {
        self.inner.lock().unwrap().inserts.clone()
    }

    /// Status and raw body the OCR endpoint answers with from now on.
    pub fn set_ocr_reply(&self, status: u16, body: &str) {
        self.inner.lock().unwrap().ocr_reply = Some((status, body.to_string()));
    }

    fn ocr_reply(&self) -> (u16, String) {
        self.inner
            .lock()
            .unwrap()
            .ocr_reply
            .clone()
            .unwrap_or_else(|| (200, ocr_success_body().to_string()))
    }
}

pub fn ocr_success_body() -> Value {
    json!({
        "success": true,
        "boleta": {
            "id": 7,
            "nombre_archivo": "boleta.jpg",
            "text": "SUPERMERCADO LIDER\nTOTAL $12,990.00",
            "merchant": "SUPERMERCADO LIDER",
            "total_amount": 12990.0,
            "date": "2024-01-15",
            "confidence": 0.85,
            "fecha": "2024-01-15T10:00:00Z"
        }
    })
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

fn authorized(headers: &HeaderMap) -> bool {
    bearer(headers) == Some(ACCESS_TOKEN)
}

fn token_body() -> Value {
    json!({
        "access_token": ACCESS_TOKEN,
        "refresh_token": REFRESH_TOKEN,
        "token_type": "bearer",
        "expires_in": 3600,
        "user": { "id": USER_ID, "email": EMAIL }
    })
}

async fn token(
    State(mock): State<MockServices>,
    Query(query): Query<HashMap<String, String>>,
    Json(body): Json<Value>,
) -> Response {
    let grant = query.get("grant_type").cloned().unwrap_or_default();
    mock.record(format!("POST /auth/v1/token?grant_type={}", grant));
    let ok = match grant.as_str() {
        "password" => body["email"] == EMAIL && body["password"] == PASSWORD,
        "refresh_token" => body["refresh_token"] == REFRESH_TOKEN,
        _ => false,
    };
    if ok {
        Json(token_body()).into_response()
    } else {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "invalid_grant", "error_description": "Invalid login credentials" })),
        )
            .into_response()
    }
}

async fn logout(State(mock): State<MockServices>) -> StatusCode {
    mock.record("POST /auth/v1/logout".to_string());
    StatusCode::NO_CONTENT
}

async fn user(State(mock): State<MockServices>, headers: HeaderMap) -> Response {
    mock.record("GET /auth/v1/user".to_string());
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "msg": "invalid JWT" }))).into_response();
    }
    Json(json!({ "id": USER_ID, "email": EMAIL })).into_response()
}

async fn storage(
    State(mock): State<MockServices>,
    Path(rest): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let rest = rest.trim_start_matches('/').to_string();
    mock.record(format!("POST /storage/v1/{}", rest));
    if !authorized(&headers) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "statusCode": "403", "error": "Unauthorized", "message": "invalid signature" })),
        )
            .into_response();
    }
    if let Some(path) = rest.strip_prefix("object/sign/receipts/") {
        let request: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
        mock.inner
            .lock()
            .unwrap()
            .sign_requests
            .push((path.to_string(), request));
        return Json(json!({ "signedURL": format!("/object/sign/receipts/{}?token=signed", path) }))
            .into_response();
    }
    if let Some(path) = rest.strip_prefix("object/receipts/") {
        let header = |name: &str| headers.get(name).and_then(|v| v.to_str().ok()).map(String::from);
        mock.inner.lock().unwrap().uploads.push(Upload {
            path: path.to_string(),
            content_type: header(CONTENT_TYPE.as_str()),
            upsert: header("x-upsert"),
            size: body.len(),
        });
        return Json(json!({ "Key": format!("receipts/{}", path) })).into_response();
    }
    StatusCode::NOT_FOUND.into_response()
}

async fn insert_boletas(
    State(mock): State<MockServices>,
    headers: HeaderMap,
    Json(rows): Json<Vec<Value>>,
) -> Response {
    mock.record("POST /rest/v1/boletas".to_string());
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "message": "JWT expired" }))).into_response();
    }
    let wants_rows = headers
        .get("prefer")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.contains("return=representation"));
    let mut stored = Vec::new();
    for (i, row) in rows.into_iter().enumerate() {
        mock.inner.lock().unwrap().inserts.push(row.clone());
        let mut row = row;
        row["id"] = json!(100 + i as i64);
        row["fecha"] = json!("2024-01-15T10:00:00Z");
        stored.push(row);
    }
    if !wants_rows {
        return StatusCode::CREATED.into_response();
    }
    (StatusCode::CREATED, Json(Value::Array(stored))).into_response()
}

async fn ocr_from_storage(State(mock): State<MockServices>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    mock.record("POST /ocr/from-storage".to_string());
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "detail": "Invalid or expired token" }))).into_response();
    }
    mock.inner.lock().unwrap().ocr_requests.push(body);
    let (status, body) = mock.ocr_reply();
    (
        StatusCode::from_u16(status).unwrap(),
        [(CONTENT_TYPE, "application/json")],
        body,
    )
        .into_response()
}

async fn list_boletas(
    State(mock): State<MockServices>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    let page: i64 = query.get("page").and_then(|p| p.parse().ok()).unwrap_or(1);
    let limit: i64 = query.get("limit").and_then(|l| l.parse().ok()).unwrap_or(20);
    mock.record(format!("GET /boletas?page={}&limit={}", page, limit));
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "detail": "Invalid or expired token" }))).into_response();
    }
    Json(json!({
        "items": [ocr_success_body()["boleta"].clone()],
        "total": 11,
        "page": page,
        "limit": limit,
        "pages": (11 + limit - 1) / limit
    }))
    .into_response()
}

async fn stats(State(mock): State<MockServices>, headers: HeaderMap) -> Response {
    mock.record("GET /boletas/stats".to_string());
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({ "detail": "Invalid or expired token" }))).into_response();
    }
    Json(json!({ "total_boletas": 3, "total_amount": 45000.5, "avg_confidence": 0.85 })).into_response()
}

/// Start the mock on an ephemeral port; returns it and its base URL.
pub async fn spawn() -> (MockServices, String) {
    let mock = MockServices::default();
    let app = Router::new()
        .route("/auth/v1/token", post(token))
        .route("/auth/v1/logout", post(logout))
        .route("/auth/v1/user", get(user))
        .route("/storage/v1/*rest", post(storage))
        .route("/rest/v1/boletas", post(insert_boletas))
        .route("/ocr/from-storage", post(ocr_from_storage))
        .route("/boletas", get(list_boletas))
        .route("/boletas/stats", get(stats))
        .with_state(mock.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (mock, format!("http://{}", addr))
}

/// Client pointed at the mock for both the hosted services and the OCR API.
pub fn client_for(base_url: &str) -> GastoClient {
    GastoClient::new(ClientConfig::new(base_url, ANON_KEY, base_url)).unwrap()
}

pub async fn signed_in_client(base_url: &str) -> GastoClient {
    let client = client_for(base_url);
    client.sign_in_with_password(EMAIL, PASSWORD).await.unwrap();
    client
}
