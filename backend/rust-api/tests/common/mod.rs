// Shared helpers: in-memory receipt store, canned OCR engine, request plumbing.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

use gastoagil_api::database::BoletaStore;
use gastoagil_api::middleware::issue_token;
use gastoagil_api::models::{page_offset, Boleta, BoletaId, BoletaStats, NewBoleta};
use gastoagil_api::services::ocr_engine::detect_image_format;
use gastoagil_api::services::{OcrEngine, OcrError};
use gastoagil_api::{build_router, AppState, Config};

pub const TEST_SECRET: &str = "test-jwt-secret";

/// Smallest header `detect_image_format` accepts as JPEG.
pub const JPEG_BYTES: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F'];

#[derive(Default)]
pub struct MemoryStore {
    rows: Mutex<Vec<Boleta>>,
    next_id: AtomicI64,
}

impl MemoryStore {
    pub fn rows(&self) -> Vec<Boleta> {
        self.rows.lock().unwrap().clone()
    }

    /// Insert with an explicit age so ordering is deterministic.
    pub fn seed(&self, user_id: &str, nombre_archivo: &str, amount: f64, minutes_ago: i64) -> BoletaId {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        self.rows.lock().unwrap().push(Boleta {
            id,
            nombre_archivo: nombre_archivo.to_string(),
            text: None,
            merchant: Some("Comercio Test".to_string()),
            total_amount: Some(amount),
            date: None,
            confidence: Some(0.85),
            fecha: Utc::now() - Duration::minutes(minutes_ago),
            user_id: user_id.to_string(),
        });
        id
    }
}

#[async_trait]
impl BoletaStore for MemoryStore {
    async fn create(&self, new: NewBoleta) -> anyhow::Result<Boleta> {
        let boleta = Boleta {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            nombre_archivo: new.nombre_archivo,
            text: new.text,
            merchant: new.merchant,
            total_amount: new.total_amount,
            date: new.date,
            confidence: new.confidence,
            fecha: Utc::now(),
            user_id: new.user_id,
        };
        self.rows.lock().unwrap().push(boleta.clone());
        Ok(boleta)
    }

    async fn get(&self, id: BoletaId, user_id: &str) -> anyhow::Result<Option<Boleta>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .find(|b| b.id == id && b.user_id == user_id)
            .cloned())
    }

    async fn list(&self, user_id: &str, page: i64, limit: i64) -> anyhow::Result<(Vec<Boleta>, i64)> {
        let mut own: Vec<Boleta> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|b| b.user_id == user_id)
            .cloned()
            .collect();
        own.sort_by(|a, b| b.fecha.cmp(&a.fecha).then(b.id.cmp(&a.id)));
        let total = own.len() as i64;
        let Some(offset) = page_offset(page, limit) else {
            return Ok((Vec::new(), total));
        };
        let items = own
            .into_iter()
            .skip(usize::try_from(offset).unwrap_or(usize::MAX))
            .take(limit as usize)
            .collect();
        Ok((items, total))
    }

    async fn delete(&self, id: BoletaId, user_id: &str) -> anyhow::Result<bool> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|b| !(b.id == id && b.user_id == user_id));
        Ok(rows.len() < before)
    }

    async fn stats(&self, user_id: &str) -> anyhow::Result<BoletaStats> {
        let rows = self.rows.lock().unwrap();
        let own: Vec<&Boleta> = rows.iter().filter(|b| b.user_id == user_id).collect();
        let confidences: Vec<f64> = own.iter().filter_map(|b| b.confidence).collect();
        Ok(BoletaStats {
            total_boletas: own.len() as i64,
            total_amount: own.iter().filter_map(|b| b.total_amount).sum(),
            avg_confidence: if confidences.is_empty() {
                0.0
            } else {
                confidences.iter().sum::<f64>() / confidences.len() as f64
            },
        })
    }
}

/// Returns the same text for every recognised image.
pub struct CannedOcr {
    text: String,
    calls: AtomicUsize,
}

impl CannedOcr {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OcrEngine for CannedOcr {
    async fn extract_text(&self, image: &[u8]) -> Result<String, OcrError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if detect_image_format(image).is_none() {
            return Err(OcrError::NotAnImage);
        }
        Ok(self.text.clone())
    }
}

pub fn test_config() -> Config {
    Config {
        database_url: "postgres://unused".to_string(),
        host: "127.0.0.1".to_string(),
        port: 0,
        jwt_secret: TEST_SECRET.to_string(),
        allowed_origins: vec!["http://localhost:3000".to_string()],
        ocr_lang: "spa".to_string(),
        tesseract_cmd: "tesseract".to_string(),
        max_upload_bytes: 1024,
        storage_url: None,
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub ocr: Arc<CannedOcr>,
}

pub fn test_app(ocr_text: &str) -> TestApp {
    test_app_with_config(ocr_text, test_config())
}

pub fn test_app_with_config(ocr_text: &str, config: Config) -> TestApp {
    let store = Arc::new(MemoryStore::default());
    let ocr = Arc::new(CannedOcr::new(ocr_text));
    let state = AppState {
        store: store.clone(),
        ocr: ocr.clone(),
        http_client: reqwest::Client::new(),
        config: Arc::new(config),
    };
    TestApp {
        router: build_router(state),
        store,
        ocr,
    }
}

pub fn bearer(user_id: &str) -> String {
    format!("Bearer {}", issue_token(user_id, None, TEST_SECRET, 3600).unwrap())
}

pub fn get_req(uri: &str, auth: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(auth) = auth {
        builder = builder.header(header::AUTHORIZATION, auth);
    }
    builder.body(Body::empty()).unwrap()
}

pub fn json_request(method: &str, uri: &str, auth: Option<&str>, body: serde_json::Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(auth) = auth {
        builder = builder.header(header::AUTHORIZATION, auth);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn multipart_upload(auth: &str, filename: &str, content_type: &str, bytes: &[u8]) -> Request<Body> {
    let boundary = "gastoagil-test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
            filename, content_type
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());

    Request::builder()
        .method("POST")
        .uri("/ocr")
        .header(header::AUTHORIZATION, auth)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(Body::from(body))
        .unwrap()
}

pub async fn send(router: &Router, req: Request<Body>) -> (StatusCode, serde_json::Value) {
    let response = router.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
    };
    (status, json)
}

/// Bytes served at `/receipts/big`: a JPEG header padded past the test upload limit.
pub const OVERSIZE_BYTES: usize = 4096;

/// Serves `bytes` at `/receipts/ok`, an oversize image at `/receipts/big` and 404s
/// everything else. Returns the base URL.
pub async fn spawn_storage(bytes: &'static [u8]) -> String {
    let app = Router::new()
        .route("/receipts/ok", axum::routing::get(move || async move { bytes }))
        .route(
            "/receipts/big",
            axum::routing::get(|| async {
                let mut big = JPEG_BYTES.to_vec();
                big.resize(OVERSIZE_BYTES, 0);
                big
            }),
        );
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}
