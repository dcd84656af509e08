//! GastoÁgil client core.
//!
//! Client side of receipt ingestion: session handling against the hosted identity
//! service, object upload and signed URLs, the OCR request to the receipts API,
//! and inserting the confirmed expense into the hosted `boletas` table.
//! Failures are surfaced as human-readable strings.

mod api;
mod auth;
pub mod config;
mod expenses;
pub mod models;
pub mod session;
mod storage;
mod upload;

pub use auth::{AuthUser, NOT_AUTHENTICATED, NO_SESSION_TOKEN};
pub use config::ClientConfig;
pub use models::{
    Boleta, BoletaListResponse, BoletaStats, ExpenseDraft, OcrResponse, ReceiptFile,
};
pub use session::{Session, SessionStore};
pub use storage::receipt_object_path;
pub use upload::UploadPhase;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};

pub struct GastoClient {
    pub(crate) config: ClientConfig,
    pub(crate) http: reqwest::Client,
    pub(crate) sessions: SessionStore,
}

impl GastoClient {
    pub fn new(config: ClientConfig) -> Result<Self, String> {
        let sessions = match config.session_db_path.as_deref() {
            Some(path) => SessionStore::open(path)?,
            None => SessionStore::in_memory()?,
        };
        Ok(Self {
            config,
            http: reqwest::Client::new(),
            sessions,
        })
    }

    pub fn from_env() -> Result<Self, String> {
        Self::new(ClientConfig::from_env()?)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Locally stored session, if any (not validated against the server).
    pub fn session(&self) -> Result<Option<Session>, String> {
        self.sessions.load()
    }

    /// Adopt a session obtained elsewhere (e.g. an OAuth redirect).
    pub fn set_session(&self, session: &Session) -> Result<(), String> {
        self.sessions.save(session)
    }

    /// `apikey` plus, when given, `Authorization: Bearer <token>`.
    pub(crate) fn service_headers(&self, token: Option<&str>) -> Result<HeaderMap, String> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "apikey",
            HeaderValue::from_str(&self.config.supabase_anon_key).map_err(|e| e.to_string())?,
        );
        let bearer = token.unwrap_or(&self.config.supabase_anon_key);
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", bearer)).map_err(|e| e.to_string())?,
        );
        Ok(headers)
    }
}
