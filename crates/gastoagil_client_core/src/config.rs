//! Endpoints for the identity/storage/table service and the OCR backend.

use std::env;

pub const DEFAULT_OCR_API_PORT: &str = "8001";
pub const RECEIPTS_BUCKET: &str = "receipts";
pub const BOLETAS_TABLE: &str = "boletas";
/// Lifetime of the read grant handed to the OCR backend.
pub const SIGNED_URL_TTL_SECS: u64 = 300;

#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Base URL of the hosted backend (auth, storage, REST table API).
    pub supabase_url: String,
    pub supabase_anon_key: String,
    /// Base URL of the OCR/receipts API.
    pub api_url: String,
    /// SQLite file keeping the signed-in session; `None` keeps it in memory.
    pub session_db_path: Option<String>,
}

impl ClientConfig {
    pub fn new(supabase_url: &str, supabase_anon_key: &str, api_url: &str) -> Self {
        Self {
            supabase_url: trim_base(supabase_url),
            supabase_anon_key: supabase_anon_key.to_string(),
            api_url: trim_base(api_url),
            session_db_path: None,
        }
    }

    pub fn from_env() -> Result<Self, String> {
        let supabase_url = env::var("SUPABASE_URL").map_err(|_| "Missing Supabase environment variables".to_string())?;
        let anon_key = env::var("SUPABASE_ANON_KEY").map_err(|_| "Missing Supabase environment variables".to_string())?;
        let api_url = env::var("API_URL").unwrap_or_else(|_| {
            let port = env::var("OCR_API_PORT").unwrap_or_else(|_| DEFAULT_OCR_API_PORT.to_string());
            format!("http://127.0.0.1:{}", port)
        });
        let mut config = Self::new(&supabase_url, &anon_key, &api_url);
        config.session_db_path = env::var("SESSION_DB_PATH").ok();
        Ok(config)
    }
}

fn trim_base(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}
