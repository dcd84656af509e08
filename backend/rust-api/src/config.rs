use anyhow::Context;
use std::env;

pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    /// HS256 secret shared with the identity service that issues user tokens.
    pub jwt_secret: String,
    pub allowed_origins: Vec<String>,
    pub ocr_lang: String,
    pub tesseract_cmd: String,
    pub max_upload_bytes: usize,
    /// Only signed URLs on this origin are fetched. `None` accepts any origin.
    pub storage_url: Option<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .context("DATABASE_URL environment variable is not set")?,
            host: first_var(&["FASTAPI_HOST", "HOST"])
                .unwrap_or_else(|| "127.0.0.1".to_string()),
            port: first_var(&["FASTAPI_PORT", "PORT"])
                .and_then(|p| p.parse().ok())
                .unwrap_or(8001),
            jwt_secret: env::var("SUPABASE_JWT_SECRET")
                .context("SUPABASE_JWT_SECRET environment variable is not set")?,
            allowed_origins: parse_origins(
                &env::var("ALLOWED_ORIGINS").unwrap_or_else(|_| "http://localhost:3000".to_string()),
            ),
            ocr_lang: env::var("OCR_LANG").unwrap_or_else(|_| "spa".to_string()),
            tesseract_cmd: env::var("TESSERACT_CMD").unwrap_or_else(|_| "tesseract".to_string()),
            max_upload_bytes: env::var("MAX_UPLOAD_BYTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
            storage_url: first_var(&["STORAGE_URL", "SUPABASE_URL"]).filter(|u| !u.trim().is_empty()),
        })
    }

    /// True when `signed_url` points at the configured storage origin.
    pub fn allows_storage_url(&self, signed_url: &str) -> bool {
        let Some(base) = self.storage_url.as_deref() else {
            return true;
        };
        match (reqwest::Url::parse(base.trim()), reqwest::Url::parse(signed_url)) {
            (Ok(base), Ok(url)) => base.origin() == url.origin(),
            _ => false,
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn first_var(names: &[&str]) -> Option<String> {
    names.iter().find_map(|name| env::var(name).ok())
}

/// Comma separated list; blanks are dropped.
pub fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(String::from)
        .collect()
}
