//! Object storage: receipt upload and short-lived signed read URLs.

use reqwest::header::{HeaderValue, CONTENT_TYPE};
use serde::Deserialize;
use uuid::Uuid;

use crate::config::RECEIPTS_BUCKET;
use crate::models::ReceiptFile;
use crate::GastoClient;

/// `receipts/{userId}/{uuid}-{filename}`; unique per call, so re-uploads never collide.
pub fn receipt_object_path(user_id: &str, filename: &str) -> String {
    format!("receipts/{}/{}-{}", user_id, Uuid::new_v4(), filename)
}

fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

#[derive(Deserialize)]
struct SignedUrlResponse {
    #[serde(rename = "signedURL", alias = "signedUrl")]
    signed_url: String,
}

fn storage_error_message(text: &str) -> String {
    serde_json::from_str::<serde_json::Value>(text)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(String::from))
        .unwrap_or_else(|| text.to_string())
}

impl GastoClient {
    fn storage_base(&self) -> String {
        format!("{}/storage/v1", self.config.supabase_url)
    }

    /// POST /storage/v1/object/{bucket}/{path} (no upsert).
    pub(crate) async fn upload_object(&self, token: &str, path: &str, file: &ReceiptFile) -> Result<(), String> {
        let url = format!("{}/object/{}/{}", self.storage_base(), RECEIPTS_BUCKET, encode_path(path));
        let mut headers = self.service_headers(Some(token))?;
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_str(&file.content_type).map_err(|e| e.to_string())?,
        );
        headers.insert("x-upsert", HeaderValue::from_static("false"));

        let resp = self
            .http
            .post(&url)
            .headers(headers)
            .body(file.bytes.clone())
            .send()
            .await
            .map_err(|e| format!("Error subiendo archivo: {}", e))?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            log::error!("upload_object failed: {} {}", status, text);
            return Err(format!("Error subiendo archivo: {}", storage_error_message(&text)));
        }
        log::debug!("uploaded {} ({} bytes)", path, file.bytes.len());
        Ok(())
    }

    /// POST /storage/v1/object/sign/{bucket}/{path} -> absolute signed URL.
    pub(crate) async fn create_signed_url(&self, token: &str, path: &str, expires_in: u64) -> Result<String, String> {
        let url = format!("{}/object/sign/{}/{}", self.storage_base(), RECEIPTS_BUCKET, encode_path(path));
        let failed = || "Error creando URL firmada".to_string();

        let resp = self
            .http
            .post(&url)
            .headers(self.service_headers(Some(token))?)
            .json(&serde_json::json!({ "expiresIn": expires_in }))
            .send()
            .await
            .map_err(|e| {
                log::error!("create_signed_url: {}", e);
                failed()
            })?;
        if !resp.status().is_success() {
            log::error!("create_signed_url failed: {}", resp.status());
            return Err(failed());
        }
        let signed: SignedUrlResponse = resp.json().await.map_err(|_| failed())?;
        if signed.signed_url.is_empty() {
            return Err(failed());
        }
        if signed.signed_url.starts_with("http://") || signed.signed_url.starts_with("https://") {
            return Ok(signed.signed_url);
        }
        Ok(format!("{}{}", self.storage_base(), signed.signed_url))
    }
}
