//! HTTP calls to the receipts API (OCR, listing, stats).

use crate::models::{BoletaListResponse, BoletaStats, OcrResponse};
use crate::GastoClient;

/// Server `detail` if present, else a generic status message.
pub(crate) fn server_error(status: reqwest::StatusCode, text: &str) -> String {
    serde_json::from_str::<serde_json::Value>(text)
        .ok()
        .and_then(|v| v.get("detail").and_then(|d| d.as_str()).map(String::from))
        .unwrap_or_else(|| format!("Error del servidor: {}", status.as_u16()))
}

impl GastoClient {
    /// POST /ocr/from-storage { signedUrl, nombre_archivo }
    pub(crate) async fn request_ocr(
        &self,
        token: &str,
        signed_url: &str,
        nombre_archivo: &str,
    ) -> Result<OcrResponse, String> {
        let url = format!("{}/ocr/from-storage", self.config.api_url);
        let body = serde_json::json!({ "signedUrl": signed_url, "nombre_archivo": nombre_archivo });
        let resp = self
            .http
            .post(&url)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .map_err(|e| e.to_string())?;
        let status = resp.status();
        let text = resp.text().await.map_err(|e| e.to_string())?;
        if !status.is_success() {
            return Err(server_error(status, &text));
        }
        serde_json::from_str(&text).map_err(|e| format!("Respuesta OCR inválida: {}", e))
    }

    /// GET /boletas?page=&limit=
    pub async fn get_boletas(&self, page: u32, limit: u32) -> Result<BoletaListResponse, String> {
        let token = self.access_token().await?;
        let url = format!("{}/boletas", self.config.api_url);
        let resp = self
            .http
            .get(&url)
            .query(&[("page", page), ("limit", limit)])
            .bearer_auth(&token)
            .send()
            .await
            .map_err(|e| e.to_string())?;
        let status = resp.status();
        let text = resp.text().await.map_err(|e| e.to_string())?;
        if !status.is_success() {
            return Err(format!("Error del servidor: {}", status.as_u16()));
        }
        serde_json::from_str(&text).map_err(|e| e.to_string())
    }

    /// GET /boletas/stats
    pub async fn get_boletas_stats(&self) -> Result<BoletaStats, String> {
        let token = self.access_token().await?;
        let url = format!("{}/boletas/stats", self.config.api_url);
        let resp = self
            .http
            .get(&url)
            .bearer_auth(&token)
            .send()
            .await
            .map_err(|e| e.to_string())?;
        let status = resp.status();
        let text = resp.text().await.map_err(|e| e.to_string())?;
        if !status.is_success() {
            return Err(format!("Error del servidor: {}", status.as_u16()));
        }
        serde_json::from_str(&text).map_err(|e| e.to_string())
    }
}
