//! Persisting the confirmed expense form into the hosted `boletas` table.

use reqwest::header::HeaderValue;

use crate::config::BOLETAS_TABLE;
use crate::models::{Boleta, ExpenseDraft};
use crate::GastoClient;

fn table_error_message(text: &str) -> String {
    serde_json::from_str::<serde_json::Value>(text)
        .ok()
        .and_then(|v| {
            ["message", "details"]
                .iter()
                .find_map(|k| v.get(*k).and_then(|m| m.as_str()).map(String::from))
        })
        .unwrap_or_else(|| text.to_string())
}

impl GastoClient {
    /// POST /rest/v1/boletas. The row is always owned by the signed-in user,
    /// whatever `draft.user_id` says; form-only fields are not sent.
    pub async fn save_expense(&self, draft: &ExpenseDraft) -> Result<Boleta, String> {
        let user = self.current_user().await?;
        let token = self.access_token().await?;

        let url = format!("{}/rest/v1/{}", self.config.supabase_url, BOLETAS_TABLE);
        let mut headers = self.service_headers(Some(&token))?;
        headers.insert("prefer", HeaderValue::from_static("return=representation"));

        let resp = self
            .http
            .post(&url)
            .headers(headers)
            .json(&[draft.to_row(&user.id)])
            .send()
            .await
            .map_err(|e| e.to_string())?;
        let status = resp.status();
        let text = resp.text().await.map_err(|e| e.to_string())?;
        if !status.is_success() {
            let msg = table_error_message(&text);
            log::error!("Error guardando gasto: {}", msg);
            return Err(msg);
        }

        let mut rows: Vec<Boleta> = serde_json::from_str(&text).map_err(|e| e.to_string())?;
        if rows.is_empty() {
            return Err("Insert returned no rows".to_string());
        }
        Ok(rows.remove(0))
    }
}
