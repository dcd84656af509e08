//! Receipt ("boleta") records and the JSON shapes exchanged with clients.
//! Field names follow the hosted `boletas` table so rows and payloads line up.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::ids::{BoletaId, UserId};

/// A persisted receipt row.
#[derive(Clone, Debug, PartialEq, sqlx::FromRow)]
pub struct Boleta {
    pub id: BoletaId,
    pub nombre_archivo: String,
    pub text: Option<String>,
    pub merchant: Option<String>,
    pub total_amount: Option<f64>,
    pub date: Option<NaiveDate>,
    pub confidence: Option<f64>,
    pub fecha: DateTime<Utc>,
    pub user_id: UserId,
}

/// Insert payload. `user_id` is always the authenticated caller.
#[derive(Clone, Debug, PartialEq)]
pub struct NewBoleta {
    pub nombre_archivo: String,
    pub text: Option<String>,
    pub merchant: Option<String>,
    pub total_amount: Option<f64>,
    pub date: Option<NaiveDate>,
    pub confidence: Option<f64>,
    pub user_id: UserId,
}

/// Receipt as returned to clients (owner omitted).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoletaOut {
    pub id: BoletaId,
    pub nombre_archivo: String,
    pub text: Option<String>,
    pub merchant: Option<String>,
    pub total_amount: Option<f64>,
    pub date: Option<NaiveDate>,
    pub confidence: Option<f64>,
    pub fecha: DateTime<Utc>,
}

impl From<Boleta> for BoletaOut {
    fn from(b: Boleta) -> Self {
        Self {
            id: b.id,
            nombre_archivo: b.nombre_archivo,
            text: b.text,
            merchant: b.merchant,
            total_amount: b.total_amount,
            date: b.date,
            confidence: b.confidence,
            fecha: b.fecha,
        }
    }
}

/// Manual entry from the expense form.
#[derive(Debug, Deserialize)]
pub struct CreateBoletaRequest {
    pub nombre_archivo: String,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub merchant: Option<String>,
    #[serde(default)]
    pub total_amount: Option<f64>,
    #[serde(default, deserialize_with = "crate::utils::date::deserialize_opt")]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub confidence: Option<f64>,
    /// Accepted for compatibility with older clients and then discarded.
    #[serde(default)]
    pub user_id: Option<String>,
}

impl CreateBoletaRequest {
    pub fn into_new(self, owner: &str) -> NewBoleta {
        NewBoleta {
            nombre_archivo: self.nombre_archivo.trim().to_string(),
            text: self.text,
            merchant: self.merchant.map(|m| m.trim().to_string()).filter(|m| !m.is_empty()),
            total_amount: self.total_amount,
            date: self.date,
            confidence: self.confidence,
            user_id: owner.to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BoletaListResponse {
    pub items: Vec<BoletaOut>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub pages: i64,
}

impl BoletaListResponse {
    pub fn new(items: Vec<Boleta>, total: i64, page: i64, limit: i64) -> Self {
        Self {
            items: items.into_iter().map(BoletaOut::from).collect(),
            total,
            page,
            limit,
            pages: (total + limit - 1) / limit,
        }
    }
}

/// Row offset of a 1-based page; `None` once it no longer fits in an i64.
pub fn page_offset(page: i64, limit: i64) -> Option<i64> {
    page.checked_sub(1)?.checked_mul(limit)
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BoletaStats {
    pub total_boletas: i64,
    pub total_amount: f64,
    pub avg_confidence: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OcrFromStorageRequest {
    #[serde(rename = "signedUrl")]
    pub signed_url: String,
    pub nombre_archivo: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OcrResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boleta: Option<BoletaOut>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl OcrResponse {
    pub fn ok(boleta: Boleta) -> Self {
        Self {
            success: true,
            boleta: Some(boleta.into()),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            boleta: None,
            error: Some(error.into()),
        }
    }
}
