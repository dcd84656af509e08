//! Data models for receipts, OCR results and the editable expense form.
//! Wire names match the `boletas` table and the OCR backend's JSON.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A stored receipt as returned by the backend or the table API.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Boleta {
    pub id: i64,
    pub nombre_archivo: String,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub merchant: Option<String>,
    #[serde(default)]
    pub total_amount: Option<f64>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub fecha: Option<DateTime<Utc>>,
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoletaListResponse {
    pub items: Vec<Boleta>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub pages: i64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BoletaStats {
    pub total_boletas: i64,
    pub total_amount: f64,
    pub avg_confidence: f64,
}

/// Outcome of the upload-and-process flow. Success always carries a boleta.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OcrResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boleta: Option<Boleta>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl OcrResponse {
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            boleta: None,
            error: Some(error.into()),
        }
    }
}

/// An image picked by the user.
#[derive(Clone, Debug)]
pub struct ReceiptFile {
    pub name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ReceiptFile {
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    /// Read a file from disk, inferring the content type from its extension.
    pub async fn from_path(path: impl AsRef<std::path::Path>) -> Result<Self, String> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| format!("Nombre de archivo inválido: {}", path.display()))?
            .to_string();
        let bytes = tokio::fs::read(path).await.map_err(|e| e.to_string())?;
        let content_type = content_type_for(&name).to_string();
        Ok(Self {
            name,
            content_type,
            bytes,
        })
    }

    pub fn is_image(&self) -> bool {
        self.content_type.starts_with("image/")
    }
}

pub fn content_type_for(filename: &str) -> &'static str {
    let ext = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        _ => "application/octet-stream",
    }
}

/// The editable expense form. Hydrated from an OCR result or filled by hand.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExpenseDraft {
    pub nombre_archivo: String,
    pub text: Option<String>,
    pub merchant: Option<String>,
    pub total_amount: Option<f64>,
    pub date: Option<NaiveDate>,
    pub confidence: Option<f64>,
    /// Form-only fields; the table has no columns for them.
    pub category: Option<String>,
    pub description: Option<String>,
    /// Owner carried over from a loaded record. Replaced by the session user on save.
    pub user_id: Option<String>,
}

impl ExpenseDraft {
    pub fn manual(nombre_archivo: impl Into<String>) -> Self {
        Self {
            nombre_archivo: nombre_archivo.into(),
            ..Self::default()
        }
    }

    /// Pre-fill the form from a successful OCR result.
    pub fn from_ocr(response: &OcrResponse) -> Option<Self> {
        if !response.success {
            return None;
        }
        let boleta = response.boleta.as_ref()?;
        Some(Self {
            nombre_archivo: boleta.nombre_archivo.clone(),
            text: boleta.text.clone(),
            merchant: boleta.merchant.clone(),
            total_amount: boleta.total_amount,
            date: boleta.date,
            confidence: boleta.confidence,
            category: None,
            description: None,
            user_id: boleta.user_id.clone(),
        })
    }

    /// Row for the `boletas` table, owned by `user_id`.
    pub fn to_row(&self, user_id: &str) -> serde_json::Value {
        serde_json::json!({
            "nombre_archivo": self.nombre_archivo,
            "text": self.text,
            "merchant": self.merchant,
            "total_amount": self.total_amount,
            "date": self.date.map(|d| d.format("%Y-%m-%d").to_string()),
            "confidence": self.confidence,
            "user_id": user_id,
        })
    }
}
