//! Receipt ingestion: image bytes -> OCR text -> parsed fields -> stored boleta.

use crate::database::BoletaStore;
use crate::models::{Boleta, NewBoleta};
use crate::services::ocr_engine::{OcrEngine, OcrError};
use crate::services::receipt_parser::parse_receipt_text;

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("No se pudo extraer texto de la imagen")]
    NoText,
    #[error("El archivo no es una imagen válida.")]
    NotAnImage,
    #[error(transparent)]
    Ocr(OcrError),
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl From<OcrError> for IngestError {
    fn from(e: OcrError) -> Self {
        match e {
            OcrError::NotAnImage => IngestError::NotAnImage,
            other => IngestError::Ocr(other),
        }
    }
}

pub async fn ingest_receipt(
    ocr: &dyn OcrEngine,
    store: &dyn BoletaStore,
    user_id: &str,
    nombre_archivo: &str,
    image: &[u8],
) -> Result<Boleta, IngestError> {
    let text = ocr.extract_text(image).await?;
    if text.trim().is_empty() {
        return Err(IngestError::NoText);
    }

    let parsed = parse_receipt_text(&text);
    let boleta = store
        .create(NewBoleta {
            nombre_archivo: nombre_archivo.to_string(),
            text: Some(text),
            merchant: parsed.merchant,
            total_amount: parsed.total_amount,
            date: parsed.date,
            confidence: Some(parsed.confidence),
            user_id: user_id.to_string(),
        })
        .await?;

    tracing::info!("OCR processed for user {}: boleta {}", user_id, boleta.id);
    Ok(boleta)
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error("object larger than {0} bytes")]
    TooLarge(usize),
}

/// Download an object through a short-lived signed URL, reading at most `max_bytes`.
pub async fn fetch_signed_object(
    client: &reqwest::Client,
    signed_url: &str,
    max_bytes: usize,
) -> Result<Vec<u8>, FetchError> {
    let mut response = client.get(signed_url).send().await?.error_for_status()?;
    if response.content_length().is_some_and(|len| len > max_bytes as u64) {
        return Err(FetchError::TooLarge(max_bytes));
    }

    let mut body = Vec::new();
    while let Some(chunk) = response.chunk().await? {
        if body.len() + chunk.len() > max_bytes {
            return Err(FetchError::TooLarge(max_bytes));
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}
