use axum::{
    extract::{
        multipart::MultipartRejection,
        rejection::JsonRejection,
        Multipart, State,
    },
    Extension, Json,
};

use crate::error::{ApiError, ApiResult};
use crate::middleware::AuthUser;
use crate::models::{BoletaOut, OcrFromStorageRequest, OcrResponse};
use crate::services::{fetch_signed_object, ingest_receipt, FetchError, IngestError};
use crate::AppState;

fn too_large_message(max_bytes: usize) -> String {
    format!("Archivo demasiado grande (máx {}MB)", max_bytes / (1024 * 1024))
}

/// POST /ocr - multipart `file` upload, OCR'd and stored for the caller.
pub async fn upload_and_extract(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<BoletaOut>> {
    let mut multipart = multipart?;
    let mut upload: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Formulario inválido: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let is_image = field
            .content_type()
            .is_some_and(|ct| ct.starts_with("image/"));
        if !is_image {
            return Err(ApiError::BadRequest("Archivo debe ser una imagen".to_string()));
        }
        let filename = field.file_name().unwrap_or("receipt").to_string();
        let bytes = field.bytes().await.map_err(|e| {
            tracing::warn!("Upload read failed: {:?}", e);
            ApiError::BadRequest(too_large_message(state.config.max_upload_bytes))
        })?;
        upload = Some((filename, bytes.to_vec()));
    }

    let (filename, image) =
        upload.ok_or_else(|| ApiError::BadRequest("Falta el archivo 'file'".to_string()))?;
    if image.len() > state.config.max_upload_bytes {
        return Err(ApiError::BadRequest(too_large_message(state.config.max_upload_bytes)));
    }

    let boleta = ingest_receipt(&*state.ocr, &*state.store, &user.user_id, &filename, &image)
        .await
        .map_err(|e| match e {
            IngestError::NoText | IngestError::NotAnImage => ApiError::BadRequest(e.to_string()),
            IngestError::Ocr(err) => ApiError::Internal(anyhow::Error::new(err)),
            IngestError::Store(err) => ApiError::Internal(err),
        })?;

    Ok(Json(boleta.into()))
}

/// POST /ocr/from-storage - fetch the object behind a signed URL and process it.
/// Once the request is authenticated and well-formed, failures are reported in
/// the body rather than the status.
pub async fn extract_from_storage(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<OcrFromStorageRequest>, JsonRejection>,
) -> ApiResult<Json<OcrResponse>> {
    let Json(payload) = payload?;
    let max_bytes = state.config.max_upload_bytes;

    if !state.config.allows_storage_url(&payload.signed_url) {
        tracing::warn!("Rejected signed URL outside storage origin for user {}", user.user_id);
        return Ok(Json(OcrResponse::failed("URL de almacenamiento no permitida")));
    }

    let image = match fetch_signed_object(&state.http_client, &payload.signed_url, max_bytes).await {
        Ok(bytes) => bytes,
        Err(FetchError::TooLarge(_)) => {
            tracing::warn!("Stored object over {} bytes for user {}", max_bytes, user.user_id);
            return Ok(Json(OcrResponse::failed(too_large_message(max_bytes))));
        }
        Err(e) => {
            tracing::error!("Error downloading image from storage: {:?}", e);
            return Ok(Json(OcrResponse::failed("Error descargando imagen desde storage")));
        }
    };

    let result = ingest_receipt(
        &*state.ocr,
        &*state.store,
        &user.user_id,
        &payload.nombre_archivo,
        &image,
    )
    .await;

    let response = match result {
        Ok(boleta) => OcrResponse::ok(boleta),
        Err(e @ (IngestError::NoText | IngestError::NotAnImage)) => OcrResponse::failed(e.to_string()),
        Err(e) => {
            tracing::error!("Error processing OCR from storage: {:?}", e);
            OcrResponse::failed("Error interno del servidor")
        }
    };
    Ok(Json(response))
}
