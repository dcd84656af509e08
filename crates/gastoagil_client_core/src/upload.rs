//! Upload-and-process: picked image -> storage -> signed URL -> OCR backend.
//!
//! One linear attempt per call. There is no retry, no cancellation and no
//! de-duplication: scanning the same image twice stores two objects.

use crate::config::SIGNED_URL_TTL_SECS;
use crate::models::{OcrResponse, ReceiptFile};
use crate::storage::receipt_object_path;
use crate::GastoClient;

/// Progress of one upload-and-process call.
///
/// `Idle` is the state before a call starts (and what a UI returns to after
/// showing a result); it is the `Default` and is never reported by the call
/// itself. A call reports `Uploading`, then `AwaitingOcr` once the object is
/// stored, then exactly one of `Succeeded` or `Failed`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum UploadPhase {
    #[default]
    Idle,
    Uploading,
    AwaitingOcr,
    Succeeded,
    Failed,
}

impl UploadPhase {
    /// True while the scan button should show a spinner.
    pub fn is_scanning(self) -> bool {
        matches!(self, UploadPhase::Uploading | UploadPhase::AwaitingOcr)
    }
}

impl GastoClient {
    pub async fn upload_and_process(&self, file: &ReceiptFile) -> OcrResponse {
        self.upload_and_process_with(file, |_| {}).await
    }

    /// Same as [`upload_and_process`](Self::upload_and_process), reporting each phase change.
    /// Never fails: errors come back as `OcrResponse { success: false, error }`.
    pub async fn upload_and_process_with<F>(&self, file: &ReceiptFile, mut on_phase: F) -> OcrResponse
    where
        F: FnMut(UploadPhase),
    {
        on_phase(UploadPhase::Uploading);
        match self.try_upload_and_process(file, &mut on_phase).await {
            Ok(response) => {
                log::info!("upload_and_process: OCR ok for {}", file.name);
                on_phase(UploadPhase::Succeeded);
                response
            }
            Err(e) => {
                log::error!("upload_and_process failed: {}", e);
                on_phase(UploadPhase::Failed);
                OcrResponse::failed(e)
            }
        }
    }

    async fn try_upload_and_process<F>(&self, file: &ReceiptFile, on_phase: &mut F) -> Result<OcrResponse, String>
    where
        F: FnMut(UploadPhase),
    {
        let user = self.current_user().await?;
        let token = self.access_token().await?;

        if !file.is_image() {
            return Err("El archivo debe ser una imagen".to_string());
        }

        let path = receipt_object_path(&user.id, &file.name);
        self.upload_object(&token, &path, file).await?;
        let signed_url = self.create_signed_url(&token, &path, SIGNED_URL_TTL_SECS).await?;

        on_phase(UploadPhase::AwaitingOcr);
        let response = self.request_ocr(&token, &signed_url, &file.name).await?;

        match response {
            OcrResponse {
                success: true,
                boleta: Some(_),
                ..
            } => Ok(response),
            OcrResponse { success: true, .. } => Err("Respuesta OCR incompleta".to_string()),
            OcrResponse { error, .. } => Err(error.unwrap_or_else(|| "Error desconocido".to_string())),
        }
    }
}
