use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;

use crate::error::{ApiError, ApiResult};
use crate::middleware::AuthUser;
use crate::models::{BoletaId, BoletaListResponse, BoletaOut, BoletaStats, CreateBoletaRequest};
use crate::AppState;

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

pub async fn list_boletas(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    params: Result<Query<ListParams>, QueryRejection>,
) -> ApiResult<Json<BoletaListResponse>> {
    let Query(params) = params?;
    let page = params.page.unwrap_or(1);
    let limit = params.limit.unwrap_or(DEFAULT_PAGE_SIZE);
    if page < 1 {
        return Err(ApiError::Unprocessable("page must be >= 1".to_string()));
    }
    if !(1..=MAX_PAGE_SIZE).contains(&limit) {
        return Err(ApiError::Unprocessable(format!(
            "limit must be between 1 and {}",
            MAX_PAGE_SIZE
        )));
    }

    let (items, total) = state.store.list(&user.user_id, page, limit).await?;
    Ok(Json(BoletaListResponse::new(items, total, page, limit)))
}

/// Manual expense entry. The owner is always the token subject.
pub async fn create_boleta(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    payload: Result<Json<CreateBoletaRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<BoletaOut>)> {
    let Json(payload) = payload?;
    if payload.nombre_archivo.trim().is_empty() {
        return Err(ApiError::Unprocessable("nombre_archivo es requerido".to_string()));
    }
    if payload.confidence.is_some_and(|c| !(0.0..=1.0).contains(&c)) {
        return Err(ApiError::Unprocessable("confidence must be between 0 and 1".to_string()));
    }
    if payload.total_amount.is_some_and(|a| !a.is_finite()) {
        return Err(ApiError::Unprocessable("total_amount must be a number".to_string()));
    }
    if let Some(claimed) = payload.user_id.as_deref().filter(|c| *c != user.user_id) {
        tracing::warn!("Ignoring client-supplied user_id {} for {}", claimed, user.user_id);
    }

    let boleta = state.store.create(payload.into_new(&user.user_id)).await?;
    Ok((StatusCode::CREATED, Json(boleta.into())))
}

pub async fn get_boleta(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    id: Result<Path<BoletaId>, PathRejection>,
) -> ApiResult<Json<BoletaOut>> {
    let Path(id) = id?;
    state
        .store
        .get(id, &user.user_id)
        .await?
        .map(|b| Json(b.into()))
        .ok_or_else(|| ApiError::NotFound("Boleta no encontrada".to_string()))
}

pub async fn delete_boleta(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    id: Result<Path<BoletaId>, PathRejection>,
) -> ApiResult<StatusCode> {
    let Path(id) = id?;
    if state.store.delete(id, &user.user_id).await? {
        tracing::info!("Boleta {} deleted for user {}", id, user.user_id);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("Boleta no encontrada".to_string()))
    }
}

pub async fn get_stats(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<Json<BoletaStats>> {
    Ok(Json(state.store.stats(&user.user_id).await?))
}
