//! Apartment handlers: listing, stats, filter options, read, create, update, delete,
//! project lookup and featured recommendations.

use crate::error::AppError;
use crate::response::{success_many, success_one, success_one_ok};
use crate::service::{
    ListingService, RecordService, RequestValidator, StatsService, DEFAULT_FEATURED_LIMIT, DEFAULT_SIMILAR_LIMIT,
};
use crate::query::MAX_PAGE_LIMIT;
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::Value;
use std::collections::HashMap;

/// Body rejections are reported in the standard error envelope, keeping axum's status
/// for oversized bodies and missing content types.
fn json_body(body: Result<Json<Value>, JsonRejection>) -> Result<Value, AppError> {
    body.map(|Json(v)| v).map_err(|e| match e.status() {
        StatusCode::PAYLOAD_TOO_LARGE => AppError::PayloadTooLarge(e.body_text()),
        StatusCode::UNSUPPORTED_MEDIA_TYPE => AppError::UnsupportedMediaType(e.body_text()),
        _ => AppError::BadRequest(e.body_text()),
    })
}

pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, AppError> {
    let request = RequestValidator::listing(&params)?;
    let page = ListingService::list(state.store.as_ref(), &request).await?;
    Ok((StatusCode::OK, Json(page)))
}

pub async fn stats(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let report = StatsService::report(state.store.as_ref()).await?;
    Ok(success_one_ok(report))
}

pub async fn filter_options(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let options = StatsService::filter_options(state.store.as_ref()).await?;
    Ok(success_one_ok(options))
}

pub async fn read(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = RequestValidator::id(&id)?;
    let detail = RecordService::detail(state.store.as_ref(), id, DEFAULT_SIMILAR_LIMIT).await?;
    Ok(success_one_ok(detail))
}

pub async fn create(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let draft = RequestValidator::new_apartment(json_body(body)?)?;
    let created = RecordService::create(state.store.as_ref(), &draft).await?;
    Ok(success_one(created))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let id = RequestValidator::id(&id)?;
    let patch = RequestValidator::patch(json_body(body)?)?;
    let updated = RecordService::update(state.store.as_ref(), id, &patch).await?;
    Ok(success_one_ok(updated))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = RequestValidator::id(&id)?;
    let deleted = RecordService::soft_delete(state.store.as_ref(), id).await?;
    Ok(success_one_ok(deleted))
}

pub async fn by_project(
    State(state): State<AppState>,
    Path(project_name): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let rows = RecordService::by_project(state.store.as_ref(), &project_name).await?;
    Ok(success_many(rows))
}

pub async fn featured(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, AppError> {
    let limit = RequestValidator::limit_only(&params, DEFAULT_FEATURED_LIMIT, MAX_PAGE_LIMIT)?;
    let rows = RecordService::featured(state.store.as_ref(), limit).await?;
    Ok(success_many(rows))
}
