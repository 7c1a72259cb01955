use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;

use super::{error::ApiError, AppState};
use crate::model::{Form, FormUpdate, NewForm};

const DEFAULT_LIMIT: u32 = 10;

fn default_limit() -> u32 {
    DEFAULT_LIMIT
}

#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    skip: u32,
    #[serde(default = "default_limit")]
    limit: u32,
}

fn path_id(path: Result<Path<i64>, PathRejection>) -> Result<i64, ApiError> {
    path.map(|Path(id)| id)
        .map_err(|rejection| ApiError::Unprocessable(rejection.body_text()))
}

fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    body.map(|Json(value)| value)
        .map_err(|rejection| ApiError::Unprocessable(rejection.body_text()))
}

pub async fn root_handler() -> impl IntoResponse {
    Json(json!({ "message": "Welcome to Form Management API" }))
}

pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(json!({ "status": "ok", "sync": state.sync.stats() }))
}

pub async fn create_form_handler(
    State(state): State<AppState>,
    body: Result<Json<NewForm>, JsonRejection>,
) -> Result<(StatusCode, Json<Form>), ApiError> {
    let new_form = json_body(body)?;
    new_form.validate()?;

    let form = state
        .with_storage(move |storage| storage.create_form(&new_form, super::API_ACTOR))
        .await?;

    tracing::info!(id = form.id, "Form created");
    state.sync.sync_all();

    Ok((StatusCode::CREATED, Json(form)))
}

pub async fn list_forms_handler(
    State(state): State<AppState>,
    Query(page): Query<Pagination>,
) -> Result<Json<Vec<Form>>, ApiError> {
    let forms = state
        .with_storage(move |storage| storage.list_forms(page.skip, page.limit))
        .await?;

    Ok(Json(forms))
}

pub async fn get_form_handler(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<Form>, ApiError> {
    let id = path_id(path)?;

    state
        .with_storage(move |storage| storage.get_form(id))
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound)
}

pub async fn update_form_handler(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
    body: Result<Json<FormUpdate>, JsonRejection>,
) -> Result<Json<Form>, ApiError> {
    let id = path_id(path)?;
    let update = json_body(body)?;

    // A missing form is reported before any field validation
    let updated = state
        .with_storage(move |storage| {
            if storage.get_form(id)?.is_none() {
                return Ok(None);
            }
            update.validate()?;
            storage.update_form(id, &update, super::API_ACTOR)
        })
        .await?
        .ok_or(ApiError::NotFound)?;

    tracing::info!(id, "Form updated");
    state.sync.sync_all();

    Ok(Json(updated))
}

pub async fn delete_form_handler(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let id = path_id(path)?;

    let deleted = state
        .with_storage(move |storage| storage.delete_form(id, super::API_ACTOR))
        .await?;
    if !deleted {
        return Err(ApiError::NotFound);
    }

    tracing::info!(id, "Form deleted");
    state.sync.sync_all();

    Ok(StatusCode::NO_CONTENT)
}
