use crate::{db, error::AppError, models::CalendarEntry, state::AppState};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

const MISSING_FIELDS: &str = "Missing title, date, or category";
const NOT_FOUND: &str = "Not found";

pub async fn get_entries(
    State(app_state): State<AppState>,
) -> Result<Json<Vec<CalendarEntry>>, AppError> {
    db::get_all_entries(&app_state.pool).await.map(Json)
}

#[derive(Deserialize)]
pub struct CreateEntryPayload {
    title: Option<String>,
    date: Option<NaiveDate>,
    category: Option<String>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub async fn create_entry_handler(
    State(app_state): State<AppState>,
    Json(payload): Json<CreateEntryPayload>,
) -> Result<(StatusCode, Json<CalendarEntry>), AppError> {
    let (Some(title), Some(date), Some(category)) = (
        non_blank(payload.title),
        payload.date,
        non_blank(payload.category),
    ) else {
        return Err(AppError::BadRequest(MISSING_FIELDS.to_string()));
    };

    let entry = db::create_entry(&app_state.pool, &title, date, &category).await?;
    tracing::info!(id = %entry.id, "entry created");
    Ok((StatusCode::CREATED, Json(entry)))
}

#[derive(Deserialize)]
pub struct UpdateEntryPayload {
    title: Option<String>,
    date: Option<NaiveDate>,
    category: Option<String>,
}

pub async fn update_entry_handler(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateEntryPayload>,
) -> Result<Json<CalendarEntry>, AppError> {
    let current = db::find_entry(&app_state.pool, &id)
        .await?
        .ok_or_else(|| AppError::NotFound(NOT_FOUND.to_string()))?;

    let title = non_blank(payload.title).unwrap_or(current.title);
    let date = payload.date.unwrap_or(current.date);
    let category = non_blank(payload.category).unwrap_or(current.category);

    let entry = db::update_entry(&app_state.pool, &id, &title, date, &category)
        .await?
        .ok_or_else(|| AppError::NotFound(NOT_FOUND.to_string()))?;
    tracing::info!(id = %entry.id, "entry updated");
    Ok(Json(entry))
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    ok: bool,
    deleted: CalendarEntry,
}

pub async fn delete_entry_handler(
    State(app_state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, AppError> {
    let deleted = db::delete_entry(&app_state.pool, &id)
        .await?
        .ok_or_else(|| AppError::NotFound(NOT_FOUND.to_string()))?;
    tracing::info!(id = %deleted.id, "entry deleted");
    Ok(Json(DeleteResponse { ok: true, deleted }))
}
