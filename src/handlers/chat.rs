use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;

use super::auth::{booking_id, owned_booking, require_client};
use crate::db::queries;
use crate::errors::AppError;
use crate::models::{ChatRecord, Review};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ChatInput {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ReviewInput {
    pub rating: Option<i64>,
    pub comment: String,
}

/// Reviews arrive either as a plain object or wrapped as `{"data": "<json>"}`.
fn parse_review(body: serde_json::Value) -> Result<ReviewInput, AppError> {
    let body = match body.get("data") {
        Some(serde_json::Value::String(raw)) => serde_json::from_str(raw)
            .map_err(|e| AppError::field("data", format!("Invalid JSON: {e}")))?,
        _ => body,
    };
    serde_json::from_value(body).map_err(|e| AppError::BadRequest(e.to_string()))
}

// GET /api/client/bookings/:id/chat
pub async fn list_chat(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<Vec<ChatRecord>>, AppError> {
    let user = require_client(&state, &headers)?;
    let id = booking_id(path)?;
    let db = state.db()?;
    owned_booking(&db, &user, id)?;
    Ok(Json(queries::get_chat_records(&db, id)?))
}

// POST /api/client/bookings/:id/chat
pub async fn post_chat(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    path: Result<Path<i64>, PathRejection>,
    body: Result<Json<ChatInput>, JsonRejection>,
) -> Result<Json<ChatRecord>, AppError> {
    let user = require_client(&state, &headers)?;
    let id = booking_id(path)?;
    let db = state.db()?;
    owned_booking(&db, &user, id)?;

    let Json(input) = body.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
    let message = input.message.trim();
    if message.is_empty() {
        return Err(AppError::field("message", "This field may not be blank."));
    }

    let record_id = queries::insert_chat_record(&db, id, user.id, message)?;
    tracing::info!(booking_id = id, record_id, author_id = user.id, "chat message posted");

    let record = queries::get_chat_records(&db, id)?
        .into_iter()
        .find(|r| r.id == record_id)
        .ok_or_else(|| AppError::NotFound("chat record".to_string()))?;
    Ok(Json(record))
}

// GET /api/client/bookings/:id/review
pub async fn list_reviews(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<Vec<Review>>, AppError> {
    let user = require_client(&state, &headers)?;
    let id = booking_id(path)?;
    let db = state.db()?;
    owned_booking(&db, &user, id)?;
    Ok(Json(queries::get_reviews(&db, id)?))
}

// POST /api/client/bookings/:id/review
pub async fn post_review(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    path: Result<Path<i64>, PathRejection>,
    body: Result<Json<serde_json::Value>, JsonRejection>,
) -> Result<Json<Review>, AppError> {
    let user = require_client(&state, &headers)?;
    let id = booking_id(path)?;
    let db = state.db()?;
    owned_booking(&db, &user, id)?;

    let Json(body) = body.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
    let input = parse_review(body)?;
    let rating = match input.rating {
        None => return Err(AppError::field("rating", "This field is required.")),
        Some(rating) if !(1..=5).contains(&rating) => {
            return Err(AppError::field("rating", "Ensure this value is between 1 and 5."))
        }
        Some(rating) => rating,
    };

    let review_id = queries::insert_review(&db, id, user.id, rating, input.comment.trim())?;
    tracing::info!(booking_id = id, review_id, rating, "review posted");

    let review = queries::get_reviews(&db, id)?
        .into_iter()
        .find(|r| r.id == review_id)
        .ok_or_else(|| AppError::NotFound("review".to_string()))?;
    Ok(Json(review))
}
