use axum::extract::rejection::PathRejection;
use axum::extract::Path;
use axum::http::HeaderMap;
use rusqlite::Connection;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Booking, User};
use crate::state::AppState;

fn token_from_headers(headers: &HeaderMap) -> Option<&str> {
    let auth = headers.get("authorization")?.to_str().ok()?;
    auth.strip_prefix("Token ")
        .or_else(|| auth.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

pub fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<User, AppError> {
    let token = token_from_headers(headers).ok_or(AppError::Unauthorized)?;
    let db = state.db()?;
    queries::get_user_by_token(&db, token)?.ok_or(AppError::Unauthorized)
}

/// Booking endpoints are for students only; provider managers get 403.
pub fn require_client(state: &AppState, headers: &HeaderMap) -> Result<User, AppError> {
    let user = authenticate(state, headers)?;
    if !user.is_student() {
        return Err(AppError::Forbidden(
            "you do not have permission to perform this action".to_string(),
        ));
    }
    Ok(user)
}

/// A path id that is not an integer names no booking.
pub fn booking_id(path: Result<Path<i64>, PathRejection>) -> Result<i64, AppError> {
    path.map(|Path(id)| id)
        .map_err(|_| AppError::NotFound("booking".to_string()))
}

/// Loads booking `id` and checks that `user` owns it.
pub fn owned_booking(conn: &Connection, user: &User, id: i64) -> Result<Booking, AppError> {
    let booking = queries::get_booking_by_id(conn, id)?
        .ok_or_else(|| AppError::NotFound("booking".to_string()))?;
    if booking.user_id != user.id {
        return Err(AppError::Forbidden(
            "you do not have permission to access this booking".to_string(),
        ));
    }
    Ok(booking)
}
