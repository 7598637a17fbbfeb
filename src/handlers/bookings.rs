use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Serialize;

use super::auth::{booking_id, owned_booking, require_client};
use crate::config::AppConfig;
use crate::db::queries;
use crate::errors::AppError;
use crate::models::{
    Booking, BookingDocument, BookingPerson, BookingStatus, BookingSummary, BookingsExtra, School,
    UserSummary,
};
use crate::services::bookings::{self, BookingInput};
use crate::services::{booking_key, notifications, pricing};
use crate::state::AppState;

fn format_api_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()
}

#[derive(Serialize)]
pub struct BookingDetail {
    id: i64,
    status: BookingStatus,
    course: i64,
    accommodation: i64,
    school: School,
    person_count: i64,
    start_at: NaiveDate,
    weeks_count: i64,
    callback: bool,
    course_price: Decimal,
    accommodation_price: Decimal,
    total_price: Decimal,
    fee_price: Decimal,
    paid: Option<Decimal>,
    paid_at: Option<String>,
    created_at: String,
    viewed: bool,
    user: UserSummary,
    persons: Vec<BookingPerson>,
    bookingsextra_set: Vec<BookingsExtra>,
    documents: Vec<BookingDocument>,
    rates_prices: BTreeMap<String, BTreeMap<&'static str, Decimal>>,
    key: String,
    inactive: bool,
    user_location: Option<String>,
}

fn booking_detail(
    conn: &Connection,
    config: &AppConfig,
    booking: &Booking,
) -> Result<BookingDetail, AppError> {
    let course = queries::get_course(conn, booking.course_id)?
        .ok_or_else(|| AppError::NotFound("course".to_string()))?;
    let school = queries::get_school(conn, course.school_id)?
        .ok_or_else(|| AppError::NotFound("school".to_string()))?;
    let user = queries::get_user(conn, booking.user_id)?
        .ok_or_else(|| AppError::NotFound("user".to_string()))?;
    let currencies = queries::list_currencies(conn)?;

    Ok(BookingDetail {
        id: booking.id,
        status: booking.status,
        course: booking.course_id,
        accommodation: booking.accommodation_id,
        fee_price: school.fee_price,
        school,
        person_count: booking.person_count,
        start_at: booking.start_at,
        weeks_count: booking.weeks_count,
        callback: booking.callback,
        course_price: booking.course_price,
        accommodation_price: booking.accommodation_price,
        total_price: booking.total_price,
        paid: booking.paid,
        paid_at: booking.paid_at.as_ref().map(format_api_timestamp),
        created_at: format_api_timestamp(&booking.created_at),
        viewed: booking.viewed,
        user: UserSummary::from(&user),
        persons: queries::get_booking_persons(conn, booking.id)?,
        bookingsextra_set: queries::get_booking_extras(conn, booking.id)?,
        documents: queries::get_booking_documents(conn, booking.id)?,
        rates_prices: pricing::rates_prices(
            &currencies,
            booking.course_price,
            booking.accommodation_price,
            booking.total_price,
        ),
        key: booking_key::booking_key(&config.booking_key_secret, booking)?,
        inactive: booking.status.is_locked(),
        user_location: booking.user_location.clone(),
    })
}

fn reload_detail(state: &AppState, id: i64) -> Result<BookingDetail, AppError> {
    let db = state.db()?;
    let booking = queries::get_booking_by_id(&db, id)?
        .ok_or_else(|| AppError::NotFound("booking".to_string()))?;
    booking_detail(&db, &state.config, &booking)
}

fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    body.map(|Json(value)| value)
        .map_err(|rejection| AppError::BadRequest(rejection.body_text()))
}

// GET /api/client/bookings/my
pub async fn my(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Vec<BookingSummary>>, AppError> {
    let user = require_client(&state, &headers)?;
    let db = state.db()?;
    Ok(Json(queries::list_user_bookings(&db, user.id)?))
}

// GET /api/client/bookings/my_not_viewed_count
pub async fn my_not_viewed_count(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, AppError> {
    let user = require_client(&state, &headers)?;
    let db = state.db()?;
    let not_viewed = queries::count_not_viewed(&db, user.id)?;
    Ok(Json(serde_json::json!({ "not_viewed_count": not_viewed })))
}

// POST /api/client/bookings/my_set_viewed
pub async fn my_set_viewed(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, AppError> {
    let user = require_client(&state, &headers)?;
    let db = state.db()?;
    let marked = queries::mark_all_viewed(&db, user.id)?;
    tracing::debug!(user_id = user.id, marked, "bookings marked viewed");
    Ok(Json(serde_json::json!({ "not_viewed_count": 0 })))
}

// POST /api/client/bookings
pub async fn create(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Result<Json<BookingInput>, JsonRejection>,
) -> Result<(StatusCode, Json<BookingDetail>), AppError> {
    let user = require_client(&state, &headers)?;
    let input = json_body(body)?;

    let id = {
        let mut db = state.db()?;
        bookings::create_booking(&mut db, &user, input)?
    };

    Ok((StatusCode::CREATED, Json(reload_detail(&state, id)?)))
}

// GET /api/client/bookings/:id
pub async fn retrieve(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<BookingDetail>, AppError> {
    let user = require_client(&state, &headers)?;
    let id = booking_id(path)?;
    let db = state.db()?;
    let booking = owned_booking(&db, &user, id)?;
    Ok(Json(booking_detail(&db, &state.config, &booking)?))
}

// PUT /api/client/bookings/:id
pub async fn update(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    path: Result<Path<i64>, PathRejection>,
    body: Result<Json<BookingInput>, JsonRejection>,
) -> Result<Json<BookingDetail>, AppError> {
    apply_update(state, headers, path, body, false).await
}

// PATCH /api/client/bookings/:id
pub async fn partial_update(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    path: Result<Path<i64>, PathRejection>,
    body: Result<Json<BookingInput>, JsonRejection>,
) -> Result<Json<BookingDetail>, AppError> {
    apply_update(state, headers, path, body, true).await
}

async fn apply_update(
    state: Arc<AppState>,
    headers: HeaderMap,
    path: Result<Path<i64>, PathRejection>,
    body: Result<Json<BookingInput>, JsonRejection>,
    partial: bool,
) -> Result<Json<BookingDetail>, AppError> {
    let user = require_client(&state, &headers)?;
    let id = booking_id(path)?;

    let change = {
        let mut db = state.db()?;
        let booking = owned_booking(&db, &user, id)?;
        if booking.status.is_locked() {
            return Err(AppError::Forbidden(format!(
                "booking in status {} can not be edited",
                booking.status.as_str()
            )));
        }
        let input = json_body(body)?;
        bookings::update_booking(&mut db, &booking, input, partial)?
    };

    let notice = notifications::notice_for(change.old_status, change.new_status, change.has_creator);
    let emails = {
        let db = state.db()?;
        notifications::build_emails(&db, &state.config, change.booking_id, notice)
    };
    match emails {
        Ok(emails) => notifications::deliver(state.mailer.as_ref(), &emails).await,
        Err(e) => tracing::error!(error = %e, booking_id = id, "failed to prepare booking emails"),
    }

    Ok(Json(reload_detail(&state, id)?))
}

// GET /api/client/bookings/:id/delete
pub async fn delete(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<serde_json::Value>, AppError> {
    let user = require_client(&state, &headers)?;
    let id = booking_id(path)?;
    let db = state.db()?;
    let booking = owned_booking(&db, &user, id)?;
    bookings::soft_delete(&db, &booking)?;
    Ok(Json(serde_json::json!({ "message": "success" })))
}
