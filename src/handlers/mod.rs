pub mod auth;
pub mod bookings;
pub mod chat;
pub mod health;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/api/client/bookings", post(bookings::create))
        .route("/api/client/bookings/my", get(bookings::my))
        .route(
            "/api/client/bookings/my_not_viewed_count",
            get(bookings::my_not_viewed_count),
        )
        .route(
            "/api/client/bookings/my_set_viewed",
            post(bookings::my_set_viewed),
        )
        .route(
            "/api/client/bookings/:id",
            get(bookings::retrieve)
                .put(bookings::update)
                .patch(bookings::partial_update),
        )
        .route("/api/client/bookings/:id/delete", get(bookings::delete))
        .route(
            "/api/client/bookings/:id/chat",
            get(chat::list_chat).post(chat::post_chat),
        )
        .route(
            "/api/client/bookings/:id/review",
            get(chat::list_reviews).post(chat::post_review),
        )
        .with_state(state)
}
