use std::sync::{Arc, Mutex};

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use course_bookings::config::AppConfig;
use course_bookings::db;
use course_bookings::handlers;
use course_bookings::services::mail::http::HttpMailer;
use course_bookings::services::mail::{LogMailer, Mailer};
use course_bookings::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let conn = db::init_db(&config.database_url)?;

    let mailer: Box<dyn Mailer> = if config.mail_api_url.is_empty() {
        tracing::warn!("MAIL_API_URL not set, emails will only be logged");
        Box::new(LogMailer)
    } else {
        anyhow::ensure!(
            !config.mail_api_key.is_empty(),
            "MAIL_API_KEY must be set when MAIL_API_URL is configured"
        );
        tracing::info!("using HTTP mailer (url: {})", config.mail_api_url);
        Box::new(HttpMailer::new(
            config.mail_api_url.clone(),
            config.mail_api_key.clone(),
            config.mail_from.clone(),
        ))
    };

    if config.booking_key_secret == "changeme" {
        tracing::warn!("BOOKING_KEY_SECRET is the default value, set it in production");
    }

    let state = Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        config: config.clone(),
        mailer,
    });

    let app = handlers::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
