use std::env;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub mail_api_url: String,
    pub mail_api_key: String,
    pub mail_from: String,
    pub booking_key_secret: String,
    pub email_booking_create_client_confirm: String,
    pub email_booking_create_user: String,
    pub email_booking_update_user: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "bookings.db".to_string()),
            mail_api_url: env::var("MAIL_API_URL").unwrap_or_default(),
            mail_api_key: env::var("MAIL_API_KEY").unwrap_or_default(),
            mail_from: env::var("MAIL_FROM")
                .unwrap_or_else(|_| "no-reply@localhost".to_string()),
            booking_key_secret: env::var("BOOKING_KEY_SECRET")
                .unwrap_or_else(|_| "changeme".to_string()),
            email_booking_create_client_confirm: env::var("EMAIL_BOOKING_CREATE_CLIENT_CONFIRM")
                .unwrap_or_else(|_| "Your booking request has been sent".to_string()),
            email_booking_create_user: env::var("EMAIL_BOOKING_CREATE_USER")
                .unwrap_or_else(|_| "New booking request".to_string()),
            email_booking_update_user: env::var("EMAIL_BOOKING_UPDATE_USER")
                .unwrap_or_else(|_| "Booking updated".to_string()),
        }
    }
}
