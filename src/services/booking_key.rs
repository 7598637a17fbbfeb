use base64::Engine;
use hmac::{Hmac, Mac};
use sha1::Sha1;

use crate::db::queries::format_timestamp;
use crate::models::Booking;

/// Signed, URL-safe key identifying a booking in share and payment links.
pub fn booking_key(secret: &str, booking: &Booking) -> anyhow::Result<String> {
    let mut mac = Hmac::<Sha1>::new_from_slice(secret.as_bytes())
        .map_err(|e| anyhow::anyhow!("invalid booking key secret: {e}"))?;
    mac.update(format!("{}:{}", booking.id, format_timestamp(&booking.created_at)).as_bytes());
    let digest = mac.finalize().into_bytes();
    Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(digest))
}
