pub mod booking_key;
pub mod bookings;
pub mod mail;
pub mod notifications;
pub mod pricing;
