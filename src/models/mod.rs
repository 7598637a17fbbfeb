pub mod booking;
pub mod catalog;
pub mod chat;
pub mod user;

pub use booking::{
    Booking, BookingDocument, BookingPerson, BookingStatus, BookingSummary,
    BookingsExtra,
};
pub use catalog::{Accommodation, Course, Currency, PriceRange, School, SchoolExtra};
pub use chat::{ChatRecord, Review};
pub use user::{Role, User, UserSummary};
