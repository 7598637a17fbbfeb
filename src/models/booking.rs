use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: i64,
    pub user_id: i64,
    pub created_by: Option<i64>,
    pub course_id: i64,
    pub accommodation_id: i64,
    pub person_count: i64,
    pub start_at: NaiveDate,
    pub weeks_count: i64,
    pub callback: bool,
    pub status: BookingStatus,
    pub course_price: Decimal,
    pub accommodation_price: Decimal,
    pub total_price: Decimal,
    pub paid: Option<Decimal>,
    pub paid_at: Option<DateTime<Utc>>,
    pub viewed: bool,
    pub user_location: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    New,
    WaitingSchool,
    WaitingUpdate,
    WaitingPayment,
    OnCourse,
    Cancelled,
    Finished,
    Deleted,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::New => "new",
            BookingStatus::WaitingSchool => "waiting_school",
            BookingStatus::WaitingUpdate => "waiting_update",
            BookingStatus::WaitingPayment => "waiting_payment",
            BookingStatus::OnCourse => "on_course",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::Finished => "finished",
            BookingStatus::Deleted => "deleted",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "new" => Some(BookingStatus::New),
            "waiting_school" => Some(BookingStatus::WaitingSchool),
            "waiting_update" => Some(BookingStatus::WaitingUpdate),
            "waiting_payment" => Some(BookingStatus::WaitingPayment),
            "on_course" => Some(BookingStatus::OnCourse),
            "cancelled" => Some(BookingStatus::Cancelled),
            "finished" => Some(BookingStatus::Finished),
            "deleted" => Some(BookingStatus::Deleted),
            _ => None,
        }
    }

    /// Status the booking moves to when its owner saves an edit, or `None`
    /// when the booking is past the point where students may change it.
    pub fn after_client_edit(&self) -> Option<BookingStatus> {
        match self {
            BookingStatus::New | BookingStatus::WaitingSchool | BookingStatus::WaitingUpdate => {
                Some(BookingStatus::WaitingSchool)
            }
            BookingStatus::WaitingPayment
            | BookingStatus::OnCourse
            | BookingStatus::Cancelled
            | BookingStatus::Finished
            | BookingStatus::Deleted => None,
        }
    }

    pub fn is_locked(&self) -> bool {
        self.after_client_edit().is_none()
    }
}

/// A traveler on a booking. Doubles as the request payload: every field is
/// optional on input and serialized as `null` when unset.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BookingPerson {
    pub id: Option<i64>,
    pub order: i64,
    pub gender: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub citizenship: Option<String>,
    pub mother_tongue: Option<String>,
    pub language_level: Option<String>,
    pub passport_number: Option<String>,
    pub passport_image_url: Option<String>,
    pub phone: Option<String>,
    pub phone2: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub zip_code: Option<String>,
    #[serde(default = "default_newbee")]
    pub newbee: bool,
    pub disability: bool,
    pub disability_description: Option<String>,
    pub legal_guardian_name: Option<String>,
    pub legal_guardian_last_name: Option<String>,
    pub legal_guardian_phone: Option<String>,
    pub legal_guardian_address: Option<String>,
    pub preferences_smoker: Option<String>,
    pub preferences_pets: Option<String>,
    pub preferences_children: Option<String>,
    pub preferences_diet: Option<String>,
    pub preferences_allergies: Option<String>,
    pub preferences_other: Option<String>,
}

fn default_newbee() -> bool {
    true
}

impl BookingPerson {
    pub fn blank(order: i64) -> Self {
        Self {
            order,
            gender: Some("M".to_string()),
            newbee: true,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BookingsExtra {
    pub id: i64,
    pub extra: i64,
    pub school_extra_id: Option<i64>,
    pub name: String,
    pub price: Decimal,
}

/// Row of the caller's booking list.
#[derive(Debug, Clone, Serialize)]
pub struct BookingSummary {
    pub id: i64,
    pub school_id: i64,
    pub school_name: String,
    pub course_name: String,
    pub accommodation_name: String,
    pub extras_names: Vec<String>,
    pub weeks_count: i64,
    pub start_at: NaiveDate,
    pub person_count: i64,
    pub status: BookingStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct BookingDocument {
    pub id: i64,
    pub name: String,
    pub url: String,
    pub created_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trips_through_str() {
        for status in [
            BookingStatus::New,
            BookingStatus::WaitingSchool,
            BookingStatus::WaitingUpdate,
            BookingStatus::WaitingPayment,
            BookingStatus::OnCourse,
            BookingStatus::Cancelled,
            BookingStatus::Finished,
            BookingStatus::Deleted,
        ] {
            assert_eq!(BookingStatus::parse(status.as_str()), Some(status));
        }
    }

    #[test]
    fn test_unknown_status_is_rejected() {
        assert_eq!(BookingStatus::parse("bogus"), None);
    }

    #[test]
    fn test_editable_statuses_move_to_waiting_school() {
        assert_eq!(
            BookingStatus::New.after_client_edit(),
            Some(BookingStatus::WaitingSchool)
        );
        assert_eq!(
            BookingStatus::WaitingUpdate.after_client_edit(),
            Some(BookingStatus::WaitingSchool)
        );
        assert_eq!(
            BookingStatus::WaitingSchool.after_client_edit(),
            Some(BookingStatus::WaitingSchool)
        );
    }

    #[test]
    fn test_locked_statuses() {
        assert!(BookingStatus::WaitingPayment.is_locked());
        assert!(BookingStatus::OnCourse.is_locked());
        assert!(BookingStatus::Cancelled.is_locked());
        assert!(BookingStatus::Finished.is_locked());
        assert!(BookingStatus::Deleted.is_locked());
        assert!(!BookingStatus::New.is_locked());
    }

    #[test]
    fn test_person_defaults_from_empty_json() {
        let person: BookingPerson = serde_json::from_str("{}").unwrap();
        assert_eq!(person.id, None);
        assert!(person.newbee);
        assert!(!person.disability);
        assert_eq!(person.order, 0);
    }

    #[test]
    fn test_person_serializes_unset_fields_as_null() {
        let json = serde_json::to_value(BookingPerson::blank(0)).unwrap();
        assert_eq!(json["gender"], "M");
        assert!(json["first_name"].is_null());
        assert!(json["passport_image_url"].is_null());
        assert_eq!(json["newbee"], true);
    }
}
