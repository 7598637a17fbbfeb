use std::collections::BTreeSet;

use chrono::{NaiveDate, Utc};
use rusqlite::Connection;
use serde::Deserialize;

use crate::db::queries;
use crate::errors::{AppError, FieldErrors};
use crate::models::{
    Accommodation, Booking, BookingPerson, BookingStatus, Course, SchoolExtra, User,
};
use crate::services::pricing;

const REQUIRED: &str = "This field is required.";

/// Upper bound on travelers per booking.
pub const MAX_PERSONS: i64 = 50;

/// Writable booking fields. Anything else in the request body (`status`,
/// prices, `id`) is read-only and ignored.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct BookingInput {
    pub course: Option<i64>,
    pub accommodation: Option<i64>,
    pub person_count: Option<i64>,
    pub start_at: Option<NaiveDate>,
    pub weeks_count: Option<i64>,
    pub callback: Option<bool>,
    pub persons: Option<Vec<BookingPerson>>,
    pub bookingsextra_set: Option<Vec<ExtraInput>>,
    pub user_location: Option<String>,
}

/// Reference to a school extra. Clients send either `id` or `school_extra_id`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ExtraInput {
    pub id: Option<i64>,
    pub school_extra_id: Option<i64>,
}

impl ExtraInput {
    fn school_extra(&self) -> Option<i64> {
        self.school_extra_id.or(self.id)
    }
}

/// Outcome of an accepted edit, used to decide which emails go out.
#[derive(Debug, Clone, Copy)]
pub struct StatusChange {
    pub booking_id: i64,
    pub old_status: BookingStatus,
    pub new_status: BookingStatus,
    pub has_creator: bool,
}

struct ValidatedBooking {
    course: Course,
    accommodation: Accommodation,
    start_at: NaiveDate,
    weeks_count: i64,
    callback: bool,
    user_location: Option<String>,
    persons: Vec<BookingPerson>,
    extras: Vec<SchoolExtra>,
}

/// Values a partial update falls back to for fields missing from the body.
struct Current<'a> {
    booking: &'a Booking,
    persons: &'a [BookingPerson],
    extras: &'a [SchoolExtra],
}

fn push_error(errors: &mut FieldErrors, field: &str, message: impl Into<String>) {
    errors
        .entry(field.to_string())
        .or_default()
        .push(message.into());
}

fn validate(
    conn: &Connection,
    input: BookingInput,
    existing_persons: &[BookingPerson],
    fallback: Option<Current<'_>>,
) -> Result<ValidatedBooking, AppError> {
    let mut errors = FieldErrors::new();

    let course_id = input.course.or(fallback.as_ref().map(|c| c.booking.course_id));
    let accommodation_id = input
        .accommodation
        .or(fallback.as_ref().map(|c| c.booking.accommodation_id));
    let start_at = input.start_at.or(fallback.as_ref().map(|c| c.booking.start_at));
    let weeks_count = input
        .weeks_count
        .or(fallback.as_ref().map(|c| c.booking.weeks_count));

    let course = match course_id {
        None => {
            push_error(&mut errors, "course", REQUIRED);
            None
        }
        Some(id) => {
            let course = queries::get_course(conn, id)?;
            if course.is_none() {
                push_error(&mut errors, "course", format!("Invalid pk \"{id}\" - object does not exist."));
            }
            course
        }
    };

    let accommodation = match accommodation_id {
        None => {
            push_error(&mut errors, "accommodation", REQUIRED);
            None
        }
        Some(id) => {
            let accommodation = queries::get_accommodation(conn, id)?;
            if accommodation.is_none() {
                push_error(
                    &mut errors,
                    "accommodation",
                    format!("Invalid pk \"{id}\" - object does not exist."),
                );
            }
            accommodation
        }
    };

    if let (Some(course), Some(accommodation)) = (&course, &accommodation) {
        if course.school_id != accommodation.school_id {
            push_error(
                &mut errors,
                "accommodation",
                "Accommodation must belong to the course's school.",
            );
        }
    }

    if start_at.is_none() {
        push_error(&mut errors, "start_at", REQUIRED);
    }
    match weeks_count {
        None => push_error(&mut errors, "weeks_count", REQUIRED),
        Some(weeks) if weeks < 1 => {
            push_error(&mut errors, "weeks_count", "Ensure this value is greater than or equal to 1.")
        }
        Some(_) => {}
    }

    let persons = resolve_persons(&input, existing_persons, fallback.as_ref(), &mut errors);

    let extras = match &input.bookingsextra_set {
        Some(items) => resolve_extras(conn, items, course.as_ref(), &mut errors)?,
        None => fallback.as_ref().map(|c| c.extras.to_vec()).unwrap_or_default(),
    };

    let callback = input
        .callback
        .or(fallback.as_ref().map(|c| c.booking.callback))
        .unwrap_or(false);
    let user_location = input
        .user_location
        .or(fallback.as_ref().and_then(|c| c.booking.user_location.clone()));

    match (course, accommodation, start_at, weeks_count) {
        (Some(course), Some(accommodation), Some(start_at), Some(weeks_count)) if errors.is_empty() => {
            Ok(ValidatedBooking {
                course,
                accommodation,
                start_at,
                weeks_count,
                callback,
                user_location,
                persons,
                extras,
            })
        }
        _ => Err(AppError::Validation(errors)),
    }
}

/// A non-empty `persons` list is authoritative. An empty or missing one keeps
/// the travelers already on the booking, padded with blanks or trimmed to
/// `person_count`.
fn resolve_persons(
    input: &BookingInput,
    existing: &[BookingPerson],
    fallback: Option<&Current<'_>>,
    errors: &mut FieldErrors,
) -> Vec<BookingPerson> {
    let listed = match &input.persons {
        Some(list) => list.clone(),
        None => fallback.map(|c| c.persons.to_vec()).unwrap_or_default(),
    };

    if listed.is_empty() {
        let count = input
            .person_count
            .or(fallback.map(|c| c.booking.person_count))
            .unwrap_or(existing.len().max(1) as i64);
        if count < 1 {
            push_error(errors, "person_count", "Ensure this value is greater than or equal to 1.");
            return vec![];
        }
        if count > MAX_PERSONS {
            push_error(
                errors,
                "person_count",
                format!("Ensure this value is less than or equal to {MAX_PERSONS}."),
            );
            return vec![];
        }
        let count = count as usize;
        let mut persons: Vec<BookingPerson> = existing.iter().take(count).cloned().collect();
        while persons.len() < count {
            persons.push(BookingPerson::blank(persons.len() as i64));
        }
        return persons;
    }

    if listed.len() as i64 > MAX_PERSONS {
        push_error(
            errors,
            "persons",
            format!("Ensure this field has no more than {MAX_PERSONS} elements."),
        );
        return vec![];
    }

    let known: BTreeSet<i64> = existing.iter().filter_map(|p| p.id).collect();
    let mut seen = BTreeSet::new();
    for person in &listed {
        if let Some(id) = person.id {
            if !known.contains(&id) {
                push_error(errors, "persons", format!("Unknown person id {id}."));
            } else if !seen.insert(id) {
                push_error(errors, "persons", format!("Person id {id} is listed more than once."));
            }
        }
        if let Some(gender) = person.gender.as_deref() {
            if gender != "M" && gender != "F" {
                push_error(errors, "persons", format!("\"{gender}\" is not a valid choice."));
            }
        }
    }
    listed
}

fn resolve_extras(
    conn: &Connection,
    items: &[ExtraInput],
    course: Option<&Course>,
    errors: &mut FieldErrors,
) -> Result<Vec<SchoolExtra>, AppError> {
    let mut seen = BTreeSet::new();
    let mut extras = vec![];
    for item in items {
        let Some(id) = item.school_extra() else {
            push_error(errors, "bookingsextra_set", REQUIRED);
            continue;
        };
        if !seen.insert(id) {
            continue;
        }
        match queries::get_school_extra(conn, id)? {
            Some(extra) if course.map_or(true, |c| c.school_id == extra.school_id) => {
                extras.push(extra)
            }
            _ => push_error(errors, "bookingsextra_set", format!("Invalid extra id {id}.")),
        }
    }
    Ok(extras)
}

fn compute_prices(
    conn: &Connection,
    validated: &ValidatedBooking,
    priced_on: NaiveDate,
) -> Result<pricing::BookingPrices, AppError> {
    let course = pricing::course_price(
        conn,
        validated.course.id,
        priced_on,
        validated.weeks_count,
        validated.user_location.as_deref(),
    )?;
    let accommodation = pricing::accommodation_price(
        conn,
        validated.accommodation.id,
        validated.start_at,
        validated.weeks_count,
    )?;

    let (Some(course), Some(accommodation)) = (course, accommodation) else {
        return Err(AppError::field(
            "weeks_count",
            format!("No price available for {} weeks.", validated.weeks_count),
        ));
    };

    Ok(pricing::calculate_totals(
        course,
        accommodation,
        &validated.extras,
        validated.persons.len() as i64,
    ))
}

fn save_persons(conn: &Connection, booking_id: i64, persons: &[BookingPerson]) -> anyhow::Result<()> {
    let mut keep = vec![];
    for person in persons {
        keep.push(queries::save_booking_person(conn, booking_id, person)?);
    }
    queries::delete_booking_persons_except(conn, booking_id, &keep)?;
    Ok(())
}

/// Creates a booking owned and created by `user`. Returns the new id.
pub fn create_booking(
    conn: &mut Connection,
    user: &User,
    input: BookingInput,
) -> Result<i64, AppError> {
    let tx = conn.transaction()?;

    let validated = validate(&tx, input, &[], None)?;
    let now = Utc::now();
    let prices = compute_prices(&tx, &validated, now.date_naive())?;

    let booking = Booking {
        id: 0,
        user_id: user.id,
        created_by: Some(user.id),
        course_id: validated.course.id,
        accommodation_id: validated.accommodation.id,
        person_count: validated.persons.len() as i64,
        start_at: validated.start_at,
        weeks_count: validated.weeks_count,
        callback: validated.callback,
        status: BookingStatus::New,
        course_price: prices.course_price,
        accommodation_price: prices.accommodation_price,
        total_price: prices.total_price,
        paid: None,
        paid_at: None,
        viewed: true,
        user_location: validated.user_location.clone(),
        created_at: now,
        updated_at: now,
    };

    let id = queries::insert_booking(&tx, &booking)?;
    save_persons(&tx, id, &validated.persons)?;
    queries::replace_booking_extras(&tx, id, &validated.extras)?;
    tx.commit()?;

    tracing::info!(booking_id = id, user_id = user.id, total_price = %prices.total_price, "booking created");
    Ok(id)
}

/// Applies an owner's edit. `partial` takes missing fields from the stored
/// booking instead of rejecting them.
pub fn update_booking(
    conn: &mut Connection,
    booking: &Booking,
    input: BookingInput,
    partial: bool,
) -> Result<StatusChange, AppError> {
    let Some(new_status) = booking.status.after_client_edit() else {
        return Err(AppError::Forbidden(format!(
            "booking in status {} can not be edited",
            booking.status.as_str()
        )));
    };

    let tx = conn.transaction()?;

    let persons = queries::get_booking_persons(&tx, booking.id)?;
    let mut extras = vec![];
    for extra in queries::get_booking_extras(&tx, booking.id)? {
        if let Some(school_extra) = extra.school_extra_id {
            if let Some(school_extra) = queries::get_school_extra(&tx, school_extra)? {
                extras.push(school_extra);
            }
        }
    }

    let fallback = partial.then_some(Current {
        booking,
        persons: &persons,
        extras: &extras,
    });
    let validated = validate(&tx, input, &persons, fallback)?;
    let prices = compute_prices(&tx, &validated, booking.created_at.date_naive())?;

    let updated = Booking {
        course_id: validated.course.id,
        accommodation_id: validated.accommodation.id,
        person_count: validated.persons.len() as i64,
        start_at: validated.start_at,
        weeks_count: validated.weeks_count,
        callback: validated.callback,
        status: new_status,
        course_price: prices.course_price,
        accommodation_price: prices.accommodation_price,
        total_price: prices.total_price,
        user_location: validated.user_location.clone(),
        updated_at: Utc::now(),
        ..booking.clone()
    };

    queries::save_booking(&tx, &updated)?;
    save_persons(&tx, booking.id, &validated.persons)?;
    queries::replace_booking_extras(&tx, booking.id, &validated.extras)?;
    tx.commit()?;

    tracing::info!(
        booking_id = booking.id,
        old_status = booking.status.as_str(),
        new_status = new_status.as_str(),
        total_price = %prices.total_price,
        "booking updated"
    );

    Ok(StatusChange {
        booking_id: booking.id,
        old_status: booking.status,
        new_status,
        has_creator: booking.created_by.is_some(),
    })
}

/// Marks the booking DELETED; the row stays in place.
pub fn soft_delete(conn: &Connection, booking: &Booking) -> Result<(), AppError> {
    if !queries::update_booking_status(conn, booking.id, BookingStatus::Deleted)? {
        return Err(AppError::NotFound("booking".to_string()));
    }
    tracing::info!(booking_id = booking.id, "booking deleted");
    Ok(())
}
