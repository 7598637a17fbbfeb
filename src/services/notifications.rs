use anyhow::Context;
use askama::Template;
use rusqlite::Connection;

use crate::config::AppConfig;
use crate::db::queries;
use crate::models::BookingStatus;
use crate::services::mail::{Email, Mailer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingNotice {
    /// First submission: confirmation to the creator plus a new-booking notice
    /// to the school.
    Confirmed,
    /// Any other accepted edit: update notice to the school.
    Updated,
}

pub fn notice_for(old: BookingStatus, new: BookingStatus, has_creator: bool) -> BookingNotice {
    if old == BookingStatus::New && new == BookingStatus::WaitingSchool && has_creator {
        BookingNotice::Confirmed
    } else {
        BookingNotice::Updated
    }
}

#[derive(Template)]
#[template(path = "email/booking_confirm.txt")]
struct BookingConfirmEmail<'a> {
    course: &'a str,
    school: &'a str,
}

#[derive(Template)]
#[template(path = "email/booking_created.txt")]
struct BookingCreatedEmail<'a> {
    user_first_name: &'a str,
    user_last_name: &'a str,
    user_email: &'a str,
    course: &'a str,
    school: &'a str,
}

#[derive(Template)]
#[template(path = "email/booking_updated.txt")]
struct BookingUpdatedEmail<'a> {
    user_first_name: &'a str,
    user_last_name: &'a str,
    user_email: &'a str,
    booking_id: i64,
    course: &'a str,
    school: &'a str,
}

fn email<T: Template>(to: &str, subject: &str, template: &str, body: &T) -> anyhow::Result<Email> {
    Ok(Email {
        to: to.to_string(),
        subject: subject.to_string(),
        template: template.to_string(),
        body: body
            .render()
            .with_context(|| format!("failed to render email template: {template}"))?,
    })
}

/// Builds the emails for `notice` on `booking_id`. Recipients that cannot be
/// resolved are skipped with a warning.
pub fn build_emails(
    conn: &Connection,
    config: &AppConfig,
    booking_id: i64,
    notice: BookingNotice,
) -> anyhow::Result<Vec<Email>> {
    let booking = queries::get_booking_by_id(conn, booking_id)?
        .with_context(|| format!("booking {booking_id} vanished"))?;
    let course = queries::get_course(conn, booking.course_id)?
        .with_context(|| format!("course {} not found", booking.course_id))?;
    let school = queries::get_school(conn, course.school_id)?
        .with_context(|| format!("school {} not found", course.school_id))?;

    let creator = match booking.created_by {
        Some(id) => queries::get_user(conn, id)?,
        None => None,
    };
    // Bookings without a creator are described by their owner.
    let author = match creator.clone() {
        Some(user) => Some(user),
        None => queries::get_user(conn, booking.user_id)?,
    };
    let manager = match school.created_by {
        Some(id) => queries::get_user(conn, id)?,
        None => None,
    };

    let (first_name, last_name, user_email) = author
        .as_ref()
        .map(|u| (u.first_name.as_str(), u.last_name.as_str(), u.email.as_str()))
        .unwrap_or_default();
    let course_name = course.type_name.as_str();
    let school_name = school.name.as_str();

    let mut emails = vec![];
    match notice {
        BookingNotice::Confirmed => {
            if let Some(creator) = &creator {
                emails.push(email(
                    &creator.email,
                    &config.email_booking_create_client_confirm,
                    "booking_confirm",
                    &BookingConfirmEmail {
                        course: course_name,
                        school: school_name,
                    },
                )?);
            }
            match &manager {
                Some(manager) => emails.push(email(
                    &manager.email,
                    &config.email_booking_create_user,
                    "booking_created",
                    &BookingCreatedEmail {
                        user_first_name: first_name,
                        user_last_name: last_name,
                        user_email,
                        course: course_name,
                        school: school_name,
                    },
                )?),
                None => tracing::warn!(booking_id, school_id = school.id, "school has no manager, skipping booking_created"),
            }
        }
        BookingNotice::Updated => match &manager {
            Some(manager) => emails.push(email(
                &manager.email,
                &config.email_booking_update_user,
                "booking_updated",
                &BookingUpdatedEmail {
                    user_first_name: first_name,
                    user_last_name: last_name,
                    user_email,
                    booking_id: booking.id,
                    course: course_name,
                    school: school_name,
                },
            )?),
            None => tracing::warn!(booking_id, school_id = school.id, "school has no manager, skipping booking_updated"),
        },
    }

    Ok(emails)
}

/// Sends each email; delivery failures are logged and do not propagate.
pub async fn deliver(mailer: &dyn Mailer, emails: &[Email]) {
    for email in emails {
        match mailer.send(email).await {
            Ok(()) => tracing::info!(to = %email.to, template = %email.template, "email sent"),
            Err(e) => {
                tracing::error!(error = %e, to = %email.to, template = %email.template, "failed to send email")
            }
        }
    }
}
