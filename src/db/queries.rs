use anyhow::Context;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rusqlite::types::ToSql;
use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;

use crate::models::{
    Accommodation, Booking, BookingDocument, BookingPerson, BookingStatus, BookingSummary,
    BookingsExtra, ChatRecord, Course, Currency, PriceRange, Review, Role, School, SchoolExtra,
    User, UserSummary,
};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";
const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

fn parse_timestamp(s: &str) -> anyhow::Result<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S"))
        .map(|naive| naive.and_utc())
        .with_context(|| format!("invalid timestamp: {s}"))
}

fn parse_date(s: &str) -> anyhow::Result<NaiveDate> {
    NaiveDate::parse_from_str(s, DATE_FORMAT).with_context(|| format!("invalid date: {s}"))
}

fn parse_decimal(s: &str) -> anyhow::Result<Decimal> {
    s.parse::<Decimal>()
        .with_context(|| format!("invalid decimal: {s}"))
}

fn parse_status(s: &str) -> anyhow::Result<BookingStatus> {
    BookingStatus::parse(s).with_context(|| format!("unknown booking status: {s}"))
}

// ── Users ──

fn parse_user_row(row: &rusqlite::Row) -> rusqlite::Result<User> {
    let role: String = row.get(5)?;
    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        first_name: row.get(2)?,
        last_name: row.get(3)?,
        avatar_url: row.get(4)?,
        role: Role::parse(&role),
    })
}

pub fn get_user(conn: &Connection, id: i64) -> anyhow::Result<Option<User>> {
    let user = conn
        .query_row(
            "SELECT id, email, first_name, last_name, avatar_url, role FROM users WHERE id = ?1",
            params![id],
            parse_user_row,
        )
        .optional()?;
    Ok(user)
}

pub fn get_user_by_token(conn: &Connection, key: &str) -> anyhow::Result<Option<User>> {
    let user = conn
        .query_row(
            "SELECT u.id, u.email, u.first_name, u.last_name, u.avatar_url, u.role
             FROM auth_tokens t JOIN users u ON u.id = t.user_id
             WHERE t.key = ?1",
            params![key],
            parse_user_row,
        )
        .optional()?;
    Ok(user)
}

pub fn create_user(
    conn: &Connection,
    email: &str,
    first_name: &str,
    last_name: &str,
    role: Role,
) -> anyhow::Result<i64> {
    conn.execute(
        "INSERT INTO users (email, first_name, last_name, role) VALUES (?1, ?2, ?3, ?4)",
        params![email, first_name, last_name, role.as_str()],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn create_token(conn: &Connection, key: &str, user_id: i64) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO auth_tokens (key, user_id) VALUES (?1, ?2)",
        params![key, user_id],
    )?;
    Ok(())
}

// ── Catalog ──

pub fn get_school(conn: &Connection, id: i64) -> anyhow::Result<Option<School>> {
    let row = conn
        .query_row(
            "SELECT id, name, fee_price, created_by FROM schools WHERE id = ?1",
            params![id],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, Option<i64>>(3)?,
                ))
            },
        )
        .optional()?;

    match row {
        Some((id, name, fee_price, created_by)) => Ok(Some(School {
            id,
            name,
            fee_price: parse_decimal(&fee_price)?,
            created_by,
        })),
        None => Ok(None),
    }
}

pub fn get_course(conn: &Connection, id: i64) -> anyhow::Result<Option<Course>> {
    let course = conn
        .query_row(
            "SELECT c.id, c.school_id, t.name FROM courses c
             JOIN course_types t ON t.id = c.type_id WHERE c.id = ?1",
            params![id],
            |row| {
                Ok(Course {
                    id: row.get(0)?,
                    school_id: row.get(1)?,
                    type_name: row.get(2)?,
                })
            },
        )
        .optional()?;
    Ok(course)
}

pub fn get_accommodation(conn: &Connection, id: i64) -> anyhow::Result<Option<Accommodation>> {
    let accommodation = conn
        .query_row(
            "SELECT a.id, a.school_id, t.name FROM accommodations a
             JOIN accommodation_types t ON t.id = a.type_id WHERE a.id = ?1",
            params![id],
            |row| {
                Ok(Accommodation {
                    id: row.get(0)?,
                    school_id: row.get(1)?,
                    type_name: row.get(2)?,
                })
            },
        )
        .optional()?;
    Ok(accommodation)
}

fn parse_price_range_row(row: &rusqlite::Row) -> anyhow::Result<PriceRange> {
    let unit_price: String = row.get(0)?;
    let date_from: Option<String> = row.get(3)?;
    let date_to: Option<String> = row.get(4)?;

    Ok(PriceRange {
        unit_price: parse_decimal(&unit_price)?,
        weeks_count_from: row.get(1)?,
        weeks_count_to: row.get(2)?,
        date_from: date_from.as_deref().map(parse_date).transpose()?,
        date_to: date_to.as_deref().map(parse_date).transpose()?,
        location: row.get(5)?,
    })
}

pub fn get_course_price_ranges(conn: &Connection, course_id: i64) -> anyhow::Result<Vec<PriceRange>> {
    let mut stmt = conn.prepare(
        "SELECT unit_price, weeks_count_from, weeks_count_to, date_from, date_to, location
         FROM course_price_ranges WHERE course_id = ?1 ORDER BY id ASC",
    )?;
    let rows = stmt.query_map(params![course_id], |row| Ok(parse_price_range_row(row)))?;

    let mut ranges = vec![];
    for row in rows {
        ranges.push(row??);
    }
    Ok(ranges)
}

pub fn get_accommodation_price_ranges(
    conn: &Connection,
    accommodation_id: i64,
) -> anyhow::Result<Vec<PriceRange>> {
    let mut stmt = conn.prepare(
        "SELECT unit_price, weeks_count_from, weeks_count_to, date_from, date_to, NULL
         FROM accommodation_price_ranges WHERE accommodation_id = ?1 ORDER BY id ASC",
    )?;
    let rows = stmt.query_map(params![accommodation_id], |row| {
        Ok(parse_price_range_row(row))
    })?;

    let mut ranges = vec![];
    for row in rows {
        ranges.push(row??);
    }
    Ok(ranges)
}

pub fn get_school_extra(conn: &Connection, id: i64) -> anyhow::Result<Option<SchoolExtra>> {
    let row = conn
        .query_row(
            "SELECT se.id, se.school_id, se.extra_id, e.name, se.price
             FROM school_extras se JOIN extras e ON e.id = se.extra_id
             WHERE se.id = ?1",
            params![id],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, i64>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                ))
            },
        )
        .optional()?;

    match row {
        Some((id, school_id, extra_id, name, price)) => Ok(Some(SchoolExtra {
            id,
            school_id,
            extra_id,
            name,
            price: parse_decimal(&price)?,
        })),
        None => Ok(None),
    }
}

pub fn list_currencies(conn: &Connection) -> anyhow::Result<Vec<Currency>> {
    let mut stmt = conn.prepare("SELECT code, rate FROM currencies ORDER BY code ASC")?;
    let rows = stmt.query_map([], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
    })?;

    let mut currencies = vec![];
    for row in rows {
        let (code, rate) = row?;
        currencies.push(Currency {
            code,
            rate: parse_decimal(&rate)?,
        });
    }
    Ok(currencies)
}

// ── Bookings ──

const BOOKING_COLUMNS: &str = "id, user_id, created_by, course_id, accommodation_id, person_count, \
     start_at, weeks_count, callback, status, course_price, accommodation_price, total_price, \
     paid, paid_at, viewed, user_location, created_at, updated_at";

fn parse_booking_row(row: &rusqlite::Row) -> anyhow::Result<Booking> {
    let start_at: String = row.get(6)?;
    let status: String = row.get(9)?;
    let course_price: String = row.get(10)?;
    let accommodation_price: String = row.get(11)?;
    let total_price: String = row.get(12)?;
    let paid: Option<String> = row.get(13)?;
    let paid_at: Option<String> = row.get(14)?;
    let created_at: String = row.get(17)?;
    let updated_at: String = row.get(18)?;

    Ok(Booking {
        id: row.get(0)?,
        user_id: row.get(1)?,
        created_by: row.get(2)?,
        course_id: row.get(3)?,
        accommodation_id: row.get(4)?,
        person_count: row.get(5)?,
        start_at: parse_date(&start_at)?,
        weeks_count: row.get(7)?,
        callback: row.get::<_, i32>(8)? != 0,
        status: parse_status(&status)?,
        course_price: parse_decimal(&course_price)?,
        accommodation_price: parse_decimal(&accommodation_price)?,
        total_price: parse_decimal(&total_price)?,
        paid: paid.as_deref().map(parse_decimal).transpose()?,
        paid_at: paid_at.as_deref().map(parse_timestamp).transpose()?,
        viewed: row.get::<_, i32>(15)? != 0,
        user_location: row.get(16)?,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

/// Inserts `booking` and returns the new row id; `booking.id` is ignored.
pub fn insert_booking(conn: &Connection, booking: &Booking) -> anyhow::Result<i64> {
    conn.execute(
        "INSERT INTO bookings (user_id, created_by, course_id, accommodation_id, person_count,
            start_at, weeks_count, callback, status, course_price, accommodation_price,
            total_price, paid, paid_at, viewed, user_location, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)",
        params![
            booking.user_id,
            booking.created_by,
            booking.course_id,
            booking.accommodation_id,
            booking.person_count,
            booking.start_at.format(DATE_FORMAT).to_string(),
            booking.weeks_count,
            booking.callback as i32,
            booking.status.as_str(),
            booking.course_price.to_string(),
            booking.accommodation_price.to_string(),
            booking.total_price.to_string(),
            booking.paid.map(|p| p.to_string()),
            booking.paid_at.as_ref().map(format_timestamp),
            booking.viewed as i32,
            booking.user_location,
            format_timestamp(&booking.created_at),
            format_timestamp(&booking.updated_at),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn save_booking(conn: &Connection, booking: &Booking) -> anyhow::Result<()> {
    conn.execute(
        "UPDATE bookings SET course_id = ?1, accommodation_id = ?2, person_count = ?3,
            start_at = ?4, weeks_count = ?5, callback = ?6, status = ?7, course_price = ?8,
            accommodation_price = ?9, total_price = ?10, viewed = ?11, user_location = ?12,
            updated_at = ?13
         WHERE id = ?14",
        params![
            booking.course_id,
            booking.accommodation_id,
            booking.person_count,
            booking.start_at.format(DATE_FORMAT).to_string(),
            booking.weeks_count,
            booking.callback as i32,
            booking.status.as_str(),
            booking.course_price.to_string(),
            booking.accommodation_price.to_string(),
            booking.total_price.to_string(),
            booking.viewed as i32,
            booking.user_location,
            format_timestamp(&booking.updated_at),
            booking.id,
        ],
    )?;
    Ok(())
}

pub fn get_booking_by_id(conn: &Connection, id: i64) -> anyhow::Result<Option<Booking>> {
    let result = conn.query_row(
        &format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?1"),
        params![id],
        |row| Ok(parse_booking_row(row)),
    );

    match result {
        Ok(booking) => Ok(Some(booking?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn update_booking_status(
    conn: &Connection,
    id: i64,
    status: BookingStatus,
) -> anyhow::Result<bool> {
    let now = format_timestamp(&Utc::now());
    let count = conn.execute(
        "UPDATE bookings SET status = ?1, updated_at = ?2 WHERE id = ?3",
        params![status.as_str(), now, id],
    )?;
    Ok(count > 0)
}

pub fn list_user_bookings(conn: &Connection, user_id: i64) -> anyhow::Result<Vec<BookingSummary>> {
    let mut stmt = conn.prepare(
        "SELECT b.id, s.id, s.name, ct.name, at.name, b.weeks_count, b.start_at, b.person_count, b.status
         FROM bookings b
         JOIN courses c ON c.id = b.course_id
         JOIN course_types ct ON ct.id = c.type_id
         JOIN schools s ON s.id = c.school_id
         JOIN accommodations a ON a.id = b.accommodation_id
         JOIN accommodation_types at ON at.id = a.type_id
         WHERE b.user_id = ?1 AND b.status != 'deleted'
         ORDER BY b.created_at DESC, b.id DESC",
    )?;

    let rows = stmt.query_map(params![user_id], |row| {
        Ok((
            row.get::<_, i64>(0)?,
            row.get::<_, i64>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, String>(4)?,
            row.get::<_, i64>(5)?,
            row.get::<_, String>(6)?,
            row.get::<_, i64>(7)?,
            row.get::<_, String>(8)?,
        ))
    })?;

    let mut bookings = vec![];
    for row in rows {
        let (id, school_id, school_name, course_name, accommodation_name, weeks_count, start_at, person_count, status) =
            row?;
        bookings.push(BookingSummary {
            id,
            school_id,
            school_name,
            course_name,
            accommodation_name,
            extras_names: vec![],
            weeks_count,
            start_at: parse_date(&start_at)?,
            person_count,
            status: parse_status(&status)?,
        });
    }

    for booking in &mut bookings {
        booking.extras_names = get_booking_extras(conn, booking.id)?
            .into_iter()
            .map(|e| e.name)
            .collect();
    }
    Ok(bookings)
}

pub fn count_not_viewed(conn: &Connection, user_id: i64) -> anyhow::Result<i64> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM bookings WHERE user_id = ?1 AND viewed = 0 AND status != 'deleted'",
        params![user_id],
        |row| row.get(0),
    )?;
    Ok(count)
}

pub fn mark_all_viewed(conn: &Connection, user_id: i64) -> anyhow::Result<usize> {
    let count = conn.execute(
        "UPDATE bookings SET viewed = 1 WHERE user_id = ?1 AND viewed = 0 AND status != 'deleted'",
        params![user_id],
    )?;
    Ok(count)
}

// ── Booking Persons ──

const PERSON_COLUMNS: &str = "id, \"order\", gender, first_name, last_name, birth_date, citizenship, \
     mother_tongue, language_level, passport_number, passport_image_url, phone, phone2, address, \
     city, zip_code, newbee, disability, disability_description, legal_guardian_name, \
     legal_guardian_last_name, legal_guardian_phone, legal_guardian_address, preferences_smoker, \
     preferences_pets, preferences_children, preferences_diet, preferences_allergies, \
     preferences_other";

fn parse_person_row(row: &rusqlite::Row) -> anyhow::Result<BookingPerson> {
    let birth_date: Option<String> = row.get(5)?;
    Ok(BookingPerson {
        id: row.get(0)?,
        order: row.get(1)?,
        gender: row.get(2)?,
        first_name: row.get(3)?,
        last_name: row.get(4)?,
        birth_date: birth_date.as_deref().map(parse_date).transpose()?,
        citizenship: row.get(6)?,
        mother_tongue: row.get(7)?,
        language_level: row.get(8)?,
        passport_number: row.get(9)?,
        passport_image_url: row.get(10)?,
        phone: row.get(11)?,
        phone2: row.get(12)?,
        address: row.get(13)?,
        city: row.get(14)?,
        zip_code: row.get(15)?,
        newbee: row.get::<_, i32>(16)? != 0,
        disability: row.get::<_, i32>(17)? != 0,
        disability_description: row.get(18)?,
        legal_guardian_name: row.get(19)?,
        legal_guardian_last_name: row.get(20)?,
        legal_guardian_phone: row.get(21)?,
        legal_guardian_address: row.get(22)?,
        preferences_smoker: row.get(23)?,
        preferences_pets: row.get(24)?,
        preferences_children: row.get(25)?,
        preferences_diet: row.get(26)?,
        preferences_allergies: row.get(27)?,
        preferences_other: row.get(28)?,
    })
}

pub fn get_booking_persons(conn: &Connection, booking_id: i64) -> anyhow::Result<Vec<BookingPerson>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PERSON_COLUMNS} FROM booking_persons WHERE booking_id = ?1 ORDER BY \"order\" ASC, id ASC"
    ))?;
    let rows = stmt.query_map(params![booking_id], |row| Ok(parse_person_row(row)))?;

    let mut persons = vec![];
    for row in rows {
        persons.push(row??);
    }
    Ok(persons)
}

/// Writes `person` for `booking_id`: updates the row when `person.id` is set,
/// inserts otherwise. Returns the row id.
pub fn save_booking_person(
    conn: &Connection,
    booking_id: i64,
    person: &BookingPerson,
) -> anyhow::Result<i64> {
    let birth_date = person.birth_date.map(|d| d.format(DATE_FORMAT).to_string());
    let newbee = person.newbee as i32;
    let disability = person.disability as i32;
    let mut values: Vec<&dyn ToSql> = vec![
        &booking_id,
        &person.order,
        &person.gender,
        &person.first_name,
        &person.last_name,
        &birth_date,
        &person.citizenship,
        &person.mother_tongue,
        &person.language_level,
        &person.passport_number,
        &person.passport_image_url,
        &person.phone,
        &person.phone2,
        &person.address,
        &person.city,
        &person.zip_code,
        &newbee,
        &disability,
        &person.disability_description,
        &person.legal_guardian_name,
        &person.legal_guardian_last_name,
        &person.legal_guardian_phone,
        &person.legal_guardian_address,
        &person.preferences_smoker,
        &person.preferences_pets,
        &person.preferences_children,
        &person.preferences_diet,
        &person.preferences_allergies,
        &person.preferences_other,
    ];

    match person.id.as_ref() {
        Some(id) => {
            values.push(id);
            conn.execute(
                "UPDATE booking_persons SET booking_id = ?1, \"order\" = ?2, gender = ?3,
                    first_name = ?4, last_name = ?5, birth_date = ?6, citizenship = ?7,
                    mother_tongue = ?8, language_level = ?9, passport_number = ?10,
                    passport_image_url = ?11, phone = ?12, phone2 = ?13, address = ?14,
                    city = ?15, zip_code = ?16, newbee = ?17, disability = ?18,
                    disability_description = ?19, legal_guardian_name = ?20,
                    legal_guardian_last_name = ?21, legal_guardian_phone = ?22,
                    legal_guardian_address = ?23, preferences_smoker = ?24,
                    preferences_pets = ?25, preferences_children = ?26, preferences_diet = ?27,
                    preferences_allergies = ?28, preferences_other = ?29
                 WHERE id = ?30",
                values.as_slice(),
            )?;
            Ok(*id)
        }
        None => {
            conn.execute(
                "INSERT INTO booking_persons (booking_id, \"order\", gender, first_name, last_name,
                    birth_date, citizenship, mother_tongue, language_level, passport_number,
                    passport_image_url, phone, phone2, address, city, zip_code, newbee, disability,
                    disability_description, legal_guardian_name, legal_guardian_last_name,
                    legal_guardian_phone, legal_guardian_address, preferences_smoker,
                    preferences_pets, preferences_children, preferences_diet,
                    preferences_allergies, preferences_other)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16,
                    ?17, ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26, ?27, ?28, ?29)",
                values.as_slice(),
            )?;
            Ok(conn.last_insert_rowid())
        }
    }
}

pub fn delete_booking_persons_except(
    conn: &Connection,
    booking_id: i64,
    keep: &[i64],
) -> anyhow::Result<usize> {
    let existing = get_booking_persons(conn, booking_id)?;
    let mut removed = 0;
    for person in existing {
        if let Some(id) = person.id {
            if !keep.contains(&id) {
                removed += conn.execute("DELETE FROM booking_persons WHERE id = ?1", params![id])?;
            }
        }
    }
    Ok(removed)
}

// ── Booking Extras ──

pub fn get_booking_extras(conn: &Connection, booking_id: i64) -> anyhow::Result<Vec<BookingsExtra>> {
    let mut stmt = conn.prepare(
        "SELECT be.id, be.extra_id, be.school_extra_id, e.name, be.price
         FROM bookings_extras be JOIN extras e ON e.id = be.extra_id
         WHERE be.booking_id = ?1 ORDER BY be.id ASC",
    )?;
    let rows = stmt.query_map(params![booking_id], |row| {
        Ok((
            row.get::<_, i64>(0)?,
            row.get::<_, i64>(1)?,
            row.get::<_, Option<i64>>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, String>(4)?,
        ))
    })?;

    let mut extras = vec![];
    for row in rows {
        let (id, extra, school_extra_id, name, price) = row?;
        extras.push(BookingsExtra {
            id,
            extra,
            school_extra_id,
            name,
            price: parse_decimal(&price)?,
        });
    }
    Ok(extras)
}

pub fn replace_booking_extras(
    conn: &Connection,
    booking_id: i64,
    extras: &[SchoolExtra],
) -> anyhow::Result<()> {
    conn.execute(
        "DELETE FROM bookings_extras WHERE booking_id = ?1",
        params![booking_id],
    )?;
    for extra in extras {
        conn.execute(
            "INSERT INTO bookings_extras (booking_id, extra_id, school_extra_id, price)
             VALUES (?1, ?2, ?3, ?4)",
            params![booking_id, extra.extra_id, extra.id, extra.price.to_string()],
        )?;
    }
    Ok(())
}

// ── Documents ──

pub fn get_booking_documents(
    conn: &Connection,
    booking_id: i64,
) -> anyhow::Result<Vec<BookingDocument>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, url, created_at FROM booking_documents
         WHERE booking_id = ?1 ORDER BY id ASC",
    )?;
    let rows = stmt.query_map(params![booking_id], |row| {
        Ok(BookingDocument {
            id: row.get(0)?,
            name: row.get(1)?,
            url: row.get(2)?,
            created_at: row.get(3)?,
        })
    })?;

    let mut documents = vec![];
    for row in rows {
        documents.push(row?);
    }
    Ok(documents)
}

// ── Chat & Reviews ──

pub fn get_chat_records(conn: &Connection, booking_id: i64) -> anyhow::Result<Vec<ChatRecord>> {
    let mut stmt = conn.prepare(
        "SELECT r.id, r.booking_id, r.message, r.created_at,
                u.id, u.first_name, u.last_name, u.email, u.avatar_url
         FROM booking_chat_records r JOIN users u ON u.id = r.author_id
         WHERE r.booking_id = ?1 ORDER BY r.id ASC",
    )?;
    let rows = stmt.query_map(params![booking_id], |row| {
        Ok(ChatRecord {
            id: row.get(0)?,
            booking: row.get(1)?,
            message: row.get(2)?,
            created_at: row.get(3)?,
            author: UserSummary {
                id: row.get(4)?,
                first_name: row.get(5)?,
                last_name: row.get(6)?,
                email: row.get(7)?,
                avatar_url: row.get(8)?,
            },
        })
    })?;

    let mut records = vec![];
    for row in rows {
        records.push(row?);
    }
    Ok(records)
}

pub fn insert_chat_record(
    conn: &Connection,
    booking_id: i64,
    author_id: i64,
    message: &str,
) -> anyhow::Result<i64> {
    conn.execute(
        "INSERT INTO booking_chat_records (booking_id, author_id, message, created_at)
         VALUES (?1, ?2, ?3, ?4)",
        params![booking_id, author_id, message, format_timestamp(&Utc::now())],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_reviews(conn: &Connection, booking_id: i64) -> anyhow::Result<Vec<Review>> {
    let mut stmt = conn.prepare(
        "SELECT r.id, r.booking_id, r.rating, r.comment, r.created_at,
                u.id, u.first_name, u.last_name, u.email, u.avatar_url
         FROM booking_reviews r JOIN users u ON u.id = r.author_id
         WHERE r.booking_id = ?1 ORDER BY r.id ASC",
    )?;
    let rows = stmt.query_map(params![booking_id], |row| {
        Ok(Review {
            id: row.get(0)?,
            booking: row.get(1)?,
            rating: row.get(2)?,
            comment: row.get(3)?,
            created_at: row.get(4)?,
            author: UserSummary {
                id: row.get(5)?,
                first_name: row.get(6)?,
                last_name: row.get(7)?,
                email: row.get(8)?,
                avatar_url: row.get(9)?,
            },
        })
    })?;

    let mut reviews = vec![];
    for row in rows {
        reviews.push(row?);
    }
    Ok(reviews)
}

pub fn insert_review(
    conn: &Connection,
    booking_id: i64,
    author_id: i64,
    rating: i64,
    comment: &str,
) -> anyhow::Result<i64> {
    conn.execute(
        "INSERT INTO booking_reviews (booking_id, author_id, rating, comment, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![booking_id, author_id, rating, comment, format_timestamp(&Utc::now())],
    )?;
    Ok(conn.last_insert_rowid())
}
