//! Booking price computation.
//!
//! Unit prices come from per-course and per-accommodation price tables keyed
//! by week ranges. All amounts are `Decimal`; a booking's prices scale with
//! both `weeks_count` and `person_count`.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rusqlite::Connection;
use rust_decimal::prelude::*;
use serde::Serialize;

use crate::db::queries;
use crate::models::{Currency, PriceRange, SchoolExtra};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookingPrices {
    pub course_price: Decimal,
    pub accommodation_price: Decimal,
    pub extras_price: Decimal,
    pub total_price: Decimal,
}

/// Round to `places` using banker's rounding.
pub fn round_money(amount: Decimal, places: u32) -> Decimal {
    amount.round_dp_with_strategy(places, RoundingStrategy::MidpointNearestEven)
}

/// Picks the unit price for `weeks` on `date`. A range restricted to the
/// caller's `location` wins over a location-agnostic one.
pub fn select_unit_price(
    ranges: &[PriceRange],
    date: NaiveDate,
    weeks: i64,
    location: Option<&str>,
) -> Option<Decimal> {
    let applicable = ranges.iter().filter(|r| {
        weeks >= r.weeks_count_from
            && weeks <= r.weeks_count_to
            && r.date_from.map_or(true, |from| date >= from)
            && r.date_to.map_or(true, |to| date <= to)
    });

    let mut generic = None;
    for range in applicable {
        match (range.location.as_deref(), location) {
            (Some(wanted), Some(actual)) if wanted.eq_ignore_ascii_case(actual) => {
                return Some(range.unit_price);
            }
            (None, _) if generic.is_none() => generic = Some(range.unit_price),
            _ => {}
        }
    }
    generic
}

/// Per-person course price for `weeks` weeks, or `None` when no range applies.
pub fn course_price(
    conn: &Connection,
    course_id: i64,
    date: NaiveDate,
    weeks: i64,
    location: Option<&str>,
) -> anyhow::Result<Option<Decimal>> {
    let ranges = queries::get_course_price_ranges(conn, course_id)?;
    Ok(select_unit_price(&ranges, date, weeks, location).map(|unit| unit * Decimal::from(weeks)))
}

/// Per-person accommodation price for `weeks` weeks starting on `start_at`.
pub fn accommodation_price(
    conn: &Connection,
    accommodation_id: i64,
    start_at: NaiveDate,
    weeks: i64,
) -> anyhow::Result<Option<Decimal>> {
    let ranges = queries::get_accommodation_price_ranges(conn, accommodation_id)?;
    Ok(select_unit_price(&ranges, start_at, weeks, None).map(|unit| unit * Decimal::from(weeks)))
}

/// Scales per-person amounts by `person_count` and sums them up.
pub fn calculate_totals(
    course_per_person: Decimal,
    accommodation_per_person: Decimal,
    extras: &[SchoolExtra],
    person_count: i64,
) -> BookingPrices {
    let persons = Decimal::from(person_count);
    let course_price = course_per_person * persons;
    let accommodation_price = accommodation_per_person * persons;
    let extras_price = extras
        .iter()
        .fold(Decimal::ZERO, |acc, extra| acc + extra.price * persons);

    BookingPrices {
        course_price,
        accommodation_price,
        extras_price,
        total_price: course_price + accommodation_price + extras_price,
    }
}

/// Course, accommodation and total prices converted into every currency.
pub fn rates_prices(
    currencies: &[Currency],
    course_price: Decimal,
    accommodation_price: Decimal,
    total_price: Decimal,
) -> BTreeMap<String, BTreeMap<&'static str, Decimal>> {
    currencies
        .iter()
        .map(|currency| {
            let mut prices = BTreeMap::new();
            prices.insert("course_price", round_money(course_price * currency.rate, 2));
            prices.insert(
                "accommodation_price",
                round_money(accommodation_price * currency.rate, 2),
            );
            prices.insert("total_price", round_money(total_price * currency.rate, 2));
            (currency.code.clone(), prices)
        })
        .collect()
}
