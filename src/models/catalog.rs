use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct School {
    pub id: i64,
    pub name: String,
    pub fee_price: Decimal,
    #[serde(skip)]
    pub created_by: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct Course {
    pub id: i64,
    pub school_id: i64,
    pub type_name: String,
}

#[derive(Debug, Clone)]
pub struct Accommodation {
    pub id: i64,
    pub school_id: i64,
    pub type_name: String,
}

/// One row of a course or accommodation price table. `location` is only
/// populated for course ranges; `None` matches every location.
#[derive(Debug, Clone)]
pub struct PriceRange {
    pub unit_price: Decimal,
    pub weeks_count_from: i64,
    pub weeks_count_to: i64,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub location: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SchoolExtra {
    pub id: i64,
    pub school_id: i64,
    pub extra_id: i64,
    pub name: String,
    pub price: Decimal,
}

#[derive(Debug, Clone)]
pub struct Currency {
    pub code: String,
    pub rate: Decimal,
}
