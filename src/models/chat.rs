use serde::Serialize;

use super::user::UserSummary;

#[derive(Debug, Clone, Serialize)]
pub struct ChatRecord {
    pub id: i64,
    pub booking: i64,
    pub author: UserSummary,
    pub message: String,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Review {
    pub id: i64,
    pub booking: i64,
    pub author: UserSummary,
    pub rating: i64,
    pub comment: String,
    pub created_at: String,
}
