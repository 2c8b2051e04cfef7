use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct Notification {
    pub id: u64,
    pub title: String,
    pub message: String,
    pub date: NaiveDateTime,
    /// Either the literal "all" or a user id rendered as a string.
    pub recipient: String,
}
