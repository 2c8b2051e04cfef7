use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Event {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = "Orientation Day")]
    pub title: String,

    #[schema(example = "Welcome session for new students")]
    pub description: String,

    #[schema(example = "2026-09-01T10:00:00", format = "date-time", value_type = String)]
    pub date: NaiveDateTime,
}
