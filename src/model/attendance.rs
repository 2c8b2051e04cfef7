use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

/// Daily attendance outcome. Stored verbatim ("Present", "Absent", "Late").
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
pub enum AttendanceStatus {
    Present,
    Absent,
    Late,
}

/// One record per (student, course, date); the unique key in the schema
/// rejects a second insert for the same triple. `marked_by` is NULL for
/// records the absentee job generates.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct AttendanceRecord {
    pub id: u64,
    pub student_id: u64,
    pub course_id: u64,
    #[schema(example = "2026-08-07", format = "date", value_type = String)]
    pub date: NaiveDate,
    #[schema(example = "Present")]
    pub status: String,
    #[schema(example = 7, nullable = true)]
    pub marked_by: Option<u64>,
}
