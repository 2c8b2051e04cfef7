use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "code": "CS-101",
        "title": "Introduction to Programming",
        "description": "Fundamentals of programming",
        "syllabus_url": "",
        "timetable_url": "",
        "faculty_id": 7
    })
)]
pub struct Course {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = "CS-101")]
    pub code: String,

    #[schema(example = "Introduction to Programming")]
    pub title: String,

    #[schema(example = "Fundamentals of programming", nullable = true)]
    pub description: Option<String>,

    #[schema(example = "")]
    pub syllabus_url: String,

    #[schema(example = "")]
    pub timetable_url: String,

    #[schema(example = 7, nullable = true)]
    pub faculty_id: Option<u64>,
}
