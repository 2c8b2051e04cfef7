use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct Grade {
    pub id: u64,
    pub student_id: u64,
    pub course_id: u64,
    pub assessment_title: String,
    pub marks_obtained: f64,
    pub total_marks: f64,
    pub marked_by: Option<u64>,
}
