use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use strum_macros::{Display, EnumString};

/// Final mood bucket derived from the total survey score.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString)]
pub enum Mood {
    Great,
    Good,
    Okay,
    Stressed,
    Sad,
}

/// One selectable answer of a survey question. A higher score means a more
/// positive mood.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerOption {
    pub text: String,
    pub score: i32,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct SurveyQuestion {
    pub id: u64,
    pub text: String,
    pub answers: Json<Vec<AnswerOption>>,
}

/// Copy of a question and the answer the student picked, kept with the
/// response for later review.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerGiven {
    pub question_text: String,
    pub answer_text: String,
    pub score: i32,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct SurveyResponse {
    pub id: u64,
    pub student_id: u64,
    pub mood: String,
    pub total_score: i32,
    pub responses: Json<Vec<AnswerGiven>>,
    pub comments: Option<String>,
    pub date: NaiveDate,
}
