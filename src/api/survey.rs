use crate::auth::auth::CurrentUser;
use crate::config::Config;
use crate::error::{ApiError, is_duplicate};
use crate::model::survey::{AnswerGiven, Mood, SurveyResponse};
use actix_web::{HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use sqlx::types::Json;

/// Every question scores 1..=5.
const MAX_SCORE_PER_QUESTION: i32 = 5;

#[derive(Deserialize)]
pub struct SubmitSurvey {
    pub responses: Vec<AnswerGiven>,
    pub comments: Option<String>,
}

#[derive(Serialize, sqlx::FromRow)]
pub struct SurveyResult {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub response: SurveyResponse,
    pub student_name: String,
}

/// Bucket the score percentage into the final mood.
fn mood_for_score(total_score: i32, max_score: i32) -> Mood {
    let percentage = total_score as f64 / max_score as f64 * 100.0;

    if percentage >= 80.0 {
        Mood::Great
    } else if percentage >= 60.0 {
        Mood::Good
    } else if percentage >= 40.0 {
        Mood::Okay
    } else if percentage >= 20.0 {
        Mood::Stressed
    } else {
        Mood::Sad
    }
}

/// Daily mood survey submission; one per student per day, enforced by the
/// unique key.
pub async fn submit_survey(
    auth: CurrentUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    body: web::Json<SubmitSurvey>,
) -> actix_web::Result<impl Responder> {
    auth.require_student()?;

    if body.responses.is_empty() {
        return Err(ApiError::Validation("Invalid survey data.".into()).into());
    }

    let total_score: i32 = body.responses.iter().map(|r| r.score).sum();
    let max_score = MAX_SCORE_PER_QUESTION * body.responses.len() as i32;
    let mood = mood_for_score(total_score, max_score);

    let result = sqlx::query(
        r#"
        INSERT INTO survey_responses (student_id, mood, total_score, responses, comments, date)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(auth.id)
    .bind(mood.to_string())
    .bind(total_score)
    .bind(Json(body.responses.clone()))
    .bind(&body.comments)
    .bind(config.today())
    .execute(pool.get_ref())
    .await;

    match result {
        Ok(_) => Ok(HttpResponse::Created().json(json!({
            "message": "Thank you for your response!"
        }))),
        Err(e) if is_duplicate(&e) => Err(ApiError::Duplicate(
            "You have already submitted your survey for today.",
        )
        .into()),
        Err(e) => Err(ApiError::Store(e).into()),
    }
}

/// Whether the student already submitted today.
pub async fn check_today(
    auth: CurrentUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> actix_web::Result<impl Responder> {
    auth.require_student()?;

    let submitted = sqlx::query_scalar::<_, i64>(
        "SELECT COUNT(*) FROM survey_responses WHERE student_id = ? AND date = ?",
    )
    .bind(auth.id)
    .bind(config.today())
    .fetch_one(pool.get_ref())
    .await
    .map_err(ApiError::Store)?;

    Ok(HttpResponse::Ok().json(json!({ "submitted": submitted > 0 })))
}

/// All responses, newest first, for staff review.
pub async fn survey_results(
    auth: CurrentUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    auth.require_faculty_or_admin()?;

    let results = sqlx::query_as::<_, SurveyResult>(
        r#"
        SELECT r.*, u.name AS student_name
        FROM survey_responses r
        INNER JOIN users u ON u.id = r.student_id
        ORDER BY r.date DESC
        "#,
    )
    .fetch_all(pool.get_ref())
    .await
    .map_err(ApiError::Store)?;

    Ok(HttpResponse::Ok().json(results))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mood_buckets_at_the_documented_boundaries() {
        // five questions, max 25
        assert_eq!(mood_for_score(25, 25), Mood::Great);
        assert_eq!(mood_for_score(20, 25), Mood::Great); // exactly 80%
        assert_eq!(mood_for_score(19, 25), Mood::Good); // 76%
        assert_eq!(mood_for_score(15, 25), Mood::Good); // exactly 60%
        assert_eq!(mood_for_score(10, 25), Mood::Okay); // exactly 40%
        assert_eq!(mood_for_score(5, 25), Mood::Stressed); // exactly 20%
        assert_eq!(mood_for_score(4, 25), Mood::Sad); // 16%
    }

    #[test]
    fn single_question_survey_still_buckets() {
        assert_eq!(mood_for_score(5, 5), Mood::Great);
        assert_eq!(mood_for_score(1, 5), Mood::Stressed);
    }
}
