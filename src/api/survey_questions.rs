use crate::auth::auth::CurrentUser;
use crate::error::ApiError;
use crate::model::survey::{AnswerOption, SurveyQuestion};
use actix_web::{HttpResponse, Responder, web};
use serde_json::json;
use sqlx::MySqlPool;
use sqlx::types::Json;

/// How many questions one daily survey asks.
const QUESTIONS_PER_SURVEY: u32 = 5;

fn answers(options: &[(&str, i32)]) -> Vec<AnswerOption> {
    options
        .iter()
        .map(|(text, score)| AnswerOption {
            text: (*text).to_string(),
            score: *score,
        })
        .collect()
}

/// The default question bank.
fn default_questions() -> Vec<(&'static str, Vec<AnswerOption>)> {
    vec![
        (
            "How well did you sleep last night?",
            answers(&[("Very Well", 5), ("Okay", 3), ("Poorly", 1)]),
        ),
        (
            "Are you feeling on top of your coursework?",
            answers(&[
                ("Yes, completely", 5),
                ("Mostly", 4),
                ("I'm struggling a bit", 2),
                ("I'm very behind", 1),
            ]),
        ),
        (
            "Have you been able to eat properly?",
            answers(&[
                ("Yes, all my meals", 5),
                ("Mostly, but skipping some", 3),
                ("No, not really", 1),
            ]),
        ),
        (
            "How connected do you feel to your classmates?",
            answers(&[
                ("Very connected", 5),
                ("Somewhat connected", 3),
                ("A little isolated", 2),
                ("Very isolated", 1),
            ]),
        ),
        (
            "Are you feeling optimistic about the week?",
            answers(&[
                ("Very optimistic", 5),
                ("Slightly optimistic", 4),
                ("Neutral", 3),
                ("Not really", 2),
            ]),
        ),
        (
            "Are you worried about exams or deadlines?",
            answers(&[
                ("No, I feel prepared", 5),
                ("A little", 3),
                ("Yes, very worried", 1),
            ]),
        ),
        (
            "Have you had time for hobbies or relaxation?",
            answers(&[("Yes, plenty", 5), ("A little bit", 3), ("None at all", 1)]),
        ),
    ]
}

/// A random hand of questions for today's survey.
pub async fn random_questions(
    auth: CurrentUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    auth.require_student()?;

    let questions = sqlx::query_as::<_, SurveyQuestion>(
        "SELECT * FROM survey_questions ORDER BY RAND() LIMIT ?",
    )
    .bind(QUESTIONS_PER_SURVEY)
    .fetch_all(pool.get_ref())
    .await
    .map_err(ApiError::Store)?;

    Ok(HttpResponse::Ok().json(questions))
}

/// Reset the question bank to the defaults.
pub async fn seed_questions(
    auth: CurrentUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    sqlx::query("DELETE FROM survey_questions")
        .execute(pool.get_ref())
        .await
        .map_err(ApiError::Store)?;

    let mut qb =
        sqlx::QueryBuilder::<sqlx::MySql>::new("INSERT INTO survey_questions (text, answers) ");
    qb.push_values(default_questions(), |mut b, (text, options)| {
        b.push_bind(text).push_bind(Json(options));
    });

    qb.build()
        .execute(pool.get_ref())
        .await
        .map_err(ApiError::Store)?;

    Ok(HttpResponse::Created().json(json!({
        "message": "Survey question bank has been seeded!"
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_bank_is_larger_than_one_survey() {
        assert!(default_questions().len() as u32 > QUESTIONS_PER_SURVEY);
    }

    #[test]
    fn every_answer_scores_within_range() {
        for (text, options) in default_questions() {
            assert!(!text.is_empty());
            assert!(options.len() >= 2);
            for option in options {
                assert!((1..=5).contains(&option.score));
            }
        }
    }
}
