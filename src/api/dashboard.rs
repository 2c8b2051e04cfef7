use crate::auth::auth::CurrentUser;
use crate::error::ApiError;
use crate::model::survey::SurveyResponse;
use actix_web::{HttpResponse, Responder, web};
use serde::Serialize;
use serde_json::json;
use sqlx::MySqlPool;

#[derive(Serialize, sqlx::FromRow)]
pub struct AtRiskResponse {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub response: SurveyResponse,
    pub student_name: String,
}

async fn count_users(pool: &MySqlPool, role: &str, status: &str) -> sqlx::Result<i64> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE role = ? AND status = ?")
        .bind(role)
        .bind(status)
        .fetch_one(pool)
        .await
}

/// High-level counts plus the latest at-risk survey responses, loaded
/// concurrently.
pub async fn admin_stats(
    auth: CurrentUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;
    let pool = pool.get_ref();

    let (pending_students, pending_faculty, pending_admins, active_students, active_faculty) =
        futures::try_join!(
            count_users(pool, "student", "pending"),
            count_users(pool, "faculty", "pending"),
            count_users(pool, "admin", "pending"),
            // profile count is a good proxy for the student body
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM student_profiles").fetch_one(pool),
            count_users(pool, "faculty", "active"),
        )
        .map_err(ApiError::Store)?;

    let recent_surveys = sqlx::query_as::<_, AtRiskResponse>(
        r#"
        SELECT r.id, r.student_id, u.name AS student_name, r.mood, r.total_score,
               r.responses, r.comments, r.date
        FROM survey_responses r
        INNER JOIN users u ON u.id = r.student_id
        WHERE r.mood IN ('Stressed', 'Sad')
        ORDER BY r.date DESC
        LIMIT 5
        "#,
    )
    .fetch_all(pool)
    .await
    .map_err(ApiError::Store)?;

    Ok(HttpResponse::Ok().json(json!({
        "pending_students": pending_students,
        "pending_faculty": pending_faculty,
        "pending_admins": pending_admins,
        "active_students": active_students,
        "active_faculty": active_faculty,
        "recent_surveys": recent_surveys,
    })))
}
