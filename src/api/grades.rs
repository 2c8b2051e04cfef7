use crate::auth::auth::CurrentUser;
use crate::error::ApiError;
use crate::model::grade::Grade;
use actix_web::{HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use tracing::error;

/// The single assessment the gradebook tracks for now.
const OVERALL_ASSESSMENT: &str = "Overall Grade";

#[derive(Serialize, sqlx::FromRow)]
pub struct GradebookEntry {
    pub student_id: u64,
    pub name: String,
    pub email: String,
    pub marks_obtained: f64,
    pub total_marks: f64,
}

#[derive(Deserialize)]
pub struct BatchGradeEntry {
    pub student_id: u64,
    pub marks_obtained: f64,
}

#[derive(Deserialize)]
pub struct BatchGrades {
    pub course_id: u64,
    pub total_marks: f64,
    pub grades: Vec<BatchGradeEntry>,
}

#[derive(Serialize, sqlx::FromRow)]
pub struct GradeWithCourse {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub grade: Grade,
    pub course_code: String,
    pub course_title: String,
}

/// Everyone enrolled in the course with their overall grade; students
/// without one yet show the defaults.
pub async fn course_gradebook(
    auth: CurrentUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_faculty_or_admin()?;

    let entries = sqlx::query_as::<_, GradebookEntry>(
        r#"
        SELECT u.id AS student_id, u.name, u.email,
               COALESCE(g.marks_obtained, 0) AS marks_obtained,
               COALESCE(g.total_marks, 100) AS total_marks
        FROM student_courses sc
        INNER JOIN users u ON u.id = sc.user_id
        LEFT JOIN grades g ON g.student_id = u.id
                          AND g.course_id = sc.course_id
                          AND g.assessment_title = ?
        WHERE sc.course_id = ?
        ORDER BY u.name
        "#,
    )
    .bind(OVERALL_ASSESSMENT)
    .bind(path.into_inner())
    .fetch_all(pool.get_ref())
    .await
    .map_err(ApiError::Store)?;

    Ok(HttpResponse::Ok().json(entries))
}

/// Upsert overall grades for many students of one course at once.
pub async fn batch_grades(
    auth: CurrentUser,
    pool: web::Data<MySqlPool>,
    body: web::Json<BatchGrades>,
) -> actix_web::Result<impl Responder> {
    auth.require_faculty_or_admin()?;

    if body.grades.is_empty() {
        return Err(ApiError::Validation("Invalid data format.".into()).into());
    }

    let mut qb = sqlx::QueryBuilder::<sqlx::MySql>::new(
        "INSERT INTO grades (student_id, course_id, assessment_title, marks_obtained, total_marks, marked_by) ",
    );
    qb.push_values(&body.grades, |mut b, grade| {
        b.push_bind(grade.student_id)
            .push_bind(body.course_id)
            .push_bind(OVERALL_ASSESSMENT)
            .push_bind(grade.marks_obtained)
            .push_bind(body.total_marks)
            .push_bind(auth.id);
    });
    qb.push(
        " ON DUPLICATE KEY UPDATE marks_obtained = VALUES(marks_obtained), \
         total_marks = VALUES(total_marks), marked_by = VALUES(marked_by)",
    );

    qb.build().execute(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, course_id = body.course_id, "Batch grade upsert failed");
        ApiError::Store(e)
    })?;

    Ok(HttpResponse::Created().json(json!({
        "message": format!("Grades saved successfully. {} entries processed.", body.grades.len())
    })))
}

async fn grades_for_student(
    pool: &MySqlPool,
    student_id: u64,
) -> Result<Vec<GradeWithCourse>, ApiError> {
    sqlx::query_as::<_, GradeWithCourse>(
        r#"
        SELECT g.*, c.code AS course_code, c.title AS course_title
        FROM grades g
        INNER JOIN courses c ON c.id = g.course_id
        WHERE g.student_id = ?
        ORDER BY c.code
        "#,
    )
    .bind(student_id)
    .fetch_all(pool)
    .await
    .map_err(ApiError::Store)
}

/// The logged-in student's grades across all courses.
pub async fn my_grades(
    auth: CurrentUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    auth.require_student()?;
    let grades = grades_for_student(pool.get_ref(), auth.id).await?;
    Ok(HttpResponse::Ok().json(grades))
}

/// One student's grades, for staff.
pub async fn student_grades(
    auth: CurrentUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_faculty_or_admin()?;
    let grades = grades_for_student(pool.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(grades))
}
