use crate::auth::auth::CurrentUser;
use crate::error::{ApiError, is_duplicate};
use crate::model::course::Course;
use crate::model::role::Role;
use crate::utils::db_utils::{build_update_sql, execute_update};
use actix_web::{HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use sqlx::MySqlPool;
use tracing::error;
use utoipa::ToSchema;

/// Columns a course update may touch.
const COURSE_UPDATE_COLUMNS: &[&str] = &[
    "code",
    "title",
    "description",
    "syllabus_url",
    "timetable_url",
    "faculty_id",
];

#[derive(Deserialize, ToSchema)]
pub struct CreateCourse {
    #[schema(example = "CS-101")]
    pub code: String,
    #[schema(example = "Introduction to Programming")]
    pub title: String,
    pub description: Option<String>,
    pub syllabus_url: Option<String>,
    pub timetable_url: Option<String>,
    #[schema(example = 7, nullable = true)]
    pub faculty_id: Option<u64>,
}

/// A course together with its assigned faculty member's name.
#[derive(Serialize, sqlx::FromRow, ToSchema)]
pub struct CourseWithFaculty {
    pub id: u64,
    pub code: String,
    pub title: String,
    pub description: Option<String>,
    pub syllabus_url: String,
    pub timetable_url: String,
    pub faculty_id: Option<u64>,
    #[schema(example = "Dr. Rao", nullable = true)]
    pub faculty_name: Option<String>,
}

const COURSE_WITH_FACULTY_SQL: &str = r#"
    SELECT c.id, c.code, c.title, c.description, c.syllabus_url, c.timetable_url,
           c.faculty_id, u.name AS faculty_name
    FROM courses c
    LEFT JOIN users u ON u.id = c.faculty_id
"#;

/// Course catalogue, visible to any authenticated account.
#[utoipa::path(
    get,
    path = "/api/courses",
    responses(
        (status = 200, description = "All courses ordered by code", body = [CourseWithFaculty]),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Courses"
)]
pub async fn list_courses(
    _auth: CurrentUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let courses = sqlx::query_as::<_, CourseWithFaculty>(&format!(
        "{} ORDER BY c.code",
        COURSE_WITH_FACULTY_SQL
    ))
    .fetch_all(pool.get_ref())
    .await
    .map_err(ApiError::Store)?;

    Ok(HttpResponse::Ok().json(courses))
}

/// Courses assigned to the logged-in faculty member. Admins get an empty
/// list; they manage all courses elsewhere.
#[utoipa::path(
    get,
    path = "/api/courses/my-courses",
    responses(
        (status = 200, description = "Courses assigned to this faculty member", body = [CourseWithFaculty]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Courses"
)]
pub async fn my_courses(
    auth: CurrentUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    auth.require_faculty_or_admin()?;

    let mut courses = Vec::new();
    if auth.role == Role::Faculty {
        courses = sqlx::query_as::<_, CourseWithFaculty>(&format!(
            "{} WHERE c.faculty_id = ? ORDER BY c.code",
            COURSE_WITH_FACULTY_SQL
        ))
        .bind(auth.id)
        .fetch_all(pool.get_ref())
        .await
        .map_err(ApiError::Store)?;
    }

    Ok(HttpResponse::Ok().json(courses))
}

#[utoipa::path(
    get,
    path = "/api/courses/{course_id}",
    params(("course_id", Path, description = "Course ID")),
    responses(
        (status = 200, description = "Course found", body = CourseWithFaculty),
        (status = 404, description = "Course not found"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Courses"
)]
pub async fn get_course(
    auth: CurrentUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_faculty_or_admin()?;

    let course = sqlx::query_as::<_, CourseWithFaculty>(&format!(
        "{} WHERE c.id = ?",
        COURSE_WITH_FACULTY_SQL
    ))
    .bind(path.into_inner())
    .fetch_optional(pool.get_ref())
    .await
    .map_err(ApiError::Store)?
    .ok_or(ApiError::NotFound("Course not found"))?;

    Ok(HttpResponse::Ok().json(course))
}

#[utoipa::path(
    post,
    path = "/api/courses",
    request_body = CreateCourse,
    responses(
        (status = 200, description = "Course created", body = Course),
        (status = 400, description = "Duplicate course code"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Courses"
)]
pub async fn create_course(
    auth: CurrentUser,
    pool: web::Data<MySqlPool>,
    body: web::Json<CreateCourse>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let code = body.code.trim();
    let title = body.title.trim();
    if code.is_empty() || title.is_empty() {
        return Err(ApiError::Validation("Code and title must not be empty".into()).into());
    }

    let result = sqlx::query(
        r#"
        INSERT INTO courses (code, title, description, syllabus_url, timetable_url, faculty_id)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(code)
    .bind(title)
    .bind(&body.description)
    .bind(body.syllabus_url.clone().unwrap_or_default())
    .bind(body.timetable_url.clone().unwrap_or_default())
    .bind(body.faculty_id)
    .execute(pool.get_ref())
    .await;

    match result {
        Ok(r) => Ok(HttpResponse::Ok().json(Course {
            id: r.last_insert_id(),
            code: code.to_string(),
            title: title.to_string(),
            description: body.description.clone(),
            syllabus_url: body.syllabus_url.clone().unwrap_or_default(),
            timetable_url: body.timetable_url.clone().unwrap_or_default(),
            faculty_id: body.faculty_id,
        })),
        Err(e) if is_duplicate(&e) => {
            Err(ApiError::Duplicate("Course with this code already exists").into())
        }
        Err(e) => {
            error!(error = %e, "Failed to create course");
            Err(ApiError::Store(e).into())
        }
    }
}

#[utoipa::path(
    put,
    path = "/api/courses/{course_id}",
    params(("course_id", Path, description = "Course ID")),
    request_body = Object,
    responses(
        (status = 200, description = "Course updated", body = CourseWithFaculty),
        (status = 400, description = "Duplicate course code or empty payload"),
        (status = 404, description = "Course not found"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Courses"
)]
pub async fn update_course(
    auth: CurrentUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<Value>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;
    let course_id = path.into_inner();

    let update = build_update_sql("courses", &body, COURSE_UPDATE_COLUMNS, "id", course_id)?;

    let result = execute_update(pool.get_ref(), update).await;

    match result {
        Ok(0) => Err(ApiError::NotFound("Course not found").into()),
        Ok(_) => {
            let course = sqlx::query_as::<_, CourseWithFaculty>(&format!(
                "{} WHERE c.id = ?",
                COURSE_WITH_FACULTY_SQL
            ))
            .bind(course_id)
            .fetch_one(pool.get_ref())
            .await
            .map_err(ApiError::Store)?;
            Ok(HttpResponse::Ok().json(course))
        }
        Err(e) if is_duplicate(&e) => {
            Err(ApiError::Duplicate("Course with this code already exists").into())
        }
        Err(e) => Err(ApiError::Store(e).into()),
    }
}

#[utoipa::path(
    delete,
    path = "/api/courses/{course_id}",
    params(("course_id", Path, description = "Course ID")),
    responses(
        (status = 200, description = "Course removed", body = Object, example = json!({
            "message": "Course removed"
        })),
        (status = 404, description = "Course not found"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Courses"
)]
pub async fn delete_course(
    auth: CurrentUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let result = sqlx::query("DELETE FROM courses WHERE id = ?")
        .bind(path.into_inner())
        .execute(pool.get_ref())
        .await
        .map_err(ApiError::Store)?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("Course not found").into());
    }

    Ok(HttpResponse::Ok().json(json!({ "message": "Course removed" })))
}
