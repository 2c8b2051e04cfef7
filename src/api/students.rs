use crate::auth::auth::CurrentUser;
use crate::error::ApiError;
use crate::model::course::Course;
use crate::model::student_profile::{Certificate, StudentProfile};
use crate::utils::db_utils::{build_update_sql, execute_update};
use actix_web::{HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::MySqlPool;
use tracing::error;

/// Profile columns a student may edit on their own profile.
const PROFILE_SELF_COLUMNS: &[&str] = &[
    "first_name",
    "surname",
    "mobile_number",
    "personal_email",
    "is_whatsapp_same",
    "whatsapp_number",
    "photo",
    "family_income",
];

/// Staff may additionally record marks.
const PROFILE_STAFF_COLUMNS: &[&str] = &[
    "first_name",
    "surname",
    "mobile_number",
    "personal_email",
    "is_whatsapp_same",
    "whatsapp_number",
    "photo",
    "family_income",
    "marks",
];

#[derive(Deserialize)]
pub struct EnrollReq {
    pub course_id: u64,
}

#[derive(Deserialize)]
pub struct SearchQuery {
    pub name: Option<String>,
}

#[derive(Deserialize)]
struct CertificateInput {
    title: String,
    url: String,
}

#[derive(Serialize)]
pub struct ProfileResponse {
    #[serde(flatten)]
    pub profile: StudentProfile,
    pub certificates: Vec<Certificate>,
}

#[derive(Serialize)]
pub struct ProfileDetails {
    #[serde(flatten)]
    pub profile: StudentProfile,
    pub certificates: Vec<Certificate>,
    pub courses: Vec<Course>,
    pub overall_attendance_percentage: f64,
}

/// Search results leave out income and certificates.
#[derive(Serialize, sqlx::FromRow)]
pub struct ProfileSummary {
    pub id: u64,
    pub user_id: u64,
    pub first_name: String,
    pub surname: String,
    pub email: String,
    pub mobile_number: Option<String>,
    pub personal_email: Option<String>,
    pub is_whatsapp_same: bool,
    pub whatsapp_number: Option<String>,
    pub photo: String,
    pub marks: Option<String>,
}

#[derive(Serialize, sqlx::FromRow)]
pub struct RosterEntry {
    pub id: u64,
    pub user_id: u64,
    pub first_name: String,
    pub surname: String,
}

#[derive(sqlx::FromRow)]
struct AttendanceTotals {
    present: i64,
    absent: i64,
    late: i64,
}

async fn fetch_profile(pool: &MySqlPool, user_id: u64) -> Result<StudentProfile, ApiError> {
    sqlx::query_as::<_, StudentProfile>("SELECT * FROM student_profiles WHERE user_id = ?")
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .map_err(ApiError::Store)?
        .ok_or(ApiError::NotFound("Profile not found"))
}

async fn fetch_certificates(pool: &MySqlPool, profile_id: u64) -> Result<Vec<Certificate>, ApiError> {
    sqlx::query_as::<_, Certificate>("SELECT * FROM certificates WHERE profile_id = ?")
        .bind(profile_id)
        .fetch_all(pool)
        .await
        .map_err(ApiError::Store)
}

async fn enrolled_courses(pool: &MySqlPool, user_id: u64) -> Result<Vec<Course>, ApiError> {
    sqlx::query_as::<_, Course>(
        r#"
        SELECT c.*
        FROM courses c
        INNER JOIN student_courses sc ON sc.course_id = c.id
        WHERE sc.user_id = ?
        ORDER BY c.code
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .map_err(ApiError::Store)
}

/// Overall percentage across all courses; present and late both count as
/// attended.
async fn overall_attendance(pool: &MySqlPool, user_id: u64) -> Result<f64, ApiError> {
    let totals = sqlx::query_as::<_, AttendanceTotals>(
        r#"
        SELECT CAST(COALESCE(SUM(status = 'Present'), 0) AS SIGNED) AS present,
               CAST(COALESCE(SUM(status = 'Absent'), 0) AS SIGNED) AS absent,
               CAST(COALESCE(SUM(status = 'Late'), 0) AS SIGNED) AS late
        FROM attendance
        WHERE student_id = ?
        "#,
    )
    .bind(user_id)
    .fetch_one(pool)
    .await
    .map_err(ApiError::Store)?;

    let total = totals.present + totals.absent + totals.late;
    if total == 0 {
        return Ok(0.0);
    }
    Ok((totals.present + totals.late) as f64 / total as f64 * 100.0)
}

/// Apply a partial profile update, restricted to `allowed` columns, plus the
/// optional certificates replacement, then sync the display name.
async fn apply_profile_update(
    pool: &MySqlPool,
    user_id: u64,
    payload: &Value,
    allowed: &[&str],
) -> Result<StudentProfile, ApiError> {
    let profile = fetch_profile(pool, user_id).await?;

    let has_column_updates = payload
        .as_object()
        .map(|o| o.keys().any(|k| allowed.contains(&k.as_str())))
        .unwrap_or(false);

    if has_column_updates {
        let update = build_update_sql("student_profiles", payload, allowed, "user_id", user_id)?;
        execute_update(pool, update).await.map_err(ApiError::Store)?;
    }

    if let Some(certs) = payload.get("certificates") {
        let certs: Vec<CertificateInput> = serde_json::from_value(certs.clone())
            .map_err(|_| ApiError::Validation("Invalid certificates format".into()))?;

        sqlx::query("DELETE FROM certificates WHERE profile_id = ?")
            .bind(profile.id)
            .execute(pool)
            .await
            .map_err(ApiError::Store)?;

        for cert in &certs {
            sqlx::query("INSERT INTO certificates (profile_id, title, url) VALUES (?, ?, ?)")
                .bind(profile.id)
                .bind(&cert.title)
                .bind(&cert.url)
                .execute(pool)
                .await
                .map_err(ApiError::Store)?;
        }
    } else if !has_column_updates {
        return Err(ApiError::Validation("No fields provided for update".into()));
    }

    let fresh = fetch_profile(pool, user_id).await?;

    // Keep the account's display name in step with the profile.
    if payload.get("first_name").is_some() || payload.get("surname").is_some() {
        let name = format!("{} {}", fresh.first_name, fresh.surname);
        sqlx::query("UPDATE users SET name = ? WHERE id = ?")
            .bind(name.trim())
            .bind(user_id)
            .execute(pool)
            .await
            .map_err(ApiError::Store)?;
    }

    Ok(fresh)
}

// -------------------- student-facing --------------------

pub async fn my_profile(
    auth: CurrentUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let profile = fetch_profile(pool.get_ref(), auth.id).await?;
    let certificates = fetch_certificates(pool.get_ref(), profile.id).await?;

    Ok(HttpResponse::Ok().json(ProfileResponse {
        profile,
        certificates,
    }))
}

pub async fn my_courses(
    auth: CurrentUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    // ensure the profile exists, as registration should have created it
    fetch_profile(pool.get_ref(), auth.id).await?;
    let courses = enrolled_courses(pool.get_ref(), auth.id).await?;
    Ok(HttpResponse::Ok().json(courses))
}

pub async fn enroll_me(
    auth: CurrentUser,
    pool: web::Data<MySqlPool>,
    body: web::Json<EnrollReq>,
) -> actix_web::Result<impl Responder> {
    let exists = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM courses WHERE id = ?")
        .bind(body.course_id)
        .fetch_one(pool.get_ref())
        .await
        .map_err(ApiError::Store)?;
    if exists == 0 {
        return Err(ApiError::NotFound("Course not found").into());
    }

    // IGNORE makes re-enrolling a no-op, like $addToSet
    sqlx::query("INSERT IGNORE INTO student_courses (user_id, course_id) VALUES (?, ?)")
        .bind(auth.id)
        .bind(body.course_id)
        .execute(pool.get_ref())
        .await
        .map_err(ApiError::Store)?;

    let courses = enrolled_courses(pool.get_ref(), auth.id).await?;
    Ok(HttpResponse::Ok().json(courses))
}

pub async fn unenroll_me(
    auth: CurrentUser,
    pool: web::Data<MySqlPool>,
    body: web::Json<EnrollReq>,
) -> actix_web::Result<impl Responder> {
    sqlx::query("DELETE FROM student_courses WHERE user_id = ? AND course_id = ?")
        .bind(auth.id)
        .bind(body.course_id)
        .execute(pool.get_ref())
        .await
        .map_err(ApiError::Store)?;

    let courses = enrolled_courses(pool.get_ref(), auth.id).await?;
    Ok(HttpResponse::Ok().json(courses))
}

pub async fn update_my_profile(
    auth: CurrentUser,
    pool: web::Data<MySqlPool>,
    body: web::Json<Value>,
) -> actix_web::Result<impl Responder> {
    let profile = apply_profile_update(pool.get_ref(), auth.id, &body, PROFILE_SELF_COLUMNS).await?;
    Ok(HttpResponse::Ok().json(profile))
}

// -------------------- staff-facing --------------------

pub async fn manage_enroll(
    auth: CurrentUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<(u64, u64)>,
) -> actix_web::Result<impl Responder> {
    auth.require_faculty_or_admin()?;
    let (student_id, course_id) = path.into_inner();

    fetch_profile(pool.get_ref(), student_id).await?;

    sqlx::query("INSERT IGNORE INTO student_courses (user_id, course_id) VALUES (?, ?)")
        .bind(student_id)
        .bind(course_id)
        .execute(pool.get_ref())
        .await
        .map_err(|e| {
            error!(error = %e, student_id, course_id, "Managed enroll failed");
            ApiError::Store(e)
        })?;

    let courses = enrolled_courses(pool.get_ref(), student_id).await?;
    Ok(HttpResponse::Ok().json(courses))
}

pub async fn manage_unenroll(
    auth: CurrentUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<(u64, u64)>,
) -> actix_web::Result<impl Responder> {
    auth.require_faculty_or_admin()?;
    let (student_id, course_id) = path.into_inner();

    fetch_profile(pool.get_ref(), student_id).await?;

    sqlx::query("DELETE FROM student_courses WHERE user_id = ? AND course_id = ?")
        .bind(student_id)
        .bind(course_id)
        .execute(pool.get_ref())
        .await
        .map_err(ApiError::Store)?;

    let courses = enrolled_courses(pool.get_ref(), student_id).await?;
    Ok(HttpResponse::Ok().json(courses))
}

pub async fn search(
    auth: CurrentUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<SearchQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_faculty_or_admin()?;

    let like = format!("%{}%", query.name.as_deref().unwrap_or(""));
    let students = sqlx::query_as::<_, ProfileSummary>(
        r#"
        SELECT id, user_id, first_name, surname, email, mobile_number, personal_email,
               is_whatsapp_same, whatsapp_number, photo, marks
        FROM student_profiles
        WHERE first_name LIKE ? OR surname LIKE ?
        ORDER BY first_name, surname
        "#,
    )
    .bind(&like)
    .bind(&like)
    .fetch_all(pool.get_ref())
    .await
    .map_err(ApiError::Store)?;

    Ok(HttpResponse::Ok().json(students))
}

pub async fn by_course(
    auth: CurrentUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_faculty_or_admin()?;

    let students = sqlx::query_as::<_, RosterEntry>(
        r#"
        SELECT p.id, p.user_id, p.first_name, p.surname
        FROM student_profiles p
        INNER JOIN student_courses sc ON sc.user_id = p.user_id
        WHERE sc.course_id = ?
        ORDER BY p.first_name, p.surname
        "#,
    )
    .bind(path.into_inner())
    .fetch_all(pool.get_ref())
    .await
    .map_err(ApiError::Store)?;

    Ok(HttpResponse::Ok().json(students))
}

pub async fn get_student(
    auth: CurrentUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_faculty_or_admin()?;
    let user_id = path.into_inner();

    let profile = fetch_profile(pool.get_ref(), user_id).await?;
    let certificates = fetch_certificates(pool.get_ref(), profile.id).await?;
    let courses = enrolled_courses(pool.get_ref(), user_id).await?;
    let overall_attendance_percentage = overall_attendance(pool.get_ref(), user_id).await?;

    Ok(HttpResponse::Ok().json(ProfileDetails {
        profile,
        certificates,
        courses,
        overall_attendance_percentage,
    }))
}

pub async fn update_student(
    auth: CurrentUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<Value>,
) -> actix_web::Result<impl Responder> {
    auth.require_faculty_or_admin()?;
    let user_id = path.into_inner();

    let profile =
        apply_profile_update(pool.get_ref(), user_id, &body, PROFILE_STAFF_COLUMNS).await?;
    Ok(HttpResponse::Ok().json(profile))
}
