use crate::auth::auth::CurrentUser;
use crate::config::Config;
use crate::error::{ApiError, is_duplicate};
use crate::model::attendance::{AttendanceRecord, AttendanceStatus};
use crate::model::course::Course;
use crate::model::role::Role;
use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use std::str::FromStr;
use tracing::error;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct MarkAttendance {
    #[schema(example = 12)]
    pub student_id: u64,
    #[schema(example = 3)]
    pub course_id: u64,
    #[schema(example = "2026-08-07", format = "date", value_type = String)]
    pub date: NaiveDate,
    #[schema(example = "Present")]
    pub status: AttendanceStatus,
}

#[derive(Deserialize, ToSchema)]
pub struct BatchEntry {
    #[schema(example = 12)]
    pub student_id: u64,
    #[schema(example = "Absent")]
    pub status: AttendanceStatus,
}

#[derive(Deserialize, ToSchema)]
pub struct BatchAttendance {
    #[schema(example = 3)]
    pub course_id: u64,
    #[schema(example = "2026-08-07", format = "date", value_type = String)]
    pub date: NaiveDate,
    pub attendance_data: Vec<BatchEntry>,
}

#[derive(Deserialize, ToSchema)]
pub struct SelfCheckIn {
    #[schema(example = 3)]
    pub course_id: u64,
}

#[derive(Serialize, ToSchema)]
pub struct MonthlyStat {
    #[schema(example = 2026)]
    pub year: i64,
    #[schema(example = 8)]
    pub month: i64,
    pub course: Course,
    #[schema(example = 14)]
    pub present: i64,
    #[schema(example = 2)]
    pub absent: i64,
    #[schema(example = 1)]
    pub late: i64,
    #[schema(example = 17)]
    pub total: i64,
    #[schema(example = 82.35)]
    pub percentage: f64,
}

#[derive(sqlx::FromRow)]
struct MonthlyStatRow {
    year: i64,
    month: i64,
    present: i64,
    absent: i64,
    late: i64,
}

/// Mark a single student for one day.
#[utoipa::path(
    post,
    path = "/api/attendance",
    request_body = MarkAttendance,
    responses(
        (status = 201, description = "Record created", body = AttendanceRecord),
        (status = 400, description = "Duplicate record or subject is not a student"),
        (status = 404, description = "Student or course not found"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn mark_attendance(
    auth: CurrentUser,
    pool: web::Data<MySqlPool>,
    body: web::Json<MarkAttendance>,
) -> actix_web::Result<impl Responder> {
    auth.require_faculty_or_admin()?;

    let student_role =
        sqlx::query_scalar::<_, String>("SELECT role FROM users WHERE id = ?")
            .bind(body.student_id)
            .fetch_optional(pool.get_ref())
            .await
            .map_err(ApiError::Store)?
            .ok_or(ApiError::NotFound("Student not found"))?;

    if Role::from_str(&student_role) != Ok(Role::Student) {
        return Err(ApiError::Validation("This user is not a student".into()).into());
    }

    let course_exists =
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM courses WHERE id = ?")
            .bind(body.course_id)
            .fetch_one(pool.get_ref())
            .await
            .map_err(ApiError::Store)?;
    if course_exists == 0 {
        return Err(ApiError::NotFound("Course not found").into());
    }

    let result = sqlx::query(
        "INSERT INTO attendance (student_id, course_id, date, status, marked_by) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(body.student_id)
    .bind(body.course_id)
    .bind(body.date)
    .bind(body.status.to_string())
    .bind(auth.id)
    .execute(pool.get_ref())
    .await;

    match result {
        Ok(r) => Ok(HttpResponse::Created().json(AttendanceRecord {
            id: r.last_insert_id(),
            student_id: body.student_id,
            course_id: body.course_id,
            date: body.date,
            status: body.status.to_string(),
            marked_by: Some(auth.id),
        })),
        Err(e) if is_duplicate(&e) => Err(ApiError::Duplicate(
            "Attendance for this student in this course on this date already exists.",
        )
        .into()),
        Err(e) => Err(ApiError::Store(e).into()),
    }
}

/// Upsert attendance for many students of one course on one day.
#[utoipa::path(
    post,
    path = "/api/attendance/batch",
    request_body = BatchAttendance,
    responses(
        (status = 201, description = "Batch saved", body = Object, example = json!({
            "message": "Attendance submitted. 32 records saved.",
            "success_count": 32
        })),
        (status = 400, description = "Invalid data format"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn batch_attendance(
    auth: CurrentUser,
    pool: web::Data<MySqlPool>,
    body: web::Json<BatchAttendance>,
) -> actix_web::Result<impl Responder> {
    auth.require_faculty_or_admin()?;

    if body.attendance_data.is_empty() {
        return Err(ApiError::Validation("Invalid data format.".into()).into());
    }

    let mut qb = sqlx::QueryBuilder::<sqlx::MySql>::new(
        "INSERT INTO attendance (student_id, course_id, date, status, marked_by) ",
    );
    qb.push_values(&body.attendance_data, |mut b, entry| {
        b.push_bind(entry.student_id)
            .push_bind(body.course_id)
            .push_bind(body.date)
            .push_bind(entry.status.to_string())
            .push_bind(auth.id);
    });
    qb.push(
        " ON DUPLICATE KEY UPDATE status = VALUES(status), marked_by = VALUES(marked_by)",
    );

    qb.build().execute(pool.get_ref()).await.map_err(|e| {
        error!(error = %e, course_id = body.course_id, "Batch attendance failed");
        ApiError::Store(e)
    })?;

    let count = body.attendance_data.len();
    Ok(HttpResponse::Created().json(json!({
        "message": format!("Attendance submitted. {} records saved.", count),
        "success_count": count
    })))
}

/// Student self-check-in for today. The date is generated on the server in
/// the campus time zone, so a client clock cannot back- or forward-date it.
#[utoipa::path(
    post,
    path = "/api/attendance/me",
    request_body = SelfCheckIn,
    responses(
        (status = 201, description = "Marked present for today", body = Object, example = json!({
            "message": "Attendance marked successfully for today!"
        })),
        (status = 400, description = "Already checked in today"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn self_check_in(
    auth: CurrentUser,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
    body: web::Json<SelfCheckIn>,
) -> actix_web::Result<impl Responder> {
    auth.require_student()?;

    let today = config.today();

    let result = sqlx::query(
        "INSERT INTO attendance (student_id, course_id, date, status, marked_by) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(auth.id)
    .bind(body.course_id)
    .bind(today)
    .bind(AttendanceStatus::Present.to_string())
    .bind(auth.id) // the student marked themselves
    .execute(pool.get_ref())
    .await;

    match result {
        Ok(_) => Ok(HttpResponse::Created().json(json!({
            "message": "Attendance marked successfully for today!"
        }))),
        Err(e) if is_duplicate(&e) => Err(ApiError::Duplicate(
            "You have already marked your attendance for this course today.",
        )
        .into()),
        Err(e) => {
            error!(error = %e, student_id = auth.id, "Self check-in failed");
            Err(ApiError::Store(e).into())
        }
    }
}

/// Courses in which the student has at least one attendance record.
#[utoipa::path(
    get,
    path = "/api/attendance/me/courses",
    responses(
        (status = 200, description = "Courses with attendance history", body = [Course]),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn my_attended_courses(
    auth: CurrentUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let courses = sqlx::query_as::<_, Course>(
        r#"
        SELECT DISTINCT c.*
        FROM courses c
        INNER JOIN attendance a ON a.course_id = c.id
        WHERE a.student_id = ?
        ORDER BY c.code
        "#,
    )
    .bind(auth.id)
    .fetch_all(pool.get_ref())
    .await
    .map_err(ApiError::Store)?;

    Ok(HttpResponse::Ok().json(courses))
}

/// Month-by-month attendance summary for one of the student's courses.
#[utoipa::path(
    get,
    path = "/api/attendance/me/stats/{course_id}",
    params(("course_id", Path, description = "Course ID")),
    responses(
        (status = 200, description = "Monthly summaries, newest first", body = [MonthlyStat]),
        (status = 404, description = "Course not found"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn my_monthly_stats(
    auth: CurrentUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let course_id = path.into_inner();

    let course = sqlx::query_as::<_, Course>("SELECT * FROM courses WHERE id = ?")
        .bind(course_id)
        .fetch_optional(pool.get_ref())
        .await
        .map_err(ApiError::Store)?
        .ok_or(ApiError::NotFound("Course not found"))?;

    let rows = sqlx::query_as::<_, MonthlyStatRow>(
        r#"
        SELECT CAST(YEAR(date) AS SIGNED) AS year,
               CAST(MONTH(date) AS SIGNED) AS month,
               CAST(SUM(status = 'Present') AS SIGNED) AS present,
               CAST(SUM(status = 'Absent') AS SIGNED) AS absent,
               CAST(SUM(status = 'Late') AS SIGNED) AS late
        FROM attendance
        WHERE student_id = ? AND course_id = ?
        GROUP BY YEAR(date), MONTH(date)
        ORDER BY year DESC, month DESC
        "#,
    )
    .bind(auth.id)
    .bind(course_id)
    .fetch_all(pool.get_ref())
    .await
    .map_err(ApiError::Store)?;

    let stats: Vec<MonthlyStat> = rows
        .into_iter()
        .map(|r| {
            let total = r.present + r.absent + r.late;
            let percentage = if total == 0 {
                0.0
            } else {
                r.present as f64 / total as f64 * 100.0
            };
            MonthlyStat {
                year: r.year,
                month: r.month,
                course: course.clone(),
                present: r.present,
                absent: r.absent,
                late: r.late,
                total,
                percentage,
            }
        })
        .collect();

    Ok(HttpResponse::Ok().json(stats))
}

/// Day-by-day records for one course and month.
#[utoipa::path(
    get,
    path = "/api/attendance/me/daily/{course_id}/{year}/{month}",
    params(
        ("course_id", Path, description = "Course ID"),
        ("year", Path, description = "Calendar year"),
        ("month", Path, description = "Month 1-12")
    ),
    responses(
        (status = 200, description = "Records sorted by date", body = [AttendanceRecord]),
        (status = 400, description = "Invalid year or month"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn my_daily_records(
    auth: CurrentUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<(u64, i32, u32)>,
) -> actix_web::Result<impl Responder> {
    let (course_id, year, month) = path.into_inner();

    let start = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| ApiError::Validation("Invalid year or month".into()))?;
    let end = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .ok_or_else(|| ApiError::Validation("Invalid year or month".into()))?;

    let records = sqlx::query_as::<_, AttendanceRecord>(
        r#"
        SELECT * FROM attendance
        WHERE student_id = ? AND course_id = ? AND date >= ? AND date < ?
        ORDER BY date
        "#,
    )
    .bind(auth.id)
    .bind(course_id)
    .bind(start)
    .bind(end)
    .fetch_all(pool.get_ref())
    .await
    .map_err(ApiError::Store)?;

    Ok(HttpResponse::Ok().json(records))
}
