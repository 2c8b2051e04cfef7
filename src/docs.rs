use crate::api::attendance::{
    BatchAttendance, BatchEntry, MarkAttendance, MonthlyStat, SelfCheckIn,
};
use crate::api::courses::{CourseWithFaculty, CreateCourse};
use crate::model::attendance::{AttendanceRecord, AttendanceStatus};
use crate::model::course::Course;
use crate::models::{LoginReq, RegisterReq};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "College Portal API",
        version = "1.0.0",
        description = r#"
## College Administration Portal

This API powers a college administration portal covering the day-to-day
back office of a small campus.

### Key Features
- **Accounts & Approval**
  - Self-registration with admin/faculty approval, suspension windows
- **Courses & Enrollment**
  - Course catalogue, faculty assignment, student enrollment
- **Attendance**
  - Manual marking, batch upsert, student self-check-in and a nightly
    absentee back-fill
- **Grades, Events, Notifications & Mood Surveys**
  - Gradebooks, campus events, notices and a daily wellbeing survey

### Security
Most endpoints are protected using **JWT Bearer authentication**; the
session gate also rejects suspended and pending accounts.

### Response Format
- JSON-based RESTful responses
- Spreadsheet exports for admin reports

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::auth::handlers::register,
        crate::auth::handlers::login,

        crate::api::attendance::mark_attendance,
        crate::api::attendance::batch_attendance,
        crate::api::attendance::self_check_in,
        crate::api::attendance::my_attended_courses,
        crate::api::attendance::my_monthly_stats,
        crate::api::attendance::my_daily_records,

        crate::api::courses::list_courses,
        crate::api::courses::my_courses,
        crate::api::courses::get_course,
        crate::api::courses::create_course,
        crate::api::courses::update_course,
        crate::api::courses::delete_course,
    ),
    components(
        schemas(
            RegisterReq,
            LoginReq,
            MarkAttendance,
            BatchEntry,
            BatchAttendance,
            SelfCheckIn,
            MonthlyStat,
            AttendanceRecord,
            AttendanceStatus,
            Course,
            CreateCourse,
            CourseWithFaculty
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Registration and login"),
        (name = "Attendance", description = "Attendance management APIs"),
        (name = "Courses", description = "Course management APIs"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
