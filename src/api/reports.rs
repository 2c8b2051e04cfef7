//! Spreadsheet exports of student rosters with attendance aggregates.

use crate::auth::auth::CurrentUser;
use crate::error::ApiError;
use crate::model::course::Course;
use actix_web::{HttpResponse, Responder, http::header, web};
use rust_xlsxwriter::{Format, Workbook, XlsxError};
use sqlx::MySqlPool;
use std::collections::HashMap;
use tracing::error;

const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

#[derive(sqlx::FromRow)]
struct StudentStatRow {
    student_id: u64,
    present: i64,
    absent: i64,
    late: i64,
}

#[derive(Debug, Default, Clone, Copy)]
struct Totals {
    present: i64,
    absent: i64,
    late: i64,
}

impl Totals {
    fn total(&self) -> i64 {
        self.present + self.absent + self.late
    }

    /// Present and late both count as attended.
    fn percentage(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        (self.present + self.late) as f64 / total as f64 * 100.0
    }
}

#[derive(sqlx::FromRow)]
struct ExportStudentRow {
    user_id: u64,
    first_name: String,
    surname: String,
    email: String,
    status: String,
    mobile_number: Option<String>,
    whatsapp_number: Option<String>,
    is_whatsapp_same: bool,
    personal_email: Option<String>,
    marks: Option<String>,
    family_income: Option<f64>,
}

impl ExportStudentRow {
    fn whatsapp(&self) -> Option<&str> {
        if self.is_whatsapp_same {
            self.mobile_number.as_deref()
        } else {
            self.whatsapp_number.as_deref()
        }
    }
}

fn xlsx_err(e: XlsxError) -> actix_web::Error {
    error!(error = %e, "Failed to build workbook");
    actix_web::error::ErrorInternalServerError("Server Error")
}

async fn load_stats(
    pool: &MySqlPool,
    course_id: Option<u64>,
) -> Result<HashMap<u64, Totals>, ApiError> {
    let base = r#"
        SELECT student_id,
               CAST(SUM(status = 'Present') AS SIGNED) AS present,
               CAST(SUM(status = 'Absent') AS SIGNED) AS absent,
               CAST(SUM(status = 'Late') AS SIGNED) AS late
        FROM attendance
    "#;

    let rows = match course_id {
        Some(id) => {
            sqlx::query_as::<_, StudentStatRow>(&format!(
                "{} WHERE course_id = ? GROUP BY student_id",
                base
            ))
            .bind(id)
            .fetch_all(pool)
            .await
        }
        None => {
            sqlx::query_as::<_, StudentStatRow>(&format!("{} GROUP BY student_id", base))
                .fetch_all(pool)
                .await
        }
    }
    .map_err(ApiError::Store)?;

    Ok(rows
        .into_iter()
        .map(|r| {
            (
                r.student_id,
                Totals {
                    present: r.present,
                    absent: r.absent,
                    late: r.late,
                },
            )
        })
        .collect())
}

const STUDENT_ROW_COLUMNS: &str = r#"
    p.user_id, p.first_name, p.surname, u.email, u.status, p.mobile_number,
    p.whatsapp_number, p.is_whatsapp_same, p.personal_email, p.marks, p.family_income
"#;

/// Workbook with every student, their contact details, lifetime attendance
/// aggregates and enrolled course codes.
pub async fn export_all(
    auth: CurrentUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;
    let pool = pool.get_ref();

    let stats = load_stats(pool, None).await?;

    let students = sqlx::query_as::<_, ExportStudentRow>(&format!(
        r#"
        SELECT {}
        FROM student_profiles p
        INNER JOIN users u ON u.id = p.user_id
        ORDER BY p.first_name, p.surname
        "#,
        STUDENT_ROW_COLUMNS
    ))
    .fetch_all(pool)
    .await
    .map_err(ApiError::Store)?;

    // course codes per student, pre-sorted so the joined cell reads cleanly
    let code_rows = sqlx::query_as::<_, (u64, String)>(
        r#"
        SELECT sc.user_id, c.code
        FROM student_courses sc
        INNER JOIN courses c ON c.id = sc.course_id
        ORDER BY c.code
        "#,
    )
    .fetch_all(pool)
    .await
    .map_err(ApiError::Store)?;

    let mut codes: HashMap<u64, Vec<String>> = HashMap::new();
    for (user_id, code) in code_rows {
        codes.entry(user_id).or_default().push(code);
    }

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name("All Students").map_err(xlsx_err)?;

    let bold = Format::new().set_bold();
    let percent = Format::new().set_num_format("0.00\"%\"");
    let money = Format::new().set_num_format("\"$\"#,##0");

    let headers = [
        "First Name",
        "Surname",
        "Email",
        "Status",
        "Mobile",
        "WhatsApp",
        "Personal Email",
        "Marks",
        "Overall Attend %",
        "Total Present",
        "Total Absent",
        "Total Late",
        "Total Days",
        "Family Income",
        "Enrolled Courses",
        "User ID",
    ];
    let widths = [20, 20, 30, 10, 15, 15, 30, 15, 18, 13, 13, 13, 13, 15, 40, 25];

    for (col, (title, width)) in headers.iter().zip(widths).enumerate() {
        let col = col as u16;
        sheet.set_column_width(col, width).map_err(xlsx_err)?;
        sheet
            .write_string_with_format(0, col, *title, &bold)
            .map_err(xlsx_err)?;
    }

    for (i, s) in students.iter().enumerate() {
        let row = (i + 1) as u32;
        let totals = stats.get(&s.user_id).copied().unwrap_or_default();

        sheet.write_string(row, 0, &s.first_name).map_err(xlsx_err)?;
        sheet.write_string(row, 1, &s.surname).map_err(xlsx_err)?;
        sheet.write_string(row, 2, &s.email).map_err(xlsx_err)?;
        sheet.write_string(row, 3, &s.status).map_err(xlsx_err)?;
        sheet
            .write_string(row, 4, s.mobile_number.as_deref().unwrap_or(""))
            .map_err(xlsx_err)?;
        sheet
            .write_string(row, 5, s.whatsapp().unwrap_or(""))
            .map_err(xlsx_err)?;
        sheet
            .write_string(row, 6, s.personal_email.as_deref().unwrap_or(""))
            .map_err(xlsx_err)?;
        sheet
            .write_string(row, 7, s.marks.as_deref().unwrap_or(""))
            .map_err(xlsx_err)?;
        sheet
            .write_number_with_format(row, 8, totals.percentage(), &percent)
            .map_err(xlsx_err)?;
        sheet
            .write_number(row, 9, totals.present as f64)
            .map_err(xlsx_err)?;
        sheet
            .write_number(row, 10, totals.absent as f64)
            .map_err(xlsx_err)?;
        sheet
            .write_number(row, 11, totals.late as f64)
            .map_err(xlsx_err)?;
        sheet
            .write_number(row, 12, totals.total() as f64)
            .map_err(xlsx_err)?;
        if let Some(income) = s.family_income {
            sheet
                .write_number_with_format(row, 13, income, &money)
                .map_err(xlsx_err)?;
        }
        sheet
            .write_string(
                row,
                14,
                &codes
                    .get(&s.user_id)
                    .map(|c| c.join(", "))
                    .unwrap_or_default(),
            )
            .map_err(xlsx_err)?;
        sheet
            .write_string(row, 15, &s.user_id.to_string())
            .map_err(xlsx_err)?;
    }

    let buf = workbook.save_to_buffer().map_err(xlsx_err)?;

    Ok(HttpResponse::Ok()
        .insert_header((header::CONTENT_TYPE, XLSX_CONTENT_TYPE))
        .insert_header((
            header::CONTENT_DISPOSITION,
            "attachment; filename=\"all_students_export.xlsx\"",
        ))
        .body(buf))
}

/// Workbook for one course: its roster with attendance aggregates limited
/// to that course.
pub async fn export_course(
    auth: CurrentUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;
    let course_id = path.into_inner();
    let pool = pool.get_ref();

    let course = sqlx::query_as::<_, Course>("SELECT * FROM courses WHERE id = ?")
        .bind(course_id)
        .fetch_optional(pool)
        .await
        .map_err(ApiError::Store)?
        .ok_or(ApiError::NotFound("Course not found"))?;

    let stats = load_stats(pool, Some(course_id)).await?;

    let students = sqlx::query_as::<_, ExportStudentRow>(&format!(
        r#"
        SELECT {}
        FROM student_profiles p
        INNER JOIN users u ON u.id = p.user_id
        INNER JOIN student_courses sc ON sc.user_id = p.user_id
        WHERE sc.course_id = ?
        ORDER BY p.first_name, p.surname
        "#,
        STUDENT_ROW_COLUMNS
    ))
    .bind(course_id)
    .fetch_all(pool)
    .await
    .map_err(ApiError::Store)?;

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(&course.code).map_err(xlsx_err)?;

    let title_format = Format::new().set_bold().set_font_size(16);
    let bold = Format::new().set_bold();
    let percent = Format::new().set_num_format("0.00\"%\"");
    let money = Format::new().set_num_format("\"$\"#,##0");

    sheet
        .merge_range(
            0,
            0,
            0,
            5,
            &format!("{} - {}", course.code, course.title),
            &title_format,
        )
        .map_err(xlsx_err)?;

    let attend_header = format!("Attend % ({})", course.code);
    let headers: [&str; 14] = [
        "First Name",
        "Surname",
        "Email",
        "Status",
        "Mobile",
        "WhatsApp",
        "Personal Email",
        "Marks",
        attend_header.as_str(),
        "Present",
        "Absent",
        "Late",
        "Total Days",
        "Family Income",
    ];
    let widths = [20, 20, 30, 10, 15, 15, 30, 15, 15, 10, 10, 10, 10, 15];

    // row 1 stays empty under the merged title
    for (col, (title, width)) in headers.iter().zip(widths).enumerate() {
        let col = col as u16;
        sheet.set_column_width(col, width).map_err(xlsx_err)?;
        sheet
            .write_string_with_format(2, col, *title, &bold)
            .map_err(xlsx_err)?;
    }

    for (i, s) in students.iter().enumerate() {
        let row = (i + 3) as u32;
        let totals = stats.get(&s.user_id).copied().unwrap_or_default();

        sheet.write_string(row, 0, &s.first_name).map_err(xlsx_err)?;
        sheet.write_string(row, 1, &s.surname).map_err(xlsx_err)?;
        sheet.write_string(row, 2, &s.email).map_err(xlsx_err)?;
        sheet.write_string(row, 3, &s.status).map_err(xlsx_err)?;
        sheet
            .write_string(row, 4, s.mobile_number.as_deref().unwrap_or(""))
            .map_err(xlsx_err)?;
        sheet
            .write_string(row, 5, s.whatsapp().unwrap_or(""))
            .map_err(xlsx_err)?;
        sheet
            .write_string(row, 6, s.personal_email.as_deref().unwrap_or(""))
            .map_err(xlsx_err)?;
        sheet
            .write_string(row, 7, s.marks.as_deref().unwrap_or(""))
            .map_err(xlsx_err)?;
        sheet
            .write_number_with_format(row, 8, totals.percentage(), &percent)
            .map_err(xlsx_err)?;
        sheet
            .write_number(row, 9, totals.present as f64)
            .map_err(xlsx_err)?;
        sheet
            .write_number(row, 10, totals.absent as f64)
            .map_err(xlsx_err)?;
        sheet
            .write_number(row, 11, totals.late as f64)
            .map_err(xlsx_err)?;
        sheet
            .write_number(row, 12, totals.total() as f64)
            .map_err(xlsx_err)?;
        if let Some(income) = s.family_income {
            sheet
                .write_number_with_format(row, 13, income, &money)
                .map_err(xlsx_err)?;
        }
    }

    let buf = workbook.save_to_buffer().map_err(xlsx_err)?;
    let file_name = format!("{}_students_export.xlsx", course.code);

    Ok(HttpResponse::Ok()
        .insert_header((header::CONTENT_TYPE, XLSX_CONTENT_TYPE))
        .insert_header((
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", file_name),
        ))
        .body(buf))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attended_days_drive_the_percentage() {
        let totals = Totals {
            present: 6,
            absent: 2,
            late: 2,
        };
        assert_eq!(totals.total(), 10);
        assert!((totals.percentage() - 80.0).abs() < f64::EPSILON);
    }

    #[test]
    fn no_records_means_zero_percent() {
        assert_eq!(Totals::default().percentage(), 0.0);
    }

    #[test]
    fn whatsapp_falls_back_to_mobile() {
        let mut row = ExportStudentRow {
            user_id: 1,
            first_name: "A".into(),
            surname: "B".into(),
            email: "a@college.edu".into(),
            status: "active".into(),
            mobile_number: Some("0170".into()),
            whatsapp_number: Some("0199".into()),
            is_whatsapp_same: true,
            personal_email: None,
            marks: None,
            family_income: None,
        };
        assert_eq!(row.whatsapp(), Some("0170"));
        row.is_whatsapp_same = false;
        assert_eq!(row.whatsapp(), Some("0199"));
    }
}
