use crate::auth::auth::CurrentUser;
use crate::error::ApiError;
use crate::model::role::Role;
use crate::model::user::{AccountStatus, PUBLIC_USER_COLUMNS, PublicUser};
use crate::utils::{email_cache, email_filter};
use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::MySqlPool;
use std::str::FromStr;
use tracing::info;

#[derive(Deserialize)]
pub struct SuspendReq {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Serialize, sqlx::FromRow)]
pub struct FacultyItem {
    pub id: u64,
    pub name: String,
}

async fn fetch_public_user(pool: &MySqlPool, id: u64) -> Result<PublicUser, ApiError> {
    sqlx::query_as::<_, PublicUser>(&format!(
        "SELECT {} FROM users WHERE id = ?",
        PUBLIC_USER_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
    .map_err(ApiError::Store)?
    .ok_or(ApiError::NotFound("User not found"))
}

async fn list_public_users(pool: &MySqlPool, filter_sql: &str) -> Result<Vec<PublicUser>, ApiError> {
    sqlx::query_as::<_, PublicUser>(&format!(
        "SELECT {} FROM users {}",
        PUBLIC_USER_COLUMNS, filter_sql
    ))
    .fetch_all(pool)
    .await
    .map_err(ApiError::Store)
}

/// Faculty may only act on student-role subjects; admins act on anyone.
fn check_subject_role(actor: &CurrentUser, subject_role: &str, denial: &'static str) -> Result<(), ApiError> {
    if Role::from_str(subject_role) != Ok(Role::Student) && actor.role != Role::Admin {
        return Err(ApiError::Forbidden(denial));
    }
    Ok(())
}

pub async fn pending_students(
    auth: CurrentUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    auth.require_faculty_or_admin()?;
    let users = list_public_users(
        pool.get_ref(),
        "WHERE status = 'pending' AND role = 'student' ORDER BY id DESC",
    )
    .await?;
    Ok(HttpResponse::Ok().json(users))
}

pub async fn pending_faculty(
    auth: CurrentUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;
    let users = list_public_users(
        pool.get_ref(),
        "WHERE status = 'pending' AND role = 'faculty' ORDER BY id DESC",
    )
    .await?;
    Ok(HttpResponse::Ok().json(users))
}

pub async fn pending_admins(
    auth: CurrentUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;
    let users = list_public_users(
        pool.get_ref(),
        "WHERE status = 'pending' AND role = 'admin' ORDER BY id DESC",
    )
    .await?;
    Ok(HttpResponse::Ok().json(users))
}

pub async fn active_users(
    auth: CurrentUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;
    let users = list_public_users(
        pool.get_ref(),
        "WHERE status = 'active' AND role IN ('student', 'faculty') ORDER BY role, name",
    )
    .await?;
    Ok(HttpResponse::Ok().json(users))
}

pub async fn suspended_users(
    auth: CurrentUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;
    let users = list_public_users(pool.get_ref(), "WHERE status = 'suspended' ORDER BY name").await?;
    Ok(HttpResponse::Ok().json(users))
}

/// Active faculty members, for course-assignment dropdowns.
pub async fn active_faculty(
    auth: CurrentUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;
    let faculty = sqlx::query_as::<_, FacultyItem>(
        "SELECT id, name FROM users WHERE role = 'faculty' AND status = 'active' ORDER BY name",
    )
    .fetch_all(pool.get_ref())
    .await
    .map_err(ApiError::Store)?;
    Ok(HttpResponse::Ok().json(faculty))
}

/// Flip a pending account to active.
pub async fn approve_user(
    auth: CurrentUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_faculty_or_admin()?;
    let user_id = path.into_inner();

    let mut user = fetch_public_user(pool.get_ref(), user_id).await?;
    check_subject_role(
        &auth,
        &user.role,
        "Access Denied: Faculty can only approve students.",
    )?;

    sqlx::query("UPDATE users SET status = 'active' WHERE id = ?")
        .bind(user_id)
        .execute(pool.get_ref())
        .await
        .map_err(ApiError::Store)?;

    user.status = AccountStatus::Active.to_string();
    info!(user_id, approved_by = auth.id, "User approved");

    Ok(HttpResponse::Ok().json(json!({ "message": "User approved", "user": user })))
}

/// Reject (and delete) a pending account.
pub async fn reject_user(
    auth: CurrentUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_faculty_or_admin()?;
    let user_id = path.into_inner();

    let user = fetch_public_user(pool.get_ref(), user_id).await?;
    if user.status != AccountStatus::Pending.to_string() {
        return Err(ApiError::Validation("Cannot reject an active user".into()).into());
    }
    check_subject_role(
        &auth,
        &user.role,
        "Access Denied: Faculty can only reject students.",
    )?;

    // Profile and enrollment rows cascade with the account.
    sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(user_id)
        .execute(pool.get_ref())
        .await
        .map_err(ApiError::Store)?;

    email_filter::remove(&user.email);
    email_cache::release(&user.email).await;

    info!(user_id, rejected_by = auth.id, "User rejected and deleted");

    Ok(HttpResponse::Ok().json(json!({ "message": "User rejected and deleted" })))
}

/// Suspend an account for a date window. Admin accounts cannot be suspended.
pub async fn suspend_user(
    auth: CurrentUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<SuspendReq>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;
    let user_id = path.into_inner();

    if body.end_date <= body.start_date {
        return Err(ApiError::Validation("End date must be after start date.".into()).into());
    }

    let mut user = fetch_public_user(pool.get_ref(), user_id).await?;
    if Role::from_str(&user.role) == Ok(Role::Admin) {
        return Err(ApiError::Validation("Cannot suspend an admin account".into()).into());
    }

    sqlx::query(
        "UPDATE users SET status = 'suspended', suspension_start = ?, suspension_end = ? WHERE id = ?",
    )
    .bind(body.start_date)
    .bind(body.end_date)
    .bind(user_id)
    .execute(pool.get_ref())
    .await
    .map_err(ApiError::Store)?;

    user.status = AccountStatus::Suspended.to_string();
    user.suspension_start = Some(body.start_date);
    user.suspension_end = Some(body.end_date);

    info!(user_id, suspended_by = auth.id, "User suspended");

    Ok(HttpResponse::Ok().json(json!({ "message": "User suspended", "user": user })))
}

/// Lift a suspension and clear its window.
pub async fn reactivate_user(
    auth: CurrentUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;
    let user_id = path.into_inner();

    let mut user = fetch_public_user(pool.get_ref(), user_id).await?;
    if user.status != AccountStatus::Suspended.to_string() {
        return Err(ApiError::Validation("User is not suspended".into()).into());
    }

    sqlx::query(
        "UPDATE users SET status = 'active', suspension_start = NULL, suspension_end = NULL WHERE id = ?",
    )
    .bind(user_id)
    .execute(pool.get_ref())
    .await
    .map_err(ApiError::Store)?;

    user.status = AccountStatus::Active.to_string();
    user.suspension_start = None;
    user.suspension_end = None;

    Ok(HttpResponse::Ok().json(json!({ "message": "User reactivated", "user": user })))
}

/// Permanently delete an account. Admin accounts cannot be deleted.
pub async fn delete_user(
    auth: CurrentUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;
    let user_id = path.into_inner();

    let user = fetch_public_user(pool.get_ref(), user_id).await?;
    if Role::from_str(&user.role) == Ok(Role::Admin) {
        return Err(ApiError::Validation("Cannot delete an admin account".into()).into());
    }

    sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(user_id)
        .execute(pool.get_ref())
        .await
        .map_err(ApiError::Store)?;

    email_filter::remove(&user.email);
    email_cache::release(&user.email).await;

    info!(user_id, deleted_by = auth.id, "User permanently deleted");

    Ok(HttpResponse::Ok().json(json!({ "message": "User has been permanently deleted." })))
}
