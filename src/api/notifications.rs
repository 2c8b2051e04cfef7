use crate::auth::auth::CurrentUser;
use crate::error::ApiError;
use crate::model::notification::Notification;
use crate::model::role::Role;
use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;

#[derive(Deserialize)]
pub struct CreateNotification {
    pub title: String,
    pub message: String,
    /// "all" or a user id as a string; defaults to everyone.
    pub recipient: Option<String>,
}

/// Staff see everything; students see broadcasts plus their own.
pub async fn list_notifications(
    auth: CurrentUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let notifications = match auth.role {
        Role::Admin | Role::Faculty => {
            sqlx::query_as::<_, Notification>("SELECT * FROM notifications ORDER BY date DESC")
                .fetch_all(pool.get_ref())
                .await
        }
        Role::Student => {
            sqlx::query_as::<_, Notification>(
                "SELECT * FROM notifications WHERE recipient IN ('all', ?) ORDER BY date DESC",
            )
            .bind(auth.id.to_string())
            .fetch_all(pool.get_ref())
            .await
        }
    }
    .map_err(ApiError::Store)?;

    Ok(HttpResponse::Ok().json(notifications))
}

pub async fn create_notification(
    auth: CurrentUser,
    pool: web::Data<MySqlPool>,
    body: web::Json<CreateNotification>,
) -> actix_web::Result<impl Responder> {
    auth.require_faculty_or_admin()?;

    if body.title.trim().is_empty() || body.message.trim().is_empty() {
        return Err(ApiError::Validation("Title and message are required".into()).into());
    }

    let recipient = body.recipient.clone().unwrap_or_else(|| "all".to_string());

    let result =
        sqlx::query("INSERT INTO notifications (title, message, recipient) VALUES (?, ?, ?)")
            .bind(body.title.trim())
            .bind(body.message.trim())
            .bind(&recipient)
            .execute(pool.get_ref())
            .await
            .map_err(ApiError::Store)?;

    // re-read for the store-generated timestamp
    let notification =
        sqlx::query_as::<_, Notification>("SELECT * FROM notifications WHERE id = ?")
            .bind(result.last_insert_id())
            .fetch_one(pool.get_ref())
            .await
            .map_err(ApiError::Store)?;

    Ok(HttpResponse::Ok().json(notification))
}

pub async fn delete_notification(
    auth: CurrentUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_faculty_or_admin()?;

    let result = sqlx::query("DELETE FROM notifications WHERE id = ?")
        .bind(path.into_inner())
        .execute(pool.get_ref())
        .await
        .map_err(ApiError::Store)?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("Notification not found").into());
    }

    Ok(HttpResponse::Ok().json(json!({ "message": "Notification removed" })))
}
