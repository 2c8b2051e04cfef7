use crate::auth::auth::CurrentUser;
use crate::error::ApiError;
use crate::model::event::Event;
use crate::model::role::Role;
use crate::utils::db_utils::{build_update_sql, execute_update};
use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDateTime;
use serde::Deserialize;
use serde_json::{Value, json};
use sqlx::MySqlPool;

const EVENT_UPDATE_COLUMNS: &[&str] = &["title", "description", "date"];

#[derive(Deserialize)]
pub struct CreateEvent {
    pub title: String,
    pub description: String,
    pub date: NaiveDateTime,
}

/// Staff see the full history; students only what is still ahead.
pub async fn list_events(
    auth: CurrentUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let events = match auth.role {
        Role::Admin | Role::Faculty => {
            sqlx::query_as::<_, Event>("SELECT * FROM events ORDER BY date DESC")
                .fetch_all(pool.get_ref())
                .await
        }
        Role::Student => {
            sqlx::query_as::<_, Event>("SELECT * FROM events WHERE date >= NOW() ORDER BY date")
                .fetch_all(pool.get_ref())
                .await
        }
    }
    .map_err(ApiError::Store)?;

    Ok(HttpResponse::Ok().json(events))
}

pub async fn get_event(
    auth: CurrentUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_faculty_or_admin()?;

    let event = sqlx::query_as::<_, Event>("SELECT * FROM events WHERE id = ?")
        .bind(path.into_inner())
        .fetch_optional(pool.get_ref())
        .await
        .map_err(ApiError::Store)?
        .ok_or(ApiError::NotFound("Event not found"))?;

    Ok(HttpResponse::Ok().json(event))
}

pub async fn create_event(
    auth: CurrentUser,
    pool: web::Data<MySqlPool>,
    body: web::Json<CreateEvent>,
) -> actix_web::Result<impl Responder> {
    auth.require_faculty_or_admin()?;

    if body.title.trim().is_empty() || body.description.trim().is_empty() {
        return Err(ApiError::Validation("Title and description are required".into()).into());
    }

    let result = sqlx::query("INSERT INTO events (title, description, date) VALUES (?, ?, ?)")
        .bind(body.title.trim())
        .bind(body.description.trim())
        .bind(body.date)
        .execute(pool.get_ref())
        .await
        .map_err(ApiError::Store)?;

    Ok(HttpResponse::Ok().json(Event {
        id: result.last_insert_id(),
        title: body.title.trim().to_string(),
        description: body.description.trim().to_string(),
        date: body.date,
    }))
}

pub async fn update_event(
    auth: CurrentUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<Value>,
) -> actix_web::Result<impl Responder> {
    auth.require_faculty_or_admin()?;
    let event_id = path.into_inner();

    let update = build_update_sql("events", &body, EVENT_UPDATE_COLUMNS, "id", event_id)?;
    let affected = execute_update(pool.get_ref(), update)
        .await
        .map_err(ApiError::Store)?;

    if affected == 0 {
        return Err(ApiError::NotFound("Event not found").into());
    }

    let event = sqlx::query_as::<_, Event>("SELECT * FROM events WHERE id = ?")
        .bind(event_id)
        .fetch_one(pool.get_ref())
        .await
        .map_err(ApiError::Store)?;

    Ok(HttpResponse::Ok().json(event))
}

pub async fn delete_event(
    auth: CurrentUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_faculty_or_admin()?;

    let result = sqlx::query("DELETE FROM events WHERE id = ?")
        .bind(path.into_inner())
        .execute(pool.get_ref())
        .await
        .map_err(ApiError::Store)?;

    if result.rows_affected() == 0 {
        return Err(ApiError::NotFound("Event not found").into());
    }

    Ok(HttpResponse::Ok().json(json!({ "message": "Event removed" })))
}
