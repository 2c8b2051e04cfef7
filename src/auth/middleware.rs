use crate::auth::auth::CurrentUser;
use crate::auth::jwt::verify_token;
use crate::config::Config;
use crate::error::ApiError;
use crate::model::role::Role;
use crate::model::user::AccountStatus;
use actix_web::{
    Error, HttpMessage,
    body::BoxBody,
    dev::{ServiceRequest, ServiceResponse},
    middleware::Next,
    web::Data,
};
use sqlx::MySqlPool;
use std::str::FromStr;

#[derive(sqlx::FromRow)]
struct AccountRow {
    id: u64,
    name: String,
    email: String,
    role: String,
    status: String,
}

/// Session gate, wrapped around every protected scope. Verifies the bearer
/// token, reloads the account from the store and rejects suspended or
/// pending accounts before any handler runs. Read-only.
pub async fn auth_middleware(
    mut req: ServiceRequest,
    next: Next<BoxBody>,
) -> Result<ServiceResponse<BoxBody>, Error> {
    let config = req
        .app_data::<Data<Config>>()
        .ok_or_else(|| actix_web::error::ErrorInternalServerError("App config missing"))?;
    let pool = req
        .app_data::<Data<MySqlPool>>()
        .ok_or_else(|| actix_web::error::ErrorInternalServerError("Database pool missing"))?;

    let token = match req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
    {
        Some(t) => t,
        None => return Err(ApiError::Unauthenticated.into()),
    };

    let claims = verify_token(token, &config.jwt_secret).map_err(|_| ApiError::InvalidToken)?;

    // The token only proves identity. Role and status always come from the
    // current account row, so suspension takes effect on the next request.
    let account = sqlx::query_as::<_, AccountRow>(
        "SELECT id, name, email, role, status FROM users WHERE id = ?",
    )
    .bind(claims.user_id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(ApiError::Store)?
    .ok_or(ApiError::AccountNotFound)?;

    match AccountStatus::from_str(&account.status).map_err(|_| ApiError::InvalidToken)? {
        AccountStatus::Suspended => return Err(ApiError::AccountSuspended.into()),
        AccountStatus::Pending => return Err(ApiError::AccountPending.into()),
        AccountStatus::Active => {}
    }

    let role = Role::from_str(&account.role).map_err(|_| ApiError::InvalidToken)?;

    req.extensions_mut().insert(CurrentUser {
        id: account.id,
        name: account.name,
        email: account.email,
        role,
    });

    next.call(req).await
}
