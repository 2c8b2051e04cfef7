use crate::{
    auth::{
        jwt::generate_access_token,
        password::{hash_password, verify_password},
    },
    config::Config,
    error::{ApiError, is_duplicate},
    model::{role::Role, user::AccountStatus},
    models::{LoginReq, RegisterReq, SetupAdminReq, UserAuthRow},
};
use actix_web::{HttpResponse, Responder, web};
use serde_json::json;
use sqlx::MySqlPool;
use std::str::FromStr;
use tracing::{debug, error, info, instrument};

use crate::utils::email_cache;
use crate::utils::email_filter;

/// "Jane van Dyke" -> ("Jane", "van Dyke")
fn split_name(name: &str) -> (String, String) {
    let mut parts = name.split_whitespace();
    let first = parts.next().unwrap_or_default().to_string();
    let surname = parts.collect::<Vec<_>>().join(" ");
    (first, surname)
}

/// true  => email AVAILABLE
/// false => email TAKEN
pub async fn is_email_available(email: &str, pool: &MySqlPool) -> bool {
    let email = email.to_lowercase();

    // Cuckoo filter gives a fast definite negative
    if !email_filter::might_exist(&email) {
        return true;
    }

    // Moka cache gives a fast positive
    if email_cache::is_taken(&email).await {
        return false;
    }

    // Database fallback
    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM users WHERE email = ? LIMIT 1)",
    )
    .bind(&email)
    .fetch_one(pool)
    .await
    .unwrap_or(true); // fail-safe

    !exists
}

/// Self-registration for students and faculty. Accounts start pending and
/// stay unusable until approval; students also get a profile row.
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterReq,
    responses(
        (status = 201, description = "Account created, pending approval", body = Object, example = json!({
            "message": "Registration successful! Your account is pending approval."
        })),
        (status = 400, description = "Invalid fields or admin role requested"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Auth"
)]
pub async fn register(
    body: web::Json<RegisterReq>,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let name = body.name.trim();
    let email = body.email.trim().to_lowercase();
    let role = body.role.unwrap_or(Role::Student);

    if name.is_empty() || email.is_empty() || body.password.is_empty() {
        return Err(
            ApiError::Validation("Name, email and password must not be empty".into()).into(),
        );
    }

    if role == Role::Admin {
        return Err(
            ApiError::Validation("Admin accounts cannot be created from this page.".into()).into(),
        );
    }

    if !is_email_available(&email, pool.get_ref()).await {
        return Err(ApiError::Duplicate("User already exists").into());
    }

    let hashed = hash_password(&body.password).map_err(|e| {
        error!(error = %e, "Failed to hash password");
        actix_web::error::ErrorInternalServerError("Server Error")
    })?;

    let result = sqlx::query(
        "INSERT INTO users (name, email, password, role, status) VALUES (?, ?, ?, ?, 'pending')",
    )
    .bind(name)
    .bind(&email)
    .bind(&hashed)
    .bind(role.to_string())
    .execute(pool.get_ref())
    .await;

    let user_id = match result {
        Ok(r) => {
            // keep the filter and cache in step with the insert
            email_filter::insert(&email);
            email_cache::mark_taken(&email).await;
            r.last_insert_id()
        }
        Err(e) if is_duplicate(&e) => {
            return Err(ApiError::Duplicate("User already exists").into());
        }
        Err(e) => return Err(ApiError::Store(e).into()),
    };

    if role == Role::Student {
        let (first_name, surname) = split_name(name);
        sqlx::query(
            "INSERT INTO student_profiles (user_id, first_name, surname, email) VALUES (?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(first_name)
        .bind(surname)
        .bind(&email)
        .execute(pool.get_ref())
        .await
        .map_err(ApiError::Store)?;
    }

    info!(user_id, role = %role, "Account registered, pending approval");

    Ok(HttpResponse::Created().json(json!({
        "message": "Registration successful! Your account is pending approval."
    })))
}

/// One-shot bootstrap: creates the first admin account. Disabled as soon as
/// any admin exists.
pub async fn setup_first_admin(
    body: web::Json<SetupAdminReq>,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let admins = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE role = 'admin'")
        .fetch_one(pool.get_ref())
        .await
        .map_err(ApiError::Store)?;

    if admins > 0 {
        return Err(
            ApiError::Forbidden("An admin account already exists. This route is disabled.").into(),
        );
    }

    let name = body.name.trim();
    let email = body.email.trim().to_lowercase();
    if name.is_empty() || email.is_empty() || body.password.is_empty() {
        return Err(
            ApiError::Validation("Please provide name, email, and password.".into()).into(),
        );
    }

    let hashed = hash_password(&body.password).map_err(|e| {
        error!(error = %e, "Failed to hash password");
        actix_web::error::ErrorInternalServerError("Server Error")
    })?;

    let result = sqlx::query(
        "INSERT INTO users (name, email, password, role, status) VALUES (?, ?, ?, 'admin', 'active')",
    )
    .bind(name)
    .bind(&email)
    .bind(&hashed)
    .execute(pool.get_ref())
    .await;

    match result {
        Ok(_) => {
            email_filter::insert(&email);
            email_cache::mark_taken(&email).await;
            Ok(HttpResponse::Created().json(json!({
                "message": "First admin account created successfully. You can now log in."
            })))
        }
        Err(e) if is_duplicate(&e) => Err(ApiError::Duplicate("User already exists").into()),
        Err(e) => Err(ApiError::Store(e).into()),
    }
}

#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginReq,
    responses(
        (status = 200, description = "Token issued", body = Object, example = json!({
            "token": "eyJhbGciOi..."
        })),
        (status = 401, description = "Invalid credentials"),
        (status = 403, description = "Account pending or suspended"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Auth"
)]
#[instrument(
    name = "auth_login",
    skip(pool, config, body),
    fields(email = %body.email)
)]
pub async fn login(
    body: web::Json<LoginReq>,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> actix_web::Result<impl Responder> {
    info!("Login request received");

    if body.email.trim().is_empty() || body.password.is_empty() {
        info!("Validation failed: empty email or password");
        return Err(ApiError::Validation("Email or password required".into()).into());
    }

    debug!("Fetching account from database");

    let account = sqlx::query_as::<_, UserAuthRow>(
        "SELECT id, name, email, password, role, status FROM users WHERE email = ?",
    )
    .bind(body.email.trim().to_lowercase())
    .fetch_optional(pool.get_ref())
    .await
    .map_err(ApiError::Store)?;

    let account = match account {
        Some(a) => a,
        None => {
            info!("Invalid credentials: account not found");
            return Ok(HttpResponse::Unauthorized().json(json!({ "error": "Invalid credentials" })));
        }
    };

    if let Err(e) = verify_password(&body.password, &account.password) {
        info!(error = %e, "Invalid credentials: password mismatch");
        return Ok(HttpResponse::Unauthorized().json(json!({ "error": "Invalid credentials" })));
    }

    // Same status checks the gate applies on every protected request.
    match AccountStatus::from_str(&account.status).map_err(|_| ApiError::InvalidToken)? {
        AccountStatus::Pending => return Err(ApiError::AccountPending.into()),
        AccountStatus::Suspended => return Err(ApiError::AccountSuspended.into()),
        AccountStatus::Active => {}
    }

    let role = Role::from_str(&account.role).map_err(|_| ApiError::InvalidToken)?;

    let token = generate_access_token(
        account.id,
        account.email.clone(),
        role,
        &config.jwt_secret,
        config.access_token_ttl,
    )
    .map_err(|e| {
        error!(error = %e, "Failed to sign access token");
        actix_web::error::ErrorInternalServerError("Server Error")
    })?;

    // non-fatal
    if let Err(e) = sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = ?")
        .bind(account.id)
        .execute(pool.get_ref())
        .await
    {
        error!(error = %e, "Failed to update last_login_at");
    }

    info!("Login successful");

    Ok(HttpResponse::Ok().json(json!({ "token": token })))
}

#[cfg(test)]
mod tests {
    use super::split_name;

    #[test]
    fn splits_first_and_surname() {
        assert_eq!(split_name("Jane Doe"), ("Jane".into(), "Doe".into()));
        assert_eq!(
            split_name("Jane van Dyke"),
            ("Jane".into(), "van Dyke".into())
        );
        assert_eq!(split_name("Prince"), ("Prince".into(), "".into()));
        assert_eq!(split_name(""), ("".into(), "".into()));
    }
}
