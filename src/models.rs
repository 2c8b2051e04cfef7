use crate::model::role::Role;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

#[derive(Deserialize, ToSchema)]
pub struct RegisterReq {
    #[schema(example = "Jane Doe")]
    pub name: String,
    #[schema(example = "jane@college.edu", format = "email")]
    pub email: String,
    pub password: String,
    /// Defaults to student; admin registration is rejected here.
    #[schema(example = "student", value_type = Option<String>)]
    pub role: Option<Role>,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginReq {
    #[schema(example = "jane@college.edu", format = "email")]
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct SetupAdminReq {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Row shape used by login; the only place the password hash is read back.
#[derive(FromRow)]
pub struct UserAuthRow {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: String,
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: u64,
    /// Account email.
    pub sub: String,
    /// Role name at issue time; the gate re-reads the account anyway.
    pub role: String,
    pub exp: usize,
    pub jti: String,
}
