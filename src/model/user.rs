use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Account lifecycle. New registrations start pending; approval and
/// suspension are admin/faculty driven, never self-service.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    Pending,
    Active,
    Suspended,
}

/// An account as handlers return it: everything except the password hash.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct PublicUser {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub role: String,
    pub status: String,
    pub suspension_start: Option<NaiveDate>,
    pub suspension_end: Option<NaiveDate>,
}

/// Column list matching `PublicUser`, for SELECTs that must not touch the
/// password column.
pub const PUBLIC_USER_COLUMNS: &str =
    "id, name, email, role, status, suspension_start, suspension_end";
