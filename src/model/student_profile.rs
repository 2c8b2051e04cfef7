use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct StudentProfile {
    pub id: u64,
    pub user_id: u64,
    pub first_name: String,
    pub surname: String,
    pub email: String,
    pub mobile_number: Option<String>,
    pub personal_email: Option<String>,
    pub is_whatsapp_same: bool,
    pub whatsapp_number: Option<String>,
    pub photo: String,
    pub family_income: Option<f64>,
    pub marks: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct Certificate {
    pub id: u64,
    pub profile_id: u64,
    pub title: String,
    pub url: String,
}
