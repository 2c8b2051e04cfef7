use chrono::{FixedOffset, NaiveTime};
use dotenvy::dotenv;
use std::env;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,
    pub access_token_ttl: usize,

    // Rate limiting
    pub rate_login_per_min: u32,
    pub rate_register_per_min: u32,
    pub rate_protected_per_min: u32,

    pub api_prefix: String,

    /// Offset applied to UTC before truncating to a calendar day. The
    /// absentee job and self-check-in both key records by this date, so they
    /// agree on "today" regardless of the host clock's zone.
    pub campus_utc_offset: FixedOffset,
    /// Wall-clock time (in the offset above) at which the absentee job fires.
    pub absentee_fire_time: NaiveTime,

    // Direct-upload signing
    pub upload_cloud_name: String,
    pub upload_api_key: String,
    pub upload_api_secret: String,
    pub upload_folder: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        Self {
            server_addr: env::var("SERVER_ADDR").expect("SERVER_ADDR must be set"),
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            jwt_secret: env::var("JWT_SECRET").expect("JWT_SECRET must be set"),
            access_token_ttl: env::var("ACCESS_TOKEN_TTL")
                .unwrap_or_else(|_| "18000".to_string()) // default 5 hours
                .parse()
                .unwrap(),

            rate_login_per_min: env::var("RATE_LOGIN_PER_MIN")
                .unwrap_or_else(|_| "60".to_string())
                .parse()
                .unwrap(),
            rate_register_per_min: env::var("RATE_REGISTER_PER_MIN")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .unwrap(),
            rate_protected_per_min: env::var("RATE_PROTECTED_PER_MIN")
                .unwrap_or_else(|_| "1000".to_string())
                .parse()
                .unwrap(),

            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api".to_string()),

            campus_utc_offset: parse_utc_offset(
                &env::var("CAMPUS_UTC_OFFSET").unwrap_or_else(|_| "+05:30".to_string()),
            )
            .expect("CAMPUS_UTC_OFFSET must look like +05:30 or -08:00"),
            absentee_fire_time: NaiveTime::parse_from_str(
                &env::var("ABSENTEE_FIRE_TIME").unwrap_or_else(|_| "12:00".to_string()),
                "%H:%M",
            )
            .expect("ABSENTEE_FIRE_TIME must look like HH:MM"),

            upload_cloud_name: env::var("CLOUDINARY_CLOUD_NAME")
                .expect("CLOUDINARY_CLOUD_NAME must be set"),
            upload_api_key: env::var("CLOUDINARY_API_KEY")
                .expect("CLOUDINARY_API_KEY must be set"),
            upload_api_secret: env::var("CLOUDINARY_API_SECRET")
                .expect("CLOUDINARY_API_SECRET must be set"),
            upload_folder: env::var("UPLOAD_FOLDER")
                .unwrap_or_else(|_| "student_profiles".to_string()),
        }
    }
}

impl Config {
    /// Current calendar day in the campus time zone. Self-check-in, the
    /// survey and the absentee job all key records by this date.
    pub fn today(&self) -> chrono::NaiveDate {
        chrono::Utc::now()
            .with_timezone(&self.campus_utc_offset)
            .date_naive()
    }
}

/// Parse an offset of the form "+05:30" or "-08:00". A missing sign means
/// east of UTC.
pub fn parse_utc_offset(s: &str) -> Option<FixedOffset> {
    let s = s.trim();
    let (sign, rest) = match s.strip_prefix('+') {
        Some(r) => (1, r),
        None => match s.strip_prefix('-') {
            Some(r) => (-1, r),
            None => (1, s),
        },
    };

    let (hours, minutes) = rest.split_once(':')?;
    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.parse().ok()?;
    if hours > 23 || minutes > 59 {
        return None;
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_positive_offset() {
        let offset = parse_utc_offset("+05:30").unwrap();
        assert_eq!(offset.local_minus_utc(), 5 * 3600 + 30 * 60);
    }

    #[test]
    fn parses_negative_offset() {
        let offset = parse_utc_offset("-08:00").unwrap();
        assert_eq!(offset.local_minus_utc(), -8 * 3600);
    }

    #[test]
    fn unsigned_offset_means_east() {
        let offset = parse_utc_offset("01:00").unwrap();
        assert_eq!(offset.local_minus_utc(), 3600);
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_utc_offset("").is_none());
        assert!(parse_utc_offset("utc").is_none());
        assert!(parse_utc_offset("+0530").is_none());
        assert!(parse_utc_offset("+99:00").is_none());
    }
}
