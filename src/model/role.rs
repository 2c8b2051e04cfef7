use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Closed role vocabulary. Stored as lowercase strings in the users table;
/// every guard matches on this enum exhaustively.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Faculty,
    Admin,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn round_trips_through_db_strings() {
        for (s, role) in [
            ("student", Role::Student),
            ("faculty", Role::Faculty),
            ("admin", Role::Admin),
        ] {
            assert_eq!(Role::from_str(s).unwrap(), role);
            assert_eq!(role.to_string(), s);
        }
        assert!(Role::from_str("superuser").is_err());
    }
}
