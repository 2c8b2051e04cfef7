use crate::auth::auth::CurrentUser;
use crate::config::Config;
use actix_web::{HttpResponse, Responder, web};
use chrono::Utc;
use serde_json::json;
use sha2::{Digest, Sha256};

/// Signature over the upload parameters, so clients can push files straight
/// to the media store without ever seeing the API secret.
fn sign_upload(folder: &str, timestamp: i64, api_secret: &str) -> String {
    // parameters in alphabetical order, then the secret
    let to_sign = format!("folder={}&timestamp={}{}", folder, timestamp, api_secret);
    format!("{:x}", Sha256::digest(to_sign.as_bytes()))
}

/// Short-lived signed parameters for a direct upload.
pub async fn upload_signature(
    _auth: CurrentUser,
    config: web::Data<Config>,
) -> actix_web::Result<impl Responder> {
    let timestamp = Utc::now().timestamp();
    let signature = sign_upload(&config.upload_folder, timestamp, &config.upload_api_secret);

    Ok(HttpResponse::Ok().json(json!({
        "timestamp": timestamp,
        "signature": signature,
        "api_key": config.upload_api_key,
        "cloud_name": config.upload_cloud_name,
        "folder": config.upload_folder,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_is_stable_hex() {
        let a = sign_upload("student_profiles", 1_700_000_000, "secret");
        let b = sign_upload("student_profiles", 1_700_000_000, "secret");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn signature_varies_with_inputs() {
        let base = sign_upload("student_profiles", 1_700_000_000, "secret");
        assert_ne!(base, sign_upload("student_profiles", 1_700_000_001, "secret"));
        assert_ne!(base, sign_upload("student_profiles", 1_700_000_000, "other"));
        assert_ne!(base, sign_upload("certificates", 1_700_000_000, "secret"));
    }
}
