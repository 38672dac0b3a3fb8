use std::future::{ready, Ready};

use actix_web::dev::Payload;
use actix_web::http::header;
use actix_web::{web, FromRequest, HttpRequest};
use sha2::{Digest, Sha256};

use crate::config::AppConfig;
use crate::errors::AppError;

/// Proof that the request carried the staff bearer token.
///
/// Add this extractor as a handler argument to gate a route. Rejection
/// happens before any signature or database work. The comparison goes
/// through fixed-size digests so it leaks neither length nor prefix of the
/// configured token.
pub struct StaffAuth;

fn token_matches(presented: &str, expected: &str) -> bool {
    Sha256::digest(presented.as_bytes()) == Sha256::digest(expected.as_bytes())
}

impl FromRequest for StaffAuth {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        let token = req
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .and_then(|h| h.strip_prefix("Bearer "));
        let config = req.app_data::<web::Data<AppConfig>>();

        let authorized = matches!(
            (config, token),
            (Some(config), Some(token)) if token_matches(token, &config.staff_api_token)
        );
        if authorized {
            ready(Ok(StaffAuth))
        } else {
            ready(Err(AppError::Unauthorized))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matching_tokens_are_accepted() {
        assert!(token_matches("staff-token", "staff-token"));
    }

    #[test]
    fn differing_tokens_are_rejected() {
        assert!(!token_matches("staff-token", "other-token"));
        assert!(!token_matches("", "staff-token"));
        assert!(!token_matches("staff-token-but-longer", "staff-token"));
    }
}
