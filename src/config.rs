use std::env;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),
}

/// Server-side configuration.
///
/// Every secret here is load-or-die: an endpoint that cannot sign, verify,
/// or talk to the gateway must refuse to start instead of degrading per
/// request.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// HMAC key for pickup payload signing and verification.
    pub pickup_signing_key: String,
    pub stripe_secret_key: String,
    pub stripe_webhook_secret: String,
    pub stripe_api_base: String,
    /// Bearer token staff clients present on /staff routes.
    pub staff_api_token: String,
    pub checkout_success_url: String,
    pub checkout_cancel_url: String,
    pub currency: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            pickup_signing_key: required("PICKUP_SIGNING_KEY")?,
            stripe_secret_key: required("STRIPE_SECRET_KEY")?,
            stripe_webhook_secret: required("STRIPE_WEBHOOK_SECRET")?,
            stripe_api_base: optional("STRIPE_API_BASE", crate::stripe::DEFAULT_API_BASE),
            staff_api_token: required("STAFF_API_TOKEN")?,
            checkout_success_url: required("CHECKOUT_SUCCESS_URL")?,
            checkout_cancel_url: required("CHECKOUT_CANCEL_URL")?,
            currency: optional("CURRENCY", "eur"),
        })
    }
}

fn required(key: &'static str) -> Result<String, ConfigError> {
    match env::var(key) {
        Ok(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ConfigError::Missing(key)),
    }
}

fn optional(key: &str, default: &str) -> String {
    env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_rejects_missing_and_blank_values() {
        env::remove_var("PICKUP_SERVICE_TEST_REQUIRED");
        assert!(required("PICKUP_SERVICE_TEST_REQUIRED").is_err());

        env::set_var("PICKUP_SERVICE_TEST_REQUIRED", "  ");
        assert!(required("PICKUP_SERVICE_TEST_REQUIRED").is_err());

        env::set_var("PICKUP_SERVICE_TEST_REQUIRED", "value");
        assert_eq!(required("PICKUP_SERVICE_TEST_REQUIRED").unwrap(), "value");
        env::remove_var("PICKUP_SERVICE_TEST_REQUIRED");
    }

    #[test]
    fn optional_falls_back_to_the_default() {
        env::remove_var("PICKUP_SERVICE_TEST_OPTIONAL");
        assert_eq!(optional("PICKUP_SERVICE_TEST_OPTIONAL", "eur"), "eur");

        env::set_var("PICKUP_SERVICE_TEST_OPTIONAL", "gbp");
        assert_eq!(optional("PICKUP_SERVICE_TEST_OPTIONAL", "eur"), "gbp");
        env::remove_var("PICKUP_SERVICE_TEST_OPTIONAL");
    }
}
