//! Stripe integration via REST API (no SDK dependency).
//!
//! Covers the two directions the ordering flow needs: creating a hosted
//! checkout session keyed by our order id, and verifying + mapping the
//! webhook events Stripe sends back.

use bigdecimal::{BigDecimal, RoundingMode, ToPrimitive};
use hmac::{Hmac, Mac};
use serde_json::Value;
use sha2::Sha256;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::order::PaymentEvent;

pub const DEFAULT_API_BASE: &str = "https://api.stripe.com";

/// Events newer than this are rejected to prevent replays.
const WEBHOOK_TOLERANCE_SECS: i64 = 300;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("gateway request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected gateway response: {0}")]
    Malformed(String),
}

#[derive(Debug, Clone)]
pub struct CheckoutSession {
    pub id: String,
    pub url: String,
}

/// Order total in the gateway's minor units (cents).
fn minor_units(total: &BigDecimal) -> Result<i64, GatewayError> {
    (total * BigDecimal::from(100))
        .with_scale_round(0, RoundingMode::HalfUp)
        .to_i64()
        .ok_or_else(|| GatewayError::Malformed(format!("amount {total} out of range")))
}

/// Create a hosted Checkout Session (payment mode) for one order.
///
/// The order id travels in both the session metadata and the payment-intent
/// metadata so that every later webhook event can be routed back to the
/// order.
#[allow(clippy::too_many_arguments)]
pub async fn create_checkout_session(
    api_base: &str,
    secret_key: &str,
    order_id: Uuid,
    order_number: i64,
    total: &BigDecimal,
    currency: &str,
    success_url: &str,
    cancel_url: &str,
) -> Result<CheckoutSession, GatewayError> {
    let amount = minor_units(total)?.to_string();
    let order_id = order_id.to_string();
    let product_name = format!("Order #{order_number}");

    let client = reqwest::Client::new();
    let resp: Value = client
        .post(format!("{api_base}/v1/checkout/sessions"))
        .basic_auth(secret_key, None::<&str>)
        .form(&[
            ("mode", "payment"),
            ("line_items[0][price_data][currency]", currency),
            (
                "line_items[0][price_data][product_data][name]",
                product_name.as_str(),
            ),
            ("line_items[0][price_data][unit_amount]", amount.as_str()),
            ("line_items[0][quantity]", "1"),
            ("metadata[order_id]", order_id.as_str()),
            ("payment_intent_data[metadata][order_id]", order_id.as_str()),
            ("success_url", success_url),
            ("cancel_url", cancel_url),
        ])
        .send()
        .await?
        .json()
        .await?;

    match (resp["id"].as_str(), resp["url"].as_str()) {
        (Some(id), Some(url)) => Ok(CheckoutSession {
            id: id.to_string(),
            url: url.to_string(),
        }),
        _ => Err(GatewayError::Malformed(format!(
            "checkout session creation failed: {resp}"
        ))),
    }
}

/// Verify a Stripe webhook signature (HMAC-SHA256).
///
/// The `Stripe-Signature` header carries `t=<unix>,v1=<hex>`; the signed
/// payload is `"{t}.{raw body}"`. Comparison is constant-time.
pub fn verify_webhook_signature(
    payload: &[u8],
    sig_header: &str,
    secret: &str,
) -> Result<(), &'static str> {
    let mut timestamp = "";
    let mut signature = "";
    for part in sig_header.split(',') {
        if let Some(t) = part.strip_prefix("t=") {
            timestamp = t;
        } else if let Some(v) = part.strip_prefix("v1=") {
            signature = v;
        }
    }

    if timestamp.is_empty() || signature.is_empty() {
        return Err("invalid signature header");
    }

    let mut mac =
        Hmac::<Sha256>::new_from_slice(secret.as_bytes()).map_err(|_| "HMAC key error")?;
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(payload);

    let sig_bytes = hex::decode(signature).map_err(|_| "invalid signature hex")?;
    mac.verify_slice(&sig_bytes)
        .map_err(|_| "signature mismatch")?;

    let ts: i64 = timestamp.parse().map_err(|_| "invalid timestamp")?;
    let now = chrono::Utc::now().timestamp();
    if (now - ts).abs() > WEBHOOK_TOLERANCE_SECS {
        return Err("timestamp outside tolerance");
    }

    Ok(())
}

/// Map a parsed webhook event to the targeted order and its domain effect.
///
/// Returns `None` for event types the order lifecycle does not react to and
/// for events whose metadata carries no usable order id; callers log and
/// acknowledge those so the gateway stops retrying.
pub fn extract_order_event(event: &Value) -> Option<(Uuid, PaymentEvent)> {
    let event_type = event["type"].as_str()?;
    let obj = event.get("data")?.get("object")?;
    let order_id = obj
        .get("metadata")
        .and_then(|m| m["order_id"].as_str())
        .and_then(|s| Uuid::parse_str(s).ok())?;
    let payment_ref = obj["id"].as_str().map(String::from);

    let payment_event = match event_type {
        "checkout.session.completed" => PaymentEvent::CheckoutCompleted { payment_ref },
        "payment_intent.succeeded" => PaymentEvent::PaymentSucceeded { payment_ref },
        "payment_intent.payment_failed" => PaymentEvent::PaymentFailed,
        "charge.refunded" => PaymentEvent::ChargeRefunded,
        _ => return None,
    };
    Some((order_id, payment_event))
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use serde_json::json;

    use super::*;

    fn sign_header(secret: &str, timestamp: i64, body: &[u8]) -> String {
        let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(format!("{timestamp}.").as_bytes());
        mac.update(body);
        format!("t={timestamp},v1={}", hex::encode(mac.finalize().into_bytes()))
    }

    #[test]
    fn minor_units_converts_decimal_totals() {
        assert_eq!(
            minor_units(&BigDecimal::from_str("30.30").unwrap()).unwrap(),
            3030
        );
        assert_eq!(minor_units(&BigDecimal::from_str("10").unwrap()).unwrap(), 1000);
        assert_eq!(minor_units(&BigDecimal::from_str("0.05").unwrap()).unwrap(), 5);
    }

    #[test]
    fn valid_webhook_signature_is_accepted() {
        let body = br#"{"type":"checkout.session.completed"}"#;
        let header = sign_header("whsec_test", chrono::Utc::now().timestamp(), body);
        verify_webhook_signature(body, &header, "whsec_test").unwrap();
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let body = b"{}";
        let header = sign_header("whsec_other", chrono::Utc::now().timestamp(), body);
        assert!(verify_webhook_signature(body, &header, "whsec_test").is_err());
    }

    #[test]
    fn altered_body_is_rejected() {
        let header = sign_header("whsec_test", chrono::Utc::now().timestamp(), b"{}");
        assert!(verify_webhook_signature(b"{ }", &header, "whsec_test").is_err());
    }

    #[test]
    fn stale_timestamp_is_rejected() {
        let body = b"{}";
        let old = chrono::Utc::now().timestamp() - WEBHOOK_TOLERANCE_SECS - 10;
        let header = sign_header("whsec_test", old, body);
        assert_eq!(
            verify_webhook_signature(body, &header, "whsec_test"),
            Err("timestamp outside tolerance")
        );
    }

    #[test]
    fn header_without_signature_parts_is_rejected() {
        assert!(verify_webhook_signature(b"{}", "t=123", "whsec_test").is_err());
        assert!(verify_webhook_signature(b"{}", "v1=abcd", "whsec_test").is_err());
        assert!(verify_webhook_signature(b"{}", "", "whsec_test").is_err());
    }

    fn event(event_type: &str, metadata_order_id: Option<&str>) -> Value {
        let mut object = json!({ "id": "obj_123" });
        if let Some(id) = metadata_order_id {
            object["metadata"] = json!({ "order_id": id });
        }
        json!({ "type": event_type, "data": { "object": object } })
    }

    #[test]
    fn checkout_completed_maps_to_paid_event() {
        let order_id = Uuid::new_v4();
        let (id, ev) =
            extract_order_event(&event("checkout.session.completed", Some(&order_id.to_string())))
                .unwrap();
        assert_eq!(id, order_id);
        assert_eq!(
            ev,
            PaymentEvent::CheckoutCompleted {
                payment_ref: Some("obj_123".to_string())
            }
        );
    }

    #[test]
    fn refund_and_failure_events_map_without_payment_ref() {
        let order_id = Uuid::new_v4().to_string();
        let (_, ev) =
            extract_order_event(&event("payment_intent.payment_failed", Some(&order_id))).unwrap();
        assert_eq!(ev, PaymentEvent::PaymentFailed);

        let (_, ev) = extract_order_event(&event("charge.refunded", Some(&order_id))).unwrap();
        assert_eq!(ev, PaymentEvent::ChargeRefunded);
    }

    #[test]
    fn unhandled_event_types_are_ignored() {
        let order_id = Uuid::new_v4().to_string();
        assert!(extract_order_event(&event("invoice.paid", Some(&order_id))).is_none());
    }

    #[test]
    fn events_without_order_metadata_are_ignored() {
        assert!(extract_order_event(&event("checkout.session.completed", None)).is_none());
        assert!(
            extract_order_event(&event("checkout.session.completed", Some("not-a-uuid")))
                .is_none()
        );
    }
}
