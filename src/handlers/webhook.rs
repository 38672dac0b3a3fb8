use actix_web::{web, HttpRequest, HttpResponse};
use serde_json::Value;

use crate::config::AppConfig;
use crate::{stripe, Service};

/// POST /webhooks/stripe
///
/// Boundary between the payment gateway and the order state machine. The
/// raw body is verified against the webhook secret before anything is
/// parsed; nothing below this point runs on an unauthenticated payload.
///
/// Responses follow the gateway's retry semantics: 2xx for everything we
/// consciously ignore (unhandled types, events without usable order
/// metadata, stale duplicates), non-2xx only when a retry can help
/// (bad signature, unparsable body, storage errors).
pub async fn stripe_webhook(
    service: web::Data<Service>,
    config: web::Data<AppConfig>,
    req: HttpRequest,
    body: web::Bytes,
) -> HttpResponse {
    let Some(sig_header) = req
        .headers()
        .get("Stripe-Signature")
        .and_then(|v| v.to_str().ok())
    else {
        log::warn!("webhook without Stripe-Signature header");
        return HttpResponse::BadRequest().finish();
    };

    if let Err(e) = stripe::verify_webhook_signature(&body, sig_header, &config.stripe_webhook_secret)
    {
        log::warn!("webhook signature verification failed: {e}");
        return HttpResponse::BadRequest().finish();
    }

    let event: Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => {
            log::warn!("failed to parse webhook body: {e}");
            return HttpResponse::BadRequest().finish();
        }
    };

    let event_type = event["type"].as_str().unwrap_or("").to_string();
    let Some((order_id, payment_event)) = stripe::extract_order_event(&event) else {
        log::info!("ignoring webhook event type={event_type}");
        return HttpResponse::Ok().finish();
    };
    log::info!("webhook event type={event_type} order={order_id}");

    let svc = service.clone();
    match web::block(move || svc.apply_payment_event(order_id, payment_event)).await {
        Ok(Ok(())) => HttpResponse::Ok().finish(),
        Ok(Err(e)) => {
            log::error!("failed to apply webhook event for order {order_id}: {e}");
            HttpResponse::InternalServerError().finish()
        }
        Err(e) => {
            log::error!("webhook worker error: {e}");
            HttpResponse::InternalServerError().finish()
        }
    }
}
