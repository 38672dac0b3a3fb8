use actix_web::{web, HttpResponse};
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::application::order_service::OrderDraft;
use crate::config::AppConfig;
use crate::domain::errors::DomainError;
use crate::domain::order::{CustomerDetails, OrderLineInput, OrderView};
use crate::errors::AppError;
use crate::{stripe, Service};

// ── Request / response DTOs ──────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOrderLineRequest {
    pub product_id: Uuid,
    /// Product name as shown in the menu, captured as of order time.
    pub product_name: String,
    pub quantity: i32,
    /// Decimal price as a string to avoid floating-point issues, e.g. "9.99"
    pub unit_price: String,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateOrderRequest {
    /// Absent for guest checkout.
    #[serde(default)]
    pub user_id: Option<Uuid>,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_email: String,
    #[serde(default)]
    pub notes: Option<String>,
    pub lines: Vec<CreateOrderLineRequest>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CreateOrderResponse {
    pub id: Uuid,
    pub order_number: i64,
    pub total: String,
    /// The signed payload the confirmation page renders as a QR code.
    pub pickup_payload: String,
    /// Hosted payment page the customer is redirected to.
    pub checkout_url: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderLineResponse {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: String,
    pub line_total: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderResponse {
    pub id: Uuid,
    pub order_number: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uuid>,
    pub status: String,
    pub payment_status: String,
    pub total: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_ref: Option<String>,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pickup_payload: Option<String>,
    pub lines: Vec<OrderLineResponse>,
}

/// The stored pickup secret never leaves the server on its own; it is only
/// ever embedded in the signed payload.
pub fn order_response(order: OrderView, pickup_payload: Option<String>) -> OrderResponse {
    OrderResponse {
        id: order.id,
        order_number: order.order_number,
        user_id: order.user_id,
        status: order.status.to_string(),
        payment_status: order.payment_status.to_string(),
        total: order.total.to_string(),
        payment_ref: order.payment_ref,
        customer_name: order.customer.name,
        customer_phone: order.customer.phone,
        customer_email: order.customer.email,
        notes: order.notes,
        created_at: order.created_at.to_rfc3339(),
        completed_at: order.completed_at.map(|t| t.to_rfc3339()),
        pickup_payload,
        lines: order
            .lines
            .into_iter()
            .map(|l| OrderLineResponse {
                id: l.id,
                product_id: l.product_id,
                product_name: l.product_name,
                quantity: l.quantity,
                unit_price: l.unit_price.to_string(),
                line_total: l.line_total.to_string(),
                note: l.note,
            })
            .collect(),
    }
}

fn draft_from(body: CreateOrderRequest) -> Result<OrderDraft, AppError> {
    let lines: Result<Vec<OrderLineInput>, AppError> = body
        .lines
        .into_iter()
        .map(|l| {
            let price = BigDecimal::from_str(&l.unit_price).map_err(|e| {
                AppError::BadRequest(format!("Invalid unit_price '{}': {}", l.unit_price, e))
            })?;
            Ok(OrderLineInput {
                product_id: l.product_id,
                product_name: l.product_name,
                quantity: l.quantity,
                unit_price: price,
                note: l.note,
            })
        })
        .collect();

    Ok(OrderDraft {
        user_id: body.user_id,
        customer: CustomerDetails {
            name: body.customer_name,
            phone: body.customer_phone,
            email: body.customer_email,
        },
        notes: body.notes,
        lines: lines?,
    })
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// POST /orders
///
/// Creates the order together with its lines in a single transaction, then
/// opens a hosted checkout session for it. The response carries everything
/// the confirmation page needs: the signed pickup payload and the payment
/// redirect URL.
#[utoipa::path(
    post,
    path = "/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 201, description = "Order created", body = CreateOrderResponse),
        (status = 400, description = "Invalid order data"),
        (status = 502, description = "Payment gateway unavailable"),
    ),
    tag = "orders"
)]
pub async fn create_order(
    service: web::Data<Service>,
    config: web::Data<AppConfig>,
    body: web::Json<CreateOrderRequest>,
) -> Result<HttpResponse, AppError> {
    let draft = draft_from(body.into_inner())?;

    let svc = service.clone();
    let (order, payload) = web::block(move || svc.create_order(draft))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    let session = stripe::create_checkout_session(
        &config.stripe_api_base,
        &config.stripe_secret_key,
        order.id,
        order.order_number,
        &order.total,
        &config.currency,
        &config.checkout_success_url,
        &config.checkout_cancel_url,
    )
    .await?;

    let svc = service.clone();
    let order_id = order.id;
    let session_id = session.id.clone();
    web::block(move || svc.attach_payment_ref(order_id, &session_id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Created().json(CreateOrderResponse {
        id: order.id,
        order_number: order.order_number,
        total: order.total.to_string(),
        pickup_payload: payload,
        checkout_url: session.url,
    }))
}

/// GET /orders/{id}
///
/// Returns the order with its lines and signed pickup payload. The id is an
/// unguessable UUID; it is the customer's handle on the confirmation page.
#[utoipa::path(
    get,
    path = "/orders/{id}",
    params(
        ("id" = Uuid, Path, description = "Order UUID"),
    ),
    responses(
        (status = 200, description = "Order found", body = OrderResponse),
        (status = 404, description = "Order not found"),
    ),
    tag = "orders"
)]
pub async fn get_order(
    service: web::Data<Service>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();

    let svc = service.clone();
    let result = web::block(move || -> Result<Option<(OrderView, String)>, DomainError> {
        let Some(order) = svc.get_order(order_id)? else {
            return Ok(None);
        };
        let payload = svc.payload_for(&order)?;
        Ok(Some((order, payload)))
    })
    .await
    .map_err(|e| AppError::Internal(e.to_string()))??;

    match result {
        Some((order, payload)) => Ok(HttpResponse::Ok().json(order_response(order, Some(payload)))),
        None => Err(AppError::NotFound),
    }
}
