use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::auth::StaffAuth;
use super::orders::{order_response, OrderResponse};
use crate::domain::errors::DomainError;
use crate::domain::order::OrderStatus;
use crate::errors::AppError;
use crate::Service;

// ── Pagination ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize, ToSchema)]
pub struct ListOrdersParams {
    /// Page number (1-based). Defaults to 1.
    #[serde(default = "default_page")]
    pub page: i64,
    /// Number of items per page. Defaults to 20, maximum 100.
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    20
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ListOrdersResponse {
    pub items: Vec<OrderResponse>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateStatusRequest {
    /// Target status: "preparing", "ready" or "cancelled".
    pub status: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PickupScanRequest {
    /// Raw text decoded from the customer's QR code.
    pub payload: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PickupScanResponse {
    pub order_id: Uuid,
    pub order_number: i64,
    pub completed_at: String,
}

// ── Handlers ─────────────────────────────────────────────────────────────────

/// GET /staff/orders
///
/// Paginated order list for the staff dashboard (without lines).
#[utoipa::path(
    get,
    path = "/staff/orders",
    params(
        ("page" = Option<i64>, Query, description = "Page number (1-based, default 1)"),
        ("limit" = Option<i64>, Query, description = "Items per page (default 20, max 100)"),
    ),
    responses(
        (status = 200, description = "Paginated list of orders", body = ListOrdersResponse),
        (status = 401, description = "Missing or invalid staff token"),
    ),
    tag = "staff"
)]
pub async fn list_orders(
    _auth: StaffAuth,
    service: web::Data<Service>,
    query: web::Query<ListOrdersParams>,
) -> Result<HttpResponse, AppError> {
    let params = query.into_inner();
    let page = params.page.max(1);
    let limit = params.limit.clamp(1, 100);

    let svc = service.clone();
    let result = web::block(move || svc.list_orders(page, limit))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(ListOrdersResponse {
        items: result
            .items
            .into_iter()
            .map(|o| order_response(o, None))
            .collect(),
        total: result.total,
        page,
        limit,
    }))
}

/// POST /staff/orders/{id}/status
///
/// Advance an order along the kitchen workflow or cancel it. Transitions
/// that do not match the current state come back as 409, never as a silent
/// success.
#[utoipa::path(
    post,
    path = "/staff/orders/{id}/status",
    params(
        ("id" = Uuid, Path, description = "Order UUID"),
    ),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Status updated", body = OrderResponse),
        (status = 401, description = "Missing or invalid staff token"),
        (status = 404, description = "Order not found"),
        (status = 409, description = "Transition not allowed from the current state"),
    ),
    tag = "staff"
)]
pub async fn update_status(
    _auth: StaffAuth,
    service: web::Data<Service>,
    path: web::Path<Uuid>,
    body: web::Json<UpdateStatusRequest>,
) -> Result<HttpResponse, AppError> {
    let order_id = path.into_inner();
    let status = body.into_inner().status;
    let target = OrderStatus::parse(&status)
        .ok_or_else(|| AppError::BadRequest(format!("Unknown status '{status}'")))?;

    let svc = service.clone();
    let order = web::block(move || svc.advance_status(order_id, target))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))??;

    Ok(HttpResponse::Ok().json(order_response(order, None)))
}

/// POST /staff/pickup
///
/// Validate a scanned pickup code and complete the order. Malformed codes
/// and signature mismatches produce the same response; the log line is the
/// only place the two are told apart.
#[utoipa::path(
    post,
    path = "/staff/pickup",
    request_body = PickupScanRequest,
    responses(
        (status = 200, description = "Order completed", body = PickupScanResponse),
        (status = 401, description = "Missing or invalid staff token"),
        (status = 404, description = "Order not found"),
        (status = 409, description = "Order not in a pickable state"),
        (status = 422, description = "Invalid pickup code"),
    ),
    tag = "staff"
)]
pub async fn scan_pickup(
    _auth: StaffAuth,
    service: web::Data<Service>,
    body: web::Json<PickupScanRequest>,
) -> Result<HttpResponse, AppError> {
    let raw = body.into_inner().payload;

    let svc = service.clone();
    let receipt = web::block(move || svc.authorize_pickup(&raw))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
        .map_err(|e| {
            if matches!(
                e,
                DomainError::MalformedPayload | DomainError::InvalidSignature
            ) {
                log::warn!("pickup scan rejected: {e}");
            }
            AppError::from(e)
        })?;

    Ok(HttpResponse::Ok().json(PickupScanResponse {
        order_id: receipt.order_id,
        order_number: receipt.order_number,
        completed_at: receipt.completed_at.to_rfc3339(),
    }))
}
