use actix_web::HttpResponse;
use thiserror::Error;

use crate::domain::errors::DomainError;
use crate::stripe::GatewayError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found")]
    NotFound,

    #[error("Unauthorized")]
    Unauthorized,

    /// Malformed and bad-signature pickup codes collapse into this one
    /// message; logs keep them apart, responses must not.
    #[error("Invalid pickup code")]
    InvalidPickupCode,

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("Payment gateway error: {0}")]
    Gateway(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<DomainError> for AppError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::NotFound => AppError::NotFound,
            DomainError::MalformedPayload | DomainError::InvalidSignature => {
                AppError::InvalidPickupCode
            }
            DomainError::AlreadyCompleted
            | DomainError::OrderCancelled
            | DomainError::PaymentNotConfirmed
            | DomainError::InvalidTransition { .. } => AppError::Conflict(e.to_string()),
            DomainError::InvalidInput(msg) => AppError::BadRequest(msg),
            DomainError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

impl From<GatewayError> for AppError {
    fn from(e: GatewayError) -> Self {
        AppError::Gateway(e.to_string())
    }
}

impl actix_web::ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let body = |msg: &str| serde_json::json!({ "error": msg });
        match self {
            AppError::NotFound => HttpResponse::NotFound().json(body(&self.to_string())),
            AppError::Unauthorized => HttpResponse::Unauthorized().json(body(&self.to_string())),
            AppError::InvalidPickupCode => {
                HttpResponse::UnprocessableEntity().json(body(&self.to_string()))
            }
            AppError::Conflict(msg) => HttpResponse::Conflict().json(body(msg)),
            AppError::BadRequest(msg) => HttpResponse::BadRequest().json(body(msg)),
            AppError::Gateway(_) => HttpResponse::BadGateway().json(body("Payment gateway error")),
            AppError::Internal(_) => {
                HttpResponse::InternalServerError().json(body("Internal server error"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use actix_web::http::StatusCode;
    use actix_web::ResponseError;

    use super::*;
    use crate::domain::order::OrderStatus;

    #[test]
    fn statuses_match_the_error_kind() {
        assert_eq!(AppError::NotFound.error_response().status(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::Unauthorized.error_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::InvalidPickupCode.error_response().status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            AppError::Conflict("already picked up".to_string())
                .error_response()
                .status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::BadRequest("bad".to_string()).error_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Gateway("boom".to_string()).error_response().status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            AppError::Internal("boom".to_string()).error_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn malformed_and_invalid_signature_are_indistinguishable_in_responses() {
        let a: AppError = DomainError::MalformedPayload.into();
        let b: AppError = DomainError::InvalidSignature.into();
        assert_eq!(a.to_string(), b.to_string());
        assert_eq!(a.error_response().status(), b.error_response().status());
    }

    #[test]
    fn guard_failures_map_to_distinct_conflict_messages() {
        let completed: AppError = DomainError::AlreadyCompleted.into();
        let cancelled: AppError = DomainError::OrderCancelled.into();
        let unpaid: AppError = DomainError::PaymentNotConfirmed.into();

        for e in [&completed, &cancelled, &unpaid] {
            assert_eq!(e.error_response().status(), StatusCode::CONFLICT);
        }
        assert_ne!(completed.to_string(), cancelled.to_string());
        assert_ne!(completed.to_string(), unpaid.to_string());
        assert_ne!(cancelled.to_string(), unpaid.to_string());
    }

    #[test]
    fn invalid_transition_reports_both_states() {
        let e: AppError = DomainError::InvalidTransition {
            from: OrderStatus::Pending,
            to: OrderStatus::Preparing,
        }
        .into();
        assert_eq!(e.to_string(), "Order cannot move from pending to preparing");
    }

    #[test]
    fn internal_details_are_masked_in_responses() {
        let resp = AppError::Internal("connection refused".to_string()).error_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
