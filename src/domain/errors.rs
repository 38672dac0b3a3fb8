use thiserror::Error;

use super::order::OrderStatus;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("Order not found")]
    NotFound,
    #[error("Pickup code is malformed")]
    MalformedPayload,
    #[error("Pickup code signature mismatch")]
    InvalidSignature,
    #[error("Order has already been picked up")]
    AlreadyCompleted,
    #[error("Order is cancelled")]
    OrderCancelled,
    #[error("Payment has not been confirmed")]
    PaymentNotConfirmed,
    #[error("Order cannot move from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Internal error: {0}")]
    Internal(String),
}
