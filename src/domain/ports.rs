use serde_json::Value;
use uuid::Uuid;

use super::errors::DomainError;
use super::order::{ListResult, NewOrderInput, OrderStatus, OrderView, PickupReceipt};

/// Storage port for orders.
///
/// Every status mutation is a guarded update: it only applies when the
/// stored row still matches the expected prior state. Guard misses are
/// reported as `Ok(false)` / `Ok(None)` so callers decide whether a stale
/// trigger is a no-op (webhooks) or an error (staff actions).
pub trait OrderRepository: Send + Sync + 'static {
    /// Insert the order and its lines in one transaction. A failed line
    /// insert rolls back the order row.
    fn create(&self, input: NewOrderInput) -> Result<OrderView, DomainError>;

    fn find_by_id(&self, id: Uuid) -> Result<Option<OrderView>, DomainError>;

    fn list(&self, page: i64, limit: i64) -> Result<ListResult, DomainError>;

    /// Attach the payment-gateway session reference once a session exists.
    fn set_payment_ref(&self, id: Uuid, payment_ref: &str) -> Result<(), DomainError>;

    /// Compare-and-swap status change; `Ok(false)` when the row was not in
    /// `from` anymore.
    fn transition(&self, id: Uuid, from: OrderStatus, to: OrderStatus)
        -> Result<bool, DomainError>;

    /// pending → paid with payment_status=succeeded, in one guarded write.
    fn mark_paid(&self, id: Uuid, payment_ref: Option<&str>) -> Result<bool, DomainError>;

    /// Sets payment_status=failed while leaving the fulfillment status
    /// untouched; guarded on payment_status still being pending.
    fn mark_payment_failed(&self, id: Uuid) -> Result<bool, DomainError>;

    /// Cancel from any non-terminal state; `refunded` also flips
    /// payment_status to refunded.
    fn cancel(&self, id: Uuid, refunded: bool) -> Result<bool, DomainError>;

    /// Terminal pickup write: completes the order and stamps completed_at,
    /// guarded on a non-terminal status and a succeeded payment. `Ok(None)`
    /// when the guard did not match.
    fn complete_pickup(&self, id: Uuid) -> Result<Option<PickupReceipt>, DomainError>;

    fn record_audit(
        &self,
        order_id: Option<Uuid>,
        action: &str,
        detail: Value,
    ) -> Result<(), DomainError>;
}
