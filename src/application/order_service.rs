use bigdecimal::BigDecimal;
use serde_json::json;
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::order::{
    CustomerDetails, ListResult, NewOrderInput, OrderLineInput, OrderStatus, OrderView,
    PaymentEvent, PaymentStatus, PickupReceipt,
};
use crate::domain::ports::OrderRepository;
use crate::domain::token::{generate_secret, parse_payload, TokenSigner};

/// A validated-but-unpersisted order, as submitted by the checkout form.
#[derive(Debug, Clone)]
pub struct OrderDraft {
    pub user_id: Option<Uuid>,
    pub customer: CustomerDetails,
    pub notes: Option<String>,
    pub lines: Vec<OrderLineInput>,
}

/// Application service tying the order state machine, the pickup token
/// scheme, and the storage port together.
pub struct OrderService<R> {
    repo: R,
    signer: TokenSigner,
}

impl<R: OrderRepository> OrderService<R> {
    pub fn new(repo: R, signer: TokenSigner) -> Self {
        Self { repo, signer }
    }

    /// Create the order with a fresh pickup secret and return it together
    /// with the signed payload for the confirmation page.
    pub fn create_order(&self, draft: OrderDraft) -> Result<(OrderView, String), DomainError> {
        validate_draft(&draft)?;

        let pickup_secret = generate_secret()?;
        let order = self.repo.create(NewOrderInput {
            user_id: draft.user_id,
            customer: draft.customer,
            notes: draft.notes,
            pickup_secret,
            lines: draft.lines,
        })?;
        let payload = self.signer.build_payload(order.id, &order.pickup_secret)?;
        Ok((order, payload))
    }

    pub fn get_order(&self, id: Uuid) -> Result<Option<OrderView>, DomainError> {
        self.repo.find_by_id(id)
    }

    pub fn list_orders(&self, page: i64, limit: i64) -> Result<ListResult, DomainError> {
        self.repo.list(page, limit)
    }

    /// Signed payload for an already-loaded order.
    pub fn payload_for(&self, order: &OrderView) -> Result<String, DomainError> {
        self.signer.build_payload(order.id, &order.pickup_secret)
    }

    /// Record the gateway session reference on a freshly created order.
    pub fn attach_payment_ref(&self, id: Uuid, payment_ref: &str) -> Result<(), DomainError> {
        self.repo.set_payment_ref(id, payment_ref)
    }

    /// Staff-driven workflow transition. Staff may move an order along the
    /// kitchen path (paid → preparing → ready) or cancel it; payment and
    /// pickup transitions have their own entry points. A guard miss is
    /// reported back as an error, never silently accepted.
    pub fn advance_status(&self, id: Uuid, to: OrderStatus) -> Result<OrderView, DomainError> {
        if !matches!(
            to,
            OrderStatus::Preparing | OrderStatus::Ready | OrderStatus::Cancelled
        ) {
            return Err(DomainError::InvalidInput(format!(
                "staff cannot set status {to}"
            )));
        }

        let order = self.repo.find_by_id(id)?.ok_or(DomainError::NotFound)?;
        let from = order.status;
        if !from.can_transition_to(to) {
            return Err(DomainError::InvalidTransition { from, to });
        }

        let applied = if to == OrderStatus::Cancelled {
            self.repo.cancel(id, false)?
        } else {
            self.repo.transition(id, from, to)?
        };
        if !applied {
            // Lost a race with a concurrent writer; report the state that won.
            let current = self.repo.find_by_id(id)?.ok_or(DomainError::NotFound)?;
            return Err(DomainError::InvalidTransition {
                from: current.status,
                to,
            });
        }

        let _ = self.repo.record_audit(
            Some(id),
            "status_changed",
            json!({ "from": from.as_str(), "to": to.as_str() }),
        );
        self.repo.find_by_id(id)?.ok_or(DomainError::NotFound)
    }

    /// Apply a payment-gateway event. Duplicate or out-of-order deliveries
    /// land on a guard that no longer matches and become no-ops.
    pub fn apply_payment_event(
        &self,
        order_id: Uuid,
        event: PaymentEvent,
    ) -> Result<(), DomainError> {
        let applied = match &event {
            PaymentEvent::CheckoutCompleted { payment_ref }
            | PaymentEvent::PaymentSucceeded { payment_ref } => {
                self.repo.mark_paid(order_id, payment_ref.as_deref())?
            }
            PaymentEvent::PaymentFailed => self.repo.mark_payment_failed(order_id)?,
            PaymentEvent::ChargeRefunded => self.repo.cancel(order_id, true)?,
        };
        if !applied {
            log::info!("payment event {event:?} for order {order_id} was a no-op");
        }
        Ok(())
    }

    /// Validate a scanned payload and complete the order.
    ///
    /// Signature verification happens before any database access; the guard
    /// failures afterwards each map to a distinct error so staff see why a
    /// code was refused.
    pub fn authorize_pickup(&self, raw_payload: &str) -> Result<PickupReceipt, DomainError> {
        let scanned = parse_payload(raw_payload)?;
        self.signer
            .verify(&scanned.order_id_text, &scanned.secret, &scanned.signature)?;

        let order = self
            .repo
            .find_by_id(scanned.order_id)?
            .ok_or(DomainError::NotFound)?;
        match order.status {
            OrderStatus::Completed => return Err(DomainError::AlreadyCompleted),
            OrderStatus::Cancelled => return Err(DomainError::OrderCancelled),
            _ => {}
        }
        if order.payment_status != PaymentStatus::Succeeded {
            return Err(DomainError::PaymentNotConfirmed);
        }

        match self.repo.complete_pickup(order.id)? {
            Some(receipt) => {
                let _ = self.repo.record_audit(
                    Some(order.id),
                    "order_picked_up",
                    json!({ "order_number": receipt.order_number }),
                );
                Ok(receipt)
            }
            None => {
                // Raced with another writer between the read and the guarded
                // update; re-read to report what actually happened.
                let current = self.repo.find_by_id(order.id)?.ok_or(DomainError::NotFound)?;
                match current.status {
                    OrderStatus::Completed => Err(DomainError::AlreadyCompleted),
                    OrderStatus::Cancelled => Err(DomainError::OrderCancelled),
                    _ => Err(DomainError::PaymentNotConfirmed),
                }
            }
        }
    }
}

fn validate_draft(draft: &OrderDraft) -> Result<(), DomainError> {
    if draft.lines.is_empty() {
        return Err(DomainError::InvalidInput(
            "order must contain at least one line".to_string(),
        ));
    }
    for line in &draft.lines {
        if line.quantity < 1 {
            return Err(DomainError::InvalidInput(format!(
                "quantity must be at least 1, got {}",
                line.quantity
            )));
        }
        if line.unit_price < BigDecimal::from(0) {
            return Err(DomainError::InvalidInput(format!(
                "unit price must not be negative, got {}",
                line.unit_price
            )));
        }
        if line.product_name.trim().is_empty() {
            return Err(DomainError::InvalidInput(
                "product name must not be empty".to_string(),
            ));
        }
    }
    let c = &draft.customer;
    if c.name.trim().is_empty() || c.phone.trim().is_empty() || c.email.trim().is_empty() {
        return Err(DomainError::InvalidInput(
            "customer name, phone and email are required".to_string(),
        ));
    }
    Ok(())
}
