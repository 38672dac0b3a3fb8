use std::fmt;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Fulfillment state of an order. Tracks the kitchen workflow and is a
/// separate axis from [`PaymentStatus`], which tracks money.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderStatus {
    Pending,
    Paid,
    Preparing,
    Ready,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Paid => "paid",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Ready => "ready",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(OrderStatus::Pending),
            "paid" => Some(OrderStatus::Paid),
            "preparing" => Some(OrderStatus::Preparing),
            "ready" => Some(OrderStatus::Ready),
            "completed" => Some(OrderStatus::Completed),
            "cancelled" => Some(OrderStatus::Cancelled),
            _ => None,
        }
    }

    /// Terminal states accept no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }

    /// The legal transition table. The happy path is linear
    /// (pending → paid → preparing → ready → completed); cancellation is
    /// reachable from every non-terminal state.
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        match (self, next) {
            (Pending, Paid) | (Paid, Preparing) | (Preparing, Ready) | (Ready, Completed) => true,
            (from, Cancelled) => !from.is_terminal(),
            _ => false,
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentStatus {
    Pending,
    Succeeded,
    Failed,
    Refunded,
}

impl PaymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Succeeded => "succeeded",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Refunded => "refunded",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(PaymentStatus::Pending),
            "succeeded" => Some(PaymentStatus::Succeeded),
            "failed" => Some(PaymentStatus::Failed),
            "refunded" => Some(PaymentStatus::Refunded),
            _ => None,
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A payment-gateway lifecycle event, already reduced to the cases the
/// order state machine reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentEvent {
    CheckoutCompleted { payment_ref: Option<String> },
    PaymentSucceeded { payment_ref: Option<String> },
    PaymentFailed,
    ChargeRefunded,
}

#[derive(Debug, Clone)]
pub struct CustomerDetails {
    pub name: String,
    pub phone: String,
    pub email: String,
}

#[derive(Debug, Clone)]
pub struct OrderLineInput {
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: BigDecimal,
    pub note: Option<String>,
}

impl OrderLineInput {
    /// Computed once at order creation and never recalculated.
    pub fn line_total(&self) -> BigDecimal {
        &self.unit_price * BigDecimal::from(self.quantity)
    }
}

/// Everything needed to persist a new order atomically with its lines.
#[derive(Debug, Clone)]
pub struct NewOrderInput {
    pub user_id: Option<Uuid>,
    pub customer: CustomerDetails,
    pub notes: Option<String>,
    pub pickup_secret: String,
    pub lines: Vec<OrderLineInput>,
}

/// Order total as the sum of line totals.
pub fn order_total(lines: &[OrderLineInput]) -> BigDecimal {
    lines
        .iter()
        .fold(BigDecimal::from(0), |acc, l| acc + l.line_total())
}

#[derive(Debug, Clone)]
pub struct OrderLineView {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: BigDecimal,
    pub line_total: BigDecimal,
    pub note: Option<String>,
}

#[derive(Debug, Clone)]
pub struct OrderView {
    pub id: Uuid,
    pub order_number: i64,
    pub user_id: Option<Uuid>,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub total: BigDecimal,
    pub payment_ref: Option<String>,
    pub pickup_secret: String,
    pub customer: CustomerDetails,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub lines: Vec<OrderLineView>,
}

#[derive(Debug, Clone)]
pub struct ListResult {
    pub items: Vec<OrderView>,
    pub total: i64,
}

/// Returned to staff after a successful pickup scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickupReceipt {
    pub order_id: Uuid,
    pub order_number: i64,
    pub completed_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn happy_path_transitions_are_legal() {
        use OrderStatus::*;
        assert!(Pending.can_transition_to(Paid));
        assert!(Paid.can_transition_to(Preparing));
        assert!(Preparing.can_transition_to(Ready));
        assert!(Ready.can_transition_to(Completed));
    }

    #[test]
    fn cancellation_is_reachable_from_every_non_terminal_state() {
        use OrderStatus::*;
        for from in [Pending, Paid, Preparing, Ready] {
            assert!(from.can_transition_to(Cancelled), "{from} should cancel");
        }
    }

    #[test]
    fn terminal_states_accept_no_transitions() {
        use OrderStatus::*;
        for from in [Completed, Cancelled] {
            for to in [Pending, Paid, Preparing, Ready, Completed, Cancelled] {
                assert!(!from.can_transition_to(to), "{from} -> {to} must be rejected");
            }
        }
    }

    #[test]
    fn skipping_states_is_rejected() {
        use OrderStatus::*;
        assert!(!Pending.can_transition_to(Preparing));
        assert!(!Pending.can_transition_to(Completed));
        assert!(!Paid.can_transition_to(Ready));
        assert!(!Preparing.can_transition_to(Completed));
    }

    #[test]
    fn status_strings_round_trip() {
        use OrderStatus::*;
        for status in [Pending, Paid, Preparing, Ready, Completed, Cancelled] {
            assert_eq!(OrderStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(OrderStatus::parse("shipped"), None);
    }

    #[test]
    fn payment_status_strings_round_trip() {
        use PaymentStatus::*;
        for status in [Pending, Succeeded, Failed, Refunded] {
            assert_eq!(PaymentStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(PaymentStatus::parse("chargeback"), None);
    }

    fn line(price: &str, quantity: i32) -> OrderLineInput {
        OrderLineInput {
            product_id: Uuid::new_v4(),
            product_name: "Cheeseburger".to_string(),
            quantity,
            unit_price: BigDecimal::from_str(price).expect("valid decimal"),
            note: None,
        }
    }

    #[test]
    fn line_total_is_unit_price_times_quantity() {
        let l = line("12.90", 2);
        assert_eq!(l.line_total(), BigDecimal::from_str("25.80").unwrap());
    }

    #[test]
    fn order_total_sums_line_totals() {
        let lines = vec![line("12.90", 2), line("4.50", 1)];
        assert_eq!(order_total(&lines), BigDecimal::from_str("30.30").unwrap());
    }

    #[test]
    fn order_total_of_empty_cart_is_zero() {
        assert_eq!(order_total(&[]), BigDecimal::from(0));
    }
}
