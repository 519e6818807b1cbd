//! # Orders
//!
//! Builds immutable [`Order`] records from a finished sale.
//!
//! ## Order Math
//! ```text
//! subtotal       = Σ price × qty
//! after_discount = max(0, subtotal - discount)
//! tax            = after_discount × rate
//! total          = after_discount + tax
//! ```
//! None of these figures are rounded when stored.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::checkout::CompletedCheckout;
use crate::money::Money;
use crate::types::{Customer, Order, OrderItem, OrderStatus, Payment, TaxRate};

const BASE36: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Encodes a non-negative integer in upper-case base 36.
pub(crate) fn to_base36(mut value: u64) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(BASE36[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();
    String::from_utf8_lossy(&digits).into_owned()
}

/// Generates an order id: `ORD-<base36 millis>-<5 random chars>`.
///
/// ## Example
/// ```rust
/// use chrono::Utc;
/// use till_core::order::generate_order_id;
///
/// let id = generate_order_id(Utc::now());
/// assert!(id.starts_with("ORD-"));
/// assert_eq!(id, id.to_uppercase());
/// ```
pub fn generate_order_id(now: DateTime<Utc>) -> String {
    let millis = now.timestamp_millis().max(0) as u64;
    format!("ORD-{}-{}", to_base36(millis), random_base36(5))
}

/// `len` random upper-case base-36 characters (at most 16).
pub(crate) fn random_base36(len: usize) -> String {
    Uuid::new_v4()
        .as_bytes()
        .iter()
        .take(len)
        .map(|b| BASE36[(*b % 36) as usize] as char)
        .collect()
}

/// Builds an order from its lines and a discount amount.
///
/// The id and timestamp are supplied by the caller so the result is
/// deterministic.
pub fn build_order(
    id: String,
    items: Vec<OrderItem>,
    customer: Option<Customer>,
    payments: Vec<Payment>,
    discount: Money,
    tax_rate: TaxRate,
    created_at: DateTime<Utc>,
) -> Order {
    let subtotal: Money = items.iter().map(OrderItem::line_total).sum();
    let after_discount = (subtotal - discount).non_negative();
    let tax = after_discount.calculate_tax(tax_rate);

    Order {
        id,
        items,
        customer,
        subtotal,
        discount,
        tax,
        total: after_discount + tax,
        payments,
        status: OrderStatus::Completed,
        coupon_code: None,
        created_at,
    }
}

impl Order {
    /// Freezes a completed checkout into an order record.
    pub fn from_checkout(id: String, checkout: CompletedCheckout) -> Order {
        let mut order = build_order(
            id,
            checkout.items,
            checkout.customer,
            checkout.payments,
            checkout.totals.total_discount,
            checkout.tax_rate,
            checkout.completed_at,
        );
        order.coupon_code = checkout.coupon_code;
        order
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
