//! # Checkout
//!
//! The checkout wizard as a state machine, plus split-payment bookkeeping.
//!
//! ## Checkout Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Checkout Steps                                  │
//! │                                                                         │
//! │   ┌──────────┐  proceed_to_payment  ┌──────────┐   complete   ┌───────┐│
//! │   │ Details  │ ───────────────────► │ Payment  │ ───────────► │ Done  ││
//! │   │ customer │ ◄─────────────────── │ payments │  (consumes   │       ││
//! │   │ coupon   │    back_to_details   │          │   session)   │       ││
//! │   └──────────┘                      └──────────┘              └───────┘│
//! │                                                                         │
//! │   Dropping the session at any point records nothing.                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Settlement
//! The remaining balance is `grand_total - Σ paid`. A checkout is paid once
//! that balance, rounded to cents, is zero or less. Sub-cent leftovers from
//! percentage discounts therefore never block a sale, while a payment half a
//! cent short does.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cart::CartItem;
use crate::discount::{calculate_all_discounts, AppliedDiscount, DiscountBreakdown, DiscountConfig};
use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{Customer, OrderItem, Payment, PaymentType, TaxRate};
use crate::validation::validate_payment_amount;

// =============================================================================
// Checkout Step
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckoutStep {
    Details,
    Payment,
    Confirmation,
}

impl CheckoutStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckoutStep::Details => "details",
            CheckoutStep::Payment => "payment",
            CheckoutStep::Confirmation => "confirmation",
        }
    }
}

// =============================================================================
// Split Payments
// =============================================================================

/// Ordered list of tenders covering one grand total.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SplitPayments {
    payments: Vec<Payment>,
}

impl SplitPayments {
    pub fn new() -> Self {
        SplitPayments {
            payments: Vec::new(),
        }
    }

    /// Appends a tender. The amount must be positive.
    pub fn add(&mut self, payment_type: PaymentType, amount: Money) -> CoreResult<()> {
        validate_payment_amount(amount).map_err(|e| CoreError::InvalidPaymentAmount {
            reason: e.to_string(),
        })?;
        self.payments.push(Payment::new(payment_type, amount));
        Ok(())
    }

    /// Appends a tender for exactly the remaining balance.
    ///
    /// Returns the amount added, or `None` when nothing is owed.
    pub fn add_remaining(&mut self, payment_type: PaymentType, grand_total: Money) -> Option<Money> {
        let remaining = self.remaining(grand_total);
        if !remaining.is_positive() {
            return None;
        }
        self.payments.push(Payment::new(payment_type, remaining));
        Some(remaining)
    }

    /// Removes the tender at `index`.
    pub fn remove(&mut self, index: usize) -> CoreResult<Payment> {
        if index >= self.payments.len() {
            return Err(CoreError::PaymentNotFound(index));
        }
        Ok(self.payments.remove(index))
    }

    pub fn clear(&mut self) {
        self.payments.clear();
    }

    pub fn payments(&self) -> &[Payment] {
        &self.payments
    }

    pub fn len(&self) -> usize {
        self.payments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payments.is_empty()
    }

    pub fn total_paid(&self) -> Money {
        self.payments.iter().map(|p| p.amount).sum()
    }

    /// `grand_total - Σ paid`, unrounded and possibly negative.
    pub fn remaining(&self, grand_total: Money) -> Money {
        grand_total - self.total_paid()
    }

    pub fn is_complete(&self, grand_total: Money) -> bool {
        !self.remaining(grand_total).round_to_cents().is_positive()
    }

    /// Cash to hand back: `max(0, Σ paid - grand_total)`.
    pub fn change_due(&self, grand_total: Money) -> Money {
        (self.total_paid() - grand_total).non_negative()
    }

    pub fn into_payments(self) -> Vec<Payment> {
        self.payments
    }
}

// =============================================================================
// Totals
// =============================================================================

/// Every figure the checkout screen shows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutTotals {
    pub subtotal: Money,
    pub discounts: Vec<AppliedDiscount>,
    pub total_discount: Money,
    /// Subtotal after discounts, before tax.
    pub final_total: Money,
    pub tax: Money,
    pub grand_total: Money,
}

impl CheckoutTotals {
    pub fn from_breakdown(breakdown: DiscountBreakdown, tax_rate: TaxRate) -> Self {
        let tax = breakdown.final_total.calculate_tax(tax_rate);
        CheckoutTotals {
            subtotal: breakdown.subtotal,
            grand_total: breakdown.final_total + tax,
            discounts: breakdown.discounts,
            total_discount: breakdown.total_discount,
            final_total: breakdown.final_total,
            tax,
        }
    }
}

// =============================================================================
// Checkout Session
// =============================================================================

/// One checkout in progress.
///
/// The session owns a snapshot of the cart lines and of the discount
/// configuration, so edits elsewhere cannot change the price mid-checkout.
#[derive(Debug, Clone)]
pub struct CheckoutSession {
    items: Vec<CartItem>,
    config: DiscountConfig,
    tax_rate: TaxRate,
    step: CheckoutStep,
    customer: Option<Customer>,
    coupon_code: Option<String>,
    payments: SplitPayments,
}

impl CheckoutSession {
    /// Starts a checkout for the given cart lines.
    pub fn new(items: &[CartItem], config: DiscountConfig, tax_rate: TaxRate) -> CoreResult<Self> {
        if items.is_empty() {
            return Err(CoreError::EmptyCart);
        }

        Ok(CheckoutSession {
            items: items.to_vec(),
            config,
            tax_rate,
            step: CheckoutStep::Details,
            customer: None,
            coupon_code: None,
            payments: SplitPayments::new(),
        })
    }

    pub fn step(&self) -> CheckoutStep {
        self.step
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    pub fn customer(&self) -> Option<&Customer> {
        self.customer.as_ref()
    }

    pub fn coupon_code(&self) -> Option<&str> {
        self.coupon_code.as_deref()
    }

    pub fn payments(&self) -> &SplitPayments {
        &self.payments
    }

    pub fn tax_rate(&self) -> TaxRate {
        self.tax_rate
    }

    // -------------------------------------------------------------------------
    // Details step
    // -------------------------------------------------------------------------

    /// Attaches (or with `None`, detaches) a customer.
    pub fn set_customer(&mut self, customer: Option<Customer>) -> CoreResult<()> {
        self.require_step(CheckoutStep::Details)?;
        self.customer = customer;
        Ok(())
    }

    /// Validates and applies a coupon code.
    ///
    /// On rejection the previously applied coupon (if any) is kept.
    pub fn apply_coupon(&mut self, code: &str, now: DateTime<Utc>) -> CoreResult<AppliedDiscount> {
        self.require_step(CheckoutStep::Details)?;

        let breakdown = calculate_all_discounts(&self.items, Some(code), &self.config, now);
        if let Some(rejection) = breakdown.rejected_coupon {
            return Err(rejection.into());
        }

        let applied = breakdown
            .coupon()
            .cloned()
            .ok_or(CoreError::Coupon(crate::error::CouponRejection::NotFound))?;
        self.coupon_code = Some(code.trim().to_uppercase());
        Ok(applied)
    }

    pub fn remove_coupon(&mut self) -> CoreResult<()> {
        self.require_step(CheckoutStep::Details)?;
        self.coupon_code = None;
        Ok(())
    }

    pub fn proceed_to_payment(&mut self) -> CoreResult<()> {
        self.require_step(CheckoutStep::Details)?;
        self.step = CheckoutStep::Payment;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Payment step
    // -------------------------------------------------------------------------

    /// Returns to the details step. Payments entered so far are kept.
    pub fn back_to_details(&mut self) -> CoreResult<()> {
        self.require_step(CheckoutStep::Payment)?;
        self.step = CheckoutStep::Details;
        Ok(())
    }

    pub fn add_payment(&mut self, payment_type: PaymentType, amount: Money) -> CoreResult<()> {
        self.require_step(CheckoutStep::Payment)?;
        self.payments.add(payment_type, amount)
    }

    /// Adds a tender for whatever is still owed.
    pub fn add_remaining(
        &mut self,
        payment_type: PaymentType,
        now: DateTime<Utc>,
    ) -> CoreResult<Option<Money>> {
        self.require_step(CheckoutStep::Payment)?;
        let grand_total = self.totals(now).grand_total;
        Ok(self.payments.add_remaining(payment_type, grand_total))
    }

    pub fn remove_payment(&mut self, index: usize) -> CoreResult<Payment> {
        self.require_step(CheckoutStep::Payment)?;
        self.payments.remove(index)
    }

    /// Replaces any split tenders with one tender for the full amount.
    pub fn pay_in_full(&mut self, payment_type: PaymentType, now: DateTime<Utc>) -> CoreResult<()> {
        self.require_step(CheckoutStep::Payment)?;
        let grand_total = self.totals(now).grand_total;
        self.payments.clear();
        self.payments.add_remaining(payment_type, grand_total);
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Figures
    // -------------------------------------------------------------------------

    pub fn breakdown(&self, now: DateTime<Utc>) -> DiscountBreakdown {
        calculate_all_discounts(&self.items, self.coupon_code.as_deref(), &self.config, now)
    }

    pub fn totals(&self, now: DateTime<Utc>) -> CheckoutTotals {
        CheckoutTotals::from_breakdown(self.breakdown(now), self.tax_rate)
    }

    pub fn remaining(&self, now: DateTime<Utc>) -> Money {
        self.payments.remaining(self.totals(now).grand_total)
    }

    pub fn is_paid(&self, now: DateTime<Utc>) -> bool {
        self.payments.is_complete(self.totals(now).grand_total)
    }

    // -------------------------------------------------------------------------
    // Completion
    // -------------------------------------------------------------------------

    /// Finishes the checkout.
    ///
    /// Consumes the session, so a checkout completes at most once. The
    /// coupon is re-validated at `now`; if it lapsed since it was applied it
    /// is dropped and the totals are re-priced without it.
    pub fn complete(self, now: DateTime<Utc>) -> CoreResult<CompletedCheckout> {
        self.require_step(CheckoutStep::Payment)?;

        let breakdown = self.breakdown(now);
        let coupon = breakdown
            .coupon()
            .and(self.coupon_code.as_deref())
            .and_then(|code| self.config.find_coupon(code))
            .map(|c| (c.id.clone(), c.code.clone()));
        let totals = CheckoutTotals::from_breakdown(breakdown, self.tax_rate);

        if !self.payments.is_complete(totals.grand_total) {
            return Err(CoreError::PaymentIncomplete {
                remaining: self.payments.remaining(totals.grand_total).round_to_cents(),
            });
        }

        let change_due = self.payments.change_due(totals.grand_total);
        let (coupon_id, coupon_code) = match coupon {
            Some((id, code)) => (Some(id), Some(code)),
            None => (None, None),
        };

        Ok(CompletedCheckout {
            items: self.items.iter().map(CartItem::to_order_item).collect(),
            customer: self.customer,
            totals,
            payments: self.payments.into_payments(),
            change_due,
            coupon_id,
            coupon_code,
            tax_rate: self.tax_rate,
            completed_at: now,
        })
    }

    fn require_step(&self, expected: CheckoutStep) -> CoreResult<()> {
        if self.step != expected {
            return Err(CoreError::InvalidCheckoutStep {
                expected: expected.as_str(),
                actual: self.step.as_str(),
            });
        }
        Ok(())
    }
}

/// A paid checkout, ready to be recorded as an order.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletedCheckout {
    pub items: Vec<OrderItem>,
    pub customer: Option<Customer>,
    pub totals: CheckoutTotals,
    pub payments: Vec<Payment>,
    pub change_due: Money,
    /// Id of the redeemed coupon, used to bump its `used_count`.
    pub coupon_id: Option<String>,
    pub coupon_code: Option<String>,
    pub tax_rate: TaxRate,
    pub completed_at: DateTime<Utc>,
}

impl CompletedCheckout {
    pub fn step(&self) -> CheckoutStep {
        CheckoutStep::Confirmation
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CouponRejection;
    use crate::types::Product;
    use std::str::FromStr;

    fn line(price: Money, quantity: u32) -> CartItem {
        CartItem {
            product: Product {
                id: "p1".to_string(),
                name: "Avocado Toast".to_string(),
                description: None,
                price,
                category: "Food".to_string(),
                image: String::new(),
                qr_code: "PROD-005".to_string(),
                sku: Some("AVO-1".to_string()),
                stock: None,
                created_at: None,
                updated_at: None,
            },
            quantity,
        }
    }

    fn session(price: Money, quantity: u32) -> CheckoutSession {
        CheckoutSession::new(
            &[line(price, quantity)],
            DiscountConfig::default(),
            TaxRate::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_empty_cart_cannot_check_out() {
        let result = CheckoutSession::new(&[], DiscountConfig::default(), TaxRate::default());
        assert!(matches!(result, Err(CoreError::EmptyCart)));
    }

    #[test]
    fn test_half_cent_short_is_not_complete() {
        let grand_total = Money::from_major(11);
        let short = grand_total - Money::from_str("0.005").unwrap();

        let mut payments = SplitPayments::new();
        payments.add(PaymentType::Cash, short).unwrap();
        assert!(!payments.is_complete(grand_total));

        payments.clear();
        payments.add(PaymentType::Card, grand_total).unwrap();
        assert!(payments.is_complete(grand_total));
    }

    #[test]
    fn test_sub_cent_remainder_is_complete() {
        let grand_total = Money::from_str("10.904").unwrap();
        let mut payments = SplitPayments::new();
        payments.add(PaymentType::Cash, Money::from_cents(1090)).unwrap();
        assert!(payments.is_complete(grand_total));
    }

    #[test]
    fn test_add_remaining_and_change() {
        let grand_total = Money::from_cents(2000);
        let mut payments = SplitPayments::new();

        payments.add(PaymentType::Cash, Money::from_cents(500)).unwrap();
        assert_eq!(
            payments.add_remaining(PaymentType::Card, grand_total),
            Some(Money::from_cents(1500))
        );
        assert_eq!(payments.add_remaining(PaymentType::Wallet, grand_total), None);
        assert_eq!(payments.len(), 2);

        payments.add(PaymentType::Cash, Money::from_cents(300)).unwrap();
        assert_eq!(payments.change_due(grand_total), Money::from_cents(300));
    }

    #[test]
    fn test_remove_payment_by_index() {
        let mut payments = SplitPayments::new();
        payments.add(PaymentType::Cash, Money::from_cents(100)).unwrap();
        payments.add(PaymentType::Card, Money::from_cents(200)).unwrap();

        let removed = payments.remove(0).unwrap();
        assert_eq!(removed.payment_type, PaymentType::Cash);
        assert_eq!(payments.total_paid(), Money::from_cents(200));
        assert!(matches!(payments.remove(5), Err(CoreError::PaymentNotFound(5))));
    }

    #[test]
    fn test_non_positive_payment_rejected() {
        let mut payments = SplitPayments::new();
        assert!(matches!(
            payments.add(PaymentType::Cash, Money::zero()),
            Err(CoreError::InvalidPaymentAmount { .. })
        ));
    }

    #[test]
    fn test_totals_apply_tax_after_discount() {
        // $12 × 1, no bulk, 10% tax → $13.20
        let s = session(Money::from_major(12), 1);
        let totals = s.totals(Utc::now());
        assert_eq!(totals.final_total, Money::from_major(12));
        assert_eq!(totals.tax, Money::from_cents(120));
        assert_eq!(totals.grand_total, Money::from_cents(1320));
    }

    #[test]
    fn test_step_guards() {
        let mut s = session(Money::from_major(12), 1);
        assert!(matches!(
            s.add_payment(PaymentType::Cash, Money::from_major(1)),
            Err(CoreError::InvalidCheckoutStep { .. })
        ));

        s.proceed_to_payment().unwrap();
        assert!(s.apply_coupon("SAVE5", Utc::now()).is_err());

        s.back_to_details().unwrap();
        assert_eq!(s.step(), CheckoutStep::Details);
    }

    #[test]
    fn test_apply_coupon_reports_rejection() {
        let mut s = session(Money::from_major(12), 1);
        let err = s.apply_coupon("SAVE5", Utc::now()).unwrap_err();
        assert!(matches!(
            err,
            CoreError::Coupon(CouponRejection::BelowMinimum { .. })
        ));
        assert!(s.coupon_code().is_none());

        let applied = s.apply_coupon("welcome10", Utc::now()).unwrap();
        assert_eq!(applied.name, "WELCOME10 - Welcome 10% Off");
        assert_eq!(s.coupon_code(), Some("WELCOME10"));
    }

    #[test]
    fn test_complete_requires_full_payment() {
        let now = Utc::now();
        let mut s = session(Money::from_major(12), 1);
        s.proceed_to_payment().unwrap();
        s.add_payment(PaymentType::Cash, Money::from_major(10)).unwrap();

        match s.clone().complete(now) {
            Err(CoreError::PaymentIncomplete { remaining }) => {
                assert_eq!(remaining, Money::from_cents(320))
            }
            other => panic!("expected PaymentIncomplete, got {:?}", other),
        }

        s.add_remaining(PaymentType::Card, now).unwrap();
        let done = s.complete(now).unwrap();
        assert_eq!(done.step(), CheckoutStep::Confirmation);
        assert_eq!(done.payments.len(), 2);
        assert_eq!(done.totals.grand_total, Money::from_cents(1320));
        assert!(done.coupon_id.is_none());
    }

    #[test]
    fn test_complete_carries_coupon() {
        let now = Utc::now();
        let mut s = session(Money::from_major(25), 1);
        s.apply_coupon("save5", now).unwrap();
        s.proceed_to_payment().unwrap();
        s.pay_in_full(PaymentType::Wallet, now).unwrap();
        assert!(s.is_paid(now));

        let done = s.complete(now).unwrap();
        assert_eq!(done.coupon_id.as_deref(), Some("coupon-2"));
        assert_eq!(done.coupon_code.as_deref(), Some("SAVE5"));
        assert_eq!(done.totals.total_discount, Money::from_major(5));
        assert_eq!(done.totals.grand_total, Money::from_major(22));
        assert!(done.change_due.is_zero());
    }
}
