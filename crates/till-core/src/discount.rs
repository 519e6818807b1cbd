//! # Discount Engine
//!
//! Computes bulk-quantity and coupon discounts for a cart.
//!
//! ## Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  items ──► subtotal = Σ price × qty                                     │
//! │               │                                                         │
//! │               ├──► bulk:   best rule with minQuantity <= Σ qty          │
//! │               │            amount = subtotal × pct / 100                │
//! │               │                                                         │
//! │               ├──► coupon: validated against the ORIGINAL subtotal      │
//! │               │            applied to (subtotal - bulk)                 │
//! │               │                                                         │
//! │               ▼                                                         │
//! │  final_total = max(0, subtotal - bulk - coupon)                         │
//! │                                                                         │
//! │  Tax is the caller's business: final_total × rate.                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Everything here is pure. Redeeming a coupon (bumping `used_count`) happens
//! in the storage layer when an order is recorded.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cart::{subtotal, total_quantity, CartItem};
use crate::error::CouponRejection;
use crate::money::Money;

// =============================================================================
// Configuration Types
// =============================================================================

/// Percentage off once the cart holds enough units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkDiscountRule {
    pub id: String,
    pub name: String,
    pub min_quantity: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub discount_percentage: Decimal,
}

/// How a coupon's `value` is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscountKind {
    /// `value` is a percentage of the discountable amount.
    Percentage,
    /// `value` is a flat currency amount.
    Fixed,
}

/// The discount a coupon grants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponDiscount {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: DiscountKind,
    #[serde(with = "rust_decimal::serde::float")]
    pub value: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_purchase: Option<Money>,
    /// Cap for percentage coupons.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_discount: Option<Money>,
}

/// A redeemable coupon code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coupon {
    pub id: String,
    pub code: String,
    pub discount: CouponDiscount,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage_limit: Option<u32>,
    #[serde(default)]
    pub used_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    pub is_active: bool,
}

impl Coupon {
    /// Case-insensitive code comparison.
    pub fn matches_code(&self, code: &str) -> bool {
        self.code.trim().eq_ignore_ascii_case(code.trim())
    }

    /// A limit of zero (or none) means unlimited.
    pub fn is_exhausted(&self) -> bool {
        matches!(self.usage_limit, Some(limit) if limit > 0 && self.used_count >= limit)
    }

    /// Label shown on receipts: `"SAVE5 - $5 Off"`.
    pub fn display_name(&self) -> String {
        format!("{} - {}", self.code, self.discount.name)
    }
}

/// Coupons and bulk rules the engine evaluates against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountConfig {
    pub coupons: Vec<Coupon>,
    pub bulk_rules: Vec<BulkDiscountRule>,
}

impl Default for DiscountConfig {
    /// The demo coupon set and bulk rules.
    fn default() -> Self {
        DiscountConfig {
            coupons: default_coupons(),
            bulk_rules: default_bulk_rules(),
        }
    }
}

impl DiscountConfig {
    pub fn find_coupon(&self, code: &str) -> Option<&Coupon> {
        self.coupons.iter().find(|c| c.matches_code(code))
    }
}

// =============================================================================
// Result Types
// =============================================================================

/// Where an applied discount came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscountSource {
    Bulk,
    Coupon,
}

/// One discount line shown on the checkout screen and receipt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppliedDiscount {
    #[serde(rename = "type")]
    pub source: DiscountSource,
    pub name: String,
    pub amount: Money,
}

/// Output of [`calculate_all_discounts`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscountBreakdown {
    pub subtotal: Money,
    pub discounts: Vec<AppliedDiscount>,
    pub total_discount: Money,
    pub final_total: Money,
    /// Set when a coupon code was supplied but could not be applied.
    #[serde(skip)]
    pub rejected_coupon: Option<CouponRejection>,
}

impl DiscountBreakdown {
    /// The coupon line, if a coupon was applied.
    pub fn coupon(&self) -> Option<&AppliedDiscount> {
        self.discounts
            .iter()
            .find(|d| d.source == DiscountSource::Coupon)
    }
}

// =============================================================================
// Bulk Discounts
// =============================================================================

/// Picks the bulk rule that applies to `total_quantity` units.
///
/// Highest percentage wins. Ties go to the larger `min_quantity`, then to
/// the rule listed first.
pub fn best_bulk_rule(rules: &[BulkDiscountRule], total_quantity: u32) -> Option<&BulkDiscountRule> {
    rules
        .iter()
        .filter(|r| r.min_quantity <= total_quantity)
        .fold(None, |best: Option<&BulkDiscountRule>, rule| match best {
            None => Some(rule),
            Some(current) => {
                let better = (rule.discount_percentage, rule.min_quantity)
                    > (current.discount_percentage, current.min_quantity);
                Some(if better { rule } else { current })
            }
        })
}

/// Bulk discount for a cart, with the rule that produced it.
///
/// Returns `(Money::zero(), None)` when no rule applies.
pub fn bulk_discount<'a>(
    items: &[CartItem],
    rules: &'a [BulkDiscountRule],
) -> (Money, Option<&'a BulkDiscountRule>) {
    match best_bulk_rule(rules, total_quantity(items)) {
        Some(rule) => (subtotal(items).percentage(rule.discount_percentage), Some(rule)),
        None => (Money::zero(), None),
    }
}

// =============================================================================
// Coupons
// =============================================================================

/// Looks up and validates a coupon code against a subtotal.
///
/// `subtotal` must be the cart subtotal BEFORE any discount.
pub fn validate_coupon<'a>(
    coupons: &'a [Coupon],
    code: &str,
    subtotal: Money,
    now: DateTime<Utc>,
) -> Result<&'a Coupon, CouponRejection> {
    let coupon = coupons
        .iter()
        .find(|c| c.matches_code(code))
        .ok_or(CouponRejection::NotFound)?;

    if !coupon.is_active {
        return Err(CouponRejection::Inactive);
    }

    if coupon.is_exhausted() {
        return Err(CouponRejection::UsageLimitReached);
    }

    if matches!(coupon.expires_at, Some(expires) if expires < now) {
        return Err(CouponRejection::Expired);
    }

    if let Some(minimum) = coupon.discount.min_purchase {
        if minimum.is_positive() && subtotal < minimum {
            return Err(CouponRejection::BelowMinimum { minimum });
        }
    }

    Ok(coupon)
}

/// Discount a valid coupon grants on `remaining` (subtotal after bulk).
pub fn coupon_discount(coupon: &Coupon, remaining: Money) -> Money {
    let remaining = remaining.non_negative();
    match coupon.discount.kind {
        DiscountKind::Percentage => {
            let amount = remaining.percentage(coupon.discount.value);
            match coupon.discount.max_discount {
                Some(cap) if cap.is_positive() => amount.min(cap),
                _ => amount,
            }
        }
        DiscountKind::Fixed => Money::new(coupon.discount.value).non_negative().min(remaining),
    }
}

// =============================================================================
// Combined
// =============================================================================

/// Runs the full discount pipeline for a cart.
///
/// ## Example
/// ```rust
/// use chrono::Utc;
/// use till_core::discount::{calculate_all_discounts, DiscountConfig};
///
/// let config = DiscountConfig::default();
/// let breakdown = calculate_all_discounts(&[], Some("NOPE"), &config, Utc::now());
/// assert!(breakdown.final_total.is_zero());
/// assert!(breakdown.rejected_coupon.is_some());
/// ```
pub fn calculate_all_discounts(
    items: &[CartItem],
    coupon_code: Option<&str>,
    config: &DiscountConfig,
    now: DateTime<Utc>,
) -> DiscountBreakdown {
    let subtotal = subtotal(items);
    let mut discounts = Vec::new();
    let mut total_discount = Money::zero();
    let mut rejected_coupon = None;

    let (bulk_amount, bulk_rule) = bulk_discount(items, &config.bulk_rules);
    if let Some(rule) = bulk_rule {
        if bulk_amount.is_positive() {
            discounts.push(AppliedDiscount {
                source: DiscountSource::Bulk,
                name: rule.name.clone(),
                amount: bulk_amount,
            });
            total_discount += bulk_amount;
        }
    }

    if let Some(code) = coupon_code.filter(|c| !c.trim().is_empty()) {
        match validate_coupon(&config.coupons, code, subtotal, now) {
            Ok(coupon) => {
                let amount = coupon_discount(coupon, subtotal - total_discount);
                discounts.push(AppliedDiscount {
                    source: DiscountSource::Coupon,
                    name: coupon.display_name(),
                    amount,
                });
                total_discount += amount;
            }
            Err(rejection) => rejected_coupon = Some(rejection),
        }
    }

    DiscountBreakdown {
        subtotal,
        discounts,
        total_discount,
        final_total: (subtotal - total_discount).non_negative(),
        rejected_coupon,
    }
}

// =============================================================================
// Defaults
// =============================================================================

/// Demo coupons: WELCOME10, SAVE5 and VIP20.
pub fn default_coupons() -> Vec<Coupon> {
    vec![
        Coupon {
            id: "coupon-1".to_string(),
            code: "WELCOME10".to_string(),
            discount: CouponDiscount {
                id: "disc-1".to_string(),
                name: "Welcome 10% Off".to_string(),
                kind: DiscountKind::Percentage,
                value: Decimal::from(10),
                min_purchase: Some(Money::from_major(10)),
                max_discount: Some(Money::from_major(50)),
            },
            usage_limit: Some(100),
            used_count: 0,
            expires_at: None,
            is_active: true,
        },
        Coupon {
            id: "coupon-2".to_string(),
            code: "SAVE5".to_string(),
            discount: CouponDiscount {
                id: "disc-2".to_string(),
                name: "$5 Off".to_string(),
                kind: DiscountKind::Fixed,
                value: Decimal::from(5),
                min_purchase: Some(Money::from_major(20)),
                max_discount: None,
            },
            usage_limit: Some(50),
            used_count: 0,
            expires_at: None,
            is_active: true,
        },
        Coupon {
            id: "coupon-3".to_string(),
            code: "VIP20".to_string(),
            discount: CouponDiscount {
                id: "disc-3".to_string(),
                name: "VIP 20% Off".to_string(),
                kind: DiscountKind::Percentage,
                value: Decimal::from(20),
                min_purchase: Some(Money::from_major(50)),
                max_discount: Some(Money::from_major(100)),
            },
            usage_limit: Some(20),
            used_count: 0,
            expires_at: None,
            is_active: true,
        },
    ]
}

/// Demo bulk rules: 3+ units for 5% off, 5+ units for 10% off.
pub fn default_bulk_rules() -> Vec<BulkDiscountRule> {
    vec![
        BulkDiscountRule {
            id: "bulk-1".to_string(),
            name: "Buy 3+ Get 5% Off".to_string(),
            min_quantity: 3,
            discount_percentage: Decimal::from(5),
        },
        BulkDiscountRule {
            id: "bulk-2".to_string(),
            name: "Buy 5+ Get 10% Off".to_string(),
            min_quantity: 5,
            discount_percentage: Decimal::from(10),
        },
    ]
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Product;
    use chrono::Duration;

    fn line(id: &str, price: Money, quantity: u32) -> CartItem {
        CartItem {
            product: Product {
                id: id.to_string(),
                name: id.to_string(),
                description: None,
                price,
                category: String::new(),
                image: String::new(),
                qr_code: String::new(),
                sku: None,
                stock: None,
                created_at: None,
                updated_at: None,
            },
            quantity,
        }
    }

    fn rule(id: &str, min_quantity: u32, pct: i64) -> BulkDiscountRule {
        BulkDiscountRule {
            id: id.to_string(),
            name: id.to_string(),
            min_quantity,
            discount_percentage: Decimal::from(pct),
        }
    }

    fn no_bulk() -> DiscountConfig {
        DiscountConfig {
            coupons: default_coupons(),
            bulk_rules: Vec::new(),
        }
    }

    #[test]
    fn test_best_rule_picks_highest_percentage() {
        let rules = default_bulk_rules();
        assert_eq!(best_bulk_rule(&rules, 5).unwrap().id, "bulk-2");
        assert_eq!(best_bulk_rule(&rules, 4).unwrap().id, "bulk-1");
        assert!(best_bulk_rule(&rules, 2).is_none());
    }

    #[test]
    fn test_best_rule_tie_break() {
        let rules = vec![rule("low", 2, 10), rule("high", 4, 10), rule("high-dup", 4, 10)];
        assert_eq!(best_bulk_rule(&rules, 10).unwrap().id, "high");
        assert_eq!(best_bulk_rule(&rules, 3).unwrap().id, "low");
    }

    #[test]
    fn test_bulk_plus_fixed_coupon_stack() {
        // $100 subtotal, 10% bulk, SAVE5 → $15 off, $85 left.
        let config = DiscountConfig {
            coupons: default_coupons(),
            bulk_rules: vec![rule("ten", 1, 10)],
        };
        let items = [line("a", Money::from_major(100), 1)];

        let b = calculate_all_discounts(&items, Some("save5"), &config, Utc::now());

        assert_eq!(b.subtotal, Money::from_major(100));
        assert_eq!(b.discounts.len(), 2);
        assert_eq!(b.discounts[0].amount, Money::from_major(10));
        assert_eq!(b.discounts[1].name, "SAVE5 - $5 Off");
        assert_eq!(b.total_discount, Money::from_major(15));
        assert_eq!(b.final_total, Money::from_major(85));
        assert!(b.rejected_coupon.is_none());
    }

    #[test]
    fn test_minimum_purchase_uses_original_subtotal() {
        let items = [line("a", Money::from_cents(1999), 1)];
        let b = calculate_all_discounts(&items, Some("SAVE5"), &no_bulk(), Utc::now());

        assert_eq!(
            b.rejected_coupon,
            Some(CouponRejection::BelowMinimum {
                minimum: Money::from_major(20)
            })
        );
        assert!(b.discounts.is_empty());
        assert_eq!(b.final_total, Money::from_cents(1999));
    }

    #[test]
    fn test_fixed_coupon_clamps_to_remaining() {
        let mut config = no_bulk();
        config.coupons[1].discount.value = Decimal::from(50);
        config.coupons[1].discount.min_purchase = None;
        let items = [line("a", Money::from_major(30), 1)];

        let b = calculate_all_discounts(&items, Some("SAVE5"), &config, Utc::now());

        assert_eq!(b.total_discount, Money::from_major(30));
        assert!(b.final_total.is_zero());
    }

    #[test]
    fn test_percentage_coupon_is_capped() {
        // VIP20 on $1000 → $200, capped at $100.
        let items = [line("a", Money::from_major(1000), 1)];
        let b = calculate_all_discounts(&items, Some("VIP20"), &no_bulk(), Utc::now());
        assert_eq!(b.total_discount, Money::from_major(100));
    }

    #[test]
    fn test_percentage_coupon_applies_after_bulk() {
        // $100 × 3 units, 5% bulk = $15, WELCOME10 on $285 = $28.50.
        let config = DiscountConfig::default();
        let items = [line("a", Money::from_cents(10000), 3)];

        let b = calculate_all_discounts(&items, Some("WELCOME10"), &config, Utc::now());

        assert_eq!(b.discounts[0].amount, Money::from_major(15));
        assert_eq!(b.coupon().unwrap().amount, Money::from_cents(2850));
    }

    #[test]
    fn test_rejection_order() {
        let now = Utc::now();
        let mut coupons = default_coupons();

        assert_eq!(
            validate_coupon(&coupons, "NOPE", Money::from_major(100), now),
            Err(CouponRejection::NotFound)
        );

        coupons[0].is_active = false;
        coupons[0].used_count = 100;
        assert_eq!(
            validate_coupon(&coupons, "welcome10", Money::from_major(100), now),
            Err(CouponRejection::Inactive)
        );

        coupons[0].is_active = true;
        coupons[0].expires_at = Some(now - Duration::days(1));
        assert_eq!(
            validate_coupon(&coupons, "WELCOME10", Money::from_major(100), now),
            Err(CouponRejection::UsageLimitReached)
        );

        coupons[0].used_count = 0;
        assert_eq!(
            validate_coupon(&coupons, "WELCOME10", Money::from_major(100), now),
            Err(CouponRejection::Expired)
        );

        coupons[0].expires_at = Some(now + Duration::days(1));
        assert!(validate_coupon(&coupons, "WELCOME10", Money::from_major(100), now).is_ok());
    }

    #[test]
    fn test_zero_usage_limit_is_unlimited() {
        let mut coupons = default_coupons();
        coupons[1].usage_limit = Some(0);
        coupons[1].used_count = 1_000;
        assert!(validate_coupon(&coupons, "SAVE5", Money::from_major(20), Utc::now()).is_ok());
    }

    #[test]
    fn test_no_bulk_entry_for_zero_amount() {
        let config = DiscountConfig {
            coupons: Vec::new(),
            bulk_rules: vec![rule("zero", 1, 0)],
        };
        let items = [line("a", Money::from_major(10), 2)];
        let b = calculate_all_discounts(&items, None, &config, Utc::now());
        assert!(b.discounts.is_empty());
    }

    #[test]
    fn test_huge_quantities_still_pick_bulk_rule() {
        let config = DiscountConfig {
            coupons: Vec::new(),
            bulk_rules: vec![rule("big", 5, 15)],
        };
        let items = [
            line("a", Money::from_major(1), u32::MAX),
            line("b", Money::from_major(1), 1),
        ];
        assert_eq!(total_quantity(&items), u32::MAX);

        let b = calculate_all_discounts(&items, None, &config, Utc::now());
        assert_eq!(b.discounts.len(), 1);
        assert_eq!(b.discounts[0].name, "big");
        assert!(b.final_total < b.subtotal);
    }

    #[test]
    fn test_empty_code_is_ignored() {
        let items = [line("a", Money::from_major(10), 1)];
        let b = calculate_all_discounts(&items, Some("  "), &no_bulk(), Utc::now());
        assert!(b.rejected_coupon.is_none());
    }

    #[test]
    fn test_coupon_json_shape() {
        let json = serde_json::to_value(&default_coupons()[1]).unwrap();
        assert_eq!(json["code"], "SAVE5");
        assert_eq!(json["discount"]["type"], "fixed");
        assert_eq!(json["usedCount"], 0);
        assert_eq!(json["isActive"], true);
    }
}
