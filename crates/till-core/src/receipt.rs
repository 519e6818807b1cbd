//! # Receipts
//!
//! Receipt settings and the printable receipt built from a recorded order.
//!
//! ## Receipt Layout (32 columns, 80mm roll)
//! ```text
//! ┌────────────────────────────────┐
//! │          PREMIUM POS           │
//! │        *** RECEIPT ***         │
//! │   123 Business Street, City    │
//! │         +1 234 567 890         │
//! │--------------------------------│
//! │Order: ORD-M2X9K1-4F7QA         │
//! │2026-10-16 15:30                │
//! │--------------------------------│
//! │Premium Coffee                  │
//! │  2 x $4.50                $9.00│
//! │--------------------------------│
//! │Subtotal:                  $9.00│
//! │Tax (10%):                 $0.90│
//! │TOTAL:                     $9.90│
//! │Cash:                      $9.90│
//! │                                │
//! │  Thank you for your purchase!  │
//! └────────────────────────────────┘
//! ```

use std::fmt::Display;

use chrono::TimeZone;
use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::types::Order;

/// Character width of a thermal receipt line.
pub const RECEIPT_WIDTH: usize = 32;

// =============================================================================
// Settings
// =============================================================================

/// Business details printed on every receipt.
///
/// Missing fields in a stored blob fall back to the defaults, so older
/// blobs keep working as fields are added.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReceiptSettings {
    pub business_name: String,
    /// Base64 data URI or URL; empty for none.
    pub business_logo: String,
    pub address: String,
    pub phone: String,
    pub footer_text: String,
    #[serde(rename = "showQRCode")]
    pub show_qr_code: bool,
    pub currency: String,
    pub tax_label: String,
}

impl Default for ReceiptSettings {
    fn default() -> Self {
        ReceiptSettings {
            business_name: "Premium POS".to_string(),
            business_logo: String::new(),
            address: "123 Business Street, City".to_string(),
            phone: "+1 234 567 890".to_string(),
            footer_text: "Thank you for your purchase!\nVisit us again soon.".to_string(),
            show_qr_code: true,
            currency: "$".to_string(),
            tax_label: "Tax (10%)".to_string(),
        }
    }
}

/// Partial settings update. `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptSettingsPatch {
    pub business_name: Option<String>,
    pub business_logo: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub footer_text: Option<String>,
    #[serde(rename = "showQRCode")]
    pub show_qr_code: Option<bool>,
    pub currency: Option<String>,
    pub tax_label: Option<String>,
}

impl ReceiptSettings {
    pub fn merge(mut self, patch: ReceiptSettingsPatch) -> Self {
        if let Some(v) = patch.business_name {
            self.business_name = v;
        }
        if let Some(v) = patch.business_logo {
            self.business_logo = v;
        }
        if let Some(v) = patch.address {
            self.address = v;
        }
        if let Some(v) = patch.phone {
            self.phone = v;
        }
        if let Some(v) = patch.footer_text {
            self.footer_text = v;
        }
        if let Some(v) = patch.show_qr_code {
            self.show_qr_code = v;
        }
        if let Some(v) = patch.currency {
            self.currency = v;
        }
        if let Some(v) = patch.tax_label {
            self.tax_label = v;
        }
        self
    }
}

// =============================================================================
// QR Payload
// =============================================================================

/// Digital-receipt link encoded in the receipt QR code.
///
/// ## Example
/// ```rust
/// use till_core::money::Money;
/// use till_core::receipt::receipt_qr_payload;
///
/// let payload = receipt_qr_payload("https://shop.example", "ORD-1", Money::from_cents(990));
/// assert_eq!(payload, "https://shop.example/receipt/ORD-1?total=9.90");
/// ```
pub fn receipt_qr_payload(base_url: &str, order_id: &str, total: Money) -> String {
    format!(
        "{}/receipt/{}?total={}",
        base_url.trim_end_matches('/'),
        order_id,
        total.format_with("")
    )
}

// =============================================================================
// Text Rendering
// =============================================================================

fn center(text: &str) -> String {
    let len = text.chars().count();
    if len >= RECEIPT_WIDTH {
        return text.to_string();
    }
    let pad = (RECEIPT_WIDTH - len) / 2;
    format!("{}{}", " ".repeat(pad), text).trim_end().to_string()
}

/// `left` and `right` on one line, right-aligned to the receipt width.
fn spread(left: &str, right: &str) -> String {
    let used = left.chars().count() + right.chars().count();
    let gap = RECEIPT_WIDTH.saturating_sub(used).max(1);
    format!("{}{}{}", left, " ".repeat(gap), right)
}

fn rule() -> String {
    "-".repeat(RECEIPT_WIDTH)
}

/// Renders a plain-text receipt for a recorded order.
///
/// Times are shown in `tz`. The QR payload line is included only when the
/// settings ask for it and a base URL is configured.
pub fn render_text_receipt<Tz>(order: &Order, settings: &ReceiptSettings, base_url: &str, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let money = |m: Money| m.format_with(&settings.currency);
    let mut lines = Vec::new();

    lines.push(center(&settings.business_name.to_uppercase()));
    lines.push(center("*** RECEIPT ***"));
    if !settings.address.is_empty() {
        lines.push(center(&settings.address));
    }
    if !settings.phone.is_empty() {
        lines.push(center(&settings.phone));
    }

    lines.push(rule());
    lines.push(format!("Order: {}", order.id));
    lines.push(
        order
            .created_at
            .with_timezone(tz)
            .format("%Y-%m-%d %H:%M")
            .to_string(),
    );
    if let Some(customer) = &order.customer {
        lines.push(format!("Customer: {}", customer.name));
    }

    lines.push(rule());
    for item in &order.items {
        lines.push(item.name.clone());
        lines.push(spread(
            &format!("  {} x {}", item.quantity, money(item.price)),
            &money(item.line_total()),
        ));
    }

    lines.push(rule());
    lines.push(spread("Subtotal:", &money(order.subtotal)));
    if order.discount.is_positive() {
        lines.push(spread("Discount:", &format!("-{}", money(order.discount))));
    }
    lines.push(spread(&format!("{}:", settings.tax_label), &money(order.tax)));
    lines.push(spread("TOTAL:", &money(order.total)));
    for payment in &order.payments {
        lines.push(spread(&format!("{}:", payment.payment_type), &money(payment.amount)));
    }
    let change = (order.total_paid() - order.total).non_negative();
    if change.round_to_cents().is_positive() {
        lines.push(spread("Change:", &money(change)));
    }

    if !settings.footer_text.is_empty() {
        lines.push(String::new());
        lines.extend(settings.footer_text.lines().map(center));
    }

    if settings.show_qr_code && !base_url.is_empty() {
        lines.push(String::new());
        lines.push(center("Scan for digital receipt"));
        lines.push(receipt_qr_payload(base_url, &order.id, order.total));
    }

    lines.join("\n")
}

// =============================================================================
// Unit Tests
// =============================================================================
