//! # till-core: Pure Business Logic for Till POS
//!
//! This crate is the **heart** of Till POS. It contains all pricing, checkout
//! and reporting rules as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Till POS Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  Front end (any: TUI, web, kiosk)               │   │
//! │  │    Catalog ──► Cart ──► Checkout ──► Receipt ──► Admin          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ till-core (THIS CRATE) ★                        │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────────┐          │   │
//! │  │   │  money   │ │   cart   │ │ discount │ │ checkout │          │   │
//! │  │   │  types   │ │ catalog  │ │  report  │ │  order   │          │   │
//! │  │   └──────────┘ └──────────┘ └──────────┘ └──────────┘          │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────────┐          │   │
//! │  │   │interchange│ │ receipt  │ │ customer │ │validation│         │   │
//! │  │   └──────────┘ └──────────┘ └──────────┘ └──────────┘          │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO CLOCK READS IN RULES               │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    till-db (Storage Layer)                      │   │
//! │  │        SQLite key-value blobs, repositories, configuration      │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Exact decimal `Money` type
//! - [`types`] - Domain types (Product, Order, Payment, etc.)
//! - [`cart`] - In-memory shopping cart
//! - [`discount`] - Bulk and coupon discount engine
//! - [`checkout`] - Checkout session and split payments
//! - [`order`] - Order construction from a finished checkout
//! - [`report`] - Revenue and best-seller aggregation over the order log
//! - [`catalog`] - Product/category rules, defaults, QR payloads
//! - [`interchange`] - JSON/CSV catalog import and export
//! - [`receipt`] - Receipt settings and text rendering
//! - [`customer`] - Customer directory rules
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: the current time is always passed in
//! 2. **No I/O**: database, network and file system access live in till-db
//! 3. **Exact Money**: decimals end to end, rounded only for display
//! 4. **Explicit Errors**: all errors are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use chrono::Utc;
//! use till_core::cart::Cart;
//! use till_core::catalog::default_products;
//! use till_core::discount::{calculate_all_discounts, DiscountConfig};
//!
//! let products = default_products();
//! let mut cart = Cart::new();
//! cart.add_product(&products[0]).unwrap(); // Premium Coffee, $4.50
//! cart.set_quantity(&products[0].id, 3).unwrap();
//!
//! let config = DiscountConfig::default();
//! let breakdown = calculate_all_discounts(cart.items(), None, &config, Utc::now());
//!
//! // 3 items trigger the "Buy 3+ Get 5% Off" rule
//! assert_eq!(breakdown.subtotal.to_string(), "$13.50");
//! assert_eq!(breakdown.final_total.to_string(), "$12.83");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod customer;
pub mod discount;
pub mod error;
pub mod interchange;
pub mod money;
pub mod order;
pub mod receipt;
pub mod report;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use till_core::Money` instead of
// `use till_core::money::Money`

pub use error::{CoreError, CoreResult, CouponRejection, ImportError, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Default tax rate in basis points (10%).
pub const DEFAULT_TAX_RATE_BPS: u32 = 1000;

/// Maximum lines allowed in a single cart
///
/// ## Business Reason
/// Prevents runaway carts and keeps receipts printable.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single item in cart
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10)
pub const MAX_ITEM_QUANTITY: u32 = 999;

/// How many customers the "recent" list remembers.
pub const MAX_RECENT_CUSTOMERS: usize = 10;
