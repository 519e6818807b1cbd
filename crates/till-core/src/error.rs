//! # Error Types
//!
//! Domain-specific error types for till-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  till-core errors (this file)                                          │
//! │  ├── CoreError        - General domain errors                          │
//! │  ├── ValidationError  - Input validation failures                      │
//! │  ├── CouponRejection  - Why a coupon code cannot be applied            │
//! │  └── ImportError      - Catalog import file problems                   │
//! │                                                                         │
//! │  till-db errors (separate crate)                                       │
//! │  └── DbError          - Storage failures, wraps CoreError              │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → caller                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (id, field, index)
//! 3. Errors are enum variants, never String
//! 4. Each error variant maps to a user-facing message

use thiserror::Error;

use crate::money::Money;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent business rule violations. None of them are fatal:
/// the rejected operation leaves prior state untouched.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Product cannot be found.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Category cannot be found.
    #[error("Category not found: {0}")]
    CategoryNotFound(String),

    /// Product is not in the cart.
    #[error("Product {0} not in cart")]
    NotInCart(String),

    /// Checkout started with nothing to sell.
    #[error("Cart is empty")]
    EmptyCart,

    /// Cart has exceeded maximum allowed lines.
    #[error("Cart cannot have more than {max} items")]
    CartTooLarge { max: usize },

    /// Item quantity exceeds maximum allowed.
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: u64, max: u32 },

    /// Checkout action attempted in the wrong step.
    ///
    /// ## When This Occurs
    /// - Adding a payment while still on the details step
    /// - Completing a checkout twice
    #[error("Checkout is in the {actual} step, expected {expected}")]
    InvalidCheckoutStep {
        expected: &'static str,
        actual: &'static str,
    },

    /// Completion attempted before payments cover the grand total.
    #[error("Payment incomplete: {remaining} remaining")]
    PaymentIncomplete { remaining: Money },

    /// No split payment at the given position.
    #[error("No payment at position {0}")]
    PaymentNotFound(usize),

    /// Payment amount is invalid.
    #[error("Invalid payment amount: {reason}")]
    InvalidPaymentAmount { reason: String },

    /// Coupon code was rejected.
    #[error(transparent)]
    Coupon(#[from] CouponRejection),

    /// Import file was rejected.
    #[error("Import failed: {0}")]
    Import(#[from] ImportError),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// Used for early validation before business logic runs.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must be zero or more.
    #[error("{field} cannot be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format (e.g., a coupon code with spaces).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Coupon Rejection
// =============================================================================

/// Why a coupon code cannot be applied.
///
/// ## Check Order
/// ```text
/// code ──► NotFound ──► Inactive ──► UsageLimitReached ──► Expired ──► BelowMinimum ──► ✓
/// ```
/// The first failing check wins. The minimum purchase is compared against
/// the subtotal BEFORE any bulk discount.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum CouponRejection {
    #[error("Coupon not found")]
    NotFound,

    #[error("Coupon is no longer active")]
    Inactive,

    #[error("Coupon usage limit reached")]
    UsageLimitReached,

    #[error("Coupon has expired")]
    Expired,

    #[error("Minimum purchase of {minimum} required")]
    BelowMinimum { minimum: Money },
}

// =============================================================================
// Import Error
// =============================================================================

/// Catalog import failures.
///
/// The first failure aborts the whole import; nothing is written.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ImportError {
    #[error("Failed to parse file: {0}")]
    Malformed(String),

    #[error("Invalid format: expected an array of products")]
    NotAnArray,

    #[error("CSV file must have a header row and at least one data row")]
    MissingRows,

    #[error("Missing required column: {0}")]
    MissingColumn(String),

    #[error("Product at index {index} is missing 'name' field")]
    MissingName { index: usize },

    #[error("Product \"{name}\" has invalid price")]
    InvalidPrice { name: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
