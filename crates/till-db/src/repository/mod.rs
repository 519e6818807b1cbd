//! # Repository Module
//!
//! Repository implementations for Till POS.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  Caller                                                                │
//! │       │                                                                 │
//! │       │  db.catalog().search_products("coffee")                        │
//! │       ▼                                                                 │
//! │  CatalogRepository                                                     │
//! │  ├── read blob  ──► Vec<Product>                                       │
//! │  ├── till_core rule (search, patch, import...)                         │
//! │  └── write blob (mutations only)                                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  kv_store table (SQLite)                                               │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`CatalogRepository`](catalog::CatalogRepository) - Products, categories, import/export
//! - [`DiscountRepository`](discount::DiscountRepository) - Coupons and bulk rules
//! - [`OrderRepository`](order::OrderRepository) - Order log, checkout recording, reports
//! - [`SettingsRepository`](settings::SettingsRepository) - Receipt settings
//! - [`CustomerRepository`](customer::CustomerRepository) - Customers and recent list

pub mod catalog;
pub mod customer;
pub mod discount;
pub mod order;
pub mod settings;
