//! # till-db: Storage Layer for Till POS
//!
//! Local persistence for the till. Every collection is a JSON document in
//! a single SQLite key-value table; repositories load a document, apply a
//! `till_core` rule and write it back.
//!
//! ## Modules
//!
//! - [`pool`] - Connection pool and the [`Database`] handle
//! - [`kv`] - Blob read/write helpers and key names
//! - [`repository`] - Catalog, discount, order, settings, customer repositories
//! - [`config`] - [`StoreConfig`] loaded from `TILL_*` environment variables
//! - [`migrations`] - Embedded schema migrations
//! - [`error`] - [`DbError`] and [`DbResult`]
//!
//! ## Example
//! ```rust,ignore
//! use till_db::{Database, StoreConfig};
//!
//! let config = StoreConfig::from_env();
//! let db = Database::new(config.db_config()?).await?;
//! db.catalog().initialize().await?;
//! db.discounts().initialize().await?;
//!
//! let summary = db.orders().sales_summary().await?;
//! println!("Today: {}", config.format_currency(summary.today_revenue));
//! ```

pub mod config;
pub mod error;
pub mod kv;
pub mod migrations;
pub mod pool;
pub mod repository;

pub use config::StoreConfig;
pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use repository::catalog::CatalogRepository;
pub use repository::customer::CustomerRepository;
pub use repository::discount::DiscountRepository;
pub use repository::order::OrderRepository;
pub use repository::settings::SettingsRepository;
