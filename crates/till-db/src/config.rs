//! # Store Configuration
//!
//! Settings loaded once at startup.
//!
//! ## Configuration Sources (Priority Order)
//! 1. Environment variables (`TILL_*`)
//! 2. Defaults (this file)
//!
//! ## Environment Variables
//! | Variable                | Meaning                          | Default              |
//! |-------------------------|----------------------------------|----------------------|
//! | `TILL_DB_PATH`          | SQLite file                      | `<data dir>/till.db` |
//! | `TILL_TAX_RATE`         | Tax rate in percent (`"8.25"`)   | `10`                 |
//! | `TILL_RECEIPT_BASE_URL` | Origin used in receipt QR links  | empty                |
//! | `TILL_CURRENCY_SYMBOL`  | Symbol for formatted amounts     | `$`                  |
//!
//! Configuration is read-only after initialization.

use std::path::PathBuf;
use std::str::FromStr;

use directories::ProjectDirs;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use till_core::validation::validate_tax_rate_bps;
use till_core::{Money, TaxRate};
use tracing::warn;

use crate::error::{DbError, DbResult};
use crate::pool::DbConfig;

pub const ENV_DB_PATH: &str = "TILL_DB_PATH";
pub const ENV_TAX_RATE: &str = "TILL_TAX_RATE";
pub const ENV_RECEIPT_BASE_URL: &str = "TILL_RECEIPT_BASE_URL";
pub const ENV_CURRENCY_SYMBOL: &str = "TILL_CURRENCY_SYMBOL";

const DB_FILE_NAME: &str = "till.db";

/// Application configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreConfig {
    /// Path to the SQLite database file.
    pub database_path: PathBuf,

    /// Tax applied at checkout.
    pub tax_rate: TaxRate,

    /// Origin for digital-receipt links, e.g. `https://shop.example`.
    /// Empty disables the QR line on printed receipts.
    pub receipt_base_url: String,

    /// Currency symbol (for display)
    pub currency_symbol: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            database_path: default_database_path(),
            tax_rate: TaxRate::default(),
            receipt_base_url: String::new(),
            currency_symbol: "$".to_string(),
        }
    }
}

/// Platform data directory (`ProjectDirs`), or the working directory when
/// the platform has none.
fn default_database_path() -> PathBuf {
    ProjectDirs::from("com", "till", "pos")
        .map(|dirs| dirs.data_dir().join(DB_FILE_NAME))
        .unwrap_or_else(|| PathBuf::from(DB_FILE_NAME))
}

/// Parses a percentage string ("8.25") into basis points.
fn parse_tax_rate(raw: &str) -> Option<TaxRate> {
    let percent = Decimal::from_str(raw.trim()).ok()?;
    if percent.is_sign_negative() {
        return None;
    }
    let bps = (percent * Decimal::ONE_HUNDRED).round().to_u32()?;
    validate_tax_rate_bps(bps).ok()?;
    Some(TaxRate::from_bps(bps))
}

impl StoreConfig {
    /// Creates a StoreConfig from environment variables and defaults.
    ///
    /// Unparseable values are logged and ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`StoreConfig::from_env`] with a custom variable source.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = StoreConfig::default();

        if let Some(path) = lookup(ENV_DB_PATH).filter(|p| !p.trim().is_empty()) {
            config.database_path = PathBuf::from(path);
        }

        if let Some(raw) = lookup(ENV_TAX_RATE) {
            match parse_tax_rate(&raw) {
                Some(rate) => config.tax_rate = rate,
                None => warn!(value = %raw, "Ignoring invalid {}", ENV_TAX_RATE),
            }
        }

        if let Some(url) = lookup(ENV_RECEIPT_BASE_URL) {
            config.receipt_base_url = url.trim().to_string();
        }

        if let Some(symbol) = lookup(ENV_CURRENCY_SYMBOL) {
            config.currency_symbol = symbol;
        }

        config
    }

    /// Pool settings for [`StoreConfig::database_path`].
    ///
    /// Creates the parent directory when it does not exist yet.
    pub fn db_config(&self) -> DbResult<DbConfig> {
        if let Some(parent) = self.database_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    DbError::ConnectionFailed(format!(
                        "cannot create data directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        Ok(DbConfig::new(&self.database_path))
    }

    /// Formats an amount with the configured symbol.
    ///
    /// ## Example
    /// ```rust
    /// use till_core::Money;
    /// use till_db::config::StoreConfig;
    ///
    /// let config = StoreConfig::from_lookup(|_| None);
    /// assert_eq!(config.format_currency(Money::from_cents(1234)), "$12.34");
    /// ```
    pub fn format_currency(&self, amount: Money) -> String {
        amount.format_with(&self.currency_symbol)
    }
}
