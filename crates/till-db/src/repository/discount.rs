//! # Discount Repository
//!
//! Coupons and bulk discount rules.
//!
//! Pricing itself lives in `till_core::discount`; this repository only
//! loads the configuration the engine evaluates and bumps `usedCount` when a
//! coupon is redeemed.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};

use crate::error::DbResult;
use crate::kv::{self, keys};
use till_core::discount::{
    self, default_bulk_rules, default_coupons, BulkDiscountRule, Coupon, DiscountConfig,
};
use till_core::{CoreError, Money};

/// Repository for coupons and bulk rules.
#[derive(Debug, Clone)]
pub struct DiscountRepository {
    pool: SqlitePool,
}

impl DiscountRepository {
    /// Creates a new DiscountRepository.
    pub fn new(pool: SqlitePool) -> Self {
        DiscountRepository { pool }
    }

    /// Stores the demo coupons and bulk rules where nothing is stored yet.
    pub async fn initialize(&self) -> DbResult<()> {
        if !kv::exists(&self.pool, keys::COUPONS).await? {
            info!("Seeding default coupons");
            kv::write(&self.pool, keys::COUPONS, &default_coupons()).await?;
        }
        if !kv::exists(&self.pool, keys::BULK_RULES).await? {
            info!("Seeding default bulk rules");
            kv::write(&self.pool, keys::BULK_RULES, &default_bulk_rules()).await?;
        }
        Ok(())
    }

    pub async fn list_coupons(&self) -> DbResult<Vec<Coupon>> {
        kv::read_or_else(&self.pool, keys::COUPONS, default_coupons).await
    }

    /// Replaces the whole coupon set.
    pub async fn save_coupons(&self, coupons: &[Coupon]) -> DbResult<()> {
        kv::write(&self.pool, keys::COUPONS, coupons).await
    }

    /// Case-insensitive lookup by code.
    pub async fn get_coupon_by_code(&self, code: &str) -> DbResult<Option<Coupon>> {
        let coupons = self.list_coupons().await?;
        Ok(coupons.into_iter().find(|c| c.matches_code(code)))
    }

    pub async fn list_bulk_rules(&self) -> DbResult<Vec<BulkDiscountRule>> {
        kv::read_or_else(&self.pool, keys::BULK_RULES, default_bulk_rules).await
    }

    pub async fn save_bulk_rules(&self, rules: &[BulkDiscountRule]) -> DbResult<()> {
        kv::write(&self.pool, keys::BULK_RULES, rules).await
    }

    /// Everything the discount engine needs for one checkout.
    pub async fn config(&self) -> DbResult<DiscountConfig> {
        Ok(DiscountConfig {
            coupons: self.list_coupons().await?,
            bulk_rules: self.list_bulk_rules().await?,
        })
    }

    /// Validates `code` against a pre-discount subtotal, right now.
    pub async fn validate_coupon(&self, code: &str, subtotal: Money) -> DbResult<Coupon> {
        let coupons = self.list_coupons().await?;
        let coupon = discount::validate_coupon(&coupons, code, subtotal, Utc::now())
            .map_err(CoreError::from)?;
        Ok(coupon.clone())
    }

    /// Increments `usedCount` of the coupon with `coupon_id`.
    ///
    /// Returns `false` (and writes nothing) when no coupon has that id.
    pub async fn redeem(&self, coupon_id: &str) -> DbResult<bool> {
        let mut conn = self.pool.acquire().await?;
        redeem_coupon(&mut conn, coupon_id).await
    }
}

/// Read-modify-write of the coupon blob on one connection, so callers can
/// run it inside their own transaction.
pub(crate) async fn redeem_coupon(conn: &mut SqliteConnection, coupon_id: &str) -> DbResult<bool> {
    let mut coupons: Vec<Coupon> =
        kv::read_or_else(&mut *conn, keys::COUPONS, default_coupons).await?;

    let Some(coupon) = coupons.iter_mut().find(|c| c.id == coupon_id) else {
        warn!(coupon_id, "Redeemed coupon no longer exists");
        return Ok(false);
    };
    coupon.used_count = coupon.used_count.saturating_add(1);
    debug!(coupon_id, used_count = coupon.used_count, "Coupon redeemed");

    kv::write(&mut *conn, keys::COUPONS, &coupons).await?;
    Ok(true)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use crate::pool::{Database, DbConfig};
    use till_core::CouponRejection;

    async fn repo() -> DiscountRepository {
        Database::new(DbConfig::in_memory()).await.unwrap().discounts()
    }

    #[tokio::test]
    async fn test_defaults() {
        let repo = repo().await;
        let config = repo.config().await.unwrap();
        assert_eq!(config, DiscountConfig::default());

        let coupon = repo.get_coupon_by_code("save5").await.unwrap().unwrap();
        assert_eq!(coupon.id, "coupon-2");
    }

    #[tokio::test]
    async fn test_redeem_increments_used_count() {
        let repo = repo().await;
        repo.initialize().await.unwrap();

        assert!(repo.redeem("coupon-1").await.unwrap());
        assert!(repo.redeem("coupon-1").await.unwrap());
        assert!(!repo.redeem("nope").await.unwrap());

        let coupon = repo.get_coupon_by_code("WELCOME10").await.unwrap().unwrap();
        assert_eq!(coupon.used_count, 2);
    }

    #[tokio::test]
    async fn test_usage_limit_is_enforced() {
        let repo = repo().await;
        let mut coupons = default_coupons();
        coupons[1].usage_limit = Some(1);
        repo.save_coupons(&coupons).await.unwrap();

        let subtotal = Money::from_major(30);
        assert!(repo.validate_coupon("SAVE5", subtotal).await.is_ok());

        repo.redeem("coupon-2").await.unwrap();
        let err = repo.validate_coupon("SAVE5", subtotal).await.unwrap_err();
        assert!(matches!(
            err,
            DbError::Core(CoreError::Coupon(CouponRejection::UsageLimitReached))
        ));
    }

    #[tokio::test]
    async fn test_save_bulk_rules() {
        let repo = repo().await;
        let mut rules = default_bulk_rules();
        rules.truncate(1);
        repo.save_bulk_rules(&rules).await.unwrap();
        assert_eq!(repo.list_bulk_rules().await.unwrap(), rules);
    }
}
