//! # Settings Repository
//!
//! Receipt settings, stored as one (possibly partial) JSON object.
//! Fields missing from the stored blob read back as their defaults.

use chrono::Local;
use sqlx::SqlitePool;
use tracing::info;

use crate::error::DbResult;
use crate::kv::{self, keys};
use till_core::receipt::{render_text_receipt, ReceiptSettings, ReceiptSettingsPatch};
use till_core::Order;

#[derive(Debug, Clone)]
pub struct SettingsRepository {
    pool: SqlitePool,
}

impl SettingsRepository {
    /// Creates a new SettingsRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SettingsRepository { pool }
    }

    /// Current settings merged over the defaults.
    pub async fn receipt_settings(&self) -> DbResult<ReceiptSettings> {
        kv::read_or_else(&self.pool, keys::RECEIPT_SETTINGS, ReceiptSettings::default).await
    }

    /// Merges `patch` into the current settings and stores the result.
    pub async fn save_receipt_settings(&self, patch: ReceiptSettingsPatch) -> DbResult<ReceiptSettings> {
        let updated = self.receipt_settings().await?.merge(patch);
        kv::write(&self.pool, keys::RECEIPT_SETTINGS, &updated).await?;

        info!(business = %updated.business_name, "Receipt settings saved");
        Ok(updated)
    }

    /// Drops the stored settings; returns the defaults now in effect.
    pub async fn reset_receipt_settings(&self) -> DbResult<ReceiptSettings> {
        kv::remove(&self.pool, keys::RECEIPT_SETTINGS).await?;
        info!("Receipt settings reset");
        Ok(ReceiptSettings::default())
    }

    /// Printable receipt for `order` using the stored settings and local time.
    pub async fn render_receipt(&self, order: &Order, base_url: &str) -> DbResult<String> {
        let settings = self.receipt_settings().await?;
        Ok(render_text_receipt(order, &settings, base_url, &Local))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::Utc;
    use till_core::order::build_order;
    use till_core::{Money, OrderItem, TaxRate};

    async fn repo() -> SettingsRepository {
        Database::new(DbConfig::in_memory()).await.unwrap().settings()
    }

    #[tokio::test]
    async fn test_save_merges_and_reset_restores() {
        let repo = repo().await;
        assert_eq!(repo.receipt_settings().await.unwrap(), ReceiptSettings::default());

        let saved = repo
            .save_receipt_settings(ReceiptSettingsPatch {
                business_name: Some("Corner Cafe".into()),
                show_qr_code: Some(false),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(saved.business_name, "Corner Cafe");
        assert_eq!(saved.currency, "$");

        let saved = repo
            .save_receipt_settings(ReceiptSettingsPatch {
                currency: Some("€".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(saved.business_name, "Corner Cafe");
        assert!(!saved.show_qr_code);
        assert_eq!(repo.receipt_settings().await.unwrap(), saved);

        assert_eq!(repo.reset_receipt_settings().await.unwrap(), ReceiptSettings::default());
        assert_eq!(repo.receipt_settings().await.unwrap(), ReceiptSettings::default());
    }

    #[tokio::test]
    async fn test_partial_stored_blob() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        kv::write(db.pool(), keys::RECEIPT_SETTINGS, &serde_json::json!({"phone": "555"}))
            .await
            .unwrap();

        let settings = db.settings().receipt_settings().await.unwrap();
        assert_eq!(settings.phone, "555");
        assert_eq!(settings.business_name, "Premium POS");
    }

    #[tokio::test]
    async fn test_render_receipt_uses_settings() {
        let repo = repo().await;
        repo.save_receipt_settings(ReceiptSettingsPatch {
            business_name: Some("Corner Cafe".into()),
            ..Default::default()
        })
        .await
        .unwrap();

        let order = build_order(
            "ORD-1".into(),
            vec![OrderItem {
                product_id: "1".into(),
                name: "Premium Coffee".into(),
                sku: None,
                price: Money::from_cents(450),
                quantity: 1,
            }],
            None,
            vec![],
            Money::zero(),
            TaxRate::default(),
            Utc::now(),
        );
        let text = repo.render_receipt(&order, "").await.unwrap();
        assert!(text.contains("CORNER CAFE"));
        assert!(text.contains("$4.95"));
        assert!(!text.contains("/receipt/"));
    }
}
