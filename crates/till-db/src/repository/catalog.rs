//! # Catalog Repository
//!
//! Products and categories, each stored as one JSON array.
//!
//! ## Key Operations
//! - CRUD for products and categories
//! - Search, category filter and scanner lookup
//! - JSON/CSV import (all-or-nothing) and export
//!
//! ## Defaults
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  key absent      ──► reads return the default catalog (not stored)     │
//! │  initialize()    ──► stores the defaults if the key is absent          │
//! │  reset_*()       ──► overwrites with the defaults                      │
//! │  corrupt JSON    ──► reads return the defaults, warn! is logged        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::kv::{self, keys};
use till_core::catalog::{
    self, default_categories, default_products, new_category, CategoryPatch, ProductDraft,
    ProductPatch,
};
use till_core::interchange::{self, ImportFormat, ImportMode};
use till_core::{Category, CoreError, Product};

/// Repository for the product catalog and categories.
#[derive(Debug, Clone)]
pub struct CatalogRepository {
    pool: SqlitePool,
}

impl CatalogRepository {
    /// Creates a new CatalogRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CatalogRepository { pool }
    }

    /// Stores the default products and categories where nothing is stored yet.
    ///
    /// Existing data (even an empty list) is left alone.
    pub async fn initialize(&self) -> DbResult<()> {
        if !kv::exists(&self.pool, keys::PRODUCTS).await? {
            info!("Seeding default products");
            kv::write(&self.pool, keys::PRODUCTS, &default_products()).await?;
        }
        if !kv::exists(&self.pool, keys::CATEGORIES).await? {
            info!("Seeding default categories");
            kv::write(&self.pool, keys::CATEGORIES, &default_categories()).await?;
        }
        Ok(())
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// All products in stored order.
    pub async fn list_products(&self) -> DbResult<Vec<Product>> {
        kv::read_or_else(&self.pool, keys::PRODUCTS, default_products).await
    }

    async fn save_products(&self, products: &[Product]) -> DbResult<()> {
        kv::write(&self.pool, keys::PRODUCTS, products).await
    }

    /// Gets a product by id.
    pub async fn get_product(&self, id: &str) -> DbResult<Option<Product>> {
        let products = self.list_products().await?;
        Ok(products.into_iter().find(|p| p.id == id))
    }

    /// Validates and appends a new product.
    ///
    /// ## Example
    /// ```rust,ignore
    /// let product = db.catalog().add_product(ProductDraft {
    ///     name: "Flat White".into(),
    ///     price: Money::from_cents(480),
    ///     ..Default::default()
    /// }).await?;
    /// ```
    pub async fn add_product(&self, draft: ProductDraft) -> DbResult<Product> {
        let product = draft.into_product(Utc::now())?;

        let mut products = self.list_products().await?;
        products.push(product.clone());
        self.save_products(&products).await?;

        info!(id = %product.id, name = %product.name, "Product added");
        Ok(product)
    }

    /// Applies a partial update.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - no product has this id
    /// * `Err(DbError::Core)` - the patch failed validation; nothing written
    pub async fn update_product(&self, id: &str, patch: ProductPatch) -> DbResult<Product> {
        let mut products = self.list_products().await?;
        let product = products
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| DbError::not_found("Product", id))?;

        patch.apply(product, Utc::now())?;
        let updated = product.clone();
        self.save_products(&products).await?;

        debug!(id = %id, "Product updated");
        Ok(updated)
    }

    /// Removes a product. Returns `false` when the id is unknown.
    pub async fn delete_product(&self, id: &str) -> DbResult<bool> {
        let mut products = self.list_products().await?;
        let before = products.len();
        products.retain(|p| p.id != id);

        if products.len() == before {
            return Ok(false);
        }

        self.save_products(&products).await?;
        info!(id = %id, "Product deleted");
        Ok(true)
    }

    /// Products whose category equals `category` exactly.
    pub async fn products_by_category(&self, category: &str) -> DbResult<Vec<Product>> {
        let products = self.list_products().await?;
        Ok(catalog::by_category(&products, category)
            .into_iter()
            .cloned()
            .collect())
    }

    /// Case-insensitive search over name, description and SKU.
    pub async fn search_products(&self, query: &str) -> DbResult<Vec<Product>> {
        debug!(query = %query, "Searching products");
        let products = self.list_products().await?;
        Ok(catalog::search(&products, query).into_iter().cloned().collect())
    }

    /// Looks up a scanned QR payload (or a bare product id).
    pub async fn find_by_scan(&self, scanned: &str) -> DbResult<Option<Product>> {
        let products = self.list_products().await?;
        Ok(catalog::find_by_scan(&products, scanned).cloned())
    }

    /// Overwrites the catalog with the default products.
    pub async fn reset_products(&self) -> DbResult<()> {
        info!("Resetting products to defaults");
        self.save_products(&default_products()).await
    }

    // =========================================================================
    // Import / Export
    // =========================================================================

    /// Parses, validates and applies a catalog file.
    ///
    /// The first invalid record aborts the import and the stored catalog is
    /// untouched. Returns the number of imported records.
    pub async fn import_products(
        &self,
        content: &str,
        format: ImportFormat,
        mode: ImportMode,
    ) -> DbResult<usize> {
        let incoming = interchange::parse_products(content, format, Utc::now())
            .map_err(CoreError::from)?;
        let count = incoming.len();

        let existing = match mode {
            ImportMode::Merge => self.list_products().await?,
            ImportMode::Replace => Vec::new(),
        };
        let merged = interchange::apply_import(existing, incoming, mode);
        self.save_products(&merged).await?;

        info!(count, ?mode, total = merged.len(), "Products imported");
        Ok(count)
    }

    /// Catalog as pretty-printed JSON.
    pub async fn export_json(&self) -> DbResult<String> {
        let products = self.list_products().await?;
        Ok(interchange::export_json(&products)?)
    }

    /// Catalog as CSV with a header row.
    pub async fn export_csv(&self) -> DbResult<String> {
        let products = self.list_products().await?;
        Ok(interchange::export_csv(&products))
    }

    // =========================================================================
    // Categories
    // =========================================================================

    pub async fn list_categories(&self) -> DbResult<Vec<Category>> {
        kv::read_or_else(&self.pool, keys::CATEGORIES, default_categories).await
    }

    async fn save_categories(&self, categories: &[Category]) -> DbResult<()> {
        kv::write(&self.pool, keys::CATEGORIES, categories).await
    }

    pub async fn get_category(&self, id: &str) -> DbResult<Option<Category>> {
        let categories = self.list_categories().await?;
        Ok(categories.into_iter().find(|c| c.id == id))
    }

    /// Case-insensitive lookup by name.
    pub async fn get_category_by_name(&self, name: &str) -> DbResult<Option<Category>> {
        let categories = self.list_categories().await?;
        Ok(catalog::find_category_by_name(&categories, name).cloned())
    }

    /// Appends a category; `color` defaults to gray.
    pub async fn add_category(&self, name: &str, color: Option<&str>) -> DbResult<Category> {
        let category = new_category(name, color, Utc::now())?;

        let mut categories = self.list_categories().await?;
        categories.push(category.clone());
        self.save_categories(&categories).await?;

        info!(id = %category.id, name = %category.name, "Category added");
        Ok(category)
    }

    pub async fn update_category(&self, id: &str, patch: CategoryPatch) -> DbResult<Category> {
        let mut categories = self.list_categories().await?;
        let category = categories
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| DbError::not_found("Category", id))?;

        patch.apply(category)?;
        let updated = category.clone();
        self.save_categories(&categories).await?;
        Ok(updated)
    }

    /// Removes a category. Products keep their category name.
    pub async fn delete_category(&self, id: &str) -> DbResult<bool> {
        let mut categories = self.list_categories().await?;
        let before = categories.len();
        categories.retain(|c| c.id != id);

        if categories.len() == before {
            return Ok(false);
        }

        self.save_categories(&categories).await?;
        info!(id = %id, "Category deleted");
        Ok(true)
    }

    pub async fn reset_categories(&self) -> DbResult<()> {
        info!("Resetting categories to defaults");
        self.save_categories(&default_categories()).await
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
