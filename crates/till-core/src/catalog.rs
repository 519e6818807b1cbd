//! # Catalog
//!
//! Product and category rules: drafts and patches, QR payloads, lookups and
//! the demo catalog. Persistence lives in `till-db`.
//!
//! ## QR Payload Resolution
//! ```text
//! qr_code set? ──yes──► use it
//!      │ no
//!      ▼
//! sku set? ──────yes──► SKU upper-cased             ("cof-01" → "COF-01")
//!      │ no
//!      ▼
//! name set? ─────yes──► "PROD-" + first 10 chars of  ("Green Tea" → "PROD-GREEN-TEA")
//!      │ no              name, spaces → "-", upper
//!      ▼
//! "PROD-<unix millis>"
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::CoreResult;
use crate::money::Money;
use crate::order::random_base36;
use crate::types::{Category, Product, DEFAULT_CATEGORY_COLOR};
use crate::validation::{validate_category_name, validate_price, validate_product_name};

// =============================================================================
// Ids and QR Payloads
// =============================================================================

/// `prod-<millis>-<9 random chars>`.
pub fn generate_product_id(now: DateTime<Utc>) -> String {
    format!("prod-{}-{}", now.timestamp_millis(), random_base36(9).to_lowercase())
}

/// `cat-<millis>-<9 random chars>`.
pub fn generate_category_id(now: DateTime<Utc>) -> String {
    format!("cat-{}-{}", now.timestamp_millis(), random_base36(9).to_lowercase())
}

/// Derives the payload printed on a product's QR label.
///
/// ## Example
/// ```rust
/// use chrono::Utc;
/// use till_core::catalog::generate_qr_code;
///
/// assert_eq!(generate_qr_code(Some("cof-01"), "Coffee", Utc::now()), "COF-01");
/// assert_eq!(generate_qr_code(None, "Green Tea Latte", Utc::now()), "PROD-GREEN-TEA-");
/// ```
pub fn generate_qr_code(sku: Option<&str>, name: &str, now: DateTime<Utc>) -> String {
    if let Some(sku) = sku.filter(|s| !s.is_empty()) {
        return sku.to_uppercase();
    }

    if !name.is_empty() {
        let dashed = name.split_whitespace().collect::<Vec<_>>().join("-");
        // Leading/trailing whitespace also becomes a dash.
        let dashed = match (name.starts_with(char::is_whitespace), name.ends_with(char::is_whitespace)) {
            (true, true) if !dashed.is_empty() => format!("-{}-", dashed),
            (true, _) => format!("-{}", dashed),
            (_, true) => format!("{}-", dashed),
            _ => dashed,
        };
        let head: String = dashed.to_uppercase().chars().take(10).collect();
        return format!("PROD-{}", head);
    }

    format!("PROD-{}", now.timestamp_millis())
}

// =============================================================================
// Product Drafts and Patches
// =============================================================================

/// Fields an operator fills in to create a product.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductDraft {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Money,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub image: String,
    /// Left blank to derive one.
    #[serde(default)]
    pub qr_code: String,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub stock: Option<u32>,
}

impl ProductDraft {
    pub fn validate(&self) -> CoreResult<()> {
        validate_product_name(&self.name)?;
        validate_price(self.price)?;
        Ok(())
    }

    /// Builds a catalog product with a fresh id and timestamps.
    pub fn into_product(self, now: DateTime<Utc>) -> CoreResult<Product> {
        self.validate()?;

        let qr_code = if self.qr_code.is_empty() {
            generate_qr_code(self.sku.as_deref(), &self.name, now)
        } else {
            self.qr_code
        };

        Ok(Product {
            id: generate_product_id(now),
            name: self.name,
            description: self.description,
            price: self.price,
            category: self.category,
            image: self.image,
            qr_code,
            sku: self.sku,
            stock: self.stock,
            created_at: Some(now),
            updated_at: Some(now),
        })
    }
}

/// Partial product update. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Money>,
    pub category: Option<String>,
    pub image: Option<String>,
    pub qr_code: Option<String>,
    pub sku: Option<String>,
    pub stock: Option<u32>,
}

impl ProductPatch {
    /// Applies the patch and bumps `updated_at`.
    ///
    /// Validation runs before anything is written, so a rejected patch leaves
    /// the product untouched.
    pub fn apply(self, product: &mut Product, now: DateTime<Utc>) -> CoreResult<()> {
        if let Some(name) = &self.name {
            validate_product_name(name)?;
        }
        if let Some(price) = self.price {
            validate_price(price)?;
        }

        if let Some(name) = self.name {
            product.name = name;
        }
        if let Some(description) = self.description {
            product.description = Some(description);
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(category) = self.category {
            product.category = category;
        }
        if let Some(image) = self.image {
            product.image = image;
        }
        if let Some(qr_code) = self.qr_code {
            product.qr_code = qr_code;
        }
        if let Some(sku) = self.sku {
            product.sku = Some(sku);
        }
        if let Some(stock) = self.stock {
            product.stock = Some(stock);
        }
        product.updated_at = Some(now);
        Ok(())
    }
}

// =============================================================================
// Categories
// =============================================================================

/// Builds a category; a missing or blank color gets the default gray.
pub fn new_category(name: &str, color: Option<&str>, now: DateTime<Utc>) -> CoreResult<Category> {
    validate_category_name(name)?;
    Ok(Category {
        id: generate_category_id(now),
        name: name.trim().to_string(),
        color: color
            .filter(|c| !c.is_empty())
            .unwrap_or(DEFAULT_CATEGORY_COLOR)
            .to_string(),
    })
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryPatch {
    pub name: Option<String>,
    pub color: Option<String>,
}

impl CategoryPatch {
    pub fn apply(self, category: &mut Category) -> CoreResult<()> {
        if let Some(name) = &self.name {
            validate_category_name(name)?;
        }
        if let Some(name) = self.name {
            category.name = name;
        }
        if let Some(color) = self.color {
            category.color = color;
        }
        Ok(())
    }
}

/// Case-insensitive category lookup by name.
pub fn find_category_by_name<'a>(categories: &'a [Category], name: &str) -> Option<&'a Category> {
    categories.iter().find(|c| c.name.to_lowercase() == name.to_lowercase())
}

// =============================================================================
// Product Lookups
// =============================================================================

/// Case-insensitive substring search over name, description and SKU.
pub fn search<'a>(products: &'a [Product], query: &str) -> Vec<&'a Product> {
    let query = query.to_lowercase();
    products
        .iter()
        .filter(|p| {
            p.name.to_lowercase().contains(&query)
                || p.description
                    .as_deref()
                    .is_some_and(|d| d.to_lowercase().contains(&query))
                || p.sku
                    .as_deref()
                    .is_some_and(|s| s.to_lowercase().contains(&query))
        })
        .collect()
}

/// Products whose category name matches exactly.
pub fn by_category<'a>(products: &'a [Product], category: &str) -> Vec<&'a Product> {
    products.iter().filter(|p| p.category == category).collect()
}

/// Resolves a scanned payload to a product, by QR payload or id.
pub fn find_by_scan<'a>(products: &'a [Product], scanned: &str) -> Option<&'a Product> {
    products
        .iter()
        .find(|p| p.qr_code == scanned || p.id == scanned)
}

// =============================================================================
// Defaults
// =============================================================================

fn demo_product(id: &str, name: &str, cents: i64, category: &str, image: &str) -> Product {
    Product {
        id: id.to_string(),
        name: name.to_string(),
        description: None,
        price: Money::from_cents(cents),
        category: category.to_string(),
        image: image.to_string(),
        qr_code: format!("PROD-{:0>3}", id),
        sku: None,
        stock: None,
        created_at: None,
        updated_at: None,
    }
}

/// The demo catalog a fresh install starts with.
pub fn default_products() -> Vec<Product> {
    vec![
        demo_product(
            "1",
            "Premium Coffee",
            450,
            "Beverages",
            "https://images.unsplash.com/photo-1509042239860-f550ce710b93?w=500&q=80",
        ),
        demo_product(
            "2",
            "Artisan Croissant",
            375,
            "Bakery",
            "https://images.unsplash.com/photo-1555507036-ab1f4038808a?w=500&q=80",
        ),
        demo_product(
            "3",
            "Green Tea Latte",
            525,
            "Beverages",
            "https://images.unsplash.com/photo-1515823064-d6e0c04616a7?w=500&q=80",
        ),
        demo_product(
            "4",
            "Blueberry Muffin",
            350,
            "Bakery",
            "https://images.unsplash.com/photo-1587049016473-b1ec904f67b4?w=500&q=80",
        ),
        demo_product(
            "5",
            "Avocado Toast",
            1200,
            "Food",
            "https://images.unsplash.com/photo-1525351484163-7529414344d8?w=500&q=80",
        ),
        demo_product(
            "6",
            "Sparkling Water",
            250,
            "Beverages",
            "https://images.unsplash.com/photo-1554467484-a4721ec39717?w=500&q=80",
        ),
    ]
}

pub fn default_categories() -> Vec<Category> {
    [
        ("cat-1", "Beverages", "#8b5cf6"),
        ("cat-2", "Bakery", "#f59e0b"),
        ("cat-3", "Food", "#10b981"),
    ]
    .into_iter()
    .map(|(id, name, color)| Category {
        id: id.to_string(),
        name: name.to_string(),
        color: color.to_string(),
    })
    .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CoreError, ValidationError};
    use chrono::TimeZone;

    fn draft(name: &str, cents: i64) -> ProductDraft {
        ProductDraft {
            name: name.to_string(),
            price: Money::from_cents(cents),
            category: "Food".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_qr_code_resolution() {
        let now = Utc.timestamp_millis_opt(1_700_000_000_000).unwrap();
        assert_eq!(generate_qr_code(Some("abc-1"), "Name", now), "ABC-1");
        assert_eq!(generate_qr_code(None, "Avocado   Toast", now), "PROD-AVOCADO-TO");
        assert_eq!(generate_qr_code(None, "Tea", now), "PROD-TEA");
        assert_eq!(generate_qr_code(None, "", now), "PROD-1700000000000");
        assert_eq!(generate_qr_code(Some(""), "Tea", now), "PROD-TEA");
    }

    #[test]
    fn test_draft_derives_qr_and_id() {
        let now = Utc::now();
        let product = draft("Iced Mocha", 550).into_product(now).unwrap();

        assert!(product.id.starts_with("prod-"));
        assert_eq!(product.qr_code, "PROD-ICED-MOCHA");
        assert_eq!(product.created_at, Some(now));

        let mut with_qr = draft("Iced Mocha", 550);
        with_qr.qr_code = "CUSTOM".to_string();
        assert_eq!(with_qr.into_product(now).unwrap().qr_code, "CUSTOM");
    }

    #[test]
    fn test_draft_validation() {
        let now = Utc::now();
        assert!(matches!(
            draft("", 100).into_product(now),
            Err(CoreError::Validation(ValidationError::Required { .. }))
        ));
        assert!(matches!(
            draft("Tea", -1).into_product(now),
            Err(CoreError::Validation(ValidationError::MustNotBeNegative { .. }))
        ));
    }

    #[test]
    fn test_patch_is_all_or_nothing() {
        let now = Utc::now();
        let mut product = default_products().remove(0);

        let bad = ProductPatch {
            name: Some("Renamed".into()),
            price: Some(Money::from_cents(-5)),
            ..Default::default()
        };
        assert!(bad.apply(&mut product, now).is_err());
        assert_eq!(product.name, "Premium Coffee");

        let good = ProductPatch {
            price: Some(Money::from_cents(499)),
            stock: Some(12),
            ..Default::default()
        };
        good.apply(&mut product, now).unwrap();
        assert_eq!(product.price, Money::from_cents(499));
        assert_eq!(product.stock, Some(12));
        assert_eq!(product.updated_at, Some(now));
    }

    #[test]
    fn test_search() {
        let mut products = default_products();
        products[4].sku = Some("AVO-TOAST".into());
        products[1].description = Some("Buttery and flaky".into());

        assert_eq!(search(&products, "LATTE").len(), 1);
        assert_eq!(search(&products, "avo-t")[0].id, "5");
        assert_eq!(search(&products, "flaky")[0].id, "2");
        assert_eq!(search(&products, "").len(), products.len());
    }

    #[test]
    fn test_by_category_and_scan() {
        let products = default_products();
        assert_eq!(by_category(&products, "Beverages").len(), 3);
        assert_eq!(find_by_scan(&products, "PROD-004").unwrap().name, "Blueberry Muffin");
        assert_eq!(find_by_scan(&products, "6").unwrap().name, "Sparkling Water");
        assert!(find_by_scan(&products, "nope").is_none());
    }

    #[test]
    fn test_categories() {
        let now = Utc::now();
        let category = new_category("Snacks", None, now).unwrap();
        assert_eq!(category.color, DEFAULT_CATEGORY_COLOR);
        assert!(category.id.starts_with("cat-"));

        let categories = default_categories();
        assert_eq!(find_category_by_name(&categories, "bakery").unwrap().id, "cat-2");

        let mut food = categories[2].clone();
        CategoryPatch {
            color: Some("#000000".into()),
            ..Default::default()
        }
        .apply(&mut food)
        .unwrap();
        assert_eq!(food.color, "#000000");
        assert_eq!(food.name, "Food");
    }
}
