//! # Cart
//!
//! The in-memory shopping cart behind the till screen.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Operations                                      │
//! │                                                                         │
//! │  Operator Action          Method                  Cart State Change     │
//! │  ───────────────          ──────                  ─────────────────     │
//! │                                                                         │
//! │  Tap / scan product ─────► add_product() ───────► qty += 1 or push     │
//! │                                                                         │
//! │  Press + / - ────────────► adjust_quantity() ───► qty += delta         │
//! │                                                  (0 removes the line)  │
//! │                                                                         │
//! │  Type a quantity ────────► set_quantity() ──────► qty = n              │
//! │                                                                         │
//! │  Click Remove ───────────► remove() ────────────► line dropped         │
//! │                                                                         │
//! │  Sale finished ──────────► clear() ─────────────► empty                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Stock is informational only: the cart never refuses a product because its
//! `stock` is low.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{OrderItem, Product};
use crate::validation::{validate_cart_size, validate_quantity};
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

/// A line in the cart.
///
/// ## Design Notes
/// The product is copied in when the line is created, so the cart keeps
/// showing the price the customer saw even if the catalog entry is edited
/// mid-sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    #[serde(flatten)]
    pub product: Product,
    pub quantity: u32,
}

impl CartItem {
    /// Creates a cart line for one unit of the product.
    pub fn from_product(product: &Product) -> Self {
        CartItem {
            product: product.clone(),
            quantity: 1,
        }
    }

    /// Unit price × quantity.
    #[inline]
    pub fn line_total(&self) -> Money {
        self.product.price.multiply_quantity(self.quantity)
    }

    /// Freezes this line into an order line.
    pub fn to_order_item(&self) -> OrderItem {
        OrderItem {
            product_id: self.product.id.clone(),
            name: self.product.name.clone(),
            sku: self.product.sku.clone(),
            price: self.product.price,
            quantity: self.quantity,
        }
    }
}

/// The shopping cart.
///
/// ## Invariants
/// - Lines are unique by product id (adding the same product bumps quantity)
/// - Every line has quantity > 0
/// - Lines keep insertion order
/// - At most `MAX_CART_ITEMS` lines, each at most `MAX_ITEM_QUANTITY`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cart {
    items: Vec<CartItem>,
}

impl Cart {
    /// Creates a new empty cart.
    pub fn new() -> Self {
        Cart { items: Vec::new() }
    }

    /// Adds one unit of a product, or bumps its quantity if already present.
    pub fn add_product(&mut self, product: &Product) -> CoreResult<()> {
        if let Some(item) = self.find_mut(&product.id) {
            let new_qty = item.quantity + 1;
            if new_qty > MAX_ITEM_QUANTITY {
                return Err(CoreError::QuantityTooLarge {
                    requested: new_qty as u64,
                    max: MAX_ITEM_QUANTITY,
                });
            }
            item.quantity = new_qty;
            return Ok(());
        }

        validate_cart_size(self.items.len()).map_err(|_| CoreError::CartTooLarge {
            max: MAX_CART_ITEMS,
        })?;

        self.items.push(CartItem::from_product(product));
        Ok(())
    }

    /// Changes a line's quantity by `delta`, clamping at zero.
    ///
    /// A line that reaches zero is removed.
    pub fn adjust_quantity(&mut self, product_id: &str, delta: i64) -> CoreResult<()> {
        let item = self
            .find_mut(product_id)
            .ok_or_else(|| CoreError::NotInCart(product_id.to_string()))?;

        let new_qty = i64::from(item.quantity).saturating_add(delta).max(0);
        if new_qty > MAX_ITEM_QUANTITY as i64 {
            return Err(CoreError::QuantityTooLarge {
                requested: new_qty as u64,
                max: MAX_ITEM_QUANTITY,
            });
        }

        item.quantity = new_qty as u32;
        self.items.retain(|i| i.quantity > 0);
        Ok(())
    }

    /// Sets a line's quantity outright. Zero removes the line.
    pub fn set_quantity(&mut self, product_id: &str, quantity: u32) -> CoreResult<()> {
        if quantity == 0 {
            return self.remove(product_id);
        }

        validate_quantity(quantity).map_err(|_| CoreError::QuantityTooLarge {
            requested: quantity as u64,
            max: MAX_ITEM_QUANTITY,
        })?;

        let item = self
            .find_mut(product_id)
            .ok_or_else(|| CoreError::NotInCart(product_id.to_string()))?;
        item.quantity = quantity;
        Ok(())
    }

    /// Removes a line by product id.
    pub fn remove(&mut self, product_id: &str) -> CoreResult<()> {
        let initial_len = self.items.len();
        self.items.retain(|i| i.product.id != product_id);

        if self.items.len() == initial_len {
            Err(CoreError::NotInCart(product_id.to_string()))
        } else {
            Ok(())
        }
    }

    /// Clears all lines.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Returns the number of distinct lines.
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Returns the total quantity across all lines.
    pub fn total_quantity(&self) -> u32 {
        total_quantity(&self.items)
    }

    /// Σ price × quantity, before discounts and tax.
    pub fn subtotal(&self) -> Money {
        subtotal(&self.items)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Snapshot of every line as order lines.
    pub fn to_order_items(&self) -> Vec<OrderItem> {
        self.items.iter().map(CartItem::to_order_item).collect()
    }

    fn find_mut(&mut self, product_id: &str) -> Option<&mut CartItem> {
        self.items.iter_mut().find(|i| i.product.id == product_id)
    }
}

/// Σ price × quantity over any slice of cart lines.
pub fn subtotal(items: &[CartItem]) -> Money {
    items.iter().map(CartItem::line_total).sum()
}

/// Total units across cart lines.
///
/// Saturates at `u32::MAX` rather than wrapping.
pub fn total_quantity(items: &[CartItem]) -> u32 {
    items
        .iter()
        .fold(0u32, |total, i| total.saturating_add(i.quantity))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn product(id: &str, cents: i64) -> Product {
        Product {
            id: id.to_string(),
            name: format!("Product {}", id),
            description: None,
            price: Money::from_cents(cents),
            category: "Food".to_string(),
            image: String::new(),
            qr_code: format!("PROD-{}", id),
            sku: None,
            stock: Some(0),
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_add_same_product_increments() {
        let mut cart = Cart::new();
        let coffee = product("1", 450);

        cart.add_product(&coffee).unwrap();
        cart.add_product(&coffee).unwrap();

        assert_eq!(cart.item_count(), 1);
        assert_eq!(cart.total_quantity(), 2);
        assert_eq!(cart.subtotal(), Money::from_cents(900));
    }

    #[test]
    fn test_out_of_stock_product_can_still_be_added() {
        let mut cart = Cart::new();
        cart.add_product(&product("1", 100)).unwrap();
        assert_eq!(cart.items()[0].product.stock, Some(0));
    }

    #[test]
    fn test_adjust_to_zero_removes_line() {
        let mut cart = Cart::new();
        cart.add_product(&product("1", 450)).unwrap();
        cart.add_product(&product("2", 375)).unwrap();

        cart.adjust_quantity("1", 2).unwrap();
        assert_eq!(cart.items()[0].quantity, 3);

        cart.adjust_quantity("1", -10).unwrap();
        assert_eq!(cart.item_count(), 1);
        assert_eq!(cart.items()[0].product.id, "2");
    }

    #[test]
    fn test_set_quantity_and_remove() {
        let mut cart = Cart::new();
        cart.add_product(&product("1", 450)).unwrap();

        cart.set_quantity("1", 5).unwrap();
        assert_eq!(cart.total_quantity(), 5);

        assert!(matches!(
            cart.set_quantity("1", 1000),
            Err(CoreError::QuantityTooLarge { .. })
        ));
        assert!(matches!(
            cart.set_quantity("missing", 1),
            Err(CoreError::NotInCart(_))
        ));

        cart.set_quantity("1", 0).unwrap();
        assert!(cart.is_empty());
        assert!(cart.remove("1").is_err());
    }

    #[test]
    fn test_adjust_by_extreme_delta() {
        let mut cart = Cart::new();
        cart.add_product(&product("1", 450)).unwrap();

        assert!(matches!(
            cart.adjust_quantity("1", i64::MAX),
            Err(CoreError::QuantityTooLarge { .. })
        ));
        assert_eq!(cart.items()[0].quantity, 1);

        cart.adjust_quantity("1", i64::MIN).unwrap();
        assert!(cart.is_empty());
    }

    #[test]
    fn test_cart_size_limit() {
        let mut cart = Cart::new();
        for i in 0..MAX_CART_ITEMS {
            cart.add_product(&product(&i.to_string(), 100)).unwrap();
        }
        assert!(matches!(
            cart.add_product(&product("overflow", 100)),
            Err(CoreError::CartTooLarge { .. })
        ));
    }

    #[test]
    fn test_subtotal_independent_of_order() {
        let a = CartItem {
            product: product("a", 1999),
            quantity: 3,
        };
        let b = CartItem {
            product: product("b", 250),
            quantity: 7,
        };
        assert_eq!(
            subtotal(&[a.clone(), b.clone()]),
            subtotal(&[b, a])
        );
    }

    #[test]
    fn test_cart_item_serializes_flat() {
        let item = CartItem::from_product(&product("1", 450));
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["id"], "1");
        assert_eq!(json["quantity"], 1);
    }

    #[test]
    fn test_to_order_items_snapshots_price() {
        let mut cart = Cart::new();
        cart.add_product(&product("1", 450)).unwrap();
        let items = cart.to_order_items();
        assert_eq!(items[0].price, Money::from_cents(450));
        assert_eq!(items[0].product_id, "1");
    }
}
