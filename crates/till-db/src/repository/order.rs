//! # Order Repository
//!
//! The order log: one JSON array under `pos-orders`, newest first.
//!
//! ## Recording a Checkout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    record_checkout (one transaction)                    │
//! │                                                                         │
//! │  CheckoutSession::complete() ──► CompletedCheckout                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  BEGIN                                                                  │
//! │    ├── read pos-orders, prepend new order, write pos-orders            │
//! │    └── coupon applied? read pos-coupons, usedCount += 1, write         │
//! │  COMMIT                                                                 │
//! │                                                                         │
//! │  Either both writes land or neither does.                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Reports
//! Report methods read the whole log and delegate to `till_core::report`,
//! using the machine's local time zone for day/week/month boundaries.

use chrono::{DateTime, Local, TimeZone, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::kv::{self, keys};
use crate::repository::discount::redeem_coupon;
use till_core::checkout::CompletedCheckout;
use till_core::order::{build_order, generate_order_id};
use till_core::report::{
    self, DailyRevenue, ProductSales, SalesSummary, WeeklyRevenue,
};
use till_core::{Customer, Money, Order, OrderItem, Payment, TaxRate};

/// Repository for the order log.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// The whole log, newest first. Empty when nothing is stored.
    pub async fn list_orders(&self) -> DbResult<Vec<Order>> {
        kv::read_or_else(&self.pool, keys::ORDERS, Vec::new).await
    }

    pub async fn get_order(&self, id: &str) -> DbResult<Option<Order>> {
        let orders = self.list_orders().await?;
        Ok(orders.into_iter().find(|o| o.id == id))
    }

    /// Snapshots `items` into a new order and prepends it to the log.
    ///
    /// ## Arguments
    /// * `discount` - total discount already computed by the discount engine
    /// * `tax_rate` - applied to `max(0, subtotal - discount)`
    pub async fn create_order(
        &self,
        items: Vec<OrderItem>,
        customer: Option<Customer>,
        payments: Vec<Payment>,
        discount: Money,
        tax_rate: TaxRate,
    ) -> DbResult<Order> {
        let now = Utc::now();
        let order = build_order(
            generate_order_id(now),
            items,
            customer,
            payments,
            discount,
            tax_rate,
            now,
        );

        let mut orders = self.list_orders().await?;
        orders.insert(0, order.clone());
        kv::write(&self.pool, keys::ORDERS, &orders).await?;

        info!(id = %order.id, total = %order.total, "Order created");
        Ok(order)
    }

    /// Records a completed checkout and redeems its coupon atomically.
    ///
    /// ## Example
    /// ```rust,ignore
    /// let completed = session.complete(Utc::now())?;
    /// let order = db.orders().record_checkout(completed).await?;
    /// ```
    pub async fn record_checkout(&self, completed: CompletedCheckout) -> DbResult<Order> {
        let coupon_id = completed.coupon_id.clone();
        let order = Order::from_checkout(generate_order_id(completed.completed_at), completed);

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let mut orders: Vec<Order> = kv::read_or_else(&mut *tx, keys::ORDERS, Vec::new).await?;
        orders.insert(0, order.clone());
        kv::write(&mut *tx, keys::ORDERS, &orders).await?;

        if let Some(coupon_id) = coupon_id.as_deref() {
            redeem_coupon(&mut tx, coupon_id).await?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            id = %order.id,
            total = %order.total,
            coupon = ?order.coupon_code,
            "Checkout recorded"
        );
        Ok(order)
    }

    /// Stores 14 days of demo orders, but only into an empty log.
    ///
    /// Returns how many orders were written (0 when the log had data).
    pub async fn seed_sample_orders(&self, tax_rate: TaxRate) -> DbResult<usize> {
        if !self.list_orders().await?.is_empty() {
            debug!("Order log not empty, skipping sample orders");
            return Ok(0);
        }

        let orders = report::generate_sample_orders(&Local::now(), tax_rate);
        kv::write(&self.pool, keys::ORDERS, &orders).await?;

        info!(count = orders.len(), "Sample orders generated");
        Ok(orders.len())
    }

    // =========================================================================
    // Reports
    // =========================================================================

    /// Orders created within `[start, end]`, both ends inclusive.
    pub async fn orders_by_date_range<Tz: TimeZone>(
        &self,
        start: &DateTime<Tz>,
        end: &DateTime<Tz>,
    ) -> DbResult<Vec<Order>> {
        let orders = self.list_orders().await?;
        Ok(report::orders_between(&orders, start, end)
            .into_iter()
            .cloned()
            .collect())
    }

    pub async fn today_orders(&self) -> DbResult<Vec<Order>> {
        let orders = self.list_orders().await?;
        Ok(report::today_orders(&orders, &Local::now())
            .into_iter()
            .cloned()
            .collect())
    }

    /// Orders since the most recent Sunday midnight.
    pub async fn this_week_orders(&self) -> DbResult<Vec<Order>> {
        let orders = self.list_orders().await?;
        Ok(report::this_week_orders(&orders, &Local::now())
            .into_iter()
            .cloned()
            .collect())
    }

    pub async fn this_month_orders(&self) -> DbResult<Vec<Order>> {
        let orders = self.list_orders().await?;
        Ok(report::this_month_orders(&orders, &Local::now())
            .into_iter()
            .cloned()
            .collect())
    }

    pub async fn daily_revenue(&self, days: u32) -> DbResult<Vec<DailyRevenue>> {
        let orders = self.list_orders().await?;
        Ok(report::daily_revenue(&orders, days, &Local::now()))
    }

    pub async fn weekly_revenue(&self, weeks: u32) -> DbResult<Vec<WeeklyRevenue>> {
        let orders = self.list_orders().await?;
        Ok(report::weekly_revenue(&orders, weeks, &Local::now()))
    }

    pub async fn best_selling_products(&self, limit: usize) -> DbResult<Vec<ProductSales>> {
        let orders = self.list_orders().await?;
        Ok(report::best_selling_products(&orders, limit))
    }

    pub async fn sales_summary(&self) -> DbResult<SalesSummary> {
        let orders = self.list_orders().await?;
        Ok(report::sales_summary(&orders, &Local::now()))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::Duration;
    use till_core::cart::Cart;
    use till_core::catalog::default_products;
    use till_core::checkout::CheckoutSession;
    use till_core::OrderStatus;
    use till_core::PaymentType;

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn coffee_items(quantity: u32) -> Vec<OrderItem> {
        vec![OrderItem {
            product_id: "1".into(),
            name: "Premium Coffee".into(),
            sku: None,
            price: Money::from_cents(450),
            quantity,
        }]
    }

    #[tokio::test]
    async fn test_create_order_prepends() {
        let repo = db().await.orders();
        let first = repo
            .create_order(coffee_items(1), None, vec![], Money::zero(), TaxRate::default())
            .await
            .unwrap();
        let second = repo
            .create_order(coffee_items(2), None, vec![], Money::zero(), TaxRate::default())
            .await
            .unwrap();

        let orders = repo.list_orders().await.unwrap();
        assert_eq!(orders.len(), 2);
        assert_eq!(orders[0].id, second.id);
        assert_eq!(orders[1].id, first.id);
        assert_eq!(first.status, OrderStatus::Completed);
        assert_eq!(first.total, "4.95".parse::<Money>().unwrap());
        assert!(repo.get_order(&first.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_today_and_range_queries() {
        let repo = db().await.orders();
        let order = repo
            .create_order(coffee_items(1), None, vec![], Money::zero(), TaxRate::default())
            .await
            .unwrap();

        let today = repo.today_orders().await.unwrap();
        assert!(today.iter().any(|o| o.id == order.id));
        assert_eq!(repo.this_week_orders().await.unwrap().len(), 1);
        assert_eq!(repo.this_month_orders().await.unwrap().len(), 1);

        let now = Utc::now();
        let past = repo
            .orders_by_date_range(&(now - Duration::days(10)), &(now - Duration::days(1)))
            .await
            .unwrap();
        assert!(past.is_empty());

        let around = repo
            .orders_by_date_range(&(now - Duration::hours(1)), &(now + Duration::hours(1)))
            .await
            .unwrap();
        assert_eq!(around.len(), 1);
    }

    #[tokio::test]
    async fn test_record_checkout_redeems_coupon() {
        let db = db().await;
        db.discounts().initialize().await.unwrap();

        let products = default_products();
        let mut cart = Cart::new();
        cart.add_product(&products[4]).unwrap(); // Avocado Toast, $12.00
        cart.set_quantity(&products[4].id, 2).unwrap();

        let config = db.discounts().config().await.unwrap();
        let mut session = CheckoutSession::new(cart.items(), config, TaxRate::default()).unwrap();
        session.apply_coupon("save5", Utc::now()).unwrap();
        session.proceed_to_payment().unwrap();
        session.pay_in_full(PaymentType::Card, Utc::now()).unwrap();
        let completed = session.complete(Utc::now()).unwrap();

        let order = db.orders().record_checkout(completed).await.unwrap();
        assert_eq!(order.coupon_code.as_deref(), Some("SAVE5"));
        assert_eq!(order.subtotal, Money::from_major(24));
        assert_eq!(order.discount, Money::from_major(5));

        let coupon = db
            .discounts()
            .get_coupon_by_code("SAVE5")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(coupon.used_count, 1);
        assert_eq!(db.orders().list_orders().await.unwrap()[0].id, order.id);
    }

    #[tokio::test]
    async fn test_reports() {
        let repo = db().await.orders();
        repo.create_order(coffee_items(3), None, vec![], Money::zero(), TaxRate::zero())
            .await
            .unwrap();

        let best = repo.best_selling_products(5).await.unwrap();
        assert_eq!(best[0].product_id, "1");
        assert_eq!(best[0].quantity, 3);

        let summary = repo.sales_summary().await.unwrap();
        assert_eq!(summary.today_orders, 1);
        assert_eq!(summary.today_revenue, Money::from_cents(1350));

        let daily = repo.daily_revenue(7).await.unwrap();
        assert_eq!(daily.len(), 7);
        assert_eq!(daily[6].orders, 1);

        let weekly = repo.weekly_revenue(4).await.unwrap();
        assert_eq!(weekly.len(), 4);
        assert_eq!(weekly[3].orders, 1);
    }

    #[tokio::test]
    async fn test_seed_sample_orders_only_once() {
        let repo = db().await.orders();
        let seeded = repo.seed_sample_orders(TaxRate::default()).await.unwrap();
        assert!(seeded >= 14 * 3);

        assert_eq!(repo.seed_sample_orders(TaxRate::default()).await.unwrap(), 0);
        let orders = repo.list_orders().await.unwrap();
        assert_eq!(orders.len(), seeded);
        assert!(orders.windows(2).all(|w| w[0].created_at >= w[1].created_at));
    }
}
