//! # Reports
//!
//! Dashboard figures derived by scanning the order log.
//!
//! Every function here is a plain O(n) pass over a slice of orders. The
//! caller passes "now" as a `DateTime` in the shop's time zone; day, week
//! and month boundaries are local midnights in that zone.
//!
//! ## Windows
//! ```text
//! today       [00:00 today,            00:00 tomorrow)
//! this week   [00:00 last Sunday,      +7 days)
//! this month  [00:00 on the 1st,       00:00 on the 1st of next month)
//! daily(n)    n calendar days ending today, oldest first
//! weekly(n)   n rolling 7-day windows ending now, oldest first
//! ```

use std::collections::HashMap;

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::order::{build_order, to_base36};
use crate::types::{Order, OrderItem, Payment, PaymentType, TaxRate};

/// Longest span `daily_revenue` reports on; larger requests are capped.
pub const MAX_REPORT_DAYS: u32 = 3660;

/// Longest span `weekly_revenue` reports on; larger requests are capped.
pub const MAX_REPORT_WEEKS: u32 = 520;

// =============================================================================
// Result Types
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyRevenue {
    /// Label such as `"Fri, Oct 16"`.
    pub date: String,
    pub revenue: Money,
    pub orders: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyRevenue {
    /// Label such as `"Week 3"`; the latest week has the highest number.
    pub week: String,
    pub revenue: Money,
    pub orders: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSales {
    pub product_id: String,
    pub name: String,
    pub quantity: u32,
    pub revenue: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesSummary {
    pub today_revenue: Money,
    pub today_orders: usize,
    pub week_revenue: Money,
    pub week_orders: usize,
    pub month_revenue: Money,
    pub month_orders: usize,
    /// Mean order total over the whole log.
    pub average_order_value: Money,
}

// =============================================================================
// Time Helpers
// =============================================================================

/// Local midnight at the start of `date`, as UTC.
///
/// On days where midnight does not exist locally (DST gaps) the naive
/// time is read as UTC.
fn local_midnight<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> DateTime<Utc> {
    let naive = date.and_hms_opt(0, 0, 0).unwrap_or_default();
    match tz.from_local_datetime(&naive).earliest() {
        Some(dt) => dt.with_timezone(&Utc),
        None => Utc.from_utc_datetime(&naive),
    }
}

fn in_window(order: &Order, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
    order.created_at >= start && order.created_at < end
}

fn filter_window(orders: &[Order], start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<&Order> {
    orders.iter().filter(|o| in_window(o, start, end)).collect()
}

/// `[start of today, start of tomorrow)` in `now`'s zone.
pub fn today_window<Tz: TimeZone>(now: &DateTime<Tz>) -> (DateTime<Utc>, DateTime<Utc>) {
    let tz = now.timezone();
    let today = now.date_naive();
    (
        local_midnight(&tz, today),
        local_midnight(&tz, today + Duration::days(1)),
    )
}

/// Sunday-start week containing `now`.
pub fn week_window<Tz: TimeZone>(now: &DateTime<Tz>) -> (DateTime<Utc>, DateTime<Utc>) {
    let tz = now.timezone();
    let today = now.date_naive();
    let sunday = today - Duration::days(today.weekday().num_days_from_sunday() as i64);
    (
        local_midnight(&tz, sunday),
        local_midnight(&tz, sunday + Duration::days(7)),
    )
}

/// Calendar month containing `now`.
pub fn month_window<Tz: TimeZone>(now: &DateTime<Tz>) -> (DateTime<Utc>, DateTime<Utc>) {
    let tz = now.timezone();
    let today = now.date_naive();
    let first = today.with_day(1).unwrap_or(today);
    let next_first = if first.month() == 12 {
        NaiveDate::from_ymd_opt(first.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(first.year(), first.month() + 1, 1)
    }
    .unwrap_or(first + Duration::days(31));
    (local_midnight(&tz, first), local_midnight(&tz, next_first))
}

// =============================================================================
// Queries
// =============================================================================

/// Orders created within `[start, end]`, both ends inclusive.
pub fn orders_between<'a, Tz: TimeZone>(
    orders: &'a [Order],
    start: &DateTime<Tz>,
    end: &DateTime<Tz>,
) -> Vec<&'a Order> {
    let start = start.with_timezone(&Utc);
    let end = end.with_timezone(&Utc);
    orders
        .iter()
        .filter(|o| o.created_at >= start && o.created_at <= end)
        .collect()
}

pub fn today_orders<'a, Tz: TimeZone>(orders: &'a [Order], now: &DateTime<Tz>) -> Vec<&'a Order> {
    let (start, end) = today_window(now);
    filter_window(orders, start, end)
}

pub fn this_week_orders<'a, Tz: TimeZone>(orders: &'a [Order], now: &DateTime<Tz>) -> Vec<&'a Order> {
    let (start, end) = week_window(now);
    filter_window(orders, start, end)
}

pub fn this_month_orders<'a, Tz: TimeZone>(orders: &'a [Order], now: &DateTime<Tz>) -> Vec<&'a Order> {
    let (start, end) = month_window(now);
    filter_window(orders, start, end)
}

/// Σ order totals.
pub fn calculate_revenue<'a, I>(orders: I) -> Money
where
    I: IntoIterator<Item = &'a Order>,
{
    orders.into_iter().map(|o| o.total).sum()
}

/// Revenue per calendar day for the last `days` days, oldest first.
///
/// `days` is capped at [`MAX_REPORT_DAYS`].
pub fn daily_revenue<Tz: TimeZone>(orders: &[Order], days: u32, now: &DateTime<Tz>) -> Vec<DailyRevenue> {
    let tz = now.timezone();
    let today = now.date_naive();
    let days = days.min(MAX_REPORT_DAYS);

    (0..i64::from(days))
        .rev()
        .map(|back| {
            let date = today - Duration::days(back);
            let start = local_midnight(&tz, date);
            let end = local_midnight(&tz, date + Duration::days(1));
            let day_orders = filter_window(orders, start, end);
            DailyRevenue {
                date: date.format("%a, %b %-d").to_string(),
                revenue: calculate_revenue(day_orders.iter().copied()),
                orders: day_orders.len(),
            }
        })
        .collect()
}

/// Revenue per rolling 7-day window for the last `weeks` weeks, oldest first.
///
/// `weeks` is capped at [`MAX_REPORT_WEEKS`].
pub fn weekly_revenue<Tz: TimeZone>(orders: &[Order], weeks: u32, now: &DateTime<Tz>) -> Vec<WeeklyRevenue> {
    let now = now.with_timezone(&Utc);
    let weeks = weeks.min(MAX_REPORT_WEEKS);

    (0..i64::from(weeks))
        .rev()
        .map(|back| {
            let end = now - Duration::days(back * 7);
            let start = end - Duration::days(7);
            let week_orders = filter_window(orders, start, end);
            WeeklyRevenue {
                week: format!("Week {}", i64::from(weeks) - back),
                revenue: calculate_revenue(week_orders.iter().copied()),
                orders: week_orders.len(),
            }
        })
        .collect()
}

/// Top `limit` products by units sold.
///
/// Ties keep the order in which products were first seen while scanning the
/// log (newest order first).
pub fn best_selling_products(orders: &[Order], limit: usize) -> Vec<ProductSales> {
    let mut stats: Vec<ProductSales> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for item in orders.iter().flat_map(|o| o.items.iter()) {
        let slot = *index.entry(item.product_id.as_str()).or_insert_with(|| {
            stats.push(ProductSales {
                product_id: item.product_id.clone(),
                name: item.name.clone(),
                quantity: 0,
                revenue: Money::zero(),
            });
            stats.len() - 1
        });
        stats[slot].quantity += item.quantity;
        stats[slot].revenue += item.line_total();
    }

    stats.sort_by(|a, b| b.quantity.cmp(&a.quantity));
    stats.truncate(limit);
    stats
}

/// Today / week / month figures plus the average order value.
pub fn sales_summary<Tz: TimeZone>(orders: &[Order], now: &DateTime<Tz>) -> SalesSummary {
    let today = today_orders(orders, now);
    let week = this_week_orders(orders, now);
    let month = this_month_orders(orders, now);

    let average_order_value = if orders.is_empty() {
        Money::zero()
    } else {
        Money::new(calculate_revenue(orders).amount() / rust_decimal::Decimal::from(orders.len() as u64))
    };

    SalesSummary {
        today_revenue: calculate_revenue(today.iter().copied()),
        today_orders: today.len(),
        week_revenue: calculate_revenue(week.iter().copied()),
        week_orders: week.len(),
        month_revenue: calculate_revenue(month.iter().copied()),
        month_orders: month.len(),
        average_order_value,
    }
}

// =============================================================================
// Sample Data
// =============================================================================

/// Products used for demo orders: (id, name, price in cents).
const SAMPLE_PRODUCTS: [(&str, &str, i64); 5] = [
    ("1", "Premium Coffee", 499),
    ("2", "Artisan Croissant", 349),
    ("3", "Green Tea Latte", 549),
    ("4", "Avocado Toast", 899),
    ("5", "Blueberry Muffin", 299),
];

/// Deterministic spread of `seed` over `0..modulo`.
fn spread(seed: usize, salt: usize, modulo: usize) -> usize {
    (seed.wrapping_mul(2_654_435_761) ^ salt.wrapping_mul(40_503)).wrapping_add(salt) % modulo
}

/// Builds 14 days of demo orders ending on `now`'s date, newest first.
///
/// Each day gets 3-10 cash orders between 08:00 and 19:59 local time, each
/// with 1-4 lines. Output depends only on `now`'s date and zone.
pub fn generate_sample_orders<Tz: TimeZone>(now: &DateTime<Tz>, tax_rate: TaxRate) -> Vec<Order> {
    let tz = now.timezone();
    let today = now.date_naive();
    let mut orders = Vec::new();
    let mut seq: usize = 0;

    for back in (0..14i64).rev() {
        let date = today - Duration::days(back);
        let day_seed = back as usize + 1;
        let per_day = 3 + spread(day_seed, 1, 8);

        for n in 0..per_day {
            seq += 1;
            let seed = day_seed * 31 + n;
            let minutes = (8 + spread(seed, 2, 12)) * 60 + spread(seed, 3, 60);
            let created_at = local_midnight(&tz, date) + Duration::minutes(minutes as i64);

            let mut items: Vec<OrderItem> = Vec::new();
            for line in 0..(1 + spread(seed, 4, 4)) {
                let (id, name, cents) = SAMPLE_PRODUCTS[spread(seed, 5 + line, SAMPLE_PRODUCTS.len())];
                match items.iter_mut().find(|i| i.product_id == id) {
                    Some(existing) => existing.quantity += 1,
                    None => items.push(OrderItem {
                        product_id: id.to_string(),
                        name: name.to_string(),
                        sku: None,
                        price: Money::from_cents(cents),
                        quantity: 1 + spread(seed, 9 + line, 2) as u32,
                    }),
                }
            }

            let id = format!(
                "ORD-{}-{:0>5}",
                to_base36(created_at.timestamp_millis().max(0) as u64),
                to_base36(seq as u64)
            );
            let mut order = build_order(id, items, None, Vec::new(), Money::zero(), tax_rate, created_at);
            order.payments = vec![Payment::new(PaymentType::Cash, order.total)];
            orders.push(order);
        }
    }

    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    orders
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    fn order_at(id: &str, at: DateTime<Utc>, product: &str, qty: u32, cents: i64) -> Order {
        build_order(
            id.to_string(),
            vec![OrderItem {
                product_id: product.to_string(),
                name: product.to_string(),
                sku: None,
                price: Money::from_cents(cents),
                quantity: qty,
            }],
            None,
            vec![],
            Money::zero(),
            TaxRate::zero(),
            at,
        )
    }

    fn fixed_now() -> DateTime<Utc> {
        // Friday
        Utc.with_ymd_and_hms(2026, 10, 16, 15, 30, 0).unwrap()
    }

    #[test]
    fn test_range_is_inclusive() {
        let now = fixed_now();
        let orders = vec![order_at("a", now, "p", 1, 100)];

        assert_eq!(orders_between(&orders, &now, &now).len(), 1);
        assert_eq!(orders_between(&orders, &(now - Duration::days(3)), &(now - Duration::days(1))).len(), 0);
        assert_eq!(today_orders(&orders, &now).len(), 1);
    }

    #[test]
    fn test_windows() {
        let now = fixed_now();
        let (start, end) = week_window(&now);
        assert_eq!(start, Utc.with_ymd_and_hms(2026, 10, 11, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2026, 10, 18, 0, 0, 0).unwrap());

        let (start, end) = month_window(&now);
        assert_eq!(start, Utc.with_ymd_and_hms(2026, 10, 1, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2026, 11, 1, 0, 0, 0).unwrap());

        let december = Utc.with_ymd_and_hms(2026, 12, 5, 0, 0, 0).unwrap();
        assert_eq!(month_window(&december).1, Utc.with_ymd_and_hms(2027, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_today_respects_time_zone() {
        // 01:00 on the 17th in UTC+5 is still the 16th in UTC.
        let tz = FixedOffset::east_opt(5 * 3600).unwrap();
        let local_now = tz.with_ymd_and_hms(2026, 10, 17, 1, 0, 0).unwrap();
        let order_utc = Utc.with_ymd_and_hms(2026, 10, 16, 19, 30, 0).unwrap();
        let orders = vec![order_at("a", order_utc, "p", 1, 100)];

        assert_eq!(today_orders(&orders, &local_now).len(), 1);
        assert_eq!(today_orders(&orders, &Utc.with_ymd_and_hms(2026, 10, 17, 1, 0, 0).unwrap()).len(), 0);
    }

    #[test]
    fn test_daily_revenue_labels() {
        let now = fixed_now();
        let orders = vec![
            order_at("a", now, "p", 2, 500),
            order_at("b", now - Duration::days(1), "p", 1, 300),
        ];
        let days = daily_revenue(&orders, 3, &now);

        assert_eq!(days.len(), 3);
        assert_eq!(days[2].date, "Fri, Oct 16");
        assert_eq!(days[2].revenue, Money::from_cents(1000));
        assert_eq!(days[1].date, "Thu, Oct 15");
        assert_eq!(days[1].orders, 1);
        assert_eq!(days[0].orders, 0);
    }

    #[test]
    fn test_weekly_revenue_rolling() {
        let now = fixed_now();
        let orders = vec![
            order_at("a", now - Duration::days(1), "p", 1, 1000),
            order_at("b", now - Duration::days(8), "p", 1, 200),
        ];
        let weeks = weekly_revenue(&orders, 2, &now);

        assert_eq!(weeks[0].week, "Week 1");
        assert_eq!(weeks[0].revenue, Money::from_cents(200));
        assert_eq!(weeks[1].week, "Week 2");
        assert_eq!(weeks[1].revenue, Money::from_cents(1000));
    }

    #[test]
    fn test_oversized_spans_are_capped() {
        let now = fixed_now();
        let orders = vec![order_at("a", now, "p", 1, 100)];

        let days = daily_revenue(&orders, u32::MAX, &now);
        assert_eq!(days.len(), MAX_REPORT_DAYS as usize);
        assert_eq!(days.last().unwrap().orders, 1);

        let weeks = weekly_revenue(&orders, u32::MAX, &now);
        assert_eq!(weeks.len(), MAX_REPORT_WEEKS as usize);
        assert_eq!(weeks.last().unwrap().week, format!("Week {}", MAX_REPORT_WEEKS));
    }

    #[test]
    fn test_best_sellers_stable_ties() {
        let now = fixed_now();
        let orders = vec![
            order_at("a", now, "latte", 2, 525),
            order_at("b", now, "muffin", 2, 350),
            order_at("c", now, "coffee", 5, 450),
        ];
        let best = best_selling_products(&orders, 2);

        assert_eq!(best.len(), 2);
        assert_eq!(best[0].product_id, "coffee");
        assert_eq!(best[0].revenue, Money::from_cents(2250));
        assert_eq!(best[1].product_id, "latte");
    }

    #[test]
    fn test_sales_summary() {
        let now = fixed_now();
        let orders = vec![
            order_at("a", now, "p", 1, 1000),
            order_at("b", now - Duration::days(40), "p", 1, 2000),
        ];
        let summary = sales_summary(&orders, &now);

        assert_eq!(summary.today_orders, 1);
        assert_eq!(summary.month_revenue, Money::from_cents(1000));
        assert_eq!(summary.average_order_value, Money::from_cents(1500));

        let empty = sales_summary(&[], &now);
        assert!(empty.average_order_value.is_zero());
    }

    #[test]
    fn test_sample_orders_are_deterministic() {
        let now = fixed_now();
        let a = generate_sample_orders(&now, TaxRate::default());
        let b = generate_sample_orders(&now, TaxRate::default());

        assert_eq!(a, b);
        assert!(a.len() >= 14 * 3 && a.len() <= 14 * 10);
        assert!(a.windows(2).all(|w| w[0].created_at >= w[1].created_at));
        assert!(a.iter().all(|o| o.total_paid() == o.total && !o.items.is_empty()));
    }
}
