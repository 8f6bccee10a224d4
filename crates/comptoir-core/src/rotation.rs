//! # Stock Rotation
//!
//! Combines the current inventory snapshot with sales history to estimate
//! how fast each product turns over.
//!
//! ## Formula
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  totalSold       = Σ quantity sold up to now                            │
//! │  recentSales     = Σ quantity sold in the 90 days before now            │
//! │  avgStock        = (currentStock + totalSold) / 2                       │
//! │  rotationRate    = avgStock > 0 ? recentSales / avgStock × 4 : 0        │
//! │  daysWithoutSale = days since last sale, 365 when never sold            │
//! │  stockValue      = currentStock × purchasePrice                         │
//! │                                                                         │
//! │  rate > 8   → Très Rapide                                               │
//! │  rate > 4   → Rapide                                                    │
//! │  rate > 2   → Moyen                                                     │
//! │  rate > 0.5 → Lent                                                      │
//! │  otherwise  → Immobile                                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `now` is always passed in; nothing here reads the system clock.

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use ts_rs::TS;

use crate::money::Money;
use crate::normalize::line_values;
use crate::types::{ProductSnapshot, SaleRecord};

/// Length of the "recent sales" window.
pub const RECENT_WINDOW_DAYS: i64 = 90;

/// Turns a 90-day rate into a yearly one.
pub const ANNUALIZATION_FACTOR: f64 = 4.0;

/// `days_without_sale` for a product that never sold. A sentinel, not a
/// measurement.
pub const NEVER_SOLD_DAYS: i64 = 365;

/// Default idle threshold for dead stock.
pub const DEFAULT_DEAD_STOCK_DAYS: i64 = 90;

// =============================================================================
// Category
// =============================================================================

/// Rotation speed bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum RotationCategory {
    #[serde(rename = "Très Rapide")]
    TresRapide,
    #[serde(rename = "Rapide")]
    Rapide,
    #[serde(rename = "Moyen")]
    Moyen,
    #[serde(rename = "Lent")]
    Lent,
    #[serde(rename = "Immobile")]
    Immobile,
}

impl RotationCategory {
    /// Fastest first.
    pub const ALL: [RotationCategory; 5] = [
        RotationCategory::TresRapide,
        RotationCategory::Rapide,
        RotationCategory::Moyen,
        RotationCategory::Lent,
        RotationCategory::Immobile,
    ];

    /// Classifies a rotation rate. Thresholds are strict lower bounds.
    ///
    /// ## Example
    /// ```rust
    /// use comptoir_core::rotation::RotationCategory;
    ///
    /// assert_eq!(RotationCategory::classify(8.0), RotationCategory::Rapide);
    /// assert_eq!(RotationCategory::classify(8.01), RotationCategory::TresRapide);
    /// assert_eq!(RotationCategory::classify(0.5), RotationCategory::Immobile);
    /// ```
    pub fn classify(rate: f64) -> Self {
        if rate > 8.0 {
            RotationCategory::TresRapide
        } else if rate > 4.0 {
            RotationCategory::Rapide
        } else if rate > 2.0 {
            RotationCategory::Moyen
        } else if rate > 0.5 {
            RotationCategory::Lent
        } else {
            RotationCategory::Immobile
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RotationCategory::TresRapide => "Très Rapide",
            RotationCategory::Rapide => "Rapide",
            RotationCategory::Moyen => "Moyen",
            RotationCategory::Lent => "Lent",
            RotationCategory::Immobile => "Immobile",
        }
    }
}

impl fmt::Display for RotationCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Annualized rotation rate.
///
/// Zero when the average stock is not positive.
pub fn rotation_rate(recent_sales: i64, avg_stock: f64) -> f64 {
    if avg_stock > 0.0 {
        recent_sales as f64 / avg_stock * ANNUALIZATION_FACTOR
    } else {
        0.0
    }
}

// =============================================================================
// Entries
// =============================================================================

/// Rotation figures of one product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct RotationEntry {
    pub product_id: String,
    pub description: String,
    pub current_stock: i64,
    pub total_sold: i64,
    pub recent_sales: i64,
    pub avg_stock: f64,
    pub rotation_rate: f64,
    pub days_without_sale: i64,
    #[ts(type = "string | null")]
    #[serde(default, with = "last_sale_format")]
    pub last_sale: Option<NaiveDateTime>,
    pub category: RotationCategory,
    pub stock_value: Money,
}

mod last_sale_format {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<NaiveDateTime>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(ts) => crate::timestamp::serialize(ts, serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveDateTime>, D::Error> {
        Option::<String>::deserialize(deserializer)?
            .map(|text| crate::timestamp::parse_timestamp(&text).map_err(serde::de::Error::custom))
            .transpose()
    }
}

#[derive(Default)]
struct SalesHistory {
    total: i64,
    recent: i64,
    last_sale: Option<NaiveDateTime>,
}

/// Per-product sales history in one pass.
fn sales_history(sales: &[SaleRecord], now: NaiveDateTime) -> HashMap<&str, SalesHistory> {
    let window_start = now - Duration::days(RECENT_WINDOW_DAYS);
    let mut history: HashMap<&str, SalesHistory> = HashMap::new();

    for sale in sales.iter().filter(|sale| sale.date <= now) {
        for line in line_values(sale) {
            let Some(product_id) = line.product_id else {
                continue;
            };
            let entry = history.entry(product_id).or_default();
            entry.total += line.values.quantity;
            if sale.date >= window_start {
                entry.recent += line.values.quantity;
            }
            if entry.last_sale.map_or(true, |last| sale.date > last) {
                entry.last_sale = Some(sale.date);
            }
        }
    }
    history
}

/// Classifies every product, in input order.
pub fn classify(
    products: &[ProductSnapshot],
    sales: &[SaleRecord],
    now: NaiveDateTime,
) -> Vec<RotationEntry> {
    let history = sales_history(sales, now);
    let empty = SalesHistory::default();

    products
        .iter()
        .map(|product| {
            let sold = history.get(product.id.as_str()).unwrap_or(&empty);
            let avg_stock = (product.quantity + sold.total) as f64 / 2.0;
            let rate = rotation_rate(sold.recent, avg_stock);
            let days_without_sale = sold
                .last_sale
                .map_or(NEVER_SOLD_DAYS, |last| (now - last).num_days().max(0));

            RotationEntry {
                product_id: product.id.clone(),
                description: product.description.clone(),
                current_stock: product.quantity,
                total_sold: sold.total,
                recent_sales: sold.recent,
                avg_stock,
                rotation_rate: rate,
                days_without_sale,
                last_sale: sold.last_sale,
                category: RotationCategory::classify(rate),
                stock_value: product.purchase_price.multiply_quantity(product.quantity),
            }
        })
        .collect()
}

// =============================================================================
// Summary
// =============================================================================

/// Products and stock value within one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CategoryCount {
    pub category: RotationCategory,
    pub count: u32,
    pub stock_value: Money,
}

/// Inventory overview built from [`classify`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct RotationSummary {
    pub entries: Vec<RotationEntry>,
    /// Fastest category first, all five present.
    pub by_category: Vec<CategoryCount>,
    pub total_stock_value: Money,
    pub dead_stock_days: i64,
    pub dead_stock_count: u32,
    pub dead_stock_value: Money,
}

impl RotationEntry {
    /// Immobile, or idle for at least `dead_stock_days`.
    pub fn is_dead_stock(&self, dead_stock_days: i64) -> bool {
        self.category == RotationCategory::Immobile || self.days_without_sale >= dead_stock_days
    }
}

/// Classifies products and summarizes the result.
pub fn rotation_summary(
    products: &[ProductSnapshot],
    sales: &[SaleRecord],
    now: NaiveDateTime,
    dead_stock_days: i64,
) -> RotationSummary {
    let entries = classify(products, sales, now);

    let by_category = RotationCategory::ALL
        .iter()
        .map(|category| {
            let members = entries.iter().filter(|e| e.category == *category);
            CategoryCount {
                category: *category,
                count: members.clone().count() as u32,
                stock_value: members.map(|e| e.stock_value).sum(),
            }
        })
        .collect();

    let dead: Vec<&RotationEntry> = entries
        .iter()
        .filter(|e| e.is_dead_stock(dead_stock_days))
        .collect();

    RotationSummary {
        by_category,
        total_stock_value: entries.iter().map(|e| e.stock_value).sum(),
        dead_stock_days,
        dead_stock_count: dead.len() as u32,
        dead_stock_value: dead.iter().map(|e| e.stock_value).sum(),
        entries,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::tests::{euros, legacy_sale, line, multi_sale, ts};
    use proptest::prelude::*;

    fn product(id: &str, quantity: i64, purchase: i64) -> ProductSnapshot {
        ProductSnapshot {
            id: id.to_string(),
            description: format!("Produit {}", id),
            quantity,
            purchase_price: euros(purchase),
        }
    }

    #[test]
    fn test_category_boundaries() {
        assert_eq!(RotationCategory::classify(8.0), RotationCategory::Rapide);
        assert_eq!(RotationCategory::classify(4.0), RotationCategory::Moyen);
        assert_eq!(RotationCategory::classify(2.0), RotationCategory::Lent);
        assert_eq!(RotationCategory::classify(0.5), RotationCategory::Immobile);
        assert_eq!(RotationCategory::classify(0.0), RotationCategory::Immobile);
        assert_eq!(RotationCategory::classify(12.0), RotationCategory::TresRapide);
    }

    #[test]
    fn test_category_serializes_french_label() {
        let json = serde_json::to_string(&RotationCategory::TresRapide).unwrap();
        assert_eq!(json, "\"Très Rapide\"");
        let parsed: RotationCategory = serde_json::from_str("\"Immobile\"").unwrap();
        assert_eq!(parsed, RotationCategory::Immobile);
    }

    #[test]
    fn test_never_sold_product() {
        let now = ts(2024, 6, 30);
        let entries = classify(&[product("p1", 10, 3)], &[], now);
        assert_eq!(entries[0].days_without_sale, NEVER_SOLD_DAYS);
        assert_eq!(entries[0].rotation_rate, 0.0);
        assert_eq!(entries[0].category, RotationCategory::Immobile);
        assert_eq!(entries[0].stock_value, euros(30));
        assert!(entries[0].last_sale.is_none());
    }

    #[test]
    fn test_rotation_from_mixed_sales() {
        let now = ts(2024, 6, 30);
        let sales = vec![
            // outside the 90-day window
            legacy_sale("s1", ts(2024, 1, 10), "p1", 10, 5, 6, None),
            multi_sale("s2", ts(2024, 6, 1), vec![line("p1", 10, 5, 3, 15), line("p2", 4, 1, 1, 3)]),
            legacy_sale("s3", ts(2024, 6, 20), "p1", 10, 5, 1, None),
        ];
        let entries = classify(&[product("p1", 6, 5), product("p2", 0, 1)], &sales, now);

        let p1 = &entries[0];
        assert_eq!(p1.total_sold, 10);
        assert_eq!(p1.recent_sales, 4);
        assert_eq!(p1.avg_stock, 8.0);
        assert_eq!(p1.rotation_rate, 2.0);
        assert_eq!(p1.category, RotationCategory::Lent);
        assert_eq!(p1.days_without_sale, 10);
        assert_eq!(p1.last_sale, Some(ts(2024, 6, 20)));

        // avg stock 0.5, one recent sale → 8.0, not "Très Rapide"
        let p2 = &entries[1];
        assert_eq!(p2.rotation_rate, 8.0);
        assert_eq!(p2.category, RotationCategory::Rapide);
        assert_eq!(p2.stock_value, Money::zero());
    }

    #[test]
    fn test_zero_average_stock() {
        assert_eq!(rotation_rate(5, 0.0), 0.0);
        let entries = classify(&[product("p1", 0, 2)], &[], ts(2024, 1, 1));
        assert_eq!(entries[0].avg_stock, 0.0);
        assert_eq!(entries[0].rotation_rate, 0.0);
    }

    #[test]
    fn test_sales_after_now_are_ignored() {
        let now = ts(2024, 6, 30);
        let past = vec![legacy_sale("s1", ts(2024, 6, 10), "p1", 10, 5, 2, None)];
        let mut with_future = past.clone();
        with_future.push(legacy_sale("s2", ts(2024, 7, 15), "p1", 10, 5, 9, None));

        let expected = classify(&[product("p1", 4, 5)], &past, now);
        let entries = classify(&[product("p1", 4, 5)], &with_future, now);
        assert_eq!(entries, expected);
        assert_eq!(entries[0].recent_sales, 2);
        assert_eq!(entries[0].days_without_sale, 20);
    }

    #[test]
    fn test_summary_dead_stock() {
        let now = ts(2024, 6, 30);
        let sales = vec![
            legacy_sale("s1", ts(2024, 6, 25), "fast", 10, 5, 20, None),
            legacy_sale("s2", ts(2024, 1, 2), "old", 10, 5, 1, None),
        ];
        let products = vec![product("fast", 2, 5), product("old", 4, 2), product("never", 1, 7)];
        let summary = rotation_summary(&products, &sales, now, DEFAULT_DEAD_STOCK_DAYS);

        assert_eq!(summary.entries.len(), 3);
        assert_eq!(summary.total_stock_value, euros(25));
        assert_eq!(summary.dead_stock_count, 2);
        assert_eq!(summary.dead_stock_value, euros(15));
        assert_eq!(summary.by_category.len(), 5);
        assert_eq!(summary.by_category[0].category, RotationCategory::TresRapide);
        assert_eq!(summary.by_category[0].count, 0);
        // 20 recent over an average stock of 11
        assert_eq!(summary.by_category[1].category, RotationCategory::Rapide);
        assert_eq!(summary.by_category[1].count, 1);
        assert_eq!(summary.by_category[4].count, 2);
        assert_eq!(summary.by_category[4].stock_value, euros(15));
    }

    #[test]
    fn test_entry_json_shape() {
        let now = ts(2024, 6, 30);
        let sales = vec![legacy_sale("s1", ts(2024, 6, 25), "p1", 10, 5, 1, None)];
        let entries = classify(&[product("p1", 3, 5)], &sales, now);
        let json = serde_json::to_value(&entries[0]).unwrap();
        assert_eq!(json["productId"], "p1");
        assert_eq!(json["lastSale"], "2024-06-25T12:00:00");
        assert_eq!(json["stockValue"], 1500);
        assert_eq!(json["category"], "Lent");
    }

    proptest! {
        #[test]
        fn prop_rate_monotonic_in_recent_sales(
            recent in 0i64..10_000,
            extra in 0i64..10_000,
            avg_stock in 0.0f64..10_000.0,
        ) {
            prop_assert!(rotation_rate(recent + extra, avg_stock) >= rotation_rate(recent, avg_stock));
        }

        #[test]
        fn prop_category_never_faster_for_lower_rate(a in 0.0f64..20.0, b in 0.0f64..20.0) {
            let (low, high) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(RotationCategory::classify(low) >= RotationCategory::classify(high));
        }
    }
}
