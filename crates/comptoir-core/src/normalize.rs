//! # Sale Normalization
//!
//! The single place where a sale's shape is looked at. Every aggregate in
//! the crate goes through [`normalize`] (or [`line_values`] for per-product
//! views), so a sale contributes the same revenue to a card, a chart and a
//! modal.
//!
//! ## Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  MultiProduct                                                           │
//! │    revenue  = totalSellingPrice  ?? Σ sellingPrice × quantitySold       │
//! │    cost     = totalPurchasePrice ?? Σ purchasePrice × quantitySold      │
//! │    profit   = totalProfit        ?? Σ line.profit                       │
//! │    quantity = Σ quantitySold                                            │
//! │                                                                         │
//! │  Legacy                                                                 │
//! │    revenue  = sellingPrice × quantitySold                               │
//! │    cost     = purchasePrice × quantitySold                              │
//! │    profit   = profit ?? revenue - cost                                  │
//! │    quantity = quantitySold                                              │
//! │                                                                         │
//! │  Unpriced → all zero                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Legacy revenue is always unit price × quantity, including on the profit
//! and loss statement.

use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign};
use ts_rs::TS;

use crate::money::Money;
use crate::types::{LegacySale, MultiProductSale, ProductLine, SaleItems, SaleRecord};

// =============================================================================
// Sale Values
// =============================================================================

/// The canonical `{revenue, cost, profit, quantity}` tuple of a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SaleValues {
    pub revenue: Money,
    pub cost: Money,
    pub profit: Money,
    pub quantity: i64,
}

impl SaleValues {
    /// All-zero values.
    pub const ZERO: SaleValues = SaleValues {
        revenue: Money::zero(),
        cost: Money::zero(),
        profit: Money::zero(),
        quantity: 0,
    };
}

impl Add for SaleValues {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        SaleValues {
            revenue: self.revenue + other.revenue,
            cost: self.cost + other.cost,
            profit: self.profit + other.profit,
            quantity: self.quantity + other.quantity,
        }
    }
}

impl AddAssign for SaleValues {
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

/// Normalizes one sale. Pure, never fails.
///
/// ## Example
/// ```rust
/// use chrono::NaiveDate;
/// use comptoir_core::money::Money;
/// use comptoir_core::normalize::normalize;
/// use comptoir_core::types::{LegacySale, SaleRecord};
///
/// let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap().and_hms_opt(9, 0, 0).unwrap();
/// let sale = SaleRecord::legacy("s1", date, LegacySale {
///     selling_price: Money::from_cents(5000),
///     purchase_price: Money::from_cents(2000),
///     quantity_sold: 2,
///     ..LegacySale::default()
/// });
///
/// let values = normalize(&sale);
/// assert_eq!(values.revenue.cents(), 10000);
/// assert_eq!(values.profit.cents(), 6000); // no recorded profit → revenue - cost
/// ```
pub fn normalize(sale: &SaleRecord) -> SaleValues {
    match &sale.items {
        SaleItems::MultiProduct(multi) => normalize_multi(multi),
        SaleItems::Legacy(legacy) => legacy_values(legacy),
        SaleItems::Unpriced => SaleValues::ZERO,
    }
}

fn normalize_multi(multi: &MultiProductSale) -> SaleValues {
    let lines = multi
        .products
        .iter()
        .map(product_line_values)
        .fold(SaleValues::ZERO, Add::add);

    SaleValues {
        revenue: multi.total_selling_price.unwrap_or(lines.revenue),
        cost: multi.total_purchase_price.unwrap_or(lines.cost),
        profit: multi.total_profit.unwrap_or(lines.profit),
        quantity: lines.quantity,
    }
}

fn product_line_values(line: &ProductLine) -> SaleValues {
    SaleValues {
        revenue: line.selling_price.multiply_quantity(line.quantity_sold),
        cost: line.purchase_price.multiply_quantity(line.quantity_sold),
        profit: line.profit,
        quantity: line.quantity_sold,
    }
}

fn legacy_values(legacy: &LegacySale) -> SaleValues {
    let revenue = legacy.selling_price.multiply_quantity(legacy.quantity_sold);
    let cost = legacy.purchase_price.multiply_quantity(legacy.quantity_sold);
    SaleValues {
        revenue,
        cost,
        profit: legacy.profit.unwrap_or(revenue - cost),
        quantity: legacy.quantity_sold,
    }
}

impl SaleRecord {
    /// Shorthand for [`normalize`].
    #[inline]
    pub fn values(&self) -> SaleValues {
        normalize(self)
    }
}

// =============================================================================
// Line Values
// =============================================================================

/// Per-product contribution of a sale.
///
/// Line values ignore the multi-product totals overrides (those only exist
/// at sale level).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineValues<'a> {
    /// `None` for legacy sales recorded without a product id.
    pub product_id: Option<&'a str>,
    pub description: Option<&'a str>,
    pub values: SaleValues,
}

/// Per-product lines of a sale, in recorded order.
///
/// A legacy sale yields one line, an unpriced sale none.
pub fn line_values(sale: &SaleRecord) -> Vec<LineValues<'_>> {
    match &sale.items {
        SaleItems::MultiProduct(multi) => multi
            .products
            .iter()
            .map(|line| LineValues {
                product_id: non_empty(&line.product_id),
                description: non_empty(&line.description),
                values: product_line_values(line),
            })
            .collect(),
        SaleItems::Legacy(legacy) => vec![LineValues {
            product_id: legacy.product_id.as_deref().and_then(non_empty),
            description: legacy.description.as_deref().and_then(non_empty),
            values: legacy_values(legacy),
        }],
        SaleItems::Unpriced => Vec::new(),
    }
}

fn non_empty(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

/// Quantity of `product_id` sold in one sale, across all its lines.
pub fn quantity_of(sale: &SaleRecord, product_id: &str) -> i64 {
    line_values(sale)
        .iter()
        .filter(|line| line.product_id == Some(product_id))
        .map(|line| line.values.quantity)
        .sum()
}

// =============================================================================
// Unit Tests
// =============================================================================
