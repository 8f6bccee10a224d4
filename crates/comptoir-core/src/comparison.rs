//! # Year Comparison
//!
//! Cross-year aggregates, year-over-year deltas and the month insights of a
//! single year.
//!
//! ## Ranking
//! Best and worst are a strict `>` / `<` scan over chronologically sorted
//! entries, so on ties the earliest year (or month) wins.

use chrono::Datelike;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::aggregate::{
    aggregate, aggregate_by_period, money_change, percent_change, BucketAggregate, PeriodAggregate,
};
use crate::money::Money;
use crate::period::{Bucket, Period};
use crate::types::SaleRecord;

// =============================================================================
// Yearly Aggregates
// =============================================================================

/// One calendar year of sales.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct YearlyAggregate {
    pub year: i32,
    #[serde(flatten)]
    pub stats: PeriodAggregate,
}

/// Reference year against the year before it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct YearOverYear {
    pub current: YearlyAggregate,
    pub previous: YearlyAggregate,
    pub revenue_change: f64,
    pub profit_change: f64,
    pub sales_count_change: f64,
    pub avg_order_value_change: f64,
    /// Margin points.
    pub margin_delta: f64,
}

/// Full cross-year view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct YearComparison {
    /// Years with at least one sale, ascending.
    pub per_year: Vec<YearlyAggregate>,
    pub current_vs_previous: YearOverYear,
    pub best_by_revenue: Option<YearlyAggregate>,
    pub worst_by_revenue: Option<YearlyAggregate>,
    pub best_by_profit: Option<YearlyAggregate>,
    pub worst_by_profit: Option<YearlyAggregate>,
}

/// One aggregate per calendar year that has data, ascending.
pub fn yearly_aggregates(sales: &[SaleRecord]) -> Vec<YearlyAggregate> {
    aggregate_by_period(sales, Period::Year)
        .into_iter()
        .map(|entry| YearlyAggregate {
            year: entry.bucket.start.year(),
            stats: entry.stats,
        })
        .collect()
}

/// Compares `reference_year` with the year before it and ranks every year.
///
/// ## Example
/// ```rust
/// use comptoir_core::comparison::compare_years;
///
/// let cmp = compare_years(&[], 2024);
/// assert!(cmp.per_year.is_empty());
/// assert!(cmp.best_by_revenue.is_none());
/// assert_eq!(cmp.current_vs_previous.revenue_change, 0.0);
/// ```
pub fn compare_years(sales: &[SaleRecord], reference_year: i32) -> YearComparison {
    let per_year = yearly_aggregates(sales);

    let current = YearlyAggregate {
        year: reference_year,
        stats: aggregate(sales, &Bucket::year(reference_year)),
    };
    let previous = YearlyAggregate {
        year: reference_year - 1,
        stats: aggregate(sales, &Bucket::year(reference_year - 1)),
    };

    YearComparison {
        current_vs_previous: year_over_year(current, previous),
        best_by_revenue: best_by(&per_year, |y| y.stats.revenue),
        worst_by_revenue: worst_by(&per_year, |y| y.stats.revenue),
        best_by_profit: best_by(&per_year, |y| y.stats.profit),
        worst_by_profit: worst_by(&per_year, |y| y.stats.profit),
        per_year,
    }
}

fn year_over_year(current: YearlyAggregate, previous: YearlyAggregate) -> YearOverYear {
    YearOverYear {
        revenue_change: money_change(current.stats.revenue, previous.stats.revenue),
        profit_change: money_change(current.stats.profit, previous.stats.profit),
        sales_count_change: percent_change(
            current.stats.sales_count as f64,
            previous.stats.sales_count as f64,
        ),
        avg_order_value_change: money_change(
            current.stats.avg_order_value,
            previous.stats.avg_order_value,
        ),
        margin_delta: current.stats.margin - previous.stats.margin,
        current,
        previous,
    }
}

/// First entry with the strictly highest key.
fn best_by<T: Clone, F>(entries: &[T], key: F) -> Option<T>
where
    F: Fn(&T) -> Money,
{
    let mut best: Option<&T> = None;
    for entry in entries {
        match best {
            Some(current) if key(entry) <= key(current) => {}
            _ => best = Some(entry),
        }
    }
    best.cloned()
}

/// First entry with the strictly lowest key.
fn worst_by<T: Clone, F>(entries: &[T], key: F) -> Option<T>
where
    F: Fn(&T) -> Money,
{
    let mut worst: Option<&T> = None;
    for entry in entries {
        match worst {
            Some(current) if key(entry) >= key(current) => {}
            _ => worst = Some(entry),
        }
    }
    worst.cloned()
}

// =============================================================================
// Month Insights
// =============================================================================

/// Trend insight over the months of one year.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct MonthInsights {
    pub year: i32,
    /// Months with at least one sale, chronological.
    pub months: Vec<BucketAggregate>,
    pub best_month: Option<BucketAggregate>,
    pub worst_month: Option<BucketAggregate>,
    /// Revenue change between the last two months with data; 0 with fewer
    /// than two.
    pub growth_rate: f64,
    /// Unweighted mean of the monthly margins.
    pub average_margin: f64,
}

/// Month-level insights for `year`.
pub fn month_insights(sales: &[SaleRecord], year: i32) -> MonthInsights {
    let months: Vec<BucketAggregate> = aggregate_by_period(sales, Period::Month)
        .into_iter()
        .filter(|month| month.bucket.start.year() == year)
        .collect();

    let growth_rate = match months.as_slice() {
        [.., before_last, last] => money_change(last.stats.revenue, before_last.stats.revenue),
        _ => 0.0,
    };

    let average_margin = if months.is_empty() {
        0.0
    } else {
        months.iter().map(|m| m.stats.margin).sum::<f64>() / months.len() as f64
    };

    MonthInsights {
        year,
        best_month: best_by(&months, |m| m.stats.revenue),
        worst_month: worst_by(&months, |m| m.stats.revenue),
        growth_rate,
        average_margin,
        months,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
