//! # Trend Predictor
//!
//! A deliberately naive projector. It looks at the last three calendar
//! months, measures the revenue growth between the first and last of them
//! and stretches the monthly average over three horizons.
//!
//! ```text
//! ┌──────────────┬────────────────────────────────────┬────────────┬───────────┐
//! │ Horizon      │ Revenue estimate                   │ Confidence │ Trend cut │
//! ├──────────────┼────────────────────────────────────┼────────────┼───────────┤
//! │ next week    │ avg × 0.25 × (1 + growth)          │ high       │ ±0.10     │
//! │ next month   │ avg × (1 + growth × 1.2)           │ medium     │ ±0.05     │
//! │ next quarter │ avg × 3 × (1 + growth × 0.8)       │ low        │ 0         │
//! └──────────────┴────────────────────────────────────┴────────────┴───────────┘
//! ```
//!
//! No seasonality, no intervals. The constants are heuristics and are kept
//! as they are.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::aggregate::{aggregate, BucketAggregate};
use crate::money::Money;
use crate::period::trailing_months;
use crate::types::SaleRecord;

/// Months looked at, including the month containing `now`.
pub const WINDOW_MONTHS: usize = 3;

// =============================================================================
// Labels
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum Horizon {
    NextWeek,
    NextMonth,
    NextQuarter,
}

impl Horizon {
    pub const ALL: [Horizon; 3] = [Horizon::NextWeek, Horizon::NextMonth, Horizon::NextQuarter];

    /// `(base, growth weight)`: estimate = avg × base × (1 + growth × weight).
    fn factors(&self) -> (f64, f64) {
        match self {
            Horizon::NextWeek => (0.25, 1.0),
            Horizon::NextMonth => (1.0, 1.2),
            Horizon::NextQuarter => (3.0, 0.8),
        }
    }

    /// Growth beyond ± this value is a trend.
    pub fn trend_threshold(&self) -> f64 {
        match self {
            Horizon::NextWeek => 0.1,
            Horizon::NextMonth => 0.05,
            Horizon::NextQuarter => 0.0,
        }
    }

    pub fn confidence(&self) -> Confidence {
        match self {
            Horizon::NextWeek => Confidence::High,
            Horizon::NextMonth => Confidence::Medium,
            Horizon::NextQuarter => Confidence::Low,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Horizon::NextWeek => "Semaine prochaine",
            Horizon::NextMonth => "Mois prochain",
            Horizon::NextQuarter => "Trimestre prochain",
        }
    }
}

impl fmt::Display for Horizon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Confidence {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum Trend {
    Up,
    Down,
    Stable,
}

impl Trend {
    /// `Up` above `threshold`, `Down` below `-threshold`.
    pub fn from_growth(growth: f64, threshold: f64) -> Self {
        if growth > threshold {
            Trend::Up
        } else if growth < -threshold {
            Trend::Down
        } else {
            Trend::Stable
        }
    }
}

// =============================================================================
// Forecast
// =============================================================================

/// Estimate for one horizon.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Prediction {
    pub horizon: Horizon,
    pub revenue: Money,
    pub sales_count: i64,
    pub confidence: Confidence,
    pub trend: Trend,
}

/// Predictor output with the inputs it was derived from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Forecast {
    /// Months of the window that had sales, oldest first.
    pub months: Vec<BucketAggregate>,
    pub avg_revenue: Money,
    pub avg_sales_count: f64,
    /// Ratio, not percent: 0.2 is +20%.
    pub revenue_growth: f64,
    pub predictions: Vec<Prediction>,
}

/// `(last - first) / (first || 1)`, on euro amounts.
///
/// A zero first month divides by one euro.
fn revenue_growth(first: Money, last: Money) -> f64 {
    let first = first.to_euros();
    let divisor = if first == 0.0 { 1.0 } else { first };
    (last.to_euros() - first) / divisor
}

/// Projects revenue and sales count for the next week, month and quarter.
///
/// ## Example
/// ```rust
/// use chrono::NaiveDate;
/// use comptoir_core::forecast::predict;
///
/// let now = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap().and_hms_opt(10, 0, 0).unwrap();
/// let forecast = predict(&[], now);
/// assert!(forecast.months.is_empty());
/// assert_eq!(forecast.predictions.len(), 3);
/// assert!(forecast.predictions.iter().all(|p| p.revenue.is_zero()));
/// ```
pub fn predict(sales: &[SaleRecord], now: NaiveDateTime) -> Forecast {
    let months: Vec<BucketAggregate> = trailing_months(now.date(), WINDOW_MONTHS)
        .into_iter()
        .map(|bucket| BucketAggregate::new(bucket, aggregate(sales, &bucket)))
        .filter(|month| !month.stats.is_empty())
        .collect();

    let count = months.len().max(1);
    let total_revenue: Money = months.iter().map(|m| m.stats.revenue).sum();
    let total_sales: u64 = months.iter().map(|m| m.stats.sales_count as u64).sum();
    let avg_sales_count = total_sales as f64 / count as f64;

    let growth = match (months.first(), months.last()) {
        (Some(first), Some(last)) => revenue_growth(first.stats.revenue, last.stats.revenue),
        _ => 0.0,
    };

    let predictions = Horizon::ALL
        .iter()
        .map(|horizon| {
            let (base, weight) = horizon.factors();
            let factor = base * (1.0 + growth * weight);
            Prediction {
                horizon: *horizon,
                revenue: total_revenue.scale(factor / count as f64),
                sales_count: (avg_sales_count * factor).round() as i64,
                confidence: horizon.confidence(),
                trend: Trend::from_growth(growth, horizon.trend_threshold()),
            }
        })
        .collect();

    Forecast {
        avg_revenue: total_revenue.div_round(count as i64),
        avg_sales_count,
        revenue_growth: growth,
        predictions,
        months,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
