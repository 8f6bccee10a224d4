//! # Objective Tracking
//!
//! Targets set by the shop owner ("5 000 € de CA ce mois-ci") measured
//! against the bucket containing `now`.
//!
//! Targets are in natural units: euros for `revenue` and `profit`, a number
//! of sales for `sales_count`. Progress values use the same units.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::aggregate::{aggregate, PeriodAggregate};
use crate::error::CoreError;
use crate::period::{Bucket, Period};
use crate::types::SaleRecord;

// =============================================================================
// Objective
// =============================================================================

/// What an objective measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum ObjectiveMetric {
    Revenue,
    Profit,
    #[serde(alias = "salesCount")]
    SalesCount,
}

impl ObjectiveMetric {
    /// Reads the metric off an aggregate, in natural units.
    pub fn measure(&self, stats: &PeriodAggregate) -> f64 {
        match self {
            ObjectiveMetric::Revenue => stats.revenue.to_euros(),
            ObjectiveMetric::Profit => stats.profit.to_euros(),
            ObjectiveMetric::SalesCount => stats.sales_count as f64,
        }
    }
}

impl fmt::Display for ObjectiveMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectiveMetric::Revenue => write!(f, "revenue"),
            ObjectiveMetric::Profit => write!(f, "profit"),
            ObjectiveMetric::SalesCount => write!(f, "sales_count"),
        }
    }
}

impl FromStr for ObjectiveMetric {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "revenue" | "ca" | "chiffre_affaires" => Ok(ObjectiveMetric::Revenue),
            "profit" | "benefice" | "bénéfice" => Ok(ObjectiveMetric::Profit),
            "sales_count" | "salescount" | "ventes" => Ok(ObjectiveMetric::SalesCount),
            _ => Err(CoreError::InvalidMetric(s.to_string())),
        }
    }
}

/// A target for one metric over one period granularity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Objective {
    #[serde(default)]
    pub name: Option<String>,
    pub metric: ObjectiveMetric,
    #[serde(default)]
    pub period: Period,
    pub target: f64,
}

impl Objective {
    pub fn new(metric: ObjectiveMetric, period: Period, target: f64) -> Self {
        Objective {
            name: None,
            metric,
            period,
            target,
        }
    }
}

// =============================================================================
// Progress
// =============================================================================

/// Where an objective stands at `now`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ObjectiveProgress {
    pub objective: Objective,
    pub bucket: Bucket,
    pub actual: f64,
    /// `actual / target × 100`; 0 when the target is not positive.
    pub progress_percent: f64,
    /// Never negative.
    pub remaining: f64,
    /// Share of the bucket already elapsed, in percent.
    pub elapsed_percent: f64,
    /// Progress keeps pace with elapsed time.
    pub on_track: bool,
    pub achieved: bool,
}

/// Measures one objective over the bucket containing `now`.
///
/// ## Example
/// ```rust
/// use chrono::NaiveDate;
/// use comptoir_core::objectives::{progress, Objective, ObjectiveMetric};
/// use comptoir_core::period::Period;
///
/// let now = NaiveDate::from_ymd_opt(2024, 6, 16).unwrap().and_hms_opt(0, 0, 0).unwrap();
/// let goal = Objective::new(ObjectiveMetric::SalesCount, Period::Month, 10.0);
/// let p = progress(&goal, &[], now);
/// assert_eq!(p.actual, 0.0);
/// assert_eq!(p.remaining, 10.0);
/// assert!(!p.on_track);
/// ```
pub fn progress(objective: &Objective, sales: &[SaleRecord], now: NaiveDateTime) -> ObjectiveProgress {
    let bucket = Bucket::containing(objective.period, now.date());
    let actual = objective.metric.measure(&aggregate(sales, &bucket));
    let target = objective.target;

    let progress_percent = if target > 0.0 {
        actual / target * 100.0
    } else {
        0.0
    };
    let elapsed_percent = bucket.elapsed_fraction(now) * 100.0;
    let achieved = target > 0.0 && actual >= target;

    ObjectiveProgress {
        objective: objective.clone(),
        bucket,
        actual,
        progress_percent,
        remaining: (target - actual).max(0.0),
        elapsed_percent,
        on_track: achieved || (target > 0.0 && progress_percent >= elapsed_percent),
        achieved,
    }
}

/// [`progress`] for every objective, in input order.
pub fn track_objectives(
    objectives: &[Objective],
    sales: &[SaleRecord],
    now: NaiveDateTime,
) -> Vec<ObjectiveProgress> {
    objectives
        .iter()
        .map(|objective| progress(objective, sales, now))
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================
