//! # Consolidated Report
//!
//! Every view of the dashboard computed in one call from one [`Dataset`],
//! so cards, charts, tables and exports read the same figures.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Dataset + ReportOptions { now, period, ... }                           │
//! │      │                                                                  │
//! │      ▼                                                                  │
//! │  build_report ──► BusinessReport                                        │
//! │                    ├── comparison     (bucket of now vs previous)       │
//! │                    ├── accounting     (achats, dépenses, bénéfice réel) │
//! │                    ├── profit_loss                                      │
//! │                    ├── history        (every bucket with sales)         │
//! │                    ├── monthly        (12 months of the current year)   │
//! │                    ├── top_products                                     │
//! │                    ├── years / month_insights                           │
//! │                    ├── rotation                                         │
//! │                    ├── forecast                                         │
//! │                    ├── objectives                                       │
//! │                    └── audit                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{Datelike, NaiveDateTime};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::aggregate::{
    accounting_summary, aggregate_by_period, compare_with_previous, monthly_series, profit_loss,
    top_products, AccountingSummary, BucketAggregate, PeriodComparison, ProductPerformance,
    ProfitLossStatement,
};
use crate::comparison::{compare_years, month_insights, MonthInsights, YearComparison};
use crate::forecast::{predict, Forecast};
use crate::objectives::{track_objectives, Objective, ObjectiveProgress};
use crate::period::{Bucket, Period};
use crate::rotation::{rotation_summary, RotationSummary, DEFAULT_DEAD_STOCK_DAYS};
use crate::types::Dataset;
use crate::validation::{audit, AuditIssue};
use crate::DEFAULT_TOP_PRODUCTS;

// =============================================================================
// Options
// =============================================================================

/// Parameters of one report run.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportOptions {
    /// Reference instant; never read from the system clock here.
    pub now: NaiveDateTime,
    pub period: Period,
    pub objectives: Vec<Objective>,
    pub top_products: usize,
    pub dead_stock_days: i64,
}

impl ReportOptions {
    /// Monthly report at `now` with default limits.
    pub fn new(now: NaiveDateTime) -> Self {
        ReportOptions {
            now,
            period: Period::Month,
            objectives: Vec::new(),
            top_products: DEFAULT_TOP_PRODUCTS,
            dead_stock_days: DEFAULT_DEAD_STOCK_DAYS,
        }
    }

    pub fn with_period(mut self, period: Period) -> Self {
        self.period = period;
        self
    }

    pub fn with_objectives(mut self, objectives: Vec<Objective>) -> Self {
        self.objectives = objectives;
        self
    }
}

// =============================================================================
// Report
// =============================================================================

/// All dashboard figures for one reference instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct BusinessReport {
    #[serde(with = "crate::timestamp")]
    #[ts(type = "string")]
    pub generated_at: NaiveDateTime,
    pub period: Period,
    pub bucket: Bucket,
    pub comparison: PeriodComparison,
    pub accounting: AccountingSummary,
    pub profit_loss: ProfitLossStatement,
    pub history: Vec<BucketAggregate>,
    pub monthly: Vec<BucketAggregate>,
    pub top_products: Vec<ProductPerformance>,
    pub years: YearComparison,
    pub month_insights: MonthInsights,
    pub rotation: RotationSummary,
    pub forecast: Forecast,
    pub objectives: Vec<ObjectiveProgress>,
    pub audit: Vec<AuditIssue>,
}

/// Builds the full report.
///
/// ## Example
/// ```rust
/// use chrono::NaiveDate;
/// use comptoir_core::report::{build_report, ReportOptions};
/// use comptoir_core::types::Dataset;
///
/// let now = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap().and_hms_opt(10, 0, 0).unwrap();
/// let report = build_report(&Dataset::default(), &ReportOptions::new(now));
/// assert_eq!(report.bucket.label(), "2024-06");
/// assert_eq!(report.monthly.len(), 12);
/// assert!(report.audit.is_empty());
/// ```
pub fn build_report(dataset: &Dataset, options: &ReportOptions) -> BusinessReport {
    let now = options.now;
    let year = now.year();
    let bucket = Bucket::containing(options.period, now.date());
    let sales = &dataset.sales;

    BusinessReport {
        generated_at: now,
        period: options.period,
        bucket,
        comparison: compare_with_previous(sales, &bucket),
        accounting: accounting_summary(sales, &dataset.expenses, &bucket),
        profit_loss: profit_loss(sales, &dataset.expenses, &bucket),
        history: aggregate_by_period(sales, options.period),
        monthly: monthly_series(sales, year),
        top_products: top_products(sales, &bucket, options.top_products),
        years: compare_years(sales, year),
        month_insights: month_insights(sales, year),
        rotation: rotation_summary(&dataset.products, sales, now, options.dead_stock_days),
        forecast: predict(sales, now),
        objectives: track_objectives(&options.objectives, sales, now),
        audit: audit(dataset),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::tests::{euros, legacy_sale, line, multi_sale, ts};
    use crate::objectives::ObjectiveMetric;
    use crate::types::{ExpenseRecord, ExpenseType, ProductSnapshot};

    fn dataset() -> Dataset {
        Dataset::new(
            vec![
                multi_sale("s1", ts(2024, 6, 4), vec![line("p1", 10, 4, 2, 12)]),
                legacy_sale("s2", ts(2024, 6, 20), "p2", 50, 20, 1, Some(30)),
                legacy_sale("s3", ts(2024, 5, 2), "p2", 40, 20, 1, None),
                legacy_sale("s4", ts(2023, 8, 2), "p1", 10, 4, 5, Some(99)),
            ],
            vec![
                ExpenseRecord::new("e1", ts(2024, 6, 1), ExpenseType::AchatProduit, euros(20)),
                ExpenseRecord::new("e2", ts(2024, 6, 3), ExpenseType::Carburant, euros(10)),
            ],
            vec![
                ProductSnapshot {
                    id: "p1".to_string(),
                    description: "Bougie".to_string(),
                    quantity: 8,
                    purchase_price: euros(4),
                },
                ProductSnapshot {
                    id: "p2".to_string(),
                    description: "Savon".to_string(),
                    quantity: 0,
                    purchase_price: euros(20),
                },
            ],
        )
    }

    #[test]
    fn test_views_agree() {
        let options = ReportOptions::new(ts(2024, 6, 25))
            .with_objectives(vec![Objective::new(ObjectiveMetric::Revenue, Period::Month, 100.0)]);
        let report = build_report(&dataset(), &options);

        assert_eq!(report.bucket, Bucket::month(2024, 6));
        assert_eq!(report.comparison.current.revenue, euros(70));
        assert_eq!(report.accounting.sales, report.comparison.current);
        assert_eq!(report.profit_loss.revenue, euros(70));
        assert_eq!(report.accounting.benefice_reel, euros(12));
        assert_eq!(report.profit_loss.net_result, report.accounting.benefice_reel);
        assert_eq!(report.monthly[5].stats, report.comparison.current);
        assert_eq!(report.comparison.previous.revenue, euros(40));

        assert_eq!(report.history.len(), 3);
        assert_eq!(report.years.per_year.len(), 2);
        assert_eq!(report.month_insights.months.len(), 2);
        assert_eq!(report.top_products[0].product_id, "p2");
        assert_eq!(report.rotation.entries.len(), 2);
        assert_eq!(report.forecast.months.len(), 2);
        assert_eq!(report.objectives[0].actual, 70.0);

        // s4 records 99 € profit on a 30 € margin
        assert_eq!(report.audit.len(), 1);
        assert_eq!(report.audit[0].record_id, "s4");
    }

    #[test]
    fn test_quarter_report() {
        let options = ReportOptions::new(ts(2024, 6, 25)).with_period(Period::Quarter);
        let report = build_report(&dataset(), &options);
        assert_eq!(report.bucket.label(), "2024-Q2");
        assert_eq!(report.comparison.current.sales_count, 3);
        assert_eq!(report.history.last().map(|h| h.label.as_str()), Some("2024-Q2"));
    }

    #[test]
    fn test_report_serializes() {
        let report = build_report(&dataset(), &ReportOptions::new(ts(2024, 6, 25)));
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["generatedAt"], "2024-06-25T12:00:00");
        assert_eq!(json["period"], "month");
        assert_eq!(json["accounting"]["achatsTotal"], 2000);
        assert_eq!(json["rotation"]["deadStockDays"], 90);
    }
}
