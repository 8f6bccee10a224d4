//! # comptoir-report: Report Shell for Comptoir
//!
//! Everything around the pure core that touches the outside world:
//! configuration, reading the backend's JSON exports, logging, and the
//! `comptoir-report` binary.
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   report.toml + COMPTOIR_* ──► ReportConfig                             │
//! │                                    │                                    │
//! │   sales.json, achats.json,         │ DataSettings                       │
//! │   products.json ──────────► loader::load_dataset ──► Dataset            │
//! │                                                        │                │
//! │                      ReportOptions { now, ... } ───────┤                │
//! │                                                        ▼                │
//! │                                      comptoir_core::build_report        │
//! │                                                        │                │
//! │                            audit issues ──► warn! logs │                │
//! │                                                        ▼                │
//! │                                              BusinessReport (JSON)      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//! - [`config`] - TOML + environment configuration
//! - [`loader`] - JSON exports → `Dataset`
//! - [`cli`] - Binary arguments
//! - [`logging`] - Tracing subscriber with a reloadable level
//! - [`error`] - Error types

pub mod cli;
pub mod config;
pub mod error;
pub mod loader;
pub mod logging;

pub use config::{DataSettings, ReportConfig};
pub use error::{ReportError, ReportResult};
pub use loader::{load_dataset, read_records};

use chrono::NaiveDateTime;
use tracing::info;

use comptoir_core::report::{build_report, BusinessReport};

/// Loads the configured data and builds the report at `now`.
pub fn generate(config: &ReportConfig, now: NaiveDateTime) -> ReportResult<BusinessReport> {
    let dataset = load_dataset(&config.data_settings())?;
    let options = config.report_options(now);

    info!(%now, period = %options.period, objectives = options.objectives.len(), "Building report");
    let report = build_report(&dataset, &options);

    loader::log_audit(&report.audit);
    info!(
        bucket = %report.bucket.label(),
        revenue_cents = report.comparison.current.revenue.cents(),
        sales = report.comparison.current.sales_count,
        "Report ready"
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use comptoir_core::period::Period;
    use comptoir_core::timestamp::parse_timestamp;

    #[test]
    fn test_generate_from_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("sales.json"),
            r#"{"data": [
                {"_id": "s1", "date": "2024-06-04", "productId": "p1",
                 "sellingPrice": 10, "purchasePrice": 4, "quantitySold": 2, "profit": 12},
                {"_id": "s2", "date": "2024-04-10", "productId": "p1",
                 "sellingPrice": 10, "purchasePrice": 4, "quantitySold": 1, "profit": 6}
            ]}"#,
        )
        .unwrap();
        std::fs::write(
            dir.path().join("achats.json"),
            r#"[{"_id": "e1", "date": "2024-06-01", "type": "taxes", "totalCost": 5}]"#,
        )
        .unwrap();

        let mut config = ReportConfig::default();
        config.data = DataSettings {
            sales_path: "sales.json".into(),
            expenses_path: Some("achats.json".into()),
            products_path: None,
        };
        config.base_dir = Some(dir.path().to_path_buf());
        config.report.period = Period::Quarter;

        let report = generate(&config, parse_timestamp("2024-06-30").unwrap()).unwrap();
        assert_eq!(report.bucket.label(), "2024-Q2");
        assert_eq!(report.comparison.current.revenue.cents(), 3000);
        assert_eq!(report.accounting.depenses_total.cents(), 500);
        assert_eq!(report.accounting.benefice_reel.cents(), 1300);
        assert!(report.rotation.entries.is_empty());
        assert!(report.audit.is_empty());
    }

    #[test]
    fn test_generate_without_sales_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = ReportConfig::default();
        config.base_dir = Some(dir.path().to_path_buf());

        let err = generate(&config, parse_timestamp("2024-06-30").unwrap()).unwrap_err();
        assert!(err.is_data_error());
    }
}
