//! # comptoir-core: Sales Aggregation Engine for Comptoir
//!
//! This crate turns the raw records of a small shop (sales, purchases and
//! expenses, inventory) into the figures its dashboard shows. Everything is
//! a pure function of the records and an explicit "now".
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Comptoir Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              Backend REST API (sales, achats, products)         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ JSON                                   │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              comptoir-report (config, loading, logs)            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ comptoir-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   types ──► normalize ──► period ──► aggregate                  │   │
//! │  │                                         │                       │   │
//! │  │            ┌──────────────┬─────────────┼─────────────┐         │   │
//! │  │            ▼              ▼             ▼             ▼         │   │
//! │  │       comparison      rotation      forecast     objectives     │   │
//! │  │            └──────────────┴──────┬──────┴─────────────┘         │   │
//! │  │                                  ▼                              │   │
//! │  │                               report                            │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO CLOCK • NO LOGGING • PURE FUNCTIONS              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │ plain data (JSON / TS bindings)        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │          Presentation layer: cards, charts, modals, PDF         │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Raw records (SaleRecord, ExpenseRecord, ProductSnapshot)
//! - [`money`] - Money type with integer cents
//! - [`timestamp`] - Record date decoding
//! - [`numeric`] - Lenient number decoding (quantities, numeric strings)
//! - [`normalize`] - One sale → `{revenue, cost, profit, quantity}`
//! - [`period`] - Month / quarter / year buckets
//! - [`aggregate`] - Period aggregates, accounting view, P&L, top products
//! - [`comparison`] - Year-over-year and month insights
//! - [`rotation`] - Stock rotation classification
//! - [`forecast`] - Naive trend predictor
//! - [`objectives`] - Objective tracking
//! - [`validation`] - Record audit
//! - [`report`] - Everything at once
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **One normalization**: every view reads sales through [`normalize::normalize`]
//! 2. **Explicit now**: reference dates are parameters, never the system clock
//! 3. **Integer Money**: amounts are cents (i64); only ratios are floats
//! 4. **Never fails on data**: missing fields count as zero, ratios guard zero
//!
//! ## Example Usage
//!
//! ```rust
//! use comptoir_core::aggregate::aggregate;
//! use comptoir_core::period::Bucket;
//! use comptoir_core::types::SaleRecord;
//!
//! let sales: Vec<SaleRecord> = serde_json::from_str(r#"[
//!     {"id": "a", "date": "2024-03-02",
//!      "products": [{"productId": "p1", "sellingPrice": 10, "purchasePrice": 4,
//!                    "quantitySold": 2, "profit": 12}]},
//!     {"id": "b", "date": "2024-03-09",
//!      "sellingPrice": 50, "purchasePrice": 20, "quantitySold": 1, "profit": 30}
//! ]"#).unwrap();
//!
//! let march = aggregate(&sales, &Bucket::month(2024, 3));
//! assert_eq!(march.revenue.cents(), 7000);
//! assert_eq!(march.profit.cents(), 4200);
//! assert_eq!(march.sales_count, 2);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod aggregate;
pub mod comparison;
pub mod error;
pub mod forecast;
pub mod money;
pub mod normalize;
pub mod numeric;
pub mod objectives;
pub mod period;
pub mod report;
pub mod rotation;
pub mod timestamp;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use comptoir_core::Money` instead of
// `use comptoir_core::money::Money`

pub use aggregate::{aggregate, percent_change, PeriodAggregate};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use normalize::{normalize, SaleValues};
pub use period::{Bucket, MonthKey, Period};
pub use report::{build_report, BusinessReport, ReportOptions};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Products listed in the "top products" view unless configured otherwise.
pub const DEFAULT_TOP_PRODUCTS: usize = 5;

/// Longest record id the audit accepts.
pub const MAX_ID_LENGTH: usize = 100;

/// Longest free-text field (client name, description, supplier).
pub const MAX_TEXT_LENGTH: usize = 500;
