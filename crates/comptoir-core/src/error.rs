//! # Error Types
//!
//! Domain-specific error types for comptoir-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  comptoir-core errors (this file)                                      │
//! │  ├── CoreError        - Decoding / parsing failures                    │
//! │  └── ValidationError  - Record audit findings                          │
//! │                                                                         │
//! │  comptoir-report errors (separate crate)                               │
//! │  └── ReportError      - File, JSON, TOML and config failures           │
//! │                                                                         │
//! │  Flow: CoreError → ReportError → stderr; ValidationError → audit logs  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## What Is NOT an Error
//! The aggregation functions never fail. Missing prices, quantities or an
//! absent `products` array contribute zero; every ratio guards its zero
//! denominator. Errors only exist at the edges: parsing a timestamp,
//! a period name or a month key, and auditing suspicious records.

use thiserror::Error;

use crate::money::Money;

// =============================================================================
// Core Error
// =============================================================================

/// Decoding and parsing errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A record date could not be parsed.
    ///
    /// ## Accepted Formats
    /// RFC 3339, `YYYY-MM-DDTHH:MM:SS[.fff]`, `YYYY-MM-DD HH:MM:SS`,
    /// `YYYY-MM-DD` and epoch milliseconds.
    #[error("Invalid timestamp '{value}': {reason}")]
    InvalidTimestamp { value: String, reason: String },

    /// Unknown period granularity.
    #[error("Unknown period '{0}'. Valid options: month, quarter, year")]
    InvalidPeriod(String),

    /// Malformed "YYYY-MM" key.
    #[error("Invalid month key '{0}', expected YYYY-MM")]
    InvalidMonthKey(String),

    /// Unknown objective metric.
    #[error("Unknown objective metric '{0}'. Valid options: revenue, profit, sales_count")]
    InvalidMetric(String),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Record audit findings.
///
/// These never stop aggregation; they are surfaced so the data can be
/// fixed at the source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative (got {value})")]
    Negative { field: String, value: i64 },

    /// Value must be strictly positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Recorded profit disagrees with revenue - cost.
    ///
    /// ## Why Only Reported
    /// The recorded profit is what the shop owner saw at checkout; the
    /// aggregates keep using it as given.
    #[error("recorded profit {recorded} differs from revenue - cost = {computed}")]
    ProfitMismatch { recorded: Money, computed: Money },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
