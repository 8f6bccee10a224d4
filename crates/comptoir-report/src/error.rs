//! # Report Error Types
//!
//! Error types for loading configuration and data files.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Report Error Categories                           │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Configuration  │  │   Data Files    │  │     Core                │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  InvalidConfig  │  │  MissingData    │  │  CoreError (timestamp,  │ │
//! │  │  ConfigLoad     │  │  Io             │  │  period, month key)     │ │
//! │  │  ConfigSave     │  │  Json / Shape   │  │                         │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use thiserror::Error;

use comptoir_core::CoreError;

/// Result type alias for report operations.
pub type ReportResult<T> = Result<T, ReportError>;

/// Everything that can stop a report run.
#[derive(Debug, Error)]
pub enum ReportError {
    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid report configuration.
    #[error("Invalid report configuration: {0}")]
    InvalidConfig(String),

    /// Failed to load config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    /// Failed to save config file.
    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),

    // =========================================================================
    // Data File Errors
    // =========================================================================
    /// The sales file is required and was not found.
    #[error("Sales file not found: {}", .0.display())]
    MissingData(PathBuf),

    /// Reading a data file failed.
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A data file is not valid JSON or a record does not decode.
    #[error("Invalid JSON in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Valid JSON, but neither an array nor a `{ "data": [...] }` envelope.
    #[error("Unexpected content in {}: {reason}", path.display())]
    UnexpectedShape { path: PathBuf, reason: String },

    /// Writing the report failed.
    #[error("Failed to write report: {0}")]
    Output(String),

    // =========================================================================
    // Core Errors
    // =========================================================================
    /// Error from the aggregation core.
    #[error(transparent)]
    Core(#[from] CoreError),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<toml::de::Error> for ReportError {
    fn from(err: toml::de::Error) -> Self {
        ReportError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for ReportError {
    fn from(err: toml::ser::Error) -> Self {
        ReportError::ConfigSaveFailed(err.to_string())
    }
}

// =============================================================================
// Error Categorization
// =============================================================================

impl ReportError {
    /// Returns true if this error indicates a configuration problem.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            ReportError::InvalidConfig(_)
                | ReportError::ConfigLoadFailed(_)
                | ReportError::ConfigSaveFailed(_)
        )
    }

    /// Returns true if this error comes from a data file.
    pub fn is_data_error(&self) -> bool {
        matches!(
            self,
            ReportError::MissingData(_)
                | ReportError::Io { .. }
                | ReportError::Json { .. }
                | ReportError::UnexpectedShape { .. }
        )
    }

    /// Process exit code for the binary.
    pub fn exit_code(&self) -> i32 {
        if self.is_config_error() {
            2
        } else if self.is_data_error() {
            3
        } else {
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_categories() {
        assert!(ReportError::InvalidConfig("bad".into()).is_config_error());
        assert!(ReportError::MissingData(PathBuf::from("sales.json")).is_data_error());
        assert!(!ReportError::Output("closed".into()).is_config_error());

        assert_eq!(ReportError::InvalidConfig("bad".into()).exit_code(), 2);
        assert_eq!(ReportError::MissingData(PathBuf::from("x")).exit_code(), 3);
        assert_eq!(ReportError::Output("closed".into()).exit_code(), 1);
    }

    #[test]
    fn test_error_display() {
        let err = ReportError::MissingData(PathBuf::from("data/sales.json"));
        assert_eq!(err.to_string(), "Sales file not found: data/sales.json");

        let err: ReportError = CoreError::InvalidPeriod("week".into()).into();
        assert_eq!(
            err.to_string(),
            "Unknown period 'week'. Valid options: month, quarter, year"
        );
    }

    #[test]
    fn test_toml_error_converts() {
        let err: ReportError = toml::from_str::<toml::Value>("not = = toml").unwrap_err().into();
        assert!(err.is_config_error());
    }
}
