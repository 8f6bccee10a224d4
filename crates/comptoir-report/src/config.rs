//! # Report Configuration
//!
//! Where the data files live and how the report is computed.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Command line (--period, --now)              (highest priority)     │
//! │                                                                         │
//! │  2. Environment Variables                                              │
//! │     COMPTOIR_SALES_PATH=/srv/export/sales.json                         │
//! │     COMPTOIR_PERIOD=quarter                                            │
//! │                                                                         │
//! │  3. TOML Config File                                                   │
//! │     ~/.config/report/report.toml (Linux)                               │
//! │     ~/Library/Application Support/com.comptoir.report/report.toml      │
//! │                                                                         │
//! │  4. Default Values                              (lowest priority)      │
//! │     sales.json in the working directory, monthly period               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! Relative data paths resolve against the directory of the config file.
//! ```toml
//! [data]
//! sales_path = "export/sales.json"
//! expenses_path = "export/achats.json"
//! products_path = "export/products.json"
//!
//! [report]
//! period = "month"               # month | quarter | year
//! reference_date = "2024-06-30"  # omit to use the current date
//! top_products = 5
//! dead_stock_days = 90
//!
//! [logging]
//! level = "info"
//!
//! [[objectives]]
//! name = "CA mensuel"
//! metric = "revenue"
//! period = "month"
//! target = 5000.0
//! ```

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use comptoir_core::objectives::Objective;
use comptoir_core::period::Period;
use comptoir_core::report::ReportOptions;
use comptoir_core::rotation::DEFAULT_DEAD_STOCK_DAYS;
use comptoir_core::timestamp::parse_timestamp;
use comptoir_core::DEFAULT_TOP_PRODUCTS;

use crate::error::{ReportError, ReportResult};

/// Largest accepted top-products list.
pub const MAX_TOP_PRODUCTS: usize = 100;

/// Log levels accepted in `[logging]`.
const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

// =============================================================================
// Data Settings
// =============================================================================

/// Location of the exported JSON files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSettings {
    /// Sales export. Required.
    #[serde(default = "default_sales_path")]
    pub sales_path: PathBuf,

    /// Purchases and expenses export.
    #[serde(default)]
    pub expenses_path: Option<PathBuf>,

    /// Inventory snapshot.
    #[serde(default)]
    pub products_path: Option<PathBuf>,
}

fn default_sales_path() -> PathBuf {
    PathBuf::from("sales.json")
}

impl Default for DataSettings {
    fn default() -> Self {
        DataSettings {
            sales_path: default_sales_path(),
            expenses_path: None,
            products_path: None,
        }
    }
}

impl DataSettings {
    /// Resolves relative paths against `base` (the config file directory).
    pub fn resolved_against(&self, base: &Path) -> Self {
        let resolve = |path: &PathBuf| {
            if path.is_relative() {
                base.join(path)
            } else {
                path.clone()
            }
        };
        DataSettings {
            sales_path: resolve(&self.sales_path),
            expenses_path: self.expenses_path.as_ref().map(resolve),
            products_path: self.products_path.as_ref().map(resolve),
        }
    }
}

// =============================================================================
// Report Settings
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSettings {
    /// Granularity of the "current period" views.
    #[serde(default)]
    pub period: Period,

    /// Fixed reference date. When absent the binary uses the local clock.
    #[serde(default)]
    pub reference_date: Option<String>,

    #[serde(default = "default_top_products")]
    pub top_products: usize,

    /// Days without a sale after which stock counts as dead.
    #[serde(default = "default_dead_stock_days")]
    pub dead_stock_days: i64,
}

fn default_top_products() -> usize {
    DEFAULT_TOP_PRODUCTS
}

fn default_dead_stock_days() -> i64 {
    DEFAULT_DEAD_STOCK_DAYS
}

impl Default for ReportSettings {
    fn default() -> Self {
        ReportSettings {
            period: Period::default(),
            reference_date: None,
            top_products: default_top_products(),
            dead_stock_days: default_dead_stock_days(),
        }
    }
}

// =============================================================================
// Logging Settings
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Default filter when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingSettings {
    fn default() -> Self {
        LoggingSettings {
            level: default_log_level(),
        }
    }
}

// =============================================================================
// Main Report Configuration
// =============================================================================

/// Complete report configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(default)]
    pub data: DataSettings,

    #[serde(default)]
    pub report: ReportSettings,

    #[serde(default)]
    pub logging: LoggingSettings,

    /// Objectives tracked in every report.
    #[serde(default)]
    pub objectives: Vec<Objective>,

    /// Directory of the file this config was read from. Relative data
    /// paths resolve against it; the paths themselves are stored as written.
    #[serde(skip)]
    pub base_dir: Option<PathBuf>,
}

impl ReportConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (report.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> ReportResult<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading report config from file");
                config = Self::from_file(&path)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    fn from_file(path: &Path) -> ReportResult<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ReportError::ConfigLoadFailed(format!("{}: {}", path.display(), e)))?;
        let mut config: ReportConfig = toml::from_str(&contents)?;
        config.base_dir = path.parent().map(Path::to_path_buf);
        Ok(config)
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> ReportResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| ReportError::ConfigSaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ReportError::ConfigSaveFailed(e.to_string()))?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents).map_err(|e| ReportError::ConfigSaveFailed(e.to_string()))?;

        info!(?path, "Report config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> ReportResult<()> {
        if self.data.sales_path.as_os_str().is_empty() {
            return Err(ReportError::InvalidConfig("sales_path must not be empty".into()));
        }

        if self.report.top_products == 0 || self.report.top_products > MAX_TOP_PRODUCTS {
            return Err(ReportError::InvalidConfig(format!(
                "top_products must be between 1 and {}, got {}",
                MAX_TOP_PRODUCTS, self.report.top_products
            )));
        }

        if self.report.dead_stock_days <= 0 {
            return Err(ReportError::InvalidConfig(format!(
                "dead_stock_days must be greater than 0, got {}",
                self.report.dead_stock_days
            )));
        }

        if let Some(ref date) = self.report.reference_date {
            parse_timestamp(date).map_err(|e| ReportError::InvalidConfig(e.to_string()))?;
        }

        if !LOG_LEVELS.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(ReportError::InvalidConfig(format!(
                "Unknown log level '{}'. Valid options: {}",
                self.logging.level,
                LOG_LEVELS.join(", ")
            )));
        }

        for objective in &self.objectives {
            if !objective.target.is_finite() || objective.target < 0.0 {
                let label = objective
                    .name
                    .clone()
                    .unwrap_or_else(|| objective.metric.to_string());
                return Err(ReportError::InvalidConfig(format!(
                    "objective '{}' needs a non-negative target, got {}",
                    label, objective.target
                )));
            }
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies overrides from any key lookup; `apply_env_overrides` passes
    /// the process environment.
    pub(crate) fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("COMPTOIR_SALES_PATH") {
            debug!(path = %path, "Overriding sales path from environment");
            self.data.sales_path = PathBuf::from(path);
        }

        if let Some(path) = lookup("COMPTOIR_EXPENSES_PATH") {
            self.data.expenses_path = Some(PathBuf::from(path));
        }

        if let Some(path) = lookup("COMPTOIR_PRODUCTS_PATH") {
            self.data.products_path = Some(PathBuf::from(path));
        }

        if let Some(period) = lookup("COMPTOIR_PERIOD") {
            match period.parse() {
                Ok(parsed) => {
                    debug!(period = %period, "Overriding period from environment");
                    self.report.period = parsed;
                }
                Err(e) => warn!(period = %period, "Ignoring COMPTOIR_PERIOD: {}", e),
            }
        }

        if let Some(date) = lookup("COMPTOIR_REFERENCE_DATE") {
            self.report.reference_date = Some(date);
        }

        if let Some(limit) = lookup("COMPTOIR_TOP_PRODUCTS") {
            if let Ok(n) = limit.parse::<usize>() {
                self.report.top_products = n;
            }
        }

        if let Some(days) = lookup("COMPTOIR_DEAD_STOCK_DAYS") {
            if let Ok(d) = days.parse::<i64>() {
                self.report.dead_stock_days = d;
            }
        }

        if let Some(level) = lookup("COMPTOIR_LOG_LEVEL") {
            self.logging.level = level;
        }
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "comptoir", "report")
            .map(|dirs| dirs.config_dir().join("report.toml"))
    }

    // =========================================================================
    // Convenience Methods
    // =========================================================================

    /// Data locations with relative paths resolved against the config file
    /// directory. Without a config file they stay relative to the working
    /// directory.
    pub fn data_settings(&self) -> DataSettings {
        match self.base_dir {
            Some(ref base) => self.data.resolved_against(base),
            None => self.data.clone(),
        }
    }

    /// The configured reference date, if any.
    pub fn reference_now(&self) -> ReportResult<Option<NaiveDateTime>> {
        self.report
            .reference_date
            .as_deref()
            .map(parse_timestamp)
            .transpose()
            .map_err(ReportError::from)
    }

    /// Options for one report run at `now`.
    pub fn report_options(&self, now: NaiveDateTime) -> ReportOptions {
        ReportOptions {
            now,
            period: self.report.period,
            objectives: self.objectives.clone(),
            top_products: self.report.top_products,
            dead_stock_days: self.report.dead_stock_days,
        }
    }
}
