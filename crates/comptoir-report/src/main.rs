//! # comptoir-report
//!
//! Prints the business report of a shop as JSON.
//!
//! ## Usage
//! ```bash
//! # Current month, config from the platform config dir
//! comptoir-report
//!
//! # Quarterly report as of a fixed date
//! comptoir-report --config ./report.toml --period quarter --now 2024-06-30
//! ```
//!
//! ## Log Levels
//! - `RUST_LOG=debug` - Show debug messages
//! - `RUST_LOG=comptoir_report=trace` - Trace the report crate only
//! - Default: `[logging] level` from the config (info)

use std::process::ExitCode;

use tracing::{error, info};

use comptoir_core::timestamp::parse_timestamp;
use comptoir_report::cli::{CliArgs, USAGE};
use comptoir_report::logging::{self, LogHandle};
use comptoir_report::{generate, ReportConfig, ReportError, ReportResult};

fn main() -> ExitCode {
    let args = match CliArgs::parse(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{}", e);
            eprintln!();
            eprintln!("{}", USAGE);
            return ExitCode::from(e.exit_code() as u8);
        }
    };

    if args.help {
        println!("{}", USAGE);
        return ExitCode::SUCCESS;
    }

    let log_handle = logging::init();

    match run(args, &log_handle) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::from(e.exit_code() as u8)
        }
    }
}

fn run(args: CliArgs, log_handle: &LogHandle) -> ReportResult<()> {
    let mut config = ReportConfig::load(args.config.clone())?;
    log_handle.apply_level(&config.logging.level);

    if args.init_config {
        config.save(args.config)?;
        return Ok(());
    }

    if let Some(period) = args.period {
        config.report.period = period;
    }

    let now = match args.now.as_deref() {
        Some(date) => parse_timestamp(date)?,
        None => config
            .reference_now()?
            .unwrap_or_else(|| chrono::Local::now().naive_local()),
    };

    let report = generate(&config, now)?;
    let json =
        serde_json::to_string_pretty(&report).map_err(|e| ReportError::Output(e.to_string()))?;

    match args.output {
        Some(path) => {
            std::fs::write(&path, json).map_err(|e| ReportError::Output(e.to_string()))?;
            info!(?path, "Report written");
        }
        None => println!("{}", json),
    }

    Ok(())
}
