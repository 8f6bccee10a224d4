//! Command line arguments of `comptoir-report`.

use std::path::PathBuf;

use comptoir_core::period::Period;

use crate::error::{ReportError, ReportResult};

pub const USAGE: &str = "\
Comptoir Business Report

Usage: comptoir-report [OPTIONS]

Options:
  -c, --config <PATH>    Config file (default: platform config dir, report.toml)
  -p, --period <P>       month | quarter | year (overrides the config)
  -n, --now <DATE>       Reference date, e.g. 2024-06-30 (default: today)
  -o, --output <PATH>    Write the JSON report to a file instead of stdout
      --init-config      Write the effective config to the config path and exit
  -h, --help             Show this help message";

/// Parsed invocation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CliArgs {
    pub config: Option<PathBuf>,
    pub period: Option<Period>,
    pub now: Option<String>,
    pub output: Option<PathBuf>,
    pub init_config: bool,
    pub help: bool,
}

impl CliArgs {
    /// Parses arguments, program name excluded.
    pub fn parse<I>(args: I) -> ReportResult<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let args: Vec<String> = args.into_iter().collect();
        let mut parsed = CliArgs::default();

        let mut i = 0;
        while i < args.len() {
            let flag = args[i].as_str();
            match flag {
                "--config" | "-c" => {
                    parsed.config = Some(PathBuf::from(value_of(&args, i, flag)?));
                    i += 1;
                }
                "--period" | "-p" => {
                    parsed.period = Some(value_of(&args, i, flag)?.parse()?);
                    i += 1;
                }
                "--now" | "-n" => {
                    parsed.now = Some(value_of(&args, i, flag)?.to_string());
                    i += 1;
                }
                "--output" | "-o" => {
                    parsed.output = Some(PathBuf::from(value_of(&args, i, flag)?));
                    i += 1;
                }
                "--init-config" => parsed.init_config = true,
                "--help" | "-h" => parsed.help = true,
                other => {
                    return Err(ReportError::InvalidConfig(format!(
                        "Unknown argument '{}'. Run with --help for usage",
                        other
                    )))
                }
            }
            i += 1;
        }

        Ok(parsed)
    }
}

fn value_of<'a>(args: &'a [String], i: usize, flag: &str) -> ReportResult<&'a str> {
    args.get(i + 1)
        .map(String::as_str)
        .ok_or_else(|| ReportError::InvalidConfig(format!("{} expects a value", flag)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> ReportResult<CliArgs> {
        CliArgs::parse(args.iter().map(|a| a.to_string()))
    }

    #[test]
    fn test_parse_all_flags() {
        let args = parse(&["-c", "shop.toml", "--period", "quarter", "--now", "2024-06-30", "-o", "out.json"])
            .unwrap();
        assert_eq!(args.config, Some(PathBuf::from("shop.toml")));
        assert_eq!(args.period, Some(Period::Quarter));
        assert_eq!(args.now.as_deref(), Some("2024-06-30"));
        assert_eq!(args.output, Some(PathBuf::from("out.json")));
        assert!(!args.help);
        assert!(!args.init_config);
    }

    #[test]
    fn test_defaults_and_help() {
        assert_eq!(parse(&[]).unwrap(), CliArgs::default());
        assert!(parse(&["--help"]).unwrap().help);
        assert!(parse(&["--init-config"]).unwrap().init_config);
    }

    #[test]
    fn test_bad_arguments() {
        assert!(parse(&["--period"]).unwrap_err().is_config_error());
        assert!(matches!(
            parse(&["--period", "week"]).unwrap_err(),
            ReportError::Core(_)
        ));
        assert!(parse(&["--verbose"]).is_err());
    }
}
