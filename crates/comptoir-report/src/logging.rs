//! # Logging
//!
//! The subscriber starts before the config file is read, so warnings raised
//! while loading it reach stderr. Once the config is known its
//! `[logging] level` replaces the startup filter, unless `RUST_LOG` is set.
//!
//! ```text
//!   init() ──► filter "warn,comptoir_report=info" (or RUST_LOG)
//!      │
//!   ReportConfig::load()          warnings already visible
//!      │
//!   apply_level(config level) ──► filter reloaded
//! ```

use tracing::{warn, Subscriber};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{reload, EnvFilter, Registry};

/// Level of the report crate until the config is loaded.
pub const STARTUP_LEVEL: &str = "info";

/// Filter directives for a configured level: dependencies stay at `warn`.
pub fn default_directives(level: &str) -> String {
    format!("warn,comptoir_report={}", level)
}

/// Swaps the active filter once the configured level is known.
pub struct LogHandle {
    filter: reload::Handle<EnvFilter, Registry>,
    from_env: bool,
}

impl LogHandle {
    /// Applies the configured level. `RUST_LOG` wins when it is set.
    pub fn apply_level(&self, level: &str) {
        if self.from_env {
            return;
        }
        if let Err(e) = self.filter.reload(EnvFilter::new(default_directives(level))) {
            warn!(level, "Could not apply configured log level: {}", e);
        }
    }
}

/// Builds the subscriber without installing it.
pub fn subscriber<W>(writer: W) -> (impl Subscriber + Send + Sync + 'static, LogHandle)
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    match EnvFilter::try_from_default_env() {
        Ok(filter) => layered(filter, true, writer),
        Err(_) => layered(EnvFilter::new(default_directives(STARTUP_LEVEL)), false, writer),
    }
}

fn layered<W>(
    initial: EnvFilter,
    from_env: bool,
    writer: W,
) -> (impl Subscriber + Send + Sync + 'static, LogHandle)
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let (filter_layer, filter) = reload::Layer::new(initial);
    let subscriber = tracing_subscriber::registry()
        .with(filter_layer)
        .with(tracing_subscriber::fmt::layer().with_writer(writer));
    (subscriber, LogHandle { filter, from_env })
}

/// Installs the global subscriber on stderr.
pub fn init() -> LogHandle {
    let (subscriber, handle) = subscriber(std::io::stderr);
    subscriber.init();
    handle
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReportConfig;
    use std::io;
    use std::sync::{Arc, Mutex};
    use tracing::info;

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Captured {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Captured {
        type Writer = Captured;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    fn startup(captured: &Captured) -> (impl Subscriber + Send + Sync + 'static, LogHandle) {
        layered(
            EnvFilter::new(default_directives(STARTUP_LEVEL)),
            false,
            captured.clone(),
        )
    }

    #[test]
    fn test_default_directives() {
        assert_eq!(default_directives("debug"), "warn,comptoir_report=debug");
    }

    #[test]
    fn test_config_warnings_reach_startup_subscriber() {
        let captured = Captured::default();
        let (subscriber, _handle) = startup(&captured);

        tracing::subscriber::with_default(subscriber, || {
            let mut config = ReportConfig::default();
            config.apply_overrides(|key| (key == "COMPTOIR_PERIOD").then(|| "week".to_string()));
        });

        let output = captured.contents();
        assert!(output.contains("Ignoring COMPTOIR_PERIOD"), "got: {}", output);
    }

    #[test]
    fn test_configured_level_replaces_startup_filter() {
        let captured = Captured::default();
        let (subscriber, handle) = startup(&captured);

        tracing::subscriber::with_default(subscriber, || {
            info!("before reload");
            handle.apply_level("error");
            info!("after reload");
        });

        let output = captured.contents();
        assert!(output.contains("before reload"));
        assert!(!output.contains("after reload"));
    }

    #[test]
    fn test_rust_log_wins_over_configured_level() {
        let captured = Captured::default();
        let (subscriber, handle) = layered(
            EnvFilter::new("warn,comptoir_report=debug"),
            true,
            captured.clone(),
        );

        tracing::subscriber::with_default(subscriber, || {
            handle.apply_level("error");
            info!("still shown");
        });

        assert!(captured.contents().contains("still shown"));
    }
}
