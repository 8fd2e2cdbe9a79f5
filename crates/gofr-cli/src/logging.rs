use crate::error::{CliError, Result};
use std::fs::File;
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, filter::LevelFilter, fmt, prelude::*};

/// Environment variable holding `tracing` filter directives, e.g.
/// `GOFR_LOG=gofr::workflows=debug`. Takes precedence over `-v`.
pub const LOG_ENV: &str = "GOFR_LOG";

fn verbosity_level(verbosity: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::ERROR;
    }
    match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

/// `--quiet` always wins; otherwise directives from [`LOG_ENV`] replace the
/// level chosen with `-v`.
fn resolve_filter(verbosity: u8, quiet: bool, directives: Option<&str>) -> Result<EnvFilter> {
    let level = verbosity_level(verbosity, quiet);
    match directives.filter(|d| !quiet && !d.trim().is_empty()) {
        Some(directives) => EnvFilter::try_new(directives).map_err(|e| {
            CliError::Argument(format!("Invalid {} directives '{}': {}", LOG_ENV, directives, e))
        }),
        None => Ok(EnvFilter::default().add_directive(level.into())),
    }
}

pub fn setup_logging(verbosity: u8, quiet: bool, log_file: Option<PathBuf>) -> Result<()> {
    let directives = std::env::var(LOG_ENV).ok();
    let filter = resolve_filter(verbosity, quiet, directives.as_deref())?;

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(true)
        .with_target(false)
        .compact();

    let file_layer = match log_file {
        Some(path) => {
            let file = File::create(&path).map_err(CliError::Io)?;
            Some(
                fmt::layer()
                    .with_writer(file)
                    .with_ansi(false)
                    .with_thread_ids(true)
                    .with_target(true),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| CliError::Other(anyhow::anyhow!("Failed to set up logging: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::sync::Once;
    use tracing::{debug, error, info, trace, warn};

    static INIT: Once = Once::new();

    fn ensure_global_logger_is_set() {
        INIT.call_once(|| {
            setup_logging(3, false, None).expect("Failed to set up global logger for tests");
        });
    }

    #[test]
    fn verbosity_maps_to_levels() {
        assert_eq!(verbosity_level(0, false), LevelFilter::WARN);
        assert_eq!(verbosity_level(1, false), LevelFilter::INFO);
        assert_eq!(verbosity_level(2, false), LevelFilter::DEBUG);
        assert_eq!(verbosity_level(7, false), LevelFilter::TRACE);
        assert_eq!(verbosity_level(3, true), LevelFilter::ERROR);
    }

    #[test]
    fn environment_directives_replace_verbosity() {
        let filter = resolve_filter(0, false, Some("gofr=debug")).unwrap();
        assert!(filter.to_string().contains("gofr=debug"));

        let filter = resolve_filter(2, false, Some("  ")).unwrap();
        assert_eq!(filter.to_string(), "debug");
    }

    #[test]
    fn quiet_ignores_environment_directives() {
        let filter = resolve_filter(0, true, Some("gofr=trace")).unwrap();
        assert_eq!(filter.to_string(), "error");
    }

    #[test]
    fn invalid_directives_are_an_argument_error() {
        assert!(matches!(
            resolve_filter(0, false, Some("gofr=loud")),
            Err(CliError::Argument(_))
        ));
    }

    #[test]
    #[serial]
    fn initialization_and_macros_work() {
        ensure_global_logger_is_set();

        error!("This is an error");
        warn!("This is a warning");
        info!(frames = 3, "This is info");
        debug!(step = 1, pairs = 12, "This is debug");
        trace!("This is trace");
    }

    #[test]
    #[serial]
    fn second_initialization_is_reported_instead_of_panicking() {
        ensure_global_logger_is_set();
        assert!(matches!(
            setup_logging(0, false, None),
            Err(CliError::Other(_))
        ));
    }

    #[test]
    #[serial]
    fn file_layer_records_debug_events_with_thread_ids() {
        let temp_dir = tempfile::tempdir().unwrap();
        let log_path = temp_dir.path().join("gofr.log");

        let file = File::create(&log_path).unwrap();
        let file_layer = fmt::layer()
            .with_writer(file)
            .with_ansi(false)
            .with_thread_ids(true);
        let subscriber = tracing_subscriber::registry().with(file_layer);

        tracing::subscriber::with_default(subscriber, || {
            debug!(step = 4, "Binned pair distances.");
        });

        let content = std::fs::read_to_string(log_path).unwrap();
        assert!(content.contains("Binned pair distances."));
        assert!(content.contains("step=4"));
        assert!(content.contains("DEBUG"));
        assert!(content.contains("ThreadId"));
    }

    #[test]
    #[serial]
    fn invalid_log_file_path_propagates_error() {
        let invalid_path = PathBuf::from("/");

        if cfg!(unix) && invalid_path.is_dir() {
            let result = setup_logging(0, false, Some(invalid_path));
            assert!(matches!(result, Err(CliError::Io(_))));
        }
    }
}
