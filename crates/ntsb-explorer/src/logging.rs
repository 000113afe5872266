//! Logging configuration for ntsb-explorer.
//!
//! Diagnostics go through `tracing`; command output goes to stdout. The
//! subscriber therefore writes to stderr so piped JSON stays clean.

use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Targets that receive the default level: the library and the `ntsbx` binary.
const LOG_TARGETS: [&str; 2] = ["ntsb_explorer", "ntsbx"];

/// How much diagnostic output to emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Errors only.
    Quiet,
    /// Info and above.
    #[default]
    Normal,
    /// Debug and above.
    Verbose,
    /// Everything.
    Trace,
}

impl Verbosity {
    /// Map `-q` and the number of `-v` flags to a verbosity. `-q` wins.
    #[must_use]
    pub fn from_flags(quiet: bool, verbose: u8) -> Self {
        match (quiet, verbose) {
            (true, _) => Self::Quiet,
            (false, 0) => Self::Normal,
            (false, 1) => Self::Verbose,
            (false, _) => Self::Trace,
        }
    }

    /// The most detailed level that is emitted.
    #[must_use]
    pub fn level(self) -> Level {
        match self {
            Self::Quiet => Level::ERROR,
            Self::Normal => Level::INFO,
            Self::Verbose => Level::DEBUG,
            Self::Trace => Level::TRACE,
        }
    }

    /// Filter directives used when `RUST_LOG` is not set.
    #[must_use]
    pub fn directives(self) -> String {
        let level = self.level();
        LOG_TARGETS
            .iter()
            .map(|target| format!("{target}={level}"))
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Install the global subscriber.
///
/// `RUST_LOG` takes precedence over `verbosity`. Calling this more than once
/// is harmless; only the first call installs anything.
///
/// # Examples
///
/// ```no_run
/// use ntsb_explorer::{init_logging, logging::Verbosity};
///
/// init_logging(Verbosity::Verbose);
/// ```
pub fn init_logging(verbosity: Verbosity) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.directives()));

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(verbosity != Verbosity::Normal)
        .with_file(false)
        .with_line_number(false);

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .try_init();
}

/// Install a warn-level subscriber that writes through the test harness.
#[cfg(test)]
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("warn")
        .with_test_writer()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_flags() {
        assert_eq!(Verbosity::from_flags(true, 0), Verbosity::Quiet);
        assert_eq!(Verbosity::from_flags(true, 2), Verbosity::Quiet);
        assert_eq!(Verbosity::from_flags(false, 0), Verbosity::Normal);
        assert_eq!(Verbosity::from_flags(false, 1), Verbosity::Verbose);
        assert_eq!(Verbosity::from_flags(false, 5), Verbosity::Trace);
    }

    #[test]
    fn test_levels() {
        assert_eq!(Verbosity::Quiet.level(), Level::ERROR);
        assert_eq!(Verbosity::Normal.level(), Level::INFO);
        assert_eq!(Verbosity::Verbose.level(), Level::DEBUG);
        assert_eq!(Verbosity::Trace.level(), Level::TRACE);
        assert_eq!(Verbosity::default(), Verbosity::Normal);
    }

    #[test]
    fn test_directives_cover_library_and_binary() {
        assert_eq!(
            Verbosity::Verbose.directives(),
            "ntsb_explorer=DEBUG,ntsbx=DEBUG"
        );
    }

    #[test]
    fn test_init_logging_is_repeatable() {
        init_logging(Verbosity::Quiet);
        init_logging(Verbosity::Trace);
        init_test_logging();
    }
}
