//! Logging arguments and tracing subscriber setup.

use std::io;

use clap::{ArgAction, Args, ValueEnum};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, fmt};

/// The format for log output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum LogFormat {
    /// Full format with all fields (default).
    #[default]
    Full,
    /// Compact single-line format.
    Compact,
    /// JSON structured logging.
    Json,
}

/// Logging arguments shared by every subcommand.
///
/// Logs go to stderr so command output on stdout stays machine-readable.
#[derive(Debug, Clone, Default, Args)]
#[command(next_help_heading = "Logging")]
pub(crate) struct LoggingArgs {
    /// Increase logging verbosity (-v = INFO, -vv = DEBUG, -vvv = TRACE).
    ///
    /// Only warnings are shown when omitted. `RUST_LOG` takes precedence.
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub(crate) verbosity: u8,

    /// Log output format.
    #[arg(long = "log-format", default_value = "full", global = true)]
    pub(crate) format: LogFormat,
}

impl LoggingArgs {
    /// Converts the verbosity count to a [`LevelFilter`].
    pub(crate) const fn log_level_filter(&self) -> LevelFilter {
        match self.verbosity {
            0 => LevelFilter::WARN,
            1 => LevelFilter::INFO,
            2 => LevelFilter::DEBUG,
            _ => LevelFilter::TRACE,
        }
    }

    /// Install the global tracing subscriber. Should only be called once.
    pub(crate) fn init_tracing_subscriber(&self) -> eyre::Result<()> {
        let filter = EnvFilter::builder()
            .with_default_directive(self.log_level_filter().into())
            .from_env_lossy();
        let builder = fmt().with_env_filter(filter).with_writer(io::stderr);

        let result = match self.format {
            LogFormat::Full => builder.try_init(),
            LogFormat::Compact => builder.compact().try_init(),
            LogFormat::Json => builder.json().try_init(),
        };
        result.map_err(|e| eyre::eyre!("Failed to initialize tracing subscriber: {e}"))
    }
}
