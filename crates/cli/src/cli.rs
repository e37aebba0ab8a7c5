//! CLI argument definitions using clap.

use clap::{Parser, Subcommand, ValueEnum};

/// steplink - lock-step bridge between a control agent and a physics simulation
#[derive(Parser, Debug)]
#[command(
    name = "steplink",
    author,
    version,
    about = "Lock-step UDP bridge between a control agent and a physics simulation",
    long_about = "Serves Step / Reset actions over UDP, advances the simulation one tick \n\
                  per step and replies once every sensor has reported.\n\n\
                  Configuration is read from STEPLINK_* environment variables \n\
                  (a .env file in the working directory is loaded first)."
)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true, env = "STEPLINK_VERBOSE")]
    pub verbose: u8,

    /// Suppress all output except warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Log output format
    #[arg(
        long,
        value_enum,
        default_value = "pretty",
        global = true,
        env = "STEPLINK_LOG_FORMAT"
    )]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the bridge against the in-process mock world
    Run(RunArgs),

    /// Load and validate the configuration without running
    Validate(ValidateArgs),

    /// Display the resolved configuration
    Info(InfoArgs),
}

/// Arguments for the `run` command
#[derive(Parser, Debug, Clone)]
pub struct RunArgs {
    /// Prometheus metrics port (0 = disabled)
    #[arg(long, default_value = "0", env = "STEPLINK_METRICS_PORT")]
    pub metrics_port: u16,

    /// Stop after this many replies (0 = unlimited)
    #[arg(long, default_value = "0", env = "STEPLINK_MAX_STEPS")]
    pub max_steps: u64,

    /// Stop after this many seconds (0 = no timeout)
    #[arg(long, default_value = "0", env = "STEPLINK_TIMEOUT")]
    pub timeout: u64,

    /// Deliver mock sensor messages on the ticking thread instead of
    /// worker threads
    #[arg(long)]
    pub sync_delivery: bool,
}

/// Arguments for the `validate` command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Output validation result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `info` command
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Log output format
#[derive(ValueEnum, Clone, Copy, Debug, Default)]
pub enum LogFormat {
    /// JSON structured logging
    Json,
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

impl From<LogFormat> for observability::LogFormat {
    fn from(format: LogFormat) -> Self {
        match format {
            LogFormat::Json => Self::Json,
            LogFormat::Pretty => Self::Pretty,
            LogFormat::Compact => Self::Compact,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_args() {
        let cli = Cli::try_parse_from(["steplink", "-v", "run", "--max-steps", "10"]).unwrap();
        assert_eq!(cli.verbose, 1);
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.max_steps, 10);
                assert_eq!(args.metrics_port, 0);
                assert!(!args.sync_delivery);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(Cli::try_parse_from(["steplink", "-q", "-v", "info"]).is_err());
    }

    #[test]
    fn test_log_format_values() {
        let cli =
            Cli::try_parse_from(["steplink", "--log-format", "json", "validate", "--json"])
                .unwrap();
        assert!(matches!(cli.log_format, LogFormat::Json));
        assert!(matches!(cli.command, Commands::Validate(ValidateArgs { json: true })));
    }
}
