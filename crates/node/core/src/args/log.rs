//! Logging CLI arguments.

use clap::Args;

/// Logging configuration.
#[derive(Debug, Args, Clone, Default, PartialEq, Eq)]
#[command(next_help_heading = "Logging")]
pub struct LogArgs {
    /// Silence all output except errors.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (-v, -vv, -vvv, etc.).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbosity: u8,

    /// Log filter directive (e.g., "meridian_swarm_rpc=debug").
    #[arg(long = "log.filter", value_name = "DIRECTIVE", global = true)]
    pub filter: Option<String>,

    /// Use JSON format for log output.
    #[arg(long = "log.json", global = true)]
    pub json: bool,
}

impl LogArgs {
    /// Level used when `RUST_LOG` is unset.
    pub fn base_level(&self) -> &'static str {
        if self.quiet {
            return "error";
        }
        match self.verbosity {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[derive(Parser)]
    struct Cli {
        #[command(flatten)]
        log: LogArgs,
    }

    #[test]
    fn test_parse() {
        let cli = Cli::parse_from(["meridian", "-vv", "--log.filter", "meridian=trace", "--log.json"]);
        assert_eq!(cli.log.verbosity, 2);
        assert_eq!(cli.log.filter.as_deref(), Some("meridian=trace"));
        assert!(cli.log.json);
        assert_eq!(cli.log.base_level(), "trace");
    }

    #[test]
    fn test_levels() {
        assert_eq!(LogArgs::default().base_level(), "info");
        let quiet = LogArgs {
            quiet: true,
            verbosity: 3,
            ..Default::default()
        };
        assert_eq!(quiet.base_level(), "error");
    }
}
