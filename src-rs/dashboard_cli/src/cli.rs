use clap::Parser;

use crate::models::CLIConfig;

const DEFAULT_URL: &str = "http://localhost:3000";

/// Terminal dashboard for the invocations of one command.
#[derive(Debug, Parser)]
#[command(name = "invocation-dashboard", version)]
pub struct Args {
    /// Origin serving the invocation feed.
    #[arg(long = "base", env = "INVOCATION_DASHBOARD_URL", default_value = DEFAULT_URL)]
    pub base_url: String,
    /// Command whose invocations are shown.
    #[arg(long = "command", env = "INVOCATION_DASHBOARD_COMMAND_ID")]
    pub command_id: String,
    /// Give up on a feed request after this many seconds.
    #[arg(long, env = "INVOCATION_DASHBOARD_TIMEOUT_SECS")]
    pub timeout_secs: Option<u64>,
    /// Follow live updates right after the initial load.
    #[arg(long)]
    pub watch: bool,
    /// Print status lines only, no output.
    #[arg(long, short)]
    pub quiet: bool,
}

impl From<Args> for CLIConfig {
    fn from(args: Args) -> Self {
        Self {
            base_url: args.base_url,
            command_id: args.command_id,
            timeout_secs: args.timeout_secs,
            watch: args.watch,
            quiet: args.quiet,
        }
    }
}

pub fn parse_config() -> CLIConfig {
    Args::parse().into()
}
