use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(name = "flight-monitor")]
#[command(about = "Monitors flight-deal searches and publishes a price summary")]
pub struct CliArgs {
    /// Path to the TOML (or legacy JSON) configuration file
    #[arg(short, long, default_value = "monitor.toml")]
    pub config: String,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Emit JSON log lines (for CI runners)
    #[arg(long)]
    pub json_logs: bool,

    /// Validate the configuration and print the query plan without opening a browser
    #[arg(long)]
    pub dry_run: bool,

    /// Override the HTML report path (directory/filename.html)
    #[arg(long)]
    pub html_output: Option<String>,

    /// Skip Telegram and Gist delivery
    #[arg(long)]
    pub no_notify: bool,
}
