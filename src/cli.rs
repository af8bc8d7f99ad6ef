use clap::Parser;

/// HTTP request smuggling (CL/TE desync) black-box probe
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Target URL
    #[arg(short, long)]
    pub url: Option<String>,

    /// Virtual host to use in the Host header (overrides the URL hostname)
    #[arg(short = 'v', long = "vhost")]
    pub vhost: Option<String>,

    /// Stop probing this target as soon as a finding is confirmed
    #[arg(long = "exit_early", action = clap::ArgAction::SetTrue)]
    pub exit_early: bool,

    /// Method for the attack request
    #[arg(short, long, default_value = "POST")]
    pub method: String,

    /// Append status updates, ANSI-stripped, to this log file
    #[arg(short, long)]
    pub log: Option<String>,

    /// Suppress the per-mutation status line
    #[arg(short, long, action = clap::ArgAction::SetTrue)]
    pub quiet: bool,

    /// Per-probe socket timeout in seconds
    #[arg(short, long, default_value_t = 5.0)]
    pub timeout: f64,

    /// Disable ANSI color output
    #[arg(long = "no-color", action = clap::ArgAction::SetTrue)]
    pub no_color: bool,

    /// Route connections through an upstream HTTP CONNECT proxy (host:port)
    #[arg(short = 'x')]
    pub proxy: Option<String>,
}
