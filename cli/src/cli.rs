use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, builder::styling};
use tracelogs_common::types::{
    project::{DeploymentId, ProjectId},
    time::WindowCapacity,
};

use crate::types::Timestamp;

const STYLES: styling::Styles = styling::Styles::styled()
    .header(styling::AnsiColor::Green.on_default().bold())
    .usage(styling::AnsiColor::Green.on_default().bold())
    .literal(styling::AnsiColor::Blue.on_default().bold())
    .placeholder(styling::AnsiColor::Cyan.on_default());

const GENERAL_USAGE: &str = color_print::cstr!(
    r#"
    <dim>$</dim> <bold>tracelogs config set logs_base_url https://console.example.com/api</bold>
    <dim>$</dim> <bold>tracelogs login --email me@example.com</bold>
    <dim>$</dim> <bold>tracelogs download --trace trace.json</bold>
    "#
);

#[derive(Parser, Debug)]
#[command(name = "tracelogs", version, override_usage = GENERAL_USAGE, styles = STYLES)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Manage CLI configuration.
    #[command(subcommand)]
    Config(ConfigCommand),

    /// Sign in and cache an auth token for later downloads.
    ///
    /// Either pass an existing token with `--token`, or an email and
    /// password to exchange for one.
    Login(LoginArgs),

    /// Discard the cached auth token.
    Logout,

    /// Show the project, deployments and time range a trace points at.
    Inspect {
        /// Jaeger trace JSON file.
        #[arg(value_name = "FILE")]
        trace: PathBuf,

        /// Trace to use when the file holds more than one.
        #[arg(long)]
        trace_id: Option<String>,
    },

    /// Show how a time range is split into log windows.
    ///
    /// Each window is fetched with its own request. The last window always
    /// spans the full capacity and may end after the requested range.
    Windows(WindowsArgs),

    /// Download the logs for a time range.
    ///
    /// The range is split into windows no longer than the configured
    /// `window_capacity` and every window is requested concurrently. The
    /// download fails if any window fails.
    Download(DownloadArgs),
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// List all configuration values.
    List,
    /// Get a configuration value.
    Get {
        /// Config key
        key: crate::config::ConfigKey,
    },
    /// Set a configuration value.
    Set {
        /// Config key
        key: crate::config::ConfigKey,
        /// Value to set
        value: String,
    },
    /// Unset a configuration value.
    Unset {
        /// Config key
        key: crate::config::ConfigKey,
    },
}

#[derive(Args, Debug)]
pub struct LoginArgs {
    /// Existing token, cached as is.
    #[arg(long, conflicts_with = "email")]
    pub token: Option<String>,

    /// Account email.
    #[arg(short, long)]
    pub email: Option<String>,

    /// Account password.
    #[arg(long, env = "TRACELOGS_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct TraceArgs {
    /// Jaeger trace JSON to take defaults from.
    ///
    /// Accepts either the API envelope `{"data": [...]}` or a single trace.
    #[arg(short, long, value_name = "FILE")]
    pub trace: Option<PathBuf>,

    /// Trace to use when the file holds more than one.
    #[arg(long, requires = "trace")]
    pub trace_id: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct TimeRangeArgs {
    /// Start of the range, as epoch milliseconds or RFC 3339.
    ///
    /// Defaults to the first span of `--trace`.
    #[arg(short, long)]
    pub start: Option<Timestamp>,

    /// End of the range, as epoch milliseconds or RFC 3339.
    ///
    /// Defaults to the end of the last span of `--trace`.
    #[arg(short, long)]
    pub end: Option<Timestamp>,
}

#[derive(Args, Debug)]
pub struct WindowsArgs {
    #[command(flatten)]
    pub trace: TraceArgs,

    #[command(flatten)]
    pub range: TimeRangeArgs,

    /// Longest span per window, e.g. `90m` or milliseconds.
    ///
    /// Defaults to the configured `window_capacity`.
    #[arg(short, long)]
    pub capacity: Option<WindowCapacity>,
}

#[derive(Args, Debug)]
pub struct DownloadArgs {
    #[command(flatten)]
    pub trace: TraceArgs,

    #[command(flatten)]
    pub range: TimeRangeArgs,

    /// Project the deployments belong to.
    ///
    /// Defaults to the `rioProjectId` tag of `--trace`.
    #[arg(short, long)]
    pub project: Option<ProjectId>,

    /// Deployment to include. Repeat for several.
    ///
    /// Defaults to every `rioDeploymentId` tag of `--trace`.
    #[arg(short, long = "deployment", value_name = "DEPLOYMENT")]
    pub deployments: Vec<DeploymentId>,

    /// Directory the archives are written to.
    ///
    /// Defaults to the configured `output_dir`, or the current directory.
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Name the archives are saved under.
    ///
    /// Defaults to `<start>.tar`. Later windows get a numbered suffix.
    #[arg(short, long)]
    pub filename: Option<String>,

    /// Fail before downloading if no token is cached.
    #[arg(long)]
    pub require_auth: bool,
}
