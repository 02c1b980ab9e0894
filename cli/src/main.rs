mod cli;
mod config;
mod error;
mod ops;
mod session;
mod types;

#[global_allocator]
static ALLOC: mimalloc::MiMalloc = mimalloc::MiMalloc;

use clap::Parser;
use cli::{Cli, Command, ConfigCommand};
use colored::Colorize;
use config::{
    ConfigKey, client_config, config_dir, load_cli_config, load_config_file, set_config_value,
    unset_config_value, window_capacity,
};
use error::CliError;
use session::SessionFile;
use strum::VariantNames;
use tabled::Table;
use tracelogs_sdk::{LogsClient, auth, store::TokenCache};
use tracing_subscriber::{fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt};
use types::{WindowRow, format_millis};

#[tokio::main]
async fn main() -> miette::Result<()> {
    miette::set_panic_hook();
    run().await?;
    Ok(())
}

async fn run() -> Result<(), CliError> {
    let commands = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_span_events(FmtSpan::NEW)
                .compact()
                .with_writer(std::io::stderr),
        )
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    match commands.command {
        Command::Config(config_cmd) => match config_cmd {
            ConfigCommand::List => {
                let config = load_config_file()?;
                for k in ConfigKey::VARIANTS {
                    if let Ok(key) = k.parse::<ConfigKey>()
                        && let Some(v) = config.get(key)
                    {
                        println!("{} = {}", k, v);
                    }
                }
            }
            ConfigCommand::Get { key } => {
                let config = load_config_file()?;
                if let Some(v) = config.get(key) {
                    println!("{}", v);
                }
            }
            ConfigCommand::Set { key, value } => {
                let saved_path = set_config_value(key, value)?;
                eprintln!("{}", format!("✓ {} set", key).green().bold());
                eprintln!(
                    "  Configuration saved to: {}",
                    saved_path.display().to_string().cyan()
                );
            }
            ConfigCommand::Unset { key } => {
                let saved_path = unset_config_value(key)?;
                eprintln!("{}", format!("✓ {} unset", key).green().bold());
                eprintln!(
                    "  Configuration saved to: {}",
                    saved_path.display().to_string().cyan()
                );
            }
        },

        Command::Inspect { trace, trace_id } => {
            let context = ops::load_trace(&trace, trace_id.as_deref())?;
            match &context.project_id {
                Some(project) => println!("project      {}", project),
                None => println!("project      {}", "-".dimmed()),
            }
            if context.deployment_ids.is_empty() {
                println!("deployments  {}", "-".dimmed());
            } else {
                for (i, deployment) in context.deployment_ids.iter().enumerate() {
                    let label = if i == 0 { "deployments" } else { "" };
                    println!("{:<12} {}", label, deployment);
                }
            }
            match context.range {
                Some(range) => {
                    println!("start        {} ({})", range.start(), format_millis(range.start()));
                    println!("end          {} ({})", range.end(), format_millis(range.end()));
                    println!("filename     {}.tar", range.start());
                }
                None => println!("range        {}", "-".dimmed()),
            }
        }

        Command::Windows(args) => {
            let configured = window_capacity(&load_cli_config()?)?;
            let (range, capacity, windows) = ops::plan_windows(&args, configured)?;
            let rows: Vec<WindowRow> = windows
                .iter()
                .enumerate()
                .map(|(i, w)| WindowRow::new(i + 1, *w))
                .collect();
            println!("{}", Table::new(rows));
            eprintln!(
                "{}",
                format!(
                    "{} window(s) of {} covering {}",
                    windows.len(),
                    humantime::format_duration(capacity.as_duration()),
                    range
                )
                .dimmed()
            );
        }

        Command::Login(args) => {
            let input = ops::login_input(args)?;
            let cli_config = load_cli_config()?;
            let client = LogsClient::new(client_config(&cli_config)?).map_err(CliError::SdkInit)?;
            let tokens = session_tokens()?;
            ops::login(&client, &tokens, input).await?;
            eprintln!("{}", "✓ Logged in".green().bold());
            eprintln!(
                "  Token cached in: {}",
                tokens.store().path().display().to_string().cyan()
            );
        }

        Command::Logout => {
            auth::logout(&session_tokens()?).map_err(CliError::Logout)?;
            eprintln!("{}", "✓ Logged out".green().bold());
        }

        Command::Download(args) => {
            let cli_config = load_cli_config()?;
            let plan = ops::download_plan(args, cli_config.output_dir.clone())?;
            let client = LogsClient::new(client_config(&cli_config)?).map_err(CliError::SdkInit)?;
            let outcome = ops::download(&client, &session_tokens()?, &plan).await?;
            eprintln!(
                "{}",
                format!(
                    "✓ Downloaded {} window(s), {} bytes",
                    outcome.report.windows, outcome.report.bytes
                )
                .green()
                .bold()
            );
            eprintln!(
                "  Saved {} file(s) in {}:",
                outcome.saved.len(),
                plan.output_dir.display().to_string().cyan()
            );
            for path in &outcome.saved {
                eprintln!("    {}", path.display());
            }
        }
    }

    Ok(())
}

fn session_tokens() -> Result<TokenCache<SessionFile>, CliError> {
    let path = config_dir()?.join("session.json");
    Ok(TokenCache::new(SessionFile::new(path)))
}
