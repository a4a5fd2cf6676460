//! `issuebrief` — turn a press inquiry into a structured issue report.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;
use tracing_subscriber::EnvFilter;

use commands::{Cli, Command, LogFormat};

fn init_tracing(verbosity: u8, format: LogFormat) {
    let default_filter = match verbosity {
        0 => "issuebrief=warn",
        1 => "issuebrief=info",
        2 => "issuebrief=debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_format);

    match cli.command {
        Command::Report {
            outlet,
            reporter,
            issue,
            mode,
            data_dir,
            output,
        } => commands::run_report(outlet, reporter, issue, mode, data_dir, output).await,
        Command::Config { action } => commands::run_config(action),
        Command::Outlets { query } => commands::run_outlets(query),
    }
}
