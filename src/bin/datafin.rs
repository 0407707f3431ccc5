//! Thin presentation surface binding CLI parameters to the two core
//! operations, `download_cvm` and `extract_quotes`, and formatting their
//! result aggregates. Out of core per spec §1; follows the teacher's
//! `main.rs` startup idiom (TTY-gated color, stderr logging, clap).

use clap::{Parser, Subcommand};
use colored::Colorize;
use datafin_ingest::config::Config;
use datafin_ingest::domain::ProcessingMode;
use std::io::IsTerminal;
use std::path::PathBuf;
use tabled::{Table, Tabled};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "datafin")]
#[command(version, about = "Download and extract Brazilian CVM and B3 market archives")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Download one or more CVM document families for a year range
    Download {
        /// Destination directory for downloaded archives
        destination: PathBuf,

        /// Document families to fetch (e.g. DFP ITR FCA)
        #[arg(required = true)]
        families: Vec<String>,

        /// First year of the range
        #[arg(long)]
        from: i32,

        /// Last year of the range
        #[arg(long)]
        to: i32,
    },

    /// Extract and aggregate B3 COTAHIST quotes from staged archives
    Extract {
        /// Directory containing staged COTAHIST ZIP archives
        staging_dir: PathBuf,

        /// Destination directory for the consolidated output
        destination_dir: PathBuf,

        /// Instrument classes to keep (e.g. ações etf)
        #[arg(long, required = true)]
        classes: Vec<String>,

        /// First year of the range
        #[arg(long)]
        from: i32,

        /// Last year of the range
        #[arg(long)]
        to: i32,

        /// Output file stem (without extension)
        #[arg(long, default_value = "quotes")]
        output: String,

        /// Concurrency mode: fast or slow
        #[arg(long, default_value = "fast")]
        mode: String,
    },
}

#[derive(Tabled)]
struct DownloadRow {
    identifier: String,
    outcome: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env();

    let stdout_is_tty = std::io::stdout().is_terminal();
    let disable_color = cli.no_color || !stdout_is_tty;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.as_filter_directive()));

    tracing_subscriber::fmt()
        .with_ansi(!disable_color)
        .with_writer(std::io::stderr)
        .with_env_filter(env_filter)
        .init();

    if disable_color {
        colored::control::set_override(false);
    }

    match cli.command {
        Commands::Download {
            destination,
            families,
            from,
            to,
        } => run_download(&destination, &families, from, to, &config.network).await,
        Commands::Extract {
            staging_dir,
            destination_dir,
            classes,
            from,
            to,
            output,
            mode,
        } => run_extract(&staging_dir, &destination_dir, &classes, from, to, &output, &mode).await,
    }
}

async fn run_download(
    destination: &std::path::Path,
    families: &[String],
    from: i32,
    to: i32,
    network: &datafin_ingest::config::NetworkConfig,
) -> anyhow::Result<()> {
    let family_refs: Vec<&str> = families.iter().map(|s| s.as_str()).collect();
    let scheduler_config = datafin_ingest::cvm::SchedulerConfig::from_network_config(network);
    let result = datafin_ingest::cvm::download_cvm_with_config(
        destination,
        &family_refs,
        from,
        to,
        &scheduler_config,
        &datafin_ingest::cvm::CancellationSignal::new(),
    )
    .await?;

    let mut rows: Vec<DownloadRow> = result
        .successes()
        .iter()
        .map(|(id, path)| DownloadRow {
            identifier: id.clone(),
            outcome: format!("{} {}", "ok".green(), path.display()),
        })
        .collect();

    for (id, message) in result.errors() {
        rows.push(DownloadRow {
            identifier: id.clone(),
            outcome: format!("{} {}", "error".red(), message),
        });
    }

    println!("{}", Table::new(rows));
    println!(
        "{} succeeded, {} failed",
        result.success_count().to_string().green(),
        result.error_count().to_string().red()
    );

    if !result.errors().is_empty() {
        std::process::exit(1);
    }
    Ok(())
}

async fn run_extract(
    staging_dir: &std::path::Path,
    destination_dir: &std::path::Path,
    classes: &[String],
    from: i32,
    to: i32,
    output: &str,
    mode: &str,
) -> anyhow::Result<()> {
    let mode = ProcessingMode::parse(mode).map_err(anyhow::Error::msg)?;
    let result = datafin_ingest::extract_quotes(
        staging_dir,
        destination_dir,
        classes,
        from,
        to,
        output,
        mode,
    )
    .await?;

    if result.success() {
        println!("{}", result.message().green());
    } else {
        println!("{}", result.message().red());
        std::process::exit(1);
    }
    Ok(())
}
