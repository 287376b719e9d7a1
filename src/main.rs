use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};

use repo_index::config::Config;
use repo_index::index::{FileIndexStore, IndexStorer, ops};

#[derive(Parser)]
#[command(name = "repo-index")]
#[command(version, about = "Inspect and rewrite package repository index documents")]
struct Cli {
    /// JSON config file (defaults to config.json in the data directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the latest build of a package
    Latest { index: PathBuf, package: String },
    /// Print the latest version of every package
    List { index: PathBuf },
    /// Remove all version codes and rewrite the index in place
    StripVersionCodes { index: PathBuf },
    /// Load and atomically store the index unchanged
    Rewrite { index: PathBuf },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref()).context("failed to load config")?;
    let _guard = repo_index::logging::init(&config.log).context("failed to set up logging")?;

    match cli.command {
        Command::Latest { index, package } => {
            let storer = FileIndexStore::new(index, config.store);
            let Some(latest) = ops::latest_package(&storer, &package)? else {
                bail!("package {} not found in {:?}", package, storer.path());
            };
            println!("{}", serde_json::to_string_pretty(&latest)?);
        }
        Command::List { index } => {
            let storer = FileIndexStore::new(index, config.store);
            let mut repo_index = storer.load()?;
            for (name, latest) in repo_index.latest_packages() {
                let added = latest
                    .added_at()
                    .map(|added| added.format("%Y-%m-%d").to_string())
                    .unwrap_or_else(|| "-".to_string());
                println!("{}\t{}\t{}", name, latest.version_name, added);
            }
        }
        Command::StripVersionCodes { index } => {
            let storer = FileIndexStore::new(index, config.store);
            let summary = ops::redact_version_codes(&storer)?;
            println!(
                "removed {} suggested version codes and {} version codes",
                summary.suggested_version_codes, summary.version_codes
            );
        }
        Command::Rewrite { index } => {
            let storer = FileIndexStore::new(index, config.store);
            ops::rewrite(&storer)?;
        }
    }

    Ok(())
}
