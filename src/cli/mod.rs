//! Command-line interface for thread-integrity
//!
//! Parses the account selector and run-mode flags, wires logging and starts
//! the inbox loop.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

use crate::bot::{Bot, BotOptions};
use crate::config::{load_settings, ResolvedAccount, Settings};
use crate::paste::Pastebin;
use crate::platform::RedditClient;
use crate::rank::SortKey;
use crate::render::ReportFormat;

pub mod logging;

use logging::{init_logging, LogFileOptions};

/// Reddit bot that summarises the top-level commenters of a thread
#[derive(Parser)]
#[command(name = "thread-integrity")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Account profile to run as (a key under `accounts` in the config)
    #[arg(value_name = "ACCOUNT")]
    account: String,

    /// Handle a single inbox item, then exit
    #[arg(long)]
    once: bool,

    /// Log every computed report row
    #[arg(long)]
    debug: bool,

    /// Config file (TOML or YAML); defaults to ./thread-integrity.toml when present
    #[arg(short, long, value_name = "PATH", env = "THREAD_INTEGRITY_CONFIG")]
    config: Option<PathBuf>,

    /// Report ordering (overrides the config file)
    #[arg(long, value_enum)]
    sort: Option<SortKey>,

    /// Report layout (overrides the config file)
    #[arg(long, value_enum)]
    format: Option<ReportFormat>,

    /// Enable verbose logging (sets log level to DEBUG)
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn bot_options(&self, settings: &Settings) -> BotOptions {
        let mut options = BotOptions::from_settings(settings);
        options.once = self.once;
        options.debug = self.debug;
        if let Some(sort) = self.sort {
            options.sort = sort;
        }
        if let Some(format) = self.format {
            options.format = format;
        }
        options
    }
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    let settings = match load_settings(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(err) => {
            init_logging(cli.verbose, None)?;
            tracing::error!("{:#}", err);
            return Err(err);
        }
    };

    init_logging(
        cli.verbose,
        Some(&LogFileOptions {
            dir: settings.log_dir.clone(),
            max_bytes: settings.log_max_bytes,
            backups: settings.log_backups,
        }),
    )?;

    let account = resolve_account(&settings, &cli.account)?;

    tracing::debug!("Connecting to reddit");
    let platform = RedditClient::connect(account.credentials.clone(), &settings.user_agent)
        .with_context(|| format!("Failed to connect to reddit as {}", account.selector))?;
    let paste = Pastebin::new(account.pastebin_key.clone(), settings.paste_endpoint.clone())
        .context("Failed to build paste client")?;

    let options = cli.bot_options(&settings);
    tracing::info!(
        account = %account.selector,
        once = options.once,
        sort = ?options.sort,
        format = ?options.format,
        "Starting inbox loop"
    );
    Bot::new(platform, paste, options).run();
    Ok(())
}

fn resolve_account(settings: &Settings, selector: &str) -> Result<ResolvedAccount> {
    settings.account(selector).map_err(|err| {
        tracing::error!("{}", err);
        err.into()
    })
}
