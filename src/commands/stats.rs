//! Default command: print and store repository traffic.

use std::io;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, ValueEnum};

use gts::collect::{self, Target, ALL_REPOS};
use gts::config::{self, Overrides, Settings};
use gts::sink::{CsvSink, DatabaseSink, RunContext, Sink};
use gts::{Credentials, GitHubClient};

/// Where fetched reports are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SaveMode {
    /// Append to timestamped CSV files
    #[value(name = "save_csv")]
    SaveCsv,
    /// Print only
    #[value(name = "no_csv")]
    NoCsv,
    /// Write to the SQLite database
    #[value(name = "set_db")]
    SetDb,
}

#[derive(Args, Debug)]
pub struct StatsArgs {
    /// GitHub username, or username:password (password or token)
    #[arg(value_name = "USERNAME[:PASSWORD]")]
    pub username: String,

    /// Repository name, or ALL for every repository
    #[arg(default_value = ALL_REPOS)]
    pub repo: String,

    /// Storage mode
    #[arg(value_enum, default_value = "save_csv")]
    pub save: SaveMode,

    /// Account that owns the repositories (defaults to the username)
    #[arg(short, long)]
    pub organization: Option<String>,

    /// Do not print tables
    #[arg(long)]
    pub no_print: bool,

    /// Directory for CSV files
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// SQLite database file used by set_db
    #[arg(long, value_name = "PATH")]
    pub db: Option<PathBuf>,

    /// GitHub API base URL
    #[arg(long, value_name = "URL")]
    pub api_url: Option<String>,

    /// Config file (defaults to <config dir>/gts/config.toml)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

pub fn execute(args: StatsArgs) -> Result<()> {
    let config = config::load(args.config.as_deref())?;
    let settings = Settings::resolve(config, &overrides(&args))?;

    let credentials = Credentials::resolve(&args.username)?;
    let owner = match &args.organization {
        Some(org) => org.trim().to_string(),
        None => credentials.username.clone(),
    };

    let client = GitHubClient::connect(credentials, &settings.github, &owner)?;

    let context = RunContext::new(&settings.output_dir);
    let sinks = build_sinks(args.save, &settings, &context);

    let target = Target::parse(&args.repo);
    log::debug!("Collecting {:?} for {} ({:?})", target, owner, args.save);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let stats = collect::run(&client, &target, &sinks, settings.print, &mut out)?;

    log::info!(
        "Done: {} processed, {} skipped",
        stats.processed.len(),
        stats.skipped.len()
    );
    Ok(())
}

fn overrides(args: &StatsArgs) -> Overrides {
    Overrides {
        api_url: args.api_url.clone(),
        output_dir: args.output_dir.clone(),
        db: args.db.clone(),
        no_print: args.no_print,
    }
}

fn build_sinks(save: SaveMode, settings: &Settings, context: &RunContext) -> Vec<Box<dyn Sink>> {
    match save {
        SaveMode::SaveCsv => vec![Box::new(CsvSink::new(context))],
        SaveMode::NoCsv => Vec::new(),
        SaveMode::SetDb => vec![Box::new(DatabaseSink::new(&settings.db_path, context))],
    }
}
