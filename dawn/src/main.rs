//! Task Dawn - daily digest of your most important tasks
//!
//! CLI entry point.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{Local, NaiveDate};
use clap::Parser;
use colored::Colorize;
use eyre::{Context, Result};
use tracing::{debug, info};

use taskdawn::cli::{Cli, Command};
use taskdawn::config::{Config, GoogleSecrets};
use taskdawn::digest::{BRAND_NAME, BRAND_TAGLINE, DigestRenderer, Notifier, SmtpMailer, StdoutNotifier, format_due_date};
use taskdawn::rank::rank_tasks_on;
use taskdawn::run::{DailyRun, RunOutcome};
use taskdawn::tasks::{GoogleTasksClient, TaskSource};

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Note: Can't log params here since logging isn't initialized yet
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("taskdawn")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // Determine log level with priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level).map(|s| s.to_uppercase()) {
        Some(s) => match s.as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_dir.join("taskdawn.log"))
        .context("Failed to open log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load log level from config file early (before full config load)
    let config_log_level = Config::load_log_level(cli.config.as_ref());

    // Setup logging with priority: CLI > config > INFO default
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    let today = Local::now().date_naive();
    debug!(command = ?cli.command, %today, "main: dispatching command");
    match cli.command {
        Some(Command::Run { dry_run, force }) => {
            debug!(dry_run, force, "main: matched Run command");
            cmd_run(&config, today, dry_run, force).await
        }
        Some(Command::Preview) => {
            debug!("main: matched Preview command");
            cmd_run(&config, today, true, true).await
        }
        Some(Command::List { limit }) => {
            debug!(?limit, "main: matched List command");
            cmd_list(&config, today, limit).await
        }
        None => {
            debug!("main: no command specified, running digest");
            cmd_run(&config, today, false, false).await
        }
    }
}

/// Build the run from configuration; credentials are checked here
fn build_run(config: &Config, dry_run: bool) -> Result<DailyRun> {
    debug!(dry_run, "build_run: called");
    // Email credentials only matter when something is actually sent
    let (google, notifier) = if dry_run {
        debug!("build_run: dry run, printing digest");
        let google = config.google_secrets().context("Invalid environment")?;
        let notifier: Arc<dyn Notifier> = Arc::new(StdoutNotifier);
        (google, notifier)
    } else {
        let secrets = config.secrets().context("Invalid environment")?;
        let mailer = SmtpMailer::from_config(&config.email, &secrets.email).context("Failed to set up mailer")?;
        let notifier: Arc<dyn Notifier> = Arc::new(mailer);
        (secrets.google, notifier)
    };

    let source = build_source(config, google)?;
    let renderer = DigestRenderer::from_path(config.digest.template.as_deref())?;

    Ok(DailyRun::new(source, renderer, notifier, &config.digest))
}

/// Task source over the Google Tasks API
fn build_source(config: &Config, google: GoogleSecrets) -> Result<TaskSource> {
    debug!("build_source: called");
    let client = GoogleTasksClient::from_config(&config.google, google).context("Failed to create Google Tasks client")?;
    Ok(TaskSource::new(Arc::new(client), config.retry))
}

/// Send (or print) today's digest
async fn cmd_run(config: &Config, today: NaiveDate, dry_run: bool, force: bool) -> Result<()> {
    debug!(%today, dry_run, force, "cmd_run: called");
    println!("\n  {}\n  {}\n", BRAND_NAME, BRAND_TAGLINE);

    let run = build_run(config, dry_run)?;

    println!("Fetching tasks from Google Tasks...");
    match run.execute(today, force).await? {
        RunOutcome::Skipped { day } => {
            println!("{} - skipping daily digest.", day);
        }
        RunOutcome::Sent { total, top, .. } => {
            println!("Found {} uncompleted task(s).", total);
            if !dry_run {
                println!("Daily digest sent ({} of {} task(s)).", top.len(), total);
            }
        }
    }
    Ok(())
}

/// Print every open task in ranked order
async fn cmd_list(config: &Config, today: NaiveDate, limit: Option<usize>) -> Result<()> {
    debug!(%today, ?limit, "cmd_list: called");
    let google = config.google_secrets().context("Invalid environment")?;
    let source = build_source(config, google)?;

    let tasks = source.fetch_tasks().await.context("Failed to fetch tasks")?;
    let ranked = rank_tasks_on(tasks, today);
    let total = ranked.len();
    if total == 0 {
        println!("No open tasks.");
        return Ok(());
    }

    for (i, task) in ranked.iter().take(limit.unwrap_or(total)).enumerate() {
        let mut line = format!("{:>3}. {}", i + 1, task.title);
        let due = format_due_date(task.due);
        if !due.is_empty() {
            line = format!("{} ({})", line, due);
        }

        if task.is_urgent() {
            println!("{}", line.red().bold());
        } else if task.is_overdue(today) {
            println!("{}", line.yellow());
        } else {
            println!("{}", line);
        }
    }
    println!("\n{} task{} in queue", total, if total == 1 { "" } else { "s" });
    Ok(())
}
