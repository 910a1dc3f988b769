//! Contact-Scout main entry point
//!
//! This is the command-line interface for the Contact-Scout harvesting engine.

use clap::Parser;
use contact_scout::config::{load_config_with_hash, Config, BROWSER_USER_AGENT};
use contact_scout::fetch::{BrowserFetcher, DirectFetcher, FetchStrategy};
use contact_scout::proxy::{test_all_proxies, test_single_proxy};
use contact_scout::storage::{self, lock_storage, SharedStorage};
use contact_scout::Orchestrator;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Contact-Scout: a contact harvesting engine
///
/// Contact-Scout visits the homepages of a stored project and a bounded set
/// of their internal pages, collecting contact emails and social profiles.
/// Blocked or script-rendered sites are retried in a headless browser.
#[derive(Parser, Debug)]
#[command(name = "contact-scout")]
#[command(version)]
#[command(about = "A contact harvesting engine", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Run (or resume) the scrape of a project
    #[arg(long, value_name = "ID", group = "mode")]
    project: Option<i64>,

    /// Health-test one stored proxy and record the result
    #[arg(long, value_name = "ID", group = "mode")]
    test_proxy: Option<i64>,

    /// Health-test every stored proxy of a user
    #[arg(long, value_name = "USER", group = "mode")]
    test_all_proxies: Option<i64>,

    /// Show statistics for a project and exit
    #[arg(long, value_name = "ID", group = "mode")]
    stats: Option<i64>,

    /// Create a project from a file with one homepage per line
    #[arg(long, value_name = "FILE", group = "mode", requires_all = ["user", "name"])]
    import: Option<PathBuf>,

    /// Seed the default email filters for a user
    #[arg(long, value_name = "USER", group = "mode")]
    seed_filters: Option<i64>,

    /// Flag projects left running by a crashed process as paused
    #[arg(long, group = "mode")]
    recover_stuck: bool,

    /// Owner of an imported project
    #[arg(long, value_name = "USER")]
    user: Option<i64>,

    /// Name of an imported project
    #[arg(long, value_name = "NAME")]
    name: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (cfg, hash)
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    let storage = storage::share(storage::open_storage(Path::new(
        &config.output.database_path,
    ))?);

    // Handle different modes
    if let Some(project_id) = cli.project {
        handle_run(config, config_hash, storage, project_id).await?;
    } else if let Some(proxy_id) = cli.test_proxy {
        let report = test_single_proxy(&storage, &config, proxy_id).await?;
        println!(
            "Proxy {} ({}): {} at {}",
            report.proxy_id,
            report.url,
            if report.is_active { "working" } else { "not working" },
            report.tested_at.to_rfc3339()
        );
    } else if let Some(user_id) = cli.test_all_proxies {
        for report in test_all_proxies(&storage, &config, user_id).await? {
            println!(
                "Proxy {} ({}): {}",
                report.proxy_id,
                report.url,
                if report.is_active { "working" } else { "not working" }
            );
        }
    } else if let Some(project_id) = cli.stats {
        handle_stats(&storage, project_id)?;
    } else if let Some(path) = cli.import {
        // clap enforces both with `requires_all`
        let user_id = cli.user.ok_or("--import requires --user")?;
        let name = cli.name.ok_or("--import requires --name")?;
        handle_import(&storage, &path, user_id, &name)?;
    } else if let Some(user_id) = cli.seed_filters {
        let inserted = lock_storage(&storage).seed_default_email_filters(user_id)?;
        println!("Seeded {} email filters for user {}", inserted, user_id);
    } else if cli.recover_stuck {
        let recovered = lock_storage(&storage).recover_stuck_projects()?;
        println!("Paused {} stuck project(s): {:?}", recovered.len(), recovered);
    } else {
        println!("Nothing to do; pass --project ID to start a run (see --help)");
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("contact_scout=info,warn"),
            1 => EnvFilter::new("contact_scout=debug,info"),
            2 => EnvFilter::new("contact_scout=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --project mode: runs a project to a terminal state
async fn handle_run(
    config: Config,
    config_hash: String,
    storage: SharedStorage,
    project_id: i64,
) -> Result<(), Box<dyn std::error::Error>> {
    // A new run starts unpaused; a pause left from a previous run would
    // otherwise stop it before the first batch
    lock_storage(&storage).set_paused(project_id, false)?;

    let direct: Arc<dyn FetchStrategy> = Arc::new(DirectFetcher::new(config.http.clone()));
    let browser: Option<Arc<dyn FetchStrategy>> = if config.browser.enabled {
        Some(Arc::new(BrowserFetcher::new(
            config.browser.clone(),
            BROWSER_USER_AGENT,
        )))
    } else {
        tracing::info!("Browser fallback disabled");
        None
    };

    let orchestrator = Orchestrator::new(config, storage, direct, browser)
        .with_config_hash(config_hash);

    // Ctrl-C pauses cooperatively; in-flight homepages still finish
    let handle = orchestrator.handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, pausing after in-flight homepages");
            handle.pause();
        }
    });

    match orchestrator.start_run(project_id).await {
        Ok(outcome) => {
            println!(
                "Project {} {}: {}/{} homepages, {} emails",
                outcome.project_id, outcome.status, outcome.processed, outcome.total, outcome.emails
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!("Run failed: {}", e);
            Err(e.into())
        }
    }
}

/// Handles the --stats mode: shows statistics for one project
fn handle_stats(storage: &SharedStorage, project_id: i64) -> Result<(), Box<dyn std::error::Error>> {
    use contact_scout::output::{load_statistics, print_statistics};

    let stats = {
        let storage = lock_storage(storage);
        load_statistics(&*storage, project_id)?
    };
    print_statistics(&stats);

    Ok(())
}

/// Handles the --import mode: creates a project from a URL list
fn handle_import(
    storage: &SharedStorage,
    path: &Path,
    user_id: i64,
    name: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let contents = std::fs::read_to_string(path)?;
    let urls: Vec<String> = contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect();

    let mut storage = lock_storage(storage);
    let project_id = storage.create_project(user_id, name)?;
    let added = storage.add_project_urls(project_id, &urls)?;
    storage.set_total_urls(project_id, added as u64)?;

    println!(
        "Created project {} ({}) with {} homepages",
        project_id, name, added
    );

    Ok(())
}
