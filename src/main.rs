use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::{error, info};

use upstream_check::config::{self, AppConfig, STATE_STORE_KEY};
use upstream_check::update::clock::SystemClock;
use upstream_check::update::policy::{LogNotifier, UpdateDecision};
use upstream_check::update::scheduler::{CheckOutcome, UpdateScheduler};
use upstream_check::update::source::UsageSource;
use upstream_check::update::sources::GitHubSource;
use upstream_check::update::sources::usage_api::{UnconfiguredUsageSource, UsageApiSource};
use upstream_check::update::store::{MemoryStateStore, SqliteStateStore, StateStore};

#[derive(Parser)]
#[command(name = "upstream-check")]
#[command(version, about = "Throttled upstream release and usage checker")]
struct Cli {
    /// Configuration file (defaults to the data directory's config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// State database (defaults to the data directory's state.db)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the version and usage checks
    Check {
        #[arg(long)]
        force: bool,
    },
    /// Run the version check only
    Version {
        #[arg(long)]
        force: bool,
    },
    /// Run the usage check only
    Usage {
        #[arg(long)]
        force: bool,
    },
    /// Show the last known state without contacting upstream
    Status,
    /// Keep checking until interrupted
    Watch {
        /// Seconds between ticks; the throttle windows still apply
        #[arg(long, default_value_t = 60)]
        every: u64,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _guard = upstream_check::logging::init(&config::log_path(), cli.verbose)?;

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(run(cli))
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = AppConfig::load(&cli.config.unwrap_or_else(config::config_path))?;
    let db_path = cli.db.unwrap_or_else(config::db_path);
    let scheduler = build_scheduler(config, db_path)?;

    match cli.command.unwrap_or(Command::Check { force: false }) {
        Command::Check { force } => {
            let (version, usage) =
                futures::join!(scheduler.check_version(force), scheduler.check_usage(force));
            report("Version", &version, force);
            report("Usage", &usage, force);
            print_decision(&scheduler);
            print_usage(&scheduler);
        }
        Command::Version { force } => {
            report("Version", &scheduler.check_version(force).await, force);
            print_decision(&scheduler);
        }
        Command::Usage { force } => {
            report("Usage", &scheduler.check_usage(force).await, force);
            print_usage(&scheduler);
        }
        Command::Status => {
            print_decision(&scheduler);
            print_usage(&scheduler);
        }
        Command::Watch { every } => watch(&scheduler, every).await,
    }

    Ok(())
}

fn build_scheduler(config: AppConfig, db_path: PathBuf) -> anyhow::Result<UpdateScheduler> {
    let store: Arc<dyn StateStore> = match SqliteStateStore::new(&db_path, STATE_STORE_KEY) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            error!(
                "Failed to open state database {:?}, state will not persist: {}",
                db_path, e
            );
            Arc::new(MemoryStateStore::new())
        }
    };

    let source = Arc::new(GitHubSource::new(
        &config.github_api_url,
        &config.repository,
    )?);

    let usage: Arc<dyn UsageSource> = match &config.usage.endpoint {
        Some(endpoint) => Arc::new(UsageApiSource::new(
            endpoint,
            config.usage.api_key.clone(),
        )?),
        None => Arc::new(UnconfiguredUsageSource),
    };

    let is_app = config.is_app;
    let scheduler = UpdateScheduler::new(config, store, source, usage, Arc::new(SystemClock));

    Ok(if is_app {
        scheduler.with_notifier(Arc::new(LogNotifier))
    } else {
        scheduler
    })
}

async fn watch(scheduler: &UpdateScheduler, every: u64) {
    info!("Watching upstream every {}s", every);
    let mut ticker = tokio::time::interval(Duration::from_secs(every.max(1)));

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                futures::join!(scheduler.check_version(false), scheduler.check_usage(false));
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, stopping watch");
                break;
            }
        }
    }
}

/// Failures are only shown for interactive, forced checks
fn report(label: &str, outcome: &CheckOutcome, force: bool) {
    if let CheckOutcome::Failed(reason) = outcome
        && force
    {
        eprintln!("{} check failed: {}", label, reason);
    }
}

fn print_decision(scheduler: &UpdateScheduler) {
    let current = scheduler.format_version(&scheduler.state().version);
    match scheduler.decision() {
        UpdateDecision::UpToDate => println!("{} is the latest version", current),
        UpdateDecision::UpdateAvailable(remote) => {
            println!("New version available: {} (current {})", remote, current)
        }
        UpdateDecision::Indeterminate => println!("Latest version unknown (current {})", current),
    }
}

fn print_usage(scheduler: &UpdateScheduler) {
    let state = scheduler.state();
    println!("Usage: {} of {}", state.used, state.subscription);
}
