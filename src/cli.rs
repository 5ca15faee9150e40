//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::cell::RefCell;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use crate::adapters::csv_adapter::{CsvResultLog, read_feed_records};
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::ini_strategy_adapter::{IniStrategyAdapter, strategies_from_config};
use crate::adapters::log_notifier::LogNotifier;
use crate::domain::config_validation::validate_worker_config;
use crate::domain::error::GhostError;
use crate::domain::outcome::ColorScheme;
use crate::domain::signal::ResultRecord;
use crate::domain::summary::StrategySummary;
use crate::ports::config_port::ConfigPort;
use crate::ports::notify_port::{ChannelPort, NotifyPort};
use crate::ports::result_log_port::ResultLogPort;
use crate::ports::strategy_port::StrategyPort;
use crate::worker::{RunStats, Worker, WorkerConfig};

#[cfg(feature = "sqlite")]
use crate::adapters::sqlite_adapter::SqliteAdapter;

#[derive(Parser, Debug)]
#[command(name = "ghostsignal", about = "Pattern signals and gale tracking over a live outcome feed")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Poll the live feed and emit signals
    Run {
        #[arg(short, long)]
        config: PathBuf,
        /// Stop after this many polls
        #[arg(long)]
        max_ticks: Option<u64>,
        /// Log notices instead of sending them; skip the result log
        #[arg(long)]
        dry_run: bool,
    },
    /// Drive the engine over a recorded feed
    Replay {
        #[arg(short, long)]
        outcomes: PathBuf,
        #[arg(short, long)]
        strategies: PathBuf,
        #[arg(long, default_value = "color_id")]
        color_source: String,
        #[arg(short, long)]
        results: Option<PathBuf>,
    },
    /// Validate a strategy file
    Validate {
        #[arg(short, long)]
        strategies: PathBuf,
    },
    /// Show per-strategy results from the result log
    Summary {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Create the sqlite schema
    InitDb {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Run {
            config,
            max_ticks,
            dry_run,
        } => run_live(&config, max_ticks, dry_run),
        Command::Replay {
            outcomes,
            strategies,
            color_source,
            results,
        } => run_replay(&outcomes, &strategies, &color_source, results.as_ref()),
        Command::Validate { strategies } => run_validate(&strategies),
        Command::Summary { config } => run_summary(&config),
        Command::InitDb { config } => run_init_db(&config),
    }
}

fn fail(err: GhostError) -> ExitCode {
    eprintln!("error: {err}");
    ExitCode::from(&err)
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        fail(GhostError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        })
    })
}

pub fn build_worker_config(config: &dyn ConfigPort) -> Result<WorkerConfig, GhostError> {
    validate_worker_config(config)?;

    let feed_url = config
        .get_string("feed", "url")
        .ok_or_else(|| GhostError::ConfigMissing {
            section: "feed".into(),
            key: "url".into(),
        })?;
    let color_scheme = match config.get_string("feed", "color_source") {
        Some(s) => ColorScheme::parse(&s).ok_or_else(|| GhostError::ConfigInvalid {
            section: "feed".into(),
            key: "color_source".into(),
            reason: format!("unknown color source '{s}'"),
        })?,
        None => ColorScheme::default(),
    };

    Ok(WorkerConfig {
        feed_url,
        color_scheme,
        poll_interval: Duration::from_millis(config.get_int("feed", "poll_interval_ms", 1000) as u64),
        timeout: Duration::from_secs(config.get_int("feed", "timeout_secs", 5) as u64),
        max_retries: config.get_int("feed", "max_retries", 3) as u32,
    })
}

/// The collaborators a live run needs, chosen from the config.
pub struct Ports {
    pub strategies: Box<dyn StrategyPort>,
    pub notifier: Box<dyn NotifyPort>,
    pub result_logs: Vec<Box<dyn ResultLogPort>>,
}

/// With `[sqlite] path` set, the database serves strategies, results and
/// channels; otherwise strategies come from `[strategies] file`.
pub fn build_ports(config: &dyn ConfigPort, dry_run: bool) -> Result<Ports, GhostError> {
    let mut result_logs: Vec<Box<dyn ResultLogPort>> = Vec::new();
    #[allow(unused_mut)]
    let mut channels: Option<Box<dyn ChannelPort>> = None;

    #[cfg(feature = "sqlite")]
    let strategies: Box<dyn StrategyPort> = match open_store(config)? {
        Some(store) => {
            if !dry_run {
                result_logs.push(Box::new(store.clone()));
            }
            channels = Some(Box::new(store.clone()));
            Box::new(store)
        }
        None => ini_strategies(config)?,
    };
    #[cfg(not(feature = "sqlite"))]
    let strategies = ini_strategies(config)?;

    if !dry_run {
        if let Some(path) = config.get_string("results", "csv_path") {
            result_logs.push(Box::new(CsvResultLog::new(path)));
        }
    }

    Ok(Ports {
        strategies,
        notifier: build_notifier(config, channels, dry_run)?,
        result_logs,
    })
}

fn ini_strategies(config: &dyn ConfigPort) -> Result<Box<dyn StrategyPort>, GhostError> {
    let file = config
        .get_string("strategies", "file")
        .ok_or_else(|| GhostError::ConfigMissing {
            section: "strategies".into(),
            key: "file".into(),
        })?;
    Ok(Box::new(IniStrategyAdapter::new(file)))
}

#[cfg(feature = "sqlite")]
fn open_store(config: &dyn ConfigPort) -> Result<Option<SqliteAdapter>, GhostError> {
    if config.get_string("sqlite", "path").is_none() {
        return Ok(None);
    }
    let store = SqliteAdapter::from_config(config)?;
    store.initialize_schema()?;
    Ok(Some(store))
}

fn build_notifier(
    config: &dyn ConfigPort,
    channels: Option<Box<dyn ChannelPort>>,
    dry_run: bool,
) -> Result<Box<dyn NotifyPort>, GhostError> {
    if dry_run {
        return Ok(Box::new(LogNotifier));
    }

    #[cfg(feature = "live")]
    {
        use crate::adapters::telegram_adapter::{FixedChannels, TelegramNotifier};

        if let Some(token) = config
            .get_string("telegram", "bot_token")
            .filter(|t| !t.trim().is_empty())
        {
            let channels = channels.unwrap_or_else(|| {
                Box::new(FixedChannels::parse(
                    &config.get_string("telegram", "chat_ids").unwrap_or_default(),
                ))
            });
            let timeout = Duration::from_secs(config.get_int("feed", "timeout_secs", 5).max(1) as u64);
            return Ok(Box::new(TelegramNotifier::new(&token, channels, timeout)?));
        }
    }

    #[cfg(not(feature = "live"))]
    let _ = (config, channels);

    tracing::warn!("no telegram bot_token configured, notices go to the log");
    Ok(Box::new(LogNotifier))
}

fn run_live(config_path: &PathBuf, max_ticks: Option<u64>, dry_run: bool) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let worker_config = match build_worker_config(&adapter) {
        Ok(c) => c,
        Err(e) => return fail(e),
    };

    let ports = match build_ports(&adapter, dry_run) {
        Ok(p) => p,
        Err(e) => return fail(e),
    };

    #[cfg(feature = "live")]
    {
        use crate::adapters::http_feed_adapter::HttpFeedAdapter;

        let feed = match HttpFeedAdapter::new(
            &worker_config.feed_url,
            worker_config.timeout,
            worker_config.max_retries,
        ) {
            Ok(f) => f,
            Err(e) => return fail(e),
        };

        let mut worker = Worker::new(
            worker_config.color_scheme,
            ports.strategies.as_ref(),
            ports.notifier.as_ref(),
        );
        for log in &ports.result_logs {
            worker = worker.with_result_log(log.as_ref());
        }

        eprintln!("Polling {} every {:?}", worker_config.feed_url, worker_config.poll_interval);
        let stats = worker.run(&feed, worker_config.poll_interval, max_ticks);
        print_stats(&stats);
        ExitCode::SUCCESS
    }

    #[cfg(not(feature = "live"))]
    {
        let _ = (worker_config, ports, max_ticks);
        eprintln!("error: live feature is required for run");
        ExitCode::from(1)
    }
}

/// Keeps every appended record in memory for the end-of-replay summary.
#[derive(Default)]
struct CollectingLog {
    records: RefCell<Vec<ResultRecord>>,
}

impl ResultLogPort for CollectingLog {
    fn append(&self, record: &ResultRecord) -> Result<(), GhostError> {
        self.records.borrow_mut().push(record.clone());
        Ok(())
    }
}

fn run_replay(
    outcomes_path: &PathBuf,
    strategies_path: &PathBuf,
    color_source: &str,
    results_path: Option<&PathBuf>,
) -> ExitCode {
    let Some(color_scheme) = ColorScheme::parse(color_source) else {
        return fail(GhostError::ConfigInvalid {
            section: "feed".into(),
            key: "color_source".into(),
            reason: format!("unknown color source '{color_source}', expected color_id or roll"),
        });
    };

    eprintln!("Loading outcomes from {}", outcomes_path.display());
    let records = match read_feed_records(outcomes_path) {
        Ok(r) => r,
        Err(e) => return fail(e),
    };

    let strategies = IniStrategyAdapter::new(strategies_path);
    let notifier = LogNotifier;
    let collected = CollectingLog::default();
    let csv_log = results_path.map(CsvResultLog::new);

    let mut worker = Worker::new(color_scheme, &strategies, &notifier).with_result_log(&collected);
    if let Some(log) = &csv_log {
        worker = worker.with_result_log(log);
    }

    let stats = match worker.replay_records(&records) {
        Ok(s) => s,
        Err(e) => return fail(e),
    };

    print_stats(&stats);
    print_summary(&StrategySummary::compute(&collected.records.borrow()));
    ExitCode::SUCCESS
}

fn run_validate(strategies_path: &PathBuf) -> ExitCode {
    let adapter = match load_config(strategies_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let strategies = strategies_from_config(&adapter);
    if strategies.is_empty() {
        eprintln!("error: no [strategy.<id>] sections in {}", strategies_path.display());
        return ExitCode::from(4);
    }

    let mut malformed = 0;
    for strategy in &strategies {
        match strategy.check() {
            Ok(target) => {
                let pattern: Vec<String> = strategy.pattern.iter().map(|p| p.to_string()).collect();
                println!(
                    "ok     {} ({}): {} -> {}, {} gales{}",
                    strategy.id,
                    strategy.owner_id,
                    pattern.join(" - "),
                    target,
                    strategy.max_gales,
                    if strategy.enabled { "" } else { " [disabled]" }
                );
            }
            Err(e) => {
                malformed += 1;
                println!("error  {} ({}): {}", strategy.id, strategy.owner_id, e);
            }
        }
    }

    if malformed > 0 {
        eprintln!("{malformed} of {} strategies are malformed", strategies.len());
        ExitCode::from(4)
    } else {
        eprintln!("All {} strategies are valid", strategies.len());
        ExitCode::SUCCESS
    }
}

/// Read every recorded result from sqlite when `[sqlite] path` is set,
/// otherwise from `[results] csv_path`.
pub fn load_results(config: &dyn ConfigPort) -> Result<Vec<ResultRecord>, GhostError> {
    #[cfg(feature = "sqlite")]
    {
        if config.get_string("sqlite", "path").is_some() {
            return SqliteAdapter::from_config(config)?.results();
        }
    }

    match config.get_string("results", "csv_path") {
        Some(path) => CsvResultLog::new(path).read_all(),
        None => Err(GhostError::ConfigMissing {
            section: "sqlite".into(),
            key: "path".into(),
        }),
    }
}

fn run_summary(config_path: &PathBuf) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    match load_results(&adapter) {
        Ok(records) => {
            print_summary(&StrategySummary::compute(&records));
            ExitCode::SUCCESS
        }
        Err(e) => fail(e),
    }
}

fn run_init_db(config_path: &PathBuf) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    #[cfg(feature = "sqlite")]
    {
        let result = SqliteAdapter::from_config(&adapter).and_then(|db| db.initialize_schema());
        match result {
            Ok(()) => {
                eprintln!(
                    "Schema initialized at {}",
                    adapter.get_string("sqlite", "path").unwrap_or_default()
                );
                ExitCode::SUCCESS
            }
            Err(e) => fail(e),
        }
    }

    #[cfg(not(feature = "sqlite"))]
    {
        let _ = adapter;
        eprintln!("error: sqlite feature is required for init-db");
        ExitCode::from(1)
    }
}

fn print_stats(stats: &RunStats) {
    eprintln!(
        "{} polls, {} new outcomes, {} signals opened, {} gales, {} resolved, {} skipped, {} stale strategy snapshots, {} dispatch failures",
        stats.polls,
        stats.outcomes,
        stats.opened,
        stats.gales,
        stats.resolved,
        stats.skipped,
        stats.stale_snapshots,
        stats.dispatch_failures
    );
}

pub fn print_summary(summaries: &[StrategySummary]) {
    if summaries.is_empty() {
        println!("No results recorded.");
        return;
    }

    println!(
        "{:<12} {:<16} {:>8} {:>6} {:>6} {:>6} {:>8}",
        "owner", "strategy", "launched", "wins", "whites", "losses", "win rate"
    );
    for s in summaries {
        println!(
            "{:<12} {:<16} {:>8} {:>6} {:>6} {:>6} {:>7.1}%",
            s.owner_id,
            s.strategy_id,
            s.launched,
            s.wins,
            s.whites,
            s.losses,
            s.win_rate() * 100.0
        );
    }
}
