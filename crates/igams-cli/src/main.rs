mod cmd;
mod context;
mod output;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use cmd::{config::ConfigSubcommand, db::DbSubcommand};
use context::Context;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "igams",
    about = "Measure daily process execution and suggest process-level improvements",
    version,
    propagate_version = true
)]
struct Cli {
    /// Config file (default: ./igams.yaml)
    #[arg(long, global = true, env = "IGAMS_CONFIG")]
    config: Option<PathBuf>,

    /// SQLite log store (overrides log_store.path)
    #[arg(long, global = true, env = "IGAMS_DB")]
    db: Option<PathBuf>,

    /// Actor whose execution logs are analyzed
    #[arg(long, global = true, env = "IGAMS_ACTOR")]
    actor: Option<String>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Daily metrics: accuracy, time deviation, quality, efficiency
    Metrics {
        /// Day to measure, YYYY-MM-DD (default: today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Per-record issues for a day
    Issues {
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Process improvement suggestions for a day
    Suggest {
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Quality inspection for a day
    Inspect {
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Full analysis: metrics, issues, and suggestions
    Analyze {
        #[arg(long)]
        date: Option<NaiveDate>,

        /// Also ask the configured advisory service for elaboration
        #[arg(long)]
        advisory: bool,
    },

    /// Daily metrics for every day in an inclusive range
    Range {
        #[arg(long)]
        start: NaiveDate,

        #[arg(long)]
        end: NaiveDate,
    },

    /// Inspect and initialize configuration
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },

    /// Manage the SQLite log store
    Db {
        #[command(subcommand)]
        subcommand: DbSubcommand,
    },

    /// Start the HTTP server
    Serve {
        #[arg(long, default_value = "8000")]
        port: u16,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Serve { .. } => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .init();

    if let Err(e) = run(cli) {
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let ctx = Context::load(cli.config.as_deref(), cli.db.as_deref(), cli.actor)?;
    let json = cli.json;
    let day = |date: Option<NaiveDate>| date.unwrap_or_else(cmd::day::today);

    match cli.command {
        Commands::Metrics { date } => cmd::day::run_metrics(&ctx, day(date), json),
        Commands::Issues { date } => cmd::day::run_issues(&ctx, day(date), json),
        Commands::Suggest { date } => cmd::day::run_suggest(&ctx, day(date), json),
        Commands::Inspect { date } => cmd::day::run_inspect(&ctx, day(date), json),
        Commands::Analyze { date, advisory } => {
            cmd::day::run_analyze(&ctx, day(date), advisory, json)
        }
        Commands::Range { start, end } => cmd::range::run(&ctx, start, end, json),
        Commands::Config { subcommand } => cmd::config::run(&ctx, subcommand, json),
        Commands::Db { subcommand } => cmd::db::run(&ctx, subcommand, json),
        Commands::Serve { port } => cmd::serve::run(ctx, port),
    }
}
