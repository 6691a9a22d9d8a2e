//! WAIVERWIRE: ESPN fantasy basketball roster engine.
//!
//! Entry point. Loads `.env` and configuration, initialises structured
//! logging, wires the ESPN clients into the cycle orchestrator and runs the
//! requested command.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::sync::Arc;
use tracing::info;

use waiverwire::config::AppConfig;
use waiverwire::dashboard::{self, routes::DashboardState};
use waiverwire::engine::confirm::PromptConfirmer;
use waiverwire::engine::cycle::{CycleOptions, CycleOrchestrator, CycleReport, RunMode};
use waiverwire::engine::executor::Executor;
use waiverwire::platforms::espn::EspnReadClient;
use waiverwire::platforms::writer::TransactionClient;
use waiverwire::storage;

#[derive(Parser)]
#[command(
    name = "waiverwire",
    about = "Daily lineup, IR and streaming decisions for an ESPN fantasy basketball team",
    version
)]
struct Cli {
    /// Configuration file
    #[arg(long, global = true, env = "WAIVERWIRE_CONFIG", default_value = "config.toml")]
    config: String,

    /// League context file (overrides agent.context_path)
    #[arg(long, global = true, env = "WAIVERWIRE_CONTEXT")]
    context: Option<String>,

    /// Print results as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one daily cycle
    Run(RunArgs),
    /// Show suggestions without executing anything
    Analyze,
    /// Show injured starters and their bench replacements
    LineupStatus,
    /// Execute the top injured-starter lineup fix
    ExecuteLineup,
    /// Show tracking state from the last run
    LastRun,
    /// Serve the HTTP API
    Serve {
        #[arg(long)]
        port: Option<u16>,
    },
}

#[derive(Args)]
#[group(multiple = false)]
struct RunArgs {
    /// Preview only; never writes
    #[arg(long)]
    dry_run: bool,
    /// Execute the streaming move without prompting
    #[arg(long)]
    confirm: bool,
    /// Record the proposals but execute nothing
    #[arg(long)]
    decline: bool,
    /// Prompt before executing (y / n / g to regenerate)
    #[arg(long)]
    interactive: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let cli = Cli::parse();
    init_logging();

    let mut cfg = AppConfig::load_or_default(&cli.config)?;
    if let Some(context) = &cli.context {
        cfg.agent.context_path = context.clone();
    }
    info!(agent = %cfg.agent.name, context = %cfg.agent.context_path, "WAIVERWIRE starting");

    let orchestrator = build_orchestrator(&cfg)?;

    match cli.command {
        Commands::Run(args) => {
            let report = match run_mode(&args, &cfg) {
                Mode::DryRun => orchestrator.run_cycle(RunMode::DryRun).await?,
                Mode::Programmatic(confirm) => {
                    orchestrator
                        .run_cycle(RunMode::Programmatic { confirm })
                        .await?
                }
                Mode::Interactive => {
                    let mut confirmer = PromptConfirmer::stdio();
                    orchestrator
                        .run_cycle(RunMode::Interactive(&mut confirmer))
                        .await?
                }
            };
            print_report(&report, cli.json)?;
        }
        Commands::Analyze => {
            let suggestions = orchestrator.analyze().await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&suggestions)?);
            } else {
                println!("=== Suggestions (scoring period {}) ===", suggestions.scoring_period_id);
                for line in suggestions.preview_lines() {
                    println!("- {line}");
                }
            }
        }
        Commands::LineupStatus => {
            let status = orchestrator.lineup_status().await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&status)?);
            } else if status.fixes.is_empty() {
                println!("{}: all starters available.", status.team_name);
            } else {
                println!("=== {} lineup fixes ===", status.team_name);
                for fix in &status.fixes {
                    println!("- {fix}");
                }
            }
        }
        Commands::ExecuteLineup => {
            let report = orchestrator.execute_lineup().await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                for action in &report.actions {
                    println!("- {action}");
                }
            }
        }
        Commands::LastRun => {
            let tracking = orchestrator.last_run()?;
            println!("{}", serde_json::to_string_pretty(&tracking)?);
        }
        Commands::Serve { port } => {
            let port = port.unwrap_or(cfg.dashboard.port);
            let state = Arc::new(DashboardState::new(orchestrator, cfg.dashboard_password()));
            dashboard::serve(state, port, &cfg.dashboard.allowed_origins).await?;
        }
    }

    Ok(())
}

enum Mode {
    DryRun,
    Programmatic(bool),
    Interactive,
}

/// Explicit flag, else the context's `tiered_streaming.dry_run`.
fn run_mode(args: &RunArgs, cfg: &AppConfig) -> Mode {
    if args.dry_run {
        return Mode::DryRun;
    }
    if args.confirm {
        return Mode::Programmatic(true);
    }
    if args.decline {
        return Mode::Programmatic(false);
    }
    if args.interactive {
        return Mode::Interactive;
    }
    let dry_run = storage::load_context(&cfg.agent.context_path)
        .ok()
        .flatten()
        .map(|ctx| ctx.strategy.tiered_streaming.dry_run)
        .unwrap_or(true);
    if dry_run {
        Mode::DryRun
    } else {
        Mode::Programmatic(true)
    }
}

fn build_orchestrator(cfg: &AppConfig) -> Result<CycleOrchestrator> {
    let reader = EspnReadClient::new(&cfg.espn.read_base, cfg.espn.timeout_secs)
        .context("Failed to build ESPN read client")?;
    let writer = TransactionClient::from_config(&cfg.espn, &cfg.transactions)
        .context("Failed to build ESPN transaction client")?;
    Ok(CycleOrchestrator::new(
        Arc::new(reader),
        Executor::new(Arc::new(writer)),
        CycleOptions::from_config(cfg),
    ))
}

fn print_report(report: &CycleReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }
    println!("=== ESPN Points League Daily Cycle ===");
    println!("Mode: {} ({})", report.mode, report.state);
    for action in &report.actions {
        println!("- {action}");
    }
    println!(
        "Weekly transactions used: {}/{}",
        report.weekly_transactions_used, report.suggestions.streaming.budget.limit
    );
    Ok(())
}

/// Initialise the tracing subscriber.
///
/// Uses `RUST_LOG` when set, else `waiverwire=info`. Set `WAIVERWIRE_LOG_JSON`
/// for structured JSON output. Logs go to stderr so `--json` output stays clean.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("waiverwire=info"));

    if std::env::var("WAIVERWIRE_LOG_JSON").is_ok() {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .with_writer(std::io::stderr)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init();
    }
}
