//! SignalLab CLI: run and validate commands.
//!
//! Commands:
//! - `run`: backtest a TOML config over a CSV of bars
//! - `validate`: load and validate a TOML config without running it

mod export;
mod loader;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use signallab_core::components::Providers;
use signallab_core::fingerprint::RunFingerprint;
use signallab_core::{run_backtest, EngineConfig, RunResult};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "signallab", about = "SignalLab CLI: bar-by-bar signal backtesting engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Backtest a config over a CSV of bars.
    Run {
        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,

        /// CSV with `timestamp,open,high,low,close,volume[,channel]` rows.
        #[arg(long)]
        bars: PathBuf,

        /// Directory for result.json, trades.csv and trace.csv.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Load and validate a TOML config.
    Validate {
        /// Path to a TOML config file.
        #[arg(long)]
        config: PathBuf,
    },
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Run {
            config,
            bars,
            output,
        } => run_cmd(&config, &bars, output.as_deref()),
        Commands::Validate { config } => validate_cmd(&config),
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: &Path) -> Result<EngineConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    EngineConfig::from_toml_str(&text).with_context(|| format!("invalid config {}", path.display()))
}

fn run_cmd(config_path: &Path, bars_path: &Path, output: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    let bars = loader::load_bars(bars_path)?;
    tracing::info!(bars = bars.len(), "loaded bars");

    let result = run_backtest(&config, &bars)?;
    print_summary(&config, &result);

    if let Some(dir) = output {
        export::save_artifacts(&result, dir)?;
        println!("Artifacts saved to: {}", dir.display());
    }
    Ok(())
}

fn validate_cmd(config_path: &Path) -> Result<()> {
    let config = load_config(config_path)?;
    let providers = Providers::from_config(&config)?;
    println!("Config OK: {}", config_path.display());
    println!("Fingerprint:    {}", RunFingerprint::of_config(&config).short());
    println!(
        "Entries:        {}",
        providers
            .entries
            .iter()
            .map(|e| e.name())
            .collect::<Vec<_>>()
            .join(", ")
    );
    println!("Filter:         {}", providers.filter.name());
    println!("Entry stop:     {}", providers.entry_stop.name());
    println!("In-trade stop:  {}", providers.in_trade_stop.name());
    println!("Exit:           {}", providers.exit.name());
    println!("Sizing:         {}", config.sizing.name());
    println!("Warm-up bars:   {}", providers.warmup_bars());
    Ok(())
}

fn print_summary(config: &EngineConfig, result: &RunResult) {
    let stats = &result.statistics;
    println!();
    println!("=== Backtest Result ===");
    println!("Fingerprint:    {}", result.fingerprint().short());
    println!(
        "Bars:           {} ({} rejected)",
        result.trace.len(),
        result.rejected_bars
    );
    println!("Trades:         {}", result.trades.len());
    println!("Skipped:        {}", result.skipped_entries);
    println!();
    println!("--- Performance ---");
    println!(
        "Equity:         {:.4} (from {:.4})",
        result.final_equity, config.initial_equity
    );
    for (label, bucket) in [
        ("First", &stats.first),
        ("Pyramided", &stats.pyramided),
        ("Combined", &stats.combined),
    ] {
        println!(
            "{label:<10} entries {:>4}  trades {:>4}  win {:>5.1}%  avg {:>7.3} X  PF {:>6.2}",
            bucket.entries,
            bucket.trades,
            bucket.win_rate() * 100.0,
            bucket.avg_plx(),
            bucket.profit_factor()
        );
    }
    println!(
        "Max Drawdown:   {:.2}% close-to-close, {:.2}% continuous",
        stats.close_to_close.max_drawdown_pct * 100.0,
        stats.continuous.max_drawdown_pct * 100.0
    );
    if result.post_exit.analyses > 0 {
        println!();
        println!("--- Post-exit ({} bars) ---", config.post_exit_window);
        println!(
            "Analyses:       {} ({} skipped)",
            result.post_exit.analyses, result.post_exit.skipped
        );
        println!(
            "Avg max favorable: {:.3} X, adverse: {:.3} X",
            result.post_exit.avg_max_favorable(),
            result.post_exit.avg_max_adverse()
        );
        println!(
            "Avg drawdown to max: {:.3} X, bars to max: {:.1}",
            result.post_exit.avg_drawdown_to_max_opportunity(),
            result.post_exit.avg_bars_to_max_favorable()
        );
    }
    if result.ruined {
        println!();
        println!("WARNING: account ruined, entries were disabled");
    }
    println!();
}
