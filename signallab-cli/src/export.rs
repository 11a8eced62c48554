//! Result artifacts: JSON summary, trade tape and bar trace as CSV.

use std::path::Path;

use anyhow::{Context, Result};
use signallab_core::domain::TradeRecord;
use signallab_core::engine::BarTrace;
use signallab_core::RunResult;

pub fn export_json(result: &RunResult) -> Result<String> {
    serde_json::to_string_pretty(result).context("failed to serialize run result to JSON")
}

/// Columns: side, entry_bar, entry_fill, entry_stop, risk_unit, exit_bar,
/// exit_fill, exit_reason, position_size, plx_gross, plx_net, pnl,
/// pyramid_count, pyramid_pnl, fees, slippage, trade_length, mfe_x, mae_x
pub fn export_trades_csv(trades: &[TradeRecord]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "side",
        "entry_bar",
        "entry_fill",
        "entry_stop",
        "risk_unit",
        "exit_bar",
        "exit_fill",
        "exit_reason",
        "position_size",
        "plx_gross",
        "plx_net",
        "pnl",
        "pyramid_count",
        "pyramid_pnl",
        "fees",
        "slippage",
        "trade_length",
        "mfe_x",
        "mae_x",
    ])?;

    for t in trades {
        wtr.write_record([
            format!("{:?}", t.side),
            t.entry_bar.to_string(),
            format!("{:.6}", t.entry_fill),
            format!("{:.6}", t.entry_stop),
            format!("{:.6}", t.risk_unit),
            t.exit_bar.to_string(),
            format!("{:.6}", t.exit_fill),
            format!("{:?}", t.exit_reason),
            format!("{:.6}", t.position_size),
            format!("{:.4}", t.plx_gross),
            format!("{:.4}", t.plx_net),
            format!("{:.6}", t.pnl),
            t.pyramid_count.to_string(),
            format!("{:.6}", t.pyramid_pnl),
            format!("{:.6}", t.fees),
            format!("{:.6}", t.slippage),
            t.trade_length.to_string(),
            format!("{:.4}", t.mfe_x),
            format!("{:.4}", t.mae_x),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Columns: bar_index, close, equity, shadow_equity, position, entries_open, published_stop, ruined
pub fn export_trace_csv(trace: &[BarTrace]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "bar_index",
        "close",
        "equity",
        "shadow_equity",
        "position",
        "entries_open",
        "published_stop",
        "ruined",
    ])?;
    for row in trace {
        wtr.write_record([
            row.bar_index.to_string(),
            format!("{:.6}", row.close),
            format!("{:.6}", row.equity),
            format!("{:.6}", row.shadow_equity),
            row.position.map(|s| format!("{s:?}")).unwrap_or_default(),
            row.entries_open.to_string(),
            row.published_stop.map(|s| format!("{s:.6}")).unwrap_or_default(),
            row.ruined.to_string(),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Write `result.json`, `trades.csv` and `trace.csv` into `dir`.
pub fn save_artifacts(result: &RunResult, dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create output directory {}", dir.display()))?;
    std::fs::write(dir.join("result.json"), export_json(result)?)?;
    std::fs::write(dir.join("trades.csv"), export_trades_csv(&result.trades)?)?;
    std::fs::write(dir.join("trace.csv"), export_trace_csv(&result.trace)?)?;
    Ok(())
}
