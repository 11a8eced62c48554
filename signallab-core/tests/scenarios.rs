//! End-to-end scenarios on hand-built bar sequences.
//!
//! Entries come from the external channel so each test controls exactly
//! which bar signals:
//! 1. Take-profit at 2 X
//! 2. Stop breach for -1 X
//! 3. Pyramiding on an X-multiple rule
//! 4. Ruin gates further entries
//! 5. Zero risk unit is rejected
//! 6. Post-exit analysis window
//! 7. Long wins a simultaneous long/short trigger
//! 8. In-trade alerts stay quiet while the stop holds still

use chrono::{DateTime, TimeZone, Utc};
use signallab_core::components::filter::NoFilter;
use signallab_core::components::{
    EntryProvider, EntryStopStrategy, EntryStrategy, ExitStrategy, InTradeStopStrategy, Providers,
    Signal,
};
use signallab_core::config::EngineConfig;
use signallab_core::domain::{Bar, EventKind, ExitReason, Side};
use signallab_core::config::ConfigError;
use signallab_core::engine::{
    run_backtest, Engine, EventConfig, PyramidRule, PyramidingConfig, SettlementSkip,
};
use signallab_core::sizers::SizingPolicy;
use signallab_core::stats::StatBucket;

// ── Helpers ──────────────────────────────────────────────────────────

fn ts(i: usize) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + chrono::Duration::days(i as i64)
}

/// Build bars from `(open, close)` pairs; high/low sit half a point outside.
fn tape(moves: &[(f64, f64)]) -> Vec<Bar> {
    moves
        .iter()
        .enumerate()
        .map(|(i, &(open, close))| {
            Bar::new(
                i,
                ts(i),
                open,
                open.max(close) + 0.5,
                open.min(close) - 0.5,
                close,
                1000.0,
            )
        })
        .collect()
}

fn flat(n: usize, price: f64) -> Vec<(f64, f64)> {
    vec![(price, price); n]
}

fn with_codes(mut bars: Vec<Bar>, codes: &[(usize, f64)]) -> Vec<Bar> {
    for &(i, code) in codes {
        bars[i] = bars[i].clone().with_channel(code);
    }
    bars
}

/// External entries, a 2-point entry stop, and an in-trade stop that never kicks in.
fn base_config() -> EngineConfig {
    EngineConfig {
        entries: vec![EntryStrategy::External],
        entry_stop: EntryStopStrategy::FixedDistance { offset: 2.0 },
        in_trade_stop: InTradeStopStrategy::TrailingX { multiple: 100.0 },
        post_exit_window: 0,
        ..EngineConfig::default()
    }
}

fn count(events: &[signallab_core::domain::EngineEvent], kind: EventKind) -> usize {
    events.iter().filter(|e| e.kind == kind).count()
}

// ── 1. Take-profit ───────────────────────────────────────────────────

#[test]
fn take_profit_at_two_x() {
    let mut moves = flat(11, 100.0);
    moves.extend([
        (100.0, 101.0),
        (101.0, 102.0),
        (102.0, 103.0),
        (103.0, 104.0),
        (104.0, 104.5),
        (104.5, 105.0),
    ]);
    let bars = with_codes(tape(&moves), &[(10, 2.0)]);
    let config = EngineConfig {
        exit: ExitStrategy::TakeProfit { x_multiple: 2.0 },
        ..base_config()
    };

    let result = run_backtest(&config, &bars).unwrap();

    assert_eq!(result.trades.len(), 1);
    let trade = &result.trades[0];
    assert_eq!(trade.side, Side::Long);
    assert_eq!(trade.entry_bar, 11);
    assert_eq!(trade.exit_bar, 15);
    assert_eq!(trade.exit_reason, ExitReason::Signal);
    assert!((trade.plx_net - 2.0).abs() < 1e-9);
    assert!((result.final_equity - 1.04).abs() < 1e-9);
    assert_eq!(result.statistics.first.entries, 1);
    assert_eq!(result.statistics.first.wins, 1);
    assert_eq!(result.statistics.first.losses, 0);
    assert!(result.statistics.pyramided.is_empty());
    assert_eq!(count(&result.events, EventKind::LongEntry), 1);
    assert_eq!(count(&result.events, EventKind::LongExit), 1);
}

#[test]
fn short_take_profit_mirrors_long() {
    let mut moves = flat(11, 100.0);
    moves.extend([(100.0, 99.0), (99.0, 98.0), (98.0, 97.0), (97.0, 96.0), (96.0, 96.0)]);
    let bars = with_codes(tape(&moves), &[(10, -2.0)]);
    let config = EngineConfig {
        exit: ExitStrategy::TakeProfit { x_multiple: 2.0 },
        ..base_config()
    };

    let result = run_backtest(&config, &bars).unwrap();

    assert_eq!(result.trades.len(), 1);
    assert_eq!(result.trades[0].side, Side::Short);
    assert_eq!(result.trades[0].entry_stop, 102.0);
    assert!((result.trades[0].plx_net - 2.0).abs() < 1e-9);
    assert_eq!(count(&result.events, EventKind::ShortExit), 1);
}

// ── 2. Stop breach ───────────────────────────────────────────────────

#[test]
fn stop_breach_loses_one_x() {
    let mut moves = flat(11, 100.0);
    moves.extend([(100.0, 99.0), (99.0, 97.9), (98.0, 98.5), (98.5, 99.0)]);
    let bars = with_codes(tape(&moves), &[(10, 2.0)]);
    let config = EngineConfig {
        exit: ExitStrategy::TakeProfit { x_multiple: 2.0 },
        ..base_config()
    };

    let result = run_backtest(&config, &bars).unwrap();

    assert_eq!(result.trades.len(), 1);
    let trade = &result.trades[0];
    assert_eq!(trade.exit_reason, ExitReason::Stop);
    assert_eq!(trade.exit_bar, 13);
    assert!((trade.plx_net + 1.0).abs() < 1e-9);
    assert_eq!(result.statistics.first.losses, 1);
    assert_eq!(result.statistics.first.wins, 0);
    assert!((result.final_equity - 0.98).abs() < 1e-9);
    assert!((result.statistics.close_to_close.max_drawdown - 0.02).abs() < 1e-9);
}

// ── 3. Pyramiding ────────────────────────────────────────────────────

#[test]
fn two_pyramids_on_x_multiple_rule() {
    let mut moves = flat(11, 100.0);
    moves.extend([
        (100.0, 101.0), // 11: first entry fills at 100
        (101.0, 102.0), // 12: +1 X from 100, pyramid triggers
        (102.0, 103.0), // 13: pyramid fills at 102
        (103.0, 104.0), // 14: +1 X from 102, pyramid triggers
        (104.0, 105.0), // 15: pyramid fills at 104
        (105.0, 106.0),
        (106.0, 107.0), // 17: exit code
        (107.0, 107.0), // 18: exit fills
    ]);
    let bars = with_codes(tape(&moves), &[(10, 2.0), (17, 3.0)]);
    let config = EngineConfig {
        exit: ExitStrategy::External,
        pyramiding: PyramidingConfig {
            enabled: true,
            rule: PyramidRule::XMultiple { multiple: 1.0 },
            max_entries: 2,
            ..PyramidingConfig::default()
        },
        ..base_config()
    };

    let result = run_backtest(&config, &bars).unwrap();

    assert_eq!(result.trades.len(), 1);
    let trade = &result.trades[0];
    assert_eq!(trade.pyramid_count, 2);
    assert_eq!(trade.exit_bar, 18);
    assert_eq!(result.statistics.pyramided.entries, 2);
    assert_eq!(result.statistics.pyramided.trades, 1);
    assert_eq!(result.statistics.combined.entries, 3);
    assert_eq!(count(&result.events, EventKind::LongPyramidEntry), 2);
    let pyramid_bars: Vec<usize> = result
        .events
        .iter()
        .filter(|e| e.kind == EventKind::LongPyramidEntry)
        .map(|e| e.bar_index)
        .collect();
    assert_eq!(pyramid_bars, vec![13, 15]);
    // 1.0/102 + 1.0/104 units at an average of 103-ish, all exiting at 107
    let expected_pyramid = (107.0 - 102.0) / 102.0 + (107.0 - 104.0) / 104.0;
    assert!((trade.pyramid_pnl - expected_pyramid).abs() < 1e-9);
    assert!((result.statistics.combined.total_pnl - trade.total_pnl()).abs() < 1e-12);
}

// ── 4. Ruin ──────────────────────────────────────────────────────────

#[test]
fn ruin_stops_new_entries() {
    let mut moves = flat(6, 100.0);
    moves.extend([
        (100.0, 99.0), // 6: fill at 100, stop 95
        (99.0, 94.9),  // 7: breach
        (95.0, 100.0), // 8: exit at 95 (-0.5), new entry signal
        (100.0, 94.0), // 9: fill at 100, breach
        (90.0, 100.0), // 10: exit at 90 (-1.0), ruin
    ]);
    moves.extend(flat(5, 100.0));
    let codes: Vec<(usize, f64)> = [5, 8, 10, 11, 12, 13, 14, 15]
        .into_iter()
        .map(|i| (i, 95.0))
        .collect();
    let bars = with_codes(tape(&moves), &codes);
    let config = EngineConfig {
        sizing: SizingPolicy::PercentOfInitial { pct: 10.0 },
        ..base_config()
    };

    let result = run_backtest(&config, &bars).unwrap();

    assert_eq!(result.trades.len(), 2);
    assert!((result.trades[0].pnl + 0.5).abs() < 1e-9);
    assert!((result.trades[1].pnl + 1.0).abs() < 1e-9);
    assert!(result.ruined);
    assert!((result.final_equity + 0.5).abs() < 1e-9);
    assert_eq!(count(&result.events, EventKind::LongEntry), 2);
    let last = result.trace.last().unwrap();
    assert!(last.ruined);
    assert_eq!(last.position, None);
    assert!(result.trace[10..].iter().all(|t| t.triggers.entry_side().is_none()));
}

// ── 5. Zero risk unit ────────────────────────────────────────────────

#[test]
fn zero_risk_unit_skips_entry() {
    let mut moves = flat(11, 100.0);
    moves.extend(flat(4, 100.0));
    // stop hint equal to the next open
    let bars = with_codes(tape(&moves), &[(10, 100.0)]);
    let config = base_config();

    let mut engine = Engine::new(config.clone()).unwrap();
    for bar in &bars[..11] {
        engine.on_bar(bar.clone()).unwrap();
    }
    let before = engine.state().stats.clone();
    let report = engine.on_bar(bars[11].clone()).unwrap();
    assert_eq!(
        report.skipped,
        Some(SettlementSkip::InvalidRiskUnit {
            fill: 100.0,
            stop: 100.0
        })
    );
    assert!(engine.state().trade.is_none());
    assert_eq!(engine.state().stats.first, before.first);
    assert_eq!(engine.state().stats.combined, before.combined);

    let result = run_backtest(&config, &bars).unwrap();
    assert!(result.trades.is_empty());
    assert_eq!(result.skipped_entries, 1);
    assert_eq!(result.statistics.first, StatBucket::default());
    assert_eq!(result.statistics.combined, StatBucket::default());
    assert_eq!(count(&result.events, EventKind::LongEntry), 0);
}

// ── 6. Post-exit analysis ────────────────────────────────────────────

#[test]
fn post_exit_window_after_loss() {
    let mut moves = flat(11, 100.0);
    moves.extend([
        (100.0, 99.0), // 11: fill at 100
        (99.0, 97.0),  // 12: breach
        (97.0, 97.0),  // 13: exit at 97, reference close 97
        (97.0, 98.0),  // 14: offset 1, low 96.5
        (98.0, 99.0),
        (99.0, 100.0),
        (100.0, 101.0),
        (101.0, 102.0),
        (102.0, 103.0), // 19: offset 6, high 103.5
        (101.0, 100.0), // reversal
        (100.0, 99.5),
        (99.5, 99.0),
        (99.0, 98.5), // 23: offset 10
        (98.5, 98.0),
    ]);
    let bars = with_codes(tape(&moves), &[(10, 2.0)]);
    let config = EngineConfig {
        post_exit_window: 10,
        ..base_config()
    };

    let mut engine = Engine::new(config).unwrap();
    let mut settled_at = None;
    let mut analysis = None;
    for bar in bars {
        let index = bar.index;
        let report = engine.on_bar(bar).unwrap();
        if let Some(a) = report.post_exit {
            settled_at = Some(index);
            analysis = Some(a);
        }
    }

    assert_eq!(settled_at, Some(23));
    let a = analysis.unwrap();
    assert_eq!(a.exit_bar, 13);
    assert_eq!(a.side, Side::Long);
    assert_eq!(a.bars_elapsed, 10);
    assert_eq!(a.max_favorable_at, 6);
    assert!((a.max_favorable - 3.25).abs() < 1e-9);
    assert!((a.drawdown_to_max_opportunity - 0.25).abs() < 1e-9);
    assert_eq!(engine.state().post_exit.summary().analyses, 1);
    assert!(!engine.state().post_exit.is_analyzing());
}

// ── 7. Tie-break ─────────────────────────────────────────────────────

struct Always(Signal);

impl EntryProvider for Always {
    fn name(&self) -> &str {
        "always"
    }

    fn warmup_bars(&self) -> usize {
        0
    }

    fn evaluate(&self, _bars: &[Bar]) -> Signal {
        self.0
    }
}

#[test]
fn long_wins_simultaneous_triggers() {
    let providers = Providers {
        entries: vec![Box::new(Always(Signal::Short)), Box::new(Always(Signal::Long))],
        filter: Box::new(NoFilter),
        entry_stop: Box::new(EntryStopStrategy::FixedDistance { offset: 2.0 }),
        in_trade_stop: Box::new(InTradeStopStrategy::TrailingX { multiple: 100.0 }),
        exit: Box::new(ExitStrategy::None),
    };
    let mut engine = Engine::with_providers(base_config(), providers).unwrap();
    let bars = tape(&flat(5, 100.0));

    let mut reports = Vec::new();
    for bar in bars {
        reports.push(engine.on_bar(bar).unwrap());
    }

    // warm-up is one bar, so bar 2 is the first that may trigger
    assert!(reports[1].trace.triggers.entry_side().is_none());
    let triggers = reports[2].trace.triggers;
    assert!(triggers.long);
    assert_eq!(triggers.entry_side(), Some(Side::Long));
    let trade = engine.state().trade.as_ref().unwrap();
    assert_eq!(trade.side, Side::Long);
    assert_eq!(trade.origin, 1);
    assert_eq!(trade.first.bar_index, 3);
}

// ── 8. In-trade alerts ───────────────────────────────────────────────

#[test]
fn unmoved_stop_raises_no_stop_jump() {
    let bars = with_codes(tape(&flat(30, 100.0)), &[(10, 2.0)]);

    let result = run_backtest(&base_config(), &bars).unwrap();

    assert_eq!(count(&result.events, EventKind::LongEntry), 1);
    assert!(result.trades.is_empty());
    assert_eq!(count(&result.events, EventKind::StopJump), 0);
}

#[test]
fn negative_alert_thresholds_refuse_to_start() {
    let config = EngineConfig {
        events: EventConfig {
            stop_jump_x: -1.0,
            swing_atr: -1.0,
            ..EventConfig::default()
        },
        ..base_config()
    };
    let err = Engine::new(config).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid { .. }));
}
