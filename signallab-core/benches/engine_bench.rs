//! Criterion benchmarks for SignalLab hot paths.
//!
//! Benchmarks:
//! 1. Bar loop (full backtest over synthetic bars)
//! 2. Intrabar preview of a forming bar
//! 3. Window indicators (SMA, ATR, RSI, Donchian)

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use signallab_core::components::{
    EntryStopStrategy, EntryStrategy, ExitStrategy, FilterStrategy, InTradeStopStrategy, Indicator,
};
use signallab_core::config::EngineConfig;
use signallab_core::domain::Bar;
use signallab_core::engine::{run_backtest, Engine, PyramidRule, PyramidingConfig};
use signallab_core::indicators::{Atr, Donchian, Rsi, Sma};

// ── Helpers ──────────────────────────────────────────────────────────

fn make_bars(n: usize) -> Vec<Bar> {
    let base = chrono::DateTime::parse_from_rfc3339("2020-01-02T00:00:00Z")
        .unwrap()
        .with_timezone(&chrono::Utc);
    (0..n)
        .map(|i| {
            let close = 100.0 + (i as f64 * 0.1).sin() * 10.0;
            let open = close - 0.3;
            Bar::new(
                i,
                base + chrono::Duration::days(i as i64),
                open,
                close + 1.5,
                open.min(close) - 1.5,
                close,
                1_000_000.0,
            )
        })
        .collect()
}

fn trend_config() -> EngineConfig {
    EngineConfig {
        entries: vec![
            EntryStrategy::MaCrossover { fast: 10, slow: 50 },
            EntryStrategy::DonchianBreakout { period: 20 },
        ],
        filter: FilterStrategy::MaRegime { period: 100 },
        entry_stop: EntryStopStrategy::Atr {
            period: 14,
            multiple: 2.0,
        },
        in_trade_stop: InTradeStopStrategy::Chandelier {
            period: 22,
            multiple: 3.0,
        },
        exit: ExitStrategy::TakeProfit { x_multiple: 4.0 },
        pyramiding: PyramidingConfig {
            enabled: true,
            rule: PyramidRule::XMultiple { multiple: 1.0 },
            ..PyramidingConfig::default()
        },
        ..EngineConfig::default()
    }
}

fn random_config() -> EngineConfig {
    EngineConfig {
        entries: vec![EntryStrategy::Random {
            seed: 42,
            probability: 0.2,
        }],
        in_trade_stop: InTradeStopStrategy::TrailingX { multiple: 2.0 },
        ..EngineConfig::default()
    }
}

// ── 1. Bar Loop ──────────────────────────────────────────────────────

fn bench_bar_loop(c: &mut Criterion) {
    let mut group = c.benchmark_group("bar_loop");

    for &bar_count in &[252, 1260, 2520] {
        let bars = make_bars(bar_count);
        let trend = trend_config();
        let random = random_config();

        group.bench_with_input(BenchmarkId::new("trend", bar_count), &bar_count, |b, _| {
            b.iter(|| run_backtest(black_box(&trend), black_box(&bars)))
        });
        group.bench_with_input(BenchmarkId::new("random", bar_count), &bar_count, |b, _| {
            b.iter(|| run_backtest(black_box(&random), black_box(&bars)))
        });
    }

    group.finish();
}

// ── 2. Preview ───────────────────────────────────────────────────────

fn bench_preview(c: &mut Criterion) {
    let bars = make_bars(1261);
    let mut engine = Engine::new(trend_config()).unwrap();
    for bar in &bars[..1260] {
        let _ = engine.on_bar(bar.clone());
    }
    let forming = bars[1260].clone();

    c.bench_function("preview_after_1260_bars", |b| {
        b.iter(|| engine.preview(black_box(forming.clone())))
    });
}

// ── 3. Indicators ────────────────────────────────────────────────────

fn bench_indicators(c: &mut Criterion) {
    let bars = make_bars(2520);
    let mut group = c.benchmark_group("indicators");

    let indicators: Vec<Box<dyn Indicator>> = vec![
        Box::new(Sma::new(50)),
        Box::new(Atr::new(14)),
        Box::new(Rsi::new(14)),
        Box::new(Donchian::upper(20)),
    ];
    for ind in &indicators {
        group.bench_function(ind.name(), |b| b.iter(|| ind.value(black_box(&bars))));
    }

    group.finish();
}

criterion_group!(benches, bench_bar_loop, bench_preview, bench_indicators);
criterion_main!(benches);
