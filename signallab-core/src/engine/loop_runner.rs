//! Bar-by-bar engine loop.
//!
//! Phases per closed bar N:
//! 1. Advance the post-exit analyzer.
//! 2. Settle a pending exit, then a pending entry, at the open of N.
//! 3. Mark the open trade with N's range.
//! 4. Exit trigger: close through the published stop, or the exit provider.
//! 5. Stop engine: publish a tighter in-trade stop.
//! 6. Entry triggers, unless an exit triggered.
//! 7. In-trade events and the continuous drawdown sample.
//!
//! Triggers from N settle at the open of N+1.

use tracing::{debug, warn};

use crate::components::{Providers, Signal};
use crate::config::{ConfigError, EngineConfig};
use crate::domain::{Bar, EngineEvent, EventKind, Side, Trade};
use crate::history::BarHistory;

use super::events::detect;
use super::fill::CostModel;
use super::pyramiding::admits;
use super::settlement::{fill_entry, settle_exit, Account, EntryOrder};
use super::state::{BarReport, BarTrace, EngineState, RunResult};
use super::stops::{update_stop, StopUpdate};
use super::triggers::{exit_trigger, first_entry, pyramid_entry, EntryGates, Triggers};

/// Per-bar errors. The offending bar is ignored and the run continues.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    #[error("stale bar {index}: bar {last} was already processed")]
    StaleBar { index: usize, last: usize },
    #[error("malformed bar {index}: prices must be finite and ordered")]
    InsaneBar { index: usize },
}

/// Streaming engine owning its configuration, providers and state.
pub struct Engine {
    config: EngineConfig,
    providers: Providers,
    cost: CostModel,
    warmup_bars: usize,
    history: BarHistory,
    state: EngineState,
}

struct StepContext<'a> {
    config: &'a EngineConfig,
    providers: &'a Providers,
    cost: &'a CostModel,
    warmup_bars: usize,
}

impl Engine {
    /// Validate `config` and build its providers.
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate_with_entry_count(config.entries.len())?;
        let providers = Providers::from_config(&config)?;
        Ok(Self::assemble(config, providers))
    }

    /// Run with caller-supplied providers; the configured catalog entries are ignored.
    pub fn with_providers(config: EngineConfig, providers: Providers) -> Result<Self, ConfigError> {
        config.validate_with_entry_count(providers.entries.len())?;
        Ok(Self::assemble(config, providers))
    }

    fn assemble(config: EngineConfig, providers: Providers) -> Self {
        let warmup_bars = providers.warmup_bars();
        debug!(?providers, warmup_bars, "engine assembled");
        Self {
            cost: config.cost_model(),
            state: EngineState::new(&config),
            history: BarHistory::new(),
            warmup_bars,
            providers,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    pub fn history(&self) -> &BarHistory {
        &self.history
    }

    pub fn warmup_bars(&self) -> usize {
        self.warmup_bars
    }

    /// Process one closed bar. Settlement happens at most once per index.
    pub fn on_bar(&mut self, bar: Bar) -> Result<BarReport, EngineError> {
        self.check(&bar)?;
        self.state.last_index = Some(bar.index);
        self.history.push(bar.clone());
        let ctx = StepContext {
            config: &self.config,
            providers: &self.providers,
            cost: &self.cost,
            warmup_bars: self.warmup_bars,
        };
        Ok(step(&ctx, &bar, self.history.as_slice(), &mut self.state))
    }

    /// Evaluate a forming bar without committing anything.
    ///
    /// May be called any number of times with updated prices for the same index.
    pub fn preview(&mut self, bar: Bar) -> Result<BarReport, EngineError> {
        self.check(&bar)?;
        let ctx = StepContext {
            config: &self.config,
            providers: &self.providers,
            cost: &self.cost,
            warmup_bars: self.warmup_bars,
        };
        let mut scratch = self.state.clone();
        let forming = bar.clone();
        Ok(self
            .history
            .with_provisional(bar, |history| step(&ctx, &forming, history.as_slice(), &mut scratch)))
    }

    /// Back to the initial state, keeping configuration and providers.
    pub fn reset(&mut self) {
        self.history.clear();
        self.state = EngineState::new(&self.config);
    }

    /// Feed every bar and collect the result.
    pub fn run(&mut self, bars: impl IntoIterator<Item = Bar>) -> RunResult {
        let mut result = RunResult::new(&self.config);
        for bar in bars {
            match self.on_bar(bar) {
                Ok(report) => result.absorb(report),
                Err(err) => {
                    warn!(%err, "bar rejected");
                    result.rejected_bars += 1;
                }
            }
        }
        result.finish(&self.state);
        result
    }

    fn check(&self, bar: &Bar) -> Result<(), EngineError> {
        if !bar.is_sane() {
            return Err(EngineError::InsaneBar { index: bar.index });
        }
        match self.state.last_index {
            Some(last) if bar.index <= last => Err(EngineError::StaleBar {
                index: bar.index,
                last,
            }),
            _ => Ok(()),
        }
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("providers", &self.providers)
            .field("warmup_bars", &self.warmup_bars)
            .field("bars", &self.history.len())
            .field("state", &self.state)
            .finish()
    }
}

/// Validate `config` and run it over `bars`.
pub fn run_backtest(config: &EngineConfig, bars: &[Bar]) -> Result<RunResult, ConfigError> {
    let mut engine = Engine::new(config.clone())?;
    Ok(engine.run(bars.iter().cloned()))
}

fn step(ctx: &StepContext<'_>, bar: &Bar, bars: &[Bar], state: &mut EngineState) -> BarReport {
    let mut report = BarReport {
        trace: BarTrace {
            bar_index: bar.index,
            close: bar.close,
            equity: state.equity,
            shadow_equity: state.equity,
            position: None,
            entries_open: 0,
            published_stop: None,
            triggers: Triggers::none(),
            ruined: state.ruined,
        },
        events: Vec::new(),
        settled: None,
        skipped: None,
        post_exit: state.post_exit.on_bar(bar),
    };

    settle_pending_exit(ctx, bar, state, &mut report);
    if let Some(order) = state.pending_entry.take() {
        settle_pending_entry(ctx, bar, state, order, &mut report);
    }

    let mut triggers = Triggers::none();
    let mut stop_update = StopUpdate::Held;
    if let Some(trade) = state.trade.as_mut() {
        trade.mark(bar.high, bar.low);
        trade.trade_length += 1;
        let signal = ctx.providers.exit.evaluate(bars, &trade.context());
        triggers.exit = exit_trigger(trade, bar, signal);
        if triggers.exit.is_none() {
            let candidate = ctx.providers.in_trade_stop.candidate(bars, &trade.context());
            stop_update = update_stop(trade, candidate, bar.close, &ctx.config.kick_in);
        }
    }

    match triggers.exit {
        Some(reason) => state.pending_exit = Some(reason),
        None => triggers = entry_triggers(ctx, bar, bars, state),
    }

    if let Some(trade) = &state.trade {
        report
            .events
            .extend(detect(&ctx.config.events, bars, trade, stop_update.distance()));
    }

    let shadow = state.shadow_equity(bar.close);
    state.stats.mark(shadow);

    let trade = state.trade.as_ref();
    report.trace = BarTrace {
        equity: state.equity,
        shadow_equity: shadow,
        position: trade.map(|t| t.side),
        entries_open: trade.map_or(0, |t| 1 + t.pyramids.len()),
        published_stop: trade.map(|t| t.in_trade_stop),
        triggers,
        ruined: state.ruined,
        ..report.trace
    };
    report
}

fn settle_pending_exit(ctx: &StepContext<'_>, bar: &Bar, state: &mut EngineState, report: &mut BarReport) {
    let Some(reason) = state.pending_exit.take() else {
        return;
    };
    let Some(trade) = state.trade.take() else {
        return;
    };
    let settlement = settle_exit(&trade, bar, ctx.cost, reason, state.equity);
    state.apply_pnl(settlement.net_pnl());
    state.stats.record(&settlement, state.equity);
    debug!(
        bar = bar.index,
        side = ?trade.side,
        ?reason,
        exit = settlement.record.exit_fill,
        plx = settlement.record.plx_net,
        pnl = settlement.net_pnl(),
        equity = state.equity,
        "trade settled"
    );
    report
        .events
        .push(EngineEvent::new(bar.index, EventKind::exit(trade.side)));
    state
        .post_exit
        .arm(trade.side, bar.index, bar.close, trade.first.risk_unit);
    report.settled = Some(settlement.record);
}

fn settle_pending_entry(
    ctx: &StepContext<'_>,
    bar: &Bar,
    state: &mut EngineState,
    order: EntryOrder,
    report: &mut BarReport,
) {
    let account = Account {
        equity: state.equity,
        initial_equity: ctx.config.initial_equity,
    };
    let entry = match fill_entry(
        &order,
        bar,
        ctx.cost,
        &ctx.config.sizing,
        account,
        ctx.config.pyramiding.position_multiple,
    ) {
        Ok(entry) => entry,
        Err(skip) => {
            warn!(bar = bar.index, side = ?order.side, pyramid = order.pyramid, %skip, "entry skipped");
            state.skipped_entries += 1;
            report.skipped = Some(skip);
            return;
        }
    };
    debug!(
        bar = bar.index,
        side = ?order.side,
        pyramid = order.pyramid,
        fill = entry.fill,
        stop = entry.stop,
        size = entry.position_size,
        "entry filled"
    );
    if order.pyramid {
        match state.trade.as_mut() {
            Some(trade) if trade.side == order.side => trade.add_pyramid(entry),
            _ => return,
        }
    } else {
        state.trade = Some(Trade::open(order.side, order.origin, entry));
    }
    report
        .events
        .push(EngineEvent::new(bar.index, EventKind::entry(order.side, order.pyramid)));
}

fn entry_triggers(ctx: &StepContext<'_>, bar: &Bar, bars: &[Bar], state: &mut EngineState) -> Triggers {
    let gates = EntryGates {
        warmup_bars: ctx.warmup_bars,
        ruined: state.ruined,
    };
    if !gates.open_on(ctx.config, bar) {
        return Triggers::none();
    }
    let signals: Vec<Signal> = ctx.providers.entries.iter().map(|p| p.evaluate(bars)).collect();
    let filter = ctx.providers.filter.evaluate(bars);
    let direction = ctx.config.direction;

    let (triggers, order) = match &state.trade {
        None => {
            let (triggers, origins) = first_entry(&signals, filter, direction);
            let order = triggers.entry_side().and_then(|side| {
                let origin = match side {
                    Side::Long => origins[0],
                    Side::Short => origins[1],
                }?;
                let stop = ctx.providers.entries[origin].stop_hint(bars).or_else(|| {
                    ctx.providers
                        .entry_stop
                        .evaluate(bars)
                        .map(|levels| levels.for_side(side))
                });
                if stop.is_none() {
                    debug!(bar = bar.index, ?side, "entry stop not ready");
                }
                Some(EntryOrder {
                    side,
                    origin,
                    stop: stop?,
                    pyramid: false,
                    trigger_bar: bar.index,
                })
            });
            (triggers, order)
        }
        Some(trade) => {
            let admitted = admits(
                &ctx.config.pyramiding,
                trade,
                trade.side,
                bar.close,
                &signals,
                filter,
            );
            let triggers = pyramid_entry(trade, direction, admitted);
            let order = triggers.entry_side().map(|side| EntryOrder {
                side,
                origin: trade.origin,
                stop: trade.in_trade_stop,
                pyramid: true,
                trigger_bar: bar.index,
            });
            (triggers, order)
        }
    };

    match order {
        Some(order) => {
            state.pending_entry = Some(order);
            triggers
        }
        None => Triggers::none(),
    }
}
