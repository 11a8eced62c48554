//! Factory system: converts strategy configs into runtime trait objects.
//!
//! One `create_*` function per provider kind, plus [`Providers`], the bundle
//! the engine runs with. Parameters are checked here so that constructors'
//! assertions can never fire on user input.

use crate::config::EngineConfig;

use super::entry_stop::{EntryStopProvider, EntryStopStrategy};
use super::exit::{ExitProvider, ExitStrategy};
use super::external::{ExternalEntry, ExternalFilter};
use super::filter::{FilterProvider, FilterStrategy, MaRegimeFilter, NoFilter, RsiBandFilter};
use super::signal::{
    DonchianBreakout, EntryProvider, EntryStrategy, MaCrossover, RandomEntry, RsiCross,
};
use super::stop::{InTradeStopProvider, InTradeStopStrategy};

// ─── Error type ──────────────────────────────────────────────────────

/// Errors that can occur during component construction.
#[derive(Debug, thiserror::Error)]
pub enum FactoryError {
    #[error("invalid {component} parameter `{param}`: {reason}")]
    InvalidParameter {
        component: &'static str,
        param: &'static str,
        reason: &'static str,
    },
}

// ─── Helpers ─────────────────────────────────────────────────────────

fn check(
    ok: bool,
    component: &'static str,
    param: &'static str,
    reason: &'static str,
) -> Result<(), FactoryError> {
    if ok {
        Ok(())
    } else {
        Err(FactoryError::InvalidParameter {
            component,
            param,
            reason,
        })
    }
}

fn period(component: &'static str, param: &'static str, value: usize) -> Result<(), FactoryError> {
    check(value >= 1, component, param, "must be >= 1")
}

fn positive(component: &'static str, param: &'static str, value: f64) -> Result<(), FactoryError> {
    check(value.is_finite() && value > 0.0, component, param, "must be positive")
}

fn fraction(component: &'static str, param: &'static str, value: f64) -> Result<(), FactoryError> {
    check(value > 0.0 && value < 1.0, component, param, "must be in (0, 1)")
}

fn thresholds(component: &'static str, low: f64, high: f64) -> Result<(), FactoryError> {
    check(
        low.is_finite() && high.is_finite() && low < high,
        component,
        "thresholds",
        "lower threshold must be below upper threshold",
    )
}

// ─── Entry factory ───────────────────────────────────────────────────

pub fn create_entry(strategy: &EntryStrategy) -> Result<Box<dyn EntryProvider>, FactoryError> {
    let name = strategy.kind();
    match *strategy {
        EntryStrategy::MaCrossover { fast, slow } => {
            period(name, "fast", fast)?;
            check(fast < slow, name, "slow", "must be greater than fast")?;
            Ok(Box::new(MaCrossover::new(fast, slow)))
        }
        EntryStrategy::RsiCross {
            period: p,
            oversold,
            overbought,
        } => {
            period(name, "period", p)?;
            thresholds(name, oversold, overbought)?;
            Ok(Box::new(RsiCross::new(p, oversold, overbought)))
        }
        EntryStrategy::DonchianBreakout { period: p } => {
            period(name, "period", p)?;
            Ok(Box::new(DonchianBreakout::new(p)))
        }
        EntryStrategy::Random { seed, probability } => {
            check(
                (0.0..=1.0).contains(&probability),
                name,
                "probability",
                "must be in [0, 1]",
            )?;
            Ok(Box::new(RandomEntry::new(seed, probability)))
        }
        EntryStrategy::External => Ok(Box::new(ExternalEntry)),
    }
}

// ─── Filter factory ──────────────────────────────────────────────────

pub fn create_filter(strategy: &FilterStrategy) -> Result<Box<dyn FilterProvider>, FactoryError> {
    match *strategy {
        FilterStrategy::None => Ok(Box::new(NoFilter)),
        FilterStrategy::MaRegime { period: p } => {
            period("ma_regime", "period", p)?;
            Ok(Box::new(MaRegimeFilter::new(p)))
        }
        FilterStrategy::RsiBand {
            period: p,
            long_above,
            short_below,
        } => {
            period("rsi_band", "period", p)?;
            check(
                long_above.is_finite() && short_below.is_finite(),
                "rsi_band",
                "thresholds",
                "must be finite",
            )?;
            Ok(Box::new(RsiBandFilter::new(p, long_above, short_below)))
        }
        FilterStrategy::External { lookback } => {
            if let Some(n) = lookback {
                period("external", "lookback", n)?;
            }
            Ok(Box::new(ExternalFilter::new(lookback)))
        }
    }
}

// ─── Stop factories ──────────────────────────────────────────────────

pub fn create_entry_stop(
    strategy: &EntryStopStrategy,
) -> Result<Box<dyn EntryStopProvider>, FactoryError> {
    let name = strategy.kind();
    match *strategy {
        EntryStopStrategy::Atr { period: p, multiple } => {
            period(name, "period", p)?;
            positive(name, "multiple", multiple)?;
        }
        EntryStopStrategy::Percent { pct } => fraction(name, "pct", pct)?,
        EntryStopStrategy::Swing { lookback } => period(name, "lookback", lookback)?,
        EntryStopStrategy::FixedDistance { offset } => positive(name, "offset", offset)?,
    }
    Ok(Box::new(strategy.clone()))
}

pub fn create_in_trade_stop(
    strategy: &InTradeStopStrategy,
) -> Result<Box<dyn InTradeStopProvider>, FactoryError> {
    let name = strategy.kind();
    match *strategy {
        InTradeStopStrategy::TrailingX { multiple } => positive(name, "multiple", multiple)?,
        InTradeStopStrategy::TrailingPct { pct } => fraction(name, "pct", pct)?,
        InTradeStopStrategy::TrailingFixed { offset } => positive(name, "offset", offset)?,
        InTradeStopStrategy::DonchianCenter { period: p } => period(name, "period", p)?,
        InTradeStopStrategy::AtrMultiple { period: p, multiple }
        | InTradeStopStrategy::Chandelier { period: p, multiple }
        | InTradeStopStrategy::VolatilityStop { period: p, multiple } => {
            period(name, "period", p)?;
            positive(name, "multiple", multiple)?;
        }
        InTradeStopStrategy::LastBarExtreme => {}
    }
    Ok(Box::new(strategy.clone()))
}

// ─── Exit factory ────────────────────────────────────────────────────

pub fn create_exit(strategy: &ExitStrategy) -> Result<Box<dyn ExitProvider>, FactoryError> {
    let name = strategy.kind();
    match *strategy {
        ExitStrategy::TakeProfit { x_multiple } => positive(name, "x_multiple", x_multiple)?,
        ExitStrategy::MaCrossover { fast, slow } => {
            period(name, "fast", fast)?;
            check(fast < slow, name, "slow", "must be greater than fast")?;
        }
        ExitStrategy::RsiExtreme {
            period: p,
            overbought,
            oversold,
        } => {
            period(name, "period", p)?;
            thresholds(name, oversold, overbought)?;
        }
        ExitStrategy::MaxBars { bars } => period(name, "bars", bars)?,
        ExitStrategy::None | ExitStrategy::External => {}
    }
    Ok(Box::new(strategy.clone()))
}

// ─── Provider bundle ─────────────────────────────────────────────────

/// Every provider the engine consults on a bar.
pub struct Providers {
    /// Entry providers in configuration order.
    pub entries: Vec<Box<dyn EntryProvider>>,
    pub filter: Box<dyn FilterProvider>,
    pub entry_stop: Box<dyn EntryStopProvider>,
    pub in_trade_stop: Box<dyn InTradeStopProvider>,
    pub exit: Box<dyn ExitProvider>,
}

impl Providers {
    pub fn from_config(config: &EngineConfig) -> Result<Self, FactoryError> {
        Ok(Self {
            entries: config
                .entries
                .iter()
                .map(create_entry)
                .collect::<Result<_, _>>()?,
            filter: create_filter(&config.filter)?,
            entry_stop: create_entry_stop(&config.entry_stop)?,
            in_trade_stop: create_in_trade_stop(&config.in_trade_stop)?,
            exit: create_exit(&config.exit)?,
        })
    }

    /// Warm-up of the stop indicators; entries trigger only on bars past it.
    pub fn warmup_bars(&self) -> usize {
        self.entry_stop
            .warmup_bars()
            .max(self.in_trade_stop.warmup_bars())
    }
}

impl std::fmt::Debug for Providers {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Providers")
            .field(
                "entries",
                &self.entries.iter().map(|e| e.name()).collect::<Vec<_>>(),
            )
            .field("filter", &self.filter.name())
            .field("entry_stop", &self.entry_stop.name())
            .field("in_trade_stop", &self.in_trade_stop.name())
            .field("exit", &self.exit.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_ma_crossover() {
        let e = create_entry(&EntryStrategy::MaCrossover { fast: 5, slow: 20 }).unwrap();
        assert_eq!(e.name(), "ma_crossover");
        assert_eq!(e.warmup_bars(), 21);
    }

    #[test]
    fn entry_inverted_periods_rejected() {
        let err = create_entry(&EntryStrategy::MaCrossover { fast: 20, slow: 20 })
            .err()
            .unwrap();
        match err {
            FactoryError::InvalidParameter { component, param, .. } => {
                assert_eq!(component, "ma_crossover");
                assert_eq!(param, "slow");
            }
        }
    }

    #[test]
    fn entry_catalog_builds() {
        for s in [
            EntryStrategy::RsiCross {
                period: 14,
                oversold: 30.0,
                overbought: 70.0,
            },
            EntryStrategy::DonchianBreakout { period: 20 },
            EntryStrategy::Random {
                seed: 1,
                probability: 0.1,
            },
            EntryStrategy::External,
        ] {
            assert_eq!(create_entry(&s).unwrap().name(), s.kind());
        }
    }

    #[test]
    fn random_probability_range() {
        assert!(create_entry(&EntryStrategy::Random {
            seed: 1,
            probability: 1.5
        })
        .is_err());
    }

    #[test]
    fn filters_build() {
        assert_eq!(create_filter(&FilterStrategy::None).unwrap().name(), "none");
        assert_eq!(
            create_filter(&FilterStrategy::External { lookback: None })
                .unwrap()
                .name(),
            "external"
        );
        assert!(create_filter(&FilterStrategy::External { lookback: Some(0) }).is_err());
        assert!(create_filter(&FilterStrategy::MaRegime { period: 0 }).is_err());
    }

    #[test]
    fn stops_validate_parameters() {
        assert!(create_entry_stop(&EntryStopStrategy::Percent { pct: 0.02 }).is_ok());
        assert!(create_entry_stop(&EntryStopStrategy::Percent { pct: 1.0 }).is_err());
        assert!(create_in_trade_stop(&InTradeStopStrategy::Chandelier {
            period: 22,
            multiple: 3.0
        })
        .is_ok());
        assert!(create_in_trade_stop(&InTradeStopStrategy::TrailingX { multiple: 0.0 }).is_err());
    }

    #[test]
    fn exits_validate_parameters() {
        assert!(create_exit(&ExitStrategy::TakeProfit { x_multiple: 2.0 }).is_ok());
        assert!(create_exit(&ExitStrategy::MaxBars { bars: 0 }).is_err());
        assert!(create_exit(&ExitStrategy::RsiExtreme {
            period: 14,
            overbought: 30.0,
            oversold: 70.0
        })
        .is_err());
    }

    fn rejected_component(err: FactoryError) -> (&'static str, &'static str) {
        match err {
            FactoryError::InvalidParameter { component, param, .. } => (component, param),
        }
    }

    #[test]
    fn stop_and_exit_errors_name_the_variant() {
        let err = create_entry_stop(&EntryStopStrategy::Atr {
            period: 0,
            multiple: 2.0,
        })
        .err()
        .unwrap();
        assert_eq!(rejected_component(err), ("atr", "period"));

        let err = create_in_trade_stop(&InTradeStopStrategy::TrailingPct { pct: 1.5 })
            .err()
            .unwrap();
        assert_eq!(rejected_component(err), ("trailing_pct", "pct"));

        let err = create_exit(&ExitStrategy::MaCrossover { fast: 5, slow: 5 })
            .err()
            .unwrap();
        assert_eq!(rejected_component(err), ("ma_crossover", "slow"));
    }

    #[test]
    fn kind_matches_provider_name() {
        let stop = EntryStopStrategy::FixedDistance { offset: 1.0 };
        assert_eq!(create_entry_stop(&stop).unwrap().name(), stop.kind());
        let trail = InTradeStopStrategy::LastBarExtreme;
        assert_eq!(create_in_trade_stop(&trail).unwrap().name(), trail.kind());
        let exit = ExitStrategy::External;
        assert_eq!(create_exit(&exit).unwrap().name(), exit.kind());
    }

    #[test]
    fn providers_warmup_is_stop_warmup() {
        let config = EngineConfig {
            entry_stop: EntryStopStrategy::Atr {
                period: 10,
                multiple: 2.0,
            },
            in_trade_stop: InTradeStopStrategy::DonchianCenter { period: 20 },
            ..EngineConfig::default()
        };
        let p = Providers::from_config(&config).unwrap();
        assert_eq!(p.warmup_bars(), 20);
        assert!(format!("{p:?}").contains("donchian_center"));
    }
}
