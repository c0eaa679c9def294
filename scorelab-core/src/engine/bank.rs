//! Indicator bank: every streaming indicator the scorer reads, advanced together.
//!
//! The bank is the engine's entire per-bar state apart from the bar and frame
//! history. Cloning it is how `peek` evaluates an open bar without touching
//! committed state.

use super::warmup::WarmupState;
use crate::config::EngineConfig;
use crate::domain::Bar;
use crate::indicators::{Atr, Ema, Macd, MoneyFlow, Rsi, StochRsi, StreamingIndicator};
use crate::scoring::Readings;

#[derive(Debug, Clone)]
pub struct IndicatorBank {
    rsi: Rsi,
    stoch_rsi: StochRsi,
    macd: Macd,
    ema_fast: Ema,
    ema_slow: Ema,
    mfi: MoneyFlow,
    atr: Atr,
    last_histogram: f64,
}

impl IndicatorBank {
    /// Build fresh indicator states. `config` must already be validated.
    pub fn new(config: &EngineConfig) -> Self {
        let s = &config.stoch_rsi;
        Self {
            rsi: Rsi::new(config.rsi.period),
            stoch_rsi: StochRsi::new(s.rsi_len, s.stoch_len, s.k_smooth, s.d_smooth),
            macd: Macd::new(config.macd.fast, config.macd.slow, config.macd.signal),
            ema_fast: Ema::new(config.ema_cross.fast_len),
            ema_slow: Ema::new(config.ema_cross.slow_len),
            mfi: MoneyFlow::new(config.mfi.length),
            atr: Atr::new(config.levels.atr_len),
            last_histogram: 0.0,
        }
    }

    /// Lookbacks of the indicators that feed the composite score.
    ///
    /// ATR only feeds the levels, which stay absent until it seeds.
    pub fn scoring_lookbacks(&self) -> [(&str, usize); 6] {
        [
            (self.rsi.name(), self.rsi.lookback()),
            (self.stoch_rsi.name(), self.stoch_rsi.lookback()),
            (self.macd.name(), self.macd.lookback()),
            (self.ema_fast.name(), self.ema_fast.lookback()),
            (self.ema_slow.name(), self.ema_slow.lookback()),
            (self.mfi.name(), self.mfi.lookback()),
        ]
    }

    /// Advance every indicator by one bar.
    pub fn update(&mut self, bar: &Bar) -> Readings {
        let macd = self.macd.update(bar);
        let prev_histogram = std::mem::replace(&mut self.last_histogram, macd.histogram);
        Readings {
            rsi: self.rsi.update(bar),
            stoch_rsi: self.stoch_rsi.update(bar),
            macd,
            prev_histogram,
            ema_fast: self.ema_fast.update(bar),
            ema_slow: self.ema_slow.update(bar),
            mfi: self.mfi.update(bar),
            atr: self.atr.update(bar),
        }
    }

    /// Warmup tracker sized to the longest scoring lookback.
    pub fn warmup_state(&self) -> WarmupState {
        WarmupState::from_lookbacks(self.scoring_lookbacks().map(|(_, lookback)| lookback))
    }
}
