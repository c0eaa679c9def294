//! ATR-based stop-loss / take-profit levels.
//!
//! Levels are advisory. Distances are signed relative to the bar close:
//! for a bullish score the stop sits below and the targets above, for a
//! bearish score the other way round.

use crate::config::{LevelsConfig, PipSizeConfig, PipSizeMode};
use crate::domain::Instrument;
use crate::scoring::Direction;
use serde::{Deserialize, Serialize};

/// One level as a signed pip distance and an absolute price.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Level {
    pub pips: f64,
    pub price: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LevelSet {
    pub direction: Direction,
    pub atr: f64,
    /// ATR expressed in pips, 0 without a valid pip size.
    pub atr_pips: f64,
    pub pip_size: Option<f64>,
    pub sl: Level,
    pub tp1: Level,
    pub tp2: Level,
    pub tp3: Level,
}

/// Resolve the pip size: positive override, then instrument pip, then tick.
pub fn resolve_pip_size(pip: &PipSizeConfig, instrument: &Instrument) -> Option<f64> {
    let override_value = (pip.mode == PipSizeMode::Override)
        .then_some(pip.value)
        .filter(|v| v.is_finite() && *v > 0.0);
    override_value.or_else(|| instrument.effective_pip_size())
}

#[derive(Debug, Clone)]
pub struct LevelCalculator {
    multipliers: LevelsConfig,
    pip_size: Option<f64>,
}

impl LevelCalculator {
    pub fn new(levels: &LevelsConfig, pip: &PipSizeConfig, instrument: &Instrument) -> Self {
        Self {
            multipliers: levels.clone(),
            pip_size: resolve_pip_size(pip, instrument),
        }
    }

    pub fn pip_size(&self) -> Option<f64> {
        self.pip_size
    }

    /// Price distance in pips. 0 without a valid pip size.
    pub fn price_to_pips(&self, distance: f64) -> f64 {
        self.pip_size.map_or(0.0, |pip| distance / pip)
    }

    /// Pip distance in price units. 0 without a valid pip size.
    pub fn pips_to_price(&self, pips: f64) -> f64 {
        self.pip_size.map_or(0.0, |pip| pips * pip)
    }

    fn level(&self, close: f64, distance: f64) -> Level {
        Level {
            pips: self.price_to_pips(distance),
            price: close + distance,
        }
    }

    /// Levels around `close` for the side implied by `combined`.
    pub fn compute(&self, close: f64, atr: f64, combined: f64) -> LevelSet {
        let direction = Direction::from_score(combined);
        let sign = match direction {
            Direction::Bullish => 1.0,
            Direction::Bearish => -1.0,
        };
        let m = &self.multipliers;
        LevelSet {
            direction,
            atr,
            atr_pips: self.price_to_pips(atr),
            pip_size: self.pip_size,
            sl: self.level(close, -sign * m.sl_mult * atr),
            tp1: self.level(close, sign * m.tp1_mult * atr),
            tp2: self.level(close, sign * m.tp2_mult * atr),
            tp3: self.level(close, sign * m.tp3_mult * atr),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::assert_approx;

    fn calculator(instrument: &Instrument) -> LevelCalculator {
        LevelCalculator::new(&LevelsConfig::default(), &PipSizeConfig::default(), instrument)
    }

    #[test]
    fn bullish_levels_in_pips() {
        let calc = calculator(&Instrument::forex("EURUSD"));
        let set = calc.compute(1.1000, 0.0010, 0.4);
        assert_eq!(set.direction, Direction::Bullish);
        assert_approx(set.sl.pips, -10.0, 1e-9);
        assert_approx(set.tp1.pips, 15.0, 1e-9);
        assert_approx(set.tp2.pips, 25.0, 1e-9);
        assert_approx(set.tp3.pips, 40.0, 1e-9);
        assert_approx(set.atr_pips, 10.0, 1e-9);
        assert_approx(set.sl.price, 1.0990, 1e-12);
        assert_approx(set.tp1.price, 1.1015, 1e-12);
    }

    #[test]
    fn bearish_levels_flip_sides() {
        let calc = calculator(&Instrument::forex("EURUSD"));
        let set = calc.compute(1.1000, 0.0010, -0.4);
        assert_eq!(set.direction, Direction::Bearish);
        assert_approx(set.sl.pips, 10.0, 1e-9);
        assert_approx(set.tp1.pips, -15.0, 1e-9);
        assert_approx(set.tp3.price, 1.0960, 1e-12);
    }

    #[test]
    fn zero_score_is_bullish() {
        let calc = calculator(&Instrument::forex("EURUSD"));
        assert_eq!(calc.compute(1.0, 0.001, 0.0).direction, Direction::Bullish);
    }

    #[test]
    fn override_wins_when_positive() {
        let pip = PipSizeConfig {
            mode: PipSizeMode::Override,
            value: 0.01,
        };
        assert_eq!(resolve_pip_size(&pip, &Instrument::forex("USDJPY")), Some(0.01));

        let disabled = PipSizeConfig {
            mode: PipSizeMode::Override,
            value: 0.0,
        };
        assert_eq!(
            resolve_pip_size(&disabled, &Instrument::forex("EURUSD")),
            Some(0.0001)
        );
    }

    #[test]
    fn auto_ignores_override_value() {
        let pip = PipSizeConfig {
            mode: PipSizeMode::Auto,
            value: 0.5,
        };
        assert_eq!(resolve_pip_size(&pip, &Instrument::new("ES", 0.25, None)), Some(0.25));
    }

    #[test]
    fn no_pip_size_gives_neutral_pips() {
        let calc = calculator(&Instrument::new("BROKEN", 0.0, None));
        assert_eq!(calc.pip_size(), None);
        let set = calc.compute(100.0, 2.0, 0.5);
        assert_eq!(set.sl.pips, 0.0);
        assert_eq!(set.tp1.pips, 0.0);
        assert_eq!(set.atr_pips, 0.0);
        assert_approx(set.sl.price, 98.0, 1e-12);
        assert_approx(set.tp1.price, 103.0, 1e-12);
        assert_eq!(calc.pips_to_price(10.0), 0.0);
    }

    #[test]
    fn pip_conversions_invert() {
        let calc = calculator(&Instrument::forex("EURUSD"));
        assert_approx(calc.price_to_pips(0.0025), 25.0, 1e-9);
        assert_approx(calc.pips_to_price(25.0), 0.0025, 1e-12);
    }
}
