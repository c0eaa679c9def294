//! Exponential Moving Average (EMA).
//!
//! Recursive: EMA[t] = EMA[t-1] + alpha * (x[t] - EMA[t-1]), alpha = 2 / (period + 1).
//! Seed: EMA[0] = x[0], so a value exists from the first bar.
//! Lookback: period (bars before the seed's influence has decayed).

use super::StreamingIndicator;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Ema {
    period: usize,
    alpha: f64,
    value: Option<f64>,
    name: String,
}

impl Ema {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "EMA period must be >= 1");
        Self {
            period,
            alpha: 2.0 / (period as f64 + 1.0),
            value: None,
            name: format!("ema_{period}"),
        }
    }

    /// Feed one raw value. Used directly by composed indicators (MACD signal line).
    pub fn next(&mut self, x: f64) -> f64 {
        // The delta form keeps a constant input exactly constant.
        let ema = match self.value {
            None => x,
            Some(prev) => prev + self.alpha * (x - prev),
        };
        self.value = Some(ema);
        ema
    }

    /// Latest value, `None` before the first input.
    pub fn value(&self) -> Option<f64> {
        self.value
    }

    pub fn period(&self) -> usize {
        self.period
    }
}

impl StreamingIndicator for Ema {
    type Output = f64;

    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn update(&mut self, bar: &Bar) -> f64 {
        self.next(bar.close)
    }
}
