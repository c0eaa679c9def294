//! MACD (Moving Average Convergence Divergence).
//!
//! - MACD line: EMA_fast(close) - EMA_slow(close)
//! - Signal line: EMA_signal(MACD line)
//! - Histogram: MACD line - signal line
//!
//! All three EMAs are seeded by their first input, so a histogram exists from
//! the first bar (it is 0 there). Lookback: slow + signal.

use super::ema::Ema;
use super::StreamingIndicator;
use crate::domain::Bar;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MacdValue {
    pub macd: f64,
    pub signal: f64,
    pub histogram: f64,
}

#[derive(Debug, Clone)]
pub struct Macd {
    fast: Ema,
    slow: Ema,
    signal: Ema,
    name: String,
}

impl Macd {
    pub fn new(fast: usize, slow: usize, signal: usize) -> Self {
        Self {
            fast: Ema::new(fast),
            slow: Ema::new(slow),
            signal: Ema::new(signal),
            name: format!("macd_{fast}_{slow}_{signal}"),
        }
    }

    pub fn next(&mut self, close: f64) -> MacdValue {
        let macd = self.fast.next(close) - self.slow.next(close);
        let signal = self.signal.next(macd);
        MacdValue {
            macd,
            signal,
            histogram: macd - signal,
        }
    }
}

impl StreamingIndicator for Macd {
    type Output = MacdValue;

    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.slow.period() + self.signal.period()
    }

    fn update(&mut self, bar: &Bar) -> MacdValue {
        self.next(bar.close)
    }
}
