//! Stochastic oscillator applied to the RSI series, double-smoothed.
//!
//! rawK[j] = (RSI[j] - min RSI[j-stoch_len+1..=j]) / (max - min) * 100
//! %K      = SMA(rawK, k_smooth)
//! %D      = SMA(%K, d_smooth)
//!
//! Undefined RSI values (still seeding) are skipped in the min/max scan.
//! rawK falls back to 50 when RSI[j] is undefined, the scan is empty, or
//! max <= min. rawK for indices before the first bar counts as 50, which is
//! why the rawK ring starts pre-filled.
//!
//! Lookback: rsi_len + stoch_len + k_smooth + d_smooth.

use super::rsi::Rsi;
use super::{StreamingIndicator, NEUTRAL_OSCILLATOR};
use crate::domain::Bar;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StochRsiValue {
    /// Smoothed %K in [0, 100].
    pub k: f64,
    /// %D: mean of the last `d_smooth` %K values.
    pub d: f64,
}

#[derive(Debug, Clone)]
pub struct StochRsi {
    rsi: Rsi,
    rsi_len: usize,
    stoch_len: usize,
    k_smooth: usize,
    d_smooth: usize,
    /// Last `stoch_len` RSI values, oldest first.
    rsi_window: VecDeque<Option<f64>>,
    /// Last `k_smooth + d_smooth - 1` rawK values, oldest first.
    raw_k: VecDeque<f64>,
    name: String,
}

impl StochRsi {
    pub fn new(rsi_len: usize, stoch_len: usize, k_smooth: usize, d_smooth: usize) -> Self {
        assert!(stoch_len >= 1, "StochRSI stoch length must be >= 1");
        assert!(k_smooth >= 1, "StochRSI %K smoothing must be >= 1");
        assert!(d_smooth >= 1, "StochRSI %D smoothing must be >= 1");
        let raw_len = k_smooth + d_smooth - 1;
        Self {
            rsi: Rsi::new(rsi_len),
            rsi_len,
            stoch_len,
            k_smooth,
            d_smooth,
            rsi_window: VecDeque::with_capacity(stoch_len + 1),
            raw_k: std::iter::repeat(NEUTRAL_OSCILLATOR).take(raw_len).collect(),
            name: format!("stoch_rsi_{rsi_len}_{stoch_len}_{k_smooth}_{d_smooth}"),
        }
    }

    /// Mean of `k_smooth` rawK values ending `offset` bars before the newest.
    fn smoothed_k(&self, offset: usize) -> f64 {
        let newest = self.raw_k.len() - 1;
        let sum: f64 = (0..self.k_smooth)
            .map(|k| self.raw_k[newest - offset - k])
            .sum();
        sum / self.k_smooth as f64
    }
}

/// Position of `current` within the defined values of `window`, in percent.
fn raw_stoch_k(current: Option<f64>, window: &VecDeque<Option<f64>>) -> f64 {
    let Some(current) = current else {
        return NEUTRAL_OSCILLATOR;
    };
    let (low, high) = window
        .iter()
        .flatten()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    // Also covers the empty scan, where low = +inf and high = -inf.
    if high <= low {
        return NEUTRAL_OSCILLATOR;
    }
    (current - low) / (high - low) * 100.0
}

impl StreamingIndicator for StochRsi {
    type Output = StochRsiValue;

    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.rsi_len + self.stoch_len + self.k_smooth + self.d_smooth
    }

    fn update(&mut self, bar: &Bar) -> StochRsiValue {
        let rsi = self.rsi.next(bar.close);
        self.rsi_window.push_back(rsi);
        if self.rsi_window.len() > self.stoch_len {
            self.rsi_window.pop_front();
        }

        self.raw_k.push_back(raw_stoch_k(rsi, &self.rsi_window));
        self.raw_k.pop_front();

        let k = self.smoothed_k(0);
        let d = (0..self.d_smooth).map(|off| self.smoothed_k(off)).sum::<f64>()
            / self.d_smooth as f64;
        StochRsiValue { k, d }
    }
}
