//! Streaming indicator implementations.
//!
//! Every indicator implements [`StreamingIndicator`]: it owns a small
//! recursive or windowed state and advances it by exactly one bar per
//! `update` call. Bars must be presented in increasing order without gaps.
//! States are `Clone`, which is how the engine snapshots them for
//! evaluating a still-open bar.

pub mod atr;
pub mod ema;
pub mod macd;
pub mod mfi;
pub mod rsi;
pub mod stoch_rsi;

pub use atr::{true_range, Atr};
pub use ema::Ema;
pub use macd::{Macd, MacdValue};
pub use mfi::MoneyFlow;
pub use rsi::Rsi;
pub use stoch_rsi::{StochRsi, StochRsiValue};

use crate::domain::Bar;

/// Neutral midpoint for 0..100 oscillators (RSI, %K, MFI).
pub const NEUTRAL_OSCILLATOR: f64 = 50.0;

/// Incremental indicator.
///
/// # Look-ahead contamination guard
/// The output for bar t depends only on bars `0..=t`. Every indicator must
/// pass the truncated-vs-full series test.
pub trait StreamingIndicator: Clone + Send + Sync {
    type Output: Copy + std::fmt::Debug;

    /// Human-readable name (e.g., "rsi_14", "macd_12_26_9").
    fn name(&self) -> &str;

    /// Number of bars needed before the output is considered settled.
    fn lookback(&self) -> usize;

    /// Advance the state by one bar and return the value at that bar.
    fn update(&mut self, bar: &Bar) -> Self::Output;
}

/// Replay `bars` through a copy of `indicator` and collect every output.
///
/// The original state is left untouched.
pub fn compute_series<I: StreamingIndicator>(indicator: &I, bars: &[Bar]) -> Vec<I::Output> {
    let mut state = indicator.clone();
    bars.iter().map(|bar| state.update(bar)).collect()
}

/// Create synthetic bars from close prices for testing.
///
/// Generates plausible OHLC: open = prev_close (or close for first bar),
/// high = max(open,close) + 1.0, low = min(open,close) - 1.0, volume = 100.
/// Bars are one minute apart.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<Bar> {
    let base = chrono::NaiveDate::from_ymd_opt(2024, 1, 2)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Bar {
                open_time: base + chrono::Duration::minutes(i as i64),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 100.0,
            }
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
