//! Average True Range (ATR).
//!
//! True Range: max(high-low, |high-prev_close|, |low-prev_close|)
//! ATR uses Wilder smoothing (EMA with alpha = 1/period).
//! Lookback: period (the first bar has no previous close, so the seed is the
//! mean of TR[1..=period]).

use super::StreamingIndicator;
use crate::domain::Bar;

/// True range of `bar` against the previous close.
///
/// `None` on the first bar, where there is no previous close.
pub fn true_range(bar: &Bar, prev_close: Option<f64>) -> Option<f64> {
    let pc = prev_close?;
    let (h, l) = (bar.high, bar.low);
    Some((h - l).max((h - pc).abs()).max((l - pc).abs()))
}

#[derive(Debug, Clone)]
pub struct Atr {
    period: usize,
    prev_close: Option<f64>,
    seed_count: usize,
    seed_sum: f64,
    value: Option<f64>,
    name: String,
}

impl Atr {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "ATR period must be >= 1");
        Self {
            period,
            prev_close: None,
            seed_count: 0,
            seed_sum: 0.0,
            value: None,
            name: format!("atr_{period}"),
        }
    }

    /// Latest value, `None` while seeding.
    pub fn value(&self) -> Option<f64> {
        self.value
    }
}

impl StreamingIndicator for Atr {
    type Output = Option<f64>;

    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn update(&mut self, bar: &Bar) -> Option<f64> {
        let tr = true_range(bar, self.prev_close.replace(bar.close));
        let Some(tr) = tr else {
            return self.value;
        };

        let period = self.period as f64;
        self.value = match self.value {
            Some(prev) => Some(prev + (tr - prev) / period),
            None => {
                self.seed_sum += tr;
                self.seed_count += 1;
                (self.seed_count == self.period).then(|| self.seed_sum / period)
            }
        };
        self.value
    }
}
