//! Relative Strength Index (RSI).
//!
//! Uses Wilder smoothing of average gains and average losses.
//! RSI = 100 - 100 / (1 + avg_gain / avg_loss)
//! Lookback: period (the seed needs `period` close-to-close changes).
//! Edge cases: no movement → 50; avg_loss == 0 → 100; avg_gain == 0 → 0.

use super::StreamingIndicator;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct Rsi {
    period: usize,
    prev_close: Option<f64>,
    changes_seen: usize,
    gain_sum: f64,
    loss_sum: f64,
    /// (avg_gain, avg_loss) once seeded.
    averages: Option<(f64, f64)>,
    name: String,
}

impl Rsi {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "RSI period must be >= 1");
        Self {
            period,
            prev_close: None,
            changes_seen: 0,
            gain_sum: 0.0,
            loss_sum: 0.0,
            averages: None,
            name: format!("rsi_{period}"),
        }
    }

    /// Feed one close. Returns `None` until `period` changes have been seen.
    pub fn next(&mut self, close: f64) -> Option<f64> {
        let prev = self.prev_close.replace(close)?;
        let change = close - prev;
        let gain = change.max(0.0);
        let loss = (-change).max(0.0);
        self.changes_seen += 1;

        let period = self.period as f64;
        let (avg_gain, avg_loss) = match self.averages {
            Some((g, l)) => (g + (gain - g) / period, l + (loss - l) / period),
            None => {
                self.gain_sum += gain;
                self.loss_sum += loss;
                if self.changes_seen < self.period {
                    return None;
                }
                (self.gain_sum / period, self.loss_sum / period)
            }
        };
        self.averages = Some((avg_gain, avg_loss));
        Some(compute_rsi(avg_gain, avg_loss))
    }

    /// Latest value, `None` while seeding.
    pub fn value(&self) -> Option<f64> {
        self.averages.map(|(g, l)| compute_rsi(g, l))
    }
}

impl StreamingIndicator for Rsi {
    type Output = Option<f64>;

    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn update(&mut self, bar: &Bar) -> Option<f64> {
        self.next(bar.close)
    }
}

fn compute_rsi(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 && avg_gain == 0.0 {
        50.0 // no movement
    } else if avg_loss == 0.0 {
        100.0
    } else if avg_gain == 0.0 {
        0.0
    } else {
        100.0 - 100.0 / (1.0 + avg_gain / avg_loss)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, compute_series, make_bars};

    #[test]
    fn rsi_all_gains() {
        let bars = make_bars(&[100.0, 101.0, 102.0, 103.0, 104.0, 105.0]);
        let result = compute_series(&Rsi::new(3), &bars);
        assert_eq!(result[3], Some(100.0));
        assert_eq!(result[5], Some(100.0));
    }

    #[test]
    fn rsi_all_losses() {
        let bars = make_bars(&[105.0, 104.0, 103.0, 102.0, 101.0, 100.0]);
        let result = compute_series(&Rsi::new(3), &bars);
        assert_eq!(result[3], Some(0.0));
    }

    #[test]
    fn rsi_flat_is_neutral() {
        let bars = make_bars(&[100.0; 10]);
        let result = compute_series(&Rsi::new(3), &bars);
        assert_eq!(result[9], Some(50.0));
    }

    #[test]
    fn rsi_mixed_seed_and_wilder_step() {
        // Closes: 44, 44.34, 44.09, 43.61, 44.33
        // Changes: +0.34, -0.25, -0.48, +0.72
        // period=3 seed from the first three changes:
        //   avg_gain = 0.34/3, avg_loss = 0.73/3
        //   RSI[3] = 100 - 100/(1 + 0.34/0.73) ≈ 31.7757
        // Wilder step with +0.72:
        //   avg_gain = 0.34/3 + (0.72 - 0.34/3)/3
        //   avg_loss = 0.73/3 + (0 - 0.73/3)/3
        let bars = make_bars(&[44.0, 44.34, 44.09, 43.61, 44.33]);
        let result = compute_series(&Rsi::new(3), &bars);

        assert_eq!(result[0], None);
        assert_eq!(result[1], None);
        assert_eq!(result[2], None);
        assert_approx(result[3].unwrap(), 100.0 - 100.0 / (1.0 + 0.34 / 0.73), 1e-9);

        let g = 0.34 / 3.0 + (0.72 - 0.34 / 3.0) / 3.0;
        let l = 0.73 / 3.0 - (0.73 / 3.0) / 3.0;
        assert_approx(result[4].unwrap(), 100.0 - 100.0 / (1.0 + g / l), 1e-9);
    }

    #[test]
    fn rsi_bounds() {
        let bars = make_bars(&[100.0, 105.0, 98.0, 110.0, 95.0, 115.0, 90.0, 120.0]);
        let result = compute_series(&Rsi::new(3), &bars);
        for (i, v) in result.iter().enumerate() {
            if let Some(v) = v {
                assert!((0.0..=100.0).contains(v), "RSI out of bounds at bar {i}: {v}");
            }
        }
    }

    #[test]
    fn rsi_value_tracks_last_output() {
        let mut rsi = Rsi::new(2);
        assert_eq!(rsi.value(), None);
        rsi.next(1.0);
        rsi.next(2.0);
        let out = rsi.next(1.5);
        assert_eq!(rsi.value(), out);
    }

    #[test]
    fn rsi_lookback() {
        assert_eq!(Rsi::new(14).lookback(), 14);
    }
}
