//! Money Flow Index (MFI) over typical price and the tick-volume proxy.
//!
//! For each bar-to-bar transition, raw flow = typical_price * volume. The flow
//! is positive if the typical price rose, negative if it fell, and discarded
//! when it is unchanged.
//! MFI = 100 * pos / (pos + neg) over the last `length` transitions.
//! Undefined (None) before bar index `length`, when the window carries no
//! flow at all, or when the flow sum overflows.

use super::StreamingIndicator;
use crate::domain::Bar;
use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub struct MoneyFlow {
    length: usize,
    bars_seen: usize,
    prev_typical: Option<f64>,
    /// (positive, negative) flow per transition, oldest first.
    flows: VecDeque<(f64, f64)>,
    name: String,
}

impl MoneyFlow {
    pub fn new(length: usize) -> Self {
        assert!(length >= 1, "MFI length must be >= 1");
        Self {
            length,
            bars_seen: 0,
            prev_typical: None,
            flows: VecDeque::with_capacity(length + 1),
            name: format!("mfi_{length}"),
        }
    }
}

impl StreamingIndicator for MoneyFlow {
    type Output = Option<f64>;

    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.length
    }

    fn update(&mut self, bar: &Bar) -> Option<f64> {
        let index = self.bars_seen;
        self.bars_seen += 1;

        let typical = bar.typical_price();
        if let Some(prev) = self.prev_typical.replace(typical) {
            let flow = typical * bar.volume;
            let entry = if typical > prev {
                (flow, 0.0)
            } else if typical < prev {
                (0.0, flow)
            } else {
                (0.0, 0.0)
            };
            self.flows.push_back(entry);
            if self.flows.len() > self.length {
                self.flows.pop_front();
            }
        }

        if index < self.length {
            return None;
        }

        // Re-summed every bar: a running sum would leave rounding residue
        // once large flows leave the window.
        let (pos, neg) = self
            .flows
            .iter()
            .fold((0.0, 0.0), |(p, n), &(up, down)| (p + up, n + down));
        let total = pos + neg;
        if total == 0.0 || !total.is_finite() {
            return None;
        }
        let mfi = 100.0 * pos / total;
        mfi.is_finite().then_some(mfi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, compute_series, make_bars, DEFAULT_EPSILON};

    #[test]
    fn undefined_before_length() {
        let bars = make_bars(&[1.0, 2.0, 3.0, 4.0]);
        let result = compute_series(&MoneyFlow::new(3), &bars);
        assert_eq!(result[0], None);
        assert_eq!(result[1], None);
        assert_eq!(result[2], None);
        assert!(result[3].is_some());
    }

    #[test]
    fn all_rising_is_100() {
        let bars = make_bars(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        let result = compute_series(&MoneyFlow::new(3), &bars);
        assert_eq!(result[4], Some(100.0));
    }

    #[test]
    fn all_falling_is_0() {
        let bars = make_bars(&[5.0, 4.0, 3.0, 2.0, 1.0]);
        let result = compute_series(&MoneyFlow::new(3), &bars);
        assert_eq!(result[4], Some(0.0));
    }

    #[test]
    fn known_mixed_window() {
        // Flat OHLC so typical price == close; volumes vary.
        let mut bars = make_bars(&[10.0, 11.0, 10.5, 12.0]);
        for (bar, vol) in bars.iter_mut().zip([5.0, 2.0, 4.0, 1.0]) {
            bar.high = bar.close;
            bar.low = bar.close;
            bar.volume = vol;
        }
        // Transitions: up 11*2=22, down 10.5*4=42, up 12*1=12
        let result = compute_series(&MoneyFlow::new(3), &bars);
        assert_approx(result[3].unwrap(), 100.0 * 34.0 / 76.0, DEFAULT_EPSILON);
    }

    #[test]
    fn ties_are_discarded() {
        let mut bars = make_bars(&[10.0, 11.0, 11.0, 10.0]);
        for (bar, vol) in bars.iter_mut().zip([1.0, 1.0, 1000.0, 1.0]) {
            bar.high = bar.close;
            bar.low = bar.close;
            bar.volume = vol;
        }
        // up 11, tie (dropped), down 10 → 100*11/21
        let result = compute_series(&MoneyFlow::new(3), &bars);
        assert_approx(result[3].unwrap(), 100.0 * 11.0 / 21.0, DEFAULT_EPSILON);
    }

    #[test]
    fn zero_volume_window_is_undefined() {
        let mut bars = make_bars(&[1.0, 3.0, 2.0, 5.0, 4.0, 6.0]);
        for bar in &mut bars {
            bar.volume = 0.0;
        }
        let result = compute_series(&MoneyFlow::new(3), &bars);
        assert!(result.iter().all(|v| v.is_none()));
    }

    #[test]
    fn window_drops_old_flow_exactly() {
        // Heavy early volume, then zero volume for a full window.
        let mut bars = make_bars(&[1.0, 2.0, 3.0, 4.0, 3.0, 5.0, 2.0]);
        for (i, bar) in bars.iter_mut().enumerate() {
            bar.volume = if i < 3 { 1.0e9 } else { 0.0 };
        }
        let result = compute_series(&MoneyFlow::new(3), &bars);
        assert!(result[3].is_some());
        assert_eq!(result[6], None);
    }

    #[test]
    fn overflowing_flow_is_undefined() {
        let mut bars = make_bars(&[1.0, 2.0, 1.5, 3.0, 2.0]);
        for bar in &mut bars {
            bar.volume = f64::MAX;
        }
        let result = compute_series(&MoneyFlow::new(3), &bars);
        assert!(result.iter().all(|v| v.is_none()));
    }

    #[test]
    fn mfi_lookback() {
        assert_eq!(MoneyFlow::new(14).lookback(), 14);
    }
}
