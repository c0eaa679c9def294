//! Bar — the fundamental market data unit.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// OHLC bar for a single instrument over one fixed interval.
///
/// `volume` is a tick-count proxy: most retail feeds only report the number
/// of price updates per bar, not traded volume. The money-flow component uses
/// it as-is.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub open_time: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Bar {
    /// Typical price `(high + low + close) / 3`.
    pub fn typical_price(&self) -> f64 {
        (self.high + self.low + self.close) / 3.0
    }

    /// Returns true if any price field is NaN or infinite.
    pub fn is_void(&self) -> bool {
        !(self.open.is_finite()
            && self.high.is_finite()
            && self.low.is_finite()
            && self.close.is_finite())
    }

    /// Reject bars that would poison recursive indicator state.
    pub fn validate(&self) -> Result<(), BarError> {
        if self.is_void() {
            return Err(BarError::NonFinitePrice);
        }
        if self.high < self.low {
            return Err(BarError::HighBelowLow {
                high: self.high,
                low: self.low,
            });
        }
        if !self.volume.is_finite() || self.volume < 0.0 {
            return Err(BarError::InvalidVolume(self.volume));
        }
        let typical = self.typical_price();
        if !typical.is_finite() || !(self.high - self.low).is_finite() {
            return Err(BarError::NonFinitePrice);
        }
        if !(typical * self.volume).is_finite() {
            return Err(BarError::FlowOverflow {
                typical,
                volume: self.volume,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BarError {
    #[error("bar has a NaN or infinite price")]
    NonFinitePrice,

    #[error("high {high} is below low {low}")]
    HighBelowLow { high: f64, low: f64 },

    #[error("volume {0} is negative or not finite")]
    InvalidVolume(f64),

    #[error("money flow {typical} * {volume} overflows")]
    FlowOverflow { typical: f64, volume: f64 },
}
