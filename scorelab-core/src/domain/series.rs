//! Append-only bar history.

use super::bar::{Bar, BarError};
use chrono::NaiveDateTime;
use thiserror::Error;

/// Ordered, append-only sequence of bars indexed `0..len`.
///
/// Open times are strictly increasing. A bar is never modified once pushed.
#[derive(Debug, Clone, Default)]
pub struct BarSeries {
    bars: Vec<Bar>,
}

impl BarSeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bars: Vec::with_capacity(capacity),
        }
    }

    /// Check that `bar` may be appended next, without appending it.
    pub fn check_next(&self, bar: &Bar) -> Result<(), SeriesError> {
        let index = self.bars.len();
        bar.validate()
            .map_err(|source| SeriesError::InvalidBar { index, source })?;
        if let Some(last) = self.bars.last() {
            if bar.open_time <= last.open_time {
                return Err(SeriesError::OutOfOrder {
                    last: last.open_time,
                    got: bar.open_time,
                });
            }
        }
        Ok(())
    }

    /// Append a bar and return its index.
    pub fn push(&mut self, bar: Bar) -> Result<usize, SeriesError> {
        self.check_next(&bar)?;
        self.bars.push(bar);
        Ok(self.bars.len() - 1)
    }

    pub fn get(&self, index: usize) -> Option<&Bar> {
        self.bars.get(index)
    }

    pub fn last(&self) -> Option<&Bar> {
        self.bars.last()
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn as_slice(&self) -> &[Bar] {
        &self.bars
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Bar> {
        self.bars.iter()
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SeriesError {
    #[error("bar open time {got} is not after the last bar at {last}")]
    OutOfOrder {
        last: NaiveDateTime,
        got: NaiveDateTime,
    },

    #[error("invalid bar at index {index}: {source}")]
    InvalidBar {
        index: usize,
        #[source]
        source: BarError,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_bars;

    #[test]
    fn push_assigns_sequential_indices() {
        let mut series = BarSeries::new();
        for (i, bar) in make_bars(&[1.0, 2.0, 3.0]).into_iter().enumerate() {
            assert_eq!(series.push(bar).unwrap(), i);
        }
        assert_eq!(series.len(), 3);
        assert_eq!(series.last().unwrap().close, 3.0);
    }

    #[test]
    fn push_rejects_repeated_open_time() {
        let bars = make_bars(&[1.0, 2.0]);
        let mut series = BarSeries::new();
        series.push(bars[0]).unwrap();
        let err = series.push(bars[0]).unwrap_err();
        assert!(matches!(err, SeriesError::OutOfOrder { .. }));
        assert_eq!(series.len(), 1);
    }

    #[test]
    fn push_rejects_earlier_open_time() {
        let bars = make_bars(&[1.0, 2.0]);
        let mut series = BarSeries::new();
        series.push(bars[1]).unwrap();
        assert!(series.push(bars[0]).is_err());
    }

    #[test]
    fn push_rejects_void_bar_with_index() {
        let mut bars = make_bars(&[1.0, 2.0]);
        bars[1].high = f64::INFINITY;
        let mut series = BarSeries::new();
        series.push(bars[0]).unwrap();
        match series.push(bars[1]) {
            Err(SeriesError::InvalidBar { index, .. }) => assert_eq!(index, 1),
            other => panic!("expected InvalidBar, got {other:?}"),
        }
    }
}
