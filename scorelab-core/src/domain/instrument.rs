use serde::{Deserialize, Serialize};

/// Instrument metadata needed to express price distances in pips.
///
/// `tick_size` is the minimum price increment. `pip_size` is the broker's
/// standard pip (0.0001 on most FX majors, 0.01 on JPY pairs) and may be
/// absent for instruments that do not quote in pips.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Instrument {
    pub symbol: String,
    pub tick_size: f64,
    #[serde(default)]
    pub pip_size: Option<f64>,
}

impl Instrument {
    pub fn new(symbol: impl Into<String>, tick_size: f64, pip_size: Option<f64>) -> Self {
        Self {
            symbol: symbol.into(),
            tick_size,
            pip_size,
        }
    }

    /// Five-digit FX quote: tick 0.00001, pip 0.0001.
    pub fn forex(symbol: impl Into<String>) -> Self {
        Self::new(symbol, 0.00001, Some(0.0001))
    }

    /// Instrument-supplied pip size, falling back to the tick size.
    ///
    /// Returns `None` when neither is a positive finite number.
    pub fn effective_pip_size(&self) -> Option<f64> {
        self.pip_size
            .filter(|p| p.is_finite() && *p > 0.0)
            .or_else(|| Some(self.tick_size).filter(|t| t.is_finite() && *t > 0.0))
    }
}
