//! Composite scoring — five normalized component scores and their weighted blend.
//!
//! Each component maps an indicator reading into [-1, +1]:
//!
//! | Component | Score | Weight |
//! |-----------|-------|--------|
//! | RSI       | (rsi - 50) / 50 | 1.0 |
//! | StochRSI  | (k - 50)/50 * 0.6 + (k - d)/20 * 0.4 | 1.2 |
//! | MACD      | histogram sign and slope, one of {-1, -0.3, 0, 0.3, 1} | 1.5 |
//! | EMA cross | (fast - slow) / slow * 300 | 1.5 |
//! | MFI       | (mfi - 50) / 50 | 0.8 |
//!
//! combined = clamp(sum(weight * score) / 6, -1, 1), confidence = |combined|.
//! A component whose reading is NaN scores 0.

use crate::indicators::{MacdValue, StochRsiValue, NEUTRAL_OSCILLATOR};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Fixed component weights.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreWeights {
    pub rsi: f64,
    pub stoch_rsi: f64,
    pub macd: f64,
    pub ema: f64,
    pub mfi: f64,
}

impl ScoreWeights {
    pub fn total(&self) -> f64 {
        self.rsi + self.stoch_rsi + self.macd + self.ema + self.mfi
    }
}

pub const WEIGHTS: ScoreWeights = ScoreWeights {
    rsi: 1.0,
    stoch_rsi: 1.2,
    macd: 1.5,
    ema: 1.5,
    mfi: 0.8,
};

/// Spread amplification for the EMA-cross score: a 1/300 relative gap saturates.
const EMA_SPREAD_GAIN: f64 = 300.0;

fn clamp_unit(x: f64) -> f64 {
    if x.is_nan() {
        0.0
    } else {
        x.clamp(-1.0, 1.0)
    }
}

/// RSI score. Undefined RSI reads as neutral 50.
pub fn rsi_score(rsi: Option<f64>) -> f64 {
    let rsi = rsi.unwrap_or(NEUTRAL_OSCILLATOR);
    clamp_unit((rsi - 50.0) / 50.0)
}

/// StochRSI score: level of %K plus its spread over %D.
pub fn stoch_rsi_score(value: StochRsiValue) -> f64 {
    let level = (value.k - 50.0) / 50.0;
    let spread = (value.k - value.d) / 20.0;
    clamp_unit(level * 0.6 + spread * 0.4)
}

/// MACD histogram direction score.
///
/// Full weight when the histogram is on one side of zero and still moving
/// away from it; partial weight when it is retreating toward zero.
pub fn macd_score(histogram: f64, prev_histogram: f64) -> f64 {
    if histogram > 0.0 && histogram >= prev_histogram {
        1.0
    } else if histogram < 0.0 && histogram <= prev_histogram {
        -1.0
    } else if histogram > 0.0 {
        0.3
    } else if histogram < 0.0 {
        -0.3
    } else {
        0.0
    }
}

/// EMA-cross spread score. Zero when the slow EMA is not positive.
pub fn ema_score(fast: f64, slow: f64) -> f64 {
    if slow > 0.0 {
        clamp_unit((fast - slow) / slow * EMA_SPREAD_GAIN)
    } else {
        0.0
    }
}

/// MFI score. Undefined MFI (short history, no flow) scores 0.
pub fn mfi_score(mfi: Option<f64>) -> f64 {
    mfi.map_or(0.0, |m| clamp_unit((m - 50.0) / 50.0))
}

/// Raw indicator values at one bar, as produced by the indicator bank.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Readings {
    pub rsi: Option<f64>,
    pub stoch_rsi: StochRsiValue,
    pub macd: MacdValue,
    /// Histogram of the previous bar, 0 on the first bar.
    pub prev_histogram: f64,
    pub ema_fast: f64,
    pub ema_slow: f64,
    pub mfi: Option<f64>,
    pub atr: Option<f64>,
}

/// Raw indicator values for one bar, published next to the scores.
///
/// Unlike the frame, these are not zeroed during warmup.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawIndicators {
    pub rsi: Option<f64>,
    pub stoch_k: f64,
    pub stoch_d: f64,
    pub macd_line: f64,
    pub macd_signal: f64,
    pub macd_histogram: f64,
    pub ema_fast: f64,
    pub ema_slow: f64,
    pub mfi: Option<f64>,
    pub atr: Option<f64>,
}

impl From<&Readings> for RawIndicators {
    fn from(r: &Readings) -> Self {
        Self {
            rsi: r.rsi,
            stoch_k: r.stoch_rsi.k,
            stoch_d: r.stoch_rsi.d,
            macd_line: r.macd.macd,
            macd_signal: r.macd.signal,
            macd_histogram: r.macd.histogram,
            ema_fast: r.ema_fast,
            ema_slow: r.ema_slow,
            mfi: r.mfi,
            atr: r.atr,
        }
    }
}

/// The five normalized component scores.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ComponentScores {
    pub rsi: f64,
    pub stoch_rsi: f64,
    pub macd: f64,
    pub ema: f64,
    pub mfi: f64,
}

impl ComponentScores {
    pub fn from_readings(r: &Readings) -> Self {
        Self {
            rsi: rsi_score(r.rsi),
            stoch_rsi: stoch_rsi_score(r.stoch_rsi),
            macd: macd_score(r.macd.histogram, r.prev_histogram),
            ema: ema_score(r.ema_fast, r.ema_slow),
            mfi: mfi_score(r.mfi),
        }
    }

    /// Weighted blend normalized by the weight total, clamped to [-1, 1].
    pub fn combined(&self) -> f64 {
        let raw = self.rsi * WEIGHTS.rsi
            + self.stoch_rsi * WEIGHTS.stoch_rsi
            + self.macd * WEIGHTS.macd
            + self.ema * WEIGHTS.ema
            + self.mfi * WEIGHTS.mfi;
        clamp_unit(raw / WEIGHTS.total())
    }
}

/// Per-bar output record. Written once per committed index.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreFrame {
    pub index: usize,
    pub open_time: NaiveDateTime,
    /// False for indices below the warmup; every score is then exactly 0.
    pub warm: bool,
    pub rsi_score: f64,
    pub stoch_rsi_score: f64,
    pub macd_score: f64,
    pub ema_score: f64,
    pub mfi_score: f64,
    pub combined_score: f64,
    pub confidence: f64,
    pub threshold_pos: f64,
    pub threshold_neg: f64,
}

impl ScoreFrame {
    pub fn component_scores(&self) -> ComponentScores {
        ComponentScores {
            rsi: self.rsi_score,
            stoch_rsi: self.stoch_rsi_score,
            macd: self.macd_score,
            ema: self.ema_score,
            mfi: self.mfi_score,
        }
    }

    pub fn direction(&self) -> Direction {
        Direction::from_score(self.combined_score)
    }
}

/// Side implied by the sign of the combined score (0 counts as bullish).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Bullish,
    Bearish,
}

impl Direction {
    pub fn from_score(combined: f64) -> Self {
        if combined >= 0.0 {
            Direction::Bullish
        } else {
            Direction::Bearish
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Side {
    Buy,
    Sell,
}

impl From<Direction> for Side {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Bullish => Side::Buy,
            Direction::Bearish => Side::Sell,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Buy => write!(f, "BUY"),
            Side::Sell => write!(f, "SELL"),
        }
    }
}

/// Directional advisory: confidence reached the configured threshold.
///
/// Purely informational. Delivery is up to the output sink.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Advisory {
    pub side: Side,
    pub confidence_pct: f64,
}

impl Advisory {
    /// Advisory for a warm frame whose confidence meets `threshold_pct`.
    pub fn evaluate(frame: &ScoreFrame, threshold_pct: f64) -> Option<Self> {
        let confidence_pct = frame.confidence * 100.0;
        (frame.warm && confidence_pct >= threshold_pct).then(|| Advisory {
            side: frame.direction().into(),
            confidence_pct,
        })
    }
}

/// Turns readings into frames, forcing neutral output during warmup.
#[derive(Debug, Clone)]
pub struct CompositeScorer {
    warmup: usize,
    threshold: f64,
}

impl CompositeScorer {
    pub fn new(warmup: usize, signal_threshold_pct: f64) -> Self {
        Self {
            warmup,
            threshold: signal_threshold_pct / 100.0,
        }
    }

    pub fn warmup(&self) -> usize {
        self.warmup
    }

    pub fn score(&self, index: usize, open_time: NaiveDateTime, readings: &Readings) -> ScoreFrame {
        let warm = index >= self.warmup;
        let scores = if warm {
            ComponentScores::from_readings(readings)
        } else {
            ComponentScores::default()
        };
        let combined = if warm { scores.combined() } else { 0.0 };
        ScoreFrame {
            index,
            open_time,
            warm,
            rsi_score: scores.rsi,
            stoch_rsi_score: scores.stoch_rsi,
            macd_score: scores.macd,
            ema_score: scores.ema,
            mfi_score: scores.mfi,
            combined_score: combined,
            confidence: combined.abs(),
            threshold_pos: self.threshold,
            threshold_neg: -self.threshold,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, DEFAULT_EPSILON};

    fn t0() -> NaiveDateTime {
        chrono::NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    fn bullish_readings() -> Readings {
        Readings {
            rsi: Some(75.0),
            stoch_rsi: StochRsiValue { k: 80.0, d: 70.0 },
            macd: MacdValue {
                macd: 0.004,
                signal: 0.002,
                histogram: 0.002,
            },
            prev_histogram: 0.001,
            ema_fast: 1.1010,
            ema_slow: 1.1000,
            mfi: Some(65.0),
            atr: Some(0.001),
        }
    }

    #[test]
    fn weights_sum_to_six() {
        assert_approx(WEIGHTS.total(), 6.0, DEFAULT_EPSILON);
    }

    #[test]
    fn rsi_score_maps_and_defaults() {
        assert_eq!(rsi_score(Some(50.0)), 0.0);
        assert_eq!(rsi_score(Some(100.0)), 1.0);
        assert_eq!(rsi_score(Some(0.0)), -1.0);
        assert_eq!(rsi_score(Some(75.0)), 0.5);
        assert_eq!(rsi_score(None), 0.0);
    }

    #[test]
    fn stoch_rsi_score_known_values() {
        // (80-50)/50*0.6 + (80-70)/20*0.4 = 0.36 + 0.2 = 0.56
        assert_approx(
            stoch_rsi_score(StochRsiValue { k: 80.0, d: 70.0 }),
            0.56,
            DEFAULT_EPSILON,
        );
        assert_eq!(stoch_rsi_score(StochRsiValue { k: 50.0, d: 50.0 }), 0.0);
        // 0.6 + 50/20*0.4 = 1.6 → clamped
        assert_eq!(stoch_rsi_score(StochRsiValue { k: 100.0, d: 50.0 }), 1.0);
        assert_eq!(stoch_rsi_score(StochRsiValue { k: 0.0, d: 50.0 }), -1.0);
    }

    #[test]
    fn macd_score_cases() {
        assert_eq!(macd_score(0.5, 0.4), 1.0);
        assert_eq!(macd_score(0.5, 0.5), 1.0);
        assert_eq!(macd_score(0.5, 0.6), 0.3);
        assert_eq!(macd_score(-0.5, -0.4), -1.0);
        assert_eq!(macd_score(-0.5, -0.5), -1.0);
        assert_eq!(macd_score(-0.5, -0.6), -0.3);
        assert_eq!(macd_score(0.0, 0.3), 0.0);
        assert_eq!(macd_score(0.0, -0.3), 0.0);
    }

    #[test]
    fn ema_score_cases() {
        assert_eq!(ema_score(1.0, 1.0), 0.0);
        assert_eq!(ema_score(1.0, 0.0), 0.0);
        assert_eq!(ema_score(1.0, -2.0), 0.0);
        // 0.1% gap → 0.3
        assert_approx(ema_score(1.001, 1.0), 0.3, 1e-9);
        assert_eq!(ema_score(2.0, 1.0), 1.0);
        assert_eq!(ema_score(0.5, 1.0), -1.0);
    }

    #[test]
    fn mfi_score_cases() {
        assert_eq!(mfi_score(None), 0.0);
        assert_eq!(mfi_score(Some(50.0)), 0.0);
        assert_eq!(mfi_score(Some(100.0)), 1.0);
        assert_eq!(mfi_score(Some(25.0)), -0.5);
    }

    #[test]
    fn combined_is_weighted_mean() {
        let scores = ComponentScores {
            rsi: 0.5,
            stoch_rsi: 0.56,
            macd: 1.0,
            ema: 0.3,
            mfi: 0.3,
        };
        let expected = (0.5 + 0.56 * 1.2 + 1.5 + 0.3 * 1.5 + 0.3 * 0.8) / 6.0;
        assert_approx(scores.combined(), expected, DEFAULT_EPSILON);
    }

    #[test]
    fn all_max_components_saturate_at_one() {
        let scores = ComponentScores {
            rsi: 1.0,
            stoch_rsi: 1.0,
            macd: 1.0,
            ema: 1.0,
            mfi: 1.0,
        };
        assert_approx(scores.combined(), 1.0, DEFAULT_EPSILON);
    }

    #[test]
    fn scorer_neutral_below_warmup() {
        let scorer = CompositeScorer::new(10, 55.0);
        let frame = scorer.score(9, t0(), &bullish_readings());
        assert!(!frame.warm);
        assert_eq!(frame.component_scores(), ComponentScores::default());
        assert_eq!(frame.combined_score, 0.0);
        assert_eq!(frame.confidence, 0.0);
        assert_approx(frame.threshold_pos, 0.55, DEFAULT_EPSILON);
        assert_approx(frame.threshold_neg, -0.55, DEFAULT_EPSILON);
    }

    #[test]
    fn scorer_scores_from_warmup_index() {
        let scorer = CompositeScorer::new(10, 55.0);
        let frame = scorer.score(10, t0(), &bullish_readings());
        assert!(frame.warm);
        assert_eq!(frame.rsi_score, 0.5);
        assert_eq!(frame.macd_score, 1.0);
        assert!(frame.combined_score > 0.0);
        assert_eq!(frame.confidence, frame.combined_score.abs());
        assert_eq!(frame.direction(), Direction::Bullish);
    }

    #[test]
    fn advisory_gated_by_threshold_and_warmup() {
        let scorer = CompositeScorer::new(0, 55.0);
        let mut frame = scorer.score(5, t0(), &bullish_readings());
        frame.combined_score = -0.6;
        frame.confidence = 0.6;

        let advisory = Advisory::evaluate(&frame, 55.0).unwrap();
        assert_eq!(advisory.side, Side::Sell);
        assert_eq!(advisory.side.to_string(), "SELL");
        assert_approx(advisory.confidence_pct, 60.0, 1e-9);

        assert!(Advisory::evaluate(&frame, 61.0).is_none());

        frame.warm = false;
        assert!(Advisory::evaluate(&frame, 0.0).is_none());
    }

    #[test]
    fn nan_readings_score_neutral() {
        assert_eq!(rsi_score(Some(f64::NAN)), 0.0);
        assert_eq!(mfi_score(Some(f64::NAN)), 0.0);
        assert_eq!(ema_score(f64::NAN, 1.0), 0.0);
        assert_eq!(ema_score(f64::INFINITY, f64::INFINITY), 0.0);
        assert_eq!(stoch_rsi_score(StochRsiValue { k: f64::NAN, d: 50.0 }), 0.0);
        assert_eq!(macd_score(f64::NAN, 0.1), 0.0);
        assert_eq!(ema_score(f64::INFINITY, 1.0), 1.0);

        let mut readings = bullish_readings();
        readings.rsi = Some(f64::NAN);
        readings.ema_fast = f64::NAN;
        let frame = CompositeScorer::new(0, 55.0).score(0, t0(), &readings);
        assert!(frame.combined_score.is_finite());
        assert_eq!(frame.rsi_score, 0.0);
        assert_eq!(frame.ema_score, 0.0);
    }

    #[test]
    fn raw_indicators_copy_readings() {
        let raw = RawIndicators::from(&bullish_readings());
        assert_eq!(raw.rsi, Some(75.0));
        assert_eq!((raw.stoch_k, raw.stoch_d), (80.0, 70.0));
        assert_eq!(raw.macd_line, 0.004);
        assert_eq!(raw.macd_signal, 0.002);
        assert_eq!(raw.macd_histogram, 0.002);
        assert_eq!(raw.atr, Some(0.001));
    }

    #[test]
    fn zero_counts_as_bullish() {
        assert_eq!(Direction::from_score(0.0), Direction::Bullish);
        assert_eq!(Direction::from_score(-1e-12), Direction::Bearish);
    }
}
