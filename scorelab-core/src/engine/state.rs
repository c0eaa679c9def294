//! Score engine: committed bar/frame history plus the live indicator bank.

use super::bank::IndicatorBank;
use super::warmup::WarmupState;
use crate::config::{ConfigError, EngineConfig};
use crate::domain::{Bar, BarError, BarSeries, ConfigHash, FrameDigest, Instrument, SeriesError};
use crate::levels::{LevelCalculator, LevelSet};
use crate::scoring::{Advisory, CompositeScorer, RawIndicators, ScoreFrame};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, trace};

/// Everything produced for one bar.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub frame: ScoreFrame,
    pub raw: RawIndicators,
    /// Absent until ATR has seeded.
    pub levels: Option<LevelSet>,
    pub advisory: Option<Advisory>,
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("bar open time {got} is not after the last committed bar at {last}")]
    OutOfOrder {
        last: NaiveDateTime,
        got: NaiveDateTime,
    },

    #[error("invalid bar at index {index}: {reason}")]
    InvalidBar {
        index: usize,
        #[source]
        reason: BarError,
    },

    #[error("invalid engine config: {0}")]
    Config(#[from] ConfigError),
}

impl From<SeriesError> for EngineError {
    fn from(err: SeriesError) -> Self {
        match err {
            SeriesError::OutOfOrder { last, got } => EngineError::OutOfOrder { last, got },
            SeriesError::InvalidBar { index, source } => EngineError::InvalidBar {
                index,
                reason: source,
            },
        }
    }
}

/// Immutable per-engine stages applied after the indicator bank.
#[derive(Debug, Clone)]
struct Pipeline {
    scorer: CompositeScorer,
    levels: LevelCalculator,
    threshold_pct: f64,
}

impl Pipeline {
    fn evaluate(&self, bank: &mut IndicatorBank, index: usize, bar: &Bar) -> Evaluation {
        let readings = bank.update(bar);
        let frame = self.scorer.score(index, bar.open_time, &readings);
        let levels = readings
            .atr
            .filter(|atr| atr.is_finite())
            .map(|atr| self.levels.compute(bar.close, atr, frame.combined_score));
        let advisory = Advisory::evaluate(&frame, self.threshold_pct);
        Evaluation {
            frame,
            raw: RawIndicators::from(&readings),
            levels,
            advisory,
        }
    }
}

/// Streaming composite-score engine for one instrument.
///
/// Bars are committed with [`advance`](Self::advance) in strictly increasing
/// open-time order. The still-open bar is evaluated with
/// [`peek`](Self::peek), which works on a snapshot and leaves committed
/// state untouched.
#[derive(Debug, Clone)]
pub struct ScoreEngine {
    config: EngineConfig,
    config_hash: ConfigHash,
    instrument: Instrument,
    bank: IndicatorBank,
    warmup: WarmupState,
    pipeline: Pipeline,
    series: BarSeries,
    frames: Vec<ScoreFrame>,
}

impl ScoreEngine {
    pub fn new(config: EngineConfig, instrument: Instrument) -> Result<Self, EngineError> {
        config.validate()?;

        let bank = IndicatorBank::new(&config);
        let warmup = bank.warmup_state();
        let pipeline = Pipeline {
            scorer: CompositeScorer::new(warmup.warmup_bars(), config.signal_threshold_pct),
            levels: LevelCalculator::new(&config.levels, &config.pip_size, &instrument),
            threshold_pct: config.signal_threshold_pct,
        };
        let config_hash = config.config_hash();

        debug!(
            symbol = %instrument.symbol,
            warmup = warmup.warmup_bars(),
            pip_size = ?pipeline.levels.pip_size(),
            config_hash = config_hash.short(),
            "score engine initialized"
        );

        Ok(Self {
            config,
            config_hash,
            instrument,
            bank,
            warmup,
            pipeline,
            series: BarSeries::new(),
            frames: Vec::new(),
        })
    }

    /// Commit a closed bar and return its evaluation.
    ///
    /// A rejected bar leaves the engine unchanged.
    pub fn advance(&mut self, bar: Bar) -> Result<Evaluation, EngineError> {
        let index = self.series.push(bar)?;
        let eval = self.pipeline.evaluate(&mut self.bank, index, &bar);
        self.warmup.process_bar();
        self.frames.push(eval.frame);

        trace!(
            index,
            combined = eval.frame.combined_score,
            confidence = eval.frame.confidence,
            advisory = eval.advisory.is_some(),
            "frame committed"
        );
        Ok(eval)
    }

    /// Evaluate a still-open bar as if it were the next committed bar.
    ///
    /// Repeated peeks for the same index are independent of each other and
    /// never affect later `advance` results.
    pub fn peek(&self, bar: &Bar) -> Result<Evaluation, EngineError> {
        self.series.check_next(bar)?;
        let mut snapshot = self.bank.clone();
        Ok(self.pipeline.evaluate(&mut snapshot, self.series.len(), bar))
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn config_hash(&self) -> &ConfigHash {
        &self.config_hash
    }

    pub fn instrument(&self) -> &Instrument {
        &self.instrument
    }

    /// Warmup length W: indices below W score exactly 0.
    pub fn warmup(&self) -> usize {
        self.warmup.warmup_bars()
    }

    /// Whether the next committed bar will be scored.
    pub fn is_warm(&self) -> bool {
        self.warmup.is_warm()
    }

    pub fn bars_until_warm(&self) -> usize {
        self.warmup.bars_until_warm()
    }

    pub fn series(&self) -> &BarSeries {
        &self.series
    }

    pub fn frames(&self) -> &[ScoreFrame] {
        &self.frames
    }

    pub fn last_frame(&self) -> Option<&ScoreFrame> {
        self.frames.last()
    }

    /// Digest of every committed frame so far.
    pub fn digest(&self) -> FrameDigest {
        frames_digest(&self.frames)
    }
}

/// BLAKE3 over the JSON encoding of each frame, in order.
///
/// Two replays of the same bars under the same config give the same digest.
pub fn frames_digest(frames: &[ScoreFrame]) -> FrameDigest {
    let mut hasher = blake3::Hasher::new();
    for frame in frames {
        hasher.update(&serde_json::to_vec(frame).expect("ScoreFrame must serialize"));
        hasher.update(b"\n");
    }
    FrameDigest(hasher.finalize().to_hex().to_string())
}
