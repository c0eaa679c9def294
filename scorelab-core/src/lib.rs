//! ScoreLab Core — streaming composite-score engine for one instrument.
//!
//! This crate contains:
//! - Domain types (bars, append-only bar series, instruments, hashes)
//! - Incremental indicators (RSI, StochRSI, MACD, EMA, MFI, ATR)
//! - Composite scoring with fixed component weights
//! - ATR-based stop-loss / take-profit levels in pips and price
//! - The score engine (`advance` for closed bars, `peek` for the open bar)
//! - Output sinks and a deterministic synthetic bar generator

pub mod config;
pub mod domain;
pub mod engine;
pub mod indicators;
pub mod levels;
pub mod scoring;
pub mod sink;
pub mod synth;

pub use config::{ConfigError, EngineConfig};
pub use domain::{Bar, BarSeries, Instrument};
pub use engine::{frames_digest, EngineError, Evaluation, ScoreEngine};
pub use levels::{Level, LevelCalculator, LevelSet};
pub use scoring::{Advisory, Direction, RawIndicators, ScoreFrame, Side};
pub use sink::{drive, OutputSink, TracingSink, VecSink};
