//! Streaming score engine.
//!
//! Per committed bar, in order:
//!
//! 1. Validate and append the bar to the series (monotonic open time)
//! 2. Advance every indicator in the bank by exactly one bar
//! 3. Score the readings (all zero below the warmup)
//! 4. Derive ATR levels and the advisory from the frame

pub mod bank;
pub mod state;
pub mod warmup;

pub use bank::IndicatorBank;
pub use state::{frames_digest, EngineError, Evaluation, ScoreEngine};
pub use warmup::WarmupState;
