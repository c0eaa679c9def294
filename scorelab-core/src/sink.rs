//! Output sinks: where evaluations go once the engine has produced them.
//!
//! The engine itself performs no I/O. Rendering, telemetry, and advisory
//! delivery all sit behind [`OutputSink`].

use crate::domain::Bar;
use crate::engine::{EngineError, Evaluation, ScoreEngine};
use crate::scoring::Advisory;
use tracing::info;

pub trait OutputSink {
    /// Called once per committed bar. `is_last` marks the final bar of a batch.
    fn on_evaluation(&mut self, bar: &Bar, eval: &Evaluation, is_last: bool);
}

/// Collects every evaluation in memory.
#[derive(Debug, Default)]
pub struct VecSink {
    pub evaluations: Vec<Evaluation>,
}

impl VecSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl OutputSink for VecSink {
    fn on_evaluation(&mut self, _bar: &Bar, eval: &Evaluation, _is_last: bool) {
        self.evaluations.push(*eval);
    }
}

/// Telemetry through `tracing`: one summary line for the last bar (or every
/// bar with `every_bar`), plus an advisory line when confidence clears the
/// threshold. Warmup frames are never reported.
#[derive(Debug, Clone)]
pub struct TracingSink {
    symbol: String,
    every_bar: bool,
}

impl TracingSink {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            every_bar: false,
        }
    }

    pub fn every_bar(mut self, every_bar: bool) -> Self {
        self.every_bar = every_bar;
        self
    }

    /// Whether `eval` gets a telemetry line.
    pub fn reports(&self, eval: &Evaluation, is_last: bool) -> bool {
        eval.frame.warm && (is_last || self.every_bar)
    }
}

impl OutputSink for TracingSink {
    fn on_evaluation(&mut self, bar: &Bar, eval: &Evaluation, is_last: bool) {
        if !self.reports(eval, is_last) {
            return;
        }
        info!(symbol = %self.symbol, "{}", telemetry_line(bar, eval));
        if let Some(advisory) = &eval.advisory {
            info!(
                symbol = %self.symbol,
                side = %advisory.side,
                confidence_pct = advisory.confidence_pct,
                "{}",
                advisory_line(advisory)
            );
        }
    }
}

pub fn advisory_line(advisory: &Advisory) -> String {
    format!(
        "ADVISORY SIGNAL: {} confidence {:.1}%",
        advisory.side, advisory.confidence_pct
    )
}

/// Human-readable per-bar summary: scores, then ATR and levels in pips.
pub fn telemetry_line(bar: &Bar, eval: &Evaluation) -> String {
    let f = &eval.frame;
    let side = crate::scoring::Side::from(f.direction());
    let mut line = format!(
        "{} {} combined={:+.3} conf={:.1}% | rsi={:+.3} stoch_rsi={:+.3} macd={:+.3} ema={:+.3} mfi={:+.3}",
        bar.open_time.format("%Y-%m-%d %H:%M"),
        side,
        f.combined_score,
        f.confidence * 100.0,
        f.rsi_score,
        f.stoch_rsi_score,
        f.macd_score,
        f.ema_score,
        f.mfi_score,
    );
    match &eval.levels {
        Some(l) => line.push_str(&format!(
            " | atr={:.1}p sl={:+.1}p tp1={:+.1}p tp2={:+.1}p tp3={:+.1}p",
            l.atr_pips, l.sl.pips, l.tp1.pips, l.tp2.pips, l.tp3.pips
        )),
        None => line.push_str(" | atr=n/a"),
    }
    line
}

/// Advance `engine` through `bars`, forwarding each evaluation to `sink`.
///
/// Stops at the first rejected bar. Returns the number of bars committed.
pub fn drive<S: OutputSink + ?Sized>(
    engine: &mut ScoreEngine,
    bars: &[Bar],
    sink: &mut S,
) -> Result<usize, EngineError> {
    let last = bars.len().saturating_sub(1);
    for (i, bar) in bars.iter().enumerate() {
        let eval = engine.advance(*bar)?;
        sink.on_evaluation(bar, &eval, i == last);
    }
    Ok(bars.len())
}
