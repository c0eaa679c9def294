//! ScoreLab CLI — score bar files, generate synthetic bars, print the config.
//!
//! Commands:
//! - `score` — run the composite-score engine over one or more CSV bar files
//! - `synth` — write a deterministic random-walk bar file
//! - `config` — print the default engine config as TOML

use anyhow::{bail, Context, Result};
use chrono::NaiveDateTime;
use clap::{Parser, Subcommand, ValueEnum};
use rayon::prelude::*;
use scorelab_core::domain::{Bar, Instrument};
use scorelab_core::sink::{drive, OutputSink, TracingSink, VecSink};
use scorelab_core::synth::{generate_bars, SynthConfig};
use scorelab_core::{EngineConfig, Evaluation, ScoreEngine};
use serde::Deserialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "scorelab",
    about = "ScoreLab CLI — streaming composite-score engine for OHLC bars"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score CSV bar files (open_time,open,high,low,close,volume), one engine per file.
    Score {
        /// Input CSV files. The file stem is used as the symbol.
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Path to a TOML engine config. Defaults apply when omitted.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Instrument pip size.
        #[arg(long, default_value_t = 0.0001)]
        pip_size: f64,

        /// Instrument tick size (pip fallback when the pip size is not positive).
        #[arg(long, default_value_t = 0.00001)]
        tick_size: f64,

        /// Output directory for per-file results.
        #[arg(long, default_value = "scores")]
        output_dir: PathBuf,

        /// Output format.
        #[arg(long, value_enum, default_value_t = OutputFormat::Jsonl)]
        format: OutputFormat,

        /// Log the telemetry line for the last bar of each file.
        #[arg(long, default_value_t = false)]
        telemetry: bool,
    },
    /// Write a deterministic random-walk bar file.
    Synth {
        /// Number of bars.
        #[arg(long, default_value_t = 1000)]
        bars: usize,

        /// Master seed.
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Symbol (also mixed into the seed).
        #[arg(long, default_value = "SYNTH")]
        symbol: String,

        /// Output CSV path.
        #[arg(long)]
        output: PathBuf,
    },
    /// Print the default engine config as TOML.
    Config,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Jsonl,
    Csv,
}

impl OutputFormat {
    fn extension(self) -> &'static str {
        match self {
            OutputFormat::Jsonl => "jsonl",
            OutputFormat::Csv => "csv",
        }
    }
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "scorelab=info,scorelab_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Score {
            inputs,
            config,
            pip_size,
            tick_size,
            output_dir,
            format,
            telemetry,
        } => run_score(
            &inputs,
            config.as_deref(),
            pip_size,
            tick_size,
            &output_dir,
            format,
            telemetry,
        ),
        Commands::Synth {
            bars,
            seed,
            symbol,
            output,
        } => run_synth(bars, seed, symbol, &output),
        Commands::Config => {
            print!("{}", EngineConfig::default().to_toml_string()?);
            Ok(())
        }
    }
}

// ─── score ──────────────────────────────────────────────────────────

/// Per-file outcome printed after all files are scored.
struct ScoreSummary {
    symbol: String,
    bars: usize,
    warmup: usize,
    last_combined: f64,
    last_confidence: f64,
    advisories: usize,
    digest: String,
    output: PathBuf,
}

fn run_score(
    inputs: &[PathBuf],
    config_path: Option<&Path>,
    pip_size: f64,
    tick_size: f64,
    output_dir: &Path,
    format: OutputFormat,
    telemetry: bool,
) -> Result<()> {
    let config = match config_path {
        Some(path) => EngineConfig::from_toml_file(path)?,
        None => EngineConfig::default(),
    };
    info!(config_hash = config.config_hash().short(), files = inputs.len(), "scoring");

    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create {}", output_dir.display()))?;

    // One engine per file; nothing is shared between workers.
    let results: Vec<(PathBuf, Result<ScoreSummary>)> = inputs
        .par_iter()
        .map(|path| {
            let result = score_file(path, &config, pip_size, tick_size, output_dir, format, telemetry);
            (path.clone(), result)
        })
        .collect();

    println!(
        "{:<10} {:>8} {:>7} {:>9} {:>7} {:>6}  {:<12}  Output",
        "Symbol", "Bars", "Warmup", "Combined", "Conf%", "Alerts", "Digest"
    );
    println!("{}", "-".repeat(80));

    let mut failures = 0;
    for (path, result) in results {
        match result {
            Ok(s) => println!(
                "{:<10} {:>8} {:>7} {:>+9.3} {:>7.1} {:>6}  {:<12}  {}",
                s.symbol,
                s.bars,
                s.warmup,
                s.last_combined,
                s.last_confidence * 100.0,
                s.advisories,
                &s.digest[..12.min(s.digest.len())],
                s.output.display()
            ),
            Err(e) => {
                failures += 1;
                error!(file = %path.display(), "{e:#}");
            }
        }
    }

    if failures > 0 {
        bail!("{failures} of {} file(s) failed", inputs.len());
    }
    Ok(())
}

/// Collects evaluations and optionally forwards them to the telemetry sink.
struct CliSink {
    collected: VecSink,
    telemetry: Option<TracingSink>,
}

impl OutputSink for CliSink {
    fn on_evaluation(&mut self, bar: &Bar, eval: &Evaluation, is_last: bool) {
        self.collected.on_evaluation(bar, eval, is_last);
        if let Some(telemetry) = self.telemetry.as_mut() {
            telemetry.on_evaluation(bar, eval, is_last);
        }
    }
}

fn score_file(
    path: &Path,
    config: &EngineConfig,
    pip_size: f64,
    tick_size: f64,
    output_dir: &Path,
    format: OutputFormat,
    telemetry: bool,
) -> Result<ScoreSummary> {
    let symbol = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("UNKNOWN")
        .to_string();
    let bars = read_bars(path)?;

    let instrument = Instrument::new(symbol.clone(), tick_size, Some(pip_size));
    let mut engine = ScoreEngine::new(config.clone(), instrument)?;
    let mut sink = CliSink {
        collected: VecSink::new(),
        telemetry: telemetry.then(|| TracingSink::new(symbol.clone())),
    };
    drive(&mut engine, &bars, &mut sink)
        .with_context(|| format!("failed to score {}", path.display()))?;

    let output = output_dir.join(format!("{symbol}.{}", format.extension()));
    let evals = &sink.collected.evaluations;
    match format {
        OutputFormat::Jsonl => write_jsonl(&output, evals)?,
        OutputFormat::Csv => write_csv(&output, evals)?,
    }

    let last = engine.last_frame();
    Ok(ScoreSummary {
        symbol,
        bars: bars.len(),
        warmup: engine.warmup(),
        last_combined: last.map_or(0.0, |f| f.combined_score),
        last_confidence: last.map_or(0.0, |f| f.confidence),
        advisories: evals.iter().filter(|e| e.advisory.is_some()).count(),
        digest: engine.digest().0,
        output,
    })
}

// ─── bar I/O ────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct BarRow {
    open_time: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    #[serde(default)]
    volume: f64,
}

const TIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y.%m.%d %H:%M",
];

fn parse_open_time(s: &str) -> Result<NaiveDateTime> {
    let s = s.trim();
    TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .with_context(|| format!("unrecognized open_time '{s}'"))
}

fn read_bars(path: &Path) -> Result<Vec<Bar>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;

    let mut bars = Vec::new();
    for (line, row) in reader.deserialize::<BarRow>().enumerate() {
        let row = row.with_context(|| format!("{}: bad row {}", path.display(), line + 1))?;
        bars.push(Bar {
            open_time: parse_open_time(&row.open_time)
                .with_context(|| format!("{}: row {}", path.display(), line + 1))?,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            volume: row.volume,
        });
    }
    Ok(bars)
}

fn write_jsonl(path: &Path, evals: &[Evaluation]) -> Result<()> {
    let file = File::create(path).with_context(|| format!("failed to create {}", path.display()))?;
    let mut out = BufWriter::new(file);
    for eval in evals {
        serde_json::to_writer(&mut out, eval)?;
        out.write_all(b"\n")?;
    }
    out.flush()?;
    Ok(())
}

fn write_csv(path: &Path, evals: &[Evaluation]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    wtr.write_record([
        "index",
        "open_time",
        "warm",
        "rsi_score",
        "stoch_rsi_score",
        "macd_score",
        "ema_score",
        "mfi_score",
        "combined_score",
        "confidence",
        "threshold_pos",
        "threshold_neg",
        "rsi",
        "stoch_k",
        "stoch_d",
        "macd_line",
        "macd_signal",
        "macd_histogram",
        "ema_fast",
        "ema_slow",
        "mfi",
        "atr",
        "sl_pips",
        "tp1_pips",
        "tp2_pips",
        "tp3_pips",
        "sl_price",
        "tp1_price",
        "tp2_price",
        "tp3_price",
        "advisory",
    ])?;

    for eval in evals {
        let f = &eval.frame;
        let mut record = vec![
            f.index.to_string(),
            f.open_time.format("%Y-%m-%d %H:%M:%S").to_string(),
            f.warm.to_string(),
            format!("{:.6}", f.rsi_score),
            format!("{:.6}", f.stoch_rsi_score),
            format!("{:.6}", f.macd_score),
            format!("{:.6}", f.ema_score),
            format!("{:.6}", f.mfi_score),
            format!("{:.6}", f.combined_score),
            format!("{:.6}", f.confidence),
            format!("{:.4}", f.threshold_pos),
            format!("{:.4}", f.threshold_neg),
        ];
        let r = &eval.raw;
        record.extend([
            opt(r.rsi, 4),
            format!("{:.4}", r.stoch_k),
            format!("{:.4}", r.stoch_d),
            format!("{:.8}", r.macd_line),
            format!("{:.8}", r.macd_signal),
            format!("{:.8}", r.macd_histogram),
            format!("{:.8}", r.ema_fast),
            format!("{:.8}", r.ema_slow),
            opt(r.mfi, 4),
            opt(r.atr, 8),
        ]);
        match &eval.levels {
            Some(l) => record.extend([
                format!("{:.2}", l.sl.pips),
                format!("{:.2}", l.tp1.pips),
                format!("{:.2}", l.tp2.pips),
                format!("{:.2}", l.tp3.pips),
                format!("{:.8}", l.sl.price),
                format!("{:.8}", l.tp1.price),
                format!("{:.8}", l.tp2.price),
                format!("{:.8}", l.tp3.price),
            ]),
            None => record.extend(std::iter::repeat(String::new()).take(8)),
        }
        record.push(eval.advisory.map(|a| a.side.to_string()).unwrap_or_default());
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}

fn opt(value: Option<f64>, decimals: usize) -> String {
    value.map_or_else(String::new, |v| format!("{v:.decimals$}"))
}

// ─── synth ──────────────────────────────────────────────────────────

fn run_synth(bars: usize, seed: u64, symbol: String, output: &Path) -> Result<()> {
    let config = SynthConfig::new(symbol, bars, seed);
    let generated = generate_bars(&config);

    let mut wtr = csv::Writer::from_path(output)
        .with_context(|| format!("failed to create {}", output.display()))?;
    for bar in &generated {
        wtr.serialize(bar)?;
    }
    wtr.flush()?;

    println!(
        "Wrote {} bars for {} (seed {}) to {}",
        generated.len(),
        config.symbol,
        seed,
        output.display()
    );
    Ok(())
}
