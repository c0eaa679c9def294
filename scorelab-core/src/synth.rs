//! Deterministic synthetic bars for demos, benches, and tests.
//!
//! The walk is seeded through BLAKE3 of `(seed, symbol)`, so every symbol
//! gets an independent but reproducible series regardless of the order in
//! which series are generated.

use crate::domain::Bar;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[derive(Debug, Clone)]
pub struct SynthConfig {
    pub symbol: String,
    pub bars: usize,
    pub seed: u64,
    pub start: NaiveDateTime,
    pub interval: Duration,
    pub start_price: f64,
    /// Per-bar standard deviation of the relative close change.
    pub volatility: f64,
    /// Per-bar mean relative close change.
    pub drift: f64,
}

impl SynthConfig {
    /// One-minute FX-like bars around 1.1000.
    pub fn new(symbol: impl Into<String>, bars: usize, seed: u64) -> Self {
        let start = NaiveDate::from_ymd_opt(2024, 1, 2)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap_or_default();
        Self {
            symbol: symbol.into(),
            bars,
            seed,
            start,
            interval: Duration::minutes(1),
            start_price: 1.1,
            volatility: 0.0004,
            drift: 0.0,
        }
    }
}

/// Sub-seed for `symbol` under a master `seed`.
pub fn derive_seed(seed: u64, symbol: &str) -> u64 {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&seed.to_le_bytes());
    hasher.update(symbol.as_bytes());
    let hash = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&hash.as_bytes()[..8]);
    u64::from_le_bytes(bytes)
}

/// Standard normal draw (Box-Muller).
fn standard_normal(rng: &mut StdRng) -> f64 {
    let u1: f64 = rng.gen_range(f64::EPSILON..1.0);
    let u2: f64 = rng.gen();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

/// Geometric random walk with wicks and a tick-count volume proxy.
pub fn generate_bars(config: &SynthConfig) -> Vec<Bar> {
    let mut rng = StdRng::seed_from_u64(derive_seed(config.seed, &config.symbol));
    let mut bars = Vec::with_capacity(config.bars);
    let mut prev_close = config.start_price;

    for i in 0..config.bars {
        let open = prev_close;
        let change = config.drift + config.volatility * standard_normal(&mut rng);
        let close = (open * (1.0 + change)).max(f64::MIN_POSITIVE);
        let upper_wick = open.max(close) * config.volatility * rng.gen::<f64>();
        let lower_wick = open.min(close) * config.volatility * rng.gen::<f64>();
        bars.push(Bar {
            open_time: config.start + config.interval * i as i32,
            open,
            high: open.max(close) + upper_wick,
            low: (open.min(close) - lower_wick).max(0.0),
            close,
            volume: rng.gen_range(20..=400) as f64,
        });
        prev_close = close;
    }
    bars
}
