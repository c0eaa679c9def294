//! Serializable engine configuration.
//!
//! Every section has defaults, so a TOML file only needs the keys it
//! changes:
//!
//! ```toml
//! signal_threshold_pct = 60.0
//!
//! [macd]
//! fast = 8
//! slow = 21
//!
//! [pip_size]
//! mode = "override"
//! value = 0.01
//! ```

use crate::domain::ConfigHash;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RsiConfig {
    pub period: usize,
}

impl Default for RsiConfig {
    fn default() -> Self {
        Self { period: 14 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StochRsiConfig {
    pub rsi_len: usize,
    pub stoch_len: usize,
    pub k_smooth: usize,
    pub d_smooth: usize,
}

impl Default for StochRsiConfig {
    fn default() -> Self {
        Self {
            rsi_len: 14,
            stoch_len: 14,
            k_smooth: 3,
            d_smooth: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MacdConfig {
    pub fast: usize,
    pub slow: usize,
    pub signal: usize,
}

impl Default for MacdConfig {
    fn default() -> Self {
        Self {
            fast: 12,
            slow: 26,
            signal: 9,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmaCrossConfig {
    pub fast_len: usize,
    pub slow_len: usize,
}

impl Default for EmaCrossConfig {
    fn default() -> Self {
        Self {
            fast_len: 9,
            slow_len: 21,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MfiConfig {
    pub length: usize,
}

impl Default for MfiConfig {
    fn default() -> Self {
        Self { length: 14 }
    }
}

/// ATR length and the ATR multiples for the advisory levels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelsConfig {
    pub atr_len: usize,
    pub tp1_mult: f64,
    pub tp2_mult: f64,
    pub tp3_mult: f64,
    pub sl_mult: f64,
}

impl Default for LevelsConfig {
    fn default() -> Self {
        Self {
            atr_len: 14,
            tp1_mult: 1.5,
            tp2_mult: 2.5,
            tp3_mult: 4.0,
            sl_mult: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipSizeMode {
    /// Instrument pip size, else its tick size.
    Auto,
    /// `PipSizeConfig::value`, when positive.
    Override,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipSizeConfig {
    pub mode: PipSizeMode,
    pub value: f64,
}

impl Default for PipSizeConfig {
    fn default() -> Self {
        Self {
            mode: PipSizeMode::Auto,
            value: 0.0001,
        }
    }
}

/// Complete configuration of one scoring engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Minimum confidence (percent) before an advisory is emitted.
    pub signal_threshold_pct: f64,
    pub rsi: RsiConfig,
    pub stoch_rsi: StochRsiConfig,
    pub macd: MacdConfig,
    pub ema_cross: EmaCrossConfig,
    pub mfi: MfiConfig,
    pub levels: LevelsConfig,
    pub pip_size: PipSizeConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            signal_threshold_pct: 55.0,
            rsi: RsiConfig::default(),
            stoch_rsi: StochRsiConfig::default(),
            macd: MacdConfig::default(),
            ema_cross: EmaCrossConfig::default(),
            mfi: MfiConfig::default(),
            levels: LevelsConfig::default(),
            pip_size: PipSizeConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check every period and multiplier before any indicator is built.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let periods = [
            ("rsi.period", self.rsi.period),
            ("stoch_rsi.rsi_len", self.stoch_rsi.rsi_len),
            ("stoch_rsi.stoch_len", self.stoch_rsi.stoch_len),
            ("stoch_rsi.k_smooth", self.stoch_rsi.k_smooth),
            ("stoch_rsi.d_smooth", self.stoch_rsi.d_smooth),
            ("macd.fast", self.macd.fast),
            ("macd.slow", self.macd.slow),
            ("macd.signal", self.macd.signal),
            ("ema_cross.fast_len", self.ema_cross.fast_len),
            ("ema_cross.slow_len", self.ema_cross.slow_len),
            ("mfi.length", self.mfi.length),
            ("levels.atr_len", self.levels.atr_len),
        ];
        if let Some(&(name, _)) = periods.iter().find(|(_, p)| *p == 0) {
            return Err(ConfigError::ZeroPeriod(name));
        }

        if self.macd.fast >= self.macd.slow {
            return Err(ConfigError::MacdOrder {
                fast: self.macd.fast,
                slow: self.macd.slow,
            });
        }

        if self.ema_cross.fast_len >= self.ema_cross.slow_len {
            return Err(ConfigError::EmaCrossOrder {
                fast: self.ema_cross.fast_len,
                slow: self.ema_cross.slow_len,
            });
        }

        let multipliers = [
            ("levels.tp1_mult", self.levels.tp1_mult),
            ("levels.tp2_mult", self.levels.tp2_mult),
            ("levels.tp3_mult", self.levels.tp3_mult),
            ("levels.sl_mult", self.levels.sl_mult),
        ];
        for (name, value) in multipliers {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::NonPositiveMultiplier { name, value });
            }
        }

        if !(0.0..=100.0).contains(&self.signal_threshold_pct) {
            return Err(ConfigError::ThresholdOutOfRange(self.signal_threshold_pct));
        }

        if self.pip_size.mode == PipSizeMode::Override
            && !(self.pip_size.value.is_finite() && self.pip_size.value > 0.0)
        {
            return Err(ConfigError::InvalidPipOverride(self.pip_size.value));
        }

        Ok(())
    }

    /// Normalized threshold line, `signal_threshold_pct / 100`.
    pub fn threshold(&self) -> f64 {
        self.signal_threshold_pct / 100.0
    }

    /// Exact identity of this configuration, for replay bookkeeping.
    pub fn config_hash(&self) -> ConfigHash {
        // Struct fields serialize in declaration order, so the JSON is canonical.
        let json = serde_json::to_string(self).expect("EngineConfig must serialize");
        ConfigHash::from_bytes(json.as_bytes())
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be >= 1")]
    ZeroPeriod(&'static str),

    #[error("macd.fast ({fast}) must be less than macd.slow ({slow})")]
    MacdOrder { fast: usize, slow: usize },

    #[error("ema_cross.fast_len ({fast}) must be less than ema_cross.slow_len ({slow})")]
    EmaCrossOrder { fast: usize, slow: usize },

    #[error("{name} must be a positive finite number, got {value}")]
    NonPositiveMultiplier { name: &'static str, value: f64 },

    #[error("signal_threshold_pct must be within 0..=100, got {0}")]
    ThresholdOutOfRange(f64),

    #[error("pip_size.value must be positive in override mode, got {0}")]
    InvalidPipOverride(f64),

    #[error("failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}
