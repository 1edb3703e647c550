//! Configuration loading and validation.
//!
//! Reads the `[series]` section and every `[indicator.<name>]` section of a
//! [`ConfigPort`], rejecting missing or malformed values before any series or
//! indicator is built.
//!
//! ```ini
//! [series]
//! name = BHP.AX
//! cache = recent
//! cache_capacity = 512
//!
//! [indicator.trend]
//! kind = ema
//! input = close
//! period = 20
//! ```

use crate::domain::bar_series::BarSeries;
use crate::domain::cache::CacheStrategy;
use crate::domain::error::SamtaError;
use crate::domain::indicator::bollinger::{DEFAULT_MULTIPLIER_X100, DEFAULT_PERIOD};
use crate::domain::indicator::macd::{DEFAULT_FAST, DEFAULT_SLOW};
use crate::domain::indicator::{BandKind, IndicatorType};
use crate::domain::indicator_set::IndicatorDefinition;
use crate::domain::num::Numeric;
use crate::domain::price_source::PriceSource;
use crate::ports::config_port::ConfigPort;
use tracing::info;

pub const SERIES_SECTION: &str = "series";
pub const INDICATOR_PREFIX: &str = "indicator.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesConfig {
    pub name: Option<String>,
    pub cache: CacheStrategy,
}

impl SeriesConfig {
    pub fn new_series<N: Numeric>(&self) -> BarSeries<N> {
        let series = BarSeries::new(self.cache);
        match &self.name {
            Some(name) => series.with_name(name.clone()),
            None => series,
        }
    }
}

pub fn load_series_config(config: &dyn ConfigPort) -> Result<SeriesConfig, SamtaError> {
    let name = config
        .get_string(SERIES_SECTION, "name")
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());
    let cache = match load_cache_strategy(config, SERIES_SECTION)? {
        Some(cache) => cache,
        None => {
            info!("no [series] cache configured, keeping every computed value");
            CacheStrategy::Unbounded
        }
    };
    Ok(SeriesConfig { name, cache })
}

/// One definition per `[indicator.<name>]` section, sorted by name.
pub fn load_indicator_definitions(
    config: &dyn ConfigPort,
) -> Result<Vec<IndicatorDefinition>, SamtaError> {
    let mut sections: Vec<String> = config
        .sections()
        .into_iter()
        .filter(|s| s.starts_with(INDICATOR_PREFIX))
        .collect();
    sections.sort();

    sections
        .iter()
        .map(|section| load_indicator_definition(config, section))
        .collect()
}

fn load_indicator_definition(
    config: &dyn ConfigPort,
    section: &str,
) -> Result<IndicatorDefinition, SamtaError> {
    let name = section[INDICATOR_PREFIX.len()..].trim();
    if name.is_empty() {
        return Err(SamtaError::ConfigInvalid {
            section: section.to_string(),
            key: "name".to_string(),
            reason: "indicator name must not be empty".to_string(),
        });
    }

    let kind = required_string(config, section, "kind")?;
    let kind = parse_kind(config, section, &kind)?;

    let inputs = match kind.arity() {
        0 => Vec::new(),
        1 => vec![
            config
                .get_string(section, "input")
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "close".to_string()),
        ],
        _ => vec![
            required_string(config, section, "left")?,
            required_string(config, section, "right")?,
        ],
    };

    Ok(IndicatorDefinition {
        name: name.to_string(),
        kind,
        inputs,
        cache: load_cache_strategy(config, section)?,
    })
}

fn parse_kind(
    config: &dyn ConfigPort,
    section: &str,
    kind: &str,
) -> Result<IndicatorType, SamtaError> {
    let period = || read_count(config, section, "period", None);
    let kind = match kind.to_ascii_lowercase().as_str() {
        "price" => {
            let source = config
                .get_string(section, "source")
                .unwrap_or_else(|| "close".to_string());
            let source: PriceSource =
                source
                    .parse()
                    .map_err(|reason| SamtaError::ConfigInvalid {
                        section: section.to_string(),
                        key: "source".to_string(),
                        reason,
                    })?;
            IndicatorType::Price(source)
        }
        "const" | "constant" => IndicatorType::Constant(required_string(config, section, "value")?),
        "prev" | "previous" => IndicatorType::Previous(read_count(config, section, "n", Some(1))?),
        "add" => IndicatorType::Add,
        "sub" | "subtract" => IndicatorType::Subtract,
        "mul" | "multiply" => IndicatorType::Multiply,
        "div" | "divide" => IndicatorType::Divide,
        "min" => IndicatorType::Min,
        "max" => IndicatorType::Max,
        "abs" => IndicatorType::Abs,
        "neg" | "negate" => IndicatorType::Negate,
        "square" => IndicatorType::Square,
        "sqrt" => IndicatorType::Sqrt,
        "sum" => IndicatorType::Sum(period()?),
        "sma" => IndicatorType::Sma(period()?),
        "ema" => IndicatorType::Ema(period()?),
        "wilder" | "wwma" => IndicatorType::Wilder(period()?),
        "wma" => IndicatorType::Wma(period()?),
        "var" | "variance" => IndicatorType::Variance {
            period: period()?,
            unbiased: config.get_bool(section, "unbiased", false),
        },
        "stddev" => IndicatorType::Stddev {
            period: period()?,
            unbiased: config.get_bool(section, "unbiased", false),
        },
        "bollinger" | "bb" => IndicatorType::Bollinger {
            period: read_count(config, section, "period", Some(DEFAULT_PERIOD))?,
            stddev_mult_x100: read_multiplier(config, section)?,
            band: read_band(config, section)?,
        },
        "tr" | "true_range" => IndicatorType::TrueRange,
        "atr" => IndicatorType::Atr(period()?),
        "gain" => IndicatorType::Gain,
        "loss" => IndicatorType::Loss,
        "rsi" => IndicatorType::Rsi(period()?),
        "roc" => IndicatorType::Roc(period()?),
        "macd" => IndicatorType::Macd {
            fast: read_count(config, section, "fast", Some(DEFAULT_FAST))?,
            slow: read_count(config, section, "slow", Some(DEFAULT_SLOW))?,
        },
        "obv" => IndicatorType::Obv,
        other => {
            return Err(SamtaError::ConfigInvalid {
                section: section.to_string(),
                key: "kind".to_string(),
                reason: format!("unknown indicator kind '{}'", other),
            });
        }
    };
    Ok(kind)
}

fn load_cache_strategy(
    config: &dyn ConfigPort,
    section: &str,
) -> Result<Option<CacheStrategy>, SamtaError> {
    let Some(cache) = config.get_string(section, "cache") else {
        return Ok(None);
    };
    match cache.trim().to_ascii_lowercase().as_str() {
        "unbounded" => Ok(Some(CacheStrategy::Unbounded)),
        "recent" => {
            let capacity = read_count(config, section, "cache_capacity", None)?;
            CacheStrategy::recent(capacity)
                .map(Some)
                .map_err(|_| SamtaError::ConfigInvalid {
                    section: section.to_string(),
                    key: "cache_capacity".to_string(),
                    reason: "cache_capacity must be at least 1".to_string(),
                })
        }
        other => Err(SamtaError::ConfigInvalid {
            section: section.to_string(),
            key: "cache".to_string(),
            reason: format!("unknown cache strategy '{}'", other),
        }),
    }
}

fn required_string(config: &dyn ConfigPort, section: &str, key: &str) -> Result<String, SamtaError> {
    match config.get_string(section, key) {
        Some(s) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        _ => Err(SamtaError::ConfigMissing {
            section: section.to_string(),
            key: key.to_string(),
        }),
    }
}

/// Positive integer value; `default` is used when the key is absent.
fn read_count(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: Option<usize>,
) -> Result<usize, SamtaError> {
    let raw = match (config.get_string(section, key), default) {
        (Some(raw), _) => raw,
        (None, Some(default)) => return Ok(default),
        (None, None) => {
            return Err(SamtaError::ConfigMissing {
                section: section.to_string(),
                key: key.to_string(),
            });
        }
    };
    match raw.trim().parse::<usize>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(SamtaError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: format!("{} must be a positive integer", key),
        }),
    }
}

fn read_multiplier(config: &dyn ConfigPort, section: &str) -> Result<u32, SamtaError> {
    let value = config.get_double(section, "multiplier", DEFAULT_MULTIPLIER_X100 as f64 / 100.0);
    let scaled = (value * 100.0).round();
    if !(1.0..=u32::MAX as f64).contains(&scaled) {
        return Err(SamtaError::ConfigInvalid {
            section: section.to_string(),
            key: "multiplier".to_string(),
            reason: "multiplier must be positive".to_string(),
        });
    }
    Ok(scaled as u32)
}

fn read_band(config: &dyn ConfigPort, section: &str) -> Result<BandKind, SamtaError> {
    match required_string(config, section, "band")?
        .to_ascii_lowercase()
        .as_str()
    {
        "upper" => Ok(BandKind::Upper),
        "middle" => Ok(BandKind::Middle),
        "lower" => Ok(BandKind::Lower),
        other => Err(SamtaError::ConfigInvalid {
            section: section.to_string(),
            key: "band".to_string(),
            reason: format!("unknown band '{}', expected upper, middle or lower", other),
        }),
    }
}
