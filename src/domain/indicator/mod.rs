//! Technical indicators.
//!
//! Every indicator is a pure function of bar index over one [`BarSeries`]:
//! `value(i)` reads only bars `0..=i`, either directly or through upstream
//! indicators bound to the same series. A call takes one [`SeriesSnapshot`]
//! and evaluates the whole dependency chain against it via `value_at`.
//!
//! - Cacheless: price, constant, previous, arithmetic operations
//! - Cached: windowed statistics and oscillators, memoised per index
//! - Recursive: EMA family and OBV, filled forward from the latest cached value
//!
//! `IndicatorType` names an indicator kind with its parameters and is the key
//! used by [`IndicatorSet`](crate::domain::indicator_set::IndicatorSet).

pub mod bollinger;
pub mod constant;
pub mod crossed;
pub mod ema;
pub mod macd;
pub mod obv;
pub mod operation;
pub mod previous;
pub mod price;
pub mod roc;
pub mod rsi;
pub mod sma;
pub mod stddev;
pub mod sum;
pub mod true_range;
pub mod wma;

use crate::domain::bar_series::{BarSeries, SeriesSnapshot};
use crate::domain::cache::CacheStrategy;
use crate::domain::error::{Result, SamtaError};
use crate::domain::num::Numeric;
use crate::domain::price_source::PriceSource;
use std::fmt;
use std::sync::Arc;

pub trait Indicator<N: Numeric>: Send + Sync + fmt::Debug {
    type Output: Clone + Send + Sync + 'static;

    /// The series every value of this indicator is computed from.
    fn series(&self) -> &Arc<BarSeries<N>>;

    /// First index at which the output no longer depends on missing history.
    fn unstable_bound(&self) -> usize;

    /// Value at `index` against an already captured snapshot. `index` must be
    /// within the snapshot.
    fn value_at(&self, snapshot: &SeriesSnapshot<'_, N>, index: usize) -> Result<Self::Output>;

    fn label(&self) -> String;

    /// Retention policy of this indicator's own values; `None` when cacheless.
    fn cache_strategy(&self) -> Option<CacheStrategy> {
        None
    }

    fn value(&self, index: usize) -> Result<Self::Output> {
        let snapshot = self.series().snapshot();
        snapshot.check_index(index)?;
        self.value_at(&snapshot, index)
    }

    fn is_stable_at(&self, index: usize) -> bool {
        index >= self.unstable_bound()
    }
}

/// Shared handle to a numeric indicator.
pub type NumIndicator<N> = Arc<dyn Indicator<N, Output = N>>;

/// Moving average flavour used by composite indicators (RSI, ATR, MACD, bands).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MovingAverageKind {
    #[default]
    Simple,
    Exponential,
    Wilder,
    Weighted,
}

impl MovingAverageKind {
    pub fn build<N: Numeric>(self, input: NumIndicator<N>, period: usize) -> Result<NumIndicator<N>> {
        let strategy = input.series().cache_strategy();
        self.build_cached(input, period, strategy)
    }

    pub fn build_cached<N: Numeric>(
        self,
        input: NumIndicator<N>,
        period: usize,
        strategy: CacheStrategy,
    ) -> Result<NumIndicator<N>> {
        let ma: NumIndicator<N> = match self {
            MovingAverageKind::Simple => Arc::new(sma::Sma::new(input, period)?.with_cache(strategy)),
            MovingAverageKind::Exponential => {
                Arc::new(ema::Ema::new(input, period)?.with_cache(strategy))
            }
            MovingAverageKind::Wilder => {
                Arc::new(ema::Ema::wilder(input, period)?.with_cache(strategy))
            }
            MovingAverageKind::Weighted => Arc::new(wma::Wma::new(input, period)?.with_cache(strategy)),
        };
        Ok(ma)
    }
}

impl std::str::FromStr for MovingAverageKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sma" | "simple" => Ok(Self::Simple),
            "ema" | "exponential" => Ok(Self::Exponential),
            "wilder" | "wwma" => Ok(Self::Wilder),
            "wma" | "weighted" => Ok(Self::Weighted),
            other => Err(format!("unknown moving average '{other}'")),
        }
    }
}

/// Which line of a Bollinger Bands computation to expose as a scalar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BandKind {
    Upper,
    Middle,
    Lower,
}

impl fmt::Display for BandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BandKind::Upper => write!(f, "UPPER"),
            BandKind::Middle => write!(f, "MIDDLE"),
            BandKind::Lower => write!(f, "LOWER"),
        }
    }
}

/// Indicator kind plus parameters, as used in indicator definitions.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Price(PriceSource),
    /// Raw decimal text, parsed into the series' numeric type at build time.
    Constant(String),
    Previous(usize),
    Add,
    Subtract,
    Multiply,
    Divide,
    Min,
    Max,
    Abs,
    Negate,
    Square,
    Sqrt,
    Sum(usize),
    Sma(usize),
    Ema(usize),
    Wilder(usize),
    Wma(usize),
    Variance {
        period: usize,
        unbiased: bool,
    },
    Stddev {
        period: usize,
        unbiased: bool,
    },
    Bollinger {
        period: usize,
        stddev_mult_x100: u32,
        band: BandKind,
    },
    TrueRange,
    Atr(usize),
    Gain,
    Loss,
    Rsi(usize),
    Macd {
        fast: usize,
        slow: usize,
    },
    Roc(usize),
    Obv,
}

impl IndicatorType {
    /// Number of upstream indicators this kind consumes.
    pub fn arity(&self) -> usize {
        match self {
            IndicatorType::Price(_)
            | IndicatorType::Constant(_)
            | IndicatorType::TrueRange
            | IndicatorType::Atr(_)
            | IndicatorType::Obv => 0,
            IndicatorType::Add
            | IndicatorType::Subtract
            | IndicatorType::Multiply
            | IndicatorType::Divide
            | IndicatorType::Min
            | IndicatorType::Max => 2,
            _ => 1,
        }
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Price(source) => write!(f, "{}", source),
            IndicatorType::Constant(value) => write!(f, "CONST({})", value),
            IndicatorType::Previous(n) => write!(f, "PREV({})", n),
            IndicatorType::Add => write!(f, "ADD"),
            IndicatorType::Subtract => write!(f, "SUB"),
            IndicatorType::Multiply => write!(f, "MUL"),
            IndicatorType::Divide => write!(f, "DIV"),
            IndicatorType::Min => write!(f, "MIN"),
            IndicatorType::Max => write!(f, "MAX"),
            IndicatorType::Abs => write!(f, "ABS"),
            IndicatorType::Negate => write!(f, "NEG"),
            IndicatorType::Square => write!(f, "SQUARE"),
            IndicatorType::Sqrt => write!(f, "SQRT"),
            IndicatorType::Sum(period) => write!(f, "SUM({})", period),
            IndicatorType::Sma(period) => write!(f, "SMA({})", period),
            IndicatorType::Ema(period) => write!(f, "EMA({})", period),
            IndicatorType::Wilder(period) => write!(f, "WILDER({})", period),
            IndicatorType::Wma(period) => write!(f, "WMA({})", period),
            IndicatorType::Variance { period, unbiased } => {
                write!(f, "VAR({}{})", period, if *unbiased { ",unbiased" } else { "" })
            }
            IndicatorType::Stddev { period, unbiased } => {
                write!(f, "STDDEV({}{})", period, if *unbiased { ",unbiased" } else { "" })
            }
            IndicatorType::Bollinger {
                period,
                stddev_mult_x100,
                band,
            } => {
                let mult = *stddev_mult_x100 as f64 / 100.0;
                write!(f, "BOLLINGER({},{},{})", period, mult, band)
            }
            IndicatorType::TrueRange => write!(f, "TR"),
            IndicatorType::Atr(period) => write!(f, "ATR({})", period),
            IndicatorType::Gain => write!(f, "GAIN"),
            IndicatorType::Loss => write!(f, "LOSS"),
            IndicatorType::Rsi(period) => write!(f, "RSI({})", period),
            IndicatorType::Macd { fast, slow } => write!(f, "MACD({},{})", fast, slow),
            IndicatorType::Roc(period) => write!(f, "ROC({})", period),
            IndicatorType::Obv => write!(f, "OBV"),
        }
    }
}

pub(crate) fn ensure_positive(name: &str, value: usize) -> Result<()> {
    if value == 0 {
        return Err(SamtaError::configuration(format!(
            "'{name}' must be greater than zero"
        )));
    }
    Ok(())
}

/// Fails unless both indicators read the same series instance.
pub(crate) fn ensure_same_series<N: Numeric>(
    first: &Arc<BarSeries<N>>,
    second: &Arc<BarSeries<N>>,
) -> Result<()> {
    if Arc::ptr_eq(first, second) {
        return Ok(());
    }
    Err(SamtaError::configuration(format!(
        "inputs belong to different series ({} and {})",
        first.name().unwrap_or("unnamed"),
        second.name().unwrap_or("unnamed")
    )))
}

/// First index of a window of `period` values ending at `index`, clamped to 0.
pub(crate) fn window_start(index: usize, period: usize) -> usize {
    (index + 1).saturating_sub(period)
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn indicator_type_display_sma() {
        assert_eq!(IndicatorType::Sma(20).to_string(), "SMA(20)");
    }

    #[test]
    fn indicator_type_display_macd() {
        let macd = IndicatorType::Macd { fast: 12, slow: 26 };
        assert_eq!(macd.to_string(), "MACD(12,26)");
    }

    #[test]
    fn indicator_type_display_bollinger() {
        let boll = IndicatorType::Bollinger {
            period: 20,
            stddev_mult_x100: 200,
            band: BandKind::Upper,
        };
        assert_eq!(boll.to_string(), "BOLLINGER(20,2,UPPER)");
    }

    #[test]
    fn indicator_type_display_price() {
        assert_eq!(IndicatorType::Price(PriceSource::HLC3).to_string(), "HLC3");
    }

    #[test]
    fn indicator_type_arity() {
        assert_eq!(IndicatorType::Obv.arity(), 0);
        assert_eq!(IndicatorType::Ema(3).arity(), 1);
        assert_eq!(IndicatorType::Divide.arity(), 2);
    }

    #[test]
    fn indicator_type_hash_eq() {
        use std::collections::HashMap;

        let mut map = HashMap::new();
        let sma20 = IndicatorType::Sma(20);
        let sma50 = IndicatorType::Sma(50);
        let macd = IndicatorType::Macd { fast: 12, slow: 26 };

        map.insert(sma20.clone(), "sma20");
        map.insert(sma50.clone(), "sma50");
        map.insert(macd.clone(), "macd");

        assert_eq!(map.get(&sma20), Some(&"sma20"));
        assert_eq!(map.get(&macd), Some(&"macd"));
        assert_eq!(map.get(&IndicatorType::Sma(20)), Some(&"sma20"));
    }

    #[test]
    fn moving_average_kind_parse_and_build() {
        assert_eq!(
            "wilder".parse::<MovingAverageKind>(),
            Ok(MovingAverageKind::Wilder)
        );
        assert!("hull".parse::<MovingAverageKind>().is_err());

        let series = make_bars(&[1.0, 2.0, 3.0]);
        let ma = MovingAverageKind::Weighted.build(close(&series), 2).unwrap();
        assert_eq!(ma.label(), "WMA(2)");
        assert_eq!(ma.cache_strategy(), Some(CacheStrategy::Unbounded));

        let recent = CacheStrategy::recent(2).unwrap();
        let ma = MovingAverageKind::Wilder
            .build_cached(close(&series), 2, recent)
            .unwrap();
        assert_eq!(ma.cache_strategy(), Some(recent));
        assert_eq!(close(&series).cache_strategy(), None);
    }

    #[test]
    fn window_start_clamps_to_zero() {
        assert_eq!(window_start(0, 3), 0);
        assert_eq!(window_start(1, 3), 0);
        assert_eq!(window_start(2, 3), 0);
        assert_eq!(window_start(5, 3), 3);
    }

    #[test]
    fn value_out_of_bounds() {
        let series = make_bars(&[1.0, 2.0]);
        let c = close(&series);
        assert!(matches!(
            c.value(2),
            Err(SamtaError::OutOfBounds {
                index: 2,
                length: 2
            })
        ));
    }

    #[test]
    fn mismatched_series_rejected() {
        let a = make_bars(&[1.0]);
        let b = make_bars(&[1.0]);
        assert!(ensure_same_series(&a, &a).is_ok());
        assert!(matches!(
            ensure_same_series(&a, &b),
            Err(SamtaError::Configuration { .. })
        ));
    }
}
