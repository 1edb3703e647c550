//! MACD (Moving Average Convergence Divergence) indicator.
//!
//! MACD Line = EMA(fast) - EMA(slow)
//! Signal Line = EMA(signal) of MACD Line
//! Histogram = MACD Line - Signal Line
//!
//! Default parameters: fast=12, slow=26, signal=9

use crate::domain::bar_series::{BarSeries, SeriesSnapshot};
use crate::domain::cache::{CacheStrategy, IndicatorCache};
use crate::domain::error::Result;
use crate::domain::indicator::ema::Ema;
use crate::domain::indicator::operation::BinaryOperation;
use crate::domain::indicator::{Indicator, MovingAverageKind, NumIndicator};
use crate::domain::num::Numeric;
use std::sync::Arc;

pub const DEFAULT_FAST: usize = 12;
pub const DEFAULT_SLOW: usize = 26;
pub const DEFAULT_SIGNAL: usize = 9;

#[derive(Debug)]
pub struct Macd<N: Numeric> {
    fast: usize,
    slow: usize,
    kind: MovingAverageKind,
    input: NumIndicator<N>,
    fast_ma: NumIndicator<N>,
    slow_ma: NumIndicator<N>,
    cache: IndicatorCache<N>,
}

impl<N: Numeric> Macd<N> {
    pub fn new(input: NumIndicator<N>, fast: usize, slow: usize) -> Result<Self> {
        Self::with_average(input, fast, slow, MovingAverageKind::Exponential)
    }

    pub fn with_defaults(input: NumIndicator<N>) -> Result<Self> {
        Self::new(input, DEFAULT_FAST, DEFAULT_SLOW)
    }

    pub fn with_average(
        input: NumIndicator<N>,
        fast: usize,
        slow: usize,
        average: MovingAverageKind,
    ) -> Result<Self> {
        let strategy = input.series().cache_strategy();
        Self::assemble(input, fast, slow, average, strategy)
    }

    /// Applies `strategy` to the MACD line and both of its averages.
    pub fn with_cache(self, strategy: CacheStrategy) -> Result<Self> {
        Self::assemble(self.input, self.fast, self.slow, self.kind, strategy)
    }

    fn assemble(
        input: NumIndicator<N>,
        fast: usize,
        slow: usize,
        kind: MovingAverageKind,
        strategy: CacheStrategy,
    ) -> Result<Self> {
        Ok(Self {
            fast,
            slow,
            kind,
            fast_ma: kind.build_cached(Arc::clone(&input), fast, strategy)?,
            slow_ma: kind.build_cached(Arc::clone(&input), slow, strategy)?,
            input,
            cache: IndicatorCache::new(strategy),
        })
    }
}

impl<N: Numeric> Indicator<N> for Macd<N> {
    type Output = N;

    fn series(&self) -> &Arc<BarSeries<N>> {
        self.fast_ma.series()
    }

    fn unstable_bound(&self) -> usize {
        self.fast_ma.unstable_bound().max(self.slow_ma.unstable_bound())
    }

    fn value_at(&self, snapshot: &SeriesSnapshot<'_, N>, index: usize) -> Result<N> {
        self.cache.get_or_compute(snapshot, index, || {
            let fast = self.fast_ma.value_at(snapshot, index)?;
            Ok(fast.try_sub(self.slow_ma.value_at(snapshot, index)?)?)
        })
    }

    fn cache_strategy(&self) -> Option<CacheStrategy> {
        Some(self.cache.strategy())
    }

    fn label(&self) -> String {
        format!("MACD({},{})", self.fast, self.slow)
    }
}

/// EMA(`period`) of a MACD line.
pub fn signal_line<N: Numeric>(macd: NumIndicator<N>, period: usize) -> Result<Ema<N>> {
    Ema::new(macd, period)
}

/// MACD line minus its signal line.
pub fn histogram<N: Numeric>(macd: NumIndicator<N>, period: usize) -> Result<BinaryOperation<N>> {
    let signal: NumIndicator<N> = Arc::new(signal_line(Arc::clone(&macd), period)?);
    BinaryOperation::subtract(macd, signal)
}
