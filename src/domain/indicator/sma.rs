//! Simple Moving Average indicator.
//!
//! SMA(n)[i] = sum(P[i-n+1..=i]) / n
//! During warm-up the window is the available prefix, divided by its length.

use crate::domain::bar_series::{BarSeries, SeriesSnapshot};
use crate::domain::cache::{CacheStrategy, IndicatorCache};
use crate::domain::error::Result;
use crate::domain::indicator::sum::window_sum;
use crate::domain::indicator::{Indicator, NumIndicator, ensure_positive, window_start};
use crate::domain::num::Numeric;
use std::sync::Arc;

#[derive(Debug)]
pub struct Sma<N: Numeric> {
    input: NumIndicator<N>,
    period: usize,
    cache: IndicatorCache<N>,
}

impl<N: Numeric> Sma<N> {
    pub fn new(input: NumIndicator<N>, period: usize) -> Result<Self> {
        ensure_positive("period", period)?;
        let cache = IndicatorCache::new(input.series().cache_strategy());
        Ok(Self {
            input,
            period,
            cache,
        })
    }

    pub fn with_cache(mut self, strategy: CacheStrategy) -> Self {
        self.cache = IndicatorCache::new(strategy);
        self
    }

    pub fn period(&self) -> usize {
        self.period
    }
}

impl<N: Numeric> Indicator<N> for Sma<N> {
    type Output = N;

    fn series(&self) -> &Arc<BarSeries<N>> {
        self.input.series()
    }

    fn unstable_bound(&self) -> usize {
        self.input.unstable_bound() + self.period - 1
    }

    fn value_at(&self, snapshot: &SeriesSnapshot<'_, N>, index: usize) -> Result<N> {
        self.cache.get_or_compute(snapshot, index, || {
            let count = index + 1 - window_start(index, self.period);
            let sum = window_sum(&self.input, snapshot, index, self.period)?;
            Ok(sum.try_div(N::from_count(count))?)
        })
    }

    fn cache_strategy(&self) -> Option<CacheStrategy> {
        Some(self.cache.strategy())
    }

    fn label(&self) -> String {
        format!("SMA({})", self.period)
    }
}
