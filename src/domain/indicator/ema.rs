//! Exponential Moving Average indicator.
//!
//! EMA[i] = EMA[i-1] + (P[i] - EMA[i-1]) * k
//!
//! k = smoothing / (n + 1), smoothing 2 by default; Wilder's variant uses k = 1 / n.
//! With the simple-average seed, indices below n hold the average of the
//! available prefix and index n-1 holds SMA(n). With the first-value seed,
//! EMA[0] = P[0].
//!
//! Values are filled forward from the latest cached index, never by recursing
//! backward, so a cold evaluation at a large index uses constant stack.

use crate::domain::bar_series::{BarSeries, SeriesSnapshot};
use crate::domain::cache::{CacheStrategy, IndicatorCache};
use crate::domain::error::Result;
use crate::domain::indicator::sum::window_sum;
use crate::domain::indicator::{Indicator, NumIndicator, ensure_positive};
use crate::domain::num::Numeric;
use std::sync::Arc;

/// How the recurrence is started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EmaSeed {
    FirstValue,
    #[default]
    SimpleAverage,
}

#[derive(Debug)]
pub struct Ema<N: Numeric> {
    input: NumIndicator<N>,
    period: usize,
    multiplier: N,
    seed: EmaSeed,
    name: &'static str,
    cache: IndicatorCache<N>,
}

impl<N: Numeric> Ema<N> {
    pub fn new(input: NumIndicator<N>, period: usize) -> Result<Self> {
        Self::with_smoothing(input, period, N::from_count(2))
    }

    pub fn with_smoothing(input: NumIndicator<N>, period: usize, smoothing: N) -> Result<Self> {
        ensure_positive("period", period)?;
        let multiplier = smoothing.try_div(N::from_count(period + 1))?;
        Ok(Self::build(input, period, multiplier, "EMA"))
    }

    /// Welles Wilder's moving average, multiplier 1/n.
    pub fn wilder(input: NumIndicator<N>, period: usize) -> Result<Self> {
        ensure_positive("period", period)?;
        let multiplier = N::one().try_div(N::from_count(period))?;
        Ok(Self::build(input, period, multiplier, "WILDER"))
    }

    fn build(input: NumIndicator<N>, period: usize, multiplier: N, name: &'static str) -> Self {
        let cache = IndicatorCache::new(input.series().cache_strategy());
        Self {
            input,
            period,
            multiplier,
            seed: EmaSeed::default(),
            name,
            cache,
        }
    }

    pub fn with_seed(mut self, seed: EmaSeed) -> Self {
        self.seed = seed;
        self.cache = IndicatorCache::new(self.cache.strategy());
        self
    }

    pub fn with_cache(mut self, strategy: CacheStrategy) -> Self {
        self.cache = IndicatorCache::new(strategy);
        self
    }

    pub fn multiplier(&self) -> N {
        self.multiplier
    }

    fn step(&self, snapshot: &SeriesSnapshot<'_, N>, index: usize, previous: Option<&N>) -> Result<N> {
        let seeding = match self.seed {
            EmaSeed::SimpleAverage => index < self.period,
            EmaSeed::FirstValue => index == 0,
        };
        match previous {
            Some(&previous) if !seeding => {
                let current = self.input.value_at(snapshot, index)?;
                let delta = current.try_sub(previous)?.try_mul(self.multiplier)?;
                Ok(previous.try_add(delta)?)
            }
            _ => self.seed_value(snapshot, index),
        }
    }

    fn seed_value(&self, snapshot: &SeriesSnapshot<'_, N>, index: usize) -> Result<N> {
        match self.seed {
            EmaSeed::FirstValue => self.input.value_at(snapshot, index),
            EmaSeed::SimpleAverage => {
                let count = (index + 1).min(self.period);
                let sum = window_sum(&self.input, snapshot, index, self.period)?;
                Ok(sum.try_div(N::from_count(count))?)
            }
        }
    }
}

impl<N: Numeric> Indicator<N> for Ema<N> {
    type Output = N;

    fn series(&self) -> &Arc<BarSeries<N>> {
        self.input.series()
    }

    fn unstable_bound(&self) -> usize {
        self.input.unstable_bound() + self.period - 1
    }

    fn value_at(&self, snapshot: &SeriesSnapshot<'_, N>, index: usize) -> Result<N> {
        self.cache
            .fill_forward(snapshot, index, |i, previous| self.step(snapshot, i, previous))
    }

    fn cache_strategy(&self) -> Option<CacheStrategy> {
        Some(self.cache.strategy())
    }

    fn label(&self) -> String {
        format!("{}({})", self.name, self.period)
    }
}
