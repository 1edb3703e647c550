//! Bollinger Bands indicator.
//!
//! Bollinger Bands consist of:
//! - Middle: moving average over n periods (SMA by default)
//! - Upper: Middle + (multiplier × StdDev)
//! - Lower: Middle - (multiplier × StdDev)
//!
//! Where StdDev is population standard deviation (divides by N, not N-1)
//! unless the bands are built unbiased.
//!
//! Default parameters: period=20, multiplier=2.0

use crate::domain::bar_series::{BarSeries, SeriesSnapshot};
use crate::domain::cache::{CacheStrategy, IndicatorCache};
use crate::domain::error::Result;
use crate::domain::indicator::stddev::StandardDeviation;
use crate::domain::indicator::{BandKind, Indicator, MovingAverageKind, NumIndicator};
use crate::domain::num::Numeric;
use std::sync::Arc;

pub const DEFAULT_PERIOD: usize = 20;
pub const DEFAULT_MULTIPLIER_X100: u32 = 200;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BollingerValues<N> {
    pub upper: N,
    pub middle: N,
    pub lower: N,
}

impl<N: Numeric> BollingerValues<N> {
    pub fn band(&self, kind: BandKind) -> N {
        match kind {
            BandKind::Upper => self.upper,
            BandKind::Middle => self.middle,
            BandKind::Lower => self.lower,
        }
    }

    /// (upper - lower) / middle
    pub fn bandwidth(&self) -> Result<N> {
        Ok(self.upper.try_sub(self.lower)?.try_div(self.middle)?)
    }

    /// Position of `price` between the bands: 0 at lower, 1 at upper.
    pub fn percent_b(&self, price: N) -> Result<N> {
        let width = self.upper.try_sub(self.lower)?;
        Ok(price.try_sub(self.lower)?.try_div(width)?)
    }
}

#[derive(Debug)]
pub struct BollingerBands<N: Numeric> {
    period: usize,
    multiplier: N,
    kind: MovingAverageKind,
    input: NumIndicator<N>,
    middle: NumIndicator<N>,
    stddev: StandardDeviation<N>,
    cache: IndicatorCache<BollingerValues<N>>,
}

impl<N: Numeric> BollingerBands<N> {
    pub fn new(input: NumIndicator<N>, period: usize, multiplier: N) -> Result<Self> {
        Self::with_average(input, period, multiplier, MovingAverageKind::Simple)
    }

    pub fn with_average(
        input: NumIndicator<N>,
        period: usize,
        multiplier: N,
        average: MovingAverageKind,
    ) -> Result<Self> {
        let stddev = StandardDeviation::new(Arc::clone(&input), period)?;
        let cache = IndicatorCache::new(input.series().cache_strategy());
        let middle = average.build(Arc::clone(&input), period)?;
        Ok(Self {
            period,
            multiplier,
            kind: average,
            input,
            middle,
            stddev,
            cache,
        })
    }

    pub fn unbiased(mut self, unbiased: bool) -> Self {
        self.stddev = self.stddev.unbiased(unbiased);
        self.cache = IndicatorCache::new(self.cache.strategy());
        self
    }

    /// Applies `strategy` to the bands, the middle average and the deviation.
    pub fn with_cache(mut self, strategy: CacheStrategy) -> Result<Self> {
        self.middle = self
            .kind
            .build_cached(Arc::clone(&self.input), self.period, strategy)?;
        self.stddev = self.stddev.with_cache(strategy);
        self.cache = IndicatorCache::new(strategy);
        Ok(self)
    }
}

impl<N: Numeric> Indicator<N> for BollingerBands<N> {
    type Output = BollingerValues<N>;

    fn series(&self) -> &Arc<BarSeries<N>> {
        self.middle.series()
    }

    fn unstable_bound(&self) -> usize {
        self.middle.unstable_bound().max(self.stddev.unstable_bound())
    }

    fn value_at(
        &self,
        snapshot: &SeriesSnapshot<'_, N>,
        index: usize,
    ) -> Result<BollingerValues<N>> {
        self.cache.get_or_compute(snapshot, index, || {
            let middle = self.middle.value_at(snapshot, index)?;
            let offset = self.stddev.value_at(snapshot, index)?.try_mul(self.multiplier)?;
            Ok(BollingerValues {
                upper: middle.try_add(offset)?,
                middle,
                lower: middle.try_sub(offset)?,
            })
        })
    }

    fn cache_strategy(&self) -> Option<CacheStrategy> {
        Some(self.cache.strategy())
    }

    fn label(&self) -> String {
        format!("BOLLINGER({},{})", self.period, self.multiplier)
    }
}

/// One line of a [`BollingerBands`] as a numeric indicator.
#[derive(Debug)]
pub struct BollingerBand<N: Numeric> {
    bands: Arc<BollingerBands<N>>,
    kind: BandKind,
}

impl<N: Numeric> BollingerBand<N> {
    pub fn new(bands: Arc<BollingerBands<N>>, kind: BandKind) -> Self {
        Self { bands, kind }
    }
}

impl<N: Numeric> Indicator<N> for BollingerBand<N> {
    type Output = N;

    fn series(&self) -> &Arc<BarSeries<N>> {
        self.bands.series()
    }

    fn unstable_bound(&self) -> usize {
        self.bands.unstable_bound()
    }

    fn value_at(&self, snapshot: &SeriesSnapshot<'_, N>, index: usize) -> Result<N> {
        Ok(self.bands.value_at(snapshot, index)?.band(self.kind))
    }

    fn cache_strategy(&self) -> Option<CacheStrategy> {
        self.bands.cache_strategy()
    }

    fn label(&self) -> String {
        format!("{}.{}", self.bands.label(), self.kind)
    }
}
