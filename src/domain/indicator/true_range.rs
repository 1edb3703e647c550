//! True Range and Average True Range.
//!
//! TR[i] = max(H[i] - L[i], |H[i] - C[i-1]|, |L[i] - C[i-1]|), H[0] - L[0] on the first bar.
//! ATR(n) = moving average of TR over n periods, Wilder's by default.

use crate::domain::bar_series::{BarSeries, SeriesSnapshot};
use crate::domain::cache::{CacheStrategy, IndicatorCache};
use crate::domain::error::Result;
use crate::domain::indicator::{Indicator, MovingAverageKind, NumIndicator};
use crate::domain::num::Numeric;
use std::sync::Arc;

#[derive(Debug)]
pub struct TrueRange<N: Numeric> {
    series: Arc<BarSeries<N>>,
    cache: IndicatorCache<N>,
}

impl<N: Numeric> TrueRange<N> {
    pub fn new(series: &Arc<BarSeries<N>>) -> Self {
        Self {
            series: Arc::clone(series),
            cache: IndicatorCache::new(series.cache_strategy()),
        }
    }

    pub fn with_cache(mut self, strategy: CacheStrategy) -> Self {
        self.cache = IndicatorCache::new(strategy);
        self
    }
}

impl<N: Numeric> Indicator<N> for TrueRange<N> {
    type Output = N;

    fn series(&self) -> &Arc<BarSeries<N>> {
        &self.series
    }

    fn unstable_bound(&self) -> usize {
        1
    }

    fn value_at(&self, snapshot: &SeriesSnapshot<'_, N>, index: usize) -> Result<N> {
        self.cache.get_or_compute(snapshot, index, || {
            let bar = snapshot.bar(index)?;
            if index == 0 {
                return Ok(bar.high.try_sub(bar.low)?.abs());
            }
            let previous = snapshot.bar(index - 1)?;
            Ok(bar.true_range(previous.close)?)
        })
    }

    fn cache_strategy(&self) -> Option<CacheStrategy> {
        Some(self.cache.strategy())
    }

    fn label(&self) -> String {
        "TR".to_string()
    }
}

#[derive(Debug)]
pub struct Atr<N: Numeric> {
    period: usize,
    kind: MovingAverageKind,
    average: NumIndicator<N>,
}

impl<N: Numeric> Atr<N> {
    pub fn new(series: &Arc<BarSeries<N>>, period: usize) -> Result<Self> {
        Self::with_average(series, period, MovingAverageKind::Wilder)
    }

    pub fn with_average(
        series: &Arc<BarSeries<N>>,
        period: usize,
        average: MovingAverageKind,
    ) -> Result<Self> {
        Self::assemble(series, period, average, series.cache_strategy())
    }

    /// Rebuilds the true range and its average with `strategy`.
    pub fn with_cache(self, strategy: CacheStrategy) -> Result<Self> {
        let series = Arc::clone(self.average.series());
        Self::assemble(&series, self.period, self.kind, strategy)
    }

    fn assemble(
        series: &Arc<BarSeries<N>>,
        period: usize,
        kind: MovingAverageKind,
        strategy: CacheStrategy,
    ) -> Result<Self> {
        let true_range: NumIndicator<N> = Arc::new(TrueRange::new(series).with_cache(strategy));
        Ok(Self {
            period,
            kind,
            average: kind.build_cached(true_range, period, strategy)?,
        })
    }
}

impl<N: Numeric> Indicator<N> for Atr<N> {
    type Output = N;

    fn series(&self) -> &Arc<BarSeries<N>> {
        self.average.series()
    }

    fn unstable_bound(&self) -> usize {
        self.average.unstable_bound()
    }

    fn value_at(&self, snapshot: &SeriesSnapshot<'_, N>, index: usize) -> Result<N> {
        self.average.value_at(snapshot, index)
    }

    fn cache_strategy(&self) -> Option<CacheStrategy> {
        self.average.cache_strategy()
    }

    fn label(&self) -> String {
        format!("ATR({})", self.period)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::test_support::*;

    fn sample() -> Arc<BarSeries<f64>> {
        make_ohlcv_bars(&[
            (10.0, 12.0, 9.0, 11.0, 100.0),
            (11.0, 15.0, 10.0, 14.0, 100.0),
            (14.0, 14.5, 8.0, 9.0, 100.0),
            (9.0, 10.0, 8.5, 9.5, 100.0),
        ])
    }

    #[test]
    fn true_range_values() {
        let series = sample();
        let tr = TrueRange::new(&series);

        let v = values(&tr);
        // first bar: 12 - 9
        assert!((v[0] - 3.0).abs() < 1e-10);
        // max(5, |15-11|, |10-11|)
        assert!((v[1] - 5.0).abs() < 1e-10);
        // max(6.5, |14.5-14|, |8-14|)
        assert!((v[2] - 6.5).abs() < 1e-10);
        // max(1.5, |10-9|, |8.5-9|)
        assert!((v[3] - 1.5).abs() < 1e-10);
        assert_eq!(tr.unstable_bound(), 1);
    }

    #[test]
    fn atr_wilder_smoothing() {
        let series = sample();
        let atr = Atr::new(&series, 2).unwrap();

        let v = values(&atr);
        // seed: 3, (3+5)/2 = 4, then 4 + (6.5-4)/2 = 5.25, 5.25 + (1.5-5.25)/2 = 3.375
        assert!((v[0] - 3.0).abs() < 1e-10);
        assert!((v[1] - 4.0).abs() < 1e-10);
        assert!((v[2] - 5.25).abs() < 1e-10);
        assert!((v[3] - 3.375).abs() < 1e-10);
        assert_eq!(atr.unstable_bound(), 2);
        assert_eq!(atr.label(), "ATR(2)");
    }

    #[test]
    fn atr_simple_average() {
        let series = sample();
        let atr = Atr::with_average(&series, 2, MovingAverageKind::Simple).unwrap();
        assert!((atr.value(3).unwrap() - 4.0).abs() < 1e-10);
    }

    #[test]
    fn atr_cache_override_reaches_inner_average() {
        let series = sample();
        let recent = CacheStrategy::recent(1).unwrap();
        let atr = Atr::new(&series, 2).unwrap().with_cache(recent).unwrap();

        assert_eq!(atr.cache_strategy(), Some(recent));
        let v: Vec<f64> = (0..4).rev().map(|i| atr.value(i).unwrap()).collect();
        assert!((v[0] - 3.375).abs() < 1e-10);
        assert!((v[3] - 3.0).abs() < 1e-10);
        assert_eq!(Atr::new(&series, 2).unwrap().cache_strategy(), Some(CacheStrategy::Unbounded));
    }

    #[test]
    fn atr_period_0() {
        let series = sample();
        assert!(Atr::new(&series, 0).is_err());
    }
}
