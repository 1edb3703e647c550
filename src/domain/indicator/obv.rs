//! OBV (On-Balance Volume) indicator implementation.

use crate::domain::bar_series::{BarSeries, SeriesSnapshot};
use crate::domain::cache::{CacheStrategy, IndicatorCache};
use crate::domain::error::Result;
use crate::domain::indicator::Indicator;
use crate::domain::num::Numeric;
use std::cmp::Ordering;
use std::sync::Arc;

/// On-Balance Volume.
///
/// OBV[0] = 0
/// If close[i] > close[i-1]: OBV[i] = OBV[i-1] + volume[i]
/// If close[i] < close[i-1]: OBV[i] = OBV[i-1] - volume[i]
/// If close[i] == close[i-1]: OBV[i] = OBV[i-1]
///
/// No warmup period; all bars are stable.
#[derive(Debug)]
pub struct OnBalanceVolume<N: Numeric> {
    series: Arc<BarSeries<N>>,
    cache: IndicatorCache<N>,
}

impl<N: Numeric> OnBalanceVolume<N> {
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

    fn step(&self, snapshot: &SeriesSnapshot<'_, N>, index: usize, previous: Option<&N>) -> Result<N> {
        let Some(&previous) = previous.filter(|_| index > 0) else {
            return Ok(N::zero());
        };
        let bar = snapshot.bar(index)?;
        let prior = snapshot.bar(index - 1)?;
        Ok(match bar.close.partial_cmp(&prior.close) {
            Some(Ordering::Greater) => previous.try_add(bar.volume)?,
            Some(Ordering::Less) => previous.try_sub(bar.volume)?,
            _ => previous,
        })
    }
}

impl<N: Numeric> Indicator<N> for OnBalanceVolume<N> {
    type Output = N;

    fn series(&self) -> &Arc<BarSeries<N>> {
        &self.series
    }

    fn unstable_bound(&self) -> usize {
        0
    }

    fn value_at(&self, snapshot: &SeriesSnapshot<'_, N>, index: usize) -> Result<N> {
        self.cache
            .fill_forward(snapshot, index, |i, previous| self.step(snapshot, i, previous))
    }

    fn cache_strategy(&self) -> Option<CacheStrategy> {
        Some(self.cache.strategy())
    }

    fn label(&self) -> String {
        "OBV".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::test_support::*;

    #[test]
    fn obv_first_bar_is_zero() {
        let series = make_ohlcv_bars(&[(10.0, 10.0, 10.0, 10.0, 5000.0)]);
        let obv = OnBalanceVolume::new(&series);
        assert!(obv.value(0).unwrap().abs() < f64::EPSILON);
    }

    #[test]
    fn obv_adds_volume_on_up_day() {
        let series = make_ohlcv_bars(&[
            (10.0, 10.0, 10.0, 10.0, 1000.0),
            (11.0, 11.0, 11.0, 11.0, 2000.0),
        ]);
        let obv = OnBalanceVolume::new(&series);
        assert!((obv.value(1).unwrap() - 2000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn obv_subtracts_volume_on_down_day() {
        let series = make_ohlcv_bars(&[
            (10.0, 10.0, 10.0, 10.0, 1000.0),
            (9.0, 9.0, 9.0, 9.0, 2000.0),
        ]);
        let obv = OnBalanceVolume::new(&series);
        assert!((obv.value(1).unwrap() + 2000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn obv_unchanged_on_flat_day() {
        let series = make_ohlcv_bars(&[
            (10.0, 10.0, 10.0, 10.0, 1000.0),
            (11.0, 11.0, 11.0, 11.0, 2000.0),
            (11.0, 11.0, 11.0, 11.0, 3000.0),
        ]);
        let obv = OnBalanceVolume::new(&series);
        let v = values(&obv);
        assert!((v[2] - v[1]).abs() < f64::EPSILON);
    }

    #[test]
    fn obv_all_bars_stable() {
        let series = make_bars(&[10.0, 11.0, 9.0]);
        let obv = OnBalanceVolume::new(&series);
        for i in 0..3 {
            assert!(obv.is_stable_at(i));
        }
        assert_eq!(obv.label(), "OBV");
    }

    #[test]
    fn obv_cold_evaluation_matches_sequential() {
        let prices: Vec<f64> = (0..300).map(|i| ((i * 7) % 13) as f64).collect();
        let series = make_bars(&prices);
        let sequential = values(&OnBalanceVolume::new(&series));
        let cold = OnBalanceVolume::new(&series);
        assert!((cold.value(299).unwrap() - sequential[299]).abs() < 1e-9);
    }
}
