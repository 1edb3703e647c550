//! Rolling sum over a fixed window.

use crate::domain::bar_series::{BarSeries, SeriesSnapshot};
use crate::domain::cache::{CacheStrategy, IndicatorCache};
use crate::domain::error::Result;
use crate::domain::indicator::{Indicator, NumIndicator, ensure_positive, window_start};
use crate::domain::num::Numeric;
use std::sync::Arc;

/// Sum of `input` over the last `period` indices, partial during warm-up.
#[derive(Debug)]
pub struct RollingSum<N: Numeric> {
    input: NumIndicator<N>,
    period: usize,
    cache: IndicatorCache<N>,
}

impl<N: Numeric> RollingSum<N> {
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
}

impl<N: Numeric> Indicator<N> for RollingSum<N> {
    type Output = N;

    fn series(&self) -> &Arc<BarSeries<N>> {
        self.input.series()
    }

    fn unstable_bound(&self) -> usize {
        self.input.unstable_bound() + self.period - 1
    }

    fn value_at(&self, snapshot: &SeriesSnapshot<'_, N>, index: usize) -> Result<N> {
        self.cache.get_or_compute(snapshot, index, || {
            window_sum(&self.input, snapshot, index, self.period)
        })
    }

    fn cache_strategy(&self) -> Option<CacheStrategy> {
        Some(self.cache.strategy())
    }

    fn label(&self) -> String {
        format!("SUM({})", self.period)
    }
}

/// Sum of `input` over `window_start(index, period)..=index`.
pub(crate) fn window_sum<N: Numeric>(
    input: &NumIndicator<N>,
    snapshot: &SeriesSnapshot<'_, N>,
    index: usize,
    period: usize,
) -> Result<N> {
    let mut total = N::zero();
    for i in window_start(index, period)..=index {
        total = total.try_add(input.value_at(snapshot, i)?)?;
    }
    Ok(total)
}

/// Values of `input` over the window ending at `index`, oldest first.
pub(crate) fn window_values<N: Numeric>(
    input: &NumIndicator<N>,
    snapshot: &SeriesSnapshot<'_, N>,
    index: usize,
    period: usize,
) -> Result<Vec<N>> {
    (window_start(index, period)..=index)
        .map(|i| input.value_at(snapshot, i))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::test_support::*;
    use rust_decimal_macros::dec;

    #[test]
    fn sum_partial_then_full_window() {
        let series = make_bars(&[dec!(1), dec!(2), dec!(3), dec!(4), dec!(5)]);
        let sum = RollingSum::new(close(&series), 3).unwrap();

        assert_eq!(
            values(&sum),
            vec![dec!(1), dec!(3), dec!(6), dec!(9), dec!(12)]
        );
        assert_eq!(sum.unstable_bound(), 2);
        assert!(!sum.is_stable_at(1));
        assert!(sum.is_stable_at(2));
    }

    #[test]
    fn sum_with_bounded_cache() {
        let series = make_bars(&[dec!(1), dec!(2), dec!(3), dec!(4)]);
        let sum = RollingSum::new(close(&series), 2)
            .unwrap()
            .with_cache(CacheStrategy::recent(1).unwrap());

        assert_eq!(sum.value(3).unwrap(), dec!(7));
        assert_eq!(sum.value(1).unwrap(), dec!(3));
        assert_eq!(sum.value(3).unwrap(), dec!(7));
    }

    #[test]
    fn zero_period_rejected() {
        let series = make_bars(&[dec!(1)]);
        assert!(RollingSum::new(close(&series), 0).is_err());
    }
}
