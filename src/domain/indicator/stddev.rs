//! Variance and Standard Deviation indicators.
//!
//! VAR(n)[i] = sum((P[i-j] - mean)^2 for j in 0..n) / d
//! where d is n for the population variance and n-1 when unbiased.
//! STDDEV(n)[i] = sqrt(VAR(n)[i])
//!
//! The window is the available prefix during warm-up. An unbiased variance of
//! a single observation is zero.

use crate::domain::bar_series::{BarSeries, SeriesSnapshot};
use crate::domain::cache::{CacheStrategy, IndicatorCache};
use crate::domain::error::Result;
use crate::domain::indicator::sum::window_values;
use crate::domain::indicator::{Indicator, NumIndicator, ensure_positive};
use crate::domain::num::Numeric;
use std::sync::Arc;

#[derive(Debug)]
pub struct Variance<N: Numeric> {
    input: NumIndicator<N>,
    period: usize,
    unbiased: bool,
    cache: IndicatorCache<N>,
}

impl<N: Numeric> Variance<N> {
    pub fn new(input: NumIndicator<N>, period: usize) -> Result<Self> {
        ensure_positive("period", period)?;
        let cache = IndicatorCache::new(input.series().cache_strategy());
        Ok(Self {
            input,
            period,
            unbiased: false,
            cache,
        })
    }

    /// Divide by n-1 instead of n.
    pub fn unbiased(mut self, unbiased: bool) -> Self {
        self.unbiased = unbiased;
        self.cache = IndicatorCache::new(self.cache.strategy());
        self
    }

    pub fn with_cache(mut self, strategy: CacheStrategy) -> Self {
        self.cache = IndicatorCache::new(strategy);
        self
    }

    fn compute(&self, snapshot: &SeriesSnapshot<'_, N>, index: usize) -> Result<N> {
        let window = window_values(&self.input, snapshot, index, self.period)?;
        let count = window.len();
        let mut sum = N::zero();
        for value in &window {
            sum = sum.try_add(*value)?;
        }
        let mean = sum.try_div(N::from_count(count))?;

        let mut squares = N::zero();
        for value in &window {
            squares = squares.try_add(value.try_sub(mean)?.try_square()?)?;
        }

        let divisor = if self.unbiased { count - 1 } else { count };
        if divisor == 0 {
            return Ok(N::zero());
        }
        Ok(squares.try_div(N::from_count(divisor))?)
    }
}

impl<N: Numeric> Indicator<N> for Variance<N> {
    type Output = N;

    fn series(&self) -> &Arc<BarSeries<N>> {
        self.input.series()
    }

    fn unstable_bound(&self) -> usize {
        self.input.unstable_bound() + self.period - 1
    }

    fn value_at(&self, snapshot: &SeriesSnapshot<'_, N>, index: usize) -> Result<N> {
        self.cache
            .get_or_compute(snapshot, index, || self.compute(snapshot, index))
    }

    fn cache_strategy(&self) -> Option<CacheStrategy> {
        Some(self.cache.strategy())
    }

    fn label(&self) -> String {
        if self.unbiased {
            format!("VAR({},unbiased)", self.period)
        } else {
            format!("VAR({})", self.period)
        }
    }
}

#[derive(Debug)]
pub struct StandardDeviation<N: Numeric> {
    variance: Variance<N>,
    cache: IndicatorCache<N>,
}

impl<N: Numeric> StandardDeviation<N> {
    pub fn new(input: NumIndicator<N>, period: usize) -> Result<Self> {
        let variance = Variance::new(input, period)?;
        let cache = IndicatorCache::new(variance.cache.strategy());
        Ok(Self { variance, cache })
    }

    pub fn unbiased(mut self, unbiased: bool) -> Self {
        self.variance = self.variance.unbiased(unbiased);
        self.cache = IndicatorCache::new(self.cache.strategy());
        self
    }

    pub fn with_cache(mut self, strategy: CacheStrategy) -> Self {
        self.variance = self.variance.with_cache(strategy);
        self.cache = IndicatorCache::new(strategy);
        self
    }
}

impl<N: Numeric> Indicator<N> for StandardDeviation<N> {
    type Output = N;

    fn series(&self) -> &Arc<BarSeries<N>> {
        self.variance.series()
    }

    fn unstable_bound(&self) -> usize {
        self.variance.unstable_bound()
    }

    fn value_at(&self, snapshot: &SeriesSnapshot<'_, N>, index: usize) -> Result<N> {
        self.cache.get_or_compute(snapshot, index, || {
            Ok(self.variance.value_at(snapshot, index)?.try_sqrt()?)
        })
    }

    fn cache_strategy(&self) -> Option<CacheStrategy> {
        Some(self.cache.strategy())
    }

    fn label(&self) -> String {
        if self.variance.unbiased {
            format!("STDDEV({},unbiased)", self.variance.period)
        } else {
            format!("STDDEV({})", self.variance.period)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::test_support::*;
    use rust_decimal_macros::dec;

    #[test]
    fn stddev_warmup() {
        let series = make_bars(&[10.0, 20.0, 30.0, 40.0, 50.0]);
        let stddev = StandardDeviation::new(close(&series), 3).unwrap();

        assert!(!stddev.is_stable_at(0));
        assert!(!stddev.is_stable_at(1));
        assert!(stddev.is_stable_at(2));
    }

    #[test]
    fn stddev_constant_values() {
        let series = make_bars(&[5.0, 5.0, 5.0, 5.0, 5.0]);
        let stddev = StandardDeviation::new(close(&series), 3).unwrap();

        for v in values(&stddev) {
            assert!(v.abs() < 1e-10);
        }
    }

    #[test]
    fn stddev_basic_calculation() {
        let series = make_bars(&[10.0, 20.0, 30.0]);
        let stddev = StandardDeviation::new(close(&series), 3).unwrap();

        let sma: f64 = (10.0 + 20.0 + 30.0) / 3.0;
        let expected: f64 =
            ((10.0 - sma).powi(2) + (20.0 - sma).powi(2) + (30.0 - sma).powi(2)) / 3.0;
        assert!((stddev.value(2).unwrap() - expected.sqrt()).abs() < 1e-10);
    }

    #[test]
    fn stddev_known_values() {
        let series = make_bars(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        let stddev = StandardDeviation::new(close(&series), 8).unwrap();

        assert!(stddev.is_stable_at(7));
        assert!((stddev.value(7).unwrap() - 2.0).abs() < 1e-10);
    }

    #[test]
    fn variance_population_and_unbiased() {
        let series = make_bars(&[dec!(2), dec!(4), dec!(4), dec!(4), dec!(5), dec!(5), dec!(7), dec!(9)]);
        let population = Variance::new(close(&series), 8).unwrap();
        let sample = Variance::new(close(&series), 8).unwrap().unbiased(true);

        assert_eq!(population.value(7).unwrap(), dec!(4));
        // 32 / 7
        assert_eq!(sample.value(7).unwrap(), dec!(32) / dec!(7));
        assert_eq!(sample.label(), "VAR(8,unbiased)");
    }

    #[test]
    fn unbiased_single_observation_is_zero() {
        let series = make_bars(&[dec!(3), dec!(5)]);
        let sample = Variance::new(close(&series), 4).unwrap().unbiased(true);
        assert_eq!(sample.value(0).unwrap(), dec!(0));
        // (3-4)^2 + (5-4)^2 over 1
        assert_eq!(sample.value(1).unwrap(), dec!(2));
    }

    #[test]
    fn variance_overflow_is_a_numeric_error() {
        use crate::domain::error::{NumError, SamtaError};

        let series = make_bars(&[dec!(0), dec!(1000000000000000)]);
        let variance = Variance::new(close(&series), 2).unwrap();
        assert!(matches!(
            variance.value(1),
            Err(SamtaError::Numeric(NumError::Overflow))
        ));
        assert_eq!(variance.value(0).unwrap(), dec!(0));
    }

    #[test]
    fn stddev_label() {
        let series = make_bars(&[1.0]);
        let stddev = StandardDeviation::new(close(&series), 5).unwrap();
        assert_eq!(stddev.label(), "STDDEV(5)");
    }
}
