//! Weighted Moving Average indicator.
//!
//! WMA(n) = (1*P[i-n+1] + 2*P[i-n+2] + ... + n*P[i]) / (n*(n+1)/2)
//! During warm-up the weights run over the available prefix only.

use crate::domain::bar_series::{BarSeries, SeriesSnapshot};
use crate::domain::cache::{CacheStrategy, IndicatorCache};
use crate::domain::error::Result;
use crate::domain::indicator::sum::window_values;
use crate::domain::indicator::{Indicator, NumIndicator, ensure_positive};
use crate::domain::num::Numeric;
use std::sync::Arc;

#[derive(Debug)]
pub struct Wma<N: Numeric> {
    input: NumIndicator<N>,
    period: usize,
    cache: IndicatorCache<N>,
}

impl<N: Numeric> Wma<N> {
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

impl<N: Numeric> Indicator<N> for Wma<N> {
    type Output = N;

    fn series(&self) -> &Arc<BarSeries<N>> {
        self.input.series()
    }

    fn unstable_bound(&self) -> usize {
        self.input.unstable_bound() + self.period - 1
    }

    fn value_at(&self, snapshot: &SeriesSnapshot<'_, N>, index: usize) -> Result<N> {
        self.cache.get_or_compute(snapshot, index, || {
            let window = window_values(&self.input, snapshot, index, self.period)?;
            let mut weighted_sum = N::zero();
            for (weight, value) in window.iter().enumerate() {
                weighted_sum = weighted_sum.try_add(value.try_mul(N::from_count(weight + 1))?)?;
            }
            let count = window.len();
            let divisor = N::from_count(count * (count + 1) / 2);
            Ok(weighted_sum.try_div(divisor)?)
        })
    }

    fn cache_strategy(&self) -> Option<CacheStrategy> {
        Some(self.cache.strategy())
    }

    fn label(&self) -> String {
        format!("WMA({})", self.period)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::test_support::*;
    use rust_decimal_macros::dec;

    #[test]
    fn wma_warmup() {
        let series = make_bars(&[10.0, 20.0, 30.0, 40.0, 50.0]);
        let wma = Wma::new(close(&series), 3).unwrap();

        assert!(!wma.is_stable_at(0));
        assert!(!wma.is_stable_at(1));
        assert!(wma.is_stable_at(2));
    }

    #[test]
    fn wma_period_1() {
        let series = make_bars(&[10.0, 20.0, 30.0]);
        let wma = Wma::new(close(&series), 1).unwrap();

        let v = values(&wma);
        assert!((v[0] - 10.0).abs() < f64::EPSILON);
        assert!((v[1] - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn wma_basic_calculation() {
        let series = make_bars(&[10.0, 20.0, 30.0]);
        let wma = Wma::new(close(&series), 3).unwrap();

        let divisor = (3.0 * 4.0) / 2.0;
        let expected = (1.0 * 10.0 + 2.0 * 20.0 + 3.0 * 30.0) / divisor;
        assert!((wma.value(2).unwrap() - expected).abs() < 1e-10);
    }

    #[test]
    fn wma_partial_window() {
        let series = make_bars(&[10.0, 20.0, 30.0]);
        let wma = Wma::new(close(&series), 3).unwrap();

        // (1*10 + 2*20) / 3
        let expected = 50.0 / 3.0;
        assert!((wma.value(1).unwrap() - expected).abs() < 1e-10);
    }

    #[test]
    fn wma_known_values() {
        let series = make_bars(&[dec!(10), dec!(20), dec!(30), dec!(40), dec!(50)]);
        let wma = Wma::new(close(&series), 3).unwrap();

        // (20 + 60 + 120) / 6 and (30 + 80 + 150) / 6
        assert_eq!(wma.value(3).unwrap(), dec!(200) / dec!(6));
        assert_eq!(wma.value(4).unwrap(), dec!(260) / dec!(6));
    }

    #[test]
    fn wma_equal_prices() {
        let series = make_bars(&[dec!(100), dec!(100), dec!(100)]);
        let wma = Wma::new(close(&series), 3).unwrap();
        assert_eq!(wma.value(2).unwrap(), dec!(100));
    }

    #[test]
    fn wma_period_0() {
        let series = make_bars(&[10.0, 20.0]);
        assert!(Wma::new(close(&series), 0).is_err());
    }
}
