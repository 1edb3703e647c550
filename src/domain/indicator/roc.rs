//! ROC (Rate of Change) indicator implementation.
//!
//! ROC(n)[i] = ((P[i] - P[i-n]) / P[i-n]) * 100, with i-n clamped to 0.
//! A zero base value is a division error, not a silent zero.

use crate::domain::bar_series::{BarSeries, SeriesSnapshot};
use crate::domain::cache::{CacheStrategy, IndicatorCache};
use crate::domain::error::Result;
use crate::domain::indicator::{Indicator, NumIndicator, ensure_positive};
use crate::domain::num::Numeric;
use std::sync::Arc;

#[derive(Debug)]
pub struct RateOfChange<N: Numeric> {
    input: NumIndicator<N>,
    period: usize,
    cache: IndicatorCache<N>,
}

impl<N: Numeric> RateOfChange<N> {
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

impl<N: Numeric> Indicator<N> for RateOfChange<N> {
    type Output = N;

    fn series(&self) -> &Arc<BarSeries<N>> {
        self.input.series()
    }

    fn unstable_bound(&self) -> usize {
        self.input.unstable_bound() + self.period
    }

    fn value_at(&self, snapshot: &SeriesSnapshot<'_, N>, index: usize) -> Result<N> {
        self.cache.get_or_compute(snapshot, index, || {
            let current = self.input.value_at(snapshot, index)?;
            let base = self.input.value_at(snapshot, index.saturating_sub(self.period))?;
            Ok(current.try_sub(base)?.try_div(base)?.try_mul(N::hundred())?)
        })
    }

    fn cache_strategy(&self) -> Option<CacheStrategy> {
        Some(self.cache.strategy())
    }

    fn label(&self) -> String {
        format!("ROC({})", self.period)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::{NumError, SamtaError};
    use crate::domain::indicator::test_support::*;
    use rust_decimal_macros::dec;

    #[test]
    fn roc_warmup() {
        let series = make_bars(&[10.0, 11.0, 12.0, 13.0, 14.0]);
        let roc = RateOfChange::new(close(&series), 2).unwrap();

        assert!(!roc.is_stable_at(0));
        assert!(!roc.is_stable_at(1));
        assert!(roc.is_stable_at(2));
    }

    #[test]
    fn roc_basic_calculation() {
        let series = make_bars(&[dec!(100), dec!(105), dec!(110), dec!(99)]);
        let roc = RateOfChange::new(close(&series), 2).unwrap();

        // clamped: 0 and (105 - 100) / 100 * 100
        assert_eq!(roc.value(0).unwrap(), dec!(0));
        assert_eq!(roc.value(1).unwrap(), dec!(5));
        // (110 - 100) / 100 * 100
        assert_eq!(roc.value(2).unwrap(), dec!(10));
        // (99 - 105) / 105 * 100
        let expected = dec!(-6) / dec!(105) * dec!(100);
        assert_eq!(roc.value(3).unwrap(), expected);
    }

    #[test]
    fn roc_zero_base_is_an_error() {
        let series = make_bars(&[dec!(0), dec!(5)]);
        let roc = RateOfChange::new(close(&series), 1).unwrap();

        assert!(matches!(
            roc.value(1),
            Err(SamtaError::Numeric(NumError::DivisionByZero))
        ));
    }

    #[test]
    fn roc_label() {
        let series = make_bars(&[1.0]);
        assert_eq!(RateOfChange::new(close(&series), 10).unwrap().label(), "ROC(10)");
    }
}
