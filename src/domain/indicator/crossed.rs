//! Crossing detection between two numeric indicators.
//!
//! `first` crosses up `second` at `i` when first[i] > second[i] and, looking
//! back past any indices where the two are equal, first was below second.
//! Crossing down is the mirror image.

use crate::domain::bar_series::{BarSeries, SeriesSnapshot};
use crate::domain::cache::{CacheStrategy, IndicatorCache};
use crate::domain::error::Result;
use crate::domain::indicator::{Indicator, NumIndicator, ensure_same_series};
use crate::domain::num::Numeric;
use std::cmp::Ordering;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrossDirection {
    Up,
    Down,
    Either,
}

#[derive(Debug)]
pub struct Crossed<N: Numeric> {
    first: NumIndicator<N>,
    second: NumIndicator<N>,
    direction: CrossDirection,
    cache: IndicatorCache<bool>,
}

impl<N: Numeric> Crossed<N> {
    pub fn new(
        first: NumIndicator<N>,
        second: NumIndicator<N>,
        direction: CrossDirection,
    ) -> Result<Self> {
        ensure_same_series(first.series(), second.series())?;
        let cache = IndicatorCache::new(first.series().cache_strategy());
        Ok(Self {
            first,
            second,
            direction,
            cache,
        })
    }

    pub fn up(first: NumIndicator<N>, second: NumIndicator<N>) -> Result<Self> {
        Self::new(first, second, CrossDirection::Up)
    }

    pub fn down(first: NumIndicator<N>, second: NumIndicator<N>) -> Result<Self> {
        Self::new(first, second, CrossDirection::Down)
    }

    pub fn with_cache(mut self, strategy: CacheStrategy) -> Self {
        self.cache = IndicatorCache::new(strategy);
        self
    }

    fn compare(&self, snapshot: &SeriesSnapshot<'_, N>, index: usize) -> Result<Option<Ordering>> {
        let first = self.first.value_at(snapshot, index)?;
        let second = self.second.value_at(snapshot, index)?;
        Ok(first.partial_cmp(&second))
    }

    /// True when the relation at `index` is `now` and the last non-equal
    /// relation before it was the opposite.
    fn crossed_into(
        &self,
        snapshot: &SeriesSnapshot<'_, N>,
        index: usize,
        now: Ordering,
    ) -> Result<bool> {
        if index == 0 || self.compare(snapshot, index)? != Some(now) {
            return Ok(false);
        }
        let mut i = index - 1;
        while i > 0 && self.compare(snapshot, i)? == Some(Ordering::Equal) {
            i -= 1;
        }
        Ok(self.compare(snapshot, i)? == Some(now.reverse()))
    }
}

impl<N: Numeric> Indicator<N> for Crossed<N> {
    type Output = bool;

    fn series(&self) -> &Arc<BarSeries<N>> {
        self.first.series()
    }

    fn unstable_bound(&self) -> usize {
        self.first.unstable_bound().max(self.second.unstable_bound())
    }

    fn value_at(&self, snapshot: &SeriesSnapshot<'_, N>, index: usize) -> Result<bool> {
        self.cache.get_or_compute(snapshot, index, || match self.direction {
            CrossDirection::Up => self.crossed_into(snapshot, index, Ordering::Greater),
            CrossDirection::Down => self.crossed_into(snapshot, index, Ordering::Less),
            CrossDirection::Either => Ok(self.crossed_into(snapshot, index, Ordering::Greater)?
                || self.crossed_into(snapshot, index, Ordering::Less)?),
        })
    }

    fn cache_strategy(&self) -> Option<CacheStrategy> {
        Some(self.cache.strategy())
    }

    fn label(&self) -> String {
        let name = match self.direction {
            CrossDirection::Up => "CROSSED_UP",
            CrossDirection::Down => "CROSSED_DOWN",
            CrossDirection::Either => "CROSSED",
        };
        format!("{}({},{})", name, self.first.label(), self.second.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::constant::Constant;
    use crate::domain::indicator::test_support::*;

    fn crossings(indicator: &Crossed<f64>) -> Vec<bool> {
        (0..indicator.series().len())
            .map(|i| indicator.value(i).unwrap())
            .collect()
    }

    #[test]
    fn crossed_up_through_constant() {
        let series = make_bars(&[8.0, 9.0, 11.0, 12.0, 9.0]);
        let level: NumIndicator<f64> = Arc::new(Constant::new(&series, 10.0));
        let up = Crossed::up(close(&series), level).unwrap();

        assert_eq!(crossings(&up), vec![false, false, true, false, false]);
    }

    #[test]
    fn crossed_down_through_constant() {
        let series = make_bars(&[8.0, 9.0, 11.0, 12.0, 9.0]);
        let level: NumIndicator<f64> = Arc::new(Constant::new(&series, 10.0));
        let down = Crossed::down(close(&series), level).unwrap();

        assert_eq!(crossings(&down), vec![false, false, false, false, true]);
    }

    #[test]
    fn touching_then_crossing_counts_once() {
        // below, equal, equal, above
        let series = make_bars(&[9.0, 10.0, 10.0, 11.0, 12.0]);
        let level: NumIndicator<f64> = Arc::new(Constant::new(&series, 10.0));
        let up = Crossed::up(close(&series), level).unwrap();

        assert_eq!(crossings(&up), vec![false, false, false, true, false]);
    }

    #[test]
    fn either_direction() {
        let series = make_bars(&[8.0, 11.0, 9.0]);
        let level: NumIndicator<f64> = Arc::new(Constant::new(&series, 10.0));
        let crossed = Crossed::new(close(&series), level, CrossDirection::Either).unwrap();

        assert_eq!(crossings(&crossed), vec![false, true, true]);
        assert_eq!(crossed.label(), "CROSSED(CLOSE,CONST(10))");
    }

    #[test]
    fn crossing_on_last_bar_follows_replacement() {
        use crate::domain::ohlcv::Bar;
        use chrono::TimeDelta;

        let series = make_bars(&[8.0, 9.0]);
        let level: NumIndicator<f64> = Arc::new(Constant::new(&series, 10.0));
        let up = Crossed::up(close(&series), level).unwrap();
        assert!(!up.value(1).unwrap());

        series
            .replace_last(Bar::new(day(1), TimeDelta::days(1), 9.0, 12.0, 9.0, 11.0, 1.0))
            .unwrap();
        assert!(up.value(1).unwrap());
    }
}
