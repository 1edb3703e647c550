//! Raw bar fields as indicators.

use crate::domain::bar_series::{BarSeries, SeriesSnapshot};
use crate::domain::error::Result;
use crate::domain::indicator::Indicator;
use crate::domain::num::Numeric;
use crate::domain::price_source::PriceSource;
use std::sync::Arc;

/// Reads a [`PriceSource`] straight from the snapshot. Never caches.
#[derive(Debug)]
pub struct PriceIndicator<N: Numeric> {
    series: Arc<BarSeries<N>>,
    source: PriceSource,
}

impl<N: Numeric> PriceIndicator<N> {
    pub fn new(series: &Arc<BarSeries<N>>, source: PriceSource) -> Self {
        Self {
            series: Arc::clone(series),
            source,
        }
    }

    pub fn open(series: &Arc<BarSeries<N>>) -> Self {
        Self::new(series, PriceSource::Open)
    }

    pub fn high(series: &Arc<BarSeries<N>>) -> Self {
        Self::new(series, PriceSource::High)
    }

    pub fn low(series: &Arc<BarSeries<N>>) -> Self {
        Self::new(series, PriceSource::Low)
    }

    pub fn close(series: &Arc<BarSeries<N>>) -> Self {
        Self::new(series, PriceSource::Close)
    }

    pub fn volume(series: &Arc<BarSeries<N>>) -> Self {
        Self::new(series, PriceSource::Volume)
    }

    pub fn source(&self) -> PriceSource {
        self.source
    }
}

impl<N: Numeric> Indicator<N> for PriceIndicator<N> {
    type Output = N;

    fn series(&self) -> &Arc<BarSeries<N>> {
        &self.series
    }

    fn unstable_bound(&self) -> usize {
        0
    }

    fn value_at(&self, snapshot: &SeriesSnapshot<'_, N>, index: usize) -> Result<N> {
        let bar = snapshot.bar(index)?;
        Ok(self.source.extract(&bar)?)
    }

    fn label(&self) -> String {
        self.source.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::test_support::*;
    use crate::domain::ohlcv::Bar;
    use chrono::TimeDelta;

    #[test]
    fn close_follows_series() {
        let series = make_bars(&[10.0, 11.0, 12.0]);
        let close = PriceIndicator::close(&series);

        assert!((close.value(0).unwrap() - 10.0).abs() < 1e-10);
        assert!((close.value(2).unwrap() - 12.0).abs() < 1e-10);
        assert!(close.is_stable_at(0));
        assert_eq!(close.label(), "CLOSE");
    }

    #[test]
    fn sees_replaced_last_bar() {
        let series = make_bars(&[10.0, 11.0]);
        let close = PriceIndicator::close(&series);
        assert!((close.value(1).unwrap() - 11.0).abs() < 1e-10);

        series
            .replace_last(Bar::new(
                day(1),
                TimeDelta::days(1),
                11.0,
                15.0,
                11.0,
                14.0,
                1000.0,
            ))
            .unwrap();
        assert!((close.value(1).unwrap() - 14.0).abs() < 1e-10);
    }

    #[test]
    fn derived_source() {
        let series = make_ohlcv_bars(&[(10.0, 30.0, 5.0, 20.0, 100.0)]);
        let hl2 = PriceIndicator::new(&series, PriceSource::HL2);
        assert!((hl2.value(0).unwrap() - 17.5).abs() < 1e-10);

        let volume = PriceIndicator::volume(&series);
        assert!((volume.value(0).unwrap() - 100.0).abs() < 1e-10);
    }

    #[test]
    fn out_of_bounds() {
        let series = make_bars(&[10.0]);
        let close = PriceIndicator::close(&series);
        assert!(close.value(1).is_err());
    }
}
