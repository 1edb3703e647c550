//! RSI (Relative Strength Index) and its gain/loss inputs.
//!
//! Gain[i] = max(0, P[i] - P[i-1]), Loss[i] = max(0, P[i-1] - P[i]), both 0 at index 0.
//! Average gain/loss use Wilder's smoothing by default.
//!
//! Formula: RSI = 100 - (100 / (1 + avg_gain / avg_loss))
//! If avg_loss == 0: RSI = 100, or 0 when avg_gain is also 0 (flat input).

use crate::domain::bar_series::{BarSeries, SeriesSnapshot};
use crate::domain::cache::{CacheStrategy, IndicatorCache};
use crate::domain::error::Result;
use crate::domain::indicator::{Indicator, MovingAverageKind, NumIndicator, ensure_positive};
use crate::domain::num::Numeric;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Gain,
    Loss,
}

/// Positive part of the one-step change of `input`, upward or downward.
#[derive(Debug)]
pub struct GainLoss<N: Numeric> {
    input: NumIndicator<N>,
    direction: Direction,
    cache: IndicatorCache<N>,
}

impl<N: Numeric> GainLoss<N> {
    pub fn gain(input: NumIndicator<N>) -> Self {
        Self::new(input, Direction::Gain)
    }

    pub fn loss(input: NumIndicator<N>) -> Self {
        Self::new(input, Direction::Loss)
    }

    fn new(input: NumIndicator<N>, direction: Direction) -> Self {
        let cache = IndicatorCache::new(input.series().cache_strategy());
        Self {
            input,
            direction,
            cache,
        }
    }

    pub fn with_cache(mut self, strategy: CacheStrategy) -> Self {
        self.cache = IndicatorCache::new(strategy);
        self
    }
}

impl<N: Numeric> Indicator<N> for GainLoss<N> {
    type Output = N;

    fn series(&self) -> &Arc<BarSeries<N>> {
        self.input.series()
    }

    fn unstable_bound(&self) -> usize {
        self.input.unstable_bound() + 1
    }

    fn value_at(&self, snapshot: &SeriesSnapshot<'_, N>, index: usize) -> Result<N> {
        self.cache.get_or_compute(snapshot, index, || {
            if index == 0 {
                return Ok(N::zero());
            }
            let change = self
                .input
                .value_at(snapshot, index)?
                .try_sub(self.input.value_at(snapshot, index - 1)?)?;
            Ok(match self.direction {
                Direction::Gain => N::zero().larger(change),
                Direction::Loss => N::zero().larger(-change),
            })
        })
    }

    fn cache_strategy(&self) -> Option<CacheStrategy> {
        Some(self.cache.strategy())
    }

    fn label(&self) -> String {
        match self.direction {
            Direction::Gain => "GAIN".to_string(),
            Direction::Loss => "LOSS".to_string(),
        }
    }
}

#[derive(Debug)]
pub struct Rsi<N: Numeric> {
    period: usize,
    kind: MovingAverageKind,
    input: NumIndicator<N>,
    average_gain: NumIndicator<N>,
    average_loss: NumIndicator<N>,
    cache: IndicatorCache<N>,
}

impl<N: Numeric> Rsi<N> {
    pub fn new(input: NumIndicator<N>, period: usize) -> Result<Self> {
        Self::with_average(input, period, MovingAverageKind::Wilder)
    }

    pub fn with_average(
        input: NumIndicator<N>,
        period: usize,
        average: MovingAverageKind,
    ) -> Result<Self> {
        ensure_positive("period", period)?;
        let strategy = input.series().cache_strategy();
        Self::assemble(input, period, average, strategy)
    }

    /// Applies `strategy` to the RSI and to its gain, loss and averages.
    pub fn with_cache(self, strategy: CacheStrategy) -> Result<Self> {
        Self::assemble(self.input, self.period, self.kind, strategy)
    }

    fn assemble(
        input: NumIndicator<N>,
        period: usize,
        kind: MovingAverageKind,
        strategy: CacheStrategy,
    ) -> Result<Self> {
        let gain: NumIndicator<N> = Arc::new(GainLoss::gain(Arc::clone(&input)).with_cache(strategy));
        let loss: NumIndicator<N> = Arc::new(GainLoss::loss(Arc::clone(&input)).with_cache(strategy));
        Ok(Self {
            period,
            kind,
            average_gain: kind.build_cached(gain, period, strategy)?,
            average_loss: kind.build_cached(loss, period, strategy)?,
            input,
            cache: IndicatorCache::new(strategy),
        })
    }
}

impl<N: Numeric> Indicator<N> for Rsi<N> {
    type Output = N;

    fn series(&self) -> &Arc<BarSeries<N>> {
        self.average_gain.series()
    }

    fn unstable_bound(&self) -> usize {
        self.average_gain.unstable_bound()
    }

    fn value_at(&self, snapshot: &SeriesSnapshot<'_, N>, index: usize) -> Result<N> {
        self.cache.get_or_compute(snapshot, index, || {
            let gain = self.average_gain.value_at(snapshot, index)?;
            let loss = self.average_loss.value_at(snapshot, index)?;
            if loss.is_zero() {
                return Ok(if gain.is_zero() { N::zero() } else { N::hundred() });
            }
            let relative_strength = gain.try_div(loss)?;
            let hundred = N::hundred();
            Ok(hundred.try_sub(hundred.try_div(N::one().try_add(relative_strength)?)?)?)
        })
    }

    fn cache_strategy(&self) -> Option<CacheStrategy> {
        Some(self.cache.strategy())
    }

    fn label(&self) -> String {
        format!("RSI({})", self.period)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::test_support::*;
    use rust_decimal_macros::dec;

    #[test]
    fn gain_and_loss() {
        let series = make_bars(&[dec!(10), dec!(12), dec!(11), dec!(11)]);
        let gain = GainLoss::gain(close(&series));
        let loss = GainLoss::loss(close(&series));

        assert_eq!(values(&gain), vec![dec!(0), dec!(2), dec!(0), dec!(0)]);
        assert_eq!(values(&loss), vec![dec!(0), dec!(0), dec!(1), dec!(0)]);
        assert_eq!(gain.unstable_bound(), 1);
    }

    #[test]
    fn rsi_warmup_period() {
        let series = make_bars(&[100.0; 20]);
        let rsi = Rsi::new(close(&series), 14).unwrap();

        assert_eq!(rsi.unstable_bound(), 14);
        assert!(!rsi.is_stable_at(13));
        assert!(rsi.is_stable_at(14));
    }

    #[test]
    fn rsi_all_gains() {
        let prices: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
        let series = make_bars(&prices);
        let rsi = Rsi::new(close(&series), 14).unwrap();

        assert!((rsi.value(19).unwrap() - 100.0).abs() < 1e-10);
    }

    #[test]
    fn rsi_all_losses() {
        let prices: Vec<f64> = (0..20).map(|i| 100.0 - i as f64).collect();
        let series = make_bars(&prices);
        let rsi = Rsi::new(close(&series), 14).unwrap();

        assert!(rsi.value(19).unwrap().abs() < 1e-10);
    }

    #[test]
    fn rsi_flat_prices_is_zero() {
        let series = make_bars(&[dec!(50); 10]);
        let rsi = Rsi::new(close(&series), 5).unwrap();
        assert_eq!(rsi.value(9).unwrap(), dec!(0));
    }

    #[test]
    fn rsi_known_value() {
        let series = make_bars(&[dec!(10), dec!(12), dec!(11)]);
        let rsi = Rsi::with_average(close(&series), 2, MovingAverageKind::Simple).unwrap();

        // avg gain (2 + 0) / 2 = 1, avg loss (0 + 1) / 2 = 0.5, RS = 2
        // 100 - 100 / 3
        let expected = dec!(100) - dec!(100) / dec!(3);
        assert_eq!(rsi.value(2).unwrap(), expected);
    }

    #[test]
    fn rsi_stays_within_bounds() {
        let prices: Vec<f64> = (0..60).map(|i| 100.0 + (i as f64 * 0.7).sin() * 5.0).collect();
        let series = make_bars(&prices);
        let rsi = Rsi::new(close(&series), 14).unwrap();

        for v in values(&rsi) {
            assert!((0.0..=100.0).contains(&v));
        }
    }

    #[test]
    fn rsi_period_0() {
        let series = make_bars(&[1.0]);
        assert!(Rsi::new(close(&series), 0).is_err());
    }
}
