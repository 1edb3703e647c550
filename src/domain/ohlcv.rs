//! OHLCV bar representation.

use crate::domain::error::NumError;
use crate::domain::num::Numeric;
use crate::domain::price_source::mean;
use chrono::{DateTime, TimeDelta, Utc};

/// Price data of an instrument within `[start, end)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Bar<N: Numeric> {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub open: N,
    pub high: N,
    pub low: N,
    pub close: N,
    pub volume: N,
    pub trade_count: N,
}

impl<N: Numeric> Bar<N> {
    pub fn new(
        start: DateTime<Utc>,
        duration: TimeDelta,
        open: N,
        high: N,
        low: N,
        close: N,
        volume: N,
    ) -> Self {
        Self {
            start,
            end: start + duration,
            open,
            high,
            low,
            close,
            volume,
            trade_count: N::zero(),
        }
    }

    /// A bar opened by a single trade: OHLC all equal to `price`.
    pub fn from_trade(start: DateTime<Utc>, duration: TimeDelta, price: N, volume: N) -> Self {
        Self {
            trade_count: N::one(),
            ..Self::new(start, duration, price, price, price, price, volume)
        }
    }

    pub fn duration(&self) -> TimeDelta {
        self.end - self.start
    }

    /// (high + low + close) / 3
    pub fn typical_price(&self) -> Result<N, NumError> {
        mean(&[self.high, self.low, self.close])
    }

    /// max(high - low, |high - prev_close|, |low - prev_close|)
    pub fn true_range(&self, prev_close: N) -> Result<N, NumError> {
        let hl = self.high.try_sub(self.low)?.abs();
        let hc = self.high.try_sub(prev_close)?.abs();
        let lc = self.low.try_sub(prev_close)?.abs();
        Ok(hl.larger(hc).larger(lc))
    }

    /// New bar with `price` folded in; `volume` of `None` leaves volume as is.
    pub fn add_trade(&self, price: N, volume: Option<N>) -> Result<Self, NumError> {
        let volume = match volume {
            Some(v) => self.volume.try_add(v)?,
            None => self.volume,
        };
        Ok(Self {
            high: self.high.larger(price),
            low: self.low.smaller(price),
            close: price,
            volume,
            trade_count: self.trade_count.try_add(N::one())?,
            ..self.clone()
        })
    }

    /// Merges two bars into one spanning both intervals.
    pub fn aggregate(&self, other: &Bar<N>) -> Result<Self, NumError> {
        let this_first = self.start <= other.start;
        let other_last = other.end >= self.end;
        Ok(Self {
            start: if this_first { self.start } else { other.start },
            end: if other_last { other.end } else { self.end },
            open: if this_first { self.open } else { other.open },
            high: self.high.larger(other.high),
            low: self.low.smaller(other.low),
            close: if other_last { other.close } else { self.close },
            volume: self.volume.try_add(other.volume)?,
            trade_count: self.trade_count.try_add(other.trade_count)?,
        })
    }

    pub fn contains_instant(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant < self.end
    }

    pub fn overlaps(&self, other: &Bar<N>) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }
}
