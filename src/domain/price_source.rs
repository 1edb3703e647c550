//! Bar field selectors feeding indicators.

use crate::domain::error::NumError;
use crate::domain::num::Numeric;
use crate::domain::ohlcv::Bar;
use std::fmt;
use std::str::FromStr;

/// Value extracted from a [`Bar`] before it enters an indicator chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PriceSource {
    Open,
    High,
    Low,
    #[default]
    Close,
    Volume,
    TradeCount,
    /// Median price: `(high + low) / 2`.
    HL2,
    /// Typical price: `(high + low + close) / 3`.
    HLC3,
    /// Average price: `(open + high + low + close) / 4`.
    OHLC4,
    /// Weighted close: `(high + low + close + close) / 4`.
    HLCC4,
}

impl PriceSource {
    pub fn extract<N: Numeric>(self, bar: &Bar<N>) -> Result<N, NumError> {
        match self {
            Self::Open => Ok(bar.open),
            Self::High => Ok(bar.high),
            Self::Low => Ok(bar.low),
            Self::Close => Ok(bar.close),
            Self::Volume => Ok(bar.volume),
            Self::TradeCount => Ok(bar.trade_count),
            Self::HL2 => mean(&[bar.high, bar.low]),
            Self::HLC3 => mean(&[bar.high, bar.low, bar.close]),
            Self::OHLC4 => mean(&[bar.open, bar.high, bar.low, bar.close]),
            Self::HLCC4 => mean(&[bar.high, bar.low, bar.close, bar.close]),
        }
    }
}

pub(crate) fn mean<N: Numeric>(values: &[N]) -> Result<N, NumError> {
    let mut sum = N::zero();
    for value in values {
        sum = sum.try_add(*value)?;
    }
    sum.try_div(N::from_count(values.len()))
}

impl fmt::Display for PriceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Open => "OPEN",
            Self::High => "HIGH",
            Self::Low => "LOW",
            Self::Close => "CLOSE",
            Self::Volume => "VOLUME",
            Self::TradeCount => "TRADES",
            Self::HL2 => "HL2",
            Self::HLC3 => "HLC3",
            Self::OHLC4 => "OHLC4",
            Self::HLCC4 => "HLCC4",
        };
        f.write_str(name)
    }
}

impl FromStr for PriceSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "open" => Ok(Self::Open),
            "high" => Ok(Self::High),
            "low" => Ok(Self::Low),
            "close" => Ok(Self::Close),
            "volume" => Ok(Self::Volume),
            "trades" | "trade_count" => Ok(Self::TradeCount),
            "hl2" => Ok(Self::HL2),
            "hlc3" | "typical" => Ok(Self::HLC3),
            "ohlc4" => Ok(Self::OHLC4),
            "hlcc4" => Ok(Self::HLCC4),
            other => Err(format!("unknown price source '{other}'")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, TimeZone, Utc};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn bar() -> Bar<Decimal> {
        Bar::new(
            Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap(),
            TimeDelta::days(1),
            dec!(10),
            dec!(30),
            dec!(5),
            dec!(20),
            dec!(1500),
        )
    }

    #[test]
    fn extract_raw_fields() {
        let b = bar();
        assert_eq!(PriceSource::Open.extract(&b), Ok(dec!(10)));
        assert_eq!(PriceSource::High.extract(&b), Ok(dec!(30)));
        assert_eq!(PriceSource::Low.extract(&b), Ok(dec!(5)));
        assert_eq!(PriceSource::Close.extract(&b), Ok(dec!(20)));
        assert_eq!(PriceSource::Volume.extract(&b), Ok(dec!(1500)));
        assert_eq!(PriceSource::TradeCount.extract(&b), Ok(dec!(0)));
    }

    #[test]
    fn extract_hl2() {
        // (30 + 5) / 2 = 17.5
        assert_eq!(PriceSource::HL2.extract(&bar()), Ok(dec!(17.5)));
    }

    #[test]
    fn extract_hlc3_matches_typical_price() {
        let b = bar();
        assert_eq!(PriceSource::HLC3.extract(&b), b.typical_price());
    }

    #[test]
    fn extract_ohlc4() {
        // (10 + 30 + 5 + 20) / 4 = 16.25
        assert_eq!(PriceSource::OHLC4.extract(&bar()), Ok(dec!(16.25)));
    }

    #[test]
    fn extract_hlcc4() {
        // (30 + 5 + 20 + 20) / 4 = 18.75
        assert_eq!(PriceSource::HLCC4.extract(&bar()), Ok(dec!(18.75)));
    }

    #[test]
    fn parse_names() {
        assert_eq!("Close".parse::<PriceSource>(), Ok(PriceSource::Close));
        assert_eq!("typical".parse::<PriceSource>(), Ok(PriceSource::HLC3));
        assert!("mid".parse::<PriceSource>().is_err());
    }

    #[test]
    fn default_is_close() {
        assert_eq!(PriceSource::default(), PriceSource::Close);
        assert_eq!(PriceSource::default().to_string(), "CLOSE");
    }
}
