#![allow(dead_code)]

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use samta::domain::bar_series::BarSeries;
use samta::domain::cache::CacheStrategy;
use samta::domain::indicator::NumIndicator;
use samta::domain::indicator::price::PriceIndicator;
use samta::domain::num::Numeric;
pub use samta::domain::ohlcv::Bar;
use std::sync::{Arc, Once};
use tracing_subscriber::EnvFilter;

static TRACING: Once = Once::new();

/// Routes library logs to the test output; filter with `RUST_LOG`.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
            )
            .with_test_writer()
            .try_init();
    });
}

pub fn day(i: usize) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + TimeDelta::days(i as i64)
}

pub fn flat_bar<N: Numeric>(i: usize, close: N) -> Bar<N> {
    Bar::new(
        day(i),
        TimeDelta::days(1),
        close,
        close,
        close,
        close,
        N::from_count(1000),
    )
}

pub fn make_series<N: Numeric>(closes: &[N], strategy: CacheStrategy) -> Arc<BarSeries<N>> {
    let bars = closes
        .iter()
        .enumerate()
        .map(|(i, &c)| flat_bar(i, c))
        .collect();
    Arc::new(BarSeries::from_bars(strategy, bars).unwrap())
}

pub fn close<N: Numeric>(series: &Arc<BarSeries<N>>) -> NumIndicator<N> {
    Arc::new(PriceIndicator::close(series))
}
