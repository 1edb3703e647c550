//! Constant indicator.

use crate::domain::bar_series::{BarSeries, SeriesSnapshot};
use crate::domain::error::Result;
use crate::domain::indicator::Indicator;
use crate::domain::num::Numeric;
use std::sync::Arc;

/// The same value at every index of the series.
#[derive(Debug)]
pub struct Constant<N: Numeric> {
    series: Arc<BarSeries<N>>,
    value: N,
}

impl<N: Numeric> Constant<N> {
    pub fn new(series: &Arc<BarSeries<N>>, value: N) -> Self {
        Self {
            series: Arc::clone(series),
            value,
        }
    }
}

impl<N: Numeric> Indicator<N> for Constant<N> {
    type Output = N;

    fn series(&self) -> &Arc<BarSeries<N>> {
        &self.series
    }

    fn unstable_bound(&self) -> usize {
        0
    }

    fn value_at(&self, _snapshot: &SeriesSnapshot<'_, N>, _index: usize) -> Result<N> {
        Ok(self.value)
    }

    fn label(&self) -> String {
        format!("CONST({})", self.value)
    }
}
