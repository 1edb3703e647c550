//! Lagged view of another indicator.

use crate::domain::bar_series::{BarSeries, SeriesSnapshot};
use crate::domain::error::Result;
use crate::domain::indicator::{Indicator, NumIndicator, ensure_positive};
use crate::domain::num::Numeric;
use std::sync::Arc;

/// `input[i - n]`, clamped to index 0 during warm-up.
#[derive(Debug)]
pub struct Previous<N: Numeric> {
    input: NumIndicator<N>,
    n: usize,
}

impl<N: Numeric> Previous<N> {
    pub fn new(input: NumIndicator<N>, n: usize) -> Result<Self> {
        ensure_positive("n", n)?;
        Ok(Self { input, n })
    }
}

impl<N: Numeric> Indicator<N> for Previous<N> {
    type Output = N;

    fn series(&self) -> &Arc<BarSeries<N>> {
        self.input.series()
    }

    fn unstable_bound(&self) -> usize {
        self.input.unstable_bound() + self.n
    }

    fn value_at(&self, snapshot: &SeriesSnapshot<'_, N>, index: usize) -> Result<N> {
        self.input.value_at(snapshot, index.saturating_sub(self.n))
    }

    fn label(&self) -> String {
        format!("PREV({},{})", self.input.label(), self.n)
    }
}
