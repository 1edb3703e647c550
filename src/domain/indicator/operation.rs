//! Element-wise arithmetic over indicators.
//!
//! Operations are cacheless: they combine the upstream values at the same
//! index, so their warm-up bound is the largest bound among their inputs.

use crate::domain::bar_series::{BarSeries, SeriesSnapshot};
use crate::domain::error::Result;
use crate::domain::indicator::{Indicator, NumIndicator, ensure_same_series};
use crate::domain::num::Numeric;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Min,
    Max,
}

impl BinaryOperator {
    pub fn apply<N: Numeric>(self, left: N, right: N) -> Result<N> {
        Ok(match self {
            BinaryOperator::Add => left.try_add(right)?,
            BinaryOperator::Subtract => left.try_sub(right)?,
            BinaryOperator::Multiply => left.try_mul(right)?,
            BinaryOperator::Divide => left.try_div(right)?,
            BinaryOperator::Min => left.smaller(right),
            BinaryOperator::Max => left.larger(right),
        })
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BinaryOperator::Add => "ADD",
            BinaryOperator::Subtract => "SUB",
            BinaryOperator::Multiply => "MUL",
            BinaryOperator::Divide => "DIV",
            BinaryOperator::Min => "MIN",
            BinaryOperator::Max => "MAX",
        };
        f.write_str(name)
    }
}

#[derive(Debug)]
pub struct BinaryOperation<N: Numeric> {
    left: NumIndicator<N>,
    right: NumIndicator<N>,
    operator: BinaryOperator,
}

impl<N: Numeric> BinaryOperation<N> {
    pub fn new(left: NumIndicator<N>, right: NumIndicator<N>, operator: BinaryOperator) -> Result<Self> {
        ensure_same_series(left.series(), right.series())?;
        Ok(Self {
            left,
            right,
            operator,
        })
    }

    pub fn add(left: NumIndicator<N>, right: NumIndicator<N>) -> Result<Self> {
        Self::new(left, right, BinaryOperator::Add)
    }

    pub fn subtract(left: NumIndicator<N>, right: NumIndicator<N>) -> Result<Self> {
        Self::new(left, right, BinaryOperator::Subtract)
    }

    pub fn multiply(left: NumIndicator<N>, right: NumIndicator<N>) -> Result<Self> {
        Self::new(left, right, BinaryOperator::Multiply)
    }

    pub fn divide(left: NumIndicator<N>, right: NumIndicator<N>) -> Result<Self> {
        Self::new(left, right, BinaryOperator::Divide)
    }
}

impl<N: Numeric> Indicator<N> for BinaryOperation<N> {
    type Output = N;

    fn series(&self) -> &Arc<BarSeries<N>> {
        self.left.series()
    }

    fn unstable_bound(&self) -> usize {
        self.left.unstable_bound().max(self.right.unstable_bound())
    }

    fn value_at(&self, snapshot: &SeriesSnapshot<'_, N>, index: usize) -> Result<N> {
        let left = self.left.value_at(snapshot, index)?;
        let right = self.right.value_at(snapshot, index)?;
        self.operator.apply(left, right)
    }

    fn label(&self) -> String {
        format!(
            "{}({},{})",
            self.operator,
            self.left.label(),
            self.right.label()
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOperator {
    Abs,
    Negate,
    Square,
    Sqrt,
}

impl UnaryOperator {
    pub fn apply<N: Numeric>(self, value: N) -> Result<N> {
        Ok(match self {
            UnaryOperator::Abs => value.abs(),
            UnaryOperator::Negate => -value,
            UnaryOperator::Square => value.try_square()?,
            UnaryOperator::Sqrt => value.try_sqrt()?,
        })
    }
}

impl fmt::Display for UnaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UnaryOperator::Abs => "ABS",
            UnaryOperator::Negate => "NEG",
            UnaryOperator::Square => "SQUARE",
            UnaryOperator::Sqrt => "SQRT",
        };
        f.write_str(name)
    }
}

#[derive(Debug)]
pub struct UnaryOperation<N: Numeric> {
    input: NumIndicator<N>,
    operator: UnaryOperator,
}

impl<N: Numeric> UnaryOperation<N> {
    pub fn new(input: NumIndicator<N>, operator: UnaryOperator) -> Self {
        Self { input, operator }
    }
}

impl<N: Numeric> Indicator<N> for UnaryOperation<N> {
    type Output = N;

    fn series(&self) -> &Arc<BarSeries<N>> {
        self.input.series()
    }

    fn unstable_bound(&self) -> usize {
        self.input.unstable_bound()
    }

    fn value_at(&self, snapshot: &SeriesSnapshot<'_, N>, index: usize) -> Result<N> {
        self.operator.apply(self.input.value_at(snapshot, index)?)
    }

    fn label(&self) -> String {
        format!("{}({})", self.operator, self.input.label())
    }
}
