//! Numeric value abstraction.
//!
//! Every indicator is generic over [`Numeric`]. Plain arithmetic and sign
//! handling come from `num-traits`. Indicator arithmetic goes through the
//! checked operations (`try_add`, `try_mul`, division, square root,
//! conversions), which return [`NumError`] instead of producing infinities or
//! panicking on overflow, so numeric failures surface to the caller of
//! `value(index)`.
//!
//! Implementations are provided for `f64` and `rust_decimal::Decimal`.

use crate::domain::error::NumError;
use num_traits::{FromPrimitive, Signed, ToPrimitive};
use rust_decimal::{Decimal, MathematicalOps};
use std::fmt;
use std::str::FromStr;

pub trait Numeric:
    Signed
    + FromPrimitive
    + ToPrimitive
    + PartialOrd
    + Copy
    + Send
    + Sync
    + fmt::Debug
    + fmt::Display
    + 'static
{
    /// Exact conversion of a bar count or period length.
    fn from_count(count: usize) -> Self;

    fn try_from_f64(value: f64) -> Result<Self, NumError>;

    /// Parses a raw decimal representation such as `"101.25"`.
    fn parse_decimal(input: &str) -> Result<Self, NumError>;

    fn try_add(self, rhs: Self) -> Result<Self, NumError>;

    fn try_sub(self, rhs: Self) -> Result<Self, NumError>;

    fn try_mul(self, rhs: Self) -> Result<Self, NumError>;

    fn try_div(self, rhs: Self) -> Result<Self, NumError>;

    fn try_sqrt(self) -> Result<Self, NumError>;

    fn larger(self, other: Self) -> Self {
        if other > self { other } else { self }
    }

    fn smaller(self, other: Self) -> Self {
        if other < self { other } else { self }
    }

    fn try_square(self) -> Result<Self, NumError> {
        self.try_mul(self)
    }

    fn hundred() -> Self {
        Self::from_count(100)
    }
}

impl Numeric for f64 {
    fn from_count(count: usize) -> Self {
        count as f64
    }

    fn try_from_f64(value: f64) -> Result<Self, NumError> {
        if value.is_finite() {
            Ok(value)
        } else {
            Err(NumError::NotFinite)
        }
    }

    fn parse_decimal(input: &str) -> Result<Self, NumError> {
        let value: f64 = input.trim().parse().map_err(|_| NumError::Conversion {
            input: input.to_string(),
        })?;
        Self::try_from_f64(value)
    }

    fn try_add(self, rhs: Self) -> Result<Self, NumError> {
        Self::try_from_f64(self + rhs)
    }

    fn try_sub(self, rhs: Self) -> Result<Self, NumError> {
        Self::try_from_f64(self - rhs)
    }

    fn try_mul(self, rhs: Self) -> Result<Self, NumError> {
        Self::try_from_f64(self * rhs)
    }

    fn try_div(self, rhs: Self) -> Result<Self, NumError> {
        if rhs == 0.0 {
            return Err(NumError::DivisionByZero);
        }
        Self::try_from_f64(self / rhs)
    }

    fn try_sqrt(self) -> Result<Self, NumError> {
        if self < 0.0 {
            return Err(NumError::NegativeSquareRoot {
                value: self.to_string(),
            });
        }
        Ok(self.sqrt())
    }
}

impl Numeric for Decimal {
    fn from_count(count: usize) -> Self {
        Decimal::from(count as u64)
    }

    fn try_from_f64(value: f64) -> Result<Self, NumError> {
        <Decimal as FromPrimitive>::from_f64(value).ok_or_else(|| NumError::Conversion {
            input: value.to_string(),
        })
    }

    fn parse_decimal(input: &str) -> Result<Self, NumError> {
        Decimal::from_str(input.trim()).map_err(|_| NumError::Conversion {
            input: input.to_string(),
        })
    }

    fn try_add(self, rhs: Self) -> Result<Self, NumError> {
        self.checked_add(rhs).ok_or(NumError::Overflow)
    }

    fn try_sub(self, rhs: Self) -> Result<Self, NumError> {
        self.checked_sub(rhs).ok_or(NumError::Overflow)
    }

    fn try_mul(self, rhs: Self) -> Result<Self, NumError> {
        self.checked_mul(rhs).ok_or(NumError::Overflow)
    }

    fn try_div(self, rhs: Self) -> Result<Self, NumError> {
        if rhs.is_zero() {
            return Err(NumError::DivisionByZero);
        }
        self.checked_div(rhs).ok_or(NumError::NotFinite)
    }

    fn try_sqrt(self) -> Result<Self, NumError> {
        if self.is_sign_negative() && !self.is_zero() {
            return Err(NumError::NegativeSquareRoot {
                value: self.to_string(),
            });
        }
        MathematicalOps::sqrt(&self).ok_or(NumError::NotFinite)
    }
}
