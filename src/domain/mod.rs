//! Core domain types and logic.

pub mod ohlcv;
pub mod num;
pub mod price_source;
pub mod bar_series;
pub mod cache;
pub mod indicator;
pub mod indicator_set;
pub mod config_validation;
pub mod error;
