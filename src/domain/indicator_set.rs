//! Named indicator graphs.
//!
//! An [`IndicatorSet`] is built from [`IndicatorDefinition`]s that reference
//! each other by name. Inputs that name no definition but parse as a
//! [`PriceSource`] (`close`, `hl2`, ...) resolve to price indicators.
//! Every problem with the graph (unknown input, wrong arity, bad parameter,
//! duplicate name, cycle) is reported when the set is built, never during
//! evaluation.

use crate::domain::bar_series::BarSeries;
use crate::domain::cache::CacheStrategy;
use crate::domain::config_validation::load_indicator_definitions;
use crate::domain::error::{Result, SamtaError};
use crate::domain::indicator::bollinger::{BollingerBand, BollingerBands};
use crate::domain::indicator::constant::Constant;
use crate::domain::indicator::ema::Ema;
use crate::domain::indicator::macd::Macd;
use crate::domain::indicator::obv::OnBalanceVolume;
use crate::domain::indicator::operation::{BinaryOperation, BinaryOperator, UnaryOperation, UnaryOperator};
use crate::domain::indicator::previous::Previous;
use crate::domain::indicator::price::PriceIndicator;
use crate::domain::indicator::roc::RateOfChange;
use crate::domain::indicator::rsi::{GainLoss, Rsi};
use crate::domain::indicator::sma::Sma;
use crate::domain::indicator::stddev::{StandardDeviation, Variance};
use crate::domain::indicator::sum::RollingSum;
use crate::domain::indicator::true_range::{Atr, TrueRange};
use crate::domain::indicator::wma::Wma;
use crate::domain::indicator::{IndicatorType, NumIndicator};
use crate::domain::num::Numeric;
use crate::domain::price_source::PriceSource;
use crate::ports::config_port::ConfigPort;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndicatorDefinition {
    pub name: String,
    pub kind: IndicatorType,
    /// Names of upstream indicators, in the order the kind expects them.
    pub inputs: Vec<String>,
    /// Overrides the series' default cache strategy.
    pub cache: Option<CacheStrategy>,
}

impl IndicatorDefinition {
    pub fn new(name: impl Into<String>, kind: IndicatorType, inputs: &[&str]) -> Self {
        Self {
            name: name.into(),
            kind,
            inputs: inputs.iter().map(|s| s.to_string()).collect(),
            cache: None,
        }
    }

    pub fn with_cache(mut self, strategy: CacheStrategy) -> Self {
        self.cache = Some(strategy);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visit {
    InProgress,
    Done,
}

pub struct IndicatorSet<N: Numeric> {
    series: Arc<BarSeries<N>>,
    indicators: HashMap<String, NumIndicator<N>>,
    order: Vec<String>,
}

impl<N: Numeric> IndicatorSet<N> {
    pub fn build(series: &Arc<BarSeries<N>>, definitions: Vec<IndicatorDefinition>) -> Result<Self> {
        let mut by_name: HashMap<String, IndicatorDefinition> = HashMap::new();
        let mut declared = Vec::with_capacity(definitions.len());
        for definition in definitions {
            if definition.inputs.len() != definition.kind.arity() {
                return Err(SamtaError::configuration(format!(
                    "indicator '{}' ({}) takes {} input(s), got {}",
                    definition.name,
                    definition.kind,
                    definition.kind.arity(),
                    definition.inputs.len()
                )));
            }
            if by_name.contains_key(&definition.name) {
                return Err(SamtaError::configuration(format!(
                    "indicator '{}' is defined more than once",
                    definition.name
                )));
            }
            declared.push(definition.name.clone());
            by_name.insert(definition.name.clone(), definition);
        }

        let mut builder = Builder {
            series,
            definitions: &by_name,
            visits: HashMap::new(),
            path: Vec::new(),
            built: HashMap::new(),
            prices: HashMap::new(),
            order: Vec::new(),
        };
        for name in &declared {
            builder.resolve(name)?;
        }

        Ok(Self {
            series: Arc::clone(series),
            indicators: builder.built,
            order: builder.order,
        })
    }

    /// Builds the set described by the `[indicator.<name>]` sections of `config`.
    pub fn from_config(series: &Arc<BarSeries<N>>, config: &dyn ConfigPort) -> Result<Self> {
        Self::build(series, load_indicator_definitions(config)?)
    }

    pub fn series(&self) -> &Arc<BarSeries<N>> {
        &self.series
    }

    pub fn get(&self, name: &str) -> Option<&NumIndicator<N>> {
        self.indicators.get(name)
    }

    /// Names in dependency order: every indicator follows its inputs.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Every named value at `index`, all computed against one snapshot.
    pub fn values_at(&self, index: usize) -> Result<Vec<(String, N)>> {
        let snapshot = self.series.snapshot();
        snapshot.check_index(index)?;
        self.order
            .iter()
            .filter_map(|name| self.indicators.get(name).map(|ind| (name, ind)))
            .map(|(name, indicator)| Ok((name.clone(), indicator.value_at(&snapshot, index)?)))
            .collect()
    }
}

struct Builder<'a, N: Numeric> {
    series: &'a Arc<BarSeries<N>>,
    definitions: &'a HashMap<String, IndicatorDefinition>,
    visits: HashMap<String, Visit>,
    path: Vec<String>,
    built: HashMap<String, NumIndicator<N>>,
    prices: HashMap<PriceSource, NumIndicator<N>>,
    order: Vec<String>,
}

impl<N: Numeric> Builder<'_, N> {
    fn resolve(&mut self, name: &str) -> Result<NumIndicator<N>> {
        if let Some(indicator) = self.built.get(name) {
            return Ok(Arc::clone(indicator));
        }
        let definitions = self.definitions;
        let Some(definition) = definitions.get(name) else {
            return self.implicit_price(name);
        };
        if self.visits.get(name) == Some(&Visit::InProgress) {
            let start = self.path.iter().position(|n| n == name).unwrap_or(0);
            let mut cycle: Vec<&str> = self.path[start..].iter().map(String::as_str).collect();
            cycle.push(name);
            return Err(SamtaError::configuration(format!(
                "dependency cycle: {}",
                cycle.join(" -> ")
            )));
        }

        self.visits.insert(name.to_string(), Visit::InProgress);
        self.path.push(name.to_string());
        let mut inputs = Vec::with_capacity(definition.inputs.len());
        for input in &definition.inputs {
            inputs.push(self.resolve(input)?);
        }
        self.path.pop();

        let indicator = instantiate(self.series, definition, inputs).map_err(|e| match e {
            SamtaError::Configuration { reason } => {
                SamtaError::configuration(format!("indicator '{}': {}", name, reason))
            }
            other => other,
        })?;
        debug!(name, kind = %definition.kind, "indicator built");
        self.visits.insert(name.to_string(), Visit::Done);
        self.built.insert(name.to_string(), Arc::clone(&indicator));
        self.order.push(name.to_string());
        Ok(indicator)
    }

    fn implicit_price(&mut self, name: &str) -> Result<NumIndicator<N>> {
        let source: PriceSource = name.parse().map_err(|_| {
            let referrer = self.path.last().map(String::as_str).unwrap_or("?");
            SamtaError::configuration(format!(
                "indicator '{}' references unknown input '{}'",
                referrer, name
            ))
        })?;
        let series = self.series;
        let price = self
            .prices
            .entry(source)
            .or_insert_with(|| Arc::new(PriceIndicator::new(series, source)));
        Ok(Arc::clone(price))
    }
}

fn band_multiplier<N: Numeric>(stddev_mult_x100: u32) -> Result<N> {
    Ok(N::from_count(stddev_mult_x100 as usize).try_div(N::hundred())?)
}

fn instantiate<N: Numeric>(
    series: &Arc<BarSeries<N>>,
    definition: &IndicatorDefinition,
    inputs: Vec<NumIndicator<N>>,
) -> Result<NumIndicator<N>> {
    let cache = definition.cache.unwrap_or(series.cache_strategy());
    let mut inputs = inputs.into_iter();
    let mut next_input = || {
        inputs
            .next()
            .ok_or_else(|| SamtaError::configuration("missing input"))
    };

    let binary = |operator: BinaryOperator, left: NumIndicator<N>, right: NumIndicator<N>| {
        BinaryOperation::new(left, right, operator).map(|op| Arc::new(op) as NumIndicator<N>)
    };
    let unary = |operator: UnaryOperator, input: NumIndicator<N>| -> NumIndicator<N> {
        Arc::new(UnaryOperation::new(input, operator))
    };

    let indicator: NumIndicator<N> = match &definition.kind {
        IndicatorType::Price(source) => Arc::new(PriceIndicator::new(series, *source)),
        IndicatorType::Constant(raw) => {
            let value = N::parse_decimal(raw)
                .map_err(|e| SamtaError::configuration(format!("constant '{}': {}", raw, e)))?;
            Arc::new(Constant::new(series, value))
        }
        IndicatorType::Previous(n) => Arc::new(Previous::new(next_input()?, *n)?),
        IndicatorType::Add => binary(BinaryOperator::Add, next_input()?, next_input()?)?,
        IndicatorType::Subtract => binary(BinaryOperator::Subtract, next_input()?, next_input()?)?,
        IndicatorType::Multiply => binary(BinaryOperator::Multiply, next_input()?, next_input()?)?,
        IndicatorType::Divide => binary(BinaryOperator::Divide, next_input()?, next_input()?)?,
        IndicatorType::Min => binary(BinaryOperator::Min, next_input()?, next_input()?)?,
        IndicatorType::Max => binary(BinaryOperator::Max, next_input()?, next_input()?)?,
        IndicatorType::Abs => unary(UnaryOperator::Abs, next_input()?),
        IndicatorType::Negate => unary(UnaryOperator::Negate, next_input()?),
        IndicatorType::Square => unary(UnaryOperator::Square, next_input()?),
        IndicatorType::Sqrt => unary(UnaryOperator::Sqrt, next_input()?),
        IndicatorType::Sum(period) => {
            Arc::new(RollingSum::new(next_input()?, *period)?.with_cache(cache))
        }
        IndicatorType::Sma(period) => Arc::new(Sma::new(next_input()?, *period)?.with_cache(cache)),
        IndicatorType::Ema(period) => Arc::new(Ema::new(next_input()?, *period)?.with_cache(cache)),
        IndicatorType::Wilder(period) => {
            Arc::new(Ema::wilder(next_input()?, *period)?.with_cache(cache))
        }
        IndicatorType::Wma(period) => Arc::new(Wma::new(next_input()?, *period)?.with_cache(cache)),
        IndicatorType::Variance { period, unbiased } => Arc::new(
            Variance::new(next_input()?, *period)?
                .unbiased(*unbiased)
                .with_cache(cache),
        ),
        IndicatorType::Stddev { period, unbiased } => Arc::new(
            StandardDeviation::new(next_input()?, *period)?
                .unbiased(*unbiased)
                .with_cache(cache),
        ),
        IndicatorType::Bollinger {
            period,
            stddev_mult_x100,
            band,
        } => {
            let multiplier = band_multiplier(*stddev_mult_x100)?;
            let bands = BollingerBands::new(next_input()?, *period, multiplier)?.with_cache(cache)?;
            Arc::new(BollingerBand::new(Arc::new(bands), *band))
        }
        IndicatorType::TrueRange => Arc::new(TrueRange::new(series).with_cache(cache)),
        IndicatorType::Atr(period) => Arc::new(Atr::new(series, *period)?.with_cache(cache)?),
        IndicatorType::Gain => Arc::new(GainLoss::gain(next_input()?).with_cache(cache)),
        IndicatorType::Loss => Arc::new(GainLoss::loss(next_input()?).with_cache(cache)),
        IndicatorType::Rsi(period) => Arc::new(Rsi::new(next_input()?, *period)?.with_cache(cache)?),
        IndicatorType::Macd { fast, slow } => {
            Arc::new(Macd::new(next_input()?, *fast, *slow)?.with_cache(cache)?)
        }
        IndicatorType::Roc(period) => {
            Arc::new(RateOfChange::new(next_input()?, *period)?.with_cache(cache))
        }
        IndicatorType::Obv => Arc::new(OnBalanceVolume::new(series).with_cache(cache)),
    };
    Ok(indicator)
}
