//! Shared, append-only bar series and the snapshots indicators evaluate on.
//!
//! Only the last bar may change after it is appended. Every write stamps the
//! written bar with a revision taken from the series version, which is bumped
//! exactly on last-bar replacement. Content, revision and version are published
//! together under one write lock, so a [`SeriesSnapshot`] never pairs a new
//! version with old content or the other way round.

use crate::domain::cache::CacheStrategy;
use crate::domain::error::{Result, SamtaError};
use crate::domain::num::Numeric;
use crate::domain::ohlcv::Bar;
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug)]
struct SeriesState<N: Numeric> {
    bars: Vec<Arc<Bar<N>>>,
    revisions: Vec<u64>,
    version: u64,
}

pub struct BarSeries<N: Numeric> {
    name: Option<String>,
    cache_strategy: CacheStrategy,
    state: RwLock<SeriesState<N>>,
}

impl<N: Numeric> BarSeries<N> {
    /// Creates an empty series. `cache_strategy` is the policy inherited by
    /// every caching indicator built on this series unless overridden.
    pub fn new(cache_strategy: CacheStrategy) -> Self {
        Self {
            name: None,
            cache_strategy,
            state: RwLock::new(SeriesState {
                bars: Vec::new(),
                revisions: Vec::new(),
                version: 0,
            }),
        }
    }

    pub fn from_bars(cache_strategy: CacheStrategy, bars: Vec<Bar<N>>) -> Result<Self> {
        let series = Self::new(cache_strategy);
        for bar in bars {
            series.append(bar)?;
        }
        Ok(series)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn cache_strategy(&self) -> CacheStrategy {
        self.cache_strategy
    }

    pub fn len(&self) -> usize {
        self.state.read().bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Monotonic counter bumped on every in-place replacement of the last bar.
    pub fn series_version(&self) -> u64 {
        self.state.read().version
    }

    pub fn get(&self, index: usize) -> Result<Arc<Bar<N>>> {
        let state = self.state.read();
        state
            .bars
            .get(index)
            .cloned()
            .ok_or(SamtaError::OutOfBounds {
                index,
                length: state.bars.len(),
            })
    }

    pub fn last(&self) -> Option<Arc<Bar<N>>> {
        self.state.read().bars.last().cloned()
    }

    pub fn append(&self, bar: Bar<N>) -> Result<()> {
        validate_interval(&bar)?;
        let mut state = self.state.write();
        if let Some(last) = state.bars.last() {
            if bar.start < last.end {
                return Err(SamtaError::InvalidBar {
                    reason: format!(
                        "bar starting at {} overlaps or precedes the last bar ending at {}",
                        bar.start, last.end
                    ),
                });
            }
        }
        let revision = state.version;
        state.bars.push(Arc::new(bar));
        state.revisions.push(revision);
        debug!(
            series = self.name.as_deref().unwrap_or(""),
            length = state.bars.len(),
            "bar appended"
        );
        Ok(())
    }

    /// Replaces the unclosed last bar and bumps the series version.
    pub fn replace_last(&self, bar: Bar<N>) -> Result<()> {
        validate_interval(&bar)?;
        let mut state = self.state.write();
        let Some(last) = state.bars.last() else {
            return Err(SamtaError::InvalidBar {
                reason: "cannot replace the last bar of an empty series".into(),
            });
        };
        if bar.start != last.start {
            return Err(SamtaError::InvalidBar {
                reason: format!(
                    "replacement starts at {} but the last bar starts at {}",
                    bar.start, last.start
                ),
            });
        }
        let version = state.version + 1;
        let last_index = state.bars.len() - 1;
        state.bars[last_index] = Arc::new(bar);
        state.revisions[last_index] = version;
        state.version = version;
        debug!(
            series = self.name.as_deref().unwrap_or(""),
            index = last_index,
            version,
            "last bar replaced"
        );
        Ok(())
    }

    /// Replaces the last bar when `bar` starts at the same instant, appends otherwise.
    pub fn upsert(&self, bar: Bar<N>) -> Result<()> {
        let same_start = self.last().is_some_and(|last| last.start == bar.start);
        if same_start {
            self.replace_last(bar)
        } else {
            self.append(bar)
        }
    }

    /// Captures length, version and the last bar in one consistent view.
    pub fn snapshot(&self) -> SeriesSnapshot<'_, N> {
        let state = self.state.read();
        let last = match (state.bars.last(), state.revisions.last()) {
            (Some(bar), Some(&revision)) => Some((Arc::clone(bar), revision)),
            _ => None,
        };
        SeriesSnapshot {
            series: self,
            length: state.bars.len(),
            version: state.version,
            last,
        }
    }
}

impl<N: Numeric> fmt::Debug for BarSeries<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.read();
        f.debug_struct("BarSeries")
            .field("name", &self.name)
            .field("cache_strategy", &self.cache_strategy)
            .field("length", &state.bars.len())
            .field("version", &state.version)
            .finish()
    }
}

fn validate_interval<N: Numeric>(bar: &Bar<N>) -> Result<()> {
    if bar.end <= bar.start {
        return Err(SamtaError::InvalidBar {
            reason: format!("bar end {} is not after its start {}", bar.end, bar.start),
        });
    }
    Ok(())
}

/// A consistent view of a [`BarSeries`] taken once per `value` call.
///
/// Bars below the snapshot's last index were already closed when the snapshot
/// was taken and are read from the live series; the last bar is held by the
/// snapshot itself together with its revision.
pub struct SeriesSnapshot<'a, N: Numeric> {
    series: &'a BarSeries<N>,
    length: usize,
    version: u64,
    last: Option<(Arc<Bar<N>>, u64)>,
}

impl<'a, N: Numeric> SeriesSnapshot<'a, N> {
    pub fn series(&self) -> &'a BarSeries<N> {
        self.series
    }

    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn last_index(&self) -> Option<usize> {
        self.length.checked_sub(1)
    }

    /// True when `index` refers to a bar that can no longer change.
    pub fn is_closed(&self, index: usize) -> bool {
        index + 1 < self.length
    }

    pub fn check_index(&self, index: usize) -> Result<()> {
        if index < self.length {
            Ok(())
        } else {
            Err(SamtaError::OutOfBounds {
                index,
                length: self.length,
            })
        }
    }

    pub fn bar(&self, index: usize) -> Result<Arc<Bar<N>>> {
        self.check_index(index)?;
        match &self.last {
            Some((bar, _)) if index + 1 == self.length => Ok(Arc::clone(bar)),
            _ => self.series.get(index),
        }
    }

    /// Revision of the bar at `index` as seen by this snapshot.
    pub fn revision(&self, index: usize) -> Option<u64> {
        if index >= self.length {
            return None;
        }
        match &self.last {
            Some((_, revision)) if index + 1 == self.length => Some(*revision),
            _ => self.series.state.read().revisions.get(index).copied(),
        }
    }
}
