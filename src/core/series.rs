//! Time-series documents and typed value lookup
//!
//! A series point is a tuple whose column meaning is given by the parallel
//! `types` array, never by a fixed offset. Every lookup goes through
//! [`TypedColumn`], which resolves the column once and fails closed.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::trace;

use super::master::MetricDescriptor;

/// Granularity key used by the fees table document
pub const HOURLY: &str = "hourly";

/// Which value column of a series to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Usd,
    Eth,
    Normalized,
    Value,
}

impl ValueKind {
    /// Type names accepted for this kind, in lookup order.
    pub fn type_names(self) -> &'static [&'static str] {
        match self {
            ValueKind::Usd => &["usd", "value_usd"],
            ValueKind::Eth => &["eth", "value_eth"],
            ValueKind::Normalized => &["normalized"],
            ValueKind::Value => &["value"],
        }
    }

    /// Column to display for `metric` under the current currency toggle.
    pub fn for_metric(metric: &MetricDescriptor, show_usd: bool) -> Self {
        match (metric.currency, show_usd) {
            (true, true) => ValueKind::Usd,
            (true, false) => ValueKind::Eth,
            (false, _) => ValueKind::Value,
        }
    }
}

/// One (chain, metric, timeframe) series, ordered oldest to newest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChainMetricSeries {
    pub types: Vec<String>,
    #[serde(default)]
    pub data: Vec<Vec<Option<f64>>>,
}

impl ChainMetricSeries {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Position of `kind` in `types`, if the series carries it.
    pub fn type_index(&self, kind: ValueKind) -> Option<usize> {
        kind.type_names()
            .iter()
            .find_map(|name| self.types.iter().position(|t| t == name))
    }

    /// Typed accessor for one column; `None` if the series lacks it.
    pub fn column(&self, kind: ValueKind) -> Option<TypedColumn<'_>> {
        self.type_index(kind).map(|index| TypedColumn {
            series: self,
            index,
        })
    }

    /// Index of the first point whose width disagrees with `types`.
    pub fn first_malformed_point(&self) -> Option<usize> {
        self.data.iter().position(|p| p.len() != self.types.len())
    }
}

/// A resolved value column of a series.
#[derive(Debug, Clone, Copy)]
pub struct TypedColumn<'a> {
    series: &'a ChainMetricSeries,
    index: usize,
}

impl TypedColumn<'_> {
    /// Value at array position `position` (0 = oldest).
    pub fn value_at(&self, position: usize) -> Option<f64> {
        let point = self.series.data.get(position)?;
        if point.len() != self.series.types.len() {
            trace!(position, width = point.len(), "Malformed series point");
            return None;
        }
        point
            .get(self.index)
            .copied()
            .flatten()
            .filter(|v| v.is_finite())
    }

    /// Value `offset` time units before the newest point.
    pub fn value_ago(&self, offset: usize) -> Option<f64> {
        let position = super::time_index::array_index(self.series.len(), offset)?;
        self.value_at(position)
    }
}

/// Read `kind` at backward `offset`, returning `None` on any shape problem.
pub fn get_series_value(
    series: &ChainMetricSeries,
    kind: ValueKind,
    offset: usize,
) -> Option<f64> {
    series.column(kind)?.value_ago(offset)
}

/// Series for one metric/timeframe, keyed by chain.
pub type SeriesByChain<'a> = BTreeMap<&'a str, &'a ChainMetricSeries>;

/// The "fees linechart" document: `chain_data[chain][metric][timeframe]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeesLinechart {
    #[serde(default)]
    pub chain_data: BTreeMap<String, BTreeMap<String, BTreeMap<String, ChainMetricSeries>>>,
}

impl FeesLinechart {
    pub fn series(&self, chain: &str, metric: &str, timeframe: &str) -> Option<&ChainMetricSeries> {
        self.chain_data.get(chain)?.get(metric)?.get(timeframe)
    }

    pub fn series_by_chain(&self, metric: &str, timeframe: &str) -> SeriesByChain<'_> {
        self.chain_data
            .iter()
            .filter_map(|(chain, metrics)| {
                let series = metrics.get(metric)?.get(timeframe)?;
                Some((chain.as_str(), series))
            })
            .collect()
    }

    pub fn chain_keys(&self) -> Vec<String> {
        self.chain_data.keys().cloned().collect()
    }

    pub(crate) fn all_series(&self) -> impl Iterator<Item = (&str, &ChainMetricSeries)> {
        self.chain_data.iter().flat_map(|(chain, metrics)| {
            metrics
                .values()
                .flat_map(|tf| tf.values())
                .map(move |s| (chain.as_str(), s))
        })
    }
}

/// The "fees table" document: `chain_data[chain]["hourly"][metric]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeesTable {
    #[serde(default)]
    pub chain_data: BTreeMap<String, BTreeMap<String, BTreeMap<String, ChainMetricSeries>>>,
}

impl FeesTable {
    pub fn series(&self, chain: &str, metric: &str) -> Option<&ChainMetricSeries> {
        self.chain_data.get(chain)?.get(HOURLY)?.get(metric)
    }

    pub fn series_by_chain(&self, metric: &str) -> SeriesByChain<'_> {
        self.chain_data
            .iter()
            .filter_map(|(chain, granularity)| {
                let series = granularity.get(HOURLY)?.get(metric)?;
                Some((chain.as_str(), series))
            })
            .collect()
    }

    pub fn chain_keys(&self) -> Vec<String> {
        self.chain_data.keys().cloned().collect()
    }

    pub(crate) fn all_series(&self) -> impl Iterator<Item = (&str, &ChainMetricSeries)> {
        self.chain_data.iter().flat_map(|(chain, granularity)| {
            granularity
                .values()
                .flat_map(|metrics| metrics.values())
                .map(move |s| (chain.as_str(), s))
        })
    }
}
