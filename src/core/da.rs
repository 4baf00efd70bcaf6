//! Data-availability layer breakdown: sorting and cross-layer totals
//!
//! The breakdown document is keyed by DA layer, then by timespan. A
//! synthetic `"totals"` layer carries the data source's own aggregate and is
//! never sorted as a row. Totals are read or summed from the precomputed
//! per-timespan values, never rebuilt from raw series.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::ranking::compare_optional;

/// Key of the synthetic aggregate layer
pub const TOTALS_KEY: &str = "totals";

/// A `{types, total}` block: one precomputed value per type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TypedTotal {
    #[serde(default)]
    pub types: Vec<String>,
    #[serde(default)]
    pub total: Vec<Option<f64>>,
}

impl TypedTotal {
    /// Value for the currency toggle, using the first column when the
    /// requested type is missing (e.g. byte counts).
    pub fn value(&self, show_usd: bool) -> Option<f64> {
        let wanted = if show_usd { "usd" } else { "eth" };
        let index = self.types.iter().position(|t| t == wanted).unwrap_or(0);
        self.total
            .get(index)
            .copied()
            .flatten()
            .filter(|v| v.is_finite())
    }
}

/// Chains posting to a layer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DaConsumers {
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub chains: serde_json::Value,
}

/// One layer's figures for one timespan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DaTimespanBreakdown {
    #[serde(default)]
    pub size: Option<TypedTotal>,
    #[serde(default)]
    pub fees: Option<TypedTotal>,
    #[serde(default)]
    pub fees_per_mb: Option<TypedTotal>,
    #[serde(default)]
    pub da_consumers: Option<DaConsumers>,
    /// Layer parameters, passed through for display
    #[serde(default)]
    pub fixed_params: Option<serde_json::Value>,
    /// Per-consumer chart data, passed through for display
    #[serde(default)]
    pub da_consumer_chart: Option<serde_json::Value>,
}

impl DaTimespanBreakdown {
    pub fn metric_value(&self, metric: DaMetric, show_usd: bool) -> Option<f64> {
        match metric {
            DaMetric::Size => self.size.as_ref()?.value(show_usd),
            DaMetric::Fees => self.fees.as_ref()?.value(show_usd),
            DaMetric::FeesPerMb => self.fees_per_mb.as_ref()?.value(show_usd),
            DaMetric::DaConsumers => self.da_consumers.as_ref().map(|c| c.count as f64),
        }
    }
}

/// The "DA overview breakdown" document: `layers[da_key][timespan]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DaBreakdown {
    pub layers: BTreeMap<String, BTreeMap<String, DaTimespanBreakdown>>,
}

impl DaBreakdown {
    pub fn get(&self, layer: &str, timespan: &str) -> Option<&DaTimespanBreakdown> {
        self.layers.get(layer)?.get(timespan)
    }

    /// Real layers, excluding the synthetic totals entry.
    pub fn layer_keys(&self) -> impl Iterator<Item = &str> {
        self.layers
            .keys()
            .map(String::as_str)
            .filter(|k| *k != TOTALS_KEY)
    }

    /// Timespans present on any layer.
    pub fn timespans(&self) -> Vec<&str> {
        let mut spans: Vec<&str> = self
            .layers
            .values()
            .flat_map(|t| t.keys().map(String::as_str))
            .collect();
        spans.sort_unstable();
        spans.dedup();
        spans
    }
}

/// Numeric DA metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DaMetric {
    Size,
    Fees,
    FeesPerMb,
    DaConsumers,
}

/// Sort column of the DA table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DaSortKey {
    Metric(DaMetric),
    Name,
}

impl FromStr for DaSortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "size" => Ok(Self::Metric(DaMetric::Size)),
            "fees" => Ok(Self::Metric(DaMetric::Fees)),
            "fees_per_mb" => Ok(Self::Metric(DaMetric::FeesPerMb)),
            "da_consumers" => Ok(Self::Metric(DaMetric::DaConsumers)),
            "name" => Ok(Self::Name),
            _ => Err(format!(
                "Unknown DA sort key: {s}. Use size, fees, fees_per_mb, da_consumers or name"
            )),
        }
    }
}

impl fmt::Display for DaSortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Metric(DaMetric::Size) => "size",
            Self::Metric(DaMetric::Fees) => "fees",
            Self::Metric(DaMetric::FeesPerMb) => "fees_per_mb",
            Self::Metric(DaMetric::DaConsumers) => "da_consumers",
            Self::Name => "name",
        };
        f.write_str(name)
    }
}

/// Layer keys for `timespan`, sorted by `sort_by`.
///
/// Layers without a value for the metric sort last in both directions;
/// ties keep key order.
pub fn sort_layers(
    breakdown: &DaBreakdown,
    timespan: &str,
    sort_by: DaSortKey,
    ascending: bool,
    show_usd: bool,
) -> Vec<String> {
    let mut keys: Vec<&str> = breakdown.layer_keys().collect();

    match sort_by {
        DaSortKey::Name => keys.sort_by(|a, b| if ascending { a.cmp(b) } else { b.cmp(a) }),
        DaSortKey::Metric(metric) => {
            let value = |key: &str| {
                breakdown
                    .get(key, timespan)
                    .and_then(|b| b.metric_value(metric, show_usd))
            };
            keys.sort_by(|a, b| compare_optional(value(*a), value(*b), ascending));
        }
    }

    debug!(timespan, sort_by = %sort_by, ascending, layers = keys.len(), "Sorted DA layers");
    keys.into_iter().map(str::to_string).collect()
}

/// Sum of `metric` over every real layer for `timespan`.
pub fn totals(breakdown: &DaBreakdown, timespan: &str, metric: DaMetric, show_usd: bool) -> f64 {
    breakdown
        .layer_keys()
        .filter_map(|key| breakdown.get(key, timespan)?.metric_value(metric, show_usd))
        .sum()
}

/// The data source's own aggregate from the `"totals"` layer.
pub fn reported_total(
    breakdown: &DaBreakdown,
    timespan: &str,
    metric: DaMetric,
    show_usd: bool,
) -> Option<f64> {
    breakdown
        .get(TOTALS_KEY, timespan)?
        .metric_value(metric, show_usd)
}

/// One row of the DA table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DaRow {
    pub key: String,
    pub size: Option<f64>,
    pub fees: Option<f64>,
    pub fees_per_mb: Option<f64>,
    pub consumers: Option<u64>,
    /// Percentage of all bytes posted in the timespan
    pub size_share: Option<f64>,
}

/// Sorted rows for `timespan`.
pub fn da_rows(
    breakdown: &DaBreakdown,
    timespan: &str,
    sort_by: DaSortKey,
    ascending: bool,
    show_usd: bool,
) -> Vec<DaRow> {
    let total_size = totals(breakdown, timespan, DaMetric::Size, show_usd);

    sort_layers(breakdown, timespan, sort_by, ascending, show_usd)
        .into_iter()
        .map(|key| {
            let entry = breakdown.get(&key, timespan);
            let metric = |m: DaMetric| entry.and_then(|e| e.metric_value(m, show_usd));
            let size = metric(DaMetric::Size);
            DaRow {
                size,
                fees: metric(DaMetric::Fees),
                fees_per_mb: metric(DaMetric::FeesPerMb),
                consumers: entry.and_then(|e| e.da_consumers.as_ref()).map(|c| c.count),
                size_share: size
                    .filter(|_| total_size > 0.0)
                    .map(|s| s / total_size * 100.0),
                key,
            }
        })
        .collect()
}
