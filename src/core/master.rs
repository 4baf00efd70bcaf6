//! Master config document: metric descriptors and chain metadata
//!
//! Fetched once at start-up and treated as immutable for the session.
//! Rows are decoded one by one: a malformed metric or chain row is logged
//! and skipped, and `null` scalar fields read as their defaults.

use std::collections::{BTreeMap, HashMap};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::warn;

/// Decimals used when a descriptor lacks the requested unit.
pub const FALLBACK_DECIMALS: u32 = 2;

/// Unit key for USD-denominated currency values
pub const UNIT_USD: &str = "usd";
/// Unit key for ETH-denominated currency values
pub const UNIT_ETH: &str = "eth";
/// Unit key for non-currency metrics
pub const UNIT_VALUE: &str = "value";

/// Display parameters for one unit of a metric.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UnitSpec {
    #[serde(default)]
    pub decimals: Option<u32>,
    #[serde(default)]
    pub prefix: Option<String>,
    #[serde(default)]
    pub suffix: Option<String>,
}

/// Static per-metric configuration from `fee_metrics[key]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricDescriptor {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub currency: bool,
    /// Lower raw values are better (cost-like metrics)
    #[serde(default, deserialize_with = "null_as_default")]
    pub invert_normalization: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub priority: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub units: HashMap<String, UnitSpec>,
    #[serde(default)]
    pub category: Option<String>,
}

impl MetricDescriptor {
    /// Unit key for the current currency toggle.
    pub fn unit_key(&self, show_usd: bool) -> &'static str {
        match (self.currency, show_usd) {
            (true, true) => UNIT_USD,
            (true, false) => UNIT_ETH,
            (false, _) => UNIT_VALUE,
        }
    }

    pub fn unit(&self, key: &str) -> Option<&UnitSpec> {
        self.units.get(key)
    }

    /// Decimals for `key`, failing closed to [`FALLBACK_DECIMALS`].
    pub fn decimals(&self, key: &str) -> u32 {
        self.unit(key)
            .and_then(|u| u.decimals)
            .unwrap_or(FALLBACK_DECIMALS)
    }
}

/// Chain metadata from `chains[key]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChainInfo {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default)]
    pub name_short: Option<String>,
    /// Theme colours, passed through for display
    #[serde(default)]
    pub colors: Value,
}

/// The "master" config document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MasterConfig {
    #[serde(default, deserialize_with = "lenient_rows")]
    pub fee_metrics: BTreeMap<String, MetricDescriptor>,
    #[serde(default, deserialize_with = "lenient_rows")]
    pub chains: BTreeMap<String, ChainInfo>,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Keyed rows, dropping the ones that do not decode.
fn lenient_rows<'de, D, T>(deserializer: D) -> Result<BTreeMap<String, T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let raw: Option<BTreeMap<String, Value>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .filter_map(|(key, row)| match serde_json::from_value(row) {
            Ok(decoded) => Some((key, decoded)),
            Err(e) => {
                warn!(key = %key, error = %e, "Skipping malformed master row");
                None
            }
        })
        .collect())
}

impl MasterConfig {
    pub fn metric(&self, key: &str) -> Option<&MetricDescriptor> {
        self.fee_metrics.get(key)
    }

    /// Metric keys ordered by ascending priority, ties by key.
    pub fn metrics_by_priority(&self) -> Vec<&str> {
        let mut keys: Vec<(&str, i64)> = self
            .fee_metrics
            .iter()
            .map(|(k, m)| (k.as_str(), m.priority))
            .collect();
        keys.sort_by_key(|&(_, priority)| priority);
        keys.into_iter().map(|(k, _)| k).collect()
    }

    /// Human-readable chain name, falling back to the key itself.
    pub fn chain_name<'a>(&'a self, key: &'a str) -> &'a str {
        match self.chains.get(key) {
            Some(info) if !info.name.is_empty() => &info.name,
            _ => key,
        }
    }
}
