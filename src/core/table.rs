//! Fees table rows: ranking, formatting and coloring in one pass

use serde::Serialize;
use tracing::debug;

use super::format::format_optional;
use super::master::MasterConfig;
use super::ranking::{rank, RankQuery};
use super::selection::SelectionState;
use super::series::{get_series_value, SeriesByChain, ValueKind};
use crate::theme::gradient_color;

/// One display row of the fees table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedRow {
    pub chain_key: String,
    pub display_name: String,
    pub display_value: String,
    /// `None` when the chain has no value at this offset
    pub color_hex: Option<String>,
    pub is_selected: bool,
}

/// Build rows for `selection.metric` at backward `offset`, in ranked order.
///
/// The color percentage is the series' `normalized` column scaled to 0-100
/// when present. Otherwise values are min-max scaled across the ranked
/// chains so that the better end of the metric maps to 0.
pub fn build_fee_rows(
    master: &MasterConfig,
    chain_keys: &[String],
    series_by_chain: &SeriesByChain<'_>,
    selection: &SelectionState,
    offset: usize,
    weighted: bool,
) -> Vec<RankedRow> {
    let Some(metric) = master.metric(&selection.metric) else {
        debug!(metric = %selection.metric, "Unknown metric, no rows");
        return Vec::new();
    };

    let query = RankQuery::from_selection(metric, selection, offset);
    let ranked = rank(chain_keys, series_by_chain, &query);
    let opts = selection.format_options(false);

    let values: Vec<(Option<f64>, Option<f64>)> = ranked
        .iter()
        .map(|key| match series_by_chain.get(key.as_str()) {
            Some(series) => (
                get_series_value(series, query.kind, offset),
                get_series_value(series, ValueKind::Normalized, offset),
            ),
            None => (None, None),
        })
        .collect();

    let scale = MinMax::over(values.iter().filter_map(|(v, _)| *v));

    let rows: Vec<RankedRow> = ranked
        .iter()
        .zip(values)
        .map(|(key, (value, normalized))| {
            let percent = match (value, normalized) {
                (Some(_), Some(n)) => Some(n * 100.0),
                (Some(v), None) => scale.map(|s| s.percent(v, metric.invert_normalization)),
                (None, _) => None,
            };
            RankedRow {
                chain_key: key.clone(),
                display_name: master.chain_name(key).to_string(),
                display_value: format_optional(value, metric, opts),
                color_hex: percent.map(|p| gradient_color(p, weighted)),
                is_selected: selection.selected_chains.contains(key),
            }
        })
        .collect();

    debug!(
        metric = %selection.metric,
        offset,
        rows = rows.len(),
        colored = rows.iter().filter(|r| r.color_hex.is_some()).count(),
        "Built fee rows"
    );
    rows
}

#[derive(Debug, Clone, Copy)]
struct MinMax {
    min: f64,
    max: f64,
}

impl MinMax {
    fn over(values: impl Iterator<Item = f64>) -> Option<Self> {
        values.fold(None, |acc, v| match acc {
            None => Some(MinMax { min: v, max: v }),
            Some(m) => Some(MinMax {
                min: m.min.min(v),
                max: m.max.max(v),
            }),
        })
    }

    /// 0 is best: lowest value when lower is better, highest otherwise.
    fn percent(self, value: f64, lower_is_better: bool) -> f64 {
        let span = self.max - self.min;
        if span <= 0.0 {
            return 0.0;
        }
        let pct = (value - self.min) / span * 100.0;
        if lower_is_better {
            pct
        } else {
            100.0 - pct
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::series::FeesTable;

    const MASTER: &str = r#"{
        "fee_metrics": {
            "txcosts_median": {
                "name": "Median Fee",
                "currency": true,
                "invert_normalization": true,
                "priority": 1,
                "units": {
                    "usd": { "decimals": 3, "prefix": "$", "suffix": null },
                    "eth": { "decimals": 5, "prefix": "Ξ", "suffix": null }
                }
            },
            "tps": {
                "name": "Throughput",
                "currency": false,
                "invert_normalization": false,
                "priority": 2,
                "units": { "value": { "decimals": 1, "prefix": null, "suffix": " tps" } }
            }
        },
        "chains": {
            "optimism": { "name": "OP Mainnet", "colors": {} },
            "base": { "name": "Base", "colors": {} }
        }
    }"#;

    const TABLE: &str = r#"{
        "chain_data": {
            "optimism": { "hourly": {
                "txcosts_median": { "types": ["unix", "value_eth", "value_usd", "normalized"],
                                    "data": [[1, 0.000002, 0.004, 0.25]] },
                "tps": { "types": ["unix", "value"], "data": [[1, 10.0]] }
            }},
            "base": { "hourly": {
                "txcosts_median": { "types": ["unix", "value_eth", "value_usd", "normalized"],
                                    "data": [[1, 0.000001, 0.002, 0.0]] },
                "tps": { "types": ["unix", "value"], "data": [[1, 30.0]] }
            }},
            "zora": { "hourly": {
                "txcosts_median": { "types": ["unix", "value_eth", "value_usd"],
                                    "data": [[1, null, null]] },
                "tps": { "types": ["unix", "value"], "data": [[1, 20.0]] }
            }}
        }
    }"#;

    fn fixtures() -> (MasterConfig, FeesTable) {
        (
            serde_json::from_str(MASTER).unwrap(),
            serde_json::from_str(TABLE).unwrap(),
        )
    }

    #[test]
    fn test_rows_follow_ranking_and_format() {
        let (master, table) = fixtures();
        let selection = SelectionState::default();
        let rows = build_fee_rows(
            &master,
            &table.chain_keys(),
            &table.series_by_chain("txcosts_median"),
            &selection,
            0,
            false,
        );

        let keys: Vec<&str> = rows.iter().map(|r| r.chain_key.as_str()).collect();
        assert_eq!(keys, ["base", "optimism", "zora"]);
        assert_eq!(rows[0].display_name, "Base");
        assert_eq!(rows[0].display_value, "$0.002");
        assert_eq!(rows[2].display_name, "zora");
        assert_eq!(rows[2].display_value, "N/A");
        assert_eq!(rows[2].color_hex, None);
    }

    #[test]
    fn test_normalized_column_drives_color() {
        let (master, table) = fixtures();
        let rows = build_fee_rows(
            &master,
            &table.chain_keys(),
            &table.series_by_chain("txcosts_median"),
            &SelectionState::default(),
            0,
            false,
        );
        assert_eq!(rows[0].color_hex.as_deref(), Some("#1DF7EF"));
        assert_eq!(rows[1].color_hex, Some(gradient_color(25.0, false)));
    }

    #[test]
    fn test_min_max_color_puts_best_at_cyan() {
        let (master, table) = fixtures();
        let selection = SelectionState {
            metric: "tps".into(),
            ..Default::default()
        };
        let rows = build_fee_rows(
            &master,
            &table.chain_keys(),
            &table.series_by_chain("tps"),
            &selection,
            0,
            true,
        );

        let keys: Vec<&str> = rows.iter().map(|r| r.chain_key.as_str()).collect();
        assert_eq!(keys, ["base", "zora", "optimism"]);
        assert_eq!(rows[0].display_value, "30.0 tps");
        assert_eq!(rows[0].color_hex.as_deref(), Some("#1DF7EF"));
        assert_eq!(rows[2].color_hex.as_deref(), Some("#FE5468"));
        assert_eq!(rows[1].color_hex, Some(gradient_color(50.0, true)));
    }

    #[test]
    fn test_selected_rows_flagged_and_first() {
        let (master, table) = fixtures();
        let mut selection = SelectionState::default();
        selection.toggle_chain("zora");
        let rows = build_fee_rows(
            &master,
            &table.chain_keys(),
            &table.series_by_chain("txcosts_median"),
            &selection,
            0,
            false,
        );
        assert_eq!(rows[0].chain_key, "zora");
        assert!(rows[0].is_selected);
        assert!(rows[1..].iter().all(|r| !r.is_selected));
    }

    #[test]
    fn test_unknown_metric_yields_no_rows() {
        let (master, table) = fixtures();
        let selection = SelectionState {
            metric: "nope".into(),
            ..Default::default()
        };
        let rows = build_fee_rows(
            &master,
            &table.chain_keys(),
            &table.series_by_chain("nope"),
            &selection,
            0,
            false,
        );
        assert!(rows.is_empty());
    }
}
