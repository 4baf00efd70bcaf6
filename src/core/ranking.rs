//! Chain ranking for the fees table
//!
//! Ordering rules, in priority order:
//! 1. selected chains before unselected ones
//! 2. chains with a value before chains without one (in both directions)
//! 3. by value: `ascending` means best first; higher raw values are better
//!    unless the metric sets `invert_normalization`
//! 4. ties keep input order (stable sort)

use std::cmp::Ordering;
use std::collections::BTreeSet;

use tracing::debug;

use super::master::MetricDescriptor;
use super::selection::SelectionState;
use super::series::{get_series_value, SeriesByChain, ValueKind};

/// Parameters for one ranking pass.
#[derive(Debug, Clone, Copy)]
pub struct RankQuery<'a> {
    pub metric: &'a MetricDescriptor,
    pub kind: ValueKind,
    /// Backward offset from the newest point
    pub offset: usize,
    pub selected: &'a BTreeSet<String>,
    pub ascending: bool,
}

impl<'a> RankQuery<'a> {
    pub fn from_selection(
        metric: &'a MetricDescriptor,
        selection: &'a SelectionState,
        offset: usize,
    ) -> Self {
        Self {
            metric,
            kind: ValueKind::for_metric(metric, selection.show_usd),
            offset,
            selected: &selection.selected_chains,
            ascending: selection.ascending,
        }
    }

    /// Whether raw values end up sorted smallest first.
    pub fn numeric_ascending(&self) -> bool {
        self.ascending == self.metric.invert_normalization
    }
}

/// Compare two optional values; absent values always sort last.
pub fn compare_optional(a: Option<f64>, b: Option<f64>, ascending: bool) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => {
            let ord = x.total_cmp(&y);
            if ascending {
                ord
            } else {
                ord.reverse()
            }
        }
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Order `chain_keys` for display.
pub fn rank(
    chain_keys: &[String],
    series_by_chain: &SeriesByChain<'_>,
    query: &RankQuery<'_>,
) -> Vec<String> {
    let mut entries: Vec<(&String, bool, Option<f64>)> = chain_keys
        .iter()
        .map(|key| {
            let value = series_by_chain
                .get(key.as_str())
                .and_then(|s| get_series_value(s, query.kind, query.offset));
            (key, query.selected.contains(key), value)
        })
        .collect();

    let numeric_ascending = query.numeric_ascending();
    entries.sort_by(|a, b| {
        b.1.cmp(&a.1)
            .then_with(|| compare_optional(a.2, b.2, numeric_ascending))
    });

    debug!(
        chains = entries.len(),
        with_value = entries.iter().filter(|e| e.2.is_some()).count(),
        offset = query.offset,
        numeric_ascending,
        "Ranked chains"
    );

    entries.into_iter().map(|(key, _, _)| key.clone()).collect()
}
