//! Decoding of the API documents
//!
//! Each document is decoded into its typed form in one step. Structural
//! problems inside a series (points narrower or wider than `types`) do not
//! reject the document: lookups against such points fail closed, and the
//! first offender per series is logged.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, trace, warn};

use super::da::DaBreakdown;
use super::error::{DocumentError, DocumentResult};
use super::master::MasterConfig;
use super::series::{ChainMetricSeries, FeesLinechart, FeesTable};

const MASTER: &str = "master";
const FEES_LINECHART: &str = "fees linechart";
const FEES_TABLE: &str = "fees table";
const DA_OVERVIEW: &str = "DA overview";

fn decode<T: DeserializeOwned>(document: &'static str, text: &str) -> DocumentResult<T> {
    trace!(document, len = text.len(), "Decoding document");
    serde_json::from_str(text).map_err(|source| DocumentError::Decode { document, source })
}

fn report_malformed<'a>(
    document: &'static str,
    series: impl Iterator<Item = (&'a str, &'a ChainMetricSeries)>,
) -> usize {
    let mut malformed = 0;
    for (chain, s) in series {
        if let Some(point) = s.first_malformed_point() {
            malformed += 1;
            warn!(
                document,
                chain,
                point,
                width = s.data[point].len(),
                types = s.types.len(),
                "Series point width disagrees with types"
            );
        }
    }
    malformed
}

/// Decode the master config.
pub fn parse_master(text: &str) -> DocumentResult<MasterConfig> {
    let master: MasterConfig = decode(MASTER, text)?;
    if master.fee_metrics.is_empty() {
        return Err(DocumentError::Invalid {
            document: MASTER,
            reason: "no fee_metrics".to_string(),
        });
    }
    debug!(
        metrics = master.fee_metrics.len(),
        chains = master.chains.len(),
        "Parsed master config"
    );
    Ok(master)
}

/// Decode the fees linechart document.
pub fn parse_fees_linechart(text: &str) -> DocumentResult<FeesLinechart> {
    let doc: FeesLinechart = decode(FEES_LINECHART, text)?;
    let malformed = report_malformed(FEES_LINECHART, doc.all_series());
    debug!(chains = doc.chain_data.len(), malformed, "Parsed fees linechart");
    Ok(doc)
}

/// Decode the fees table document.
pub fn parse_fees_table(text: &str) -> DocumentResult<FeesTable> {
    let doc: FeesTable = decode(FEES_TABLE, text)?;
    let malformed = report_malformed(FEES_TABLE, doc.all_series());
    debug!(chains = doc.chain_data.len(), malformed, "Parsed fees table");
    Ok(doc)
}

/// Decode the DA breakdown, bare or wrapped as `{"data": {"da_breakdown": ...}}`.
pub fn parse_da_breakdown(text: &str) -> DocumentResult<DaBreakdown> {
    let mut root: Value = decode(DA_OVERVIEW, text)?;
    let body = match root.pointer_mut("/data/da_breakdown").map(Value::take) {
        Some(inner) => inner,
        None => root,
    };
    let breakdown: DaBreakdown = serde_json::from_value(body).map_err(|source| {
        DocumentError::Decode {
            document: DA_OVERVIEW,
            source,
        }
    })?;
    debug!(
        layers = breakdown.layer_keys().count(),
        timespans = breakdown.timespans().len(),
        "Parsed DA breakdown"
    );
    Ok(breakdown)
}
