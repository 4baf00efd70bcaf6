//! Browser bindings
//!
//! JSON in, JSON out. Documents are fetched by the page and handed over as
//! text; selection state lives in `localStorage`.

use std::fmt::Display;

use tracing::{debug, warn};
use wasm_bindgen::prelude::*;

use crate::core::series::HOURLY;
use crate::core::{
    build_fee_rows, da_rows, format_optional, parse_da_breakdown, parse_fees_linechart,
    parse_fees_table, parse_master, resolve, DaSortKey, FormatOptions, KeyValueStore,
    MetricDescriptor, SelectionState, StoreError,
};

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();

    // Initialize tracing for browser console
    tracing_wasm::set_as_global_default();
}

fn js_error(e: impl Display) -> JsValue {
    js_sys::Error::new(&e.to_string()).into()
}

/// `KeyValueStore` over `window.localStorage`.
struct LocalStore {
    storage: Option<web_sys::Storage>,
}

impl LocalStore {
    fn open() -> Self {
        let storage = web_sys::window().and_then(|w| w.local_storage().ok().flatten());
        if storage.is_none() {
            warn!("localStorage unavailable, selection will not persist");
        }
        Self { storage }
    }
}

impl KeyValueStore for LocalStore {
    fn get(&self, key: &str) -> Option<String> {
        self.storage.as_ref()?.get_item(key).ok().flatten()
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        let storage = self
            .storage
            .as_ref()
            .ok_or_else(|| StoreError::Unavailable("localStorage unavailable".to_string()))?;
        storage
            .set_item(key, &value)
            .map_err(|e| StoreError::Unavailable(format!("{:?}", e)))
    }
}

#[wasm_bindgen]
pub fn format_metric_value(
    value: Option<f64>,
    metric_json: &str,
    show_usd: bool,
    show_gwei: bool,
    show_cents: bool,
    is_axis_label: bool,
) -> Result<String, JsValue> {
    let metric: MetricDescriptor = serde_json::from_str(metric_json).map_err(js_error)?;
    let opts = FormatOptions {
        show_usd,
        show_gwei,
        show_cents,
        is_axis_label,
    };
    Ok(format_optional(value, &metric, opts))
}

#[wasm_bindgen]
pub fn gradient_color(percentage: f64, weighted: bool) -> String {
    crate::theme::gradient_color(percentage, weighted)
}

#[wasm_bindgen]
pub fn resolve_time_offset(
    hover_index: Option<u32>,
    selected_index: u32,
    series_len: u32,
) -> Option<u32> {
    resolve(
        hover_index.map(|h| h as usize),
        selected_index as usize,
        series_len as usize,
    )
    .map(|offset| offset as u32)
}

/// Ranked fee rows as JSON. `series_json` is the fees table document for the
/// hourly timeframe and the linechart document otherwise.
#[wasm_bindgen]
pub fn rank_fee_chains(
    master_json: &str,
    series_json: &str,
    selection_json: &str,
    weighted: bool,
) -> Result<String, JsValue> {
    let master = parse_master(master_json).map_err(js_error)?;
    let selection: SelectionState = serde_json::from_str(selection_json).map_err(js_error)?;

    let rows = if selection.timeframe == HOURLY {
        let table = parse_fees_table(series_json).map_err(js_error)?;
        let by_chain = table.series_by_chain(&selection.metric);
        let len = by_chain.values().map(|s| s.len()).max().unwrap_or(0);
        match selection.time_offset(len) {
            Some(offset) => build_fee_rows(
                &master,
                &table.chain_keys(),
                &by_chain,
                &selection,
                offset,
                weighted,
            ),
            None => Vec::new(),
        }
    } else {
        let chart = parse_fees_linechart(series_json).map_err(js_error)?;
        let by_chain = chart.series_by_chain(&selection.metric, &selection.timeframe);
        let len = by_chain.values().map(|s| s.len()).max().unwrap_or(0);
        match selection.time_offset(len) {
            Some(offset) => build_fee_rows(
                &master,
                &chart.chain_keys(),
                &by_chain,
                &selection,
                offset,
                weighted,
            ),
            None => Vec::new(),
        }
    };

    debug!(rows = rows.len(), "rank_fee_chains");
    serde_json::to_string(&rows).map_err(js_error)
}

/// Sorted DA rows as JSON.
#[wasm_bindgen]
pub fn sort_da_layers(
    breakdown_json: &str,
    timespan: &str,
    sort_by: &str,
    ascending: bool,
    show_usd: bool,
) -> Result<String, JsValue> {
    let breakdown = parse_da_breakdown(breakdown_json).map_err(js_error)?;
    let sort_by: DaSortKey = sort_by.parse().map_err(js_error)?;
    let rows = da_rows(&breakdown, timespan, sort_by, ascending, show_usd);
    serde_json::to_string(&rows).map_err(js_error)
}

/// Stored selection merged over defaults, as JSON.
#[wasm_bindgen]
pub fn load_selection() -> Result<String, JsValue> {
    let store = LocalStore::open();
    serde_json::to_string(&SelectionState::load(&store)).map_err(js_error)
}

#[wasm_bindgen]
pub fn save_selection(selection_json: &str) -> Result<(), JsValue> {
    let selection: SelectionState = serde_json::from_str(selection_json).map_err(js_error)?;
    let mut store = LocalStore::open();
    selection.save(&mut store).map_err(js_error)
}
