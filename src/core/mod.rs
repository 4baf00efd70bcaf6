//! Platform-agnostic core module - shared between web bindings and CLI

pub mod da;
pub mod error;
pub mod format;
pub mod master;
pub mod parser;
pub mod ranking;
pub mod selection;
pub mod series;
pub mod table;
pub mod time_index;

pub use da::{da_rows, reported_total, sort_layers, totals, DaBreakdown, DaMetric, DaRow, DaSortKey, TOTALS_KEY};
pub use error::{DocumentError, DocumentResult, StoreError};
pub use format::{format_optional, format_value, FormatOptions, ABSENT};
pub use master::{ChainInfo, MasterConfig, MetricDescriptor, UnitSpec};
pub use parser::{parse_da_breakdown, parse_fees_linechart, parse_fees_table, parse_master};
pub use ranking::{rank, RankQuery};
pub use selection::{FileStore, KeyValueStore, MemoryStore, SelectionState};
pub use series::{get_series_value, ChainMetricSeries, FeesLinechart, FeesTable, SeriesByChain, ValueKind};
pub use table::{build_fee_rows, RankedRow};
pub use time_index::{ago_label, resolve, TimeUnit};
