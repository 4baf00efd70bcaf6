//! Terminal front-end for the L2 fees dashboard
//!
//! Run with: cargo run --features cli --bin fees-cli -- fees

#[cfg(not(target_arch = "wasm32"))]
mod cli {
    use std::path::PathBuf;
    use std::time::Duration;

    use clap::{Parser, Subcommand};
    use l2_fees_dash::client::{DocumentSource, FeesClient};
    use l2_fees_dash::core::series::HOURLY;
    use l2_fees_dash::core::{
        ago_label, build_fee_rows, da_rows, format_optional, reported_total, totals, DaMetric,
        DaBreakdown, DaSortKey, FileStore, MasterConfig, MetricDescriptor, SelectionState,
        SeriesByChain, TimeUnit, UnitSpec, ABSENT,
    };
    use tracing::{error, info, warn};

    pub const DEFAULT_API: &str = "https://api.growthepie.xyz/v1";

    #[derive(Debug, Parser)]
    #[command(name = "fees-cli")]
    #[command(about = "Rank L2 chains by transaction fees and break down DA layer usage")]
    pub struct Args {
        /// API base URL
        #[arg(long, env = "L2FEES_API", default_value = DEFAULT_API)]
        pub api: String,

        /// Read documents from this directory instead of the API
        #[arg(long)]
        pub data_dir: Option<PathBuf>,

        /// Persisted selection file
        #[arg(long, env = "L2FEES_STATE", default_value = "fees-selection.json")]
        pub state_file: PathBuf,

        /// Seconds a fetched document is served before revalidation
        #[arg(long, default_value = "300")]
        pub max_age_secs: u64,

        /// Re-render every N seconds until interrupted
        #[arg(long)]
        pub refresh_secs: Option<u64>,

        #[command(subcommand)]
        pub command: Command,
    }

    #[derive(Debug, Subcommand)]
    pub enum Command {
        /// Fees table for one metric
        Fees(FeesArgs),
        /// DA layer breakdown for one timespan
        Da(DaArgs),
        /// List fee metrics by priority
        Metrics,
    }

    #[derive(Debug, clap::Args)]
    pub struct FeesArgs {
        /// Metric key (defaults to the stored selection)
        #[arg(long)]
        pub metric: Option<String>,

        /// Series bucket; "hourly" reads the fees table, others the linechart
        #[arg(long, default_value = HOURLY)]
        pub timeframe: String,

        /// Show the point N units before the newest one
        #[arg(long)]
        pub hours_ago: Option<usize>,

        /// Show ETH values (persisted)
        #[arg(long, conflicts_with = "usd")]
        pub eth: bool,

        /// Show USD values (persisted)
        #[arg(long)]
        pub usd: bool,

        /// Show USD values in cents (persisted)
        #[arg(long, conflicts_with = "no_cents")]
        pub cents: bool,

        /// Show USD values in dollars (persisted)
        #[arg(long)]
        pub no_cents: bool,

        /// Show ETH values in gwei
        #[arg(long)]
        pub gwei: bool,

        /// Worst first
        #[arg(long)]
        pub descending: bool,

        /// Comma-separated chain keys pinned to the top (persisted, replaces the set)
        #[arg(long, value_delimiter = ',')]
        pub select: Option<Vec<String>>,

        /// Use the weighted color table
        #[arg(long)]
        pub weighted: bool,
    }

    #[derive(Debug, clap::Args)]
    pub struct DaArgs {
        #[arg(long, default_value = "1d")]
        pub timespan: String,

        /// size, fees, fees_per_mb, da_consumers or name
        #[arg(long, default_value = "size")]
        pub sort: DaSortKey,

        #[arg(long)]
        pub ascending: bool,

        /// Show fees in ETH
        #[arg(long)]
        pub eth: bool,
    }

    type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

    /// Apply command-line toggles; returns whether a persisted field changed.
    fn apply_fees_args(selection: &mut SelectionState, args: &FeesArgs) -> bool {
        let before = (
            selection.show_usd,
            selection.show_cents,
            selection.selected_chains.clone(),
        );

        if args.eth {
            selection.show_usd = false;
        } else if args.usd {
            selection.show_usd = true;
        }
        if args.cents {
            selection.show_cents = true;
        } else if args.no_cents {
            selection.show_cents = false;
        }
        if let Some(keys) = &args.select {
            selection.selected_chains = keys
                .iter()
                .map(|k| k.trim())
                .filter(|k| !k.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(metric) = &args.metric {
            selection.metric = metric.clone();
        }
        selection.timeframe = args.timeframe.clone();
        selection.show_gwei = args.gwei;
        selection.ascending = !args.descending;

        before
            != (
                selection.show_usd,
                selection.show_cents,
                selection.selected_chains.clone(),
            )
    }

    /// Slider position `hours_ago` units before the newest point. Positions
    /// older than the series map past the end so the lookup reports no data.
    fn hover_for_hours_ago(series_len: usize, hours_ago: usize) -> usize {
        series_len
            .checked_sub(hours_ago)
            .and_then(|n| n.checked_sub(1))
            .unwrap_or(series_len)
    }

    fn render_fees(
        master: &MasterConfig,
        chain_keys: &[String],
        series_by_chain: &SeriesByChain<'_>,
        selection: &mut SelectionState,
        hours_ago: Option<usize>,
        weighted: bool,
    ) {
        let series_len = series_by_chain.values().map(|s| s.len()).max().unwrap_or(0);
        selection.slider_index = series_len.saturating_sub(1);
        selection.hover_index = hours_ago.map(|h| hover_for_hours_ago(series_len, h));

        let Some(offset) = selection.time_offset(series_len) else {
            println!("No data for {} / {}", selection.metric, selection.timeframe);
            return;
        };

        let rows = build_fee_rows(master, chain_keys, series_by_chain, selection, offset, weighted);
        let metric_name = master
            .metric(&selection.metric)
            .map(|m| m.name.as_str())
            .unwrap_or(selection.metric.as_str());
        let unit = TimeUnit::for_timeframe(&selection.timeframe);

        println!(
            "{} ({}, {})",
            metric_name,
            selection.timeframe,
            ago_label(offset, unit)
        );
        for (i, row) in rows.iter().enumerate() {
            println!(
                "{:>3} {} {:<24} {:>18}  {}",
                i + 1,
                if row.is_selected { '*' } else { ' ' },
                row.display_name,
                row.display_value,
                row.color_hex.as_deref().unwrap_or("-"),
            );
        }
    }

    fn da_descriptor(show_usd: bool) -> MetricDescriptor {
        let unit = if show_usd {
            ("usd", 2, "$")
        } else {
            ("eth", 4, "Ξ")
        };
        MetricDescriptor {
            name: "DA fees".to_string(),
            currency: true,
            units: [(
                unit.0.to_string(),
                UnitSpec {
                    decimals: Some(unit.1),
                    prefix: Some(unit.2.to_string()),
                    suffix: None,
                },
            )]
            .into_iter()
            .collect(),
            ..Default::default()
        }
    }

    fn format_bytes(bytes: Option<f64>) -> String {
        let Some(b) = bytes else {
            return ABSENT.to_string();
        };
        const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
        let mut value = b;
        let mut unit = 0;
        while value >= 1000.0 && unit < UNITS.len() - 1 {
            value /= 1000.0;
            unit += 1;
        }
        format!("{:.2} {}", value, UNITS[unit])
    }

    fn render_da(breakdown: &DaBreakdown, args: &DaArgs) {
        let show_usd = !args.eth;
        let fees_metric = da_descriptor(show_usd);
        let opts = SelectionState {
            show_usd,
            ..Default::default()
        }
        .format_options(false);

        let rows = da_rows(breakdown, &args.timespan, args.sort, args.ascending, show_usd);
        if rows.is_empty() {
            println!("No DA layers for timespan {}", args.timespan);
            return;
        }

        println!("DA layers ({}, sorted by {})", args.timespan, args.sort);
        for row in &rows {
            println!(
                "{:<24} {:>12} {:>7} {:>14} {:>14}/MB {:>5}",
                row.key,
                format_bytes(row.size),
                row.size_share
                    .map(|s| format!("{:.1}%", s))
                    .unwrap_or_else(|| ABSENT.to_string()),
                format_optional(row.fees, &fees_metric, opts),
                format_optional(row.fees_per_mb, &fees_metric, opts),
                row.consumers
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| ABSENT.to_string()),
            );
        }

        let size_sum = totals(breakdown, &args.timespan, DaMetric::Size, show_usd);
        let fees_sum = totals(breakdown, &args.timespan, DaMetric::Fees, show_usd);
        println!(
            "{:<24} {:>12} {:>7} {:>14}",
            "total",
            format_bytes(Some(size_sum)),
            "",
            format_optional(Some(fees_sum), &fees_metric, opts),
        );
        if let Some(reported) = reported_total(breakdown, &args.timespan, DaMetric::Size, show_usd) {
            if (reported - size_sum).abs() > 1e-6 * reported.abs().max(1.0) {
                warn!(reported, summed = size_sum, "Reported DA size total differs from layer sum");
            }
        }
    }

    fn render_metrics(master: &MasterConfig) {
        for key in master.metrics_by_priority() {
            let Some(metric) = master.metric(key) else {
                continue;
            };
            println!(
                "{:>3} {:<24} {:<28} {:<8} {}",
                metric.priority,
                key,
                metric.name,
                if metric.currency { "currency" } else { "value" },
                if metric.invert_normalization {
                    "lower is better"
                } else {
                    "higher is better"
                },
            );
        }
    }

    async fn render(client: &FeesClient, args: &Args, store: &mut FileStore) -> CliResult<()> {
        match &args.command {
            Command::Fees(fees) => {
                let mut selection = SelectionState::load(store);
                if apply_fees_args(&mut selection, fees) {
                    selection.save(store)?;
                    info!(path = %store.path().display(), "Selection saved");
                }

                let master = client.master().await?;
                if fees.timeframe == HOURLY {
                    let table = client.fees_table().await?;
                    render_fees(
                        &master,
                        &table.chain_keys(),
                        &table.series_by_chain(&selection.metric),
                        &mut selection,
                        fees.hours_ago,
                        fees.weighted,
                    );
                } else {
                    let chart = client.fees_linechart().await?;
                    render_fees(
                        &master,
                        &chart.chain_keys(),
                        &chart.series_by_chain(&selection.metric, &fees.timeframe),
                        &mut selection,
                        fees.hours_ago,
                        fees.weighted,
                    );
                }
            }
            Command::Da(da) => {
                let breakdown = client.da_breakdown().await?;
                render_da(&breakdown, da);
            }
            Command::Metrics => {
                let master = client.master().await?;
                render_metrics(&master);
            }
        }
        Ok(())
    }

    pub async fn run(args: Args) -> CliResult<()> {
        let source = match &args.data_dir {
            Some(dir) => DocumentSource::Dir(dir.clone()),
            None => DocumentSource::Http(args.api.clone()),
        };
        let client = FeesClient::new(source, Duration::from_secs(args.max_age_secs))?;
        let mut store = FileStore::open(&args.state_file);

        render(&client, &args, &mut store).await?;

        let Some(secs) = args.refresh_secs.filter(|s| *s > 0) else {
            return Ok(());
        };

        let mut interval = tokio::time::interval(Duration::from_secs(secs));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        interval.tick().await;

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if let Err(e) = render(&client, &args, &mut store).await {
                        error!(error = %e, "Refresh failed");
                    }
                    for (resource, state) in client.states() {
                        if let Some(reason) = state.error() {
                            warn!(%resource, %state, reason, "Resource not fresh");
                        }
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Interrupted");
                    break;
                }
            }
        }
        Ok(())
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use l2_fees_dash::core::KeyValueStore;

        fn fees_args(argv: &[&str]) -> FeesArgs {
            let mut full = vec!["fees-cli", "fees"];
            full.extend_from_slice(argv);
            match Args::parse_from(full).command {
                Command::Fees(f) => f,
                other => panic!("unexpected command {other:?}"),
            }
        }

        #[test]
        fn test_toggles_mark_selection_dirty() {
            let mut selection = SelectionState::default();
            assert!(!apply_fees_args(&mut selection, &fees_args(&[])));
            assert!(selection.ascending);

            assert!(apply_fees_args(
                &mut selection,
                &fees_args(&["--eth", "--select", "base, zora", "--descending"])
            ));
            assert!(!selection.show_usd);
            assert!(!selection.ascending);
            assert_eq!(selection.selected_chains.len(), 2);
            assert!(selection.selected_chains.contains("zora"));
        }

        #[test]
        fn test_da_sort_key_parses() {
            let args = Args::parse_from(["fees-cli", "da", "--sort", "fees_per_mb"]);
            match args.command {
                Command::Da(da) => {
                    assert_eq!(da.sort, DaSortKey::Metric(DaMetric::FeesPerMb));
                    assert_eq!(da.timespan, "1d");
                }
                other => panic!("unexpected command {other:?}"),
            }
        }

        #[test]
        fn test_hours_ago_maps_to_slider() {
            assert_eq!(hover_for_hours_ago(24, 0), 23);
            assert_eq!(hover_for_hours_ago(24, 23), 0);
            assert_eq!(hover_for_hours_ago(24, 24), 24);
            assert_eq!(hover_for_hours_ago(24, usize::MAX), 24);
            assert_eq!(hover_for_hours_ago(0, 0), 0);

            let selection = SelectionState {
                slider_index: 23,
                hover_index: Some(hover_for_hours_ago(24, usize::MAX)),
                ..Default::default()
            };
            assert_eq!(selection.time_offset(24), None);
        }

        #[test]
        fn test_format_bytes() {
            assert_eq!(format_bytes(Some(1_500_000.0)), "1.50 MB");
            assert_eq!(format_bytes(Some(12.0)), "12.00 B");
            assert_eq!(format_bytes(None), ABSENT);
        }

        #[test]
        fn test_selection_file_round_trip() {
            let dir = tempfile::tempdir().unwrap();
            let mut store = FileStore::open(dir.path().join("s.json"));
            store.set("showUsd", "false".into()).unwrap();
            assert!(!SelectionState::load(&store).show_usd);
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    use clap::Parser;
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,l2_fees_dash=debug,fees_cli=debug"));
    fmt().with_env_filter(filter).with_target(true).init();

    let args = cli::Args::parse();
    cli::run(args).await
}

#[cfg(target_arch = "wasm32")]
fn main() {}
