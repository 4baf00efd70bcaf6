//! Native document client for the fees API
//!
//! Fetches the API documents over HTTP (or from a local directory), caching
//! each body by location. A cached body is served while younger than
//! `max_age`; older bodies are revalidated, and if revalidation fails the
//! stale body keeps being served. Concurrent fetches of one resource race:
//! the last response written wins.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::future::try_join4;
use parking_lot::Mutex;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::core::{
    parse_da_breakdown, parse_fees_linechart, parse_fees_table, parse_master, DaBreakdown,
    DocumentError, FeesLinechart, FeesTable, MasterConfig,
};
use crate::fetch_state::{FetchState, Resource};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Document(#[from] DocumentError),
}

/// Where documents come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentSource {
    /// Base URL, e.g. `https://api.growthepie.xyz/v1`
    Http(String),
    /// Directory laid out like the API
    Dir(PathBuf),
}

impl DocumentSource {
    /// Cache key and display location of `resource`.
    pub fn location(&self, resource: Resource) -> String {
        match self {
            DocumentSource::Http(base) => {
                format!("{}/{}", base.trim_end_matches('/'), resource.path())
            }
            DocumentSource::Dir(dir) => dir.join(resource.path()).display().to_string(),
        }
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    body: Arc<str>,
    fetched_at: Instant,
}

/// Every document the dashboard renders.
#[derive(Debug, Clone)]
pub struct Dashboard {
    pub master: MasterConfig,
    pub linechart: FeesLinechart,
    pub table: FeesTable,
    pub da: DaBreakdown,
}

/// Caching document client. Clones share the cache and state.
#[derive(Clone)]
pub struct FeesClient {
    http: reqwest::Client,
    source: DocumentSource,
    max_age: Duration,
    cache: Arc<Mutex<HashMap<String, CacheEntry>>>,
    states: Arc<Mutex<BTreeMap<Resource, FetchState>>>,
}

impl FeesClient {
    pub fn new(source: DocumentSource, max_age: Duration) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        info!(?source, max_age_secs = max_age.as_secs(), "Document client ready");
        Ok(Self {
            http,
            source,
            max_age,
            cache: Arc::new(Mutex::new(HashMap::new())),
            states: Arc::new(Mutex::new(BTreeMap::new())),
        })
    }

    /// Current state of `resource`; never-requested resources are `Loading`.
    pub fn state(&self, resource: Resource) -> FetchState {
        self.states
            .lock()
            .get(&resource)
            .cloned()
            .unwrap_or(FetchState::Loading)
    }

    pub fn states(&self) -> Vec<(Resource, FetchState)> {
        Resource::ALL.iter().map(|r| (*r, self.state(*r))).collect()
    }

    fn set_state(&self, resource: Resource, state: FetchState) {
        self.states.lock().insert(resource, state);
    }

    /// Body of `resource`, from cache when fresh.
    pub async fn fetch_text(&self, resource: Resource) -> Result<Arc<str>, FetchError> {
        let location = self.source.location(resource);
        let cached = self.cache.lock().get(&location).cloned();

        if let Some(entry) = &cached {
            if entry.fetched_at.elapsed() < self.max_age {
                debug!(%resource, age_ms = entry.fetched_at.elapsed().as_millis() as u64, "Cache hit");
                return Ok(entry.body.clone());
            }
        } else {
            self.set_state(resource, FetchState::Loading);
        }

        match self.fetch_raw(&location).await {
            Ok(body) => {
                let body: Arc<str> = body.into();
                debug!(%resource, bytes = body.len(), "Fetched document");
                self.cache.lock().insert(
                    location,
                    CacheEntry {
                        body: body.clone(),
                        fetched_at: Instant::now(),
                    },
                );
                self.set_state(resource, FetchState::Ready);
                Ok(body)
            }
            Err(e) => match cached {
                Some(entry) => {
                    warn!(%resource, error = %e, "Revalidation failed, serving stale copy");
                    self.set_state(resource, FetchState::Stale(e.to_string()));
                    Ok(entry.body)
                }
                None => {
                    warn!(%resource, error = %e, "Fetch failed");
                    self.set_state(resource, FetchState::Failed(e.to_string()));
                    Err(e)
                }
            },
        }
    }

    async fn fetch_raw(&self, location: &str) -> Result<String, FetchError> {
        match &self.source {
            DocumentSource::Http(_) => {
                let resp = self.http.get(location).send().await?;
                let status = resp.status();
                if !status.is_success() {
                    return Err(FetchError::Status {
                        url: location.to_string(),
                        status: status.as_u16(),
                    });
                }
                Ok(resp.text().await?)
            }
            DocumentSource::Dir(_) => {
                tokio::fs::read_to_string(location)
                    .await
                    .map_err(|source| FetchError::Io {
                        path: PathBuf::from(location),
                        source,
                    })
            }
        }
    }

    pub async fn master(&self) -> Result<MasterConfig, FetchError> {
        Ok(parse_master(&self.fetch_text(Resource::Master).await?)?)
    }

    pub async fn fees_linechart(&self) -> Result<FeesLinechart, FetchError> {
        Ok(parse_fees_linechart(
            &self.fetch_text(Resource::FeesLinechart).await?,
        )?)
    }

    pub async fn fees_table(&self) -> Result<FeesTable, FetchError> {
        Ok(parse_fees_table(&self.fetch_text(Resource::FeesTable).await?)?)
    }

    pub async fn da_breakdown(&self) -> Result<DaBreakdown, FetchError> {
        Ok(parse_da_breakdown(
            &self.fetch_text(Resource::DaOverview).await?,
        )?)
    }

    /// Fetch all documents concurrently.
    pub async fn dashboard(&self) -> Result<Dashboard, FetchError> {
        let (master, linechart, table, da) = try_join4(
            self.master(),
            self.fees_linechart(),
            self.fees_table(),
            self.da_breakdown(),
        )
        .await?;
        Ok(Dashboard {
            master,
            linechart,
            table,
            da,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const MASTER: &str = r#"{ "fee_metrics": { "txcosts_median": {
        "name": "Median Fee", "currency": true, "invert_normalization": true, "priority": 1,
        "units": { "usd": { "decimals": 3, "prefix": "$" } }
    }}, "chains": {} }"#;

    fn write_docs(dir: &std::path::Path) {
        fs::create_dir_all(dir.join("fees")).unwrap();
        fs::write(dir.join("master.json"), MASTER).unwrap();
        fs::write(dir.join("fees/linechart.json"), r#"{ "chain_data": {} }"#).unwrap();
        fs::write(
            dir.join("fees/table.json"),
            r#"{ "chain_data": { "base": { "hourly": { "txcosts_median": {
                "types": ["unix", "value_usd"], "data": [[1, 0.002]] } } } } }"#,
        )
        .unwrap();
        fs::write(dir.join("da_overview.json"), r#"{ "data": { "da_breakdown": {} } }"#).unwrap();
    }

    #[test]
    fn test_http_location() {
        let source = DocumentSource::Http("https://api.example.org/v1/".into());
        assert_eq!(
            source.location(Resource::FeesTable),
            "https://api.example.org/v1/fees/table.json"
        );
    }

    #[tokio::test]
    async fn test_dashboard_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        write_docs(dir.path());
        let client =
            FeesClient::new(DocumentSource::Dir(dir.path().into()), Duration::from_secs(60)).unwrap();

        assert_eq!(client.state(Resource::Master), FetchState::Loading);
        let dashboard = client.dashboard().await.unwrap();
        assert!(dashboard.master.metric("txcosts_median").is_some());
        assert_eq!(dashboard.table.chain_keys(), ["base"]);
        assert!(client.states().iter().all(|(_, s)| *s == FetchState::Ready));
    }

    #[tokio::test]
    async fn test_fresh_cache_skips_source() {
        let dir = tempfile::tempdir().unwrap();
        write_docs(dir.path());
        let client =
            FeesClient::new(DocumentSource::Dir(dir.path().into()), Duration::from_secs(60)).unwrap();

        client.master().await.unwrap();
        fs::remove_file(dir.path().join("master.json")).unwrap();
        assert!(client.master().await.is_ok());
        assert_eq!(client.state(Resource::Master), FetchState::Ready);
    }

    #[tokio::test]
    async fn test_failed_revalidation_serves_stale() {
        let dir = tempfile::tempdir().unwrap();
        write_docs(dir.path());
        let client = FeesClient::new(DocumentSource::Dir(dir.path().into()), Duration::ZERO).unwrap();

        client.master().await.unwrap();
        fs::remove_file(dir.path().join("master.json")).unwrap();
        let master = client.master().await.unwrap();
        assert!(master.metric("txcosts_median").is_some());
        assert!(matches!(client.state(Resource::Master), FetchState::Stale(_)));
    }

    #[tokio::test]
    async fn test_missing_document_fails() {
        let dir = tempfile::tempdir().unwrap();
        let client =
            FeesClient::new(DocumentSource::Dir(dir.path().into()), Duration::from_secs(60)).unwrap();

        let err = client.da_breakdown().await.unwrap_err();
        assert!(matches!(err, FetchError::Io { .. }));
        assert!(matches!(client.state(Resource::DaOverview), FetchState::Failed(_)));
    }

    #[tokio::test]
    async fn test_bad_document_is_typed_error() {
        let dir = tempfile::tempdir().unwrap();
        write_docs(dir.path());
        fs::write(dir.path().join("master.json"), "[]").unwrap();
        let client =
            FeesClient::new(DocumentSource::Dir(dir.path().into()), Duration::from_secs(60)).unwrap();

        let err = client.master().await.unwrap_err();
        assert!(matches!(err, FetchError::Document(_)));
    }
}
