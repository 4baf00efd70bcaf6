//! Per-session selection state and its persistence adapter
//!
//! `SelectionState` is passed explicitly into every pure function. Only the
//! currency toggles and the selected chain set are persisted, each as a
//! JSON-serialized value under a fixed key. Loading never fails: missing or
//! unreadable keys fall back to defaults.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::error::StoreError;
use super::format::FormatOptions;
use super::time_index::resolve;

pub const KEY_SHOW_USD: &str = "showUsd";
pub const KEY_SHOW_CENTS: &str = "showCents";
pub const KEY_SELECTED_CHAINS: &str = "feesSelectedChains";

pub const DEFAULT_METRIC: &str = "txcosts_median";
pub const DEFAULT_TIMEFRAME: &str = "hourly";
/// Rightmost slider position of a 24-point hourly series
pub const DEFAULT_SLIDER_INDEX: usize = 23;

/// Durable string key/value storage (browser local storage, a JSON file, ...)
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError>;

    /// Write several keys; stores that can apply them as a single write.
    fn set_many(&mut self, entries: Vec<(&str, String)>) -> Result<(), StoreError> {
        for (key, value) in entries {
            self.set(key, value)?;
        }
        Ok(())
    }
}

/// UI selection read by the ranking and DA views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SelectionState {
    pub selected_chains: BTreeSet<String>,
    pub metric: String,
    pub timeframe: String,
    /// Slider position, `len - 1` is the newest point
    pub slider_index: usize,
    /// Hovered position, overrides the slider while set
    pub hover_index: Option<usize>,
    pub show_usd: bool,
    pub show_cents: bool,
    pub show_gwei: bool,
    pub ascending: bool,
}

impl Default for SelectionState {
    fn default() -> Self {
        Self {
            selected_chains: BTreeSet::new(),
            metric: DEFAULT_METRIC.to_string(),
            timeframe: DEFAULT_TIMEFRAME.to_string(),
            slider_index: DEFAULT_SLIDER_INDEX,
            hover_index: None,
            show_usd: true,
            show_cents: false,
            show_gwei: false,
            ascending: true,
        }
    }
}

impl SelectionState {
    pub fn format_options(&self, is_axis_label: bool) -> FormatOptions {
        FormatOptions {
            show_usd: self.show_usd,
            show_gwei: self.show_gwei,
            show_cents: self.show_cents,
            is_axis_label,
        }
    }

    /// Backward offset into a series of `series_len` points.
    pub fn time_offset(&self, series_len: usize) -> Option<usize> {
        resolve(self.hover_index, self.slider_index, series_len)
    }

    /// Flip selection of `chain`; returns whether it is now selected.
    pub fn toggle_chain(&mut self, chain: &str) -> bool {
        if self.selected_chains.remove(chain) {
            false
        } else {
            self.selected_chains.insert(chain.to_string());
            true
        }
    }

    /// Restore persisted fields from `store` over the defaults.
    pub fn load(store: &dyn KeyValueStore) -> Self {
        let defaults = Self::default();
        let state = Self {
            show_usd: read_key(store, KEY_SHOW_USD).unwrap_or(defaults.show_usd),
            show_cents: read_key(store, KEY_SHOW_CENTS).unwrap_or(defaults.show_cents),
            selected_chains: read_key(store, KEY_SELECTED_CHAINS)
                .unwrap_or_else(|| defaults.selected_chains.clone()),
            ..defaults
        };
        debug!(
            show_usd = state.show_usd,
            show_cents = state.show_cents,
            selected = state.selected_chains.len(),
            "Loaded selection"
        );
        state
    }

    /// Persist the durable fields.
    pub fn save(&self, store: &mut dyn KeyValueStore) -> Result<(), StoreError> {
        store.set_many(vec![
            (KEY_SHOW_USD, serde_json::to_string(&self.show_usd)?),
            (KEY_SHOW_CENTS, serde_json::to_string(&self.show_cents)?),
            (
                KEY_SELECTED_CHAINS,
                serde_json::to_string(&self.selected_chains)?,
            ),
        ])
    }
}

fn read_key<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Option<T> {
    let raw = store.get(key)?;
    serde_json::from_str(&raw)
        .map_err(|e| {
            warn!(key, error = %e, "Ignoring unreadable stored value");
        })
        .ok()
}

/// In-memory store, for tests and hosts without durable storage.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }
}

/// JSON file holding a flat object of string values.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileStore {
    /// Open `path`; a missing or corrupt file starts empty.
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let entries = match fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text).unwrap_or_else(|e| {
                warn!(path = %path.display(), error = %e, "Selection file unreadable, starting empty");
                BTreeMap::new()
            }),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "No selection file");
                BTreeMap::new()
            }
        };
        Self { path, entries }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, entries: &BTreeMap<String, String>) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(entries)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        self.set_many(vec![(key, value)])
    }

    /// Entries only change in memory once the file write succeeded.
    fn set_many(&mut self, entries: Vec<(&str, String)>) -> Result<(), StoreError> {
        let mut next = self.entries.clone();
        next.extend(entries.into_iter().map(|(k, v)| (k.to_string(), v)));
        self.flush(&next)?;
        self.entries = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_store() {
        let store = MemoryStore::default();
        let state = SelectionState::load(&store);
        assert_eq!(state, SelectionState::default());
        assert!(state.show_usd);
        assert_eq!(state.time_offset(24), Some(0));
    }

    #[test]
    fn test_save_then_load() {
        let mut store = MemoryStore::default();
        let mut state = SelectionState {
            show_usd: false,
            show_cents: true,
            ..Default::default()
        };
        assert!(state.toggle_chain("base"));
        assert!(state.toggle_chain("zora"));
        assert!(!state.toggle_chain("zora"));
        state.save(&mut store).unwrap();

        assert_eq!(store.get(KEY_SHOW_USD).as_deref(), Some("false"));
        assert_eq!(store.get(KEY_SELECTED_CHAINS).as_deref(), Some(r#"["base"]"#));

        let loaded = SelectionState::load(&store);
        assert!(!loaded.show_usd);
        assert!(loaded.show_cents);
        assert_eq!(loaded.selected_chains, state.selected_chains);
    }

    #[test]
    fn test_stale_values_fall_back() {
        let mut store = MemoryStore::default();
        store.set(KEY_SHOW_USD, "\"yes\"".to_string()).unwrap();
        store.set(KEY_SELECTED_CHAINS, "{not json".to_string()).unwrap();
        store.set(KEY_SHOW_CENTS, "true".to_string()).unwrap();

        let state = SelectionState::load(&store);
        assert!(state.show_usd);
        assert!(state.selected_chains.is_empty());
        assert!(state.show_cents);
    }

    #[test]
    fn test_hover_overrides_slider() {
        let state = SelectionState {
            hover_index: Some(20),
            ..Default::default()
        };
        assert_eq!(state.time_offset(24), Some(3));
        assert_eq!(state.format_options(true).is_axis_label, true);
    }

    #[test]
    fn test_json_shape_is_camel_case_and_lenient() {
        let state: SelectionState =
            serde_json::from_str(r#"{ "showUsd": false, "selectedChains": ["base"], "unknown": 1 }"#)
                .unwrap();
        assert!(!state.show_usd);
        assert_eq!(state.slider_index, DEFAULT_SLIDER_INDEX);
        assert!(state.selected_chains.contains("base"));

        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["hoverIndex"], serde_json::Value::Null);
        assert_eq!(json["metric"], DEFAULT_METRIC);
    }

    #[test]
    fn test_file_store_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("selection.json");

        let mut store = FileStore::open(&path);
        let mut state = SelectionState::default();
        state.toggle_chain("arbitrum");
        state.show_usd = false;
        state.save(&mut store).unwrap();

        let reopened = FileStore::open(&path);
        let loaded = SelectionState::load(&reopened);
        assert!(!loaded.show_usd);
        assert!(loaded.selected_chains.contains("arbitrum"));
    }

    #[test]
    fn test_save_is_one_file_write() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("selection.json");
        let mut store = FileStore::open(&path);
        SelectionState::default().save(&mut store).unwrap();

        let on_disk: BTreeMap<String, String> =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(on_disk.len(), 3);
        assert_eq!(on_disk[KEY_SHOW_USD], "true");
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn test_failed_write_leaves_memory_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "a file, not a directory").unwrap();

        let mut store = FileStore::open(blocker.join("selection.json"));
        let state = SelectionState {
            show_usd: false,
            ..Default::default()
        };
        assert!(state.save(&mut store).is_err());
        assert!(store.get(KEY_SHOW_USD).is_none());
        assert!(store.set(KEY_SHOW_CENTS, "true".into()).is_err());
        assert_eq!(SelectionState::load(&store), SelectionState::default());
    }

    #[test]
    fn test_corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("selection.json");
        fs::write(&path, "not json at all").unwrap();

        let store = FileStore::open(&path);
        assert!(store.get(KEY_SHOW_USD).is_none());
        assert_eq!(SelectionState::load(&store), SelectionState::default());
    }
}
