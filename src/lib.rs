//! L2 fees dashboard - chain ranking and metric normalization
//!
//! Ranks Layer-2 chains by transaction-fee metrics and breaks down data
//! availability layer usage:
//! - `core`: platform-agnostic documents, formatting, ranking and selection
//! - `theme`: percentage-to-color gradient
//! - `client` (feature `cli`): caching HTTP/directory document client
//! - web bindings (feature `wasm`, wasm32 only)

pub mod core;
pub mod fetch_state;
pub mod theme;

#[cfg(feature = "cli")]
pub mod client;

#[cfg(all(target_arch = "wasm32", feature = "wasm"))]
mod wasm;
