//! Tracing setup for tests and debugging sessions.
//!
//! The resolution crates only emit `tracing` events; they never install a
//! subscriber themselves. Tests and embedding tools call [`init_tracing`].
//!
//! ```bash
//! KRES_LOG=kres_resolve=trace cargo test -p kres-resolve
//! KRES_LOG=debug KRES_LOG_FORMAT=json cargo test
//! ```
//!
//! Nothing is installed unless `KRES_LOG` (or `RUST_LOG`) is set.

use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Registry, fmt};

/// Tracing output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Standard flat text lines (default).
    Text,
    /// Newline-delimited JSON objects.
    Json,
}

impl LogFormat {
    /// Parse from the `KRES_LOG_FORMAT` environment variable.
    fn from_env() -> Self {
        match std::env::var("KRES_LOG_FORMAT")
            .unwrap_or_default()
            .to_lowercase()
            .as_str()
        {
            "json" => Self::Json,
            _ => Self::Text,
        }
    }
}

/// Build an `EnvFilter` from `KRES_LOG`, falling back to `RUST_LOG`.
fn build_filter() -> EnvFilter {
    if let Ok(val) = std::env::var("KRES_LOG") {
        EnvFilter::builder().parse_lossy(val)
    } else {
        EnvFilter::from_default_env()
    }
}

/// Install the global subscriber if logging was requested.
///
/// Safe to call from every test: a second installation is ignored.
pub fn init_tracing() {
    let has_kres_log = std::env::var("KRES_LOG").is_ok();
    let has_rust_log = std::env::var("RUST_LOG").is_ok();
    if !has_kres_log && !has_rust_log {
        return;
    }

    let filter = build_filter();
    match LogFormat::from_env() {
        LogFormat::Json => {
            let json_layer = fmt::layer()
                .json()
                .with_test_writer();
            let _ = Registry::default().with(filter).with(json_layer).try_init();
        }
        LogFormat::Text => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_test_writer()
                .try_init();
        }
    }
}
