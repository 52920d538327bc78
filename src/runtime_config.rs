// =============================================================================
// Runtime Configuration — hot-reloadable dashboard settings with atomic save
// =============================================================================
//
// Every tunable the dashboard exposes lives here: the watchlist, the
// indicator windows, which economic series get overlaid, and the chat
// settings.
//
// Persistence uses an atomic tmp + rename pattern to prevent corruption on
// crash. All fields carry `#[serde(default)]` so that adding new fields
// never breaks loading an older config file.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_true() -> bool {
    true
}

fn default_watchlist() -> Vec<String> {
    vec![
        "AAPL".to_string(),
        "MSFT".to_string(),
        "GOOGL".to_string(),
        "VOO".to_string(),
        "NVDA".to_string(),
    ]
}

fn default_ma_short_window() -> usize {
    50
}

fn default_ma_long_window() -> usize {
    200
}

fn default_rsi_window() -> usize {
    14
}

fn default_auxiliary_series() -> Vec<String> {
    vec!["FEDFUNDS".to_string()]
}

fn default_lookback_years() -> i32 {
    5
}

fn default_chat_history_limit() -> usize {
    50
}

// =============================================================================
// RuntimeConfig
// =============================================================================

/// Top-level runtime configuration for the dashboard backend.
///
/// Every field has a serde default so that older JSON files missing new
/// fields still deserialise correctly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    // --- Watchlist & analysis parameters -------------------------------------

    /// Tickers shown on the dashboard home view.
    #[serde(default = "default_watchlist")]
    pub watchlist: Vec<String>,

    /// Short simple-moving-average window (trading days).
    #[serde(default = "default_ma_short_window")]
    pub ma_short_window: usize,

    /// Long simple-moving-average window (trading days).
    #[serde(default = "default_ma_long_window")]
    pub ma_long_window: usize,

    /// RSI look-back window.
    #[serde(default = "default_rsi_window")]
    pub rsi_window: usize,

    /// FRED series ids overlaid on every analysis (rate, GDP, inflation).
    #[serde(default = "default_auxiliary_series")]
    pub auxiliary_series: Vec<String>,

    /// Years of history fetched when a query omits the start date
    /// (the range then starts on January 1st of that year).
    #[serde(default = "default_lookback_years")]
    pub default_lookback_years: i32,

    /// Aggregate daily bars into monthly bars before analysis.
    #[serde(default)]
    pub monthly_resample: bool,

    // --- Chat assistant -------------------------------------------------------

    /// Whether the chat endpoint is served at all.
    #[serde(default = "default_true")]
    pub chat_enabled: bool,

    /// Maximum turns retained per chat session.
    #[serde(default = "default_chat_history_limit")]
    pub chat_history_limit: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            watchlist: default_watchlist(),
            ma_short_window: default_ma_short_window(),
            ma_long_window: default_ma_long_window(),
            rsi_window: default_rsi_window(),
            auxiliary_series: default_auxiliary_series(),
            default_lookback_years: default_lookback_years(),
            monthly_resample: false,
            chat_enabled: true,
            chat_history_limit: default_chat_history_limit(),
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// If the file does not exist, returns an error so the caller can fall
    /// back to defaults with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read runtime config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse runtime config from {}", path.display()))?;

        info!(
            path = %path.display(),
            watchlist = ?config.watchlist,
            auxiliary_series = ?config.auxiliary_series,
            "runtime config loaded"
        );

        Ok(config)
    }

    /// Persist the current configuration to `path` using an atomic write
    /// (write to `.tmp`, then rename).
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content = serde_json::to_string_pretty(self)
            .context("failed to serialise runtime config to JSON")?;

        let tmp_path = path.with_extension("json.tmp");

        std::fs::write(&tmp_path, &content)
            .with_context(|| format!("failed to write tmp config to {}", tmp_path.display()))?;

        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("failed to rename tmp config to {}", path.display()))?;

        info!(path = %path.display(), "runtime config saved (atomic)");
        Ok(())
    }
}
