// =============================================================================
// Finance Enthusiast Backend — Main Entry Point
// =============================================================================
//
// A market dashboard backend: daily price analysis with moving averages and
// RSI, economic series overlays from FRED, real-time quotes, and an optional
// chat assistant with a stock-price tool.
// =============================================================================

// ── Module declarations ──────────────────────────────────────────────────────
mod analysis;
mod api;
mod app_state;
mod chat;
mod indicators;
mod interpret;
mod providers;
mod runtime_config;
mod series;

use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::app_state::AppState;
use crate::chat::gemini::GeminiClient;
use crate::chat::ChatEngine;
use crate::providers::eodhd::MarketDataClient;
use crate::providers::fred::EconDataClient;
use crate::runtime_config::RuntimeConfig;

/// On-disk location of the runtime configuration.
pub const CONFIG_PATH: &str = "fineth_config.json";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & config ──────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("╔══════════════════════════════════════════════════════════╗");
    info!("║        Finance Enthusiast Backend — Starting Up          ║");
    info!("╚══════════════════════════════════════════════════════════╝");

    let mut config = RuntimeConfig::load(CONFIG_PATH).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        RuntimeConfig::default()
    });

    // Override the watchlist from env if available.
    if let Ok(tickers) = std::env::var("FINETH_WATCHLIST") {
        config.watchlist = tickers
            .split(',')
            .map(|s| s.trim().to_uppercase())
            .filter(|s| !s.is_empty())
            .collect();
    }

    // ── 2. Build provider clients ────────────────────────────────────────
    let eodhd_token = std::env::var("EODHD_API_TOKEN").unwrap_or_default();
    if eodhd_token.is_empty() {
        warn!("EODHD_API_TOKEN is not set — price fetches will fail");
    }
    let market = Arc::new(MarketDataClient::new(eodhd_token));

    let fred_key = std::env::var("FRED_API_KEY").ok().filter(|k| !k.is_empty());
    if fred_key.is_none() {
        warn!("FRED_API_KEY is not set — only the built-in fed funds table is available");
    }
    let econ = Arc::new(EconDataClient::new(fred_key));

    let gemini_key = std::env::var("GEMINI_API_KEY").unwrap_or_default();
    if gemini_key.is_empty() && config.chat_enabled {
        warn!("GEMINI_API_KEY is not set — disabling the chat assistant");
        config.chat_enabled = false;
    }
    let chat = Arc::new(ChatEngine::new(
        GeminiClient::new(gemini_key),
        market.clone(),
        config.chat_history_limit,
    ));

    info!(
        watchlist = ?config.watchlist,
        auxiliary_series = ?config.auxiliary_series,
        chat_enabled = config.chat_enabled,
        "Configuration ready"
    );

    // ── 3. Build shared state ────────────────────────────────────────────
    let state = Arc::new(AppState::new(config, market, econ, chat));

    // ── 4. Start the API server ──────────────────────────────────────────
    let bind_addr =
        std::env::var("FINETH_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3001".into());

    let app = api::rest::router(state.clone());
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!(addr = %bind_addr, "API server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            warn!("Shutdown signal received — stopping gracefully");
        })
        .await?;

    // ── 5. Graceful shutdown ─────────────────────────────────────────────
    if let Err(e) = state.runtime_config.read().save(CONFIG_PATH) {
        error!(error = %e, "Failed to save runtime config on shutdown");
    }

    info!("Finance Enthusiast Backend shut down complete.");
    Ok(())
}
