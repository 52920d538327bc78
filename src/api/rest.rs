// =============================================================================
// REST API Endpoints — Axum
// =============================================================================
//
// All endpoints live under `/api/v1/`. Public endpoints (health) require no
// authentication. All other endpoints require a valid Bearer token checked via
// the `AuthBearer` extractor.
//
// CORS is configured permissively for development; tighten `allowed_origins`
// in production.
// =============================================================================

use std::sync::Arc;

use axum::{
    extract::{Json, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
    Router,
};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};
use uuid::Uuid;

use crate::analysis::{build_report, AnalysisError, AnalysisParams};
use crate::api::auth::AuthBearer;
use crate::app_state::AppState;

// =============================================================================
// Router construction
// =============================================================================

/// Build the full REST API router with CORS middleware and shared state.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // ── Public ──────────────────────────────────────────────────
        .route("/api/v1/health", get(health))
        // ── Authenticated ───────────────────────────────────────────
        .route("/api/v1/analysis", get(analysis))
        .route("/api/v1/quote/{ticker}", get(quote))
        .route("/api/v1/config", get(get_config))
        .route("/api/v1/config", post(set_config))
        .route("/api/v1/chat", post(chat))
        .route("/api/v1/chat/{session_id}", delete(clear_chat_session))
        .route("/api/v1/errors", get(recent_errors))
        // ── Middleware & State ───────────────────────────────────────
        .layer(cors)
        .with_state(state)
}

type ApiError = (StatusCode, Json<serde_json::Value>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(serde_json::json!({ "error": message.into() })),
    )
}

// =============================================================================
// Health (public)
// =============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    state_version: u64,
    server_time: i64,
    uptime_seconds: u64,
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let resp = HealthResponse {
        status: "ok",
        state_version: state.current_state_version(),
        server_time: chrono::Utc::now().timestamp_millis(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
    };
    Json(resp)
}

// =============================================================================
// Analysis (authenticated)
// =============================================================================

#[derive(Debug, Deserialize)]
struct AnalysisQuery {
    ticker: String,
    /// Inclusive range start; defaults to January 1st,
    /// `default_lookback_years` before the end year.
    #[serde(default)]
    start: Option<NaiveDate>,
    /// Inclusive range end; defaults to today (UTC).
    #[serde(default)]
    end: Option<NaiveDate>,
    /// Overrides the configured `monthly_resample` flag for this query.
    #[serde(default)]
    monthly: Option<bool>,
}

async fn analysis(
    _auth: AuthBearer,
    State(state): State<Arc<AppState>>,
    Query(query): Query<AnalysisQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let ticker = query.ticker.trim().to_uppercase();
    if ticker.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "ticker must not be empty"));
    }

    // Copy everything needed out of the config before the first await.
    let (params, aux_ids, lookback_years, monthly_default) = {
        let config = state.runtime_config.read();
        (
            AnalysisParams {
                ma_short_window: config.ma_short_window,
                ma_long_window: config.ma_long_window,
                rsi_window: config.rsi_window,
            },
            config.auxiliary_series.clone(),
            config.default_lookback_years,
            config.monthly_resample,
        )
    };

    let end = query.end.unwrap_or_else(|| chrono::Utc::now().date_naive());
    let start = match query.start {
        Some(s) => s,
        // Matches the dashboard default: January 1st, N years back.
        None => NaiveDate::from_ymd_opt(end.year() - lookback_years, 1, 1)
            .unwrap_or(NaiveDate::MIN),
    };
    if end < start {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            format!("end ({end}) precedes start ({start})"),
        ));
    }

    let daily = match state.market.fetch_daily(&ticker, start, end).await {
        Ok(series) => series,
        Err(e) => {
            warn!(ticker, error = %e, "price fetch failed");
            state.push_error_with_code(format!("price fetch for {ticker}: {e}"), Some("fetch"));
            return Err(api_error(
                StatusCode::NOT_FOUND,
                format!("no price data available for {ticker}"),
            ));
        }
    };

    let monthly = query.monthly.unwrap_or(monthly_default);
    let primary = if monthly { daily.resample_monthly() } else { daily };

    // Auxiliary series are best-effort: a FRED outage degrades the chart,
    // never the price analysis.
    let mut auxiliaries = Vec::with_capacity(aux_ids.len());
    for series_id in &aux_ids {
        match state.econ.fetch_series(series_id, start, end).await {
            Ok(series) => auxiliaries.push(series),
            Err(e) => {
                warn!(series_id, error = %e, "auxiliary series fetch failed");
                state.push_error_with_code(
                    format!("auxiliary series {series_id}: {e}"),
                    Some("fred"),
                );
            }
        }
    }

    let report = build_report(&ticker, &primary, &auxiliaries, params, start, end).map_err(
        |e| match e {
            AnalysisError::NoData { ticker, start, end } => api_error(
                StatusCode::NOT_FOUND,
                format!("no data for {ticker} in {start}..={end}"),
            ),
            AnalysisError::Shape(e) => {
                warn!(error = %e, "analysis shape violation");
                api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
            }
        },
    )?;

    info!(
        ticker = %report.ticker,
        rows = report.table.row_count(),
        auxiliaries = report.table.auxiliaries.len(),
        monthly,
        "analysis served"
    );
    Ok(Json(report))
}

// =============================================================================
// Quote (authenticated)
// =============================================================================

async fn quote(
    _auth: AuthBearer,
    State(state): State<Arc<AppState>>,
    Path(ticker): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let ticker = ticker.trim().to_uppercase();
    if ticker.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "ticker must not be empty"));
    }

    match state.market.fetch_quote(&ticker).await {
        Ok(q) => Ok(Json(q)),
        Err(e) => {
            warn!(ticker, error = %e, "quote fetch failed");
            state.push_error_with_code(format!("quote for {ticker}: {e}"), Some("fetch"));
            Err(api_error(
                StatusCode::BAD_GATEWAY,
                format!("could not retrieve a quote for {ticker}"),
            ))
        }
    }
}

// =============================================================================
// Config (authenticated)
// =============================================================================

async fn get_config(
    _auth: AuthBearer,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let config = state.runtime_config.read().clone();
    Json(config)
}

/// Partial config update; absent fields keep their current value.
#[derive(Deserialize)]
struct ConfigUpdate {
    #[serde(default)]
    watchlist: Option<Vec<String>>,
    #[serde(default)]
    ma_short_window: Option<usize>,
    #[serde(default)]
    ma_long_window: Option<usize>,
    #[serde(default)]
    rsi_window: Option<usize>,
    #[serde(default)]
    auxiliary_series: Option<Vec<String>>,
    #[serde(default)]
    default_lookback_years: Option<i32>,
    #[serde(default)]
    monthly_resample: Option<bool>,
    #[serde(default)]
    chat_enabled: Option<bool>,
    #[serde(default)]
    chat_history_limit: Option<usize>,
}

async fn set_config(
    _auth: AuthBearer,
    State(state): State<Arc<AppState>>,
    Json(update): Json<ConfigUpdate>,
) -> Result<impl IntoResponse, ApiError> {
    if matches!(update.ma_short_window, Some(0))
        || matches!(update.ma_long_window, Some(0))
        || matches!(update.rsi_window, Some(0))
    {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "indicator windows must be at least 1",
        ));
    }

    // A zero or negative lookback would push the default start date past
    // `end` and 400 every default-range analysis.
    if matches!(update.default_lookback_years, Some(y) if y < 1) {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "default_lookback_years must be at least 1",
        ));
    }

    let config_clone = {
        let mut config = state.runtime_config.write();

        macro_rules! apply_field {
            ($field:ident) => {
                if let Some(val) = update.$field {
                    config.$field = val;
                }
            };
        }

        apply_field!(watchlist);
        apply_field!(ma_short_window);
        apply_field!(ma_long_window);
        apply_field!(rsi_window);
        apply_field!(auxiliary_series);
        apply_field!(default_lookback_years);
        apply_field!(monthly_resample);
        apply_field!(chat_enabled);
        apply_field!(chat_history_limit);

        config.clone()
    };

    // Save to disk (best-effort).
    if let Err(e) = config_clone.save(crate::CONFIG_PATH) {
        warn!(error = %e, "Failed to save runtime config to disk");
    }

    state.increment_version();
    info!("Runtime config updated via API");

    Ok(Json(config_clone))
}

// =============================================================================
// Chat (authenticated)
// =============================================================================

#[derive(Deserialize)]
struct ChatRequest {
    /// Omit to start a new session.
    #[serde(default)]
    session_id: Option<Uuid>,
    message: String,
}

async fn chat(
    _auth: AuthBearer,
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChatRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let enabled = state.runtime_config.read().chat_enabled;
    if !enabled {
        return Err(api_error(
            StatusCode::SERVICE_UNAVAILABLE,
            "chat assistant is disabled",
        ));
    }

    let message = req.message.trim();
    if message.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "message must not be empty"));
    }

    match state.chat.handle_message(req.session_id, message).await {
        Ok(reply) => Ok(Json(reply)),
        Err(e) => {
            warn!(error = %e, "chat turn failed");
            state.push_error_with_code(format!("chat: {e}"), Some("chat"));
            Err(api_error(
                StatusCode::BAD_GATEWAY,
                "the assistant is unavailable right now",
            ))
        }
    }
}

async fn clear_chat_session(
    _auth: AuthBearer,
    State(state): State<Arc<AppState>>,
    Path(session_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    if state.chat.clear_session(session_id) {
        Ok(Json(serde_json::json!({ "cleared": session_id })))
    } else {
        Err(api_error(StatusCode::NOT_FOUND, "unknown session"))
    }
}

// =============================================================================
// Diagnostics (authenticated)
// =============================================================================

async fn recent_errors(
    _auth: AuthBearer,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    Json(state.recent_errors())
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::gemini::GeminiClient;
    use crate::chat::ChatEngine;
    use crate::providers::eodhd::MarketDataClient;
    use crate::providers::fred::EconDataClient;
    use crate::runtime_config::RuntimeConfig;

    fn state() -> Arc<AppState> {
        let market = Arc::new(MarketDataClient::new("test-token"));
        let econ = Arc::new(EconDataClient::new(None));
        let chat = Arc::new(ChatEngine::new(
            GeminiClient::new("test-key"),
            market.clone(),
            50,
        ));
        Arc::new(AppState::new(RuntimeConfig::default(), market, econ, chat))
    }

    fn no_update() -> ConfigUpdate {
        ConfigUpdate {
            watchlist: None,
            ma_short_window: None,
            ma_long_window: None,
            rsi_window: None,
            auxiliary_series: None,
            default_lookback_years: None,
            monthly_resample: None,
            chat_enabled: None,
            chat_history_limit: None,
        }
    }

    #[tokio::test]
    async fn config_update_rejects_zero_windows() {
        let state = state();
        let update = ConfigUpdate {
            rsi_window: Some(0),
            ..no_update()
        };

        let err = set_config(AuthBearer("t".into()), State(state.clone()), Json(update))
            .await
            .err()
            .unwrap();
        assert_eq!(err.0, StatusCode::BAD_REQUEST);
        // Nothing was applied.
        assert_eq!(state.runtime_config.read().rsi_window, 14);
    }

    #[tokio::test]
    async fn config_update_rejects_non_positive_lookback() {
        let state = state();
        for bad in [0, -3] {
            let update = ConfigUpdate {
                default_lookback_years: Some(bad),
                ..no_update()
            };

            let err = set_config(AuthBearer("t".into()), State(state.clone()), Json(update))
                .await
                .err()
                .unwrap();
            assert_eq!(err.0, StatusCode::BAD_REQUEST);
            assert_eq!(state.runtime_config.read().default_lookback_years, 5);
        }
    }
}
