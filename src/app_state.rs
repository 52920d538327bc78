// =============================================================================
// Application State — shared state handed to every request handler
// =============================================================================

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::RwLock;
use serde::Serialize;

use crate::chat::ChatEngine;
use crate::providers::eodhd::MarketDataClient;
use crate::providers::fred::EconDataClient;
use crate::runtime_config::RuntimeConfig;

/// Upper bound on the in-memory error log.
const MAX_RECENT_ERRORS: usize = 50;

/// One recorded operational error, surfaced on the diagnostics endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorRecord {
    pub message: String,
    /// Short machine-readable tag ("fetch", "fred", "chat").
    pub code: Option<String>,
    /// RFC 3339 timestamp of when the error was recorded.
    pub at: String,
}

pub struct AppState {
    /// Bumped on every config mutation so clients can cheaply poll for change.
    state_version: AtomicU64,

    pub runtime_config: Arc<RwLock<RuntimeConfig>>,
    pub market: Arc<MarketDataClient>,
    pub econ: Arc<EconDataClient>,
    pub chat: Arc<ChatEngine>,

    recent_errors: RwLock<Vec<ErrorRecord>>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(
        runtime_config: RuntimeConfig,
        market: Arc<MarketDataClient>,
        econ: Arc<EconDataClient>,
        chat: Arc<ChatEngine>,
    ) -> Self {
        Self {
            state_version: AtomicU64::new(1),
            runtime_config: Arc::new(RwLock::new(runtime_config)),
            market,
            econ,
            chat,
            recent_errors: RwLock::new(Vec::new()),
            start_time: Instant::now(),
        }
    }

    pub fn increment_version(&self) -> u64 {
        self.state_version.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn current_state_version(&self) -> u64 {
        self.state_version.load(Ordering::SeqCst)
    }

    /// Record an operational error, evicting the oldest entry when full.
    pub fn push_error(&self, message: impl Into<String>) {
        self.push_error_with_code(message, None::<String>);
    }

    pub fn push_error_with_code(
        &self,
        message: impl Into<String>,
        code: Option<impl Into<String>>,
    ) {
        let mut errors = self.recent_errors.write();
        if errors.len() >= MAX_RECENT_ERRORS {
            errors.remove(0);
        }
        errors.push(ErrorRecord {
            message: message.into(),
            code: code.map(Into::into),
            at: chrono::Utc::now().to_rfc3339(),
        });
    }

    pub fn recent_errors(&self) -> Vec<ErrorRecord> {
        self.recent_errors.read().clone()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::gemini::GeminiClient;

    fn state() -> AppState {
        let market = Arc::new(MarketDataClient::new("test-token"));
        let econ = Arc::new(EconDataClient::new(None));
        let chat = Arc::new(ChatEngine::new(
            GeminiClient::new("test-key"),
            market.clone(),
            50,
        ));
        AppState::new(RuntimeConfig::default(), market, econ, chat)
    }

    #[test]
    fn version_starts_at_one_and_increments() {
        let s = state();
        assert_eq!(s.current_state_version(), 1);
        assert_eq!(s.increment_version(), 2);
        assert_eq!(s.current_state_version(), 2);
    }

    #[test]
    fn error_log_is_bounded() {
        let s = state();
        for i in 0..(MAX_RECENT_ERRORS + 10) {
            s.push_error(format!("error {i}"));
        }
        let errors = s.recent_errors();
        assert_eq!(errors.len(), MAX_RECENT_ERRORS);
        // Oldest entries were evicted first.
        assert_eq!(errors[0].message, "error 10");
    }

    #[test]
    fn error_codes_are_optional() {
        let s = state();
        s.push_error("plain");
        s.push_error_with_code("tagged", Some("fetch"));
        let errors = s.recent_errors();
        assert_eq!(errors[0].code, None);
        assert_eq!(errors[1].code.as_deref(), Some("fetch"));
    }
}
