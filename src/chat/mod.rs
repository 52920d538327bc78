// =============================================================================
// Chat Assistant — hosted LLM with a single stock-price tool
// =============================================================================
//
// Each session is a capped in-memory transcript keyed by UUID. A turn runs at
// most one tool round: the model either answers directly or requests
// `get_stock_price`, in which case the quote is fetched, handed back as a
// function response, and the model's follow-up text becomes the reply.
//
// Tool failures are reported to the model as structured error payloads (the
// model phrases the apology), never as transport errors to the HTTP caller.

pub mod gemini;

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Result;
use parking_lot::RwLock;
use serde::Serialize;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::providers::eodhd::MarketDataClient;

use gemini::{Content, GeminiClient, Part};

/// Fallback reply when the model returns an empty turn.
const EMPTY_REPLY: &str = "I'm sorry, I couldn't get a clear response.";

/// Completed chat turn returned to the API layer.
#[derive(Debug, Clone, Serialize)]
pub struct ChatReply {
    pub session_id: Uuid,
    pub reply: String,
    /// Name of the tool executed during this turn, if any.
    pub tool_used: Option<String>,
}

pub struct ChatEngine {
    llm: GeminiClient,
    market: Arc<MarketDataClient>,
    sessions: RwLock<HashMap<Uuid, Vec<Content>>>,
    /// Maximum number of turns retained per session transcript.
    history_limit: usize,
}

impl ChatEngine {
    pub fn new(llm: GeminiClient, market: Arc<MarketDataClient>, history_limit: usize) -> Self {
        Self {
            llm,
            market,
            sessions: RwLock::new(HashMap::new()),
            history_limit: history_limit.max(2),
        }
    }

    /// Run one chat turn. A missing `session_id` starts a new session.
    pub async fn handle_message(
        &self,
        session_id: Option<Uuid>,
        message: &str,
    ) -> Result<ChatReply> {
        let sid = session_id.unwrap_or_else(Uuid::new_v4);

        let mut history = self
            .sessions
            .read()
            .get(&sid)
            .cloned()
            .unwrap_or_default();
        history.push(Content::user_text(message));

        let mut turn = self.llm.generate(&history).await?;
        let mut tool_used = None;

        if let Some(call) = gemini::first_function_call(&turn).cloned() {
            if call.name == "get_stock_price" {
                let outcome = self.run_stock_price_tool(&call.args).await;
                debug!(session_id = %sid, "get_stock_price executed for chat turn");

                history.push(turn);
                history.push(Content {
                    role: "user".to_string(),
                    parts: vec![Part::function_response("get_stock_price", outcome)],
                });

                turn = self.llm.generate(&history).await?;
                tool_used = Some("get_stock_price".to_string());
            } else {
                warn!(tool = %call.name, "model requested an undeclared tool — ignoring");
            }
        }

        let reply = match gemini::text_of(&turn) {
            text if text.is_empty() => EMPTY_REPLY.to_string(),
            text => text,
        };
        history.push(turn);

        truncate_to_exchanges(&mut history, self.history_limit);
        self.sessions.write().insert(sid, history);

        Ok(ChatReply {
            session_id: sid,
            reply,
            tool_used,
        })
    }

    /// Drop a session transcript. Returns `false` when the session was
    /// unknown.
    pub fn clear_session(&self, session_id: Uuid) -> bool {
        self.sessions.write().remove(&session_id).is_some()
    }

    /// Execute the stock-price tool and shape the payload for the model.
    async fn run_stock_price_tool(&self, args: &serde_json::Value) -> serde_json::Value {
        let ticker = args["ticker_symbol"]
            .as_str()
            .unwrap_or_default()
            .trim()
            .to_uppercase();

        if ticker.is_empty() {
            return serde_json::json!({
                "status": "error",
                "error": "Invalid ticker symbol provided. Please provide a non-empty string.",
            });
        }

        match self.market.fetch_quote(&ticker).await {
            Ok(quote) => serde_json::json!({
                "status": "success",
                "ticker": quote.ticker,
                "price": quote.price,
                "previous_close": quote.previous_close,
                "change_pct": quote.change_pct,
            }),
            Err(e) => {
                warn!(ticker, error = %e, "stock price tool failed");
                serde_json::json!({
                    "status": "error",
                    "error": format!("Could not retrieve a quote for {ticker}: {e}"),
                })
            }
        }
    }
}

// =============================================================================
// Transcript truncation
// =============================================================================

/// A turn that can legally open a transcript sent to the model: a user turn
/// carrying plain text, not a tool result.
fn opens_an_exchange(turn: &Content) -> bool {
    turn.role == "user" && turn.parts.iter().all(|p| p.function_response.is_none())
}

/// Cap `history` to roughly `limit` turns by dropping whole exchanges from
/// the front. The retained transcript always starts at an exchange boundary:
/// a naive front drain could leave it opening with a model turn or an
/// orphaned function response, which the model API rejects. A single
/// exchange longer than `limit` (a tool round) is kept intact rather than
/// split.
fn truncate_to_exchanges(history: &mut Vec<Content>, limit: usize) {
    if history.len() <= limit {
        return;
    }

    let earliest = history.len() - limit;
    let start = (earliest..history.len())
        .find(|&i| opens_an_exchange(&history[i]))
        // No boundary inside the cap: back off to the start of the exchange
        // that straddles it. Index 0 is always a plain user turn.
        .or_else(|| (0..earliest).rev().find(|&i| opens_an_exchange(&history[i])));

    if let Some(start) = start {
        history.drain(..start);
    }
}
