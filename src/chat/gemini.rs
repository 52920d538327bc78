// =============================================================================
// Gemini REST Client — generateContent with a declared tool
// =============================================================================
//
// Thin request/response wrapper over the hosted `generateContent` endpoint.
// The only tool the model is ever offered is `get_stock_price`; the decision
// loop that executes it lives in the chat engine, not here.
//
// The API key travels as a query parameter and is never logged.

use anyhow::{Context as AnyhowContext, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default hosted model.
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

// =============================================================================
// Wire types
// =============================================================================

/// One conversation turn ("user" or "model").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Content {
    pub role: String,
    pub parts: Vec<Part>,
}

impl Content {
    pub fn user_text(text: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            parts: vec![Part::text(text)],
        }
    }
}

/// A single message part: plain text, a tool invocation requested by the
/// model, or a tool result sent back to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub function_call: Option<FunctionCall>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub function_response: Option<FunctionResponse>,
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            function_call: None,
            function_response: None,
        }
    }

    pub fn function_response(name: impl Into<String>, response: serde_json::Value) -> Self {
        Self {
            text: None,
            function_call: None,
            function_response: Some(FunctionResponse {
                name: name.into(),
                response,
            }),
        }
    }
}

/// Tool invocation requested by the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    #[serde(default)]
    pub args: serde_json::Value,
}

/// Tool result returned to the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionResponse {
    pub name: String,
    pub response: serde_json::Value,
}

// =============================================================================
// Helpers over Content
// =============================================================================

/// First tool invocation in a model turn, if any.
pub fn first_function_call(content: &Content) -> Option<&FunctionCall> {
    content.parts.iter().find_map(|p| p.function_call.as_ref())
}

/// Concatenated text parts of a model turn.
pub fn text_of(content: &Content) -> String {
    content
        .parts
        .iter()
        .filter_map(|p| p.text.as_deref())
        .collect::<Vec<_>>()
        .join("")
}

// =============================================================================
// Client
// =============================================================================

#[derive(Clone)]
pub struct GeminiClient {
    api_key: String,
    model: String,
    base_url: String,
    client: reqwest::Client,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("failed to build reqwest client for GeminiClient");

        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            client,
        }
    }

    /// Declaration of the single tool the model may call.
    pub fn stock_price_tool() -> serde_json::Value {
        serde_json::json!({
            "name": "get_stock_price",
            "description": "Fetches the current stock price and basic quote information for a given ticker symbol.",
            "parameters": {
                "type": "object",
                "properties": {
                    "ticker_symbol": {
                        "type": "string",
                        "description": "The stock ticker symbol (e.g., 'AAPL' for Apple, 'MSFT' for Microsoft)."
                    }
                },
                "required": ["ticker_symbol"]
            }
        })
    }

    /// Send the conversation so far and return the model's next turn.
    #[instrument(skip(self, contents), name = "gemini::generate")]
    pub async fn generate(&self, contents: &[Content]) -> Result<Content> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );

        let body = serde_json::json!({
            "contents": contents,
            "tools": [{ "functionDeclarations": [Self::stock_price_tool()] }],
        });

        let resp = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .context("POST generateContent request failed")?;

        let status = resp.status();
        let payload: serde_json::Value = resp
            .json()
            .await
            .context("failed to parse generateContent response")?;

        if !status.is_success() {
            anyhow::bail!("Gemini API returned {status}: {payload}");
        }

        let candidate = payload["candidates"]
            .as_array()
            .and_then(|c| c.first())
            .context("Gemini response contained no candidates")?;

        let content: Content = serde_json::from_value(candidate["content"].clone())
            .context("Gemini candidate is missing usable content")?;

        debug!(
            parts = content.parts.len(),
            has_tool_call = first_function_call(&content).is_some(),
            "model turn received"
        );
        Ok(content)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_parts_serialise_without_null_fields() {
        let content = Content::user_text("What is Apple's stock price?");
        let json = serde_json::to_value(&content).unwrap();
        assert_eq!(json["role"], "user");
        assert_eq!(json["parts"][0]["text"], "What is Apple's stock price?");
        assert!(json["parts"][0].get("functionCall").is_none());
    }

    #[test]
    fn function_call_deserialises_from_model_turn() {
        let json = r#"{
            "role": "model",
            "parts": [{ "functionCall": { "name": "get_stock_price", "args": { "ticker_symbol": "AAPL" } } }]
        }"#;
        let content: Content = serde_json::from_str(json).unwrap();
        let call = first_function_call(&content).unwrap();
        assert_eq!(call.name, "get_stock_price");
        assert_eq!(call.args["ticker_symbol"], "AAPL");
    }

    #[test]
    fn function_response_round_trips_in_camel_case() {
        let part = Part::function_response(
            "get_stock_price",
            serde_json::json!({ "status": "success", "price": 189.91 }),
        );
        let json = serde_json::to_value(&part).unwrap();
        assert_eq!(json["functionResponse"]["name"], "get_stock_price");
        assert_eq!(json["functionResponse"]["response"]["price"], 189.91);
    }

    #[test]
    fn text_of_concatenates_parts() {
        let content = Content {
            role: "model".to_string(),
            parts: vec![Part::text("Apple trades at "), Part::text("$189.91.")],
        };
        assert_eq!(text_of(&content), "Apple trades at $189.91.");
    }

    #[test]
    fn tool_declaration_requires_the_ticker_argument() {
        let decl = GeminiClient::stock_price_tool();
        assert_eq!(decl["name"], "get_stock_price");
        assert_eq!(decl["parameters"]["required"][0], "ticker_symbol");
    }
}
