// =============================================================================
// EOD Historical Data REST Client — daily OHLCV and real-time quotes
// =============================================================================
//
// The api_token travels in the query string (EODHD has no signed requests).
// An empty payload for a valid request is reported as an error so the caller
// treats it as "no data available" instead of analysing an empty table.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::series::{PricePoint, PriceSeries};

const DEFAULT_BASE_URL: &str = "https://eodhistoricaldata.com/api";

/// One bar as returned by `GET /eod/{ticker}?fmt=json`.
#[derive(Debug, Clone, Deserialize)]
struct EodBar {
    date: NaiveDate,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    #[serde(default)]
    volume: u64,
}

/// Real-time quote payload served to the chat tool and the quote endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct QuoteInfo {
    pub ticker: String,
    pub price: f64,
    pub previous_close: Option<f64>,
    pub change_pct: Option<f64>,
    /// UNIX timestamp (seconds) of the quote, when the provider supplies one.
    pub timestamp: Option<i64>,
}

/// EOD Historical Data client.
#[derive(Clone)]
pub struct MarketDataClient {
    api_token: String,
    base_url: String,
    client: reqwest::Client,
}

impl MarketDataClient {
    /// Create a new client. The token is kept out of logs.
    pub fn new(api_token: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .expect("failed to build reqwest client for MarketDataClient");

        debug!("MarketDataClient initialised (base_url={DEFAULT_BASE_URL})");

        Self {
            api_token: api_token.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            client,
        }
    }

    // -------------------------------------------------------------------------
    // Historical OHLCV
    // -------------------------------------------------------------------------

    /// Fetch the daily OHLCV series for `ticker` over `[start, end]`.
    ///
    /// Bars are sorted and de-duplicated by date before validation, since the
    /// provider occasionally repeats a trading day across split adjustments.
    #[instrument(skip(self), name = "eodhd::fetch_daily")]
    pub async fn fetch_daily(
        &self,
        ticker: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceSeries> {
        let url = format!(
            "{}/eod/{}?api_token={}&from={}&to={}&period=d&fmt=json",
            self.base_url, ticker, self.api_token, start, end
        );

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("GET daily bars for {ticker}"))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("EOD API returned {status} for {ticker}: {body}");
        }

        let bars: Vec<EodBar> = resp
            .json()
            .await
            .with_context(|| format!("failed to parse EOD response for {ticker}"))?;

        if bars.is_empty() {
            anyhow::bail!("no price data returned for {ticker} in {start}..={end}");
        }

        let series = series_from_bars(bars)
            .with_context(|| format!("provider returned a malformed series for {ticker}"))?;

        debug!(ticker, rows = series.len(), "daily bars fetched");
        Ok(series)
    }

    // -------------------------------------------------------------------------
    // Real-time quote
    // -------------------------------------------------------------------------

    /// Fetch the latest quote for `ticker` (used by the chat tool).
    #[instrument(skip(self), name = "eodhd::fetch_quote")]
    pub async fn fetch_quote(&self, ticker: &str) -> Result<QuoteInfo> {
        let url = format!(
            "{}/real-time/{}?api_token={}&fmt=json",
            self.base_url, ticker, self.api_token
        );

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("GET real-time quote for {ticker}"))?;

        let status = resp.status();
        let body: serde_json::Value = resp
            .json()
            .await
            .with_context(|| format!("failed to parse quote response for {ticker}"))?;

        if !status.is_success() {
            anyhow::bail!("EOD quote API returned {status} for {ticker}: {body}");
        }

        quote_from_json(ticker, &body)
    }
}

/// Sort, de-duplicate (first bar per date wins), and validate provider bars.
fn series_from_bars(mut bars: Vec<EodBar>) -> Result<PriceSeries> {
    bars.sort_by_key(|b| b.date);
    bars.dedup_by_key(|b| b.date);

    let points = bars
        .into_iter()
        .map(|b| PricePoint {
            date: b.date,
            open: b.open,
            high: b.high,
            low: b.low,
            close: b.close,
            volume: b.volume,
        })
        .collect();

    Ok(PriceSeries::new(points)?)
}

/// Extract a `QuoteInfo` from the provider's real-time JSON object.
/// The price field is mandatory; everything else is best-effort (the
/// provider reports `"NA"` strings outside trading hours).
fn quote_from_json(ticker: &str, body: &serde_json::Value) -> Result<QuoteInfo> {
    let price = body["close"]
        .as_f64()
        .with_context(|| format!("quote for {ticker} is missing a numeric close price"))?;

    Ok(QuoteInfo {
        ticker: ticker.to_uppercase(),
        price,
        previous_close: body["previousClose"].as_f64(),
        change_pct: body["change_p"].as_f64(),
        timestamp: body["timestamp"].as_i64(),
    })
}
