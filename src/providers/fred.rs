// =============================================================================
// FRED Economic Data Client — sparse macro series (rate, GDP, inflation)
// =============================================================================
//
// Fetches `series/observations` from the St. Louis Fed API. Observations with
// the placeholder value "." (no reading published) are skipped. When no API
// key is configured, the FEDFUNDS series falls back to a built-in annual
// target-rate table so the dashboard still renders a rate panel.
//
// Each series is fetched independently; a failure here never blocks the
// price analysis — the caller proceeds with whatever auxiliaries arrived.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use tracing::{debug, instrument, warn};

use crate::series::{AuxPoint, AuxiliarySeries};

const DEFAULT_BASE_URL: &str = "https://api.stlouisfed.org/fred";

/// Effective federal funds rate series id.
pub const FED_FUNDS: &str = "FEDFUNDS";

/// FRED REST client.
#[derive(Clone)]
pub struct EconDataClient {
    api_key: Option<String>,
    base_url: String,
    client: reqwest::Client,
}

impl EconDataClient {
    /// Create a new client. `api_key` of `None` enables the built-in
    /// FEDFUNDS fallback and rejects every other series.
    pub fn new(api_key: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .expect("failed to build reqwest client for EconDataClient");

        Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            client,
        }
    }

    /// Fetch `series_id` observations inside `[start, end]`.
    #[instrument(skip(self), name = "fred::fetch_series")]
    pub async fn fetch_series(
        &self,
        series_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<AuxiliarySeries> {
        let api_key = match &self.api_key {
            Some(key) => key,
            None if series_id == FED_FUNDS => {
                warn!("FRED_API_KEY not set — serving built-in fed funds table");
                return Ok(builtin_fed_funds());
            }
            None => {
                anyhow::bail!("FRED_API_KEY not set and no built-in fallback for {series_id}")
            }
        };

        let url = format!(
            "{}/series/observations?series_id={}&api_key={}&file_type=json&observation_start={}&observation_end={}",
            self.base_url, series_id, api_key, start, end
        );

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("GET FRED observations for {series_id}"))?;

        let status = resp.status();
        let body: serde_json::Value = resp
            .json()
            .await
            .with_context(|| format!("failed to parse FRED response for {series_id}"))?;

        if !status.is_success() {
            anyhow::bail!("FRED API returned {status} for {series_id}: {body}");
        }

        let series = parse_observations(series_id, &body)?;
        debug!(series_id, rows = series.points().len(), "FRED series fetched");
        Ok(series)
    }
}

/// Convert a FRED `observations` payload into an `AuxiliarySeries`,
/// skipping the "." placeholders FRED emits for unpublished readings.
fn parse_observations(series_id: &str, body: &serde_json::Value) -> Result<AuxiliarySeries> {
    let observations = body["observations"]
        .as_array()
        .with_context(|| format!("FRED response for {series_id} is missing 'observations'"))?;

    let mut points = Vec::with_capacity(observations.len());
    for obs in observations {
        let value_str = obs["value"].as_str().unwrap_or(".");
        if value_str == "." {
            continue;
        }
        let value: f64 = match value_str.parse() {
            Ok(v) => v,
            Err(_) => continue,
        };
        let date_str = obs["date"]
            .as_str()
            .with_context(|| format!("FRED observation for {series_id} is missing a date"))?;
        let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
            .with_context(|| format!("unparseable FRED date '{date_str}' for {series_id}"))?;
        points.push(AuxPoint { date, value });
    }

    Ok(AuxiliarySeries::new(series_id, points)?)
}

/// Built-in annual fed funds target snapshot, one observation per January 1st
/// from 2000 onwards. Coarse, but enough to draw the rate panel without a
/// FRED key.
pub fn builtin_fed_funds() -> AuxiliarySeries {
    const ANNUAL_RATES: [f64; 25] = [
        6.5, 6.0, 1.75, 1.0, 2.0, 3.25, 4.25, 5.25, 0.25, 0.25, 0.25, 0.25, 0.25, 0.25, 0.25,
        0.5, 0.75, 1.5, 2.5, 1.75, 0.25, 0.25, 4.5, 5.5, 5.5,
    ];

    let points = ANNUAL_RATES
        .iter()
        .enumerate()
        .map(|(i, &value)| AuxPoint {
            date: NaiveDate::from_ymd_opt(2000 + i as i32, 1, 1)
                .expect("static fed funds table date"),
            value,
        })
        .collect();

    AuxiliarySeries::new(FED_FUNDS, points).expect("static fed funds table is sorted")
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn observations_parse_and_skip_placeholders() {
        let body = serde_json::json!({
            "observations": [
                { "date": "2023-01-01", "value": "4.33" },
                { "date": "2023-02-01", "value": "." },
                { "date": "2023-03-01", "value": "4.65" }
            ]
        });
        let series = parse_observations("FEDFUNDS", &body).unwrap();
        assert_eq!(series.points().len(), 2);
        assert!((series.points()[0].value - 4.33).abs() < 1e-9);
        assert_eq!(
            series.points()[1].date,
            NaiveDate::from_ymd_opt(2023, 3, 1).unwrap()
        );
    }

    #[test]
    fn missing_observations_key_is_an_error() {
        let body = serde_json::json!({ "error_message": "Bad Request" });
        assert!(parse_observations("GDP", &body).is_err());
    }

    #[test]
    fn unparseable_date_is_an_error() {
        let body = serde_json::json!({
            "observations": [{ "date": "01/01/2023", "value": "4.33" }]
        });
        assert!(parse_observations("FEDFUNDS", &body).is_err());
    }

    #[test]
    fn builtin_table_is_valid_and_starts_in_2000() {
        let series = builtin_fed_funds();
        assert_eq!(series.name(), FED_FUNDS);
        assert_eq!(series.points().len(), 25);
        assert_eq!(
            series.points()[0].date,
            NaiveDate::from_ymd_opt(2000, 1, 1).unwrap()
        );
        assert_eq!(
            series.points()[24].date,
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
        );
    }
}
