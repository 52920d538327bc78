// =============================================================================
// Analysis Orchestration — one ticker, one date range, one report
// =============================================================================
//
// Glues the pure pieces together for a single dashboard query: compute the
// indicator columns over the fetched price history, align everything onto the
// requested date range, and attach the latest readings plus plain-language
// insights. The result is the chart-ready payload the REST layer serialises.
//
// Everything here is request-scoped; no state survives between calls.

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

use crate::indicators::IndicatorSeries;
use crate::interpret;
use crate::series::align::{align, AlignError, AlignedTable};
use crate::series::{AuxiliarySeries, PriceSeries};

// =============================================================================
// Parameters & errors
// =============================================================================

/// Indicator windows for one analysis run, taken from the runtime config.
#[derive(Debug, Clone, Copy)]
pub struct AnalysisParams {
    pub ma_short_window: usize,
    pub ma_long_window: usize,
    pub rsi_window: usize,
}

#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The price series has nothing inside the requested range. Callers must
    /// branch on this and show "no data" instead of an empty chart.
    #[error("no data for {ticker} in {start}..={end}")]
    NoData {
        ticker: String,
        start: NaiveDate,
        end: NaiveDate,
    },

    /// Shape violation between the primary series and its indicator columns.
    #[error(transparent)]
    Shape(AlignError),
}

// =============================================================================
// Report types
// =============================================================================

/// The most recent row of the aligned table, pulled out for the dashboard
/// header and the insight generator.
#[derive(Debug, Clone, Serialize)]
pub struct LatestSnapshot {
    pub date: NaiveDate,
    pub close: f64,
    pub ma_short: Option<f64>,
    pub ma_long: Option<f64>,
    pub rsi: Option<f64>,
}

/// Full analysis payload for one ticker/date-range query.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub ticker: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub table: AlignedTable,
    pub latest: LatestSnapshot,
    pub insights: Vec<String>,
}

// =============================================================================
// build_report
// =============================================================================

/// Build the report for `ticker` from an already-fetched price series and
/// whichever auxiliary series arrived (zero or partial availability is fine).
///
/// Indicators are computed over the full fetched history before the range
/// filter, so warm-up positions can draw on observations preceding `start`
/// when the provider returned them.
pub fn build_report(
    ticker: &str,
    primary: &PriceSeries,
    auxiliaries: &[AuxiliarySeries],
    params: AnalysisParams,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<AnalysisReport, AnalysisError> {
    let indicators = IndicatorSeries::compute(
        primary,
        params.ma_short_window,
        params.ma_long_window,
        params.rsi_window,
    );

    let table = align(primary, Some(&indicators), auxiliaries, start, end).map_err(|e| match e {
        AlignError::EmptyPrimary { start, end } => AnalysisError::NoData {
            ticker: ticker.to_string(),
            start,
            end,
        },
        other => AnalysisError::Shape(other),
    })?;

    let last = table.row_count() - 1;
    let latest = LatestSnapshot {
        date: table.dates[last],
        close: table.close[last],
        ma_short: table.ma_short[last],
        ma_long: table.ma_long[last],
        rsi: table.rsi[last],
    };

    let insights =
        interpret::build_insights(latest.close, latest.rsi, latest.ma_short, latest.ma_long);

    Ok(AnalysisReport {
        ticker: ticker.to_string(),
        start,
        end,
        table,
        latest,
        insights,
    })
}
