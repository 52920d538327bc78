// =============================================================================
// Time-Series Alignment — range filter + forward-fill join
// =============================================================================
//
// Merges a price series (with its indicator columns) and any number of sparse
// auxiliary series onto a single date axis:
//
// Step 1 — drop every observation outside `[start, end]` (inclusive), in the
//          primary and in each auxiliary.
// Step 2 — the output axis is exactly the filtered primary dates; auxiliary
//          dates never extend it.
// Step 3 — forward-fill join: the auxiliary value at axis date `d` is the
//          most recent auxiliary observation with date <= `d`. Positions
//          before the first auxiliary observation stay undefined. Values are
//          never back-filled from the future.
//
// The join is a single two-pointer scan per auxiliary (O(n + m)); there is no
// per-row rescan of the auxiliary series.

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

use crate::indicators::IndicatorSeries;

use super::{AuxiliarySeries, PriceSeries};

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, Error)]
pub enum AlignError {
    /// The primary series has no observations inside the requested range.
    /// Surfaced explicitly so callers never chart an empty table by accident.
    #[error("no price observations in range {start}..={end}")]
    EmptyPrimary { start: NaiveDate, end: NaiveDate },

    /// An indicator column does not line up 1:1 with the primary series.
    /// This is a caller bug, not a data condition.
    #[error("indicator column length {got} does not match primary length {expected}")]
    LengthMismatch { expected: usize, got: usize },
}

// =============================================================================
// AlignedTable
// =============================================================================

/// One named, forward-filled auxiliary column.
#[derive(Debug, Clone, Serialize)]
pub struct AuxColumn {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

/// Columnar, chart-ready result of `align`. Every column has exactly
/// `dates.len()` entries; undefined positions serialise as `null`.
#[derive(Debug, Clone, Serialize)]
pub struct AlignedTable {
    pub dates: Vec<NaiveDate>,
    pub open: Vec<f64>,
    pub high: Vec<f64>,
    pub low: Vec<f64>,
    pub close: Vec<f64>,
    pub volume: Vec<u64>,
    pub ma_short: Vec<Option<f64>>,
    pub ma_long: Vec<Option<f64>>,
    pub rsi: Vec<Option<f64>>,
    pub auxiliaries: Vec<AuxColumn>,
}

impl AlignedTable {
    pub fn row_count(&self) -> usize {
        self.dates.len()
    }

    /// Look up a forward-filled auxiliary column by series name.
    pub fn auxiliary(&self, name: &str) -> Option<&AuxColumn> {
        self.auxiliaries.iter().find(|c| c.name == name)
    }
}

// =============================================================================
// align
// =============================================================================

/// Merge `primary` (plus optional pre-computed indicator columns) with zero
/// or more auxiliary series onto the filtered primary date axis.
///
/// When `indicators` is `None` the indicator columns are emitted as all
/// undefined, so the table shape is identical either way.
pub fn align(
    primary: &PriceSeries,
    indicators: Option<&IndicatorSeries>,
    auxiliaries: &[AuxiliarySeries],
    start: NaiveDate,
    end: NaiveDate,
) -> Result<AlignedTable, AlignError> {
    // Shape check before any filtering: the indicator columns were computed
    // from the unfiltered primary and must match it 1:1.
    if let Some(ind) = indicators {
        for col in [&ind.ma_short, &ind.ma_long, &ind.rsi] {
            if col.len() != primary.len() {
                return Err(AlignError::LengthMismatch {
                    expected: primary.len(),
                    got: col.len(),
                });
            }
        }
    }

    let range = primary.range_indices(start, end);
    if range.is_empty() {
        return Err(AlignError::EmptyPrimary { start, end });
    }

    let rows = &primary.points()[range.clone()];
    let dates: Vec<NaiveDate> = rows.iter().map(|p| p.date).collect();

    let slice_opt = |col: &[Option<f64>]| col[range.clone()].to_vec();
    let (ma_short, ma_long, rsi) = match indicators {
        Some(ind) => (
            slice_opt(&ind.ma_short),
            slice_opt(&ind.ma_long),
            slice_opt(&ind.rsi),
        ),
        None => (
            vec![None; dates.len()],
            vec![None; dates.len()],
            vec![None; dates.len()],
        ),
    };

    let mut aux_columns = Vec::with_capacity(auxiliaries.len());
    for aux in auxiliaries {
        aux_columns.push(AuxColumn {
            name: aux.name().to_string(),
            values: forward_fill(aux, &dates, start, end),
        });
    }

    Ok(AlignedTable {
        open: rows.iter().map(|p| p.open).collect(),
        high: rows.iter().map(|p| p.high).collect(),
        low: rows.iter().map(|p| p.low).collect(),
        close: rows.iter().map(|p| p.close).collect(),
        volume: rows.iter().map(|p| p.volume).collect(),
        dates,
        ma_short,
        ma_long,
        rsi,
        auxiliaries: aux_columns,
    })
}

/// Two-pointer forward-fill of one auxiliary series onto `axis`.
/// `axis` must be ascending, which `align` guarantees.
fn forward_fill(
    aux: &AuxiliarySeries,
    axis: &[NaiveDate],
    start: NaiveDate,
    end: NaiveDate,
) -> Vec<Option<f64>> {
    let pts = aux.points();
    let lo = pts.partition_point(|p| p.date < start);
    let hi = pts.partition_point(|p| p.date <= end);
    let window = &pts[lo..hi.max(lo)];

    let mut values = Vec::with_capacity(axis.len());
    let mut j = 0;
    let mut last = None;
    for &d in axis {
        while j < window.len() && window[j].date <= d {
            last = Some(window[j].value);
            j += 1;
        }
        values.push(last);
    }
    values
}
