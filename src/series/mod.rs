// =============================================================================
// Price & Auxiliary Time Series — validated, immutable market data
// =============================================================================
//
// Every series is a request-scoped value: fetched, validated, transformed,
// handed to the API layer, and dropped. Nothing here holds global state.
//
// Dates are plain calendar dates (`chrono::NaiveDate`). Providers normalise
// timestamps to a single calendar representation before data reaches this
// module; no timezone conversion happens past this point.

pub mod align;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// Errors
// =============================================================================

/// Validation failures raised while constructing a series.
///
/// These indicate a provider or caller bug (malformed shape), never a normal
/// data condition such as a thin or empty range.
#[derive(Debug, Error)]
pub enum SeriesError {
    #[error("dates must be strictly ascending: {prev} followed by {next}")]
    UnsortedDates { prev: NaiveDate, next: NaiveDate },

    #[error("invalid OHLC ordering at {date}: low <= open/close <= high must hold")]
    InvalidOhlc { date: NaiveDate },

    #[error("non-positive price at {date}")]
    NonPositivePrice { date: NaiveDate },
}

// =============================================================================
// PriceSeries
// =============================================================================

/// A single daily (or coarser) price observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: u64,
}

/// An ordered OHLCV series with validated invariants:
/// dates strictly ascending (no duplicates), prices positive, and
/// `low <= open, close <= high` on every bar.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Validate `points` and wrap them in a `PriceSeries`.
    ///
    /// An empty vector is accepted — the fetch layer is responsible for
    /// treating an empty result as "no data" before any analysis runs.
    pub fn new(points: Vec<PricePoint>) -> Result<Self, SeriesError> {
        for pair in points.windows(2) {
            if pair[0].date >= pair[1].date {
                return Err(SeriesError::UnsortedDates {
                    prev: pair[0].date,
                    next: pair[1].date,
                });
            }
        }

        for p in &points {
            if p.open <= 0.0 || p.high <= 0.0 || p.low <= 0.0 || p.close <= 0.0 {
                return Err(SeriesError::NonPositivePrice { date: p.date });
            }
            let ordered = p.low <= p.open
                && p.open <= p.high
                && p.low <= p.close
                && p.close <= p.high;
            if !ordered {
                return Err(SeriesError::InvalidOhlc { date: p.date });
            }
        }

        Ok(Self { points })
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The close column, in date order.
    pub fn closes(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.close).collect()
    }

    /// Index range of the observations whose date falls inside
    /// `[start, end]` (inclusive). Empty when the range selects nothing or
    /// when `end < start`.
    pub fn range_indices(&self, start: NaiveDate, end: NaiveDate) -> std::ops::Range<usize> {
        let lo = self.points.partition_point(|p| p.date < start);
        let hi = self.points.partition_point(|p| p.date <= end);
        lo..hi.max(lo)
    }

    /// Aggregate daily bars into one bar per calendar month:
    /// open = first, high = max, low = min, close = last, volume = sum.
    /// The bar is dated at the last trading date observed in the month, so
    /// the output dates remain strictly ascending.
    pub fn resample_monthly(&self) -> PriceSeries {
        let mut out: Vec<PricePoint> = Vec::new();

        for p in &self.points {
            match out.last_mut() {
                Some(last)
                    if (last.date.year(), last.date.month())
                        == (p.date.year(), p.date.month()) =>
                {
                    last.high = last.high.max(p.high);
                    last.low = last.low.min(p.low);
                    last.close = p.close;
                    last.volume += p.volume;
                    last.date = p.date;
                }
                _ => out.push(*p),
            }
        }

        // Aggregation preserves every constructor invariant, so the result
        // can be built without re-validating.
        PriceSeries { points: out }
    }
}

// =============================================================================
// AuxiliarySeries
// =============================================================================

/// One observation of a sparse economic series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AuxPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// A named economic indicator (fed funds rate, GDP, CPI) sampled at
/// irregular or coarser intervals than the price series it accompanies.
/// Dates are strictly ascending.
#[derive(Debug, Clone, Serialize)]
pub struct AuxiliarySeries {
    name: String,
    points: Vec<AuxPoint>,
}

impl AuxiliarySeries {
    pub fn new(name: impl Into<String>, points: Vec<AuxPoint>) -> Result<Self, SeriesError> {
        for pair in points.windows(2) {
            if pair[0].date >= pair[1].date {
                return Err(SeriesError::UnsortedDates {
                    prev: pair[0].date,
                    next: pair[1].date,
                });
            }
        }
        Ok(Self {
            name: name.into(),
            points,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn points(&self) -> &[AuxPoint] {
        &self.points
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn bar(date: NaiveDate, close: f64) -> PricePoint {
        PricePoint {
            date,
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 100,
        }
    }

    // ---- PriceSeries construction ------------------------------------------

    #[test]
    fn empty_series_is_accepted() {
        let s = PriceSeries::new(Vec::new()).unwrap();
        assert!(s.is_empty());
    }

    #[test]
    fn duplicate_date_is_rejected() {
        let pts = vec![bar(d(2023, 1, 2), 10.0), bar(d(2023, 1, 2), 11.0)];
        assert!(matches!(
            PriceSeries::new(pts),
            Err(SeriesError::UnsortedDates { .. })
        ));
    }

    #[test]
    fn descending_dates_are_rejected() {
        let pts = vec![bar(d(2023, 1, 3), 10.0), bar(d(2023, 1, 2), 11.0)];
        assert!(matches!(
            PriceSeries::new(pts),
            Err(SeriesError::UnsortedDates { .. })
        ));
    }

    #[test]
    fn broken_ohlc_ordering_is_rejected() {
        let mut p = bar(d(2023, 1, 2), 10.0);
        p.low = 20.0; // low above open/close/high
        assert!(matches!(
            PriceSeries::new(vec![p]),
            Err(SeriesError::InvalidOhlc { .. })
        ));
    }

    #[test]
    fn non_positive_price_is_rejected() {
        let mut p = bar(d(2023, 1, 2), 0.5);
        p.low = -0.5;
        assert!(matches!(
            PriceSeries::new(vec![p]),
            Err(SeriesError::NonPositivePrice { .. })
        ));
    }

    // ---- range_indices -------------------------------------------------------

    #[test]
    fn range_indices_is_inclusive_on_both_ends() {
        let pts: Vec<PricePoint> = (1..=10).map(|i| bar(d(2023, 1, i), 10.0)).collect();
        let s = PriceSeries::new(pts).unwrap();

        let r = s.range_indices(d(2023, 1, 3), d(2023, 1, 7));
        assert_eq!(r, 2..7);

        // Whole range.
        assert_eq!(s.range_indices(d(2022, 1, 1), d(2024, 1, 1)), 0..10);
    }

    #[test]
    fn range_indices_empty_when_reversed_or_outside() {
        let pts: Vec<PricePoint> = (1..=5).map(|i| bar(d(2023, 1, i), 10.0)).collect();
        let s = PriceSeries::new(pts).unwrap();

        assert!(s.range_indices(d(2023, 1, 4), d(2023, 1, 2)).is_empty());
        assert!(s.range_indices(d(2024, 1, 1), d(2024, 2, 1)).is_empty());
    }

    // ---- resample_monthly ----------------------------------------------------

    #[test]
    fn resample_monthly_aggregates_ohlcv() {
        let pts = vec![
            PricePoint { date: d(2023, 1, 2), open: 10.0, high: 12.0, low: 9.0, close: 11.0, volume: 100 },
            PricePoint { date: d(2023, 1, 15), open: 11.0, high: 15.0, low: 10.0, close: 14.0, volume: 200 },
            PricePoint { date: d(2023, 1, 31), open: 14.0, high: 14.5, low: 12.0, close: 13.0, volume: 300 },
            PricePoint { date: d(2023, 2, 1), open: 13.0, high: 13.5, low: 12.5, close: 13.2, volume: 50 },
        ];
        let monthly = PriceSeries::new(pts).unwrap().resample_monthly();

        assert_eq!(monthly.len(), 2);
        let jan = monthly.points()[0];
        assert_eq!(jan.date, d(2023, 1, 31));
        assert!((jan.open - 10.0).abs() < 1e-12);
        assert!((jan.high - 15.0).abs() < 1e-12);
        assert!((jan.low - 9.0).abs() < 1e-12);
        assert!((jan.close - 13.0).abs() < 1e-12);
        assert_eq!(jan.volume, 600);

        let feb = monthly.points()[1];
        assert_eq!(feb.date, d(2023, 2, 1));
        assert_eq!(feb.volume, 50);
    }

    // ---- AuxiliarySeries -------------------------------------------------------

    #[test]
    fn auxiliary_rejects_unsorted_dates() {
        let pts = vec![
            AuxPoint { date: d(2023, 1, 5), value: 5.0 },
            AuxPoint { date: d(2023, 1, 1), value: 4.0 },
        ];
        assert!(AuxiliarySeries::new("FEDFUNDS", pts).is_err());
    }

    #[test]
    fn auxiliary_accepts_sorted_points() {
        let pts = vec![
            AuxPoint { date: d(2023, 1, 1), value: 4.0 },
            AuxPoint { date: d(2023, 1, 5), value: 5.0 },
        ];
        let s = AuxiliarySeries::new("FEDFUNDS", pts).unwrap();
        assert_eq!(s.name(), "FEDFUNDS");
        assert_eq!(s.points().len(), 2);
    }
}
