// =============================================================================
// Technical Indicators Module
// =============================================================================
//
// Pure, side-effect-free rolling statistics over a close-price column. Every
// function returns a vector aligned 1:1 with its input, using `None` for the
// warm-up positions where the trailing window is not yet full, so callers can
// join indicator columns straight onto the price table.

pub mod rsi;
pub mod sma;

use serde::Serialize;

use crate::series::PriceSeries;

/// Indicator columns derived from a price series. Each column has exactly
/// one entry per price observation.
#[derive(Debug, Clone, Serialize)]
pub struct IndicatorSeries {
    pub ma_short: Vec<Option<f64>>,
    pub ma_long: Vec<Option<f64>>,
    pub rsi: Vec<Option<f64>>,
}

impl IndicatorSeries {
    /// Compute the standard dashboard indicator set (two simple moving
    /// averages plus RSI) over the closes of `series`.
    pub fn compute(
        series: &PriceSeries,
        ma_short_window: usize,
        ma_long_window: usize,
        rsi_window: usize,
    ) -> Self {
        let closes = series.closes();
        Self {
            ma_short: sma::compute_moving_average(&closes, ma_short_window),
            ma_long: sma::compute_moving_average(&closes, ma_long_window),
            rsi: rsi::compute_rsi(&closes, rsi_window),
        }
    }

    pub fn len(&self) -> usize {
        self.rsi.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rsi.is_empty()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::series::PricePoint;
    use chrono::NaiveDate;

    fn series(closes: &[f64]) -> PriceSeries {
        let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        let points = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| PricePoint {
                date: start + chrono::Days::new(i as u64),
                open: c,
                high: c + 1.0,
                low: (c - 1.0).max(0.1),
                close: c,
                volume: 1,
            })
            .collect();
        PriceSeries::new(points).unwrap()
    }

    #[test]
    fn columns_match_series_length() {
        let s = series(&[10.0, 11.0, 12.0, 13.0, 14.0, 15.0]);
        let ind = IndicatorSeries::compute(&s, 2, 4, 3);
        assert_eq!(ind.ma_short.len(), s.len());
        assert_eq!(ind.ma_long.len(), s.len());
        assert_eq!(ind.rsi.len(), s.len());
    }

    #[test]
    fn oversized_windows_yield_all_undefined_columns() {
        let s = series(&[10.0, 11.0, 12.0]);
        let ind = IndicatorSeries::compute(&s, 50, 200, 14);
        assert!(ind.ma_short.iter().all(Option::is_none));
        assert!(ind.ma_long.iter().all(Option::is_none));
        assert!(ind.rsi.iter().all(Option::is_none));
    }
}
