// =============================================================================
// Relative Strength Index (RSI) — trailing simple mean
// =============================================================================
//
// RSI measures the speed and magnitude of recent price changes on a bounded
// [0, 100] scale.
//
// Step 1 — per-step change: delta[i] = close[i] - close[i-1].
// Step 2 — split into gain[i] = max(delta[i], 0), loss[i] = max(-delta[i], 0).
//          The first close has no preceding observation; its gain and loss
//          are zero so the columns stay aligned 1:1 with the closes.
// Step 3 — avg_gain / avg_loss = trailing simple mean over `window` positions
//          (running sums, O(n) total).
// Step 4 — RS = avg_gain / avg_loss, RSI = 100 - 100 / (1 + RS).
//
// Division-by-zero policy (fixed, not provider-dependent):
//   avg_loss == 0 and avg_gain > 0  =>  RSI = 100  (maximal bullish reading)
//   avg_loss == 0 and avg_gain == 0 =>  RSI = 50   (flat price, neutral)
//
// Thresholds used by the interpretation layer: > 70 overbought, < 30 oversold.

/// Conventional RSI look-back used across the dashboard.
pub const DEFAULT_RSI_WINDOW: usize = 14;

/// Compute the RSI series for `closes` over a trailing `window`.
///
/// The output has the same length as the input; the first `window - 1`
/// positions are `None`, and every defined value lies in `[0, 100]`.
///
/// # Edge cases
/// - `window == 0` or `window > closes.len()` => every position is `None`
/// - zero average loss / zero average gain => see the policy above; the
///   computation never produces a non-finite value
pub fn compute_rsi(closes: &[f64], window: usize) -> Vec<Option<f64>> {
    let n = closes.len();
    if window == 0 || window > n {
        return vec![None; n];
    }

    let mut gains = vec![0.0; n];
    let mut losses = vec![0.0; n];
    for i in 1..n {
        let delta = closes[i] - closes[i - 1];
        gains[i] = delta.max(0.0);
        losses[i] = (-delta).max(0.0);
    }

    let window_f = window as f64;
    let mut out = vec![None; n];
    let mut gain_sum = 0.0;
    let mut loss_sum = 0.0;

    for i in 0..n {
        gain_sum += gains[i];
        loss_sum += losses[i];
        if i >= window {
            // Running-sum update; clamp at zero so floating-point residue
            // cannot break the exact zero checks below.
            gain_sum = (gain_sum - gains[i - window]).max(0.0);
            loss_sum = (loss_sum - losses[i - window]).max(0.0);
        }
        if i + 1 >= window {
            out[i] = Some(rsi_from_averages(gain_sum / window_f, loss_sum / window_f));
        }
    }

    out
}

/// Convert average gain / average loss into an RSI value in [0, 100].
fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 && avg_gain == 0.0 {
        50.0 // No movement at all — neutral.
    } else if avg_loss == 0.0 {
        100.0 // Only gains in the window.
    } else {
        let rs = avg_gain / avg_loss;
        100.0 - 100.0 / (1.0 + rs)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    fn defined(out: &[Option<f64>]) -> Vec<f64> {
        out.iter().flatten().copied().collect()
    }

    // ---- shape & warm-up ---------------------------------------------------

    #[test]
    fn empty_input() {
        assert!(compute_rsi(&[], DEFAULT_RSI_WINDOW).is_empty());
    }

    #[test]
    fn window_zero_is_all_undefined() {
        let out = compute_rsi(&[1.0, 2.0, 3.0], 0);
        assert!(out.iter().all(Option::is_none));
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn window_larger_than_input_is_all_undefined() {
        let closes: Vec<f64> = (1..=10).map(|x| x as f64).collect();
        let out = compute_rsi(&closes, 14);
        assert_eq!(out.len(), 10);
        assert!(out.iter().all(Option::is_none));
    }

    #[test]
    fn first_defined_position_is_window_minus_one() {
        let closes: Vec<f64> = (1..=20).map(|x| x as f64).collect();
        let out = compute_rsi(&closes, 14);
        assert!(out[..13].iter().all(Option::is_none));
        assert!(out[13..].iter().all(Option::is_some));
    }

    // ---- fixed scenarios ------------------------------------------------------

    #[test]
    fn strictly_increasing_closes_read_100() {
        // close = [1..15], window 14: index 13 is the first defined position
        // and reads 100 (no losses in the window).
        let closes: Vec<f64> = (1..=15).map(|x| x as f64).collect();
        let out = compute_rsi(&closes, 14);
        assert!((out[13].unwrap() - 100.0).abs() < 1e-10);

        let longer: Vec<f64> = (1..=40).map(|x| x as f64).collect();
        for v in defined(&compute_rsi(&longer, 14)) {
            assert!((v - 100.0).abs() < 1e-10, "expected 100, got {v}");
        }
    }

    #[test]
    fn strictly_decreasing_closes_read_0() {
        let closes: Vec<f64> = (1..=40).rev().map(|x| x as f64).collect();
        for v in defined(&compute_rsi(&closes, 14)) {
            assert!(v.abs() < 1e-10, "expected 0, got {v}");
        }
    }

    #[test]
    fn flat_closes_read_neutral_50() {
        // close = [10.0; 20], window 14 => rsi[13..=19] == 50.
        let closes = vec![10.0; 20];
        let out = compute_rsi(&closes, 14);
        assert!(out[..13].iter().all(Option::is_none));
        for v in &out[13..] {
            assert!((v.unwrap() - 50.0).abs() < 1e-10);
        }
    }

    // ---- bounds ---------------------------------------------------------------

    #[test]
    fn defined_values_stay_in_bounds() {
        let closes = vec![
            44.34, 44.09, 44.15, 43.61, 44.33, 44.83, 45.10, 45.42, 45.84, 46.08,
            45.89, 46.03, 44.18, 44.22, 44.57, 43.42, 42.66, 43.13, 44.01, 43.50,
        ];
        for v in defined(&compute_rsi(&closes, 14)) {
            assert!((0.0..=100.0).contains(&v), "RSI {v} out of range");
        }
    }

    #[test]
    fn mixed_moves_give_intermediate_values() {
        // Equal-sized up and down moves: average gain == average loss => 50.
        let mut closes = vec![100.0];
        for i in 0..20 {
            let last = *closes.last().unwrap();
            closes.push(if i % 2 == 0 { last + 1.0 } else { last - 1.0 });
        }
        let out = compute_rsi(&closes, 14);
        for v in defined(&out) {
            assert!((v - 50.0).abs() < 1.0e-9 || (35.0..=65.0).contains(&v));
        }
    }
}
