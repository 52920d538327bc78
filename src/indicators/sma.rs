// =============================================================================
// Simple Moving Average (SMA)
// =============================================================================
//
// The arithmetic mean of the trailing `window` values, recomputed at every
// position via a running sum (O(n) total, no per-position rescan).

/// Compute the simple moving average of `values` over a trailing `window`.
///
/// The output has the same length as the input. Position `i` holds the mean
/// of `values[i - window + 1 ..= i]` when `i >= window - 1`, and `None`
/// during the warm-up prefix.
///
/// # Edge cases
/// - `window == 0` => every position is `None`
/// - `window > values.len()` => every position is `None` (insufficient
///   history is not an error; the caller decides how to display the gap)
pub fn compute_moving_average(values: &[f64], window: usize) -> Vec<Option<f64>> {
    let n = values.len();
    if window == 0 || window > n {
        return vec![None; n];
    }

    let mut out = vec![None; n];
    let mut sum = 0.0;
    for i in 0..n {
        sum += values[i];
        if i >= window {
            sum -= values[i - window];
        }
        if i + 1 >= window {
            out[i] = Some(sum / window as f64);
        }
    }
    out
}

// =============================================================================
// Unit Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input() {
        assert!(compute_moving_average(&[], 5).is_empty());
    }

    #[test]
    fn window_zero_is_all_undefined() {
        let out = compute_moving_average(&[1.0, 2.0, 3.0], 0);
        assert_eq!(out, vec![None, None, None]);
    }

    #[test]
    fn window_larger_than_input_is_all_undefined() {
        let out = compute_moving_average(&[1.0, 2.0, 3.0], 4);
        assert_eq!(out, vec![None, None, None]);
    }

    #[test]
    fn warm_up_prefix_then_means() {
        // 3-period SMA of [1..6]: defined from index 2.
        let values: Vec<f64> = (1..=6).map(|x| x as f64).collect();
        let out = compute_moving_average(&values, 3);
        assert_eq!(
            out,
            vec![None, None, Some(2.0), Some(3.0), Some(4.0), Some(5.0)]
        );
    }

    #[test]
    fn window_equals_length() {
        let out = compute_moving_average(&[2.0, 4.0, 6.0], 3);
        assert_eq!(out, vec![None, None, Some(4.0)]);
    }

    #[test]
    fn window_one_is_identity() {
        let values = vec![5.0, 7.5, 2.5];
        let out = compute_moving_average(&values, 1);
        assert_eq!(out, vec![Some(5.0), Some(7.5), Some(2.5)]);
    }

    #[test]
    fn every_defined_position_matches_a_direct_mean() {
        let values = vec![44.34, 44.09, 44.15, 43.61, 44.33, 44.83, 45.10, 45.42];
        let window = 4;
        let out = compute_moving_average(&values, window);

        for i in 0..values.len() {
            if i + 1 >= window {
                let direct: f64 =
                    values[i + 1 - window..=i].iter().sum::<f64>() / window as f64;
                let got = out[i].expect("position should be defined");
                assert!((got - direct).abs() < 1e-9, "index {i}: {got} vs {direct}");
            } else {
                assert!(out[i].is_none(), "index {i} should be warm-up");
            }
        }
    }
}
