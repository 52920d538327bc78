// =============================================================================
// Indicator Interpretation — plain-language insight strings
// =============================================================================
//
// Pure text generation over the latest indicator readings. The dashboard
// shows these next to the charts; nothing here touches the network or holds
// state.

/// Describe the latest RSI reading.
///
/// Zones: > 70 overbought, < 30 oversold, (50, 70] upward momentum,
/// [30, 50) downward momentum, otherwise neutral.
pub fn interpret_rsi(rsi: f64) -> &'static str {
    if rsi > 70.0 {
        "The RSI suggests the stock may be overbought, potentially indicating a possibility of a price correction."
    } else if rsi < 30.0 {
        "The RSI suggests the stock may be oversold, potentially indicating a possibility of a price increase."
    } else if rsi > 50.0 {
        "The RSI indicates an upward trend but is not yet in overbought territory."
    } else if rsi < 50.0 {
        "The RSI indicates a downward trend but is not yet in oversold territory."
    } else {
        "The RSI is in a neutral zone, suggesting no strong upward or downward momentum."
    }
}

/// Describe the relationship between the short and long moving averages
/// (golden cross / death cross).
pub fn interpret_ma_cross(ma_short: f64, ma_long: f64) -> &'static str {
    if ma_short > ma_long {
        "The short moving average is above the long moving average, signaling a bullish trend (Golden Cross)."
    } else if ma_short < ma_long {
        "The short moving average is below the long moving average, signaling a bearish trend (Death Cross)."
    } else {
        "The short and long moving averages are equal, indicating market indecision."
    }
}

/// Assemble the insight block for an analysis report from the latest defined
/// readings. Indicators still in their warm-up window are skipped rather
/// than guessed at.
pub fn build_insights(
    latest_close: f64,
    rsi: Option<f64>,
    ma_short: Option<f64>,
    ma_long: Option<f64>,
) -> Vec<String> {
    let mut insights = Vec::new();

    match rsi {
        Some(value) => insights.push(interpret_rsi(value).to_string()),
        None => insights.push(
            "RSI is not yet defined for the selected range (insufficient history for the window)."
                .to_string(),
        ),
    }

    if let (Some(s), Some(l)) = (ma_short, ma_long) {
        insights.push(interpret_ma_cross(s, l).to_string());
    }

    insights.push(format!(
        "The last closing price is {latest_close:.2}. Compare with historical prices for resistance/support levels."
    ));

    insights
}
