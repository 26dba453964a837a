//! Market signal forecasting for regulatory activity.
//!
//! Blends a least-squares trend over recent periods with a short moving
//! average. No training is needed, so the forecast is available as soon as
//! some history exists.

use serde::{Deserialize, Serialize};

/// Reported as `model_type` on every forecast.
pub const MODEL_TYPE: &str = "moving_average";

/// Periods the trend line is fitted over.
const TREND_WINDOW: usize = 6;

/// Periods averaged for the baseline.
const MOVING_AVERAGE_WINDOW: usize = 3;

const TREND_WEIGHT: f64 = 0.6;

/// Slope magnitude above which activity counts as moving.
const TREND_SLOPE_THRESHOLD: f64 = 0.5;

/// One observed period of regulatory activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityPoint {
    /// Period label, `YYYY-QN` when quarterly.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<String>,
    #[serde(default)]
    pub activity_count: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Increasing,
    Decreasing,
    Stable,
}

impl Trend {
    pub fn from_slope(slope: f64) -> Self {
        if slope > TREND_SLOPE_THRESHOLD {
            Trend::Increasing
        } else if slope < -TREND_SLOPE_THRESHOLD {
            Trend::Decreasing
        } else {
            Trend::Stable
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodForecast {
    pub period: String,
    /// Never negative; rounded to 2 places.
    pub predicted_activity: f64,
    /// Decays by 0.15 per period ahead, floored at 0.1.
    pub confidence: f64,
    pub trend: Trend,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketForecast {
    pub predictions: Vec<PeriodForecast>,
    pub industry: String,
    pub model_type: String,
}

/// Least-squares `(slope, intercept)` over `values` at x = 0, 1, 2, ...
pub fn linear_trend(values: &[f64]) -> (f64, f64) {
    let n = values.len();
    if n < 2 {
        return (0.0, values.first().copied().unwrap_or(0.0));
    }

    let x_mean = (n - 1) as f64 / 2.0;
    let y_mean = values.iter().sum::<f64>() / n as f64;
    let (numerator, denominator) = values
        .iter()
        .enumerate()
        .fold((0.0, 0.0), |(num, den), (i, v)| {
            let dx = i as f64 - x_mean;
            (num + dx * (v - y_mean), den + dx * dx)
        });

    if denominator == 0.0 {
        return (0.0, y_mean);
    }
    let slope = numerator / denominator;
    (slope, y_mean - slope * x_mean)
}

/// Label for the period `offset` steps after `last`. Quarterly labels roll
/// over years (`2025-Q4` + 1 is `2026-Q1`); anything else becomes
/// `T+{offset}`.
pub fn next_period(last: &str, offset: usize) -> String {
    let quarterly = last.split_once("-Q").and_then(|(year, quarter)| {
        Some((year.parse::<i64>().ok()?, quarter.parse::<i64>().ok()?))
    });
    match quarterly {
        Some((year, quarter)) => {
            let total = year * 4 + quarter - 1 + offset as i64;
            format!("{}-Q{}", total.div_euclid(4), total.rem_euclid(4) + 1)
        }
        None => format!("T+{offset}"),
    }
}

fn round_to(value: f64, places: i32) -> f64 {
    let scale = 10f64.powi(places);
    (value * scale).round() / scale
}

/// Forecast `periods` future periods of activity for `industry`.
///
/// An empty history yields an empty forecast.
pub fn forecast(industry: &str, history: &[ActivityPoint], periods: usize) -> MarketForecast {
    let mut predictions = Vec::with_capacity(periods);

    if !history.is_empty() {
        let values: Vec<f64> = history.iter().map(|p| p.activity_count).collect();

        let window = TREND_WINDOW.min(values.len());
        let (slope, intercept) = linear_trend(&values[values.len() - window..]);

        let ma_window = MOVING_AVERAGE_WINDOW.min(values.len());
        let recent = &values[values.len() - ma_window..];
        let moving_avg = recent.iter().sum::<f64>() / ma_window as f64;

        let last_period = history
            .last()
            .and_then(|p| p.period.clone())
            .unwrap_or_else(|| format!("T-{}", history.len() - 1));
        let trend = Trend::from_slope(slope);

        for step in 1..=periods {
            let trend_value = intercept + slope * (window + step) as f64;
            let blended = trend_value * TREND_WEIGHT + moving_avg * (1.0 - TREND_WEIGHT);
            let confidence = (1.0 - 0.15 * step as f64).max(0.1);

            predictions.push(PeriodForecast {
                period: next_period(&last_period, step),
                predicted_activity: round_to(blended.max(0.0), 2),
                confidence: round_to(confidence, 4),
                trend,
            });
        }
    }

    tracing::debug!(
        industry,
        history = history.len(),
        periods = predictions.len(),
        "Forecast market signals"
    );

    MarketForecast {
        predictions,
        industry: industry.to_string(),
        model_type: MODEL_TYPE.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn quarterly(counts: &[f64]) -> Vec<ActivityPoint> {
        counts
            .iter()
            .enumerate()
            .map(|(i, count)| ActivityPoint {
                period: Some(format!("{}-Q{}", 2025 + i / 4, i % 4 + 1)),
                activity_count: *count,
            })
            .collect()
    }

    #[test]
    fn test_increasing_history() {
        let history = quarterly(&[10.0, 15.0, 20.0, 25.0, 30.0, 35.0]);
        let result = forecast("fintech", &history, 4);

        assert_eq!(result.industry, "fintech");
        assert_eq!(result.model_type, "moving_average");
        assert_eq!(result.predictions.len(), 4);
        assert!(result.predictions.iter().all(|p| p.trend == Trend::Increasing));

        // slope 5, intercept 10; 0.6 * (10 + 5 * 7) + 0.4 * 30
        let first = &result.predictions[0];
        assert_eq!(first.period, "2026-Q3");
        assert_eq!(first.predicted_activity, 39.0);
        assert_eq!(first.confidence, 0.85);

        let last = &result.predictions[3];
        assert_eq!(last.period, "2027-Q2");
        assert_eq!(last.predicted_activity, 48.0);
        assert_eq!(last.confidence, 0.4);
    }

    #[test]
    fn test_decreasing_and_stable_trends() {
        let down = forecast("retail", &quarterly(&[50.0, 45.0, 40.0, 35.0, 30.0, 25.0]), 4);
        assert!(down.predictions.iter().all(|p| p.trend == Trend::Decreasing));

        let flat = forecast("energy", &quarterly(&[20.0; 6]), 4);
        assert!(flat.predictions.iter().all(|p| p.trend == Trend::Stable));
        assert!(flat.predictions.iter().all(|p| p.predicted_activity == 20.0));
    }

    #[test]
    fn test_prediction_never_negative() {
        let result = forecast("retail", &quarterly(&[30.0, 20.0, 10.0, 0.0]), 6);
        assert!(result.predictions.iter().all(|p| p.predicted_activity >= 0.0));
        assert_eq!(result.predictions[5].predicted_activity, 0.0);
    }

    #[test]
    fn test_confidence_floor() {
        let result = forecast("energy", &quarterly(&[1.0, 2.0]), 8);
        let confidences: Vec<f64> = result.predictions.iter().map(|p| p.confidence).collect();
        assert_eq!(confidences, vec![0.85, 0.7, 0.55, 0.4, 0.25, 0.1, 0.1, 0.1]);
    }

    #[test]
    fn test_empty_history() {
        let result = forecast("healthcare", &[], 4);
        assert!(result.predictions.is_empty());
        assert_eq!(result.industry, "healthcare");
    }

    #[test]
    fn test_single_point_history() {
        let history = vec![ActivityPoint {
            period: None,
            activity_count: 12.0,
        }];
        let result = forecast("energy", &history, 2);
        assert_eq!(result.predictions[0].period, "T+1");
        assert_eq!(result.predictions[1].period, "T+2");
        assert_eq!(result.predictions[0].predicted_activity, 12.0);
        assert_eq!(result.predictions[0].trend, Trend::Stable);
    }

    #[test]
    fn test_linear_trend() {
        assert_eq!(linear_trend(&[]), (0.0, 0.0));
        assert_eq!(linear_trend(&[4.0]), (0.0, 4.0));
        assert_eq!(linear_trend(&[1.0, 3.0, 5.0]), (2.0, 1.0));
    }

    #[test]
    fn test_next_period() {
        assert_eq!(next_period("2025-Q4", 1), "2026-Q1");
        assert_eq!(next_period("2025-Q2", 7), "2027-Q1");
        assert_eq!(next_period("March", 3), "T+3");
        assert_eq!(next_period("2025-Qx", 1), "T+1");
    }
}
