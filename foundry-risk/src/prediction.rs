//! Regulatory change prediction from historical change signals.
//!
//! A heuristic stand-in for a trained classifier: frequent, severe
//! changes in a regulation's history make another change more likely.

use serde::{Deserialize, Serialize};

/// Change frequency assumed when only a regulation id is known.
pub const DEFAULT_CHANGE_FREQUENCY: f64 = 2.0;

/// Severity signal assumed when only a regulation id is known.
pub const DEFAULT_SEVERITY_SIGNAL: f64 = 2.0;

/// Likelihood at or above which a change is expected.
pub const CHANGE_EXPECTED_AT: f64 = 0.5;

/// Historical signals for one regulation. Missing numbers read as 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegulationSignal {
    #[serde(default = "default_regulation_id")]
    pub regulation_id: String,
    /// Changes per period over the regulation's history.
    #[serde(default)]
    pub change_frequency: f64,
    /// Numeric severity of past changes.
    #[serde(default)]
    pub severity: f64,
}

fn default_regulation_id() -> String {
    "unknown".into()
}

impl RegulationSignal {
    /// Signal for a bare regulation id, using the default frequency and
    /// severity.
    pub fn from_id(regulation_id: impl Into<String>) -> Self {
        Self {
            regulation_id: regulation_id.into(),
            change_frequency: DEFAULT_CHANGE_FREQUENCY,
            severity: DEFAULT_SEVERITY_SIGNAL,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictedChange {
    ChangeExpected,
    Stable,
}

/// Expected time until the change lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Timeframe {
    #[serde(rename = "1-3 months")]
    OneToThreeMonths,
    #[serde(rename = "3-6 months")]
    ThreeToSixMonths,
    #[serde(rename = "6-12 months")]
    SixToTwelveMonths,
    #[serde(rename = "12+ months")]
    OverTwelveMonths,
}

impl Timeframe {
    pub fn for_likelihood(likelihood: f64) -> Self {
        if likelihood >= 0.8 {
            Timeframe::OneToThreeMonths
        } else if likelihood >= 0.5 {
            Timeframe::ThreeToSixMonths
        } else if likelihood >= 0.3 {
            Timeframe::SixToTwelveMonths
        } else {
            Timeframe::OverTwelveMonths
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeImpact {
    Low,
    Medium,
    High,
}

impl ChangeImpact {
    /// Impact of a predicted change. Stable regulations are always low.
    pub fn for_prediction(likelihood: f64, change_expected: bool) -> Self {
        if !change_expected {
            ChangeImpact::Low
        } else if likelihood >= 0.8 {
            ChangeImpact::High
        } else if likelihood >= 0.5 {
            ChangeImpact::Medium
        } else {
            ChangeImpact::Low
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangePrediction {
    pub regulation_id: String,
    pub predicted_change: PredictedChange,
    /// Rounded to 4 places.
    pub likelihood: f64,
    pub timeframe: Timeframe,
    pub impact: ChangeImpact,
}

/// `min(1, frequency * 0.15 + severity * 0.1)`. Not clamped below.
pub fn change_likelihood(change_frequency: f64, severity: f64) -> f64 {
    (change_frequency * 0.15 + severity * 0.1).min(1.0)
}

pub fn predict_change(signal: &RegulationSignal) -> ChangePrediction {
    let likelihood = change_likelihood(signal.change_frequency, signal.severity);
    let change_expected = likelihood >= CHANGE_EXPECTED_AT;

    ChangePrediction {
        regulation_id: signal.regulation_id.clone(),
        predicted_change: if change_expected {
            PredictedChange::ChangeExpected
        } else {
            PredictedChange::Stable
        },
        likelihood: (likelihood * 10_000.0).round() / 10_000.0,
        timeframe: Timeframe::for_likelihood(likelihood),
        impact: ChangeImpact::for_prediction(likelihood, change_expected),
    }
}

/// Predict changes for a batch, in input order.
pub fn predict_changes(signals: &[RegulationSignal]) -> Vec<ChangePrediction> {
    let predictions: Vec<ChangePrediction> = signals.iter().map(predict_change).collect();
    tracing::debug!(
        regulations = signals.len(),
        expected = predictions
            .iter()
            .filter(|p| p.predicted_change == PredictedChange::ChangeExpected)
            .count(),
        "Predicted regulatory changes"
    );
    predictions
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn signal(frequency: f64, severity: f64) -> RegulationSignal {
        RegulationSignal {
            regulation_id: "reg-1".into(),
            change_frequency: frequency,
            severity,
        }
    }

    #[test]
    fn test_default_signal_expects_change() {
        // 2 * 0.15 + 2 * 0.1 lands exactly on the boundary, which counts as a change.
        let prediction = predict_change(&RegulationSignal::from_id("gdpr"));
        assert_eq!(prediction.regulation_id, "gdpr");
        assert_eq!(prediction.likelihood, 0.5);
        assert_eq!(prediction.predicted_change, PredictedChange::ChangeExpected);
        assert_eq!(prediction.timeframe, Timeframe::ThreeToSixMonths);
        assert_eq!(prediction.impact, ChangeImpact::Medium);
    }

    #[test]
    fn test_low_signal_is_stable() {
        let prediction = predict_change(&signal(1.0, 1.0));
        assert_eq!(prediction.likelihood, 0.25);
        assert_eq!(prediction.predicted_change, PredictedChange::Stable);
        assert_eq!(prediction.timeframe, Timeframe::OverTwelveMonths);
        assert_eq!(prediction.impact, ChangeImpact::Low);
    }

    #[test]
    fn test_likelihood_caps_at_one() {
        let prediction = predict_change(&signal(10.0, 5.0));
        assert_eq!(prediction.likelihood, 1.0);
        assert_eq!(prediction.timeframe, Timeframe::OneToThreeMonths);
        assert_eq!(prediction.impact, ChangeImpact::High);
    }

    #[test]
    fn test_timeframe_buckets() {
        assert_eq!(Timeframe::for_likelihood(0.8), Timeframe::OneToThreeMonths);
        assert_eq!(Timeframe::for_likelihood(0.79), Timeframe::ThreeToSixMonths);
        assert_eq!(Timeframe::for_likelihood(0.3), Timeframe::SixToTwelveMonths);
        assert_eq!(Timeframe::for_likelihood(0.0), Timeframe::OverTwelveMonths);
    }

    #[test]
    fn test_stable_prediction_has_low_impact() {
        assert_eq!(ChangeImpact::for_prediction(0.9, false), ChangeImpact::Low);
        assert_eq!(ChangeImpact::for_prediction(0.6, true), ChangeImpact::Medium);
    }

    #[test]
    fn test_wire_format() {
        let signal: RegulationSignal = serde_json::from_str(r#"{"change_frequency": 4}"#).unwrap();
        assert_eq!(signal.regulation_id, "unknown");
        assert_eq!(signal.severity, 0.0);

        let json = serde_json::to_value(predict_change(&signal)).unwrap();
        assert_eq!(json["predicted_change"], "change_expected");
        assert_eq!(json["timeframe"], "3-6 months");
        assert_eq!(json["impact"], "medium");
        assert_eq!(json["likelihood"], 0.6);
    }

    #[test]
    fn test_batch_keeps_order() {
        let predictions = predict_changes(&[
            RegulationSignal::from_id("a"),
            RegulationSignal::from_id("b"),
        ]);
        let ids: Vec<&str> = predictions.iter().map(|p| p.regulation_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert!(predict_changes(&[]).is_empty());
    }
}
