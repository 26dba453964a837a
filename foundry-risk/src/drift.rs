//! Statistical drift detection over operational metrics.
//!
//! A sample drifts when any metric sits more than `threshold` standard
//! deviations from its baseline mean.

use serde::{Deserialize, Serialize};

use crate::error::DriftError;

/// Metric names, in feature-vector order.
pub const METRIC_KEYS: [&str; 5] = [
    "compliance_score",
    "response_time",
    "error_rate",
    "throughput",
    "latency_p99",
];

/// One observation of operational metrics. Missing metrics read as 0.0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricSample {
    pub compliance_score: f64,
    pub response_time: f64,
    pub error_rate: f64,
    pub throughput: f64,
    pub latency_p99: f64,
}

impl MetricSample {
    pub fn to_vector(&self) -> [f64; 5] {
        [
            self.compliance_score,
            self.response_time,
            self.error_rate,
            self.throughput,
            self.latency_p99,
        ]
    }
}

/// Per-metric mean and standard deviation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriftBaseline {
    pub means: [f64; 5],
    pub stds: [f64; 5],
}

/// Result of checking one sample against a baseline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriftReport {
    pub is_drifting: bool,
    /// Negated maximum z-score, rounded to 4 places; more negative is more anomalous.
    pub anomaly_score: f64,
    /// Negated z threshold, on the same scale as `anomaly_score`.
    pub threshold: f64,
    /// Metrics whose z-score exceeded the threshold.
    pub deviating: Vec<String>,
    pub details: String,
}

impl Default for DriftBaseline {
    fn default() -> Self {
        Self::reference()
    }
}

impl DriftBaseline {
    /// Reference operating envelope used when no history is available.
    pub fn reference() -> Self {
        Self {
            means: [0.85, 200.0, 0.02, 100.0, 500.0],
            stds: [0.10, 50.0, 0.01, 30.0, 100.0],
        }
    }

    /// Fit a baseline from normal-behavior samples. Uses the population
    /// standard deviation; a zero deviation is replaced by 1.0.
    pub fn fit(samples: &[MetricSample]) -> Result<Self, DriftError> {
        if samples.is_empty() {
            return Err(DriftError::EmptyBaseline);
        }
        let n = samples.len() as f64;
        let vectors: Vec<[f64; 5]> = samples.iter().map(MetricSample::to_vector).collect();

        let mut means = [0.0; 5];
        for v in &vectors {
            for (mean, x) in means.iter_mut().zip(v) {
                *mean += x;
            }
        }
        for mean in &mut means {
            *mean /= n;
        }

        let mut stds = [0.0; 5];
        for v in &vectors {
            for ((var, x), mean) in stds.iter_mut().zip(v).zip(&means) {
                *var += (x - mean).powi(2);
            }
        }
        for std in &mut stds {
            *std = (*std / n).sqrt();
            if *std == 0.0 {
                *std = 1.0;
            }
        }

        tracing::debug!(samples = samples.len(), "Fitted drift baseline");
        Ok(Self { means, stds })
    }

    /// Per-metric absolute z-scores for `sample`.
    pub fn z_scores(&self, sample: &MetricSample) -> [f64; 5] {
        let x = sample.to_vector();
        std::array::from_fn(|i| ((x[i] - self.means[i]) / self.stds[i]).abs())
    }

    /// Check a sample against this baseline.
    pub fn detect(&self, sample: &MetricSample, threshold: f64) -> DriftReport {
        let z = self.z_scores(sample);
        let max_z = z.iter().copied().fold(0.0_f64, f64::max);

        let deviating: Vec<String> = METRIC_KEYS
            .iter()
            .zip(z)
            .filter(|(_, score)| *score > threshold)
            .map(|(key, _)| key.to_string())
            .collect();
        let is_drifting = max_z > threshold;

        let details = if is_drifting {
            format!(
                "Drift detected: metrics deviating >{threshold} std: {}",
                deviating.join(", ")
            )
        } else {
            format!("All metrics within {threshold} standard deviations of expected range.")
        };

        if is_drifting {
            tracing::warn!(metrics = %deviating.join(","), max_z, "Metric drift detected");
        }

        DriftReport {
            is_drifting,
            anomaly_score: (-max_z * 10_000.0).round() / 10_000.0,
            threshold: -threshold,
            deviating,
            details,
        }
    }
}
