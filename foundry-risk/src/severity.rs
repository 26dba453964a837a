//! Severity classification shared by gaps and risk items.
//!
//! Severities arrive as free text from upstream services. Anything outside
//! the four known levels is kept verbatim in [`Severity::Unknown`] so it can
//! round-trip, and is scored with the default impact.

use serde::{Deserialize, Serialize};

/// Impact used for severities outside the known set.
pub const DEFAULT_IMPACT: f64 = 0.5;

/// Qualitative risk-impact level of a compliance gap.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
    /// Unrecognized label, preserved as received.
    Unknown(String),
}

impl Severity {
    /// Parse a severity label. Matching ignores ASCII case and surrounding
    /// whitespace; anything else becomes [`Severity::Unknown`].
    pub fn parse(label: &str) -> Self {
        let trimmed = label.trim();
        if trimmed.eq_ignore_ascii_case("critical") {
            Severity::Critical
        } else if trimmed.eq_ignore_ascii_case("high") {
            Severity::High
        } else if trimmed.eq_ignore_ascii_case("medium") {
            Severity::Medium
        } else if trimmed.eq_ignore_ascii_case("low") {
            Severity::Low
        } else {
            Severity::Unknown(label.to_string())
        }
    }

    /// Return the wire label.
    pub fn as_str(&self) -> &str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
            Severity::Unknown(raw) => raw,
        }
    }

    /// Impact weight used by risk scoring.
    pub fn impact(&self) -> f64 {
        match self {
            Severity::Critical => 0.95,
            Severity::High => 0.75,
            Severity::Medium => 0.5,
            Severity::Low => 0.25,
            Severity::Unknown(_) => DEFAULT_IMPACT,
        }
    }

    /// Sort rank: critical=4, high=3, medium=2, low=1, unknown=0.
    pub fn rank(&self) -> u8 {
        match self {
            Severity::Critical => 4,
            Severity::High => 3,
            Severity::Medium => 2,
            Severity::Low => 1,
            Severity::Unknown(_) => 0,
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Severity::Unknown(_))
    }
}

impl From<String> for Severity {
    fn from(label: String) -> Self {
        match Severity::parse(&label) {
            Severity::Unknown(_) => Severity::Unknown(label),
            known => known,
        }
    }
}

impl From<&str> for Severity {
    fn from(label: &str) -> Self {
        Severity::parse(label)
    }
}

impl From<Severity> for String {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Unknown(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
