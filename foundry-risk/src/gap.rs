//! Compliance gaps: the input to risk scoring.
//!
//! Gaps come from the gap analysis step (see [`crate::analysis`]) or from
//! the web app's analysis endpoint. Optional fields mirror what upstream
//! producers actually send.

use serde::{Deserialize, Serialize};

use crate::error::FoundryError;
use crate::severity::Severity;

/// Category assigned when a gap carries none.
pub const DEFAULT_CATEGORY: &str = "General";

/// A detected shortfall between practice and a regulatory requirement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComplianceGap {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub severity: Severity,
    /// Likelihood estimate, nominally in `[0, 1]`.
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regulation: Option<String>,
    #[serde(
        default,
        alias = "suggested_action",
        skip_serializing_if = "Option::is_none"
    )]
    pub suggested_action: Option<String>,
    /// Machine tag set by the rule that produced the gap.
    #[serde(default, alias = "gap_type", skip_serializing_if = "Option::is_none")]
    pub gap_type: Option<String>,
}

impl ComplianceGap {
    pub fn new(title: impl Into<String>, severity: Severity, confidence: f64) -> Self {
        Self {
            id: None,
            title: title.into(),
            description: String::new(),
            severity,
            confidence,
            category: None,
            regulation: None,
            suggested_action: None,
            gap_type: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_regulation(mut self, regulation: impl Into<String>) -> Self {
        self.regulation = Some(regulation.into());
        self
    }

    pub fn with_suggested_action(mut self, action: impl Into<String>) -> Self {
        self.suggested_action = Some(action.into());
        self
    }

    pub fn with_gap_type(mut self, gap_type: impl Into<String>) -> Self {
        self.gap_type = Some(gap_type.into());
        self
    }

    /// Category, falling back to [`DEFAULT_CATEGORY`].
    pub fn category_or_default(&self) -> &str {
        self.category.as_deref().unwrap_or(DEFAULT_CATEGORY)
    }
}

/// Accepted JSON shapes for a batch of gaps: a bare array, or the
/// envelopes returned by the analysis endpoints.
#[derive(Deserialize)]
#[serde(untagged)]
enum GapPayload {
    List(Vec<ComplianceGap>),
    Gaps { gaps: Vec<ComplianceGap> },
    Recommendations { recommendations: Vec<ComplianceGap> },
}

/// Parse a batch of gaps from JSON.
pub fn parse_gaps(json: &str) -> Result<Vec<ComplianceGap>, FoundryError> {
    let payload: GapPayload = serde_json::from_str(json).map_err(|e| {
        FoundryError::Parse(format!(
            "expected an array of gaps or an object with 'gaps'/'recommendations': {e}"
        ))
    })?;
    Ok(match payload {
        GapPayload::List(gaps) => gaps,
        GapPayload::Gaps { gaps } => gaps,
        GapPayload::Recommendations { recommendations } => recommendations,
    })
}
