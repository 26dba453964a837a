//! Opt-in strict validation of compliance gaps.
//!
//! Scoring itself is permissive: unknown severities get the default impact
//! and confidence is never clamped. Callers that would rather reject such
//! input run these checks first.

use crate::error::ValidationError;
use crate::gap::ComplianceGap;

fn gap_label(gap: &ComplianceGap, index: usize) -> String {
    gap.id.clone().unwrap_or_else(|| format!("gap-{index}"))
}

/// Check one gap. `index` names the gap in errors when it has no id.
pub fn validate_gap(gap: &ComplianceGap, index: usize) -> Result<(), ValidationError> {
    if !(0.0..=1.0).contains(&gap.confidence) {
        return Err(ValidationError::ConfidenceOutOfRange {
            id: gap_label(gap, index),
            value: gap.confidence,
        });
    }
    if !gap.severity.is_known() {
        return Err(ValidationError::UnknownSeverity {
            id: gap_label(gap, index),
            value: gap.severity.to_string(),
        });
    }
    Ok(())
}

/// Check a batch, stopping at the first invalid gap.
pub fn validate_gaps(gaps: &[ComplianceGap]) -> Result<(), ValidationError> {
    gaps.iter()
        .enumerate()
        .try_for_each(|(index, gap)| validate_gap(gap, index))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::severity::Severity;

    #[test]
    fn test_valid_gap_passes() {
        let gap = ComplianceGap::new("ok", Severity::High, 1.0);
        assert!(validate_gap(&gap, 0).is_ok());
        let gap = ComplianceGap::new("ok", Severity::Low, 0.0);
        assert!(validate_gap(&gap, 0).is_ok());
    }

    #[test]
    fn test_confidence_out_of_range() {
        let gap = ComplianceGap::new("bad", Severity::High, 1.2).with_id("g9");
        assert_eq!(
            validate_gap(&gap, 0),
            Err(ValidationError::ConfidenceOutOfRange {
                id: "g9".into(),
                value: 1.2
            })
        );
    }

    #[test]
    fn test_nan_confidence_rejected() {
        let gap = ComplianceGap::new("nan", Severity::High, f64::NAN);
        assert!(matches!(
            validate_gap(&gap, 4),
            Err(ValidationError::ConfidenceOutOfRange { ref id, .. }) if id == "gap-4"
        ));
    }

    #[test]
    fn test_unknown_severity_rejected() {
        let gap = ComplianceGap::new("odd", Severity::parse("blocker"), 0.5);
        let err = validate_gap(&gap, 2).unwrap_err();
        assert_eq!(
            err,
            ValidationError::UnknownSeverity {
                id: "gap-2".into(),
                value: "blocker".into()
            }
        );
        assert_eq!(err.to_string(), "gap 'gap-2' has unknown severity 'blocker'");
    }

    #[test]
    fn test_validate_gaps_reports_first_failure() {
        let gaps = vec![
            ComplianceGap::new("ok", Severity::Low, 0.2),
            ComplianceGap::new("bad", Severity::Low, -0.1),
            ComplianceGap::new("worse", Severity::parse("?"), 3.0),
        ];
        let err = validate_gaps(&gaps).unwrap_err();
        assert!(matches!(err, ValidationError::ConfidenceOutOfRange { ref id, .. } if id == "gap-1"));
    }
}
