//! Rule-based compliance gap analysis.
//!
//! Turns raw compliance records (rate, status, last check date per
//! category) into [`ComplianceGap`]s with deterministic rules. The current
//! time is passed in so results are reproducible.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::AnalysisConfig;
use crate::gap::ComplianceGap;
use crate::severity::Severity;

/// Confidence ceiling for stale-check gaps.
const MAX_STALE_CONFIDENCE: f64 = 0.99;

/// Staleness reaches full confidence at two years.
const STALE_CONFIDENCE_HORIZON_DAYS: f64 = 730.0;

/// A per-category compliance measurement from the records service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default = "default_rate")]
    pub compliance_rate: f64,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default = "default_record_category")]
    pub category: String,
    /// ISO-8601 date or datetime of the last compliance check.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_check_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regulation: Option<String>,
}

fn default_rate() -> f64 {
    1.0
}

fn default_status() -> String {
    "compliant".into()
}

fn default_record_category() -> String {
    "general".into()
}

impl Default for ComplianceRecord {
    fn default() -> Self {
        Self {
            id: None,
            compliance_rate: default_rate(),
            status: default_status(),
            category: default_record_category(),
            last_check_date: None,
            regulation: None,
        }
    }
}

/// Gap types emitted by the rules.
pub mod gap_types {
    pub const LOW_COMPLIANCE_RATE: &str = "low_compliance_rate";
    pub const MODERATE_COMPLIANCE_RATE: &str = "moderate_compliance_rate";
    pub const NON_COMPLIANT_STATUS: &str = "non_compliant_status";
    pub const STALE_COMPLIANCE_CHECK: &str = "stale_compliance_check";
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

fn percent(rate: f64) -> String {
    format!("{:.0}%", rate * 100.0)
}

/// Parse an ISO-8601 date or datetime. Values without an offset are UTC.
pub fn parse_check_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Build a gap carrying the record's identity fields.
fn record_gap(
    record: &ComplianceRecord,
    gap_type: &str,
    severity: Severity,
    confidence: f64,
    title: String,
    description: String,
    action: &str,
) -> ComplianceGap {
    let mut gap = ComplianceGap::new(title, severity, confidence)
        .with_description(description)
        .with_category(record.category.clone())
        .with_gap_type(gap_type)
        .with_suggested_action(action);
    if let Some(id) = &record.id {
        gap = gap.with_id(format!("{id}:{gap_type}"));
    }
    if let Some(regulation) = &record.regulation {
        gap = gap.with_regulation(regulation.clone());
    }
    gap
}

/// Apply the gap rules to one record.
pub fn analyze_record(
    record: &ComplianceRecord,
    now: DateTime<Utc>,
    thresholds: &AnalysisConfig,
) -> Vec<ComplianceGap> {
    let mut gaps = Vec::new();
    let rate = record.compliance_rate;
    let category = &record.category;

    if rate < thresholds.low_rate {
        let severity = if rate < thresholds.critical_rate {
            Severity::Critical
        } else {
            Severity::High
        };
        gaps.push(record_gap(
            record,
            gap_types::LOW_COMPLIANCE_RATE,
            severity,
            round4(1.0 - rate),
            format!("Low compliance rate ({})", percent(rate)),
            format!(
                "Compliance rate of {} in '{category}' is below acceptable threshold.",
                percent(rate)
            ),
            "Prioritize remediation of failing controls and assign an owner for each.",
        ));
    } else if rate < thresholds.moderate_rate {
        gaps.push(record_gap(
            record,
            gap_types::MODERATE_COMPLIANCE_RATE,
            Severity::Medium,
            round4(1.0 - rate),
            format!("Moderate compliance rate ({})", percent(rate)),
            format!(
                "Compliance rate of {} in '{category}' may need attention.",
                percent(rate)
            ),
            "Review partially met controls and schedule follow-up checks.",
        ));
    }

    if record.status == "non_compliant" {
        gaps.push(record_gap(
            record,
            gap_types::NON_COMPLIANT_STATUS,
            Severity::High,
            thresholds.non_compliant_confidence,
            format!("Non-compliant status in {category}"),
            format!("Record is marked as non-compliant in '{category}'."),
            "Open a remediation plan and document compensating controls.",
        ));
    }

    if let Some(raw) = &record.last_check_date {
        match parse_check_date(raw) {
            Some(checked) => {
                let days = (now - checked).num_days();
                if days > thresholds.stale_after_days {
                    let severity = if days > thresholds.very_stale_after_days {
                        Severity::High
                    } else {
                        Severity::Medium
                    };
                    gaps.push(record_gap(
                        record,
                        gap_types::STALE_COMPLIANCE_CHECK,
                        severity,
                        MAX_STALE_CONFIDENCE.min(days as f64 / STALE_CONFIDENCE_HORIZON_DAYS),
                        format!("Stale compliance check ({days} days)"),
                        format!("Last compliance check was {days} days ago."),
                        "Schedule a fresh compliance check for this category.",
                    ));
                }
            }
            None => {
                tracing::debug!(
                    date = %raw,
                    category = %category,
                    "Skipping unparseable last_check_date"
                );
            }
        }
    }

    gaps
}

/// Apply the gap rules to every record, preserving record order.
pub fn analyze_records(
    records: &[ComplianceRecord],
    now: DateTime<Utc>,
    thresholds: &AnalysisConfig,
) -> Vec<ComplianceGap> {
    let gaps: Vec<ComplianceGap> = records
        .iter()
        .flat_map(|record| analyze_record(record, now, thresholds))
        .collect();
    tracing::debug!(
        records = records.len(),
        gaps = gaps.len(),
        "Analyzed compliance records"
    );
    gaps
}
