//! Risk summary and Markdown report rendering.

use serde::{Deserialize, Serialize};

use crate::severity::Severity;
use crate::transform::{IMPACT_BANDS, LIKELIHOOD_BANDS, RiskItem, RiskMatrix};

/// Aggregate counts over a set of risk items.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskSummary {
    pub total: usize,
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub unknown: usize,
    pub mean_score: f64,
    pub max_score: Option<i64>,
}

impl RiskSummary {
    pub fn from_items(items: &[RiskItem]) -> Self {
        let mut summary = RiskSummary {
            total: items.len(),
            ..Default::default()
        };
        for item in items {
            match item.severity {
                Severity::Critical => summary.critical += 1,
                Severity::High => summary.high += 1,
                Severity::Medium => summary.medium += 1,
                Severity::Low => summary.low += 1,
                Severity::Unknown(_) => summary.unknown += 1,
            }
        }
        if !items.is_empty() {
            let sum: i64 = items.iter().map(|i| i.risk_score).sum();
            summary.mean_score = sum as f64 / items.len() as f64;
        }
        summary.max_score = items.iter().map(|i| i.risk_score).max();
        summary
    }
}

/// Escape text for a Markdown table cell: pipes are escaped and line
/// breaks folded to spaces so the row stays intact.
fn escape_cell(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '|' => out.push_str("\\|"),
            '\r' => {}
            '\n' => out.push(' '),
            _ => out.push(ch),
        }
    }
    out
}

fn band_label(bounds: (f64, f64)) -> String {
    let upper = if bounds.1 > 1.0 { 1.0 } else { bounds.1 };
    format!("{:.2}-{:.2}", bounds.0, upper)
}

/// Render a Markdown report of ranked risk items and the risk matrix.
///
/// `items` is rendered in the order given, so sort before calling.
pub fn risk_report_markdown(items: &[RiskItem], matrix: &RiskMatrix, title: &str) -> String {
    let summary = RiskSummary::from_items(items);
    let mut md = String::new();

    md.push_str(&format!("# {title}\n\n"));

    md.push_str("## Summary\n\n");
    md.push_str("| Severity | Count |\n");
    md.push_str("|----------|-------|\n");
    for (label, count) in [
        ("Critical", summary.critical),
        ("High", summary.high),
        ("Medium", summary.medium),
        ("Low", summary.low),
        ("Unclassified", summary.unknown),
    ] {
        if count > 0 {
            md.push_str(&format!("| {label} | {count} |\n"));
        }
    }
    md.push_str(&format!("| **Total** | **{}** |\n\n", summary.total));

    if items.is_empty() {
        md.push_str("No compliance risks identified.\n");
        return md;
    }

    md.push_str(&format!(
        "Mean risk score: {:.1} | Highest: {}\n\n",
        summary.mean_score,
        summary.max_score.unwrap_or_default()
    ));

    md.push_str("## Risks\n\n");
    md.push_str("| Score | Severity | Title | Category | Regulation |\n");
    md.push_str("|-------|----------|-------|----------|------------|\n");
    for item in items {
        md.push_str(&format!(
            "| {} | {} | {} | {} | {} |\n",
            item.risk_score,
            escape_cell(item.severity.as_str()),
            escape_cell(&item.title),
            escape_cell(&item.category),
            escape_cell(item.regulation.as_deref().unwrap_or("-")),
        ));
    }
    md.push('\n');

    md.push_str("## Risk Matrix\n\n");
    md.push_str("Rows are likelihood (high to low), columns are impact (low to high).\n\n");
    md.push_str("| Likelihood |");
    for bounds in IMPACT_BANDS {
        md.push_str(&format!(" {} |", band_label(bounds)));
    }
    md.push_str("\n|------------|");
    for _ in IMPACT_BANDS {
        md.push_str("------|");
    }
    md.push('\n');
    for (likelihood_band, bounds) in LIKELIHOOD_BANDS.iter().enumerate() {
        md.push_str(&format!("| {} |", band_label(*bounds)));
        for impact_band in 0..IMPACT_BANDS.len() {
            let cell = &matrix.cells[impact_band][likelihood_band];
            md.push_str(&format!(" {} ({}) |", cell.items.len(), cell.tone));
        }
        md.push('\n');
    }
    md.push('\n');

    if !matrix.unplaced.is_empty() {
        md.push_str(&format!(
            "**Note:** {} item(s) fall outside the matrix bands.\n\n",
            matrix.unplaced.len()
        ));
    }

    let actions: Vec<&RiskItem> = items
        .iter()
        .filter(|i| i.suggested_action.is_some())
        .collect();
    if !actions.is_empty() {
        md.push_str("## Suggested Actions\n\n");
        for item in actions {
            if let Some(action) = &item.suggested_action {
                md.push_str(&format!(
                    "- **{}**: {}\n",
                    escape_cell(&item.title),
                    escape_cell(action)
                ));
            }
        }
    }

    md
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gap::ComplianceGap;
    use crate::transform::{bucket_matrix, score_gaps};
    use pretty_assertions::assert_eq;

    fn sample_items() -> Vec<RiskItem> {
        score_gaps(&[
            ComplianceGap::new("Unencrypted backups", Severity::Critical, 0.9)
                .with_regulation("HIPAA")
                .with_suggested_action("Encrypt backups"),
            ComplianceGap::new("Missing DPIA", Severity::High, 0.5),
            ComplianceGap::new("Odd label", Severity::parse("tbd"), 0.2),
        ])
    }

    #[test]
    fn test_summary_counts() {
        let summary = RiskSummary::from_items(&sample_items());
        assert_eq!(summary.total, 3);
        assert_eq!(summary.critical, 1);
        assert_eq!(summary.high, 1);
        assert_eq!(summary.unknown, 1);
        assert_eq!(summary.max_score, Some(86));
        // 86 + 38 + 10
        assert!((summary.mean_score - 134.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_summary_empty() {
        let summary = RiskSummary::from_items(&[]);
        assert_eq!(summary, RiskSummary::default());
    }

    #[test]
    fn test_markdown_report() {
        let items = sample_items();
        let matrix = bucket_matrix(&items);
        let md = risk_report_markdown(&items, &matrix, "Quarterly Risk");

        assert!(md.starts_with("# Quarterly Risk\n"));
        assert!(md.contains("| Critical | 1 |"));
        assert!(md.contains("| Unclassified | 1 |"));
        assert!(md.contains("| 86 | critical | Unencrypted backups | General | HIPAA |"));
        assert!(md.contains("## Risk Matrix"));
        assert!(md.contains("| 0.75-1.00 | 0 (medium) | 0 (high) | 0 (critical) | 1 (critical) |"));
        assert!(md.contains("- **Unencrypted backups**: Encrypt backups"));
    }

    #[test]
    fn test_markdown_escapes_table_cells() {
        let gap = ComplianceGap::new("A | B", Severity::Low, 0.4)
            .with_category("Ops\nInfra")
            .with_suggested_action("Split | merge");
        let items = score_gaps(&[gap]);
        let md = risk_report_markdown(&items, &bucket_matrix(&items), "Escapes");
        let row = md.lines().find(|line| line.starts_with("| 10 |")).unwrap();
        assert_eq!(row, r"| 10 | low | A \| B | Ops Infra | - |");
        assert_eq!(row.matches('|').count() - row.matches(r"\|").count(), 6);
        assert!(md.contains(r"- **A \| B**: Split \| merge"));
    }

    #[test]
    fn test_markdown_report_empty() {
        let md = risk_report_markdown(&[], &bucket_matrix(&[]), "Empty");
        assert!(md.contains("No compliance risks identified."));
        assert!(!md.contains("## Risk Matrix"));
    }
}
