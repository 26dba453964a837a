//! Risk transform: scores compliance gaps, orders them, and buckets them
//! into a 4x4 impact-by-likelihood matrix.
//!
//! Every function here is pure: inputs are borrowed, results are new values,
//! and identical inputs always produce identical outputs.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::str::FromStr;
use unicode_normalization::UnicodeNormalization;

use crate::error::FoundryError;
use crate::gap::ComplianceGap;
use crate::severity::Severity;

/// A scored, categorized compliance gap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskItem {
    /// Gap id, or a `gap-{index}` placeholder when the gap had none.
    pub id: String,
    pub title: String,
    pub description: String,
    pub severity: Severity,
    /// The gap's confidence, unchanged.
    pub likelihood: f64,
    /// Impact weight derived from severity.
    pub impact: f64,
    /// `round(likelihood * impact * 100)`; in `[0, 100]` for in-range likelihood.
    pub risk_score: i64,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regulation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gap_type: Option<String>,
}

/// Combine likelihood and impact into an integer risk score.
pub fn risk_score(likelihood: f64, impact: f64) -> i64 {
    (likelihood * impact * 100.0).round() as i64
}

/// Score a single gap. `index` is its position in the batch and is only
/// used to synthesize an id.
pub fn score_gap(gap: &ComplianceGap, index: usize) -> RiskItem {
    let impact = gap.severity.impact();
    let likelihood = gap.confidence;

    RiskItem {
        id: gap.id.clone().unwrap_or_else(|| format!("gap-{index}")),
        title: gap.title.clone(),
        description: gap.description.clone(),
        severity: gap.severity.clone(),
        likelihood,
        impact,
        risk_score: risk_score(likelihood, impact),
        category: gap.category_or_default().to_string(),
        regulation: gap.regulation.clone(),
        suggested_action: gap.suggested_action.clone(),
        gap_type: gap.gap_type.clone(),
    }
}

/// Placeholder id for the gap at `index`: `gap-{index}`, or
/// `gap-{index}-{n}` when that is already taken in the batch.
fn placeholder_id(index: usize, taken: &mut HashSet<String>) -> String {
    let base = format!("gap-{index}");
    let mut candidate = base.clone();
    let mut suffix = 1;
    while taken.contains(&candidate) {
        candidate = format!("{base}-{suffix}");
        suffix += 1;
    }
    taken.insert(candidate.clone());
    candidate
}

/// Score a batch of gaps. Gaps without an id get a placeholder derived
/// from their batch position that does not clash with any other id in
/// the batch.
pub fn score_gaps(gaps: &[ComplianceGap]) -> Vec<RiskItem> {
    let mut taken: HashSet<String> = gaps.iter().filter_map(|g| g.id.clone()).collect();
    let items: Vec<RiskItem> = gaps
        .iter()
        .enumerate()
        .map(|(index, gap)| {
            let mut item = score_gap(gap, index);
            if gap.id.is_none() {
                item.id = placeholder_id(index, &mut taken);
            }
            item
        })
        .collect();

    let unknown = items.iter().filter(|i| !i.severity.is_known()).count();
    tracing::debug!(
        gaps = gaps.len(),
        unknown_severity = unknown,
        "Scored compliance gaps"
    );
    items
}

/// Key used to order risk items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    #[default]
    #[serde(alias = "risk_score")]
    RiskScore,
    Severity,
    Title,
}

impl FromStr for SortField {
    type Err = FoundryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "riskScore" | "risk_score" | "score" => Ok(SortField::RiskScore),
            "severity" => Ok(SortField::Severity),
            "title" => Ok(SortField::Title),
            other => Err(FoundryError::Parse(format!(
                "unknown sort field '{other}' (expected riskScore, severity, or title)"
            ))),
        }
    }
}

impl std::fmt::Display for SortField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SortField::RiskScore => write!(f, "riskScore"),
            SortField::Severity => write!(f, "severity"),
            SortField::Title => write!(f, "title"),
        }
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl FromStr for SortDirection {
    type Err = FoundryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            other => Err(FoundryError::Parse(format!(
                "unknown sort direction '{other}' (expected asc or desc)"
            ))),
        }
    }
}

impl std::fmt::Display for SortDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SortDirection::Asc => write!(f, "asc"),
            SortDirection::Desc => write!(f, "desc"),
        }
    }
}

/// Primary collation key: NFKD decomposition with combining marks
/// stripped, lowercased. `Émile` and `emile` share a key.
fn collation_key(text: &str) -> String {
    text.nfkd()
        .filter(|c| !unicode_normalization::char::is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Title collation. Base letters decide first, ignoring case and accents;
/// then accents (`e` before `é`); then case, with the raw text as the
/// final tiebreak.
pub fn compare_titles(a: &str, b: &str) -> Ordering {
    collation_key(a)
        .cmp(&collation_key(b))
        .then_with(|| a.to_lowercase().cmp(&b.to_lowercase()))
        .then_with(|| a.cmp(b))
}

/// Ascending comparison of two items on `field`.
pub fn compare_items(a: &RiskItem, b: &RiskItem, field: SortField) -> Ordering {
    match field {
        SortField::RiskScore => a.risk_score.cmp(&b.risk_score),
        SortField::Severity => a.severity.rank().cmp(&b.severity.rank()),
        SortField::Title => compare_titles(&a.title, &b.title),
    }
}

/// Return a sorted copy of `items`.
///
/// The sort is stable in both directions: items with equal keys keep their
/// input order whether sorting ascending or descending.
pub fn sort_risks(items: &[RiskItem], field: SortField, direction: SortDirection) -> Vec<RiskItem> {
    let mut sorted = items.to_vec();
    sorted.sort_by(|a, b| {
        let ord = compare_items(a, b, field);
        match direction {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    });
    sorted
}

/// Half-open impact bands, lowest first. The top band reaches 1.01 so that
/// an impact of exactly 1.0 is included.
pub const IMPACT_BANDS: [(f64, f64); 4] = [(0.0, 0.25), (0.25, 0.5), (0.5, 0.75), (0.75, 1.01)];

/// Half-open likelihood bands in display order, highest first.
pub const LIKELIHOOD_BANDS: [(f64, f64); 4] =
    [(0.75, 1.01), (0.5, 0.75), (0.25, 0.5), (0.0, 0.25)];

fn band_index(bands: &[(f64, f64); 4], value: f64) -> Option<usize> {
    bands
        .iter()
        .position(|&(low, high)| value >= low && value < high)
}

/// Impact band index for `impact`, if it falls in any band.
pub fn impact_band(impact: f64) -> Option<usize> {
    band_index(&IMPACT_BANDS, impact)
}

/// Likelihood band index (0 = highest likelihood) for `likelihood`.
pub fn likelihood_band(likelihood: f64) -> Option<usize> {
    band_index(&LIKELIHOOD_BANDS, likelihood)
}

/// Presentation tone of a matrix cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellTone {
    Low,
    Medium,
    High,
    Critical,
}

impl CellTone {
    /// Tone from band indices: `(impact_band + 1) * (4 - likelihood_band)`
    /// scored >=12 critical, >=8 high, >=4 medium, else low.
    pub fn for_cell(impact_band: usize, likelihood_band: usize) -> Self {
        let score = (impact_band + 1) * 4usize.saturating_sub(likelihood_band);
        match score {
            s if s >= 12 => CellTone::Critical,
            s if s >= 8 => CellTone::High,
            s if s >= 4 => CellTone::Medium,
            _ => CellTone::Low,
        }
    }
}

impl std::fmt::Display for CellTone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellTone::Low => write!(f, "low"),
            CellTone::Medium => write!(f, "medium"),
            CellTone::High => write!(f, "high"),
            CellTone::Critical => write!(f, "critical"),
        }
    }
}

/// One cell of the risk matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatrixCell {
    pub impact_band: usize,
    pub likelihood_band: usize,
    pub tone: CellTone,
    pub items: Vec<RiskItem>,
}

/// 4x4 grid of risk items, indexed `[impact_band][likelihood_band]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskMatrix {
    pub cells: [[MatrixCell; 4]; 4],
    /// Items whose impact or likelihood falls outside every band.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unplaced: Vec<RiskItem>,
}

impl RiskMatrix {
    fn empty() -> Self {
        Self {
            cells: std::array::from_fn(|impact_band| {
                std::array::from_fn(|likelihood_band| MatrixCell {
                    impact_band,
                    likelihood_band,
                    tone: CellTone::for_cell(impact_band, likelihood_band),
                    items: Vec::new(),
                })
            }),
            unplaced: Vec::new(),
        }
    }

    pub fn cell(&self, impact_band: usize, likelihood_band: usize) -> Option<&MatrixCell> {
        self.cells.get(impact_band)?.get(likelihood_band)
    }

    /// All 16 cells, impact band major.
    pub fn iter_cells(&self) -> impl Iterator<Item = &MatrixCell> {
        self.cells.iter().flat_map(|row| row.iter())
    }

    /// Number of items placed in a cell.
    pub fn placed_count(&self) -> usize {
        self.iter_cells().map(|c| c.items.len()).sum()
    }
}

/// Bucket items into the impact-by-likelihood matrix. Items keep their
/// input order inside each cell.
pub fn bucket_matrix(items: &[RiskItem]) -> RiskMatrix {
    let mut matrix = RiskMatrix::empty();

    for item in items {
        match (impact_band(item.impact), likelihood_band(item.likelihood)) {
            (Some(i), Some(l)) => matrix.cells[i][l].items.push(item.clone()),
            _ => matrix.unplaced.push(item.clone()),
        }
    }

    if !matrix.unplaced.is_empty() {
        tracing::warn!(
            unplaced = matrix.unplaced.len(),
            "Risk items outside matrix bands were left unplaced"
        );
    }
    matrix
}
