//! Keyword taxonomy classifier for regulations.
//!
//! Groups regulations into thematic clusters using a fixed keyword
//! taxonomy. Matching works on whole words and phrases, so `sec` does not
//! fire on `security`; a trailing plural `s` in the text is tolerated.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Label for regulations no taxonomy entry matches.
pub const GENERAL_LABEL: &str = "general";

/// `method` reported by keyword classification.
pub const CLASSIFICATION_METHOD: &str = "keyword_fallback";

/// Taxonomy entries in match priority order.
pub const TAXONOMY: &[(&str, &[&str])] = &[
    (
        "data_privacy",
        &[
            "privacy",
            "data protection",
            "gdpr",
            "ccpa",
            "personal data",
            "consent",
            "data breach",
            "pii",
            "right to erasure",
            "cookie",
        ],
    ),
    (
        "financial",
        &[
            "financial",
            "banking",
            "payment",
            "aml",
            "anti-money",
            "sox",
            "sarbanes",
            "dodd-frank",
            "sec",
            "finra",
            "kyc",
        ],
    ),
    (
        "healthcare",
        &[
            "health",
            "hipaa",
            "medical",
            "patient",
            "clinical",
            "pharmaceutical",
            "fda",
            "drug",
            "diagnosis",
            "treatment",
        ],
    ),
    (
        "environmental",
        &[
            "environment",
            "environmental",
            "emission",
            "carbon",
            "pollution",
            "waste",
            "epa",
            "climate",
            "sustainability",
            "renewable",
            "hazardous",
        ],
    ),
    (
        "cybersecurity",
        &[
            "cyber",
            "cybersecurity",
            "security",
            "encryption",
            "vulnerability",
            "firewall",
            "incident response",
            "penetration",
            "malware",
            "nist",
            "iso 27001",
        ],
    ),
];

/// A regulation to classify.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Regulation {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Existing label; used directly when it names a taxonomy entry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

/// Member reference inside a cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegulationRef {
    pub id: String,
    pub title: String,
}

/// A group of regulations sharing a taxonomy label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxonomyCluster {
    pub id: usize,
    pub label: String,
    pub regulations: Vec<RegulationRef>,
    pub similarity_score: f64,
}

/// Classification output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxonomyResult {
    pub clusters: Vec<TaxonomyCluster>,
    pub total_clusters: usize,
    pub method: String,
}

fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn token_matches(text_token: &str, keyword_token: &str) -> bool {
    text_token == keyword_token || text_token.strip_suffix('s') == Some(keyword_token)
}

/// Whether `keyword` occurs in `tokens` as a contiguous word sequence.
fn contains_keyword(tokens: &[String], keyword: &str) -> bool {
    let needle = tokenize(keyword);
    if needle.is_empty() || needle.len() > tokens.len() {
        return false;
    }
    tokens.windows(needle.len()).any(|window| {
        window
            .iter()
            .zip(&needle)
            .all(|(text, kw)| token_matches(text, kw))
    })
}

/// Taxonomy label for a single regulation.
pub fn classify_regulation(regulation: &Regulation) -> &'static str {
    if let Some(category) = regulation.category.as_deref()
        && let Some((label, _)) = TAXONOMY.iter().find(|(label, _)| *label == category)
    {
        return *label;
    }

    let tokens = tokenize(&format!("{} {}", regulation.title, regulation.description));
    TAXONOMY
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|kw| contains_keyword(&tokens, kw)))
        .map(|(label, _)| *label)
        .unwrap_or(GENERAL_LABEL)
}

/// Classify regulations into clusters, sorted by label.
pub fn classify_regulations(regulations: &[Regulation]) -> TaxonomyResult {
    let mut grouped: BTreeMap<&'static str, Vec<RegulationRef>> = BTreeMap::new();
    for regulation in regulations {
        grouped
            .entry(classify_regulation(regulation))
            .or_default()
            .push(RegulationRef {
                id: regulation.id.clone(),
                title: regulation.title.clone(),
            });
    }

    let clusters: Vec<TaxonomyCluster> = grouped
        .into_iter()
        .enumerate()
        .map(|(id, (label, members))| TaxonomyCluster {
            id,
            label: label.to_string(),
            regulations: members,
            similarity_score: 1.0,
        })
        .collect();

    tracing::debug!(
        regulations = regulations.len(),
        clusters = clusters.len(),
        "Classified regulations"
    );

    TaxonomyResult {
        total_clusters: clusters.len(),
        clusters,
        method: CLASSIFICATION_METHOD.into(),
    }
}
