//! Foundry Risk: compliance risk scoring and analysis for Agent Foundry.
//!
//! - **Risk transform:** score compliance gaps, sort them, and bucket them
//!   into a 4x4 impact-by-likelihood matrix
//! - **Gap analysis:** rule-based detection of gaps from compliance records
//! - **Taxonomy:** keyword classification of regulations
//! - **Drift:** z-score drift detection over operational metrics
//! - **Prediction:** heuristic regulatory change likelihood
//! - **Market signals:** trend plus moving-average activity forecasts
//! - **Reporting:** summaries and Markdown rendering

pub mod analysis;
pub mod config;
pub mod drift;
pub mod error;
pub mod gap;
pub mod market;
pub mod prediction;
pub mod report;
pub mod severity;
pub mod taxonomy;
pub mod transform;
pub mod validation;

// Re-exports for convenience
pub use analysis::{ComplianceRecord, analyze_record, analyze_records};
pub use config::{
    AnalysisConfig, DriftConfig, ForecastConfig, FoundryConfig, RiskConfig, load_config,
};
pub use drift::{DriftBaseline, DriftReport, MetricSample};
pub use error::{DriftError, FoundryError, ValidationError};
pub use gap::{ComplianceGap, parse_gaps};
pub use market::{ActivityPoint, MarketForecast, PeriodForecast, Trend, forecast};
pub use prediction::{
    ChangeImpact, ChangePrediction, PredictedChange, RegulationSignal, Timeframe, predict_change,
    predict_changes,
};
pub use report::{RiskSummary, risk_report_markdown};
pub use severity::Severity;
pub use taxonomy::{Regulation, TaxonomyCluster, TaxonomyResult, classify_regulations};
pub use transform::{
    CellTone, MatrixCell, RiskItem, RiskMatrix, SortDirection, SortField, bucket_matrix,
    score_gap, score_gaps, sort_risks,
};
pub use validation::{validate_gap, validate_gaps};
