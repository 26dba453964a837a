//! Configuration for the risk engine.
//!
//! Uses `figment` for layered configuration: defaults -> user config file ->
//! workspace config file -> explicit file -> environment.

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::transform::{SortDirection, SortField};

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FoundryConfig {
    /// Risk scoring and presentation.
    pub risk: RiskConfig,
    /// Rule-based gap analysis thresholds.
    pub analysis: AnalysisConfig,
    /// Drift detection.
    pub drift: DriftConfig,
    /// Market signal forecasting.
    pub forecast: ForecastConfig,
}

/// Risk scoring and presentation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    /// Reject gaps with unknown severity or out-of-range confidence
    /// instead of scoring them permissively.
    pub strict_validation: bool,
    pub default_sort: SortField,
    pub default_direction: SortDirection,
    /// Heading used for Markdown reports.
    pub report_title: String,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            strict_validation: false,
            default_sort: SortField::RiskScore,
            default_direction: SortDirection::Desc,
            report_title: "Compliance Risk Report".into(),
        }
    }
}

/// Thresholds for the rule-based gap analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Rates below this are a high (or critical) gap.
    pub low_rate: f64,
    /// Rates below this are critical rather than high.
    pub critical_rate: f64,
    /// Rates below this (and not below `low_rate`) are a medium gap.
    pub moderate_rate: f64,
    /// Confidence assigned to records marked non-compliant.
    pub non_compliant_confidence: f64,
    /// Checks older than this many days are stale.
    pub stale_after_days: i64,
    /// Stale checks older than this many days are high severity.
    pub very_stale_after_days: i64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            low_rate: 0.5,
            critical_rate: 0.3,
            moderate_rate: 0.7,
            non_compliant_confidence: 0.95,
            stale_after_days: 180,
            very_stale_after_days: 365,
        }
    }
}

/// Drift detection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriftConfig {
    /// Z-score above which a metric counts as drifting.
    pub threshold: f64,
}

impl Default for DriftConfig {
    fn default() -> Self {
        Self { threshold: 2.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    /// Future periods to forecast when the request does not say.
    pub periods: usize,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self { periods: 4 }
    }
}

/// User-level config file path, if a home directory can be resolved.
pub fn user_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("dev", "agentfoundry", "foundry")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Workspace-level config file path.
pub fn workspace_config_path(workspace: &Path) -> PathBuf {
    workspace.join(".foundry").join("config.toml")
}

/// Load configuration with layered sources.
///
/// Later layers win: defaults, `~/.config/foundry/config.toml`,
/// `<workspace>/.foundry/config.toml`, `explicit`, then `FOUNDRY_*`
/// environment variables (`FOUNDRY_RISK__STRICT_VALIDATION=true`).
pub fn load_config(
    workspace: Option<&Path>,
    explicit: Option<&Path>,
) -> Result<FoundryConfig, Box<figment::Error>> {
    let mut figment = Figment::from(Serialized::defaults(FoundryConfig::default()));

    if let Some(user_config) = user_config_path()
        && user_config.exists()
    {
        figment = figment.merge(Toml::file(&user_config));
    }

    if let Some(ws) = workspace {
        let ws_config = workspace_config_path(ws);
        if ws_config.exists() {
            figment = figment.merge(Toml::file(&ws_config));
        }
    }

    if let Some(path) = explicit {
        figment = figment.merge(Toml::file(path));
    }

    figment = figment.merge(Env::prefixed("FOUNDRY_").split("__"));

    figment.extract().map_err(Box::new)
}
