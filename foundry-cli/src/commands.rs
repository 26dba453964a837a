//! CLI subcommand handlers.

use anyhow::Context;
use chrono::{DateTime, Utc};
use foundry_risk::{
    ActivityPoint, ComplianceRecord, DriftBaseline, FoundryConfig, MetricSample, Regulation,
    RegulationSignal, SortDirection, SortField, analyze_records, bucket_matrix,
    classify_regulations, forecast, parse_gaps, predict_changes, risk_report_markdown, score_gaps,
    sort_risks, validate_gaps,
};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::io::Read;
use std::path::Path;

use crate::Commands;
use crate::ConfigAction;
use crate::OutputFormat;

/// Handle a CLI subcommand.
pub fn handle_command(
    command: Commands,
    workspace: &Path,
    config_path: Option<&Path>,
) -> anyhow::Result<()> {
    let config = || load(workspace, config_path);
    let output = match command {
        Commands::Score {
            input,
            sort,
            direction,
            format,
        } => score_output(&read_input(&input)?, &config()?, sort, direction, format)?,
        Commands::Matrix { input } => matrix_output(&read_input(&input)?, &config()?)?,
        Commands::Analyze {
            input,
            as_of,
            format,
        } => {
            let now = match as_of {
                Some(raw) => DateTime::parse_from_rfc3339(&raw)
                    .with_context(|| format!("Invalid --as-of timestamp '{raw}'"))?
                    .with_timezone(&Utc),
                None => Utc::now(),
            };
            analyze_output(&read_input(&input)?, &config()?, now, format)?
        }
        Commands::Classify { input } => classify_output(&read_input(&input)?)?,
        Commands::Drift {
            input,
            baseline,
            threshold,
        } => {
            let baseline_json = baseline.as_deref().map(read_input).transpose()?;
            let threshold = match threshold {
                Some(t) => t,
                None => config()?.drift.threshold,
            };
            drift_output(&read_input(&input)?, baseline_json.as_deref(), threshold)?
        }
        Commands::Predict { input } => predict_output(&read_input(&input)?)?,
        Commands::Forecast {
            input,
            industry,
            periods,
        } => forecast_output(&read_input(&input)?, industry, periods, &config()?)?,
        Commands::Config { action } => return handle_config(action, workspace, config_path),
    };

    println!("{output}");
    Ok(())
}

fn load(workspace: &Path, config_path: Option<&Path>) -> anyhow::Result<FoundryConfig> {
    if let Some(path) = config_path
        && !path.exists()
    {
        anyhow::bail!("Configuration file not found: {}", path.display());
    }
    foundry_risk::load_config(Some(workspace), config_path)
        .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
}

fn handle_config(
    action: ConfigAction,
    workspace: &Path,
    config_path: Option<&Path>,
) -> anyhow::Result<()> {
    match action {
        ConfigAction::Init => {
            let config_path = foundry_risk::config::workspace_config_path(workspace);
            if let Some(dir) = config_path.parent() {
                std::fs::create_dir_all(dir)?;
            }

            if config_path.exists() {
                println!(
                    "Configuration file already exists at: {}",
                    config_path.display()
                );
                return Ok(());
            }

            let toml_str = toml::to_string_pretty(&FoundryConfig::default())?;
            std::fs::write(&config_path, &toml_str)?;
            println!(
                "Created default configuration at: {}",
                config_path.display()
            );
            Ok(())
        }
        ConfigAction::Show => {
            let config = load(workspace, config_path)?;
            let toml_str = toml::to_string_pretty(&config)?;
            println!("{}", toml_str);
            Ok(())
        }
    }
}

/// Read a file, or stdin when the path is `-`.
pub fn read_input(path: &Path) -> anyhow::Result<String> {
    if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("Failed to read stdin")?;
        return Ok(buf);
    }
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

/// A bare array or an object wrapping the array under a known key.
#[derive(Deserialize)]
#[serde(untagged)]
enum Batch<T> {
    List(Vec<T>),
    Wrapped(serde_json::Map<String, serde_json::Value>),
}

fn parse_batch<T: DeserializeOwned>(json: &str, key: &str) -> anyhow::Result<Vec<T>> {
    match serde_json::from_str::<Batch<T>>(json)
        .with_context(|| format!("Expected a JSON array or an object with '{key}'"))?
    {
        Batch::List(items) => Ok(items),
        Batch::Wrapped(mut map) => {
            let value = map
                .remove(key)
                .with_context(|| format!("Missing '{key}' in input object"))?;
            serde_json::from_value(value).with_context(|| format!("Invalid '{key}' entries"))
        }
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

pub fn score_output(
    json: &str,
    config: &FoundryConfig,
    sort: Option<SortField>,
    direction: Option<SortDirection>,
    format: OutputFormat,
) -> anyhow::Result<String> {
    let gaps = parse_gaps(json)?;
    if config.risk.strict_validation {
        validate_gaps(&gaps)?;
    }
    let items = score_gaps(&gaps);
    let sorted = sort_risks(
        &items,
        sort.unwrap_or(config.risk.default_sort),
        direction.unwrap_or(config.risk.default_direction),
    );

    match format {
        OutputFormat::Json => to_json(&sorted),
        OutputFormat::Markdown => Ok(risk_report_markdown(
            &sorted,
            &bucket_matrix(&items),
            &config.risk.report_title,
        )),
    }
}

pub fn matrix_output(json: &str, config: &FoundryConfig) -> anyhow::Result<String> {
    let gaps = parse_gaps(json)?;
    if config.risk.strict_validation {
        validate_gaps(&gaps)?;
    }
    to_json(&bucket_matrix(&score_gaps(&gaps)))
}

pub fn analyze_output(
    json: &str,
    config: &FoundryConfig,
    now: DateTime<Utc>,
    format: OutputFormat,
) -> anyhow::Result<String> {
    let records: Vec<ComplianceRecord> = parse_batch(json, "compliance_data")?;
    let gaps = analyze_records(&records, now, &config.analysis);
    let items = sort_risks(
        &score_gaps(&gaps),
        config.risk.default_sort,
        config.risk.default_direction,
    );
    tracing::info!(
        records = records.len(),
        gaps = gaps.len(),
        "Gap analysis complete"
    );

    match format {
        OutputFormat::Json => to_json(&items),
        OutputFormat::Markdown => Ok(risk_report_markdown(
            &items,
            &bucket_matrix(&items),
            &config.risk.report_title,
        )),
    }
}

pub fn classify_output(json: &str) -> anyhow::Result<String> {
    let regulations: Vec<Regulation> = parse_batch(json, "regulations")?;
    to_json(&classify_regulations(&regulations))
}

/// One sample or many.
#[derive(Deserialize)]
#[serde(untagged)]
enum Samples {
    Many(Vec<MetricSample>),
    One(MetricSample),
}

pub fn drift_output(
    json: &str,
    baseline_json: Option<&str>,
    threshold: f64,
) -> anyhow::Result<String> {
    let baseline = match baseline_json {
        Some(raw) => {
            let samples: Vec<MetricSample> =
                serde_json::from_str(raw).context("Baseline must be a JSON array of samples")?;
            DriftBaseline::fit(&samples)?
        }
        None => DriftBaseline::reference(),
    };

    let samples: Samples =
        serde_json::from_str(json).context("Expected a metric sample or an array of samples")?;
    match samples {
        Samples::One(sample) => to_json(&baseline.detect(&sample, threshold)),
        Samples::Many(samples) => {
            let reports: Vec<_> = samples
                .iter()
                .map(|s| baseline.detect(s, threshold))
                .collect();
            to_json(&reports)
        }
    }
}

/// Regulation signals, a wrapped list of them, or bare ids that take the
/// default signal.
#[derive(Deserialize)]
#[serde(untagged)]
enum PredictPayload {
    Signals(Vec<RegulationSignal>),
    Ids(Vec<String>),
    Wrapped {
        regulations: Vec<RegulationSignal>,
    },
    Request {
        regulation_ids: Vec<String>,
    },
}

pub fn predict_output(json: &str) -> anyhow::Result<String> {
    let payload: PredictPayload = serde_json::from_str(json).context(
        "Expected regulation signals, {\"regulations\": [...]}, or {\"regulation_ids\": [...]}",
    )?;
    let signals = match payload {
        PredictPayload::Signals(signals) | PredictPayload::Wrapped { regulations: signals } => {
            signals
        }
        PredictPayload::Ids(ids) | PredictPayload::Request { regulation_ids: ids } => {
            ids.into_iter().map(RegulationSignal::from_id).collect()
        }
    };
    to_json(&predict_changes(&signals))
}

/// A full forecast request or a bare history.
#[derive(Deserialize)]
#[serde(untagged)]
enum ForecastPayload {
    History(Vec<ActivityPoint>),
    Request {
        #[serde(default)]
        industry: Option<String>,
        history: Vec<ActivityPoint>,
        #[serde(default)]
        forecast_periods: Option<usize>,
    },
}

/// Flags win over the request body, which wins over config.
pub fn forecast_output(
    json: &str,
    industry: Option<String>,
    periods: Option<usize>,
    config: &FoundryConfig,
) -> anyhow::Result<String> {
    let payload: ForecastPayload = serde_json::from_str(json)
        .context("Expected a history array or an object with 'history'")?;
    let (body_industry, history, body_periods) = match payload {
        ForecastPayload::History(history) => (None, history, None),
        ForecastPayload::Request {
            industry,
            history,
            forecast_periods,
        } => (industry, history, forecast_periods),
    };

    let industry = industry
        .or(body_industry)
        .unwrap_or_else(|| "general".to_string());
    let periods = periods.or(body_periods).unwrap_or(config.forecast.periods);
    to_json(&forecast(&industry, &history, periods))
}
