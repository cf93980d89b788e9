use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use harkonnen_core::{MarketDataClient, PostRecord};
use harkonnen_influence::{EngineConfig, InfluenceEngine};
use serde_json::Value;

use crate::cli::ScoreArgs;
use crate::error::CliError;

pub async fn run(
    args: &ScoreArgs,
    client: Arc<dyn MarketDataClient>,
) -> Result<Value, CliError> {
    let records = read_records(&args.input)?;
    let as_of = super::parse_as_of(args.as_of.as_deref())?;
    let config = apply_overrides(args, EngineConfig::from_env()?);

    tracing::debug!(
        input = %args.input.display(),
        max_concurrency = config.max_concurrency,
        denominator = %config.denominator,
        "engine configured"
    );

    let engine = InfluenceEngine::new(client, config);
    let report = engine.score_records(records, as_of).await;

    Ok(serde_json::to_value(report)?)
}

fn read_records(path: &Path) -> Result<Vec<PostRecord>, CliError> {
    let json = std::fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.display().to_string(),
        source,
    })?;
    Ok(serde_json::from_str(&json)?)
}

/// Command-line flags take precedence over `HARKONNEN_*` variables.
fn apply_overrides(args: &ScoreArgs, mut config: EngineConfig) -> EngineConfig {
    if let Some(max_concurrency) = args.max_concurrency {
        config = config.with_max_concurrency(max_concurrency);
    }
    if let Some(ms) = args.fetch_timeout_ms {
        config = config.with_fetch_timeout(Duration::from_millis(ms));
    }
    if let Some(ms) = args.batch_timeout_ms {
        config = config.with_batch_timeout(Some(Duration::from_millis(ms)));
    }
    if let Some(denominator) = args.denominator {
        config = config.with_denominator(denominator);
    }
    config
}
