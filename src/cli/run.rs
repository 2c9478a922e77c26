use crate::config::parse::{load_config, load_config_from_env, ConfigError};
use crate::config::Config;
use crate::model::{parse_raw_batch, transform_batch};
use crate::pipeline::chunk::plan_chunks;
use crate::pipeline::{DeliveryPipeline, PipelineError, RunReport};
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to read input '{path}': {source}")]
    Input {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("{failed} of {total} chunks failed to deliver")]
    PartialDelivery { failed: usize, total: usize },
}

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// File holding the JSON log batch; stdin when `None` or `-`
    pub input: Option<PathBuf>,
    pub dry_run: bool,
}

pub async fn run(
    config_path: Option<PathBuf>,
    options: RunOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = resolve_config(config_path.as_deref())?;
    run_with_config(&config, &options).await.map_err(|e| e.into())
}

fn resolve_config(config_path: Option<&Path>) -> Result<Config, RunError> {
    match config_path {
        Some(path) => {
            info!(config_path = %path.display(), "Loading configuration");
            Ok(load_config(path)?)
        }
        None => {
            info!("No config file found, reading configuration from environment");
            Ok(load_config_from_env()?)
        }
    }
}

pub async fn run_with_config(config: &Config, options: &RunOptions) -> Result<(), RunError> {
    let input = read_input(options.input.as_deref())?;
    info!(bytes = input.len(), "Read log batch");

    if options.dry_run {
        return print_plan(config, &input);
    }

    // A malformed key fails here, before any request
    let pipeline = DeliveryPipeline::from_config(config)?;
    let report = pipeline.run_raw(&input).await?;
    summarize(&report)
}

fn summarize(report: &RunReport) -> Result<(), RunError> {
    let failed = report.failed_chunks().count();
    info!(
        records = report.total_records,
        delivered_records = report.delivered_records(),
        chunks = report.outcomes.len(),
        failed,
        "Run complete"
    );

    if failed > 0 {
        return Err(RunError::PartialDelivery {
            failed,
            total: report.outcomes.len(),
        });
    }
    Ok(())
}

fn print_plan(config: &Config, input: &[u8]) -> Result<(), RunError> {
    let raw = parse_raw_batch(input).map_err(PipelineError::Parse)?;
    let records = transform_batch(raw, config.workspace.resource_id.as_deref());
    let plan = plan_chunks(&records, config.delivery.max_chunk_bytes())
        .map_err(PipelineError::Serialize)?;

    println!(
        "{} records, {} bytes, {} chunk(s) of up to {} records (limit {} bytes)",
        records.len(),
        plan.total_bytes,
        plan.chunk_count,
        plan.records_per_chunk,
        plan.max_chunk_bytes
    );
    for chunk in plan.chunks() {
        let range = chunk.range();
        println!("  chunk {}: records {}..{}", chunk.index, range.start, range.end);
    }
    Ok(())
}

fn read_input(path: Option<&Path>) -> Result<Vec<u8>, RunError> {
    match path {
        Some(path) if path != Path::new("-") => {
            std::fs::read(path).map_err(|source| RunError::Input {
                path: path.display().to_string(),
                source,
            })
        }
        _ => {
            let mut buf = Vec::new();
            std::io::stdin()
                .read_to_end(&mut buf)
                .map_err(|source| RunError::Input {
                    path: "-".to_string(),
                    source,
                })?;
            Ok(buf)
        }
    }
}
