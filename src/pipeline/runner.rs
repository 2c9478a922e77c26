use crate::config::types::Config;
use crate::ingest::client::{ClientError, DeliveryError, IngestionClient, LogSink};
use crate::model::{parse_raw_batch, transform_batch, RawLogRecord};
use crate::pipeline::chunk::plan_chunks;
use std::ops::Range;
use thiserror::Error;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Errors that end a run before or instead of delivery
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ClientError),

    #[error("failed to parse log batch: {0}")]
    Parse(#[source] serde_json::Error),

    #[error("failed to serialize logs: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// Where a run currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Start,
    Transformed,
    Planned,
    Delivering { chunk: usize, of: usize },
    Done,
}

/// Result of delivering one chunk
#[derive(Debug)]
pub struct ChunkOutcome {
    pub index: usize,
    pub range: Range<usize>,
    pub bytes: usize,
    pub result: Result<(), DeliveryError>,
}

impl ChunkOutcome {
    pub fn is_delivered(&self) -> bool {
        self.result.is_ok()
    }
}

/// Summary of one pipeline run
#[derive(Debug, Default)]
pub struct RunReport {
    pub total_records: usize,
    pub total_bytes: usize,
    pub chunk_count: usize,
    pub records_per_chunk: usize,
    pub outcomes: Vec<ChunkOutcome>,
}

impl RunReport {
    pub fn delivered_records(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.is_delivered())
            .map(|o| o.range.len())
            .sum()
    }

    pub fn failed_chunks(&self) -> impl Iterator<Item = &ChunkOutcome> {
        self.outcomes.iter().filter(|o| !o.is_delivered())
    }

    pub fn is_complete(&self) -> bool {
        self.outcomes.iter().all(ChunkOutcome::is_delivered)
    }
}

/// Transforms a raw batch, splits it by size and delivers it chunk by chunk.
///
/// Chunks are sent one at a time in order. A failed chunk is logged and
/// recorded in the report, and delivery moves on to the next one; nothing is
/// retried within a run.
#[derive(Debug)]
pub struct DeliveryPipeline<S> {
    sink: S,
    max_chunk_bytes: usize,
    resource_id: Option<String>,
}

impl DeliveryPipeline<IngestionClient> {
    pub fn from_config(config: &Config) -> Result<Self, PipelineError> {
        let client = IngestionClient::new(&config.workspace, &config.delivery)?;
        Ok(Self::new(
            client,
            config.delivery.max_chunk_bytes(),
            config.workspace.resource_id.clone(),
        ))
    }
}

impl<S: LogSink> DeliveryPipeline<S> {
    pub fn new(sink: S, max_chunk_bytes: usize, resource_id: Option<String>) -> Self {
        Self {
            sink,
            max_chunk_bytes,
            resource_id,
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn max_chunk_bytes(&self) -> usize {
        self.max_chunk_bytes
    }

    /// Decode an uploaded JSON batch and deliver it
    pub async fn run_raw(&self, input: &[u8]) -> Result<RunReport, PipelineError> {
        let records = parse_raw_batch(input).map_err(PipelineError::Parse)?;
        self.run(records).await
    }

    pub async fn run(&self, records: Vec<RawLogRecord>) -> Result<RunReport, PipelineError> {
        let run_id = Uuid::new_v4();
        let span = info_span!("delivery", %run_id);
        self.run_inner(records).instrument(span).await
    }

    async fn run_inner(&self, records: Vec<RawLogRecord>) -> Result<RunReport, PipelineError> {
        trace_phase(RunPhase::Start);
        let records = transform_batch(records, self.resource_id.as_deref());
        trace_phase(RunPhase::Transformed);

        if records.is_empty() {
            info!("Empty log batch, nothing to deliver");
            trace_phase(RunPhase::Done);
            return Ok(RunReport::default());
        }

        let plan = plan_chunks(&records, self.max_chunk_bytes).map_err(PipelineError::Serialize)?;
        trace_phase(RunPhase::Planned);
        info!(
            records = records.len(),
            total_bytes = plan.total_bytes,
            chunks = plan.chunk_count,
            records_per_chunk = plan.records_per_chunk,
            "Planned log delivery"
        );

        let mut report = RunReport {
            total_records: records.len(),
            total_bytes: plan.total_bytes,
            chunk_count: plan.chunk_count,
            records_per_chunk: plan.records_per_chunk,
            outcomes: Vec::with_capacity(plan.chunk_count),
        };

        let chunk_total = plan.chunks().count();
        for chunk in plan.chunks() {
            trace_phase(RunPhase::Delivering {
                chunk: chunk.index + 1,
                of: chunk_total,
            });

            let range = chunk.range();
            let body = serde_json::to_vec(chunk.records).map_err(PipelineError::Serialize)?;
            let bytes = body.len();

            if bytes > self.max_chunk_bytes {
                warn!(
                    chunk = chunk.index,
                    bytes,
                    max_chunk_bytes = self.max_chunk_bytes,
                    "Chunk exceeds the configured size limit"
                );
            }

            info!(
                chunk = chunk.index,
                start = range.start,
                end = range.end,
                total = records.len(),
                bytes,
                "Writing logs to workspace"
            );

            let result = self.sink.post(body).await;
            match &result {
                Ok(()) => info!(chunk = chunk.index, records = range.len(), "Chunk delivered"),
                Err(DeliveryError::Rejected { status, body }) => error!(
                    chunk = chunk.index,
                    start = range.start,
                    end = range.end,
                    status,
                    response = %body,
                    "Chunk rejected by ingestion endpoint"
                ),
                Err(e) => error!(
                    chunk = chunk.index,
                    start = range.start,
                    end = range.end,
                    error = %e,
                    "Chunk delivery failed"
                ),
            }

            report.outcomes.push(ChunkOutcome {
                index: chunk.index,
                range,
                bytes,
                result,
            });
        }

        trace_phase(RunPhase::Done);
        let failed = report.failed_chunks().count();
        if failed == 0 {
            info!(chunks = report.outcomes.len(), "All chunks delivered");
        } else {
            warn!(
                failed,
                chunks = report.outcomes.len(),
                delivered_records = report.delivered_records(),
                "Delivery finished with failed chunks"
            );
        }

        Ok(report)
    }
}

fn trace_phase(phase: RunPhase) {
    debug!(?phase, "Delivery phase");
}
