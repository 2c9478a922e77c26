pub mod chunk;
pub mod runner;

pub use chunk::{plan_chunks, Chunk, ChunkPlan};
pub use runner::{ChunkOutcome, DeliveryPipeline, PipelineError, RunPhase, RunReport};
