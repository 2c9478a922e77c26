//! Ships edge module logs to a Log Analytics workspace.
//!
//! Raw records are mapped to the ingestion schema ([`model`]), split into
//! size-bounded chunks and posted one chunk at a time with a shared-key
//! signature ([`pipeline`], [`ingest`]).

pub mod cli;
pub mod config;
pub mod ingest;
pub mod model;
pub mod pipeline;
