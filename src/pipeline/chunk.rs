use crate::model::IngestionLogRecord;
use std::ops::Range;

/// How a batch is split across ingestion requests.
///
/// The split is an estimate: the whole batch is measured once and records are
/// divided evenly, so a batch dominated by a few very large records can yield
/// chunks above `max_chunk_bytes`.
#[derive(Debug)]
pub struct ChunkPlan<'a> {
    records: &'a [IngestionLogRecord],
    pub total_bytes: usize,
    pub max_chunk_bytes: usize,
    pub chunk_count: usize,
    pub records_per_chunk: usize,
}

/// A contiguous run of records delivered by one request
#[derive(Debug, Clone, Copy)]
pub struct Chunk<'a> {
    pub index: usize,
    pub start: usize,
    pub records: &'a [IngestionLogRecord],
}

impl Chunk<'_> {
    pub fn range(&self) -> Range<usize> {
        self.start..self.start + self.records.len()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<'a> ChunkPlan<'a> {
    pub fn is_empty(&self) -> bool {
        self.chunk_count == 0
    }

    pub fn chunks(&self) -> impl Iterator<Item = Chunk<'a>> + '_ {
        let step = self.records_per_chunk.max(1);
        self.records
            .chunks(step)
            .enumerate()
            .map(move |(index, records)| Chunk {
                index,
                start: index * step,
                records,
            })
    }
}

/// Decide how many requests `records` needs and how they are partitioned.
pub fn plan_chunks(
    records: &[IngestionLogRecord],
    max_chunk_bytes: usize,
) -> Result<ChunkPlan<'_>, serde_json::Error> {
    let max_chunk_bytes = max_chunk_bytes.max(1);

    if records.is_empty() {
        return Ok(ChunkPlan {
            records,
            total_bytes: 0,
            max_chunk_bytes,
            chunk_count: 0,
            records_per_chunk: 0,
        });
    }

    let total_bytes = serde_json::to_vec(records)?.len();
    let chunk_count = total_bytes.div_ceil(max_chunk_bytes).max(1);
    let records_per_chunk = records.len().div_ceil(chunk_count);

    Ok(ChunkPlan {
        records,
        total_bytes,
        max_chunk_bytes,
        chunk_count,
        records_per_chunk,
    })
}
