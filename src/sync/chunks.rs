//! Reassembly of chunked webhook file payloads.
//!
//! Large files arrive as ordered fragments sharing a chunk id. Non-final
//! fragments are buffered in the store (surviving restarts); the final
//! fragment triggers reassembly. Receiving the final fragment with prior
//! fragments missing is a distinct, loud error: data was lost upstream, not
//! merely "still buffering".

use chrono::Utc;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::store::Store;
use crate::types::ChunkBufferEntry;

/// Chunk descriptor carried by a webhook file payload.
#[derive(Debug, Clone, Deserialize)]
pub struct ChunkInfo {
    pub id: String,
    /// 0-based fragment position.
    pub index: i64,
    pub total: i64,
}

#[derive(Debug)]
pub enum ChunkOutcome {
    /// The full payload, ready for reconciliation.
    Complete(String),
    /// A non-final fragment was buffered; acknowledge and stop.
    Buffered,
}

pub fn process(
    store: &dyn Store,
    chunk: Option<&ChunkInfo>,
    content: &str,
) -> Result<ChunkOutcome> {
    let Some(chunk) = chunk else {
        // No descriptor means the payload is already complete
        return Ok(ChunkOutcome::Complete(content.to_string()));
    };

    if chunk.total < 1 || chunk.index < 0 || chunk.index >= chunk.total {
        return Err(Error::InvalidPayload(format!(
            "chunk index {} out of range for total {}",
            chunk.index, chunk.total
        )));
    }

    if chunk.index < chunk.total - 1 {
        store.insert_chunk(&ChunkBufferEntry {
            chunk_id: chunk.id.clone(),
            chunk_index: chunk.index,
            chunk_total: chunk.total,
            content: content.to_string(),
            created_at: Utc::now(),
        })?;
        return Ok(ChunkOutcome::Buffered);
    }

    let buffered = store.list_chunks(&chunk.id)?;
    let expected = chunk.total - 1;
    if buffered.len() as i64 != expected {
        return Err(Error::MissingChunks {
            chunk_id: chunk.id.clone(),
            expected: expected as u32,
            found: buffered.len() as u32,
        });
    }

    let mut assembled = String::with_capacity(
        buffered.iter().map(|entry| entry.content.len()).sum::<usize>() + content.len(),
    );
    for entry in &buffered {
        assembled.push_str(&entry.content);
    }
    assembled.push_str(content);

    store.delete_chunks(&chunk.id)?;
    Ok(ChunkOutcome::Complete(assembled))
}
