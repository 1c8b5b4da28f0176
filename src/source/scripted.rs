use crate::error::{Result, StreamError};
use crate::source::ChunkSource;
use std::collections::VecDeque;

/// Replays a fixed list of chunks, optionally ending in a transport failure.
///
/// Used for tests and for replaying captured responses with a chosen chunking.
#[derive(Debug, Clone)]
pub struct ScriptedSource {
    chunks: VecDeque<Vec<u8>>,
    failure: Option<String>,
}

impl ScriptedSource {
    pub fn new(chunks: Vec<Vec<u8>>) -> Self {
        Self {
            chunks: chunks.into(),
            failure: None,
        }
    }

    /// Split `data` into chunks of at most `size` bytes.
    pub fn split_every(data: &[u8], size: usize) -> Self {
        Self::new(data.chunks(size.max(1)).map(<[u8]>::to_vec).collect())
    }

    /// Split `data` at the given offsets (out-of-range offsets are ignored).
    pub fn split_at(data: &[u8], offsets: &[usize]) -> Self {
        let mut cuts: Vec<usize> = offsets
            .iter()
            .copied()
            .filter(|&o| o > 0 && o < data.len())
            .collect();
        cuts.sort_unstable();
        cuts.dedup();

        let mut chunks = Vec::with_capacity(cuts.len() + 1);
        let mut start = 0;
        for cut in cuts {
            chunks.push(data[start..cut].to_vec());
            start = cut;
        }
        chunks.push(data[start..].to_vec());
        Self::new(chunks)
    }

    /// Fail with a transport error once all chunks have been delivered.
    pub fn with_failure(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    /// Chunks not yet delivered.
    pub fn remaining(&self) -> usize {
        self.chunks.len()
    }
}

impl ChunkSource for ScriptedSource {
    fn next_chunk(&mut self) -> Result<Option<Vec<u8>>> {
        if let Some(chunk) = self.chunks.pop_front() {
            return Ok(Some(chunk));
        }
        match self.failure.take() {
            Some(message) => Err(StreamError::Transport { message }),
            None => Ok(None),
        }
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}
