use crate::defaults;
use crate::error::{Result, StreamError};
use crate::source::ChunkSource;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Reads chunks from any blocking reader (a captured response file, stdin, a socket).
pub struct ReaderSource {
    reader: Box<dyn Read + Send>,
    chunk_size: usize,
}

impl ReaderSource {
    /// Create a source reading `chunk_size` bytes at a time.
    pub fn new(reader: Box<dyn Read + Send>, chunk_size: usize) -> Self {
        Self {
            reader,
            chunk_size: chunk_size.max(1),
        }
    }

    /// Create a source with the default chunk size.
    pub fn from_reader(reader: Box<dyn Read + Send>) -> Self {
        Self::new(reader, defaults::CHUNK_SIZE)
    }

    /// Open a captured response file.
    pub fn from_path(path: &Path, chunk_size: usize) -> Result<Self> {
        let file = File::open(path).map_err(|e| {
            StreamError::Other(format!("Failed to open input {}: {e}", path.display()))
        })?;
        Ok(Self::new(Box::new(file), chunk_size))
    }

    /// Read from standard input.
    pub fn from_stdin(chunk_size: usize) -> Self {
        Self::new(Box::new(io::stdin()), chunk_size)
    }
}

impl ChunkSource for ReaderSource {
    fn next_chunk(&mut self) -> Result<Option<Vec<u8>>> {
        let mut buf = vec![0u8; self.chunk_size];
        loop {
            match self.reader.read(&mut buf) {
                Ok(0) => return Ok(None),
                Ok(n) => {
                    buf.truncate(n);
                    return Ok(Some(buf));
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    return Err(StreamError::Transport {
                        message: e.to_string(),
                    });
                }
            }
        }
    }

    fn name(&self) -> &'static str {
        "reader"
    }
}
