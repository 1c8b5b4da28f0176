//! Raw response capture.
//!
//! Wraps a source and persists exactly what the transport delivered: one
//! `response-{i}.txt` per chunk and the whole body as `response.txt` once the
//! stream ends. Handy for replaying a problematic response later with
//! [`ReaderSource`](crate::source::ReaderSource).

use crate::error::{Result, StreamError};
use crate::source::ChunkSource;
use std::fs;
use std::path::{Path, PathBuf};

/// File name of the full captured body.
pub const FULL_RESPONSE_FILE: &str = "response.txt";

/// Source wrapper that records every chunk to a directory.
pub struct CapturingSource<S: ChunkSource> {
    inner: S,
    dir: PathBuf,
    index: usize,
    body: Vec<u8>,
}

impl<S: ChunkSource> CapturingSource<S> {
    /// Wraps `inner`, creating `dir` if needed and removing files left in it
    /// by a previous capture.
    pub fn new(inner: S, dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        prepare_dir(&dir)?;
        Ok(Self {
            inner,
            dir,
            index: 0,
            body: Vec::new(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Number of chunks captured so far.
    pub fn chunks_captured(&self) -> usize {
        self.index
    }

    pub fn into_inner(self) -> S {
        self.inner
    }

    fn write(&self, name: &str, bytes: &[u8]) -> Result<()> {
        let path = self.dir.join(name);
        fs::write(&path, bytes).map_err(|e| {
            StreamError::Other(format!("Failed to write capture {}: {e}", path.display()))
        })
    }
}

impl<S: ChunkSource> ChunkSource for CapturingSource<S> {
    fn next_chunk(&mut self) -> Result<Option<Vec<u8>>> {
        match self.inner.next_chunk()? {
            Some(chunk) => {
                self.write(&format!("response-{}.txt", self.index), &chunk)?;
                self.index += 1;
                self.body.extend_from_slice(&chunk);
                Ok(Some(chunk))
            }
            None => {
                self.write(FULL_RESPONSE_FILE, &self.body)?;
                Ok(None)
            }
        }
    }

    fn name(&self) -> &'static str {
        self.inner.name()
    }
}

fn prepare_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(|e| {
        StreamError::Other(format!(
            "Failed to create capture directory {}: {e}",
            dir.display()
        ))
    })?;

    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() {
            fs::remove_file(&path).map_err(|e| {
                StreamError::Other(format!("Failed to clear {}: {e}", path.display()))
            })?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::ScriptedSource;

    #[test]
    fn test_captures_chunks_and_full_body() {
        let dir = tempfile::tempdir().unwrap();
        let inner = ScriptedSource::new(vec![b"data: a".to_vec(), b"\n".to_vec()]);
        let mut source = CapturingSource::new(inner, dir.path()).unwrap();

        while source.next_chunk().unwrap().is_some() {}

        assert_eq!(source.chunks_captured(), 2);
        assert_eq!(
            fs::read(dir.path().join("response-0.txt")).unwrap(),
            b"data: a"
        );
        assert_eq!(fs::read(dir.path().join("response-1.txt")).unwrap(), b"\n");
        assert_eq!(
            fs::read(dir.path().join(FULL_RESPONSE_FILE)).unwrap(),
            b"data: a\n"
        );
    }

    #[test]
    fn test_clears_previous_capture() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("response-7.txt"), b"stale").unwrap();

        let source = CapturingSource::new(ScriptedSource::new(vec![]), dir.path()).unwrap();

        assert!(!source.dir().join("response-7.txt").exists());
    }

    #[test]
    fn test_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("out").join("capture");

        let mut source = CapturingSource::new(ScriptedSource::new(vec![]), &nested).unwrap();
        assert_eq!(source.next_chunk().unwrap(), None);

        assert!(nested.join(FULL_RESPONSE_FILE).exists());
    }

    #[test]
    fn test_failure_passes_through_without_full_body() {
        let dir = tempfile::tempdir().unwrap();
        let inner = ScriptedSource::new(vec![b"x".to_vec()]).with_failure("reset");
        let mut source = CapturingSource::new(inner, dir.path()).unwrap();

        assert!(source.next_chunk().unwrap().is_some());
        assert!(source.next_chunk().is_err());
        assert!(!dir.path().join(FULL_RESPONSE_FILE).exists());
    }
}
