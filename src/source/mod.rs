//! Chunk sources: where raw response bytes come from.
//!
//! Opening the connection is left to the caller. A source only has to hand over byte
//! chunks in arrival order and say whether the stream ended or failed.

pub mod capture;
pub mod channel;
#[cfg(feature = "http")]
pub mod http;
pub mod reader;
pub mod scripted;

pub use capture::CapturingSource;
pub use channel::ChannelSource;
pub use reader::ReaderSource;
pub use scripted::ScriptedSource;

use crate::error::Result;

/// Trait for raw byte chunk sources.
///
/// This trait allows swapping implementations (HTTP body, file, channel, mock).
pub trait ChunkSource: Send {
    /// Read the next chunk.
    ///
    /// # Returns
    /// `Ok(Some(chunk))` for data, `Ok(None)` once the stream has ended, or an
    /// error if the transport failed
    fn next_chunk(&mut self) -> Result<Option<Vec<u8>>>;

    /// Name for logging/debugging.
    fn name(&self) -> &'static str {
        "source"
    }
}

impl<S: ChunkSource + ?Sized> ChunkSource for Box<S> {
    fn next_chunk(&mut self) -> Result<Option<Vec<u8>>> {
        (**self).next_chunk()
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}
