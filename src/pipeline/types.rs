//! Data types flowing through the reassembly pipeline.

use crate::defaults::{FRAME_SYNC_BYTE, FRAME_SYNC_MASK};

/// Returns true if the two bytes form an MP3 frame sync marker.
///
/// The first byte must be `0xFF` and the high three bits of the second byte set,
/// giving the 11 leading set bits of a frame header.
#[inline]
pub fn is_frame_sync(first: u8, second: u8) -> bool {
    first == FRAME_SYNC_BYTE && (second & FRAME_SYNC_MASK) == FRAME_SYNC_MASK
}

/// One line of the event protocol, prefix already stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalRecord {
    pub text: String,
}

impl LogicalRecord {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

/// Decoded audio payloads collected from one assembler flush, in record order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AudioRun {
    payloads: Vec<Vec<u8>>,
}

impl AudioRun {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends the payload of one audio-bearing record.
    pub fn push(&mut self, payload: Vec<u8>) {
        self.payloads.push(payload);
    }

    /// Number of audio-bearing records in this run.
    pub fn payload_count(&self) -> usize {
        self.payloads.len()
    }

    /// Total decoded bytes across all payloads.
    pub fn byte_len(&self) -> usize {
        self.payloads.iter().map(Vec::len).sum()
    }

    pub fn payloads(&self) -> &[Vec<u8>] {
        &self.payloads
    }
}

impl FromIterator<Vec<u8>> for AudioRun {
    fn from_iter<I: IntoIterator<Item = Vec<u8>>>(iter: I) -> Self {
        Self {
            payloads: iter.into_iter().collect(),
        }
    }
}

/// A header-aligned slice of the MP3 bitstream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mp3Frame {
    /// Position of this frame in the output stream, starting at 0.
    pub sequence: u64,
    /// Frame bytes, beginning at a sync marker (except possibly frame 0).
    pub bytes: Vec<u8>,
    /// Whether this frame was released by the end-of-stream flush.
    pub terminal: bool,
}

impl Mp3Frame {
    pub fn new(sequence: u64, bytes: Vec<u8>) -> Self {
        Self {
            sequence,
            bytes,
            terminal: false,
        }
    }

    pub fn terminal(sequence: u64, bytes: Vec<u8>) -> Self {
        Self {
            sequence,
            bytes,
            terminal: true,
        }
    }

    /// Whether the frame starts with a valid sync marker.
    pub fn has_sync(&self) -> bool {
        matches!(self.bytes.as_slice(), [first, second, ..] if is_frame_sync(*first, *second))
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Events delivered by the transport side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceEvent {
    /// A raw byte chunk, arbitrarily split.
    Chunk(Vec<u8>),
    /// The stream ended normally.
    End,
    /// The transport failed; buffered data must be discarded.
    Failed(String),
}

/// Events delivered to a channel-backed frame consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkEvent {
    Frame(Mp3Frame),
    End,
    Error(String),
}

/// Counters collected over one stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamStats {
    /// Raw chunks received from the source.
    pub chunks: u64,
    /// Logical records handed to the event parser.
    pub records: u64,
    /// Records dropped because they failed to parse or decode.
    pub malformed_records: u64,
    /// Records carrying an audio payload.
    pub audio_events: u64,
    /// Well-formed records with any other discriminator.
    pub other_events: u64,
    /// Decoded audio bytes.
    pub audio_bytes: u64,
    /// Frames delivered to the sink.
    pub frames: u64,
    /// Bytes delivered to the sink.
    pub frame_bytes: u64,
}

impl std::fmt::Display for StreamStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} chunks, {} records ({} audio, {} other, {} malformed), {} frames, {} bytes",
            self.chunks,
            self.records,
            self.audio_events,
            self.other_events,
            self.malformed_records,
            self.frames,
            self.frame_bytes
        )
    }
}
