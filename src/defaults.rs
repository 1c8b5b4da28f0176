//! Default protocol and tuning constants for ttstream.
//!
//! Shared between `Config`, `PipelineConfig` and the individual stations so the
//! defaults cannot drift apart.

/// Byte that terminates a logical record.
pub const LINE_TERMINATOR: u8 = b'\n';

/// Prefix stripped from the start of every record.
///
/// Server-sent-event style responses carry each JSON payload as `data: {...}`.
pub const RECORD_PREFIX: &str = "data: ";

/// Event discriminator value marking an audio-bearing record.
pub const AUDIO_EVENT: &str = "tts_message";

/// Name of the JSON field holding the base64 audio payload.
pub const AUDIO_FIELD: &str = "audio";

/// First byte of an MP3 frame sync marker.
pub const FRAME_SYNC_BYTE: u8 = 0xFF;

/// Mask applied to the second byte of a frame sync marker.
///
/// Together with [`FRAME_SYNC_BYTE`] this checks the 11 leading set bits of an
/// MP3 frame header.
pub const FRAME_SYNC_MASK: u8 = 0b1110_0000;

/// Read size used by reader-backed chunk sources.
pub const CHUNK_SIZE: usize = 8192;

/// Number of frames a channel sink may buffer before the pipeline blocks.
pub const CHANNEL_CAPACITY: usize = 64;

/// Number of raw chunks the threaded pipeline may buffer before the feeder blocks.
pub const FEED_CAPACITY: usize = 256;
