//! Streaming reassembly pipeline.
//!
//! Stations run sequentially on the caller's thread (or one dedicated thread
//! per stream), one chunk at a time:
//! ```text
//! ┌──────────┐    ┌───────────────┐    ┌──────────────┐    ┌────────────────┐    ┌──────┐
//! │  Source  │───▶│ LineAssembler │───▶│ EventParser  │───▶│ FrameSplitter  │───▶│ Sink │
//! │ (chunks) │    │   (records)   │    │ (audio runs) │    │  (MP3 frames)  │    │      │
//! └──────────┘    └───────────────┘    └──────────────┘    └────────────────┘    └──────┘
//! ```

pub mod error;
pub mod event_parser;
pub mod frame_splitter;
pub mod line_assembler;
pub mod orchestrator;
pub mod sink;
pub mod station;
pub mod types;

pub use error::{CollectingReporter, ErrorReporter, LogReporter, SilentReporter, StationError};
pub use event_parser::{EventParser, ParsedEvent};
pub use frame_splitter::FrameSplitter;
pub use line_assembler::LineAssembler;
pub use orchestrator::{ChunkFeeder, PipelineConfig, PipelineHandle, StreamPipeline};
pub use sink::{ChannelSink, CollectorSink, FrameReader, FrameSink, WriterSink};
pub use station::Station;
pub use types::{
    AudioRun, LogicalRecord, Mp3Frame, SinkEvent, SourceEvent, StreamStats, is_frame_sync,
};
