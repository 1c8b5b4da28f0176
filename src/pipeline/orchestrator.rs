//! Stream pipeline: raw chunks → records → audio bytes → MP3 frames → sink.

use crate::config::Config;
use crate::defaults;
use crate::error::{Result, StreamError};
use crate::pipeline::error::{ErrorReporter, LogReporter, StationError};
use crate::pipeline::event_parser::{EventParser, ParsedEvent};
use crate::pipeline::frame_splitter::FrameSplitter;
use crate::pipeline::line_assembler::LineAssembler;
use crate::pipeline::sink::FrameSink;
use crate::pipeline::station::Station;
use crate::pipeline::types::{AudioRun, LogicalRecord, Mp3Frame, SourceEvent, StreamStats};
use crate::source::{ChannelSource, ChunkSource};
use crossbeam_channel::{Sender, bounded};
use futures_util::{Stream, StreamExt};
use std::fmt::Display;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Configuration for the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Prefix stripped from the start of each record
    pub record_prefix: String,
    /// Discriminator value of audio-bearing events
    pub audio_event: String,
    /// Raw chunks buffered between a `ChunkFeeder` and the pipeline thread
    pub feed_capacity: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            record_prefix: defaults::RECORD_PREFIX.to_string(),
            audio_event: defaults::AUDIO_EVENT.to_string(),
            feed_capacity: defaults::FEED_CAPACITY,
        }
    }
}

impl PipelineConfig {
    /// Creates configuration from app config.
    pub fn from_config(config: &Config) -> Self {
        Self {
            record_prefix: config.protocol.record_prefix.clone(),
            audio_event: config.protocol.audio_event.clone(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PipelineState {
    Streaming,
    Finished,
    Failed,
}

/// Reassembles MP3 frames from one event stream.
///
/// Each instance owns the buffers of exactly one stream; concurrent streams
/// need one pipeline each. Chunks are processed strictly in call order, and
/// every frame completed by a chunk reaches the sink before `handle_chunk`
/// returns.
pub struct StreamPipeline {
    assembler: LineAssembler,
    parser: EventParser,
    splitter: FrameSplitter,
    error_reporter: Arc<dyn ErrorReporter>,
    stats: StreamStats,
    state: PipelineState,
    config: PipelineConfig,
}

impl Default for StreamPipeline {
    fn default() -> Self {
        Self::new(PipelineConfig::default())
    }
}

impl StreamPipeline {
    /// Creates a new pipeline with default error reporter.
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            assembler: LineAssembler::with_prefix(config.record_prefix.clone()),
            parser: EventParser::with_audio_event(config.audio_event.clone()),
            splitter: FrameSplitter::new(),
            error_reporter: Arc::new(LogReporter),
            stats: StreamStats::default(),
            state: PipelineState::Streaming,
            config,
        }
    }

    /// Sets a custom error reporter.
    pub fn with_error_reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.error_reporter = reporter;
        self
    }

    pub fn stats(&self) -> &StreamStats {
        &self.stats
    }

    /// Whether the stream has ended or failed.
    pub fn is_finished(&self) -> bool {
        self.state != PipelineState::Streaming
    }

    /// Bytes waiting for a line terminator.
    pub fn pending_bytes(&self) -> usize {
        self.assembler.pending_len()
    }

    /// Audio bytes held back as an unfinished frame.
    pub fn carry_over(&self) -> &[u8] {
        self.splitter.carry_over()
    }

    /// Feeds one raw chunk, forwarding every frame it completes.
    pub fn handle_chunk(
        &mut self,
        chunk: impl Into<Vec<u8>>,
        sink: &mut dyn FrameSink,
    ) -> Result<()> {
        self.ensure_streaming()?;
        self.stats.chunks += 1;

        match self.assembler.process(chunk.into()) {
            Ok(Some(records)) => self.forward_records(records, sink),
            Ok(None) => Ok(()),
            Err(e) => self.station_failed(self.assembler.name(), e, sink),
        }
    }

    /// Ends the stream: parses any unterminated tail, releases the carry-over
    /// as the terminal frame and signals end of stream to the sink.
    pub fn handle_end(&mut self, sink: &mut dyn FrameSink) -> Result<StreamStats> {
        self.ensure_streaming()?;

        if let Some(records) = self.assembler.flush() {
            self.forward_records(records, sink)?;
        }
        if let Some(frames) = self.splitter.flush() {
            self.emit(frames, sink)?;
        }

        self.state = PipelineState::Finished;
        let name = sink.name();
        sink.finish().map_err(|e| self.sink_error(name, e))?;
        Ok(self.stats.clone())
    }

    /// Fails the stream: buffered bytes are discarded, the sink is told about
    /// the failure and the transport error is returned.
    pub fn handle_failure(
        &mut self,
        message: impl Into<String>,
        sink: &mut dyn FrameSink,
    ) -> StreamError {
        self.abort(
            StreamError::Transport {
                message: message.into(),
            },
            sink,
        )
    }

    /// Drives the pipeline from a blocking source until it ends or fails.
    pub fn run(
        &mut self,
        source: &mut dyn ChunkSource,
        sink: &mut dyn FrameSink,
    ) -> Result<StreamStats> {
        loop {
            match source.next_chunk() {
                Ok(Some(chunk)) => self.handle_chunk(chunk, sink)?,
                Ok(None) => return self.handle_end(sink),
                Err(e) => return Err(self.abort(e, sink)),
            }
        }
    }

    /// Drives the pipeline from an async byte stream until it ends or fails.
    ///
    /// Accepts anything shaped like an HTTP body stream: items are byte
    /// buffers or transport errors. Stream exhaustion is the end signal.
    pub async fn run_stream<S, B, E>(
        &mut self,
        stream: S,
        sink: &mut dyn FrameSink,
    ) -> Result<StreamStats>
    where
        S: Stream<Item = std::result::Result<B, E>>,
        B: AsRef<[u8]>,
        E: Display,
    {
        let mut stream = std::pin::pin!(stream);
        while let Some(item) = stream.next().await {
            match item {
                Ok(chunk) => self.handle_chunk(chunk.as_ref(), sink)?,
                Err(e) => return Err(self.handle_failure(e.to_string(), sink)),
            }
        }
        self.handle_end(sink)
    }

    /// Runs the pipeline on a dedicated thread fed through a [`ChunkFeeder`].
    ///
    /// Dropping the feeder without calling `end` or `fail` ends the stream
    /// normally, so buffered audio is still flushed.
    pub fn spawn<S: FrameSink + 'static>(
        mut self,
        mut sink: S,
    ) -> (ChunkFeeder, PipelineHandle<S>) {
        let (tx, rx) = bounded(self.config.feed_capacity.max(1));

        let handle = thread::spawn(move || {
            let mut source = ChannelSource::new(rx);
            let result = self.run(&mut source, &mut sink);
            (result, sink)
        });

        (ChunkFeeder { tx }, PipelineHandle { handle })
    }

    /// Fails the stream with a source-side error: buffers are discarded and
    /// the sink is told. The error is returned unchanged.
    fn abort(&mut self, error: StreamError, sink: &mut dyn FrameSink) -> StreamError {
        self.assembler.reset();
        self.splitter.reset();
        self.state = PipelineState::Failed;

        let message = match &error {
            StreamError::Transport { message } => message.clone(),
            other => other.to_string(),
        };
        self.error_reporter.report("source", &StationError::Fatal(message));
        sink.fail(&error);
        error
    }

    fn forward_records(
        &mut self,
        records: Vec<LogicalRecord>,
        sink: &mut dyn FrameSink,
    ) -> Result<()> {
        let mut run = AudioRun::new();

        for record in records {
            self.stats.records += 1;
            match self.parser.process(record) {
                Ok(Some(ParsedEvent::Audio(bytes))) => {
                    self.stats.audio_events += 1;
                    run.push(bytes);
                }
                Ok(Some(ParsedEvent::Other { .. })) | Ok(None) => {
                    self.stats.other_events += 1;
                }
                Err(e) if !e.is_fatal() => {
                    self.stats.malformed_records += 1;
                    self.error_reporter.report(self.parser.name(), &e);
                }
                Err(e) => return self.station_failed(self.parser.name(), e, sink),
            }
        }

        if run.payload_count() == 0 {
            return Ok(());
        }
        self.stats.audio_bytes += run.byte_len() as u64;

        match self.splitter.process(run) {
            Ok(Some(frames)) => self.emit(frames, sink),
            Ok(None) => Ok(()),
            Err(e) => self.station_failed(self.splitter.name(), e, sink),
        }
    }

    fn emit(&mut self, frames: Vec<Mp3Frame>, sink: &mut dyn FrameSink) -> Result<()> {
        for frame in frames {
            self.stats.frames += 1;
            self.stats.frame_bytes += frame.len() as u64;
            if let Err(e) = sink.handle(frame) {
                let error = self.sink_error(sink.name(), e);
                self.assembler.reset();
                self.splitter.reset();
                self.state = PipelineState::Failed;
                self.error_reporter
                    .report(sink.name(), &StationError::Fatal(error.to_string()));
                return Err(error);
            }
        }
        Ok(())
    }

    fn station_failed(
        &mut self,
        station: &'static str,
        error: StationError,
        sink: &mut dyn FrameSink,
    ) -> Result<()> {
        self.error_reporter.report(station, &error);
        if !error.is_fatal() {
            return Ok(());
        }
        self.assembler.reset();
        self.splitter.reset();
        self.state = PipelineState::Failed;
        let error = StreamError::Other(format!("{station}: {error}"));
        sink.fail(&error);
        Err(error)
    }

    fn sink_error(&self, sink: &str, error: StreamError) -> StreamError {
        match error {
            StreamError::SinkFailed { .. } => error,
            other => StreamError::SinkFailed {
                sink: sink.to_string(),
                message: other.to_string(),
            },
        }
    }

    fn ensure_streaming(&self) -> Result<()> {
        match self.state {
            PipelineState::Streaming => Ok(()),
            PipelineState::Finished | PipelineState::Failed => Err(StreamError::StreamFinished),
        }
    }
}

/// Producer side of a spawned pipeline: the chunk-received and stream-ended
/// signals of the transport.
#[derive(Debug, Clone)]
pub struct ChunkFeeder {
    tx: Sender<SourceEvent>,
}

impl ChunkFeeder {
    /// Queues a raw chunk. Blocks while the pipeline is `feed_capacity` chunks behind.
    pub fn push(&self, chunk: impl Into<Vec<u8>>) -> Result<()> {
        self.send(SourceEvent::Chunk(chunk.into()))
    }

    /// Signals a clean end of stream.
    pub fn end(self) -> Result<()> {
        self.send(SourceEvent::End)
    }

    /// Signals a transport failure; buffered audio is discarded.
    pub fn fail(self, message: impl Into<String>) -> Result<()> {
        self.send(SourceEvent::Failed(message.into()))
    }

    fn send(&self, event: SourceEvent) -> Result<()> {
        self.tx
            .send(event)
            .map_err(|_| StreamError::StreamFinished)
    }
}

/// Handle to a pipeline running on its own thread.
pub struct PipelineHandle<S> {
    handle: JoinHandle<(Result<StreamStats>, S)>,
}

impl<S> PipelineHandle<S> {
    /// Waits for the stream to end and returns its stats together with the sink.
    pub fn join(self) -> Result<(StreamStats, S)> {
        let (result, sink) = self
            .handle
            .join()
            .map_err(|_| StreamError::Other("pipeline thread panicked".to_string()))?;
        result.map(|stats| (stats, sink))
    }

    /// Waits for the stream to end and returns the outcome without discarding the sink.
    pub fn join_with_sink(self) -> Result<(Result<StreamStats>, S)> {
        self.handle
            .join()
            .map_err(|_| StreamError::Other("pipeline thread panicked".to_string()))
    }

    /// Returns true once the pipeline thread has exited.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}
