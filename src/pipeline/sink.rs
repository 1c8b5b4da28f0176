use crate::config::Config;
use crate::error::{Result, StreamError};
use crate::pipeline::types::{Mp3Frame, SinkEvent};
use crossbeam_channel::{Receiver, Sender, bounded};
use std::io::{self, Read, Write};

/// Pluggable frame output handler for the pipeline.
/// Pairs with ChunkSource for input - this handles reassembled MP3 frames.
///
/// Frames are pushed in stream order, one call per frame. A sink that cannot
/// keep up applies backpressure simply by blocking in `handle`.
pub trait FrameSink: Send {
    /// Handle one frame. Called for each frame as soon as it is complete.
    fn handle(&mut self, frame: Mp3Frame) -> Result<()>;

    /// Called once after the last frame of a cleanly ended stream.
    fn finish(&mut self) -> Result<()> {
        Ok(())
    }

    /// Called instead of `finish` when the stream failed.
    fn fail(&mut self, _error: &StreamError) {}

    /// Name for logging/debugging.
    fn name(&self) -> &'static str {
        "sink"
    }
}

impl<S: FrameSink + ?Sized> FrameSink for Box<S> {
    fn handle(&mut self, frame: Mp3Frame) -> Result<()> {
        (**self).handle(frame)
    }

    fn finish(&mut self) -> Result<()> {
        (**self).finish()
    }

    fn fail(&mut self, error: &StreamError) {
        (**self).fail(error)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

/// Library/test sink: keeps every frame in memory.
#[derive(Debug, Default)]
pub struct CollectorSink {
    frames: Vec<Mp3Frame>,
    ended: bool,
    error: Option<String>,
}

impl CollectorSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> &[Mp3Frame] {
        &self.frames
    }

    pub fn into_frames(self) -> Vec<Mp3Frame> {
        self.frames
    }

    /// All frame bytes joined in order.
    pub fn bytes(&self) -> Vec<u8> {
        self.frames.iter().flat_map(|f| f.bytes.iter().copied()).collect()
    }

    /// Whether end of stream was signalled.
    pub fn is_ended(&self) -> bool {
        self.ended
    }

    /// The failure reported by the pipeline, if any.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

impl FrameSink for CollectorSink {
    fn handle(&mut self, frame: Mp3Frame) -> Result<()> {
        self.frames.push(frame);
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.ended = true;
        Ok(())
    }

    fn fail(&mut self, error: &StreamError) {
        self.error = Some(error.to_string());
    }

    fn name(&self) -> &'static str {
        "collector"
    }
}

/// Writes frame bytes to any writer (an `.mp3` file, stdout, a decoder pipe).
pub struct WriterSink<W: Write + Send> {
    writer: W,
    bytes_written: u64,
}

impl<W: Write + Send> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            bytes_written: 0,
        }
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> FrameSink for WriterSink<W> {
    fn handle(&mut self, frame: Mp3Frame) -> Result<()> {
        self.writer.write_all(&frame.bytes)?;
        self.bytes_written += frame.bytes.len() as u64;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    fn fail(&mut self, _error: &StreamError) {
        // Keep whatever was already written; the caller sees the error itself.
        if let Err(e) = self.writer.flush() {
            eprintln!("ttstream: failed to flush output after stream error: {e}");
        }
    }

    fn name(&self) -> &'static str {
        "writer"
    }
}

/// Pushes frames into a bounded channel for a consumer on another thread.
///
/// A full channel blocks the pipeline, so the consumer's pace is the
/// pipeline's pace.
pub struct ChannelSink {
    tx: Sender<SinkEvent>,
}

impl ChannelSink {
    pub fn new(tx: Sender<SinkEvent>) -> Self {
        Self { tx }
    }

    /// Creates a sink and the receiving end of its channel.
    pub fn bounded(capacity: usize) -> (Self, Receiver<SinkEvent>) {
        let (tx, rx) = bounded(capacity);
        (Self::new(tx), rx)
    }

    /// Creates a sink sized by `[output] channel_capacity`.
    pub fn from_config(config: &Config) -> (Self, Receiver<SinkEvent>) {
        Self::bounded(config.output.channel_capacity)
    }

    fn send(&self, event: SinkEvent) -> Result<()> {
        self.tx.send(event).map_err(|_| StreamError::SinkFailed {
            sink: self.name().to_string(),
            message: "frame receiver dropped".to_string(),
        })
    }
}

impl FrameSink for ChannelSink {
    fn handle(&mut self, frame: Mp3Frame) -> Result<()> {
        self.send(SinkEvent::Frame(frame))
    }

    fn finish(&mut self) -> Result<()> {
        self.send(SinkEvent::End)
    }

    fn fail(&mut self, error: &StreamError) {
        if self.send(SinkEvent::Error(error.to_string())).is_err() {
            eprintln!("ttstream: stream error not delivered, receiver dropped: {error}");
        }
    }

    fn name(&self) -> &'static str {
        "channel"
    }
}

/// Pull-side adapter over a [`ChannelSink`] channel.
///
/// Implements [`Read`] so a decoder expecting a byte stream can consume frames
/// directly. Reads block until the next frame arrives, return `Ok(0)` after
/// end of stream, and fail once the pipeline reports an error.
pub struct FrameReader {
    rx: Receiver<SinkEvent>,
    current: Vec<u8>,
    position: usize,
    ended: bool,
}

impl FrameReader {
    pub fn new(rx: Receiver<SinkEvent>) -> Self {
        Self {
            rx,
            current: Vec::new(),
            position: 0,
            ended: false,
        }
    }

    /// Blocks for the next whole frame; `Ok(None)` after end of stream.
    ///
    /// Bytes of a frame partially consumed through `read` are not returned again.
    pub fn next_frame(&mut self) -> io::Result<Option<Mp3Frame>> {
        if self.ended {
            return Ok(None);
        }
        match self.rx.recv() {
            Ok(SinkEvent::Frame(frame)) => Ok(Some(frame)),
            Ok(SinkEvent::End) => {
                self.ended = true;
                Ok(None)
            }
            Ok(SinkEvent::Error(message)) => {
                self.ended = true;
                Err(io::Error::other(message))
            }
            Err(_) => {
                self.ended = true;
                Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "frame channel closed before end of stream",
                ))
            }
        }
    }
}

impl Read for FrameReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        while self.position >= self.current.len() {
            match self.next_frame()? {
                Some(frame) => {
                    self.current = frame.into_bytes();
                    self.position = 0;
                }
                None => return Ok(0),
            }
        }
        let available = &self.current[self.position..];
        let n = available.len().min(buf.len());
        buf[..n].copy_from_slice(&available[..n]);
        self.position += n;
        Ok(n)
    }
}
