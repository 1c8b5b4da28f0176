//! MP3 frame splitting over a concatenated byte run.
//!
//! Every scan works on `carry-over ++ new payload bytes`. A frame is emitted
//! once the sync marker of the *next* frame has been seen; bytes after the last
//! marker stay in the carry-over until more data arrives or the stream ends.
//!
//! Bytes that precede the very first marker of the stream are not trimmed.
//! They become part of the first emitted frame, which is why frame 0 is the
//! only frame that may not start with a sync marker.

use crate::pipeline::error::StationError;
use crate::pipeline::station::Station;
use crate::pipeline::types::{AudioRun, Mp3Frame, is_frame_sync};

/// Splits decoded audio bytes into header-aligned MP3 frames.
#[derive(Debug, Clone, Default)]
pub struct FrameSplitter {
    carry: Vec<u8>,
    /// A sync marker has been seen somewhere in the stream.
    synced: bool,
    next_sequence: u64,
    finished: bool,
}

impl FrameSplitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `bytes` to the carry-over and returns every frame proven complete.
    pub fn scan(&mut self, bytes: &[u8]) -> Vec<Mp3Frame> {
        self.scan_parts(std::iter::once(bytes))
    }

    /// Bytes held back because their frame may still be growing.
    pub fn carry_over(&self) -> &[u8] {
        &self.carry
    }

    /// Whether `finish` has been called.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Releases the carry-over as the terminal frame and stops accepting input.
    pub fn finish(&mut self) -> Option<Mp3Frame> {
        self.finished = true;
        if self.carry.is_empty() {
            return None;
        }
        let bytes = std::mem::take(&mut self.carry);
        let frame = Mp3Frame::terminal(self.next_sequence, bytes);
        self.next_sequence += 1;
        Some(frame)
    }

    /// Drops the carry-over without emitting it.
    pub fn clear(&mut self) {
        self.carry.clear();
    }

    fn scan_parts<'a>(&mut self, parts: impl IntoIterator<Item = &'a [u8]>) -> Vec<Mp3Frame> {
        // Positions before the last carried byte were already tested against
        // their successor in an earlier pass.
        let resume = self.carry.len().saturating_sub(1);

        let mut buffer = std::mem::take(&mut self.carry);
        for part in parts {
            buffer.extend_from_slice(part);
        }

        let mut frames = Vec::new();
        let mut start = 0;
        for i in resume..buffer.len().saturating_sub(1) {
            if !is_frame_sync(buffer[i], buffer[i + 1]) {
                continue;
            }
            if !self.synced {
                // First marker of the stream: leading bytes stay in frame 0.
                self.synced = true;
                continue;
            }
            if i > start {
                frames.push(Mp3Frame::new(self.next_sequence, buffer[start..i].to_vec()));
                self.next_sequence += 1;
                start = i;
            }
        }

        buffer.drain(..start);
        self.carry = buffer;
        frames
    }
}

impl Station for FrameSplitter {
    type Input = AudioRun;
    type Output = Vec<Mp3Frame>;

    fn process(&mut self, run: AudioRun) -> Result<Option<Vec<Mp3Frame>>, StationError> {
        if self.finished {
            return Err(StationError::Fatal(
                "frame splitter received audio after end of stream".to_string(),
            ));
        }
        let frames = self.scan_parts(run.payloads().iter().map(Vec::as_slice));
        if frames.is_empty() {
            Ok(None)
        } else {
            Ok(Some(frames))
        }
    }

    fn name(&self) -> &'static str {
        "frame-splitter"
    }

    fn flush(&mut self) -> Option<Vec<Mp3Frame>> {
        self.finish().map(|frame| vec![frame])
    }

    fn reset(&mut self) {
        self.clear();
    }
}
