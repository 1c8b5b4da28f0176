use crate::error::{Result, StreamError};
use crate::pipeline::types::SourceEvent;
use crate::source::ChunkSource;
use crossbeam_channel::Receiver;

/// Source fed by another thread through a channel of [`SourceEvent`]s.
///
/// A disconnected channel counts as end of stream: the producer went away
/// without saying so, and buffered audio is still worth flushing.
pub struct ChannelSource {
    rx: Receiver<SourceEvent>,
    ended: bool,
}

impl ChannelSource {
    pub fn new(rx: Receiver<SourceEvent>) -> Self {
        Self { rx, ended: false }
    }
}

impl ChunkSource for ChannelSource {
    fn next_chunk(&mut self) -> Result<Option<Vec<u8>>> {
        if self.ended {
            return Ok(None);
        }
        match self.rx.recv() {
            Ok(SourceEvent::Chunk(chunk)) => Ok(Some(chunk)),
            Ok(SourceEvent::End) | Err(_) => {
                self.ended = true;
                Ok(None)
            }
            Ok(SourceEvent::Failed(message)) => {
                self.ended = true;
                Err(StreamError::Transport { message })
            }
        }
    }

    fn name(&self) -> &'static str {
        "channel"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;

    #[test]
    fn test_chunks_then_end() {
        let (tx, rx) = unbounded();
        tx.send(SourceEvent::Chunk(vec![1])).unwrap();
        tx.send(SourceEvent::Chunk(vec![2])).unwrap();
        tx.send(SourceEvent::End).unwrap();
        // Anything after End is ignored.
        tx.send(SourceEvent::Chunk(vec![3])).unwrap();

        let mut source = ChannelSource::new(rx);
        assert_eq!(source.next_chunk().unwrap(), Some(vec![1]));
        assert_eq!(source.next_chunk().unwrap(), Some(vec![2]));
        assert_eq!(source.next_chunk().unwrap(), None);
        assert_eq!(source.next_chunk().unwrap(), None);
    }

    #[test]
    fn test_disconnect_is_end() {
        let (tx, rx) = unbounded::<SourceEvent>();
        drop(tx);

        let mut source = ChannelSource::new(rx);
        assert_eq!(source.next_chunk().unwrap(), None);
    }

    #[test]
    fn test_failure_is_transport_error() {
        let (tx, rx) = unbounded();
        tx.send(SourceEvent::Failed("reset".to_string())).unwrap();

        let mut source = ChannelSource::new(rx);
        let err = source.next_chunk().unwrap_err();
        assert!(matches!(err, StreamError::Transport { ref message } if message == "reset"));
        assert_eq!(source.next_chunk().unwrap(), None);
    }
}
