//! Event parsing: JSON envelope → decoded audio payload.

use crate::defaults;
use crate::error::{Result, StreamError};
use crate::pipeline::error::StationError;
use crate::pipeline::station::Station;
use crate::pipeline::types::LogicalRecord;
use base64::{Engine as _, engine::general_purpose};
use serde::Deserialize;
use serde_json::Value;

/// Wire shape of one event record.
///
/// Only the discriminator and the audio payload are read; any other fields
/// (message ids, task ids, timestamps) are ignored. `audio` is kept untyped
/// because only audio events are required to carry it as a string.
#[derive(Debug, Deserialize)]
struct EventEnvelope {
    event: String,
    #[serde(default)]
    audio: Option<Value>,
}

/// Outcome of parsing one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedEvent {
    /// Audio-bearing event with its decoded payload.
    Audio(Vec<u8>),
    /// Well-formed event of another kind.
    Other { kind: String },
}

/// Parses event records and decodes audio payloads.
#[derive(Debug, Clone)]
pub struct EventParser {
    audio_event: String,
}

impl Default for EventParser {
    fn default() -> Self {
        Self::new()
    }
}

impl EventParser {
    /// Creates a parser recognizing `tts_message` as the audio event.
    pub fn new() -> Self {
        Self::with_audio_event(defaults::AUDIO_EVENT)
    }

    pub fn with_audio_event(audio_event: impl Into<String>) -> Self {
        Self {
            audio_event: audio_event.into(),
        }
    }

    pub fn audio_event(&self) -> &str {
        &self.audio_event
    }

    /// Parses one record.
    ///
    /// Fails with `RecordParse` when the record is not a JSON object with a
    /// string `event` field (or lacks `audio` on an audio event), and with
    /// `PayloadDecode` when `audio` is not valid base64.
    pub fn parse(&self, record: &LogicalRecord) -> Result<ParsedEvent> {
        let envelope: EventEnvelope =
            serde_json::from_str(record.as_str()).map_err(|e| StreamError::RecordParse {
                message: e.to_string(),
                record: record.text.clone(),
            })?;

        if envelope.event != self.audio_event {
            return Ok(ParsedEvent::Other {
                kind: envelope.event,
            });
        }

        let audio = match envelope.audio {
            Some(Value::String(audio)) => audio,
            Some(_) => {
                return Err(StreamError::RecordParse {
                    message: format!("`{}` field is not a string", defaults::AUDIO_FIELD),
                    record: record.text.clone(),
                });
            }
            None => {
                return Err(StreamError::RecordParse {
                    message: format!(
                        "{} event without `{}` field",
                        self.audio_event,
                        defaults::AUDIO_FIELD
                    ),
                    record: record.text.clone(),
                });
            }
        };

        let bytes = general_purpose::STANDARD
            .decode(audio.as_bytes())
            .map_err(|e| StreamError::PayloadDecode {
                message: e.to_string(),
            })?;

        Ok(ParsedEvent::Audio(bytes))
    }
}

impl Station for EventParser {
    type Input = LogicalRecord;
    type Output = ParsedEvent;

    fn process(
        &mut self,
        record: LogicalRecord,
    ) -> std::result::Result<Option<ParsedEvent>, StationError> {
        self.parse(&record)
            .map(Some)
            .map_err(|e| StationError::Recoverable(format!("{e}: {}", record.text)))
    }

    fn name(&self) -> &'static str {
        "event-parser"
    }
}
