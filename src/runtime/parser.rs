//! Extraction of the framed terminal event from captured stdout.
//!
//! The child may print arbitrary program output before the event, so the
//! scan looks for the *last* line that is exactly one of the markers and
//! decodes the first JSON value that follows it.

use crate::protocol::{CompletePayload, ErrorPayload, Marker, PausePayload, TerminalEvent};
use crate::{DebuggerError, Result};
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use tracing::warn;

/// Located frame: which marker, where it starts, and the text after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame<'a> {
    pub marker: Marker,
    /// Byte offset of the marker line within stdout.
    pub offset: usize,
    pub payload: &'a str,
}

impl Frame<'_> {
    pub fn decode(&self) -> Result<TerminalEvent> {
        let value = first_json_value(self.marker, self.payload)?;
        Ok(match self.marker {
            Marker::Pause => TerminalEvent::Pause(decode_payload::<PausePayload>(self.marker, value)?),
            Marker::Complete => {
                TerminalEvent::Complete(decode_payload::<CompletePayload>(self.marker, value)?)
            }
            Marker::Error => TerminalEvent::Error(decode_payload::<ErrorPayload>(self.marker, value)?),
        })
    }
}

/// Find the last marker line in `stdout`.
pub fn find_frame(stdout: &str) -> Option<Frame<'_>> {
    let mut found = None;
    let mut offset = 0;
    for line in stdout.split_inclusive('\n') {
        if let Some(marker) = Marker::from_line(line) {
            found = Some(Frame {
                marker,
                offset,
                payload: &stdout[offset + line.len()..],
            });
        }
        offset += line.len();
    }
    found
}

/// Program output printed before the frame (the separator newline the
/// runtime adds in front of the marker is dropped).
pub fn program_output<'a>(stdout: &'a str, frame: &Frame<'_>) -> &'a str {
    let before = &stdout[..frame.offset];
    before.strip_suffix('\n').unwrap_or(before)
}

/// Decode the terminal event, `Ok(None)` when no marker was printed.
pub fn parse_event(stdout: &str) -> Result<Option<TerminalEvent>> {
    find_frame(stdout).map(|frame| frame.decode()).transpose()
}

fn first_json_value(marker: Marker, payload: &str) -> Result<JsonValue> {
    let mut values = serde_json::Deserializer::from_str(payload).into_iter::<JsonValue>();
    match values.next() {
        Some(Ok(value)) => Ok(value),
        Some(Err(e)) => {
            warn!(marker = %marker, "Terminal event payload is not valid JSON: {}", e);
            Err(DebuggerError::ProtocolParse {
                marker: marker.as_str(),
                reason: format!("invalid JSON: {}", e),
            })
        }
        None => Err(DebuggerError::ProtocolParse {
            marker: marker.as_str(),
            reason: "marker is not followed by a payload".to_string(),
        }),
    }
}

fn decode_payload<T: DeserializeOwned>(marker: Marker, value: JsonValue) -> Result<T> {
    serde_path_to_error::deserialize(value).map_err(|e| {
        let path = e.path().to_string();
        warn!(marker = %marker, path = %path, "Terminal event payload has unexpected shape");
        DebuggerError::ProtocolParse {
            marker: marker.as_str(),
            reason: format!("{} (at {})", e.into_inner(), path),
        }
    })
}
