//! Messages exchanged between the presentation side and the privileged side.
//!
//! Two channels exist: `image:resize` (presentation → privileged) and
//! `image:done` (privileged → presentation). When the two halves live in
//! different processes every message is one JSON object per line.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Write;
use std::path::PathBuf;
use uuid::Uuid;

use crate::error::{ErrorKind, ResizeError};

/// Caller-generated identifier echoed back in the matching outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A width or height as typed by the user. Callers may send either a JSON
/// string or a JSON number; coercion happens on the privileged side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DimensionInput {
    Number(f64),
    Text(String),
}

impl DimensionInput {
    /// Coerce to a pixel count. Zero, negative, fractional and non-numeric
    /// values are rejected.
    pub fn to_pixels(&self, axis: &'static str) -> Result<u32, ResizeError> {
        let invalid = |reason: String| ResizeError::InvalidDimensions { axis, reason };

        let value = match self {
            Self::Number(n) => *n,
            Self::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return Err(invalid("value is empty".to_string()));
                }
                trimmed
                    .parse::<f64>()
                    .map_err(|_| invalid(format!("'{}' is not a number", s)))?
            }
        };

        if !value.is_finite() || value.fract() != 0.0 {
            return Err(invalid(format!("{} is not a whole number of pixels", value)));
        }
        if value <= 0.0 {
            return Err(invalid(format!("{} must be greater than zero", value)));
        }
        if value > u32::MAX as f64 {
            return Err(invalid(format!("{} is too large", value)));
        }

        Ok(value as u32)
    }
}

impl From<&str> for DimensionInput {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<u32> for DimensionInput {
    fn from(value: u32) -> Self {
        Self::Number(value as f64)
    }
}

/// The untrusted part of a request: what to resize and to which size.
/// There is deliberately no destination field.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeInput {
    pub source_path: PathBuf,
    pub width: DimensionInput,
    pub height: DimensionInput,
}

/// Payload of the `image:resize` channel.
///
/// Unknown fields (for example a caller-supplied `dest`) are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResizeRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<RequestId>,
    pub img_path: PathBuf,
    pub width: DimensionInput,
    pub height: DimensionInput,
}

impl ResizeRequest {
    pub fn new(
        request_id: RequestId,
        img_path: impl Into<PathBuf>,
        width: impl Into<DimensionInput>,
        height: impl Into<DimensionInput>,
    ) -> Self {
        Self {
            request_id: Some(request_id),
            img_path: img_path.into(),
            width: width.into(),
            height: height.into(),
        }
    }

    pub fn into_input(self) -> (Option<RequestId>, ResizeInput) {
        (
            self.request_id,
            ResizeInput {
                source_path: self.img_path,
                width: self.width,
                height: self.height,
            },
        )
    }
}

/// Result of one job, delivered over the same channel for success and failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum ResizeOutcome {
    #[serde(rename_all = "camelCase")]
    Success { output_path: PathBuf },
    Failure { kind: ErrorKind, message: String },
}

impl ResizeOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

impl From<&ResizeError> for ResizeOutcome {
    fn from(err: &ResizeError) -> Self {
        Self::Failure {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// Payload of the `image:done` channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResizeDone {
    pub request_id: RequestId,
    pub outcome: ResizeOutcome,
}

/// A message on the wire, tagged by channel name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "channel")]
pub enum Message {
    #[serde(rename = "image:resize")]
    Resize(ResizeRequest),
    #[serde(rename = "image:done")]
    Done(ResizeDone),
}

impl Message {
    /// Parse a single JSON line.
    pub fn parse_line(line: &str) -> serde_json::Result<Self> {
        serde_json::from_str(line.trim())
    }

    /// Write the message as one JSON line and flush.
    pub fn write_line<W: Write>(&self, writer: &mut W) -> anyhow::Result<()> {
        serde_json::to_writer(&mut *writer, self)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimension_coercion() {
        assert_eq!(DimensionInput::from("400").to_pixels("width").unwrap(), 400);
        assert_eq!(DimensionInput::from(" 300 ").to_pixels("height").unwrap(), 300);
        assert_eq!(DimensionInput::Number(64.0).to_pixels("width").unwrap(), 64);
        assert_eq!(DimensionInput::from("1e3").to_pixels("width").unwrap(), 1000);
    }

    #[test]
    fn test_dimension_rejects_invalid_values() {
        for raw in ["", "0", "-5", "12.5", "abc", "NaN", "inf", "99999999999"] {
            let err = DimensionInput::from(raw).to_pixels("width").unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidDimensions, "input {:?}", raw);
        }
        assert!(DimensionInput::Number(-1.0).to_pixels("height").is_err());
    }

    #[test]
    fn test_parse_baseline_resize_message() {
        let line = r#"{"channel":"image:resize","imgPath":"/tmp/photo.png","width":"400","height":300}"#;
        let message = Message::parse_line(line).unwrap();
        let Message::Resize(request) = message else {
            panic!("expected a resize message");
        };
        assert_eq!(request.request_id, None);
        assert_eq!(request.img_path, PathBuf::from("/tmp/photo.png"));
        assert_eq!(request.width, DimensionInput::Text("400".into()));
        assert_eq!(request.height, DimensionInput::Number(300.0));
    }

    #[test]
    fn test_caller_destination_is_dropped() {
        let line = r#"{"channel":"image:resize","imgPath":"/tmp/a.jpg","width":"1","height":"1","dest":"/etc"}"#;
        let Message::Resize(request) = Message::parse_line(line).unwrap() else {
            panic!("expected a resize message");
        };
        let (_, input) = request.into_input();
        assert_eq!(input.source_path, PathBuf::from("/tmp/a.jpg"));
        let echoed = serde_json::to_string(&Message::Resize(ResizeRequest::new(
            RequestId::new(),
            input.source_path,
            input.width,
            input.height,
        )))
        .unwrap();
        assert!(!echoed.contains("dest"));
    }

    #[test]
    fn test_done_message_shape() {
        let id = RequestId::new();
        let done = Message::Done(ResizeDone {
            request_id: id,
            outcome: ResizeOutcome::Failure {
                kind: ErrorKind::Codec,
                message: "bad data".into(),
            },
        });
        let json: serde_json::Value = serde_json::to_value(&done).unwrap();
        assert_eq!(json["channel"], "image:done");
        assert_eq!(json["requestId"], id.to_string());
        assert_eq!(json["outcome"]["status"], "failure");
        assert_eq!(json["outcome"]["kind"], "codec");

        let mut buffer = Vec::new();
        done.write_line(&mut buffer).unwrap();
        assert!(buffer.ends_with(b"\n"));
        let parsed = Message::parse_line(std::str::from_utf8(&buffer).unwrap()).unwrap();
        assert_eq!(parsed, done);
    }

    #[test]
    fn test_success_outcome_field_names() {
        let outcome = ResizeOutcome::Success {
            output_path: PathBuf::from("/home/me/imageresizer/a.png"),
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["outputPath"], "/home/me/imageresizer/a.png");
    }
}
