//! Error types for the resize pipeline.
//!
//! Every executor failure maps to an [`ErrorKind`] that travels back to the
//! presentation side inside a failure outcome.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Failures raised by an [`ImageCodec`](crate::image_processing::ImageCodec).
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("unrecognized image data: {0}")]
    UnknownFormat(#[source] image::ImageError),

    #[error("failed to decode image: {0}")]
    Decode(#[source] image::ImageError),

    #[error("failed to resize image: {0}")]
    Resize(String),

    #[error("failed to encode image: {0}")]
    Encode(#[source] image::ImageError),

    #[error("codec worker stopped unexpectedly: {0}")]
    Worker(String),
}

/// Failures of a single resize job.
#[derive(Debug, Error)]
pub enum ResizeError {
    #[error("failed to read source image {}: {source}", .path.display())]
    SourceRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid {axis}: {reason}")]
    InvalidDimensions { axis: &'static str, reason: String },

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error("failed to create output directory {}: {source}", .path.display())]
    DirectoryCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("resize did not finish within {0:?}")]
    Timeout(Duration),
}

impl ResizeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::SourceRead { .. } => ErrorKind::SourceRead,
            Self::InvalidDimensions { .. } => ErrorKind::InvalidDimensions,
            Self::Codec(_) => ErrorKind::Codec,
            Self::DirectoryCreate { .. } => ErrorKind::DirectoryCreate,
            Self::Write { .. } => ErrorKind::Write,
            Self::Timeout(_) => ErrorKind::Timeout,
        }
    }
}

/// Wire-level classification of a failed job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    SourceRead,
    InvalidDimensions,
    Codec,
    DirectoryCreate,
    Write,
    Timeout,
}

/// Opening the output folder failed. Never fails a job.
#[derive(Debug, Error)]
#[error("failed to reveal {}: {source}", .path.display())]
pub struct ShellRevealError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

/// Input rejected by the presentation side before anything is sent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please select an image file")]
    UnsupportedMediaType(Option<String>),

    #[error("Please upload an image file")]
    NoFileSelected,

    #[error("Please enter both width and height")]
    MissingDimensions,
}

/// The privileged side is no longer listening.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("resize service is not running")]
pub struct SendError;
