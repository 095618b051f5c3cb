use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::UnboundedSender;

use super::codec::ImageCodec;
use crate::error::{CodecError, ResizeError};
use crate::protocol::{DimensionInput, RequestId, ResizeDone, ResizeOutcome};
use crate::shell::ShellReveal;
use crate::utils::format_duration;

/// A resize job as accepted by the privileged side. Only the gateway builds
/// these; the destination is never taken from the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeJob {
    pub request_id: RequestId,
    pub source_path: PathBuf,
    pub width: DimensionInput,
    pub height: DimensionInput,
    pub destination_dir: PathBuf,
}

/// Lifecycle of one job. Jobs only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Pending,
    Reading,
    Resizing,
    Writing,
    Done,
    Failed,
}

/// Runs resize jobs: read, resize, write, signal, reveal.
#[derive(Clone)]
pub struct ResizeExecutor {
    codec: Arc<dyn ImageCodec>,
    reveal: Arc<dyn ShellReveal>,
    timeout: Option<Duration>,
}

impl ResizeExecutor {
    pub fn new(codec: Arc<dyn ImageCodec>, reveal: Arc<dyn ShellReveal>) -> Self {
        Self {
            codec,
            reveal,
            timeout: None,
        }
    }

    /// Bound every job by `timeout`. `None` lets jobs run indefinitely.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Steps 1-6 of a job. Returns the path of the written file.
    pub async fn run(&self, job: &ResizeJob) -> Result<PathBuf, ResizeError> {
        let resized = self.read_and_resize(job).await?;
        self.write_output(job, &resized).await
    }

    /// Read the source, validate the target size and run the codec.
    async fn read_and_resize(&self, job: &ResizeJob) -> Result<Vec<u8>, ResizeError> {
        let id = job.request_id;
        transition(id, JobState::Pending, JobState::Reading);

        let bytes = tokio::fs::read(&job.source_path)
            .await
            .map_err(|source| ResizeError::SourceRead {
                path: job.source_path.clone(),
                source,
            })?;

        let width = job.width.to_pixels("width")?;
        let height = job.height.to_pixels("height")?;

        transition(id, JobState::Reading, JobState::Resizing);
        tracing::debug!(request_id = %id, bytes = bytes.len(), width, height, "invoking codec");

        let codec = Arc::clone(&self.codec);
        let resized = tokio::task::spawn_blocking(move || codec.resize(&bytes, width, height))
            .await
            .map_err(|e| CodecError::Worker(e.to_string()))??;
        Ok(resized)
    }

    /// Create the destination if needed and write `resized` under the
    /// source's file name.
    async fn write_output(&self, job: &ResizeJob, resized: &[u8]) -> Result<PathBuf, ResizeError> {
        let id = job.request_id;
        transition(id, JobState::Resizing, JobState::Writing);

        let file_name = job.source_path.file_name().ok_or_else(|| ResizeError::SourceRead {
            path: job.source_path.clone(),
            source: std::io::Error::new(IoErrorKind::InvalidInput, "path has no file name"),
        })?;

        ensure_directory(&job.destination_dir).await?;

        let output_path = job.destination_dir.join(file_name);
        if tokio::fs::try_exists(&output_path).await.unwrap_or(false) {
            tracing::debug!(request_id = %id, path = %output_path.display(), "overwriting existing file");
        }
        tokio::fs::write(&output_path, resized)
            .await
            .map_err(|source| ResizeError::Write {
                path: output_path.clone(),
                source,
            })?;

        Ok(output_path)
    }

    /// Run a job to completion and report it. Exactly one [`ResizeDone`] is
    /// sent per call, success or failure. The folder is revealed only after a
    /// successful write.
    pub async fn process(&self, job: ResizeJob, outbox: &UnboundedSender<ResizeDone>) -> JobState {
        let started = Instant::now();

        // The timeout covers reading and resizing only. A codec call that is
        // still running when it fires finishes on the blocking pool and its
        // result is dropped; nothing is written for a timed-out job.
        let resized = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, self.read_and_resize(&job))
                .await
                .unwrap_or(Err(ResizeError::Timeout(limit))),
            None => self.read_and_resize(&job).await,
        };
        let result = match resized {
            Ok(bytes) => self.write_output(&job, &bytes).await,
            Err(err) => Err(err),
        };

        let (outcome, state) = match &result {
            Ok(output_path) => {
                tracing::info!(
                    request_id = %job.request_id,
                    output = %output_path.display(),
                    elapsed = %format_duration(started.elapsed()),
                    "image resized"
                );
                (
                    ResizeOutcome::Success {
                        output_path: output_path.clone(),
                    },
                    JobState::Done,
                )
            }
            Err(err) => {
                tracing::error!(
                    request_id = %job.request_id,
                    source = %job.source_path.display(),
                    kind = ?err.kind(),
                    error = %err,
                    "resize failed"
                );
                (ResizeOutcome::from(err), JobState::Failed)
            }
        };

        if outbox
            .send(ResizeDone {
                request_id: job.request_id,
                outcome,
            })
            .is_err()
        {
            tracing::warn!(request_id = %job.request_id, "presentation side is gone, outcome dropped");
        }

        if state == JobState::Done {
            if let Err(err) = self.reveal.reveal(&job.destination_dir) {
                tracing::warn!(request_id = %job.request_id, error = %err, "could not open output folder");
            }
        }

        state
    }
}

fn transition(id: RequestId, from: JobState, to: JobState) {
    tracing::trace!(request_id = %id, ?from, ?to, "job state");
}

/// Create `dir` if it is missing. Only the last segment is created; a missing
/// parent is an error. Losing a creation race to another job is fine.
async fn ensure_directory(dir: &Path) -> Result<(), ResizeError> {
    if is_directory(dir).await {
        return Ok(());
    }

    match tokio::fs::create_dir(dir).await {
        Ok(()) => {
            tracing::info!(path = %dir.display(), "created output directory");
            Ok(())
        }
        Err(source) => {
            if source.kind() == IoErrorKind::AlreadyExists && is_directory(dir).await {
                return Ok(());
            }
            Err(ResizeError::DirectoryCreate {
                path: dir.to_path_buf(),
                source,
            })
        }
    }
}

async fn is_directory(path: &Path) -> bool {
    tokio::fs::metadata(path).await.map(|m| m.is_dir()).unwrap_or(false)
}
