//! Privileged-side entry point for `image:resize` messages.
//!
//! The gateway turns untrusted requests into [`ResizeJob`]s, attaching the
//! destination directory it was configured with, and runs every job as an
//! independent task. It never waits for one job before accepting the next.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::sync::Notify;
use tokio::task::{JoinError, JoinSet};

use crate::config::ResizerConfig;
use crate::image_processing::{ImageCodec, JobState, ResizeExecutor, ResizeJob};
use crate::protocol::{RequestId, ResizeDone, ResizeRequest};
use crate::shell::{NoReveal, OpenReveal, ShellReveal};

pub struct RequestGateway {
    destination_dir: PathBuf,
    executor: Arc<ResizeExecutor>,
    shutdown: Arc<Notify>,
}

/// Cancels every outstanding job of a running [`RequestGateway::serve`] loop.
#[derive(Debug, Clone)]
pub struct GatewayHandle {
    shutdown: Arc<Notify>,
}

impl GatewayHandle {
    pub fn shutdown(&self) {
        self.shutdown.notify_one();
    }
}

/// Counters returned when the serve loop ends.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ServeStats {
    pub accepted: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub aborted: usize,
}

impl RequestGateway {
    /// Build a gateway with the configured reveal behavior and timeout.
    pub fn new(config: &ResizerConfig, codec: Arc<dyn ImageCodec>) -> Self {
        let reveal: Arc<dyn ShellReveal> = if config.reveal_output {
            Arc::new(OpenReveal)
        } else {
            Arc::new(NoReveal)
        };
        let executor = ResizeExecutor::new(codec, reveal).with_timeout(config.job_timeout);
        Self::with_executor(config.destination_dir.clone(), executor)
    }

    pub fn with_executor(destination_dir: impl Into<PathBuf>, executor: ResizeExecutor) -> Self {
        Self {
            destination_dir: destination_dir.into(),
            executor: Arc::new(executor),
            shutdown: Arc::new(Notify::new()),
        }
    }

    pub fn destination_dir(&self) -> &Path {
        &self.destination_dir
    }

    pub fn handle_for_shutdown(&self) -> GatewayHandle {
        GatewayHandle {
            shutdown: Arc::clone(&self.shutdown),
        }
    }

    /// Build the privileged job for one request. Whatever location the caller
    /// had in mind, output goes to the configured destination.
    pub fn handle(&self, request: ResizeRequest) -> ResizeJob {
        let (request_id, input) = request.into_input();
        let request_id = request_id.unwrap_or_else(|| {
            let generated = RequestId::new();
            tracing::warn!(request_id = %generated, "request without id, generated one");
            generated
        });

        tracing::info!(
            request_id = %request_id,
            source = %input.source_path.display(),
            "resize request accepted"
        );

        ResizeJob {
            request_id,
            source_path: input.source_path,
            width: input.width,
            height: input.height,
            destination_dir: self.destination_dir.clone(),
        }
    }

    /// Receive requests until `inbox` closes, then wait for running jobs.
    /// A shutdown through [`GatewayHandle`] aborts running jobs instead; those
    /// produce no outcome.
    pub async fn serve(
        &self,
        mut inbox: UnboundedReceiver<ResizeRequest>,
        outbox: UnboundedSender<ResizeDone>,
    ) -> ServeStats {
        let mut stats = ServeStats::default();
        let mut jobs: JoinSet<JobState> = JoinSet::new();
        let mut inbox_open = true;

        loop {
            if !inbox_open && jobs.is_empty() {
                break;
            }

            tokio::select! {
                biased;

                _ = self.shutdown.notified() => {
                    tracing::info!(outstanding = jobs.len(), "shutting down, aborting outstanding jobs");
                    jobs.abort_all();
                    while let Some(joined) = jobs.join_next().await {
                        record(&mut stats, joined);
                    }
                    break;
                }

                Some(joined) = jobs.join_next(), if !jobs.is_empty() => {
                    record(&mut stats, joined);
                }

                message = inbox.recv(), if inbox_open => match message {
                    Some(request) => {
                        let job = self.handle(request);
                        let executor = Arc::clone(&self.executor);
                        let outbox = outbox.clone();
                        stats.accepted += 1;
                        jobs.spawn(async move { executor.process(job, &outbox).await });
                    }
                    None => {
                        tracing::debug!(outstanding = jobs.len(), "request channel closed, draining");
                        inbox_open = false;
                    }
                },
            }
        }

        tracing::debug!(?stats, "gateway stopped");
        stats
    }
}

fn record(stats: &mut ServeStats, joined: Result<JobState, JoinError>) {
    match joined {
        Ok(JobState::Done) => stats.succeeded += 1,
        Ok(_) => stats.failed += 1,
        Err(e) if e.is_cancelled() => stats.aborted += 1,
        Err(e) => {
            tracing::error!(error = %e, "resize task panicked");
            stats.failed += 1;
        }
    }
}
