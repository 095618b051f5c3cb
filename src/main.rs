use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::unbounded_channel;

mod cli;

use cli::{Args, Command};
use image_resizer::controller::{Notification, NotificationLevel, Notifier};
use image_resizer::utils::{error_println, format_duration, init_logging, success_println, verbose_println};
use image_resizer::{
    FastResizeCodec, Message, PresentationController, RequestGateway, ResizerConfig, SelectedFile,
};

/// Prints notifications the way the GUI would toast them.
struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&mut self, notification: Notification) {
        match notification.level {
            NotificationLevel::Success => success_println(&notification.text),
            NotificationLevel::Error => error_println(&notification.text),
        }
    }
}

/// Controller and gateway in one process, wired with in-memory channels.
async fn run_resize(
    config: ResizerConfig,
    input: PathBuf,
    width: Option<String>,
    height: Option<String>,
    verbose: bool,
) -> Result<ExitCode> {
    let start_time = Instant::now();
    let gateway = RequestGateway::new(&config, Arc::new(FastResizeCodec));
    let handle = gateway.handle_for_shutdown();

    let (request_tx, request_rx) = unbounded_channel();
    let (done_tx, mut done_rx) = unbounded_channel();
    let mut controller = PresentationController::new(request_tx, ConsoleNotifier, gateway.destination_dir());

    if controller.on_file_selected(SelectedFile::from_path(&input)).is_err() {
        return Ok(ExitCode::FAILURE);
    }
    if let Some(width) = width {
        controller.form_mut().width = width;
    }
    if let Some(height) = height {
        controller.form_mut().height = height;
    }

    verbose_println(
        verbose,
        &format!(
            "Resizing {} to {} x {} into {}",
            input.display(),
            controller.form().width,
            controller.form().height,
            controller.destination_display().display()
        ),
    );

    if controller.on_submit().is_none() {
        return Ok(ExitCode::FAILURE);
    }

    let wait_for_outcome = async {
        let done = done_rx.recv().await;
        handle.shutdown();
        done
    };
    let (_, done) = tokio::join!(gateway.serve(request_rx, done_tx), wait_for_outcome);
    let done = done.context("resize service stopped without reporting an outcome")?;

    let succeeded = done.outcome.is_success();
    controller.on_resize_complete(done);
    verbose_println(
        verbose,
        &format!("Finished in {}", format_duration(start_time.elapsed())),
    );

    Ok(if succeeded {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Privileged side as a separate process: JSON lines in, JSON lines out.
async fn run_serve(config: ResizerConfig) -> Result<ExitCode> {
    let gateway = RequestGateway::new(&config, Arc::new(FastResizeCodec));
    tracing::info!(destination = %gateway.destination_dir().display(), "serving resize requests on stdin");

    let (request_tx, request_rx) = unbounded_channel();
    let (done_tx, mut done_rx) = unbounded_channel();

    let reader = async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) if line.trim().is_empty() => continue,
                Ok(Some(line)) => match Message::parse_line(&line) {
                    Ok(Message::Resize(request)) => {
                        if request_tx.send(request).is_err() {
                            break;
                        }
                    }
                    Ok(Message::Done(_)) => {
                        tracing::warn!("ignoring image:done sent to the privileged side")
                    }
                    Err(e) => tracing::warn!(error = %e, "skipping malformed message"),
                },
                Ok(None) => break,
                Err(e) => {
                    tracing::error!(error = %e, "failed to read stdin");
                    break;
                }
            }
        }
    };

    let writer = async {
        while let Some(done) = done_rx.recv().await {
            Message::Done(done)
                .write_line(&mut std::io::stdout().lock())
                .context("Failed to write outcome to stdout")?;
        }
        Ok::<_, anyhow::Error>(())
    };

    let work = async { tokio::join!(gateway.serve(request_rx, done_tx), reader, writer) };

    tokio::select! {
        (stats, (), written) = work => {
            written?;
            tracing::info!(
                accepted = stats.accepted,
                succeeded = stats.succeeded,
                failed = stats.failed,
                "input closed, all jobs finished"
            );
            Ok(ExitCode::SUCCESS)
        }
        _ = tokio::signal::ctrl_c() => {
            // Dropping the serve future aborts every outstanding job.
            tracing::warn!("interrupted, abandoning outstanding jobs");
            Ok(ExitCode::from(130))
        }
    }
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();
    init_logging(args.verbose)?;
    let config = args.resizer_config()?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    let result = match args.command {
        Command::Resize {
            input,
            width,
            height,
        } => {
            println!("{}", style("Image Resizer").bold().blue());
            println!();
            runtime.block_on(run_resize(config, input, width, height, args.verbose))
        }
        Command::Serve => runtime.block_on(run_serve(config)),
    };

    // stdin reads cannot be cancelled; do not wait for them on the way out.
    runtime.shutdown_timeout(Duration::from_millis(500));
    result
}
