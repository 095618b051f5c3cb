// Wiring between the window and the privileged side
// The gateway runs on its own thread with a single-threaded tokio runtime

use super::{ResizerApp, ToastQueue};
use image_resizer::{FastResizeCodec, GatewayHandle, RequestGateway, ResizeDone, ResizeRequest, ResizerConfig};
use std::sync::Arc;
use std::thread::JoinHandle;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

pub(crate) struct GatewayThread {
    pub requests: UnboundedSender<ResizeRequest>,
    pub outcomes: UnboundedReceiver<ResizeDone>,
    pub handle: GatewayHandle,
    pub thread: JoinHandle<()>,
}

pub(crate) fn spawn_gateway(config: &ResizerConfig) -> GatewayThread {
    let gateway = RequestGateway::new(config, Arc::new(FastResizeCodec));
    let handle = gateway.handle_for_shutdown();
    let (request_tx, request_rx) = unbounded_channel();
    let (done_tx, done_rx) = unbounded_channel();

    let thread = std::thread::spawn(move || {
        let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
            Ok(runtime) => runtime,
            Err(e) => {
                tracing::error!(error = %e, "failed to start resize runtime");
                return;
            }
        };
        let stats = runtime.block_on(gateway.serve(request_rx, done_tx));
        tracing::info!(?stats, "resize thread finished");
    });

    GatewayThread {
        requests: request_tx,
        outcomes: done_rx,
        handle,
        thread,
    }
}

impl ResizerApp {
    /// Hand every outcome that arrived since the last frame to the controller.
    /// Once the gateway thread is gone, nothing still pending will ever finish.
    pub fn check_outcomes(&mut self) {
        let mut outcomes = Vec::new();
        let stopped = loop {
            match self.outcomes.try_recv() {
                Ok(done) => outcomes.push(done),
                Err(TryRecvError::Empty) => break false,
                Err(TryRecvError::Disconnected) => break true,
            }
        };

        for done in outcomes {
            self.controller.on_resize_complete(done);
        }
        if stopped {
            self.controller.on_service_stopped();
        }
    }
}

impl ToastQueue {
    pub fn prune(&mut self) {
        self.0
            .retain(|toast| toast.shown_at.elapsed() < image_resizer::controller::NOTIFICATION_DURATION);
    }
}
