use eframe::egui;
use image_resizer::controller::{Notification, NotificationLevel, Notifier};
use image_resizer::{GatewayHandle, PresentationController, ResizeDone, ResizeRequest, ResizerConfig, SelectedFile};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

#[path = "app_processing.rs"]
mod app_processing;

pub(crate) struct Toast {
    notification: Notification,
    shown_at: Instant,
}

/// Notifications currently on screen, oldest first
#[derive(Default)]
pub(crate) struct ToastQueue(Vec<Toast>);

impl Notifier for ToastQueue {
    fn notify(&mut self, notification: Notification) {
        self.0.push(Toast {
            notification,
            shown_at: Instant::now(),
        });
    }
}

pub struct ResizerApp {
    controller: PresentationController<UnboundedSender<ResizeRequest>, ToastQueue>,
    outcomes: UnboundedReceiver<ResizeDone>,
    gateway_handle: GatewayHandle,
    gateway_thread: Option<JoinHandle<()>>,
    show_about: bool,
}

impl ResizerApp {
    pub fn new(_cc: &eframe::CreationContext<'_>, config: ResizerConfig) -> Self {
        let gateway = app_processing::spawn_gateway(&config);
        Self {
            controller: PresentationController::new(
                gateway.requests,
                ToastQueue::default(),
                config.destination_dir,
            ),
            outcomes: gateway.outcomes,
            gateway_handle: gateway.handle,
            gateway_thread: Some(gateway.thread),
            show_about: false,
        }
    }

    fn render_file_selection(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if ui.button("Select Image...").clicked() {
                if let Some(path) = rfd::FileDialog::new()
                    .add_filter("Images", &["gif", "jpg", "jpeg", "png"])
                    .pick_file()
                {
                    let _ = self.controller.on_file_selected(SelectedFile::from_path(path));
                }
            }
            match self.controller.selected() {
                Some(file) => ui.label(&file.name),
                None => ui.weak("No image selected"),
            };
        });
        ui.add_space(10.0);
    }

    fn render_form(&mut self, ui: &mut egui::Ui) {
        if self.controller.selected().is_none() {
            return;
        }

        egui::Grid::new("dimensions").num_columns(2).show(ui, |ui| {
            ui.label("Width:");
            ui.text_edit_singleline(&mut self.controller.form_mut().width);
            ui.end_row();

            ui.label("Height:");
            ui.text_edit_singleline(&mut self.controller.form_mut().height);
            ui.end_row();
        });

        ui.add_space(10.0);
        let button = egui::Button::new("Resize").min_size(egui::vec2(200.0, 40.0));
        if ui.add(button).clicked() {
            self.controller.on_submit();
        }

        ui.add_space(10.0);
        ui.horizontal(|ui| {
            ui.label("Output:");
            ui.monospace(self.controller.destination_display().display().to_string());
        });
    }

    fn render_toasts(&mut self, ui: &mut egui::Ui) {
        let toasts = &self.controller.notifier().0;
        if toasts.is_empty() {
            return;
        }

        ui.separator();
        for toast in toasts {
            let color = match toast.notification.level {
                NotificationLevel::Success => egui::Color32::from_rgb(0, 128, 0),
                NotificationLevel::Error => egui::Color32::RED,
            };
            ui.colored_label(color, &toast.notification.text);
        }
    }

    fn render_about(&mut self, ui: &mut egui::Ui) {
        ui.add_space(20.0);
        ui.checkbox(&mut self.show_about, "About");
        if self.show_about {
            ui.label(format!("Image Resizer {}", env!("CARGO_PKG_VERSION")));
            ui.label("Resize gif, jpeg and png images to exact dimensions.");
        }
    }
}

impl eframe::App for ResizerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Check for outcomes from the background thread
        self.check_outcomes();
        self.controller.notifier_mut().prune();

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Image Resizer");
            ui.label("Choose an image to resize");
            ui.add_space(20.0);

            self.render_file_selection(ui);
            self.render_form(ui);
            self.render_toasts(ui);
            self.render_about(ui);
        });

        // Keep polling while work is outstanding or toasts need to expire
        if self.controller.pending_count() > 0 || !self.controller.notifier().0.is_empty() {
            ctx.request_repaint_after(Duration::from_millis(100));
        }
    }
}

impl Drop for ResizerApp {
    fn drop(&mut self) {
        // Window closed: abandon anything still running
        self.gateway_handle.shutdown();
        if let Some(thread) = self.gateway_thread.take() {
            let _ = thread.join();
        }
    }
}
