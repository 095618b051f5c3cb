//! Presentation-side logic: validates what the user picked and typed, sends
//! `image:resize` requests and turns `image:done` outcomes into notifications.
//!
//! The controller knows nothing about widgets. A front end feeds it events
//! and renders whatever lands in its [`Notifier`].

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;

use crate::error::{SendError, ValidationError};
use crate::image_processing::is_accepted_media_type;
use crate::protocol::{RequestId, ResizeDone, ResizeOutcome, ResizeRequest};

/// How long a front end should keep a notification on screen.
pub const NOTIFICATION_DURATION: Duration = Duration::from_millis(5000);

/// Where requests go. Sending is fire-and-forget.
pub trait RequestSink {
    fn send(&self, request: ResizeRequest) -> Result<(), SendError>;
}

impl RequestSink for UnboundedSender<ResizeRequest> {
    fn send(&self, request: ResizeRequest) -> Result<(), SendError> {
        UnboundedSender::send(self, request).map_err(|_| SendError)
    }
}

pub trait Notifier {
    fn notify(&mut self, notification: Notification);
}

impl Notifier for Vec<Notification> {
    fn notify(&mut self, notification: Notification) {
        self.push(notification);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub text: String,
}

impl Notification {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Success,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            text: text.into(),
        }
    }
}

/// A file chosen by the user, with the media type its picker declared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub path: PathBuf,
    pub name: String,
    pub media_type: Option<String>,
}

impl SelectedFile {
    /// Declare the media type from the file extension, as a browser file
    /// input would.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let media_type = image::ImageFormat::from_path(&path)
            .ok()
            .map(|format| format.to_mime_type().to_string());
        Self {
            path,
            name,
            media_type,
        }
    }
}

/// The editable width/height fields, kept as typed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResizeForm {
    pub width: String,
    pub height: String,
}

/// What the user asked for, remembered until the matching outcome arrives.
#[derive(Debug, Clone)]
struct PendingResize {
    file_name: String,
    width: String,
    height: String,
}

pub struct PresentationController<S, N> {
    sink: S,
    notifier: N,
    destination: PathBuf,
    selected: Option<SelectedFile>,
    form: ResizeForm,
    pending: HashMap<RequestId, PendingResize>,
}

impl<S: RequestSink, N: Notifier> PresentationController<S, N> {
    /// `destination` is only displayed; the privileged side decides where
    /// files are written.
    pub fn new(sink: S, notifier: N, destination: impl Into<PathBuf>) -> Self {
        Self {
            sink,
            notifier,
            destination: destination.into(),
            selected: None,
            form: ResizeForm::default(),
            pending: HashMap::new(),
        }
    }

    /// Accept a gif, jpeg or png and pre-fill the form with its natural size.
    pub fn on_file_selected(&mut self, file: SelectedFile) -> Result<(), ValidationError> {
        let accepted = file
            .media_type
            .as_deref()
            .is_some_and(is_accepted_media_type);
        if !accepted {
            let err = ValidationError::UnsupportedMediaType(file.media_type.clone());
            tracing::debug!(file = %file.name, media_type = ?file.media_type, "file rejected");
            self.selected = None;
            self.form = ResizeForm::default();
            self.notifier.notify(Notification::error(err.to_string()));
            return Err(err);
        }

        match image::image_dimensions(&file.path) {
            Ok((width, height)) => {
                self.form.width = width.to_string();
                self.form.height = height.to_string();
            }
            Err(e) => {
                tracing::warn!(file = %file.path.display(), error = %e, "could not read image size");
                self.form = ResizeForm::default();
            }
        }

        self.selected = Some(file);
        Ok(())
    }

    /// Validate locally and send one request. Returns the id of the request
    /// that was sent, or `None` if nothing left this side.
    pub fn on_submit(&mut self) -> Option<RequestId> {
        let file = match self.validate() {
            Ok(file) => file,
            Err(err) => {
                self.notifier.notify(Notification::error(err.to_string()));
                return None;
            }
        };

        let request_id = RequestId::new();
        let request = ResizeRequest::new(
            request_id,
            file.path.clone(),
            self.form.width.as_str(),
            self.form.height.as_str(),
        );
        let pending = PendingResize {
            file_name: file.name.clone(),
            width: self.form.width.clone(),
            height: self.form.height.clone(),
        };

        if let Err(err) = self.sink.send(request) {
            self.notifier.notify(Notification::error(err.to_string()));
            return None;
        }

        tracing::debug!(request_id = %request_id, file = %pending.file_name, "resize request sent");
        self.pending.insert(request_id, pending);
        Some(request_id)
    }

    /// Show the result of a request this controller sent. Outcomes for unknown
    /// or already-reported requests are ignored.
    pub fn on_resize_complete(&mut self, done: ResizeDone) -> bool {
        let Some(pending) = self.pending.remove(&done.request_id) else {
            tracing::debug!(request_id = %done.request_id, "outcome for unknown request ignored");
            return false;
        };

        let notification = match done.outcome {
            ResizeOutcome::Success { .. } => Notification::success(format!(
                "Image resized to {} x {}",
                pending.width, pending.height
            )),
            ResizeOutcome::Failure { message, .. } => {
                Notification::error(format!("Could not resize {}: {}", pending.file_name, message))
            }
        };
        self.notifier.notify(notification);
        true
    }

    /// The privileged side stopped and will answer nothing more. Every request
    /// still waiting is reported as failed and forgotten. Returns how many
    /// were dropped.
    pub fn on_service_stopped(&mut self) -> usize {
        let abandoned = self.pending.len();
        if abandoned > 0 {
            tracing::warn!(abandoned, "resize service stopped with requests outstanding");
        }
        for (_, pending) in self.pending.drain() {
            self.notifier.notify(Notification::error(format!(
                "Could not resize {}: {}",
                pending.file_name, SendError
            )));
        }
        abandoned
    }

    fn validate(&self) -> Result<SelectedFile, ValidationError> {
        let file = self.selected.clone().ok_or(ValidationError::NoFileSelected)?;
        if self.form.width.is_empty() || self.form.height.is_empty() {
            return Err(ValidationError::MissingDimensions);
        }
        Ok(file)
    }

    pub fn selected(&self) -> Option<&SelectedFile> {
        self.selected.as_ref()
    }

    pub fn form(&self) -> &ResizeForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut ResizeForm {
        &mut self.form
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn destination_display(&self) -> &Path {
        &self.destination
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn notifier_mut(&mut self) -> &mut N {
        &mut self.notifier
    }
}
