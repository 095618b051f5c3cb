// Library exports for reuse by the CLI, the GUI and tests
pub mod config;
pub mod controller;
pub mod error;
pub mod gateway;
pub mod image_processing;
pub mod protocol;
pub mod shell;
pub mod utils;

// Re-export commonly used types
pub use config::ResizerConfig;
pub use controller::{Notification, NotificationLevel, Notifier, PresentationController, RequestSink, SelectedFile};
pub use error::{CodecError, ErrorKind, ResizeError, ValidationError};
pub use gateway::{GatewayHandle, RequestGateway, ServeStats};
pub use image_processing::{FastResizeCodec, ImageCodec, ResizeExecutor, ResizeJob};
pub use protocol::{Message, RequestId, ResizeDone, ResizeOutcome, ResizeRequest};
