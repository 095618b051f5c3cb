pub mod codec;
pub mod executor;

pub use codec::{FastResizeCodec, ImageCodec};
pub use executor::{JobState, ResizeExecutor, ResizeJob};

/// Media types the presentation side lets through.
pub const ACCEPTED_MEDIA_TYPES: [&str; 3] = ["image/gif", "image/jpeg", "image/png"];

pub fn is_accepted_media_type(media_type: &str) -> bool {
    ACCEPTED_MEDIA_TYPES.contains(&media_type)
}
