//! Domain entity definitions.

mod resource;

pub use resource::{ImagePoll, ResourceKind, SharedImage, SharedText, TextPoll};
