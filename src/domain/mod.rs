//! Domain layer with core entities and port definitions.

/// Entity definitions.
pub mod entities;
/// Port definitions.
pub mod ports;

pub use entities::{ImagePoll, ResourceKind, TextPoll};
pub use ports::{FetchError, FetchPort, FetchResult};
