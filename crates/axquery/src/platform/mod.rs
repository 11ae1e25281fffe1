/*! Platform Abstraction Layer */

mod traits;
pub use traits::{NodeService, NotificationCallback};

// In-memory tree (all platforms)
pub mod memory;

#[cfg(target_os = "macos")]
pub mod macos;
