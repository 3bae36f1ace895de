//! Core project workspace operations

pub mod disk_image;
pub mod mount_point;
pub mod paths;
pub mod settings;
pub mod status;
pub mod store;
pub mod sync;

// Re-exports for library consumers
pub use disk_image::{Attachment, Detachment, DiskImageController};
pub use store::ConfigStore;
pub use sync::{RemoteProfile, SyncOrchestrator, SyncTarget};
