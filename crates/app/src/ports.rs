//! Port definitions — traits that adapters implement.
//!
//! Ports are the boundaries between the application core and the outside
//! world. They are defined here (in `app`) so that both the use-case layer
//! and the adapter layer can depend on them without creating circular
//! dependencies.

pub mod hardware;
pub mod notify;
pub mod recordings;
pub mod state_store;

pub use hardware::HardwareGateway;
pub use notify::NotificationSink;
pub use recordings::RecordingStore;
pub use state_store::{StateStore, StoreError};
