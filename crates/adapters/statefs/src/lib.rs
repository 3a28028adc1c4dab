//! Flat-file persistence adapters.
//!
//! Both stores rely on same-directory `rename` for atomic replacement, so
//! a crash mid-write can never tear a published file.

pub mod recordings;
pub mod state;

pub use recordings::FsRecordingStore;
pub use state::FsStateStore;
