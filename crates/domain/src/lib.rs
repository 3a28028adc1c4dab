//! # karotz-domain
//!
//! Pure domain model for the karotzd device-control backend.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define **Actions** (hardware-affecting operations: LED, ears, sound, RFID)
//!   and their **exclusion groups**
//! - Define **Markers** (records that an action is currently in progress)
//! - Define **RFID sessions** (tag-bound record/playback state)
//! - Define **Home-automation targets** and **notification events**
//! - Contain all invariant enforcement and domain logic
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod action;
pub mod command;
pub mod error;
pub mod id;
pub mod notify;
pub mod rfid;
pub mod snapshot;
pub mod time;
