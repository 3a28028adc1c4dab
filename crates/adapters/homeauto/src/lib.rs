//! Outbound notification adapter for home-automation hubs.
//!
//! Each supported platform (Vera, Eedomus, Zibase, Calaos) has its own URL
//! scheme and credential placement; [`url_builder`] holds that table as a
//! pure function, [`notifier::HttpNotifier`] performs the actual bounded
//! HTTP call behind the `NotificationSink` port.

pub mod notifier;
pub mod url_builder;

pub use notifier::HttpNotifier;
pub use url_builder::build_url;
