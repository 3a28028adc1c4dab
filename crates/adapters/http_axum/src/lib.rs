//! HTTP surface of the service.
//!
//! The endpoints keep the historical CGI shape of the device's on-board
//! API: GET requests under `/cgi-bin/` with query-string parameters, and
//! a `{"return","msg"}` JSON body on every reply with HTTP status 200, so
//! existing hub integrations keep working unmodified.

pub mod api;
pub mod response;
pub mod router;
pub mod state;

pub use router::create as create_router;
pub use state::AppState;
