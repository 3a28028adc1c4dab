//! Route table.

use axum::Router;
use axum::routing::get;
use tower_http::trace::TraceLayer;

use karotz_app::ports::{HardwareGateway, NotificationSink, RecordingStore, StateStore};

use crate::api;
use crate::state::AppState;

/// Build the service router over a wired [`AppState`].
pub fn create<H, S, R, N>(state: AppState<H, S, R, N>) -> Router
where
    H: HardwareGateway + 'static,
    S: StateStore + 'static,
    R: RecordingStore + 'static,
    N: NotificationSink + 'static,
{
    Router::new()
        .route("/health", get(api::health))
        .route("/cgi-bin/leds", get(api::device::leds))
        .route("/cgi-bin/ears", get(api::device::ears))
        .route("/cgi-bin/sound", get(api::device::sound))
        .route("/cgi-bin/sound_control", get(api::device::sound_control))
        .route("/cgi-bin/rfid_start_record", get(api::rfid::start_record))
        .route("/cgi-bin/rfid_stop_record", get(api::rfid::stop_record))
        .route("/cgi-bin/rfid_play", get(api::rfid::play))
        .route("/cgi-bin/rfid_stop_play", get(api::rfid::stop_play))
        .route("/cgi-bin/status", get(api::status::status))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
