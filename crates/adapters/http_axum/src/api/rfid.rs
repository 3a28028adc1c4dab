//! RFID record/playback endpoints.

use axum::extract::{Query, State};
use serde::Deserialize;

use karotz_app::ports::{HardwareGateway, NotificationSink, RecordingStore, StateStore};
use karotz_domain::error::ValidationError;
use karotz_domain::rfid::TagId;

use crate::response::CommandResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct TagParams {
    tag: Option<String>,
}

fn parse_tag(params: &TagParams) -> Result<TagId, ValidationError> {
    let tag = params
        .tag
        .as_deref()
        .ok_or(ValidationError::MissingParameter("tag"))?;
    TagId::parse(tag)
}

/// `GET /cgi-bin/rfid_start_record?tag=<id>`
pub async fn start_record<H, S, R, N>(
    State(state): State<AppState<H, S, R, N>>,
    Query(params): Query<TagParams>,
) -> CommandResponse
where
    H: HardwareGateway + 'static,
    S: StateStore + 'static,
    R: RecordingStore + 'static,
    N: NotificationSink + 'static,
{
    match parse_tag(&params) {
        Ok(tag) => state.rfid.start_recording(tag).await.into(),
        Err(err) => CommandResponse::error(err.to_string()),
    }
}

/// `GET /cgi-bin/rfid_stop_record?tag=<id>`
pub async fn stop_record<H, S, R, N>(
    State(state): State<AppState<H, S, R, N>>,
    Query(params): Query<TagParams>,
) -> CommandResponse
where
    H: HardwareGateway + 'static,
    S: StateStore + 'static,
    R: RecordingStore + 'static,
    N: NotificationSink + 'static,
{
    match parse_tag(&params) {
        Ok(tag) => state.rfid.stop_recording(&tag).await.into(),
        Err(err) => CommandResponse::error(err.to_string()),
    }
}

/// `GET /cgi-bin/rfid_play?tag=<id>`
pub async fn play<H, S, R, N>(
    State(state): State<AppState<H, S, R, N>>,
    Query(params): Query<TagParams>,
) -> CommandResponse
where
    H: HardwareGateway + 'static,
    S: StateStore + 'static,
    R: RecordingStore + 'static,
    N: NotificationSink + 'static,
{
    match parse_tag(&params) {
        Ok(tag) => state.rfid.start_playback(tag).await.into(),
        Err(err) => CommandResponse::error(err.to_string()),
    }
}

/// `GET /cgi-bin/rfid_stop_play`
pub async fn stop_play<H, S, R, N>(
    State(state): State<AppState<H, S, R, N>>,
) -> CommandResponse
where
    H: HardwareGateway + 'static,
    S: StateStore + 'static,
    R: RecordingStore + 'static,
    N: NotificationSink + 'static,
{
    state.rfid.stop_playback().await.into()
}
