//! LED, ear, and sound endpoints.

use axum::extract::{Query, State};
use serde::Deserialize;

use karotz_app::dispatcher::ActionRequest;
use karotz_app::ports::{HardwareGateway, NotificationSink, RecordingStore, StateStore};
use karotz_domain::command::{EarGesture, LedColor, LedPattern, SoundSource};
use karotz_domain::error::ValidationError;

use crate::response::CommandResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LedsParams {
    color: Option<String>,
    pulse: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct EarsParams {
    gesture: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SoundParams {
    id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SoundControlParams {
    cmd: Option<String>,
}

/// `GET /cgi-bin/leds?color=<name|RRGGBB>[&pulse=1]`
pub async fn leds<H, S, R, N>(
    State(state): State<AppState<H, S, R, N>>,
    Query(params): Query<LedsParams>,
) -> CommandResponse
where
    H: HardwareGateway + 'static,
    S: StateStore + 'static,
    R: RecordingStore + 'static,
    N: NotificationSink + 'static,
{
    match parse_led(&params) {
        Ok(pattern) => state
            .dispatcher
            .dispatch(ActionRequest::SetLed(pattern))
            .await
            .into(),
        Err(err) => CommandResponse::error(err.to_string()),
    }
}

/// `GET /cgi-bin/ears?gesture=<up|down|sad|surprised|wiggle>`
pub async fn ears<H, S, R, N>(
    State(state): State<AppState<H, S, R, N>>,
    Query(params): Query<EarsParams>,
) -> CommandResponse
where
    H: HardwareGateway + 'static,
    S: StateStore + 'static,
    R: RecordingStore + 'static,
    N: NotificationSink + 'static,
{
    match parse_gesture(&params) {
        Ok(gesture) => state
            .dispatcher
            .dispatch(ActionRequest::MoveEars(gesture))
            .await
            .into(),
        Err(err) => CommandResponse::error(err.to_string()),
    }
}

/// `GET /cgi-bin/sound?id=<library id>`
pub async fn sound<H, S, R, N>(
    State(state): State<AppState<H, S, R, N>>,
    Query(params): Query<SoundParams>,
) -> CommandResponse
where
    H: HardwareGateway + 'static,
    S: StateStore + 'static,
    R: RecordingStore + 'static,
    N: NotificationSink + 'static,
{
    match parse_sound(&params) {
        Ok(source) => state
            .dispatcher
            .dispatch(ActionRequest::PlaySound(source))
            .await
            .into(),
        Err(err) => CommandResponse::error(err.to_string()),
    }
}

/// `GET /cgi-bin/sound_control?cmd=quit`
pub async fn sound_control<H, S, R, N>(
    State(state): State<AppState<H, S, R, N>>,
    Query(params): Query<SoundControlParams>,
) -> CommandResponse
where
    H: HardwareGateway + 'static,
    S: StateStore + 'static,
    R: RecordingStore + 'static,
    N: NotificationSink + 'static,
{
    match params.cmd.as_deref() {
        Some("quit") => state.dispatcher.dispatch(ActionRequest::StopSound).await.into(),
        Some(other) => CommandResponse::error(format!("unsupported command `{other}`")),
        None => CommandResponse::error(ValidationError::MissingParameter("cmd").to_string()),
    }
}

fn parse_led(params: &LedsParams) -> Result<LedPattern, ValidationError> {
    let color = params
        .color
        .as_deref()
        .ok_or(ValidationError::MissingParameter("color"))?;
    let color = LedColor::parse(color)?;
    let pulse = matches!(params.pulse.as_deref(), Some("1" | "true"));
    Ok(LedPattern { color, pulse })
}

fn parse_gesture(params: &EarsParams) -> Result<EarGesture, ValidationError> {
    let gesture = params
        .gesture
        .as_deref()
        .ok_or(ValidationError::MissingParameter("gesture"))?;
    EarGesture::parse(gesture)
}

fn parse_sound(params: &SoundParams) -> Result<SoundSource, ValidationError> {
    let id = params
        .id
        .as_deref()
        .ok_or(ValidationError::MissingParameter("id"))?;
    SoundSource::library(id)
}
