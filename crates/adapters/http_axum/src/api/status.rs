//! Device status endpoint.

use axum::Json;
use axum::extract::State;
use serde::Serialize;

use karotz_app::ports::{HardwareGateway, NotificationSink, RecordingStore, StateStore};
use karotz_domain::action::{ActionKind, ExclusionGroup};
use karotz_domain::rfid::{RfidMode, TagId};

use crate::state::AppState;

/// Status reply; carries the canonical `return`/`msg` pair plus a read-only
/// view of what the device is doing.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    #[serde(rename = "return")]
    code: &'static str,
    msg: String,
    busy: Vec<BusyGroup>,
    rfid_session: Option<SessionView>,
}

#[derive(Debug, Serialize)]
struct BusyGroup {
    group: ExclusionGroup,
    action: ActionKind,
}

#[derive(Debug, Serialize)]
struct SessionView {
    tag: TagId,
    mode: RfidMode,
}

/// `GET /cgi-bin/status`
pub async fn status<H, S, R, N>(
    State(state): State<AppState<H, S, R, N>>,
) -> Json<StatusResponse>
where
    H: HardwareGateway + 'static,
    S: StateStore + 'static,
    R: RecordingStore + 'static,
    N: NotificationSink + 'static,
{
    let locks = state.dispatcher.locks();
    let busy = ExclusionGroup::ALL
        .iter()
        .filter_map(|group| {
            locks.holder(*group).map(|marker| BusyGroup {
                group: *group,
                action: marker.kind,
            })
        })
        .collect();
    let rfid_session = locks.session().map(|session| SessionView {
        tag: session.tag,
        mode: session.mode,
    });

    Json(StatusResponse {
        code: "0",
        msg: "ok".to_string(),
        busy,
        rfid_session,
    })
}
