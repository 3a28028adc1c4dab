//! Canonical wire response.

use axum::Json;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use karotz_domain::action::ActionResult;

/// `{"return": "0"|"1", "msg": <string>}` — `"0"` means success.
///
/// Always sent with HTTP 200; CGI-era clients treat any other status as a
/// transport failure rather than reading the body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandResponse {
    #[serde(rename = "return")]
    pub code: &'static str,
    pub msg: String,
}

impl CommandResponse {
    #[must_use]
    pub fn ok(msg: impl Into<String>) -> Self {
        Self {
            code: "0",
            msg: msg.into(),
        }
    }

    #[must_use]
    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            code: "1",
            msg: msg.into(),
        }
    }
}

impl From<ActionResult> for CommandResponse {
    fn from(result: ActionResult) -> Self {
        if result.success {
            Self::ok(result.message)
        } else {
            Self::error(result.message)
        }
    }
}

impl IntoResponse for CommandResponse {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}
