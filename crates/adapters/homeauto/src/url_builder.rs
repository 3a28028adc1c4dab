//! Per-platform notification URL construction.
//!
//! Pure and synchronous so every platform's URL shape can be pinned by a
//! golden test. Two encoding conventions coexist here: Vera, Eedomus, and
//! Calaos take ordinary form-encoded query pairs (space becomes `+`),
//! while Zibase wants one pre-assembled `cmd` parameter with spaces
//! percent-encoded as `%20`.

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use url::Url;

use karotz_domain::notify::{HomeAutomationTarget, NotificationEvent, Platform};

/// Characters escaped inside the Zibase `cmd` parameter.
const ZIBASE_CMD: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'&')
    .add(b'+')
    .add(b'<')
    .add(b'>')
    .add(b'`');

/// Vera switch-power service driven by `SetTarget`.
const VERA_SERVICE_ID: &str = "urn:upnp-org:serviceId:SwitchPower1";

/// The base URL of a target could not be parsed.
#[derive(Debug, thiserror::Error)]
#[error("invalid base url for target `{target}`: {source}")]
pub struct UrlError {
    pub target: String,
    #[source]
    pub source: url::ParseError,
}

/// Build the full notification URL for one target and event.
///
/// Calaos credentials are deliberately absent from the URL; they travel as
/// HTTP basic auth, applied by the notifier.
///
/// # Errors
///
/// Returns [`UrlError`] when the target's base URL does not parse.
pub fn build_url(
    target: &HomeAutomationTarget,
    event: &NotificationEvent,
) -> Result<String, UrlError> {
    let mut url = Url::parse(&target.base_url).map_err(|source| UrlError {
        target: target.name.clone(),
        source,
    })?;

    match target.platform {
        Platform::Vera => {
            url.set_path("/data_request");
            url.query_pairs_mut()
                .append_pair("id", "lu_action")
                .append_pair("DeviceNum", &target.device_id)
                .append_pair("serviceId", VERA_SERVICE_ID)
                .append_pair("action", "SetTarget")
                .append_pair("newTargetValue", event.value());
        }
        Platform::Eedomus => {
            url.set_path("/api/set");
            {
                let mut pairs = url.query_pairs_mut();
                pairs
                    .append_pair("action", "periph.value")
                    .append_pair("periph_id", &target.device_id)
                    .append_pair("value", event.value());
                if let Some(credentials) = &target.credentials {
                    pairs
                        .append_pair("api_user", &credentials.user)
                        .append_pair("api_secret", &credentials.secret);
                }
            }
        }
        Platform::Zibase => {
            url.set_path("/cgi-bin/domo.cgi");
            let cmd = format!("SET {} {}", target.device_id, event.value());
            let mut query = format!("cmd={}", utf8_percent_encode(&cmd, ZIBASE_CMD));
            if let Some(credentials) = &target.credentials {
                query.push_str("&token=");
                query.push_str(&utf8_percent_encode(&credentials.secret, ZIBASE_CMD).to_string());
            }
            url.set_query(Some(&query));
        }
        Platform::Calaos => {
            url.set_path("/set.json");
            url.query_pairs_mut()
                .append_pair("id", &target.device_id)
                .append_pair("value", event.value());
        }
    }

    Ok(url.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use karotz_domain::notify::Credentials;

    fn target(platform: Platform, base_url: &str, credentials: Option<Credentials>) -> HomeAutomationTarget {
        HomeAutomationTarget {
            name: "hub".to_string(),
            platform,
            base_url: base_url.to_string(),
            credentials,
            device_id: "42".to_string(),
            events: Vec::new(),
        }
    }

    fn creds() -> Option<Credentials> {
        Some(Credentials {
            user: "api".to_string(),
            secret: "s3cr3t".to_string(),
        })
    }

    fn on() -> NotificationEvent {
        NotificationEvent::new("sound_finished").with("value", "on")
    }

    #[test]
    fn should_build_vera_url() {
        let url = build_url(&target(Platform::Vera, "http://192.168.1.10:3480", None), &on())
            .unwrap();
        assert_eq!(
            url,
            "http://192.168.1.10:3480/data_request?id=lu_action&DeviceNum=42\
             &serviceId=urn%3Aupnp-org%3AserviceId%3ASwitchPower1\
             &action=SetTarget&newTargetValue=on"
        );
    }

    #[test]
    fn should_build_eedomus_url_with_credentials_as_query_params() {
        let url = build_url(
            &target(Platform::Eedomus, "http://eedomus.local", creds()),
            &on(),
        )
        .unwrap();
        assert_eq!(
            url,
            "http://eedomus.local/api/set?action=periph.value&periph_id=42\
             &value=on&api_user=api&api_secret=s3cr3t"
        );
    }

    #[test]
    fn should_build_zibase_url_with_percent_encoded_command() {
        let url = build_url(&target(Platform::Zibase, "http://zibase.local", None), &on())
            .unwrap();
        assert_eq!(
            url,
            "http://zibase.local/cgi-bin/domo.cgi?cmd=SET%2042%20on"
        );
    }

    #[test]
    fn should_append_zibase_token_when_credentials_are_present() {
        let url = build_url(
            &target(Platform::Zibase, "http://zibase.local", creds()),
            &on(),
        )
        .unwrap();
        assert_eq!(
            url,
            "http://zibase.local/cgi-bin/domo.cgi?cmd=SET%2042%20on&token=s3cr3t"
        );
    }

    #[test]
    fn should_build_calaos_url_without_credentials_in_query() {
        let url = build_url(
            &target(Platform::Calaos, "https://calaos.local", creds()),
            &on(),
        )
        .unwrap();
        assert_eq!(url, "https://calaos.local/set.json?id=42&value=on");
        assert!(!url.contains("s3cr3t"));
    }

    #[test]
    fn should_form_encode_spaces_as_plus_for_vera() {
        let event = NotificationEvent::new("custom").with("value", "hello world");
        let url = build_url(&target(Platform::Vera, "http://vera.local", None), &event)
            .unwrap();
        assert!(url.ends_with("newTargetValue=hello+world"));
    }

    #[test]
    fn should_default_value_to_one_when_payload_has_none() {
        let event = NotificationEvent::new("sound_finished");
        let url = build_url(&target(Platform::Calaos, "http://calaos.local", None), &event)
            .unwrap();
        assert!(url.ends_with("value=1"));
    }

    #[test]
    fn should_reject_unparsable_base_url() {
        let err = build_url(&target(Platform::Vera, "not a url", None), &on()).unwrap_err();
        assert_eq!(err.target, "hub");
    }
}
