//! HTTP delivery of notification events.

use std::time::Duration;

use karotz_app::ports::NotificationSink;
use karotz_domain::notify::{DeliveryOutcome, HomeAutomationTarget, NotificationEvent, Platform};

use crate::url_builder::build_url;

/// Per-request timeout applied when the configuration does not set one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Delivers events to hubs over HTTP with a bounded per-request timeout.
///
/// Every failure mode (unparsable base URL, timeout, connection error,
/// non-2xx status) becomes a failed [`DeliveryOutcome`]; nothing is
/// retried. Secrets ride in the URL or basic-auth header as the platform
/// demands and are never included in outcomes or logs.
#[derive(Debug, Clone)]
pub struct HttpNotifier {
    client: reqwest::Client,
}

impl HttpNotifier {
    /// Build a notifier whose requests abort after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns the underlying client-construction error, which only occurs
    /// when the TLS backend cannot be initialised.
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

impl NotificationSink for HttpNotifier {
    async fn deliver(
        &self,
        target: &HomeAutomationTarget,
        event: &NotificationEvent,
    ) -> DeliveryOutcome {
        let url = match build_url(target, event) {
            Ok(url) => url,
            Err(err) => return DeliveryOutcome::failed(target.name.clone(), None, err.to_string()),
        };

        let mut request = self.client.get(url);
        if let (Platform::Calaos, Some(credentials)) = (target.platform, &target.credentials) {
            request = request.basic_auth(&credentials.user, Some(&credentials.secret));
        }

        match request.send().await {
            Ok(response) => {
                let status = response.status();
                if status.is_success() {
                    DeliveryOutcome::delivered(target.name.clone(), status.as_u16())
                } else {
                    DeliveryOutcome::failed(
                        target.name.clone(),
                        Some(status.as_u16()),
                        format!("unexpected status {status}"),
                    )
                }
            }
            Err(err) => {
                let status = err.status().map(|s| s.as_u16());
                // the URL can carry credentials (Eedomus, Zibase); strip it
                // before the error string reaches outcomes and logs
                DeliveryOutcome::failed(
                    target.name.clone(),
                    status,
                    err.without_url().to_string(),
                )
            }
        }
    }
}
