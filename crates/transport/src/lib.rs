use crate::error::TransportError;
use async_trait::async_trait;
use configuration::TransportSettings;
use core_types::Diagnostics;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Url};
use snapshot::Snapshot;
use std::net::IpAddr;
use std::time::Duration;

pub mod error;

/// Delivers a snapshot to the remote consumer.
///
/// A transport makes exactly one attempt per call. Retrying is left to the
/// next broadcast cycle, which will carry fresher state anyway.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, snapshot: &Snapshot) -> Result<(), TransportError>;
}

/// Posts snapshots as JSON to a fixed webhook URL.
pub struct WebhookTransport {
    client: Client,
    endpoint: Url,
    diagnostics: Diagnostics,
}

impl WebhookTransport {
    /// Creates a new `WebhookTransport`.
    ///
    /// Fails if the endpoint is not an absolute http(s) URL. Every request is
    /// bounded by `request_timeout_ms` so a hung consumer cannot stall a cycle.
    pub fn new(config: &TransportSettings, diagnostics: Diagnostics) -> Result<Self, TransportError> {
        let invalid = |reason: String| TransportError::InvalidEndpoint {
            url: config.endpoint_url.clone(),
            reason,
        };
        let endpoint = Url::parse(&config.endpoint_url).map_err(|e| invalid(e.to_string()))?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme '{}'", endpoint.scheme())));
        }

        let mut builder = Client::builder().timeout(Duration::from_millis(config.request_timeout_ms));
        // A consumer on this machine is never reached through a system proxy.
        if is_loopback(&endpoint) {
            builder = builder.no_proxy();
        }
        let client = builder.build().map_err(TransportError::Client)?;

        Ok(Self {
            client,
            endpoint,
            diagnostics,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

fn is_loopback(url: &Url) -> bool {
    match url.host_str() {
        Some("localhost") => true,
        Some(host) => host
            .trim_start_matches('[')
            .trim_end_matches(']')
            .parse::<IpAddr>()
            .is_ok_and(|ip| ip.is_loopback()),
        None => false,
    }
}

#[async_trait]
impl Transport for WebhookTransport {
    /// Sends the snapshot in a single POST.
    ///
    /// Failures are reported to the diagnostics sink here and also returned, so
    /// the caller can count them; they are never retried.
    async fn send(&self, snapshot: &Snapshot) -> Result<(), TransportError> {
        let body = snapshot.to_json().inspect_err(|e| {
            self.diagnostics
                .error(&format!("Error encoding snapshot for {}: {}", snapshot.account, e));
        })?;

        let response = self
            .client
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| {
                self.diagnostics.error(&format!("HTTP Post error: {}", e));
                TransportError::Request(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            self.diagnostics.error(&format!("HTTP Error: {}", status));
            return Err(TransportError::Status(status.as_u16()));
        }

        tracing::debug!(account = %snapshot.account, status = %status, "Snapshot delivered.");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(url: &str) -> TransportSettings {
        TransportSettings {
            endpoint_url: url.to_string(),
            ..TransportSettings::default()
        }
    }

    #[test]
    fn accepts_the_default_endpoint() {
        let transport = WebhookTransport::new(&TransportSettings::default(), Diagnostics::tracing_only()).unwrap();
        assert_eq!(transport.endpoint().as_str(), "http://localhost:8080/webhook");
    }

    #[test]
    fn recognises_loopback_hosts() {
        for url in ["http://localhost:8080/webhook", "http://127.0.0.1:9/x", "http://[::1]:80/"] {
            assert!(is_loopback(&Url::parse(url).unwrap()), "{url}");
        }
        assert!(!is_loopback(&Url::parse("https://hooks.example.com/webhook").unwrap()));
    }

    #[test]
    fn rejects_malformed_and_non_http_endpoints() {
        for url in ["not a url", "ftp://example.com/drop", "localhost:8080/webhook"] {
            let result = WebhookTransport::new(&settings(url), Diagnostics::tracing_only());
            assert!(
                matches!(result, Err(TransportError::InvalidEndpoint { .. })),
                "{url} should be rejected"
            );
        }
    }
}
