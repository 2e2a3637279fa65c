//! Webhook Delivery
//!
//! Posts alerts as Discord-style embeds. Delivery is best effort: the
//! response status is logged and never reported back to the caller.

use crate::ERROR_COLOR;
use reqwest::Client;
use serde::Serialize;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info, warn};

const WEBHOOK_TIMEOUT_SECS: u64 = 10;

/// Alerting errors
#[derive(Debug, Error)]
pub enum AlertError {
    #[error("HTTP client error: {0}")]
    Client(String),
}

/// A single alert
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
    pub title: String,
    pub description: String,
    pub color: u32,
}

impl Alert {
    /// Alert for a failed sampling attempt
    pub fn recording_failure(description: impl Into<String>) -> Self {
        Self {
            title: "Error while trying to save a record".to_string(),
            description: description.into(),
            color: ERROR_COLOR,
        }
    }
}

#[derive(Serialize)]
struct WebhookPayload<'a> {
    embeds: [&'a Alert; 1],
}

/// Something that can deliver an alert
pub trait Alerter: Send + Sync {
    /// Deliver an alert. Must not fail the caller.
    fn notify(&self, alert: &Alert) -> impl Future<Output = ()> + Send;
}

/// Posts alerts to a webhook, or only logs them when no URL is configured
#[derive(Debug, Clone)]
pub struct WebhookAlerter {
    client: Client,
    webhook_url: Option<String>,
}

impl WebhookAlerter {
    /// Create an alerter for the given webhook URL
    pub fn new(webhook_url: Option<String>) -> Result<Self, AlertError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(WEBHOOK_TIMEOUT_SECS))
            .build()
            .map_err(|e| AlertError::Client(e.to_string()))?;

        if webhook_url.is_none() {
            warn!("No alert webhook configured, alerts will only be logged");
        }

        Ok(Self {
            client,
            webhook_url,
        })
    }

    /// Whether alerts leave the process
    pub fn is_remote(&self) -> bool {
        self.webhook_url.is_some()
    }
}

impl Alerter for WebhookAlerter {
    async fn notify(&self, alert: &Alert) {
        error!("{}: {}", alert.title, alert.description);

        let Some(url) = &self.webhook_url else {
            return;
        };

        let payload = WebhookPayload { embeds: [alert] };
        match self.client.post(url).json(&payload).send().await {
            Ok(response) => info!("Alert webhook responded with {}", response.status()),
            Err(e) => warn!("Alert webhook delivery failed: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_payload_shape() {
        let alert = Alert::recording_failure("boom");
        let payload = WebhookPayload { embeds: [&alert] };

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "embeds": [{
                    "title": "Error while trying to save a record",
                    "description": "boom",
                    "color": 15548997
                }]
            })
        );
    }

    #[tokio::test]
    async fn test_posts_embed() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/hook"))
            .and(header("content-type", "application/json"))
            .and(body_json(serde_json::json!({
                "embeds": [{
                    "title": "Error while trying to save a record",
                    "description": "provider returned 500",
                    "color": 15548997
                }]
            })))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let alerter = WebhookAlerter::new(Some(format!("{}/hook", server.uri()))).unwrap();
        assert!(alerter.is_remote());

        alerter
            .notify(&Alert::recording_failure("provider returned 500"))
            .await;
    }

    #[tokio::test]
    async fn test_webhook_failure_is_swallowed() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let alerter = WebhookAlerter::new(Some(server.uri())).unwrap();
        alerter.notify(&Alert::recording_failure("x")).await;

        let unreachable = WebhookAlerter::new(Some("http://127.0.0.1:1/hook".into())).unwrap();
        unreachable.notify(&Alert::recording_failure("x")).await;
    }

    #[tokio::test]
    async fn test_log_only() {
        let alerter = WebhookAlerter::new(None).unwrap();
        assert!(!alerter.is_remote());
        alerter.notify(&Alert::recording_failure("x")).await;
    }
}
