//! HTTP client for the workflow backend's fetch and decision endpoints.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use reviewdesk_core::config::UpstreamConfig;
use reviewdesk_core::gateway::{
    interpret_decision_response, DecisionAck, DecisionGateway, DecisionPayload, FetchPayload,
    GatewayError, RequestFeed,
};
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

const CONNECT_TIMEOUT_SECS: u64 = 5;
const ERROR_BODY_LIMIT: usize = 512;

#[derive(Debug, Error)]
pub enum HttpUpstreamError {
    #[error("could not build HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
}

#[derive(Clone, Debug)]
pub struct HttpUpstream {
    client: Client,
    fetch_url: String,
    decision_url: String,
    auth_token: Option<SecretString>,
}

impl HttpUpstream {
    pub fn from_config(config: &UpstreamConfig) -> Result<Self, HttpUpstreamError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS.min(config.timeout_secs)))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(HttpUpstreamError::ClientBuild)?;

        Ok(Self {
            client,
            fetch_url: config.fetch_url.clone(),
            decision_url: config.decision_url.clone(),
            auth_token: config.auth_token.clone(),
        })
    }

    pub fn fetch_url(&self) -> &str {
        &self.fetch_url
    }

    pub fn decision_url(&self) -> &str {
        &self.decision_url
    }

    fn post(&self, url: &str) -> RequestBuilder {
        let builder = self.client.post(url);
        match &self.auth_token {
            Some(token) => builder.bearer_auth(token.expose_secret()),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> Result<(u16, String), GatewayError> {
        let response = builder.send().await.map_err(|error| {
            warn!(event_name = "upstream.request.failed", error = %error, "upstream call failed");
            GatewayError::Network(error.to_string())
        })?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|error| GatewayError::Network(error.to_string()))?;
        Ok((status, body))
    }
}

#[async_trait]
impl RequestFeed for HttpUpstream {
    async fn fetch(&self, username: &str) -> Result<Value, GatewayError> {
        let payload = FetchPayload { username: username.to_string() };
        let (status, body) = self.send(self.post(&self.fetch_url).json(&payload)).await?;
        debug!(event_name = "upstream.fetch.response", status, bytes = body.len());

        if !(200..300).contains(&status) {
            return Err(GatewayError::Status { status, body: truncate(&body) });
        }
        serde_json::from_str(&body).map_err(|error| GatewayError::Malformed(error.to_string()))
    }
}

#[async_trait]
impl DecisionGateway for HttpUpstream {
    async fn submit(&self, payload: &DecisionPayload) -> Result<DecisionAck, GatewayError> {
        let (status, body) = self.send(self.post(&self.decision_url).json(payload)).await?;
        debug!(
            event_name = "upstream.decision.response",
            status,
            request_id = %payload.request_id,
            bytes = body.len()
        );
        interpret_decision_response(status, &body)
    }
}

fn truncate(body: &str) -> String {
    body.chars().take(ERROR_BODY_LIMIT).collect()
}
