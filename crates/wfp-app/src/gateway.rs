//! Reporting gateway: delivers finished reports to the CommCare endpoint.

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::AppConfig;
use crate::error::GatewayError;

/// Status and body returned by the reporting endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayResponse {
    pub code: u16,
    pub body: String,
}

/// Outcome of one successful `send`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// The endpoint accepted the message.
    Sent(GatewayResponse),
    /// No endpoint configured; the message was only logged.
    Logged,
}

/// Sends one rendered report line on behalf of a sender.
#[async_trait]
pub trait ReportingGateway: Send + Sync {
    async fn send(&self, sender: &str, message: &str) -> Result<Delivery, GatewayError>;
}

/// Live gateway issuing `GET <api_url>?sender=..&message=..`.
pub struct CommCareGateway {
    api_url: String,
    client: reqwest::Client,
}

impl CommCareGateway {
    pub fn new(api_url: impl Into<String>, config: &AppConfig) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(GatewayError::Client)?;
        Ok(Self {
            api_url: api_url.into(),
            client,
        })
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }
}

#[async_trait]
impl ReportingGateway for CommCareGateway {
    async fn send(&self, sender: &str, message: &str) -> Result<Delivery, GatewayError> {
        tracing::info!(url = %self.api_url, sender, report = message, "CommCareApi request");
        let response = self
            .client
            .get(&self.api_url)
            .query(&[("sender", sender), ("message", message)])
            .send()
            .await?;
        let code = response.status().as_u16();
        let success = response.status().is_success();
        let body = response.text().await?;

        tracing::info!(code, body = %body, sender, "CommCareApi response");

        if !success {
            return Err(GatewayError::Rejected { status: code, body });
        }
        Ok(Delivery::Sent(GatewayResponse { code, body }))
    }
}

/// Gateway used when no endpoint is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct DummyGateway;

#[async_trait]
impl ReportingGateway for DummyGateway {
    async fn send(&self, sender: &str, message: &str) -> Result<Delivery, GatewayError> {
        tracing::info!(sender, report = message, "Dummy CommCareApi call");
        Ok(Delivery::Logged)
    }
}

/// Picks the live gateway when an endpoint is configured, the dummy one otherwise.
pub fn gateway_from_config(config: &AppConfig) -> Result<Arc<dyn ReportingGateway>, GatewayError> {
    match config.endpoint() {
        Some(url) => Ok(Arc::new(CommCareGateway::new(url, config)?)),
        None => {
            tracing::info!("no reporting endpoint configured; using dummy gateway");
            Ok(Arc::new(DummyGateway))
        }
    }
}
