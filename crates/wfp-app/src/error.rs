//! Error types for the reporting app.

use flow_spec::{FlowError, RenderError};

/// Top-level error type for one conversational turn.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Flow configuration error: {0}")]
    Flow(#[from] FlowError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Session is positioned at unknown state '{0}'")]
    UnknownState(String),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to parse configuration: {0}")]
    Parse(#[source] serde_json::Error),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Reporting endpoint errors.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("HTTP client could not be built: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Request to reporting endpoint failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Reporting endpoint answered {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Session and contact persistence errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}
