//! World Feed Program USSD app.
//!
//! Schools register once with their opening stock balances and then file a
//! monthly feeding report. Finished flows are turned into compact report
//! lines and delivered to a CommCare endpoint, or only logged when no
//! endpoint is configured.

pub mod config;
pub mod error;
pub mod flows;
pub mod gateway;
pub mod orchestrator;
pub mod session;
pub mod store;

pub use config::AppConfig;
pub use error::{AppError, ConfigError, GatewayError, StoreError};
pub use gateway::{
    CommCareGateway, Delivery, DummyGateway, GatewayResponse, ReportingGateway,
    gateway_from_config,
};
pub use orchestrator::{Inbound, Orchestrator};
pub use session::Session;
pub use store::{ContactStore, MemoryContactStore, MemorySessionStore, SessionStore};
