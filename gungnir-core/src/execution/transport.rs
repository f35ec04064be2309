//! Exchange transport abstraction
//!
//! The router never talks to an exchange SDK directly: it dispatches through
//! [`ExchangeTransport`], which any concrete connector (REST, websocket,
//! FIX bridge) implements. The only obligations on an implementation are to
//! deliver the order over an authenticated, encrypted channel and to report
//! transient faults distinctly from business rejections.

use async_trait::async_trait;
use thiserror::Error;

use crate::core::Order;
use crate::execution::types::{ExchangeResponse, TransportError};

/// Fatal transport misconfiguration; never retried
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("endpoint {endpoint:?} is not an encrypted channel")]
    UnencryptedEndpoint { endpoint: String },

    #[error("transport credentials are missing or empty")]
    MissingCredentials,
}

/// Connection settings for the exchange transport
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Destination endpoint; must use an encrypted scheme
    pub endpoint: String,
    pub api_key: String,
    pub api_secret: String,
}

impl TransportConfig {
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            api_secret: api_secret.into(),
        }
    }

    /// Enforce the transport security contract
    ///
    /// The endpoint must use an encrypted scheme and both credentials must be
    /// non-empty. Checked at router construction and again immediately before
    /// every dispatch.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let encrypted =
            self.endpoint.starts_with("https://") || self.endpoint.starts_with("wss://");
        if !encrypted {
            return Err(ConfigurationError::UnencryptedEndpoint {
                endpoint: self.endpoint.clone(),
            });
        }

        if self.api_key.trim().is_empty() || self.api_secret.trim().is_empty() {
            return Err(ConfigurationError::MissingCredentials);
        }

        Ok(())
    }
}

/// Send-order capability over an authenticated, encrypted channel
#[async_trait]
pub trait ExchangeTransport: Send + Sync {
    /// Dispatch one order; one call is one attempt (retry lives in the router)
    async fn send_order(&self, order: &Order) -> Result<ExchangeResponse, TransportError>;
}
