//! Duplex Gateway Adapters
//!
//! Both networks are reached through a local gateway process that speaks JSON
//! text frames over WebSocket. This crate implements the core adapter traits
//! on top of that protocol:
//! - `GatewayControlAdapter`: operator-facing network
//! - `GatewayFieldAdapter`: peer-facing network

pub mod connection;
pub mod control;
pub mod field;
pub mod frames;

pub use connection::GatewayConnection;
pub use control::GatewayControlAdapter;
pub use field::GatewayFieldAdapter;

use url::Url;

/// Where a gateway lives and how to authenticate with it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    pub url: Url,
    /// Sent in an `auth` frame right after connecting
    pub auth_token: Option<String>,
}

impl GatewayConfig {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            auth_token: None,
        }
    }

    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }
}
