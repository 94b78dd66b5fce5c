//! Control network over a gateway WebSocket

use async_trait::async_trait;
use duplex_core::{
    ChannelId, ControlAdapter, ControlEvent, TransportError, TransportResult,
};
use tracing::{info, warn};

use crate::connection::GatewayConnection;
use crate::frames::{ControlInbound, ControlOutbound};
use crate::GatewayConfig;

pub struct GatewayControlAdapter {
    config: GatewayConfig,
    connection: Option<GatewayConnection>,
}

impl GatewayControlAdapter {
    pub fn new(config: GatewayConfig) -> Self {
        Self {
            config,
            connection: None,
        }
    }

    fn connection(&mut self) -> TransportResult<&mut GatewayConnection> {
        self.connection.as_mut().ok_or(TransportError::NotConnected)
    }
}

#[async_trait]
impl ControlAdapter for GatewayControlAdapter {
    async fn connect(&mut self) -> TransportResult<()> {
        self.disconnect().await;

        let mut connection = GatewayConnection::open(&self.config).await?;
        if let Some(token) = &self.config.auth_token {
            connection
                .send_json(&ControlOutbound::Auth { token })
                .await?;
        }

        info!("Control gateway connected at {}", connection.endpoint());
        self.connection = Some(connection);
        Ok(())
    }

    async fn receive(&mut self) -> TransportResult<ControlEvent> {
        let connection = self.connection()?;
        loop {
            let frame: ControlInbound = connection.next_json().await?;
            match frame.into_event() {
                Some(event) => return Ok(event),
                None => warn!("Skipping unknown control gateway frame"),
            }
        }
    }

    async fn send(&mut self, channel: ChannelId, text: &str) -> TransportResult<()> {
        self.connection()?
            .send_json(&ControlOutbound::Send {
                channel_id: channel,
                text,
            })
            .await
    }

    async fn disconnect(&mut self) {
        if let Some(connection) = self.connection.take() {
            connection.close().await;
        }
    }
}
