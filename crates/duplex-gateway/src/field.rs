//! Field network over a gateway WebSocket

use async_trait::async_trait;
use duplex_core::{
    FieldAdapter, FieldEvent, FieldMessage, ReceiptFrame, TransportError, TransportResult,
};
use tracing::{info, warn};

use crate::connection::GatewayConnection;
use crate::frames::{FieldInbound, FieldOutbound};
use crate::GatewayConfig;

pub struct GatewayFieldAdapter {
    config: GatewayConfig,
    connection: Option<GatewayConnection>,
}

impl GatewayFieldAdapter {
    pub fn new(config: GatewayConfig) -> Self {
        Self {
            config,
            connection: None,
        }
    }

    async fn send_frame(&mut self, frame: &FieldOutbound<'_>) -> TransportResult<()> {
        self.connection
            .as_mut()
            .ok_or(TransportError::NotConnected)?
            .send_json(frame)
            .await
    }
}

#[async_trait]
impl FieldAdapter for GatewayFieldAdapter {
    async fn connect(&mut self) -> TransportResult<()> {
        self.disconnect().await;

        let mut connection = GatewayConnection::open(&self.config).await?;
        if let Some(token) = &self.config.auth_token {
            connection.send_json(&FieldOutbound::Auth { token }).await?;
        }

        info!("Field gateway connected at {}", connection.endpoint());
        self.connection = Some(connection);
        Ok(())
    }

    async fn receive(&mut self) -> TransportResult<FieldEvent> {
        let connection = self
            .connection
            .as_mut()
            .ok_or(TransportError::NotConnected)?;
        loop {
            let frame: FieldInbound = connection.next_json().await?;
            match frame.into_event() {
                Some(event) => return Ok(event),
                None => warn!("Skipping unknown field gateway frame"),
            }
        }
    }

    async fn send(&mut self, address: &str, text: &str) -> TransportResult<()> {
        self.send_frame(&FieldOutbound::Send { to: address, text })
            .await
    }

    async fn deliver_receipt(&mut self, message: &FieldMessage) -> TransportResult<()> {
        self.send_frame(&FieldOutbound::read_receipt(message)).await
    }

    async fn acknowledge(&mut self, receipt: &ReceiptFrame) -> TransportResult<()> {
        self.send_frame(&FieldOutbound::ack(receipt)).await
    }

    async fn disconnect(&mut self) {
        if let Some(connection) = self.connection.take() {
            connection.close().await;
        }
    }
}
