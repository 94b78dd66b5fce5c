//! Session drivers
//!
//! A session owns one adapter for as long as its connection lives. It races
//! inbound events against the side's outbound queue, hands inbound traffic to
//! the router and writes queued messages to the adapter. Any adapter error ends
//! the session; the supervisor decides what happens next.

use std::sync::Arc;

use async_trait::async_trait;
use duplex_core::{
    ControlAdapter, ControlEvent, FieldAdapter, FieldEvent, FieldMessage, MessageKind,
    NetworkSide, OutboundControl, OutboundField, TransportResult,
};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::effects::EffectDispatcher;
use crate::router::Router;

/// One network side, driven by a `Supervisor`
#[async_trait]
pub trait SessionDriver: Send {
    fn side(&self) -> NetworkSide;

    /// Open a fresh connection
    async fn connect(&mut self) -> TransportResult<()>;

    /// Pump traffic until the connection fails.
    ///
    /// Returns `Ok(())` only when there is nothing left to drive.
    async fn run(&mut self) -> TransportResult<()>;

    /// Release the connection after `run` ends or is cancelled
    async fn teardown(&mut self);
}

// ----------------------------------------------------------------------------
// Control Session
// ----------------------------------------------------------------------------

/// Drives the operator-facing adapter
pub struct ControlSession<A> {
    adapter: A,
    router: Arc<Router>,
    dispatcher: EffectDispatcher,
    outbound: mpsc::UnboundedReceiver<OutboundControl>,
    /// Message whose delivery failed; retried first on the next session
    pending: Option<OutboundControl>,
}

impl<A: ControlAdapter> ControlSession<A> {
    pub fn new(
        adapter: A,
        router: Arc<Router>,
        dispatcher: EffectDispatcher,
        outbound: mpsc::UnboundedReceiver<OutboundControl>,
    ) -> Self {
        Self {
            adapter,
            router,
            dispatcher,
            outbound,
            pending: None,
        }
    }

    fn handle_event(&self, event: ControlEvent) {
        debug!(
            "Control message in channel {} from {}",
            event.channel_id, event.sender_id
        );
        let effects = self.router.route_control_event(&event);
        self.dispatcher.dispatch(effects);
    }

    async fn deliver(&mut self, message: OutboundControl) -> TransportResult<()> {
        if let Err(e) = self.adapter.send(message.channel, &message.text).await {
            self.pending = Some(message);
            return Err(e);
        }
        Ok(())
    }
}

#[async_trait]
impl<A: ControlAdapter> SessionDriver for ControlSession<A> {
    fn side(&self) -> NetworkSide {
        NetworkSide::Control
    }

    async fn connect(&mut self) -> TransportResult<()> {
        self.adapter.connect().await
    }

    async fn run(&mut self) -> TransportResult<()> {
        if let Some(message) = self.pending.take() {
            self.deliver(message).await?;
        }

        loop {
            tokio::select! {
                event = self.adapter.receive() => self.handle_event(event?),
                outbound = self.outbound.recv() => match outbound {
                    Some(message) => self.deliver(message).await?,
                    None => return Ok(()),
                },
            }
        }
    }

    async fn teardown(&mut self) {
        self.adapter.disconnect().await;
    }
}

// ----------------------------------------------------------------------------
// Field Session
// ----------------------------------------------------------------------------

/// Drives the peer-facing adapter
pub struct FieldSession<A> {
    adapter: A,
    router: Arc<Router>,
    dispatcher: EffectDispatcher,
    outbound: mpsc::UnboundedReceiver<OutboundField>,
    pending: Option<OutboundField>,
}

impl<A: FieldAdapter> FieldSession<A> {
    pub fn new(
        adapter: A,
        router: Arc<Router>,
        dispatcher: EffectDispatcher,
        outbound: mpsc::UnboundedReceiver<OutboundField>,
    ) -> Self {
        Self {
            adapter,
            router,
            dispatcher,
            outbound,
            pending: None,
        }
    }

    async fn handle_event(&mut self, event: FieldEvent) -> TransportResult<()> {
        match event {
            FieldEvent::Message(message) => self.handle_message(message).await,
            FieldEvent::Receipt(receipt) => {
                debug!("Acknowledging receipt {} from {}", receipt.id, receipt.address);
                self.adapter.acknowledge(&receipt).await
            }
        }
    }

    async fn handle_message(&mut self, message: FieldMessage) -> TransportResult<()> {
        // Every message is marked read, relayed or not.
        self.adapter.deliver_receipt(&message).await?;

        if message.kind != MessageKind::Text {
            debug!("Ignoring non-text message {} from {}", message.id, message.address);
            return Ok(());
        }

        if !self.router.accepts_field_sender(&message.address) {
            info!("Dropping message from blacklisted number {}", message.address);
            return Ok(());
        }

        let effects = self
            .router
            .route_field_message(&message.address, &message.text);
        self.dispatcher.dispatch(effects);
        Ok(())
    }

    async fn deliver(&mut self, message: OutboundField) -> TransportResult<()> {
        if let Err(e) = self.adapter.send(&message.address, &message.text).await {
            self.pending = Some(message);
            return Err(e);
        }
        Ok(())
    }
}

#[async_trait]
impl<A: FieldAdapter> SessionDriver for FieldSession<A> {
    fn side(&self) -> NetworkSide {
        NetworkSide::Field
    }

    async fn connect(&mut self) -> TransportResult<()> {
        self.adapter.connect().await
    }

    async fn run(&mut self) -> TransportResult<()> {
        if let Some(message) = self.pending.take() {
            self.deliver(message).await?;
        }

        loop {
            tokio::select! {
                event = self.adapter.receive() => self.handle_event(event?).await?,
                outbound = self.outbound.recv() => match outbound {
                    Some(message) => self.deliver(message).await?,
                    None => return Ok(()),
                },
            }
        }
    }

    async fn teardown(&mut self) {
        self.adapter.disconnect().await;
    }
}
