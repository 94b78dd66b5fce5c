//! Adapter traits for the two bridged networks
//!
//! Adapters own the wire protocol of one network. The runtime drives them
//! through these traits: it connects, pulls inbound events and pushes
//! outbound messages, and reconnects whenever a call returns an error.
//!
//! `receive` is raced against the outbound queue with `tokio::select!`, so
//! implementations must be cancel safe: dropping a pending `receive` future
//! must not lose an event.

use async_trait::async_trait;

use crate::errors::TransportResult;
use crate::types::{ChannelId, ControlEvent, FieldEvent, FieldMessage, ReceiptFrame};

// ----------------------------------------------------------------------------
// Control Network
// ----------------------------------------------------------------------------

/// Operator-facing network adapter
#[async_trait]
pub trait ControlAdapter: Send {
    /// Establish a session. Called again after every failure.
    async fn connect(&mut self) -> TransportResult<()>;

    /// Wait for the next inbound message
    async fn receive(&mut self) -> TransportResult<ControlEvent>;

    /// Deliver one message; the caller has already chunked it
    async fn send(&mut self, channel: ChannelId, text: &str) -> TransportResult<()>;

    /// Drop the current session, if any
    async fn disconnect(&mut self);
}

// ----------------------------------------------------------------------------
// Field Network
// ----------------------------------------------------------------------------

/// Peer-facing network adapter
#[async_trait]
pub trait FieldAdapter: Send {
    /// Establish a session. Called again after every failure.
    async fn connect(&mut self) -> TransportResult<()>;

    /// Wait for the next inbound message or receipt
    async fn receive(&mut self) -> TransportResult<FieldEvent>;

    /// Deliver a message to `address`; no length limit applies
    async fn send(&mut self, address: &str, text: &str) -> TransportResult<()>;

    /// Tell the sender its message was received.
    ///
    /// Issued for every inbound message, whatever the relay decides to do
    /// with it afterwards.
    async fn deliver_receipt(&mut self, message: &FieldMessage) -> TransportResult<()>;

    /// Acknowledge a receipt frame the network sent us
    async fn acknowledge(&mut self, receipt: &ReceiptFrame) -> TransportResult<()>;

    /// Drop the current session, if any
    async fn disconnect(&mut self);
}
