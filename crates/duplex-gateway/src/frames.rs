//! Gateway wire frames
//!
//! Every frame is a JSON object tagged by `"type"`. Inbound enums carry an
//! `Unknown` catch-all so gateways can add frame types without breaking us.

use duplex_core::{
    ChannelId, ChatKind, ControlEvent, FieldEvent, FieldMessage, MessageKind, ReceiptFrame,
};
use serde::{Deserialize, Serialize};

// ----------------------------------------------------------------------------
// Control Gateway
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControlInbound {
    Message {
        channel_id: ChannelId,
        /// Absent for direct chats, where it equals the channel
        #[serde(default)]
        sender_id: Option<ChannelId>,
        /// Absent for photos, stickers and other non-text posts
        #[serde(default)]
        text: String,
        chat: ChatKind,
    },
    #[serde(other)]
    Unknown,
}

impl ControlInbound {
    pub fn into_event(self) -> Option<ControlEvent> {
        match self {
            ControlInbound::Message {
                channel_id,
                sender_id,
                text,
                chat,
            } => Some(ControlEvent {
                channel_id,
                sender_id: sender_id.unwrap_or(channel_id),
                text,
                kind: chat,
            }),
            ControlInbound::Unknown => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControlOutbound<'a> {
    Auth { token: &'a str },
    Send { channel_id: ChannelId, text: &'a str },
}

// ----------------------------------------------------------------------------
// Field Gateway
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldInbound {
    Message {
        id: String,
        from: String,
        #[serde(default)]
        text: String,
        #[serde(default)]
        kind: MessageKind,
    },
    Receipt {
        id: String,
        from: String,
        #[serde(default)]
        receipt_type: Option<String>,
    },
    #[serde(other)]
    Unknown,
}

impl FieldInbound {
    pub fn into_event(self) -> Option<FieldEvent> {
        match self {
            FieldInbound::Message {
                id,
                from,
                text,
                kind,
            } => Some(FieldEvent::Message(FieldMessage {
                id,
                address: from,
                text,
                kind,
            })),
            FieldInbound::Receipt {
                id,
                from,
                receipt_type,
            } => Some(FieldEvent::Receipt(ReceiptFrame {
                id,
                address: from,
                receipt_type,
            })),
            FieldInbound::Unknown => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FieldOutbound<'a> {
    Auth {
        token: &'a str,
    },
    Send {
        to: &'a str,
        text: &'a str,
    },
    /// Read receipt for a message we received
    Receipt {
        id: &'a str,
        to: &'a str,
        status: &'static str,
    },
    /// Acknowledgement of a receipt the network sent us
    Ack {
        id: &'a str,
        class: &'static str,
        receipt_type: Option<&'a str>,
        to: &'a str,
    },
}

impl<'a> FieldOutbound<'a> {
    pub fn read_receipt(message: &'a FieldMessage) -> Self {
        FieldOutbound::Receipt {
            id: &message.id,
            to: &message.address,
            status: "read",
        }
    }

    pub fn ack(receipt: &'a ReceiptFrame) -> Self {
        FieldOutbound::Ack {
            id: &receipt.id,
            class: "receipt",
            receipt_type: receipt.receipt_type.as_deref(),
            to: &receipt.address,
        }
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
