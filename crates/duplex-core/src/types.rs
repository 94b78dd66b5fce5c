//! Shared types for both network sides and the contact directory

use core::fmt;
use serde::{Deserialize, Serialize};

/// Control-network channel identifier (direct chats and groups share the space)
pub type ChannelId = i64;

// ----------------------------------------------------------------------------
// Directory Records
// ----------------------------------------------------------------------------

/// One row of the persisted contact table
///
/// A record is either a named contact or a blacklist entry. Both roles may
/// share an address; they are kept as independent records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactRecord {
    /// Lowercased contact name, absent for blacklist entries
    #[serde(default)]
    pub name: Option<String>,
    /// Field-network address (e.g. phone number)
    pub address: String,
    /// Whether this is a blacklist entry
    #[serde(default)]
    pub blacklisted: bool,
    /// Bound control-network group
    #[serde(default)]
    pub group: Option<ChannelId>,
}

impl ContactRecord {
    /// Create a named contact record
    pub fn contact(name: &str, address: &str) -> Self {
        Self {
            name: Some(normalize_name(name)),
            address: address.to_string(),
            blacklisted: false,
            group: None,
        }
    }

    /// Create a blacklist-only record
    pub fn blacklist_entry(address: &str) -> Self {
        Self {
            name: None,
            address: address.to_string(),
            blacklisted: true,
            group: None,
        }
    }

    /// Whether this record is a deliverable contact
    pub fn is_contact(&self) -> bool {
        !self.blacklisted && self.name.is_some()
    }

    /// Whether this record names the given (already normalized) contact
    pub fn has_name(&self, normalized: &str) -> bool {
        self.is_contact() && self.name.as_deref() == Some(normalized)
    }
}

/// Names compare case-insensitively; the directory stores them lowercased.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Contact as returned by directory listings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactEntry {
    pub name: String,
    pub address: String,
    pub group: Option<ChannelId>,
}

// ----------------------------------------------------------------------------
// Network Sides
// ----------------------------------------------------------------------------

/// Which of the two bridged networks something belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkSide {
    /// Operator-facing network
    Control,
    /// Peer-facing network
    Field,
}

impl fmt::Display for NetworkSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkSide::Control => write!(f, "control"),
            NetworkSide::Field => write!(f, "field"),
        }
    }
}

/// Kind of control-network chat an event arrived on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatKind {
    Direct,
    Group,
    /// Channels, broadcast lists and anything else the gateway reports
    #[serde(other)]
    Other,
}

/// Inbound control-network message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlEvent {
    pub channel_id: ChannelId,
    pub sender_id: ChannelId,
    pub text: String,
    pub kind: ChatKind,
}

impl ControlEvent {
    /// Message in a one-to-one chat
    pub fn direct(channel_id: ChannelId, text: impl Into<String>) -> Self {
        Self {
            channel_id,
            sender_id: channel_id,
            text: text.into(),
            kind: ChatKind::Direct,
        }
    }

    /// Message posted by `sender_id` in group `channel_id`
    pub fn group(channel_id: ChannelId, sender_id: ChannelId, text: impl Into<String>) -> Self {
        Self {
            channel_id,
            sender_id,
            text: text.into(),
            kind: ChatKind::Group,
        }
    }
}

/// Payload kind of a field-network message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    #[default]
    Text,
    Media,
    #[serde(other)]
    Other,
}

/// Inbound field-network message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMessage {
    /// Network-assigned message id, echoed back in delivery receipts
    pub id: String,
    /// Sender address
    pub address: String,
    pub text: String,
    pub kind: MessageKind,
}

impl FieldMessage {
    pub fn text(id: impl Into<String>, address: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            address: address.into(),
            text: text.into(),
            kind: MessageKind::Text,
        }
    }
}

/// Delivery receipt reported by the field network for one of our messages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptFrame {
    pub id: String,
    pub address: String,
    pub receipt_type: Option<String>,
}

/// Anything the field adapter can surface
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldEvent {
    Message(FieldMessage),
    Receipt(ReceiptFrame),
}

// ----------------------------------------------------------------------------
// Effects: Routing Engine -> Adapters
// ----------------------------------------------------------------------------

/// Outbound side effect decided by the routing engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Deliver a (pre-chunked) message on a control channel
    SendControl { channel: ChannelId, text: String },
    /// Deliver a message to a field address
    SendField { address: String, text: String },
}

impl Effect {
    /// Side whose adapter performs this effect
    pub fn side(&self) -> NetworkSide {
        match self {
            Effect::SendControl { .. } => NetworkSide::Control,
            Effect::SendField { .. } => NetworkSide::Field,
        }
    }
}

/// Queued control-network delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundControl {
    pub channel: ChannelId,
    pub text: String,
}

/// Queued field-network delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundField {
    pub address: String,
    pub text: String,
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
