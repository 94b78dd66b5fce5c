//! Duplex Core
//!
//! Foundational pieces of the Duplex relay between a control network (one
//! operator, optional group channels) and a field network (many peers keyed
//! by address):
//! - `ContactDirectory`: persistent identity mapping, blacklist and group binding
//! - `command`: the administrative text grammar
//! - `format`: envelopes, listings and message chunking
//! - `transport`: the adapter traits both network sides implement
//!
//! Routing and connection supervision live in `duplex-runtime`.

// ----------------------------------------------------------------------------
// Module Declarations
// ----------------------------------------------------------------------------

pub mod command;
pub mod directory;
pub mod errors;
pub mod format;
pub mod transport;
pub mod types;

// ----------------------------------------------------------------------------
// Public API
// ----------------------------------------------------------------------------

pub use command::{AdminCommand, UsageError};
pub use directory::{ContactDirectory, DirectoryStore, JsonFileStore, MemoryStore};
pub use errors::{
    BridgeError, BridgeResult, DirectoryError, DirectoryResult, TransportError, TransportResult,
};
pub use transport::{ControlAdapter, FieldAdapter};
pub use types::{
    ChannelId, ChatKind, ContactEntry, ContactRecord, ControlEvent, Effect, FieldEvent,
    FieldMessage, MessageKind, NetworkSide, OutboundControl, OutboundField, ReceiptFrame,
};
