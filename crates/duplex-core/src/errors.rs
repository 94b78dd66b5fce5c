//! Error types for the Duplex relay
//!
//! Directory and transport errors each get their own enum; `BridgeError`
//! unifies them for callers that do not care which layer failed.

// ----------------------------------------------------------------------------
// Specific Error Types
// ----------------------------------------------------------------------------

/// Contact directory errors
///
/// Lookups report misses as `Option::None`; only mutations use `NotFound`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DirectoryError {
    #[error("No matching record")]
    NotFound,
    #[error("A contact with that name or address already exists")]
    DuplicateContact,
    #[error("Address is already blacklisted")]
    DuplicateBlacklist,
    #[error("Group {group} is already bound to {bound_to}")]
    DuplicateGroup { group: i64, bound_to: String },
    #[error("Storage failure: {0}")]
    Storage(String),
}

/// Failures surfacing from a network adapter session
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Connection to {endpoint} failed: {reason}")]
    ConnectionFailed { endpoint: String, reason: String },
    #[error("Session closed: {reason}")]
    Closed { reason: String },
    #[error("Protocol violation: {reason}")]
    Protocol { reason: String },
    #[error("Send failed: {reason}")]
    SendFailed { reason: String },
    #[error("Adapter is not connected")]
    NotConnected,
    /// The adapter panicked mid-session
    #[error("Adapter panicked: {reason}")]
    Panicked { reason: String },
}

impl TransportError {
    pub fn closed(reason: impl Into<String>) -> Self {
        Self::Closed {
            reason: reason.into(),
        }
    }

    pub fn protocol(reason: impl Into<String>) -> Self {
        Self::Protocol {
            reason: reason.into(),
        }
    }
}

// ----------------------------------------------------------------------------
// Main Error Type
// ----------------------------------------------------------------------------

/// Umbrella error for the relay
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("Directory error: {0}")]
    Directory(#[from] DirectoryError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Task failed: {0}")]
    Task(String),
}

pub type BridgeResult<T> = Result<T, BridgeError>;
pub type DirectoryResult<T> = Result<T, DirectoryError>;
pub type TransportResult<T> = Result<T, TransportError>;

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
