//! Duplex Runtime Engine
//!
//! This crate contains the moving parts of the relay:
//! - `Router`: decides what every inbound message turns into
//! - `ControlSession` / `FieldSession`: pump one adapter's inbound events into
//!   the router and its outbound queue into the adapter
//! - `Supervisor`: keeps one session alive, reconnecting after a fixed delay
//! - `RuntimeBuilder`: wires both sides and starts one supervisor per network
//!
//! `duplex-core` provides the directory, command grammar and adapter traits.

pub mod builder;
pub mod effects;
pub mod router;
pub mod session;
pub mod supervisor;

pub use builder::{RuntimeBuilder, RuntimeHandle};
pub use effects::{effect_channels, EffectDispatcher, EffectQueues};
pub use router::{Router, RouterConfig};
pub use session::{ControlSession, FieldSession, SessionDriver};
pub use supervisor::{RetryPolicy, Supervisor, SupervisorState, SupervisorStats};

// Re-export core types for convenience
pub use duplex_core::{
    BridgeError, BridgeResult, ContactDirectory, ControlAdapter, Effect, FieldAdapter,
    NetworkSide, TransportError, TransportResult,
};
