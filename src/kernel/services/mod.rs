//! Services layer (ports + adapters).
//!
//! - `ports`: contracts for the collaborators the session drives.
//! - `adapters`: host specific implementations (local IO, console).

pub mod adapters;
pub mod bus;
pub mod ports;

pub use bus::{session_bus, ProcessId, SessionEvent, SessionEventReceiver, SessionEventSender};
