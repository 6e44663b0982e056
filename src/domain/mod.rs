//! Domain Module
//!
//! Pure application logic with no I/O: the session state machine, the
//! packetizer that frames messages for the machine firmware, and the
//! persisted settings.
//!
//! ## Modules
//!
//! - [`models`] - Shared value types, commands, and events
//! - [`packetizer`] - Legacy code page encoding and fixed-size framing
//! - [`session`] - Session state and its transition functions
//! - [`settings`] - Persisted configuration

pub mod models;
pub mod packetizer;
pub mod session;
pub mod settings;

// Re-export the pieces the rest of the app touches constantly
pub use packetizer::Packetizer;
pub use session::SessionController;
