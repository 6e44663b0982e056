//! Transport Module
//!
//! Serial Bluetooth plumbing between the session controller and the
//! vending machine.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                      UI thread                           │
//! │   SessionController ──commands──▶          ◀──events──   │
//! └───────────────────────┬──────────────────────▲───────────┘
//!                         │                      │
//!                         ▼                      │
//! ┌──────────────────────────────────────────────┴───────────┐
//! │                 worker (own thread + runtime)            │
//! │   one task per command        adapter event forwarding   │
//! └───────────────────────┬──────────────────────▲───────────┘
//!                         │                      │
//!                         ▼                      │
//!               ┌──────────────────┐   ┌──────────────────┐
//!               │ SerialTransport  │   │  TransportEvent  │
//!               │ (adapter calls)  │   │  (notifications) │
//!               └──────────────────┘   └──────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`adapter`] - The [`SerialTransport`] capability set, errors, and events
//! - [`worker`] - Worker thread running adapter calls as concurrent tasks
//! - [`simulator`] - In-process adapter backend the desktop build runs on

pub mod adapter;
pub mod simulator;
pub mod worker;

// Re-export the pieces wired together at startup
pub use adapter::{SerialTransport, TransportError, TransportEvent};
pub use simulator::VendingMachineSimulator;
pub use worker::spawn_worker;
