//! Infrastructure Module
//!
//! Everything that touches the outside world: the transport stack and the
//! tracing setup.

pub mod logging;
pub mod transport;
