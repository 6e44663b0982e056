//! Desktop companion app for a Bluetooth serial vending machine.
//!
//! The machine speaks a legacy serial protocol: messages are encoded to
//! code page 852 and delivered as fixed-size space-padded frames. This
//! crate drives that protocol end to end, from the scan sheet on screen
//! down to the per-frame delivery report.

pub mod domain;
pub mod infrastructure;
pub mod presentation;
