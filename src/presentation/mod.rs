//! Presentation Module
//!
//! The egui shell: one portrait window with a home tab and a connect tab,
//! plus the scan sheet and the notice dialogs floating above them.

pub mod app;
pub mod components;
pub mod tabs;
pub mod theme;

pub use app::VendingApp;
