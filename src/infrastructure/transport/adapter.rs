//! Adapter capability set for a serial Bluetooth transport.
//!
//! Modeled on the classic serial port profile: the radio can be toggled,
//! bonded devices listed, nearby devices discovered, and one connected
//! device accepts raw frames. Backends implement [`SerialTransport`];
//! everything above the worker sees only this trait.

use crate::domain::models::Device;
use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("Bluetooth radio is off")]
    RadioDisabled,
    #[error("device {0} is not paired")]
    NotPaired(String),
    #[error("no active connection")]
    NotConnected,
    #[error("serial link failure: {0}")]
    Link(String),
}

/// Unsolicited adapter notifications. The worker mirrors these onto the
/// session event loop so the screen learns about them on the next frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    BluetoothEnabled,
    BluetoothDisabled,
    ConnectionLost,
    Error(String),
}

#[async_trait]
pub trait SerialTransport: Send + Sync {
    /// Whether the radio is currently on.
    async fn is_enabled(&self) -> Result<bool, TransportError>;

    /// Devices already bonded to this host.
    async fn list(&self) -> Result<Vec<Device>, TransportError>;

    /// Runs a discovery scan to completion and returns the devices seen.
    /// A concurrent [`cancel_discovery`](Self::cancel_discovery) makes the
    /// scan return early with whatever it has found so far.
    async fn discover_unpaired_devices(&self) -> Result<Vec<Device>, TransportError>;

    async fn cancel_discovery(&self) -> Result<(), TransportError>;

    /// Asks the user to turn the radio on, as opposed to forcing it.
    async fn request_enable(&self) -> Result<(), TransportError>;

    async fn enable(&self) -> Result<(), TransportError>;

    async fn disable(&self) -> Result<(), TransportError>;

    /// Bonds with a device. `Ok(false)` means the peer refused.
    async fn pair_device(&self, id: &str) -> Result<bool, TransportError>;

    /// Opens the serial channel to a bonded device.
    async fn connect(&self, id: &str) -> Result<(), TransportError>;

    async fn disconnect(&self) -> Result<(), TransportError>;

    /// Writes one frame to the connected device.
    async fn write(&self, data: &[u8]) -> Result<(), TransportError>;
}
