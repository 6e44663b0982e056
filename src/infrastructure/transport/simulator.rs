//! Simulated vending machine adapter.
//!
//! Desktop builds have no phone-style serial Bluetooth stack, so this
//! backend stands in for one: it keeps a radio flag, a bonded list, a set
//! of nearby devices that surface over the course of a scan, and a single
//! serial channel that records every frame written to it. The whole app
//! runs end to end against it, and tests drive it through the same
//! [`SerialTransport`] trait the real adapter would implement.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, Notify};
use tokio::time::Instant;
use tracing::{debug, info};

use crate::domain::models::Device;
use crate::infrastructure::transport::adapter::{
    SerialTransport, TransportError, TransportEvent,
};

const PAIRING_DELAY: Duration = Duration::from_millis(150);
const CONNECT_DELAY: Duration = Duration::from_millis(200);

struct NearbyDevice {
    device: Device,
    /// How far into a scan this device surfaces.
    reveal_after: Duration,
}

#[derive(Default)]
struct SimState {
    enabled: bool,
    paired: Vec<Device>,
    nearby: Vec<NearbyDevice>,
    connected: Option<Device>,
    written: Vec<Vec<u8>>,
    fail_next_writes: usize,
}

pub struct VendingMachineSimulator {
    state: Mutex<SimState>,
    cancel: Notify,
    events: mpsc::UnboundedSender<TransportEvent>,
}

impl VendingMachineSimulator {
    /// An empty adapter: radio off, nothing bonded, nothing nearby.
    pub fn new(events: mpsc::UnboundedSender<TransportEvent>) -> Self {
        Self {
            state: Mutex::new(SimState::default()),
            cancel: Notify::new(),
            events,
        }
    }

    /// The demo personality: radio on, the yogurt machine already bonded,
    /// and two stray devices that show up during a scan.
    pub fn demo(events: mpsc::UnboundedSender<TransportEvent>) -> Self {
        let sim = Self::new(events);
        {
            let mut state = sim.state();
            state.enabled = true;
            state
                .paired
                .push(Device::new("98:D3:32:20:AD:BD", "Yogurt Vending Machine"));
            state.nearby.push(NearbyDevice {
                device: Device::new("00:14:03:05:59:02", "MLT-BT05"),
                reveal_after: Duration::from_millis(400),
            });
            state.nearby.push(NearbyDevice {
                device: Device::new("20:16:04:18:61:60", "HC-05"),
                reveal_after: Duration::from_millis(900),
            });
        }
        sim
    }

    fn state(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn seed_enabled(&self, on: bool) {
        self.state().enabled = on;
    }

    pub fn seed_paired(&self, device: Device) {
        self.state().paired.push(device);
    }

    pub fn seed_nearby(&self, device: Device, reveal_after: Duration) {
        self.state().nearby.push(NearbyDevice {
            device,
            reveal_after,
        });
    }

    /// Makes the next `count` frame writes fail with a link error.
    pub fn fail_next_writes(&self, count: usize) {
        self.state().fail_next_writes = count;
    }

    /// Every frame accepted so far, oldest first.
    pub fn written_frames(&self) -> Vec<Vec<u8>> {
        self.state().written.clone()
    }

    /// Simulates the machine vanishing mid-session.
    pub fn drop_link(&self) {
        let mut state = self.state();
        if state.connected.take().is_some() {
            let _ = self.events.send(TransportEvent::ConnectionLost);
        }
    }

    fn turn_radio(&self, on: bool) {
        let mut state = self.state();
        if state.enabled == on {
            return;
        }
        state.enabled = on;
        if on {
            info!("radio turned on");
            let _ = self.events.send(TransportEvent::BluetoothEnabled);
        } else {
            info!("radio turned off");
            if state.connected.take().is_some() {
                let _ = self.events.send(TransportEvent::ConnectionLost);
            }
            let _ = self.events.send(TransportEvent::BluetoothDisabled);
        }
    }
}

#[async_trait]
impl SerialTransport for VendingMachineSimulator {
    async fn is_enabled(&self) -> Result<bool, TransportError> {
        Ok(self.state().enabled)
    }

    async fn list(&self) -> Result<Vec<Device>, TransportError> {
        Ok(self.state().paired.clone())
    }

    async fn discover_unpaired_devices(&self) -> Result<Vec<Device>, TransportError> {
        let schedule: Vec<(Duration, Device)> = {
            let state = self.state();
            if !state.enabled {
                return Err(TransportError::RadioDisabled);
            }
            let mut schedule: Vec<_> = state
                .nearby
                .iter()
                .map(|n| (n.reveal_after, n.device.clone()))
                .collect();
            schedule.sort_by_key(|(after, _)| *after);
            schedule
        };

        info!(nearby = schedule.len(), "discovery scan started");
        let started = Instant::now();
        let mut found = Vec::new();
        for (reveal_after, device) in schedule {
            let wait = reveal_after.saturating_sub(started.elapsed());
            tokio::select! {
                _ = tokio::time::sleep(wait) => {
                    debug!(device = %device.name, "device seen");
                    found.push(device);
                }
                _ = self.cancel.notified() => {
                    info!(found = found.len(), "discovery cancelled");
                    return Ok(found);
                }
            }
        }
        info!(found = found.len(), "discovery scan complete");
        Ok(found)
    }

    async fn cancel_discovery(&self) -> Result<(), TransportError> {
        // Wakes only a scan that is currently running; no permit is stored
        // that could cut a future scan short.
        self.cancel.notify_waiters();
        Ok(())
    }

    async fn request_enable(&self) -> Result<(), TransportError> {
        // The simulated user always says yes.
        self.turn_radio(true);
        Ok(())
    }

    async fn enable(&self) -> Result<(), TransportError> {
        self.turn_radio(true);
        Ok(())
    }

    async fn disable(&self) -> Result<(), TransportError> {
        self.turn_radio(false);
        Ok(())
    }

    async fn pair_device(&self, id: &str) -> Result<bool, TransportError> {
        {
            let state = self.state();
            if !state.enabled {
                return Err(TransportError::RadioDisabled);
            }
        }
        tokio::time::sleep(PAIRING_DELAY).await;

        let mut state = self.state();
        if state.paired.iter().any(|d| d.id == id) {
            return Ok(true);
        }
        match state.nearby.iter().position(|n| n.device.id == id) {
            Some(pos) => {
                let nearby = state.nearby.remove(pos);
                info!(device = %nearby.device.name, "bonded");
                state.paired.push(nearby.device);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn connect(&self, id: &str) -> Result<(), TransportError> {
        let device = {
            let state = self.state();
            if !state.enabled {
                return Err(TransportError::RadioDisabled);
            }
            state
                .paired
                .iter()
                .find(|d| d.id == id)
                .cloned()
                .ok_or_else(|| TransportError::NotPaired(id.to_string()))?
        };
        tokio::time::sleep(CONNECT_DELAY).await;

        let mut state = self.state();
        // The radio may have been flipped off mid-handshake
        if !state.enabled {
            return Err(TransportError::RadioDisabled);
        }
        info!(device = %device.name, "serial channel open");
        state.connected = Some(device);
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), TransportError> {
        let mut state = self.state();
        if let Some(device) = state.connected.take() {
            info!(device = %device.name, "serial channel closed");
        }
        Ok(())
    }

    async fn write(&self, data: &[u8]) -> Result<(), TransportError> {
        let mut state = self.state();
        if state.connected.is_none() {
            return Err(TransportError::NotConnected);
        }
        if state.fail_next_writes > 0 {
            state.fail_next_writes -= 1;
            return Err(TransportError::Link("frame rejected by peer".to_string()));
        }
        state.written.push(data.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn machine() -> Device {
        Device::new("98:D3:32:20:AD:BD", "Yogurt Vending Machine")
    }

    fn rig() -> (
        VendingMachineSimulator,
        mpsc::UnboundedReceiver<TransportEvent>,
    ) {
        let (tx, rx) = mpsc::unbounded_channel();
        (VendingMachineSimulator::new(tx), rx)
    }

    #[tokio::test(start_paused = true)]
    async fn test_discovery_reveals_nearby_devices_in_order() {
        let (sim, _rx) = rig();
        sim.seed_enabled(true);
        sim.seed_nearby(Device::new("BB", "late"), Duration::from_millis(300));
        sim.seed_nearby(Device::new("AA", "early"), Duration::from_millis(100));

        let found = sim.discover_unpaired_devices().await.unwrap();
        let names: Vec<_> = found.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["early", "late"]);
    }

    #[tokio::test]
    async fn test_discovery_requires_radio() {
        let (sim, _rx) = rig();
        let err = sim.discover_unpaired_devices().await.unwrap_err();
        assert!(matches!(err, TransportError::RadioDisabled));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_discovery_returns_partial_results() {
        let (sim, _rx) = rig();
        sim.seed_enabled(true);
        sim.seed_nearby(Device::new("AA", "early"), Duration::from_millis(100));
        sim.seed_nearby(Device::new("BB", "very late"), Duration::from_secs(10));

        let sim = Arc::new(sim);
        let scan = {
            let sim = sim.clone();
            tokio::spawn(async move { sim.discover_unpaired_devices().await })
        };

        tokio::time::sleep(Duration::from_secs(1)).await;
        sim.cancel_discovery().await.unwrap();

        let found = scan.await.unwrap().unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "early");
    }

    #[tokio::test(start_paused = true)]
    async fn test_pairing_moves_device_to_bonded_list() {
        let (sim, _rx) = rig();
        sim.seed_enabled(true);
        sim.seed_nearby(machine(), Duration::from_millis(100));

        assert!(sim.pair_device(&machine().id).await.unwrap());
        assert_eq!(sim.list().await.unwrap(), vec![machine()]);

        // a later scan no longer reports it as unpaired
        let found = sim.discover_unpaired_devices().await.unwrap();
        assert!(found.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_pairing_unknown_address_is_refused() {
        let (sim, _rx) = rig();
        sim.seed_enabled(true);
        assert!(!sim.pair_device("11:22:33:44:55:66").await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_connect_rejects_unpaired_device() {
        let (sim, _rx) = rig();
        sim.seed_enabled(true);
        let err = sim.connect(&machine().id).await.unwrap_err();
        assert!(matches!(err, TransportError::NotPaired(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_write_needs_open_channel() {
        let (sim, _rx) = rig();
        sim.seed_enabled(true);
        let err = sim.write(b"A").await.unwrap_err();
        assert!(matches!(err, TransportError::NotConnected));
    }

    #[tokio::test(start_paused = true)]
    async fn test_disable_drops_connection_and_notifies() {
        let (sim, mut rx) = rig();
        sim.seed_enabled(true);
        sim.seed_paired(machine());
        sim.connect(&machine().id).await.unwrap();

        sim.disable().await.unwrap();

        assert_eq!(rx.try_recv(), Ok(TransportEvent::ConnectionLost));
        assert_eq!(rx.try_recv(), Ok(TransportEvent::BluetoothDisabled));
        assert!(!sim.is_enabled().await.unwrap());
        assert!(matches!(
            sim.write(b"A").await.unwrap_err(),
            TransportError::NotConnected
        ));
    }

    #[tokio::test]
    async fn test_repeated_enable_emits_one_event() {
        let (sim, mut rx) = rig();
        sim.enable().await.unwrap();
        sim.enable().await.unwrap();

        assert_eq!(rx.try_recv(), Ok(TransportEvent::BluetoothEnabled));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_injected_write_failures_come_first() {
        let (sim, _rx) = rig();
        sim.seed_enabled(true);
        sim.seed_paired(machine());
        sim.connect(&machine().id).await.unwrap();
        sim.fail_next_writes(2);

        assert!(sim.write(b"one").await.is_err());
        assert!(sim.write(b"two").await.is_err());
        assert!(sim.write(b"three").await.is_ok());
        assert_eq!(sim.written_frames(), vec![b"three".to_vec()]);
    }

    #[tokio::test]
    async fn test_demo_profile_has_machine_bonded() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let sim = VendingMachineSimulator::demo(tx);
        assert!(sim.is_enabled().await.unwrap());
        let bonded = sim.list().await.unwrap();
        assert!(bonded.iter().any(|d| d.id == "98:D3:32:20:AD:BD"));
    }
}
