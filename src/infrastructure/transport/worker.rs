//! Transport worker thread.
//!
//! Owns the adapter. Commands arrive on an unbounded channel from the UI
//! thread; every command runs as its own task on a current-thread runtime,
//! so a cancel can overtake a discovery scan that is still in flight. All
//! outcomes, and the adapter's own notifications, funnel back to the UI as
//! [`SessionEvent`]s on a single channel.

use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use crate::domain::models::{
    AdapterOp, PacketFailure, SessionEvent, TransportCommand, WriteReport,
};
use crate::domain::packetizer::Packetizer;
use crate::infrastructure::transport::adapter::{
    SerialTransport, TransportError, TransportEvent,
};

/// Spawns the worker thread and returns the command side of it.
pub fn spawn_worker<T>(
    transport: Arc<T>,
    adapter_events: mpsc::UnboundedReceiver<TransportEvent>,
    events: mpsc::UnboundedSender<SessionEvent>,
    packetizer: Packetizer,
) -> mpsc::UnboundedSender<TransportCommand>
where
    T: SerialTransport + 'static,
{
    let (command_tx, mut command_rx) = mpsc::unbounded_channel();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("Failed to create tokio runtime for transport");

        rt.block_on(async move {
            let packetizer = Arc::new(packetizer);
            tokio::spawn(forward_adapter_events(adapter_events, events.clone()));

            while let Some(command) = command_rx.recv().await {
                let transport = transport.clone();
                let events = events.clone();
                let packetizer = packetizer.clone();
                tokio::spawn(async move {
                    run_command(command, transport, &events, &packetizer).await;
                });
            }
        });
    });

    command_tx
}

/// Mirrors the adapter's notification stream onto the session event loop.
async fn forward_adapter_events(
    mut adapter_events: mpsc::UnboundedReceiver<TransportEvent>,
    events: mpsc::UnboundedSender<SessionEvent>,
) {
    while let Some(event) = adapter_events.recv().await {
        let mapped = match event {
            TransportEvent::BluetoothEnabled => SessionEvent::RadioEnabled,
            TransportEvent::BluetoothDisabled => SessionEvent::RadioDisabled,
            TransportEvent::ConnectionLost => SessionEvent::ConnectionLost,
            TransportEvent::Error(message) => SessionEvent::AdapterError { message },
        };
        if events.send(mapped).is_err() {
            break;
        }
    }
}

async fn run_command<T>(
    command: TransportCommand,
    transport: Arc<T>,
    events: &mpsc::UnboundedSender<SessionEvent>,
    packetizer: &Packetizer,
) where
    T: SerialTransport,
{
    match command {
        TransportCommand::Initialize => {
            let (enabled, paired) = tokio::join!(transport.is_enabled(), transport.list());
            match (enabled, paired) {
                (Ok(enabled), Ok(paired)) => {
                    info!(enabled, bonded = paired.len(), "adapter initialized");
                    let _ = events.send(SessionEvent::Initialized { enabled, paired });
                }
                (Err(e), _) | (_, Err(e)) => fail(events, AdapterOp::Initialize, e),
            }
        }
        TransportCommand::RequestEnable => match transport.request_enable().await {
            Ok(()) => {
                let _ = events.send(SessionEvent::RadioStateChanged { enabled: true });
            }
            Err(e) => fail(events, AdapterOp::RequestEnable, e),
        },
        TransportCommand::Enable => match transport.enable().await {
            Ok(()) => {
                let _ = events.send(SessionEvent::RadioStateChanged { enabled: true });
            }
            Err(e) => fail(events, AdapterOp::Enable, e),
        },
        TransportCommand::Disable => match transport.disable().await {
            Ok(()) => {
                let _ = events.send(SessionEvent::RadioStateChanged { enabled: false });
            }
            Err(e) => fail(events, AdapterOp::Disable, e),
        },
        TransportCommand::Discover => match transport.discover_unpaired_devices().await {
            Ok(devices) => {
                info!(found = devices.len(), "discovery finished");
                let _ = events.send(SessionEvent::DiscoveryFinished { devices });
            }
            Err(e) => fail(events, AdapterOp::Discover, e),
        },
        TransportCommand::CancelDiscovery => match transport.cancel_discovery().await {
            Ok(()) => {
                let _ = events.send(SessionEvent::DiscoveryCancelled);
            }
            Err(e) => fail(events, AdapterOp::CancelDiscovery, e),
        },
        TransportCommand::Pair(device) => match transport.pair_device(&device.id).await {
            Ok(paired) => {
                info!(device = %device.name, paired, "pairing finished");
                let _ = events.send(SessionEvent::PairFinished { device, paired });
            }
            Err(e) => fail(events, AdapterOp::Pair, e),
        },
        TransportCommand::Connect(device) => match transport.connect(&device.id).await {
            Ok(()) => {
                info!(device = %device.name, "connected");
                let _ = events.send(SessionEvent::Connected { device });
            }
            Err(e) => fail(events, AdapterOp::Connect, e),
        },
        TransportCommand::Disconnect => match transport.disconnect().await {
            Ok(()) => {
                let _ = events.send(SessionEvent::Disconnected);
            }
            Err(e) => fail(events, AdapterOp::Disconnect, e),
        },
        TransportCommand::Send(message) => {
            let report = deliver(transport.as_ref(), packetizer, &message).await;
            let _ = events.send(SessionEvent::WriteFinished(report));
        }
    }
}

/// Frames a message and writes every packet. All writes are started before
/// any is awaited; packets after a failed one are still attempted, and each
/// failure is reported with its packet index.
async fn deliver<T>(transport: &T, packetizer: &Packetizer, message: &str) -> WriteReport
where
    T: SerialTransport + ?Sized,
{
    let packets = packetizer.packetize(message);
    let packet_count = packets.len();
    debug!(message, packets = packet_count, "delivering framed message");

    let writes = packets.iter().map(|packet| transport.write(packet));
    let outcomes = join_all(writes).await;

    let failures: Vec<PacketFailure> = outcomes
        .into_iter()
        .enumerate()
        .filter_map(|(index, outcome)| {
            outcome.err().map(|e| PacketFailure {
                index,
                reason: e.to_string(),
            })
        })
        .collect();

    if !failures.is_empty() {
        error!(
            message,
            failed = failures.len(),
            of = packet_count,
            "delivery incomplete"
        );
    }

    WriteReport {
        payload: message.to_string(),
        packet_count,
        failures,
    }
}

fn fail(events: &mpsc::UnboundedSender<SessionEvent>, op: AdapterOp, error: TransportError) {
    error!("{op:?} failed: {error}");
    let _ = events.send(SessionEvent::CallFailed {
        op,
        message: error.to_string(),
    });
}
