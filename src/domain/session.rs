//! Session state and the transitions that drive it.
//!
//! All mutable UI state lives in a single [`SessionState`] owned by the
//! [`SessionController`]. The presentation layer reads the state and calls
//! the controller's action methods; transport outcomes come back as
//! [`SessionEvent`]s and are folded in through [`SessionController::apply`].
//! Nothing else writes the state, so every screen repaint observes one
//! coherent snapshot.

use std::collections::VecDeque;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::domain::models::{
    AdapterOp, ConnectionStatus, Device, Notice, NoticeFollowUp, SessionEvent, Tab,
    TransportCommand, WriteReport,
};
use crate::domain::settings::Settings;

/// Price of a single drink, deducted from the balance on confirmation.
pub const DRINK_PRICE: i32 = 3;

/// Drink slots the vending machine firmware understands.
///
/// The machine selects a dispenser from the first byte of the delivered
/// message, so the payloads are single letters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrinkSelection {
    Drink1,
    Drink2,
    Drink3,
}

impl DrinkSelection {
    pub const ALL: [DrinkSelection; 3] = [Self::Drink1, Self::Drink2, Self::Drink3];

    /// Maps a delivered payload back to the drink it selects. Payloads the
    /// firmware does not recognize yield `None` and never touch the balance.
    pub fn from_payload(payload: &str) -> Option<Self> {
        match payload {
            "A" => Some(Self::Drink1),
            "B" => Some(Self::Drink2),
            "C" => Some(Self::Drink3),
            _ => None,
        }
    }

    pub fn payload(&self) -> &'static str {
        match self {
            Self::Drink1 => "A",
            Self::Drink2 => "B",
            Self::Drink3 => "C",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Drink1 => "Drink 1",
            Self::Drink2 => "Drink 2",
            Self::Drink3 => "Drink 3",
        }
    }
}

/// Everything the single screen renders.
#[derive(Debug, Clone)]
pub struct SessionState {
    /// Whether the Bluetooth radio is currently on.
    pub radio_enabled: bool,
    /// True while a discovery scan is running.
    pub discovering: bool,
    /// Devices bonded to this phone.
    pub paired_devices: Vec<Device>,
    /// Devices seen by the most recent discovery scan.
    pub unpaired_devices: Vec<Device>,
    /// The device of the last successful connection, kept across drops so
    /// a lost link can be reported by name and reconnected with one tap.
    pub active_device: Option<Device>,
    pub connection: ConnectionStatus,
    pub tab: Tab,
    /// Prepaid balance shown on the home tab. May go negative; the machine
    /// is the authority on whether it dispenses.
    pub balance: i32,
    /// True while the scan sheet is shown.
    pub scan_modal_open: bool,
    /// True from the moment a message is handed to the transport until its
    /// outcome arrives. Blocks a second purchase from overlapping the first.
    pub write_in_flight: bool,
    /// Pending user-facing messages, shown front first.
    pub notices: VecDeque<Notice>,
}

impl SessionState {
    fn new(starting_balance: i32) -> Self {
        Self {
            radio_enabled: false,
            discovering: false,
            paired_devices: Vec::new(),
            unpaired_devices: Vec::new(),
            active_device: None,
            connection: ConnectionStatus::Disconnected,
            tab: Tab::Home,
            balance: starting_balance,
            scan_modal_open: false,
            write_in_flight: false,
            notices: VecDeque::new(),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connection == ConnectionStatus::Connected
    }
}

/// Owns the [`SessionState`] and the command side of the transport worker.
///
/// Action methods mutate the state optimistically where the screen needs
/// immediate feedback (discovery, connecting, write in flight) and queue the
/// matching [`TransportCommand`]; [`apply`](Self::apply) settles those flags
/// when the worker reports back.
pub struct SessionController {
    state: SessionState,
    machine_address: String,
    commands: mpsc::UnboundedSender<TransportCommand>,
}

impl SessionController {
    pub fn new(commands: mpsc::UnboundedSender<TransportCommand>, settings: &Settings) -> Self {
        Self {
            state: SessionState::new(settings.starting_balance),
            machine_address: settings.machine_address.clone(),
            commands,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// The notice currently on screen, if any.
    pub fn current_notice(&self) -> Option<&Notice> {
        self.state.notices.front()
    }

    fn send(&self, command: TransportCommand) {
        let _ = self.commands.send(command);
    }

    fn push_notice(&mut self, notice: Notice) {
        self.state.notices.push_back(notice);
    }

    /// Queries the adapter for the radio state and the bonded device list.
    /// Called once at startup.
    pub fn initialize(&self) {
        self.send(TransportCommand::Initialize);
    }

    pub fn select_tab(&mut self, tab: Tab) {
        self.state.tab = tab;
    }

    /// The radio switch on the connect tab.
    pub fn toggle_radio(&mut self, on: bool) {
        if on {
            self.send(TransportCommand::Enable);
        } else {
            self.send(TransportCommand::Disable);
        }
    }

    /// Asks the user to turn the radio on instead of forcing it.
    pub fn request_enable(&mut self) {
        self.send(TransportCommand::RequestEnable);
    }

    /// Starts a discovery scan unless one is already running.
    pub fn start_discovery(&mut self) {
        if self.state.discovering {
            return;
        }
        self.state.discovering = true;
        self.send(TransportCommand::Discover);
    }

    /// Cancels a running scan. Does nothing, and talks to nobody, when no
    /// scan is running. The `discovering` flag stays up until the worker
    /// confirms the cancellation.
    pub fn cancel_discovery(&mut self) {
        if !self.state.discovering {
            return;
        }
        self.send(TransportCommand::CancelDiscovery);
    }

    /// A tap on a device row. Known bonded devices connect directly; freshly
    /// discovered ones go through pairing first and connect on success.
    pub fn device_pressed(&mut self, device: &Device) {
        let already_paired = self.state.paired_devices.iter().any(|d| d.id == device.id);
        if already_paired {
            self.connect(device);
        } else {
            info!(device = %device.name, "pairing");
            self.send(TransportCommand::Pair(device.clone()));
        }
    }

    pub fn connect(&mut self, device: &Device) {
        info!(device = %device.name, "connecting");
        self.state.connection = ConnectionStatus::Connecting;
        self.send(TransportCommand::Connect(device.clone()));
    }

    pub fn disconnect(&mut self) {
        self.send(TransportCommand::Disconnect);
    }

    /// The connection switch on the connect tab.
    pub fn toggle_connection(&mut self, on: bool) {
        if on {
            if let Some(device) = self.state.active_device.clone() {
                self.connect(&device);
            }
        } else {
            self.disconnect();
        }
    }

    /// A tap on the "not connected" banner on the home tab. Switches to the
    /// connect tab and takes the most useful next step on the way: turning
    /// the radio on, or connecting straight to the configured machine when
    /// it is already bonded.
    pub fn not_connected_pressed(&mut self) {
        self.state.tab = Tab::Connect;
        if !self.state.radio_enabled {
            self.send(TransportCommand::Enable);
            return;
        }
        let machine = self
            .state
            .paired_devices
            .iter()
            .find(|d| d.id == self.machine_address)
            .cloned();
        if let Some(machine) = machine {
            info!(device = %machine.name, "vending machine already paired, connecting");
            self.connect(&machine);
        }
    }

    pub fn open_scan_modal(&mut self) {
        self.state.scan_modal_open = true;
    }

    pub fn dismiss_scan_modal(&mut self) {
        self.state.scan_modal_open = false;
    }

    /// A payload arrived from the scanner. The sheet closes either way;
    /// the payload is only forwarded while a connection is up.
    pub fn scan_received(&mut self, payload: &str) {
        self.state.scan_modal_open = false;
        if !self.state.is_connected() {
            self.push_notice(Notice::warning("Connection to vending machine is lost"));
            return;
        }
        self.send_message(payload);
    }

    /// Hands a message to the transport worker for delivery.
    pub fn send_message(&mut self, payload: &str) {
        if !self.state.is_connected() {
            self.push_notice(Notice::warning("You must connect to device first"));
            return;
        }
        if self.state.write_in_flight {
            self.push_notice(Notice::warning("A purchase is already in progress"));
            return;
        }
        debug!(payload, "sending message");
        self.state.write_in_flight = true;
        self.send(TransportCommand::Send(payload.to_string()));
    }

    /// Pops the current notice and performs its follow-up, if any.
    pub fn dismiss_notice(&mut self) {
        if let Some(notice) = self.state.notices.pop_front() {
            match notice.follow_up {
                Some(NoticeFollowUp::ShowHome) => self.state.tab = Tab::Home,
                None => {}
            }
        }
    }

    /// Folds a transport outcome into the state.
    pub fn apply(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::Initialized { enabled, paired } => {
                self.state.radio_enabled = enabled;
                self.state.paired_devices = paired;
            }
            SessionEvent::RadioStateChanged { enabled } => {
                self.state.radio_enabled = enabled;
            }
            SessionEvent::RadioEnabled => {
                self.state.radio_enabled = true;
                self.push_notice(Notice::info("Bluetooth enabled"));
            }
            SessionEvent::RadioDisabled => {
                self.state.radio_enabled = false;
                self.push_notice(Notice::info("Bluetooth disabled"));
            }
            SessionEvent::DiscoveryFinished { devices } => {
                self.state.unpaired_devices = devices;
                self.state.discovering = false;
            }
            SessionEvent::DiscoveryCancelled => {
                self.state.discovering = false;
            }
            SessionEvent::PairFinished { device, paired } => self.pair_finished(device, paired),
            SessionEvent::Connected { device } => {
                self.state.connection = ConnectionStatus::Connected;
                self.state.active_device = Some(device);
                self.push_notice(
                    Notice::success("Connected to the vending machine")
                        .with_body("Please proceed with drink selection!")
                        .with_follow_up(NoticeFollowUp::ShowHome),
                );
            }
            SessionEvent::Disconnected => {
                self.state.connection = ConnectionStatus::Disconnected;
            }
            SessionEvent::ConnectionLost => {
                if let Some(device) = &self.state.active_device {
                    self.push_notice(Notice::warning(format!(
                        "Connection to device {} has been lost",
                        device.name
                    )));
                }
                self.state.connection = ConnectionStatus::Disconnected;
            }
            SessionEvent::WriteFinished(report) => self.write_finished(report),
            SessionEvent::AdapterError { message } => {
                warn!("Bluetooth error: {message}");
            }
            SessionEvent::CallFailed { op, message } => self.call_failed(op, message),
        }
    }

    fn pair_finished(&mut self, device: Device, paired: bool) {
        if !paired {
            self.push_notice(Notice::warning(format!(
                "Device {} pairing failed",
                device.name
            )));
            return;
        }
        self.push_notice(Notice::success(format!(
            "Device {} paired successfully",
            device.name
        )));
        self.state.unpaired_devices.retain(|d| d.id != device.id);
        if !self.state.paired_devices.iter().any(|d| d.id == device.id) {
            self.state.paired_devices.push(device.clone());
        }
        self.connect(&device);
    }

    fn write_finished(&mut self, report: WriteReport) {
        self.state.write_in_flight = false;
        if report.is_ok() {
            debug!(
                payload = %report.payload,
                packets = report.packet_count,
                "message delivered"
            );
            if let Some(selection) = DrinkSelection::from_payload(&report.payload) {
                self.state.balance -= DRINK_PRICE;
                self.push_notice(
                    Notice::success(format!("{} is purchased!", selection.label()))
                        .with_body("Please enjoy your drink!"),
                );
            }
            return;
        }
        let indices: Vec<String> = report
            .failures
            .iter()
            .map(|f| (f.index + 1).to_string())
            .collect();
        let reason = report
            .failures
            .first()
            .map(|f| f.reason.clone())
            .unwrap_or_default();
        self.push_notice(
            Notice::error(format!(
                "Delivery failed for packet {} of {}",
                indices.join(", "),
                report.packet_count
            ))
            .with_body(reason),
        );
    }

    /// An adapter call failed outright. Settle the optimistic flag the call
    /// owned so the screen does not stay stuck in a pending look, then tell
    /// the user.
    fn call_failed(&mut self, op: AdapterOp, message: String) {
        match op {
            AdapterOp::Discover => self.state.discovering = false,
            AdapterOp::Connect => self.state.connection = ConnectionStatus::Disconnected,
            AdapterOp::Send => self.state.write_in_flight = false,
            _ => {}
        }
        self.push_notice(Notice::error(message));
    }
}
