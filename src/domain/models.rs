/// A Bluetooth device as reported by the transport adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Device {
    /// Adapter identifier, typically the MAC address ("98:D3:32:20:AD:BD").
    pub id: String,
    pub name: String,
}

impl Device {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Disconnected,
    Connecting,
    Connected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Home,
    Connect,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageSeverity {
    Info,
    Success,
    Warning,
    Error,
}

/// A blocking alert dialog. Dialogs queue FIFO and are dismissed one at a
/// time; `follow_up` runs when the user presses OK.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub title: String,
    pub body: Option<String>,
    pub severity: MessageSeverity,
    pub follow_up: Option<NoticeFollowUp>,
}

impl Notice {
    pub fn new(title: impl Into<String>, severity: MessageSeverity) -> Self {
        Self {
            title: title.into(),
            body: None,
            severity,
            follow_up: None,
        }
    }

    pub fn info(title: impl Into<String>) -> Self {
        Self::new(title, MessageSeverity::Info)
    }

    pub fn success(title: impl Into<String>) -> Self {
        Self::new(title, MessageSeverity::Success)
    }

    pub fn warning(title: impl Into<String>) -> Self {
        Self::new(title, MessageSeverity::Warning)
    }

    pub fn error(title: impl Into<String>) -> Self {
        Self::new(title, MessageSeverity::Error)
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_follow_up(mut self, follow_up: NoticeFollowUp) -> Self {
        self.follow_up = Some(follow_up);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeFollowUp {
    /// Return to the HOME tab (the connect dialog's OK button does this).
    ShowHome,
}

/// Commands the session controller sends to the transport worker. Each maps
/// to one adapter call from the capability set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportCommand {
    /// Joint `is_enabled` + `list` query issued once at startup.
    Initialize,
    RequestEnable,
    Enable,
    Disable,
    Discover,
    CancelDiscovery,
    Pair(Device),
    Connect(Device),
    Disconnect,
    /// Packetize the message and write every packet.
    Send(String),
}

/// Adapter operations, used to attribute a rejected call to the optimistic
/// state flag it owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterOp {
    Initialize,
    RequestEnable,
    Enable,
    Disable,
    Discover,
    CancelDiscovery,
    Pair,
    Connect,
    Disconnect,
    Send,
}

/// Outcome of one packetized send: every packet write is attempted, then the
/// failures are reported with their packet index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteReport {
    pub payload: String,
    pub packet_count: usize,
    pub failures: Vec<PacketFailure>,
}

impl WriteReport {
    pub fn is_ok(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PacketFailure {
    pub index: usize,
    pub reason: String,
}

/// Events delivered to the session controller: adapter call results plus the
/// adapter's own event stream, merged onto one channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Initialized { enabled: bool, paired: Vec<Device> },
    /// Resolution of `enable` / `disable` / `request_enable`.
    RadioStateChanged { enabled: bool },
    /// `bluetoothEnabled` adapter event.
    RadioEnabled,
    /// `bluetoothDisabled` adapter event.
    RadioDisabled,
    DiscoveryFinished { devices: Vec<Device> },
    DiscoveryCancelled,
    PairFinished { device: Device, paired: bool },
    Connected { device: Device },
    Disconnected,
    /// `connectionLost` adapter event.
    ConnectionLost,
    WriteFinished(WriteReport),
    /// `error` adapter event; logged, never shown as a dialog.
    AdapterError { message: String },
    /// A rejected adapter call; surfaces as a dialog carrying the message.
    CallFailed { op: AdapterOp, message: String },
}
