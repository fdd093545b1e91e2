//! Join state machine definition

/// Probes sent before giving up on the modem
pub const PROBE_ATTEMPTS: u8 = 3;

/// How the modem came to be on the network
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Association {
    /// The modem was still associated from an earlier boot
    Remembered,
    /// A fresh join completed
    Joined,
}

/// Reasons the sequence ended without connectivity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum JoinFailure {
    /// No answer to any probe
    NoResponse,
    /// Modem did not come back after reset
    ResetFailed,
    /// Station mode was refused
    ModeRejected,
    /// Access point did not hand out an address
    JoinRejected,
    /// Credentials do not fit in a join command
    CredentialsTooLong,
}

impl JoinFailure {
    /// Human readable reason for logs and status lines
    pub fn reason(&self) -> &'static str {
        match self {
            JoinFailure::NoResponse => "modem not responding",
            JoinFailure::ResetFailed => "modem silent after reset",
            JoinFailure::ModeRejected => "station mode rejected",
            JoinFailure::JoinRejected => "join failed, no IP",
            JoinFailure::CredentialsTooLong => "credentials too long",
        }
    }
}

/// Outcome of the exchange performed for a state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum JoinEvent {
    /// Expected marker arrived in time
    Responded,
    /// Deadline passed without the marker
    NoResponse,
}

/// Join sequence states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum JoinState {
    /// Checking the modem answers `AT`; `attempt` counts probes already sent
    Probe { attempt: u8 },
    /// Asking whether an association survived
    CheckExisting,
    /// Restarting the modem
    Reset,
    /// Selecting station mode
    ModeSet,
    /// Joining the access point
    Join,
    /// On the network
    Connected(Association),
    /// Gave up
    Failed(JoinFailure),
}

impl JoinState {
    /// Entry state
    pub const fn start() -> Self {
        JoinState::Probe { attempt: 0 }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JoinState::Connected(_) | JoinState::Failed(_))
    }

    /// Process an event and return the next state
    pub fn transition(self, event: JoinEvent) -> Self {
        use JoinEvent::*;
        use JoinState::*;

        match (self, event) {
            (Probe { .. }, Responded) => CheckExisting,
            (Probe { attempt }, NoResponse) if attempt + 1 < PROBE_ATTEMPTS => Probe {
                attempt: attempt + 1,
            },
            (Probe { .. }, NoResponse) => Failed(JoinFailure::NoResponse),

            (CheckExisting, Responded) => Connected(Association::Remembered),
            (CheckExisting, NoResponse) => Reset,

            (Reset, Responded) => ModeSet,
            (Reset, NoResponse) => Failed(JoinFailure::ResetFailed),

            (ModeSet, Responded) => Join,
            (ModeSet, NoResponse) => Failed(JoinFailure::ModeRejected),

            (Join, Responded) => Connected(Association::Joined),
            (Join, NoResponse) => Failed(JoinFailure::JoinRejected),

            // Terminal states absorb everything
            (Connected(_), _) | (Failed(_), _) => self,
        }
    }
}
