//! The BLE host seen from the peripheral core
//!
//! `BleHost` is the set of requests the core issues; `HostEvent` is what the
//! host reports back. Implementations live in `hci::HciHost` and, for tests,
//! in the crate's mock module.

use crate::error::HciError;
use crate::gap::{LeAddress, Phy, PhyMask};
use crate::smp::SecurityLevel;
use thiserror::Error;

/// Opaque, host-assigned connection handle.
pub type ConnHandle = u16;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    #[error("Host busy")]
    Busy,

    #[error("Invalid parameters")]
    InvalidParameters,

    #[error("Not connected")]
    NotConnected,

    #[error("Controller rejected command (status 0x{0:02X})")]
    Status(u8),

    #[error("Operation not supported by host")]
    Unsupported,

    #[error("Transport failure: {0}")]
    Transport(String),
}

impl From<HciError> for HostError {
    fn from(err: HciError) -> Self {
        HostError::Transport(err.to_string())
    }
}

pub type HostResult<T> = std::result::Result<T, HostError>;

/// Advertising parameter set.
///
/// Filtered and open advertising differ only in `filter_accept_list` and
/// `one_shot`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdvParams {
    /// Minimum interval in 0.625 ms units
    pub interval_min: u16,
    /// Maximum interval in 0.625 ms units
    pub interval_max: u16,
    pub connectable: bool,
    pub filter_accept_list: bool,
    /// Stop advertising once a connection forms. Legacy connectable
    /// advertising always ends on connection, so `HciHost` has nothing to
    /// send for it; `AdvertisingController` never re-arms while connected.
    pub one_shot: bool,
}

impl AdvParams {
    pub fn open(interval_min: u16, interval_max: u16) -> Self {
        Self {
            interval_min,
            interval_max,
            connectable: true,
            filter_accept_list: false,
            one_shot: false,
        }
    }

    pub fn accept_list(interval_min: u16, interval_max: u16) -> Self {
        Self {
            interval_min,
            interval_max,
            connectable: true,
            filter_accept_list: true,
            one_shot: true,
        }
    }
}

/// Connection parameters as reported by the controller, in link-layer units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConnParams {
    /// 1.25 ms units
    pub interval: u16,
    pub latency: u16,
    /// 10 ms units
    pub timeout: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhyPreference {
    pub tx: PhyMask,
    pub rx: PhyMask,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataLengthParams {
    pub tx_max_len: u16,
    /// Microseconds
    pub tx_max_time: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DataLengthInfo {
    pub tx_max_len: u16,
    pub tx_max_time: u16,
    pub rx_max_len: u16,
    pub rx_max_time: u16,
}

/// Requests the peripheral core issues to the host.
pub trait BleHost: Send + Sync {
    fn start_advertising(&self, params: &AdvParams, ad: &[u8], sd: &[u8]) -> HostResult<()>;

    fn stop_advertising(&self) -> HostResult<()>;

    /// Replaces the payload of a running advertising set.
    fn update_advertising_data(&self, _ad: &[u8], _sd: &[u8]) -> HostResult<()> {
        Err(HostError::Unsupported)
    }

    fn accept_list_clear(&self) -> HostResult<()>;

    fn accept_list_add(&self, addr: &LeAddress) -> HostResult<()>;

    fn update_phy(&self, handle: ConnHandle, pref: PhyPreference) -> HostResult<()>;

    fn update_data_length(&self, handle: ConnHandle, params: DataLengthParams) -> HostResult<()>;

    fn exchange_mtu(&self, handle: ConnHandle, mtu: u16) -> HostResult<()>;

    fn notify(&self, handle: ConnHandle, attr: u16, value: &[u8]) -> HostResult<()>;

    fn indicate(&self, handle: ConnHandle, attr: u16, value: &[u8]) -> HostResult<()>;
}

/// Events reported by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    Connected {
        handle: ConnHandle,
        peer: LeAddress,
        status: u8,
        params: ConnParams,
    },
    Disconnected {
        handle: ConnHandle,
        reason: u8,
    },
    /// The previous connection object has been fully released.
    Recycled,
    SecurityChanged {
        handle: ConnHandle,
        level: SecurityLevel,
        status: u8,
    },
    PasskeyDisplay {
        handle: ConnHandle,
        passkey: u32,
    },
    PairingCancelled {
        handle: ConnHandle,
    },
    PairingComplete {
        handle: ConnHandle,
        bonded: bool,
    },
    PairingFailed {
        handle: ConnHandle,
        reason: u8,
    },
    ParamUpdated {
        handle: ConnHandle,
        params: ConnParams,
    },
    PhyUpdated {
        handle: ConnHandle,
        status: u8,
        tx: Option<Phy>,
        rx: Option<Phy>,
    },
    DataLengthUpdated {
        handle: ConnHandle,
        info: DataLengthInfo,
    },
    MtuExchanged {
        handle: ConnHandle,
        mtu: u16,
        status: u8,
    },
    IndicationConfirmed {
        handle: ConnHandle,
    },
    /// Client characteristic configuration write for a value handle.
    SubscriptionChanged {
        handle: ConnHandle,
        attr: u16,
        value: u16,
    },
}
