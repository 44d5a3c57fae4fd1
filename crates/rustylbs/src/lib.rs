//! RustyLBS - a Bluetooth LE LED/Button peripheral
//!
//! This library implements the policy layer of a BLE peripheral: bond-aware
//! advertising, connection lifecycle, post-connection link negotiation and
//! the LED/Button GATT service. The BLE host is abstracted behind
//! [`BleHost`]; [`hci::HciHost`] drives a Linux HCI socket directly.

pub mod att;
pub mod board;
pub mod config;
pub mod conn;
pub mod error;
pub mod gap;
pub mod gatt;
pub mod hci;
pub mod host;
pub mod peripheral;
pub mod smp;
pub mod uuid;
pub mod work;

mod sync;

#[cfg(test)]
pub(crate) mod mock;

// Re-export common types for convenience
pub use board::{ButtonMap, ButtonState, LedCapability, LedMap, NoLeds};
pub use config::PeripheralConfig;
pub use conn::{ConnState, Connection, ConnectionManager, NegotiationConfig, ParameterNegotiator};
pub use error::{Error, HciError, Result};
pub use gap::{AddressType, AdvState, AdvertisingController, BdAddr, IdentityId, LeAddress};
pub use gatt::{LbsCallbacks, LbsError, LedButtonService, PushMode};
pub use hci::{HciHost, HciSocket};
pub use host::{BleHost, ConnHandle, HostError, HostEvent};
pub use peripheral::Peripheral;
pub use smp::{
    AuthCallbacks, BondRecord, BondStore, FileBondStore, MemoryBondStore, PeerSelector,
    SecurityLevel, SecurityManager,
};
pub use uuid::Uuid;
pub use work::{Work, WorkQueue};
