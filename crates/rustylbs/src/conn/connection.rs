//! A single LE link and its negotiated state

use super::negotiation::LinkSlot;
use crate::att::ATT_DEFAULT_MTU;
use crate::gap::{LeAddress, Phy};
use crate::host::{ConnHandle, ConnParams, DataLengthInfo};
use crate::smp::SecurityLevel;
use crate::sync::{read, write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

/// Negotiated state of a link.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinkState {
    pub security: SecurityLevel,
    pub params: ConnParams,
    pub tx_phy: Phy,
    pub rx_phy: Phy,
    pub mtu: u16,
    pub data_length: DataLengthInfo,
}

impl Default for LinkState {
    fn default() -> Self {
        Self {
            security: SecurityLevel::None,
            params: ConnParams::default(),
            tx_phy: Phy::Le1M,
            rx_phy: Phy::Le1M,
            mtu: ATT_DEFAULT_MTU,
            data_length: DataLengthInfo::default(),
        }
    }
}

/// An established connection.
///
/// Each instance carries an id unique for the process lifetime, so a handle
/// value recycled by the controller never aliases an old connection. Only
/// `ConnectionManager` creates or invalidates connections; everybody else
/// holds an `Arc` until disconnect and checks `is_alive`.
#[derive(Debug)]
pub struct Connection {
    id: u64,
    handle: ConnHandle,
    peer: LeAddress,
    alive: AtomicBool,
    link: RwLock<LinkState>,
    slot: LinkSlot,
}

impl Connection {
    pub(crate) fn new(id: u64, handle: ConnHandle, peer: LeAddress, params: ConnParams) -> Self {
        Self {
            id,
            handle,
            peer,
            alive: AtomicBool::new(true),
            link: RwLock::new(LinkState {
                params,
                ..LinkState::default()
            }),
            slot: LinkSlot::new(),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn handle(&self) -> ConnHandle {
        self.handle
    }

    pub fn peer(&self) -> LeAddress {
        self.peer
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    /// Snapshot of the negotiated link state.
    pub fn link(&self) -> LinkState {
        *read(&self.link)
    }

    pub fn security_level(&self) -> SecurityLevel {
        read(&self.link).security
    }

    pub(crate) fn update_link(&self, f: impl FnOnce(&mut LinkState)) {
        f(&mut write(&self.link));
    }

    /// Marks the connection dead. Returns `true` only for the first call.
    pub(crate) fn invalidate(&self) -> bool {
        self.alive.swap(false, Ordering::AcqRel)
    }

    pub(crate) fn slot(&self) -> &LinkSlot {
        &self.slot
    }
}
