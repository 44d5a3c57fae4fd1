//! Pairing prompts, security level tracking and bond lifecycle

use super::bonds::BondStore;
use super::types::*;
use crate::conn::Connection;
use crate::error::Result;
use crate::gap::{IdentityId, LeAddress};
use log::{info, warn};
use std::sync::Arc;

/// Display-side pairing callbacks. The device has no input, so the only
/// thing it can do with a passkey is show it.
pub trait AuthCallbacks: Send + Sync {
    fn passkey_display(&self, _peer: &LeAddress, _passkey: u32) {}

    fn pairing_cancelled(&self, _peer: &LeAddress) {}
}

/// Logs only.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoDisplay;

impl AuthCallbacks for NoDisplay {}

pub struct SecurityManager {
    bonds: Arc<dyn BondStore>,
    identity: IdentityId,
    display: Arc<dyn AuthCallbacks>,
}

impl SecurityManager {
    pub fn new(bonds: Arc<dyn BondStore>, identity: IdentityId) -> Self {
        Self {
            bonds,
            identity,
            display: Arc::new(NoDisplay),
        }
    }

    pub fn with_display(mut self, display: Arc<dyn AuthCallbacks>) -> Self {
        self.display = display;
        self
    }

    pub fn identity(&self) -> IdentityId {
        self.identity
    }

    pub fn passkey_display(&self, conn: &Connection, passkey: u32) {
        info!("Passkey for {}: {:06}", conn.peer(), passkey);
        self.display.passkey_display(&conn.peer(), passkey);
    }

    pub fn pairing_cancelled(&self, conn: &Connection) {
        info!("Pairing cancelled: {}", conn.peer());
        self.display.pairing_cancelled(&conn.peer());
    }

    /// Records the bond when pairing produced one.
    pub fn pairing_complete(&self, conn: &Connection, bonded: bool) -> Result<()> {
        info!("Pairing completed: {}, bonded: {}", conn.peer(), bonded);
        if bonded && self.bonds.insert(self.identity, BondRecord::new(conn.peer()))? {
            info!("Stored bond for {}", conn.peer());
        }
        Ok(())
    }

    pub fn pairing_failed(&self, conn: &Connection, reason: u8) {
        warn!("Pairing failed with {}, reason 0x{:02X}", conn.peer(), reason);
    }

    /// Records `level` on the link. A failed security procedure is reported
    /// and the link is left up.
    pub fn on_security_changed(&self, conn: &Connection, level: SecurityLevel, status: u8) {
        conn.update_link(|link| link.security = level);
        if status == 0 {
            info!("Security changed: {} level {}", conn.peer(), level);
        } else {
            warn!(
                "Security failed: {} level {} err 0x{:02X}",
                conn.peer(),
                level,
                status
            );
        }
    }

    /// Deletes bonds of `identity`. A live link to a forgotten peer stays
    /// up; only the next accept list is affected.
    pub fn forget_peer(&self, identity: IdentityId, target: PeerSelector) -> Result<usize> {
        let removed = self.bonds.delete(identity, target)?;
        info!("Forgot {} bond(s) for {} on identity {}", removed, target, identity);
        Ok(removed)
    }

    pub fn bonds(&self) -> &Arc<dyn BondStore> {
        &self.bonds
    }
}
