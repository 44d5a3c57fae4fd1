//! Accept list derived from the bond store

use crate::error::{Error, Result};
use crate::gap::{IdentityId, LeAddress};
use crate::host::BleHost;
use crate::smp::BondStore;
use log::{debug, error, warn};
use std::sync::Arc;

/// Peers allowed to connect during filtered advertising.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AcceptList {
    peers: Vec<LeAddress>,
}

impl AcceptList {
    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    pub fn peers(&self) -> &[LeAddress] {
        &self.peers
    }

    pub fn contains(&self, peer: &LeAddress) -> bool {
        self.peers.contains(peer)
    }
}

/// Programs the controller's filter accept list from the bonds of one
/// local identity.
pub struct AcceptListBuilder {
    host: Arc<dyn BleHost>,
    bonds: Arc<dyn BondStore>,
    identity: IdentityId,
}

impl AcceptListBuilder {
    pub fn new(host: Arc<dyn BleHost>, bonds: Arc<dyn BondStore>, identity: IdentityId) -> Self {
        Self {
            host,
            bonds,
            identity,
        }
    }

    /// Clears the controller list and adds every bonded peer.
    ///
    /// An `Ok` list may be empty, meaning there is nobody to filter for. Any
    /// failure to add a peer aborts the whole list: the controller list is
    /// cleared again and the error returned.
    pub fn build_accept_list(&self) -> Result<AcceptList> {
        self.clear()?;

        let bonds = self.bonds.enumerate_bonds(self.identity)?;
        let mut list = AcceptList::default();
        for bond in bonds {
            if let Err(err) = self.host.accept_list_add(&bond.peer) {
                error!("Cannot add peer {} to accept list: {}", bond.peer, err);
                if let Err(clear_err) = self.host.accept_list_clear() {
                    warn!("Partial accept list left in controller: {}", clear_err);
                }
                return Err(Error::AcceptList(err));
            }
            debug!("Added peer {} to accept list", bond.peer);
            list.peers.push(bond.peer);
        }
        Ok(list)
    }

    pub fn clear(&self) -> Result<()> {
        self.host.accept_list_clear().map_err(|err| {
            error!("Cannot clear accept list: {}", err);
            Error::AcceptList(err)
        })
    }
}
