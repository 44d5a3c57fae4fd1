//! Type definitions for bonding and link security
use crate::gap::LeAddress;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Bond storage errors
#[derive(Debug, Error)]
pub enum BondError {
    #[error("Failed to access bond file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed bond file: {0}")]
    Decode(#[from] bincode::error::DecodeError),

    #[error("Bond file has {0} trailing byte(s)")]
    TrailingData(usize),

    #[error("Failed to encode bonds: {0}")]
    Encode(#[from] bincode::error::EncodeError),
}

/// Result type for bond store operations
pub type BondResult<T> = Result<T, BondError>;

/// Security level of a link
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum SecurityLevel {
    /// No encryption
    #[default]
    None,
    /// Encrypted with an unauthenticated key
    Encrypted,
    /// Encrypted with an authenticated (MITM-protected) key
    Authenticated,
}

impl fmt::Display for SecurityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SecurityLevel::None => "none",
            SecurityLevel::Encrypted => "encrypted",
            SecurityLevel::Authenticated => "authenticated",
        };
        f.write_str(name)
    }
}

/// A persisted bond with a peer identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BondRecord {
    pub peer: LeAddress,
}

impl BondRecord {
    pub fn new(peer: LeAddress) -> Self {
        Self { peer }
    }
}

/// Which bonds a forget operation applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerSelector {
    All,
    Peer(LeAddress),
}

impl PeerSelector {
    pub fn matches(&self, peer: &LeAddress) -> bool {
        match self {
            PeerSelector::All => true,
            PeerSelector::Peer(addr) => addr == peer,
        }
    }
}

impl fmt::Display for PeerSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeerSelector::All => f.write_str("all peers"),
            PeerSelector::Peer(addr) => write!(f, "{}", addr),
        }
    }
}
