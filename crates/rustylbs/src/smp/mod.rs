//! Bonding and link security
//!
//! Pairing itself happens in the host. This module keeps the bond records
//! the advertising policy depends on and tracks the security level of the
//! active link.

mod bonds;
mod manager;
mod types;

#[cfg(test)]
mod tests;

pub use self::bonds::{BondStore, FileBondStore, MemoryBondStore};
pub use self::manager::{AuthCallbacks, NoDisplay, SecurityManager};
pub use self::types::*;
