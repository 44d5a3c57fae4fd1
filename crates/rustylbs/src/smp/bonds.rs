//! Bond storage
//!
//! The core only needs to enumerate bonds for a local identity, record a new
//! one after bonding and forget them again. `MemoryBondStore` keeps them in
//! memory; `FileBondStore` adds a bincode file loaded once at startup.

use super::types::*;
use crate::gap::{IdentityId, LeAddress};
use crate::sync::{read, write};
use log::debug;
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

type BondMap = BTreeMap<IdentityId, Vec<BondRecord>>;

/// Interface for bond persistence
pub trait BondStore: Send + Sync {
    /// Returns every bond of `identity` in a stable order. Calling it again
    /// restarts the enumeration.
    fn enumerate_bonds(&self, identity: IdentityId) -> BondResult<Vec<BondRecord>>;

    /// Records a bond. Returns `false` if the peer was already bonded.
    fn insert(&self, identity: IdentityId, record: BondRecord) -> BondResult<bool>;

    /// Deletes the selected bonds and returns how many were removed.
    fn delete(&self, identity: IdentityId, target: PeerSelector) -> BondResult<usize>;
}

/// In-memory bond store
#[derive(Debug, Default)]
pub struct MemoryBondStore {
    bonds: RwLock<BondMap>,
}

impl MemoryBondStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with bonds for one identity.
    pub fn with_bonds(identity: IdentityId, peers: impl IntoIterator<Item = LeAddress>) -> Self {
        let store = Self::new();
        write(&store.bonds)
            .entry(identity)
            .or_default()
            .extend(peers.into_iter().map(BondRecord::new));
        store
    }

    fn from_map(bonds: BondMap) -> Self {
        Self {
            bonds: RwLock::new(bonds),
        }
    }
}

fn insert_into(bonds: &mut BondMap, identity: IdentityId, record: BondRecord) -> bool {
    let records = bonds.entry(identity).or_default();
    if records.contains(&record) {
        return false;
    }
    records.push(record);
    true
}

fn delete_from(bonds: &mut BondMap, identity: IdentityId, target: PeerSelector) -> usize {
    let Some(records) = bonds.get_mut(&identity) else {
        return 0;
    };
    let before = records.len();
    records.retain(|record| !target.matches(&record.peer));
    let removed = before - records.len();
    if records.is_empty() {
        bonds.remove(&identity);
    }
    removed
}

impl BondStore for MemoryBondStore {
    fn enumerate_bonds(&self, identity: IdentityId) -> BondResult<Vec<BondRecord>> {
        Ok(read(&self.bonds).get(&identity).cloned().unwrap_or_default())
    }

    fn insert(&self, identity: IdentityId, record: BondRecord) -> BondResult<bool> {
        Ok(insert_into(&mut write(&self.bonds), identity, record))
    }

    fn delete(&self, identity: IdentityId, target: PeerSelector) -> BondResult<usize> {
        Ok(delete_from(&mut write(&self.bonds), identity, target))
    }
}

/// Bond store persisted to a file holding the bincode-encoded map of
/// identity to bonds. Changes are written to disk before they become
/// visible, so a failed write leaves the store as it was.
#[derive(Debug)]
pub struct FileBondStore {
    path: PathBuf,
    inner: MemoryBondStore,
}

impl FileBondStore {
    /// Loads the file at `path`. A missing or empty file is an empty store.
    pub fn load(path: impl AsRef<Path>) -> BondResult<Self> {
        let path = path.as_ref().to_path_buf();
        let bonds = match fs::read(&path) {
            Ok(bytes) if bytes.is_empty() => BondMap::new(),
            Ok(bytes) => decode(&bytes)?,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!("No bond file at {}, starting empty", path.display());
                BondMap::new()
            }
            Err(err) => return Err(err.into()),
        };
        Ok(Self {
            path,
            inner: MemoryBondStore::from_map(bonds),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, bonds: &BondMap) -> BondResult<()> {
        let bytes = bincode::serde::encode_to_vec(bonds, bincode::config::standard())?;
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, bytes)?;
        if let Err(err) = fs::rename(&tmp, &self.path) {
            let _ = fs::remove_file(&tmp);
            return Err(err.into());
        }
        Ok(())
    }

    /// Applies `change` to a copy of the bonds and commits it once it is
    /// on disk. The lock is held throughout so writers stay ordered.
    fn update<T>(
        &self,
        change: impl FnOnce(&mut BondMap) -> T,
        changed: impl Fn(&T) -> bool,
    ) -> BondResult<T> {
        let mut bonds = write(&self.inner.bonds);
        let mut next = bonds.clone();
        let outcome = change(&mut next);
        if changed(&outcome) {
            self.persist(&next)?;
            *bonds = next;
        }
        Ok(outcome)
    }
}

impl BondStore for FileBondStore {
    fn enumerate_bonds(&self, identity: IdentityId) -> BondResult<Vec<BondRecord>> {
        self.inner.enumerate_bonds(identity)
    }

    fn insert(&self, identity: IdentityId, record: BondRecord) -> BondResult<bool> {
        self.update(|bonds| insert_into(bonds, identity, record), |added| *added)
    }

    fn delete(&self, identity: IdentityId, target: PeerSelector) -> BondResult<usize> {
        self.update(|bonds| delete_from(bonds, identity, target), |removed| *removed > 0)
    }
}

fn decode(bytes: &[u8]) -> BondResult<BondMap> {
    let (bonds, used): (BondMap, usize) =
        bincode::serde::decode_from_slice(bytes, bincode::config::standard())?;
    if used != bytes.len() {
        return Err(BondError::TrailingData(bytes.len() - used));
    }
    Ok(bonds)
}
