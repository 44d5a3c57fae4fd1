//! Unit tests for bond storage and the security manager

use super::*;
use crate::conn::Connection;
use crate::error::Error;
use crate::gap::{IdentityId, LeAddress};
use crate::host::ConnParams;
use crate::mock::peer;
use crate::sync::lock;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

fn temp_path(name: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("rustylbs-{}-{}", std::process::id(), name));
    let _ = fs::remove_file(&path);
    path
}

fn connection(peer: LeAddress) -> Connection {
    Connection::new(1, 0x0040, peer, ConnParams::default())
}

#[test]
fn test_memory_store_insert_and_delete() {
    let store = MemoryBondStore::new();
    let id = IdentityId::DEFAULT;

    assert!(store.insert(id, BondRecord::new(peer(1))).unwrap());
    assert!(!store.insert(id, BondRecord::new(peer(1))).unwrap());
    assert!(store.insert(id, BondRecord::new(peer(2))).unwrap());
    assert!(store.insert(IdentityId(1), BondRecord::new(peer(3))).unwrap());

    let peers: Vec<_> = store
        .enumerate_bonds(id)
        .unwrap()
        .into_iter()
        .map(|b| b.peer)
        .collect();
    assert_eq!(peers, vec![peer(1), peer(2)]);

    assert_eq!(store.delete(id, PeerSelector::Peer(peer(1))).unwrap(), 1);
    assert_eq!(store.delete(id, PeerSelector::Peer(peer(1))).unwrap(), 0);
    assert_eq!(store.delete(id, PeerSelector::All).unwrap(), 1);
    assert!(store.enumerate_bonds(id).unwrap().is_empty());

    // Other identities are untouched
    assert_eq!(store.enumerate_bonds(IdentityId(1)).unwrap().len(), 1);
}

fn peers(store: &dyn BondStore, identity: IdentityId) -> Vec<LeAddress> {
    store
        .enumerate_bonds(identity)
        .unwrap()
        .into_iter()
        .map(|b| b.peer)
        .collect()
}

#[test]
fn test_file_store_persists_changes() {
    let path = temp_path("persist");

    let store = FileBondStore::load(&path).unwrap();
    assert!(store.enumerate_bonds(IdentityId::DEFAULT).unwrap().is_empty());
    store
        .insert(IdentityId::DEFAULT, BondRecord::new(peer(1)))
        .unwrap();
    store
        .insert(
            IdentityId::DEFAULT,
            BondRecord::new(LeAddress::random([0xC1, 2, 3, 4, 5, 0xC6])),
        )
        .unwrap();
    store.insert(IdentityId(2), BondRecord::new(peer(3))).unwrap();

    let reloaded = FileBondStore::load(&path).unwrap();
    assert_eq!(
        peers(&reloaded, IdentityId::DEFAULT),
        vec![peer(1), LeAddress::random([0xC1, 2, 3, 4, 5, 0xC6])]
    );
    assert_eq!(peers(&reloaded, IdentityId(2)), vec![peer(3)]);

    assert_eq!(reloaded.delete(IdentityId::DEFAULT, PeerSelector::All).unwrap(), 2);
    let reloaded = FileBondStore::load(&path).unwrap();
    assert!(peers(&reloaded, IdentityId::DEFAULT).is_empty());
    assert_eq!(peers(&reloaded, IdentityId(2)), vec![peer(3)]);

    let _ = fs::remove_file(&path);
}

#[test]
fn test_file_store_rejects_corrupt_file() {
    let path = temp_path("corrupt");

    // An empty file is an empty store
    fs::write(&path, b"").unwrap();
    assert!(peers(&FileBondStore::load(&path).unwrap(), IdentityId::DEFAULT).is_empty());

    fs::write(&path, [0x01, 0x00, 0x01, 0x07]).unwrap();
    assert!(matches!(
        FileBondStore::load(&path),
        Err(BondError::Decode(_))
    ));

    let store = FileBondStore::load(temp_path("corrupt-src")).unwrap();
    store.insert(IdentityId::DEFAULT, BondRecord::new(peer(1))).unwrap();
    let mut bytes = fs::read(store.path()).unwrap();
    bytes.extend_from_slice(&[0xAA, 0xBB]);
    fs::write(&path, &bytes).unwrap();
    assert!(matches!(
        FileBondStore::load(&path),
        Err(BondError::TrailingData(2))
    ));

    let _ = fs::remove_file(store.path());
    let _ = fs::remove_file(&path);
}

#[test]
fn test_failed_insert_leaves_store_unchanged() {
    // The parent directory does not exist, so every write fails
    let path = temp_path("no-such-dir").join("bonds.bin");
    let store = FileBondStore::load(&path).unwrap();

    let err = store
        .insert(IdentityId::DEFAULT, BondRecord::new(peer(1)))
        .unwrap_err();
    assert!(matches!(err, BondError::Io(_)));
    assert!(store.enumerate_bonds(IdentityId::DEFAULT).unwrap().is_empty());
}

#[test]
fn test_failed_delete_keeps_bonds() {
    let dir = temp_path("vanishing-dir");
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join("bonds.bin");
    let store = FileBondStore::load(&path).unwrap();
    store.insert(IdentityId::DEFAULT, BondRecord::new(peer(1))).unwrap();

    fs::remove_file(&path).unwrap();
    fs::remove_dir(&dir).unwrap();

    assert!(store.delete(IdentityId::DEFAULT, PeerSelector::All).is_err());
    assert_eq!(peers(&store, IdentityId::DEFAULT), vec![peer(1)]);
}

#[derive(Default)]
struct RecordingDisplay {
    passkeys: Mutex<Vec<u32>>,
    cancelled: Mutex<Vec<LeAddress>>,
}

impl AuthCallbacks for RecordingDisplay {
    fn passkey_display(&self, _peer: &LeAddress, passkey: u32) {
        lock(&self.passkeys).push(passkey);
    }

    fn pairing_cancelled(&self, peer: &LeAddress) {
        lock(&self.cancelled).push(*peer);
    }
}

#[test]
fn test_pairing_complete_records_bond() {
    let bonds = Arc::new(MemoryBondStore::new());
    let security = SecurityManager::new(bonds.clone(), IdentityId::DEFAULT);
    let conn = connection(peer(7));

    security.pairing_complete(&conn, false).unwrap();
    assert!(bonds.enumerate_bonds(IdentityId::DEFAULT).unwrap().is_empty());

    security.pairing_complete(&conn, true).unwrap();
    security.pairing_complete(&conn, true).unwrap();
    assert_eq!(
        bonds.enumerate_bonds(IdentityId::DEFAULT).unwrap(),
        vec![BondRecord::new(peer(7))]
    );
}

#[test]
fn test_security_level_recorded_even_on_failure() {
    let security = SecurityManager::new(Arc::new(MemoryBondStore::new()), IdentityId::DEFAULT);
    let conn = connection(peer(1));

    assert_eq!(conn.security_level(), SecurityLevel::None);
    security.on_security_changed(&conn, SecurityLevel::Encrypted, 0);
    assert_eq!(conn.security_level(), SecurityLevel::Encrypted);

    security.on_security_changed(&conn, SecurityLevel::None, 0x06);
    assert_eq!(conn.security_level(), SecurityLevel::None);
    assert!(conn.is_alive());
}

#[test]
fn test_display_callbacks() {
    let display = Arc::new(RecordingDisplay::default());
    let security = SecurityManager::new(Arc::new(MemoryBondStore::new()), IdentityId::DEFAULT)
        .with_display(display.clone());
    let conn = connection(peer(2));

    security.passkey_display(&conn, 42);
    security.pairing_cancelled(&conn);

    assert_eq!(*lock(&display.passkeys), vec![42]);
    assert_eq!(*lock(&display.cancelled), vec![peer(2)]);
}

#[test]
fn test_forget_peer() {
    let bonds = Arc::new(MemoryBondStore::with_bonds(
        IdentityId::DEFAULT,
        vec![peer(1), peer(2)],
    ));
    let security = SecurityManager::new(bonds.clone(), IdentityId::DEFAULT);

    assert_eq!(
        security
            .forget_peer(IdentityId::DEFAULT, PeerSelector::Peer(peer(2)))
            .unwrap(),
        1
    );
    assert_eq!(security.forget_peer(IdentityId(3), PeerSelector::All).unwrap(), 0);
    assert_eq!(
        security.bonds().enumerate_bonds(IdentityId::DEFAULT).unwrap(),
        vec![BondRecord::new(peer(1))]
    );
}

#[test]
fn test_bond_store_errors_surface() {
    let dir = temp_path("dir-store");
    fs::create_dir_all(&dir).unwrap();
    // A directory cannot be read as a bond file
    let err = FileBondStore::load(&dir).unwrap_err();
    assert!(matches!(err, BondError::Io(_)));
    let wrapped: Error = err.into();
    assert!(matches!(wrapped, Error::Bond(BondError::Io(_))));
    let _ = fs::remove_dir(&dir);
}
