//! rustylbscli - inspect and edit the peripheral's bond file
//!
//! ```text
//! rustylbscli list <bond-file> [identity]
//! rustylbscli forget <bond-file> <all|AA:BB:CC:DD:EE:FF[/type]> [identity]
//! ```

use anyhow::{bail, Context, Result};
use rustylbs::{BondStore, FileBondStore, IdentityId, LeAddress, PeerSelector};
use std::env;

const USAGE: &str = "usage:
  rustylbscli list <bond-file> [identity]
  rustylbscli forget <bond-file> <all|address[/type]> [identity]";

fn parse_identity(arg: Option<&String>) -> Result<IdentityId> {
    match arg {
        Some(arg) => Ok(IdentityId(
            arg.parse()
                .with_context(|| format!("invalid identity {:?}", arg))?,
        )),
        None => Ok(IdentityId::DEFAULT),
    }
}

fn parse_target(arg: &str) -> Result<PeerSelector> {
    if arg.eq_ignore_ascii_case("all") {
        return Ok(PeerSelector::All);
    }
    let peer: LeAddress = arg
        .parse()
        .with_context(|| format!("invalid peer address {:?}", arg))?;
    Ok(PeerSelector::Peer(peer))
}

fn list(path: &str, identity: IdentityId) -> Result<()> {
    let store = FileBondStore::load(path).with_context(|| format!("cannot load {}", path))?;
    let bonds = store.enumerate_bonds(identity)?;
    if bonds.is_empty() {
        println!("No bonds for identity {}", identity);
    }
    for bond in bonds {
        println!("{}", bond.peer);
    }
    Ok(())
}

fn forget(path: &str, target: PeerSelector, identity: IdentityId) -> Result<()> {
    let store = FileBondStore::load(path).with_context(|| format!("cannot load {}", path))?;
    let removed = store.delete(identity, target)?;
    println!("Removed {} bond(s)", removed);
    Ok(())
}

fn main() -> Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();
    match args.as_slice() {
        [command, path, rest @ ..] if command == "list" && rest.len() <= 1 => {
            list(path, parse_identity(rest.first())?)
        }
        [command, path, target, rest @ ..] if command == "forget" && rest.len() <= 1 => {
            forget(path, parse_target(target)?, parse_identity(rest.first())?)
        }
        _ => bail!("{}", USAGE),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_target() {
        assert_eq!(parse_target("ALL").unwrap(), PeerSelector::All);
        assert_eq!(
            parse_target("55:44:33:22:11:01").unwrap(),
            PeerSelector::Peer(LeAddress::public([0x01, 0x11, 0x22, 0x33, 0x44, 0x55]))
        );
        assert_eq!(
            parse_target("55:44:33:22:11:01/random").unwrap(),
            PeerSelector::Peer(LeAddress::random([0x01, 0x11, 0x22, 0x33, 0x44, 0x55]))
        );
        assert!(parse_target("nope").is_err());
    }

    #[test]
    fn test_parse_identity() {
        assert_eq!(parse_identity(None).unwrap(), IdentityId::DEFAULT);
        assert_eq!(parse_identity(Some(&"2".to_string())).unwrap(), IdentityId(2));
        assert!(parse_identity(Some(&"x".to_string())).is_err());
    }
}
