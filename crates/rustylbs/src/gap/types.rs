use crate::gap::constants::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AddressType {
    Public,
    Random,
    PublicIdentity,
    RandomIdentity,
}

impl From<u8> for AddressType {
    fn from(value: u8) -> Self {
        match value {
            PUBLIC_DEVICE_ADDRESS => AddressType::Public,
            RANDOM_DEVICE_ADDRESS => AddressType::Random,
            PUBLIC_IDENTITY_ADDRESS => AddressType::PublicIdentity,
            RANDOM_IDENTITY_ADDRESS => AddressType::RandomIdentity,
            _ => AddressType::Public,
        }
    }
}

impl From<AddressType> for u8 {
    fn from(value: AddressType) -> Self {
        match value {
            AddressType::Public => PUBLIC_DEVICE_ADDRESS,
            AddressType::Random => RANDOM_DEVICE_ADDRESS,
            AddressType::PublicIdentity => PUBLIC_IDENTITY_ADDRESS,
            AddressType::RandomIdentity => RANDOM_IDENTITY_ADDRESS,
        }
    }
}

impl AddressType {
    fn label(self) -> &'static str {
        match self {
            AddressType::Public => "public",
            AddressType::Random => "random",
            AddressType::PublicIdentity => "public-id",
            AddressType::RandomIdentity => "random-id",
        }
    }
}

impl fmt::Display for AddressType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for AddressType {
    type Err = AddressParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [
            AddressType::Public,
            AddressType::Random,
            AddressType::PublicIdentity,
            AddressType::RandomIdentity,
        ]
        .into_iter()
        .find(|kind| kind.label().eq_ignore_ascii_case(s))
        .ok_or_else(|| AddressParseError::UnknownType(s.to_string()))
    }
}

/// A 6-byte device address, stored little endian as it travels over HCI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BdAddr {
    pub bytes: [u8; 6],
}

impl BdAddr {
    pub fn new(bytes: [u8; 6]) -> Self {
        Self { bytes }
    }

    pub fn from_slice(slice: &[u8]) -> Option<Self> {
        if slice.len() >= 6 {
            let mut bytes = [0u8; 6];
            bytes.copy_from_slice(&slice[0..6]);
            Some(Self { bytes })
        } else {
            None
        }
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }
}

impl fmt::Display for BdAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            self.bytes[5],
            self.bytes[4],
            self.bytes[3],
            self.bytes[2],
            self.bytes[1],
            self.bytes[0]
        )
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressParseError {
    #[error("Malformed address: {0}")]
    Malformed(String),

    #[error("Unknown address type: {0}")]
    UnknownType(String),
}

impl FromStr for BdAddr {
    type Err = AddressParseError;

    /// Parses the `AA:BB:CC:DD:EE:FF` display form.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() != 6 {
            return Err(AddressParseError::Malformed(s.to_string()));
        }
        let mut bytes = [0u8; 6];
        for (i, part) in parts.iter().enumerate() {
            bytes[5 - i] = u8::from_str_radix(part, 16)
                .map_err(|_| AddressParseError::Malformed(s.to_string()))?;
        }
        Ok(BdAddr { bytes })
    }
}

/// Address plus its type tag, the identity a bond is keyed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LeAddress {
    pub kind: AddressType,
    pub addr: BdAddr,
}

impl LeAddress {
    pub fn new(kind: AddressType, addr: BdAddr) -> Self {
        Self { kind, addr }
    }

    pub fn public(bytes: [u8; 6]) -> Self {
        Self::new(AddressType::Public, BdAddr::new(bytes))
    }

    pub fn random(bytes: [u8; 6]) -> Self {
        Self::new(AddressType::Random, BdAddr::new(bytes))
    }
}

impl fmt::Display for LeAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.addr, self.kind)
    }
}

impl FromStr for LeAddress {
    type Err = AddressParseError;

    /// Accepts `AA:BB:CC:DD:EE:FF` or `AA:BB:CC:DD:EE:FF/random`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('/') {
            Some((addr, kind)) => Ok(LeAddress::new(kind.parse()?, addr.parse()?)),
            None => Ok(LeAddress::new(AddressType::Public, s.parse()?)),
        }
    }
}

/// Local identity slot the bonds belong to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct IdentityId(pub u8);

impl IdentityId {
    pub const DEFAULT: IdentityId = IdentityId(0);
}

impl fmt::Display for IdentityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phy {
    Le1M,
    Le2M,
    LeCoded,
}

impl Phy {
    pub fn from_hci(value: u8) -> Option<Self> {
        match value {
            0x01 => Some(Phy::Le1M),
            0x02 => Some(Phy::Le2M),
            0x03 => Some(Phy::LeCoded),
            _ => None,
        }
    }
}

impl fmt::Display for Phy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phy::Le1M => "LE 1M",
            Phy::Le2M => "LE 2M",
            Phy::LeCoded => "LE Coded",
        };
        f.write_str(name)
    }
}

bitflags::bitflags! {
    /// PHY preference mask as used by LE Set PHY.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PhyMask: u8 {
        const LE_1M = 0x01;
        const LE_2M = 0x02;
        const LE_CODED = 0x04;
    }
}

impl From<Phy> for PhyMask {
    fn from(phy: Phy) -> Self {
        match phy {
            Phy::Le1M => PhyMask::LE_1M,
            Phy::Le2M => PhyMask::LE_2M,
            Phy::LeCoded => PhyMask::LE_CODED,
        }
    }
}
