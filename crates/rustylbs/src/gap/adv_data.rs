//! Advertising and scan response payload encoding

use crate::error::{Error, Result};
use crate::gap::constants::*;
use crate::uuid::Uuid;

bitflags::bitflags! {
    /// Contents of the Flags AD structure.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct AdFlags: u8 {
        const LE_LIMITED_DISCOVERABLE = 0x01;
        const LE_GENERAL_DISCOVERABLE = 0x02;
        const BREDR_NOT_SUPPORTED = 0x04;
    }
}

/// A single length-type-value element of an advertising payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdStructure {
    Flags(AdFlags),
    CompleteName(String),
    ServiceUuid128(Uuid),
    ManufacturerData { company_id: u16, data: Vec<u8> },
}

impl AdStructure {
    fn ad_type(&self) -> u8 {
        match self {
            Self::Flags(_) => AD_TYPE_FLAGS,
            Self::CompleteName(_) => AD_TYPE_COMPLETE_LOCAL_NAME,
            Self::ServiceUuid128(_) => AD_TYPE_128BIT_SERVICE_UUID_COMPLETE,
            Self::ManufacturerData { .. } => AD_TYPE_MANUFACTURER_SPECIFIC,
        }
    }

    fn encode_into(&self, out: &mut Vec<u8>) {
        let start = out.len();
        out.push(0);
        out.push(self.ad_type());
        match self {
            Self::Flags(flags) => out.push(flags.bits()),
            Self::CompleteName(name) => out.extend_from_slice(name.as_bytes()),
            Self::ServiceUuid128(uuid) => out.extend_from_slice(uuid.as_bytes_le()),
            Self::ManufacturerData { company_id, data } => {
                out.extend_from_slice(&company_id.to_le_bytes());
                out.extend_from_slice(data);
            }
        }
        out[start] = (out.len() - start - 1) as u8;
    }
}

/// Encodes a list of AD structures, rejecting payloads that exceed the
/// legacy advertising limit.
pub fn encode(structures: &[AdStructure]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(ADV_DATA_MAX_LEN);
    for structure in structures {
        structure.encode_into(&mut out);
    }
    if out.len() > ADV_DATA_MAX_LEN {
        return Err(Error::AdvertisingDataTooLong(out.len()));
    }
    Ok(out)
}

/// Encoded advertising data plus scan response data.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdvertisingPayload {
    pub ad: Vec<u8>,
    pub sd: Vec<u8>,
}
