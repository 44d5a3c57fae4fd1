//! Identifiers and layout of the LED/Button service

use crate::uuid::Uuid;

pub const LBS_SERVICE_UUID: Uuid = Uuid::from_u128(0x00001523_1212_efde_1523_785feabcd123);
pub const LBS_BUTTON_UUID: Uuid = Uuid::from_u128(0x00001524_1212_efde_1523_785feabcd123);
pub const LBS_LED_UUID: Uuid = Uuid::from_u128(0x00001525_1212_efde_1523_785feabcd123);
pub const LBS_SENSOR_UUID: Uuid = Uuid::from_u128(0x00001526_1212_efde_1523_785feabcd123);

// Fixed attribute handles
pub const LBS_SERVICE_HANDLE: u16 = 0x0010;
pub const LBS_BUTTON_VALUE_HANDLE: u16 = 0x0012;
pub const LBS_BUTTON_CCCD_HANDLE: u16 = 0x0013;
pub const LBS_LED_VALUE_HANDLE: u16 = 0x0015;
pub const LBS_SENSOR_VALUE_HANDLE: u16 = 0x0017;
pub const LBS_SENSOR_CCCD_HANDLE: u16 = 0x0018;

bitflags::bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CharacteristicProperty: u8 {
        const READ = 0x02;
        const WRITE_WITHOUT_RESPONSE = 0x04;
        const WRITE = 0x08;
        const NOTIFY = 0x10;
        const INDICATE = 0x20;
    }
}

bitflags::bitflags! {
    /// Client Characteristic Configuration value
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Cccd: u16 {
        const NOTIFY = 0x0001;
        const INDICATE = 0x0002;
    }
}

/// How button changes reach the peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PushMode {
    /// Unacknowledged
    #[default]
    Notify,
    /// Acknowledged by the peer
    Indicate,
}

impl PushMode {
    pub fn property(self) -> CharacteristicProperty {
        match self {
            PushMode::Notify => CharacteristicProperty::NOTIFY,
            PushMode::Indicate => CharacteristicProperty::INDICATE,
        }
    }

    pub fn cccd(self) -> Cccd {
        match self {
            PushMode::Notify => Cccd::NOTIFY,
            PushMode::Indicate => Cccd::INDICATE,
        }
    }
}

/// A characteristic in the service table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Characteristic {
    pub uuid: Uuid,
    pub value_handle: u16,
    pub cccd_handle: Option<u16>,
    pub properties: CharacteristicProperty,
}
