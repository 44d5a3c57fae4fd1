//! Peripheral configuration

use crate::board::{ButtonMap, LedMap};
use crate::conn::NegotiationConfig;
use crate::error::{Error, Result};
use crate::gap::{AdvertisingConfig, IdentityId};
use crate::gatt::PushMode;

// Legal advertising interval range, 0.625 ms units
const ADV_INTERVAL_MIN: u16 = 0x0020;
const ADV_INTERVAL_MAX: u16 = 0x4000;

/// Everything needed to bring the peripheral up.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PeripheralConfig {
    pub identity: IdentityId,
    pub advertising: AdvertisingConfig,
    pub negotiation: NegotiationConfig,
    pub buttons: ButtonMap,
    pub leds: LedMap,
    pub push_mode: PushMode,
}

impl PeripheralConfig {
    pub fn validate(&self) -> Result<()> {
        let adv = &self.advertising;
        if adv.device_name.is_empty() {
            return Err(Error::Config("device name is empty".into()));
        }
        if adv.interval_min < ADV_INTERVAL_MIN
            || adv.interval_max > ADV_INTERVAL_MAX
            || adv.interval_min > adv.interval_max
        {
            return Err(Error::Config(format!(
                "advertising interval 0x{:04X}-0x{:04X} out of range",
                adv.interval_min, adv.interval_max
            )));
        }

        let masks = [
            Some(self.buttons.user),
            self.buttons.pairing,
            self.buttons.bond_delete,
        ];
        let mut seen = 0u32;
        for mask in masks.into_iter().flatten() {
            if mask == 0 || seen & mask != 0 {
                return Err(Error::Config(format!("button mask 0x{:X} is empty or shared", mask)));
            }
            seen |= mask;
        }

        if self.negotiation.mtu < crate::att::ATT_DEFAULT_MTU || self.negotiation.mtu > crate::att::ATT_MAX_MTU {
            return Err(Error::Config(format!("MTU {} out of range", self.negotiation.mtu)));
        }
        Ok(())
    }
}
