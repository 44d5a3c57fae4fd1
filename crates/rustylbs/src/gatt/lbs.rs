//! LED/Button service
//!
//! Button: read plus notify or indicate. LED: write only, one byte, 0 or 1.
//! Sensor: notify-only `u32`. The service owns the LED state and reads the
//! button through `LbsCallbacks`, so a read always reflects the latest edge.

use super::types::*;
use crate::att::AttErrorCode;
use crate::conn::{Connection, ConnectionManager};
use crate::host::{BleHost, ConnHandle, HostError};
use crate::sync::lock;
use byteorder::{ByteOrder, LittleEndian};
use log::{debug, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LbsError {
    #[error("Not connected")]
    NotConnected,

    #[error("ATT error: {0}")]
    Att(#[from] AttErrorCode),

    #[error("Indication already in flight")]
    IndicationPending,

    #[error("Host error: {0}")]
    Host(#[from] HostError),
}

pub type LbsResult<T> = std::result::Result<T, LbsError>;

/// Application side of the service.
pub trait LbsCallbacks: Send + Sync {
    fn led_changed(&self, _on: bool) {}

    fn button_state(&self) -> bool {
        false
    }
}

/// Per-connection subscription state. Reset whenever the connection id
/// changes.
#[derive(Debug, Default)]
struct Subscriptions {
    conn_id: u64,
    button: Cccd,
    sensor: Cccd,
    indication_pending: bool,
}

pub struct LedButtonService {
    host: Arc<dyn BleHost>,
    connections: Arc<ConnectionManager>,
    callbacks: Arc<dyn LbsCallbacks>,
    push_mode: PushMode,
    led: AtomicBool,
    subscriptions: Mutex<Subscriptions>,
}

impl LedButtonService {
    pub fn new(
        host: Arc<dyn BleHost>,
        connections: Arc<ConnectionManager>,
        callbacks: Arc<dyn LbsCallbacks>,
        push_mode: PushMode,
    ) -> Self {
        Self {
            host,
            connections,
            callbacks,
            push_mode,
            led: AtomicBool::new(false),
            subscriptions: Mutex::new(Subscriptions::default()),
        }
    }

    /// Characteristic table in handle order.
    pub fn characteristics(&self) -> [Characteristic; 3] {
        [
            Characteristic {
                uuid: LBS_BUTTON_UUID,
                value_handle: LBS_BUTTON_VALUE_HANDLE,
                cccd_handle: Some(LBS_BUTTON_CCCD_HANDLE),
                properties: CharacteristicProperty::READ | self.push_mode.property(),
            },
            Characteristic {
                uuid: LBS_LED_UUID,
                value_handle: LBS_LED_VALUE_HANDLE,
                cccd_handle: None,
                properties: CharacteristicProperty::WRITE,
            },
            Characteristic {
                uuid: LBS_SENSOR_UUID,
                value_handle: LBS_SENSOR_VALUE_HANDLE,
                cccd_handle: Some(LBS_SENSOR_CCCD_HANDLE),
                properties: CharacteristicProperty::NOTIFY,
            },
        ]
    }

    pub fn push_mode(&self) -> PushMode {
        self.push_mode
    }

    pub fn led_state(&self) -> bool {
        self.led.load(Ordering::Acquire)
    }

    /// Serves an attribute read from the peer on `handle`.
    pub fn read(&self, handle: ConnHandle, attr: u16, offset: u16) -> LbsResult<Vec<u8>> {
        let conn = self.active(handle)?;
        match attr {
            LBS_BUTTON_VALUE_HANDLE => self.read_button(offset),
            LBS_BUTTON_CCCD_HANDLE | LBS_SENSOR_CCCD_HANDLE => {
                if offset != 0 {
                    return Err(AttErrorCode::InvalidOffset.into());
                }
                let subs = self.subscriptions_for(&conn);
                let cccd = match attr {
                    LBS_BUTTON_CCCD_HANDLE => subs.button,
                    _ => subs.sensor,
                };
                Ok(cccd.bits().to_le_bytes().to_vec())
            }
            LBS_LED_VALUE_HANDLE | LBS_SENSOR_VALUE_HANDLE => {
                Err(AttErrorCode::ReadNotPermitted.into())
            }
            _ => Err(AttErrorCode::InvalidHandle.into()),
        }
    }

    /// Serves an attribute write from the peer on `handle`. Returns the
    /// number of bytes consumed.
    pub fn write(&self, handle: ConnHandle, attr: u16, offset: u16, data: &[u8]) -> LbsResult<usize> {
        let conn = self.active(handle)?;
        match attr {
            LBS_LED_VALUE_HANDLE => self.write_led(offset, data),
            LBS_BUTTON_CCCD_HANDLE | LBS_SENSOR_CCCD_HANDLE => {
                if data.len() != 2 {
                    return Err(AttErrorCode::InvalidAttributeValueLength.into());
                }
                if offset != 0 {
                    return Err(AttErrorCode::InvalidOffset.into());
                }
                self.set_subscription(&conn, attr, LittleEndian::read_u16(data))?;
                Ok(data.len())
            }
            LBS_BUTTON_VALUE_HANDLE | LBS_SENSOR_VALUE_HANDLE => {
                Err(AttErrorCode::WriteNotPermitted.into())
            }
            _ => Err(AttErrorCode::InvalidHandle.into()),
        }
    }

    /// Subscription change tracked by the host on our behalf.
    pub fn on_subscription_changed(&self, handle: ConnHandle, attr: u16, value: u16) -> LbsResult<()> {
        let conn = self.active(handle)?;
        self.set_subscription(&conn, attr, value)
    }

    pub fn on_indication_confirmed(&self, handle: ConnHandle) {
        if let Some(conn) = self.connections.lookup(handle) {
            self.subscriptions_for(&conn).indication_pending = false;
            debug!("Indication confirmed");
        }
    }

    /// Pushes the button level to the peer.
    ///
    /// Returns `Ok(false)` if the peer has not subscribed. Fails with
    /// `NotConnected` when there is no link.
    pub fn send_button_state(&self, pressed: bool) -> LbsResult<bool> {
        let conn = self.connections.connection().ok_or(LbsError::NotConnected)?;
        let mut subs = self.subscriptions_for(&conn);
        if !subs.button.contains(self.push_mode.cccd()) {
            debug!("Button {:?} not enabled by peer", self.push_mode);
            return Ok(false);
        }

        let value = [pressed as u8];
        match self.push_mode {
            PushMode::Notify => {
                self.host.notify(conn.handle(), LBS_BUTTON_VALUE_HANDLE, &value)?;
            }
            PushMode::Indicate => {
                if subs.indication_pending {
                    return Err(LbsError::IndicationPending);
                }
                self.host.indicate(conn.handle(), LBS_BUTTON_VALUE_HANDLE, &value)?;
                subs.indication_pending = true;
            }
        }
        Ok(true)
    }

    /// Notifies a sensor reading. Same contract as `send_button_state`.
    pub fn send_sensor_value(&self, value: u32) -> LbsResult<bool> {
        let conn = self.connections.connection().ok_or(LbsError::NotConnected)?;
        if !self.subscriptions_for(&conn).sensor.contains(Cccd::NOTIFY) {
            return Ok(false);
        }
        self.host
            .notify(conn.handle(), LBS_SENSOR_VALUE_HANDLE, &value.to_le_bytes())?;
        Ok(true)
    }

    fn read_button(&self, offset: u16) -> LbsResult<Vec<u8>> {
        if offset != 0 {
            return Err(AttErrorCode::InvalidOffset.into());
        }
        let pressed = self.callbacks.button_state();
        debug!("Button state read: {}", pressed);
        Ok(vec![pressed as u8])
    }

    fn write_led(&self, offset: u16, data: &[u8]) -> LbsResult<usize> {
        if data.len() != 1 {
            debug!("LED write: incorrect data length {}", data.len());
            return Err(AttErrorCode::InvalidAttributeValueLength.into());
        }
        if offset != 0 {
            debug!("LED write: incorrect offset {}", offset);
            return Err(AttErrorCode::InvalidOffset.into());
        }
        let on = match data[0] {
            0x00 => false,
            0x01 => true,
            other => {
                debug!("LED write: incorrect value 0x{:02X}", other);
                return Err(AttErrorCode::ValueNotAllowed.into());
            }
        };
        self.led.store(on, Ordering::Release);
        self.callbacks.led_changed(on);
        info!("LED {}", if on { "on" } else { "off" });
        Ok(data.len())
    }

    fn set_subscription(&self, conn: &Connection, attr: u16, value: u16) -> LbsResult<()> {
        let allowed = match attr {
            LBS_BUTTON_CCCD_HANDLE => self.push_mode.cccd(),
            LBS_SENSOR_CCCD_HANDLE => Cccd::NOTIFY,
            _ => return Err(AttErrorCode::InvalidHandle.into()),
        };
        let Some(cccd) = Cccd::from_bits(value).filter(|cccd| allowed.contains(*cccd)) else {
            warn!("Rejected CCCD value 0x{:04X} on handle 0x{:04X}", value, attr);
            return Err(AttErrorCode::CccImproperlyConfigured.into());
        };

        let mut subs = self.subscriptions_for(conn);
        match attr {
            LBS_BUTTON_CCCD_HANDLE => subs.button = cccd,
            _ => subs.sensor = cccd,
        }
        info!(
            "{} {} on handle 0x{:04X}",
            if cccd.is_empty() { "Unsubscribed" } else { "Subscribed" },
            if cccd.contains(Cccd::INDICATE) { "indications" } else { "notifications" },
            attr
        );
        Ok(())
    }

    fn active(&self, handle: ConnHandle) -> LbsResult<Arc<Connection>> {
        self.connections
            .lookup(handle)
            .filter(|conn| conn.is_alive())
            .ok_or(LbsError::NotConnected)
    }

    fn subscriptions_for(&self, conn: &Connection) -> std::sync::MutexGuard<'_, Subscriptions> {
        let mut subs = lock(&self.subscriptions);
        if subs.conn_id != conn.id() {
            *subs = Subscriptions {
                conn_id: conn.id(),
                ..Subscriptions::default()
            };
        }
        subs
    }
}
