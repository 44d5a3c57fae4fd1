//! Board capabilities: LEDs and buttons

use std::sync::atomic::{AtomicBool, Ordering};

/// Output pins driving LEDs.
pub trait LedCapability: Send + Sync {
    fn set(&self, _pin: u8, _on: bool) {}
}

/// Board without LEDs.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoLeds;

impl LedCapability for NoLeds {}

/// Button masks as reported by the button driver's `on_change(state, changed)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonMap {
    /// Mirrored to the button characteristic
    pub user: u32,
    /// Enters pairing mode on release
    pub pairing: Option<u32>,
    /// Forgets all bonds on release
    pub bond_delete: Option<u32>,
}

impl Default for ButtonMap {
    fn default() -> Self {
        Self {
            user: 1 << 0,
            pairing: Some(1 << 1),
            bond_delete: Some(1 << 2),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedMap {
    pub run_status: u8,
    pub con_status: u8,
    pub user: u8,
}

impl Default for LedMap {
    fn default() -> Self {
        Self {
            run_status: 0,
            con_status: 1,
            user: 2,
        }
    }
}

/// Last level seen on the user button.
#[derive(Debug, Default)]
pub struct ButtonState(AtomicBool);

impl ButtonState {
    pub fn set(&self, pressed: bool) {
        self.0.store(pressed, Ordering::Release);
    }

    pub fn get(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}
