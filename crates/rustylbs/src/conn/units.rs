//! Link-layer unit conversions
//!
//! Controllers report connection parameters in fixed-size units. These are
//! used for logging only and never feed back into control flow.

/// ATT header overhead on every notification or write.
pub const ATT_HEADER_LEN: u16 = 3;

/// Connection interval: 1.25 ms units to milliseconds.
pub fn interval_to_ms(units: u16) -> f32 {
    units as f32 * 1.25
}

/// Supervision timeout: 10 ms units to milliseconds.
pub fn timeout_to_ms(units: u16) -> u32 {
    units as u32 * 10
}

/// Advertising interval: 0.625 ms units to milliseconds.
pub fn adv_interval_to_ms(units: u16) -> f32 {
    units as f32 * 0.625
}

/// Application payload available in one ATT PDU for a negotiated MTU.
pub fn att_payload_len(mtu: u16) -> u16 {
    mtu.saturating_sub(ATT_HEADER_LEN)
}
