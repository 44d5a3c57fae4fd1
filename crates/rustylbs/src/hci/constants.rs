//! HCI protocol constants
//!
//! This module contains constants used in the Bluetooth HCI protocol.

// HCI packet types
pub const HCI_COMMAND_PKT: u8 = 0x01;
pub const HCI_ACL_PKT: u8 = 0x02;
pub const HCI_EVENT_PKT: u8 = 0x04;

// Maximum size of HCI command parameters
pub const HCI_MAX_PARAM_LEN: usize = 255;

// Common OGF (Opcode Group Field) values
pub const OGF_HOST_CTL: u8 = 0x03;
pub const OGF_LE: u8 = 0x08;

// Host Controller Commands (OGF: 0x03)
pub const OCF_SET_EVENT_MASK: u16 = 0x0001;
pub const OCF_RESET: u16 = 0x0003;

// LE Command OCF values (OGF: 0x08)
pub const OCF_LE_SET_EVENT_MASK: u16 = 0x0001;
pub const OCF_LE_SET_ADVERTISING_PARAMETERS: u16 = 0x0006;
pub const OCF_LE_SET_ADVERTISING_DATA: u16 = 0x0008;
pub const OCF_LE_SET_SCAN_RESPONSE_DATA: u16 = 0x0009;
pub const OCF_LE_SET_ADVERTISING_ENABLE: u16 = 0x000A;
pub const OCF_LE_CLEAR_FILTER_ACCEPT_LIST: u16 = 0x0010;
pub const OCF_LE_ADD_DEVICE_TO_FILTER_ACCEPT_LIST: u16 = 0x0011;
pub const OCF_LE_SET_DATA_LENGTH: u16 = 0x0022;
pub const OCF_LE_SET_PHY: u16 = 0x0032;

// HCI Events
pub const EVT_DISCONN_COMPLETE: u8 = 0x05;
pub const EVT_ENCRYPTION_CHANGE: u8 = 0x08;
pub const EVT_CMD_COMPLETE: u8 = 0x0E;
pub const EVT_CMD_STATUS: u8 = 0x0F;
pub const EVT_LE_META_EVENT: u8 = 0x3E;

// LE Meta Events
pub const EVT_LE_CONN_COMPLETE: u8 = 0x01;
pub const EVT_LE_CONN_UPDATE_COMPLETE: u8 = 0x03;
pub const EVT_LE_DATA_LENGTH_CHANGE: u8 = 0x07;
pub const EVT_LE_PHY_UPDATE_COMPLETE: u8 = 0x0C;

// Event masks: classic defaults plus LE Meta (bit 61)
pub const EVENT_MASK_DEFAULT_WITH_LE: u64 = 0x2000_1FFF_FFFF_FFFF;
// Connection Complete, Connection Update Complete, Data Length Change, PHY Update Complete
pub const LE_EVENT_MASK: u64 = 0x0000_0000_0000_0845;

// Connection handle occupies the low 12 bits of the ACL header
pub const ACL_HANDLE_MASK: u16 = 0x0FFF;
pub const ACL_PB_FIRST_NON_FLUSHABLE: u16 = 0x0000;
pub const ACL_PB_CONTINUATION: u16 = 0x0001;

// L2CAP fixed channel for SMP
pub const SMP_CID: u16 = 0x0006;
pub const SMP_PAIRING_FAILED: u8 = 0x05;
pub const SMP_REASON_PAIRING_NOT_SUPPORTED: u8 = 0x05;
