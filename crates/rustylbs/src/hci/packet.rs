//! HCI packet structures and parsing
//!
//! Commands the peripheral sends, events and ACL data it receives.

use crate::error::HciError;
use crate::gap::constants::ADV_DATA_MAX_LEN;
use crate::hci::constants::*;
use byteorder::{ByteOrder, LittleEndian};

/// HCI commands issued by the peripheral
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HciCommand {
    // Host Controller Commands (OGF: 0x03)
    Reset,
    SetEventMask { event_mask: u64 },

    // LE Commands (OGF: 0x08)
    LeSetEventMask { event_mask: u64 },
    LeSetAdvertisingParameters {
        interval_min: u16,
        interval_max: u16,
        adv_type: u8,
        own_address_type: u8,
        channel_map: u8,
        filter_policy: u8,
    },
    LeSetAdvertisingData { data: Vec<u8> },
    LeSetScanResponseData { data: Vec<u8> },
    LeSetAdvertisingEnable { enable: bool },
    LeClearFilterAcceptList,
    LeAddDeviceToFilterAcceptList { address_type: u8, address: [u8; 6] },
    LeSetDataLength { handle: u16, tx_octets: u16, tx_time: u16 },
    LeSetPhy {
        handle: u16,
        all_phys: u8,
        tx_phys: u8,
        rx_phys: u8,
        phy_options: u16,
    },
}

impl HciCommand {
    /// Get the OGF and OCF for this command
    pub fn opcode_parts(&self) -> (u8, u16) {
        match self {
            Self::Reset => (OGF_HOST_CTL, OCF_RESET),
            Self::SetEventMask { .. } => (OGF_HOST_CTL, OCF_SET_EVENT_MASK),

            Self::LeSetEventMask { .. } => (OGF_LE, OCF_LE_SET_EVENT_MASK),
            Self::LeSetAdvertisingParameters { .. } => (OGF_LE, OCF_LE_SET_ADVERTISING_PARAMETERS),
            Self::LeSetAdvertisingData { .. } => (OGF_LE, OCF_LE_SET_ADVERTISING_DATA),
            Self::LeSetScanResponseData { .. } => (OGF_LE, OCF_LE_SET_SCAN_RESPONSE_DATA),
            Self::LeSetAdvertisingEnable { .. } => (OGF_LE, OCF_LE_SET_ADVERTISING_ENABLE),
            Self::LeClearFilterAcceptList => (OGF_LE, OCF_LE_CLEAR_FILTER_ACCEPT_LIST),
            Self::LeAddDeviceToFilterAcceptList { .. } => {
                (OGF_LE, OCF_LE_ADD_DEVICE_TO_FILTER_ACCEPT_LIST)
            }
            Self::LeSetDataLength { .. } => (OGF_LE, OCF_LE_SET_DATA_LENGTH),
            Self::LeSetPhy { .. } => (OGF_LE, OCF_LE_SET_PHY),
        }
    }

    /// Combined 16-bit opcode
    pub fn opcode(&self) -> u16 {
        let (ogf, ocf) = self.opcode_parts();
        ((ogf as u16) << 10) | (ocf & 0x3ff)
    }

    /// Convert the command to its raw parameter bytes
    fn parameters(&self) -> Result<Vec<u8>, HciError> {
        let params = match self {
            Self::Reset | Self::LeClearFilterAcceptList => vec![],

            Self::SetEventMask { event_mask } | Self::LeSetEventMask { event_mask } => {
                event_mask.to_le_bytes().to_vec()
            }

            Self::LeSetAdvertisingParameters {
                interval_min,
                interval_max,
                adv_type,
                own_address_type,
                channel_map,
                filter_policy,
            } => {
                let mut params = Vec::with_capacity(15);
                params.extend_from_slice(&interval_min.to_le_bytes());
                params.extend_from_slice(&interval_max.to_le_bytes());
                params.push(*adv_type);
                params.push(*own_address_type);
                // Peer address type and address, unused for undirected advertising
                params.push(0x00);
                params.extend_from_slice(&[0u8; 6]);
                params.push(*channel_map);
                params.push(*filter_policy);
                params
            }

            Self::LeSetAdvertisingData { data } | Self::LeSetScanResponseData { data } => {
                if data.len() > ADV_DATA_MAX_LEN {
                    return Err(HciError::InvalidParamLength(data.len()));
                }
                let mut params = Vec::with_capacity(ADV_DATA_MAX_LEN + 1);
                params.push(data.len() as u8);
                params.extend_from_slice(data);
                params.resize(ADV_DATA_MAX_LEN + 1, 0);
                params
            }

            Self::LeSetAdvertisingEnable { enable } => vec![*enable as u8],

            Self::LeAddDeviceToFilterAcceptList {
                address_type,
                address,
            } => {
                let mut params = Vec::with_capacity(7);
                params.push(*address_type);
                params.extend_from_slice(address);
                params
            }

            Self::LeSetDataLength {
                handle,
                tx_octets,
                tx_time,
            } => {
                let mut params = Vec::with_capacity(6);
                params.extend_from_slice(&handle.to_le_bytes());
                params.extend_from_slice(&tx_octets.to_le_bytes());
                params.extend_from_slice(&tx_time.to_le_bytes());
                params
            }

            Self::LeSetPhy {
                handle,
                all_phys,
                tx_phys,
                rx_phys,
                phy_options,
            } => {
                let mut params = Vec::with_capacity(7);
                params.extend_from_slice(&handle.to_le_bytes());
                params.push(*all_phys);
                params.push(*tx_phys);
                params.push(*rx_phys);
                params.extend_from_slice(&phy_options.to_le_bytes());
                params
            }
        };
        Ok(params)
    }

    /// Convert the command to a raw HCI packet
    pub fn to_packet(&self) -> Result<Vec<u8>, HciError> {
        let params = self.parameters()?;
        if params.len() > HCI_MAX_PARAM_LEN {
            return Err(HciError::InvalidParamLength(params.len()));
        }

        let mut packet = vec![HCI_COMMAND_PKT];
        packet.extend_from_slice(&self.opcode().to_le_bytes());
        packet.push(params.len() as u8);
        packet.extend_from_slice(&params);
        Ok(packet)
    }
}

/// HCI Event packet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HciEvent {
    pub event_code: u8,
    pub parameter_total_length: u8,
    pub parameters: Vec<u8>,
}

impl HciEvent {
    /// Parse an HCI event from raw bytes
    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.len() < 2 {
            return None;
        }

        let event_code = data[0];
        let parameter_total_length = data[1];

        if data.len() < (parameter_total_length as usize + 2) {
            return None;
        }

        let parameters = data[2..(parameter_total_length as usize + 2)].to_vec();

        Some(HciEvent {
            event_code,
            parameter_total_length,
            parameters,
        })
    }
}

/// ACL data packet carrying one L2CAP basic frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AclPacket {
    pub handle: u16,
    pub packet_boundary: u16,
    /// L2CAP channel id
    pub cid: u16,
    /// L2CAP payload
    pub payload: Vec<u8>,
}

impl AclPacket {
    pub fn new(handle: u16, cid: u16, payload: Vec<u8>) -> Self {
        Self {
            handle,
            packet_boundary: ACL_PB_FIRST_NON_FLUSHABLE,
            cid,
            payload,
        }
    }

    /// Parse an ACL packet without the packet type byte. Continuation
    /// fragments and truncated frames are rejected.
    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.len() < 8 {
            return None;
        }
        let header = LittleEndian::read_u16(&data[0..2]);
        let handle = header & ACL_HANDLE_MASK;
        let packet_boundary = (header >> 12) & 0x3;
        if packet_boundary == ACL_PB_CONTINUATION {
            return None;
        }
        let acl_len = LittleEndian::read_u16(&data[2..4]) as usize;
        let l2cap_len = LittleEndian::read_u16(&data[4..6]) as usize;
        let cid = LittleEndian::read_u16(&data[6..8]);
        if data.len() < 4 + acl_len || acl_len < 4 + l2cap_len {
            return None;
        }
        Some(Self {
            handle,
            packet_boundary,
            cid,
            payload: data[8..8 + l2cap_len].to_vec(),
        })
    }

    /// Convert to a raw HCI packet including the type byte
    pub fn to_packet(&self) -> Vec<u8> {
        let header = (self.handle & ACL_HANDLE_MASK) | (self.packet_boundary << 12);
        let l2cap_len = self.payload.len() as u16;
        let mut packet = Vec::with_capacity(9 + self.payload.len());
        packet.push(HCI_ACL_PKT);
        packet.extend_from_slice(&header.to_le_bytes());
        packet.extend_from_slice(&(l2cap_len + 4).to_le_bytes());
        packet.extend_from_slice(&l2cap_len.to_le_bytes());
        packet.extend_from_slice(&self.cid.to_le_bytes());
        packet.extend_from_slice(&self.payload);
        packet
    }
}

/// A packet read from the controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HciPacket {
    Event(HciEvent),
    Acl(AclPacket),
}

impl HciPacket {
    /// Parse a packet including its leading type byte
    pub fn parse(data: &[u8]) -> Option<Self> {
        let (&packet_type, rest) = data.split_first()?;
        match packet_type {
            HCI_EVENT_PKT => HciEvent::parse(rest).map(HciPacket::Event),
            HCI_ACL_PKT => AclPacket::parse(rest).map(HciPacket::Acl),
            _ => None,
        }
    }
}
