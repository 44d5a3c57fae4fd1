//! Translation of controller events into host events

use crate::gap::{AddressType, BdAddr, LeAddress, Phy};
use crate::hci::constants::*;
use crate::hci::packet::HciEvent;
use crate::host::{ConnParams, DataLengthInfo, HostEvent};
use crate::smp::SecurityLevel;
use byteorder::{ByteOrder, LittleEndian};

/// Outcome of a command as reported by Command Complete or Command Status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandResult {
    pub opcode: u16,
    pub status: u8,
}

/// Extracts the opcode and status from Command Complete / Command Status.
pub fn command_result(event: &HciEvent) -> Option<CommandResult> {
    let p = &event.parameters;
    match event.event_code {
        // num_hci_command_packets, opcode, status
        EVT_CMD_COMPLETE if p.len() >= 4 => Some(CommandResult {
            opcode: LittleEndian::read_u16(&p[1..3]),
            status: p[3],
        }),
        // status, num_hci_command_packets, opcode
        EVT_CMD_STATUS if p.len() >= 4 => Some(CommandResult {
            opcode: LittleEndian::read_u16(&p[2..4]),
            status: p[0],
        }),
        _ => None,
    }
}

/// Decodes the connection-related events the peripheral reacts to.
///
/// Disconnection Complete yields `Disconnected` followed by `Recycled`: the
/// controller has no separate release step.
pub fn decode_event(event: &HciEvent) -> Vec<HostEvent> {
    let p = &event.parameters;
    match event.event_code {
        EVT_DISCONN_COMPLETE if p.len() >= 4 => {
            if p[0] != 0 {
                return Vec::new();
            }
            vec![
                HostEvent::Disconnected {
                    handle: handle_at(p, 1),
                    reason: p[3],
                },
                HostEvent::Recycled,
            ]
        }
        EVT_ENCRYPTION_CHANGE if p.len() >= 4 => {
            let level = if p[3] != 0 {
                SecurityLevel::Encrypted
            } else {
                SecurityLevel::None
            };
            vec![HostEvent::SecurityChanged {
                handle: handle_at(p, 1),
                level,
                status: p[0],
            }]
        }
        EVT_LE_META_EVENT if !p.is_empty() => decode_le_meta(p[0], &p[1..])
            .into_iter()
            .collect(),
        _ => Vec::new(),
    }
}

fn decode_le_meta(subevent: u8, p: &[u8]) -> Option<HostEvent> {
    match subevent {
        // status, handle, role, peer type, peer address, interval, latency, timeout, clock accuracy
        EVT_LE_CONN_COMPLETE if p.len() >= 18 => {
            let peer = LeAddress::new(AddressType::from(p[4]), BdAddr::from_slice(&p[5..11])?);
            Some(HostEvent::Connected {
                handle: handle_at(p, 1),
                peer,
                status: p[0],
                params: ConnParams {
                    interval: LittleEndian::read_u16(&p[11..13]),
                    latency: LittleEndian::read_u16(&p[13..15]),
                    timeout: LittleEndian::read_u16(&p[15..17]),
                },
            })
        }
        EVT_LE_CONN_UPDATE_COMPLETE if p.len() >= 9 => {
            if p[0] != 0 {
                return None;
            }
            Some(HostEvent::ParamUpdated {
                handle: handle_at(p, 1),
                params: ConnParams {
                    interval: LittleEndian::read_u16(&p[3..5]),
                    latency: LittleEndian::read_u16(&p[5..7]),
                    timeout: LittleEndian::read_u16(&p[7..9]),
                },
            })
        }
        EVT_LE_DATA_LENGTH_CHANGE if p.len() >= 10 => Some(HostEvent::DataLengthUpdated {
            handle: handle_at(p, 0),
            info: DataLengthInfo {
                tx_max_len: LittleEndian::read_u16(&p[2..4]),
                tx_max_time: LittleEndian::read_u16(&p[4..6]),
                rx_max_len: LittleEndian::read_u16(&p[6..8]),
                rx_max_time: LittleEndian::read_u16(&p[8..10]),
            },
        }),
        EVT_LE_PHY_UPDATE_COMPLETE if p.len() >= 5 => Some(HostEvent::PhyUpdated {
            handle: handle_at(p, 1),
            status: p[0],
            tx: Phy::from_hci(p[3]),
            rx: Phy::from_hci(p[4]),
        }),
        _ => None,
    }
}

fn handle_at(p: &[u8], offset: usize) -> u16 {
    LittleEndian::read_u16(&p[offset..offset + 2]) & ACL_HANDLE_MASK
}
