//! `BleHost` over a raw HCI socket
//!
//! Commands are synchronous: the caller blocks until the matching Command
//! Complete or Command Status arrives. Those are read by whoever runs
//! [`HciHost::process`], so commands must be issued from another thread (the
//! work queue) once the event loop is running.

use crate::att::{AttErrorCode, AttPdu, ATT_CID, ATT_DEFAULT_MTU, ATT_EXCHANGE_MTU_REQ};
use crate::error::HciError;
use crate::gap::constants::{ADV_CHANNEL_MAP_ALL, ADV_FILTER_CONN_ACCEPT_LIST, ADV_FILTER_NONE, ADV_IND};
use crate::gap::{AddressType, LeAddress};
use crate::gatt::{LbsError, LedButtonService};
use crate::hci::constants::*;
use crate::hci::events::{command_result, decode_event, CommandResult};
use crate::hci::packet::{AclPacket, HciCommand, HciEvent, HciPacket};
use crate::hci::socket::HciSocket;
use crate::host::{
    AdvParams, BleHost, ConnHandle, DataLengthParams, HostError, HostEvent, HostResult,
    PhyPreference,
};
use crossbeam_channel::{unbounded, Receiver, Sender};
use log::{debug, warn};
use std::time::{Duration, Instant};

// Non-connectable undirected advertising
const ADV_NONCONN_IND: u8 = 0x03;
const OWN_ADDRESS_PUBLIC: u8 = 0x00;

pub struct HciHost {
    socket: HciSocket,
    local_mtu: u16,
    command_timeout: Duration,
    results_tx: Sender<CommandResult>,
    results_rx: Receiver<CommandResult>,
}

impl HciHost {
    pub fn new(socket: HciSocket, local_mtu: u16) -> Self {
        let (results_tx, results_rx) = unbounded();
        Self {
            socket,
            local_mtu,
            command_timeout: Duration::from_secs(2),
            results_tx,
            results_rx,
        }
    }

    /// Opens HCI device `dev_id`.
    pub fn open(dev_id: u16, local_mtu: u16) -> Result<Self, HciError> {
        Ok(Self::new(HciSocket::open(dev_id)?, local_mtu))
    }

    /// Resets the controller and enables the events the peripheral needs.
    /// Reads the socket itself, so call it before starting the event loop.
    pub fn init(&self) -> Result<(), HciError> {
        for command in [
            HciCommand::Reset,
            HciCommand::SetEventMask {
                event_mask: EVENT_MASK_DEFAULT_WITH_LE,
            },
            HciCommand::LeSetEventMask {
                event_mask: LE_EVENT_MASK,
            },
        ] {
            self.socket.send_command(&command)?;
            self.await_direct(command.opcode())?;
        }
        Ok(())
    }

    /// Waits for the next packet. Returns `None` on timeout or for packets
    /// that do not parse.
    pub fn next_packet(&self, timeout: Duration) -> Result<Option<HciPacket>, HciError> {
        match self.socket.read_packet_timeout(timeout) {
            Ok(packet) => Ok(Some(packet)),
            Err(HciError::Timeout) => Ok(None),
            Err(HciError::InvalidPacketFormat) => {
                debug!("Dropped unparseable HCI packet");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    /// Handles one packet from the controller.
    ///
    /// Command results wake the blocked caller, attribute requests are
    /// answered through `lbs`, and everything the peripheral must react to
    /// is returned as host events, in order.
    pub fn process(&self, packet: &HciPacket, lbs: &LedButtonService) -> Vec<HostEvent> {
        match packet {
            HciPacket::Event(event) => self.process_event(event),
            HciPacket::Acl(acl) => match acl.cid {
                ATT_CID => match AttPdu::parse(&acl.payload) {
                    Some(pdu) => self.process_att(acl.handle, pdu, lbs),
                    None => {
                        debug!("Malformed ATT PDU on handle 0x{:04X}", acl.handle);
                        Vec::new()
                    }
                },
                SMP_CID => self.process_smp(acl.handle, &acl.payload),
                cid => {
                    debug!("Ignoring L2CAP channel 0x{:04X}", cid);
                    Vec::new()
                }
            },
        }
    }

    fn process_event(&self, event: &HciEvent) -> Vec<HostEvent> {
        if let Some(result) = command_result(event) {
            if result.status != 0 {
                warn!(
                    "HCI command 0x{:04X} failed with status 0x{:02X}",
                    result.opcode, result.status
                );
            }
            // No opcode 0x0000 waiter: that is the controller announcing free slots
            if result.opcode != 0 {
                let _ = self.results_tx.send(result);
            }
            return Vec::new();
        }
        decode_event(event)
    }

    fn process_att(&self, handle: ConnHandle, pdu: AttPdu, lbs: &LedButtonService) -> Vec<HostEvent> {
        let request = pdu.opcode();
        match pdu {
            AttPdu::ExchangeMtuReq { mtu } => {
                self.reply(handle, AttPdu::ExchangeMtuRsp { mtu: self.local_mtu });
                vec![self.mtu_exchanged(handle, mtu)]
            }
            AttPdu::ExchangeMtuRsp { mtu } => vec![self.mtu_exchanged(handle, mtu)],
            AttPdu::ErrorRsp {
                request: ATT_EXCHANGE_MTU_REQ,
                code,
                ..
            } => vec![HostEvent::MtuExchanged {
                handle,
                mtu: ATT_DEFAULT_MTU,
                status: u8::from(code),
            }],
            AttPdu::ReadReq { handle: attr } => {
                let rsp = match lbs.read(handle, attr, 0) {
                    Ok(value) => AttPdu::ReadRsp { value },
                    Err(err) => error_rsp(request, attr, err),
                };
                self.reply(handle, rsp);
                Vec::new()
            }
            AttPdu::ReadBlobReq {
                handle: attr,
                offset,
            } => {
                let rsp = match lbs.read(handle, attr, offset) {
                    Ok(value) => AttPdu::ReadBlobRsp { value },
                    Err(err) => error_rsp(request, attr, err),
                };
                self.reply(handle, rsp);
                Vec::new()
            }
            AttPdu::WriteReq {
                handle: attr,
                value,
            } => {
                let rsp = match lbs.write(handle, attr, 0, &value) {
                    Ok(_) => AttPdu::WriteRsp,
                    Err(err) => error_rsp(request, attr, err),
                };
                self.reply(handle, rsp);
                Vec::new()
            }
            AttPdu::WriteCmd {
                handle: attr,
                value,
            } => {
                if let Err(err) = lbs.write(handle, attr, 0, &value) {
                    debug!("Write command on 0x{:04X} dropped: {}", attr, err);
                }
                Vec::new()
            }
            AttPdu::HandleValueConf => vec![HostEvent::IndicationConfirmed { handle }],
            pdu if pdu.is_request() => {
                self.reply(
                    handle,
                    AttPdu::ErrorRsp {
                        request,
                        handle: 0x0000,
                        code: AttErrorCode::RequestNotSupported,
                    },
                );
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    /// There is no SMP implementation behind this host: pairing requests
    /// are refused.
    fn process_smp(&self, handle: ConnHandle, payload: &[u8]) -> Vec<HostEvent> {
        if payload.first() == Some(&SMP_PAIRING_FAILED) {
            return Vec::new();
        }
        let refusal = AclPacket::new(
            handle,
            SMP_CID,
            vec![SMP_PAIRING_FAILED, SMP_REASON_PAIRING_NOT_SUPPORTED],
        );
        if let Err(err) = self.socket.send_acl(&refusal) {
            warn!("Failed to refuse pairing: {}", err);
        }
        vec![HostEvent::PairingFailed {
            handle,
            reason: SMP_REASON_PAIRING_NOT_SUPPORTED,
        }]
    }

    fn mtu_exchanged(&self, handle: ConnHandle, peer_mtu: u16) -> HostEvent {
        HostEvent::MtuExchanged {
            handle,
            mtu: peer_mtu.min(self.local_mtu).max(ATT_DEFAULT_MTU),
            status: 0,
        }
    }

    fn reply(&self, handle: ConnHandle, pdu: AttPdu) {
        if let Err(err) = self.send_att(handle, &pdu) {
            warn!("Failed to answer ATT request: {}", err);
        }
    }

    fn send_att(&self, handle: ConnHandle, pdu: &AttPdu) -> HostResult<()> {
        let packet = AclPacket::new(handle, ATT_CID, pdu.encode());
        self.socket.send_acl(&packet).map_err(HostError::from)
    }

    /// Sends `command` and waits for its result from the event loop.
    fn execute(&self, command: HciCommand) -> HostResult<()> {
        // Results nobody waited for belong to earlier, timed out commands
        for stale in self.results_rx.try_iter() {
            debug!("Discarding stale result for 0x{:04X}", stale.opcode);
        }

        let opcode = command.opcode();
        debug!("HCI command 0x{:04X}", opcode);
        self.socket.send_command(&command)?;

        let deadline = Instant::now() + self.command_timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            let result = self.results_rx.recv_timeout(remaining).map_err(|_| {
                HostError::Transport(format!("no response to command 0x{:04X}", opcode))
            })?;
            if result.opcode != opcode {
                continue;
            }
            return match result.status {
                0 => Ok(()),
                status => Err(HostError::Status(status)),
            };
        }
    }

    /// Reads the socket directly until `opcode` completes.
    fn await_direct(&self, opcode: u16) -> Result<(), HciError> {
        let deadline = Instant::now() + self.command_timeout;
        while let Some(remaining) = deadline.checked_duration_since(Instant::now()) {
            match self.next_packet(remaining)? {
                Some(HciPacket::Event(event)) => match command_result(&event) {
                    Some(result) if result.opcode == opcode => {
                        return match result.status {
                            0 => Ok(()),
                            status => Err(HciError::CommandFailed { opcode, status }),
                        };
                    }
                    _ => continue,
                },
                _ => continue,
            }
        }
        Err(HciError::Timeout)
    }
}

fn error_rsp(request: u8, attr: u16, err: LbsError) -> AttPdu {
    let code = match err {
        LbsError::Att(code) => code,
        _ => AttErrorCode::Unlikely,
    };
    AttPdu::ErrorRsp {
        request,
        handle: attr,
        code,
    }
}

/// Filter accept list only distinguishes public and random addresses.
fn accept_list_address_type(kind: AddressType) -> u8 {
    match kind {
        AddressType::Public | AddressType::PublicIdentity => 0x00,
        AddressType::Random | AddressType::RandomIdentity => 0x01,
    }
}

impl BleHost for HciHost {
    fn start_advertising(&self, params: &AdvParams, ad: &[u8], sd: &[u8]) -> HostResult<()> {
        self.execute(HciCommand::LeSetAdvertisingParameters {
            interval_min: params.interval_min,
            interval_max: params.interval_max,
            adv_type: if params.connectable { ADV_IND } else { ADV_NONCONN_IND },
            own_address_type: OWN_ADDRESS_PUBLIC,
            channel_map: ADV_CHANNEL_MAP_ALL,
            filter_policy: if params.filter_accept_list {
                ADV_FILTER_CONN_ACCEPT_LIST
            } else {
                ADV_FILTER_NONE
            },
        })?;
        self.update_advertising_data(ad, sd)?;
        self.execute(HciCommand::LeSetAdvertisingEnable { enable: true })
    }

    fn stop_advertising(&self) -> HostResult<()> {
        self.execute(HciCommand::LeSetAdvertisingEnable { enable: false })
    }

    fn update_advertising_data(&self, ad: &[u8], sd: &[u8]) -> HostResult<()> {
        self.execute(HciCommand::LeSetAdvertisingData { data: ad.to_vec() })?;
        self.execute(HciCommand::LeSetScanResponseData { data: sd.to_vec() })
    }

    fn accept_list_clear(&self) -> HostResult<()> {
        self.execute(HciCommand::LeClearFilterAcceptList)
    }

    fn accept_list_add(&self, addr: &LeAddress) -> HostResult<()> {
        self.execute(HciCommand::LeAddDeviceToFilterAcceptList {
            address_type: accept_list_address_type(addr.kind),
            address: addr.addr.bytes,
        })
    }

    fn update_phy(&self, handle: ConnHandle, pref: PhyPreference) -> HostResult<()> {
        self.execute(HciCommand::LeSetPhy {
            handle,
            all_phys: 0,
            tx_phys: pref.tx.bits(),
            rx_phys: pref.rx.bits(),
            phy_options: 0,
        })
    }

    fn update_data_length(&self, handle: ConnHandle, params: DataLengthParams) -> HostResult<()> {
        self.execute(HciCommand::LeSetDataLength {
            handle,
            tx_octets: params.tx_max_len,
            tx_time: params.tx_max_time,
        })
    }

    fn exchange_mtu(&self, handle: ConnHandle, mtu: u16) -> HostResult<()> {
        self.send_att(handle, &AttPdu::ExchangeMtuReq { mtu })
    }

    fn notify(&self, handle: ConnHandle, attr: u16, value: &[u8]) -> HostResult<()> {
        self.send_att(
            handle,
            &AttPdu::HandleValueNtf {
                handle: attr,
                value: value.to_vec(),
            },
        )
    }

    fn indicate(&self, handle: ConnHandle, attr: u16, value: &[u8]) -> HostResult<()> {
        self.send_att(
            handle,
            &AttPdu::HandleValueInd {
                handle: attr,
                value: value.to_vec(),
            },
        )
    }
}
