//! The few ATT PDUs the HCI host exchanges with a central

use super::constants::*;
use super::error::AttErrorCode;
use byteorder::{ByteOrder, LittleEndian};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttPdu {
    ErrorRsp {
        request: u8,
        handle: u16,
        code: AttErrorCode,
    },
    ExchangeMtuReq {
        mtu: u16,
    },
    ExchangeMtuRsp {
        mtu: u16,
    },
    ReadReq {
        handle: u16,
    },
    ReadRsp {
        value: Vec<u8>,
    },
    ReadBlobReq {
        handle: u16,
        offset: u16,
    },
    ReadBlobRsp {
        value: Vec<u8>,
    },
    WriteReq {
        handle: u16,
        value: Vec<u8>,
    },
    WriteRsp,
    WriteCmd {
        handle: u16,
        value: Vec<u8>,
    },
    HandleValueNtf {
        handle: u16,
        value: Vec<u8>,
    },
    HandleValueInd {
        handle: u16,
        value: Vec<u8>,
    },
    HandleValueConf,
    /// Anything else; requests among these get Request Not Supported
    Other {
        opcode: u8,
    },
}

impl AttPdu {
    pub fn opcode(&self) -> u8 {
        match self {
            Self::ErrorRsp { .. } => ATT_ERROR_RSP,
            Self::ExchangeMtuReq { .. } => ATT_EXCHANGE_MTU_REQ,
            Self::ExchangeMtuRsp { .. } => ATT_EXCHANGE_MTU_RSP,
            Self::ReadReq { .. } => ATT_READ_REQ,
            Self::ReadRsp { .. } => ATT_READ_RSP,
            Self::ReadBlobReq { .. } => ATT_READ_BLOB_REQ,
            Self::ReadBlobRsp { .. } => ATT_READ_BLOB_RSP,
            Self::WriteReq { .. } => ATT_WRITE_REQ,
            Self::WriteRsp => ATT_WRITE_RSP,
            Self::WriteCmd { .. } => ATT_WRITE_CMD,
            Self::HandleValueNtf { .. } => ATT_HANDLE_VALUE_NTF,
            Self::HandleValueInd { .. } => ATT_HANDLE_VALUE_IND,
            Self::HandleValueConf => ATT_HANDLE_VALUE_CONF,
            Self::Other { opcode } => *opcode,
        }
    }

    /// Parses a PDU. Returns `None` if it is truncated.
    pub fn parse(data: &[u8]) -> Option<Self> {
        let (&opcode, rest) = data.split_first()?;
        let u16_at = |offset: usize| -> Option<u16> {
            rest.get(offset..offset + 2).map(LittleEndian::read_u16)
        };

        let pdu = match opcode {
            ATT_ERROR_RSP => Self::ErrorRsp {
                request: *rest.first()?,
                handle: u16_at(1)?,
                code: AttErrorCode::from(*rest.get(3)?),
            },
            ATT_EXCHANGE_MTU_REQ => Self::ExchangeMtuReq { mtu: u16_at(0)? },
            ATT_EXCHANGE_MTU_RSP => Self::ExchangeMtuRsp { mtu: u16_at(0)? },
            ATT_READ_REQ => Self::ReadReq { handle: u16_at(0)? },
            ATT_READ_RSP => Self::ReadRsp {
                value: rest.to_vec(),
            },
            ATT_READ_BLOB_REQ => Self::ReadBlobReq {
                handle: u16_at(0)?,
                offset: u16_at(2)?,
            },
            ATT_READ_BLOB_RSP => Self::ReadBlobRsp {
                value: rest.to_vec(),
            },
            ATT_WRITE_REQ => Self::WriteReq {
                handle: u16_at(0)?,
                value: rest[2..].to_vec(),
            },
            ATT_WRITE_RSP => Self::WriteRsp,
            ATT_WRITE_CMD => Self::WriteCmd {
                handle: u16_at(0)?,
                value: rest[2..].to_vec(),
            },
            ATT_HANDLE_VALUE_NTF => Self::HandleValueNtf {
                handle: u16_at(0)?,
                value: rest[2..].to_vec(),
            },
            ATT_HANDLE_VALUE_IND => Self::HandleValueInd {
                handle: u16_at(0)?,
                value: rest[2..].to_vec(),
            },
            ATT_HANDLE_VALUE_CONF => Self::HandleValueConf,
            opcode => Self::Other { opcode },
        };
        Some(pdu)
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = vec![self.opcode()];
        match self {
            Self::ErrorRsp {
                request,
                handle,
                code,
            } => {
                out.push(*request);
                out.extend_from_slice(&handle.to_le_bytes());
                out.push(u8::from(*code));
            }
            Self::ExchangeMtuReq { mtu } | Self::ExchangeMtuRsp { mtu } => {
                out.extend_from_slice(&mtu.to_le_bytes());
            }
            Self::ReadReq { handle } => out.extend_from_slice(&handle.to_le_bytes()),
            Self::ReadBlobReq { handle, offset } => {
                out.extend_from_slice(&handle.to_le_bytes());
                out.extend_from_slice(&offset.to_le_bytes());
            }
            Self::ReadRsp { value } | Self::ReadBlobRsp { value } => out.extend_from_slice(value),
            Self::WriteReq { handle, value }
            | Self::WriteCmd { handle, value }
            | Self::HandleValueNtf { handle, value }
            | Self::HandleValueInd { handle, value } => {
                out.extend_from_slice(&handle.to_le_bytes());
                out.extend_from_slice(value);
            }
            Self::WriteRsp | Self::HandleValueConf | Self::Other { .. } => {}
        }
        out
    }

    /// Requests expect a response; commands and server-initiated PDUs don't.
    pub fn is_request(&self) -> bool {
        match self {
            Self::ExchangeMtuReq { .. }
            | Self::ReadReq { .. }
            | Self::ReadBlobReq { .. }
            | Self::WriteReq { .. } => true,
            Self::Other { opcode } => {
                opcode & ATT_COMMAND_FLAG == 0 && opcode % 2 == 0 && *opcode != ATT_HANDLE_VALUE_CONF
            }
            _ => false,
        }
    }
}
