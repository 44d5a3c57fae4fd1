//! Error types for the rustylbs library
//!
//! Each layer has its own error enum; `Error` aggregates them for callers
//! that drive the whole peripheral.

use crate::host::HostError;
use crate::smp::BondError;
use thiserror::Error;

/// Errors that can occur when working with HCI sockets
#[derive(Error, Debug)]
pub enum HciError {
    #[error("Failed to open HCI socket: {0}")]
    SocketError(#[from] std::io::Error),

    #[error("Failed to bind to HCI device: {0}")]
    BindError(std::io::Error),

    #[error("Failed to send HCI packet: {0}")]
    SendError(std::io::Error),

    #[error("Failed to receive HCI packet: {0}")]
    ReceiveError(std::io::Error),

    #[error("Command 0x{opcode:04X} failed with status 0x{status:02X}")]
    CommandFailed { opcode: u16, status: u8 },

    #[error("Timed out waiting for HCI packet")]
    Timeout,

    #[error("Invalid parameter length: {0}")]
    InvalidParamLength(usize),

    #[error("Invalid HCI packet format")]
    InvalidPacketFormat,
}

/// Top-level error for the peripheral core
#[derive(Error, Debug)]
pub enum Error {
    #[error("HCI error: {0}")]
    Hci(#[from] HciError),

    #[error("Host error: {0}")]
    Host(#[from] HostError),

    #[error("Bond store error: {0}")]
    Bond(#[from] BondError),

    #[error("Accept list setup failed: {0}")]
    AcceptList(HostError),

    #[error("Advertising data too long: {0} bytes")]
    AdvertisingDataTooLong(usize),

    #[error("Work queue closed")]
    WorkQueueClosed,

    #[error("Invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
