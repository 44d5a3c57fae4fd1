//! HCI Socket implementation for Bluetooth communication
//!
//! This module provides a wrapper around the raw HCI socket interface,
//! allowing for communication with Bluetooth controllers.

use crate::error::HciError;
use crate::hci::constants::{HCI_ACL_PKT, HCI_EVENT_PKT};
use crate::hci::packet::{AclPacket, HciCommand, HciPacket};
use std::os::unix::io::{AsRawFd, RawFd};
use std::time::Duration;

// Bluetooth socket constants
const AF_BLUETOOTH: i32 = 31;
const BTPROTO_HCI: i32 = 1;
const HCI_CHANNEL_RAW: u16 = 0;
const SOL_HCI: i32 = 0;
const HCI_FILTER: i32 = 2;

// Large enough for an event or an LE ACL packet with extended data length
const READ_BUFFER_LEN: usize = 1024;

/// Represents an HCI socket
#[derive(Debug)]
pub struct HciSocket {
    fd: RawFd,
}

// Define the sockaddr_hci structure
#[repr(C)]
struct SockaddrHci {
    hci_family: libc::sa_family_t,
    hci_dev: u16,
    hci_channel: u16,
}

// Define the hci_filter structure
#[repr(C)]
struct HciFilter {
    type_mask: u32,
    event_mask: [u32; 2],
    opcode: u16,
}

impl HciSocket {
    /// Opens a raw HCI socket on `dev_id` that receives events and ACL data
    pub fn open(dev_id: u16) -> Result<Self, HciError> {
        let fd = unsafe { libc::socket(AF_BLUETOOTH, libc::SOCK_RAW, BTPROTO_HCI) };

        if fd < 0 {
            return Err(HciError::SocketError(std::io::Error::last_os_error()));
        }
        // Closes the fd on every early return below
        let socket = HciSocket { fd };

        let addr = SockaddrHci {
            hci_family: AF_BLUETOOTH as libc::sa_family_t,
            hci_dev: dev_id,
            hci_channel: HCI_CHANNEL_RAW,
        };

        let result = unsafe {
            libc::bind(
                fd,
                &addr as *const _ as *const libc::sockaddr,
                std::mem::size_of::<SockaddrHci>() as libc::socklen_t,
            )
        };

        if result < 0 {
            return Err(HciError::BindError(std::io::Error::last_os_error()));
        }

        socket.set_filter()?;
        Ok(socket)
    }

    /// Lets every event and ACL packet through
    fn set_filter(&self) -> Result<(), HciError> {
        let filter = HciFilter {
            type_mask: (1 << HCI_EVENT_PKT) | (1 << HCI_ACL_PKT),
            event_mask: [u32::MAX, u32::MAX],
            opcode: 0,
        };

        let result = unsafe {
            libc::setsockopt(
                self.fd,
                SOL_HCI,
                HCI_FILTER,
                &filter as *const _ as *const libc::c_void,
                std::mem::size_of::<HciFilter>() as libc::socklen_t,
            )
        };

        if result < 0 {
            return Err(HciError::SocketError(std::io::Error::last_os_error()));
        }
        Ok(())
    }

    /// Wraps an already open packet socket
    #[cfg(test)]
    pub(crate) fn from_raw_fd(fd: RawFd) -> Self {
        HciSocket { fd }
    }

    /// Read one packet from the socket
    pub fn read_packet(&self) -> Result<HciPacket, HciError> {
        let mut buffer = [0u8; READ_BUFFER_LEN];

        let bytes_read = unsafe {
            libc::read(
                self.fd,
                buffer.as_mut_ptr() as *mut libc::c_void,
                buffer.len(),
            )
        };

        if bytes_read < 0 {
            return Err(HciError::ReceiveError(std::io::Error::last_os_error()));
        }

        HciPacket::parse(&buffer[..bytes_read as usize]).ok_or(HciError::InvalidPacketFormat)
    }

    /// Read one packet, waiting at most `timeout`
    pub fn read_packet_timeout(&self, timeout: Duration) -> Result<HciPacket, HciError> {
        let mut read_fds: libc::fd_set = unsafe { std::mem::zeroed() };
        unsafe {
            libc::FD_ZERO(&mut read_fds);
            libc::FD_SET(self.fd, &mut read_fds);
        }

        let mut timeout_val = libc::timeval {
            tv_sec: timeout.as_secs() as libc::time_t,
            tv_usec: timeout.subsec_micros() as libc::suseconds_t,
        };

        let result = unsafe {
            libc::select(
                self.fd + 1,
                &mut read_fds,
                std::ptr::null_mut(),
                std::ptr::null_mut(),
                &mut timeout_val,
            )
        };

        if result < 0 {
            return Err(HciError::ReceiveError(std::io::Error::last_os_error()));
        }

        if result == 0 {
            return Err(HciError::Timeout);
        }

        self.read_packet()
    }

    /// Sends an HCI command to the controller
    pub fn send_command(&self, command: &HciCommand) -> Result<(), HciError> {
        self.write_all(&command.to_packet()?)
    }

    /// Sends an ACL data packet
    pub fn send_acl(&self, packet: &AclPacket) -> Result<(), HciError> {
        self.write_all(&packet.to_packet())
    }

    fn write_all(&self, packet: &[u8]) -> Result<(), HciError> {
        match unsafe {
            libc::write(
                self.fd,
                packet.as_ptr() as *const libc::c_void,
                packet.len(),
            )
        } {
            -1 => Err(HciError::SendError(std::io::Error::last_os_error())),
            _ => Ok(()),
        }
    }
}

impl AsRawFd for HciSocket {
    fn as_raw_fd(&self) -> RawFd {
        self.fd
    }
}

impl Drop for HciSocket {
    fn drop(&mut self) {
        unsafe {
            libc::close(self.fd);
        }
    }
}
