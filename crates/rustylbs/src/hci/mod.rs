//! Bluetooth HCI (Host Controller Interface) transport
//!
//! Raw HCI socket access, packet encoding and the `BleHost` implementation
//! built on them.

pub mod constants;
pub mod events;
pub mod host;
pub mod packet;
pub mod socket;


pub use events::{command_result, decode_event, CommandResult};
pub use host::HciHost;
pub use packet::{AclPacket, HciCommand, HciEvent, HciPacket};
pub use socket::HciSocket;
