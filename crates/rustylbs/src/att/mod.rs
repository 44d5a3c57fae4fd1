//! Attribute Protocol constants, error codes and PDUs

pub mod constants;
pub mod error;
pub mod pdu;

pub use self::constants::*;
pub use self::error::AttErrorCode;
pub use self::pdu::AttPdu;
