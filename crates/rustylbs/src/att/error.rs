//! ATT error codes
use super::constants::*;
use thiserror::Error;

/// Error codes carried in an ATT Error Response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AttErrorCode {
    #[error("Invalid handle")]
    InvalidHandle,

    #[error("Read not permitted")]
    ReadNotPermitted,

    #[error("Write not permitted")]
    WriteNotPermitted,

    #[error("Invalid PDU")]
    InvalidPdu,

    #[error("Request not supported")]
    RequestNotSupported,

    #[error("Invalid offset")]
    InvalidOffset,

    #[error("Attribute not found")]
    AttributeNotFound,

    #[error("Invalid attribute value length")]
    InvalidAttributeValueLength,

    #[error("Unlikely error")]
    Unlikely,

    #[error("Value not allowed")]
    ValueNotAllowed,

    #[error("CCC descriptor improperly configured")]
    CccImproperlyConfigured,

    #[error("ATT error 0x{0:02X}")]
    Other(u8),
}

impl From<u8> for AttErrorCode {
    fn from(code: u8) -> Self {
        match code {
            ATT_ERROR_INVALID_HANDLE => AttErrorCode::InvalidHandle,
            ATT_ERROR_READ_NOT_PERMITTED => AttErrorCode::ReadNotPermitted,
            ATT_ERROR_WRITE_NOT_PERMITTED => AttErrorCode::WriteNotPermitted,
            ATT_ERROR_INVALID_PDU => AttErrorCode::InvalidPdu,
            ATT_ERROR_REQUEST_NOT_SUPPORTED => AttErrorCode::RequestNotSupported,
            ATT_ERROR_INVALID_OFFSET => AttErrorCode::InvalidOffset,
            ATT_ERROR_ATTRIBUTE_NOT_FOUND => AttErrorCode::AttributeNotFound,
            ATT_ERROR_INVALID_ATTRIBUTE_VALUE_LENGTH => AttErrorCode::InvalidAttributeValueLength,
            ATT_ERROR_UNLIKELY => AttErrorCode::Unlikely,
            ATT_ERROR_VALUE_NOT_ALLOWED => AttErrorCode::ValueNotAllowed,
            ATT_ERROR_CCC_IMPROPERLY_CONFIGURED => AttErrorCode::CccImproperlyConfigured,
            other => AttErrorCode::Other(other),
        }
    }
}

impl From<AttErrorCode> for u8 {
    fn from(code: AttErrorCode) -> Self {
        match code {
            AttErrorCode::InvalidHandle => ATT_ERROR_INVALID_HANDLE,
            AttErrorCode::ReadNotPermitted => ATT_ERROR_READ_NOT_PERMITTED,
            AttErrorCode::WriteNotPermitted => ATT_ERROR_WRITE_NOT_PERMITTED,
            AttErrorCode::InvalidPdu => ATT_ERROR_INVALID_PDU,
            AttErrorCode::RequestNotSupported => ATT_ERROR_REQUEST_NOT_SUPPORTED,
            AttErrorCode::InvalidOffset => ATT_ERROR_INVALID_OFFSET,
            AttErrorCode::AttributeNotFound => ATT_ERROR_ATTRIBUTE_NOT_FOUND,
            AttErrorCode::InvalidAttributeValueLength => ATT_ERROR_INVALID_ATTRIBUTE_VALUE_LENGTH,
            AttErrorCode::Unlikely => ATT_ERROR_UNLIKELY,
            AttErrorCode::ValueNotAllowed => ATT_ERROR_VALUE_NOT_ALLOWED,
            AttErrorCode::CccImproperlyConfigured => ATT_ERROR_CCC_IMPROPERLY_CONFIGURED,
            AttErrorCode::Other(code) => code,
        }
    }
}
