//! ATT error codes carried in Error Responses

use super::constants::*;
use std::fmt;

/// Error code of an ATT Error Response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttErrorCode {
    InvalidHandle,
    ReadNotPermitted,
    WriteNotPermitted,
    InvalidPdu,
    InsufficientAuthentication,
    RequestNotSupported,
    InvalidOffset,
    InsufficientAuthorization,
    PrepareQueueFull,
    AttributeNotFound,
    AttributeNotLong,
    InsufficientEncryptionKeySize,
    InvalidAttributeValueLength,
    Unlikely,
    InsufficientEncryption,
    UnsupportedGroupType,
    InsufficientResources,
    DatabaseOutOfSync,
    ValueNotAllowed,
    /// Defined by the application, 0x80 to 0x9F
    ApplicationError(u8),
    /// Common profile and service error, 0xE0 to 0xFF
    CommonProfileError(u8),
    /// Reserved code
    Unknown(u8),
}

const NAMED_CODES: [(u8, AttErrorCode); 19] = [
    (0x01, AttErrorCode::InvalidHandle),
    (0x02, AttErrorCode::ReadNotPermitted),
    (0x03, AttErrorCode::WriteNotPermitted),
    (0x04, AttErrorCode::InvalidPdu),
    (0x05, AttErrorCode::InsufficientAuthentication),
    (0x06, AttErrorCode::RequestNotSupported),
    (0x07, AttErrorCode::InvalidOffset),
    (0x08, AttErrorCode::InsufficientAuthorization),
    (0x09, AttErrorCode::PrepareQueueFull),
    (0x0A, AttErrorCode::AttributeNotFound),
    (0x0B, AttErrorCode::AttributeNotLong),
    (0x0C, AttErrorCode::InsufficientEncryptionKeySize),
    (0x0D, AttErrorCode::InvalidAttributeValueLength),
    (0x0E, AttErrorCode::Unlikely),
    (0x0F, AttErrorCode::InsufficientEncryption),
    (0x10, AttErrorCode::UnsupportedGroupType),
    (0x11, AttErrorCode::InsufficientResources),
    (0x12, AttErrorCode::DatabaseOutOfSync),
    (0x13, AttErrorCode::ValueNotAllowed),
];

impl AttErrorCode {
    /// Wire value
    pub fn code(self) -> u8 {
        match self {
            AttErrorCode::ApplicationError(code)
            | AttErrorCode::CommonProfileError(code)
            | AttErrorCode::Unknown(code) => code,
            named => NAMED_CODES
                .iter()
                .find(|(_, candidate)| *candidate == named)
                .map(|(code, _)| *code)
                .unwrap_or(ATT_ERROR_UNLIKELY),
        }
    }
}

impl From<u8> for AttErrorCode {
    fn from(code: u8) -> Self {
        if let Some((_, named)) = NAMED_CODES.iter().find(|(value, _)| *value == code) {
            return *named;
        }
        match code {
            ATT_ERROR_APPLICATION_ERROR_START..=ATT_ERROR_APPLICATION_ERROR_END => {
                AttErrorCode::ApplicationError(code)
            }
            ATT_ERROR_COMMON_PROFILE_ERROR_START..=ATT_ERROR_COMMON_PROFILE_ERROR_END => {
                AttErrorCode::CommonProfileError(code)
            }
            _ => AttErrorCode::Unknown(code),
        }
    }
}

impl From<AttErrorCode> for u8 {
    fn from(error: AttErrorCode) -> Self {
        error.code()
    }
}

impl fmt::Display for AttErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} (0x{:02X})", self, self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_wire_values() {
        assert_eq!(u8::from(AttErrorCode::RequestNotSupported), 0x06);
        assert_eq!(u8::from(AttErrorCode::InvalidAttributeValueLength), 0x0D);
        assert_eq!(AttErrorCode::Unlikely.code(), ATT_ERROR_UNLIKELY);

        // Ranges keep the raw code
        assert_eq!(AttErrorCode::from(0x85), AttErrorCode::ApplicationError(0x85));
        assert_eq!(AttErrorCode::from(0xFD), AttErrorCode::CommonProfileError(0xFD));
        assert_eq!(AttErrorCode::from(0x42), AttErrorCode::Unknown(0x42));
    }

    #[test]
    fn test_error_code_from_wire() {
        for code in 0x01..=0x13u8 {
            let error = AttErrorCode::from(code);
            assert!(!matches!(error, AttErrorCode::Unknown(_)));
            assert_eq!(error.code(), code);
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(AttErrorCode::InvalidOffset.to_string(), "InvalidOffset (0x07)");
    }
}
