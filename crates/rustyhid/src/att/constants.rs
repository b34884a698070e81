//! ATT and GATT protocol constants used by the HID service

// Write opcodes a request can arrive with
pub const ATT_WRITE_REQ: u8 = 0x12;
pub const ATT_WRITE_CMD: u8 = 0x52;

/// Returned when a service invariant does not hold
pub const ATT_ERROR_UNLIKELY: u8 = 0x0E;

// Error code ranges outside the core table
pub const ATT_ERROR_APPLICATION_ERROR_START: u8 = 0x80;
pub const ATT_ERROR_APPLICATION_ERROR_END: u8 = 0x9F;
pub const ATT_ERROR_COMMON_PROFILE_ERROR_START: u8 = 0xE0;
pub const ATT_ERROR_COMMON_PROFILE_ERROR_END: u8 = 0xFF;

// GATT declaration and descriptor types
pub const PRIMARY_SERVICE_UUID: u16 = 0x2800;
pub const INCLUDE_UUID: u16 = 0x2802;
pub const CHARACTERISTIC_UUID: u16 = 0x2803;
pub const CLIENT_CHAR_CONFIG_UUID: u16 = 0x2902;

/// CCCD values are two bytes, little-endian
pub const CLIENT_CHAR_CONFIG_LEN: usize = 2;
/// CCCD bit enabling notifications
pub const CLIENT_CHAR_CONFIG_NOTIFY: u16 = 0x0001;
