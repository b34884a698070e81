//! Common types for GATT service tables
//!
//! This module defines the UUID, property and access flag types shared by the
//! attribute table builder and the GATT engine seam.

use bitflags::bitflags;
use std::fmt;

/// UUID for GATT attributes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Uuid {
    /// 16-bit Bluetooth SIG assigned UUID
    Uuid16(u16),
    /// 128-bit UUID, little-endian byte order
    Uuid128([u8; 16]),
}

impl Uuid {
    /// UUID from its wire form: 2 or 16 little-endian bytes
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        match *bytes {
            [low, high] => Some(Uuid::Uuid16(u16::from_le_bytes([low, high]))),
            _ => bytes.try_into().ok().map(Uuid::Uuid128),
        }
    }

    /// Get the little-endian bytes of this UUID, as carried on the wire
    pub fn as_bytes(&self) -> Vec<u8> {
        match self {
            Uuid::Uuid16(uuid) => uuid.to_le_bytes().to_vec(),
            Uuid::Uuid128(uuid) => uuid.to_vec(),
        }
    }

    /// Get the 16-bit UUID value if this is a 16-bit UUID
    pub fn as_u16(&self) -> Option<u16> {
        match self {
            Uuid::Uuid16(uuid) => Some(*uuid),
            _ => None,
        }
    }
}

impl fmt::Display for Uuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Uuid::Uuid16(uuid) => write!(f, "{:04x}", uuid),
            Uuid::Uuid128(uuid) => {
                // Stored little-endian, printed in canonical big-endian form
                let mut bytes = *uuid;
                bytes.reverse();
                let digits = hex::encode(bytes);
                write!(
                    f,
                    "{}-{}-{}-{}-{}",
                    &digits[0..8],
                    &digits[8..12],
                    &digits[12..16],
                    &digits[16..20],
                    &digits[20..32]
                )
            }
        }
    }
}

bitflags! {
    /// Characteristic properties as defined in the Bluetooth specification
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CharacteristicProperties: u8 {
        const BROADCAST = 0x01;
        const READ = 0x02;
        const WRITE_WITHOUT_RESPONSE = 0x04;
        const WRITE = 0x08;
        const NOTIFY = 0x10;
        const INDICATE = 0x20;
        const AUTHENTICATED_SIGNED_WRITES = 0x40;
        const EXTENDED_PROPERTIES = 0x80;
    }
}

bitflags! {
    /// Access flags of a single entry in a service attribute table
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AttributeFlags: u8 {
        const READABLE = 0x01;
        const WRITABLE = 0x02;
        const READ_WRITE = Self::READABLE.bits() | Self::WRITABLE.bits();
    }
}

/// Transport a remote client is connected over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionType {
    LowEnergy,
    BrEdr,
}

/// Attribute handle range assigned to a registered service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct HandleRange {
    pub start: u16,
    pub end: u16,
}

impl HandleRange {
    pub fn new(start: u16, end: u16) -> Self {
        Self { start, end }
    }

    /// Number of handles in the range
    pub fn len(&self) -> usize {
        if self.end < self.start {
            0
        } else {
            (self.end - self.start) as usize + 1
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Display for HandleRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:04X}-0x{:04X}", self.start, self.end)
    }
}
