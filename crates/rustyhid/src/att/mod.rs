//! Attribute Protocol (ATT) definitions
//!
//! The HID service never speaks ATT directly; the GATT engine does. This module
//! only carries the opcodes, error codes and attribute type UUIDs that the
//! service needs to classify requests and build its attribute table.

pub mod constants;
pub mod error;

pub use self::constants::*;
pub use self::error::AttErrorCode;
