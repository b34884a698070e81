//! GATT (Generic Attribute Profile) types
//!
//! This module provides the types used to describe a GATT service table
//! independently of the engine that serves it.

pub mod types;

#[cfg(test)]
mod tests;

pub use types::{AttributeFlags, CharacteristicProperties, ConnectionType, HandleRange, Uuid};
