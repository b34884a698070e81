//! RustyHID - HID-over-GATT service engine
//!
//! This library implements the HID Service of the HID over GATT Profile on
//! top of an abstract GATT server engine. It lays out the HID attribute
//! table, answers the static parts of it, and turns every other client
//! request into an event the HID application answers through a single-use
//! token. It also provides the ATT, GATT and GAP types the service is
//! described with, and codec helpers for the client side of the profile.

pub mod att;
pub mod error;
pub mod gap;
pub mod gatt;
pub mod hids;

// Re-export common types for convenience
pub use att::AttErrorCode;
pub use error::{HidsError, HidsResult};
pub use gap::BdAddr;
pub use gatt::{ConnectionType, HandleRange, Uuid};
pub use hids::{
    EngineError, GattEngine, HidsEvent, HidsServer, HidsServerConfig, ReportConfig,
    ReportReference, ReportTarget, ServerEvent, ServiceConfig, ServiceFlags, ServiceRegistration,
};
