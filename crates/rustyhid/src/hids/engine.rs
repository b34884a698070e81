//! GATT engine interface
//!
//! The HID service does not own a transport. It registers its attribute
//! table with a [`GattEngine`], receives [`ServerEvent`]s through the
//! callback it registered, and answers through the engine's response
//! primitives. All primitives are keyed by the Bluetooth stack ID so one
//! engine can serve several controllers.

use super::table::AttributeEntry;
use crate::att::AttErrorCode;
use crate::gap::BdAddr;
use crate::gatt::{ConnectionType, HandleRange};
use std::sync::Arc;
use thiserror::Error;

/// Errors reported by a GATT engine
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Service already registered")]
    AlreadyRegistered,

    #[error("Insufficient resources")]
    InsufficientResources,

    #[error("Connection {0} not found")]
    NotConnected(u32),

    #[error("Unknown transaction: {0}")]
    UnknownTransaction(u32),

    #[error("Transport error: {0}")]
    Transport(String),
}

/// GATT engine result type
pub type EngineResult<T> = Result<T, EngineError>;

/// A remote client read of a registered attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadRequest {
    pub connection_id: u32,
    pub transaction_id: u32,
    pub connection_type: ConnectionType,
    pub remote_device: BdAddr,
    pub service_id: u32,
    /// Index of the attribute in the registered table
    pub attribute_offset: u16,
    /// Offset into the attribute value, non-zero for blob reads
    pub attribute_value_offset: u16,
}

/// A remote client write of a registered attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteRequest {
    pub connection_id: u32,
    pub transaction_id: u32,
    pub connection_type: ConnectionType,
    pub remote_device: BdAddr,
    pub service_id: u32,
    pub attribute_offset: u16,
    pub attribute_value_offset: u16,
    pub value: Vec<u8>,
    /// Set for prepared (queued) writes
    pub delay_write: bool,
}

/// Events dispatched by the engine to a registered service
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerEvent {
    ReadRequest(ReadRequest),
    WriteRequest(WriteRequest),
}

impl ServerEvent {
    pub fn attribute_offset(&self) -> u16 {
        match self {
            ServerEvent::ReadRequest(request) => request.attribute_offset,
            ServerEvent::WriteRequest(request) => request.attribute_offset,
        }
    }

    pub fn transaction_id(&self) -> u32 {
        match self {
            ServerEvent::ReadRequest(request) => request.transaction_id,
            ServerEvent::WriteRequest(request) => request.transaction_id,
        }
    }

    pub fn connection_id(&self) -> u32 {
        match self {
            ServerEvent::ReadRequest(request) => request.connection_id,
            ServerEvent::WriteRequest(request) => request.connection_id,
        }
    }
}

/// Callback the engine invokes for every request on a registered service
pub type ServerEventCallback = Arc<dyn Fn(ServerEvent) + Send + Sync>;

/// Result of registering a service table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineRegistration {
    pub service_id: u32,
    pub handle_range: HandleRange,
}

/// The ATT/GATT server engine a HID service is registered with.
///
/// Implementations may invoke the registered callback from any thread, and
/// the HID service may call back into the engine from inside that callback.
pub trait GattEngine: Send + Sync {
    /// Register a service table. When `handle_range` is given the engine
    /// must place the service there or fail.
    fn register_service(
        &self,
        stack_id: u32,
        table: &[AttributeEntry],
        handle_range: Option<HandleRange>,
        callback: ServerEventCallback,
    ) -> EngineResult<EngineRegistration>;

    fn unregister_service(&self, stack_id: u32, service_id: u32) -> EngineResult<()>;

    /// Answer a pending read request
    fn read_response(&self, stack_id: u32, transaction_id: u32, value: &[u8]) -> EngineResult<()>;

    /// Answer a pending write request
    fn write_response(&self, stack_id: u32, transaction_id: u32) -> EngineResult<()>;

    /// Fail a pending request with an ATT Error Response
    fn error_response(
        &self,
        stack_id: u32,
        transaction_id: u32,
        attribute_offset: u16,
        error: AttErrorCode,
    ) -> EngineResult<()>;

    /// Send a Handle Value Notification, returning the number of value bytes sent
    fn handle_value_notification(
        &self,
        stack_id: u32,
        service_id: u32,
        connection_id: u32,
        attribute_offset: u16,
        value: &[u8],
    ) -> EngineResult<usize>;

    /// ATT opcode of the PDU that started a pending transaction
    fn query_transaction_opcode(&self, stack_id: u32, transaction_id: u32) -> EngineResult<u8>;
}
