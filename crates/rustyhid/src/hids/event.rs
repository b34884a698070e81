//! Events delivered to the HID application
//!
//! Requests the application must answer carry a [`Transaction`] token. Each
//! token is tagged with the kind of request it came from and is consumed by
//! the single responder on [`HidsServer`](super::HidsServer) that accepts
//! that kind, so answering twice or with the wrong responder does not
//! compile. There is no timeout at this layer; an unanswered request is left
//! to the ATT transaction timeout of the transport.

use super::types::{ControlPointCommand, ProtocolMode, ReportTarget};
use crate::error::{HidsError, HidsResult};
use crate::gap::BdAddr;
use crate::gatt::ConnectionType;
use log::warn;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Marker types naming the request a [`Transaction`] answers
pub mod kind {
    #[derive(Debug)]
    pub struct ReadClientConfiguration;
    #[derive(Debug)]
    pub struct GetProtocolMode;
    #[derive(Debug)]
    pub struct GetReportMap;
    #[derive(Debug)]
    pub struct GetReport;
    #[derive(Debug)]
    pub struct SetReport;
}

/// A pending ATT transaction owed exactly one response
#[derive(Debug)]
#[must_use = "a pending transaction must be answered with its responder"]
pub struct Transaction<K> {
    stack_id: u32,
    instance_id: u32,
    transaction_id: u32,
    attribute_offset: u16,
    armed: bool,
    settled: Arc<AtomicBool>,
    _kind: PhantomData<K>,
}

/// Identifiers of a transaction whose token has been consumed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct PendingResponse {
    pub stack_id: u32,
    pub instance_id: u32,
    pub transaction_id: u32,
    pub attribute_offset: u16,
}

/// Server-side handle on a token handed to the application.
///
/// Whoever settles first owns the response: the token through its responder,
/// or the server reclaiming it after the callback panicked.
#[derive(Debug, Clone)]
pub(crate) struct Settlement {
    pending: PendingResponse,
    settled: Arc<AtomicBool>,
}

impl Settlement {
    /// Take over the response if the token was never answered
    pub fn reclaim(&self) -> Option<PendingResponse> {
        if self.settled.swap(true, Ordering::AcqRel) {
            None
        } else {
            Some(self.pending)
        }
    }
}

impl<K> Transaction<K> {
    pub(crate) fn new(stack_id: u32, instance_id: u32, transaction_id: u32, attribute_offset: u16) -> Self {
        Self {
            stack_id,
            instance_id,
            transaction_id,
            attribute_offset,
            armed: true,
            settled: Arc::new(AtomicBool::new(false)),
            _kind: PhantomData,
        }
    }

    pub fn stack_id(&self) -> u32 {
        self.stack_id
    }

    pub fn instance_id(&self) -> u32 {
        self.instance_id
    }

    pub fn transaction_id(&self) -> u32 {
        self.transaction_id
    }

    /// Offset of the attribute the request targeted
    pub fn attribute_offset(&self) -> u16 {
        self.attribute_offset
    }

    fn pending(&self) -> PendingResponse {
        PendingResponse {
            stack_id: self.stack_id,
            instance_id: self.instance_id,
            transaction_id: self.transaction_id,
            attribute_offset: self.attribute_offset,
        }
    }

    pub(crate) fn settlement(&self) -> Settlement {
        Settlement {
            pending: self.pending(),
            settled: Arc::clone(&self.settled),
        }
    }

    /// Consume the token. Fails if the server already answered it.
    pub(crate) fn finish(mut self) -> HidsResult<PendingResponse> {
        self.armed = false;
        if self.settled.swap(true, Ordering::AcqRel) {
            return Err(HidsError::InvalidParameter(format!(
                "transaction {} was already answered",
                self.transaction_id
            )));
        }
        Ok(self.pending())
    }
}

impl<K> Drop for Transaction<K> {
    fn drop(&mut self) {
        if self.armed {
            warn!(
                "Transaction {} on HID instance {} dropped without a response (attribute {})",
                self.transaction_id, self.instance_id, self.attribute_offset
            );
        }
    }
}

/// Fields common to every HID event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventHeader {
    pub instance_id: u32,
    pub connection_id: u32,
    pub connection_type: ConnectionType,
    pub remote_device: BdAddr,
}

/// A client read a CCCD; answer with
/// [`read_client_configuration_response`](super::HidsServer::read_client_configuration_response)
#[derive(Debug)]
pub struct ReadClientConfigurationRequest {
    pub header: EventHeader,
    pub target: ReportTarget,
    pub transaction: Transaction<kind::ReadClientConfiguration>,
}

/// A client wrote a CCCD. Already acknowledged.
#[derive(Debug)]
pub struct ClientConfigurationUpdate {
    pub header: EventHeader,
    pub transaction_id: u32,
    pub target: ReportTarget,
    pub client_configuration: u16,
}

#[derive(Debug)]
pub struct GetProtocolModeRequest {
    pub header: EventHeader,
    pub transaction: Transaction<kind::GetProtocolMode>,
}

/// A client switched protocol mode. Already acknowledged.
#[derive(Debug)]
pub struct SetProtocolModeRequest {
    pub header: EventHeader,
    pub transaction_id: u32,
    pub protocol_mode: ProtocolMode,
}

#[derive(Debug)]
pub struct GetReportMapRequest {
    pub header: EventHeader,
    /// Offset into the report map the client is reading from
    pub report_map_offset: u16,
    pub transaction: Transaction<kind::GetReportMap>,
}

#[derive(Debug)]
pub struct GetReportRequest {
    pub header: EventHeader,
    pub target: ReportTarget,
    /// Offset into the report value the client is reading from
    pub report_offset: u16,
    pub transaction: Transaction<kind::GetReport>,
}

#[derive(Debug)]
pub struct SetReportRequest {
    pub header: EventHeader,
    pub target: ReportTarget,
    pub report: Vec<u8>,
    pub transaction: Transaction<kind::SetReport>,
}

/// A Control Point write. Write without response, so nothing to answer.
#[derive(Debug)]
pub struct ControlPointCommandIndication {
    pub header: EventHeader,
    pub command: ControlPointCommand,
}

/// Event delivered to the application callback
#[derive(Debug)]
pub enum HidsEvent {
    ReadClientConfiguration(ReadClientConfigurationRequest),
    ClientConfigurationUpdate(ClientConfigurationUpdate),
    GetProtocolMode(GetProtocolModeRequest),
    SetProtocolMode(SetProtocolModeRequest),
    GetReportMap(GetReportMapRequest),
    GetReport(GetReportRequest),
    SetReport(SetReportRequest),
    ControlPointCommand(ControlPointCommandIndication),
}

impl HidsEvent {
    pub fn header(&self) -> &EventHeader {
        match self {
            HidsEvent::ReadClientConfiguration(event) => &event.header,
            HidsEvent::ClientConfigurationUpdate(event) => &event.header,
            HidsEvent::GetProtocolMode(event) => &event.header,
            HidsEvent::SetProtocolMode(event) => &event.header,
            HidsEvent::GetReportMap(event) => &event.header,
            HidsEvent::GetReport(event) => &event.header,
            HidsEvent::SetReport(event) => &event.header,
            HidsEvent::ControlPointCommand(event) => &event.header,
        }
    }

    /// Transaction ID, absent only for Control Point commands
    pub fn transaction_id(&self) -> Option<u32> {
        match self {
            HidsEvent::ReadClientConfiguration(event) => Some(event.transaction.transaction_id()),
            HidsEvent::ClientConfigurationUpdate(event) => Some(event.transaction_id),
            HidsEvent::GetProtocolMode(event) => Some(event.transaction.transaction_id()),
            HidsEvent::SetProtocolMode(event) => Some(event.transaction_id),
            HidsEvent::GetReportMap(event) => Some(event.transaction.transaction_id()),
            HidsEvent::GetReport(event) => Some(event.transaction.transaction_id()),
            HidsEvent::SetReport(event) => Some(event.transaction.transaction_id()),
            HidsEvent::ControlPointCommand(_) => None,
        }
    }

    pub(crate) fn settlement(&self) -> Option<Settlement> {
        match self {
            HidsEvent::ReadClientConfiguration(event) => Some(event.transaction.settlement()),
            HidsEvent::GetProtocolMode(event) => Some(event.transaction.settlement()),
            HidsEvent::GetReportMap(event) => Some(event.transaction.settlement()),
            HidsEvent::GetReport(event) => Some(event.transaction.settlement()),
            HidsEvent::SetReport(event) => Some(event.transaction.settlement()),
            HidsEvent::ClientConfigurationUpdate(_)
            | HidsEvent::SetProtocolMode(_)
            | HidsEvent::ControlPointCommand(_) => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            HidsEvent::ReadClientConfiguration(_) => "ReadClientConfiguration",
            HidsEvent::ClientConfigurationUpdate(_) => "ClientConfigurationUpdate",
            HidsEvent::GetProtocolMode(_) => "GetProtocolMode",
            HidsEvent::SetProtocolMode(_) => "SetProtocolMode",
            HidsEvent::GetReportMap(_) => "GetReportMap",
            HidsEvent::GetReport(_) => "GetReport",
            HidsEvent::SetReport(_) => "SetReport",
            HidsEvent::ControlPointCommand(_) => "ControlPointCommand",
        }
    }
}
