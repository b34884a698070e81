//! Classification of engine requests
//!
//! [`route`] turns one [`ServerEvent`] into a single [`Routed`] outcome. It
//! never sends anything itself; the server emits exactly one response per
//! outcome.

use super::engine::{GattEngine, ReadRequest, ServerEvent, WriteRequest};
use super::event::*;
use super::table::{AttributeEntry, CharacteristicKind, DescriptorData, ValueData};
use super::registry::ServiceInstance;
use super::types::{decode_client_configuration, ControlPointCommand, ProtocolMode, ReportTarget};
use crate::att::{AttErrorCode, ATT_WRITE_CMD};
use crate::gap::BdAddr;
use crate::gatt::ConnectionType;
use log::debug;

/// Outcome of routing one request
#[derive(Debug)]
pub enum Routed {
    /// Answer with a read response carrying these bytes
    Immediate(Vec<u8>),
    /// Hand to the application, which owes the response through the token
    Deferred(HidsEvent),
    /// Send a write response, then hand to the application
    Acknowledged(HidsEvent),
}

/// Classify a request against an instance's table.
///
/// An `Err` is the ATT error to send at the request's attribute offset.
pub fn route<E: GattEngine + ?Sized>(
    instance: &ServiceInstance,
    event: &ServerEvent,
    engine: &E,
) -> Result<Routed, AttErrorCode> {
    match event {
        ServerEvent::ReadRequest(request) => route_read(instance, request),
        ServerEvent::WriteRequest(request) => route_write(instance, request, engine),
    }
}

fn route_read(instance: &ServiceInstance, request: &ReadRequest) -> Result<Routed, AttErrorCode> {
    let offset = request.attribute_offset;
    let entry = instance
        .table()
        .entry(offset)
        .ok_or(AttErrorCode::InvalidHandle)?;
    let header = header(
        instance,
        request.connection_id,
        request.connection_type,
        request.remote_device,
    );
    match entry {
        AttributeEntry::CharacteristicValue {
            data: ValueData::Static(bytes),
            ..
        }
        | AttributeEntry::CharacteristicDescriptor {
            data: DescriptorData::Static(bytes),
            ..
        } => read_static(bytes, request.attribute_value_offset),

        AttributeEntry::CharacteristicValue {
            data: ValueData::Dynamic(kind),
            ..
        } => match kind {
            CharacteristicKind::ProtocolMode => {
                Ok(Routed::Deferred(HidsEvent::GetProtocolMode(GetProtocolModeRequest {
                    header,
                    transaction: transaction(instance, request.transaction_id, offset),
                })))
            }
            CharacteristicKind::ReportMap => {
                Ok(Routed::Deferred(HidsEvent::GetReportMap(GetReportMapRequest {
                    header,
                    report_map_offset: request.attribute_value_offset,
                    transaction: transaction(instance, request.transaction_id, offset),
                })))
            }
            CharacteristicKind::ControlPoint => Err(AttErrorCode::Unlikely),
            _ => {
                let target = value_target(instance, *kind, offset)?;
                Ok(Routed::Deferred(HidsEvent::GetReport(GetReportRequest {
                    header,
                    target,
                    report_offset: request.attribute_value_offset,
                    transaction: transaction(instance, request.transaction_id, offset),
                })))
            }
        },

        AttributeEntry::CharacteristicDescriptor {
            data: DescriptorData::ClientConfiguration,
            ..
        } => {
            let target = cccd_target(instance, offset)?;
            Ok(Routed::Deferred(HidsEvent::ReadClientConfiguration(
                ReadClientConfigurationRequest {
                    header,
                    target,
                    transaction: transaction(instance, request.transaction_id, offset),
                },
            )))
        }

        _ => Err(AttErrorCode::Unlikely),
    }
}

fn route_write<E: GattEngine + ?Sized>(
    instance: &ServiceInstance,
    request: &WriteRequest,
    engine: &E,
) -> Result<Routed, AttErrorCode> {
    let offset = request.attribute_offset;
    let entry = instance
        .table()
        .entry(offset)
        .ok_or(AttErrorCode::InvalidHandle)?;

    // Long, queued and empty writes are never accepted
    if request.value.is_empty() || request.attribute_value_offset != 0 || request.delay_write {
        return Err(AttErrorCode::RequestNotSupported);
    }

    let header = header(
        instance,
        request.connection_id,
        request.connection_type,
        request.remote_device,
    );

    match entry {
        AttributeEntry::CharacteristicValue {
            data: ValueData::Dynamic(kind),
            ..
        } => match kind {
            CharacteristicKind::ProtocolMode => {
                let protocol_mode = match request.value.as_slice() {
                    [value] => ProtocolMode::from_byte(*value),
                    _ => None,
                }
                .ok_or(AttErrorCode::InvalidAttributeValueLength)?;
                require_write_command(engine, instance.stack_id(), request.transaction_id)?;
                Ok(Routed::Acknowledged(HidsEvent::SetProtocolMode(SetProtocolModeRequest {
                    header,
                    transaction_id: request.transaction_id,
                    protocol_mode,
                })))
            }
            CharacteristicKind::ControlPoint => {
                require_write_command(engine, instance.stack_id(), request.transaction_id)?;
                let command = match request.value.as_slice() {
                    [value] => ControlPointCommand::from_byte(*value),
                    _ => None,
                }
                .ok_or(AttErrorCode::RequestNotSupported)?;
                Ok(Routed::Acknowledged(HidsEvent::ControlPointCommand(
                    ControlPointCommandIndication { header, command },
                )))
            }
            CharacteristicKind::ReportMap => Err(AttErrorCode::Unlikely),
            _ => {
                let target = value_target(instance, *kind, offset)?;
                Ok(Routed::Deferred(HidsEvent::SetReport(SetReportRequest {
                    header,
                    target,
                    report: request.value.clone(),
                    transaction: transaction(instance, request.transaction_id, offset),
                })))
            }
        },

        AttributeEntry::CharacteristicDescriptor {
            data: DescriptorData::ClientConfiguration,
            ..
        } => {
            let target = cccd_target(instance, offset)?;
            let client_configuration = decode_client_configuration(&request.value)
                .map_err(|_| AttErrorCode::InvalidAttributeValueLength)?;
            Ok(Routed::Acknowledged(HidsEvent::ClientConfigurationUpdate(
                ClientConfigurationUpdate {
                    header,
                    transaction_id: request.transaction_id,
                    target,
                    client_configuration,
                },
            )))
        }

        _ => Err(AttErrorCode::Unlikely),
    }
}

fn read_static(bytes: &[u8], value_offset: u16) -> Result<Routed, AttErrorCode> {
    bytes
        .get(value_offset as usize..)
        .map(|tail| Routed::Immediate(tail.to_vec()))
        .ok_or(AttErrorCode::InvalidOffset)
}

fn value_target(
    instance: &ServiceInstance,
    kind: CharacteristicKind,
    offset: u16,
) -> Result<ReportTarget, AttErrorCode> {
    match kind {
        CharacteristicKind::Report => instance
            .table()
            .index()
            .reference_at(offset)
            .map(ReportTarget::Report)
            .ok_or_else(|| {
                debug!(
                    "No Report Reference for report value {} on HID instance {}",
                    offset,
                    instance.instance_id()
                );
                AttErrorCode::Unlikely
            }),
        CharacteristicKind::BootKeyboardInput => Ok(ReportTarget::BootKeyboardInput),
        CharacteristicKind::BootKeyboardOutput => Ok(ReportTarget::BootKeyboardOutput),
        CharacteristicKind::BootMouseInput => Ok(ReportTarget::BootMouseInput),
        _ => Err(AttErrorCode::Unlikely),
    }
}

fn cccd_target(instance: &ServiceInstance, offset: u16) -> Result<ReportTarget, AttErrorCode> {
    instance
        .table()
        .index()
        .client_configuration_owner(offset)
        .ok_or(AttErrorCode::Unlikely)
}

fn require_write_command<E: GattEngine + ?Sized>(
    engine: &E,
    stack_id: u32,
    transaction_id: u32,
) -> Result<(), AttErrorCode> {
    match engine.query_transaction_opcode(stack_id, transaction_id) {
        Ok(ATT_WRITE_CMD) => Ok(()),
        Ok(opcode) => {
            debug!(
                "Rejecting opcode 0x{:02X} on a write-without-response characteristic",
                opcode
            );
            Err(AttErrorCode::RequestNotSupported)
        }
        Err(e) => {
            debug!("Failed to query opcode of transaction {}: {}", transaction_id, e);
            Err(AttErrorCode::Unlikely)
        }
    }
}

fn transaction<K>(instance: &ServiceInstance, transaction_id: u32, offset: u16) -> Transaction<K> {
    Transaction::new(instance.stack_id(), instance.instance_id(), transaction_id, offset)
}

fn header(
    instance: &ServiceInstance,
    connection_id: u32,
    connection_type: ConnectionType,
    remote_device: BdAddr,
) -> EventHeader {
    EventHeader {
        instance_id: instance.instance_id(),
        connection_id,
        connection_type,
        remote_device,
    }
}
