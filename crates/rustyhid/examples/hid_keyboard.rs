//! Example registering a HID keyboard
//!
//! This example runs a keyboard service against an in-process engine that
//! prints what it would put on the air, then plays the part of a host: it
//! reads the report map, enables notifications and receives a key press.
//!
//! Run with `RUST_LOG=debug` to see the service log.

use rustyhid::att::{AttErrorCode, ATT_WRITE_REQ, CLIENT_CHAR_CONFIG_NOTIFY};
use rustyhid::hids::{
    AttributeEntry, EngineError, EngineRegistration, EngineResult, GattEngine, HidInformation,
    HidsEvent, HidsServer, ReadRequest, ReportConfig, ReportReference, ReportTarget, ServerEvent,
    ServerEventCallback, ServiceConfig, ServiceFlags, WriteRequest,
};
use rustyhid::{BdAddr, ConnectionType, HandleRange};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

const STACK: u32 = 1;
const CONNECTION: u32 = 0x40;

// Boot-compatible keyboard: 8 modifier bits, a reserved byte and six keys
const REPORT_MAP: &[u8] = &[
    0x05, 0x01, 0x09, 0x06, 0xA1, 0x01, 0x85, 0x01, 0x05, 0x07, 0x19, 0xE0, 0x29, 0xE7, 0x15,
    0x00, 0x25, 0x01, 0x75, 0x01, 0x95, 0x08, 0x81, 0x02, 0x95, 0x01, 0x75, 0x08, 0x81, 0x01,
    0x95, 0x06, 0x75, 0x08, 0x15, 0x00, 0x25, 0x65, 0x05, 0x07, 0x19, 0x00, 0x29, 0x65, 0x81,
    0x00, 0xC0,
];

/// Engine that keeps everything in memory and prints the traffic
#[derive(Default)]
struct LoopbackEngine {
    services: Mutex<HashMap<u32, ServerEventCallback>>,
}

impl LoopbackEngine {
    fn deliver(&self, service_id: u32, event: ServerEvent) {
        let callback = self.services.lock().get(&service_id).cloned();
        if let Some(callback) = callback {
            callback(event);
        }
    }
}

impl GattEngine for LoopbackEngine {
    fn register_service(
        &self,
        stack_id: u32,
        table: &[AttributeEntry],
        handle_range: Option<HandleRange>,
        callback: ServerEventCallback,
    ) -> EngineResult<EngineRegistration> {
        let mut services = self.services.lock();
        let service_id = services.len() as u32 + 1;
        let handle_range =
            handle_range.unwrap_or_else(|| HandleRange::new(0x0010, 0x0010 + table.len() as u16 - 1));
        println!(
            "[engine] stack {}: service {} with {} attributes at {}",
            stack_id,
            service_id,
            table.len(),
            handle_range
        );
        for (offset, entry) in table.iter().enumerate() {
            println!("    {:2} {} {:?}", offset, entry.attribute_type(), entry.flags());
        }
        services.insert(service_id, callback);
        Ok(EngineRegistration {
            service_id,
            handle_range,
        })
    }

    fn unregister_service(&self, _stack_id: u32, service_id: u32) -> EngineResult<()> {
        self.services
            .lock()
            .remove(&service_id)
            .map(|_| ())
            .ok_or_else(|| EngineError::InvalidParameter(format!("service {}", service_id)))
    }

    fn read_response(&self, _stack_id: u32, transaction_id: u32, value: &[u8]) -> EngineResult<()> {
        println!("[engine] read response {}: {}", transaction_id, hex::encode(value));
        Ok(())
    }

    fn write_response(&self, _stack_id: u32, transaction_id: u32) -> EngineResult<()> {
        println!("[engine] write response {}", transaction_id);
        Ok(())
    }

    fn error_response(
        &self,
        _stack_id: u32,
        transaction_id: u32,
        attribute_offset: u16,
        error: AttErrorCode,
    ) -> EngineResult<()> {
        println!(
            "[engine] error response {} at attribute {}: {}",
            transaction_id, attribute_offset, error
        );
        Ok(())
    }

    fn handle_value_notification(
        &self,
        _stack_id: u32,
        service_id: u32,
        connection_id: u32,
        attribute_offset: u16,
        value: &[u8],
    ) -> EngineResult<usize> {
        println!(
            "[engine] notify service {} attribute {} on connection {}: {}",
            service_id,
            attribute_offset,
            connection_id,
            hex::encode(value)
        );
        Ok(value.len())
    }

    fn query_transaction_opcode(&self, _stack_id: u32, _transaction_id: u32) -> EngineResult<u8> {
        Ok(ATT_WRITE_REQ)
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let server = HidsServer::new(LoopbackEngine::default());
    server.open_stack(STACK)?;

    let config = ServiceConfig::new(ServiceFlags::SUPPORT_KEYBOARD, HidInformation::default())
        .with_report(ReportConfig::input(1))
        .with_report(ReportConfig::output(1));
    println!(
        "Keyboard service needs {} attributes",
        server.query_number_attributes(&config)?
    );

    // The application keeps the CCCD values and answers through the tokens
    let notifications_enabled = Arc::new(Mutex::new(false));
    let callback = {
        let server = server.clone();
        let notifications_enabled = Arc::clone(&notifications_enabled);
        Arc::new(move |event: HidsEvent| {
            println!("[app] {}", event.name());
            let result = match event {
                HidsEvent::GetReportMap(request) => {
                    let start = (request.report_map_offset as usize).min(REPORT_MAP.len());
                    server.get_report_map_response(request.transaction, Ok(&REPORT_MAP[start..]))
                }
                HidsEvent::ReadClientConfiguration(request) => {
                    let value = u16::from(*notifications_enabled.lock());
                    server.read_client_configuration_response(request.transaction, value)
                }
                HidsEvent::ClientConfigurationUpdate(update) => {
                    let enabled = update.client_configuration & CLIENT_CHAR_CONFIG_NOTIFY != 0;
                    *notifications_enabled.lock() = enabled;
                    Ok(())
                }
                HidsEvent::GetReport(request) => {
                    server.get_report_response(request.transaction, Ok(&[0u8; 8]))
                }
                HidsEvent::SetReport(request) => {
                    println!("[app] LEDs: {}", hex::encode(&request.report));
                    server.set_report_response(request.transaction, Ok(()))
                }
                HidsEvent::GetProtocolMode(request) => server.get_protocol_mode_response(
                    request.transaction,
                    Ok(rustyhid::hids::ProtocolMode::Report),
                ),
                _ => Ok(()),
            };
            if let Err(e) = result {
                eprintln!("[app] failed to answer: {}", e);
            }
        })
    };

    let registration = server.initialize_service(STACK, &config, callback)?;
    println!(
        "Registered keyboard as instance {} (service {})",
        registration.instance_id, registration.service_id
    );

    let host = BdAddr::new([0xA1, 0xB2, 0xC3, 0xD4, 0xE5, 0xF6]);
    let read = |transaction_id, attribute_offset| {
        ServerEvent::ReadRequest(ReadRequest {
            connection_id: CONNECTION,
            transaction_id,
            connection_type: ConnectionType::LowEnergy,
            remote_device: host,
            service_id: registration.service_id,
            attribute_offset,
            attribute_value_offset: 0,
        })
    };
    let write = |transaction_id, attribute_offset, value: &[u8]| {
        ServerEvent::WriteRequest(WriteRequest {
            connection_id: CONNECTION,
            transaction_id,
            connection_type: ConnectionType::LowEnergy,
            remote_device: host,
            service_id: registration.service_id,
            attribute_offset,
            attribute_value_offset: 0,
            value: value.to_vec(),
            delay_write: false,
        })
    };

    // Host discovery: HID Information, Report Map, enable input notifications
    let engine = server.engine();
    engine.deliver(registration.service_id, read(1, 2));
    engine.deliver(registration.service_id, read(2, 6));
    engine.deliver(registration.service_id, write(3, 10, &[0x01, 0x00]));
    engine.deliver(registration.service_id, read(4, 10));
    // Caps Lock LED on
    engine.deliver(registration.service_id, write(5, 12, &[0x02]));

    if *notifications_enabled.lock() {
        let input = ReportTarget::Report(ReportReference::input(1));
        // 'a' pressed, then released
        for report in [[0, 0, 0x04, 0, 0, 0, 0, 0], [0u8; 8]] {
            let sent =
                server.notify_input_report(STACK, registration.instance_id, CONNECTION, input, &report)?;
            println!("Sent {} byte input report", sent);
        }
    }

    // Tear down, which also releases the callback's clone of the server
    let closed = server.close_stack(STACK)?;
    println!("Closed stack with {} instance(s)", closed);

    Ok(())
}
