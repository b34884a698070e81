//! HID-over-GATT Service (HIDS)
//!
//! This module registers HID services with a [`GattEngine`], routes client
//! requests against each instance's attribute table and hands the requests
//! that need application data to an [`EventCallback`].

pub mod constants;
pub mod engine;
pub mod event;
pub mod index;
pub mod registry;
pub mod router;
pub mod server;
pub mod table;
pub mod types;


pub use self::engine::{
    EngineError, EngineRegistration, EngineResult, GattEngine, ReadRequest, ServerEvent,
    ServerEventCallback, WriteRequest,
};
pub use self::event::{
    kind, ClientConfigurationUpdate, ControlPointCommandIndication, EventHeader,
    GetProtocolModeRequest, GetReportMapRequest, GetReportRequest, HidsEvent,
    ReadClientConfigurationRequest, SetProtocolModeRequest, SetReportRequest, Transaction,
};
pub use self::registry::{EventCallback, ServiceInstance};
pub use self::server::{HidsServer, HidsServerConfig, ServiceRegistration};
pub use self::table::{query_attribute_count, AttributeEntry, AttributeTableBuilder, ServiceTable};
pub use self::types::{
    decode_client_configuration, decode_external_report_reference, ControlPointCommand,
    HidInfoFlags, HidInformation, ProtocolMode, ReportConfig, ReportReference, ReportTarget,
    ReportType, ServiceConfig, ServiceFlags,
};
