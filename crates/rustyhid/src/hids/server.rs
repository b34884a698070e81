//! HID Service server
//!
//! This module ties the table builder, the registry and the router to a
//! [`GattEngine`]. It is the only place that talks to the engine and the
//! application.

use super::engine::{GattEngine, ServerEvent, ServerEventCallback};
use super::event::{kind, HidsEvent, PendingResponse, Transaction};
use super::registry::{EventCallback, ServiceInstance, ServiceRegistry};
use super::router::{self, Routed};
use super::table::{query_attribute_count, AttributeTableBuilder};
use super::types::{ProtocolMode, ReportTarget, ServiceConfig};
use crate::att::{AttErrorCode, CLIENT_CHAR_CONFIG_LEN};
use crate::error::{HidsError, HidsResult};
use crate::gatt::HandleRange;
use byteorder::{ByteOrder, LittleEndian};
use log::{debug, error, trace, warn};
use parking_lot::RwLock;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Weak};

/// HID Service server configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HidsServerConfig {
    /// Largest attribute table a single instance may register
    pub max_attribute_entries: usize,
    /// Maximum number of instances across all stacks
    pub max_instances: usize,
}

impl Default for HidsServerConfig {
    fn default() -> Self {
        Self {
            max_attribute_entries: u16::MAX as usize,
            max_instances: 64,
        }
    }
}

/// Identifiers of a newly registered service instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceRegistration {
    pub instance_id: u32,
    /// Service ID assigned by the GATT engine
    pub service_id: u32,
    pub handle_range: HandleRange,
}

struct ServerInner<E> {
    engine: E,
    registry: ServiceRegistry,
    config: RwLock<HidsServerConfig>,
}

/// HID-over-GATT service server.
///
/// Cloning is cheap and every clone drives the same registry. The engine
/// only holds a weak reference back to the server, but an application
/// callback that captures a clone keeps the server alive until its instance
/// is cleaned up or its stack is closed.
pub struct HidsServer<E: GattEngine + 'static> {
    inner: Arc<ServerInner<E>>,
}

impl<E: GattEngine + 'static> Clone for HidsServer<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E: GattEngine + 'static> HidsServer<E> {
    /// Create a new HID server on top of a GATT engine
    pub fn new(engine: E) -> Self {
        Self::with_config(engine, HidsServerConfig::default())
    }

    pub fn with_config(engine: E, config: HidsServerConfig) -> Self {
        Self {
            inner: Arc::new(ServerInner {
                engine,
                registry: ServiceRegistry::new(),
                config: RwLock::new(config),
            }),
        }
    }

    pub fn engine(&self) -> &E {
        &self.inner.engine
    }

    /// Set server configuration. Applies to later registrations only.
    pub fn set_config(&self, config: HidsServerConfig) {
        *self.inner.config.write() = config;
    }

    pub fn config(&self) -> HidsServerConfig {
        *self.inner.config.read()
    }

    /// Make a Bluetooth stack available for registrations
    pub fn open_stack(&self, stack_id: u32) -> HidsResult<()> {
        self.inner.registry.open_stack(stack_id)
    }

    /// Close a stack, unregistering every instance on it.
    ///
    /// Returns the number of instances torn down.
    pub fn close_stack(&self, stack_id: u32) -> HidsResult<usize> {
        let instances = self.inner.registry.close_stack(stack_id)?;
        for instance in &instances {
            self.unregister(instance);
        }
        Ok(instances.len())
    }

    /// Number of attributes a service with this configuration occupies
    pub fn query_number_attributes(&self, config: &ServiceConfig) -> HidsResult<usize> {
        query_attribute_count(
            config.flags,
            config.included_services.len(),
            config.external_report_references.len(),
            &config.reports,
        )
    }

    /// Register a HID service, letting the engine choose the handle range
    pub fn initialize_service(
        &self,
        stack_id: u32,
        config: &ServiceConfig,
        callback: EventCallback,
    ) -> HidsResult<ServiceRegistration> {
        self.register(stack_id, config, None, callback)
    }

    /// Register a HID service at a specific handle range
    pub fn initialize_service_handle_range(
        &self,
        stack_id: u32,
        config: &ServiceConfig,
        handle_range: HandleRange,
        callback: EventCallback,
    ) -> HidsResult<ServiceRegistration> {
        if handle_range.is_empty() {
            return Err(HidsError::InvalidParameter(format!(
                "empty handle range {}",
                handle_range
            )));
        }
        self.register(stack_id, config, Some(handle_range), callback)
    }

    fn register(
        &self,
        stack_id: u32,
        config: &ServiceConfig,
        handle_range: Option<HandleRange>,
        callback: EventCallback,
    ) -> HidsResult<ServiceRegistration> {
        if stack_id == 0 {
            return Err(HidsError::InvalidParameter("stack ID 0".to_string()));
        }

        let stack = self.inner.registry.acquire_stack(stack_id)?;
        let limits = self.config();

        let table = AttributeTableBuilder::new(config)
            .max_entries(limits.max_attribute_entries)
            .build()?;
        let instance_id = stack.list().create(limits.max_instances)?;

        let weak: Weak<ServerInner<E>> = Arc::downgrade(&self.inner);
        let engine_callback: ServerEventCallback = Arc::new(move |event| {
            if let Some(inner) = weak.upgrade() {
                HidsServer { inner }.handle_server_event(stack_id, instance_id, event);
            }
        });

        // The list lock is not held across the engine call
        let registration = match self.inner.engine.register_service(
            stack_id,
            table.entries(),
            handle_range,
            engine_callback,
        ) {
            Ok(registration) => registration,
            Err(e) => {
                stack.list().delete(instance_id);
                warn!("Failed to register HID service on stack {}: {}", stack_id, e);
                return Err(e.into());
            }
        };

        debug!(
            "Registered HID instance {} on stack {}: service {} at {} ({} attributes)",
            instance_id,
            stack_id,
            registration.service_id,
            registration.handle_range,
            table.len()
        );

        stack.list().install(ServiceInstance::new(
            instance_id,
            stack_id,
            registration.service_id,
            registration.handle_range,
            config.flags,
            table,
            callback,
        ));

        Ok(ServiceRegistration {
            instance_id,
            service_id: registration.service_id,
            handle_range: registration.handle_range,
        })
    }

    /// Unregister a HID service instance
    pub fn cleanup_service(&self, stack_id: u32, instance_id: u32) -> HidsResult<()> {
        let stack = self.inner.registry.acquire_stack(stack_id)?;
        let instance = stack
            .list()
            .delete(instance_id)
            .ok_or(HidsError::InvalidInstanceId(instance_id))?;
        self.unregister(&instance);
        Ok(())
    }

    fn unregister(&self, instance: &ServiceInstance) {
        match self
            .inner
            .engine
            .unregister_service(instance.stack_id(), instance.service_id())
        {
            Ok(()) => debug!(
                "Unregistered HID instance {} (service {})",
                instance.instance_id(),
                instance.service_id()
            ),
            Err(e) => warn!(
                "Failed to unregister service {} of HID instance {}: {}",
                instance.service_id(),
                instance.instance_id(),
                e
            ),
        }
    }

    /// Process a request the engine delivered for one instance.
    ///
    /// Registered instances are wired to this automatically. Every request
    /// gets exactly one response here or a token handed to the application.
    pub fn handle_server_event(&self, stack_id: u32, instance_id: u32, event: ServerEvent) {
        let attribute_offset = event.attribute_offset();
        let transaction_id = event.transaction_id();

        let (_stack, instance) = match self.inner.registry.acquire_instance(stack_id, instance_id) {
            Ok(acquired) => acquired,
            Err(e) => {
                warn!(
                    "Dropping request {} for HID instance {} on stack {}: {}",
                    transaction_id, instance_id, stack_id, e
                );
                self.send_error(stack_id, transaction_id, attribute_offset, AttErrorCode::Unlikely);
                return;
            }
        };

        trace!(
            "HID instance {} request {} at attribute {}",
            instance_id,
            transaction_id,
            attribute_offset
        );

        match router::route(&instance, &event, &self.inner.engine) {
            Ok(Routed::Immediate(value)) => {
                trace!("Read response {}: {}", transaction_id, hex::encode(&value));
                if let Err(e) = self.inner.engine.read_response(stack_id, transaction_id, &value) {
                    error!("Failed to send read response {}: {}", transaction_id, e);
                }
            }
            Ok(Routed::Deferred(event)) => self.dispatch(&instance, event),
            Ok(Routed::Acknowledged(event)) => {
                if let Err(e) = self.inner.engine.write_response(stack_id, transaction_id) {
                    error!("Failed to send write response {}: {}", transaction_id, e);
                }
                self.dispatch(&instance, event);
            }
            Err(code) => {
                warn!(
                    "Rejecting request {} at attribute {}: {}",
                    transaction_id, attribute_offset, code
                );
                self.send_error(stack_id, transaction_id, attribute_offset, code);
            }
        }
    }

    // The stack lock is held by the caller for the whole callback
    fn dispatch(&self, instance: &ServiceInstance, event: HidsEvent) {
        let name = event.name();
        trace!("Dispatching {} to HID instance {}", name, instance.instance_id());

        let settlement = event.settlement();
        let callback = Arc::clone(instance.callback());
        if panic::catch_unwind(AssertUnwindSafe(|| callback(event))).is_err() {
            error!(
                "HID application callback panicked handling {} on instance {}",
                name,
                instance.instance_id()
            );
            // A token lost to the unwind is still owed its response
            if let Some(pending) = settlement.and_then(|s| s.reclaim()) {
                self.send_error(
                    pending.stack_id,
                    pending.transaction_id,
                    pending.attribute_offset,
                    AttErrorCode::Unlikely,
                );
            }
        }
    }

    fn send_error(&self, stack_id: u32, transaction_id: u32, attribute_offset: u16, code: AttErrorCode) {
        if let Err(e) = self
            .inner
            .engine
            .error_response(stack_id, transaction_id, attribute_offset, code)
        {
            error!("Failed to send error response {}: {}", transaction_id, e);
        }
    }

    /// Answer a CCCD read with the peer's stored configuration
    pub fn read_client_configuration_response(
        &self,
        transaction: Transaction<kind::ReadClientConfiguration>,
        client_configuration: u16,
    ) -> HidsResult<()> {
        let mut value = [0u8; CLIENT_CHAR_CONFIG_LEN];
        LittleEndian::write_u16(&mut value, client_configuration);
        self.respond_read(transaction.finish()?, Ok(&value[..]))
    }

    pub fn get_protocol_mode_response(
        &self,
        transaction: Transaction<kind::GetProtocolMode>,
        result: Result<ProtocolMode, AttErrorCode>,
    ) -> HidsResult<()> {
        let pending = transaction.finish()?;
        match result {
            Ok(mode) => {
                let value = [mode.to_byte()];
                self.respond_read(pending, Ok(&value[..]))
            }
            Err(code) => self.respond_read(pending, Err(code)),
        }
    }

    /// Answer a Report Map read with the map bytes from the requested offset on
    pub fn get_report_map_response(
        &self,
        transaction: Transaction<kind::GetReportMap>,
        result: Result<&[u8], AttErrorCode>,
    ) -> HidsResult<()> {
        self.respond_read(transaction.finish()?, result)
    }

    pub fn get_report_response(
        &self,
        transaction: Transaction<kind::GetReport>,
        result: Result<&[u8], AttErrorCode>,
    ) -> HidsResult<()> {
        self.respond_read(transaction.finish()?, result)
    }

    pub fn set_report_response(
        &self,
        transaction: Transaction<kind::SetReport>,
        result: Result<(), AttErrorCode>,
    ) -> HidsResult<()> {
        let pending = transaction.finish()?;
        let (_stack, _instance) = self
            .inner
            .registry
            .acquire_instance(pending.stack_id, pending.instance_id)?;

        match result {
            Ok(()) => self
                .inner
                .engine
                .write_response(pending.stack_id, pending.transaction_id)?,
            Err(code) => self.inner.engine.error_response(
                pending.stack_id,
                pending.transaction_id,
                pending.attribute_offset,
                code,
            )?,
        }
        Ok(())
    }

    fn respond_read(&self, pending: PendingResponse, result: Result<&[u8], AttErrorCode>) -> HidsResult<()> {
        let (_stack, _instance) = self
            .inner
            .registry
            .acquire_instance(pending.stack_id, pending.instance_id)?;

        match result {
            Ok(value) => {
                trace!("Read response {}: {}", pending.transaction_id, hex::encode(value));
                self.inner
                    .engine
                    .read_response(pending.stack_id, pending.transaction_id, value)?
            }
            Err(code) => self.inner.engine.error_response(
                pending.stack_id,
                pending.transaction_id,
                pending.attribute_offset,
                code,
            )?,
        }
        Ok(())
    }

    /// Notify an input report to one connection.
    ///
    /// Returns the number of bytes the engine transmitted.
    pub fn notify_input_report(
        &self,
        stack_id: u32,
        instance_id: u32,
        connection_id: u32,
        target: ReportTarget,
        report: &[u8],
    ) -> HidsResult<usize> {
        if connection_id == 0 {
            return Err(HidsError::InvalidParameter("connection ID 0".to_string()));
        }
        if report.is_empty() {
            return Err(HidsError::InvalidParameter("empty report".to_string()));
        }
        if !target.is_notifiable() {
            return Err(HidsError::InvalidParameter(format!(
                "{:?} is not an input report",
                target
            )));
        }

        let (_stack, instance) = self.inner.registry.acquire_instance(stack_id, instance_id)?;
        let offset = instance
            .table()
            .target_offset(&target)
            .ok_or_else(|| HidsError::InvalidParameter(format!("no such report {:?}", target)))?;

        let sent = self.inner.engine.handle_value_notification(
            stack_id,
            instance.service_id(),
            connection_id,
            offset,
            report,
        )?;
        trace!(
            "Notified {:?} on connection {}: {}",
            target,
            connection_id,
            hex::encode(report)
        );
        Ok(sent)
    }
}
