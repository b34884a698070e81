//! HID Service attribute table layout
//!
//! The table is laid out in a fixed order that remote hosts rely on:
//!
//! 1. Primary Service declaration
//! 2. Include Definitions, in caller order
//! 3. HID Information
//! 4. HID Control Point
//! 5. Report Map, followed by its External Report Reference descriptors
//! 6. One Report characteristic per configured report, in caller order
//! 7. Protocol Mode and the boot reports, when boot protocol is supported
//!
//! Every offset the service hands out is an index into this table. The
//! ownership of descriptors is recovered from adjacency (see
//! [`index`](super::index)), so any extension must keep each descriptor
//! directly after the value it belongs to.

use super::constants::*;
use super::index::ReportIndex;
use super::types::{ReportConfig, ReportReference, ReportTarget, ReportType, ServiceConfig, ServiceFlags};
use crate::att::{CHARACTERISTIC_UUID, CLIENT_CHAR_CONFIG_UUID, INCLUDE_UUID, PRIMARY_SERVICE_UUID};
use crate::error::{HidsError, HidsResult};
use crate::gatt::{AttributeFlags, CharacteristicProperties, Uuid};
use log::trace;

/// Dynamic characteristic kinds whose value is supplied by the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CharacteristicKind {
    Report,
    BootKeyboardInput,
    BootKeyboardOutput,
    BootMouseInput,
    ProtocolMode,
    ReportMap,
    ControlPoint,
}

/// Backing data of a characteristic value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueData {
    /// Fixed bytes answered directly by the service
    Static(Vec<u8>),
    /// Value owned by the application, reached through an event
    Dynamic(CharacteristicKind),
}

/// Backing data of a characteristic descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DescriptorData {
    Static(Vec<u8>),
    /// Per-connection Client Characteristic Configuration, kept by the application
    ClientConfiguration,
}

/// One entry in a service attribute table
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeEntry {
    PrimaryService {
        uuid: Uuid,
    },
    IncludeDefinition {
        service_id: u32,
    },
    CharacteristicDeclaration {
        properties: CharacteristicProperties,
        uuid: Uuid,
    },
    CharacteristicValue {
        uuid: Uuid,
        flags: AttributeFlags,
        data: ValueData,
    },
    CharacteristicDescriptor {
        uuid: Uuid,
        flags: AttributeFlags,
        data: DescriptorData,
    },
}

impl AttributeEntry {
    /// Attribute type UUID as exposed to clients
    pub fn attribute_type(&self) -> Uuid {
        match self {
            AttributeEntry::PrimaryService { .. } => Uuid::Uuid16(PRIMARY_SERVICE_UUID),
            AttributeEntry::IncludeDefinition { .. } => Uuid::Uuid16(INCLUDE_UUID),
            AttributeEntry::CharacteristicDeclaration { .. } => Uuid::Uuid16(CHARACTERISTIC_UUID),
            AttributeEntry::CharacteristicValue { uuid, .. } => *uuid,
            AttributeEntry::CharacteristicDescriptor { uuid, .. } => *uuid,
        }
    }

    pub fn flags(&self) -> AttributeFlags {
        match self {
            AttributeEntry::CharacteristicValue { flags, .. } => *flags,
            AttributeEntry::CharacteristicDescriptor { flags, .. } => *flags,
            _ => AttributeFlags::READABLE,
        }
    }

    pub fn is_descriptor(&self) -> bool {
        matches!(self, AttributeEntry::CharacteristicDescriptor { .. })
    }

    /// Kind tag of a dynamic characteristic value
    pub fn dynamic_kind(&self) -> Option<CharacteristicKind> {
        match self {
            AttributeEntry::CharacteristicValue {
                data: ValueData::Dynamic(kind),
                ..
            } => Some(*kind),
            _ => None,
        }
    }

    pub fn is_client_configuration(&self) -> bool {
        matches!(
            self,
            AttributeEntry::CharacteristicDescriptor {
                data: DescriptorData::ClientConfiguration,
                ..
            }
        )
    }

    /// Static descriptor bytes if this descriptor has the given UUID
    pub fn static_descriptor(&self, descriptor_uuid: u16) -> Option<&[u8]> {
        match self {
            AttributeEntry::CharacteristicDescriptor {
                uuid,
                data: DescriptorData::Static(bytes),
                ..
            } if uuid.as_u16() == Some(descriptor_uuid) => Some(bytes),
            _ => None,
        }
    }
}

/// Layout of one configured report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportLayout {
    pub reference: ReportReference,
    pub input_writable: bool,
    pub value_offset: u16,
    pub descriptor_offset: u16,
    /// Present for Input reports only
    pub cccd_offset: Option<u16>,
}

/// Value offsets of the fixed characteristics, resolved once at build time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ServiceOffsets {
    pub hid_information: u16,
    pub control_point: u16,
    pub report_map: u16,
    pub protocol_mode: Option<u16>,
    pub boot_mouse_input: Option<u16>,
    pub boot_keyboard_input: Option<u16>,
    pub boot_keyboard_output: Option<u16>,
}

/// A fully built and indexed HID service table.
///
/// Everything an instance owns lives here and is dropped together.
#[derive(Debug, Clone)]
pub struct ServiceTable {
    entries: Vec<AttributeEntry>,
    offsets: ServiceOffsets,
    reports: Vec<ReportLayout>,
    included_services: Vec<u32>,
    external_report_references: Vec<Uuid>,
    index: ReportIndex,
}

impl ServiceTable {
    pub fn entries(&self) -> &[AttributeEntry] {
        &self.entries
    }

    pub fn entry(&self, offset: u16) -> Option<&AttributeEntry> {
        self.entries.get(offset as usize)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn offsets(&self) -> &ServiceOffsets {
        &self.offsets
    }

    pub fn reports(&self) -> &[ReportLayout] {
        &self.reports
    }

    pub fn included_services(&self) -> &[u32] {
        &self.included_services
    }

    pub fn external_report_references(&self) -> &[Uuid] {
        &self.external_report_references
    }

    pub fn index(&self) -> &ReportIndex {
        &self.index
    }

    /// Value offset of the characteristic a report target names
    pub fn target_offset(&self, target: &ReportTarget) -> Option<u16> {
        match target {
            ReportTarget::Report(reference) => self.index.offset_of(reference),
            ReportTarget::BootKeyboardInput => self.offsets.boot_keyboard_input,
            ReportTarget::BootKeyboardOutput => self.offsets.boot_keyboard_output,
            ReportTarget::BootMouseInput => self.offsets.boot_mouse_input,
        }
    }
}

/// Number of attributes a HID service with this shape occupies.
///
/// Fails with `InvalidParameter` if any report carries an unknown type.
pub fn query_attribute_count(
    flags: ServiceFlags,
    included_services: usize,
    external_report_references: usize,
    reports: &[ReportConfig],
) -> HidsResult<usize> {
    let mut count = MINIMUM_ATTRIBUTE_COUNT
        + included_services * INCLUDED_SERVICE_ATTRIBUTE_COUNT
        + external_report_references * EXTERNAL_REFERENCE_ATTRIBUTE_COUNT;

    for report in reports {
        count += match report.reference()?.report_type {
            ReportType::Input => INPUT_REPORT_ATTRIBUTE_COUNT,
            ReportType::Output => OUTPUT_REPORT_ATTRIBUTE_COUNT,
            ReportType::Feature => FEATURE_REPORT_ATTRIBUTE_COUNT,
        };
    }

    if flags.supports_boot_protocol() {
        count += PROTOCOL_MODE_ATTRIBUTE_COUNT;
    }
    if flags.contains(ServiceFlags::SUPPORT_MOUSE) {
        count += BOOT_MOUSE_ATTRIBUTE_COUNT;
    }
    if flags.contains(ServiceFlags::SUPPORT_KEYBOARD) {
        count += BOOT_KEYBOARD_ATTRIBUTE_COUNT;
    }

    Ok(count)
}

/// Builds the attribute table for one service instance
pub struct AttributeTableBuilder<'a> {
    config: &'a ServiceConfig,
    max_entries: usize,
    entries: Vec<AttributeEntry>,
}

impl<'a> AttributeTableBuilder<'a> {
    pub fn new(config: &'a ServiceConfig) -> Self {
        Self {
            config,
            max_entries: u16::MAX as usize,
            entries: Vec::new(),
        }
    }

    /// Largest table the attached engine can hold
    pub fn max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries.min(u16::MAX as usize);
        self
    }

    /// Lay out and index the table.
    ///
    /// Nothing is allocated for the instance unless every report type is
    /// valid and the table fits.
    pub fn build(mut self) -> HidsResult<ServiceTable> {
        let config = self.config;
        let count = query_attribute_count(
            config.flags,
            config.included_services.len(),
            config.external_report_references.len(),
            &config.reports,
        )?;

        if count > self.max_entries {
            return Err(HidsError::InsufficientResources);
        }
        self.entries
            .try_reserve_exact(count)
            .map_err(|_| HidsError::InsufficientResources)?;

        self.push(AttributeEntry::PrimaryService {
            uuid: Uuid::Uuid16(HID_SERVICE_UUID),
        });

        for service_id in &config.included_services {
            self.push(AttributeEntry::IncludeDefinition {
                service_id: *service_id,
            });
        }

        let hid_information = self.push_value(
            CharacteristicProperties::READ,
            HID_INFORMATION_UUID,
            AttributeFlags::READABLE,
            ValueData::Static(config.hid_information.encode().to_vec()),
        );

        let control_point = self.push_value(
            CharacteristicProperties::WRITE_WITHOUT_RESPONSE,
            HID_CONTROL_POINT_UUID,
            AttributeFlags::WRITABLE,
            ValueData::Dynamic(CharacteristicKind::ControlPoint),
        );

        let report_map = self.push_value(
            CharacteristicProperties::READ,
            HID_REPORT_MAP_UUID,
            AttributeFlags::READABLE,
            ValueData::Dynamic(CharacteristicKind::ReportMap),
        );

        for uuid in &config.external_report_references {
            self.push(AttributeEntry::CharacteristicDescriptor {
                uuid: Uuid::Uuid16(EXTERNAL_REPORT_REFERENCE_UUID),
                flags: AttributeFlags::READABLE,
                data: DescriptorData::Static(uuid.as_bytes()),
            });
        }

        let mut reports = Vec::with_capacity(config.reports.len());
        for report in &config.reports {
            reports.push(self.push_report(report)?);
        }

        let mut offsets = ServiceOffsets {
            hid_information,
            control_point,
            report_map,
            ..Default::default()
        };

        if config.flags.supports_boot_protocol() {
            offsets.protocol_mode = Some(self.push_value(
                CharacteristicProperties::READ | CharacteristicProperties::WRITE_WITHOUT_RESPONSE,
                HID_PROTOCOL_MODE_UUID,
                AttributeFlags::READ_WRITE,
                ValueData::Dynamic(CharacteristicKind::ProtocolMode),
            ));
        }

        if config.flags.contains(ServiceFlags::SUPPORT_MOUSE) {
            offsets.boot_mouse_input = Some(self.push_boot_input(
                HID_BOOT_MOUSE_INPUT_UUID,
                CharacteristicKind::BootMouseInput,
                config.flags.contains(ServiceFlags::BOOT_MOUSE_INPUT_WRITABLE),
            ));
        }

        if config.flags.contains(ServiceFlags::SUPPORT_KEYBOARD) {
            offsets.boot_keyboard_input = Some(self.push_boot_input(
                HID_BOOT_KEYBOARD_INPUT_UUID,
                CharacteristicKind::BootKeyboardInput,
                config.flags.contains(ServiceFlags::BOOT_KEYBOARD_INPUT_WRITABLE),
            ));
            offsets.boot_keyboard_output = Some(self.push_value(
                CharacteristicProperties::READ
                    | CharacteristicProperties::WRITE_WITHOUT_RESPONSE
                    | CharacteristicProperties::WRITE,
                HID_BOOT_KEYBOARD_OUTPUT_UUID,
                AttributeFlags::READ_WRITE,
                ValueData::Dynamic(CharacteristicKind::BootKeyboardOutput),
            ));
        }

        debug_assert_eq!(self.entries.len(), count);
        trace!(
            "Built HID service table: {} attributes, {} reports",
            self.entries.len(),
            reports.len()
        );

        let index = ReportIndex::build(&self.entries);
        Ok(ServiceTable {
            entries: self.entries,
            offsets,
            reports,
            included_services: config.included_services.clone(),
            external_report_references: config.external_report_references.clone(),
            index,
        })
    }

    fn push(&mut self, entry: AttributeEntry) -> u16 {
        let offset = self.entries.len() as u16;
        self.entries.push(entry);
        offset
    }

    /// Push a declaration and its value, returning the value offset
    fn push_value(
        &mut self,
        properties: CharacteristicProperties,
        uuid: u16,
        flags: AttributeFlags,
        data: ValueData,
    ) -> u16 {
        let uuid = Uuid::Uuid16(uuid);
        self.push(AttributeEntry::CharacteristicDeclaration { properties, uuid });
        self.push(AttributeEntry::CharacteristicValue { uuid, flags, data })
    }

    fn push_client_configuration(&mut self) -> u16 {
        self.push(AttributeEntry::CharacteristicDescriptor {
            uuid: Uuid::Uuid16(CLIENT_CHAR_CONFIG_UUID),
            flags: AttributeFlags::READ_WRITE,
            data: DescriptorData::ClientConfiguration,
        })
    }

    fn push_report(&mut self, report: &ReportConfig) -> HidsResult<ReportLayout> {
        let reference = report.reference()?;
        let input_writable = reference.report_type == ReportType::Input && report.is_input_writable();

        let (properties, flags) = match reference.report_type {
            ReportType::Input if input_writable => (
                CharacteristicProperties::READ
                    | CharacteristicProperties::WRITE
                    | CharacteristicProperties::NOTIFY,
                AttributeFlags::READ_WRITE,
            ),
            ReportType::Input => (
                CharacteristicProperties::READ | CharacteristicProperties::NOTIFY,
                AttributeFlags::READABLE,
            ),
            ReportType::Output => (
                CharacteristicProperties::READ
                    | CharacteristicProperties::WRITE_WITHOUT_RESPONSE
                    | CharacteristicProperties::WRITE,
                AttributeFlags::READ_WRITE,
            ),
            ReportType::Feature => (
                CharacteristicProperties::READ | CharacteristicProperties::WRITE,
                AttributeFlags::READ_WRITE,
            ),
        };

        let value_offset = self.push_value(
            properties,
            HID_REPORT_UUID,
            flags,
            ValueData::Dynamic(CharacteristicKind::Report),
        );
        let descriptor_offset = self.push(AttributeEntry::CharacteristicDescriptor {
            uuid: Uuid::Uuid16(REPORT_REFERENCE_UUID),
            flags: AttributeFlags::READABLE,
            data: DescriptorData::Static(reference.encode().to_vec()),
        });
        let cccd_offset = match reference.report_type {
            ReportType::Input => Some(self.push_client_configuration()),
            _ => None,
        };

        Ok(ReportLayout {
            reference,
            input_writable,
            value_offset,
            descriptor_offset,
            cccd_offset,
        })
    }

    fn push_boot_input(&mut self, uuid: u16, kind: CharacteristicKind, writable: bool) -> u16 {
        let (properties, flags) = if writable {
            (
                CharacteristicProperties::READ
                    | CharacteristicProperties::WRITE
                    | CharacteristicProperties::NOTIFY,
                AttributeFlags::READ_WRITE,
            )
        } else {
            (
                CharacteristicProperties::READ | CharacteristicProperties::NOTIFY,
                AttributeFlags::READABLE,
            )
        };

        let value_offset = self.push_value(properties, uuid, flags, ValueData::Dynamic(kind));
        self.push_client_configuration();
        value_offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hids::types::HidInformation;
    use proptest::prelude::*;

    fn keyboard_config() -> ServiceConfig {
        ServiceConfig::new(ServiceFlags::SUPPORT_KEYBOARD, HidInformation::default())
            .with_report(ReportConfig::input(1))
            .with_report(ReportConfig::output(2))
    }

    fn declaration(table: &ServiceTable, offset: u16) -> (CharacteristicProperties, Uuid) {
        match table.entry(offset) {
            Some(AttributeEntry::CharacteristicDeclaration { properties, uuid }) => (*properties, *uuid),
            other => panic!("expected declaration at {}, found {:?}", offset, other),
        }
    }

    #[test]
    fn test_keyboard_layout() {
        let config = keyboard_config();
        let table = AttributeTableBuilder::new(&config).build().unwrap();

        // 7 + 4 (input) + 3 (output) + 2 (protocol mode) + 5 (boot keyboard)
        assert_eq!(table.len(), 21);
        assert_eq!(
            query_attribute_count(config.flags, 0, 0, &config.reports).unwrap(),
            21
        );

        let offsets = table.offsets();
        assert_eq!(offsets.hid_information, 2);
        assert_eq!(offsets.control_point, 4);
        assert_eq!(offsets.report_map, 6);
        assert_eq!(offsets.protocol_mode, Some(15));
        assert_eq!(offsets.boot_mouse_input, None);
        assert_eq!(offsets.boot_keyboard_input, Some(17));
        assert_eq!(offsets.boot_keyboard_output, Some(20));

        let reports = table.reports();
        assert_eq!(
            reports[0],
            ReportLayout {
                reference: ReportReference::input(1),
                input_writable: false,
                value_offset: 8,
                descriptor_offset: 9,
                cccd_offset: Some(10),
            }
        );
        assert_eq!(
            reports[1],
            ReportLayout {
                reference: ReportReference::output(2),
                input_writable: false,
                value_offset: 12,
                descriptor_offset: 13,
                cccd_offset: None,
            }
        );

        // Boot keyboard input is followed by its CCCD
        assert!(table.entry(18).unwrap().is_client_configuration());
    }

    #[test]
    fn test_fixed_section_layout() {
        let config = keyboard_config()
            .with_included_service(7)
            .with_external_report_reference(Uuid::Uuid16(0x2A19));
        let table = AttributeTableBuilder::new(&config).build().unwrap();
        assert_eq!(table.len(), 23);

        assert_eq!(
            table.entry(0),
            Some(&AttributeEntry::PrimaryService {
                uuid: Uuid::Uuid16(HID_SERVICE_UUID)
            })
        );
        assert_eq!(
            table.entry(1),
            Some(&AttributeEntry::IncludeDefinition { service_id: 7 })
        );

        // HID Information is static and read-only
        assert_eq!(
            table.entry(3),
            Some(&AttributeEntry::CharacteristicValue {
                uuid: Uuid::Uuid16(HID_INFORMATION_UUID),
                flags: AttributeFlags::READABLE,
                data: ValueData::Static(vec![0x11, 0x01, 0x00, 0x00]),
            })
        );

        // Control Point only accepts write without response
        let (properties, uuid) = declaration(&table, 4);
        assert_eq!(properties, CharacteristicProperties::WRITE_WITHOUT_RESPONSE);
        assert_eq!(uuid, Uuid::Uuid16(HID_CONTROL_POINT_UUID));

        // External Report Reference follows the Report Map value
        assert_eq!(table.offsets().report_map, 7);
        assert_eq!(
            table.entry(8).and_then(|e| e.static_descriptor(EXTERNAL_REPORT_REFERENCE_UUID)),
            Some(&[0x19, 0x2A][..])
        );
        assert_eq!(table.reports()[0].value_offset, 10);
    }

    #[test]
    fn test_report_declaration_properties() {
        let config = ServiceConfig::default()
            .with_report(ReportConfig::input(1))
            .with_report(ReportConfig::input_writable(2))
            .with_report(ReportConfig::output(3))
            .with_report(ReportConfig::feature(4));
        let table = AttributeTableBuilder::new(&config).build().unwrap();
        let reports = table.reports();

        let read_notify = CharacteristicProperties::READ | CharacteristicProperties::NOTIFY;
        assert_eq!(declaration(&table, reports[0].value_offset - 1).0, read_notify);
        assert_eq!(
            declaration(&table, reports[1].value_offset - 1).0,
            read_notify | CharacteristicProperties::WRITE
        );
        assert_eq!(
            declaration(&table, reports[2].value_offset - 1).0,
            CharacteristicProperties::READ
                | CharacteristicProperties::WRITE_WITHOUT_RESPONSE
                | CharacteristicProperties::WRITE
        );
        assert_eq!(
            declaration(&table, reports[3].value_offset - 1).0,
            CharacteristicProperties::READ | CharacteristicProperties::WRITE
        );

        assert_eq!(
            table.entry(reports[0].value_offset).map(|e| e.flags()),
            Some(AttributeFlags::READABLE)
        );
        assert_eq!(
            table.entry(reports[1].value_offset).map(|e| e.flags()),
            Some(AttributeFlags::READ_WRITE)
        );

        // Only Input reports get a CCCD
        assert!(reports[0].cccd_offset.is_some());
        assert!(reports[1].cccd_offset.is_some());
        assert!(reports[2].cccd_offset.is_none());
        assert!(reports[3].cccd_offset.is_none());

        // No boot protocol, no Protocol Mode
        assert_eq!(table.offsets().protocol_mode, None);
        assert_eq!(table.len(), 7 + 4 + 4 + 3 + 3);
    }

    #[test]
    fn test_boot_mouse_writable_flag() {
        let config = ServiceConfig::new(
            ServiceFlags::SUPPORT_MOUSE | ServiceFlags::BOOT_MOUSE_INPUT_WRITABLE,
            HidInformation::default(),
        );
        let table = AttributeTableBuilder::new(&config).build().unwrap();
        assert_eq!(table.len(), 7 + 2 + 3);

        let offset = table.offsets().boot_mouse_input.unwrap();
        assert_eq!(offset, 10);
        let (properties, uuid) = declaration(&table, offset - 1);
        assert!(properties.contains(CharacteristicProperties::WRITE));
        assert_eq!(uuid, Uuid::Uuid16(HID_BOOT_MOUSE_INPUT_UUID));
        assert_eq!(table.entry(offset).map(|e| e.flags()), Some(AttributeFlags::READ_WRITE));
    }

    #[test]
    fn test_invalid_report_type_rejected() {
        let config = keyboard_config().with_report(ReportConfig::from_raw(3, 0x04));
        assert!(matches!(
            AttributeTableBuilder::new(&config).build(),
            Err(HidsError::InvalidParameter(_))
        ));
        assert!(matches!(
            query_attribute_count(config.flags, 0, 0, &config.reports),
            Err(HidsError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_capacity_limit() {
        let config = keyboard_config();
        assert!(matches!(
            AttributeTableBuilder::new(&config).max_entries(20).build(),
            Err(HidsError::InsufficientResources)
        ));
        assert!(AttributeTableBuilder::new(&config).max_entries(21).build().is_ok());
    }

    fn report_config_strategy() -> impl Strategy<Value = ReportConfig> {
        (
            any::<u8>(),
            prop_oneof![Just(0x01u8), Just(0x02u8), Just(0x03u8), Just(0x81u8)],
        )
            .prop_map(|(id, report_type)| ReportConfig::from_raw(id, report_type))
    }

    fn service_config_strategy() -> impl Strategy<Value = ServiceConfig> {
        (
            0u8..16,
            prop::collection::vec(any::<u32>(), 0..4),
            prop::collection::vec(any::<u16>().prop_map(Uuid::Uuid16), 0..3),
            prop::collection::vec(report_config_strategy(), 0..8),
        )
            .prop_map(|(flags, included, external, reports)| ServiceConfig {
                flags: ServiceFlags::from_bits_truncate(flags),
                hid_information: HidInformation::default(),
                included_services: included,
                external_report_references: external,
                reports,
            })
    }

    proptest! {
        #[test]
        fn prop_count_matches_built_table(config in service_config_strategy()) {
            let count = query_attribute_count(
                config.flags,
                config.included_services.len(),
                config.external_report_references.len(),
                &config.reports,
            ).unwrap();
            let table = AttributeTableBuilder::new(&config).build().unwrap();
            prop_assert_eq!(count, table.len());
            prop_assert_eq!(table.reports().len(), config.reports.len());
        }

        #[test]
        fn prop_descriptor_follows_value(config in service_config_strategy()) {
            let table = AttributeTableBuilder::new(&config).build().unwrap();
            for report in table.reports() {
                prop_assert_eq!(report.descriptor_offset, report.value_offset + 1);
                let descriptor = table
                    .entry(report.descriptor_offset)
                    .and_then(|e| e.static_descriptor(REPORT_REFERENCE_UUID));
                let expected = report.reference.encode();
                prop_assert_eq!(descriptor, Some(&expected[..]));
            }
        }
    }
}
