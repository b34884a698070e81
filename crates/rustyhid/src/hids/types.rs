//! HID Service value types and codecs
//!
//! These are the values carried by the HID Service characteristics and
//! descriptors, together with the declarative configuration an application
//! hands to [`HidsServer::initialize_service`](super::HidsServer::initialize_service).

use super::constants::*;
use crate::att::CLIENT_CHAR_CONFIG_LEN;
use crate::error::{HidsError, HidsResult};
use crate::gatt::Uuid;
use bitflags::bitflags;
use byteorder::{ByteOrder, LittleEndian, ReadBytesExt};
use std::fmt;
use std::io::Cursor;

bitflags! {
    /// Capability flags supplied when a HID service is registered
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ServiceFlags: u8 {
        const SUPPORT_MOUSE = 0x01;
        const SUPPORT_KEYBOARD = 0x02;
        const BOOT_MOUSE_INPUT_WRITABLE = 0x04;
        const BOOT_KEYBOARD_INPUT_WRITABLE = 0x08;
    }
}

impl ServiceFlags {
    /// Boot protocol support implies a Protocol Mode characteristic
    pub fn supports_boot_protocol(&self) -> bool {
        self.intersects(ServiceFlags::SUPPORT_MOUSE | ServiceFlags::SUPPORT_KEYBOARD)
    }
}

bitflags! {
    /// Flags field of the HID Information characteristic
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct HidInfoFlags: u8 {
        const REMOTE_WAKE = HID_INFO_FLAG_REMOTE_WAKE;
        const NORMALLY_CONNECTABLE = HID_INFO_FLAG_NORMALLY_CONNECTABLE;
    }
}

/// Report type carried in a Report Reference descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ReportType {
    Input,
    Output,
    Feature,
}

impl TryFrom<u8> for ReportType {
    type Error = HidsError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            REPORT_TYPE_INPUT => Ok(ReportType::Input),
            REPORT_TYPE_OUTPUT => Ok(ReportType::Output),
            REPORT_TYPE_FEATURE => Ok(ReportType::Feature),
            _ => Err(HidsError::InvalidParameter(format!(
                "Unknown report type 0x{:02X}",
                value
            ))),
        }
    }
}

impl From<ReportType> for u8 {
    fn from(value: ReportType) -> Self {
        match value {
            ReportType::Input => REPORT_TYPE_INPUT,
            ReportType::Output => REPORT_TYPE_OUTPUT,
            ReportType::Feature => REPORT_TYPE_FEATURE,
        }
    }
}

/// Report ID and type pair that tells Report characteristics apart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReportReference {
    pub report_id: u8,
    pub report_type: ReportType,
}

impl ReportReference {
    pub fn new(report_id: u8, report_type: ReportType) -> Self {
        Self {
            report_id,
            report_type,
        }
    }

    pub fn input(report_id: u8) -> Self {
        Self::new(report_id, ReportType::Input)
    }

    pub fn output(report_id: u8) -> Self {
        Self::new(report_id, ReportType::Output)
    }

    pub fn feature(report_id: u8) -> Self {
        Self::new(report_id, ReportType::Feature)
    }

    /// Descriptor value as stored in the attribute table
    pub fn encode(&self) -> [u8; REPORT_REFERENCE_SIZE] {
        [self.report_id, self.report_type.into()]
    }

    /// Decode a Report Reference descriptor value read from a remote server
    pub fn decode(value: &[u8]) -> HidsResult<Self> {
        if value.len() != REPORT_REFERENCE_SIZE {
            return Err(HidsError::MalformattedData(format!(
                "Report Reference must be {} bytes, got {}",
                REPORT_REFERENCE_SIZE,
                value.len()
            )));
        }

        Ok(Self::new(value[0], ReportType::try_from(value[1])?))
    }
}

impl fmt::Display for ReportReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} report {}", self.report_type, self.report_id)
    }
}

/// The characteristic a report request or notification is aimed at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportTarget {
    /// A Report characteristic, identified by its Report Reference
    Report(ReportReference),
    BootKeyboardInput,
    BootKeyboardOutput,
    BootMouseInput,
}

impl ReportTarget {
    /// Only Input reports and the boot input reports can be notified
    pub fn is_notifiable(&self) -> bool {
        match self {
            ReportTarget::Report(reference) => reference.report_type == ReportType::Input,
            ReportTarget::BootKeyboardInput | ReportTarget::BootMouseInput => true,
            ReportTarget::BootKeyboardOutput => false,
        }
    }
}

/// Value of the Protocol Mode characteristic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProtocolMode {
    Boot,
    Report,
}

impl ProtocolMode {
    pub fn from_byte(value: u8) -> Option<Self> {
        match value {
            PROTOCOL_MODE_BOOT => Some(ProtocolMode::Boot),
            PROTOCOL_MODE_REPORT => Some(ProtocolMode::Report),
            _ => None,
        }
    }

    pub fn to_byte(self) -> u8 {
        match self {
            ProtocolMode::Boot => PROTOCOL_MODE_BOOT,
            ProtocolMode::Report => PROTOCOL_MODE_REPORT,
        }
    }
}

/// Command written to the HID Control Point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlPointCommand {
    Suspend,
    ExitSuspend,
}

impl ControlPointCommand {
    pub fn from_byte(value: u8) -> Option<Self> {
        match value {
            CONTROL_POINT_SUSPEND => Some(ControlPointCommand::Suspend),
            CONTROL_POINT_EXIT_SUSPEND => Some(ControlPointCommand::ExitSuspend),
            _ => None,
        }
    }

    pub fn to_byte(self) -> u8 {
        match self {
            ControlPointCommand::Suspend => CONTROL_POINT_SUSPEND,
            ControlPointCommand::ExitSuspend => CONTROL_POINT_EXIT_SUSPEND,
        }
    }
}

/// Value of the HID Information characteristic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HidInformation {
    /// bcdHID version of the HID specification implemented
    pub version: u16,
    /// Hardware target country code, 0 when not localized
    pub country_code: u8,
    pub flags: HidInfoFlags,
}

impl Default for HidInformation {
    fn default() -> Self {
        Self {
            version: HID_VERSION_1_11,
            country_code: 0,
            flags: HidInfoFlags::empty(),
        }
    }
}

impl HidInformation {
    pub fn encode(&self) -> [u8; HID_INFORMATION_SIZE] {
        let mut buf = [0u8; HID_INFORMATION_SIZE];
        LittleEndian::write_u16(&mut buf[0..2], self.version);
        buf[2] = self.country_code;
        buf[3] = self.flags.bits();
        buf
    }

    pub fn decode(value: &[u8]) -> HidsResult<Self> {
        if value.len() != HID_INFORMATION_SIZE {
            return Err(HidsError::MalformattedData(format!(
                "HID Information must be {} bytes, got {}",
                HID_INFORMATION_SIZE,
                value.len()
            )));
        }

        let mut cursor = Cursor::new(value);
        let malformed = |e: std::io::Error| HidsError::MalformattedData(e.to_string());
        let version = cursor.read_u16::<LittleEndian>().map_err(malformed)?;
        let country_code = cursor.read_u8().map_err(malformed)?;
        let flags = cursor.read_u8().map_err(malformed)?;

        Ok(Self {
            version,
            country_code,
            flags: HidInfoFlags::from_bits_retain(flags),
        })
    }
}

/// Decode an External Report Reference descriptor value
pub fn decode_external_report_reference(value: &[u8]) -> HidsResult<Uuid> {
    Uuid::from_bytes(value).ok_or_else(|| {
        HidsError::MalformattedData(format!(
            "External Report Reference must be 2 or 16 bytes, got {}",
            value.len()
        ))
    })
}

/// Decode a Client Characteristic Configuration write.
///
/// The descriptor is two bytes wide, but a single byte is accepted and
/// zero-extended since some hosts write only the low octet.
pub fn decode_client_configuration(value: &[u8]) -> HidsResult<u16> {
    match value.len() {
        1 => Ok(value[0] as u16),
        CLIENT_CHAR_CONFIG_LEN => Ok(LittleEndian::read_u16(value)),
        len => Err(HidsError::MalformattedData(format!(
            "Client configuration must be 1 or 2 bytes, got {}",
            len
        ))),
    }
}

/// One report as requested at registration.
///
/// The type is kept raw so an out-of-range value can be rejected when the
/// table is built, and so the input-writable bit travels with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReportConfig {
    pub report_id: u8,
    pub report_type: u8,
}

impl ReportConfig {
    pub fn from_raw(report_id: u8, report_type: u8) -> Self {
        Self {
            report_id,
            report_type,
        }
    }

    pub fn input(report_id: u8) -> Self {
        Self::from_raw(report_id, REPORT_TYPE_INPUT)
    }

    /// Input report the host may also write
    pub fn input_writable(report_id: u8) -> Self {
        Self::from_raw(report_id, REPORT_TYPE_INPUT | REPORT_TYPE_INPUT_WRITABLE)
    }

    pub fn output(report_id: u8) -> Self {
        Self::from_raw(report_id, REPORT_TYPE_OUTPUT)
    }

    pub fn feature(report_id: u8) -> Self {
        Self::from_raw(report_id, REPORT_TYPE_FEATURE)
    }

    pub fn is_input_writable(&self) -> bool {
        self.report_type & REPORT_TYPE_INPUT_WRITABLE != 0
    }

    /// Resolve the Report Reference, with the writable modifier stripped
    pub fn reference(&self) -> HidsResult<ReportReference> {
        let report_type = ReportType::try_from(self.report_type & !REPORT_TYPE_INPUT_WRITABLE)?;
        Ok(ReportReference::new(self.report_id, report_type))
    }
}

impl From<ReportReference> for ReportConfig {
    fn from(reference: ReportReference) -> Self {
        Self::from_raw(reference.report_id, reference.report_type.into())
    }
}

/// Declarative description of a HID service instance
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceConfig {
    pub flags: ServiceFlags,
    pub hid_information: HidInformation,
    /// Service IDs of services to include, in table order
    pub included_services: Vec<u32>,
    /// UUIDs of characteristics in other services the report map refers to
    pub external_report_references: Vec<Uuid>,
    pub reports: Vec<ReportConfig>,
}

impl ServiceConfig {
    pub fn new(flags: ServiceFlags, hid_information: HidInformation) -> Self {
        Self {
            flags,
            hid_information,
            ..Default::default()
        }
    }

    pub fn with_included_service(mut self, service_id: u32) -> Self {
        self.included_services.push(service_id);
        self
    }

    pub fn with_external_report_reference(mut self, uuid: Uuid) -> Self {
        self.external_report_references.push(uuid);
        self
    }

    pub fn with_report(mut self, report: ReportConfig) -> Self {
        self.reports.push(report);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hid_information_encoding() {
        let info = HidInformation {
            version: 0x0111,
            country_code: 0x21,
            flags: HidInfoFlags::REMOTE_WAKE | HidInfoFlags::NORMALLY_CONNECTABLE,
        };
        assert_eq!(info.encode(), [0x11, 0x01, 0x21, 0x03]);
        assert_eq!(HidInformation::decode(&info.encode()), Ok(info));

        // Wrong length is malformed
        assert!(matches!(
            HidInformation::decode(&[0x11, 0x01, 0x00]),
            Err(HidsError::MalformattedData(_))
        ));
    }

    #[test]
    fn test_report_reference_decode() {
        assert_eq!(
            ReportReference::decode(&[0x05, 0x02]),
            Ok(ReportReference::output(5))
        );
        assert!(matches!(
            ReportReference::decode(&[0x05]),
            Err(HidsError::MalformattedData(_))
        ));
        assert!(matches!(
            ReportReference::decode(&[0x05, 0x04]),
            Err(HidsError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_external_report_reference_decode() {
        assert_eq!(
            decode_external_report_reference(&[0x19, 0x2A]),
            Ok(Uuid::Uuid16(0x2A19))
        );
        assert!(decode_external_report_reference(&[0u8; 16]).is_ok());
        assert!(matches!(
            decode_external_report_reference(&[0u8; 4]),
            Err(HidsError::MalformattedData(_))
        ));
    }

    #[test]
    fn test_client_configuration_decode() {
        assert_eq!(decode_client_configuration(&[0x01, 0x00]), Ok(0x0001));
        assert_eq!(decode_client_configuration(&[0x02, 0x01]), Ok(0x0102));

        // Single octet writes are zero-extended
        assert_eq!(decode_client_configuration(&[0x01]), Ok(0x0001));

        assert!(decode_client_configuration(&[]).is_err());
        assert!(decode_client_configuration(&[0x01, 0x00, 0x00]).is_err());
    }

    #[test]
    fn test_report_config_writable_bit() {
        let report = ReportConfig::input_writable(3);
        assert_eq!(report.report_type, 0x81);
        assert!(report.is_input_writable());
        assert_eq!(report.reference(), Ok(ReportReference::input(3)));

        assert!(!ReportConfig::output(3).is_input_writable());
        assert!(ReportConfig::from_raw(3, 0x00).reference().is_err());
        assert!(ReportConfig::from_raw(3, 0x84).reference().is_err());
    }

    #[test]
    fn test_protocol_mode_and_control_point_bytes() {
        assert_eq!(ProtocolMode::Boot.to_byte(), 0x00);
        assert_eq!(ProtocolMode::from_byte(0x01), Some(ProtocolMode::Report));
        assert_eq!(ProtocolMode::from_byte(0x02), None);

        assert_eq!(ControlPointCommand::ExitSuspend.to_byte(), 0x01);
        assert_eq!(
            ControlPointCommand::from_byte(0x00),
            Some(ControlPointCommand::Suspend)
        );
        assert_eq!(ControlPointCommand::from_byte(0xFF), None);
    }

    #[test]
    fn test_report_target_notifiable() {
        assert!(ReportTarget::Report(ReportReference::input(1)).is_notifiable());
        assert!(!ReportTarget::Report(ReportReference::output(1)).is_notifiable());
        assert!(!ReportTarget::Report(ReportReference::feature(1)).is_notifiable());
        assert!(ReportTarget::BootMouseInput.is_notifiable());
        assert!(!ReportTarget::BootKeyboardOutput.is_notifiable());
    }
}
