//! HID Service constants

// Service and characteristic UUIDs
pub const HID_SERVICE_UUID: u16 = 0x1812;
pub const HID_INFORMATION_UUID: u16 = 0x2A4A;
pub const HID_REPORT_MAP_UUID: u16 = 0x2A4B;
pub const HID_CONTROL_POINT_UUID: u16 = 0x2A4C;
pub const HID_REPORT_UUID: u16 = 0x2A4D;
pub const HID_PROTOCOL_MODE_UUID: u16 = 0x2A4E;
pub const HID_BOOT_KEYBOARD_INPUT_UUID: u16 = 0x2A22;
pub const HID_BOOT_KEYBOARD_OUTPUT_UUID: u16 = 0x2A32;
pub const HID_BOOT_MOUSE_INPUT_UUID: u16 = 0x2A33;

// Descriptor UUIDs
pub const EXTERNAL_REPORT_REFERENCE_UUID: u16 = 0x2907;
pub const REPORT_REFERENCE_UUID: u16 = 0x2908;

// Value sizes
pub const HID_INFORMATION_SIZE: usize = 4;
pub const REPORT_REFERENCE_SIZE: usize = 2;

// Report Reference report types
pub const REPORT_TYPE_INPUT: u8 = 0x01;
pub const REPORT_TYPE_OUTPUT: u8 = 0x02;
pub const REPORT_TYPE_FEATURE: u8 = 0x03;

/// Set on an Input report type at registration to make the report writable
pub const REPORT_TYPE_INPUT_WRITABLE: u8 = 0x80;

// Protocol Mode values
pub const PROTOCOL_MODE_BOOT: u8 = 0x00;
pub const PROTOCOL_MODE_REPORT: u8 = 0x01;

// Control Point commands
pub const CONTROL_POINT_SUSPEND: u8 = 0x00;
pub const CONTROL_POINT_EXIT_SUSPEND: u8 = 0x01;

// HID Information
pub const HID_VERSION_1_11: u16 = 0x0111;
pub const HID_INFO_FLAG_REMOTE_WAKE: u8 = 0x01;
pub const HID_INFO_FLAG_NORMALLY_CONNECTABLE: u8 = 0x02;

// Attribute table size contributions
pub const MINIMUM_ATTRIBUTE_COUNT: usize = 7;
pub const INCLUDED_SERVICE_ATTRIBUTE_COUNT: usize = 1;
pub const EXTERNAL_REFERENCE_ATTRIBUTE_COUNT: usize = 1;
pub const INPUT_REPORT_ATTRIBUTE_COUNT: usize = 4;
pub const OUTPUT_REPORT_ATTRIBUTE_COUNT: usize = 3;
pub const FEATURE_REPORT_ATTRIBUTE_COUNT: usize = 3;
pub const PROTOCOL_MODE_ATTRIBUTE_COUNT: usize = 2;
pub const BOOT_MOUSE_ATTRIBUTE_COUNT: usize = 3;
pub const BOOT_KEYBOARD_ATTRIBUTE_COUNT: usize = 5;
