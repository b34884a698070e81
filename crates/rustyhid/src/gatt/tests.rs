//! Unit tests for GATT types

use super::types::*;

#[test]
fn test_uuid_from_bytes() {
    // 16-bit UUIDs are little-endian on the wire
    assert_eq!(Uuid::from_bytes(&[0x12, 0x18]), Some(Uuid::Uuid16(0x1812)));

    let raw: Vec<u8> = (0u8..16).collect();
    let uuid = Uuid::from_bytes(&raw);
    assert_eq!(uuid.map(|u| u.as_bytes()), Some(raw));

    // 32-bit and odd lengths are not valid here
    assert!(Uuid::from_bytes(&[0x01, 0x02, 0x03, 0x04]).is_none());
    assert!(Uuid::from_bytes(&[0x01]).is_none());
}

#[test]
fn test_uuid_display() {
    assert_eq!(Uuid::Uuid16(0x2A4D).to_string(), "2a4d");

    let uuid = Uuid::Uuid128(0x0000_1812_0000_1000_8000_0080_5F9B_34FBu128.to_le_bytes());
    assert_eq!(uuid.to_string(), "00001812-0000-1000-8000-00805f9b34fb");
}

#[test]
fn test_characteristic_properties_bits() {
    let props = CharacteristicProperties::READ | CharacteristicProperties::NOTIFY;
    assert_eq!(props.bits(), 0x12);
    assert!(!props.contains(CharacteristicProperties::WRITE));

    let output = CharacteristicProperties::READ
        | CharacteristicProperties::WRITE_WITHOUT_RESPONSE
        | CharacteristicProperties::WRITE;
    assert_eq!(output.bits(), 0x0E);
}

#[test]
fn test_handle_range() {
    let range = HandleRange::new(0x0010, 0x0024);
    assert_eq!(range.len(), 21);
    assert!(HandleRange::default().len() == 1);
    assert!(HandleRange::new(5, 4).is_empty());
}

#[test]
fn test_attribute_flags() {
    assert_eq!(AttributeFlags::READ_WRITE.bits(), 0x03);
    assert!(AttributeFlags::READ_WRITE.contains(AttributeFlags::WRITABLE));
}
