//! Report and descriptor ownership resolution
//!
//! Report characteristics all share the Report UUID, and CCCDs carry no
//! pointer back to the characteristic they configure. Both are resolved
//! from the table layout alone: a Report Reference descriptor sits directly
//! after its value, and a CCCD belongs to the nearest value before it.
//!
//! The scans below run once when a table is built, producing a
//! [`ReportIndex`] that request routing consults in constant time.

use super::constants::REPORT_REFERENCE_UUID;
use super::table::{AttributeEntry, CharacteristicKind};
use super::types::{ReportReference, ReportTarget};
use std::collections::HashMap;

// Offsets 0 and 1 are the service declaration and the first entry after
// it; no characteristic value can sit there.
const FIRST_VALUE_OFFSET: usize = 2;

/// Value offset of the Report whose Report Reference matches `reference`
pub fn report_reference_to_offset(
    entries: &[AttributeEntry],
    reference: &ReportReference,
) -> Option<u16> {
    (FIRST_VALUE_OFFSET..entries.len())
        .filter(|&index| entries[index].dynamic_kind() == Some(CharacteristicKind::Report))
        .find(|&index| value_to_report_reference(entries, index as u16).as_ref() == Some(reference))
        .map(|index| index as u16)
}

/// Report Reference of the Report value at `offset`.
///
/// Walks the descriptors that follow the value and stops at the next
/// non-descriptor entry.
pub fn value_to_report_reference(entries: &[AttributeEntry], offset: u16) -> Option<ReportReference> {
    entries
        .iter()
        .skip(offset as usize + 1)
        .take_while(|entry| entry.is_descriptor())
        .find_map(|entry| entry.static_descriptor(REPORT_REFERENCE_UUID))
        .and_then(|value| ReportReference::decode(value).ok())
}

/// Offset of the characteristic value owning the descriptor at `offset`
fn owning_value(entries: &[AttributeEntry], offset: u16) -> Option<u16> {
    let mut index = (offset as usize).min(entries.len().checked_sub(1)?);
    while index >= FIRST_VALUE_OFFSET {
        match &entries[index] {
            entry if entry.is_descriptor() => index -= 1,
            AttributeEntry::CharacteristicValue { .. } => return Some(index as u16),
            _ => return None,
        }
    }
    None
}

/// Kind of the dynamic characteristic a CCCD at `offset` configures
pub fn client_configuration_to_kind(
    entries: &[AttributeEntry],
    offset: u16,
) -> Option<CharacteristicKind> {
    owning_value(entries, offset).and_then(|value| entries[value as usize].dynamic_kind())
}

/// Report Reference of the Report a CCCD at `offset` configures.
///
/// `None` if the CCCD belongs to anything other than a Report.
pub fn client_configuration_to_report_reference(
    entries: &[AttributeEntry],
    offset: u16,
) -> Option<ReportReference> {
    let value = owning_value(entries, offset)?;
    match entries[value as usize].dynamic_kind() {
        Some(CharacteristicKind::Report) => value_to_report_reference(entries, value),
        _ => None,
    }
}

/// Resolve the report target a CCCD at `offset` belongs to
pub fn client_configuration_to_target(entries: &[AttributeEntry], offset: u16) -> Option<ReportTarget> {
    match client_configuration_to_kind(entries, offset)? {
        CharacteristicKind::Report => {
            client_configuration_to_report_reference(entries, offset).map(ReportTarget::Report)
        }
        CharacteristicKind::BootKeyboardInput => Some(ReportTarget::BootKeyboardInput),
        CharacteristicKind::BootKeyboardOutput => Some(ReportTarget::BootKeyboardOutput),
        CharacteristicKind::BootMouseInput => Some(ReportTarget::BootMouseInput),
        _ => None,
    }
}

/// Precomputed report and CCCD ownership for one table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportIndex {
    offsets: HashMap<ReportReference, u16>,
    references: HashMap<u16, ReportReference>,
    client_configurations: HashMap<u16, ReportTarget>,
}

impl ReportIndex {
    pub fn build(entries: &[AttributeEntry]) -> Self {
        let mut index = ReportIndex::default();

        for (offset, entry) in entries.iter().enumerate() {
            let offset = offset as u16;
            if entry.dynamic_kind() == Some(CharacteristicKind::Report) {
                if let Some(reference) = value_to_report_reference(entries, offset) {
                    index.references.insert(offset, reference);
                    // A duplicated reference resolves to its first report
                    index.offsets.entry(reference).or_insert(offset);
                }
            } else if entry.is_client_configuration() {
                if let Some(target) = client_configuration_to_target(entries, offset) {
                    index.client_configurations.insert(offset, target);
                }
            }
        }

        index
    }

    /// Value offset of the Report with this reference
    pub fn offset_of(&self, reference: &ReportReference) -> Option<u16> {
        self.offsets.get(reference).copied()
    }

    /// Report Reference of the Report value at `value_offset`
    pub fn reference_at(&self, value_offset: u16) -> Option<ReportReference> {
        self.references.get(&value_offset).copied()
    }

    /// Report a CCCD configures
    pub fn client_configuration_owner(&self, cccd_offset: u16) -> Option<ReportTarget> {
        self.client_configurations.get(&cccd_offset).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hids::table::{AttributeTableBuilder, ServiceTable};
    use crate::hids::types::{HidInformation, ReportConfig, ServiceConfig, ServiceFlags};
    use proptest::prelude::*;

    fn build(config: &ServiceConfig) -> ServiceTable {
        AttributeTableBuilder::new(config).build().unwrap()
    }

    fn combo_config() -> ServiceConfig {
        ServiceConfig::new(
            ServiceFlags::SUPPORT_KEYBOARD | ServiceFlags::SUPPORT_MOUSE,
            HidInformation::default(),
        )
        .with_report(ReportConfig::input(1))
        .with_report(ReportConfig::output(1))
        .with_report(ReportConfig::feature(2))
        .with_report(ReportConfig::input_writable(3))
    }

    #[test]
    fn test_report_reference_to_offset() {
        let table = build(&combo_config());
        let entries = table.entries();

        assert_eq!(report_reference_to_offset(entries, &ReportReference::input(1)), Some(8));
        assert_eq!(report_reference_to_offset(entries, &ReportReference::output(1)), Some(12));
        assert_eq!(report_reference_to_offset(entries, &ReportReference::feature(2)), Some(15));
        assert_eq!(report_reference_to_offset(entries, &ReportReference::input(3)), Some(18));

        // Same ID, different type
        assert_eq!(report_reference_to_offset(entries, &ReportReference::feature(1)), None);
        assert_eq!(report_reference_to_offset(entries, &ReportReference::input(9)), None);
    }

    #[test]
    fn test_value_to_report_reference() {
        let table = build(&combo_config());
        let entries = table.entries();

        assert_eq!(value_to_report_reference(entries, 8), Some(ReportReference::input(1)));

        // Protocol Mode value is followed by a declaration, not a descriptor
        let protocol_mode = table.offsets().protocol_mode.unwrap();
        assert_eq!(value_to_report_reference(entries, protocol_mode), None);

        // Past the end of the table
        assert_eq!(value_to_report_reference(entries, 500), None);
    }

    #[test]
    fn test_client_configuration_resolution() {
        let table = build(&combo_config());
        let entries = table.entries();
        let offsets = table.offsets();

        assert_eq!(
            client_configuration_to_kind(entries, 10),
            Some(CharacteristicKind::Report)
        );
        assert_eq!(
            client_configuration_to_report_reference(entries, 10),
            Some(ReportReference::input(1))
        );

        let mouse_cccd = offsets.boot_mouse_input.unwrap() + 1;
        assert_eq!(
            client_configuration_to_target(entries, mouse_cccd),
            Some(ReportTarget::BootMouseInput)
        );
        assert_eq!(client_configuration_to_report_reference(entries, mouse_cccd), None);

        let keyboard_cccd = offsets.boot_keyboard_input.unwrap() + 1;
        assert_eq!(
            client_configuration_to_target(entries, keyboard_cccd),
            Some(ReportTarget::BootKeyboardInput)
        );

        // A declaration is never owned by a value
        assert_eq!(client_configuration_to_kind(entries, 7), None);
        // The scan never walks below the first value slot
        assert_eq!(owning_value(entries, 1), None);
        assert_eq!(owning_value(&[], 4), None);
    }

    #[test]
    fn test_index_matches_scans() {
        let table = build(&combo_config());
        let index = table.index();

        for report in table.reports() {
            assert_eq!(index.offset_of(&report.reference), Some(report.value_offset));
            assert_eq!(index.reference_at(report.value_offset), Some(report.reference));
            match report.cccd_offset {
                Some(cccd) => assert_eq!(
                    index.client_configuration_owner(cccd),
                    Some(ReportTarget::Report(report.reference))
                ),
                None => assert_eq!(
                    index.client_configuration_owner(report.descriptor_offset + 1),
                    None
                ),
            }
        }
    }

    #[test]
    fn test_duplicate_reference_resolves_to_first() {
        let config = ServiceConfig::default()
            .with_report(ReportConfig::input(4))
            .with_report(ReportConfig::input(4));
        let table = build(&config);

        assert_eq!(table.index().offset_of(&ReportReference::input(4)), Some(8));
        assert_eq!(table.index().reference_at(12), Some(ReportReference::input(4)));
    }

    proptest! {
        #[test]
        fn prop_cccd_inverts_forward_resolution(
            reports in prop::collection::vec(
                (any::<u8>(), prop_oneof![Just(0x01u8), Just(0x02u8), Just(0x03u8), Just(0x81u8)]),
                0..8,
            ),
            flags in 0u8..16,
        ) {
            let mut config = ServiceConfig::new(
                ServiceFlags::from_bits_truncate(flags),
                HidInformation::default(),
            );
            for (id, report_type) in reports {
                config = config.with_report(ReportConfig::from_raw(id, report_type));
            }
            let table = build(&config);
            let entries = table.entries();

            for report in table.reports() {
                // Forward resolution lands on a value whose descriptor decodes back
                let offset = report_reference_to_offset(entries, &report.reference).unwrap();
                prop_assert_eq!(value_to_report_reference(entries, offset), Some(report.reference));

                if let Some(cccd) = report.cccd_offset {
                    prop_assert_eq!(
                        client_configuration_to_report_reference(entries, cccd),
                        Some(report.reference)
                    );
                    prop_assert_eq!(
                        table.index().client_configuration_owner(cccd),
                        Some(ReportTarget::Report(report.reference))
                    );
                }
            }

            for (target, offset) in [
                (ReportTarget::BootMouseInput, table.offsets().boot_mouse_input),
                (ReportTarget::BootKeyboardInput, table.offsets().boot_keyboard_input),
            ] {
                if let Some(offset) = offset {
                    prop_assert_eq!(
                        table.index().client_configuration_owner(offset + 1),
                        Some(target)
                    );
                }
            }
        }
    }
}
