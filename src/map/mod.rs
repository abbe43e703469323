//! Register maps
//!
//! A [`RegisterMap`] is the validated catalog of registers for one device
//! type. It is only obtainable through [`RegisterMap::build`], which is the
//! single place where field ranges, overlaps, names and addresses are checked.
//! Everything downstream (devices, sessions, discovery) relies on that and
//! does not re-validate.
//!
//! # Example
//!
//! ```ignore
//! use ph_regfield::map::{FieldDescriptor, RegisterDescriptor, RegisterMap, RegisterWidth};
//!
//! const ID_FIELDS: [FieldDescriptor; 2] = [
//!     FieldDescriptor::new("DbIdVal", 0, 16),
//!     FieldDescriptor::bit("SlotIdVal", 16),
//! ];
//! const REGISTERS: [RegisterDescriptor<'static>; 1] = [
//!     RegisterDescriptor::new("DaughterboardId", 0x630, RegisterWidth::Bits32, &ID_FIELDS),
//! ];
//!
//! let map = RegisterMap::build("rx-db-rev2", &REGISTERS)?;
//! ```

pub mod field;
pub mod register;

pub use field::FieldDescriptor;
pub use register::{RegisterDescriptor, RegisterWidth, list_fields};

use crate::error::{MapError, MapResult};

/// Validated, immutable register catalog for one device type/version
///
/// Shared by reference between every [`Device`](crate::device::Device) of
/// that type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RegisterMap<'a> {
    device_type: &'static str,
    registers: &'a [RegisterDescriptor<'a>],
}

impl<'a> RegisterMap<'a> {
    /// Validate `registers` and build the map
    ///
    /// # Errors
    ///
    /// - [`MapError::FieldOutOfRange`] if a field is empty or does not fit
    ///   its register width
    /// - [`MapError::DuplicateName`] for repeated register names, or repeated
    ///   field names within one register
    /// - [`MapError::OverlappingFields`] if two fields share a mask bit
    /// - [`MapError::DuplicateAddress`] if two registers share an address
    pub fn build(
        device_type: &'static str,
        registers: &'a [RegisterDescriptor<'a>],
    ) -> MapResult<Self> {
        for (i, register) in registers.iter().enumerate() {
            validate_fields(register)?;

            for earlier in &registers[..i] {
                if earlier.name() == register.name() {
                    return Err(MapError::DuplicateName {
                        register: None,
                        name: register.name(),
                    });
                }
                if earlier.address() == register.address() {
                    return Err(MapError::DuplicateAddress {
                        first: earlier.name(),
                        second: register.name(),
                        address: register.address(),
                    });
                }
            }
        }

        #[cfg(feature = "defmt")]
        defmt::debug!(
            "register map {} built: {} registers",
            device_type,
            registers.len()
        );

        Ok(Self {
            device_type,
            registers,
        })
    }

    /// Device type/version this map describes
    pub const fn device_type(&self) -> &'static str {
        self.device_type
    }

    /// Number of registers
    pub const fn len(&self) -> usize {
        self.registers.len()
    }

    /// Whether the map has no registers
    pub const fn is_empty(&self) -> bool {
        self.registers.is_empty()
    }

    /// Look up a register by name
    pub fn register(&self, name: &str) -> Option<&'a RegisterDescriptor<'a>> {
        let registers: &'a [RegisterDescriptor<'a>] = self.registers;
        registers.iter().find(|r| r.name() == name)
    }

    /// Look up a register by its address offset
    pub fn register_at(&self, address: usize) -> Option<&'a RegisterDescriptor<'a>> {
        let registers: &'a [RegisterDescriptor<'a>] = self.registers;
        registers.iter().find(|r| r.address() == address)
    }

    /// Iterate over the registers in declaration order
    pub fn list_registers(&self) -> core::slice::Iter<'a, RegisterDescriptor<'a>> {
        let registers: &'a [RegisterDescriptor<'a>] = self.registers;
        registers.iter()
    }
}

/// Iterate over the registers of `map` in declaration order
pub fn list_registers<'a>(map: &RegisterMap<'a>) -> core::slice::Iter<'a, RegisterDescriptor<'a>> {
    map.list_registers()
}

fn validate_fields(register: &RegisterDescriptor<'_>) -> MapResult<()> {
    let bits = register.width().bits();
    let fields = register.fields();

    for field in fields {
        if !field.fits(bits) {
            return Err(MapError::FieldOutOfRange {
                register: register.name(),
                field: field.name(),
                offset: field.offset(),
                width: field.width(),
                register_bits: bits,
            });
        }
    }

    for (i, field) in fields.iter().enumerate() {
        for earlier in &fields[..i] {
            if earlier.name() == field.name() {
                return Err(MapError::DuplicateName {
                    register: Some(register.name()),
                    name: field.name(),
                });
            }
            if earlier.overlaps(field) {
                return Err(MapError::OverlappingFields {
                    register: register.name(),
                    first: earlier.name(),
                    second: field.name(),
                });
            }
        }
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    extern crate std;

    use std::vec::Vec;

    use quickcheck::{Arbitrary, Gen};
    use quickcheck_macros::quickcheck;

    use super::*;

    const ID_FIELDS: [FieldDescriptor; 2] = [
        FieldDescriptor::new("DbIdVal", 0, 16),
        FieldDescriptor::bit("SlotIdVal", 16),
    ];
    const CTRL_FIELDS: [FieldDescriptor; 2] = [
        FieldDescriptor::bit("Enable", 0),
        FieldDescriptor::new("Mode", 4, 3),
    ];

    const REGISTERS: [RegisterDescriptor<'static>; 2] = [
        RegisterDescriptor::new("DaughterboardId", 0x630, RegisterWidth::Bits32, &ID_FIELDS),
        RegisterDescriptor::new("Control", 0x600, RegisterWidth::Bits8, &CTRL_FIELDS),
    ];

    // =========================================================================
    // Construction
    // =========================================================================

    #[test]
    fn build_valid_map() {
        let map = RegisterMap::build("db", &REGISTERS).unwrap();
        assert_eq!(map.device_type(), "db");
        assert_eq!(map.len(), 2);
        assert!(!map.is_empty());
        assert_eq!(map.register("Control").map(RegisterDescriptor::address), Some(0x600));
        assert_eq!(
            map.register_at(0x630).map(RegisterDescriptor::name),
            Some("DaughterboardId")
        );
        assert!(map.register("Missing").is_none());
    }

    #[test]
    fn empty_map_is_valid() {
        let map = RegisterMap::build("empty", &[]).unwrap();
        assert!(map.is_empty());
    }

    #[test]
    fn list_registers_in_declaration_order() {
        let map = RegisterMap::build("db", &REGISTERS).unwrap();
        let names: Vec<_> = list_registers(&map).map(RegisterDescriptor::name).collect();
        assert_eq!(names, ["DaughterboardId", "Control"]);
    }

    #[test]
    fn rejects_field_past_register_width() {
        let fields = [FieldDescriptor::new("Wide", 4, 5)];
        let regs = [RegisterDescriptor::new("Byte", 0, RegisterWidth::Bits8, &fields)];
        assert_eq!(
            RegisterMap::build("db", &regs),
            Err(MapError::FieldOutOfRange {
                register: "Byte",
                field: "Wide",
                offset: 4,
                width: 5,
                register_bits: 8,
            })
        );
    }

    #[test]
    fn rejects_zero_width_field() {
        let fields = [FieldDescriptor::new("Empty", 0, 0)];
        let regs = [RegisterDescriptor::new("R", 0, RegisterWidth::Bits32, &fields)];
        assert!(matches!(
            RegisterMap::build("db", &regs),
            Err(MapError::FieldOutOfRange { field: "Empty", .. })
        ));
    }

    #[test]
    fn rejects_overlapping_fields() {
        let fields = [
            FieldDescriptor::new("Low", 0, 8),
            FieldDescriptor::new("Mid", 7, 4),
        ];
        let regs = [RegisterDescriptor::new("R", 0, RegisterWidth::Bits32, &fields)];
        assert_eq!(
            RegisterMap::build("db", &regs),
            Err(MapError::OverlappingFields {
                register: "R",
                first: "Low",
                second: "Mid",
            })
        );
    }

    #[test]
    fn rejects_duplicate_field_name() {
        let fields = [FieldDescriptor::bit("Bit", 0), FieldDescriptor::bit("Bit", 1)];
        let regs = [RegisterDescriptor::new("R", 0, RegisterWidth::Bits32, &fields)];
        assert_eq!(
            RegisterMap::build("db", &regs),
            Err(MapError::DuplicateName {
                register: Some("R"),
                name: "Bit",
            })
        );
    }

    #[test]
    fn rejects_duplicate_register_name() {
        let regs = [
            RegisterDescriptor::new("R", 0, RegisterWidth::Bits32, &[]),
            RegisterDescriptor::new("R", 4, RegisterWidth::Bits32, &[]),
        ];
        assert_eq!(
            RegisterMap::build("db", &regs),
            Err(MapError::DuplicateName {
                register: None,
                name: "R",
            })
        );
    }

    #[test]
    fn rejects_duplicate_address() {
        let regs = [
            RegisterDescriptor::new("A", 0x10, RegisterWidth::Bits32, &[]),
            RegisterDescriptor::new("B", 0x10, RegisterWidth::Bits16, &[]),
        ];
        assert_eq!(
            RegisterMap::build("db", &regs),
            Err(MapError::DuplicateAddress {
                first: "A",
                second: "B",
                address: 0x10,
            })
        );
    }

    #[test]
    fn same_field_names_in_different_registers_allowed() {
        let a = [FieldDescriptor::bit("Enable", 0)];
        let b = [FieldDescriptor::bit("Enable", 0)];
        let regs = [
            RegisterDescriptor::new("A", 0, RegisterWidth::Bits32, &a),
            RegisterDescriptor::new("B", 4, RegisterWidth::Bits32, &b),
        ];
        assert!(RegisterMap::build("db", &regs).is_ok());
    }

    // =========================================================================
    // Random Layouts
    // =========================================================================

    const FIELD_NAMES: [&str; 8] = ["f0", "f1", "f2", "f3", "f4", "f5", "f6", "f7"];

    /// Random in-range field layout for a 32-bit register
    #[derive(Debug, Clone)]
    struct Layout(Vec<(u8, u8)>);

    impl Arbitrary for Layout {
        fn arbitrary(g: &mut Gen) -> Self {
            let count = 1 + usize::arbitrary(g) % FIELD_NAMES.len();
            let fields = (0..count)
                .map(|_| {
                    let offset = u8::arbitrary(g) % 32;
                    let width = 1 + u8::arbitrary(g) % (32 - offset).min(6);
                    (offset, width)
                })
                .collect();
            Layout(fields)
        }
    }

    #[quickcheck]
    fn overlap_reported_exactly_when_masks_intersect(layout: Layout) -> bool {
        let fields: Vec<_> = layout
            .0
            .iter()
            .zip(FIELD_NAMES)
            .map(|(&(offset, width), name)| FieldDescriptor::new(name, offset, width))
            .collect();

        let mut covered = 0u64;
        let mut overlap = false;
        for f in &fields {
            overlap |= covered & f.mask() != 0;
            covered |= f.mask();
        }

        let regs = [RegisterDescriptor::new("R", 0, RegisterWidth::Bits32, &fields)];
        match RegisterMap::build("random", &regs) {
            Ok(map) => {
                !overlap && map.register("R").map(RegisterDescriptor::write_mask) == Some(covered)
            }
            Err(MapError::OverlappingFields { .. }) => overlap,
            Err(_) => false,
        }
    }
}
